//! Metric series identity.
//!
//! A series is named by its metric name plus every attribute that applies to
//! the point, rendered as `name{k1="v1",k2="v2"}` with the pairs sorted so the
//! key does not depend on attribute order or on which level carried a pair.

use crate::core::KeyValue;

/// Build the series key for a metric point.
///
/// `attribute_sets` are usually the datapoint, scope and resource attributes;
/// values render with the display rules and unset values render as `(null)`.
pub fn fingerprint(name: &str, attribute_sets: &[&[KeyValue]]) -> String {
    let mut pairs: Vec<String> = attribute_sets
        .iter()
        .flat_map(|set| set.iter())
        .map(|kv| format!("{}={:?}", kv.key, kv.display_value()))
        .collect();
    pairs.sort_unstable();

    format!("{}{{{}}}", name, pairs.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::AttributeValue;

    #[test]
    fn test_no_attributes() {
        assert_eq!(fingerprint("requests", &[]), "requests{}");
        assert_eq!(fingerprint("requests", &[&[], &[]]), "requests{}");
    }

    #[test]
    fn test_pairs_are_sorted_and_quoted() {
        let attrs = [KeyValue::string("method", "GET"), KeyValue::new("code", AttributeValue::Int(200))];
        assert_eq!(fingerprint("http", &[&attrs]), r#"http{code="200",method="GET"}"#);
    }

    #[test]
    fn test_independent_of_order() {
        let ab = [KeyValue::string("a", "1"), KeyValue::string("b", "2")];
        let ba = [KeyValue::string("b", "2"), KeyValue::string("a", "1")];
        assert_eq!(fingerprint("m", &[&ab]), fingerprint("m", &[&ba]));
    }

    #[test]
    fn test_independent_of_split() {
        let a = [KeyValue::string("a", "1")];
        let b = [KeyValue::string("b", "2")];
        let ab = [KeyValue::string("a", "1"), KeyValue::string("b", "2")];
        assert_eq!(fingerprint("m", &[&ab]), fingerprint("m", &[&b, &a]));
    }

    #[test]
    fn test_null_and_escaped_values() {
        let attrs = [
            KeyValue { key: "empty".into(), value: None },
            KeyValue::string("quote", "say \"hi\""),
        ];
        assert_eq!(
            fingerprint("m", &[&attrs]),
            r#"m{empty="(null)",quote="say \"hi\""}"#
        );
    }

    #[test]
    fn test_name_distinguishes_series() {
        let attrs = [KeyValue::string("a", "1")];
        assert_ne!(fingerprint("m1", &[&attrs]), fingerprint("m2", &[&attrs]));
    }
}
