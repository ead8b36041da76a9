use chrono::{SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Rendered in place of a value the producer left unset.
pub const NULL_VALUE: &str = "(null)";

/// Identifier for a trace, stored as lower-case hex of the wire bytes
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TraceId(String);

/// Identifier for a span within a trace, stored as lower-case hex of the wire bytes
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpanId(String);

impl TraceId {
    /// Creates a trace id from an already hex-encoded string
    pub fn new<S: Into<String>>(id: S) -> Self {
        TraceId(id.into())
    }

    /// Hex-encodes raw wire bytes
    pub fn from_bytes(bytes: &[u8]) -> Self {
        TraceId(hex::encode(bytes))
    }

    /// Returns the string representation of the trace ID
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First six characters, used as the short form in list rows
    pub fn short(&self) -> &str {
        self.0.get(..6).unwrap_or(&self.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl SpanId {
    /// Creates a span id from an already hex-encoded string
    pub fn new<S: Into<String>>(id: S) -> Self {
        SpanId(id.into())
    }

    /// Hex-encodes raw wire bytes; an empty slice means "no id"
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.is_empty() {
            None
        } else {
            Some(SpanId(hex::encode(bytes)))
        }
    }

    /// Returns the string representation of the span ID
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Attribute and body values as carried by OTLP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum AttributeValue {
    String(String),
    Bool(bool),
    Int(i64),
    Double(f64),
    Array(Vec<AttributeValue>),
    #[serde(rename = "kvlist")]
    Map(Vec<KeyValue>),
    Bytes(Vec<u8>),
}

impl AttributeValue {
    /// Short type label shown next to attributes in detail views
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Double(_) => "double",
            Self::Array(_) => "array",
            Self::Map(_) => "kvlist",
            Self::Bytes(_) => "bytes",
        }
    }

    /// Returns the inner string for string values
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Double(d) => write!(f, "{d:.6}"),
            Self::Array(values) => {
                f.write_str("[")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_str("]")
            },
            Self::Map(pairs) => {
                f.write_str("{")?;
                for (i, kv) in pairs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "\"{}\":{}", kv.key, kv.display_value())?;
                }
                f.write_str("}")
            },
            Self::Bytes(bytes) => f.write_str(&hex::encode(bytes)),
        }
    }
}

/// A single attribute. `value` is `None` when the producer sent the key without a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: Option<AttributeValue>,
}

impl KeyValue {
    pub fn new<K: Into<String>>(key: K, value: AttributeValue) -> Self {
        Self {
            key: key.into(),
            value: Some(value),
        }
    }

    /// Convenience constructor for the common string case
    pub fn string<K: Into<String>, V: Into<String>>(key: K, value: V) -> Self {
        Self::new(key, AttributeValue::String(value.into()))
    }

    /// Display form of the value, `(null)` when unset
    pub fn display_value(&self) -> String {
        render_optional(self.value.as_ref())
    }
}

/// Renders an optional value, using the null marker for `None`
pub fn render_optional(value: Option<&AttributeValue>) -> String {
    value.map_or_else(|| NULL_VALUE.to_string(), ToString::to_string)
}

/// Ordered attribute set as received
pub type Attributes = Vec<KeyValue>;

/// Looks up the first attribute with the given key
pub fn find_attribute<'a>(attributes: &'a [KeyValue], key: &str) -> Option<&'a AttributeValue> {
    attributes
        .iter()
        .find(|kv| kv.key == key)
        .and_then(|kv| kv.value.as_ref())
}

/// The entity that produced the telemetry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub attributes: Attributes,
    pub schema_url: String,
}

impl Resource {
    /// Value of `service.name`, or `-` when the producer did not set one
    pub fn service_name(&self) -> String {
        find_attribute(&self.attributes, opentelemetry_semantic_conventions::resource::SERVICE_NAME)
            .map_or_else(|| "-".to_string(), ToString::to_string)
    }
}

/// The instrumentation library that emitted the telemetry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstrumentationScope {
    pub name: String,
    pub version: String,
    pub attributes: Attributes,
    pub schema_url: String,
}

/// Formats a unix-nanosecond timestamp as RFC 3339 with nanosecond precision
pub fn nanos_to_string(nanos: u64) -> String {
    let ts = i64::try_from(nanos).unwrap_or(i64::MAX);
    Utc.timestamp_nanos(ts).to_rfc3339_opts(SecondsFormat::Nanos, true)
}
