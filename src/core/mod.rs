//! Shared building blocks for otelui.
//!
//! Error type, configuration and the value types every telemetry kind
//! refers to (identifiers, attribute values, resource and scope).

pub mod config;
pub mod error;
pub mod types;

pub use config::{Config, ConfigBuilder};
pub use error::{OteluiError, Result};
pub use types::{
    nanos_to_string, AttributeValue, Attributes, InstrumentationScope, KeyValue, Resource, SpanId,
    TraceId,
};
