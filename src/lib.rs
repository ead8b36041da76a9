//! otelui - in-memory OpenTelemetry receiver and telemetry inspector.
//!
//! otelui accepts logs, traces and metrics over OTLP, keeps them in memory
//! and serves snapshot queries to a display layer that refreshes on change
//! notifications.
//!
//! # Features
//!
//! - **OTLP receivers**: GRPC (port 4317) and HTTP protobuf/JSON (port 4318)
//! - **Trace assembly**: causal trees rebuilt on demand, tolerant of orphans and cycles
//! - **Metric series**: scalar points grouped by name and attribute fingerprint
//! - **Change notification**: bounded broadcast that never blocks ingestion
//!
//! # Architecture
//!
//! - `core`: configuration, errors and shared value types
//! - `logs`, `traces`, `metrics`: record types and their stores
//! - `storage`: the [`TelemetryStore`] coordinator and its query API
//! - `receiver`: OTLP protocol listeners
//! - `cli`: command-line interface
//!
//! # Example
//!
//! ```no_run
//! use otelui_lib::core::Config;
//! use otelui_lib::Application;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let app = Application::new(config)?;
//!     app.run().await?;
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]

pub mod application;
pub mod cli;
pub mod core;
pub mod demo;
pub mod logs;
pub mod metrics;
pub mod receiver;
pub mod storage;
pub mod traces;

pub use crate::application::Application;
pub use crate::core::{Config, Result};
pub use crate::storage::TelemetryStore;
