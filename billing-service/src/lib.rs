pub mod pipeline;
pub mod config;
pub mod engine;
pub mod sources;
pub mod sinks;
pub mod report;
pub mod observability;
pub mod metrics_export;
pub mod synthetic;

pub use pipeline::{Envelope, Pipeline, PipelineError};
