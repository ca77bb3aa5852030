pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod observability;
pub mod pipeline;
pub mod types;

// Layered boundaries for application and infrastructure
pub mod app;
pub mod infra;

pub use config::Config;
pub use error::{Result, SalesError};
pub use pipeline::{Pipeline, PipelineRun, RunReport};
