pub mod app;
pub mod common;
pub mod config;
pub mod infra;
pub mod observability;
pub mod pipeline;

pub use app::forward_use_case::{ForwardUseCase, RunReport};
pub use common::error::{ConfigError, FetchError, ForwarderError, PublishError};
pub use config::ForwarderConfig;
