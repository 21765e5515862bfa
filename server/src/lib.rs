#![forbid(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod logging;

pub use config::Configuration;
pub use error::{ApiError, ServerError};
