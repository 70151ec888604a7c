//! Limiter configuration, results and errors.

pub mod config;
pub mod errors;
pub mod result;

pub use config::RateLimitConfig;
pub use errors::RateLimitError;
pub use result::{CheckOptions, RateLimitResult};
