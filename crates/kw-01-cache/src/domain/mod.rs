//! # Domain Layer
//!
//! Cache errors and configuration. No I/O.

pub mod config;
pub mod errors;

pub use config::*;
pub use errors::*;
