//! # Ports Layer
//!
//! The cache contract consumed by the rate limiter and the key manager.

pub mod cache;

pub use cache::*;
