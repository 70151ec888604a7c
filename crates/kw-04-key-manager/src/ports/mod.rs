//! Key manager ports.
//!
//! Storage, cache, limiter, clock and logger come from their own crates;
//! the only port defined here is the lifecycle event listener.

pub mod listener;

pub use listener::KeyEventListener;
