//! # Integration Flows
//!
//! Each flow wires the real cache, limiter, store and key manager together
//! and runs against both store backends where the behaviour must match.

mod consistency;
mod lifecycle;
mod limits;
mod telemetry;
