//! Key manager domain: configuration, errors, value types and pure checks.

pub mod config;
pub mod errors;
pub mod events;
pub mod headers;
pub mod requests;
pub mod scopes;
pub mod state;
pub mod verify;

pub use config::KeyManagerConfig;
pub use errors::{ErrorCode, KeyError, KeyResult};
pub use events::KeyEvent;
pub use requests::{CreateKeyRequest, RotateRequest};
pub use state::KeyState;
pub use verify::{CachedKeyState, KeyCarrier, RateLimitInfo, VerifyOptions, VerifyResult};
