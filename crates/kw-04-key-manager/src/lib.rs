//! # Key Manager Subsystem (kw-04)
//!
//! Issues, verifies, rotates and revokes API keys on top of the key store,
//! the projection cache and the rate limiter.
//!
//! ## Lifecycle
//!
//! ```text
//!            disable            revoke
//!  Active ─────────────→ Disabled ──────→ Revoked (terminal)
//!    │   ←─────────────
//!    │       enable
//!    ├── rotate ──→ RotatedAway (terminal, revoked + rotated_to)
//!    └── time ────→ Expired (derived, never stored)
//! ```
//!
//! ## Verification Failure Codes
//!
//! | Step | Code |
//! |------|------|
//! | no secret in carrier | `MISSING_KEY` |
//! | required prefix absent | `INVALID_FORMAT` |
//! | unknown digest / stale projection | `INVALID_KEY` |
//! | `expires_at <= now` | `EXPIRED` |
//! | revoked or rotated away | `REVOKED` |
//! | disabled | `DISABLED` |
//! | limiter denial | `RATE_LIMIT_EXCEEDED` |
//!
//! A cache can make verification cheaper but never more permissive: a
//! cached positive is always re-confirmed against the stored record.
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - configuration, errors, request/result types, scope checks
//! - `ports/` - the lifecycle event listener
//! - `service/` - [`KeyManager`]

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::{
    CachedKeyState, CreateKeyRequest, ErrorCode, KeyCarrier, KeyError, KeyEvent,
    KeyManagerConfig, KeyResult, KeyState, RateLimitInfo, RotateRequest, VerifyOptions,
    VerifyResult,
};
pub use ports::KeyEventListener;
pub use service::{IssuedKey, KeyManager, KeyManagerDependencies, RotatedKey};
