//! Core types for the GuestGate door terminal.
//!
//! Everything here is pure: digit normalization, the CI / PIN / event code
//! value types, the PIN fingerprint function, the shared constants and the
//! error taxonomy used by the storage and terminal crates.

pub mod constants;
pub mod error;
pub mod fingerprint;
pub mod types;

pub use error::{Error, Result};
pub use fingerprint::{PinFingerprint, fingerprint};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
