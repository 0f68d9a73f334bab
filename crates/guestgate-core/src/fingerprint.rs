//! One-way PIN fingerprints.
//!
//! The organizer side stores `fingerprint(pin)` on the event and the door
//! side compares `fingerprint(attempt)` against it. The plaintext is never
//! stored and never compared directly.
//!
//! The fingerprint is the SHA-256 digest of the UTF-8 bytes, rendered as 64
//! lowercase hex characters. Callers are expected to normalize the PIN to
//! digits first (see [`Pin`](crate::Pin)).

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt::{self, Write};
use subtle::ConstantTimeEq;

/// Stored fingerprint of a door PIN.
///
/// # Security
/// Equality is constant-time so that comparing an attempt against the stored
/// value does not leak how many leading characters matched.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PinFingerprint(String);

/// Compute the fingerprint of a plaintext.
///
/// Pure and deterministic; accepts any string.
///
/// # Examples
///
/// ```
/// use guestgate_core::fingerprint;
///
/// let stored = fingerprint("4821");
/// assert_eq!(stored, fingerprint("4821"));
/// assert_ne!(stored, fingerprint("4822"));
/// assert_eq!(stored.as_str().len(), 64);
/// ```
#[must_use]
pub fn fingerprint(plaintext: &str) -> PinFingerprint {
    let digest = Sha256::digest(plaintext.as_bytes());
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        // Writing into a String cannot fail
        let _ = write!(out, "{byte:02x}");
    }
    PinFingerprint(out)
}

impl PinFingerprint {
    /// Wrap a fingerprint loaded from storage.
    #[must_use]
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Whether a PIN attempt fingerprints to this stored value.
    #[must_use]
    pub fn matches(&self, attempt: &crate::Pin) -> bool {
        attempt.fingerprint() == *self
    }
}

impl PartialEq for PinFingerprint {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_bytes().ct_eq(other.0.as_bytes()).into()
    }
}

impl fmt::Display for PinFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
