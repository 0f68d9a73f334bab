use crate::{
    Result,
    constants::{
        CI_MAX_LENGTH, CI_MIN_LENGTH, EVENT_CODE_ALPHABET, EVENT_CODE_LENGTH,
        MAX_EVENT_CODE_LENGTH, PIN_MAX_LENGTH, PIN_MIN_LENGTH,
    },
    error::Error,
    fingerprint::{PinFingerprint, fingerprint},
};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Strip every character that is not an ASCII digit.
///
/// Both CIs and PINs go through this before any comparison or transport, so
/// `"1.234.567-8"` and `"12345678"` are the same CI. The function is
/// idempotent.
///
/// # Examples
///
/// ```
/// use guestgate_core::normalize_digits;
///
/// assert_eq!(normalize_digits("1.234.567-8"), "12345678");
/// assert_eq!(normalize_digits(" 48 21 "), "4821");
/// assert_eq!(normalize_digits("abc"), "");
/// ```
#[must_use]
pub fn normalize_digits(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// National identity number (CI), 7 or 8 digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ci(String);

impl Ci {
    /// Normalize and validate a CI.
    ///
    /// # Errors
    /// Returns `Error::Validation` if the normalized value does not have
    /// 7 or 8 digits.
    pub fn parse(raw: &str) -> Result<Self> {
        let digits = normalize_digits(raw);
        let len = digits.len();
        if !(CI_MIN_LENGTH..=CI_MAX_LENGTH).contains(&len) {
            return Err(Error::validation(format!(
                "CI must have {CI_MIN_LENGTH} or {CI_MAX_LENGTH} digits, got {len}"
            )));
        }
        Ok(Ci(digits))
    }

    /// Get the CI as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Ci {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Ci {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ci::parse(s)
    }
}

/// A door PIN attempt, normalized to 4-8 digits.
///
/// The plaintext only lives as long as this value. It has no `Display` or
/// `Serialize` implementation, its `Debug` output is redacted and the buffer
/// is overwritten on drop.
pub struct Pin(String);

impl Pin {
    /// Normalize and validate a PIN.
    ///
    /// # Errors
    /// Returns `Error::Validation` if the normalized value is not 4-8 digits.
    pub fn parse(raw: &str) -> Result<Self> {
        let digits = normalize_digits(raw);
        let len = digits.len();
        if !(PIN_MIN_LENGTH..=PIN_MAX_LENGTH).contains(&len) {
            return Err(Error::validation(format!(
                "PIN must have {PIN_MIN_LENGTH}-{PIN_MAX_LENGTH} digits, got {len}"
            )));
        }
        Ok(Pin(digits))
    }

    /// Fingerprint of the normalized digits.
    #[must_use]
    pub fn fingerprint(&self) -> PinFingerprint {
        fingerprint(&self.0)
    }

    /// Number of digits in the PIN.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Pin(****)")
    }
}

impl Drop for Pin {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl ZeroizeOnDrop for Pin {}

const _: () = assert!(256 % EVENT_CODE_ALPHABET.len() == 0);

/// Short public code that identifies an event at the door.
///
/// Codes are trimmed and upper-cased, so a code typed in lowercase still
/// finds its event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventCode(String);

impl EventCode {
    /// Normalize and validate an event code.
    ///
    /// # Errors
    /// Returns `Error::Validation` if the code is empty, too long or contains
    /// anything other than ASCII letters and digits.
    pub fn parse(raw: &str) -> Result<Self> {
        let code = raw.trim().to_ascii_uppercase();

        if code.is_empty() || code.len() > MAX_EVENT_CODE_LENGTH {
            return Err(Error::validation(format!(
                "Event code must be 1-{MAX_EVENT_CODE_LENGTH} characters"
            )));
        }

        if !code.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(Error::validation(
                "Event code must contain only letters and digits",
            ));
        }

        Ok(EventCode(code))
    }

    /// Generate a random code from [`EVENT_CODE_ALPHABET`].
    ///
    /// Each symbol comes from one random byte; the alphabet size divides 256
    /// so every symbol is equally likely.
    #[must_use]
    pub fn generate() -> Self {
        let random = uuid::Uuid::new_v4();
        let code = random
            .as_bytes()
            .iter()
            .take(EVENT_CODE_LENGTH)
            .map(|b| EVENT_CODE_ALPHABET[(*b as usize) % EVENT_CODE_ALPHABET.len()] as char)
            .collect();
        EventCode(code)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for EventCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        EventCode::parse(s)
    }
}
