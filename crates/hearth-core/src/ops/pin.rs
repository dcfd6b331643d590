//! Parent PIN management.
//!
//! The stored hash is a 32-bit FNV-1a checksum over the PIN's UTF-16 code
//! units, rendered as eight lowercase hex digits. It keeps casual users out
//! and nothing more. An empty hash means no PIN is set.

use crate::error::ErrorCode;
use crate::model::Snapshot;

const FNV_OFFSET: u32 = 2_166_136_261;
const FNV_PRIME: u32 = 16_777_619;
const PIN_LEN: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PinError {
    #[error("PIN must be exactly 4 digits.")]
    InvalidFormat,
}

impl PinError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidFormat => ErrorCode::InvalidPin,
        }
    }

    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}

#[must_use]
pub fn hash_pin(pin: &str) -> String {
    let hash = pin
        .encode_utf16()
        .fold(FNV_OFFSET, |acc, unit| (acc ^ u32::from(unit)).wrapping_mul(FNV_PRIME));
    format!("{hash:08x}")
}

#[must_use]
pub fn has_pin(snapshot: &Snapshot) -> bool {
    !snapshot.settings.parent_pin_hash.is_empty()
}

/// Store the hash of `pin`, or clear the PIN when `pin` is empty.
///
/// # Errors
///
/// Returns [`PinError::InvalidFormat`] unless `pin` is empty or exactly
/// four ASCII digits.
pub fn set_parent_pin(snapshot: &Snapshot, pin: &str) -> Result<Snapshot, PinError> {
    let mut settings = snapshot.settings.clone();
    if pin.is_empty() {
        settings.parent_pin_hash = String::new();
    } else if pin.len() == PIN_LEN && pin.bytes().all(|b| b.is_ascii_digit()) {
        settings.parent_pin_hash = hash_pin(pin);
    } else {
        return Err(PinError::InvalidFormat);
    }
    Ok(snapshot.with_settings(settings))
}

/// True when no PIN is set or `pin` hashes to the stored value.
#[must_use]
pub fn verify_pin(snapshot: &Snapshot, pin: &str) -> bool {
    !has_pin(snapshot) || hash_pin(pin) == snapshot.settings.parent_pin_hash
}
