//! Opaque correlation identifiers for server faults.
//!
//! When a request fails because of something on our side, the detail is
//! logged under a freshly generated [`FaultId`] and the caller only ever
//! sees that identifier. Identifiers use ULID format so log lines sort by
//! time of failure.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use ulid::Ulid;

/// Marker reported in place of an identifier when randomness is unavailable.
pub const FALLBACK_FAULT_ID: &str = "fault_id_unavailable";

const PREFIX: &str = "fault";

/// Identifier correlating a user-facing error message with its log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FaultId(Option<Ulid>);

impl FaultId {
    /// Generates a new identifier from operating-system randomness.
    ///
    /// Generation never fails: if the random source cannot be read the
    /// returned identifier renders as [`FALLBACK_FAULT_ID`], so the fault
    /// can still be logged and reported.
    #[must_use]
    pub fn generate() -> Self {
        let mut random = [0u8; 16];
        match getrandom::fill(&mut random) {
            Ok(()) => Self(Some(Ulid::from_parts(
                unix_millis(),
                u128::from_be_bytes(random),
            ))),
            Err(_) => Self::fallback(),
        }
    }

    /// Returns the fixed fallback identifier.
    #[must_use]
    pub const fn fallback() -> Self {
        Self(None)
    }

    /// Returns true if this is the fallback marker rather than a real identifier.
    #[must_use]
    pub const fn is_fallback(&self) -> bool {
        self.0.is_none()
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or_default()
}

impl fmt::Display for FaultId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(ulid) => write!(f, "{PREFIX}_{ulid}"),
            None => f.write_str(FALLBACK_FAULT_ID),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_id_display_format() {
        let id = FaultId::generate();
        assert!(!id.is_fallback());
        assert!(id.to_string().starts_with("fault_"));
    }

    #[test]
    fn generated_ids_are_unique() {
        let a = FaultId::generate();
        let b = FaultId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn fallback_renders_fixed_marker() {
        let id = FaultId::fallback();
        assert!(id.is_fallback());
        assert_eq!(id.to_string(), FALLBACK_FAULT_ID);
    }
}
