//! Error types for the session crate.
//!
//! - `CodecError`: failures inside the cookie codec, split into decode
//!   failures (the cookie value is bad) and internal failures (we are)
//! - `SessionError`: what the session manager surfaces to callers; decode
//!   failures never appear here because they read as an anonymous session

use std::fmt;

/// Errors from the cookie codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The signing or encryption key is unusable.
    InvalidKey { reason: String },
    /// The session could not be serialized.
    Serialize { reason: String },
    /// Encryption of the payload failed.
    Encrypt { reason: String },
    /// The encoded value exceeds the maximum cookie size.
    ValueTooLong { length: usize },
    /// The cookie value is not in the expected layout.
    Malformed { reason: String },
    /// The signature does not match the value.
    InvalidMac,
    /// The timestamp is older than the configured lifetime.
    Expired { age_seconds: i64 },
    /// The timestamp lies too far in the future.
    TimestampInFuture { skew_seconds: i64 },
    /// The payload could not be decrypted.
    Decrypt,
    /// The decrypted payload is not a session.
    Payload { reason: String },
}

impl CodecError {
    /// Returns true if this error means the cookie value itself was rejected.
    ///
    /// Decode errors cover forged, tampered, stale, and foreign-key cookies.
    /// Everything else is a fault on the server side.
    #[must_use]
    pub fn is_decode(&self) -> bool {
        matches!(
            self,
            Self::Malformed { .. }
                | Self::InvalidMac
                | Self::Expired { .. }
                | Self::TimestampInFuture { .. }
                | Self::Decrypt
                | Self::Payload { .. }
        )
    }
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidKey { reason } => write!(f, "invalid codec key: {reason}"),
            Self::Serialize { reason } => write!(f, "failed to serialize session: {reason}"),
            Self::Encrypt { reason } => write!(f, "failed to encrypt session: {reason}"),
            Self::ValueTooLong { length } => {
                write!(f, "encoded session is {length} bytes, exceeding the cookie limit")
            }
            Self::Malformed { reason } => write!(f, "malformed cookie value: {reason}"),
            Self::InvalidMac => write!(f, "cookie signature mismatch"),
            Self::Expired { age_seconds } => {
                write!(f, "cookie expired ({age_seconds}s old)")
            }
            Self::TimestampInFuture { skew_seconds } => {
                write!(f, "cookie timestamp is {skew_seconds}s in the future")
            }
            Self::Decrypt => write!(f, "failed to decrypt cookie value"),
            Self::Payload { reason } => write!(f, "invalid session payload: {reason}"),
        }
    }
}

impl std::error::Error for CodecError {}

/// Errors surfaced by session operations.
///
/// All variants are server faults; none of them should be shown to a
/// caller beyond an opaque reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The codec could not be built from the configured keys.
    KeyConfiguration { reason: String },
    /// Encoding or decoding failed for a reason other than a bad cookie.
    Codec { reason: String },
    /// The random source for the login nonce failed.
    NonceGeneration { reason: String },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeyConfiguration { reason } => {
                write!(f, "session key configuration error: {reason}")
            }
            Self::Codec { reason } => write!(f, "session codec error: {reason}"),
            Self::NonceGeneration { reason } => {
                write!(f, "failed to generate login nonce: {reason}")
            }
        }
    }
}

impl std::error::Error for SessionError {}
