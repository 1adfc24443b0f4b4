//! Error types for the access crate.
//!
//! - `PolicyError`: authorization predicates failing to reach a decision
//! - `AccessError`: why a login flow step was aborted

use std::fmt;

/// Errors from authorization policies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    /// The policy could not decide, e.g. a backing lookup failed.
    Evaluation { reason: String },
    /// A membership rule could not be parsed.
    InvalidRule { rule: String, reason: String },
}

impl fmt::Display for PolicyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Evaluation { reason } => write!(f, "policy evaluation failed: {reason}"),
            Self::InvalidRule { rule, reason } => {
                write!(f, "invalid membership rule '{rule}': {reason}")
            }
        }
    }
}

impl std::error::Error for PolicyError {}

/// Reasons a login, callback, or logout step fails closed.
///
/// All of these are reported to the caller only as an opaque fault id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// Reading or writing the session cookie failed.
    Session { reason: String },
    /// A call to the identity provider failed.
    Provider { reason: String },
    /// The callback `state` does not match the session's nonce.
    StateMismatch,
    /// The callback carried no authorization code.
    MissingCode,
    /// The provider issued an empty or expired token.
    InvalidToken,
    /// An authorization policy failed to decide.
    Policy { reason: String },
}

impl fmt::Display for AccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Session { reason } => write!(f, "session error: {reason}"),
            Self::Provider { reason } => write!(f, "identity provider error: {reason}"),
            Self::StateMismatch => write!(f, "callback state does not match login nonce"),
            Self::MissingCode => write!(f, "callback is missing the authorization code"),
            Self::InvalidToken => write!(f, "identity provider returned an invalid token"),
            Self::Policy { reason } => write!(f, "authorization policy error: {reason}"),
        }
    }
}

impl std::error::Error for AccessError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_rule_display_names_rule() {
        let err = PolicyError::InvalidRule {
            rule: "a/b/c".to_string(),
            reason: "too many segments".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid membership rule 'a/b/c': too many segments"
        );
    }

    #[test]
    fn access_error_display() {
        assert!(AccessError::StateMismatch.to_string().contains("nonce"));
        assert!(
            AccessError::Provider {
                reason: "timeout".to_string()
            }
            .to_string()
            .contains("timeout")
        );
    }
}
