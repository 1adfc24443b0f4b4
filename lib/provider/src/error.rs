//! Identity provider error types.

use std::fmt;

/// Errors from talking to the identity provider.
///
/// Every variant is a server fault from the gateway's point of view; none
/// of the detail is meant for the end user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The client configuration is unusable (bad endpoint URL, etc.).
    Configuration { reason: String },
    /// The authorization code could not be exchanged for a token.
    TokenExchange { reason: String },
    /// An API request could not be sent or returned an error status.
    Request { endpoint: String, reason: String },
    /// An API response body could not be decoded.
    Decode { endpoint: String, reason: String },
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration { reason } => {
                write!(f, "provider configuration error: {reason}")
            }
            Self::TokenExchange { reason } => write!(f, "token exchange failed: {reason}"),
            Self::Request { endpoint, reason } => {
                write!(f, "request to {endpoint} failed: {reason}")
            }
            Self::Decode { endpoint, reason } => {
                write!(f, "failed to decode response from {endpoint}: {reason}")
            }
        }
    }
}

impl std::error::Error for ProviderError {}
