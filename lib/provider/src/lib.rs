//! OAuth identity provider access for teamgate.
//!
//! This crate provides:
//! - `OAuthConfig`: client credentials, endpoints, and scopes
//! - `IdentityProvider`: the operations the login flow needs from a provider
//! - `GitHubProvider`: the GitHub implementation

pub mod config;
pub mod error;
pub mod github;
pub mod provider;
pub mod types;

pub use config::{OAuthConfig, OAuthConfigBuilder};
pub use error::ProviderError;
pub use github::GitHubProvider;
pub use provider::IdentityProvider;
pub use types::{AccessToken, TeamMembership, UserIdentity};
