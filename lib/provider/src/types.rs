//! Values exchanged with the identity provider.

use std::fmt;
use time::{Duration, OffsetDateTime};

/// An OAuth access token.
#[derive(Clone)]
pub struct AccessToken {
    secret: String,
    expires_at: Option<OffsetDateTime>,
}

impl AccessToken {
    /// Creates a token with no known expiry.
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            expires_at: None,
        }
    }

    /// Creates a token from a token response's `expires_in`, counted from now.
    #[must_use]
    pub fn with_expires_in(secret: impl Into<String>, expires_in: Option<std::time::Duration>) -> Self {
        let expires_at = expires_in.map(|d| {
            let seconds = i64::try_from(d.as_secs()).unwrap_or(i64::MAX);
            OffsetDateTime::now_utc().saturating_add(Duration::seconds(seconds))
        });
        Self {
            secret: secret.into(),
            expires_at,
        }
    }

    /// Returns the bearer secret.
    #[must_use]
    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Returns when the token expires, if the provider said.
    #[must_use]
    pub fn expires_at(&self) -> Option<OffsetDateTime> {
        self.expires_at
    }

    /// Returns true if the token is non-empty and not yet expired.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.secret.is_empty()
            && self
                .expires_at
                .is_none_or(|at| at > OffsetDateTime::now_utc())
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("secret", &"[redacted]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// The authenticated account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    /// Unique account handle.
    pub login: String,
    /// Display name, if the account has one.
    pub name: Option<String>,
}

/// Membership of one team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamMembership {
    /// Organization the team belongs to.
    pub organization: String,
    /// Team slug.
    pub slug: String,
}

impl TeamMembership {
    /// Creates a membership record.
    #[must_use]
    pub fn new(organization: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            organization: organization.into(),
            slug: slug.into(),
        }
    }
}
