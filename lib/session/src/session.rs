//! The client-held session record.
//!
//! A session moves through three conceptual states, derived from its fields
//! rather than stored: anonymous (nothing set), pending login (a nonce is
//! waiting for the provider callback), and authenticated (a login is set).

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::SessionError;

/// Number of random bytes behind each login nonce.
pub const NONCE_BYTES: usize = 16;

/// Team memberships grouped by organization.
///
/// Team order is irrelevant; each organization maps to a set of team slugs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Memberships(BTreeMap<String, BTreeSet<String>>);

impl Memberships {
    /// Creates an empty membership map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records membership of `team` within `organization`.
    pub fn insert(&mut self, organization: impl Into<String>, team: impl Into<String>) {
        self.0
            .entry(organization.into())
            .or_default()
            .insert(team.into());
    }

    /// Returns true if the user belongs to `team` within `organization`.
    #[must_use]
    pub fn is_member(&self, organization: &str, team: &str) -> bool {
        self.0
            .get(organization)
            .is_some_and(|teams| teams.contains(team))
    }

    /// Returns true if the user belongs to any team within `organization`.
    #[must_use]
    pub fn is_org_member(&self, organization: &str) -> bool {
        self.0
            .get(organization)
            .is_some_and(|teams| !teams.is_empty())
    }

    /// Returns the team slugs held within `organization`.
    pub fn teams(&self, organization: &str) -> impl Iterator<Item = &str> {
        self.0
            .get(organization)
            .into_iter()
            .flat_map(|teams| teams.iter().map(String::as_str))
    }

    /// Returns the organizations with at least one recorded team.
    pub fn organizations(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Returns true if no memberships are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<O, T> FromIterator<(O, T)> for Memberships
where
    O: Into<String>,
    T: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (O, T)>>(iter: I) -> Self {
        let mut memberships = Self::new();
        for (organization, team) in iter {
            memberships.insert(organization, team);
        }
        memberships
    }
}

/// Where a session sits in the login lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Neither a login nor a nonce is set.
    Anonymous,
    /// A login is in flight and awaiting the provider callback.
    PendingLogin,
    /// The OAuth exchange completed successfully.
    Authenticated,
}

/// The session record carried in the session cookie.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    nonce: String,
    login: String,
    memberships: Memberships,
    target: String,
}

impl Session {
    /// Creates an authenticated session.
    #[must_use]
    pub fn authenticated(login: impl Into<String>, memberships: Memberships) -> Self {
        Self {
            login: login.into(),
            memberships,
            ..Self::default()
        }
    }

    pub(crate) fn from_parts(
        nonce: String,
        login: String,
        memberships: Memberships,
        target: String,
    ) -> Self {
        Self {
            nonce,
            login,
            memberships,
            target,
        }
    }

    /// Returns the in-flight login nonce, or an empty string.
    #[must_use]
    pub fn nonce(&self) -> &str {
        &self.nonce
    }

    /// Returns the provider account handle, or an empty string when anonymous.
    #[must_use]
    pub fn login(&self) -> &str {
        &self.login
    }

    /// Returns the team memberships recorded at login.
    #[must_use]
    pub fn memberships(&self) -> &Memberships {
        &self.memberships
    }

    /// Returns the recorded post-login destination, or an empty string.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Returns the lifecycle state. A session carrying both a login and a
    /// nonce counts as authenticated.
    #[must_use]
    pub fn state(&self) -> SessionState {
        if !self.login.is_empty() {
            SessionState::Authenticated
        } else if !self.nonce.is_empty() {
            SessionState::PendingLogin
        } else {
            SessionState::Anonymous
        }
    }

    /// Returns true if the session completed an OAuth exchange.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state() == SessionState::Authenticated
    }

    /// Returns true if a login is in flight.
    #[must_use]
    pub fn is_pending_login(&self) -> bool {
        self.state() == SessionState::PendingLogin
    }

    /// Replaces the nonce with a fresh random value and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NonceGeneration`] if the operating system
    /// random source is unavailable.
    pub fn generate_nonce(&mut self) -> Result<&str, SessionError> {
        let mut bytes = [0u8; NONCE_BYTES];
        getrandom::fill(&mut bytes).map_err(|e| SessionError::NonceGeneration {
            reason: e.to_string(),
        })?;
        self.nonce = URL_SAFE_NO_PAD.encode(bytes);
        Ok(&self.nonce)
    }

    /// Records the post-login destination.
    pub fn set_target(&mut self, target: impl Into<String>) {
        self.target = target.into();
    }

    /// Removes and returns the post-login destination.
    pub fn take_target(&mut self) -> String {
        std::mem::take(&mut self.target)
    }

    /// Marks the login as complete: sets the login and memberships together
    /// and discards the nonce.
    pub fn complete_login(&mut self, login: impl Into<String>, memberships: Memberships) {
        self.login = login.into();
        self.memberships = memberships;
        self.nonce.clear();
    }
}
