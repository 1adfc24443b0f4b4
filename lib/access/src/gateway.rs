//! The gateway: session manager, identity provider, and access settings
//! bundled behind the login, callback, logout, and gate entry points.

use serde::Deserialize;
use std::sync::Arc;
use teamgate_session::SessionManager;

/// Settings for the access layer.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessSettings {
    /// Path of the login entry point that the gate redirects to.
    /// Default: "/auth"
    #[serde(default = "default_login_path")]
    login_path: String,
    /// Membership rules (`org` or `org/team`) guarding protected routes.
    /// Empty allows every authenticated user.
    #[serde(default)]
    allowed_teams: Vec<String>,
}

fn default_login_path() -> String {
    "/auth".to_string()
}

impl Default for AccessSettings {
    fn default() -> Self {
        Self {
            login_path: default_login_path(),
            allowed_teams: Vec::new(),
        }
    }
}

impl AccessSettings {
    /// Sets the login entry point path.
    #[must_use]
    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    /// Sets the membership rules for protected routes.
    #[must_use]
    pub fn with_allowed_teams(mut self, rules: Vec<String>) -> Self {
        self.allowed_teams = rules;
        self
    }

    /// Returns the login entry point path.
    #[must_use]
    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// Returns the membership rules in text form.
    #[must_use]
    pub fn allowed_teams(&self) -> &[String] {
        &self.allowed_teams
    }
}

/// Entry points for authentication and access control.
///
/// Holds no per-request state; every method decodes the caller's session
/// from its own request and writes the result back into its own response.
#[derive(Debug)]
pub struct Gateway<P> {
    sessions: Arc<SessionManager>,
    provider: P,
    settings: AccessSettings,
}

impl<P> Gateway<P> {
    /// Creates a gateway.
    #[must_use]
    pub fn new(sessions: Arc<SessionManager>, provider: P, settings: AccessSettings) -> Self {
        Self {
            sessions,
            provider,
            settings,
        }
    }

    /// Returns the session manager.
    #[must_use]
    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Returns the identity provider.
    #[must_use]
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Returns the access settings.
    #[must_use]
    pub fn settings(&self) -> &AccessSettings {
        &self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_defaults() {
        let settings = AccessSettings::default();
        assert_eq!(settings.login_path(), "/auth");
        assert!(settings.allowed_teams().is_empty());
    }

    #[test]
    fn settings_deserialize_with_defaults() {
        let settings: AccessSettings =
            serde_json::from_str(r#"{"allowed_teams": ["acme/ops"]}"#).expect("deserialize");
        assert_eq!(settings.login_path(), "/auth");
        assert_eq!(settings.allowed_teams(), ["acme/ops".to_string()]);
    }
}
