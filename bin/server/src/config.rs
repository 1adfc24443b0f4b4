//! Centralized server configuration.
//!
//! Loaded via the `config` crate from an optional file named by
//! `TEAMGATE_CONFIG`, overlaid by `TEAMGATE__`-prefixed environment
//! variables (`__` separates nested keys, e.g.
//! `TEAMGATE__SESSION__SIGN_KEY`).
//!
//! See [`OAuthConfig`](teamgate_provider::OAuthConfig) for the identity
//! provider settings and [`AccessSettings`](teamgate_access::AccessSettings)
//! for the gate.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use rootcause::prelude::Report;
use serde::Deserialize;
use std::fmt;
use teamgate_access::{AccessSettings, MembershipRules};
use teamgate_provider::OAuthConfig;
use teamgate_session::SessionConfig;

/// Environment variable naming an optional configuration file.
pub const CONFIG_FILE_VAR: &str = "TEAMGATE_CONFIG";

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "TEAMGATE";

const MIN_SIGN_KEY_LEN: usize = 32;

/// URL-safe base64 that accepts keys with or without padding.
const KEY_ENCODING: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Server configuration composed from library configs.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Socket address to listen on.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Session cookie configuration.
    pub session: SessionSettings,

    /// OAuth identity provider configuration.
    pub oauth: OAuthConfig,

    /// Access gate configuration.
    #[serde(default)]
    pub access: AccessSettings,
}

fn default_listen_addr() -> String {
    "127.0.0.1:3000".to_string()
}

/// Session cookie settings in their configured (text) form.
#[derive(Clone, Deserialize)]
pub struct SessionSettings {
    /// Cookie name.
    #[serde(default = "default_cookie_name")]
    pub name: String,

    /// HMAC signing key, base64url encoded, at least 32 bytes decoded.
    #[serde(default)]
    pub sign_key: String,

    /// AES-GCM encryption key, base64url encoded, 16 or 32 bytes decoded.
    #[serde(default)]
    pub enc_key: String,

    /// Session lifetime in seconds. Zero selects the default.
    #[serde(default = "default_lifetime")]
    pub lifetime: u64,

    /// Cookie domain; empty for a host-only cookie.
    #[serde(default)]
    pub domain: String,
}

fn default_cookie_name() -> String {
    teamgate_session::config::DEFAULT_NAME.to_string()
}

fn default_lifetime() -> u64 {
    teamgate_session::config::DEFAULT_LIFETIME_SECONDS
}

impl fmt::Debug for SessionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionSettings")
            .field("name", &self.name)
            .field("sign_key", &"[redacted]")
            .field("enc_key", &"[redacted]")
            .field("lifetime", &self.lifetime)
            .field("domain", &self.domain)
            .finish()
    }
}

/// Errors that prevent the server from starting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartupError {
    /// Configuration could not be loaded or deserialized.
    Load { reason: String },
    /// A configuration value is missing or unusable.
    Invalid { field: &'static str, reason: String },
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load { reason } => write!(f, "failed to load configuration: {reason}"),
            Self::Invalid { field, reason } => {
                write!(f, "invalid configuration for {field}: {reason}")
            }
        }
    }
}

impl std::error::Error for StartupError {}

fn invalid(field: &'static str, reason: impl Into<String>) -> StartupError {
    StartupError::Invalid {
        field,
        reason: reason.into(),
    }
}

impl ServerConfig {
    /// Loads configuration from the optional file and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn load() -> Result<Self, Report<StartupError>> {
        let mut builder = config::Config::builder();
        if let Ok(path) = std::env::var(CONFIG_FILE_VAR) {
            builder = builder.add_source(config::File::with_name(&path));
        }

        let builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("access.allowed_teams")
                .try_parsing(true),
        );

        Self::from_builder(builder)
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, Report<StartupError>> {
        let config: Self = builder
            .build()
            .and_then(config::Config::try_deserialize)
            .map_err(|e| StartupError::Load {
                reason: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values that deserialization alone cannot.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), Report<StartupError>> {
        if self.oauth.client_id().trim().is_empty() {
            return Err(invalid("oauth.client_id", "must not be empty").into());
        }
        if self.oauth.client_secret().trim().is_empty() {
            return Err(invalid("oauth.client_secret", "must not be empty").into());
        }
        self.session_config()?;
        self.membership_rules()?;
        Ok(())
    }

    /// Decodes the session keys and builds the session configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError::Invalid`] if a key is missing, not base64url,
    /// or the wrong length.
    pub fn session_config(&self) -> Result<SessionConfig, Report<StartupError>> {
        let sign_key = decode_key("session.sign_key", &self.session.sign_key)?;
        if sign_key.len() < MIN_SIGN_KEY_LEN {
            return Err(invalid(
                "session.sign_key",
                format!(
                    "must decode to at least {MIN_SIGN_KEY_LEN} bytes, got {}",
                    sign_key.len()
                ),
            )
            .into());
        }

        let enc_key = decode_key("session.enc_key", &self.session.enc_key)?;
        if !matches!(enc_key.len(), 16 | 32) {
            return Err(invalid(
                "session.enc_key",
                format!("must decode to 16 or 32 bytes, got {}", enc_key.len()),
            )
            .into());
        }

        Ok(SessionConfig::new(sign_key, enc_key)
            .with_name(self.session.name.clone())
            .with_lifetime(self.session.lifetime)
            .with_domain(self.session.domain.clone()))
    }

    /// Parses the membership rules guarding protected routes.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError::Invalid`] for a malformed rule.
    pub fn membership_rules(&self) -> Result<MembershipRules, Report<StartupError>> {
        Ok(MembershipRules::parse(self.access.allowed_teams())
            .map_err(|e| invalid("access.allowed_teams", e.to_string()))?)
    }
}

fn decode_key(field: &'static str, encoded: &str) -> Result<Vec<u8>, StartupError> {
    let encoded = encoded.trim();
    if encoded.is_empty() {
        return Err(invalid(field, "is required"));
    }
    KEY_ENCODING
        .decode(encoded)
        .map_err(|e| invalid(field, format!("not valid base64url: {e}")))
}
