//! OAuth client configuration.
//!
//! Describes how to reach the identity provider: client credentials, the
//! authorize and token endpoints, the REST API base, and the scopes to
//! request. Defaults target GitHub.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default authorization endpoint.
pub const DEFAULT_AUTH_URL: &str = "https://github.com/login/oauth/authorize";
/// Default token endpoint.
pub const DEFAULT_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
/// Default REST API base.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Configuration for the OAuth identity provider.
///
/// Fields with defaults can be omitted when loading from environment variables.
#[derive(Clone, Serialize, Deserialize)]
pub struct OAuthConfig {
    /// The OAuth2 client ID registered with the provider.
    client_id: String,
    /// The OAuth2 client secret.
    client_secret: String,
    /// Callback URL registered with the provider. When absent, the provider
    /// uses the one on file for the client.
    #[serde(default)]
    redirect_uri: Option<String>,
    /// Authorization endpoint.
    #[serde(default = "default_auth_url")]
    auth_url: String,
    /// Token endpoint.
    #[serde(default = "default_token_url")]
    token_url: String,
    /// REST API base used for user and team lookups.
    #[serde(default = "default_api_url")]
    api_url: String,
    /// OAuth2 scopes to request as a comma-separated string.
    /// Default: "read:org"
    #[serde(default = "default_scopes")]
    scopes: String,
}

fn default_auth_url() -> String {
    DEFAULT_AUTH_URL.to_string()
}

fn default_token_url() -> String {
    DEFAULT_TOKEN_URL.to_string()
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_scopes() -> String {
    "read:org".to_string()
}

impl OAuthConfig {
    /// Creates a configuration with GitHub endpoints and default scopes.
    #[must_use]
    pub fn new(client_id: String, client_secret: String) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_uri: None,
            auth_url: default_auth_url(),
            token_url: default_token_url(),
            api_url: default_api_url(),
            scopes: default_scopes(),
        }
    }

    /// Creates a configuration builder for more customization.
    #[must_use]
    pub fn builder(client_id: String, client_secret: String) -> OAuthConfigBuilder {
        OAuthConfigBuilder::new(client_id, client_secret)
    }

    /// Returns the OAuth2 client ID.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Returns the OAuth2 client secret.
    #[must_use]
    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    /// Returns the callback URL, if one is configured.
    #[must_use]
    pub fn redirect_uri(&self) -> Option<&str> {
        self.redirect_uri.as_deref()
    }

    /// Returns the authorization endpoint.
    #[must_use]
    pub fn auth_url(&self) -> &str {
        &self.auth_url
    }

    /// Returns the token endpoint.
    #[must_use]
    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    /// Returns the REST API base.
    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Returns the OAuth2 scopes to request, parsed from comma-separated string.
    #[must_use]
    pub fn scopes(&self) -> Vec<&str> {
        self.scopes
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }
}

impl fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[redacted]")
            .field("redirect_uri", &self.redirect_uri)
            .field("auth_url", &self.auth_url)
            .field("token_url", &self.token_url)
            .field("api_url", &self.api_url)
            .field("scopes", &self.scopes)
            .finish()
    }
}

/// Builder for `OAuthConfig`.
#[derive(Debug)]
pub struct OAuthConfigBuilder {
    config: OAuthConfig,
    scopes: Vec<String>,
}

impl OAuthConfigBuilder {
    /// Creates a new builder with required fields.
    #[must_use]
    pub fn new(client_id: String, client_secret: String) -> Self {
        Self {
            config: OAuthConfig::new(client_id, client_secret),
            scopes: vec![default_scopes()],
        }
    }

    /// Sets the callback URL.
    #[must_use]
    pub fn redirect_uri(mut self, uri: String) -> Self {
        self.config.redirect_uri = Some(uri);
        self
    }

    /// Sets the authorization endpoint.
    #[must_use]
    pub fn auth_url(mut self, url: String) -> Self {
        self.config.auth_url = url;
        self
    }

    /// Sets the token endpoint.
    #[must_use]
    pub fn token_url(mut self, url: String) -> Self {
        self.config.token_url = url;
        self
    }

    /// Sets the REST API base.
    #[must_use]
    pub fn api_url(mut self, url: String) -> Self {
        self.config.api_url = url;
        self
    }

    /// Adds a scope to the list of scopes to request.
    #[must_use]
    pub fn add_scope(mut self, scope: String) -> Self {
        if !self.scopes.contains(&scope) {
            self.scopes.push(scope);
        }
        self
    }

    /// Builds the `OAuthConfig`.
    #[must_use]
    pub fn build(self) -> OAuthConfig {
        OAuthConfig {
            scopes: self.scopes.join(","),
            ..self.config
        }
    }
}
