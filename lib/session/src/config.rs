//! Session cookie configuration.

use std::fmt;

/// Default cookie name.
pub const DEFAULT_NAME: &str = "session";

/// Default session lifetime in seconds (one day).
pub const DEFAULT_LIFETIME_SECONDS: u64 = 86_400;

/// Settings for the session cookie and its codec.
///
/// Keys are raw byte material; decoding them from their text form is the
/// loader's job. The lifetime bounds both the cookie's `Max-Age` and the
/// age the codec accepts on decode.
#[derive(Clone)]
pub struct SessionConfig {
    name: String,
    sign_key: Vec<u8>,
    enc_key: Vec<u8>,
    lifetime: u64,
    domain: String,
}

impl SessionConfig {
    /// Creates a configuration with the default name, lifetime, and a
    /// host-only cookie.
    #[must_use]
    pub fn new(sign_key: Vec<u8>, enc_key: Vec<u8>) -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            sign_key,
            enc_key,
            lifetime: DEFAULT_LIFETIME_SECONDS,
            domain: String::new(),
        }
    }

    /// Sets the cookie name. An empty name keeps the default.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !name.is_empty() {
            self.name = name;
        }
        self
    }

    /// Sets the lifetime in seconds. Zero selects the default.
    #[must_use]
    pub fn with_lifetime(mut self, seconds: u64) -> Self {
        self.lifetime = if seconds == 0 {
            DEFAULT_LIFETIME_SECONDS
        } else {
            seconds
        };
        self
    }

    /// Sets the cookie domain. Empty means host-only.
    #[must_use]
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    /// Returns the cookie name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the signing key.
    #[must_use]
    pub fn sign_key(&self) -> &[u8] {
        &self.sign_key
    }

    /// Returns the encryption key.
    #[must_use]
    pub fn enc_key(&self) -> &[u8] {
        &self.enc_key
    }

    /// Returns the lifetime in seconds.
    #[must_use]
    pub fn lifetime(&self) -> u64 {
        self.lifetime
    }

    /// Returns the cookie domain, empty for host-only cookies.
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("name", &self.name)
            .field("sign_key", &"[redacted]")
            .field("enc_key", &"[redacted]")
            .field("lifetime", &self.lifetime)
            .field("domain", &self.domain)
            .finish()
    }
}
