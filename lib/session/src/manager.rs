//! Reading sessions from requests and writing them back as cookies.

use axum_extra::extract::cookie::{Cookie, CookieJar};
use http::HeaderMap;
use rootcause::prelude::Report;
use std::fmt;
use std::sync::OnceLock;

use crate::codec::SessionCodec;
use crate::config::SessionConfig;
use crate::error::{CodecError, SessionError};
use crate::session::Session;

/// Reads and writes the session cookie.
///
/// The codec is built from the configured keys on first use and shared by
/// every request afterwards. A key configuration error is remembered, so
/// each later call reports the same fault instead of retrying.
pub struct SessionManager {
    config: SessionConfig,
    codec: OnceLock<Result<SessionCodec, CodecError>>,
}

impl SessionManager {
    /// Creates a manager. No key material is checked until first use.
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            codec: OnceLock::new(),
        }
    }

    /// Returns the configuration this manager was built with.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    fn codec(&self) -> Result<&SessionCodec, SessionError> {
        self.codec
            .get_or_init(|| {
                SessionCodec::new(
                    self.config.sign_key(),
                    self.config.enc_key(),
                    self.config.lifetime(),
                )
            })
            .as_ref()
            .map_err(|e| SessionError::KeyConfiguration {
                reason: e.to_string(),
            })
    }

    /// Reads the session carried by a request's `Cookie` headers.
    ///
    /// A missing cookie and a cookie that fails verification both produce an
    /// anonymous session; callers cannot tell them apart.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`] only for server-side faults, such as
    /// unusable keys.
    pub fn read(&self, headers: &HeaderMap) -> Result<Session, Report<SessionError>> {
        let jar = CookieJar::from_headers(headers);
        let Some(cookie) = jar.get(self.config.name()) else {
            return Ok(Session::default());
        };

        let codec = self.codec()?;
        match codec.decode(self.config.name(), cookie.value()) {
            Ok(session) => Ok(session),
            Err(e) if e.is_decode() => {
                tracing::debug!(error = %e, "discarding unreadable session cookie");
                Ok(Session::default())
            }
            Err(e) => Err(SessionError::Codec {
                reason: e.to_string(),
            }
            .into()),
        }
    }

    /// Encodes `session` into a cookie carrying the configured attributes.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`] if the keys are unusable or encoding fails.
    pub fn write(&self, session: &Session) -> Result<Cookie<'static>, Report<SessionError>> {
        let codec = self.codec()?;
        let value = codec
            .encode(self.config.name(), session)
            .map_err(|e| SessionError::Codec {
                reason: e.to_string(),
            })?;

        let max_age = i64::try_from(self.config.lifetime()).unwrap_or(i64::MAX);
        let mut cookie = Cookie::build((self.config.name().to_string(), value))
            .path("/")
            .secure(true)
            .http_only(true)
            .max_age(time::Duration::seconds(max_age));
        if !self.config.domain().is_empty() {
            cookie = cookie.domain(self.config.domain().to_string());
        }

        Ok(cookie.build())
    }

    /// Encodes `session` and renders it as a `Set-Cookie` header value.
    ///
    /// # Errors
    ///
    /// Same as [`write`](Self::write).
    pub fn write_header(&self, session: &Session) -> Result<String, Report<SessionError>> {
        Ok(self.write(session)?.to_string())
    }
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("config", &self.config)
            .field("codec_initialized", &self.codec.get().is_some())
            .finish()
    }
}
