//! The OAuth login flow: login start, provider callback, and logout.
//!
//! Every step fails closed. Nothing from a failed callback is written back
//! to the cookie, so the caller's session stays as it was.

use axum::http::HeaderMap;
use axum::response::{IntoResponse, Redirect, Response};
use serde::Deserialize;
use subtle::ConstantTimeEq;
use teamgate_provider::IdentityProvider;
use teamgate_session::{Memberships, Session};
use tracing::{debug, info, warn};

use crate::error::AccessError;
use crate::gateway::Gateway;
use crate::response::{Fault, redirect_with, request_host, site_root};
use crate::target::sanitize_target;

/// Query parameters accepted by the login entry point.
#[derive(Debug, Default, Deserialize)]
pub struct LoginParams {
    /// Where to send the caller after a successful login.
    pub redirect: Option<String>,
}

/// Query parameters sent by the provider to the callback entry point.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    pub state: Option<String>,
    pub code: Option<String>,
}

type FlowResult = teamgate_core::Result<Response, AccessError>;

fn session_error(e: impl std::fmt::Display) -> AccessError {
    AccessError::Session {
        reason: e.to_string(),
    }
}

fn provider_error(e: impl std::fmt::Display) -> AccessError {
    AccessError::Provider {
        reason: e.to_string(),
    }
}

fn settle(result: FlowResult) -> Response {
    result.unwrap_or_else(|e| Fault::report(&e).into_response())
}

impl<P: IdentityProvider> Gateway<P> {
    /// Starts a login.
    ///
    /// An authenticated caller is sent straight on to its target. Anyone
    /// else gets a fresh nonce and a redirect to the provider.
    pub async fn login(&self, headers: &HeaderMap, params: LoginParams) -> Response {
        settle(self.try_login(headers, params))
    }

    /// Completes a login from the provider's redirect.
    pub async fn callback(&self, headers: &HeaderMap, params: CallbackParams) -> Response {
        settle(self.try_callback(headers, params).await)
    }

    /// Discards the session and redirects to the site root.
    pub async fn logout(&self, headers: &HeaderMap) -> Response {
        settle(self.try_logout(headers))
    }

    fn try_login(&self, headers: &HeaderMap, params: LoginParams) -> FlowResult {
        let mut session = self.sessions().read(headers).map_err(session_error)?;
        if session.is_authenticated() {
            return self.success(headers, session);
        }

        if session.target().is_empty() {
            if let Some(redirect) = params.redirect.as_deref() {
                match sanitize_target(
                    redirect,
                    request_host(headers),
                    self.sessions().config().domain(),
                ) {
                    Some(target) => session.set_target(target),
                    None => debug!(redirect, "ignoring off-site login redirect"),
                }
            }
        }

        let nonce = session.generate_nonce().map_err(session_error)?;
        let authorization_url = self
            .provider()
            .authorization_url(nonce)
            .map_err(provider_error)?;
        let cookie = self.sessions().write(&session).map_err(session_error)?;

        Ok(redirect_with(cookie, &authorization_url))
    }

    async fn try_callback(&self, headers: &HeaderMap, params: CallbackParams) -> FlowResult {
        let mut session = self.sessions().read(headers).map_err(session_error)?;
        if session.is_authenticated() {
            return self.success(headers, session);
        }

        if session.nonce().is_empty() {
            debug!("callback without a login in flight");
            return Ok(Redirect::to(&site_root(headers)).into_response());
        }

        let state = params.state.unwrap_or_default();
        if !bool::from(session.nonce().as_bytes().ct_eq(state.as_bytes())) {
            warn!("callback state does not match login nonce");
            return Err(AccessError::StateMismatch.into());
        }

        let code = params
            .code
            .filter(|code| !code.is_empty())
            .ok_or(AccessError::MissingCode)?;

        let token = self
            .provider()
            .exchange_code(&code)
            .await
            .map_err(provider_error)?;
        if !token.is_valid() {
            return Err(AccessError::InvalidToken.into());
        }

        let user = self
            .provider()
            .current_user(&token)
            .await
            .map_err(provider_error)?;
        let teams = self
            .provider()
            .user_teams(&token)
            .await
            .map_err(provider_error)?;

        let memberships: Memberships = teams
            .into_iter()
            .map(|team| (team.organization, team.slug))
            .collect();

        info!(
            login = %user.login,
            organizations = memberships.organizations().count(),
            "login completed"
        );
        session.complete_login(user.login, memberships);

        self.success(headers, session)
    }

    fn try_logout(&self, headers: &HeaderMap) -> FlowResult {
        let cookie = self
            .sessions()
            .write(&Session::default())
            .map_err(session_error)?;
        info!("session cleared");
        Ok(redirect_with(cookie, &site_root(headers)))
    }

    /// Consumes the recorded target, persists the session, and redirects
    /// to the target or the site root.
    fn success(&self, headers: &HeaderMap, mut session: Session) -> FlowResult {
        let target = session.take_target();
        let cookie = self.sessions().write(&session).map_err(session_error)?;

        let location = if target.is_empty() {
            site_root(headers)
        } else {
            target
        };
        Ok(redirect_with(cookie, &location))
    }
}
