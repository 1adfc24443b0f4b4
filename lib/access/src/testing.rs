//! Test doubles shared by the flow and gate tests.

use async_trait::async_trait;
use axum::http::HeaderMap;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::response::Response;
use rootcause::prelude::Report;
use std::sync::{Arc, Mutex};
use teamgate_provider::{AccessToken, IdentityProvider, ProviderError, TeamMembership, UserIdentity};
use teamgate_session::{Session, SessionConfig, SessionManager};

use crate::gateway::{AccessSettings, Gateway};

/// In-memory identity provider that records every call.
#[derive(Clone, Default)]
pub(crate) struct MockProvider {
    calls: Arc<Mutex<Vec<String>>>,
    teams: Vec<TeamMembership>,
    failing: Option<&'static str>,
    invalid_token: bool,
}

impl MockProvider {
    pub(crate) fn with_teams(mut self, teams: Vec<TeamMembership>) -> Self {
        self.teams = teams;
        self
    }

    pub(crate) fn failing(mut self, operation: &'static str) -> Self {
        self.failing = Some(operation);
        self
    }

    pub(crate) fn with_invalid_token(mut self) -> Self {
        self.invalid_token = true;
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("lock").clone()
    }

    fn record(&self, call: String, operation: &str) -> Result<(), Report<ProviderError>> {
        self.calls.lock().expect("lock").push(call);
        if self.failing == Some(operation) {
            return Err(ProviderError::Request {
                endpoint: operation.to_string(),
                reason: "scripted failure".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

#[async_trait]
impl IdentityProvider for MockProvider {
    fn authorization_url(&self, state: &str) -> Result<String, Report<ProviderError>> {
        Ok(format!("https://provider.test/authorize?state={state}"))
    }

    async fn exchange_code(&self, code: &str) -> Result<AccessToken, Report<ProviderError>> {
        self.record(format!("exchange_code:{code}"), "exchange_code")?;
        if self.invalid_token {
            return Ok(AccessToken::new(""));
        }
        Ok(AccessToken::new("token"))
    }

    async fn current_user(
        &self,
        _token: &AccessToken,
    ) -> Result<UserIdentity, Report<ProviderError>> {
        self.record("current_user".to_string(), "current_user")?;
        Ok(UserIdentity {
            login: "octocat".to_string(),
            name: Some("The Octocat".to_string()),
        })
    }

    async fn user_teams(
        &self,
        _token: &AccessToken,
    ) -> Result<Vec<TeamMembership>, Report<ProviderError>> {
        self.record("user_teams".to_string(), "user_teams")?;
        Ok(self.teams.clone())
    }
}

pub(crate) fn test_gateway(provider: MockProvider) -> Gateway<MockProvider> {
    test_gateway_with_keys(provider, vec![0x5A; 32])
}

pub(crate) fn test_gateway_with_keys(
    provider: MockProvider,
    sign_key: Vec<u8>,
) -> Gateway<MockProvider> {
    let sessions = SessionManager::new(SessionConfig::new(sign_key, vec![0xA5; 32]));
    Gateway::new(Arc::new(sessions), provider, AccessSettings::default())
}

/// Builds request headers carrying `session` as its cookie.
pub(crate) fn request_with_cookie<P>(gateway: &Gateway<P>, session: &Session) -> HeaderMap {
    let cookie = gateway.sessions().write(session).expect("write session");
    let mut headers = HeaderMap::new();
    headers.insert(
        COOKIE,
        format!("{}={}", cookie.name(), cookie.value())
            .parse()
            .expect("header"),
    );
    headers
}

/// Decodes the session a response sets, if it sets one.
pub(crate) fn session_cookie<P>(gateway: &Gateway<P>, response: &Response) -> Option<Session> {
    let set_cookie = response.headers().get(SET_COOKIE)?.to_str().ok()?;
    let pair = set_cookie.split(';').next()?;
    let mut headers = HeaderMap::new();
    headers.insert(COOKIE, pair.parse().ok()?);
    gateway.sessions().read(&headers).ok()
}
