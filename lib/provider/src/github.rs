//! GitHub as identity provider.
//!
//! Authorization and code exchange go through the `oauth2` client. Identity
//! and team lookups use the GitHub REST API directly:
//! - `GET /user` for the account handle
//! - `GET /user/teams?per_page=100&page=N`, following pages until a short one

use async_trait::async_trait;
use oauth2::basic::BasicClient;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, RedirectUrl, Scope,
    TokenResponse, TokenUrl,
};
use reqwest::header::ACCEPT;
use rootcause::prelude::Report;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use crate::config::OAuthConfig;
use crate::error::ProviderError;
use crate::provider::IdentityProvider;
use crate::types::{AccessToken, TeamMembership, UserIdentity};

/// Page size requested from list endpoints.
pub const PAGE_SIZE: usize = 100;

const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";
const USER_AGENT: &str = concat!("teamgate/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct GitHubUser {
    login: String,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitHubOrganization {
    login: String,
}

#[derive(Debug, Deserialize)]
struct GitHubTeam {
    slug: String,
    organization: GitHubOrganization,
}

/// Identity provider backed by GitHub (or GitHub Enterprise, given the
/// matching endpoints).
#[derive(Debug)]
pub struct GitHubProvider {
    config: OAuthConfig,
    auth_url: AuthUrl,
    token_url: TokenUrl,
    redirect_url: Option<RedirectUrl>,
    api_base: String,
    http: reqwest::Client,
}

impl GitHubProvider {
    /// Creates a provider, validating every configured URL up front.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Configuration`] if an endpoint URL is invalid
    /// or the HTTP client cannot be built.
    pub fn new(config: OAuthConfig) -> Result<Self, Report<ProviderError>> {
        let auth_url = AuthUrl::new(config.auth_url().to_string())
            .map_err(|e| configuration(format!("invalid auth URL: {e}")))?;
        let token_url = TokenUrl::new(config.token_url().to_string())
            .map_err(|e| configuration(format!("invalid token URL: {e}")))?;
        let redirect_url = config
            .redirect_uri()
            .map(|uri| RedirectUrl::new(uri.to_string()))
            .transpose()
            .map_err(|e| configuration(format!("invalid redirect URL: {e}")))?;

        Url::parse(config.api_url()).map_err(|e| configuration(format!("invalid API URL: {e}")))?;
        let api_base = config.api_url().trim_end_matches('/').to_string();

        // Token responses must not be followed through redirects.
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| configuration(format!("HTTP client error: {e}")))?;

        Ok(Self {
            config,
            auth_url,
            token_url,
            redirect_url,
            api_base,
            http,
        })
    }

    /// Returns the configuration this provider was built from.
    #[must_use]
    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    fn oauth_client(
        &self,
    ) -> BasicClient<
        oauth2::EndpointSet,
        oauth2::EndpointNotSet,
        oauth2::EndpointNotSet,
        oauth2::EndpointNotSet,
        oauth2::EndpointSet,
    > {
        let client = BasicClient::new(ClientId::new(self.config.client_id().to_string()))
            .set_client_secret(ClientSecret::new(self.config.client_secret().to_string()))
            .set_auth_uri(self.auth_url.clone())
            .set_token_uri(self.token_url.clone());

        match &self.redirect_url {
            Some(redirect_url) => client.set_redirect_uri(redirect_url.clone()),
            None => client,
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, ProviderError> {
        Url::parse(&format!("{}/{}", self.api_base, path)).map_err(|e| {
            ProviderError::Configuration {
                reason: format!("invalid API endpoint {path}: {e}"),
            }
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        token: &AccessToken,
    ) -> Result<T, Report<ProviderError>> {
        let endpoint = url.path().to_string();

        let response = self
            .http
            .get(url)
            .bearer_auth(token.secret())
            .header(ACCEPT, GITHUB_MEDIA_TYPE)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| ProviderError::Request {
                endpoint: endpoint.clone(),
                reason: e.to_string(),
            })?;

        let body = response.bytes().await.map_err(|e| ProviderError::Request {
            endpoint: endpoint.clone(),
            reason: e.to_string(),
        })?;

        Ok(serde_json::from_slice(&body).map_err(|e| ProviderError::Decode {
            endpoint,
            reason: e.to_string(),
        })?)
    }
}

fn configuration(reason: String) -> ProviderError {
    ProviderError::Configuration { reason }
}

#[async_trait]
impl IdentityProvider for GitHubProvider {
    fn authorization_url(&self, state: &str) -> Result<String, Report<ProviderError>> {
        let state = state.to_string();
        let client = self.oauth_client();
        let mut request = client.authorize_url(move || CsrfToken::new(state));

        for scope in self.config.scopes() {
            request = request.add_scope(Scope::new(scope.to_string()));
        }

        let (url, _state) = request.url();
        Ok(url.to_string())
    }

    #[instrument(skip_all)]
    async fn exchange_code(&self, code: &str) -> Result<AccessToken, Report<ProviderError>> {
        let client = self.oauth_client();
        let response = client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(&self.http)
            .await
            .map_err(|e| ProviderError::TokenExchange {
                reason: e.to_string(),
            })?;

        debug!(expires_in = ?response.expires_in(), "exchanged authorization code");

        Ok(AccessToken::with_expires_in(
            response.access_token().secret().clone(),
            response.expires_in(),
        ))
    }

    #[instrument(skip_all)]
    async fn current_user(
        &self,
        token: &AccessToken,
    ) -> Result<UserIdentity, Report<ProviderError>> {
        let user: GitHubUser = self.get_json(self.endpoint("user")?, token).await?;
        Ok(UserIdentity {
            login: user.login,
            name: user.name,
        })
    }

    #[instrument(skip_all)]
    async fn user_teams(
        &self,
        token: &AccessToken,
    ) -> Result<Vec<TeamMembership>, Report<ProviderError>> {
        let mut memberships = Vec::new();

        for page in 1usize.. {
            let mut url = self.endpoint("user/teams")?;
            url.query_pairs_mut()
                .append_pair("per_page", &PAGE_SIZE.to_string())
                .append_pair("page", &page.to_string());

            let teams: Vec<GitHubTeam> = self.get_json(url, token).await?;
            let count = teams.len();
            memberships.extend(
                teams
                    .into_iter()
                    .map(|team| TeamMembership::new(team.organization.login, team.slug)),
            );

            if count < PAGE_SIZE {
                break;
            }
        }

        debug!(teams = memberships.len(), "listed team memberships");
        Ok(memberships)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Query, State};
    use axum::http::header::AUTHORIZATION;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{Value, json};
    use std::sync::{Arc, Mutex};
    use tokio::net::TcpListener;

    #[derive(Deserialize)]
    struct PageQuery {
        page: usize,
        per_page: usize,
    }

    /// In-process stand-in for the GitHub REST API.
    #[derive(Clone, Default)]
    struct FakeApi {
        teams: usize,
        failing_page: Option<usize>,
        pages: Arc<Mutex<Vec<usize>>>,
    }

    async fn list_teams(
        State(api): State<FakeApi>,
        headers: HeaderMap,
        Query(query): Query<PageQuery>,
    ) -> Result<Json<Value>, StatusCode> {
        let bearer = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
        if bearer != Some("Bearer token-1") {
            return Err(StatusCode::UNAUTHORIZED);
        }
        api.pages.lock().expect("lock").push(query.page);
        if api.failing_page == Some(query.page) {
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }

        let start = (query.page - 1) * query.per_page;
        let end = api.teams.min(start + query.per_page);
        let teams = (start..end)
            .map(|i| json!({"slug": format!("team-{i}"), "organization": {"login": "acme"}}))
            .collect();
        Ok(Json(Value::Array(teams)))
    }

    async fn serve(api: FakeApi) -> GitHubProvider {
        let router = Router::new()
            .route("/user/teams", get(list_teams))
            .route(
                "/user",
                get(|| async { (StatusCode::BAD_GATEWAY, "upstream unavailable") }),
            )
            .with_state(api);

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("serve");
        });

        let config = OAuthConfig::builder("client".to_string(), "secret".to_string())
            .api_url(format!("http://{addr}"))
            .build();
        GitHubProvider::new(config).expect("provider")
    }

    fn provider() -> GitHubProvider {
        let config = OAuthConfig::builder("client-123".to_string(), "secret".to_string())
            .redirect_uri("https://gate.example.com/callback".to_string())
            .build();
        GitHubProvider::new(config).expect("provider")
    }

    fn token() -> AccessToken {
        AccessToken::new("token-1")
    }

    #[tokio::test]
    async fn full_page_fetches_the_next_one() {
        let api = FakeApi {
            teams: PAGE_SIZE + 3,
            ..FakeApi::default()
        };
        let provider = serve(api.clone()).await;

        let teams = provider.user_teams(&token()).await.expect("teams");

        assert_eq!(teams.len(), PAGE_SIZE + 3);
        assert_eq!(teams[0], TeamMembership::new("acme", "team-0"));
        assert_eq!(
            teams[PAGE_SIZE + 2],
            TeamMembership::new("acme", format!("team-{}", PAGE_SIZE + 2))
        );
        assert_eq!(*api.pages.lock().expect("lock"), vec![1, 2]);
    }

    #[tokio::test]
    async fn short_first_page_stops_listing() {
        let api = FakeApi {
            teams: 5,
            ..FakeApi::default()
        };
        let provider = serve(api.clone()).await;

        let teams = provider.user_teams(&token()).await.expect("teams");

        assert_eq!(teams.len(), 5);
        assert_eq!(*api.pages.lock().expect("lock"), vec![1]);
    }

    #[tokio::test]
    async fn exactly_full_page_ends_on_empty_page() {
        let api = FakeApi {
            teams: PAGE_SIZE,
            ..FakeApi::default()
        };
        let provider = serve(api.clone()).await;

        let teams = provider.user_teams(&token()).await.expect("teams");

        assert_eq!(teams.len(), PAGE_SIZE);
        assert_eq!(*api.pages.lock().expect("lock"), vec![1, 2]);
    }

    #[tokio::test]
    async fn failing_later_page_fails_whole_listing() {
        let api = FakeApi {
            teams: PAGE_SIZE * 3,
            failing_page: Some(2),
            ..FakeApi::default()
        };
        let provider = serve(api.clone()).await;

        assert!(provider.user_teams(&token()).await.is_err());
        assert_eq!(*api.pages.lock().expect("lock"), vec![1, 2]);
    }

    #[tokio::test]
    async fn rejected_token_is_an_error() {
        let api = FakeApi {
            teams: 5,
            ..FakeApi::default()
        };
        let provider = serve(api.clone()).await;

        let result = provider.user_teams(&AccessToken::new("other")).await;

        assert!(result.is_err());
        assert!(api.pages.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn error_status_from_user_endpoint_is_an_error() {
        let provider = serve(FakeApi::default()).await;
        assert!(provider.current_user(&token()).await.is_err());
    }

    #[test]
    fn authorization_url_carries_state_and_scopes() {
        let url = provider()
            .authorization_url("nonce-abc")
            .expect("authorization url");
        let url = Url::parse(&url).expect("parse");

        assert_eq!(url.host_str(), Some("github.com"));
        assert_eq!(url.path(), "/login/oauth/authorize");

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        let get = |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("state"), Some("nonce-abc"));
        assert_eq!(get("client_id"), Some("client-123"));
        assert_eq!(get("scope"), Some("read:org"));
        assert_eq!(get("response_type"), Some("code"));
        assert_eq!(
            get("redirect_uri"),
            Some("https://gate.example.com/callback")
        );
    }

    #[test]
    fn authorization_url_omits_redirect_when_unset() {
        let provider = GitHubProvider::new(OAuthConfig::new(
            "client-123".to_string(),
            "secret".to_string(),
        ))
        .expect("provider");
        let url = provider.authorization_url("s").expect("authorization url");
        assert!(!url.contains("redirect_uri"));
    }

    #[test]
    fn rejects_invalid_endpoint() {
        let config = OAuthConfig::builder("client".to_string(), "secret".to_string())
            .token_url("not a url".to_string())
            .build();
        assert!(GitHubProvider::new(config).is_err());
    }

    #[test]
    fn endpoint_joins_api_base() {
        let config = OAuthConfig::builder("client".to_string(), "secret".to_string())
            .api_url("https://ghe.example.com/api/v3/".to_string())
            .build();
        let provider = GitHubProvider::new(config).expect("provider");

        let url = provider.endpoint("user/teams").expect("endpoint");
        assert_eq!(url.as_str(), "https://ghe.example.com/api/v3/user/teams");
    }

    #[test]
    fn team_payload_decodes_organization_and_slug() {
        let body = r#"[
            {"id": 1, "slug": "ops", "name": "Ops", "organization": {"login": "acme", "id": 9}},
            {"id": 2, "slug": "web", "name": "Web", "organization": {"login": "acme", "id": 9}}
        ]"#;
        let teams: Vec<GitHubTeam> = serde_json::from_str(body).expect("decode");
        assert_eq!(teams.len(), 2);
        assert_eq!(teams[0].slug, "ops");
        assert_eq!(teams[1].organization.login, "acme");
    }

    #[test]
    fn user_payload_uses_login_handle() {
        let body = r#"{"login": "octocat", "name": "The Octocat", "id": 1}"#;
        let user: GitHubUser = serde_json::from_str(body).expect("decode");
        assert_eq!(user.login, "octocat");
        assert_eq!(user.name.as_deref(), Some("The Octocat"));

        let user: GitHubUser = serde_json::from_str(r#"{"login": "ghost", "name": null}"#)
            .expect("decode");
        assert!(user.name.is_none());
    }
}
