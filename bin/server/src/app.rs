//! Application state and routing.

use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::get;
use std::sync::Arc;
use teamgate_access::{Gateway, MembershipRules};
use teamgate_provider::IdentityProvider;
use tower_http::trace::TraceLayer;

use crate::middleware::require_membership;
use crate::routes;

/// Shared application state.
pub struct AppState<P> {
    /// Login flow and gate.
    pub gateway: Arc<Gateway<P>>,
    /// Rules guarding the protected routes.
    pub rules: Arc<MembershipRules>,
}

impl<P> AppState<P> {
    /// Creates a new application state.
    pub fn new(gateway: Gateway<P>, rules: MembershipRules) -> Self {
        Self {
            gateway: Arc::new(gateway),
            rules: Arc::new(rules),
        }
    }
}

impl<P> Clone for AppState<P> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            rules: Arc::clone(&self.rules),
        }
    }
}

/// Builds the router.
pub fn router<P: IdentityProvider + 'static>(state: AppState<P>) -> Router {
    let login_path = state.gateway.settings().login_path().to_string();

    let protected = Router::new()
        .route("/protected", get(routes::protected))
        .route_layer(from_fn_with_state(state.clone(), require_membership::<P>));

    Router::new()
        .route("/", get(routes::index::<P>))
        .route(&login_path, get(routes::login::<P>))
        .route("/callback", get(routes::callback::<P>))
        .route("/logout", get(routes::logout::<P>))
        .route("/favicon.ico", get(routes::favicon))
        .merge(protected)
        .fallback(routes::fallback)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::header::{COOKIE, HOST, LOCATION, SET_COOKIE};
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use rootcause::prelude::Report;
    use teamgate_access::AccessSettings;
    use teamgate_provider::{
        AccessToken, IdentityProvider, ProviderError, TeamMembership, UserIdentity,
    };
    use teamgate_session::{Memberships, Session, SessionConfig, SessionManager};
    use tower::ServiceExt;

    struct StubProvider;

    #[async_trait]
    impl IdentityProvider for StubProvider {
        fn authorization_url(&self, state: &str) -> Result<String, Report<ProviderError>> {
            Ok(format!("https://github.test/login/oauth/authorize?state={state}"))
        }

        async fn exchange_code(&self, _code: &str) -> Result<AccessToken, Report<ProviderError>> {
            Ok(AccessToken::new("token"))
        }

        async fn current_user(
            &self,
            _token: &AccessToken,
        ) -> Result<UserIdentity, Report<ProviderError>> {
            Ok(UserIdentity {
                login: "octocat".to_string(),
                name: None,
            })
        }

        async fn user_teams(
            &self,
            _token: &AccessToken,
        ) -> Result<Vec<TeamMembership>, Report<ProviderError>> {
            Ok(vec![TeamMembership::new("acme", "ops")])
        }
    }

    fn sessions() -> Arc<SessionManager> {
        Arc::new(SessionManager::new(SessionConfig::new(
            vec![0x42; 32],
            vec![0x24; 32],
        )))
    }

    fn app() -> (Router, Arc<SessionManager>) {
        let sessions = sessions();
        let gateway = Gateway::new(
            Arc::clone(&sessions),
            StubProvider,
            AccessSettings::default(),
        );
        let rules = MembershipRules::parse(&["acme/ops"]).expect("rules");
        (router(AppState::new(gateway, rules)), sessions)
    }

    fn get(uri: &str, session: Option<(&SessionManager, &Session)>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri).header(HOST, "gate.example.com");
        if let Some((sessions, session)) = session {
            let cookie = sessions.write(session).expect("write");
            builder = builder.header(COOKIE, format!("session={}", cookie.value()));
        }
        builder.body(Body::empty()).expect("request")
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        String::from_utf8(bytes.to_vec()).expect("utf8")
    }

    #[tokio::test]
    async fn favicon_is_not_found() {
        let (app, _) = app();
        let response = app.oneshot(get("/favicon.ico", None)).await.expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_text(response).await, "resource does not exist");
    }

    #[tokio::test]
    async fn unknown_paths_redirect_to_root() {
        let (app, _) = app();
        let response = app.oneshot(get("/nowhere", None)).await.expect("response");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "https://gate.example.com/");
    }

    #[tokio::test]
    async fn index_renders_for_anonymous_callers() {
        let (app, _) = app();
        let response = app.oneshot(get("/", None)).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("not signed in"));
    }

    #[tokio::test]
    async fn login_route_redirects_to_provider() {
        let (app, _) = app();
        let response = app
            .oneshot(get("/auth?redirect=%2Fprotected", None))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(
            response.headers()[LOCATION]
                .to_str()
                .expect("location")
                .starts_with("https://github.test/login/oauth/authorize?state=")
        );
        assert!(response.headers().get(SET_COOKIE).is_some());
    }

    #[tokio::test]
    async fn protected_route_sends_anonymous_to_login() {
        let (app, _) = app();
        let response = app.oneshot(get("/protected", None)).await.expect("response");

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers()[LOCATION],
            "/auth?redirect=https%3A%2F%2Fgate.example.com%2Fprotected"
        );
    }

    #[tokio::test]
    async fn protected_route_admits_members() {
        let (app, sessions) = app();
        let session = Session::authenticated(
            "octocat",
            [("acme", "ops")].into_iter().collect(),
        );

        let response = app
            .oneshot(get("/protected", Some((&sessions, &session))))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("Welcome, octocat"));
    }

    #[tokio::test]
    async fn protected_route_rejects_non_members() {
        let (app, sessions) = app();
        let session = Session::authenticated("ghost", Memberships::new());

        let response = app
            .oneshot(get("/protected", Some((&sessions, &session))))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_text(response).await, "Not authorized");
    }

    #[tokio::test]
    async fn full_login_round_trip() {
        let (app, sessions) = app();

        let start = app
            .clone()
            .oneshot(get("/auth?redirect=%2Fprotected", None))
            .await
            .expect("response");
        let cookie = start.headers()[SET_COOKIE].to_str().expect("cookie");
        let pair = cookie.split(';').next().expect("pair").to_string();

        let mut headers = axum::http::HeaderMap::new();
        headers.insert(COOKIE, pair.parse().expect("header"));
        let pending = sessions.read(&headers).expect("read");

        let callback = Request::builder()
            .uri(format!("/callback?state={}&code=abc", pending.nonce()))
            .header(HOST, "gate.example.com")
            .header(COOKIE, pair)
            .body(Body::empty())
            .expect("request");
        let response = app.oneshot(callback).await.expect("response");

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/protected");
    }

    #[tokio::test]
    async fn logout_route_clears_session() {
        let (app, sessions) = app();
        let session = Session::authenticated("octocat", Memberships::new());

        let response = app
            .oneshot(get("/logout", Some((&sessions, &session))))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let cookie = response.headers()[SET_COOKIE].to_str().expect("cookie");
        let mut headers = axum::http::HeaderMap::new();
        headers.insert(
            COOKIE,
            cookie.split(';').next().expect("pair").parse().expect("header"),
        );
        assert_eq!(sessions.read(&headers).expect("read"), Session::default());
    }
}
