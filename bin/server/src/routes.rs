//! Request handlers.

use axum::Extension;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use html_escape::{encode_double_quoted_attribute, encode_text};
use teamgate_access::{CallbackParams, Fault, LoginParams, site_root};
use teamgate_provider::IdentityProvider;
use teamgate_session::Session;

use crate::app::AppState;

/// Starts a login.
pub async fn login<P: IdentityProvider>(
    State(state): State<AppState<P>>,
    headers: HeaderMap,
    Query(params): Query<LoginParams>,
) -> Response {
    state.gateway.login(&headers, params).await
}

/// Handles the identity provider's redirect back.
pub async fn callback<P: IdentityProvider>(
    State(state): State<AppState<P>>,
    headers: HeaderMap,
    Query(params): Query<CallbackParams>,
) -> Response {
    state.gateway.callback(&headers, params).await
}

/// Logs out.
pub async fn logout<P: IdentityProvider>(
    State(state): State<AppState<P>>,
    headers: HeaderMap,
) -> Response {
    state.gateway.logout(&headers).await
}

/// Landing page showing who is signed in.
pub async fn index<P: IdentityProvider>(
    State(state): State<AppState<P>>,
    headers: HeaderMap,
) -> Response {
    match state.gateway.sessions().read(&headers) {
        Ok(session) => Html(render_index(&session, state.gateway.settings().login_path()))
            .into_response(),
        Err(e) => Fault::report(&e).into_response(),
    }
}

/// Example resource behind the membership gate.
pub async fn protected(Extension(session): Extension<Session>) -> Html<String> {
    Html(format!(
        "<!DOCTYPE html>\n<html><head><title>teamgate</title></head><body>\
         <p>Welcome, {}. You have access.</p><p><a href=\"/\">Home</a></p></body></html>\n",
        encode_text(session.login())
    ))
}

/// There is no favicon.
pub async fn favicon() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "resource does not exist")
}

/// Anything unrouted goes back to the site root.
pub async fn fallback(headers: HeaderMap) -> Redirect {
    Redirect::to(&site_root(&headers))
}

fn render_index(session: &Session, login_path: &str) -> String {
    let body = if session.is_authenticated() {
        let memberships = session.memberships();
        let teams = if memberships.is_empty() {
            "<p>No team memberships.</p>".to_string()
        } else {
            let items: String = memberships
                .organizations()
                .map(|organization| {
                    let teams: Vec<_> = memberships
                        .teams(organization)
                        .map(|team| encode_text(team).into_owned())
                        .collect();
                    format!(
                        "<li>{}: {}</li>",
                        encode_text(organization),
                        teams.join(", ")
                    )
                })
                .collect();
            format!("<ul>{items}</ul>")
        };
        format!(
            "<p>Signed in as <strong>{}</strong>.</p>{teams}\
             <p><a href=\"/protected\">Protected page</a> | <a href=\"/logout\">Sign out</a></p>",
            encode_text(session.login())
        )
    } else {
        format!(
            "<p>You are not signed in.</p><p><a href=\"{}\">Sign in with GitHub</a></p>",
            encode_double_quoted_attribute(login_path)
        )
    };

    format!(
        "<!DOCTYPE html>\n<html><head><title>teamgate</title></head><body>\
         <h1>teamgate</h1>{body}</body></html>\n"
    )
}
