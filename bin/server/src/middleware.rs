//! Gate middleware for protected routes.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use teamgate_provider::IdentityProvider;

use crate::app::AppState;

/// Runs the access gate with the configured membership rules.
///
/// Allowed requests continue with the caller's [`Session`] in their
/// extensions; anything else is answered by the gate.
///
/// [`Session`]: teamgate_session::Session
pub async fn require_membership<P: IdentityProvider>(
    State(state): State<AppState<P>>,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();

    match state.gateway.authorize(&parts, state.rules.as_ref()) {
        Ok(session) => {
            parts.extensions.insert(session);
            next.run(Request::from_parts(parts, body)).await
        }
        Err(outcome) => outcome.into_response(),
    }
}
