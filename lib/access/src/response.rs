//! Response shapes shared by the login flow and the gate.

use axum::http::{HeaderMap, StatusCode, header::HOST};
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use std::fmt;
use teamgate_core::FaultId;

/// Body returned for a rejected, authenticated caller.
pub const NOT_AUTHORIZED: &str = "Not authorized";

/// A server fault, reported to the caller only by its correlation id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fault(FaultId);

impl Fault {
    /// Logs `error` under a fresh fault id and returns the fault.
    pub fn report(error: &dyn fmt::Display) -> Self {
        let id = FaultId::generate();
        tracing::error!(fault_id = %id, error = %error, "request failed");
        Self(id)
    }

    /// Returns the correlation id.
    #[must_use]
    pub fn id(&self) -> FaultId {
        self.0
    }
}

impl IntoResponse for Fault {
    fn into_response(self) -> Response {
        fault_response(self.0)
    }
}

pub(crate) fn fault_response(id: FaultId) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("server error while processing request: {id}"),
    )
        .into_response()
}

/// Returns the request's `Host` header, if present and readable.
#[must_use]
pub fn request_host(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(HOST)
        .and_then(|value| value.to_str().ok())
        .filter(|host| !host.is_empty())
}

/// Returns the absolute URL of the site root for this request.
///
/// Falls back to a relative `/` when the request names no host.
#[must_use]
pub fn site_root(headers: &HeaderMap) -> String {
    match request_host(headers) {
        Some(host) => format!("https://{host}/"),
        None => "/".to_string(),
    }
}

/// A 303 redirect that also sets the session cookie.
pub(crate) fn redirect_with(cookie: Cookie<'static>, location: &str) -> Response {
    (CookieJar::new().add(cookie), Redirect::to(location)).into_response()
}
