//! The access gate.
//!
//! Protected handlers call the gate before doing their own work. It decides
//! between sending the caller to log in, rejecting them, and letting the
//! request through, with the final say given to an [`AccessPolicy`].

use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Redirect, Response};
use teamgate_core::FaultId;
use teamgate_session::Session;
use tracing::{debug, info};
use url::form_urlencoded;

use crate::error::{AccessError, PolicyError};
use crate::gateway::Gateway;
use crate::membership::MembershipRules;
use crate::response::{Fault, NOT_AUTHORIZED, fault_response, request_host};

/// Decides whether an authenticated session may access a request.
pub trait AccessPolicy: Send + Sync {
    /// Returns whether `session` may proceed with `request`.
    ///
    /// # Errors
    ///
    /// Returns a [`PolicyError`] if no decision could be reached; the gate
    /// treats this as a server fault.
    fn is_allowed(&self, request: &Parts, session: &Session) -> Result<bool, PolicyError>;
}

impl<F> AccessPolicy for F
where
    F: Fn(&Parts, &Session) -> Result<bool, PolicyError> + Send + Sync,
{
    fn is_allowed(&self, request: &Parts, session: &Session) -> Result<bool, PolicyError> {
        self(request, session)
    }
}

impl AccessPolicy for MembershipRules {
    fn is_allowed(&self, _request: &Parts, session: &Session) -> Result<bool, PolicyError> {
        Ok(self.allows(session.memberships()))
    }
}

/// What the gate decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// The caller's own handler may proceed.
    Allow,
    /// The caller is not logged in; redirect to this login URL.
    Login(String),
    /// The caller is logged in but not authorized.
    Denied,
    /// A server fault, logged under this id.
    Fault(FaultId),
}

impl IntoResponse for GateOutcome {
    fn into_response(self) -> Response {
        match self {
            Self::Allow => StatusCode::OK.into_response(),
            Self::Login(location) => Redirect::to(&location).into_response(),
            Self::Denied => (StatusCode::FORBIDDEN, NOT_AUTHORIZED).into_response(),
            Self::Fault(id) => fault_response(id),
        }
    }
}

impl<P> Gateway<P> {
    /// Runs the gate and reports only the decision.
    pub fn check<A: AccessPolicy + ?Sized>(&self, request: &Parts, policy: &A) -> GateOutcome {
        match self.authorize(request, policy) {
            Ok(_) => GateOutcome::Allow,
            Err(outcome) => outcome,
        }
    }

    /// Runs the gate, returning the caller's session when access is allowed.
    ///
    /// Anonymous and pending-login callers are sent to the login path with a
    /// `redirect` parameter of `https://{host}{path}`, falling back to the
    /// bare path when the request has no host.
    ///
    /// # Errors
    ///
    /// Returns the [`GateOutcome`] to respond with when the request may not
    /// proceed.
    pub fn authorize<A: AccessPolicy + ?Sized>(
        &self,
        request: &Parts,
        policy: &A,
    ) -> Result<Session, GateOutcome> {
        let session = self.sessions().read(&request.headers).map_err(|e| {
            GateOutcome::Fault(
                Fault::report(&AccessError::Session {
                    reason: e.to_string(),
                })
                .id(),
            )
        })?;

        if !session.is_authenticated() {
            let location = self.login_redirect(request);
            debug!(%location, "redirecting anonymous request to login");
            return Err(GateOutcome::Login(location));
        }

        match policy.is_allowed(request, &session) {
            Ok(true) => Ok(session),
            Ok(false) => {
                info!(login = %session.login(), path = %request.uri.path(), "access denied");
                Err(GateOutcome::Denied)
            }
            Err(e) => Err(GateOutcome::Fault(
                Fault::report(&AccessError::Policy {
                    reason: e.to_string(),
                })
                .id(),
            )),
        }
    }

    /// Builds the login URL that returns the caller to this request's
    /// location afterwards.
    ///
    /// The `redirect` parameter is the absolute `https://{host}{path}` of the
    /// request, or just the path when the request names no host. The query
    /// string of the original request is not carried over.
    fn login_redirect(&self, request: &Parts) -> String {
        let path = request.uri.path();
        let host = request_host(&request.headers)
            .or_else(|| request.uri.authority().map(|authority| authority.as_str()));
        let original = match host {
            Some(host) => format!("https://{host}{path}"),
            None => path.to_string(),
        };

        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("redirect", &original)
            .finish();
        format!("{}?{query}", self.settings().login_path())
    }
}
