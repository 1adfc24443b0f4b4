//! Wire schema for the session payload.
//!
//! The field names below are the serialization contract of the session
//! cookie. Renaming one invalidates every outstanding cookie, so they are
//! spelled out here rather than derived from the `Session` field names.

use serde::{Deserialize, Serialize};

use crate::session::{Memberships, Session};

/// Wire name of the login nonce.
pub const FIELD_NONCE: &str = "state";
/// Wire name of the provider account handle.
pub const FIELD_LOGIN: &str = "login";
/// Wire name of the organization to teams mapping.
pub const FIELD_MEMBERSHIPS: &str = "memberships";
/// Wire name of the post-login destination.
pub const FIELD_TARGET: &str = "target";

/// All payload fields, in serialization order.
pub const FIELDS: [&str; 4] = [FIELD_NONCE, FIELD_LOGIN, FIELD_MEMBERSHIPS, FIELD_TARGET];

#[derive(Serialize)]
struct WireRef<'a> {
    #[serde(rename = "state")]
    nonce: &'a str,
    #[serde(rename = "login")]
    login: &'a str,
    #[serde(rename = "memberships")]
    memberships: &'a Memberships,
    #[serde(rename = "target")]
    target: &'a str,
}

#[derive(Deserialize)]
struct WireOwned {
    #[serde(rename = "state", default)]
    nonce: String,
    #[serde(rename = "login", default)]
    login: String,
    #[serde(rename = "memberships", default)]
    memberships: Option<Memberships>,
    #[serde(rename = "target", default)]
    target: String,
}

/// Serializes a session into its JSON payload.
///
/// # Errors
///
/// Returns the serializer error; this only happens on allocation failure
/// or a broken `Serialize` impl.
pub fn encode(session: &Session) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(&WireRef {
        nonce: session.nonce(),
        login: session.login(),
        memberships: session.memberships(),
        target: session.target(),
    })
}

/// Parses a JSON payload back into a session.
///
/// Missing fields decode as empty and unknown fields are ignored, so
/// cookies written before a field was added stay readable.
///
/// # Errors
///
/// Returns the deserializer error if the payload is not a session object.
pub fn decode(payload: &[u8]) -> Result<Session, serde_json::Error> {
    let wire: WireOwned = serde_json::from_slice(payload)?;
    Ok(Session::from_parts(
        wire.nonce,
        wire.login,
        wire.memberships.unwrap_or_default(),
        wire.target,
    ))
}
