//! Authentication and access control for teamgate.
//!
//! This crate provides:
//! - The OAuth login flow (`Gateway::login`, `Gateway::callback`, `Gateway::logout`)
//! - The access gate (`Gateway::check`, `Gateway::authorize`) with pluggable
//!   `AccessPolicy` predicates
//! - Membership rules (`MembershipRules`) for "is the requester a member of X"
//!
//! # Session lifecycle
//!
//! The session moves between three states, derived from its fields:
//! - Anonymous: no cookie, or a cookie that failed verification
//! - Pending login: a nonce was issued and awaits the provider callback
//! - Authenticated: the callback completed and login and memberships are set
//!
//! Logout returns any session to anonymous. Server faults are logged under a
//! fresh fault id and reported to the caller only by that id.

pub mod error;
pub mod flow;
pub mod gate;
pub mod gateway;
pub mod membership;
pub mod response;
pub mod target;

#[cfg(test)]
mod testing;

pub use error::{AccessError, PolicyError};
pub use flow::{CallbackParams, LoginParams};
pub use gate::{AccessPolicy, GateOutcome};
pub use gateway::{AccessSettings, Gateway};
pub use membership::{MembershipRule, MembershipRules};
pub use response::{Fault, site_root};
