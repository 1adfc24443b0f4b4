//! teamgate web server.
//!
//! Wires the session manager, the GitHub identity provider, and the access
//! gate into an axum router:
//! - `/auth`, `/callback`, `/logout`: the login flow
//! - `/`: a landing page showing who is signed in
//! - `/protected`: an example resource behind the membership gate

pub mod app;
pub mod config;
pub mod middleware;
pub mod routes;
