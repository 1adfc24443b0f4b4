//! Stateless sessions for teamgate.
//!
//! All session state lives in a cookie held by the caller. This crate provides:
//! - The `Session` record (CSRF nonce, login, team memberships, post-login target)
//! - The cookie codec that signs, encrypts, and timestamps a session
//! - The `SessionManager` that reads sessions from request headers and
//!   renders them back into `Set-Cookie` values
//!
//! # Example
//!
//! ```
//! use teamgate_session::{SessionConfig, SessionManager, Session};
//! use http::{HeaderMap, header::COOKIE};
//!
//! let config = SessionConfig::new(vec![7u8; 32], vec![9u8; 32])
//!     .with_domain("example.com");
//! let manager = SessionManager::new(config);
//!
//! let mut session = Session::default();
//! session.set_target("/reports");
//! let cookie = manager.write(&session).expect("encode");
//!
//! let mut headers = HeaderMap::new();
//! headers.insert(COOKIE, format!("session={}", cookie.value()).parse().unwrap());
//! let restored = manager.read(&headers).expect("decode");
//! assert_eq!(restored.target(), "/reports");
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod manager;
pub mod schema;
pub mod session;

pub use codec::SessionCodec;
pub use config::SessionConfig;
pub use error::{CodecError, SessionError};
pub use manager::SessionManager;
pub use session::{Memberships, Session, SessionState};
