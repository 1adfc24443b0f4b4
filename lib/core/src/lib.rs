//! Core utilities shared by the teamgate crates.
//!
//! This crate provides the error-handling foundation and the opaque
//! correlation identifiers attached to server faults.

pub mod error;
pub mod fault;

pub use error::Result;
pub use fault::{FALLBACK_FAULT_ID, FaultId};
