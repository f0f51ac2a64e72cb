//! Auth module: domain types, errors, password hashing and the session service.
//!
//! Registration and login live here; profile maintenance is in `crate::usuario`.

pub mod domain;
pub mod errors;
pub mod password;
pub mod service;

pub use service::{AuthConfig, AuthService};
