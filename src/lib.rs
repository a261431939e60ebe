//! Gatehouse - username/password authentication with session guards
//!
//! This is the library interface for Gatehouse: the credential store, the
//! auth service, session guards and the HTTP router that wires them up.

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod store;
pub mod ui;

pub use auth::AuthService;
pub use config::Config;
pub use error::Error;
