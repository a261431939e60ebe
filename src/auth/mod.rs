//! Authentication and session management

pub mod cookie;
pub mod middleware;
pub mod models;
pub mod password;
pub mod service;
pub mod session;
pub mod token;

pub use cookie::CookieSettings;
pub use middleware::{enforce_guards, logout, Guard, GuardState, SessionContext, SessionService};
pub use models::{Credentials, SessionUser};
pub use service::AuthService;
pub use session::{Session, SessionManager};
pub use token::{SessionClaims, SessionSigner};
