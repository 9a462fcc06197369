pub mod auth;
pub mod cookies;
pub mod login;

pub use auth::{Access, AuthGate, CurrentSession, session_gate};
pub use login::{LoginRejection, LoginRequest, LoginSubmission, ReplyFormat};
