//! The identity layer: sessions, the session cookie and the middleware that
//! resolves the caller of each request.

mod cookie;
mod log_out;
mod middleware;
mod session;

pub use cookie::set_session_cookie;
pub use log_out::get_log_out;
pub use middleware::auth_guard;
pub use session::{
    DEFAULT_SESSION_DURATION, Session, SessionClaims, SessionId, create_session,
    create_session_table, delete_expired_sessions, delete_session, get_session,
};

#[cfg(test)]
pub(crate) use cookie::COOKIE_SESSION;
