pub mod admin;
pub mod config;
pub mod middleware;
pub mod oauth;
pub mod sweeper;
pub mod token;

pub use admin::{AdminError, AdminSessionStore, X_ADMIN_TOKEN};
pub use middleware::admin_middleware;
pub use oauth::*;
