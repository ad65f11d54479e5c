pub mod auth;
pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod health;
pub mod mail;
pub mod metrics;
pub mod routes;
pub mod server;
pub mod shutdown;
pub mod utils;

#[cfg(test)]
pub mod test_utils;

pub use config::Config;
pub use server::Server;
