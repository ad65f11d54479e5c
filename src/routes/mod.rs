pub mod admin;
pub mod auth;
pub mod contact;
pub mod content;
pub mod health;
pub mod recommendations;
pub mod uploads;

pub use admin::{create_admin_login_routes, create_admin_session_routes};
pub use auth::create_auth_routes;
pub use contact::create_contact_routes;
pub use content::{create_admin_content_routes, create_content_routes};
pub use health::create_health_routes;
pub use recommendations::create_recommendation_routes;
pub use uploads::{create_admin_upload_routes, create_upload_file_routes};
