pub mod config;
pub mod observability;
pub mod server;

pub use config::AppConfig;
pub use server::{TesseraServer, build_app, build_provider};
