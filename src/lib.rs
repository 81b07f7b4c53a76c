#![recursion_limit = "256"]
#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

/// Version of the home-loan-helper application
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod db;
pub mod error;
pub mod handlers;
pub mod loans;
pub mod middleware;
pub mod models;
pub mod oauth;
pub mod passkey;
pub mod session;
pub mod settings;
pub mod state;
pub mod testing;
pub mod utils;

/// Re-export commonly used items
pub use error::{AppError, AppResult};
pub use handlers::configure_services;
pub use settings::AppSettings;
pub use state::AppState;
