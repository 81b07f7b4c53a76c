//! Test helpers shared by unit and integration tests
//!
//! - [`fixtures`] - settings, in-memory database, app state and seeded users
//! - [`FakeOAuthClient`] - canned provider responses for callback tests

pub mod fixtures;

pub use fixtures::{
    seeded_user_with_session, test_app_state, test_app_state_with, test_encryption, test_pool,
    test_settings, FakeOAuthClient,
};

/// Common test constants
pub mod constants {
    pub const TEST_EMAIL: &str = "test@example.com";
    pub const TEST_USERNAME: &str = "Test User";
    /// base64 of 32 bytes, accepted directly as an AES-256 key
    pub const TEST_ENCRYPTION_KEY: &str = "MDEyMzQ1Njc4OWFiY2RlZjAxMjM0NTY3ODlhYmNkZWY=";
    pub const TEST_FRONTEND_URL: &str = "http://localhost:5173";
}
