//! Passkey sign-in backed by `webauthn-rs`
//!
//! [`PasskeyService`] runs both ceremonies against the relying party described
//! by [`PasskeySettings`] and opens a server session on success.

mod settings;
pub use settings::PasskeySettings;

mod service;
pub use service::*;
