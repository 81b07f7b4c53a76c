//! Session management
//!
//! - [`service`] - issuing, validating and expiring server sessions
//! - [`extractor`] - `AuthenticatedSession` / `OptionalSession` request extractors

pub mod extractor;
pub mod service;

pub use extractor::{AuthenticatedSession, OptionalSession};
pub use service::{SessionData, SessionService, DEFAULT_SESSION_DURATION_DAYS};
