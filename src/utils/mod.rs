pub mod cookies;
pub mod crypto;
pub mod logging;
pub mod redirects;
pub mod responses;
