//! WhatsApp number checker library.

pub mod checker;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod phone;
pub mod resilience;
pub mod session;

pub use checker::{CheckResult, Checker};
pub use config::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use phone::PhoneNumber;
pub use session::Session;
