//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, CORS, body limit)
//!     → request.rs (request ID, tracing span)
//!     → handlers.rs (readiness → validation → collaborator)
//!     → response.rs / error.rs (JSON bodies, status codes)
//!     → Send to client
//! ```

pub mod error;
pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use error::{ApiError, ErrorShape};
pub use request::{UuidRequestId, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
