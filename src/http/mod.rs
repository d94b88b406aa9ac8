//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware: request id, trace, timeout)
//!     → application routes registered through SwRouter
//!     → handlers.rs (/service-worker.js, /service-worker-registration.js)
//!     → Send to client
//! ```

pub mod handlers;
pub mod request;
pub mod server;

pub use server::HttpServer;
