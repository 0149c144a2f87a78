//! HTTP transport.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, timeout and trace layers)
//!     → request.rs (axum request → Context)
//!     → pipeline::run
//!     → response.rs (Context → axum response)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use server::{AppState, HttpServer};
