//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! pipeline units and transport produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows through every log event of a request
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
