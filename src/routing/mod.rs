//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route construction (at startup):
//!     "/products/:id"
//!     → matcher.rs (parse into fixed/capture segments)
//!     → router.rs (bind method + factory)
//!
//! Per request:
//!     method + path
//!     → matcher.rs (segment-by-segment compare, extract captures)
//!     → router.rs (factory(params) → unit → run)
//!     → no match: Context passes through untouched
//! ```
//!
//! # Design Decisions
//! - Templates compiled at startup, immutable at runtime
//! - No regex, no wildcards: single-segment captures only
//! - Deterministic: same input always produces the same params

pub mod matcher;
pub mod router;

pub use matcher::{Params, RouteTemplate};
pub use router::{route, Route, UnitFactory};
