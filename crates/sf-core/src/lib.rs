//! sf-core: stable foundation for semiflux.
//!
//! Contains:
//! - units (uom SI types, constructors and physical constants)
//! - numeric (Real + tolerances + float helpers)
//! - ids (stable compact IDs for mesh entities and regions)
//! - error (shared error types)
//! - timing (opt-in accumulating timers for the solve loop)

pub mod error;
pub mod ids;
pub mod numeric;
pub mod timing;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{SfError, SfResult};
pub use ids::*;
pub use numeric::*;
pub use units::*;
