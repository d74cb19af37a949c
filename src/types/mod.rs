//! Shared data structures for the telemetry enrichment pipeline
//!
//! - `telemetry`: snapshots in, predictions from the external service
//! - `insight`: inference engine output
//! - `anomaly`: anomaly events and session summaries
//! - `record`: the enriched record emitted per tick

mod anomaly;
mod insight;
mod record;
mod telemetry;

pub use anomaly::*;
pub use insight::*;
pub use record::*;
pub use telemetry::*;
