//! Queryscope
//!
//! Extracts a normalized, queryable performance model from the nested,
//! loosely-typed profile documents emitted by a distributed pipeline
//! query engine. Structure in these documents is encoded in map-key text
//! ("Fragment 3", "Pipeline (id=0)", "OLAP_SCAN (plan_node_id=4)"); the
//! parser classifies keys into typed variants, builds the
//! Fragment → Pipeline → Operator hierarchy, and the analyzer derives
//! totals, percentage breakdowns, global rankings and planner phase
//! timings on top.
//!
//! # Usage
//!
//! ```ignore
//! use queryscope::analyze_document;
//!
//! let document: serde_json::Value = serde_json::from_str(raw)?;
//! let report = analyze_document(&document)?;
//!
//! for fragment in &report.analysis.fragments {
//!     println!("Fragment {}: {:.3}ms", fragment.id, fragment.total_active_time_ms);
//! }
//! ```
//!
//! The core is stateless and re-entrant: it never mutates the input
//! document and allocates only the returned model, so distinct documents
//! can be analyzed concurrently without locking.

pub mod analyzer;
pub mod config;
pub mod models;
pub mod parser;


// Re-export commonly used types
pub use analyzer::StatsAggregator;
pub use config::Config;
pub use models::*;
pub use parser::analyze_document;
pub use parser::core::{KeyPatternExtractor, PlannerPhase, ProfileKey, TreeBuilder, ValueParser};
pub use parser::error::{ParseError, ParseResult};
