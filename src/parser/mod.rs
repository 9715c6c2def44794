//! Profile document parsing
//!
//! Entry point is [`analyze_document`]: validate the root, build the
//! fragment tree, aggregate, and hand back the report envelope. The core
//! never mutates the input document and retains no references into it.

pub mod core;
pub mod error;

use crate::analyzer::StatsAggregator;
use crate::models::ProfileReport;
use crate::parser::core::TreeBuilder;
use crate::parser::error::{ParseError, ParseResult};
use serde_json::Value;

/// Analyze a raw profile document and return the complete report.
///
/// The document must carry a top-level `Query` object; its absence is
/// the single hard failure, so callers can distinguish "bad file" from
/// "profile with no fragments". Every other missing or malformed field
/// resolves to a zero or placeholder value.
pub fn analyze_document(document: &Value) -> ParseResult<ProfileReport> {
    let query = document
        .get("Query")
        .and_then(Value::as_object)
        .ok_or(ParseError::MissingQuery)?;

    let execution = query.get("Execution").and_then(Value::as_object);
    let planner = query.get("Planner").and_then(Value::as_object);

    let fragments = TreeBuilder::extract_fragments(execution);
    tracing::debug!(
        fragments = fragments.len(),
        pipelines = fragments.iter().map(|f| f.pipelines.len()).sum::<usize>(),
        "extracted fragment tree"
    );

    let analysis = StatsAggregator::aggregate(fragments, execution, planner);

    Ok(ProfileReport {
        analysis,
        summary: query.get("Summary").cloned(),
        execution: query.get("Execution").cloned(),
    })
}
