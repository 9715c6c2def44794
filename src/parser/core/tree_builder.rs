//! Execution tree builder
//!
//! Walks the Execution subtree of a profile document and assembles the
//! Fragment → Pipeline → Operator hierarchy, attaching parsed millisecond
//! timings to each node. Keys that match no structural pattern are
//! skipped; the producer interleaves counters and metadata freely.

use crate::models::{Fragment, Operator, Pipeline};
use crate::parser::core::key_pattern::{KeyPatternExtractor, ProfileKey};
use crate::parser::core::value_parser::ValueParser;
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// Builder for the fragment/pipeline/operator hierarchy
pub struct TreeBuilder;

impl TreeBuilder {
    /// Extract all fragments from the execution section.
    ///
    /// Returns fragments sorted by id ascending (stable, so duplicate ids
    /// from malformed input keep document order). A missing section or a
    /// section with no fragment keys yields an empty vec: "no data", not
    /// an error. Pipelines are left in source encounter order; operators
    /// inside each pipeline are sorted by cost descending.
    pub fn extract_fragments(execution: Option<&Map<String, Value>>) -> Vec<Fragment> {
        let Some(execution) = execution else {
            return Vec::new();
        };

        let mut fragments = Vec::new();

        for (key, value) in execution {
            let ProfileKey::Fragment(id) = KeyPatternExtractor::classify(key) else {
                continue;
            };

            let pipelines = value
                .as_object()
                .map(|obj| Self::extract_pipelines(obj, id))
                .unwrap_or_default();

            let total_active_time_ms = pipelines.iter().map(|p| p.active_time_ms).sum();

            fragments.push(Fragment { id, pipelines, total_active_time_ms });
        }

        fragments.sort_by_key(|f| f.id);
        fragments
    }

    fn extract_pipelines(fragment: &Map<String, Value>, fragment_id: i64) -> Vec<Pipeline> {
        let mut pipelines = Vec::new();

        for (key, value) in fragment {
            let ProfileKey::Pipeline(id) = KeyPatternExtractor::classify(key) else {
                continue;
            };

            let obj = value.as_object();

            pipelines.push(Pipeline {
                id,
                fragment_id,
                active_time_ms: Self::time_field(obj, "ActiveTime"),
                driver_total_time_ms: Self::time_field(obj, "DriverTotalTime"),
                schedule_time_ms: Self::time_field(obj, "ScheduleTime"),
                input_empty_time_ms: Self::time_field(obj, "InputEmptyTime"),
                operators: obj.map(Self::extract_operators).unwrap_or_default(),
            });
        }

        pipelines
    }

    fn extract_operators(pipeline: &Map<String, Value>) -> Vec<Operator> {
        let mut operators = Vec::new();

        for (key, value) in pipeline {
            if KeyPatternExtractor::classify(key) != ProfileKey::Operator {
                continue;
            }

            let operator_time = value
                .get("CommonMetrics")
                .and_then(|metrics| metrics.get("OperatorTotalTime"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();

            operators.push(Operator {
                name: key.clone(),
                operator_time_ms: ValueParser::duration_ms_or_zero(Some(&operator_time)),
                operator_time,
            });
        }

        // Stable, so equal costs keep encounter order
        operators.sort_by(|a, b| {
            b.operator_time_ms
                .partial_cmp(&a.operator_time_ms)
                .unwrap_or(Ordering::Equal)
        });

        operators
    }

    /// Read a well-known timing field and parse it fail-soft to ms.
    fn time_field(obj: Option<&Map<String, Value>>, name: &str) -> f64 {
        ValueParser::duration_ms_or_zero(obj.and_then(|o| o.get(name)).and_then(Value::as_str))
    }
}
