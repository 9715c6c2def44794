//! Profile analysis data models
//!
//! These models are the normalized performance view extracted from a raw
//! profile document. They are plain data, serializable for downstream
//! consumers (a rendering UI, an API layer); nothing here retains a
//! reference into the source document.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A top-level distributed execution unit of the query plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fragment {
    pub id: i64,
    /// Pipelines in source encounter order. Consumers that display them
    /// re-sort by id via [`StatsAggregator::sort_pipelines_by_id`]; the
    /// tree builder deliberately does not.
    ///
    /// [`StatsAggregator::sort_pipelines_by_id`]: crate::analyzer::StatsAggregator::sort_pipelines_by_id
    pub pipelines: Vec<Pipeline>,
    /// Sum of the pipelines' active time
    pub total_active_time_ms: f64,
}

/// A chain of operators executed by driver threads within a fragment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipeline {
    pub id: i64,
    pub fragment_id: i64,
    pub active_time_ms: f64,
    pub driver_total_time_ms: f64,
    pub schedule_time_ms: f64,
    pub input_empty_time_ms: f64,
    /// Operators sorted by `operator_time_ms` descending (stable)
    pub operators: Vec<Operator>,
}

impl Pipeline {
    /// Share of driver time spent doing productive work. 0 when the
    /// driver total is 0. Derived on demand, never stored.
    pub fn active_pct(&self) -> f64 {
        if self.driver_total_time_ms == 0.0 {
            0.0
        } else {
            self.active_time_ms / self.driver_total_time_ms
        }
    }

    /// Share of driver time spent waiting to be scheduled.
    pub fn schedule_pct(&self) -> f64 {
        if self.driver_total_time_ms == 0.0 {
            0.0
        } else {
            self.schedule_time_ms / self.driver_total_time_ms
        }
    }

    /// Remaining share (idle waiting on input), clamped at 0.
    pub fn waiting_pct(&self) -> f64 {
        if self.driver_total_time_ms == 0.0 {
            0.0
        } else {
            (1.0 - self.active_pct() - self.schedule_pct()).max(0.0)
        }
    }
}

/// A single plan step inside a pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operator {
    /// The raw map key, e.g. "OLAP_SCAN (plan_node_id=4)". Used verbatim
    /// as display and search identity; quote-escaping is a consumer
    /// concern.
    pub name: String,
    pub operator_time_ms: f64,
    /// Original formatted value, e.g. "12.345ms"
    pub operator_time: String,
}

/// Per-phase planning time, all in milliseconds
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlannerTiming {
    pub total_ms: f64,
    pub analyzer_ms: f64,
    pub transformer_ms: f64,
    pub optimizer_ms: f64,
    pub exec_plan_build_ms: f64,
    pub deploy_ms: f64,
}

/// Query-level summary card values, passed through as display strings
///
/// Absent fields keep the literal placeholders ("N/A", "0 B" for spill)
/// for compatibility with persisted/shared state downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionStats {
    pub allocated_memory: String,
    pub peak_memory: String,
    pub cumulative_cpu_time: String,
    pub cumulative_scan_time: String,
    pub cumulative_network_time: String,
    pub cumulative_operator_time: String,
    pub spill_bytes: String,
    /// True iff `spill_bytes` parses to a non-zero size; the one value
    /// that is inspected rather than passed through, used for alerting.
    pub has_spill: bool,
}

/// Aggregate root of the normalized performance model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    pub query_wall_time_ms: f64,
    /// Sum of all fragments' total active time
    pub total_active_time_ms: f64,
    /// Fragments sorted by id ascending
    pub fragments: Vec<Fragment>,
    pub execution_stats: ExecutionStats,
    /// None when the planner section produced no positive Total. A
    /// planning-vs-execution view must then be suppressed entirely, not
    /// shown with zeros.
    pub planner_timing: Option<PlannerTiming>,
}

/// One row of the global operator cost ranking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorCost {
    pub fragment_id: i64,
    pub pipeline_id: i64,
    pub name: String,
    pub operator_time_ms: f64,
    pub operator_time: String,
}

/// Complete analysis output handed to consumers
///
/// Carries the normalized model plus raw pass-through of the summary and
/// execution sections for free-form fields the model does not cover.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileReport {
    pub analysis: Analysis,
    pub summary: Option<Value>,
    pub execution: Option<Value>,
}
