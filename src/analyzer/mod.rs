//! Cross-cutting statistics over the extracted fragment tree
//!
//! Everything here is derived: totals, rankings, planner phase buckets and
//! the execution summary card values. The aggregator reads the raw
//! sections and the built fragments, and returns plain data.

use crate::models::{Analysis, ExecutionStats, Fragment, OperatorCost, PlannerTiming};
use crate::parser::core::key_pattern::{KeyPatternExtractor, PlannerPhase, ProfileKey};
use crate::parser::core::value_parser::ValueParser;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Placeholder for execution stats the profile did not report. Preserved
/// verbatim for compatibility with persisted/shared state downstream.
const STAT_PLACEHOLDER: &str = "N/A";
const SPILL_PLACEHOLDER: &str = "0 B";

/// Aggregator producing the query-level analysis model
pub struct StatsAggregator;

impl StatsAggregator {
    /// Compute the aggregate root from the built fragments and the raw
    /// execution/planner sections.
    pub fn aggregate(
        fragments: Vec<Fragment>,
        execution: Option<&Map<String, Value>>,
        planner: Option<&Map<String, Value>>,
    ) -> Analysis {
        let query_wall_time_ms = ValueParser::duration_ms_or_zero(
            execution
                .and_then(|e| e.get("QueryExecutionWallTime"))
                .and_then(Value::as_str),
        );

        let total_active_time_ms = fragments.iter().map(|f| f.total_active_time_ms).sum();

        Analysis {
            query_wall_time_ms,
            total_active_time_ms,
            execution_stats: Self::execution_stats(execution),
            planner_timing: Self::planner_timing(planner),
            fragments,
        }
    }

    /// Global pipeline ranking across all fragments: 1-based rank by
    /// active time descending, keyed by `(fragment_id, pipeline_id)`.
    /// Ties keep their relative order (fragments ascending by id, then
    /// source pipeline order). Consumers use the rank for highlighting;
    /// no display classes are baked in here.
    pub fn pipeline_ranks(fragments: &[Fragment]) -> HashMap<(i64, i64), usize> {
        let mut entries: Vec<(i64, i64, f64)> = fragments
            .iter()
            .flat_map(|f| {
                f.pipelines
                    .iter()
                    .map(|p| (p.fragment_id, p.id, p.active_time_ms))
            })
            .collect();

        entries.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(Ordering::Equal));

        entries
            .into_iter()
            .enumerate()
            .map(|(idx, (fragment_id, pipeline_id, _))| ((fragment_id, pipeline_id), idx + 1))
            .collect()
    }

    /// Global operator cost ranking: every operator in the document,
    /// most expensive first (stable), truncated to `limit`.
    pub fn top_operators(fragments: &[Fragment], limit: usize) -> Vec<OperatorCost> {
        let mut costs: Vec<OperatorCost> = fragments
            .iter()
            .flat_map(|f| f.pipelines.iter())
            .flat_map(|p| {
                p.operators.iter().map(|op| OperatorCost {
                    fragment_id: p.fragment_id,
                    pipeline_id: p.id,
                    name: op.name.clone(),
                    operator_time_ms: op.operator_time_ms,
                    operator_time: op.operator_time.clone(),
                })
            })
            .collect();

        costs.sort_by(|a, b| {
            b.operator_time_ms
                .partial_cmp(&a.operator_time_ms)
                .unwrap_or(Ordering::Equal)
        });
        costs.truncate(limit);
        costs
    }

    /// Re-sort each fragment's pipelines by id ascending.
    ///
    /// The tree builder keeps source encounter order; display consumers
    /// call this explicitly when they want id order.
    pub fn sort_pipelines_by_id(fragments: &mut [Fragment]) {
        for fragment in fragments {
            fragment.pipelines.sort_by_key(|p| p.id);
        }
    }

    /// Copy the well-known execution summary fields, keeping the raw
    /// display strings and filling placeholders for anything absent.
    pub fn execution_stats(execution: Option<&Map<String, Value>>) -> ExecutionStats {
        let field = |name: &str| -> Option<String> {
            execution
                .and_then(|e| e.get(name))
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        let or_placeholder =
            |value: Option<String>| value.unwrap_or_else(|| STAT_PLACEHOLDER.to_string());

        let spill_bytes =
            field("QuerySpillBytes").unwrap_or_else(|| SPILL_PLACEHOLDER.to_string());
        let has_spill = ValueParser::bytes_or_zero(Some(&spill_bytes)) > 0;

        ExecutionStats {
            allocated_memory: or_placeholder(field("QueryAllocatedMemoryUsage")),
            peak_memory: or_placeholder(field("QueryPeakMemoryUsagePerNode")),
            cumulative_cpu_time: or_placeholder(field("QueryCumulativeCpuTime")),
            cumulative_scan_time: or_placeholder(field("QueryCumulativeScanTime")),
            cumulative_network_time: or_placeholder(field("QueryCumulativeNetworkTime")),
            cumulative_operator_time: or_placeholder(field("QueryCumulativeOperatorTime")),
            spill_bytes,
            has_spill,
        }
    }

    /// Accumulate planner phase lines into the six named buckets.
    ///
    /// Duplicate phase names under distinct keys overwrite in iteration
    /// order (last write wins, preserved rather than summed to match the
    /// reference behavior). Returns None unless the Total bucket ended up
    /// strictly positive, signaling "no planner data" to consumers so a
    /// planning-vs-execution view is suppressed instead of shown as zeros.
    pub fn planner_timing(planner: Option<&Map<String, Value>>) -> Option<PlannerTiming> {
        let planner = planner?;
        let mut timing = PlannerTiming::default();

        for key in planner.keys() {
            let ProfileKey::PlannerPhase { phase, time_ms } = KeyPatternExtractor::classify(key)
            else {
                continue;
            };

            match phase {
                PlannerPhase::Total => timing.total_ms = time_ms,
                PlannerPhase::Analyzer => timing.analyzer_ms = time_ms,
                PlannerPhase::Transformer => timing.transformer_ms = time_ms,
                PlannerPhase::Optimizer => timing.optimizer_ms = time_ms,
                PlannerPhase::ExecPlanBuild => timing.exec_plan_build_ms = time_ms,
                PlannerPhase::Deploy => timing.deploy_ms = time_ms,
            }
        }

        (timing.total_ms > 0.0).then_some(timing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Operator, Pipeline};
    use serde_json::json;

    fn pipeline(fragment_id: i64, id: i64, active_ms: f64) -> Pipeline {
        Pipeline {
            id,
            fragment_id,
            active_time_ms: active_ms,
            driver_total_time_ms: 0.0,
            schedule_time_ms: 0.0,
            input_empty_time_ms: 0.0,
            operators: Vec::new(),
        }
    }

    fn fragment(id: i64, pipelines: Vec<Pipeline>) -> Fragment {
        let total_active_time_ms = pipelines.iter().map(|p| p.active_time_ms).sum();
        Fragment { id, pipelines, total_active_time_ms }
    }

    #[test]
    fn test_pipeline_ranks_global_descending() {
        let fragments = vec![
            fragment(0, vec![pipeline(0, 0, 5.0), pipeline(0, 1, 30.0)]),
            fragment(1, vec![pipeline(1, 0, 12.0)]),
        ];

        let ranks = StatsAggregator::pipeline_ranks(&fragments);
        assert_eq!(ranks[&(0, 1)], 1);
        assert_eq!(ranks[&(1, 0)], 2);
        assert_eq!(ranks[&(0, 0)], 3);
    }

    #[test]
    fn test_pipeline_ranks_stable_on_ties() {
        let fragments = vec![
            fragment(0, vec![pipeline(0, 0, 7.0)]),
            fragment(1, vec![pipeline(1, 0, 7.0)]),
        ];

        let ranks = StatsAggregator::pipeline_ranks(&fragments);
        assert_eq!(ranks[&(0, 0)], 1);
        assert_eq!(ranks[&(1, 0)], 2);
    }

    #[test]
    fn test_top_operators_flattens_and_truncates() {
        let mut p0 = pipeline(0, 0, 0.0);
        p0.operators = vec![
            Operator { name: "A (plan_node_id=1)".into(), operator_time_ms: 4.0, operator_time: "4ms".into() },
            Operator { name: "B (plan_node_id=2)".into(), operator_time_ms: 1.0, operator_time: "1ms".into() },
        ];
        let mut p1 = pipeline(2, 0, 0.0);
        p1.operators = vec![Operator {
            name: "C (plan_node_id=3)".into(),
            operator_time_ms: 9.0,
            operator_time: "9ms".into(),
        }];

        let fragments = vec![fragment(0, vec![p0]), fragment(2, vec![p1])];

        let top = StatsAggregator::top_operators(&fragments, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].name, "C (plan_node_id=3)");
        assert_eq!(top[0].fragment_id, 2);
        assert_eq!(top[1].name, "A (plan_node_id=1)");
    }

    #[test]
    fn test_sort_pipelines_by_id_is_explicit() {
        let mut fragments = vec![fragment(0, vec![pipeline(0, 4, 0.0), pipeline(0, 1, 0.0)])];
        StatsAggregator::sort_pipelines_by_id(&mut fragments);
        let ids: Vec<i64> = fragments[0].pipelines.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 4]);
    }

    #[test]
    fn test_execution_stats_placeholders() {
        let stats = StatsAggregator::execution_stats(None);
        assert_eq!(stats.allocated_memory, "N/A");
        assert_eq!(stats.peak_memory, "N/A");
        assert_eq!(stats.cumulative_cpu_time, "N/A");
        assert_eq!(stats.spill_bytes, "0 B");
        assert!(!stats.has_spill);
    }

    #[test]
    fn test_execution_stats_pass_through_and_spill_flag() {
        let execution = json!({
            "QueryPeakMemoryUsagePerNode": "1.234 GB",
            "QueryCumulativeCpuTime": "2m30s",
            "QuerySpillBytes": "512.000 MB",
        });
        let stats = StatsAggregator::execution_stats(execution.as_object());

        assert_eq!(stats.peak_memory, "1.234 GB");
        assert_eq!(stats.cumulative_cpu_time, "2m30s");
        assert_eq!(stats.spill_bytes, "512.000 MB");
        assert!(stats.has_spill);
        assert_eq!(stats.cumulative_scan_time, "N/A");
    }

    #[test]
    fn test_planner_timing_requires_positive_total() {
        let planner = json!({ "-- Analyzer[1] 5ms": "" });
        assert!(StatsAggregator::planner_timing(planner.as_object()).is_none());

        let planner = json!({ "-- Total[1] 57ms": "", "-- Analyzer[1] 23ms": "" });
        let timing = StatsAggregator::planner_timing(planner.as_object()).unwrap();
        assert_eq!(timing.total_ms, 57.0);
        assert_eq!(timing.analyzer_ms, 23.0);
        assert_eq!(timing.transformer_ms, 0.0);
        assert_eq!(timing.optimizer_ms, 0.0);
        assert_eq!(timing.exec_plan_build_ms, 0.0);
        assert_eq!(timing.deploy_ms, 0.0);
    }

    #[test]
    fn test_planner_timing_last_write_wins_on_duplicate_phase() {
        // Two distinct keys can carry the same phase name; the later one
        // in document order overwrites.
        let planner = json!({
            "-- Total[1] 10ms": "",
            "-- Optimizer[1] 5ms": "",
            " -- Optimizer[2] 7ms": "",
        });
        let timing = StatsAggregator::planner_timing(planner.as_object()).unwrap();
        assert_eq!(timing.optimizer_ms, 7.0);
    }

    #[test]
    fn test_aggregate_totals_and_wall_time() {
        let fragments = vec![
            fragment(0, vec![pipeline(0, 0, 10.0), pipeline(0, 1, 5.0)]),
            fragment(1, vec![pipeline(1, 0, 2.5)]),
        ];
        let execution = json!({ "QueryExecutionWallTime": "2s" });

        let analysis = StatsAggregator::aggregate(fragments, execution.as_object(), None);
        assert_eq!(analysis.query_wall_time_ms, 2000.0);
        assert_eq!(analysis.total_active_time_ms, 17.5);
        assert!(analysis.planner_timing.is_none());
    }
}
