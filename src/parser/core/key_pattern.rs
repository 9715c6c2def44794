//! Key pattern classification for profile documents
//!
//! The profile producer encodes hierarchy in map-key text rather than type
//! tags: a fragment is a key literally named "Fragment 3", a pipeline is
//! "Pipeline (id=0)", an operator key carries "(plan_node_id=...)" and a
//! planner phase line looks like "-- Analyzer[1] 23ms". Classification is
//! isolated here as a closed tagged-variant set so the tree assembly and
//! aggregation logic never touch a regex.

use once_cell::sync::Lazy;
use regex::Regex;

static FRAGMENT_KEY_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^Fragment (\d+)$").unwrap());

static PIPELINE_KEY_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Pipeline \(id=(\d+)\)$").unwrap());

// Phase name and unit are validated separately so unrecognized names fall
// through to Unrecognized instead of erroring.
static PLANNER_PHASE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"--\s*([A-Za-z]+)\[\d+\]\s*(\d+(?:\.\d+)?)\s*([A-Za-z]*)").unwrap());

const OPERATOR_MARKER: &str = "(plan_node_id=";

/// Named stage of query compilation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlannerPhase {
    Total,
    Analyzer,
    Transformer,
    Optimizer,
    ExecPlanBuild,
    Deploy,
}

impl PlannerPhase {
    /// Case-insensitive lookup against the fixed phase set.
    fn from_name(name: &str) -> Option<Self> {
        const PHASES: [(&str, PlannerPhase); 6] = [
            ("Total", PlannerPhase::Total),
            ("Analyzer", PlannerPhase::Analyzer),
            ("Transformer", PlannerPhase::Transformer),
            ("Optimizer", PlannerPhase::Optimizer),
            ("ExecPlanBuild", PlannerPhase::ExecPlanBuild),
            ("Deploy", PlannerPhase::Deploy),
        ];

        PHASES
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, phase)| *phase)
    }
}

/// Classification of a single profile map key
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileKey {
    /// "Fragment <id>", full match
    Fragment(i64),
    /// "Pipeline (id=<id>)", full match
    Pipeline(i64),
    /// Key containing "(plan_node_id="; the whole key is the operator's
    /// display name
    Operator,
    /// Planner phase line "-- <Phase>[<n>] <number><unit>", value already
    /// converted to milliseconds
    PlannerPhase { phase: PlannerPhase, time_ms: f64 },
    /// Any other key (metadata, counters); callers skip these
    Unrecognized,
}

/// Pattern matcher over raw profile map keys
pub struct KeyPatternExtractor;

impl KeyPatternExtractor {
    /// Classify one mapping key. Pure; never fails. A key that matches no
    /// structural pattern is `Unrecognized`, since the producer freely
    /// interleaves metadata keys with structural ones.
    pub fn classify(key: &str) -> ProfileKey {
        if let Some(id) = Self::fragment_id(key) {
            return ProfileKey::Fragment(id);
        }
        if let Some(id) = Self::pipeline_id(key) {
            return ProfileKey::Pipeline(id);
        }
        if key.contains(OPERATOR_MARKER) {
            return ProfileKey::Operator;
        }
        if let Some((phase, time_ms)) = Self::planner_phase(key) {
            return ProfileKey::PlannerPhase { phase, time_ms };
        }
        ProfileKey::Unrecognized
    }

    /// Extract the fragment id from a "Fragment <id>" key.
    pub fn fragment_id(key: &str) -> Option<i64> {
        FRAGMENT_KEY_REGEX
            .captures(key)
            .and_then(|cap| cap.get(1).unwrap().as_str().parse().ok())
    }

    /// Extract the pipeline id from a "Pipeline (id=<id>)" key.
    pub fn pipeline_id(key: &str) -> Option<i64> {
        PIPELINE_KEY_REGEX
            .captures(key)
            .and_then(|cap| cap.get(1).unwrap().as_str().parse().ok())
    }

    /// Extract a planner phase and its duration in milliseconds.
    ///
    /// Leading whitespace or other decoration before "--" is allowed. A
    /// missing or unknown unit token is read as milliseconds; an
    /// unrecognized phase name yields None.
    pub fn planner_phase(key: &str) -> Option<(PlannerPhase, f64)> {
        let cap = PLANNER_PHASE_REGEX.captures(key)?;
        let phase = PlannerPhase::from_name(cap.get(1).unwrap().as_str())?;
        let value: f64 = cap.get(2).unwrap().as_str().parse().ok()?;
        let time_ms = value * Self::unit_to_ms(cap.get(3).unwrap().as_str());
        Some((phase, time_ms))
    }

    fn unit_to_ms(unit: &str) -> f64 {
        match unit.to_ascii_lowercase().as_str() {
            "s" => 1_000.0,
            "us" => 0.001,
            "ns" => 0.000_001,
            _ => 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_key_full_match_only() {
        assert_eq!(KeyPatternExtractor::classify("Fragment 3"), ProfileKey::Fragment(3));
        assert_eq!(KeyPatternExtractor::classify("Fragment 12"), ProfileKey::Fragment(12));
        assert_eq!(KeyPatternExtractor::classify("Fragment 3 extra"), ProfileKey::Unrecognized);
        assert_eq!(KeyPatternExtractor::classify("Fragment"), ProfileKey::Unrecognized);
    }

    #[test]
    fn test_pipeline_key() {
        assert_eq!(KeyPatternExtractor::classify("Pipeline (id=0)"), ProfileKey::Pipeline(0));
        assert_eq!(KeyPatternExtractor::classify("Pipeline (id=17)"), ProfileKey::Pipeline(17));
        assert_eq!(KeyPatternExtractor::classify("Pipeline (id=)"), ProfileKey::Unrecognized);
    }

    #[test]
    fn test_operator_key_is_contains_check() {
        assert_eq!(
            KeyPatternExtractor::classify("OLAP_SCAN (plan_node_id=4)"),
            ProfileKey::Operator
        );
        assert_eq!(
            KeyPatternExtractor::classify("HASH_JOIN (plan_node_id=2) [extra]"),
            ProfileKey::Operator
        );
        assert_eq!(KeyPatternExtractor::classify("OLAP_SCAN"), ProfileKey::Unrecognized);
    }

    #[test]
    fn test_planner_phase_basic() {
        assert_eq!(
            KeyPatternExtractor::classify("-- Analyzer[1] 23ms"),
            ProfileKey::PlannerPhase { phase: PlannerPhase::Analyzer, time_ms: 23.0 }
        );
    }

    #[test]
    fn test_planner_phase_decoration_and_case() {
        assert_eq!(
            KeyPatternExtractor::classify("    -- optimizer[2] 5ms"),
            ProfileKey::PlannerPhase { phase: PlannerPhase::Optimizer, time_ms: 5.0 }
        );
        assert_eq!(
            KeyPatternExtractor::classify("stage -- EXECPLANBUILD[1] 2MS"),
            ProfileKey::PlannerPhase { phase: PlannerPhase::ExecPlanBuild, time_ms: 2.0 }
        );
    }

    #[test]
    fn test_planner_phase_units() {
        assert_eq!(
            KeyPatternExtractor::planner_phase("-- Total[1] 2s"),
            Some((PlannerPhase::Total, 2000.0))
        );
        assert_eq!(
            KeyPatternExtractor::planner_phase("-- Total[1] 500us"),
            Some((PlannerPhase::Total, 0.5))
        );
        assert_eq!(
            KeyPatternExtractor::planner_phase("-- Total[1] 250000ns"),
            Some((PlannerPhase::Total, 0.25))
        );
        // missing unit defaults to milliseconds
        assert_eq!(
            KeyPatternExtractor::planner_phase("-- Deploy[1] 7"),
            Some((PlannerPhase::Deploy, 7.0))
        );
    }

    #[test]
    fn test_planner_phase_unknown_name_ignored() {
        assert_eq!(KeyPatternExtractor::classify("-- Warmup[1] 9ms"), ProfileKey::Unrecognized);
    }

    #[test]
    fn test_arbitrary_sibling_keys_skipped() {
        assert_eq!(KeyPatternExtractor::classify("DegreeOfParallelism"), ProfileKey::Unrecognized);
        assert_eq!(KeyPatternExtractor::classify(""), ProfileKey::Unrecognized);
    }
}
