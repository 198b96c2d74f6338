//! Per-stage validation boundary
//!
//! Every model call's raw JSON is checked into its typed record immediately
//! after extraction — downstream code never re-validates. All-or-nothing:
//! a stage output either satisfies its full contract or the run fails.

use crate::error::AnalysisError;
use crate::Result;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;

/// The seven analysis stages, in pipeline order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extraction,
    Tradeoff,
    Volatility,
    Scenario,
    FinalSummary,
    ExecutiveSnapshot,
    Drift,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Extraction => "extraction",
            Stage::Tradeoff => "tradeoff",
            Stage::Volatility => "volatility",
            Stage::Scenario => "scenario",
            Stage::FinalSummary => "final_summary",
            Stage::ExecutiveSnapshot => "executive_snapshot",
            Stage::Drift => "drift",
        };
        write!(f, "{}", s)
    }
}

/// Deserialize a stage's raw model output into its typed record.
///
/// Missing required fields, wrong element types, and wrong nesting are all
/// rejected here; optional fields accept absent or null.
pub fn validate_stage<T: DeserializeOwned>(stage: Stage, raw: Value) -> Result<T> {
    serde_json::from_value(raw).map_err(|e| AnalysisError::SchemaValidation {
        stage,
        detail: e.to_string(),
    })
}
