//! Core data models for the decision analysis pipeline
//!
//! Field names and nesting are the wire contract: the decision log is
//! exchanged as a single nested JSON document, and prior-log drift
//! comparison depends on these exact keys.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

//
// ================= Metadata & Input Echo =================
//

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaInfo {
    pub schema_version: String,
    pub created_at: String,
    pub system_name: String,
    pub model: String,
    pub disclaimer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputData {
    pub decision_narrative: String,
    pub provided_fields: ProvidedFields,
}

/// Always carries all three keys; null when the caller did not supply one
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidedFields {
    pub monthly_burn: Option<f64>,
    pub runway_months: Option<f64>,
    pub income_delta: Option<f64>,
}

//
// ================= Extraction =================
//

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionVariables {
    pub monthly_burn: Option<f64>,
    pub runway_months: Option<f64>,
    pub income_delta: Option<f64>,
    pub liquidity_need_months: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionOutput {
    pub decision_type: String,
    pub time_horizon_months: Option<f64>,
    pub declared_goal: String,
    pub constraints: Vec<String>,
    pub assumptions_made_explicit: Vec<String>,
    pub variables: ExtractionVariables,
    pub unknowns: Vec<String>,
    pub questions_to_clarify: Vec<String>,
}

//
// ================= Trade-off Model =================
//

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeoffDimension {
    pub name: String,
    pub weight: f64,
    pub notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeoffOption {
    pub option_name: String,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
    pub dimension_scores: HashMap<String, f64>,
    pub summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeoffOutput {
    pub dimensions: Vec<TradeoffDimension>,
    pub options: Vec<TradeoffOption>,
    pub opportunity_costs: Vec<String>,
    pub recommendation_style_note: String,
}

//
// ================= Volatility Report =================
//

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contradiction {
    pub statement_a: String,
    pub statement_b: String,
    pub why_it_matters: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HumanDecision {
    pub decision: String,
    pub why_human: String,
}

/// Plain-language layer alongside the canonical bias names
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BiasHuman {
    pub name: String,
    pub plain_language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolatilityOutput {
    pub volatility_score_0_to_100: f64,
    pub detected_biases: Vec<String>,
    pub detected_biases_human: Vec<BiasHuman>,
    pub contradictions: Vec<Contradiction>,
    pub pressure_signals: Vec<String>,
    pub stabilizing_moves: Vec<String>,
    pub human_must_decide: Vec<HumanDecision>,
}

//
// ================= Scenario Simulation =================
//

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioDetail {
    pub assumptions: Vec<String>,
    pub runway_impact: String,
    pub trajectory_impact: String,
    pub primary_risks: Vec<String>,
    pub what_breaks_first: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioOutput {
    pub conservative: ScenarioDetail,
    pub base: ScenarioDetail,
    pub optimistic: ScenarioDetail,
}

//
// ================= Executive Snapshot =================
//

/// The compressed primary reading surface of a decision log.
/// volatility_score is copied from the volatility report and
/// volatility_label is code-generated — neither comes from the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutiveSnapshot {
    pub volatility_score: f64,
    pub volatility_label: String,
    pub primary_tension: String,
    pub highest_optionality_path: String,
    pub most_dangerous_assumption: String,
    pub what_breaks_first: String,
    pub what_this_means_in_plain_language: Vec<String>,
}

//
// ================= Final Summary =================
//

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalSummaryOutput {
    pub what_human_can_do_now: Vec<String>,
    pub what_ai_is_responsible_for: Vec<String>,
    pub where_ai_must_stop: Vec<String>,
    pub what_breaks_at_scale_first: Vec<String>,
}

//
// ================= Human Boundary Gate =================
//

/// Final judgment is reserved for a human. confirmed_by_user only becomes
/// true through an explicit user action after the log is rendered — the
/// pipeline never sets it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HumanBoundaryGate {
    pub required: bool,
    pub user_declared_risk_tolerance: String,
    pub user_declared_downside_limit: f64,
    pub ai_must_stop_reason: String,
    pub confirmed_by_user: bool,
}

//
// ================= Drift Report =================
//

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriftChange {
    pub field: String,
    pub before: Value,
    pub after: Value,
    pub risk: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriftReport {
    pub drift_detected: bool,
    pub changes: Vec<DriftChange>,
    pub value_weight_shift: Vec<String>,
    pub risk_tolerance_shift: String,
    pub volatility_shift: String,
    pub new_contradictions: Vec<String>,
    pub stabilization_advice: Vec<String>,
}

//
// ================= Decision Log =================
//

/// The final aggregate — one per request, immutable once assembled.
/// executive_snapshot comes first: it is the compression layer a reader
/// starts from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionLog {
    pub meta: MetaInfo,
    pub input: InputData,
    pub executive_snapshot: ExecutiveSnapshot,
    pub extraction: ExtractionOutput,
    pub tradeoff_model: TradeoffOutput,
    pub volatility_report: VolatilityOutput,
    pub scenario_simulation: ScenarioOutput,
    pub human_boundary_gate: HumanBoundaryGate,
    pub final_summary: FinalSummaryOutput,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub decision_log: DecisionLog,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drift_report: Option<DriftReport>,
}
