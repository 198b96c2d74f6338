//! Analysis pipeline — the staged orchestration graph
//!
//! EXTRACTION → {TRADEOFF ∥ VOLATILITY ∥ SCENARIO} → {SUMMARY ∥ SNAPSHOT ∥ DRIFT?} → ASSEMBLE
//!
//! One coordinating task per request. Stage results flow strictly forward
//! and are never recomputed. A concurrent group is a barrier: every member
//! runs to completion, then the first failure aborts the run. A failed run
//! yields no decision log at all.

use crate::enrichment::{apply_user_overrides, build_boundary_gate, format_usd, volatility_label};
use crate::gateway::{generate_structured, TextGenerator};
use crate::models::{
    AnalysisResponse, DecisionLog, DriftReport, ExecutiveSnapshot, ExtractionOutput,
    FinalSummaryOutput, HumanBoundaryGate, InputData, MetaInfo, ProvidedFields, ScenarioOutput,
    TradeoffOutput, VolatilityOutput,
};
use crate::prompts;
use crate::schema::{validate_stage, Stage};
use crate::error::AnalysisError;
use crate::Result;
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

const SCHEMA_VERSION: &str = "1.1";
const SYSTEM_NAME: &str = "Axis";
const DISCLAIMER: &str = "Not financial advice. Decision support only.";

/// One analysis request. prior_log is the previous session's decision log
/// document, already parsed; supplying it enables the drift stage.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub decision_narrative: String,
    pub monthly_burn: Option<f64>,
    pub runway_months: Option<f64>,
    pub income_delta: Option<f64>,
    pub risk_tolerance_level: String,
    pub downside_limit: f64,
    pub prior_log: Option<Value>,
}

/// Sequences the analysis stages and assembles the decision log
pub struct AnalysisPipeline {
    generator: Arc<dyn TextGenerator>,
    model: String,
}

impl AnalysisPipeline {
    pub fn new(generator: Arc<dyn TextGenerator>, model: String) -> Self {
        Self { generator, model }
    }

    /// Run the full pipeline for one request
    pub async fn run(&self, request: AnalysisRequest) -> Result<AnalysisResponse> {
        let run_id = Uuid::new_v4();
        let generator = self.generator.as_ref();

        info!(
            run_id = %run_id,
            narrative_chars = request.decision_narrative.len(),
            has_prior_log = request.prior_log.is_some(),
            "Starting decision analysis"
        );

        let narrative_with_context = build_narrative_context(&request);

        // === STAGE 1: EXTRACTION (sequential) ===
        debug!(run_id = %run_id, stage = %Stage::Extraction, "Calling model");
        let extraction_raw = generate_structured(
            generator,
            prompts::EXTRACTION_SYSTEM,
            &narrative_with_context,
        )
        .await?;
        let mut extraction: ExtractionOutput = validate_stage(Stage::Extraction, extraction_raw)?;

        // User-provided values take precedence over model-extracted ones
        apply_user_overrides(
            &mut extraction.variables,
            request.monthly_burn,
            request.runway_months,
            request.income_delta,
        );

        let enriched_context = format!(
            "{}\n\nExtracted variables:\n{}",
            narrative_with_context,
            serde_json::to_string_pretty(&extraction)?
        );

        // === STAGE 2: TRADEOFF ∥ VOLATILITY ∥ SCENARIO ===
        // Barrier: all three complete before any outcome is inspected, so
        // in-flight calls are never abandoned. First failure wins.
        debug!(run_id = %run_id, "Running analysis group");
        let (tradeoff_raw, volatility_raw, scenario_raw) = tokio::join!(
            generate_structured(generator, prompts::TRADEOFF_SYSTEM, &enriched_context),
            generate_structured(generator, prompts::VOLATILITY_SYSTEM, &enriched_context),
            generate_structured(generator, prompts::SCENARIO_SYSTEM, &enriched_context),
        );
        let tradeoff: TradeoffOutput = validate_stage(Stage::Tradeoff, tradeoff_raw?)?;
        let volatility: VolatilityOutput = validate_stage(Stage::Volatility, volatility_raw?)?;
        let scenario: ScenarioOutput = validate_stage(Stage::Scenario, scenario_raw?)?;

        // Gate is deterministic; confirmed_by_user stays false until the
        // user confirms after rendering, outside this pipeline.
        let gate = build_boundary_gate(&request.risk_tolerance_level, request.downside_limit);

        let full_context = format!(
            "{}\n\nTrade-off model:\n{}\n\nVolatility report:\n{}\n\nScenario simulation:\n{}",
            enriched_context,
            serde_json::to_string_pretty(&tradeoff)?,
            serde_json::to_string_pretty(&volatility)?,
            serde_json::to_string_pretty(&scenario)?,
        );

        // Snapshot context echoes the scenario what_breaks_first values so
        // the snapshot cannot invent a failure point of its own.
        let snapshot_context = format!(
            "{}\n\nFor what_breaks_first in the snapshot, derive from these scenario values:\n\
             Conservative: {}\nBase: {}\nOptimistic: {}",
            full_context,
            scenario.conservative.what_breaks_first,
            scenario.base.what_breaks_first,
            scenario.optimistic.what_breaks_first,
        );

        // Drift compares against the in-progress log; the executive snapshot
        // is not composed yet, so its section is an empty object here.
        let drift_context = match &request.prior_log {
            Some(prior) => Some(build_drift_context(
                prior,
                &extraction,
                &tradeoff,
                &volatility,
                &scenario,
                &gate,
            )?),
            None => None,
        };

        // === STAGE 3: SUMMARY ∥ SNAPSHOT ∥ DRIFT? ===
        debug!(
            run_id = %run_id,
            drift = drift_context.is_some(),
            "Running summary group"
        );
        let (summary_raw, snapshot_raw, drift_raw) = tokio::join!(
            generate_structured(generator, prompts::FINAL_SUMMARY_SYSTEM, &full_context),
            generate_structured(
                generator,
                prompts::EXECUTIVE_SNAPSHOT_SYSTEM,
                &snapshot_context
            ),
            async {
                match &drift_context {
                    Some(context) => generate_structured(generator, prompts::DRIFT_SYSTEM, context)
                        .await
                        .map(Some),
                    None => Ok(None),
                }
            },
        );
        let summary_raw = summary_raw?;
        let mut snapshot_raw = snapshot_raw?;
        let drift_raw = drift_raw?;

        // === ASSEMBLY (no model involvement) ===
        // The snapshot's score/label pair always comes from the volatility
        // stage, so the pair can never disagree with the report itself.
        let score = volatility.volatility_score_0_to_100;
        let Some(snapshot_fields) = snapshot_raw.as_object_mut() else {
            return Err(AnalysisError::SchemaValidation {
                stage: Stage::ExecutiveSnapshot,
                detail: "expected a JSON object".to_string(),
            });
        };
        snapshot_fields.insert("volatility_score".to_string(), serde_json::json!(score));
        snapshot_fields.insert(
            "volatility_label".to_string(),
            Value::String(volatility_label(score).to_string()),
        );

        let executive_snapshot: ExecutiveSnapshot =
            validate_stage(Stage::ExecutiveSnapshot, snapshot_raw)?;
        let final_summary: FinalSummaryOutput = validate_stage(Stage::FinalSummary, summary_raw)?;

        let drift_report = match drift_raw {
            Some(raw) => Some(validate_stage::<DriftReport>(Stage::Drift, raw)?),
            None => None,
        };

        let decision_log = DecisionLog {
            meta: MetaInfo {
                schema_version: SCHEMA_VERSION.to_string(),
                created_at: Utc::now().to_rfc3339(),
                system_name: SYSTEM_NAME.to_string(),
                model: self.model.clone(),
                disclaimer: DISCLAIMER.to_string(),
            },
            input: InputData {
                decision_narrative: request.decision_narrative,
                provided_fields: ProvidedFields {
                    monthly_burn: request.monthly_burn,
                    runway_months: request.runway_months,
                    income_delta: request.income_delta,
                },
            },
            executive_snapshot,
            extraction,
            tradeoff_model: tradeoff,
            volatility_report: volatility,
            scenario_simulation: scenario,
            human_boundary_gate: gate,
            final_summary,
        };

        info!(
            run_id = %run_id,
            volatility_score = score,
            drift = drift_report.is_some(),
            "Decision analysis complete"
        );

        Ok(AnalysisResponse {
            decision_log,
            drift_report,
        })
    }
}

/// Narrative plus the caller's numeric context, when any was supplied
fn build_narrative_context(request: &AnalysisRequest) -> String {
    let mut numeric_lines = Vec::new();
    if let Some(monthly_burn) = request.monthly_burn {
        numeric_lines.push(format!(
            "Monthly expenses: {}/month",
            format_usd(monthly_burn)
        ));
    }
    if let Some(runway_months) = request.runway_months {
        numeric_lines.push(format!("Financial runway: {} months", runway_months));
    }
    if let Some(income_delta) = request.income_delta {
        let sign = if income_delta >= 0.0 { "+" } else { "" };
        numeric_lines.push(format!(
            "Income change: {}{}/year",
            sign,
            format_usd(income_delta)
        ));
    }

    if numeric_lines.is_empty() {
        request.decision_narrative.clone()
    } else {
        format!(
            "{}\n\nUser-provided numeric context:\n{}",
            request.decision_narrative,
            numeric_lines.join("\n")
        )
    }
}

fn build_drift_context(
    prior_log: &Value,
    extraction: &ExtractionOutput,
    tradeoff: &TradeoffOutput,
    volatility: &VolatilityOutput,
    scenario: &ScenarioOutput,
    gate: &HumanBoundaryGate,
) -> Result<String> {
    let current_partial = serde_json::json!({
        "executive_snapshot": {},
        "extraction": extraction,
        "tradeoff_model": tradeoff,
        "volatility_report": volatility,
        "scenario_simulation": scenario,
        "human_boundary_gate": gate,
    });

    Ok(format!(
        "Prior decision log:\n{}\n\nCurrent decision analysis:\n{}",
        serde_json::to_string_pretty(prior_log)?,
        serde_json::to_string_pretty(&current_partial)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MockGenerator;

    fn pipeline(generator: MockGenerator) -> AnalysisPipeline {
        AnalysisPipeline::new(Arc::new(generator), "mock".to_string())
    }

    fn request(narrative: &str) -> AnalysisRequest {
        AnalysisRequest {
            decision_narrative: narrative.to_string(),
            monthly_burn: None,
            runway_months: None,
            income_delta: None,
            risk_tolerance_level: "Medium".to_string(),
            downside_limit: 0.0,
            prior_log: None,
        }
    }

    #[tokio::test]
    async fn test_end_to_end_without_prior_log() {
        let pipeline = pipeline(MockGenerator::canned());

        let response = pipeline
            .run(request("Should I quit my job to start a business?"))
            .await
            .unwrap();

        let log = &response.decision_log;
        assert_eq!(log.meta.schema_version, "1.1");
        assert_eq!(log.meta.system_name, "Axis");
        assert!(!log.human_boundary_gate.confirmed_by_user);
        assert!(log.human_boundary_gate.required);
        assert!(response.drift_report.is_none());
        assert_eq!(
            log.input.decision_narrative,
            "Should I quit my job to start a business?"
        );
        // no overrides supplied: every provided field echoes as None
        assert_eq!(log.input.provided_fields.monthly_burn, None);
    }

    #[tokio::test]
    async fn test_snapshot_score_and_label_come_from_volatility_stage() {
        // canned snapshot carries no volatility fields at all; a snapshot
        // that invents its own must still end up with the stage's values
        let generator = MockGenerator::canned().stub(
            prompts::EXECUTIVE_SNAPSHOT_SYSTEM,
            r#"{
              "volatility_score": 3,
              "volatility_label": "Low instability",
              "primary_tension": "t",
              "highest_optionality_path": "p",
              "most_dangerous_assumption": "a",
              "what_breaks_first": "Cash reserves",
              "what_this_means_in_plain_language": ["one", "two", "three"]
            }"#,
        );
        let pipeline = pipeline(generator);

        let response = pipeline.run(request("narrative")).await.unwrap();
        let snapshot = &response.decision_log.executive_snapshot;

        // canned volatility stage scores 72
        assert_eq!(snapshot.volatility_score, 72.0);
        assert_eq!(snapshot.volatility_label, "Elevated instability");
        assert_eq!(
            snapshot.volatility_score,
            response
                .decision_log
                .volatility_report
                .volatility_score_0_to_100
        );
    }

    #[tokio::test]
    async fn test_user_override_outranks_model_extraction() {
        // canned extraction reports monthly_burn 4200 and runway 8
        let pipeline = pipeline(MockGenerator::canned());

        let mut req = request("narrative");
        req.monthly_burn = Some(5000.0);
        let response = pipeline.run(req).await.unwrap();

        let variables = &response.decision_log.extraction.variables;
        assert_eq!(variables.monthly_burn, Some(5000.0));
        assert_eq!(variables.runway_months, Some(8.0));
        assert_eq!(
            response.decision_log.input.provided_fields.monthly_burn,
            Some(5000.0)
        );
    }

    #[tokio::test]
    async fn test_prior_log_enables_drift_stage() {
        let pipeline = pipeline(MockGenerator::canned());

        let mut req = request("narrative");
        req.prior_log = Some(serde_json::json!({"meta": {"schema_version": "1.1"}}));
        let response = pipeline.run(req).await.unwrap();

        let drift = response.drift_report.expect("drift report expected");
        assert!(drift.drift_detected);
        assert_eq!(drift.changes.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_required_field_fails_naming_stage() {
        // tradeoff output without dimensions
        let generator = MockGenerator::canned().stub(
            prompts::TRADEOFF_SYSTEM,
            r#"{"options": [], "opportunity_costs": [], "recommendation_style_note": "n"}"#,
        );
        let pipeline = pipeline(generator);

        let error = pipeline.run(request("narrative")).await.unwrap_err();
        assert!(matches!(
            error,
            AnalysisError::SchemaValidation {
                stage: Stage::Tradeoff,
                ..
            }
        ));
        assert!(error.to_string().contains("tradeoff"));
    }

    #[tokio::test]
    async fn test_failed_group_member_yields_no_log() {
        let generator = MockGenerator::canned().stub(prompts::SCENARIO_SYSTEM, "not json at all");
        let pipeline = pipeline(generator);

        let error = pipeline.run(request("narrative")).await.unwrap_err();
        assert!(matches!(error, AnalysisError::Generation(_)));
    }

    #[test]
    fn test_numeric_context_lines() {
        let mut req = request("narrative");
        req.monthly_burn = Some(5000.0);
        req.income_delta = Some(-12000.0);

        let context = build_narrative_context(&req);
        assert!(context.contains("User-provided numeric context:"));
        assert!(context.contains("Monthly expenses: $5,000.00/month"));
        assert!(context.contains("Income change: $-12,000.00/year"));
        assert!(!context.contains("Financial runway"));
    }

    #[test]
    fn test_drift_context_leaves_snapshot_empty() {
        let req = request("narrative");
        let extraction: ExtractionOutput = serde_json::from_value(serde_json::json!({
            "decision_type": "d", "time_horizon_months": null, "declared_goal": "g",
            "constraints": [], "assumptions_made_explicit": [],
            "variables": {"monthly_burn": null, "runway_months": null, "income_delta": null, "liquidity_need_months": null},
            "unknowns": [], "questions_to_clarify": []
        }))
        .unwrap();
        let tradeoff: TradeoffOutput = serde_json::from_value(serde_json::json!({
            "dimensions": [], "options": [], "opportunity_costs": [], "recommendation_style_note": "n"
        }))
        .unwrap();
        let volatility: VolatilityOutput = serde_json::from_value(serde_json::json!({
            "volatility_score_0_to_100": 10.0, "detected_biases": [], "detected_biases_human": [],
            "contradictions": [], "pressure_signals": [], "stabilizing_moves": [], "human_must_decide": []
        }))
        .unwrap();
        let scenario: ScenarioOutput = serde_json::from_value(serde_json::json!({
            "conservative": {"assumptions": [], "runway_impact": "", "trajectory_impact": "", "primary_risks": [], "what_breaks_first": ""},
            "base": {"assumptions": [], "runway_impact": "", "trajectory_impact": "", "primary_risks": [], "what_breaks_first": ""},
            "optimistic": {"assumptions": [], "runway_impact": "", "trajectory_impact": "", "primary_risks": [], "what_breaks_first": ""}
        }))
        .unwrap();
        let gate = build_boundary_gate(&req.risk_tolerance_level, req.downside_limit);

        let context = build_drift_context(
            &serde_json::json!({"prior": true}),
            &extraction,
            &tradeoff,
            &volatility,
            &scenario,
            &gate,
        )
        .unwrap();

        assert!(context.starts_with("Prior decision log:"));
        assert!(context.contains("\"executive_snapshot\": {}"));
        assert!(context.contains("Current decision analysis:"));
    }
}
