//! Model gateway
//!
//! Wraps one opaque "generate structured text" capability behind the
//! TextGenerator trait. Free-form model output is coerced into a JSON
//! value here, with exactly one retry under a stricter instruction when
//! extraction fails. Validation against stage schemas happens downstream.

use crate::error::AnalysisError;
use crate::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tracing::warn;

pub mod claude;
pub use claude::ClaudeClient;

/// Appended to the user content on the second attempt only
const STRICT_JSON_DIRECTIVE: &str =
    "\n\nReturn valid JSON only. No markdown code blocks. No explanation. Just the raw JSON object.";

/// One stateless completion: system directive + user content → raw text.
/// No conversation state is carried between calls; the full context is
/// re-supplied every time.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, system: &str, user: &str) -> Result<String>;
}

/// Call the generator and coerce its output into a JSON value.
///
/// Fixed two-attempt sequence, not a generic retry loop: attempt one sends
/// the context as-is; attempt two re-sends it demanding raw JSON. A second
/// extraction failure is final.
pub async fn generate_structured(
    generator: &dyn TextGenerator,
    instructions: &str,
    context: &str,
) -> Result<Value> {
    let mut last_error = String::new();

    for attempt in 0..2 {
        let content = if attempt == 0 {
            context.to_string()
        } else {
            format!("{}{}", context, STRICT_JSON_DIRECTIVE)
        };

        let raw = generator.generate(instructions, &content).await?;

        match extract_json(&raw) {
            Ok(value) => return Ok(value),
            Err(detail) => {
                warn!(attempt, "Model output was not valid JSON");
                last_error = detail;
            }
        }
    }

    Err(AnalysisError::Generation(format!(
        "Failed to get valid JSON after retry. Last error: {}",
        last_error
    )))
}

/// Extract a JSON value from model output, tolerating markdown fences and
/// surrounding prose. Three tiers, first success wins: whole text, first
/// fenced block, outermost brace pair.
pub fn extract_json(text: &str) -> std::result::Result<Value, String> {
    let text = text.trim();

    // Direct parse first
    if let Ok(value) = serde_json::from_str(text) {
        return Ok(value);
    }

    // Strip markdown code fences
    if let Some(inner) = fenced_block(text) {
        if let Ok(value) = serde_json::from_str(inner) {
            return Ok(value);
        }
    }

    // Last resort: find outermost { ... }
    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if end > start {
            if let Ok(value) = serde_json::from_str(&text[start..=end]) {
                return Ok(value);
            }
        }
    }

    Err(format!(
        "Could not extract valid JSON from model output. Raw output:\n{}",
        truncate_chars(text, 500)
    ))
}

/// Contents of the first ``` fence, skipping an optional json language tag
fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let mut inner = &text[start + 3..];
    if let Some(rest) = inner.strip_prefix("json") {
        inner = rest;
    }
    let end = inner.find("```")?;
    Some(inner[..end].trim())
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

//
// ========== Mock Generator ==========
//

/// Mock generator for development & testing.
/// Keeps the pipeline functional without the external model service:
/// responses are keyed by system directive.
pub struct MockGenerator {
    responses: HashMap<String, String>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self {
            responses: HashMap::new(),
        }
    }

    /// Register (or replace) the canned response for a system directive
    pub fn stub(mut self, instructions: &str, response: &str) -> Self {
        self.responses
            .insert(instructions.to_string(), response.to_string());
        self
    }

    /// Schema-complete canned outputs for all seven stages
    pub fn canned() -> Self {
        use crate::prompts;

        Self::new()
            .stub(
                prompts::EXTRACTION_SYSTEM,
                r#"{
                  "decision_type": "Career Transition",
                  "time_horizon_months": 12,
                  "declared_goal": "Leave salaried work to start a business",
                  "constraints": ["Family depends on current income"],
                  "assumptions_made_explicit": ["The business can reach break-even within a year"],
                  "variables": {"monthly_burn": 4200, "runway_months": 8, "income_delta": -65000, "liquidity_need_months": 6},
                  "unknowns": ["Time to first paying customer"],
                  "questions_to_clarify": [
                    "What is the minimum monthly income you need?",
                    "How many months of expenses do you hold in cash?",
                    "Is part-time consulting an option?"
                  ]
                }"#,
            )
            .stub(
                prompts::TRADEOFF_SYSTEM,
                r#"{
                  "dimensions": [
                    {"name": "Stability", "weight": 0.3, "notes": "Income predictability"},
                    {"name": "Upside", "weight": 0.3, "notes": "Earnings ceiling"},
                    {"name": "Trajectory Alignment", "weight": 0.2, "notes": "Long-term direction"},
                    {"name": "Optionality", "weight": 0.2, "notes": "Future choices preserved"}
                  ],
                  "options": [
                    {
                      "option_name": "Quit now",
                      "pros": ["Full focus on the business"],
                      "cons": ["Runway pressure from day one"],
                      "dimension_scores": {"Stability": 2, "Upside": 9, "Trajectory Alignment": 8, "Optionality": 4},
                      "summary": "High upside, thin margin for error."
                    },
                    {
                      "option_name": "Stay and build on the side",
                      "pros": ["Income continues"],
                      "cons": ["Slow progress"],
                      "dimension_scores": {"Stability": 9, "Upside": 5, "Trajectory Alignment": 6, "Optionality": 8},
                      "summary": "Slower but keeps choices open."
                    }
                  ],
                  "opportunity_costs": ["Each salaried month is a month of delayed validation"],
                  "recommendation_style_note": "This is structured trade-off modeling, not financial advice."
                }"#,
            )
            .stub(
                prompts::VOLATILITY_SYSTEM,
                r#"{
                  "volatility_score_0_to_100": 72,
                  "detected_biases": ["Optimism Bias", "Sunk Cost Fallacy"],
                  "detected_biases_human": [
                    {"name": "Optimism Bias", "plain_language": "You may be weighting the best case more heavily than the evidence supports."},
                    {"name": "Sunk Cost Fallacy", "plain_language": "You may be protecting past effort more than evaluating future return."}
                  ],
                  "contradictions": [
                    {"statement_a": "I need stable income", "statement_b": "I want to quit immediately", "why_it_matters": "The stated need and the considered action pull in opposite directions."}
                  ],
                  "pressure_signals": ["Urgency without a deadline"],
                  "stabilizing_moves": ["Set a cash floor that triggers a return to employment"],
                  "human_must_decide": [
                    {"decision": "Whether the mission is worth the risk", "why_human": "Only you can weigh meaning against money."}
                  ]
                }"#,
            )
            .stub(
                prompts::SCENARIO_SYSTEM,
                r#"{
                  "conservative": {
                    "assumptions": ["Revenue takes 12 months"],
                    "runway_impact": "Cash exhausted in month 8",
                    "trajectory_impact": "Forced job search from a weak position",
                    "primary_risks": ["Burn outpaces learning"],
                    "what_breaks_first": "Cash reserves"
                  },
                  "base": {
                    "assumptions": ["First revenue in month 6"],
                    "runway_impact": "Tight but survivable",
                    "trajectory_impact": "Credible founder track record either way",
                    "primary_risks": ["Slow sales cycle"],
                    "what_breaks_first": "Discretionary spending"
                  },
                  "optimistic": {
                    "assumptions": ["Early customer traction"],
                    "runway_impact": "Break-even before reserves matter",
                    "trajectory_impact": "Compounding independence",
                    "primary_risks": ["Scaling too fast"],
                    "what_breaks_first": "Personal bandwidth"
                  }
                }"#,
            )
            .stub(
                prompts::FINAL_SUMMARY_SYSTEM,
                r#"{
                  "what_human_can_do_now": [
                    "Write down your walk-away cash floor",
                    "Price your first offer and pitch ten prospects",
                    "Agree the plan with your family"
                  ],
                  "what_ai_is_responsible_for": ["Structuring the trade-offs and scenarios above"],
                  "where_ai_must_stop": ["Deciding whether the mission is worth it to you"],
                  "what_breaks_at_scale_first": ["A single-founder schedule has no slack for setbacks"]
                }"#,
            )
            .stub(
                prompts::EXECUTIVE_SNAPSHOT_SYSTEM,
                r#"{
                  "primary_tension": "Security today against ownership of your time tomorrow.",
                  "highest_optionality_path": "Keep the salary while the first customers prove the idea.",
                  "most_dangerous_assumption": "That revenue arrives before the cash floor does.",
                  "what_breaks_first": "Cash reserves",
                  "what_this_means_in_plain_language": [
                    "You can afford to try this, but not indefinitely.",
                    "The earliest failure point is your cash floor, not the idea.",
                    "Keeping income while testing preserves the most choices."
                  ]
                }"#,
            )
            .stub(
                prompts::DRIFT_SYSTEM,
                r#"{
                  "drift_detected": true,
                  "changes": [
                    {"field": "executive_snapshot.volatility_label", "before": "Moderate instability", "after": "Elevated instability", "risk": "Pressure is rising between sessions"}
                  ],
                  "value_weight_shift": ["Security is being discounted relative to autonomy"],
                  "risk_tolerance_shift": "Declared tolerance unchanged, revealed tolerance higher",
                  "volatility_shift": "Score moved up between sessions",
                  "new_contradictions": [],
                  "stabilization_advice": ["Re-state the downside limit before acting"]
                }"#,
            )
    }
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(&self, system: &str, _user: &str) -> Result<String> {
        self.responses.get(system).cloned().ok_or_else(|| {
            AnalysisError::Upstream("No canned response for this directive".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Returns queued responses in order, recording each user content
    struct SequenceGenerator {
        responses: Mutex<Vec<String>>,
        seen_user_content: Mutex<Vec<String>>,
    }

    impl SequenceGenerator {
        fn new(responses: Vec<&str>) -> Self {
            Self {
                responses: Mutex::new(responses.iter().rev().map(|s| s.to_string()).collect()),
                seen_user_content: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for SequenceGenerator {
        async fn generate(&self, _system: &str, user: &str) -> Result<String> {
            self.seen_user_content
                .lock()
                .unwrap()
                .push(user.to_string());
            self.responses
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| AnalysisError::Upstream("out of responses".to_string()))
        }
    }

    #[test]
    fn test_extract_json_direct() {
        let value = extract_json(r#"{"a":1}"#).unwrap();
        assert_eq!(value["a"], 1);
    }

    #[test]
    fn test_extract_json_fenced() {
        let value = extract_json("```json\n{\"a\":1}\n```").unwrap();
        assert_eq!(value["a"], 1);
    }

    #[test]
    fn test_extract_json_fenced_untagged() {
        let value = extract_json("```\n{\"a\": true}\n```").unwrap();
        assert_eq!(value["a"], true);
    }

    #[test]
    fn test_extract_json_outermost_braces() {
        let value = extract_json("Here is the result: {\"a\":1} Thanks!").unwrap();
        assert_eq!(value["a"], 1);
    }

    #[test]
    fn test_extract_json_prose_around_fence() {
        let text = "Sure, here you go:\n```json\n{\"score\": 42}\n```\nLet me know!";
        let value = extract_json(text).unwrap();
        assert_eq!(value["score"], 42);
    }

    #[test]
    fn test_extract_json_failure_truncates_output() {
        let garbage = "x".repeat(2000);
        let error = extract_json(&garbage).unwrap_err();
        assert!(error.contains("Could not extract valid JSON"));
        // 500 chars of raw output plus the message prefix
        assert!(error.len() < 600);
    }

    #[tokio::test]
    async fn test_retry_succeeds_with_strict_directive() {
        let generator = SequenceGenerator::new(vec![
            "I'd be happy to help! The answer is probably around forty-two.",
            r#"{"answer": 42}"#,
        ]);

        let value = generate_structured(&generator, "directive", "context")
            .await
            .unwrap();
        assert_eq!(value["answer"], 42);

        let seen = generator.seen_user_content.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], "context");
        assert!(seen[1].starts_with("context"));
        assert!(seen[1].ends_with("Just the raw JSON object."));
    }

    #[tokio::test]
    async fn test_two_failures_surface_generation_error() {
        let generator = SequenceGenerator::new(vec!["not json", "still not json"]);

        let error = generate_structured(&generator, "directive", "context")
            .await
            .unwrap_err();
        assert!(matches!(error, AnalysisError::Generation(_)));
        assert!(error.to_string().contains("after retry"));
    }

    #[tokio::test]
    async fn test_upstream_error_is_not_retried() {
        let generator = SequenceGenerator::new(vec![]);

        let error = generate_structured(&generator, "directive", "context")
            .await
            .unwrap_err();
        assert!(matches!(error, AnalysisError::Upstream(_)));
        assert_eq!(generator.seen_user_content.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_mock_generator_round_trip() {
        let mock = MockGenerator::new().stub("sys", r#"{"ok": true}"#);
        let value = generate_structured(&mock, "sys", "anything").await.unwrap();
        assert_eq!(value["ok"], true);
    }

    #[tokio::test]
    async fn test_canned_covers_all_stages() {
        use crate::prompts;
        let mock = MockGenerator::canned();
        for system in [
            prompts::EXTRACTION_SYSTEM,
            prompts::TRADEOFF_SYSTEM,
            prompts::VOLATILITY_SYSTEM,
            prompts::SCENARIO_SYSTEM,
            prompts::FINAL_SUMMARY_SYSTEM,
            prompts::EXECUTIVE_SNAPSHOT_SYSTEM,
            prompts::DRIFT_SYSTEM,
        ] {
            let raw = mock.generate(system, "context").await.unwrap();
            assert!(extract_json(&raw).is_ok());
        }
    }
}
