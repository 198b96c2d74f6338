//! Deterministic enrichment: code-generated, not AI-generated
//!
//! Pure functions merged into the decision log after the model stages
//! return. Nothing in this module calls the model, and every output is
//! reproducible bit-for-bit from its inputs.

use crate::models::{ExtractionVariables, HumanBoundaryGate};

/// Map a 0–100 volatility score to its discrete label.
/// Band boundaries are inclusive on the lower side: 30, 60, 80.
pub fn volatility_label(score: f64) -> &'static str {
    if score <= 30.0 {
        "Low instability"
    } else if score <= 60.0 {
        "Moderate instability"
    } else if score <= 80.0 {
        "Elevated instability"
    } else {
        "High instability"
    }
}

/// User-provided values take precedence over model-extracted ones,
/// independently for each overridable field. No exceptions.
pub fn apply_user_overrides(
    variables: &mut ExtractionVariables,
    monthly_burn: Option<f64>,
    runway_months: Option<f64>,
    income_delta: Option<f64>,
) {
    if monthly_burn.is_some() {
        variables.monthly_burn = monthly_burn;
    }
    if runway_months.is_some() {
        variables.runway_months = runway_months;
    }
    if income_delta.is_some() {
        variables.income_delta = income_delta;
    }
}

/// Build the boundary gate record. confirmed_by_user starts false no matter
/// what the caller claims; it is flipped by the user in the UI, never here.
pub fn build_boundary_gate(risk_tolerance_level: &str, downside_limit: f64) -> HumanBoundaryGate {
    HumanBoundaryGate {
        required: true,
        user_declared_risk_tolerance: risk_tolerance_level.to_string(),
        user_declared_downside_limit: downside_limit,
        ai_must_stop_reason: "All final judgment belongs to you.".to_string(),
        confirmed_by_user: false,
    }
}

/// Render a dollar amount with thousands grouping: 5000 → "$5,000.00".
/// Negative amounts keep the sign inside: -1234.5 → "$-1,234.50".
pub fn format_usd(amount: f64) -> String {
    let fixed = format!("{:.2}", amount);
    let (integer, fraction) = match fixed.split_once('.') {
        Some((i, f)) => (i, f),
        None => (fixed.as_str(), "00"),
    };

    let (sign, digits) = match integer.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", integer),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("${}{}.{}", sign, grouped, fraction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volatility_label_bands() {
        assert_eq!(volatility_label(0.0), "Low instability");
        assert_eq!(volatility_label(30.0), "Low instability");
        assert_eq!(volatility_label(30.01), "Moderate instability");
        assert_eq!(volatility_label(60.0), "Moderate instability");
        assert_eq!(volatility_label(60.01), "Elevated instability");
        assert_eq!(volatility_label(80.0), "Elevated instability");
        assert_eq!(volatility_label(80.01), "High instability");
        assert_eq!(volatility_label(100.0), "High instability");
    }

    #[test]
    fn test_overrides_replace_extracted_values() {
        let mut variables = ExtractionVariables {
            monthly_burn: Some(4200.0),
            runway_months: Some(8.0),
            income_delta: None,
            liquidity_need_months: Some(6.0),
        };

        apply_user_overrides(&mut variables, Some(5000.0), None, Some(-1200.0));

        assert_eq!(variables.monthly_burn, Some(5000.0));
        // not supplied: model value survives
        assert_eq!(variables.runway_months, Some(8.0));
        assert_eq!(variables.income_delta, Some(-1200.0));
        // never overridable
        assert_eq!(variables.liquidity_need_months, Some(6.0));
    }

    #[test]
    fn test_gate_never_starts_confirmed() {
        let gate = build_boundary_gate("High", -25000.0);
        assert!(gate.required);
        assert!(!gate.confirmed_by_user);
        assert_eq!(gate.user_declared_risk_tolerance, "High");
        assert_eq!(gate.user_declared_downside_limit, -25000.0);
    }

    #[test]
    fn test_format_usd_grouping() {
        assert_eq!(format_usd(5000.0), "$5,000.00");
        assert_eq!(format_usd(0.5), "$0.50");
        assert_eq!(format_usd(999.99), "$999.99");
        assert_eq!(format_usd(1_000_000.0), "$1,000,000.00");
        assert_eq!(format_usd(-1234.5), "$-1,234.50");
    }
}
