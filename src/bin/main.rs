use axis_decision_layer::{
    gateway::MockGenerator,
    pipeline::{AnalysisPipeline, AnalysisRequest},
};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    info!("Axis Decision Layer starting (mock generator)");

    // Run the full pipeline against canned stage outputs — no API key needed
    let pipeline = AnalysisPipeline::new(Arc::new(MockGenerator::canned()), "mock".to_string());

    let request = AnalysisRequest {
        decision_narrative: "Should I quit my job to start a business?".to_string(),
        monthly_burn: None,
        runway_months: None,
        income_delta: None,
        risk_tolerance_level: "Medium".to_string(),
        downside_limit: 0.0,
        prior_log: None,
    };

    info!(
        narrative = %request.decision_narrative,
        "Running analysis pipeline"
    );

    match pipeline.run(request).await {
        Ok(response) => {
            let log = &response.decision_log;
            println!("\n=== DECISION LOG ===");
            println!("{}", serde_json::to_string_pretty(log)?);
            println!(
                "\nVolatility: {} ({})",
                log.executive_snapshot.volatility_score, log.executive_snapshot.volatility_label
            );
            println!(
                "Awaiting human confirmation: {}",
                !log.human_boundary_gate.confirmed_by_user
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("Analysis failed: {}", e);
            Err(Box::new(e) as Box<dyn std::error::Error>)
        }
    }
}
