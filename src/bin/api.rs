use axis_decision_layer::{api::start_server, gateway::ClaudeClient, pipeline::AnalysisPipeline};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    // Load environment variables
    dotenv::dotenv().ok();

    let api_key = std::env::var("CLAUDE_API_KEY").unwrap_or_else(|_| {
        eprintln!("⚠️  CLAUDE_API_KEY not set in .env");
        eprintln!("📌 Analysis requests will fail until it is configured");
        String::new()
    });

    let model =
        std::env::var("CLAUDE_MODEL").unwrap_or_else(|_| "claude-sonnet-4-6".to_string());

    let port: u16 = std::env::var("PORT")
        .or_else(|_| std::env::var("API_PORT"))
        .unwrap_or_else(|_| "8080".to_string())
        .parse()?;

    info!("🚀 Axis Decision Layer - API Server");
    info!("📍 Port: {}", port);
    info!("🧠 Model: {}", model);

    // Create the pipeline over the real client
    let client = ClaudeClient::new(api_key, model.clone());
    let pipeline = Arc::new(AnalysisPipeline::new(Arc::new(client), model));

    info!("✅ Pipeline initialized");
    info!("📡 Starting API server...");

    start_server(pipeline, port).await?;

    Ok(())
}
