use std::{error::Error, sync::Arc};

use ai_llm_service::{
    LlmServiceProfiles,
    config::default_config::{config_embedding_from_env, config_generation_from_env},
    telemetry,
};
use api::AppState;
use rag_pipeline::{PipelineConfig, RagPipeline};
use tracing::{Level, info};
use tracing_subscriber::{Layer, filter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // A missing .env is fine; a malformed one is not.
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(e.into());
        }
    }

    init_tracing();

    let llm = Arc::new(LlmServiceProfiles::new(
        config_generation_from_env()?,
        config_embedding_from_env()?,
        None,
    )?);
    let (generation, embedding) = llm.profiles();
    info!(
        generation_model = %generation.model,
        embedding_model = %embedding.model,
        "LLM profiles loaded"
    );

    let cfg = PipelineConfig::from_env()?;
    let pipeline = RagPipeline::from_config(&cfg, llm.clone()).await?;

    api::start(AppState::new(Arc::new(pipeline), llm, cfg.raw_dir.clone())).await?;
    Ok(())
}

/// Workspace crates log through the library layer; everything else only at WARN and above.
fn init_tracing() {
    let third_party = fmt::layer().with_target(true).with_filter(filter::filter_fn(|meta| {
        *meta.level() <= Level::WARN
            && !telemetry::WORKSPACE_TARGETS
                .iter()
                .any(|t| meta.target().starts_with(t))
    }));

    tracing_subscriber::registry()
        .with(telemetry::env_filter_with_level("warn", Level::INFO))
        .with(telemetry::layer())
        .with(third_party)
        .init();
}
