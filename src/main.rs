use anyhow::Result;
use opencalls::{config::Config, pipeline::Pipeline};
use tracing::warn;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = Config::from_env()?;
    if config.openai_api_key().is_empty() {
        warn!("OPENAI_API_KEY is not set; extraction requests will be rejected");
    }
    if config.upload_token().is_empty() {
        warn!("OPENCALLS_UPLOAD_TOKEN is not set; uploads will be rejected");
    }

    let pipeline = Pipeline::from_config(config)?;
    pipeline.run().await;
    Ok(())
}
