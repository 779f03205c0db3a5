use std::sync::Arc;

use anyhow::Result;
use lexis_config::ServiceConfig;
use lexis_models::load_summarizer;
use lexis_server::{app, telemetry, ServerState};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init();

    let config = ServiceConfig::from_env()?;
    let summarizer_config = config.models.summarizer.clone();

    let summarizer = tokio::task::spawn_blocking(move || load_summarizer(&summarizer_config)).await?;
    let state = ServerState::summarizer_only(summarizer);

    // CORS is always on for the standalone summarizer.
    let app = app::summarizer_router(Arc::new(state), true);
    app::serve(app, &config.addr()).await
}
