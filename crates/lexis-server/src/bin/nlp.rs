use std::sync::Arc;

use anyhow::Result;
use lexis_config::ServiceConfig;
use lexis_models::{load_question_answerer, load_summarizer, load_translator};
use lexis_server::{app, telemetry, ServerState};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init();

    let config = ServiceConfig::from_env()?;
    let models = config.models.clone();

    info!("Initializing models... this may take a minute on first run");
    let state = tokio::task::spawn_blocking(move || {
        ServerState::new(
            load_summarizer(&models.summarizer),
            load_translator(&models.translator),
            load_question_answerer(&models.qa),
        )
    })
    .await?;

    let app = app::nlp_router(Arc::new(state), config.cors);
    app::serve(app, &config.addr()).await
}
