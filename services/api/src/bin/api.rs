//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{
        GenAiStudyAdapter, JsonFilePreferences, QuranContentAdapter, SpeechUnavailable,
        WhisperRecitationAdapter,
    },
    config::Config,
    error::ApiError,
    web::{api_router, rest::ApiDoc, state::AppState},
};
use async_openai::{config::OpenAIConfig, Client};
use axum::http::{header::CONTENT_TYPE, HeaderValue, Method};
use axum::Router;
use quran_study_core::{
    capture::SpeechAvailability, orchestrator::AiOrchestrator, preferences::SessionPreferences,
    SpeechToTextService,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Initialize Service Adapters ---
    let http = reqwest::Client::builder()
        .user_agent(concat!("quran-study-api/", env!("CARGO_PKG_VERSION")))
        .build()?;
    let content = Arc::new(QuranContentAdapter::new(
        http,
        config.content_api_base.clone(),
        config.recitation_edition.clone(),
        config.commentary_edition.clone(),
    ));

    let genai = GenAiStudyAdapter::from_key(
        config.genai_api_key.as_deref(),
        &config.genai_api_base,
        config.genai_model.clone(),
    );
    if config.genai_api_key.is_none() {
        warn!("GENAI_API_KEY is not set; study tools will report a configuration error.");
    }
    let study = AiOrchestrator::new(Arc::new(genai));

    // Capability query: speech recognition needs a transcription credential.
    let (speech, speech_availability): (Arc<dyn SpeechToTextService>, SpeechAvailability) =
        match config.openai_api_key.as_deref() {
            Some(key) => {
                let client = Client::with_config(OpenAIConfig::new().with_api_key(key));
                let adapter = WhisperRecitationAdapter::new(
                    client,
                    config.sst_model.clone(),
                    config.speech_language.clone(),
                );
                (Arc::new(adapter), SpeechAvailability::Available)
            }
            None => {
                warn!("OPENAI_API_KEY is not set; recitation checks need a device transcript.");
                (Arc::new(SpeechUnavailable), SpeechAvailability::Unavailable)
            }
        };

    // --- 3. Load the Last-Read Marker ---
    let store = Arc::new(JsonFilePreferences::new(config.data_dir.clone()));
    let mut preferences = SessionPreferences::new(store);
    match preferences.load_last_read().await {
        Ok(Some(marker)) => info!("Last read: chapter {} ({}).", marker.chapter_id, marker.chapter_name),
        Ok(None) => info!("No last-read marker stored yet."),
        Err(e) => warn!("Could not read the last-read marker: {}", e),
    }

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        config: config.clone(),
        content,
        study,
        speech,
        speech_availability,
        preferences: Arc::new(Mutex::new(preferences)),
    });

    let origin = config.cors_origin.parse::<HeaderValue>().map_err(|e| {
        ApiError::Internal(format!("Invalid CORS origin '{}': {}", config.cors_origin, e))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    // --- 5. Create the Web Router ---
    let app = Router::new()
        .merge(api_router(app_state).layer(cors))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
