use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use carelink_api::state::AppState;
use carelink_api::ws::registry::SessionRegistry;
use carelink_captions::asr::google::GoogleSttProvider;
use carelink_captions::asr::whisper::WhisperProvider;
use carelink_captions::asr::AsrProvider;
use carelink_captions::translate::GoogleTranslateProvider;
use carelink_captions::{
    CaptionPipeline, FfmpegConverter, LexiconCorrector, TranscriptStore, TranscriptionEngine,
    Translator,
};
use carelink_config::Settings;
use carelink_services::{HttpLexiconStore, HttpTranscriptStore, InMemoryTranscriptStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::load()?;
    let provider_timeout = Duration::from_secs(settings.pipeline.provider_timeout_secs);

    // ASR chain. At least one provider key is required; the second, when
    // present, becomes the fallback.
    let google_key = settings.providers.google_api_key.clone();
    let openai_key = settings.providers.openai_api_key.clone();
    let (primary, fallback): (Arc<dyn AsrProvider>, Option<Arc<dyn AsrProvider>>) =
        match (&google_key, &openai_key) {
            (Some(google), Some(openai)) => (
                Arc::new(GoogleSttProvider::new(google, provider_timeout)?),
                Some(Arc::new(WhisperProvider::new(openai, provider_timeout)?) as _),
            ),
            (Some(google), None) => (
                Arc::new(GoogleSttProvider::new(google, provider_timeout)?),
                None,
            ),
            (None, Some(openai)) => (
                Arc::new(WhisperProvider::new(openai, provider_timeout)?),
                None,
            ),
            (None, None) => anyhow::bail!(
                "No speech provider configured: set CARELINK__PROVIDERS__GOOGLE_API_KEY or CARELINK__PROVIDERS__OPENAI_API_KEY"
            ),
        };
    let engine = TranscriptionEngine::new(primary, fallback, settings.pipeline.languages.clone());

    let translator = match &google_key {
        Some(key) => Translator::new(Some(Arc::new(GoogleTranslateProvider::new(
            key,
            provider_timeout,
        )?) as _)),
        None => {
            warn!("No translation provider configured; captions will pass through untranslated");
            Translator::new(None)
        }
    };

    let datastore_timeout = provider_timeout;
    let lexicon = match &settings.datastore.base_url {
        Some(base_url) => Some(LexiconCorrector::new(
            Arc::new(HttpLexiconStore::new(
                base_url,
                settings.datastore.api_key.clone(),
                datastore_timeout,
            )?),
            settings.pipeline.lexicon_threshold,
        )),
        None => None,
    };

    let transcript: Arc<dyn TranscriptStore> = match &settings.datastore.base_url {
        Some(base_url) => Arc::new(HttpTranscriptStore::new(
            base_url,
            settings.datastore.api_key.clone(),
            datastore_timeout,
        )?),
        None => {
            warn!("No datastore configured; transcripts are kept in memory only");
            Arc::new(InMemoryTranscriptStore::new())
        }
    };

    let converter = FfmpegConverter::new(
        settings.pipeline.ffmpeg_binary.clone(),
        Duration::from_secs(settings.pipeline.convert_timeout_secs),
    );
    if !converter.probe().await {
        warn!(
            binary = %settings.pipeline.ffmpeg_binary,
            "ffmpeg not found; audio will be sent to providers unconverted"
        );
    }

    let pipeline = CaptionPipeline::new(
        settings.pipeline.clone(),
        Some(converter),
        engine,
        lexicon,
        translator,
        Some(transcript),
    );

    let state = AppState::new(Arc::new(SessionRegistry::new()), Arc::new(pipeline));
    let app = carelink_api::build_router(state);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "Caption service listening");
    axum::serve(listener, app).await?;

    Ok(())
}
