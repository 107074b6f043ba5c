use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use carelink_api::state::AppState;
use carelink_api::ws::registry::SessionRegistry;
use carelink_captions::asr::{AsrProvider, RecognitionConfig};
use carelink_captions::translate::TranslationProvider;
use carelink_captions::{
    CaptionConfig, CaptionPipeline, LexiconCorrector, TranscriptStore, TranscriptionEngine,
    Translator,
};
use carelink_services::{InMemoryTranscriptStore, StaticLexicon};

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// ASR stand-in that answers every chunk with a fixed transcript
/// (`None` simulates silence).
struct ScriptedAsr {
    reply: Option<String>,
}

#[async_trait]
impl AsrProvider for ScriptedAsr {
    async fn recognize(
        &self,
        _audio: &[u8],
        _config: &RecognitionConfig,
    ) -> anyhow::Result<Option<String>> {
        Ok(self.reply.clone())
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Deterministic translator: appends the target language so tests can tell
/// the stage ran.
struct EchoTranslate;

#[async_trait]
impl TranslationProvider for EchoTranslate {
    async fn translate(&self, text: &str, _source: &str, target: &str) -> anyhow::Result<String> {
        Ok(format!("{text} ({target})"))
    }

    fn name(&self) -> &str {
        "echo"
    }
}

/// A full service instance on an ephemeral port, with scripted providers
/// and in-memory stores. No ffmpeg, no network beyond localhost.
pub struct TestApp {
    pub addr: SocketAddr,
    pub http: reqwest::Client,
    pub transcripts: Arc<InMemoryTranscriptStore>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_asr(Some("sir dard")).await
    }

    pub async fn spawn_with_asr(reply: Option<&str>) -> Self {
        let asr = Arc::new(ScriptedAsr {
            reply: reply.map(str::to_string),
        });
        let engine = TranscriptionEngine::new(asr, None, Default::default());

        let lexicon = StaticLexicon::new([
            ("sir".to_string(), "head".to_string()),
            ("dard".to_string(), "pain".to_string()),
        ]);
        let corrector = LexiconCorrector::new(Arc::new(lexicon), 0.85);

        let transcripts = Arc::new(InMemoryTranscriptStore::new());

        let pipeline = CaptionPipeline::new(
            CaptionConfig::default(),
            // No converter: raw-PCM test chunks skip conversion anyway.
            None,
            engine,
            Some(corrector),
            Translator::new(Some(Arc::new(EchoTranslate) as _)),
            Some(transcripts.clone() as Arc<dyn TranscriptStore>),
        );

        let state = AppState::new(Arc::new(SessionRegistry::new()), Arc::new(pipeline));
        let app = carelink_api::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            http: reqwest::Client::new(),
            transcripts,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn ws_connect(&self, session_id: &str, role: &str) -> WsClient {
        let url = format!("ws://{}/ws/captions/{}/{}", self.addr, session_id, role);
        let (ws, _) = connect_async(&url).await.expect("WebSocket handshake");
        ws
    }

    /// Attempts a WebSocket handshake without unwrapping, for
    /// rejection tests.
    pub async fn try_ws_connect(
        &self,
        session_id: &str,
        role: &str,
    ) -> Result<WsClient, tokio_tungstenite::tungstenite::Error> {
        let url = format!("ws://{}/ws/captions/{}/{}", self.addr, session_id, role);
        connect_async(&url).await.map(|(ws, _)| ws)
    }

    /// Next text frame as JSON, with a 5s budget. Panics on close or
    /// timeout so tests fail loudly.
    pub async fn recv_json(ws: &mut WsClient) -> serde_json::Value {
        let deadline = Duration::from_secs(5);
        loop {
            let frame = tokio::time::timeout(deadline, ws.next())
                .await
                .expect("timed out waiting for frame")
                .expect("stream ended")
                .expect("WebSocket error");
            match frame {
                Message::Text(text) => {
                    return serde_json::from_str(text.as_str()).expect("frame is JSON");
                }
                Message::Ping(_) | Message::Pong(_) => continue,
                other => panic!("unexpected frame: {other:?}"),
            }
        }
    }
}

/// A chunk that matches the raw-PCM heuristic: even length within
/// 8000..=192000 bytes and no container magic.
pub fn pcm_chunk() -> Vec<u8> {
    vec![0u8; 16_000]
}
