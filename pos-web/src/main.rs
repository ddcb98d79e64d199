//! Servidor web Axum com WebSocket para visualização da etiquetagem POS em tempo real

use std::path::PathBuf;
use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::{Html, IntoResponse, Json},
    routing::{get, post},
    Router,
};
use pos_core::{PipelineEvent, PosPipeline, TaggedWord, TaggerConfig};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Estado compartilhado da aplicação (o modelo é imutável, então basta um `Arc`)
struct AppState {
    pipeline: PosPipeline,
}

#[derive(Deserialize)]
struct AnnotateRequest {
    text: String,
}

/// Mensagem WebSocket recebida do cliente
#[derive(Deserialize)]
struct WsRequest {
    text: String,
}

#[derive(Serialize)]
struct AnnotateResponse {
    tagged: Vec<TaggedWord>,
    total_tokens: usize,
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate<'a> {
    classes: &'a [String],
    num_features: usize,
    dictionary_len: usize,
}

/// Lê a configuração do modelo: `POS_CONFIG` (JSON) ou `POS_MODEL_DIR` (padrão `tagger/`).
fn load_config() -> Result<TaggerConfig, pos_core::LoadError> {
    match std::env::var_os("POS_CONFIG") {
        Some(path) => TaggerConfig::from_json_file(PathBuf::from(path)),
        None => {
            let dir = std::env::var_os("POS_MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("tagger"));
            Ok(TaggerConfig::from_dir(dir))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = load_config()?;
    let pipeline = match PosPipeline::from_config(&config) {
        Ok(p) => p,
        Err(e) => {
            error!(kind = ?e.kind(), "falha ao carregar o modelo: {e}");
            return Err(e.into());
        }
    };
    let state = Arc::new(AppState { pipeline });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(index_handler))
        .route("/annotate", post(annotate_handler))
        .route("/classes", get(classes_handler))
        .route("/ws", get(ws_handler))
        .layer(ServiceBuilder::new().layer(cors))
        .with_state(state);

    let addr = std::env::var("POS_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Servidor POS iniciado em http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

/// Página principal
async fn index_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let model = state.pipeline.tagger().model();
    let page = IndexTemplate {
        classes: model.classes(),
        num_features: model.num_features(),
        dictionary_len: model.dictionary_len(),
    };
    match page.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

/// Etiquetagem via HTTP POST (sem streaming). Texto em branco devolve lista vazia.
async fn annotate_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnnotateRequest>,
) -> impl IntoResponse {
    let tagger = state.pipeline.tagger().clone();
    let tagged = match tokio::task::spawn_blocking(move || tagger.tag(&req.text)).await {
        Ok(tagged) => tagged,
        Err(e) => {
            error!("tarefa de etiquetagem falhou: {e}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    let total_tokens = tagged.len();

    Json(AnnotateResponse {
        tagged,
        total_tokens,
    })
    .into_response()
}

/// Classes do modelo, na ordem declarada
async fn classes_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.pipeline.tagger().model().classes().to_vec())
}

/// Upgrade HTTP → WebSocket
async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_websocket(socket, state))
}

/// Aceita JSON `{text}` ou texto puro.
fn ws_text(message: &str) -> String {
    match serde_json::from_str::<WsRequest>(message) {
        Ok(req) => req.text,
        Err(_) => message.to_string(),
    }
}

/// Roda o pipeline fora do runtime e coleta todos os eventos. Texto em branco
/// ainda produz `TokenizationDone` e `Done`.
async fn stream_events(
    state: Arc<AppState>,
    text: String,
) -> Result<Vec<PipelineEvent>, tokio::task::JoinError> {
    let (tx_std, rx_std) = std::sync::mpsc::channel::<PipelineEvent>();
    tokio::task::spawn_blocking(move || {
        state.pipeline.analyze_streaming(&text, tx_std);
    })
    .await?;
    Ok(rx_std.try_iter().collect())
}

/// Lógica do WebSocket: recebe texto, executa o pipeline e envia os eventos um a um
async fn handle_websocket(mut socket: WebSocket, state: Arc<AppState>) {
    info!("WebSocket conectado");

    while let Some(Ok(msg)) = socket.recv().await {
        match msg {
            Message::Text(text) => {
                let text_str = ws_text(&text);
                info!("Etiquetando via WebSocket: {} chars", text_str.len());

                let events = match stream_events(Arc::clone(&state), text_str).await {
                    Ok(events) => events,
                    Err(e) => {
                        error!("pipeline falhou: {e}");
                        return;
                    }
                };
                for event in &events {
                    if let Ok(json) = serde_json::to_string(event) {
                        if socket.send(Message::Text(json.into())).await.is_err() {
                            return; // cliente desconectou
                        }
                        // Pequena pausa para animação visual (passo a passo)
                        tokio::time::sleep(tokio::time::Duration::from_millis(35)).await;
                    }
                }
            }
            Message::Close(_) => {
                info!("WebSocket desconectado");
                return;
            }
            Message::Ping(payload) => {
                let _ = socket.send(Message::Pong(payload)).await;
            }
            _ => {}
        }
    }
}
