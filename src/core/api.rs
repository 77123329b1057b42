//! HTTP + WebSocket API for the Mermin device
//!
//! Endpoints:
//! - GET /health - Health check
//! - POST /run - Run the device with two settings
//! - GET /history - All runs
//! - GET /history/:index - One run
//! - GET /history/export?format=json|text - Exact export bytes
//! - GET /stats - Correlation table
//! - WS /ws - Live stream of new runs

use axum::{
    extract::{
        rejection::JsonRejection,
        ws::{Message, WebSocket},
        Path, Query, State, WebSocketUpgrade,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use log::{info, warn};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

use crate::core::{CorrelationStats, Device};
use crate::error::{MerminError, Result};
use crate::types::{Color, ExportFormat, RunRecord};

/// App state
///
/// The write lock serializes appends; readers share the read lock and never
/// see a half-appended run.
pub struct AppState {
    pub device: RwLock<Device<StdRng>>,
    pub updates: broadcast::Sender<RunView>,
}

/// Run request
///
/// Settings arrive as raw JSON values so strings, floats and out-of-range
/// integers all fail as `InvalidSetting`.
#[derive(Debug, Deserialize)]
pub struct RunRequest {
    pub setting1: Value,
    pub setting2: Value,
}

fn setting_value(value: &Value) -> Result<i64> {
    value.as_i64().ok_or_else(|| {
        MerminError::InvalidSetting(match value {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        })
    })
}

/// One run as reported by the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunView {
    pub index: usize,
    pub setting1: u8,
    pub setting2: u8,
    pub outcome1: u8,
    pub outcome2: u8,
    pub color1: Color,
    pub color2: Color,
    pub agree: bool,
}

impl RunView {
    pub fn new(index: usize, record: &RunRecord) -> Self {
        let outcomes = record.outcomes();
        let (color1, color2) = record.colors();
        Self {
            index,
            setting1: record.setting1().value(),
            setting2: record.setting2().value(),
            outcome1: outcomes.first.bit(),
            outcome2: outcomes.second.bit(),
            color1,
            color2,
            agree: record.agrees(),
        }
    }
}

/// History response
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub length: usize,
    pub fingerprint: String,
    pub runs: Vec<RunView>,
}

/// Export query
#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub format: Option<String>,
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub runs: usize,
}

/// Error body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for MerminError {
    fn into_response(self) -> Response {
        let status = match &self {
            MerminError::InvalidSetting(_)
            | MerminError::UnsupportedFormat(_)
            | MerminError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            MerminError::IndexOutOfRange { .. } => StatusCode::NOT_FOUND,
            MerminError::RandomSource(_) | MerminError::Io(_) | MerminError::Json(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(ErrorResponse { error: self.to_string() })).into_response()
    }
}

/// Create the API router around a device session
pub fn create_router(device: Device<StdRng>) -> Router {
    let (updates, _) = broadcast::channel(100);
    let state = Arc::new(AppState {
        device: RwLock::new(device),
        updates,
    });

    Router::new()
        .route("/health", get(health))
        .route("/run", post(run))
        .route("/history", get(history))
        .route("/history/export", get(export))
        .route("/history/:index", get(history_entry))
        .route("/stats", get(stats))
        .route("/ws", get(websocket_handler))
        .with_state(state)
}

/// Health check endpoint
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let device = state.device.read().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
        runs: device.history().len(),
    })
}

impl From<JsonRejection> for MerminError {
    fn from(rejection: JsonRejection) -> Self {
        MerminError::InvalidRequest(rejection.body_text())
    }
}

/// Run the device
async fn run(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<RunRequest>, JsonRejection>,
) -> Result<Json<RunView>> {
    let Json(req) = body?;
    let setting1 = setting_value(&req.setting1)?;
    let setting2 = setting_value(&req.setting2)?;

    let mut device = state.device.write().await;
    let record = device.run_raw(setting1, setting2)?;
    let view = RunView::new(device.history().len() - 1, &record);
    drop(device);

    // No subscribers is fine
    let _ = state.updates.send(view.clone());
    Ok(Json(view))
}

/// Full history
async fn history(State(state): State<Arc<AppState>>) -> Result<Json<HistoryResponse>> {
    let device = state.device.read().await;
    let log = device.history();
    Ok(Json(HistoryResponse {
        length: log.len(),
        fingerprint: log.fingerprint()?,
        runs: log.iter().enumerate().map(|(i, r)| RunView::new(i, r)).collect(),
    }))
}

/// One history entry
async fn history_entry(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
) -> Result<Json<RunView>> {
    let device = state.device.read().await;
    let record = device.history().get(index)?;
    Ok(Json(RunView::new(index, &record)))
}

/// History export, exactly as a saved file
async fn export(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ExportQuery>,
) -> Result<Response> {
    let format: ExportFormat = match query.format.as_deref() {
        Some(tag) => tag.parse()?,
        None => ExportFormat::Json,
    };
    let device = state.device.read().await;
    let bytes = device.history().export(format)?;
    info!("Exported {} runs as {}", device.history().len(), format);
    Ok(([(header::CONTENT_TYPE, format.content_type())], bytes).into_response())
}

/// Correlation statistics
async fn stats(State(state): State<Arc<AppState>>) -> Json<CorrelationStats> {
    let device = state.device.read().await;
    Json(device.stats())
}

/// WebSocket handler for live updates
async fn websocket_handler(
    State(state): State<Arc<AppState>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let rx = state.updates.subscribe();
    ws.on_upgrade(move |socket| async move {
        handle_websocket(socket, rx).await;
    })
}

/// Handle WebSocket connection
async fn handle_websocket(mut socket: WebSocket, mut rx: broadcast::Receiver<RunView>) {
    while let Some(update) = next_update(&mut rx).await {
        let Ok(json) = serde_json::to_string(&update) else {
            continue;
        };
        if socket.send(Message::Text(json)).await.is_err() {
            break;
        }
    }
}

/// Next run for a subscriber; a lagging subscriber skips ahead instead of
/// being dropped. `None` once the channel is closed.
async fn next_update(rx: &mut broadcast::Receiver<RunView>) -> Option<RunView> {
    loop {
        match rx.recv().await {
            Ok(update) => return Some(update),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("websocket client fell behind, skipped {} runs", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => return None,
        }
    }
}

/// Run the API server
pub async fn run_server(addr: &str, device: Device<StdRng>) -> Result<()> {
    let router = create_router(device);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Mermin device API listening on {}", addr);
    println!("Mermin device API running on {}", addr);
    println!("  GET  /health                  - Health check");
    println!("  POST /run                     - Run the device");
    println!("  GET  /history                 - All runs");
    println!("  GET  /history/:index          - One run");
    println!("  GET  /history/export?format=  - Export (json|text)");
    println!("  GET  /stats                   - Correlation table");
    println!("  WS   /ws                      - Live updates");
    axum::serve(listener, router).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DetectorSetting, Outcome, OutcomePair};

    fn view(index: usize) -> RunView {
        let s = DetectorSetting::new(0).unwrap();
        let record = RunRecord::new(s, s, OutcomePair::new(Outcome::One, Outcome::One));
        RunView::new(index, &record)
    }

    #[tokio::test]
    async fn test_lagging_subscriber_keeps_receiving() {
        let (tx, mut rx) = broadcast::channel(2);
        for i in 0..5 {
            tx.send(view(i)).unwrap();
        }
        // Oldest runs were overwritten; the subscriber resumes at the newest kept
        assert_eq!(next_update(&mut rx).await.unwrap().index, 3);
        assert_eq!(next_update(&mut rx).await.unwrap().index, 4);

        drop(tx);
        assert!(next_update(&mut rx).await.is_none());
    }

    #[test]
    fn test_setting_value() {
        assert_eq!(setting_value(&serde_json::json!(2)).unwrap(), 2);
        assert_eq!(setting_value(&serde_json::json!(-4)).unwrap(), -4);
        for bad in [serde_json::json!("1"), serde_json::json!(1.5), serde_json::json!(null)] {
            assert!(matches!(setting_value(&bad), Err(MerminError::InvalidSetting(_))));
        }
    }
}
