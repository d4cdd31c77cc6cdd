//! HTTP + WebSocket API for the detector
//!
//! Endpoints:
//! - GET  /health      - Health check
//! - GET  /metrics     - Latest frame metrics
//! - GET  /settings    - Live settings (raw and clamped)
//! - PUT  /settings    - Replace live settings
//! - POST /recalibrate - Request recalibration
//! - WS   /ws          - Live frame metrics

use axum::{
    extract::{State, WebSocketUpgrade, ws::{Message, WebSocket}},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::core::control::SharedControl;
use crate::core::ports::MetricsSink;
use crate::types::{DetectorSettings, EffectiveSettings, FrameMetrics};

/// Shared between the detection thread and the handlers
pub struct AppState {
    pub control: SharedControl,
    latest: RwLock<Option<FrameMetrics>>,
    updates: broadcast::Sender<FrameMetrics>,
}

impl AppState {
    pub fn new(control: SharedControl) -> Arc<Self> {
        let (updates, _) = broadcast::channel(256);
        Arc::new(Self {
            control,
            latest: RwLock::new(None),
            updates,
        })
    }

    /// Most recent frame, if any
    pub fn latest(&self) -> Option<FrameMetrics> {
        self.latest.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Subscribe to live frames
    pub fn subscribe(&self) -> broadcast::Receiver<FrameMetrics> {
        self.updates.subscribe()
    }
}

/// Sink feeding the API from the detection loop
#[derive(Clone)]
pub struct LiveSink {
    state: Arc<AppState>,
}

impl LiveSink {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }
}

impl MetricsSink for LiveSink {
    fn publish(&mut self, metrics: &FrameMetrics, _settings: &EffectiveSettings) -> anyhow::Result<()> {
        *self.state.latest.write().unwrap_or_else(|e| e.into_inner()) = Some(metrics.clone());
        // No subscribers is fine
        let _ = self.state.updates.send(metrics.clone());
        Ok(())
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub frames: u64,
    pub calibrated: bool,
}

/// Settings response
#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub settings: DetectorSettings,
    pub effective: EffectiveSettings,
    pub recalibrate_token: u64,
}

/// Recalibration response
#[derive(Debug, Serialize)]
pub struct RecalibrateResponse {
    pub recalibrate_token: u64,
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(get_metrics))
        .route("/settings", get(get_settings).put(put_settings))
        .route("/recalibrate", post(recalibrate))
        .route("/ws", get(websocket_handler))
        .with_state(state)
}

/// Health check endpoint
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let latest = state.latest();
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
        frames: latest.as_ref().map_or(0, |m| m.frame),
        calibrated: latest.as_ref().is_some_and(|m| m.baseline.is_some()),
    })
}

/// Latest frame metrics
async fn get_metrics(State(state): State<Arc<AppState>>) -> Result<Json<FrameMetrics>, StatusCode> {
    state.latest().map(Json).ok_or(StatusCode::NOT_FOUND)
}

/// Current settings
async fn get_settings(State(state): State<Arc<AppState>>) -> Json<SettingsResponse> {
    Json(settings_response(&state))
}

/// Replace settings; out-of-range values are accepted and clamped on use
async fn put_settings(
    State(state): State<Arc<AppState>>,
    Json(settings): Json<DetectorSettings>,
) -> Json<SettingsResponse> {
    debug!(?settings, "settings replaced");
    state.control.set_settings(settings);
    Json(settings_response(&state))
}

fn settings_response(state: &AppState) -> SettingsResponse {
    let control = state.control.get();
    SettingsResponse {
        effective: control.settings.sanitized(),
        settings: control.settings,
        recalibrate_token: control.recalibrate_token,
    }
}

/// Bump the recalibration token
async fn recalibrate(State(state): State<Arc<AppState>>) -> Json<RecalibrateResponse> {
    let recalibrate_token = state.control.request_recalibration();
    info!(recalibrate_token, "recalibration requested via API");
    Json(RecalibrateResponse { recalibrate_token })
}

/// WebSocket handler for live updates
async fn websocket_handler(
    State(state): State<Arc<AppState>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let rx = state.subscribe();
    ws.on_upgrade(move |socket| handle_websocket(socket, rx))
}

/// Forward frames until either side goes away
async fn handle_websocket(socket: WebSocket, mut rx: broadcast::Receiver<FrameMetrics>) {
    let (mut sender, mut receiver) = socket.split();
    loop {
        tokio::select! {
            update = rx.recv() => match update {
                Ok(metrics) => {
                    let json = serde_json::to_string(&metrics).unwrap_or_default();
                    if sender.send(Message::Text(json)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "websocket client lagging");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
}

/// Run the API server until ctrl-c
pub async fn run_server(addr: &str, state: Arc<AppState>) -> anyhow::Result<()> {
    let router = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Eyewatch API running on {}", addr);
    info!("  GET  /health      - Health check");
    info!("  GET  /metrics     - Latest frame");
    info!("  GET  /settings    - Live settings");
    info!("  PUT  /settings    - Replace settings");
    info!("  POST /recalibrate - Request recalibration");
    info!("  WS   /ws          - Live frames");
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}
