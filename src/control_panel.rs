//! HTTP control panel for the running session
//!
//! The panel only reads a status snapshot and forwards commands; the
//! session loop is the single owner of engine state.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc::{error::TrySendError, Sender};
use tokio::sync::RwLock;
use tokio::time::{sleep, Duration};
use tower_http::cors::CorsLayer;

use crate::controls::GridCommand;
use crate::live_status::LiveStatus;

const PUSH_PERIOD: Duration = Duration::from_millis(100); // 10Hz

#[derive(Clone)]
pub struct PanelState {
    pub status: Arc<RwLock<LiveStatus>>,
    pub commands: Sender<GridCommand>,
}

impl PanelState {
    pub fn new(commands: Sender<GridCommand>) -> Self {
        Self {
            status: Arc::new(RwLock::new(LiveStatus::new())),
            commands,
        }
    }
}

pub fn router(state: PanelState) -> Router {
    Router::new()
        .route("/status", get(status_handler))
        .route("/command", post(command_handler))
        .route("/ws", get(ws_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(state: PanelState, port: u16) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr).await?;
    log::info!("Control panel listening on http://{}", addr);

    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn status_handler(State(state): State<PanelState>) -> Json<LiveStatus> {
    Json(state.status.read().await.clone())
}

async fn command_handler(
    State(state): State<PanelState>,
    Json(command): Json<GridCommand>,
) -> impl IntoResponse {
    match state.commands.try_send(command) {
        Ok(()) => {
            log::debug!("Queued panel command {:?}", command);
            StatusCode::ACCEPTED
        }
        Err(TrySendError::Full(_)) => {
            log::warn!("Command queue full, dropping {:?}", command);
            StatusCode::TOO_MANY_REQUESTS
        }
        Err(TrySendError::Closed(_)) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<PanelState>) -> impl IntoResponse {
    ws.on_upgrade(|socket| push_status(socket, state))
}

async fn push_status(mut socket: WebSocket, state: PanelState) {
    loop {
        let json = {
            let status = state.status.read().await;
            match serde_json::to_string(&*status) {
                Ok(json) => json,
                Err(e) => {
                    log::error!("Failed to encode status: {}", e);
                    break;
                }
            }
        };

        if socket.send(Message::Text(json)).await.is_err() {
            // Client disconnected
            break;
        }

        sleep(PUSH_PERIOD).await;
    }
}
