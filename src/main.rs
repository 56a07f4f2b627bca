mod board;
mod clock;
mod config;
mod error;
mod game;
mod penalty;
mod roster;
mod session;
mod timeline;
mod types;

use std::collections::HashMap;
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, Query, State, WebSocketUpgrade};
use axum::http::{Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{Mutex, broadcast, mpsc, oneshot};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::board::{Board, PlayerReport};
use crate::clock::{SystemTimeSource, TimeSource};
use crate::game::{Registry, SessionCommand, SessionEvent, SessionHandle};
use crate::timeline::StateChange;
use crate::types::*;

#[derive(Clone)]
struct AppState {
    registry: Arc<Registry>,
    game_config: GameConfig,
    time: Arc<dyn TimeSource>,
}

type Sender = Arc<Mutex<SplitSink<WebSocket, Message>>>;

// ─── Session queries ──────────────────────────────────────────────

fn lookup(state: &AppState, session_id: &str) -> Option<SessionHandle> {
    state.registry.sessions.get(session_id).map(|h| h.clone())
}

async fn query_board(handle: &SessionHandle) -> Option<Board> {
    let (reply, rx) = oneshot::channel();
    handle.cmd_tx.send(SessionCommand::Board { reply }).await.ok()?;
    rx.await.ok()
}

async fn query_report(handle: &SessionHandle) -> Option<Vec<PlayerReport>> {
    let (reply, rx) = oneshot::channel();
    handle.cmd_tx.send(SessionCommand::Report { reply }).await.ok()?;
    rx.await.ok()
}

async fn query_timeline(handle: &SessionHandle) -> Option<Vec<StateChange>> {
    let (reply, rx) = oneshot::channel();
    handle.cmd_tx.send(SessionCommand::Timeline { reply }).await.ok()?;
    rx.await.ok()
}

// ─── HTTP routes ──────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    "ok"
}

async fn board_handler(
    Path(session_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Board>, StatusCode> {
    let handle = lookup(&state, &session_id).ok_or(StatusCode::NOT_FOUND)?;
    query_board(&handle)
        .await
        .map(Json)
        .ok_or(StatusCode::SERVICE_UNAVAILABLE)
}

async fn report_handler(
    Path(session_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Vec<PlayerReport>>, StatusCode> {
    let handle = lookup(&state, &session_id).ok_or(StatusCode::NOT_FOUND)?;
    query_report(&handle)
        .await
        .map(Json)
        .ok_or(StatusCode::SERVICE_UNAVAILABLE)
}

async fn timeline_handler(
    Path(session_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Vec<StateChange>>, StatusCode> {
    let handle = lookup(&state, &session_id).ok_or(StatusCode::NOT_FOUND)?;
    query_timeline(&handle)
        .await
        .map(Json)
        .ok_or(StatusCode::SERVICE_UNAVAILABLE)
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let client_id = params.get("clientId").cloned().unwrap_or_default();
    ws.on_upgrade(move |socket| handle_socket(socket, state, client_id))
}

enum Next {
    Subscribe(Option<broadcast::Receiver<SessionEvent>>),
    Event(Result<SessionEvent, RecvError>),
}

/// Forward session events addressed to this socket until it closes.
async fn forward_events(
    sender: Sender,
    socket_id: String,
    mut sub_rx: mpsc::Receiver<broadcast::Receiver<SessionEvent>>,
) {
    let mut events: Option<broadcast::Receiver<SessionEvent>> = None;
    loop {
        let next = match events.as_mut() {
            Some(rx) => tokio::select! {
                sub = sub_rx.recv() => Next::Subscribe(sub),
                event = rx.recv() => Next::Event(event),
            },
            None => Next::Subscribe(sub_rx.recv().await),
        };

        match next {
            Next::Subscribe(Some(rx)) => events = Some(rx),
            Next::Subscribe(None) => return,
            Next::Event(Ok(event)) => {
                let msg = match event {
                    SessionEvent::SendTo { socket_id: target, msg } if target == socket_id => msg,
                    SessionEvent::SendTo { .. } => continue,
                    SessionEvent::Broadcast { msg } => msg,
                };
                if !send_msg(&sender, &msg).await {
                    return;
                }
            }
            Next::Event(Err(RecvError::Lagged(skipped))) => {
                tracing::warn!("Socket {} lagged, {} events skipped", socket_id, skipped);
            }
            // Session ended, wait for another one
            Next::Event(Err(RecvError::Closed)) => events = None,
        }
    }
}

async fn subscribe(sub_tx: &mpsc::Sender<broadcast::Receiver<SessionEvent>>, handle: &SessionHandle) {
    let _ = sub_tx.send(handle.event_tx.subscribe()).await;
}

async fn handle_socket(socket: WebSocket, state: AppState, client_id: String) {
    let (sender, mut receiver) = socket.split();
    let sender: Sender = Arc::new(Mutex::new(sender));

    let socket_id = uuid::Uuid::new_v4().to_string();
    tracing::info!("WebSocket connected: {} client: {}", socket_id, client_id);

    // Subscriptions are made here, before any command goes out, so the first
    // reply of a session is never missed.
    let (sub_tx, sub_rx) = mpsc::channel(4);
    let event_task = tokio::spawn(forward_events(sender.clone(), socket_id.clone(), sub_rx));

    while let Some(Ok(msg)) = receiver.next().await {
        let Message::Text(text) = msg else { continue };

        let client_msg: ClientMsg = match serde_json::from_str(&text) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!("Invalid message: {}", e);
                send_msg(&sender, &ServerMsg::ErrorMessage {
                    message: "Invalid message".to_string(),
                })
                .await;
                continue;
            }
        };

        match client_msg {
            ClientMsg::CreateSession { password } => {
                if password != state.game_config.operator_password {
                    send_msg(&sender, &ServerMsg::ErrorMessage {
                        message: "Invalid password".to_string(),
                    })
                    .await;
                    continue;
                }

                let handle = match game::create_session(
                    state.registry.clone(),
                    socket_id.clone(),
                    client_id.clone(),
                    &state.game_config,
                    state.time.clone(),
                ) {
                    Ok(handle) => handle,
                    Err(e) => {
                        tracing::warn!("Socket {} cannot create a session: {}", socket_id, e);
                        send_msg(&sender, &ServerMsg::ErrorMessage { message: e.to_string() }).await;
                        continue;
                    }
                };
                subscribe(&sub_tx, &handle).await;

                send_msg(&sender, &ServerMsg::SessionCreated {
                    session_id: handle.session_id.clone(),
                    join_code: handle.join_code.clone(),
                })
                .await;
                if let Some(board) = query_board(&handle).await {
                    send_msg(&sender, &ServerMsg::Board { board }).await;
                }
            }

            ClientMsg::OperatorReconnect { session_id } => {
                let Some(handle) = lookup(&state, &session_id) else {
                    send_msg(&sender, &ServerMsg::Reset {
                        message: "Session expired".to_string(),
                    })
                    .await;
                    continue;
                };
                subscribe(&sub_tx, &handle).await;
                let _ = handle
                    .cmd_tx
                    .send(SessionCommand::OperatorReconnect {
                        socket_id: socket_id.clone(),
                        client_id: client_id.clone(),
                    })
                    .await;
            }

            ClientMsg::ViewerJoin { join_code } => {
                if join_code.len() != 6 {
                    send_msg(&sender, &ServerMsg::ErrorMessage {
                        message: "Invalid join code".to_string(),
                    })
                    .await;
                    continue;
                }

                let Some(handle) = state.registry.find_by_code(&join_code) else {
                    send_msg(&sender, &ServerMsg::ErrorMessage {
                        message: "Session not found".to_string(),
                    })
                    .await;
                    continue;
                };
                subscribe(&sub_tx, &handle).await;
                let _ = handle
                    .cmd_tx
                    .send(SessionCommand::ViewerJoin {
                        socket_id: socket_id.clone(),
                    })
                    .await;
            }

            ClientMsg::Act { session_id, action } => {
                let Some(handle) = lookup(&state, &session_id) else {
                    send_msg(&sender, &ServerMsg::ErrorMessage {
                        message: "Session not found".to_string(),
                    })
                    .await;
                    continue;
                };
                let _ = handle
                    .cmd_tx
                    .send(SessionCommand::Act {
                        socket_id: socket_id.clone(),
                        action,
                    })
                    .await;
            }

            ClientMsg::RequestReport { session_id } => {
                let rows = match lookup(&state, &session_id) {
                    Some(handle) => query_report(&handle).await,
                    None => None,
                };
                let msg = match rows {
                    Some(rows) => ServerMsg::Report { rows },
                    None => ServerMsg::ErrorMessage {
                        message: "Session not found".to_string(),
                    },
                };
                send_msg(&sender, &msg).await;
            }
        }
    }

    // Socket disconnected
    tracing::info!("WebSocket disconnected: {}", socket_id);
    event_task.abort();

    let operator_of = state.registry.operator_sockets.get(&socket_id).map(|s| s.clone());
    if let Some(handle) = operator_of.and_then(|sid| lookup(&state, &sid)) {
        let _ = handle
            .cmd_tx
            .send(SessionCommand::OperatorDisconnect {
                socket_id: socket_id.clone(),
            })
            .await;
    }

    let viewer_of = state.registry.viewer_sockets.get(&socket_id).map(|s| s.clone());
    if let Some(handle) = viewer_of.and_then(|sid| lookup(&state, &sid)) {
        let _ = handle
            .cmd_tx
            .send(SessionCommand::ViewerLeave {
                socket_id: socket_id.clone(),
            })
            .await;
    }
}

/// Returns false once the socket is gone.
async fn send_msg(sender: &Sender, msg: &ServerMsg) -> bool {
    let Ok(json) = serde_json::to_string(msg) else {
        return true;
    };
    let mut s = sender.lock().await;
    s.send(Message::Text(json.into())).await.is_ok()
}

// ─── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,tower_http=info".into()))
        .init();

    let game_config = match config::init().and_then(|_| config::load_game_config()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse()
        .expect("Invalid PORT");

    let base_url = std::env::var("BASE_URL").unwrap_or_else(|_| format!("http://localhost:{}", port));

    let state = AppState {
        registry: Registry::new(),
        game_config,
        time: Arc::new(SystemTimeSource),
    };

    let app = Router::new()
        .route("/healthz", get(health))
        .route("/api/sessions/{session_id}/board", get(board_handler))
        .route("/api/sessions/{session_id}/report", get(report_handler))
        .route("/api/sessions/{session_id}/timeline", get(timeline_handler))
        .route("/ws", get(ws_handler))
        .layer(CorsLayer::new().allow_methods([Method::GET]).allow_origin(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .expect("Failed to bind");

    tracing::info!("courtclock server running at {}", base_url);

    axum::serve(listener, app).await.expect("Server error");
}
