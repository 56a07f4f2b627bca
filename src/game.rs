use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::{broadcast, mpsc, oneshot};
use uuid::Uuid;

use crate::board::{self, Board, PlayerReport};
use crate::clock::TimeSource;
use crate::error::{SessionError, TransitionError};
use crate::session::{Outcome, Session};
use crate::timeline::StateChange;
use crate::types::*;

/// Commands the WebSocket and HTTP handlers send to a session task.
#[derive(Debug)]
pub enum SessionCommand {
    Act {
        socket_id: String,
        action: Action,
    },
    ViewerJoin {
        socket_id: String,
    },
    ViewerLeave {
        socket_id: String,
    },
    OperatorDisconnect {
        socket_id: String,
    },
    OperatorReconnect {
        socket_id: String,
        client_id: String,
    },
    /// Fired when the grace period of disconnect number `generation` ends.
    OperatorDisconnectCheck {
        generation: u64,
    },
    Board {
        reply: oneshot::Sender<Board>,
    },
    Report {
        reply: oneshot::Sender<Vec<PlayerReport>>,
    },
    Timeline {
        reply: oneshot::Sender<Vec<StateChange>>,
    },
}

/// Events broadcast from the session to WebSocket connections.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Send a message to a specific socket.
    SendTo { socket_id: String, msg: ServerMsg },
    /// Broadcast a message to all sockets watching the session.
    Broadcast { msg: ServerMsg },
}

fn create_join_code() -> String {
    let mut rng = rand::rng();
    (0..6).map(|_| char::from(b'0' + rng.random_range(0..10))).collect()
}

/// Task-owned state of one running session.
struct SessionState {
    session_id: String,
    join_code: String,
    operator_socket_id: String,
    operator_client_id: String,
    operator_connected: bool,
    disconnects: u64,
    viewers: HashSet<String>,
    grace: Duration,
    time: Arc<dyn TimeSource>,
    session: Session,
}

impl SessionState {
    fn broadcast(&self, tx: &broadcast::Sender<SessionEvent>, msg: ServerMsg) {
        let _ = tx.send(SessionEvent::Broadcast { msg });
    }

    fn send_to(&self, tx: &broadcast::Sender<SessionEvent>, socket_id: &str, msg: ServerMsg) {
        let _ = tx.send(SessionEvent::SendTo {
            socket_id: socket_id.to_string(),
            msg,
        });
    }

    fn board(&self) -> Board {
        Board::build(&self.session, &self.session_id, &self.join_code, self.time.now())
    }

    fn broadcast_board(&self, tx: &broadcast::Sender<SessionEvent>) {
        self.broadcast(tx, ServerMsg::Board { board: self.board() });
    }

    fn broadcast_total_viewers(&self, tx: &broadcast::Sender<SessionEvent>) {
        self.broadcast(tx, ServerMsg::TotalViewers {
            count: self.viewers.len(),
        });
    }
}

/// Registry holds all live sessions.
pub struct Registry {
    /// session_id -> handle
    pub sessions: dashmap::DashMap<String, SessionHandle>,
    /// join_code -> session_id
    pub join_codes: dashmap::DashMap<String, String>,
    /// socket_id -> session_id  (for operator sockets)
    pub operator_sockets: dashmap::DashMap<String, String>,
    /// socket_id -> session_id  (for viewer sockets)
    pub viewer_sockets: dashmap::DashMap<String, String>,
}

#[derive(Clone)]
pub struct SessionHandle {
    pub session_id: String,
    pub join_code: String,
    pub cmd_tx: mpsc::Sender<SessionCommand>,
    pub event_tx: broadcast::Sender<SessionEvent>,
}

impl Registry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            sessions: dashmap::DashMap::new(),
            join_codes: dashmap::DashMap::new(),
            operator_sockets: dashmap::DashMap::new(),
            viewer_sockets: dashmap::DashMap::new(),
        })
    }

    pub fn find_by_code(&self, join_code: &str) -> Option<SessionHandle> {
        let session_id = self.join_codes.get(join_code)?;
        self.sessions.get(session_id.value()).map(|h| h.clone())
    }

    pub fn remove_session(&self, session_id: &str) {
        if let Some((_, handle)) = self.sessions.remove(session_id) {
            self.join_codes.remove(&handle.join_code);
        }
        self.operator_sockets.retain(|_, sid| sid != session_id);
        self.viewer_sockets.retain(|_, sid| sid != session_id);
    }

    fn unused_join_code(&self) -> String {
        loop {
            let code = create_join_code();
            if !self.join_codes.contains_key(&code) {
                return code;
            }
        }
    }
}

/// Create a new session and spawn its task. Returns the session handle.
pub fn create_session(
    registry: Arc<Registry>,
    operator_socket_id: String,
    operator_client_id: String,
    config: &GameConfig,
    time: Arc<dyn TimeSource>,
) -> Result<SessionHandle, SessionError> {
    if operator_client_id.is_empty() {
        return Err(SessionError::MissingClientId);
    }
    if registry.operator_sockets.contains_key(&operator_socket_id) {
        return Err(SessionError::AlreadyOperating);
    }

    let session_id = Uuid::new_v4().to_string();
    let join_code = registry.unused_join_code();

    let (cmd_tx, cmd_rx) = mpsc::channel(256);
    let (event_tx, _) = broadcast::channel(256);

    let handle = SessionHandle {
        session_id: session_id.clone(),
        join_code: join_code.clone(),
        cmd_tx,
        event_tx: event_tx.clone(),
    };

    registry.sessions.insert(session_id.clone(), handle.clone());
    registry.join_codes.insert(join_code.clone(), session_id.clone());
    registry
        .operator_sockets
        .insert(operator_socket_id.clone(), session_id.clone());

    let state = SessionState {
        session_id: session_id.clone(),
        join_code: join_code.clone(),
        operator_socket_id,
        operator_client_id,
        operator_connected: true,
        disconnects: 0,
        viewers: HashSet::new(),
        grace: Duration::from_secs(config.operator_grace_seconds),
        time,
        session: Session::new(config),
    };

    tokio::spawn(session_task(state, cmd_rx, event_tx, registry.clone()));

    tracing::info!("Session created: {} join code: {}", session_id, join_code);

    Ok(handle)
}

/// Apply one operator action to the aggregate.
pub fn apply(session: &mut Session, action: &Action, now: f64) -> Result<Outcome, TransitionError> {
    match action {
        Action::ClockStart => Ok(session.start_clock(now)),
        Action::ClockPause => Ok(session.pause_clock(now)),
        Action::ClockToggle => Ok(session.toggle_clock(now)),
        Action::ClockReset => Ok(session.reset_clock()),
        Action::Zero => Ok(session.zero()),
        Action::ConfigureTeam { side, setup } => session.configure_team(*side, setup),
        Action::SetStarters {
            side,
            numbers,
            retroactive,
        } => session.designate_starters(*side, numbers, *retroactive, now),
        Action::Substitute {
            side,
            player_out,
            player_in,
        } => session.substitute(*side, *player_out, *player_in, now),
        Action::Exclude { side, number } => session.exclude_two_minutes(*side, *number, now),
        Action::Expel { side, number } => session.expel(*side, *number, now),
        Action::CompleteReturn { side, number } => session.complete_return(*side, *number, now),
    }
}

async fn session_task(
    mut state: SessionState,
    mut cmd_rx: mpsc::Receiver<SessionCommand>,
    event_tx: broadcast::Sender<SessionEvent>,
    registry: Arc<Registry>,
) {
    while let Some(cmd) = cmd_rx.recv().await {
        match cmd {
            SessionCommand::Act { socket_id, action } => {
                handle_action(&mut state, &event_tx, socket_id, action);
            }
            SessionCommand::ViewerJoin { socket_id } => {
                handle_viewer_join(&mut state, &event_tx, &registry, socket_id);
            }
            SessionCommand::ViewerLeave { socket_id } => {
                registry.viewer_sockets.remove(&socket_id);
                if state.viewers.remove(&socket_id) {
                    state.broadcast_total_viewers(&event_tx);
                }
            }
            SessionCommand::OperatorDisconnect { socket_id } => {
                handle_operator_disconnect(&mut state, &registry, socket_id);
            }
            SessionCommand::OperatorReconnect { socket_id, client_id } => {
                handle_operator_reconnect(&mut state, &event_tx, &registry, socket_id, client_id);
            }
            SessionCommand::OperatorDisconnectCheck { generation } => {
                if !state.operator_connected && generation == state.disconnects {
                    state.broadcast(&event_tx, ServerMsg::Reset {
                        message: "Session closed".to_string(),
                    });
                    break;
                }
            }
            SessionCommand::Board { reply } => {
                let _ = reply.send(state.board());
            }
            SessionCommand::Report { reply } => {
                let _ = reply.send(board::report(&state.session, state.time.now()));
            }
            SessionCommand::Timeline { reply } => {
                let _ = reply.send(state.session.timeline().changes().to_vec());
            }
        }
    }

    registry.remove_session(&state.session_id);
    tracing::info!("Session {} task ended", state.session_id);
}

fn handle_action(
    state: &mut SessionState,
    tx: &broadcast::Sender<SessionEvent>,
    socket_id: String,
    action: Action,
) {
    if socket_id != state.operator_socket_id {
        state.send_to(tx, &socket_id, ServerMsg::ErrorMessage {
            message: "Only the operator can change the game".to_string(),
        });
        return;
    }

    let now = state.time.now();
    match apply(&mut state.session, &action, now) {
        Ok(outcome) => {
            tracing::debug!("Session {}: {:?} -> {}", state.session_id, action, outcome);
            state.send_to(tx, &socket_id, ServerMsg::ActionOk {
                message: outcome.to_string(),
            });
            state.broadcast_board(tx);
        }
        Err(e) => {
            tracing::warn!("Session {}: {:?} refused: {}", state.session_id, action, e);
            state.send_to(tx, &socket_id, ServerMsg::ErrorMessage {
                message: e.to_string(),
            });
        }
    }
}

fn handle_viewer_join(
    state: &mut SessionState,
    tx: &broadcast::Sender<SessionEvent>,
    registry: &Arc<Registry>,
    socket_id: String,
) {
    registry
        .viewer_sockets
        .insert(socket_id.clone(), state.session_id.clone());
    state.viewers.insert(socket_id.clone());

    state.send_to(tx, &socket_id, ServerMsg::SuccessJoin {
        session_id: state.session_id.clone(),
    });
    state.send_to(tx, &socket_id, ServerMsg::Board { board: state.board() });
    state.broadcast_total_viewers(tx);
}

fn handle_operator_disconnect(state: &mut SessionState, registry: &Arc<Registry>, socket_id: String) {
    if socket_id != state.operator_socket_id {
        return;
    }

    state.operator_connected = false;
    state.disconnects += 1;
    registry.operator_sockets.remove(&socket_id);

    // Give the operator time to reconnect before the session is dropped. A
    // later disconnect supersedes this timer.
    let grace = state.grace;
    let generation = state.disconnects;
    let cmd_tx = registry.sessions.get(&state.session_id).map(|h| h.cmd_tx.clone());
    tokio::spawn(async move {
        tokio::time::sleep(grace).await;
        if let Some(tx) = cmd_tx {
            let _ = tx.send(SessionCommand::OperatorDisconnectCheck { generation }).await;
        }
    });
}

fn handle_operator_reconnect(
    state: &mut SessionState,
    tx: &broadcast::Sender<SessionEvent>,
    registry: &Arc<Registry>,
    socket_id: String,
    client_id: String,
) {
    if client_id.is_empty() || state.operator_client_id != client_id {
        state.send_to(tx, &socket_id, ServerMsg::Reset {
            message: "Session not found".to_string(),
        });
        return;
    }

    if state.operator_connected {
        state.send_to(tx, &socket_id, ServerMsg::Reset {
            message: "Operator already connected".to_string(),
        });
        return;
    }

    let old_id = std::mem::replace(&mut state.operator_socket_id, socket_id.clone());
    state.operator_connected = true;

    registry.operator_sockets.remove(&old_id);
    registry
        .operator_sockets
        .insert(socket_id.clone(), state.session_id.clone());

    state.send_to(tx, &socket_id, ServerMsg::OperatorReconnected {
        session_id: state.session_id.clone(),
        board: state.board(),
    });

    tracing::info!("Operator reconnected to session {}", state.join_code);
}
