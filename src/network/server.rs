//! WebSocket Game Server
//!
//! Async WebSocket server for the guessing session.
//! Handles join tokens, the arrival lobby, guess routing, and the round
//! timer that opens rounds and closes their guess windows.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc, Mutex, RwLock};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, error, info, instrument, warn};

use crate::core::rng::{derive_session_seed, DeterministicRng};
use crate::game::config::{env_or, ConfigError, GameConfig};
use crate::game::state::PlayerId;
use crate::network::auth::{AuthConfig, AuthError, TokenValidator};
use crate::network::protocol::{
    ClientMessage, ErrorCode, JoinedInfo, ServerError, ServerMessage,
};
use crate::network::session::{GameSession, Lobby, PlayerSender, SessionError};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: SocketAddr,
    /// Maximum concurrent connections.
    pub max_connections: usize,
    /// Outbound queue length per connection.
    pub outbound_queue: usize,
    /// Connections silent for longer than this are dropped.
    pub idle_timeout: Duration,
    /// Server version string.
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            max_connections: 1000,
            outbound_queue: 64,
            idle_timeout: Duration::from_secs(300),
            version: crate::VERSION.to_string(),
        }
    }
}

impl ServerConfig {
    /// Create config from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            bind_addr: env_or("GUESS_BIND_ADDR", defaults.bind_addr)?,
            max_connections: env_or("GUESS_MAX_CONNECTIONS", defaults.max_connections)?,
            idle_timeout: Duration::from_secs(env_or("GUESS_IDLE_TIMEOUT_SECS", 300)?),
            ..defaults
        })
    }
}

/// Game server errors.
#[derive(Debug, thiserror::Error)]
pub enum GameServerError {
    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    BindFailed(#[from] std::io::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Token validation could not be set up.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Session error.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

/// Connected client state.
struct ConnectedClient {
    /// Player identifier (after join).
    player_id: Option<PlayerId>,
    /// Outbound channel of this connection.
    sender: PlayerSender,
    /// Last activity.
    last_activity: Instant,
}

/// State shared by every connection task.
struct ServerState {
    version: String,
    game: GameConfig,
    validator: TokenValidator,
    lobby: Mutex<Lobby>,
    /// Senders of players waiting in the lobby.
    pending: RwLock<BTreeMap<PlayerId, PlayerSender>>,
    session: RwLock<Option<Arc<GameSession>>>,
    clients: RwLock<BTreeMap<SocketAddr, ConnectedClient>>,
    shutdown_tx: broadcast::Sender<()>,
}

/// The game server.
pub struct GameServer {
    config: ServerConfig,
    state: Arc<ServerState>,
}

impl GameServer {
    /// Create a new game server.
    pub fn new(
        config: ServerConfig,
        game: GameConfig,
        auth: &AuthConfig,
    ) -> Result<Self, GameServerError> {
        game.validate()?;
        let validator = TokenValidator::new(auth)?;
        let (shutdown_tx, _) = broadcast::channel(1);

        let state = Arc::new(ServerState {
            version: config.version.clone(),
            lobby: Mutex::new(Lobby::new(game.expected_players)),
            game,
            validator,
            pending: RwLock::new(BTreeMap::new()),
            session: RwLock::new(None),
            clients: RwLock::new(BTreeMap::new()),
            shutdown_tx,
        });

        Ok(Self { config, state })
    }

    /// Handle for stopping the server.
    pub fn shutdown_handle(&self) -> broadcast::Sender<()> {
        self.state.shutdown_tx.clone()
    }

    /// Run the server until shutdown.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<(), GameServerError> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        info!(
            "Game server listening on {} (waiting for {} players)",
            self.config.bind_addr, self.state.game.expected_players
        );

        let mut shutdown_rx = self.state.shutdown_tx.subscribe();

        let state = self.state.clone();
        let idle_timeout = self.config.idle_timeout;
        tokio::spawn(async move {
            state.run_cleanup_loop(idle_timeout).await;
        });

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            let clients_count = self.state.clients.read().await.len();
                            if clients_count >= self.config.max_connections {
                                warn!("Connection limit reached, rejecting {}", addr);
                                tokio::spawn(reject_overloaded(stream, addr));
                                continue;
                            }

                            info!("New connection from {}", addr);
                            self.handle_connection(stream, addr);
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Signal every task to stop.
    pub fn shutdown(&self) {
        let _ = self.state.shutdown_tx.send(());
    }

    /// Active connection count.
    pub async fn connection_count(&self) -> usize {
        self.state.clients.read().await.len()
    }

    /// Handle a new WebSocket connection.
    fn handle_connection(&self, stream: TcpStream, addr: SocketAddr) {
        let state = self.state.clone();
        let queue = self.config.outbound_queue;
        let mut shutdown_rx = state.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let ws_stream = match accept_async(stream).await {
                Ok(ws) => ws,
                Err(e) => {
                    error!("WebSocket handshake failed for {}: {}", addr, e);
                    return;
                }
            };

            let (mut ws_sender, mut ws_receiver) = ws_stream.split();
            let (msg_tx, mut msg_rx) = mpsc::channel::<ServerMessage>(queue);

            state.clients.write().await.insert(addr, ConnectedClient {
                player_id: None,
                sender: msg_tx.clone(),
                last_activity: Instant::now(),
            });

            let sender_task = tokio::spawn(async move {
                while let Some(msg) = msg_rx.recv().await {
                    let text = match msg.to_json() {
                        Ok(t) => t,
                        Err(e) => {
                            error!("Failed to serialize message: {}", e);
                            continue;
                        }
                    };
                    if ws_sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
            });

            loop {
                tokio::select! {
                    msg = ws_receiver.next() => {
                        match msg {
                            Some(Ok(Message::Text(text))) => {
                                match ClientMessage::from_json(&text) {
                                    Ok(client_msg) => {
                                        state.handle_message(addr, client_msg, &msg_tx).await;
                                    }
                                    Err(e) => {
                                        debug!("Invalid message from {}: {}", addr, e);
                                        let _ = msg_tx.send(ServerMessage::error(
                                            ErrorCode::InvalidInput,
                                            "Invalid message format",
                                        )).await;
                                    }
                                }
                            }
                            Some(Ok(Message::Close(_))) | None => {
                                debug!("Client {} disconnected", addr);
                                break;
                            }
                            Some(Err(e)) => {
                                error!("WebSocket error for {}: {}", addr, e);
                                break;
                            }
                            _ => {}
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        let _ = msg_tx.send(ServerMessage::Shutdown {
                            reason: "Server shutting down".to_string(),
                        }).await;
                        break;
                    }
                }
            }

            // Let queued messages (including Shutdown) drain before closing.
            drop(msg_tx);
            let _ = tokio::time::timeout(Duration::from_secs(1), sender_task).await;

            state.disconnect(addr).await;
            info!("Client {} cleaned up", addr);
        });
    }
}

impl ServerState {
    /// Handle a client message.
    async fn handle_message(
        self: &Arc<Self>,
        addr: SocketAddr,
        msg: ClientMessage,
        sender: &PlayerSender,
    ) {
        let player_id = {
            let mut clients = self.clients.write().await;
            clients.get_mut(&addr).and_then(|c| {
                c.last_activity = Instant::now();
                c.player_id
            })
        };

        match msg {
            ClientMessage::Join { token } => {
                if player_id.is_some() {
                    let _ = sender.send(ServerMessage::error(
                        ErrorCode::AlreadyJoined,
                        "Connection already joined",
                    )).await;
                    return;
                }
                self.handle_join(addr, &token, sender).await;
            }
            ClientMessage::Submit { guess } => {
                let Some(player_id) = player_id else {
                    let _ = sender.send(ServerMessage::error(
                        ErrorCode::NotAuthenticated,
                        "Must join first",
                    )).await;
                    return;
                };
                self.handle_submit(player_id, guess, sender).await;
            }
            ClientMessage::Ping { timestamp } => {
                let _ = sender.send(ServerMessage::Pong {
                    timestamp,
                    server_time: unix_millis(),
                }).await;
            }
        }
    }

    /// Validate the token, then place the player in the lobby or, once the
    /// session is running, reattach a registered player.
    async fn handle_join(self: &Arc<Self>, addr: SocketAddr, token: &str, sender: &PlayerSender) {
        let claims = match self.validator.validate(token) {
            Ok(claims) => claims,
            Err(e) => {
                let code = match e {
                    AuthError::Expired => ErrorCode::TokenExpired,
                    AuthError::NotConfigured => ErrorCode::AuthFailed,
                    _ => ErrorCode::InvalidToken,
                };
                debug!("Join from {} rejected: {}", addr, e);
                let _ = sender.send(ServerMessage::error(code, e.to_string())).await;
                return;
            }
        };
        let identity = claims.identity();
        let player_id = identity.id;

        let mut lobby = self.lobby.lock().await;

        // Session already running: only registered players may come back.
        let running = self.session.read().await.clone();
        if let Some(session) = running {
            let name = session.registry().member(&player_id).map(|m| m.display_name.clone());
            let Some(name) = name else {
                let _ = sender.send(ServerMessage::error(ErrorCode::LobbyFull, "Session already started")).await;
                return;
            };
            // Older sockets of this player must not detach the new one.
            self.unbind_player(player_id).await;
            self.bind_client(addr, player_id).await;
            let _ = sender.send(self.joined(player_id, name)).await;
            if let Err(e) = session.rejoin(player_id, sender.clone()).await {
                error!("Rejoin of {} failed: {}", player_id, e);
            }
            return;
        }

        let status = match lobby.join(identity.clone()) {
            Ok(status) => status,
            Err(e) => {
                let code = match e {
                    SessionError::AlreadyJoined => ErrorCode::AlreadyJoined,
                    _ => ErrorCode::LobbyFull,
                };
                let _ = sender.send(ServerMessage::error(code, e.to_string())).await;
                return;
            }
        };

        self.bind_client(addr, player_id).await;
        let _ = sender.send(self.joined(player_id, identity.display_name)).await;

        let mut pending = self.pending.write().await;
        pending.insert(player_id, sender.clone());
        for tx in pending.values() {
            let _ = tx.try_send(ServerMessage::Lobby(status));
        }
        info!("Player {} joined lobby ({}/{})", player_id, status.players_joined, status.players_needed);

        if !lobby.is_full() {
            return;
        }

        match self.start_session(&mut lobby, &mut pending).await {
            Ok(session) => {
                *self.session.write().await = Some(session.clone());
                let state = self.clone();
                tokio::spawn(async move {
                    state.run_rounds(session).await;
                });
            }
            Err(e) => error!("Failed to start session: {}", e),
        }
    }

    /// Group the lobby and attach every waiting player.
    async fn start_session(
        &self,
        lobby: &mut Lobby,
        pending: &mut BTreeMap<PlayerId, PlayerSender>,
    ) -> Result<Arc<GameSession>, SessionError> {
        let seed = self.game.seed
            .unwrap_or_else(|| derive_session_seed(uuid::Uuid::new_v4().as_bytes()));
        let mut rng = DeterministicRng::new(seed);
        let registry = lobby.into_registry(self.game.group_size, &mut rng)?;

        let session = Arc::new(GameSession::seeded(self.game.clone(), seed, registry));
        for (player_id, sender) in std::mem::take(pending) {
            session.attach(player_id, sender).await?;
        }
        Ok(session)
    }

    /// Round timer: open each round, close its guess window, hold the
    /// results on screen, then move on.
    #[instrument(skip(self, session), fields(session = %session.id()))]
    async fn run_rounds(self: Arc<Self>, session: Arc<GameSession>) {
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        for round in 1..=self.game.num_rounds {
            if let Err(e) = session.start_round(round).await {
                error!("Round {} failed to start: {}", round, e);
                return;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.game.guess_window) => {}
                _ = shutdown_rx.recv() => return,
            }

            match session.timeout(round).await {
                Ok(closed) if closed > 0 => info!("Round {}: {} groups closed by timeout", round, closed),
                Ok(_) => debug!("Round {}: all groups closed before timeout", round),
                Err(e) => error!("Round {} timeout failed: {}", round, e),
            }
            if let Ok(repaired) = session.defensive_recompute(round).await {
                if repaired > 0 {
                    warn!("Round {}: {} groups repaired after close", round, repaired);
                }
            }

            if round < self.game.num_rounds {
                tokio::select! {
                    _ = tokio::time::sleep(self.game.result_window) => {}
                    _ = shutdown_rx.recv() => return,
                }
            }
        }

        match session.export().await {
            Ok(export) => {
                info!(
                    "Session {} complete: {} groups, digest {}",
                    export.session_id,
                    session.registry().group_count(),
                    export.digest
                );
                match export.to_json() {
                    Ok(json) => debug!("Session export:\n{}", json),
                    Err(e) => error!("Export encoding failed: {}", e),
                }
            }
            Err(e) => error!("Export failed: {}", e),
        }
    }

    async fn handle_submit(&self, player_id: PlayerId, guess: i64, sender: &PlayerSender) {
        let session = self.session.read().await.clone();
        let Some(session) = session else {
            let _ = sender.send(ServerMessage::error(ErrorCode::RoundNotOpen, "Game has not started")).await;
            return;
        };

        if let Err(e) = session.submit(player_id, guess).await {
            let _ = sender.send(submit_error(&e)).await;
        }
    }

    async fn unbind_player(&self, player_id: PlayerId) {
        for client in self.clients.write().await.values_mut() {
            if client.player_id == Some(player_id) {
                client.player_id = None;
            }
        }
    }

    async fn bind_client(&self, addr: SocketAddr, player_id: PlayerId) {
        if let Some(client) = self.clients.write().await.get_mut(&addr) {
            client.player_id = Some(player_id);
        }
    }

    fn joined(&self, player_id: PlayerId, name: String) -> ServerMessage {
        ServerMessage::Joined(JoinedInfo {
            player_id,
            name,
            server_version: self.version.clone(),
        })
    }

    /// Periodically drop connections that went quiet.
    async fn run_cleanup_loop(&self, idle_timeout: Duration) {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = shutdown_rx.recv() => return,
            }

            let now = Instant::now();
            let idle: Vec<SocketAddr> = {
                let clients = self.clients.read().await;
                clients.iter()
                    .filter(|(_, c)| now.duration_since(c.last_activity) > idle_timeout)
                    .map(|(addr, _)| *addr)
                    .collect()
            };

            for addr in idle {
                self.disconnect(addr).await;
                info!("Removed idle client {}", addr);
            }
        }
    }

    async fn disconnect(&self, addr: SocketAddr) {
        let Some(client) = self.clients.write().await.remove(&addr) else {
            return;
        };
        let Some(player_id) = client.player_id else {
            return;
        };

        let mut lobby = self.lobby.lock().await;
        if lobby.leave(&player_id) {
            self.pending.write().await.remove(&player_id);
            debug!("Player {} left the lobby", player_id);
        }
        drop(lobby);

        if let Some(session) = self.session.read().await.clone() {
            session.detach(&player_id, &client.sender).await;
        }
    }
}

/// Error reply for a failed submission.
fn submit_error(err: &SessionError) -> ServerMessage {
    match err {
        SessionError::Coordinator(e) => ServerMessage::Error(ServerError::from(e)),
        SessionError::UnknownPlayer(_) => ServerMessage::error(ErrorCode::NotInGroup, err.to_string()),
        _ => {
            error!("Submission failed: {}", err);
            ServerMessage::error(ErrorCode::InternalError, "Submission could not be processed")
        }
    }
}

/// Tell a client over the connection limit why it is being dropped.
async fn reject_overloaded(stream: TcpStream, addr: SocketAddr) {
    let Ok(mut ws) = accept_async(stream).await else {
        return;
    };
    let msg = ServerMessage::error(ErrorCode::ServerOverloaded, "Server is full, try again later");
    if let Ok(text) = msg.to_json() {
        let _ = ws.send(Message::Text(text)).await;
    }
    let _ = ws.close(None).await;
    debug!("Rejected {} at connection limit", addr);
}

fn unix_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
