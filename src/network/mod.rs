//! Network Layer
//!
//! WebSocket transport for the guessing session.
//! Scoring and ranking stay in `game/`; this layer only routes player
//! events to group coordinators and delivers what they produce.

pub mod auth;
pub mod protocol;
pub mod session;
pub mod server;

pub use auth::{AuthConfig, TokenClaims, TokenValidator, AuthError};
pub use protocol::{
    ClientMessage, ServerMessage, ServerError, ErrorCode,
    JoinedInfo, LobbyStatus, RoundStartInfo,
};
pub use session::{GameSession, Lobby, PlayerSender, SessionError};
pub use server::{GameServer, ServerConfig, GameServerError};
