//! Protocol Messages
//!
//! Wire format for client-server communication over WebSocket.
//! Client messages are tagged by `type`; server messages by `phase`, the
//! page the client should show next. All messages are JSON text frames.

use serde::{Serialize, Deserialize};

use crate::game::coordinator::CoordinatorError;
use crate::game::results::{FinalStandings, RoundResults, SubmitAck};
use crate::game::state::{GroupId, PlayerId, RoundNumber};

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Messages sent from client to server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Join the session with a bootstrapper token.
    Join {
        /// JWT carrying `sub` and optional `name`.
        token: String,
    },

    /// Guess for the current round. Range is checked server-side.
    Submit {
        /// Raw guess.
        guess: i64,
    },

    /// Ping for latency measurement.
    Ping {
        /// Client timestamp, echoed back.
        timestamp: u64,
    },
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Messages sent from server to client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Join accepted.
    Joined(JoinedInfo),

    /// Waiting for the lobby to fill.
    Lobby(LobbyStatus),

    /// A round opened for this player's group.
    RoundStarted(RoundStartInfo),

    /// Own guess accepted; waiting for the rest of the group.
    Waiting(SubmitAck),

    /// Round results for the group.
    Results(RoundResults),

    /// Final standings after the last round.
    Final(FinalStandings),

    /// Request rejected.
    Error(ServerError),

    /// Ping response.
    Pong {
        /// Echoed client timestamp.
        timestamp: u64,
        /// Server time (Unix millis).
        server_time: u64,
    },

    /// Server is going down.
    Shutdown {
        /// Reason.
        reason: String,
    },
}

/// Join acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinedInfo {
    /// Derived player id.
    pub player_id: PlayerId,
    /// Name from the token (may be blank until grouping pins it).
    pub name: String,
    /// Server version.
    pub server_version: String,
}

/// Lobby progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbyStatus {
    /// Players joined so far.
    pub players_joined: usize,
    /// Players needed to start.
    pub players_needed: usize,
}

/// Round start notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundStartInfo {
    /// Player's group.
    pub group_id: GroupId,
    /// Player's position in the group.
    pub id_in_group: u32,
    /// Pinned display name.
    pub name: String,
    /// Round now open.
    pub round_number: RoundNumber,
    /// Configured round count.
    pub total_rounds: u32,
    /// Seconds to submit.
    pub guess_window_secs: u64,
    /// Smallest accepted guess.
    pub min_guess: u8,
    /// Largest accepted guess.
    pub max_guess: u8,
}

/// Server error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerError {
    /// Error code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
}

impl ServerError {
    /// Create a new error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<&CoordinatorError> for ServerError {
    fn from(err: &CoordinatorError) -> Self {
        let code = match err {
            CoordinatorError::InvalidGuess(_) => ErrorCode::InvalidGuess,
            CoordinatorError::LateSubmission(_) => ErrorCode::LateSubmission,
            CoordinatorError::AlreadySubmitted { .. } => ErrorCode::AlreadySubmitted,
            CoordinatorError::PlayerNotInGroup { .. } => ErrorCode::NotInGroup,
            CoordinatorError::RoundNotStarted
            | CoordinatorError::RoundOutOfOrder { .. }
            | CoordinatorError::RoundOutOfRange { .. }
            | CoordinatorError::UnknownRound(_) => ErrorCode::RoundNotOpen,
        };
        Self::new(code, err.to_string())
    }
}

/// Error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Authentication failed.
    AuthFailed,
    /// Message requires a joined player.
    NotAuthenticated,
    /// JWT token has expired.
    TokenExpired,
    /// Invalid JWT token (signature, format, claims).
    InvalidToken,
    /// Malformed message.
    InvalidInput,
    /// Guess out of range; re-prompt.
    InvalidGuess,
    /// Round closed before the guess arrived.
    LateSubmission,
    /// Guess already recorded for this round.
    AlreadySubmitted,
    /// Player has no group in this session.
    NotInGroup,
    /// No round is accepting guesses.
    RoundNotOpen,
    /// Connection already joined.
    AlreadyJoined,
    /// Lobby already has every expected player.
    LobbyFull,
    /// Server overloaded.
    ServerOverloaded,
    /// Internal error.
    InternalError,
}

// =============================================================================
// SERIALIZATION HELPERS
// =============================================================================

impl ClientMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Error message shortcut.
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        ServerMessage::Error(ServerError::new(code, message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::results::PlayerResult;
    use crate::game::state::GuessOutOfRange;

    #[test]
    fn test_client_message_json() {
        let msg = ClientMessage::from_json(r#"{"type":"submit","guess":42}"#).unwrap();
        assert_eq!(msg, ClientMessage::Submit { guess: 42 });

        // Out-of-range values still parse; the coordinator rejects them.
        let msg = ClientMessage::from_json(r#"{"type":"submit","guess":-5}"#).unwrap();
        assert_eq!(msg, ClientMessage::Submit { guess: -5 });

        let join = ClientMessage::Join { token: "abc".into() };
        assert_eq!(ClientMessage::from_json(&join.to_json().unwrap()).unwrap(), join);

        assert!(ClientMessage::from_json(r#"{"type":"submit","guess":"ten"}"#).is_err());
    }

    #[test]
    fn test_waiting_payload_shape() {
        let msg = ServerMessage::Waiting(SubmitAck {
            player_id: PlayerId::new([1; 16]),
            guess: 40,
            score: 2,
        });

        let json: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        assert_eq!(json["phase"], "waiting");
        assert_eq!(json["guess"], 40);
        assert_eq!(json["score"], 2);
    }

    #[test]
    fn test_results_payload_shape() {
        let msg = ServerMessage::Results(RoundResults {
            group_id: 1,
            round_number: 1,
            total_rounds: 2,
            target_number: 42,
            players: vec![PlayerResult {
                id: 3,
                player_id: PlayerId::new([3; 16]),
                name: "Player 3".into(),
                guess: None,
                score: 100,
                rank: 1,
                is_fallback: true,
                total_score: 100,
            }],
        });

        let text = msg.to_json().unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["phase"], "results");
        assert_eq!(json["target_number"], 42);
        assert_eq!(json["players"][0]["guess"], serde_json::Value::Null);
        assert_eq!(json["players"][0]["is_fallback"], true);

        assert_eq!(ServerMessage::from_json(&text).unwrap(), msg);
    }

    #[test]
    fn test_coordinator_error_mapping() {
        let err = ServerError::from(&CoordinatorError::InvalidGuess(GuessOutOfRange(101)));
        assert_eq!(err.code, ErrorCode::InvalidGuess);
        assert!(err.message.contains("between 0 and 100"));

        let err = ServerError::from(&CoordinatorError::LateSubmission(2));
        assert_eq!(err.code, ErrorCode::LateSubmission);

        let json = ServerMessage::Error(err).to_json().unwrap();
        assert!(json.contains("late_submission"));
    }

    #[test]
    fn test_pong_and_shutdown() {
        let json = ServerMessage::Pong { timestamp: 5, server_time: 9 }.to_json().unwrap();
        assert!(json.contains(r#""phase":"pong""#));

        let msg = ServerMessage::Shutdown { reason: "bye".into() };
        assert_eq!(ServerMessage::from_json(&msg.to_json().unwrap()).unwrap(), msg);
    }
}
