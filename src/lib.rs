//! # Guess Round Server
//!
//! Round coordination and scoring for a multi-round group number-guessing
//! game. Players are split into fixed groups; each round every player
//! guesses a hidden target in [0, 100] and is scored by distance.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    GUESS ROUND SERVER                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── rng.rs      - Seeded Xorshift128+ PRNG                  │
//! │  └── hash.rs     - Domain-separated SHA-256 digests          │
//! │                                                              │
//! │  game/           - Round logic (deterministic)               │
//! │  ├── registry.rs - Fixed groups and display names            │
//! │  ├── state.rs    - Player-round and group-round state        │
//! │  ├── scoring.rs  - Distance scores and totals                │
//! │  ├── ranking.rs  - Dense ranks, registry-order tie-break     │
//! │  ├── recompute.rs- Idempotent re-derivation of a round       │
//! │  └── coordinator.rs - Per-group round state machine          │
//! │                                                              │
//! │  network/        - Networking (non-deterministic)            │
//! │  ├── server.rs   - WebSocket server and round timer          │
//! │  ├── protocol.rs - Message types                             │
//! │  └── session.rs  - Lobby and per-group locking               │
//! │                                                              │
//! │  export/         - Digest-sealed results export              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! Given the same session seed, group assignments and guesses, `game/`
//! produces identical scores, ranks and totals:
//! - No floating-point arithmetic
//! - No HashMap (uses BTreeMap for sorted iteration)
//! - No system time dependencies
//! - Targets drawn from a per-(group, round) seeded PRNG

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod network;
pub mod export;

// Re-export commonly used types
pub use core::rng::DeterministicRng;
pub use game::config::GameConfig;
pub use game::coordinator::{GroupCoordinator, CoordinatorError};
pub use game::results::{SubmitAck, RoundResults, FinalStandings};
pub use game::state::{GroupRound, PlayerRound, PlayerId};
pub use export::SessionExport;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Smallest accepted guess and target
pub const GUESS_MIN: u8 = 0;

/// Largest accepted guess and target
pub const GUESS_MAX: u8 = 100;

/// Score given to a player who did not guess before the round closed
pub const FALLBACK_SCORE: u32 = 100;

/// Players per group unless configured otherwise
pub const DEFAULT_GROUP_SIZE: usize = 3;

/// Rounds per session unless configured otherwise
pub const DEFAULT_NUM_ROUNDS: u32 = 2;

/// Seconds players have to guess
pub const DEFAULT_GUESS_WINDOW_SECS: u64 = 10;

/// Seconds results stay up before the next round opens
pub const DEFAULT_RESULT_WINDOW_SECS: u64 = 10;
