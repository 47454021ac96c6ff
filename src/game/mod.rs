//! Game Logic Module
//!
//! Round coordination, scoring and ranking. No I/O and no clock: the
//! network layer feeds submissions and timeouts in and ships the produced
//! payloads out.
//!
//! ## Module Structure
//!
//! - `config`: Game parameters, fixed before round 1
//! - `registry`: Fixed group memberships and pinned display names
//! - `state`: Player-round and group-round state
//! - `target`: Per-round target generation and lazy backfill
//! - `scoring`: Distance scoring and cumulative totals
//! - `ranking`: Dense ranks with registry-order tie-break
//! - `fallback`: Timeout policy for missing submissions
//! - `recompute`: Pure re-derivation of a round's derived fields
//! - `results`: Acknowledgement, round results and final standings
//! - `events`: Per-round audit events
//! - `coordinator`: Per-group round state machine

pub mod config;
pub mod registry;
pub mod state;
pub mod target;
pub mod scoring;
pub mod ranking;
pub mod fallback;
pub mod recompute;
pub mod results;
pub mod events;
pub mod coordinator;

// Re-export key types
pub use config::{GameConfig, ConfigError};
pub use registry::{GroupRegistry, GroupMember, PlayerIdentity, RegistryError};
pub use state::{GroupId, RoundNumber, PlayerId, Guess, Submission, RoundPhase, PlayerRound, GroupRound};
pub use target::{TargetGenerator, SeededTargets, FixedTargets};
pub use results::{SubmitAck, RoundResults, PlayerResult, FinalStandings, PlayerStanding};
pub use events::{RoundEvent, RoundEventKind};
pub use coordinator::{GroupCoordinator, CoordinatorError, SubmitOutcome, Completion};
