//! Target Generation
//!
//! One uniformly random target in [0, 100] per group per round.

use std::collections::BTreeMap;
use tracing::warn;

use crate::core::rng::DeterministicRng;
use crate::game::state::{GroupId, GroupRound, RoundNumber};
use crate::{GUESS_MIN, GUESS_MAX};

/// Source of round targets.
///
/// Implementations must return the same value for the same (group, round):
/// the lazy backfill relies on it.
pub trait TargetGenerator: Send + Sync {
    /// Target for `group` in `round`, within `GUESS_MIN..=GUESS_MAX`.
    fn generate(&self, group: GroupId, round: RoundNumber) -> u8;
}

/// Targets drawn from a session seed.
#[derive(Debug, Clone, Copy)]
pub struct SeededTargets {
    seed: u64,
}

impl SeededTargets {
    /// Create a generator for a session seed.
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Session seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl TargetGenerator for SeededTargets {
    fn generate(&self, group: GroupId, round: RoundNumber) -> u8 {
        let mut rng = DeterministicRng::for_round(self.seed, group, round);
        rng.next_int_range(GUESS_MIN as i32, GUESS_MAX as i32) as u8
    }
}

/// Scripted targets, for tests and demos.
#[derive(Debug, Clone, Default)]
pub struct FixedTargets {
    targets: BTreeMap<(GroupId, RoundNumber), u8>,
    default: u8,
}

impl FixedTargets {
    /// Every round gets `default` unless overridden.
    pub fn new(default: u8) -> Self {
        Self {
            targets: BTreeMap::new(),
            default: default.min(GUESS_MAX),
        }
    }

    /// Override the target for one (group, round).
    pub fn with(mut self, group: GroupId, round: RoundNumber, target: u8) -> Self {
        self.targets.insert((group, round), target.min(GUESS_MAX));
        self
    }
}

impl TargetGenerator for FixedTargets {
    fn generate(&self, group: GroupId, round: RoundNumber) -> u8 {
        self.targets.get(&(group, round)).copied().unwrap_or(self.default)
    }
}

/// Return the round's target, generating and storing it if missing.
///
/// A missing target at scoring time is an anomaly: it is logged and flagged
/// on the round, then scoring proceeds normally.
pub fn ensure_target(round: &mut GroupRound, generator: &dyn TargetGenerator) -> u8 {
    if let Some(target) = round.target {
        return target;
    }

    let target = generator.generate(round.group_id, round.round);
    warn!(
        "Group {} round {}: target missing at scoring time, generated {}",
        round.group_id, round.round, target
    );
    round.target = Some(target);
    round.target_backfilled = true;
    target
}
