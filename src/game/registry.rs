//! Group Registry
//!
//! Fixed assignment of players to equal-size groups. Built once before
//! round 1 and never changed afterwards; every round of a group uses the
//! same members, order, and display names.

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::info;

use crate::core::rng::DeterministicRng;
use crate::game::state::{GroupId, PlayerId};

/// Identity of a participant as handed over by the bootstrapper.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerIdentity {
    /// Stable player identifier.
    pub id: PlayerId,
    /// Name from the name-collection step (may be empty).
    pub display_name: String,
}

impl PlayerIdentity {
    /// Create a new identity.
    pub fn new(id: PlayerId, display_name: impl Into<String>) -> Self {
        Self { id, display_name: display_name.into() }
    }
}

/// A registered group member.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMember {
    /// Player identifier.
    pub player_id: PlayerId,
    /// 1-based position inside the group.
    pub id_in_group: u32,
    /// Display name, pinned for the whole session.
    pub display_name: String,
}

/// Registry errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Groups need at least two players.
    #[error("group size must be at least 2 (got {0})")]
    GroupSizeTooSmall(usize),

    /// No players at all.
    #[error("registry has no players")]
    Empty,

    /// A group does not have the configured size.
    #[error("group {group} has {actual} players, expected {expected}")]
    WrongGroupSize {
        /// Offending group.
        group: GroupId,
        /// Configured size.
        expected: usize,
        /// Actual size.
        actual: usize,
    },

    /// Players cannot be split evenly.
    #[error("{players} players cannot be split into groups of {group_size}")]
    UnevenSplit {
        /// Player count.
        players: usize,
        /// Configured size.
        group_size: usize,
    },

    /// Same player listed twice.
    #[error("player {0} is registered more than once")]
    DuplicatePlayer(PlayerId),
}

/// Fixed group memberships for a session.
#[derive(Clone, Debug)]
pub struct GroupRegistry {
    group_size: usize,
    groups: BTreeMap<GroupId, Vec<GroupMember>>,
    membership: BTreeMap<PlayerId, GroupId>,
}

impl GroupRegistry {
    /// Build from explicit memberships. Group ids are assigned 1, 2, ...
    /// in the order given; member order defines `id_in_group`.
    pub fn from_groups(
        group_size: usize,
        groups: Vec<Vec<PlayerIdentity>>,
    ) -> Result<Self, RegistryError> {
        if group_size < 2 {
            return Err(RegistryError::GroupSizeTooSmall(group_size));
        }
        if groups.is_empty() {
            return Err(RegistryError::Empty);
        }

        let mut registry = Self {
            group_size,
            groups: BTreeMap::new(),
            membership: BTreeMap::new(),
        };

        for (index, identities) in groups.into_iter().enumerate() {
            let group_id = index as GroupId + 1;
            if identities.len() != group_size {
                return Err(RegistryError::WrongGroupSize {
                    group: group_id,
                    expected: group_size,
                    actual: identities.len(),
                });
            }

            let mut members = Vec::with_capacity(group_size);
            for (position, identity) in identities.into_iter().enumerate() {
                if registry.membership.insert(identity.id, group_id).is_some() {
                    return Err(RegistryError::DuplicatePlayer(identity.id));
                }
                let id_in_group = position as u32 + 1;
                members.push(GroupMember {
                    player_id: identity.id,
                    id_in_group,
                    display_name: pinned_name(&identity.display_name, id_in_group),
                });
            }
            registry.groups.insert(group_id, members);
        }

        Ok(registry)
    }

    /// Shuffle players and split them into groups of `group_size`.
    pub fn assign_randomly(
        group_size: usize,
        mut players: Vec<PlayerIdentity>,
        rng: &mut DeterministicRng,
    ) -> Result<Self, RegistryError> {
        if group_size < 2 {
            return Err(RegistryError::GroupSizeTooSmall(group_size));
        }
        if players.is_empty() {
            return Err(RegistryError::Empty);
        }
        if players.len() % group_size != 0 {
            return Err(RegistryError::UnevenSplit {
                players: players.len(),
                group_size,
            });
        }

        rng.shuffle(&mut players);

        let mut groups = Vec::with_capacity(players.len() / group_size);
        let mut iter = players.into_iter().peekable();
        while iter.peek().is_some() {
            groups.push(iter.by_ref().take(group_size).collect());
        }

        let registry = Self::from_groups(group_size, groups)?;
        info!(
            "Assigned {} players to {} groups of {}",
            registry.player_count(),
            registry.group_count(),
            group_size
        );
        Ok(registry)
    }

    /// Configured group size.
    pub fn group_size(&self) -> usize {
        self.group_size
    }

    /// Number of groups.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Number of registered players.
    pub fn player_count(&self) -> usize {
        self.membership.len()
    }

    /// Group of a player.
    pub fn group_of(&self, player: &PlayerId) -> Option<GroupId> {
        self.membership.get(player).copied()
    }

    /// Members of a group in `id_in_group` order.
    pub fn members(&self, group: GroupId) -> Option<&[GroupMember]> {
        self.groups.get(&group).map(|m| m.as_slice())
    }

    /// Registry entry for a player.
    pub fn member(&self, player: &PlayerId) -> Option<&GroupMember> {
        let group = self.group_of(player)?;
        self.groups.get(&group)?.iter().find(|m| m.player_id == *player)
    }

    /// Iterate over groups in id order.
    pub fn groups(&self) -> impl Iterator<Item = (GroupId, &[GroupMember])> {
        self.groups.iter().map(|(id, members)| (*id, members.as_slice()))
    }

    /// Whether a player is registered.
    pub fn contains(&self, player: &PlayerId) -> bool {
        self.membership.contains_key(player)
    }
}

/// Display name to pin: the collected name, or "Player N" when blank.
fn pinned_name(name: &str, id_in_group: u32) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        format!("Player {}", id_in_group)
    } else {
        trimmed.to_string()
    }
}
