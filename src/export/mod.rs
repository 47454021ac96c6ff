//! Session Export
//!
//! Snapshot of every closed round for the persistence collaborator.
//! Rows are flat so they encode the same in JSON and bincode; a SHA-256
//! digest over the rows lets the receiver check nothing was altered.
//!
//! ## Module Structure
//!
//! - `records`: Per-round and per-total export rows

pub mod records;

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::hash::DigestHasher;
use crate::game::coordinator::GroupCoordinator;
use crate::game::events::RoundEvent;

pub use records::{PlayerRoundRecord, PlayerTotalRecord};

/// Current export format version.
pub const EXPORT_VERSION: u8 = 1;

/// Export errors.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Encoding failed.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Decoding failed.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// Unknown format version.
    #[error("version mismatch: expected {expected}, got {got}")]
    VersionMismatch {
        /// Supported version
        expected: u8,
        /// Found version
        got: u8,
    },

    /// Rows do not match the sealed digest.
    #[error("digest mismatch: expected {expected}, computed {computed}")]
    DigestMismatch {
        /// Stored digest (hex)
        expected: String,
        /// Recomputed digest (hex)
        computed: String,
    },
}

/// Full export of a session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionExport {
    /// Format version
    pub version: u8,

    /// Session identifier (UUID)
    pub session_id: String,

    /// When the export was taken
    pub exported_at: DateTime<Utc>,

    /// Players per group
    pub group_size: u32,

    /// Configured round count
    pub num_rounds: u32,

    /// Session seed for targets and grouping
    pub seed: u64,

    /// One row per (group, round, player)
    pub rounds: Vec<PlayerRoundRecord>,

    /// One row per player
    pub totals: Vec<PlayerTotalRecord>,

    /// Audit events, in order
    pub events: Vec<RoundEvent>,

    /// Hex SHA-256 over `rounds` and `totals`
    pub digest: String,
}

impl SessionExport {
    /// Start an empty export.
    pub fn new(session_id: uuid::Uuid, group_size: u32, num_rounds: u32, seed: u64) -> Self {
        Self {
            version: EXPORT_VERSION,
            session_id: session_id.to_string(),
            exported_at: Utc::now(),
            group_size,
            num_rounds,
            seed,
            rounds: Vec::new(),
            totals: Vec::new(),
            events: Vec::new(),
            digest: String::new(),
        }
    }

    /// Add every started round and the totals of one group.
    pub fn record_group(&mut self, coordinator: &GroupCoordinator) {
        for round in coordinator.rounds() {
            self.rounds.extend(PlayerRoundRecord::from_round(round));
        }
        self.totals.extend(PlayerTotalRecord::from_coordinator(coordinator));
    }

    /// Append audit events.
    pub fn record_events(&mut self, events: impl IntoIterator<Item = RoundEvent>) {
        self.events.extend(events);
    }

    /// Seal the export with a digest over its rows.
    pub fn finalize(&mut self) {
        self.digest = self.compute_digest();
    }

    /// Check the rows against the sealed digest.
    pub fn verify(&self) -> Result<(), ExportError> {
        if self.version != EXPORT_VERSION {
            return Err(ExportError::VersionMismatch {
                expected: EXPORT_VERSION,
                got: self.version,
            });
        }

        let computed = self.compute_digest();
        if computed != self.digest {
            return Err(ExportError::DigestMismatch {
                expected: self.digest.clone(),
                computed,
            });
        }
        Ok(())
    }

    /// Number of closed rounds recorded with a complete ranking.
    pub fn closed_round_count(&self) -> usize {
        let mut keys: Vec<(u32, u32)> = self.rounds.iter()
            .filter(|r| r.rank.is_some())
            .map(|r| (r.group_id, r.round))
            .collect();
        keys.dedup();
        keys.len()
    }

    /// Pretty JSON encoding.
    pub fn to_json(&self) -> Result<String, ExportError> {
        serde_json::to_string_pretty(self).map_err(|e| ExportError::Serialization(e.to_string()))
    }

    /// Decode from JSON.
    pub fn from_json(json: &str) -> Result<Self, ExportError> {
        serde_json::from_str(json).map_err(|e| ExportError::Deserialization(e.to_string()))
    }

    /// Compact bincode encoding.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ExportError> {
        bincode::serialize(self).map_err(|e| ExportError::Serialization(e.to_string()))
    }

    /// Decode from bincode.
    pub fn from_bytes(data: &[u8]) -> Result<Self, ExportError> {
        bincode::deserialize(data).map_err(|e| ExportError::Deserialization(e.to_string()))
    }

    fn compute_digest(&self) -> String {
        let mut hasher = DigestHasher::for_export();
        hasher.update_str(&self.session_id);
        hasher.update_u32(self.group_size);
        hasher.update_u32(self.num_rounds);
        hasher.update_bytes(&self.seed.to_le_bytes());

        hasher.update_u32(self.rounds.len() as u32);
        for row in &self.rounds {
            row.digest_into(&mut hasher);
        }
        hasher.update_u32(self.totals.len() as u32);
        for row in &self.totals {
            row.digest_into(&mut hasher);
        }

        hex::encode(hasher.finalize())
    }
}
