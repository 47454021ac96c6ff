//! Game Session Management
//!
//! Binds the per-group coordinators to connected players. Each group's
//! coordinator sits behind its own async mutex; every inbound event for a
//! group runs to completion inside that lock, and the messages it produces
//! are queued to players before the lock is released, so each player sees
//! a group's messages in production order.

use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::core::rng::DeterministicRng;
use crate::export::{ExportError, SessionExport};
use crate::game::config::GameConfig;
use crate::game::coordinator::{Completion, CoordinatorError, GroupCoordinator};
use crate::game::events::RoundEvent;
use crate::game::registry::{GroupMember, GroupRegistry, PlayerIdentity, RegistryError};
use crate::game::results::{FinalStandings, RoundResults, SubmitAck};
use crate::game::state::{GroupId, PlayerId, RoundNumber, RoundPhase};
use crate::game::target::{SeededTargets, TargetGenerator};
use crate::network::protocol::{LobbyStatus, RoundStartInfo, ServerMessage};
use crate::{GUESS_MAX, GUESS_MIN};

/// Outbound channel to one player.
pub type PlayerSender = mpsc::Sender<ServerMessage>;

/// Session errors.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Lobby already has every expected player.
    #[error("Lobby is full")]
    LobbyFull,

    /// Player joined twice.
    #[error("Player already joined")]
    AlreadyJoined,

    /// Player has no group in this session.
    #[error("Player {0} is not registered")]
    UnknownPlayer(PlayerId),

    /// Group id does not exist.
    #[error("Group {0} does not exist")]
    UnknownGroup(GroupId),

    /// Coordinator rejected the operation.
    #[error(transparent)]
    Coordinator(#[from] CoordinatorError),

    /// Grouping failed.
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Export failed.
    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}

// =============================================================================
// LOBBY
// =============================================================================

/// Arrival lobby. Collects identities until the configured player count
/// is reached, then hands them to the registry.
#[derive(Debug)]
pub struct Lobby {
    expected: usize,
    arrivals: Vec<PlayerIdentity>,
}

impl Lobby {
    /// Lobby waiting for `expected` players.
    pub fn new(expected: usize) -> Self {
        Self {
            expected,
            arrivals: Vec::with_capacity(expected),
        }
    }

    /// Add an arrival.
    pub fn join(&mut self, identity: PlayerIdentity) -> Result<LobbyStatus, SessionError> {
        if self.contains(&identity.id) {
            return Err(SessionError::AlreadyJoined);
        }
        if self.is_full() {
            return Err(SessionError::LobbyFull);
        }
        self.arrivals.push(identity);
        Ok(self.status())
    }

    /// Remove a player who left before grouping.
    pub fn leave(&mut self, player: &PlayerId) -> bool {
        let before = self.arrivals.len();
        self.arrivals.retain(|p| p.id != *player);
        self.arrivals.len() != before
    }

    /// Whether the player is waiting here.
    pub fn contains(&self, player: &PlayerId) -> bool {
        self.arrivals.iter().any(|p| p.id == *player)
    }

    /// Whether grouping can start.
    pub fn is_full(&self) -> bool {
        self.arrivals.len() >= self.expected
    }

    /// Progress for clients.
    pub fn status(&self) -> LobbyStatus {
        LobbyStatus {
            players_joined: self.arrivals.len(),
            players_needed: self.expected,
        }
    }

    /// Randomly group the arrivals. Empties the lobby.
    pub fn into_registry(
        &mut self,
        group_size: usize,
        rng: &mut DeterministicRng,
    ) -> Result<GroupRegistry, SessionError> {
        let players = std::mem::take(&mut self.arrivals);
        Ok(GroupRegistry::assign_randomly(group_size, players, rng)?)
    }
}

// =============================================================================
// GAME SESSION
// =============================================================================

/// A running session: fixed groups, one coordinator per group.
pub struct GameSession {
    id: uuid::Uuid,
    config: GameConfig,
    seed: u64,
    registry: GroupRegistry,
    groups: BTreeMap<GroupId, Arc<Mutex<GroupCoordinator>>>,
    senders: RwLock<BTreeMap<PlayerId, PlayerSender>>,
    audit: Mutex<Vec<RoundEvent>>,
}

impl GameSession {
    /// Create a session over a fixed registry.
    pub fn new(
        config: GameConfig,
        seed: u64,
        registry: GroupRegistry,
        targets: Arc<dyn TargetGenerator>,
    ) -> Self {
        let groups = registry.groups()
            .map(|(group_id, members)| {
                let coordinator = GroupCoordinator::new(
                    group_id,
                    members.to_vec(),
                    config.num_rounds,
                    targets.clone(),
                );
                (group_id, Arc::new(Mutex::new(coordinator)))
            })
            .collect();

        let id = uuid::Uuid::new_v4();
        info!(
            "Session {} created: {} groups of {}, {} rounds, seed {}",
            id, registry.group_count(), registry.group_size(), config.num_rounds, seed
        );

        Self {
            id,
            config,
            seed,
            registry,
            groups,
            senders: RwLock::new(BTreeMap::new()),
            audit: Mutex::new(Vec::new()),
        }
    }

    /// Create a session whose targets derive from `seed`.
    pub fn seeded(config: GameConfig, seed: u64, registry: GroupRegistry) -> Self {
        Self::new(config, seed, registry, Arc::new(SeededTargets::new(seed)))
    }

    /// Session id.
    pub fn id(&self) -> uuid::Uuid {
        self.id
    }

    /// Session seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Game configuration.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Group memberships.
    pub fn registry(&self) -> &GroupRegistry {
        &self.registry
    }

    /// Register the outbound channel of a player.
    pub async fn attach(&self, player: PlayerId, sender: PlayerSender) -> Result<(), SessionError> {
        if !self.registry.contains(&player) {
            return Err(SessionError::UnknownPlayer(player));
        }
        self.senders.write().await.insert(player, sender);
        Ok(())
    }

    /// Reattach a returning player and replay where their group stands:
    /// the open round (and their own ack if they already guessed), or the
    /// latest results once it has closed.
    pub async fn rejoin(&self, player: PlayerId, sender: PlayerSender) -> Result<(), SessionError> {
        let group_id = self.registry.group_of(&player)
            .ok_or(SessionError::UnknownPlayer(player))?;
        let mut coord = self.group(group_id)?.lock().await;

        let mut senders = self.senders.write().await;
        senders.insert(player, sender);

        let current = coord.current_round();
        let open = coord.round(current).map(|r| r.phase == RoundPhase::Open);
        match open {
            None => {}
            Some(true) => {
                if let Some(member) = coord.members().iter().find(|m| m.player_id == player) {
                    deliver(&senders, &player, self.round_started(group_id, member, current));
                }
                let submitted = coord.round(current)
                    .and_then(|r| r.player(&player))
                    .and_then(|p| p.guess().zip(p.score));
                if let Some((guess, score)) = submitted {
                    let ack = SubmitAck { player_id: player, guess: guess.value(), score };
                    deliver(&senders, &player, ServerMessage::Waiting(ack));
                }
            }
            Some(false) => {
                if let Some(results) = coord.results(current)? {
                    deliver(&senders, &player, ServerMessage::Results(results));
                }
                if let Some(standings) = coord.final_standings() {
                    deliver(&senders, &player, ServerMessage::Final(standings));
                }
            }
        }
        drop(senders);

        self.record(coord.take_events()).await;
        info!("Player {} rejoined session {} at round {}", player, self.id, current);
        Ok(())
    }

    /// Drop a player's channel if it is still `sender`. The player stays in
    /// the group and is handled by the timeout fallback from now on.
    pub async fn detach(&self, player: &PlayerId, sender: &PlayerSender) {
        let mut senders = self.senders.write().await;
        if senders.get(player).is_some_and(|s| s.same_channel(sender)) {
            senders.remove(player);
            debug!("Player {} detached from session {}", player, self.id);
        }
    }

    fn round_started(&self, group_id: GroupId, member: &GroupMember, round: RoundNumber) -> ServerMessage {
        ServerMessage::RoundStarted(RoundStartInfo {
            group_id,
            id_in_group: member.id_in_group,
            name: member.display_name.clone(),
            round_number: round,
            total_rounds: self.config.num_rounds,
            guess_window_secs: self.config.guess_window.as_secs(),
            min_guess: GUESS_MIN,
            max_guess: GUESS_MAX,
        })
    }

    fn group(&self, group: GroupId) -> Result<&Arc<Mutex<GroupCoordinator>>, SessionError> {
        self.groups.get(&group).ok_or(SessionError::UnknownGroup(group))
    }

    // =========================================================================
    // INBOUND EVENTS
    // =========================================================================

    /// Open `round` in every group.
    pub async fn start_round(&self, round: RoundNumber) -> Result<(), SessionError> {
        for (group_id, coordinator) in &self.groups {
            let mut coord = coordinator.lock().await;
            coord.start_round(round)?;

            let senders = self.senders.read().await;
            for member in coord.members() {
                deliver(&senders, &member.player_id, self.round_started(*group_id, member, round));
            }
            drop(senders);

            self.record(coord.take_events()).await;
        }
        Ok(())
    }

    /// Route a guess to the player's group.
    ///
    /// On success the submitter has been sent `Waiting`, and the whole
    /// group the results if this guess closed the round.
    pub async fn submit(&self, player: PlayerId, raw_guess: i64) -> Result<SubmitAck, SessionError> {
        let group_id = self.registry.group_of(&player)
            .ok_or(SessionError::UnknownPlayer(player))?;
        let mut coord = self.group(group_id)?.lock().await;

        let result = coord.submit(player, raw_guess);
        let events = coord.take_events();

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                self.record(events).await;
                return Err(e.into());
            }
        };

        let senders = self.senders.read().await;
        deliver(&senders, &player, ServerMessage::Waiting(outcome.ack.clone()));
        if let Some(completion) = &outcome.completion {
            deliver_completion(&senders, &coord, completion);
        }
        drop(senders);

        self.record(events).await;
        Ok(outcome.ack)
    }

    /// Close the guess window of `round` in every group.
    ///
    /// Returns how many groups this timeout completed.
    pub async fn timeout(&self, round: RoundNumber) -> Result<usize, SessionError> {
        let mut completed = 0;

        for coordinator in self.groups.values() {
            let mut coord = coordinator.lock().await;
            let completion = coord.timeout(round)?;

            if let Some(completion) = &completion {
                let senders = self.senders.read().await;
                deliver_completion(&senders, &coord, completion);
                completed += 1;
            }
            self.record(coord.take_events()).await;
        }

        Ok(completed)
    }

    /// Re-derive `round` (and later closed rounds) in every group.
    ///
    /// Returns how many groups needed a repair.
    pub async fn defensive_recompute(&self, round: RoundNumber) -> Result<usize, SessionError> {
        let mut repaired = 0;
        for coordinator in self.groups.values() {
            let mut coord = coordinator.lock().await;
            if coord.defensive_recompute(round)? {
                repaired += 1;
            }
            self.record(coord.take_events()).await;
        }
        Ok(repaired)
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Results of a group's round, re-derived before reading.
    pub async fn results(
        &self,
        group: GroupId,
        round: RoundNumber,
    ) -> Result<Option<RoundResults>, SessionError> {
        let mut coord = self.group(group)?.lock().await;
        let results = coord.results(round)?;
        self.record(coord.take_events()).await;
        Ok(results)
    }

    /// Final standings of a group.
    pub async fn final_standings(&self, group: GroupId) -> Result<Option<FinalStandings>, SessionError> {
        let mut coord = self.group(group)?.lock().await;
        let standings = coord.final_standings();
        self.record(coord.take_events()).await;
        Ok(standings)
    }

    /// Whether every group has closed its last round.
    pub async fn is_finished(&self) -> bool {
        for coordinator in self.groups.values() {
            if !coordinator.lock().await.is_finished() {
                return false;
            }
        }
        true
    }

    /// Audit events so far.
    pub async fn audit_log(&self) -> Vec<RoundEvent> {
        self.audit.lock().await.clone()
    }

    /// Sealed export of every group's rounds and totals.
    pub async fn export(&self) -> Result<SessionExport, SessionError> {
        let mut export = SessionExport::new(
            self.id,
            self.registry.group_size() as u32,
            self.config.num_rounds,
            self.seed,
        );

        for coordinator in self.groups.values() {
            let mut coord = coordinator.lock().await;
            self.record(coord.take_events()).await;
            export.record_group(&coord);
        }
        export.record_events(self.audit_log().await);
        export.finalize();

        let anomalies = export.events.iter().filter(|e| e.is_anomaly()).count();
        info!(
            "Session {} exported: {} round rows, {} recovered anomalies, digest {}",
            self.id, export.rounds.len(), anomalies, &export.digest[..16]
        );
        Ok(export)
    }

    async fn record(&self, events: Vec<RoundEvent>) {
        if events.is_empty() {
            return;
        }
        self.audit.lock().await.extend(events);
    }
}

/// Queue a message without waiting. A full or closed channel drops the
/// message for that player only.
fn deliver(senders: &BTreeMap<PlayerId, PlayerSender>, player: &PlayerId, msg: ServerMessage) {
    let Some(sender) = senders.get(player) else {
        return;
    };
    match sender.try_send(msg) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(_)) => {
            warn!("Outbound queue full for {}, message dropped", player);
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            debug!("Player {} channel closed", player);
        }
    }
}

fn deliver_completion(
    senders: &BTreeMap<PlayerId, PlayerSender>,
    coord: &GroupCoordinator,
    completion: &Completion,
) {
    for member in coord.members() {
        deliver(senders, &member.player_id, ServerMessage::Results(completion.results.clone()));
        if let Some(standings) = &completion.final_standings {
            deliver(senders, &member.player_id, ServerMessage::Final(standings.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::target::FixedTargets;
    use crate::network::protocol::ErrorCode;

    fn pid(i: u8) -> PlayerId {
        PlayerId::new([i; 16])
    }

    fn session(groups: u8, num_rounds: u32, targets: FixedTargets) -> GameSession {
        let memberships = (0..groups)
            .map(|g| {
                (1..=3u8)
                    .map(|i| PlayerIdentity::new(pid(g * 3 + i), format!("P{}", g * 3 + i)))
                    .collect()
            })
            .collect();
        let registry = GroupRegistry::from_groups(3, memberships).unwrap();
        let config = GameConfig {
            num_rounds,
            expected_players: groups as usize * 3,
            ..GameConfig::default()
        };
        GameSession::new(config, 1, registry, Arc::new(targets))
    }

    async fn attach_all(session: &GameSession, n: u8) -> Vec<mpsc::Receiver<ServerMessage>> {
        let mut receivers = Vec::new();
        for i in 1..=n {
            let (tx, rx) = mpsc::channel(32);
            session.attach(pid(i), tx).await.unwrap();
            receivers.push(rx);
        }
        receivers
    }

    fn drain(rx: &mut mpsc::Receiver<ServerMessage>) -> Vec<ServerMessage> {
        let mut out = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            out.push(msg);
        }
        out
    }

    #[test]
    fn test_lobby() {
        let mut lobby = Lobby::new(2);
        assert_eq!(lobby.join(PlayerIdentity::new(pid(1), "A")).unwrap().players_joined, 1);
        assert!(matches!(lobby.join(PlayerIdentity::new(pid(1), "A")), Err(SessionError::AlreadyJoined)));
        assert!(lobby.leave(&pid(1)));
        lobby.join(PlayerIdentity::new(pid(1), "A")).unwrap();
        lobby.join(PlayerIdentity::new(pid(2), "")).unwrap();
        assert!(lobby.is_full());
        assert!(matches!(lobby.join(PlayerIdentity::new(pid(3), "C")), Err(SessionError::LobbyFull)));

        let registry = lobby.into_registry(2, &mut DeterministicRng::new(3)).unwrap();
        assert_eq!(registry.group_count(), 1);
        assert!(registry.member(&pid(2)).unwrap().display_name.starts_with("Player "));
        assert_eq!(lobby.status().players_joined, 0);
    }

    #[tokio::test]
    async fn test_attach_unknown_player() {
        let s = session(1, 1, FixedTargets::new(5));
        let (tx, _rx) = mpsc::channel(1);
        assert!(matches!(s.attach(pid(9), tx).await, Err(SessionError::UnknownPlayer(_))));
    }

    #[tokio::test]
    async fn test_detach_keeps_newer_channel() {
        let s = session(1, 1, FixedTargets::new(42));
        let (old_tx, _old_rx) = mpsc::channel(8);
        let (new_tx, mut new_rx) = mpsc::channel(8);

        s.attach(pid(1), old_tx.clone()).await.unwrap();
        s.rejoin(pid(1), new_tx.clone()).await.unwrap();
        s.detach(&pid(1), &old_tx).await;

        s.start_round(1).await.unwrap();
        assert!(matches!(drain(&mut new_rx).as_slice(), [ServerMessage::RoundStarted(_)]));

        s.detach(&pid(1), &new_tx).await;
        s.submit(pid(1), 40).await.unwrap();
        assert!(drain(&mut new_rx).is_empty());
    }

    #[tokio::test]
    async fn test_rejoin_replays_round_state() {
        let s = session(1, 2, FixedTargets::new(42));
        let _rx = attach_all(&s, 3).await;

        // Before round 1 there is nothing to replay.
        let (tx, mut rx) = mpsc::channel(8);
        s.rejoin(pid(1), tx).await.unwrap();
        assert!(drain(&mut rx).is_empty());

        s.start_round(1).await.unwrap();
        s.submit(pid(1), 40).await.unwrap();

        let (tx, mut rx) = mpsc::channel(8);
        s.rejoin(pid(1), tx).await.unwrap();
        let msgs = drain(&mut rx);
        assert!(matches!(&msgs[0], ServerMessage::RoundStarted(info) if info.round_number == 1));
        assert!(matches!(&msgs[1], ServerMessage::Waiting(a) if a.guess == 40 && a.score == 2));

        s.timeout(1).await.unwrap();
        let (tx, mut rx) = mpsc::channel(8);
        s.rejoin(pid(2), tx).await.unwrap();
        assert!(matches!(
            drain(&mut rx).as_slice(),
            [ServerMessage::Results(r)] if r.round_number == 1 && r.players[0].player_id == pid(1)
        ));

        s.start_round(2).await.unwrap();
        s.timeout(2).await.unwrap();
        let (tx, mut rx) = mpsc::channel(8);
        s.rejoin(pid(3), tx).await.unwrap();
        let msgs = drain(&mut rx);
        assert!(matches!(&msgs[0], ServerMessage::Results(r) if r.round_number == 2));
        assert!(matches!(&msgs[1], ServerMessage::Final(_)));

        assert!(matches!(s.rejoin(pid(9), mpsc::channel(1).0).await, Err(SessionError::UnknownPlayer(_))));
    }

    #[tokio::test]
    async fn test_message_flow_for_one_round() {
        let s = session(1, 1, FixedTargets::new(42));
        let mut rx = attach_all(&s, 3).await;

        s.start_round(1).await.unwrap();
        for r in rx.iter_mut() {
            assert!(matches!(drain(r).as_slice(), [ServerMessage::RoundStarted(info)] if info.round_number == 1));
        }

        let ack = s.submit(pid(1), 40).await.unwrap();
        assert_eq!(ack.score, 2);
        assert!(matches!(drain(&mut rx[0]).as_slice(), [ServerMessage::Waiting(a)] if a.guess == 40));
        assert!(drain(&mut rx[1]).is_empty());

        s.submit(pid(2), 50).await.unwrap();
        s.submit(pid(3), 42).await.unwrap();

        let msgs = drain(&mut rx[2]);
        assert_eq!(msgs.len(), 3);
        assert!(matches!(&msgs[0], ServerMessage::Waiting(_)));
        match &msgs[1] {
            ServerMessage::Results(results) => {
                assert_eq!(results.players[0].player_id, pid(3));
                assert_eq!(results.players[0].rank, 1);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(&msgs[2], ServerMessage::Final(f) if f.players.len() == 3));

        assert!(s.is_finished().await);
        assert_eq!(s.timeout(1).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_invalid_and_late_submissions() {
        let s = session(1, 1, FixedTargets::new(42));
        let _rx = attach_all(&s, 3).await;
        s.start_round(1).await.unwrap();

        let err = s.submit(pid(1), 101).await.unwrap_err();
        match &err {
            SessionError::Coordinator(e) => {
                assert_eq!(crate::network::protocol::ServerError::from(e).code, ErrorCode::InvalidGuess);
            }
            other => panic!("unexpected {:?}", other),
        }

        assert_eq!(s.timeout(1).await.unwrap(), 1);
        assert!(matches!(
            s.submit(pid(1), 10).await,
            Err(SessionError::Coordinator(CoordinatorError::LateSubmission(1)))
        ));
        assert!(matches!(s.submit(pid(7), 10).await, Err(SessionError::UnknownPlayer(_))));
    }

    #[tokio::test]
    async fn test_groups_are_independent() {
        let s = session(2, 1, FixedTargets::new(10).with(2, 1, 90));
        let mut rx = attach_all(&s, 6).await;
        s.start_round(1).await.unwrap();
        rx.iter_mut().for_each(|r| { drain(r); });

        for i in 1..=3 {
            s.submit(pid(i), 10).await.unwrap();
        }
        // Group 2 still open, no results leaked to it.
        assert!(drain(&mut rx[3]).is_empty());
        assert!(s.results(2, 1).await.unwrap().is_none());
        assert_eq!(s.results(1, 1).await.unwrap().unwrap().target_number, 10);

        assert_eq!(s.timeout(1).await.unwrap(), 1);
        let results = s.results(2, 1).await.unwrap().unwrap();
        assert_eq!(results.target_number, 90);
        assert!(results.players.iter().all(|p| p.is_fallback));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_last_submission_races_timeout() {
        for _ in 0..20 {
            let s = Arc::new(session(1, 1, FixedTargets::new(50)));
            let mut rx = attach_all(&s, 3).await;
            s.start_round(1).await.unwrap();
            s.submit(pid(1), 10).await.unwrap();
            s.submit(pid(2), 20).await.unwrap();

            let submitter = {
                let s = s.clone();
                tokio::spawn(async move { s.submit(pid(3), 30).await })
            };
            let timer = {
                let s = s.clone();
                tokio::spawn(async move { s.timeout(1).await })
            };
            let submitted = submitter.await.unwrap();
            let timed_out = timer.await.unwrap().unwrap();

            // Exactly one of the two closed the round.
            match submitted {
                Ok(_) => assert_eq!(timed_out, 0),
                Err(SessionError::Coordinator(CoordinatorError::LateSubmission(1))) => {
                    assert_eq!(timed_out, 1)
                }
                Err(e) => panic!("unexpected {:?}", e),
            }

            for r in rx.iter_mut() {
                let results = drain(r).into_iter()
                    .filter(|m| matches!(m, ServerMessage::Results(_)))
                    .count();
                assert_eq!(results, 1);
            }
            let completions = s.audit_log().await.iter()
                .filter(|e| matches!(e.kind, crate::game::events::RoundEventKind::RoundCompleted { .. }))
                .count();
            assert_eq!(completions, 1);
        }
    }

    #[tokio::test]
    async fn test_export_after_session() {
        let s = session(1, 2, FixedTargets::new(42).with(1, 2, 10));
        s.start_round(1).await.unwrap();
        s.submit(pid(1), 40).await.unwrap();
        s.submit(pid(2), 50).await.unwrap();
        s.timeout(1).await.unwrap();
        assert_eq!(s.defensive_recompute(1).await.unwrap(), 0);
        s.start_round(2).await.unwrap();
        s.submit(pid(1), 15).await.unwrap();
        s.submit(pid(2), 0).await.unwrap();
        s.submit(pid(3), 90).await.unwrap();

        let standings = s.final_standings(1).await.unwrap().unwrap();
        assert_eq!(standings.players.iter().map(|p| p.total_score).collect::<Vec<_>>(), vec![7, 18, 180]);

        let export = s.export().await.unwrap();
        assert_eq!(export.rounds.len(), 6);
        assert_eq!(export.closed_round_count(), 2);
        assert!(export.verify().is_ok());
        assert!(export.events.iter().any(|e| e.kind == crate::game::events::RoundEventKind::RoundCompleted { is_final: true }));
    }
}
