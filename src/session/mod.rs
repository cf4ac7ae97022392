//! The game session: owns the settings, the dice, the history log and the
//! store, and runs one round at a time.
//!
//! A round is split in two so a caller can pause between the halves:
//! [`GameSession::begin_roll`] moves `Idle -> Rolling` and captures the
//! current condition and threshold; [`GameSession::resolve_roll`] rolls,
//! evaluates, records and saves, then drops straight back to `Idle` with the
//! verdict kept for display. While `Rolling`, a second `begin_roll` and a
//! reseed are refused; condition and threshold may still change but only
//! reach the next round.

pub mod endpoints;

use std::time::Duration;

use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;

use crate::config::GameConfig;
use crate::dice::{DiceRoller, PcgDice};
use crate::error::SessionError;
use crate::history::persistence::{self, FileStore, KeyValueStore};
use crate::history::{HistoryEntry, HistoryLog};
use crate::round::{evaluate, Condition, DiceResult, Threshold, Verdict};

pub use endpoints::SharedSession;

/// Source of the display time stamped on history entries.
pub trait Clock: Send {
    fn now_label(&self) -> String;
}

/// Local wall-clock time, `HH:MM:SS`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn now_label(&self) -> String {
        chrono::Local::now().format("%H:%M:%S").to_string()
    }
}

/// Always reports the same time.
#[derive(Clone, Debug)]
pub struct FixedClock(pub String);

impl Clock for FixedClock {
    fn now_label(&self) -> String {
        self.0.clone()
    }
}

/// A resolved round shows up as `Idle` with `verdict` set.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub enum Phase {
    Idle,
    Rolling,
}

/// Proof that a roll was started. The settings are frozen at `begin_roll`.
#[derive(Debug)]
pub struct RollTicket {
    condition: Condition,
    threshold: Threshold,
}

impl RollTicket {
    pub fn condition(&self) -> Condition {
        self.condition
    }

    pub fn threshold(&self) -> Threshold {
        self.threshold
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct RoundOutcome {
    pub result: DiceResult,
    pub verdict: Verdict,
    pub entry: HistoryEntry,
    /// False when the history could not be written to the store.
    pub persisted: bool,
}

/// Everything the UI needs to draw the game.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct GameSnapshot {
    pub threshold: Threshold,
    pub condition: Condition,
    pub result: DiceResult,
    pub verdict: Option<Verdict>,
    pub phase: Phase,
    pub rolling: bool,
    pub history: HistoryLog,
}

pub struct GameSession {
    threshold: Threshold,
    condition: Condition,
    result: DiceResult,
    verdict: Option<Verdict>,
    phase: Phase,
    history: HistoryLog,
    roller: Box<dyn DiceRoller>,
    store: Box<dyn KeyValueStore>,
    clock: Box<dyn Clock>,
    storage_key: String,
    roll_delay: Duration,
}

impl GameSession {
    /// Start a session, rehydrating history from `store`. A missing or
    /// unreadable history starts the session empty.
    pub fn new(
        storage_key: impl Into<String>,
        mut roller: Box<dyn DiceRoller>,
        store: Box<dyn KeyValueStore>,
        clock: Box<dyn Clock>,
    ) -> Self {
        let storage_key = storage_key.into();
        let history = match persistence::load(&*store, &storage_key) {
            Ok(loaded) => {
                log::info!("loaded {} history entries from '{}'", loaded.len(), storage_key);
                loaded
            }
            Err(e) if e.is_not_found() => {
                log::info!("no saved history under '{}', starting fresh", storage_key);
                HistoryLog::new()
            }
            Err(e) => {
                log::warn!("discarding saved history: {}", e);
                HistoryLog::new()
            }
        };
        let result = roller.generate();

        GameSession {
            threshold: Threshold::default(),
            condition: Condition::default(),
            result,
            verdict: None,
            phase: Phase::Idle,
            history,
            roller,
            store,
            clock,
            storage_key,
            roll_delay: Duration::ZERO,
        }
    }

    /// Session backed by a [`FileStore`], PCG dice and the local clock.
    pub fn from_config(config: &GameConfig) -> Self {
        let roller = match config.seed {
            Some(seed) => PcgDice::from_seed(seed),
            None => PcgDice::from_entropy(),
        };
        GameSession::new(
            config.storage_key.clone(),
            Box::new(roller),
            Box::new(FileStore::new(config.history_dir.clone())),
            Box::new(LocalClock),
        )
        .with_roll_delay(config.roll_delay)
    }

    #[must_use]
    pub fn with_roll_delay(mut self, delay: Duration) -> Self {
        self.roll_delay = delay;
        self
    }

    pub fn roll_delay(&self) -> Duration {
        self.roll_delay
    }

    pub fn set_threshold(&mut self, value: i64) -> Result<Threshold, SessionError> {
        self.threshold = Threshold::new(value)?;
        Ok(self.threshold)
    }

    pub fn set_condition(&mut self, condition: Condition) {
        self.condition = condition;
    }

    pub fn threshold(&self) -> Threshold {
        self.threshold
    }

    pub fn condition(&self) -> Condition {
        self.condition
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_rolling(&self) -> bool {
        self.phase == Phase::Rolling
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    /// Restart the dice from `seed`. Refused mid-roll, since the face is
    /// only drawn when the roll resolves.
    pub fn reseed(&mut self, seed: u64) -> Result<(), SessionError> {
        if self.is_rolling() {
            return Err(SessionError::AlreadyRolling);
        }
        self.roller.reseed(seed);
        Ok(())
    }

    pub fn begin_roll(&mut self) -> Result<RollTicket, SessionError> {
        if self.is_rolling() {
            return Err(SessionError::AlreadyRolling);
        }
        self.phase = Phase::Rolling;
        log::debug!("rolling: {} {}", self.condition, self.threshold);
        Ok(RollTicket {
            condition: self.condition,
            threshold: self.threshold,
        })
    }

    /// Roll, evaluate, record and save. A failed save is logged; the round
    /// still counts and the in-memory history keeps it.
    pub fn resolve_roll(&mut self, ticket: RollTicket) -> RoundOutcome {
        let result = self.roller.generate();
        let verdict = evaluate(result, ticket.condition, ticket.threshold);
        let entry = HistoryEntry::new(
            self.clock.now_label(),
            ticket.condition,
            ticket.threshold,
            result,
            verdict.is_win,
        );

        let history = std::mem::take(&mut self.history);
        self.history = history.append(entry.clone());

        let persisted =
            match persistence::save(&mut *self.store, &self.storage_key, &self.history) {
                Ok(()) => true,
                Err(e) => {
                    log::warn!("history not saved, keeping it in memory: {}", e);
                    false
                }
            };

        log::info!("{} -> rolled {}: {}", entry.guess_label, result, verdict.message);
        self.result = result;
        self.verdict = Some(verdict.clone());
        self.phase = Phase::Idle;

        RoundOutcome {
            result,
            verdict,
            entry,
            persisted,
        }
    }

    /// A whole round with no pause in between.
    pub fn play(&mut self) -> Result<RoundOutcome, SessionError> {
        let ticket = self.begin_roll()?;
        Ok(self.resolve_roll(ticket))
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            threshold: self.threshold,
            condition: self.condition,
            result: self.result,
            verdict: self.verdict.clone(),
            phase: self.phase,
            rolling: self.is_rolling(),
            history: self.history.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::FixedDice;
    use crate::error::StorageError;
    use crate::history::persistence::MemoryStore;
    use crate::history::MAX_HISTORY;

    const KEY: &str = "diceGameHistory";

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn read(&self, key: &str) -> Result<String, StorageError> {
            Err(StorageError::io(
                key,
                std::io::Error::new(std::io::ErrorKind::Other, "disk gone"),
            ))
        }

        fn write(&mut self, key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::io(
                key,
                std::io::Error::new(std::io::ErrorKind::Other, "disk gone"),
            ))
        }
    }

    fn faces(values: &[i64]) -> Box<FixedDice> {
        Box::new(
            FixedDice::new(values.iter().map(|v| DiceResult::new(*v).unwrap()).collect())
                .unwrap(),
        )
    }

    fn session_with(values: &[i64], store: MemoryStore) -> GameSession {
        GameSession::new(
            KEY,
            faces(values),
            Box::new(store),
            Box::new(FixedClock("12:34:56".to_string())),
        )
    }

    #[test]
    fn starts_idle_with_defaults_and_an_initial_roll() {
        let session = session_with(&[42, 73], MemoryStore::new());
        let snapshot = session.snapshot();
        assert_eq!(snapshot.phase, Phase::Idle);
        assert!(!snapshot.rolling);
        assert_eq!(snapshot.threshold.value(), 50);
        assert_eq!(snapshot.condition, Condition::Over);
        assert_eq!(snapshot.result.value(), 42);
        assert_eq!(snapshot.verdict, None);
        assert!(snapshot.history.is_empty());
    }

    #[test]
    fn play_records_and_saves_the_round() {
        let store = MemoryStore::new();
        let mut session = session_with(&[1, 73], store.clone());
        let outcome = session.play().unwrap();

        assert_eq!(outcome.result.value(), 73);
        assert!(outcome.verdict.is_win);
        assert_eq!(outcome.verdict.message, "You won! Number was higher");
        assert!(outcome.persisted);
        assert_eq!(outcome.entry.guess_label, "over 50");
        assert_eq!(outcome.entry.timestamp, "12:34:56");
        assert_eq!(session.phase(), Phase::Idle);
        assert_eq!(session.history().latest(), Some(&outcome.entry));

        let snapshot = session.snapshot();
        assert!(!snapshot.rolling);
        assert_eq!(snapshot.result.value(), 73);
        assert_eq!(snapshot.verdict, Some(outcome.verdict.clone()));

        let saved = persistence::load(&store, KEY).unwrap();
        assert_eq!(&saved, session.history());
    }

    #[test]
    fn second_begin_while_rolling_is_refused() {
        let mut session = session_with(&[1, 60], MemoryStore::new());
        let ticket = session.begin_roll().unwrap();
        assert!(session.is_rolling());
        assert_eq!(session.begin_roll().unwrap_err(), SessionError::AlreadyRolling);
        assert_eq!(session.play().unwrap_err(), SessionError::AlreadyRolling);
        assert_eq!(session.reseed(77).unwrap_err(), SessionError::AlreadyRolling);

        // the refused reseed did not rewind the dice to the first face
        let outcome = session.resolve_roll(ticket);
        assert_eq!(outcome.result.value(), 60);
        assert!(!session.is_rolling());
        assert_eq!(session.phase(), Phase::Idle);
        assert_eq!(session.history().len(), 1);
        assert!(session.begin_roll().is_ok());
    }

    #[test]
    fn reseed_between_rounds_restarts_the_dice() {
        let mut session = session_with(&[1, 60, 30], MemoryStore::new());
        assert_eq!(session.play().unwrap().result.value(), 60);
        session.reseed(5).unwrap();
        assert_eq!(session.play().unwrap().result.value(), 1);
    }

    #[test]
    fn settings_changed_mid_roll_apply_to_the_next_round() {
        let mut session = session_with(&[1, 15, 15], MemoryStore::new());
        session.set_condition(Condition::Under);
        session.set_threshold(20).unwrap();

        let ticket = session.begin_roll().unwrap();
        session.set_condition(Condition::Over);
        session.set_threshold(90).unwrap();
        let outcome = session.resolve_roll(ticket);
        assert_eq!(outcome.entry.guess_label, "under 20");
        assert_eq!(outcome.verdict.message, "You won! Number was lower");

        let next = session.play().unwrap();
        assert_eq!(next.entry.guess_label, "over 90");
        assert!(!next.verdict.is_win);
        // the earlier entry keeps its label
        assert_eq!(session.history().entries()[1].guess_label, "under 20");
    }

    #[test]
    fn invalid_threshold_is_rejected_and_kept() {
        let mut session = session_with(&[1], MemoryStore::new());
        assert!(session.set_threshold(0).is_err());
        assert!(session.set_threshold(101).is_err());
        assert_eq!(session.threshold().value(), 50);
        assert_eq!(session.set_threshold(100).unwrap().value(), 100);
    }

    #[test]
    fn history_stays_bounded_over_many_rounds() {
        let mut session = session_with(&[10, 20, 30, 40, 50, 60, 70, 80, 90], MemoryStore::new());
        for _ in 0..25 {
            session.play().unwrap();
        }
        assert_eq!(session.history().len(), MAX_HISTORY);
    }

    #[test]
    fn failed_save_keeps_the_round() {
        let mut session = GameSession::new(
            KEY,
            faces(&[1, 99]),
            Box::new(BrokenStore),
            Box::new(FixedClock("00:00:00".to_string())),
        );
        assert!(session.history().is_empty());

        let outcome = session.play().unwrap();
        assert!(!outcome.persisted);
        assert!(outcome.verdict.is_win);
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.phase(), Phase::Idle);
    }

    #[test]
    fn resumes_from_saved_history() {
        let store = MemoryStore::new();
        {
            let mut first = session_with(&[1, 80, 20], store.clone());
            first.play().unwrap();
            first.play().unwrap();
        }
        let resumed = session_with(&[5], store);
        let results: Vec<u8> = resumed
            .history()
            .entries()
            .iter()
            .map(|e| e.result.value())
            .collect();
        assert_eq!(results, vec![20, 80]);
    }

    #[test]
    fn corrupt_history_starts_empty() {
        let mut store = MemoryStore::new();
        store.write(KEY, "[{\"time\":").unwrap();
        let session = session_with(&[1], store);
        assert!(session.history().is_empty());
    }
}
