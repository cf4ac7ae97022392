//! Bounded, most-recent-first log of completed rounds.
//!
//! The log is a plain value: `append` consumes the old log and hands back the
//! new one, so whoever holds the log holds the only copy that matters.

pub mod persistence;

use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;
use serde::de::Error as _;

use crate::error::{HistoryTooLong, ParseError};
use crate::round::{Condition, DiceResult, Threshold};

/// Rounds kept in the log.
pub const MAX_HISTORY: usize = 10;

/// One completed round, as shown in the history table and as persisted.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct HistoryEntry {
    #[serde(rename = "time")]
    pub timestamp: String,
    #[serde(rename = "guess")]
    pub guess_label: String,
    pub result: DiceResult,
    #[serde(rename = "isWin")]
    pub is_win: bool,
}

impl HistoryEntry {
    pub fn new(
        timestamp: impl Into<String>,
        condition: Condition,
        threshold: Threshold,
        result: DiceResult,
        is_win: bool,
    ) -> Self {
        HistoryEntry {
            timestamp: timestamp.into(),
            guess_label: guess_label(condition, threshold),
            result,
            is_win,
        }
    }
}

/// `over 50`, `under 20`, ...
pub fn guess_label(condition: Condition, threshold: Threshold) -> String {
    format!("{} {}", condition.label(), threshold)
}

#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, JsonSchema)]
#[serde(crate = "rocket::serde", transparent)]
pub struct HistoryLog(Vec<HistoryEntry>);

impl HistoryLog {
    pub fn new() -> Self {
        HistoryLog(Vec::new())
    }

    /// Push `entry` to the front and drop the oldest entries past [`MAX_HISTORY`].
    #[must_use]
    pub fn append(mut self, entry: HistoryEntry) -> HistoryLog {
        self.0.insert(0, entry);
        self.0.truncate(MAX_HISTORY);
        self
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.0.first()
    }

    pub fn serialize(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn deserialize(data: &str) -> Result<HistoryLog, ParseError> {
        Ok(serde_json::from_str(data)?)
    }
}

impl TryFrom<Vec<HistoryEntry>> for HistoryLog {
    type Error = HistoryTooLong;

    fn try_from(entries: Vec<HistoryEntry>) -> Result<Self, Self::Error> {
        if entries.len() > MAX_HISTORY {
            return Err(HistoryTooLong {
                len: entries.len(),
                max: MAX_HISTORY,
            });
        }
        Ok(HistoryLog(entries))
    }
}

impl<'de> Deserialize<'de> for HistoryLog {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = Vec::<HistoryEntry>::deserialize(deserializer)?;
        HistoryLog::try_from(entries).map_err(D::Error::custom)
    }
}
