//! Round evaluation: the over/under decision rule and the verdict shown to the player.

use std::fmt;

use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;
use serde::de::Error as _;

use crate::error::RangeError;

/// Lowest face of the die and lowest selectable threshold.
pub const MIN_FACE: u8 = 1;
/// Highest face of the die and highest selectable threshold.
pub const MAX_FACE: u8 = 100;

fn check_range(value: i64) -> Result<u8, RangeError> {
    if (i64::from(MIN_FACE)..=i64::from(MAX_FACE)).contains(&value) {
        Ok(value as u8)
    } else {
        Err(RangeError { value })
    }
}

/// One face of the hundred-sided die.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, JsonSchema)]
#[serde(crate = "rocket::serde", transparent)]
pub struct DiceResult(u8);

impl DiceResult {
    pub fn new(value: i64) -> Result<Self, RangeError> {
        check_range(value).map(Self)
    }

    /// For callers that produce the face from a `1..=100` sample themselves.
    pub(crate) fn from_roll(value: u8) -> Self {
        debug_assert!((MIN_FACE..=MAX_FACE).contains(&value));
        Self(value)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for DiceResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for DiceResult {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = i64::deserialize(deserializer)?;
        Self::new(raw).map_err(D::Error::custom)
    }
}

/// The number the roll is compared against.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, JsonSchema)]
#[serde(crate = "rocket::serde", transparent)]
pub struct Threshold(u8);

impl Threshold {
    pub fn new(value: i64) -> Result<Self, RangeError> {
        check_range(value).map(Self)
    }

    /// Pins `value` into `1..=100`, the way a slider control would.
    pub fn clamped(value: i64) -> Self {
        Self(value.clamp(i64::from(MIN_FACE), i64::from(MAX_FACE)) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self(50)
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for Threshold {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = i64::deserialize(deserializer)?;
        Self::new(raw).map_err(D::Error::custom)
    }
}

/// Which side of the threshold the player bets on.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub enum Condition {
    #[default]
    Over,
    Under,
}

impl Condition {
    /// Lower-case name used in guess labels, e.g. `over 50`.
    pub fn label(self) -> &'static str {
        match self {
            Condition::Over => "over",
            Condition::Under => "under",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Alert styling for a verdict.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub enum Severity {
    Success,
    Error,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct Verdict {
    pub is_win: bool,
    pub message: String,
    pub severity: Severity,
}

/// Decides a round. A roll equal to the threshold loses under both conditions.
pub fn evaluate(result: DiceResult, condition: Condition, threshold: Threshold) -> Verdict {
    let is_win = match condition {
        Condition::Over => result.value() > threshold.value(),
        Condition::Under => result.value() < threshold.value(),
    };

    let status = if is_win { "You won!" } else { "You lost!" };
    let direction = match (condition, is_win) {
        (Condition::Over, true) | (Condition::Under, false) => "higher",
        (Condition::Over, false) | (Condition::Under, true) => "lower",
    };

    Verdict {
        is_win,
        message: format!("{status} Number was {direction}"),
        severity: if is_win {
            Severity::Success
        } else {
            Severity::Error
        },
    }
}
