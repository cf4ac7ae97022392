use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_STORAGE_KEY: &str = "diceGameHistory";
pub const DEFAULT_ROLL_DELAY: Duration = Duration::from_millis(1000);

/// Runtime settings for a game server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameConfig {
    /// Directory holding the persisted history file.
    pub history_dir: PathBuf,
    pub storage_key: String,
    /// Pause between accepting a play and resolving it.
    pub roll_delay: Duration,
    /// Fixed dice seed; `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            history_dir: PathBuf::from("./data"),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            roll_delay: DEFAULT_ROLL_DELAY,
            seed: None,
        }
    }
}

impl GameConfig {
    /// Defaults overridden by `DICE_HISTORY_DIR`, `DICE_STORAGE_KEY`,
    /// `DICE_ROLL_DELAY_MS` and `DICE_SEED`.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = GameConfig::default();
        if let Some(dir) = lookup("DICE_HISTORY_DIR") {
            config.history_dir = PathBuf::from(dir);
        }
        if let Some(key) = lookup("DICE_STORAGE_KEY") {
            config.storage_key = key;
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "DICE_ROLL_DELAY_MS") {
            config.roll_delay = Duration::from_millis(ms);
        }
        if let Some(seed) = parse_var::<u64>(&lookup, "DICE_SEED") {
            config.seed = Some(seed);
        }
        config
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T> {
    let raw = lookup(name)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            log::warn!("ignoring {name}={raw:?}: not a valid number");
            None
        }
    }
}
