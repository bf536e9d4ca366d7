use std::{env, str::FromStr, time::Duration};

use tracing::warn;

use crate::viewport::DEFAULT_VIEW_SIZE;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Length of one stopwatch unit.
    pub tick: Duration,
    /// Upper bound on the viewport's height and width.
    pub view_size: usize,
    /// Fixed seed for mine placement. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(1),
            view_size: DEFAULT_VIEW_SIZE,
            seed: None,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let tick_millis: u64 = read_env("MINESWEEPER_TICK_MILLIS", 1000);
        let view_size: usize = read_env("MINESWEEPER_VIEW_SIZE", DEFAULT_VIEW_SIZE);
        let seed = env::var("MINESWEEPER_SEED")
            .ok()
            .and_then(|value| match value.parse() {
                Ok(seed) => Some(seed),
                Err(_) => {
                    warn!("Ignoring unparsable MINESWEEPER_SEED={:?}", value);
                    None
                }
            });

        Self {
            tick: Duration::from_millis(tick_millis.max(1)),
            view_size: view_size.max(1),
            seed,
        }
    }
}

/// Reads `key` from the environment, falling back to `default` when unset or
/// unparsable.
pub fn read_env<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}
