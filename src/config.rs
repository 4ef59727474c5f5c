//! Server configuration loaded from environment variables

use crate::types::*;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

/// Runtime configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the HTTP server binds to
    pub addr: SocketAddr,
    /// Maximum number of connected players per room
    pub max_players: usize,
    /// Settings new rooms start with
    pub game: GameConfig,
    /// JSON-lines leaderboard file (None = keep scores in memory)
    pub scores_path: Option<PathBuf>,
    /// Directory served as the web client
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            max_players: 5,
            game: GameConfig::default(),
            scores_path: None,
            static_dir: PathBuf::from("static"),
        }
    }
}

impl ServerConfig {
    /// Load config from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let categories = std::env::var("PETITBAC_CATEGORIES")
            .ok()
            .map(|raw| {
                let split: Vec<String> = raw.split(',').map(|c| c.to_string()).collect();
                sanitize_categories(&split)
            })
            .filter(|cats| !cats.is_empty())
            .unwrap_or(defaults.game.categories);

        let round_seconds = env_parse("PETITBAC_ROUND_SECONDS", defaults.game.round_seconds)
            .clamp(MIN_ROUND_SECONDS, MAX_ROUND_SECONDS);
        let max_rounds =
            env_parse("PETITBAC_MAX_ROUNDS", defaults.game.max_rounds).clamp(1, MAX_ROUNDS_LIMIT);

        let scores_path = std::env::var("PETITBAC_SCORES_PATH")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        let static_dir = std::env::var("PETITBAC_STATIC_DIR")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.static_dir);

        Self {
            addr: env_parse("PETITBAC_ADDR", defaults.addr),
            max_players: env_parse("PETITBAC_MAX_PLAYERS", defaults.max_players).max(1),
            game: GameConfig {
                categories,
                round_seconds,
                max_rounds,
            },
            scores_path,
            static_dir,
        }
    }
}

/// Parse an env var, warning and falling back to `default` on bad input
fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!("Invalid value {:?} for {}, using default", raw, key);
                default
            }
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "PETITBAC_ADDR",
        "PETITBAC_MAX_PLAYERS",
        "PETITBAC_ROUND_SECONDS",
        "PETITBAC_MAX_ROUNDS",
        "PETITBAC_CATEGORIES",
        "PETITBAC_SCORES_PATH",
        "PETITBAC_STATIC_DIR",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_defaults_without_env() {
        clear_env();
        let config = ServerConfig::from_env();

        assert_eq!(config.addr.port(), 8080);
        assert_eq!(config.max_players, 5);
        assert_eq!(config.game, GameConfig::default());
        assert!(config.scores_path.is_none());
    }

    #[test]
    #[serial]
    fn test_env_overrides_and_clamps() {
        clear_env();
        std::env::set_var("PETITBAC_ADDR", "127.0.0.1:9000");
        std::env::set_var("PETITBAC_MAX_PLAYERS", "8");
        std::env::set_var("PETITBAC_ROUND_SECONDS", "5");
        std::env::set_var("PETITBAC_MAX_ROUNDS", "50");
        std::env::set_var("PETITBAC_CATEGORIES", "Animal, City,,animal");
        std::env::set_var("PETITBAC_SCORES_PATH", "/tmp/scores.jsonl");

        let config = ServerConfig::from_env();
        clear_env();

        assert_eq!(config.addr.port(), 9000);
        assert_eq!(config.max_players, 8);
        assert_eq!(config.game.round_seconds, MIN_ROUND_SECONDS);
        assert_eq!(config.game.max_rounds, MAX_ROUNDS_LIMIT);
        assert_eq!(config.game.categories, vec!["Animal", "City"]);
        assert_eq!(config.scores_path, Some(PathBuf::from("/tmp/scores.jsonl")));
    }

    #[test]
    #[serial]
    fn test_garbage_values_fall_back() {
        clear_env();
        std::env::set_var("PETITBAC_MAX_PLAYERS", "lots");
        std::env::set_var("PETITBAC_CATEGORIES", " , ");

        let config = ServerConfig::from_env();
        clear_env();

        assert_eq!(config.max_players, 5);
        assert_eq!(config.game.categories, default_categories());
    }
}
