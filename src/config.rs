use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::roster::{MAX_ROSTER, MIN_ROSTER};
use crate::types::{GameConfig, Rules};

/// Resolves a path relative to the config directory.
fn config_path(sub: &str) -> PathBuf {
    let base = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config".to_string());
    Path::new(&base).join(sub)
}

fn io_error(path: &Path, source: std::io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Initialize config directory with defaults if missing.
pub fn init() -> Result<(), ConfigError> {
    init_at(&config_path(""))
}

fn init_at(base: &Path) -> Result<(), ConfigError> {
    if !base.exists() {
        fs::create_dir_all(base).map_err(|e| io_error(base, e))?;
    }

    let game_path = base.join("game.json");
    if !game_path.exists() {
        let data = serde_json::to_string_pretty(&GameConfig::default())?;
        fs::write(&game_path, data).map_err(|e| io_error(&game_path, e))?;
        tracing::info!("Wrote default config to {}", game_path.display());
    }
    Ok(())
}

/// Load and validate the game configuration.
pub fn load_game_config() -> Result<GameConfig, ConfigError> {
    load_from(&config_path("game.json"))
}

fn load_from(path: &Path) -> Result<GameConfig, ConfigError> {
    let data = fs::read_to_string(path).map_err(|e| io_error(path, e))?;
    let config: GameConfig = serde_json::from_str(&data)?;
    validate_rules(&config.rules)?;
    Ok(config)
}

pub fn validate_rules(rules: &Rules) -> Result<(), ConfigError> {
    if !(rules.exclusion_seconds.is_finite() && rules.exclusion_seconds > 0.0) {
        return Err(ConfigError::InvalidRule {
            field: "exclusionSeconds",
            reason: format!("must be positive, got {}", rules.exclusion_seconds),
        });
    }
    if !(rules.expulsion_penalty_seconds.is_finite() && rules.expulsion_penalty_seconds >= 0.0) {
        return Err(ConfigError::InvalidRule {
            field: "expulsionPenaltySeconds",
            reason: format!("must not be negative, got {}", rules.expulsion_penalty_seconds),
        });
    }
    if rules.max_exclusions == 0 {
        return Err(ConfigError::InvalidRule {
            field: "maxExclusions",
            reason: "must be at least 1".to_string(),
        });
    }
    if rules.max_on_court == 0 {
        return Err(ConfigError::InvalidRule {
            field: "maxOnCourt",
            reason: "must be at least 1".to_string(),
        });
    }
    if !(MIN_ROSTER..=MAX_ROSTER).contains(&rules.default_roster_size) {
        return Err(ConfigError::InvalidRule {
            field: "defaultRosterSize",
            reason: format!(
                "must be between {MIN_ROSTER} and {MAX_ROSTER}, got {}",
                rules.default_roster_size
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("courtclock-{}-{}", name, uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn init_writes_loadable_defaults() {
        let dir = scratch_dir("init").join("nested");
        init_at(&dir).unwrap();
        let config = load_from(&dir.join("game.json")).unwrap();
        assert_eq!(config.operator_password, "PASSWORD");
        assert_eq!(config.rules, Rules::default());
        fs::remove_dir_all(dir.parent().unwrap()).ok();
    }

    #[test]
    fn init_keeps_existing_file() {
        let dir = scratch_dir("keep");
        fs::write(dir.join("game.json"), r#"{"operatorPassword":"secret"}"#).unwrap();
        init_at(&dir).unwrap();
        let config = load_from(&dir.join("game.json")).unwrap();
        assert_eq!(config.operator_password, "secret");
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn load_rejects_bad_rules() {
        let dir = scratch_dir("bad");
        let path = dir.join("game.json");
        fs::write(&path, r#"{"operatorPassword":"x","rules":{"maxExclusions":0}}"#).unwrap();
        assert!(matches!(
            load_from(&path),
            Err(ConfigError::InvalidRule { field: "maxExclusions", .. })
        ));

        fs::write(&path, r#"{"operatorPassword":"x","rules":{"defaultRosterSize":25}}"#).unwrap();
        assert!(matches!(
            load_from(&path),
            Err(ConfigError::InvalidRule { field: "defaultRosterSize", .. })
        ));

        fs::write(&path, "not json").unwrap();
        assert!(matches!(load_from(&path), Err(ConfigError::Json(_))));
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = scratch_dir("missing");
        assert!(matches!(load_from(&dir.join("game.json")), Err(ConfigError::Io { .. })));
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn rejects_non_positive_exclusion() {
        let rules = Rules {
            exclusion_seconds: 0.0,
            ..Rules::default()
        };
        assert!(validate_rules(&rules).is_err());
        assert!(validate_rules(&Rules::default()).is_ok());
    }
}
