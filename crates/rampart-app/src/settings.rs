//! Engine settings resolved from the environment.

use std::env;
use std::fs;
use std::path::PathBuf;

use rampart_campaign::{FileStore, KeyValueStore, MemoryStore};
use rampart_core::config::CampaignConfig;
use rampart_core::error::ConfigError;
use rampart_sim::path::StaticMaps;
use rampart_sim::{SimConfig, SimulationEngine};

/// Optional JSON campaign table.
pub const CONFIG_ENV: &str = "RAMPART_CONFIG";
/// Directory for progression documents. Progress is kept in memory when unset.
pub const SAVE_DIR_ENV: &str = "RAMPART_SAVE_DIR";
/// Overrides the default RNG seed.
pub const SEED_ENV: &str = "RAMPART_SEED";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("cannot read campaign table {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{SEED_ENV} must be an unsigned integer, got {0:?}")]
    Seed(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Everything needed to build an engine.
#[derive(Debug, Clone, Default)]
pub struct AppSettings {
    pub sim: SimConfig,
    pub save_dir: Option<PathBuf>,
}

impl AppSettings {
    /// Read settings from `RAMPART_CONFIG`, `RAMPART_SAVE_DIR` and `RAMPART_SEED`.
    pub fn from_env() -> Result<Self, SettingsError> {
        let mut settings = Self::default();

        if let Some(path) = env::var_os(CONFIG_ENV).map(PathBuf::from) {
            let json = fs::read_to_string(&path).map_err(|source| SettingsError::Read {
                path: path.clone(),
                source,
            })?;
            settings.sim.campaign = CampaignConfig::from_json(&json)?;
        }
        settings.save_dir = env::var_os(SAVE_DIR_ENV).map(PathBuf::from);
        if let Ok(seed) = env::var(SEED_ENV) {
            settings.sim.seed = seed.trim().parse().map_err(|_| SettingsError::Seed(seed))?;
        }

        Ok(settings)
    }

    /// Build an engine on the default map set, backed by the configured store.
    pub fn build_engine(&self) -> Result<SimulationEngine, ConfigError> {
        let store: Box<dyn KeyValueStore> = match &self.save_dir {
            Some(dir) => Box::new(FileStore::new(dir.clone())),
            None => Box::new(MemoryStore::new()),
        };
        SimulationEngine::new(self.sim.clone(), Box::new(StaticMaps::serpentine()), store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_build_an_in_memory_engine() {
        let engine = AppSettings::default().build_engine().unwrap();
        assert_eq!(engine.config().final_level(), 20);
        assert!(engine.session().is_none());
    }

    #[test]
    fn save_dir_backs_progress_with_files() {
        let dir = tempfile::tempdir().unwrap();
        let settings = AppSettings {
            save_dir: Some(dir.path().to_path_buf()),
            ..AppSettings::default()
        };

        let mut engine = settings.build_engine().unwrap();
        engine
            .execute(rampart_core::commands::PlayerCommand::SelectLevel {
                world: 1,
                level: 1,
                mode: rampart_core::enums::GameMode::Campaign,
            })
            .unwrap();
        engine
            .execute(rampart_core::commands::PlayerCommand::ClearObstacle {
                cell: rampart_core::types::GridCell::new(2, 0),
            })
            .unwrap();

        assert!(dir.path().join("campaign_progress.json").exists());
    }
}
