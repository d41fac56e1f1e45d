use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::store::{FileStore, MemoryStore, PersistenceStore};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Length of generated game ids.
    pub id_length: usize,
    /// How long a finished game stays watchable before eviction.
    pub finished_ttl_secs: u64,
    /// Directory for saved layouts, kept in memory when unset.
    pub store_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            id_length: 10,
            finished_ttl_secs: 60 * 60,
            store_dir: None,
        }
    }
}

impl Config {
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn finished_ttl(&self) -> time::Duration {
        time::Duration::seconds(self.finished_ttl_secs.try_into().unwrap_or(i64::MAX))
    }

    pub fn open_store(&self) -> anyhow::Result<Arc<dyn PersistenceStore>> {
        Ok(match &self.store_dir {
            Some(dir) => {
                let store = FileStore::open(dir)
                    .with_context(|| format!("opening store directory {}", dir.display()))?;
                log::info!("Saving game layouts to {}", dir.display());
                Arc::new(store)
            }
            None => {
                log::info!("No store directory configured, game layouts are kept in memory");
                Arc::new(MemoryStore::new())
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_falls_back_to_defaults() {
        let config: Config = serde_json::from_str(r#"{ "idLength": 4 }"#).unwrap();

        assert_eq!(config.id_length, 4);
        assert_eq!(config.finished_ttl_secs, 3600);
        assert_eq!(config.store_dir, None);
        assert_eq!(config.finished_ttl(), time::Duration::hours(1));
    }

    #[test]
    fn reads_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sweepcast.json");
        std::fs::write(&path, r#"{ "finishedTtlSecs": 5, "storeDir": "saves" }"#).unwrap();

        let config = Config::from_json_file(&path).unwrap();

        assert_eq!(config.finished_ttl_secs, 5);
        assert_eq!(config.store_dir, Some(PathBuf::from("saves")));
    }
}
