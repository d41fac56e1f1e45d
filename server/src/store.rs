use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use sweepcast_protocol::SavedConfig;

use crate::StoreError;

/// Where initial layouts are kept so a board can be replayed later.
///
/// Only the starting configuration is ever written, never per-turn state.
pub trait PersistenceStore: Send + Sync {
    fn save(&self, game_id: &str, config: &SavedConfig) -> Result<(), StoreError>;

    fn load(&self, game_id: &str) -> Result<SavedConfig, StoreError>;

    fn contains(&self, game_id: &str) -> bool {
        self.load(game_id).is_ok()
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    saved: RwLock<HashMap<String, SavedConfig>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PersistenceStore for MemoryStore {
    fn save(&self, game_id: &str, config: &SavedConfig) -> Result<(), StoreError> {
        self.saved
            .write()
            .insert(game_id.to_owned(), config.clone());
        Ok(())
    }

    fn load(&self, game_id: &str) -> Result<SavedConfig, StoreError> {
        self.saved
            .read()
            .get(game_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(game_id.to_owned()))
    }

    fn contains(&self, game_id: &str) -> bool {
        self.saved.read().contains_key(game_id)
    }
}

/// One `<id>.json` file per game in a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Ids come from clients on load, anything but plain alphanumerics never maps to a file.
    fn path_for(&self, game_id: &str) -> Option<PathBuf> {
        let valid = !game_id.is_empty() && game_id.chars().all(|c| c.is_ascii_alphanumeric());
        valid.then(|| self.dir.join(format!("{game_id}.json")))
    }
}

impl PersistenceStore for FileStore {
    fn save(&self, game_id: &str, config: &SavedConfig) -> Result<(), StoreError> {
        let path = self.path_for(game_id).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, format!("bad game id {game_id:?}"))
        })?;

        // atomic replace
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec(config)?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn load(&self, game_id: &str) -> Result<SavedConfig, StoreError> {
        let not_found = || StoreError::NotFound(game_id.to_owned());
        let path = self.path_for(game_id).ok_or_else(not_found)?;

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Err(not_found()),
            Err(err) => return Err(err.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn contains(&self, game_id: &str) -> bool {
        self.path_for(game_id).is_some_and(|path| path.exists())
    }
}
