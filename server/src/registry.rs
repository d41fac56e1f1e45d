use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use rand::Rng;
use sweepcast_core::{
    Coord2, GameConfig, Grid, LayoutGenerator, RandomLayoutGenerator, SnapshotOptions,
};
use sweepcast_protocol::{GameListEntry, GameListEvent, GameStateResponse};
use time::OffsetDateTime;

use crate::broadcast::{TurnBroadcaster, TurnStream};
use crate::store::{MemoryStore, PersistenceStore};
use crate::{Config, Game, Result, ServerError, wire};

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const MAX_ID_ATTEMPTS: usize = 64;

/// Optional details recorded on a new game.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CreateOptions {
    /// Layout seed, random when unset.
    pub seed: Option<u64>,
    /// Free-form name of the creating client.
    pub client: Option<String>,
}

/// Owns every live game, indexed by id and by password.
///
/// Also keeps the broadcast list of games, republished whenever a game is
/// added, finishes or goes away.
pub struct GameRegistry {
    config: Config,
    store: Arc<dyn PersistenceStore>,
    games: RwLock<HashMap<String, Arc<Game>>>,
    by_password: RwLock<HashMap<String, Vec<String>>>,
    list: TurnBroadcaster<GameListEvent>,
}

impl GameRegistry {
    pub fn new(config: Config, store: Arc<dyn PersistenceStore>) -> Self {
        Self {
            config,
            store,
            games: RwLock::new(HashMap::new()),
            by_password: RwLock::new(HashMap::new()),
            list: TurnBroadcaster::new(),
        }
    }

    pub fn in_memory(config: Config) -> Self {
        Self::new(config, Arc::new(MemoryStore::new()))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn create_game(
        &self,
        dims: (u64, u64),
        mines: u64,
        password: &str,
        options: CreateOptions,
    ) -> Result<Arc<Game>> {
        let config = GameConfig::try_new(dims, mines)?;
        let seed = options.seed.unwrap_or_else(|| rand::rng().random());
        let grid = RandomLayoutGenerator::new(seed).generate(config);

        let game = self.insert(grid, password, Some(seed), options.client)?;
        log::info!(
            "Created game {} ({}x{}, {} mines, seed {}) for {}",
            game.id(),
            config.size.0,
            config.size.1,
            config.mines,
            seed,
            game.client().unwrap_or("unnamed client")
        );
        Ok(game)
    }

    /// Starts a fresh game, under a new id, from a previously saved layout.
    pub fn load_game(&self, saved_id: &str, password: &str) -> Result<Arc<Game>> {
        let saved = self.store.load(saved_id)?;
        let grid = wire::grid_from_saved(&saved)?;

        let game = self.insert(grid, password, None, None)?;
        log::info!("Loaded game {} from saved layout {}", game.id(), saved_id);
        Ok(game)
    }

    fn insert(
        &self,
        grid: Grid,
        password: &str,
        seed: Option<u64>,
        client: Option<String>,
    ) -> Result<Arc<Game>> {
        let game = {
            let mut games = self.games.write();
            let id = self.allocate_id(&games)?;
            let game = Arc::new(Game::new(id.clone(), password.to_owned(), grid, seed, client));

            games.insert(id.clone(), Arc::clone(&game));
            self.by_password
                .write()
                .entry(password.to_owned())
                .or_default()
                .push(id);
            game
        };

        if let Err(err) = self.store.save(game.id(), game.initial_config()) {
            log::warn!("Could not save initial layout of game {}: {}", game.id(), err);
        }
        self.publish_game_list();
        Ok(game)
    }

    fn allocate_id(&self, games: &HashMap<String, Arc<Game>>) -> Result<String> {
        let mut rng = rand::rng();
        let length = self.config.id_length.max(1);

        for _ in 0..MAX_ID_ATTEMPTS {
            let id: String = (0..length)
                .map(|_| char::from(ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())]))
                .collect();
            if !games.contains_key(&id) && !self.store.contains(&id) {
                return Ok(id);
            }
        }

        Err(anyhow::anyhow!(
            "no free game id of length {length} after {MAX_ID_ATTEMPTS} attempts"
        )
        .into())
    }

    pub fn lookup(&self, id: &str) -> Result<Arc<Game>> {
        self.games
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| ServerError::UnknownGame(id.to_owned()))
    }

    /// Every live game created with `password`, oldest first.
    pub fn lookup_by_password(&self, password: &str) -> Result<Vec<Arc<Game>>> {
        let ids = self
            .by_password
            .read()
            .get(password)
            .cloned()
            .unwrap_or_default();

        let games = self.games.read();
        let found: Vec<_> = ids.iter().filter_map(|id| games.get(id).cloned()).collect();
        if found.is_empty() {
            return Err(ServerError::NoGamesForPassword);
        }
        Ok(found)
    }

    /// Looks a game up and checks that `password` grants control over it.
    pub fn authorize(&self, id: &str, password: &str) -> Result<Arc<Game>> {
        let game = self.lookup(id)?;
        if !game.check_password(password) {
            log::debug!("Rejected password for game {}", id);
            return Err(ServerError::WrongPassword(id.to_owned()));
        }
        Ok(game)
    }

    pub fn clear_cells(
        &self,
        id: &str,
        password: &str,
        coords: &[Coord2],
    ) -> Result<GameStateResponse> {
        let game = self.authorize(id, password)?;
        let options = SnapshotOptions {
            new_cells: true,
            grid: false,
        };

        let (turn, state) = game.reveal_with_state(coords, options)?;
        if turn.game_over {
            self.publish_game_list();
        }
        Ok(state)
    }

    pub fn end_game(&self, id: &str, password: &str) -> Result<GameStateResponse> {
        let game = self.authorize(id, password)?;
        game.end_game()?;
        self.publish_game_list();
        Ok(game.state(SnapshotOptions::default()))
    }

    pub fn game_state(&self, id: &str, verbose: bool) -> Result<GameStateResponse> {
        let options = SnapshotOptions {
            new_cells: false,
            grid: verbose,
        };
        Ok(self.lookup(id)?.state(options))
    }

    pub fn game_list(&self) -> Vec<GameListEntry> {
        let mut games: Vec<_> = self.games.read().values().cloned().collect();
        games.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.id().cmp(b.id()))
        });
        games.iter().map(|game| game.list_entry()).collect()
    }

    pub fn subscribe_game_list(&self, from: u32) -> TurnStream<GameListEvent> {
        self.list.subscribe(from)
    }

    pub fn replay_game_list(&self, from: u32) -> Vec<GameListEvent> {
        self.list.replay(from)
    }

    pub fn len(&self) -> usize {
        self.games.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.read().is_empty()
    }

    /// Lists the games under the broadcaster lock, so the newest revision is never stale.
    ///
    /// Callers must not hold the games map or any game lock.
    fn publish_game_list(&self) {
        self.list.publish_with(|turn| GameListEvent {
            turn,
            games: self.game_list(),
        });
    }

    /// Drops a game from the registry and ends its watcher streams.
    pub fn remove(&self, id: &str) -> Option<Arc<Game>> {
        let removed = self.detach(id);
        if removed.is_some() {
            self.publish_game_list();
        }
        removed
    }

    /// Evicts every game that has been over for longer than the configured TTL.
    pub fn evict_finished(&self, now: OffsetDateTime) -> usize {
        let ttl = self.config.finished_ttl();
        let expired: Vec<String> = self
            .games
            .read()
            .values()
            .filter(|game| game.finished_at().is_some_and(|at| now - at >= ttl))
            .map(|game| game.id().to_owned())
            .collect();

        let evicted = expired
            .iter()
            .filter(|id| self.detach(id.as_str()).is_some())
            .count();
        if evicted > 0 {
            log::info!("Evicted {} finished game(s)", evicted);
            self.publish_game_list();
        }
        evicted
    }

    fn detach(&self, id: &str) -> Option<Arc<Game>> {
        let mut games = self.games.write();
        let game = games.remove(id)?;

        let mut by_password = self.by_password.write();
        by_password.retain(|_, ids| {
            ids.retain(|other| other != id);
            !ids.is_empty()
        });
        drop(by_password);
        drop(games);

        game.close_watchers();
        Some(game)
    }
}
