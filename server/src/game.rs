use parking_lot::Mutex;
use sweepcast_core::*;
use sweepcast_protocol::{GameListEntry, GameStateResponse, SavedConfig, TurnEvent};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::broadcast::{TurnBroadcaster, TurnStream};
use crate::wire;

/// A live game shared between request handlers and watchers.
///
/// All mutation goes through the board lock, and every accepted action is
/// published to the turn log before the lock is released, so the log order is
/// the turn order.
pub struct Game {
    id: String,
    password: String,
    seed: Option<u64>,
    client: Option<String>,
    created_at: OffsetDateTime,
    initial: SavedConfig,
    inner: Mutex<GameInner>,
    turns: TurnBroadcaster<TurnEvent>,
}

struct GameInner {
    board: Board,
    finished_at: Option<OffsetDateTime>,
}

impl Game {
    pub(crate) fn new(
        id: String,
        password: String,
        grid: Grid,
        seed: Option<u64>,
        client: Option<String>,
    ) -> Self {
        Self {
            id,
            password,
            seed,
            client,
            created_at: OffsetDateTime::now_utc(),
            initial: wire::saved_config(&grid),
            inner: Mutex::new(GameInner {
                board: Board::new(grid),
                finished_at: None,
            }),
            turns: TurnBroadcaster::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn client(&self) -> Option<&str> {
        self.client.as_deref()
    }

    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    pub fn check_password(&self, password: &str) -> bool {
        self.password == password
    }

    /// Layout the game started from, as it gets persisted.
    pub fn initial_config(&self) -> &SavedConfig {
        &self.initial
    }

    pub fn game_over(&self) -> bool {
        self.inner.lock().board.game_over()
    }

    pub fn turn(&self) -> TurnNumber {
        self.inner.lock().board.turn()
    }

    pub fn finished_at(&self) -> Option<OffsetDateTime> {
        self.inner.lock().finished_at
    }

    pub fn reveal(&self, coords: &[Coord2]) -> Result<Turn> {
        let mut inner = self.inner.lock();
        self.reveal_locked(&mut inner, coords)
    }

    /// Reveals `coords` and takes a snapshot without letting another action in between.
    pub fn reveal_with_state(
        &self,
        coords: &[Coord2],
        options: SnapshotOptions,
    ) -> Result<(Turn, GameStateResponse)> {
        let mut inner = self.inner.lock();
        let turn = self.reveal_locked(&mut inner, coords)?;
        let state = wire::state_response(&self.id, inner.board.snapshot(options));
        Ok((turn, state))
    }

    fn reveal_locked(&self, inner: &mut GameInner, coords: &[Coord2]) -> Result<Turn> {
        let turn = inner.board.reveal(coords)?;
        log::debug!(
            "game {} turn {}: {} cell(s) revealed, game over: {}, win: {}",
            self.id,
            turn.number,
            turn.cells.len(),
            turn.game_over,
            turn.win
        );
        self.record(inner, &turn);
        Ok(turn)
    }

    /// Ends the game administratively.
    pub fn end_game(&self) -> Result<Turn> {
        let mut inner = self.inner.lock();
        let turn = inner.board.abort()?;
        log::info!(
            "game {} ended at turn {} with {} watcher(s)",
            self.id,
            turn.number,
            self.watcher_count()
        );
        self.record(&mut inner, &turn);
        Ok(turn)
    }

    pub fn state(&self, options: SnapshotOptions) -> GameStateResponse {
        let snapshot = self.inner.lock().board.snapshot(options);
        wire::state_response(&self.id, snapshot)
    }

    /// Current state plus the visible view of one cell.
    pub fn check_cell(&self, coords: Coord2) -> Result<GameStateResponse> {
        let mut inner = self.inner.lock();
        let report = inner.board.check_cell(coords)?;
        let snapshot = inner.board.snapshot(SnapshotOptions::default());
        let mut state = wire::state_response(&self.id, snapshot);
        state.new_cell_data = vec![wire::cell_data(&report)];
        Ok(state)
    }

    pub fn list_entry(&self) -> GameListEntry {
        GameListEntry {
            id: self.id.clone(),
            dims: self.initial.dims,
            mines: self.initial.mines,
            game_over: self.game_over(),
        }
    }

    pub fn subscribe(&self, from: TurnNumber) -> TurnStream<TurnEvent> {
        self.turns.subscribe(from)
    }

    pub fn replay(&self, from: TurnNumber) -> Vec<TurnEvent> {
        self.turns.replay(from)
    }

    pub fn watcher_count(&self) -> usize {
        self.turns.subscriber_count()
    }

    pub(crate) fn close_watchers(&self) {
        self.turns.close();
    }

    fn record(&self, inner: &mut GameInner, turn: &Turn) {
        let now = OffsetDateTime::now_utc();
        if turn.game_over && inner.finished_at.is_none() {
            inner.finished_at = Some(now);
        }

        let taken_at = now.format(&Rfc3339).unwrap_or_default();
        let seq = self.turns.publish(wire::turn_event(turn, taken_at));
        debug_assert_eq!(seq, turn.number);
    }
}

impl std::fmt::Debug for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("id", &self.id)
            .field("seed", &self.seed)
            .field("client", &self.client)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}
