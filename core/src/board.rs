use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

use crate::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoardState {
    Active,
    Won,
    Lost,
    /// Ended administratively, nothing was revealed.
    Aborted,
}

impl BoardState {
    pub const fn is_finished(self) -> bool {
        !matches!(self, Self::Active)
    }

    pub const fn is_win(self) -> bool {
        matches!(self, Self::Won)
    }
}

impl Default for BoardState {
    fn default() -> Self {
        Self::Active
    }
}

/// What to include in a [`BoardSnapshot`] besides the counters.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SnapshotOptions {
    /// Hand over the latest turn's cell reports, then forget them.
    pub new_cells: bool,
    /// Include the raw grid, honoured only once the game is over.
    pub grid: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub size: Coord2,
    pub mines: CellCount,
    pub cells_remaining: CellCount,
    pub game_over: bool,
    pub win: bool,
    pub turn: TurnNumber,
    pub new_cells: Vec<CellReport>,
    pub grid: Option<Vec<CellState>>,
}

/// A single game's state machine. Not synchronized, callers wrap it in a lock.
#[derive(Clone, Debug)]
pub struct Board {
    grid: Grid,
    cells_remaining: CellCount,
    state: BoardState,
    turn: TurnNumber,
    last_cells: Vec<CellReport>,
    engine: RevealEngine,
}

impl Board {
    pub fn new(grid: Grid) -> Self {
        Self {
            cells_remaining: grid.empty_count(),
            grid,
            state: BoardState::default(),
            turn: 0,
            last_cells: Vec::new(),
            engine: RevealEngine::new(),
        }
    }

    pub fn state(&self) -> BoardState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    pub fn game_over(&self) -> bool {
        self.state.is_finished()
    }

    pub fn win(&self) -> bool {
        self.state.is_win()
    }

    pub fn size(&self) -> Coord2 {
        self.grid.size()
    }

    pub fn total_mines(&self) -> CellCount {
        self.grid.mine_count()
    }

    pub fn cells_remaining(&self) -> CellCount {
        self.cells_remaining
    }

    pub fn turn(&self) -> TurnNumber {
        self.turn
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Reveals `coords`, cascading through zero cells, and records a turn.
    ///
    /// Nothing changes when the game is already over or any coordinate is off
    /// the board.
    pub fn reveal(&mut self, coords: &[Coord2]) -> Result<Turn> {
        self.check_not_finished()?;

        let reveal = self
            .engine
            .run(&mut self.grid, coords, self.cells_remaining)?;
        self.cells_remaining = reveal.cells_remaining;

        match reveal.outcome {
            RevealOutcome::HitMine => self.end_game(BoardState::Lost),
            RevealOutcome::Won => self.end_game(BoardState::Won),
            RevealOutcome::Revealed | RevealOutcome::NoChange => {}
        }

        Ok(self.record_turn(coords.to_vec(), reveal.cells))
    }

    /// Ends the game without revealing anything.
    pub fn abort(&mut self) -> Result<Turn> {
        self.check_not_finished()?;
        self.end_game(BoardState::Aborted);
        Ok(self.record_turn(Vec::new(), Vec::new()))
    }

    /// The player-visible view of one cell, without changing anything.
    pub fn check_cell(&self, coords: Coord2) -> Result<CellReport> {
        let coords = self.grid.validate_coords(coords)?;
        Ok(self.visible_cell(coords))
    }

    pub fn visible_cell(&self, coords: Coord2) -> CellReport {
        let surrounding = self.grid.mine_count_around(coords);
        match (self.grid.state_at(coords), self.is_finished()) {
            (CellState::Cleared, _) => CellReport::cleared(coords, surrounding),
            (CellState::Mine, true) => CellReport::mine(coords, surrounding),
            (CellState::Empty, true) => CellReport {
                surrounding: Some(surrounding),
                ..CellReport::unknown(coords)
            },
            (_, false) => CellReport::unknown(coords),
        }
    }

    pub fn snapshot(&mut self, options: SnapshotOptions) -> BoardSnapshot {
        let new_cells = if options.new_cells {
            core::mem::take(&mut self.last_cells)
        } else {
            Vec::new()
        };
        let grid = (options.grid && self.is_finished()).then(|| self.grid.layout());

        BoardSnapshot {
            size: self.size(),
            mines: self.total_mines(),
            cells_remaining: self.cells_remaining,
            game_over: self.game_over(),
            win: self.win(),
            turn: self.turn,
            new_cells,
            grid,
        }
    }

    fn record_turn(&mut self, requested: Vec<Coord2>, cells: Vec<CellReport>) -> Turn {
        self.turn += 1;
        self.last_cells.clone_from(&cells);

        Turn {
            number: self.turn,
            requested,
            cells,
            game_over: self.game_over(),
            win: self.win(),
            cells_remaining: self.cells_remaining,
        }
    }

    fn end_game(&mut self, state: BoardState) {
        if self.state.is_finished() {
            return;
        }
        self.state = state;
    }

    fn check_not_finished(&self) -> Result<()> {
        if self.state.is_finished() {
            Err(GameError::AlreadyEnded)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(size: Coord2, mines: &[Coord2]) -> Board {
        Board::new(Grid::from_mine_coords(size, mines).unwrap())
    }

    #[test]
    fn new_board_counts_empty_cells() {
        let board = board((4, 3), &[(0, 0), (3, 2)]);

        assert_eq!(board.cells_remaining(), 10);
        assert!(!board.game_over());
        assert!(!board.win());
        assert_eq!(board.turn(), 0);
    }

    #[test]
    fn hitting_a_mine_loses() {
        let mut board = board((2, 2), &[(0, 0)]);

        let turn = board.reveal(&[(0, 0)]).unwrap();

        assert_eq!(board.state(), BoardState::Lost);
        assert!(turn.game_over);
        assert!(!turn.win);
        assert_eq!(turn.cells, [CellReport::mine((0, 0), 0)]);
        assert_eq!(board.grid().state_at((0, 0)), CellState::Mine);
        assert_eq!(board.cells_remaining(), 3);
    }

    #[test]
    fn clearing_last_empty_cell_wins() {
        let mut board = board((2, 1), &[(0, 0)]);

        let turn = board.reveal(&[(1, 0)]).unwrap();

        assert_eq!(board.state(), BoardState::Won);
        assert!(turn.game_over && turn.win);
        assert_eq!(turn.cells_remaining, 0);
    }

    #[test]
    fn re_revealing_cleared_cell_only_advances_turn() {
        let mut board = board((2, 2), &[(1, 1)]);
        board.reveal(&[(0, 0)]).unwrap();

        let turn = board.reveal(&[(0, 0)]).unwrap();

        assert_eq!(turn.number, 2);
        assert!(turn.cells.is_empty());
        assert_eq!(board.cells_remaining(), 2);
        assert!(!board.game_over());
    }

    #[test]
    fn finished_board_rejects_moves() {
        let mut board = board((2, 2), &[(0, 0)]);
        board.reveal(&[(0, 0)]).unwrap();

        assert_eq!(board.reveal(&[(1, 1)]), Err(GameError::AlreadyEnded));
        assert_eq!(board.abort(), Err(GameError::AlreadyEnded));
        assert_eq!(board.turn(), 1);
    }

    #[test]
    fn invalid_coords_leave_board_untouched() {
        let mut board = board((2, 2), &[(0, 0)]);

        assert_eq!(board.reveal(&[(1, 1), (5, 5)]), Err(GameError::InvalidCoords));
        assert_eq!(board.turn(), 0);
        assert_eq!(board.cells_remaining(), 3);
    }

    #[test]
    fn abort_ends_without_revealing() {
        let mut board = board((3, 3), &[(1, 1)]);

        let turn = board.abort().unwrap();

        assert_eq!(board.state(), BoardState::Aborted);
        assert!(turn.game_over && !turn.win);
        assert!(turn.cells.is_empty());
        assert_eq!(board.cells_remaining(), 8);
    }

    #[test]
    fn new_cells_are_delivered_once() {
        let mut board = board((2, 2), &[(1, 1)]);
        board.reveal(&[(0, 0)]).unwrap();

        let with_cells = SnapshotOptions {
            new_cells: true,
            grid: false,
        };
        let first = board.snapshot(with_cells);
        let second = board.snapshot(with_cells);

        assert_eq!(first.new_cells, [CellReport::cleared((0, 0), 1)]);
        assert!(second.new_cells.is_empty());
    }

    #[test]
    fn grid_is_hidden_until_game_over() {
        let mut board = board((2, 2), &[(1, 1)]);
        let with_grid = SnapshotOptions {
            new_cells: false,
            grid: true,
        };

        assert_eq!(board.snapshot(with_grid).grid, None);

        board.reveal(&[(1, 1)]).unwrap();
        let grid = board.snapshot(with_grid).grid.unwrap();
        assert_eq!(grid[3], CellState::Mine);
    }

    #[test]
    fn check_cell_hides_state_until_game_over() {
        let mut board = board((2, 2), &[(1, 1)]);

        assert_eq!(board.check_cell((1, 1)), Ok(CellReport::unknown((1, 1))));
        assert_eq!(board.check_cell((2, 0)), Err(GameError::InvalidCoords));

        board.reveal(&[(0, 0)]).unwrap();
        assert_eq!(board.check_cell((0, 0)), Ok(CellReport::cleared((0, 0), 1)));

        board.abort().unwrap();
        assert_eq!(board.check_cell((1, 1)), Ok(CellReport::mine((1, 1), 0)));
        assert_eq!(board.check_cell((1, 0)).unwrap().surrounding, Some(1));
    }
}
