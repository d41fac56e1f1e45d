use alloc::vec::Vec;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

/// Server-side state of a single cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellState {
    Empty,
    Mine,
    Cleared,
}

impl CellState {
    /// Numeric code used by saved layouts and exposed grids.
    pub const fn code(self) -> u8 {
        match self {
            Self::Empty => 0,
            Self::Mine => 1,
            Self::Cleared => 2,
        }
    }

    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Empty),
            1 => Some(Self::Mine),
            2 => Some(Self::Cleared),
            _ => None,
        }
    }

    pub const fn is_mine(self) -> bool {
        matches!(self, Self::Mine)
    }
}

impl Default for CellState {
    fn default() -> Self {
        Self::Empty
    }
}

/// Fixed-size board of cell states, indexed `[x, y]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    cells: Array2<CellState>,
    mine_count: CellCount,
}

impl Grid {
    pub fn from_mine_mask(mine_mask: &Array2<bool>) -> Self {
        let cells = mine_mask.mapv(|is_mine| {
            if is_mine {
                CellState::Mine
            } else {
                CellState::Empty
            }
        });
        Self::from_cells(cells)
    }

    pub fn from_mine_coords(size: Coord2, mine_coords: &[Coord2]) -> Result<Self> {
        check_size(size)?;
        let mut cells: Array2<CellState> = Array2::default(size.to_nd_index());

        for &coords in mine_coords {
            if coords.0 >= size.0 || coords.1 >= size.1 {
                return Err(GameError::InvalidCoords);
            }
            cells[coords.to_nd_index()] = CellState::Mine;
        }

        Ok(Self::from_cells(cells))
    }

    /// Rebuilds a grid from a flat row-major list of cell states.
    pub fn from_layout(size: Coord2, layout: Vec<CellState>) -> Result<Self> {
        check_size(size)?;
        let cells = Array2::from_shape_vec(size.to_nd_index(), layout)
            .map_err(|_| GameError::InvalidBoardShape)?;
        Ok(Self::from_cells(cells))
    }

    fn from_cells(cells: Array2<CellState>) -> Self {
        let mine_count = cells
            .iter()
            .filter(|cell| cell.is_mine())
            .count()
            .try_into()
            .unwrap_or(CellCount::MAX);
        Self { cells, mine_count }
    }

    pub fn size(&self) -> Coord2 {
        let (x, y) = self.cells.dim();
        // construction only accepts sides that fit in a `Coord`
        (x as Coord, y as Coord)
    }

    pub fn total_cells(&self) -> CellCount {
        let (x, y) = self.size();
        mult(x, y)
    }

    pub fn mine_count(&self) -> CellCount {
        self.mine_count
    }

    pub fn empty_count(&self) -> CellCount {
        self.total_cells() - self.mine_count
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        let size = self.size();
        if coords.0 < size.0 && coords.1 < size.1 {
            Ok(coords)
        } else {
            Err(GameError::InvalidCoords)
        }
    }

    pub fn neighbors(&self, coords: Coord2) -> NeighborIter {
        neighbors(coords, self.size())
    }

    pub fn state_at(&self, coords: Coord2) -> CellState {
        self.cells[coords.to_nd_index()]
    }

    pub fn set_cleared(&mut self, coords: Coord2) -> Result<()> {
        let cell = &mut self.cells[coords.to_nd_index()];
        match *cell {
            CellState::Mine => Err(GameError::ClearedMine),
            CellState::Empty | CellState::Cleared => {
                *cell = CellState::Cleared;
                Ok(())
            }
        }
    }

    pub fn mine_count_around(&self, coords: Coord2) -> u8 {
        // at most eight neighbors
        self.neighbors(coords)
            .filter(|&pos| self.state_at(pos).is_mine())
            .count() as u8
    }

    /// Current cell states, flattened row-major.
    pub fn layout(&self) -> Vec<CellState> {
        self.cells.iter().copied().collect()
    }

    /// Cell states as they were before anything was cleared.
    pub fn initial_layout(&self) -> Vec<CellState> {
        self.cells
            .iter()
            .map(|&cell| match cell {
                CellState::Cleared => CellState::Empty,
                other => other,
            })
            .collect()
    }
}

fn check_size(size: Coord2) -> Result<()> {
    if size.0 == 0 || size.1 == 0 {
        Err(GameError::InvalidDims)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn counts_mines_around_cells() {
        let grid = Grid::from_mine_coords((3, 3), &[(0, 0), (2, 2)]).unwrap();

        assert_eq!(grid.mine_count(), 2);
        assert_eq!(grid.empty_count(), 7);
        assert_eq!(grid.mine_count_around((1, 1)), 2);
        assert_eq!(grid.mine_count_around((2, 0)), 0);
        assert_eq!(grid.mine_count_around((1, 0)), 1);
    }

    #[test]
    fn clearing_a_mine_is_rejected() {
        let mut grid = Grid::from_mine_coords((2, 1), &[(0, 0)]).unwrap();

        assert_eq!(grid.set_cleared((0, 0)), Err(GameError::ClearedMine));
        assert_eq!(grid.state_at((0, 0)), CellState::Mine);
        assert_eq!(grid.set_cleared((1, 0)), Ok(()));
        assert_eq!(grid.state_at((1, 0)), CellState::Cleared);
    }

    #[test]
    fn layout_is_row_major_and_round_trips() {
        let mut grid = Grid::from_mine_coords((2, 3), &[(1, 0)]).unwrap();
        grid.set_cleared((0, 2)).unwrap();

        let layout = grid.layout();
        assert_eq!(layout.len(), 6);
        // index = x * height + y
        assert_eq!(layout[3], CellState::Mine);
        assert_eq!(layout[2], CellState::Cleared);
        assert_eq!(grid.initial_layout()[2], CellState::Empty);

        let rebuilt = Grid::from_layout((2, 3), layout).unwrap();
        assert_eq!(rebuilt, grid);
    }

    #[test]
    fn from_layout_rejects_mismatched_shape() {
        let cells = vec![CellState::Empty; 5];

        assert_eq!(
            Grid::from_layout((2, 3), cells),
            Err(GameError::InvalidBoardShape)
        );
    }

    #[test]
    fn rejects_zero_sized_boards() {
        assert_eq!(
            Grid::from_mine_coords((0, 3), &[]),
            Err(GameError::InvalidDims)
        );
    }

    #[test]
    fn codes_match_saved_format() {
        for state in [CellState::Empty, CellState::Mine, CellState::Cleared] {
            assert_eq!(CellState::from_code(state.code()), Some(state));
        }
        assert_eq!(CellState::from_code(7), None);
    }
}
