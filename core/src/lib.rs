#![no_std]

extern crate alloc;

use serde::{Deserialize, Serialize};

pub use board::*;
pub use error::*;
pub use generator::*;
pub use grid::*;
pub use reveal::*;
pub use turn::*;
pub use types::*;

mod board;
mod error;
mod generator;
mod grid;
mod reveal;
mod turn;
mod types;

/// Board dimensions and mine count of a game, validated on construction.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    pub size: Coord2,
    pub mines: CellCount,
}

impl GameConfig {
    pub const fn new_unchecked(size: Coord2, mines: CellCount) -> Self {
        Self { size, mines }
    }

    /// Checks that both sides fit a [`Coord`] and that `0 < mines < width * height`.
    pub fn try_new((size_x, size_y): (u64, u64), mines: u64) -> Result<Self> {
        let size_x = Coord::try_from(size_x).map_err(|_| GameError::InvalidDims)?;
        let size_y = Coord::try_from(size_y).map_err(|_| GameError::InvalidDims)?;
        if size_x == 0 || size_y == 0 {
            return Err(GameError::InvalidDims);
        }

        let max = u64::from(mult(size_x, size_y)) - 1;
        if mines < 1 || mines > max {
            return Err(GameError::InvalidMineCount {
                requested: mines,
                min: 1,
                max,
            });
        }

        // bounded by `max`, which fits a `CellCount`
        Ok(Self::new_unchecked((size_x, size_y), mines as CellCount))
    }

    pub const fn total_cells(&self) -> CellCount {
        mult(self.size.0, self.size.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_mines_strictly_inside_range() {
        let config = GameConfig::try_new((2, 2), 3).unwrap();

        assert_eq!(config.size, (2, 2));
        assert_eq!(config.mines, 3);
        assert_eq!(config.total_cells(), 4);
    }

    #[test]
    fn rejects_out_of_range_mine_counts() {
        let expected = |requested| GameError::InvalidMineCount {
            requested,
            min: 1,
            max: 3,
        };

        assert_eq!(GameConfig::try_new((2, 2), 0), Err(expected(0)));
        assert_eq!(GameConfig::try_new((2, 2), 4), Err(expected(4)));
    }

    #[test]
    fn rejects_bad_dimensions() {
        assert_eq!(GameConfig::try_new((0, 5), 1), Err(GameError::InvalidDims));
        assert_eq!(GameConfig::try_new((256, 5), 1), Err(GameError::InvalidDims));
    }

    #[test]
    fn single_cell_board_cannot_hold_a_mine() {
        assert!(matches!(
            GameConfig::try_new((1, 1), 1),
            Err(GameError::InvalidMineCount { max: 0, .. })
        ));
    }
}
