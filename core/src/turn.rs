use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

use crate::*;

/// What a player is allowed to see of a cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisibleState {
    Mine,
    Cleared,
    Unknown,
}

/// A cell as reported back to players and watchers.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellReport {
    pub coords: Coord2,
    pub state: VisibleState,
    /// Only known once the cell is revealed or the game is over.
    pub surrounding: Option<u8>,
}

impl CellReport {
    pub const fn cleared(coords: Coord2, surrounding: u8) -> Self {
        Self {
            coords,
            state: VisibleState::Cleared,
            surrounding: Some(surrounding),
        }
    }

    pub const fn mine(coords: Coord2, surrounding: u8) -> Self {
        Self {
            coords,
            state: VisibleState::Mine,
            surrounding: Some(surrounding),
        }
    }

    pub const fn unknown(coords: Coord2) -> Self {
        Self {
            coords,
            state: VisibleState::Unknown,
            surrounding: None,
        }
    }
}

/// Immutable result of one accepted action, the unit of broadcast and replay.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub number: TurnNumber,
    pub requested: Vec<Coord2>,
    pub cells: Vec<CellReport>,
    pub game_over: bool,
    pub win: bool,
    pub cells_remaining: CellCount,
}
