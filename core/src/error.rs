use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid coordinates")]
    InvalidCoords,
    #[error("Invalid board dimensions, each side must be between 1 and 255")]
    InvalidDims,
    #[error("Invalid number of mines ({requested}), must be between {min} and {max}")]
    InvalidMineCount { requested: u64, min: u64, max: u64 },
    #[error("Board shape does not match declared size")]
    InvalidBoardShape,
    #[error("Attempted to clear a cell that holds a mine")]
    ClearedMine,
    #[error("Game already ended, no new moves are accepted")]
    AlreadyEnded,
}

pub type Result<T> = core::result::Result<T, GameError>;
