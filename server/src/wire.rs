//! Conversions between board types and their wire representation.

use sweepcast_core::*;
use sweepcast_protocol::{
    CellData, CellDataState, GameStateResponse, SavedConfig, TurnEvent, WireCoords,
};

use crate::StoreError;

pub fn coords_from_wire([x, y]: WireCoords) -> Result<Coord2> {
    let x = Coord::try_from(x).map_err(|_| GameError::InvalidCoords)?;
    let y = Coord::try_from(y).map_err(|_| GameError::InvalidCoords)?;
    Ok((x, y))
}

pub fn coords_to_wire((x, y): Coord2) -> WireCoords {
    [x.into(), y.into()]
}

pub fn cell_data(report: &CellReport) -> CellData {
    CellData {
        coords: coords_to_wire(report.coords),
        state: match report.state {
            VisibleState::Mine => CellDataState::Mine,
            VisibleState::Cleared => CellDataState::Cleared,
            VisibleState::Unknown => CellDataState::Unknown,
        },
        surrounding: report.surrounding,
    }
}

pub fn turn_event(turn: &Turn, taken_at: String) -> TurnEvent {
    TurnEvent {
        turn: turn.number,
        new_cell_data: turn.cells.iter().map(cell_data).collect(),
        game_over: turn.game_over,
        win: turn.win,
        cells_rem: turn.cells_remaining.into(),
        clear_req: turn.requested.iter().copied().map(coords_to_wire).collect(),
        taken_at,
    }
}

pub fn state_response(id: &str, snapshot: BoardSnapshot) -> GameStateResponse {
    let grid = snapshot
        .grid
        .map(|layout| grid_rows(snapshot.size, &layout));

    GameStateResponse {
        id: id.to_owned(),
        game_over: snapshot.game_over,
        win: snapshot.win,
        dims: coords_to_wire(snapshot.size),
        mines: snapshot.mines.into(),
        cells_rem: snapshot.cells_remaining.into(),
        turn: snapshot.turn,
        new_cell_data: snapshot.new_cells.iter().map(cell_data).collect(),
        grid,
    }
}

/// Splits a row-major layout into one column of codes per `x`.
fn grid_rows((_, height): Coord2, layout: &[CellState]) -> Vec<Vec<u8>> {
    layout
        .chunks(usize::from(height).max(1))
        .map(|column| column.iter().map(|cell| cell.code()).collect())
        .collect()
}

pub fn saved_config(grid: &Grid) -> SavedConfig {
    SavedConfig {
        dims: coords_to_wire(grid.size()),
        mines: grid.mine_count().into(),
        grid_array: grid
            .initial_layout()
            .into_iter()
            .map(CellState::code)
            .collect(),
    }
}

pub fn grid_from_saved(saved: &SavedConfig) -> std::result::Result<Grid, StoreError> {
    let size = coords_from_wire(saved.dims).map_err(|_| GameError::InvalidDims)?;
    let layout = saved
        .grid_array
        .iter()
        .map(|&code| match CellState::from_code(code) {
            Some(CellState::Cleared) | None => Err(GameError::InvalidBoardShape),
            Some(state) => Ok(state),
        })
        .collect::<Result<Vec<_>>>()?;

    let grid = Grid::from_layout(size, layout)?;
    if u32::from(grid.mine_count()) != saved.mines {
        return Err(GameError::InvalidBoardShape.into());
    }
    if grid.mine_count() == 0 || grid.empty_count() == 0 {
        return Err(GameError::InvalidMineCount {
            requested: grid.mine_count().into(),
            min: 1,
            max: u64::from(grid.total_cells()) - 1,
        }
        .into());
    }
    Ok(grid)
}
