//! JSON shapes exchanged between the game server and its clients.
//!
//! Field names follow the wire format (`cellsRem`, `newCellData`, ...), the Rust
//! side stays snake case.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// Board coordinates on the wire, `[x, y]`.
pub type WireCoords = [u32; 2];

/// Every action name accepted in the `action` field.
pub const ACTIONS: [&str; 6] = [
    "newGame",
    "clearCells",
    "loadGame",
    "gameState",
    "checkCell",
    "endGame",
];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ActionRequest {
    NewGame(NewGameRequest),
    ClearCells(ClearCellsRequest),
    LoadGame(LoadGameRequest),
    GameState(GameStateRequest),
    CheckCell(CheckCellRequest),
    EndGame(EndGameRequest),
}

impl ActionRequest {
    pub fn action_name(&self) -> &'static str {
        match self {
            Self::NewGame(_) => "newGame",
            Self::ClearCells(_) => "clearCells",
            Self::LoadGame(_) => "loadGame",
            Self::GameState(_) => "gameState",
            Self::CheckCell(_) => "checkCell",
            Self::EndGame(_) => "endGame",
        }
    }

    /// Human readable parameter list of `action`, for error reports.
    pub fn required_params(action: &str) -> Option<Value> {
        let params = match action {
            "newGame" => serde_json::json!({
                "dims": "[positive int, positive int]",
                "mines": "positive int",
                "pass": "string",
                "seed": "optional u64",
                "client": "optional string",
            }),
            "clearCells" => serde_json::json!({
                "id": "string",
                "pass": "string",
                "coords": "[[int, int], ...]",
            }),
            "loadGame" => serde_json::json!({ "id": "string", "pass": "string" }),
            "gameState" => serde_json::json!({ "id": "string", "verbose": "optional bool" }),
            "checkCell" => serde_json::json!({ "id": "string", "coords": "[int, int]" }),
            "endGame" => serde_json::json!({ "id": "string", "pass": "string" }),
            _ => return None,
        };
        Some(params)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewGameRequest {
    pub dims: [u64; 2],
    /// Kept as a raw number so fractional or negative counts reach mine-count validation.
    pub mines: Number,
    pub pass: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearCellsRequest {
    pub id: String,
    pub pass: String,
    pub coords: Vec<WireCoords>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadGameRequest {
    pub id: String,
    pub pass: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStateRequest {
    pub id: String,
    #[serde(default)]
    pub verbose: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckCellRequest {
    pub id: String,
    pub coords: WireCoords,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndGameRequest {
    pub id: String,
    pub pass: String,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellDataState {
    Mine,
    Cleared,
    Unknown,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellData {
    pub coords: WireCoords,
    pub state: CellDataState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surrounding: Option<u8>,
}

/// Successful reply to any action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStateResponse {
    pub id: String,
    pub game_over: bool,
    pub win: bool,
    pub dims: WireCoords,
    pub mines: u32,
    pub cells_rem: u32,
    pub turn: u32,
    pub new_cell_data: Vec<CellData>,
    /// Cell codes indexed `[x][y]`: 0 empty, 1 mine, 2 cleared. Only once the game is over.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid: Option<Vec<Vec<u8>>>,
}

/// Failed reply to any action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<Value>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            info: None,
        }
    }

    pub fn with_info(error: impl Into<String>, info: Value) -> Self {
        Self {
            error: error.into(),
            info: Some(info),
        }
    }
}

/// Reply body of an action, either a game state or an error.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionResponse {
    State(GameStateResponse),
    Error(ErrorResponse),
}

impl ActionResponse {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

impl From<GameStateResponse> for ActionResponse {
    fn from(state: GameStateResponse) -> Self {
        Self::State(state)
    }
}

impl From<ErrorResponse> for ActionResponse {
    fn from(error: ErrorResponse) -> Self {
        Self::Error(error)
    }
}

/// One broadcast turn of a single game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnEvent {
    pub turn: u32,
    pub new_cell_data: Vec<CellData>,
    pub game_over: bool,
    pub win: bool,
    pub cells_rem: u32,
    pub clear_req: Vec<WireCoords>,
    /// RFC 3339 timestamp.
    pub taken_at: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameListEntry {
    pub id: String,
    pub dims: WireCoords,
    pub mines: u32,
    pub game_over: bool,
}

/// One broadcast revision of the list of live games.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameListEvent {
    pub turn: u32,
    pub games: Vec<GameListEntry>,
}

/// Initial layout of a game as written to persistent storage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedConfig {
    pub dims: WireCoords,
    pub mines: u32,
    /// Row-major cell codes, 0 empty and 1 mine.
    pub grid_array: Vec<u8>,
}
