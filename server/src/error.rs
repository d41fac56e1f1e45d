use serde_json::{Number, Value, json};
use sweepcast_core::GameError;
use sweepcast_protocol::{ACTIONS, ActionRequest, ErrorResponse};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("no saved game with id ({0})")]
    NotFound(String),
    #[error("storage i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("saved game is not valid JSON: {0}")]
    Format(#[from] serde_json::Error),
    #[error("saved layout is unusable: {0}")]
    Layout(#[from] GameError),
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("malformed JSON request data")]
    MalformedRequest(#[source] serde_json::Error),
    #[error("invalid parameters supplied for action ({action})")]
    InvalidParameters {
        action: String,
        required: Value,
        supplied: Value,
    },
    /// A request that parsed but was rejected by the board, e.g. off-board coordinates.
    #[error("{0}")]
    InvalidInput(GameError),
    #[error("unknown action")]
    UnknownAction { requested: Option<String> },
    #[error("unknown game id ({0})")]
    UnknownGame(String),
    #[error("wrong password for game ({0})")]
    WrongPassword(String),
    #[error("game over!")]
    GameOver,
    #[error("invalid number of mines specified ({requested})")]
    InvalidMineCount {
        requested: Number,
        min: u64,
        max: u64,
    },
    #[error("no games found for this password")]
    NoGamesForPassword,
    #[error("no saved game with id ({0})")]
    NotFound(String),
    #[error("storage failure")]
    Store(#[source] StoreError),
    #[error("unknown error")]
    Unknown(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ServerError>;

impl From<GameError> for ServerError {
    fn from(err: GameError) -> Self {
        match err {
            GameError::AlreadyEnded => Self::GameOver,
            GameError::InvalidMineCount {
                requested,
                min,
                max,
            } => Self::InvalidMineCount {
                requested: requested.into(),
                min,
                max,
            },
            GameError::InvalidCoords | GameError::InvalidDims => Self::InvalidInput(err),
            GameError::InvalidBoardShape | GameError::ClearedMine => {
                Self::Unknown(anyhow::Error::new(err))
            }
        }
    }
}

impl From<StoreError> for ServerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Self::NotFound(id),
            other => Self::Store(other),
        }
    }
}

impl ServerError {
    /// Attaches the action's parameter description to input errors.
    pub fn in_action(self, action: &str, supplied: &Value) -> Self {
        match self {
            Self::InvalidInput(_) => Self::invalid_parameters(action, supplied),
            other => other,
        }
    }

    pub fn invalid_parameters(action: &str, supplied: &Value) -> Self {
        Self::InvalidParameters {
            action: action.to_owned(),
            required: ActionRequest::required_params(action).unwrap_or(Value::Null),
            supplied: supplied.clone(),
        }
    }

    /// Converts the error into the body sent back to the client.
    ///
    /// Failures nobody anticipated are logged here in full and reported only
    /// as a generic message.
    pub fn to_response(&self) -> ErrorResponse {
        match self {
            Self::InvalidParameters {
                required, supplied, ..
            } => ErrorResponse::with_info(
                self.to_string(),
                json!({ "required_params": required, "supplied_params": supplied }),
            ),
            Self::UnknownAction { requested: None } => ErrorResponse::with_info(
                "no action specified",
                json!({ "available_actions": ACTIONS }),
            ),
            Self::UnknownAction {
                requested: Some(requested),
            } => ErrorResponse::with_info(
                self.to_string(),
                json!({ "requested_action": requested, "available_actions": ACTIONS }),
            ),
            Self::InvalidMineCount {
                requested,
                min,
                max,
            } => ErrorResponse::with_info(
                self.to_string(),
                json!({ "min_mines": min, "max_mines": max, "requested_mines": requested }),
            ),
            Self::Store(_) | Self::Unknown(_) => {
                log::error!("Unhandled error: {self:?}");
                ErrorResponse::new("unknown error")
            }
            Self::MalformedRequest(_)
            | Self::InvalidInput(_)
            | Self::UnknownGame(_)
            | Self::WrongPassword(_)
            | Self::GameOver
            | Self::NoGamesForPassword
            | Self::NotFound(_) => ErrorResponse::new(self.to_string()),
        }
    }
}
