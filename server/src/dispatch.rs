//! Request routing: parse an action body, run it against the registry and
//! turn the result into the reply body.

use serde_json::{Map, Value};
use sweepcast_core::{Coord2, SnapshotOptions};
use sweepcast_protocol::{
    ACTIONS, ActionRequest, ActionResponse, GameStateResponse, NewGameRequest,
};

use crate::registry::{CreateOptions, GameRegistry};
use crate::{Result, ServerError, wire};

/// Handles one request body. Never fails, errors become error replies.
pub fn handle_request(registry: &GameRegistry, body: &str) -> ActionResponse {
    match parse_request(body) {
        Ok((request, supplied)) => {
            let action = request.action_name();
            log::debug!("Handling {action}");
            match execute(registry, request) {
                Ok(state) => state.into(),
                Err(err) => {
                    let err = err.in_action(action, &supplied);
                    log::debug!("{action} failed: {err}");
                    err.to_response().into()
                }
            }
        }
        Err(err) => {
            log::debug!("Rejected request: {err}");
            err.to_response().into()
        }
    }
}

/// Parses `body` into an action, also returning the parameters as supplied.
fn parse_request(body: &str) -> Result<(ActionRequest, Value)> {
    let value: Value = serde_json::from_str(body).map_err(ServerError::MalformedRequest)?;
    let Value::Object(mut fields) = value else {
        return Err(ServerError::UnknownAction { requested: None });
    };

    let action = match fields.remove("action") {
        Some(Value::String(action)) => action,
        _ => return Err(ServerError::UnknownAction { requested: None }),
    };
    if !ACTIONS.contains(&action.as_str()) {
        return Err(ServerError::UnknownAction {
            requested: Some(action),
        });
    }

    let supplied = Value::Object(fields.clone());
    let mut tagged = Map::with_capacity(fields.len() + 1);
    tagged.insert("action".to_owned(), Value::String(action.clone()));
    tagged.extend(fields);

    let request = serde_json::from_value(Value::Object(tagged))
        .map_err(|_| ServerError::invalid_parameters(&action, &supplied))?;
    Ok((request, supplied))
}

fn execute(registry: &GameRegistry, request: ActionRequest) -> Result<GameStateResponse> {
    match request {
        ActionRequest::NewGame(req) => {
            let mines = mine_count(&req)?;
            let options = CreateOptions {
                seed: req.seed,
                client: req.client,
            };
            let game = registry.create_game((req.dims[0], req.dims[1]), mines, &req.pass, options)?;
            Ok(game.state(SnapshotOptions::default()))
        }
        ActionRequest::ClearCells(req) => {
            let coords = req
                .coords
                .iter()
                .map(|&coords| wire::coords_from_wire(coords))
                .collect::<sweepcast_core::Result<Vec<Coord2>>>()?;
            registry.clear_cells(&req.id, &req.pass, &coords)
        }
        ActionRequest::LoadGame(req) => {
            let game = registry.load_game(&req.id, &req.pass)?;
            Ok(game.state(SnapshotOptions::default()))
        }
        ActionRequest::GameState(req) => registry.game_state(&req.id, req.verbose),
        ActionRequest::CheckCell(req) => {
            let game = registry.lookup(&req.id)?;
            let coords = wire::coords_from_wire(req.coords)?;
            Ok(game.check_cell(coords)?)
        }
        ActionRequest::EndGame(req) => registry.end_game(&req.id, &req.pass),
    }
}

/// Accepts any integral count, `2.0` included. Fractional or negative counts fail
/// the same way as out of range ones.
fn mine_count(req: &NewGameRequest) -> Result<u64> {
    let integral = req.mines.as_u64().or_else(|| {
        req.mines
            .as_f64()
            .filter(|mines| mines.fract() == 0.0 && *mines >= 0.0)
            .map(|mines| mines as u64)
    });
    integral.ok_or_else(|| ServerError::InvalidMineCount {
        requested: req.mines.clone(),
        min: 1,
        max: req.dims[0].saturating_mul(req.dims[1]).saturating_sub(1),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Config;
    use serde_json::json;
    use sweepcast_protocol::ErrorResponse;

    fn registry() -> GameRegistry {
        GameRegistry::in_memory(Config::default())
    }

    fn call(registry: &GameRegistry, body: Value) -> Value {
        serde_json::to_value(handle_request(registry, &body.to_string())).unwrap()
    }

    #[test]
    fn malformed_json_is_reported() {
        let resp = handle_request(&registry(), "{ nope");

        assert_eq!(
            resp,
            ActionResponse::Error(ErrorResponse::new("malformed JSON request data"))
        );
    }

    #[test]
    fn missing_and_unknown_actions() {
        let registry = registry();

        let missing = call(&registry, json!({ "id": "x" }));
        assert_eq!(missing["error"], "no action specified");
        assert_eq!(missing["info"]["available_actions"], json!(ACTIONS));

        let unknown = call(&registry, json!({ "action": "explode" }));
        assert_eq!(unknown["error"], "unknown action");
        assert_eq!(unknown["info"]["requested_action"], "explode");
    }

    #[test]
    fn missing_parameters_are_described() {
        let resp = call(&registry(), json!({ "action": "clearCells", "id": "x" }));

        assert_eq!(resp["error"], "invalid parameters supplied for action (clearCells)");
        assert_eq!(resp["info"]["supplied_params"], json!({ "id": "x" }));
        assert_eq!(resp["info"]["required_params"]["coords"], "[[int, int], ...]");
    }

    #[test]
    fn new_game_returns_fresh_state() {
        let resp = call(
            &registry(),
            json!({ "action": "newGame", "dims": [4, 3], "mines": 2, "pass": "pw", "seed": 7 }),
        );

        assert_eq!(resp["dims"], json!([4, 3]));
        assert_eq!(resp["mines"], 2);
        assert_eq!(resp["cellsRem"], 10);
        assert_eq!(resp["turn"], 0);
        assert_eq!(resp["gameOver"], false);
        assert_eq!(resp["newCellData"], json!([]));
        assert!(resp.get("grid").is_none());
    }

    #[test]
    fn fractional_or_out_of_range_mines_are_rejected() {
        let registry = registry();

        let fractional = call(
            &registry,
            json!({ "action": "newGame", "dims": [2, 2], "mines": 1.5, "pass": "pw" }),
        );
        assert_eq!(fractional["error"], "invalid number of mines specified (1.5)");
        assert_eq!(fractional["info"]["max_mines"], 3);

        let too_many = call(
            &registry,
            json!({ "action": "newGame", "dims": [2, 2], "mines": 4, "pass": "pw" }),
        );
        assert_eq!(
            too_many["info"],
            json!({ "min_mines": 1, "max_mines": 3, "requested_mines": 4 })
        );

        let negative = call(
            &registry,
            json!({ "action": "newGame", "dims": [2, 2], "mines": -2.0, "pass": "pw" }),
        );
        assert_eq!(negative["error"], "invalid number of mines specified (-2.0)");
        assert!(registry.is_empty());
    }

    #[test]
    fn integral_float_mine_count_is_accepted() {
        let registry = registry();

        let resp = call(
            &registry,
            json!({ "action": "newGame", "dims": [2, 2], "mines": 2.0, "pass": "pw" }),
        );

        assert_eq!(resp.get("error"), None);
        assert_eq!(resp["mines"], 2);
        assert_eq!(resp["cellsRem"], 2);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn bad_dimensions_are_invalid_parameters() {
        let resp = call(
            &registry(),
            json!({ "action": "newGame", "dims": [0, 4], "mines": 1, "pass": "pw" }),
        );

        assert_eq!(resp["error"], "invalid parameters supplied for action (newGame)");
    }

    #[test]
    fn off_board_coordinates_are_invalid_parameters() {
        let registry = registry();
        let game = registry
            .create_game((3, 3), 1, "pw", CreateOptions::default())
            .unwrap();

        let resp = call(
            &registry,
            json!({ "action": "clearCells", "id": game.id(), "pass": "pw", "coords": [[3, 0]] }),
        );

        assert_eq!(resp["error"], "invalid parameters supplied for action (clearCells)");
        assert_eq!(game.turn(), 0);
    }

    #[test]
    fn wrong_password_and_unknown_game() {
        let registry = registry();
        let game = registry
            .create_game((3, 3), 1, "pw", CreateOptions::default())
            .unwrap();

        let wrong = call(
            &registry,
            json!({ "action": "endGame", "id": game.id(), "pass": "guess" }),
        );
        assert_eq!(wrong["error"], format!("wrong password for game ({})", game.id()));

        let unknown = call(&registry, json!({ "action": "gameState", "id": "missing" }));
        assert_eq!(unknown["error"], "unknown game id (missing)");
    }

    #[test]
    fn end_game_then_clear_is_game_over() {
        let registry = registry();
        let game = registry
            .create_game((3, 3), 1, "pw", CreateOptions::default())
            .unwrap();

        let ended = call(
            &registry,
            json!({ "action": "endGame", "id": game.id(), "pass": "pw" }),
        );
        assert_eq!(ended["gameOver"], true);
        assert_eq!(ended["win"], false);
        assert!(ended.get("grid").is_none());

        let verbose = call(
            &registry,
            json!({ "action": "gameState", "id": game.id(), "verbose": true }),
        );
        assert_eq!(verbose["grid"].as_array().map(Vec::len), Some(3));

        let cleared = call(
            &registry,
            json!({ "action": "clearCells", "id": game.id(), "pass": "pw", "coords": [[0, 0]] }),
        );
        assert_eq!(cleared["error"], "game over!");
    }

    #[test]
    fn check_cell_reports_unknown_cells() {
        let registry = registry();
        let game = registry
            .create_game((3, 3), 1, "pw", CreateOptions::default())
            .unwrap();

        let resp = call(
            &registry,
            json!({ "action": "checkCell", "id": game.id(), "coords": [2, 2] }),
        );

        assert_eq!(resp["turn"], 0);
        assert_eq!(
            resp["newCellData"],
            json!([{ "coords": [2, 2], "state": "unknown" }])
        );
    }
}
