pub use config::Config;
pub use dispatch::handle_request;
pub use error::*;
pub use game::Game;
pub use registry::{CreateOptions, GameRegistry};
pub use store::{FileStore, MemoryStore, PersistenceStore};

pub mod broadcast;
mod config;
mod dispatch;
mod error;
mod game;
mod registry;
mod store;
pub mod wire;
