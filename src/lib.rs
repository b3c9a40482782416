mod actuator;
mod engine;
mod error;
mod player;
mod song;
pub mod timing;
mod ui;
mod watch;

pub use actuator::{Actuator, PulseMeter};
pub use engine::{EngineCommand, EngineConfig, EngineHandle, EngineUpdate, spawn_engine};
pub use error::{LibraryError, PlayerError};
pub use player::{Config, Player};
pub use song::{Note, Song, SongLibrary, SongRepository};
pub use ui::PlayerApp;
pub use watch::watch_library;
