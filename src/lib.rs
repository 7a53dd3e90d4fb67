pub mod error;
pub mod field;
pub mod gamemode;
pub mod mods;
pub mod codec;
pub mod events;
pub mod replay;
pub mod decoder;

pub use error::{ReplayError, Result};
pub use gamemode::GameMode;
pub use mods::{Mod, Mods};
pub use events::ReplayEvent;
pub use replay::{Accuracy, ReplayRecord};
pub use decoder::{decode, decode_with, open_replay, save_replay, DecodeOptions, TrailerPolicy};
