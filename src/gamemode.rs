use serde::Serialize;
use std::fmt;

use crate::error::{ReplayError, Result};

/// Ruleset a replay was played under.  The wire value is the first byte of
/// every replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum GameMode {
    Standard = 0,
    Taiko    = 1,
    Catch    = 2,
    Mania    = 3,
}

impl GameMode {
    pub const ALL: [GameMode; 4] = [GameMode::Standard, GameMode::Taiko, GameMode::Catch, GameMode::Mania];

    pub fn from_raw(raw: u8) -> Result<Self> {
        match raw {
            0 => Ok(GameMode::Standard),
            1 => Ok(GameMode::Taiko),
            2 => Ok(GameMode::Catch),
            3 => Ok(GameMode::Mania),
            _ => Err(ReplayError::InvalidModeValue(raw)),
        }
    }

    #[inline]
    pub fn raw(self) -> u8 {
        self as u8
    }

    /// Client-style display name.
    pub fn name(self) -> &'static str {
        match self {
            GameMode::Standard => "osu!std",
            GameMode::Taiko    => "osu!taiko",
            GameMode::Catch    => "osu!catch",
            GameMode::Mania    => "osu!mania",
        }
    }
}

impl TryFrom<u8> for GameMode {
    type Error = ReplayError;

    fn try_from(raw: u8) -> Result<Self> {
        GameMode::from_raw(raw)
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_values_round_trip() {
        for mode in GameMode::ALL {
            assert_eq!(GameMode::from_raw(mode.raw()).unwrap(), mode);
        }
    }

    #[test]
    fn out_of_range_rejected() {
        for raw in 4..=u8::MAX {
            assert!(matches!(GameMode::from_raw(raw), Err(ReplayError::InvalidModeValue(v)) if v == raw));
        }
    }

    #[test]
    fn display_names() {
        assert_eq!(GameMode::Mania.to_string(), "osu!mania");
        assert_eq!(GameMode::Standard.to_string(), "osu!std");
    }
}
