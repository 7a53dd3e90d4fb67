//! Gameplay modifier bitset.
//!
//! Each [`Mod`] is a single bit of the 32-bit value stored in the replay
//! header, except [`Mod::NoMod`], which is the zero test.  Bits 0..=30 are
//! all named; anything above is rejected by [`Mods::from_raw`] so that a
//! replay written by a future client with unknown modifiers fails loudly
//! instead of being scored under the wrong rules.

use serde::{Serialize, Serializer};
use std::fmt;

use crate::error::{ReplayError, Result};

// ── Mod flags ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Mod {
    NoMod          = 0,
    NoFail         = 1 << 0,
    Easy           = 1 << 1,
    NoVideo        = 1 << 2,
    Hidden         = 1 << 3,
    HardRock       = 1 << 4,
    SuddenDeath    = 1 << 5,
    DoubleTime     = 1 << 6,
    Relax          = 1 << 7,
    HalfTime       = 1 << 8,
    Nightcore      = 1 << 9,
    Flashlight     = 1 << 10,
    Autoplay       = 1 << 11,
    SpunOut        = 1 << 12,
    Autopilot      = 1 << 13,
    Perfect        = 1 << 14,
    Key4           = 1 << 15,
    Key5           = 1 << 16,
    Key6           = 1 << 17,
    Key7           = 1 << 18,
    Key8           = 1 << 19,
    FadeIn         = 1 << 20,
    Random         = 1 << 21,
    LastMod        = 1 << 22,
    TargetPractice = 1 << 23,
    Key9           = 1 << 24,
    Coop           = 1 << 25,
    Key1           = 1 << 26,
    Key3           = 1 << 27,
    Key2           = 1 << 28,
    ScoreV2        = 1 << 29,
    Mirror         = 1 << 30,
}

impl Mod {
    /// Every single-bit flag, in bit order.
    pub const ALL: [Mod; 31] = [
        Mod::NoFail, Mod::Easy, Mod::NoVideo, Mod::Hidden, Mod::HardRock,
        Mod::SuddenDeath, Mod::DoubleTime, Mod::Relax, Mod::HalfTime,
        Mod::Nightcore, Mod::Flashlight, Mod::Autoplay, Mod::SpunOut,
        Mod::Autopilot, Mod::Perfect, Mod::Key4, Mod::Key5, Mod::Key6,
        Mod::Key7, Mod::Key8, Mod::FadeIn, Mod::Random, Mod::LastMod,
        Mod::TargetPractice, Mod::Key9, Mod::Coop, Mod::Key1, Mod::Key3,
        Mod::Key2, Mod::ScoreV2, Mod::Mirror,
    ];

    /// Union of every named bit.
    pub const KNOWN_BITS: u32 = (1 << 31) - 1;

    /// Key4..=Key8, the client's legacy "key mod" group.
    pub const KEY_MOD_BITS: u32 = Mod::Key4 as u32
        | Mod::Key5 as u32
        | Mod::Key6 as u32
        | Mod::Key7 as u32
        | Mod::Key8 as u32;

    #[inline]
    pub fn bits(self) -> u32 {
        self as u32
    }

    /// Two-letter display code.
    pub fn code(self) -> &'static str {
        match self {
            Mod::NoMod          => "NM",
            Mod::NoFail         => "NF",
            Mod::Easy           => "EZ",
            Mod::NoVideo        => "NV",
            Mod::Hidden         => "HD",
            Mod::HardRock       => "HR",
            Mod::SuddenDeath    => "SD",
            Mod::DoubleTime     => "DT",
            Mod::Relax          => "RX",
            Mod::HalfTime       => "HT",
            Mod::Nightcore      => "NC",
            Mod::Flashlight     => "FL",
            Mod::Autoplay       => "AU",
            Mod::SpunOut        => "SP",
            Mod::Autopilot      => "AP",
            Mod::Perfect        => "PF",
            Mod::Key4           => "K4",
            Mod::Key5           => "K5",
            Mod::Key6           => "K6",
            Mod::Key7           => "K7",
            Mod::Key8           => "K8",
            Mod::FadeIn         => "FI",
            Mod::Random         => "RD",
            Mod::LastMod        => "LM",
            Mod::TargetPractice => "TP",
            Mod::Key9           => "K9",
            Mod::Coop           => "CP",
            Mod::Key1           => "K1",
            Mod::Key3           => "K3",
            Mod::Key2           => "K2",
            Mod::ScoreV2        => "S2",
            Mod::Mirror         => "MR",
        }
    }

    /// Parse a display code, case-insensitively.
    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.to_ascii_uppercase();
        if code == "NM" {
            return Some(Mod::NoMod);
        }
        Mod::ALL.into_iter().find(|m| m.code() == code)
    }
}

// ── Mods bitset ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Mods(u32);

impl Mods {
    pub const NONE: Mods = Mods(0);

    /// Validate a raw header value.  Any bit outside [`Mod::KNOWN_BITS`]
    /// fails with [`ReplayError::InvalidModValue`].
    pub fn from_raw(raw: u32) -> Result<Self> {
        if raw & !Mod::KNOWN_BITS != 0 {
            return Err(ReplayError::InvalidModValue(raw));
        }
        Ok(Mods(raw))
    }

    #[inline]
    pub fn bits(self) -> u32 {
        self.0
    }

    /// `NoMod` tests for the empty set; every other flag tests its bit.
    pub fn has(self, flag: Mod) -> bool {
        match flag {
            Mod::NoMod => self.0 == 0,
            m          => self.0 & m.bits() != 0,
        }
    }

    pub fn has_key_mod(self) -> bool {
        self.0 & Mod::KEY_MOD_BITS != 0
    }

    pub fn insert(&mut self, flag: Mod) {
        self.0 |= flag.bits();
    }

    pub fn remove(&mut self, flag: Mod) {
        self.0 &= !flag.bits();
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Set flags in bit order.
    pub fn iter(self) -> impl Iterator<Item = Mod> {
        Mod::ALL.into_iter().filter(move |m| self.0 & m.bits() != 0)
    }

    pub fn codes(self) -> Vec<&'static str> {
        self.iter().map(Mod::code).collect()
    }
}

impl From<Mod> for Mods {
    fn from(flag: Mod) -> Self {
        Mods(flag.bits())
    }
}

impl FromIterator<Mod> for Mods {
    fn from_iter<I: IntoIterator<Item = Mod>>(iter: I) -> Self {
        let mut mods = Mods::NONE;
        for m in iter {
            mods.insert(m);
        }
        mods
    }
}

impl fmt::Display for Mods {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.codes().join(" "))
    }
}

impl Serialize for Mods {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter().map(Mod::code))
    }
}
