//! Record assembler: reads a replay front to back in the fixed field order.
//!
//! | Field | Encoding |
//! |-------|----------|
//! | game mode | u8 (0–3) |
//! | game version | i32 |
//! | beatmap hash, player name, replay hash | modern string ×3 |
//! | 300/100/50/geki/katu/miss | i16 ×6 |
//! | score, max combo, perfect, mods | i32, i16, bool, i32 |
//! | life bar graph | modern string if next byte is `0x0B`, else one skipped byte |
//! | (version 0 only) | one extra skipped byte |
//! | timestamp | i64, 100 ns ticks since 0001-01-01 |
//! | event block length | i32 |
//! | event block | LZMA, see [`crate::codec`] |
//! | score id | i64, newer revisions only |
//!
//! Decoding is a single linear pass; the first failing read aborts it.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::fs;
use std::path::Path;
use tracing::{debug, trace, warn};

use crate::codec::decode_event_text;
use crate::error::{ReplayError, Result};
use crate::events::{parse_events, EventTable};
use crate::field::{FieldReader, STRING_PRESENT};
use crate::gamemode::GameMode;
use crate::mods::Mods;
use crate::replay::ReplayRecord;

// ── Options ──────────────────────────────────────────────────────────────────

/// How to treat bytes after the event block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrailerPolicy {
    /// Read an i64 score id when at least 8 bytes remain, nothing when the
    /// buffer ends at the event block.
    #[default]
    Auto,
    /// Older revision: the replay ends at the event block.
    Legacy,
    /// Newer revision: the score id must be present.
    Modern,
}

impl TrailerPolicy {
    pub fn name(self) -> &'static str {
        match self {
            TrailerPolicy::Auto   => "auto",
            TrailerPolicy::Legacy => "legacy",
            TrailerPolicy::Modern => "modern",
        }
    }

    /// Parse from a CLI string.
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "auto"   => Some(TrailerPolicy::Auto),
            "legacy" => Some(TrailerPolicy::Legacy),
            "modern" => Some(TrailerPolicy::Modern),
            _        => None,
        }
    }
}

/// Configuration for [`decode_with`].
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    /// Mirror `y` for Standard replays played with HardRock.
    pub flip_hard_rock: bool,
    pub trailer:        TrailerPolicy,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            flip_hard_rock: true,
            trailer:        TrailerPolicy::Auto,
        }
    }
}

// ── Entry points ─────────────────────────────────────────────────────────────

/// Decode a complete replay buffer with default options.
pub fn decode(bytes: &[u8]) -> Result<ReplayRecord> {
    decode_with(bytes, &DecodeOptions::default())
}

pub fn decode_with(bytes: &[u8], opts: &DecodeOptions) -> Result<ReplayRecord> {
    let mut r = FieldReader::new(bytes);
    debug!(len = bytes.len(), "decoding replay");

    let game_mode    = GameMode::from_raw(r.read_u8()?)?;
    let game_version = r.read_i32()? as u32;
    let beatmap_hash = r.read_string()?;
    let player_name  = r.read_string()?;
    let replay_hash  = r.read_string()?;
    trace!(offset = r.position(), %game_mode, game_version, "header strings read");

    let count_300  = r.read_u16()?;
    let count_100  = r.read_u16()?;
    let count_50   = r.read_u16()?;
    let count_geki = r.read_u16()?;
    let count_katu = r.read_u16()?;
    let count_miss = r.read_u16()?;
    let score      = r.read_u32()?;
    let max_combo  = r.read_u16()?;
    let is_perfect = r.read_bool()?;
    let mods       = Mods::from_raw(r.read_u32()?)?;

    let life_bar_graph = read_life_bar(&mut r, game_version)?;
    let timestamp      = ticks_to_datetime(r.read_i64()?)?;

    let table    = read_event_block(&mut r, game_mode, mods, opts.flip_hard_rock)?;
    let score_id = read_trailer(&mut r, opts.trailer)?;

    debug!(
        player = %player_name,
        events = table.events.len(),
        ?score_id,
        "replay decoded"
    );

    Ok(ReplayRecord {
        game_mode,
        game_version,
        beatmap_hash,
        player_name,
        replay_hash,
        count_300,
        count_100,
        count_50,
        count_geki,
        count_katu,
        count_miss,
        score,
        max_combo,
        is_perfect,
        mods,
        life_bar_graph,
        timestamp,
        score_id,
        rng_seed:   table.rng_seed,
        events:     table.events,
        mania_keys: table.mania_keys,
    })
}

// ── Field groups ─────────────────────────────────────────────────────────────

fn read_life_bar(r: &mut FieldReader<'_>, game_version: u32) -> Result<Option<String>> {
    let graph = if r.peek_u8()? == STRING_PRESENT {
        Some(r.read_string()?)
    } else {
        r.skip(1)?;
        None
    };

    // Replays without a recorded version are one byte longer here.
    if game_version == 0 {
        warn!(offset = r.position(), "game version is 0, skipping one extra byte");
        r.skip(1)?;
    }
    Ok(graph)
}

fn read_event_block(
    r:              &mut FieldReader<'_>,
    mode:           GameMode,
    mods:           Mods,
    flip_hard_rock: bool,
) -> Result<EventTable> {
    let offset = r.position();
    let length = r.read_i32()?;
    let length = usize::try_from(length)
        .map_err(|_| ReplayError::InvalidBlockLength { offset, length })?;

    let block = r.read_bytes(length)?;
    if block.is_empty() {
        debug!("empty event block");
        return Ok(EventTable::default());
    }

    let text = decode_event_text(block)?;
    parse_events(&text, mode, mods, flip_hard_rock)
}

fn read_trailer(r: &mut FieldReader<'_>, policy: TrailerPolicy) -> Result<Option<i64>> {
    match policy {
        TrailerPolicy::Legacy                       => Ok(None),
        TrailerPolicy::Auto if r.remaining() == 0   => Ok(None),
        TrailerPolicy::Auto | TrailerPolicy::Modern => Ok(Some(r.read_i64()?)),
    }
}

/// 0001-01-01T00:00:00, the zero point of the tick counter.
fn tick_epoch() -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(1, 1, 1)?.and_hms_opt(0, 0, 0)
}

/// Ticks are 100 ns; the timestamp keeps microsecond precision.
pub fn ticks_to_datetime(ticks: i64) -> Result<NaiveDateTime> {
    tick_epoch()
        .and_then(|epoch| epoch.checked_add_signed(Duration::microseconds(ticks / 10)))
        .ok_or(ReplayError::InvalidTimestamp(ticks))
}

// ── File wrappers ────────────────────────────────────────────────────────────

/// Read `path` in one go and decode it.
pub fn open_replay(path: impl AsRef<Path>) -> Result<ReplayRecord> {
    let bytes = fs::read(path.as_ref())?;
    decode(&bytes)
}

/// Write raw replay bytes to `path`, creating missing parent directories.
pub fn save_replay(bytes: &[u8], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)?;
    Ok(())
}
