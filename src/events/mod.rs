//! Input event table.
//!
//! The decompressed event text is a comma-separated list of rows, each row
//! `time|x|y|keys`.  Rows whose time is [`MARKER_TIME`] are protocol markers
//! (the last one carries the replay's RNG seed) and never enter the table.
//!
//! Two transforms depend on the header:
//! - Standard mode with HardRock stores the playfield upside down; `y` is
//!   mirrored against [`PLAYFIELD_HEIGHT`] for every retained row.
//! - Mania replays do not record their lane count, so it is inferred from
//!   the widest key-state bitmask among rows with `y >= 0`.

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{ReplayError, Result};
use crate::gamemode::GameMode;
use crate::mods::{Mod, Mods};

/// Time value of a marker/seed row.
pub const MARKER_TIME: i64 = -12345;
/// Playfield size in osu!px.
pub const PLAYFIELD_WIDTH:  f64 = 512.0;
pub const PLAYFIELD_HEIGHT: f64 = 384.0;
/// Lane bits considered when inferring a mania key count.
pub const MANIA_LANE_BITS: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReplayEvent {
    /// Milliseconds, as stored in the row.
    pub time: i64,
    pub x:    f64,
    pub y:    f64,
    /// Key-state bitmask.
    pub keys: i64,
}

impl ReplayEvent {
    #[inline]
    pub fn is_marker(&self) -> bool {
        self.time == MARKER_TIME
    }
}

/// Parsed rows with the marker seed split off.
#[derive(Debug, Clone, Default)]
pub struct EventTable {
    pub events:     Vec<ReplayEvent>,
    pub rng_seed:   Option<i64>,
    pub mania_keys: Option<u8>,
}

// ── Row parsing ──────────────────────────────────────────────────────────────

fn parse_field<T: std::str::FromStr>(row: usize, name: &str, raw: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ReplayError::malformed_event(row, format!("{name} {raw:?}: {e}")))
}

fn parse_row(row: usize, text: &str) -> Result<ReplayEvent> {
    let fields: Vec<&str> = text.split('|').collect();
    if fields.len() != 4 {
        return Err(ReplayError::malformed_event(
            row,
            format!("expected 4 fields, found {}", fields.len()),
        ));
    }
    Ok(ReplayEvent {
        time: parse_field(row, "time", fields[0])?,
        x:    parse_field(row, "x", fields[1])?,
        y:    parse_field(row, "y", fields[2])?,
        keys: parse_field(row, "keys", fields[3])?,
    })
}

/// Parse every row, markers included, in stream order.
pub fn parse_rows(text: &str) -> Result<Vec<ReplayEvent>> {
    text.split(',')
        .enumerate()
        .filter(|(_, row)| !row.is_empty())
        .map(|(i, row)| parse_row(i, row))
        .collect()
}

// ── Table assembly ───────────────────────────────────────────────────────────

/// Build the event table for a replay of `mode` with `mods`.
///
/// Fails with [`ReplayError::CorruptReplay`] when the final row is a marker
/// with a zero seed.
pub fn parse_events(text: &str, mode: GameMode, mods: Mods, flip_hard_rock: bool) -> Result<EventTable> {
    let rows = parse_rows(text)?;

    let rng_seed = match rows.last() {
        Some(last) if last.is_marker() => {
            if last.keys == 0 {
                return Err(ReplayError::CorruptReplay);
            }
            Some(last.keys)
        }
        _ => None,
    };

    let markers = rows.iter().filter(|e| e.is_marker()).count();
    if markers > usize::from(rng_seed.is_some()) {
        warn!(markers, "marker rows found before the end of the event stream");
    }

    let flip = flip_hard_rock && mode == GameMode::Standard && mods.has(Mod::HardRock);
    let events: Vec<ReplayEvent> = rows
        .into_iter()
        .filter(|e| !e.is_marker())
        .map(|e| if flip { ReplayEvent { y: PLAYFIELD_HEIGHT - e.y, ..e } } else { e })
        .collect();

    let mania_keys = match mode {
        GameMode::Mania => infer_mania_keys(&events),
        _               => None,
    };

    debug!(events = events.len(), flipped = flip, ?mania_keys, "parsed event table");
    Ok(EventTable { events, rng_seed, mania_keys })
}

/// Lane count implied by the widest key state among rows with `y >= 0`.
///
/// The largest `keys` value is read as an unsigned lane mask; the result is
/// one past its highest set bit within the first [`MANIA_LANE_BITS`] lanes
/// (an all-zero mask yields 1).  `None` when no row qualifies.
pub fn infer_mania_keys(events: &[ReplayEvent]) -> Option<u8> {
    let widest = events.iter().filter(|e| e.y >= 0.0).map(|e| e.keys).max()?;
    let lanes = (widest as u64) & ((1u64 << MANIA_LANE_BITS) - 1);
    let highest = if lanes == 0 { 0 } else { 63 - lanes.leading_zeros() };
    Some(highest as u8 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(time: i64, x: f64, y: f64, keys: i64) -> ReplayEvent {
        ReplayEvent { time, x, y, keys }
    }

    #[test]
    fn rows_parse_in_order() {
        let rows = parse_rows("0|256|-500|0,-1|256|-500|0,16|100.25|50.5|5").unwrap();
        assert_eq!(rows, vec![
            ev(0, 256.0, -500.0, 0),
            ev(-1, 256.0, -500.0, 0),
            ev(16, 100.25, 50.5, 5),
        ]);
    }

    #[test]
    fn wrong_field_count_is_malformed() {
        let err = parse_rows("0|1|2|3,4|5|6").unwrap_err();
        assert!(matches!(err, ReplayError::MalformedEvent { row: 1, .. }));
    }

    #[test]
    fn bad_number_is_malformed() {
        let err = parse_rows("0|1|2|x").unwrap_err();
        assert!(matches!(err, ReplayError::MalformedEvent { row: 0, ref details } if details.contains("keys")));
    }

    #[test]
    fn empty_text_has_no_events() {
        let table = parse_events("", GameMode::Standard, Mods::NONE, true).unwrap();
        assert!(table.events.is_empty());
        assert_eq!(table.rng_seed, None);
    }

    #[test]
    fn trailing_marker_is_excluded_and_seed_kept() {
        let table = parse_events("0|1|2|0,10|3|4|1,-12345|0|0|7433", GameMode::Standard, Mods::NONE, true).unwrap();
        assert_eq!(table.events.len(), 2);
        assert!(table.events.iter().all(|e| !e.is_marker()));
        assert_eq!(table.rng_seed, Some(7433));
    }

    #[test]
    fn zero_seed_is_corrupt() {
        let err = parse_events("0|1|2|0,-12345|0|0|0", GameMode::Standard, Mods::NONE, true).unwrap_err();
        assert!(matches!(err, ReplayError::CorruptReplay));
    }

    #[test]
    fn mid_stream_marker_is_excluded() {
        let table = parse_events("0|1|2|0,-12345|0|0|0,10|3|4|1", GameMode::Taiko, Mods::NONE, true).unwrap();
        assert_eq!(table.events, vec![ev(0, 1.0, 2.0, 0), ev(10, 3.0, 4.0, 1)]);
        assert_eq!(table.rng_seed, None);
    }

    #[test]
    fn hard_rock_flips_standard_only() {
        let text = "0|10|0|0,5|20|100|1,7|30|384|2,-12345|0|0|99";
        let hr = Mods::from(Mod::HardRock);

        let flipped = parse_events(text, GameMode::Standard, hr, true).unwrap();
        let ys: Vec<f64> = flipped.events.iter().map(|e| e.y).collect();
        assert_eq!(ys, vec![384.0, 284.0, 0.0]);

        for (mode, mods, flip) in [
            (GameMode::Standard, Mods::NONE, true),
            (GameMode::Catch, hr, true),
            (GameMode::Standard, hr, false),
        ] {
            let table = parse_events(text, mode, mods, flip).unwrap();
            let ys: Vec<f64> = table.events.iter().map(|e| e.y).collect();
            assert_eq!(ys, vec![0.0, 100.0, 384.0]);
        }
    }

    #[test]
    fn mania_keys_from_widest_state() {
        let events = [ev(0, 0.0, 0.0, 1), ev(1, 0.0, 0.0, 2), ev(2, 0.0, 0.0, 4), ev(3, 0.0, 0.0, 8)];
        assert_eq!(infer_mania_keys(&events), Some(4));
    }

    #[test]
    fn mania_negative_y_rows_ignored() {
        let events = [ev(0, 0.0, 0.0, 3), ev(1, 0.0, -1.0, 1 << 9), ev(2, 0.0, 5.0, 64)];
        assert_eq!(infer_mania_keys(&events), Some(7));
    }

    #[test]
    fn mania_edge_cases() {
        assert_eq!(infer_mania_keys(&[]), None);
        assert_eq!(infer_mania_keys(&[ev(0, 0.0, -1.0, 4)]), None);
        assert_eq!(infer_mania_keys(&[ev(0, 0.0, 0.0, 0)]), Some(1));
        // Bits above lane 19 do not count.
        assert_eq!(infer_mania_keys(&[ev(0, 0.0, 0.0, (1 << 25) | 2)]), Some(2));
    }

    #[test]
    fn mania_table_carries_key_count() {
        let table = parse_events("0|0|0|1,1|0|0|8,2|0|-1|255,-12345|0|0|1", GameMode::Mania, Mods::NONE, true).unwrap();
        assert_eq!(table.mania_keys, Some(4));
        assert_eq!(table.events.len(), 3);

        let std = parse_events("0|0|0|1", GameMode::Standard, Mods::NONE, true).unwrap();
        assert_eq!(std.mania_keys, None);
    }
}
