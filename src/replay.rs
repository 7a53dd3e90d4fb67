//! Decoded replay record and its read-only views.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;

use crate::events::ReplayEvent;
use crate::gamemode::GameMode;
use crate::mods::Mods;

/// Accuracy as the client reports it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Accuracy {
    /// Percentage in `0.0..=100.0`, rounded to three decimals.
    Percent(f64),
    /// No formula is implemented for this mode.
    Unsupported(GameMode),
}

impl Accuracy {
    pub fn percent(self) -> Option<f64> {
        match self {
            Accuracy::Percent(p)     => Some(p),
            Accuracy::Unsupported(_) => None,
        }
    }
}

impl fmt::Display for Accuracy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Accuracy::Percent(p)        => write!(f, "{p}"),
            Accuracy::Unsupported(mode) => write!(f, "n/a ({mode})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayRecord {
    pub game_mode:      GameMode,
    pub game_version:   u32,
    pub beatmap_hash:   String,
    pub player_name:    String,
    pub replay_hash:    String,
    pub count_300:      u16,
    pub count_100:      u16,
    pub count_50:       u16,
    pub count_geki:     u16,
    pub count_katu:     u16,
    pub count_miss:     u16,
    pub score:          u32,
    pub max_combo:      u16,
    pub is_perfect:     bool,
    pub mods:           Mods,
    pub life_bar_graph: Option<String>,
    pub timestamp:      NaiveDateTime,
    pub score_id:       Option<i64>,
    /// Seed from the trailing marker row, when the stream has one.
    pub rng_seed:       Option<i64>,
    pub events:         Vec<ReplayEvent>,
    /// Inferred lane count; mania replays only.
    pub mania_keys:     Option<u8>,
}

impl ReplayRecord {
    // ── Series views ─────────────────────────────────────────────────────────

    pub fn time_data(&self) -> Vec<i64> {
        self.events.iter().map(|e| e.time).collect()
    }

    pub fn x_data(&self) -> Vec<f64> {
        self.events.iter().map(|e| e.x).collect()
    }

    pub fn y_data(&self) -> Vec<f64> {
        self.events.iter().map(|e| e.y).collect()
    }

    pub fn press_data(&self) -> Vec<i64> {
        self.events.iter().map(|e| e.keys).collect()
    }

    // ── Time lookup ──────────────────────────────────────────────────────────

    /// Index of the event nearest to `time`, assuming the table is sorted by
    /// time.  Queries outside the table clamp to the first or last event;
    /// an exact tie between neighbours resolves to the earlier one.
    pub fn index_at_time(&self, time: i64) -> Option<usize> {
        if self.events.is_empty() {
            return None;
        }
        let idx = self.events.partition_point(|e| e.time < time);
        if idx == 0 {
            return Some(0);
        }
        if idx == self.events.len() {
            return Some(idx - 1);
        }
        let after  = self.events[idx].time.abs_diff(time);
        let before = self.events[idx - 1].time.abs_diff(time);
        Some(if after < before { idx } else { idx - 1 })
    }

    pub fn event_at_time(&self, time: i64) -> Option<&ReplayEvent> {
        self.index_at_time(time).map(|i| &self.events[i])
    }

    /// Indices of events with `start <= time <= end`.
    pub fn events_in_range(&self, start: i64, end: i64) -> Vec<usize> {
        self.events
            .iter()
            .enumerate()
            .filter(|(_, e)| start <= e.time && e.time <= end)
            .map(|(i, _)| i)
            .collect()
    }

    // ── Score statistics ─────────────────────────────────────────────────────

    pub fn num_hits(&self) -> u32 {
        [self.count_300, self.count_geki, self.count_katu, self.count_100, self.count_50, self.count_miss]
            .iter()
            .map(|&c| u32::from(c))
            .sum()
    }

    pub fn accuracy(&self) -> Accuracy {
        let n300 = f64::from(self.count_300) + f64::from(self.count_geki);
        let n100 = f64::from(self.count_100);
        let n50  = f64::from(self.count_50);
        let katu = f64::from(self.count_katu);
        let miss = f64::from(self.count_miss);

        let earned = match self.game_mode {
            GameMode::Standard => 50.0 * n50 + 100.0 * (n100 + katu) + 300.0 * n300,
            GameMode::Mania    => 50.0 * n50 + 100.0 * n100 + 200.0 * katu + 300.0 * n300,
            mode @ (GameMode::Taiko | GameMode::Catch) => return Accuracy::Unsupported(mode),
        };
        let possible = 300.0 * (miss + n50 + n100 + katu + n300);
        if possible == 0.0 {
            return Accuracy::Percent(0.0);
        }
        Accuracy::Percent((100_000.0 * earned / possible).round() / 1000.0)
    }

    pub fn matches_beatmap(&self, md5: &str) -> bool {
        self.beatmap_hash.eq_ignore_ascii_case(md5)
    }

    /// `player mods - score (xcombo, acc%) | 300s/100s/50s/misses`
    pub fn summary(&self) -> String {
        let acc = match self.accuracy() {
            Accuracy::Percent(p)     => format!("{p}%"),
            Accuracy::Unsupported(_) => "n/a".to_string(),
        };
        format!(
            "{} {} - {} (x{}, {}) | {}/{}/{}/{}",
            self.player_name,
            self.mods,
            self.score,
            self.max_combo,
            acc,
            u32::from(self.count_300) + u32::from(self.count_geki),
            u32::from(self.count_100) + u32::from(self.count_katu),
            self.count_50,
            self.count_miss,
        )
    }
}

impl fmt::Display for ReplayRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.summary())?;
        write!(f, "{} events", self.events.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mods::Mod;
    use chrono::NaiveDate;

    fn blank_record(mode: GameMode) -> ReplayRecord {
        ReplayRecord {
            game_mode:      mode,
            game_version:   20_200_301,
            beatmap_hash:   "d41d8cd98f00b204e9800998ecf8427e".into(),
            player_name:    "abraker".into(),
            replay_hash:    String::new(),
            count_300:      0,
            count_100:      0,
            count_50:       0,
            count_geki:     0,
            count_katu:     0,
            count_miss:     0,
            score:          0,
            max_combo:      0,
            is_perfect:     false,
            mods:           Mods::NONE,
            life_bar_graph: None,
            timestamp:      NaiveDate::from_ymd_opt(2020, 3, 1).unwrap().and_hms_opt(0, 0, 0).unwrap(),
            score_id:       None,
            rng_seed:       None,
            events:         Vec::new(),
            mania_keys:     None,
        }
    }

    fn with_times(times: &[i64]) -> ReplayRecord {
        let mut r = blank_record(GameMode::Standard);
        r.events = times
            .iter()
            .map(|&t| ReplayEvent { time: t, x: t as f64, y: 0.0, keys: 0 })
            .collect();
        r
    }

    #[test]
    fn nearest_event_lookup() {
        let r = with_times(&[0, 50, 120]);
        assert_eq!(r.event_at_time(60).unwrap().time, 50);
        assert_eq!(r.event_at_time(100).unwrap().time, 120);
        assert_eq!(r.index_at_time(-5), Some(0));
        assert_eq!(r.index_at_time(500), Some(2));
        assert_eq!(r.index_at_time(50), Some(1));
        // Equidistant: earlier event wins.
        assert_eq!(r.index_at_time(85), Some(1));
    }

    #[test]
    fn empty_table_lookup() {
        let r = with_times(&[]);
        assert_eq!(r.event_at_time(0), None);
        assert!(r.events_in_range(0, 100).is_empty());
    }

    #[test]
    fn range_is_inclusive() {
        let r = with_times(&[0, 50, 120, 200]);
        assert_eq!(r.events_in_range(50, 120), vec![1, 2]);
        assert_eq!(r.events_in_range(121, 199), Vec::<usize>::new());
        assert_eq!(r.events_in_range(-10, 1000), vec![0, 1, 2, 3]);
    }

    #[test]
    fn series_views() {
        let r = with_times(&[0, 16, 33]);
        assert_eq!(r.time_data(), vec![0, 16, 33]);
        assert_eq!(r.x_data(), vec![0.0, 16.0, 33.0]);
        assert_eq!(r.y_data(), vec![0.0; 3]);
        assert_eq!(r.press_data(), vec![0; 3]);
    }

    #[test]
    fn standard_accuracy() {
        let mut r = blank_record(GameMode::Standard);
        r.count_300 = 90;
        r.count_100 = 8;
        r.count_50 = 1;
        r.count_miss = 1;
        // (50 + 800 + 27000) / 30000
        assert_eq!(r.accuracy(), Accuracy::Percent(92.833));
        assert_eq!(r.num_hits(), 100);
    }

    #[test]
    fn mania_accuracy_weights_katu() {
        let mut r = blank_record(GameMode::Mania);
        r.count_geki = 2;
        r.count_katu = 2;
        // (400 + 600) / 1200
        assert_eq!(r.accuracy(), Accuracy::Percent(83.333));
    }

    #[test]
    fn unsupported_modes() {
        for mode in [GameMode::Taiko, GameMode::Catch] {
            let r = blank_record(mode);
            assert_eq!(r.accuracy(), Accuracy::Unsupported(mode));
            assert_eq!(r.accuracy().percent(), None);
        }
        assert_eq!(blank_record(GameMode::Standard).accuracy(), Accuracy::Percent(0.0));
    }

    #[test]
    fn summary_line() {
        let mut r = blank_record(GameMode::Standard);
        r.mods = [Mod::Hidden, Mod::DoubleTime].into_iter().collect();
        r.score = 1_234_567;
        r.max_combo = 321;
        r.count_300 = 3;
        r.count_geki = 1;
        assert_eq!(r.summary(), "abraker HD DT - 1234567 (x321, 100%) | 4/0/0/0");
        assert!(r.matches_beatmap("D41D8CD98F00B204E9800998ECF8427E"));
    }
}
