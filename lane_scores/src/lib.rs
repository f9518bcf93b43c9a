//! # lane_scores
//!
//! Leaderboard persistence.  A [`ScoreStore`] accepts finished sessions and
//! returns the best ones:
//!
//! ```rust
//! use lane_scores::{MemoryStore, ScoreStore};
//!
//! let mut store = MemoryStore::new();
//! store.submit_score("  Ada ", 12, chrono::Local::now().naive_local()).unwrap();
//! store.submit_score("Lin", 30, chrono::Local::now().naive_local()).unwrap();
//! let top = store.top_scores(10).unwrap();
//! assert_eq!(top[0].name, "Lin");
//! assert_eq!(top[1].name, "Ada");
//! ```
//!
//! Two stores ship: [`MemoryStore`] for tests and throwaway sessions, and
//! [`JsonFileStore`] which keeps the whole board in one JSON file.

pub mod store;

pub use store::{JsonFileStore, MemoryStore};

use anyhow::{bail, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Default `top_scores` limit.
pub const DEFAULT_LIMIT: usize = 50;

/// Number of rows shown on the post-game board.
pub const BOARD_SIZE: usize = 10;

/// `YYYY/MM/DD HH:MM`
pub const RECORD_TIME_FORMAT: &str = "%Y/%m/%d %H:%M";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub id:          u64,
    pub name:        String,
    pub score:       u32,
    pub record_time: String,
}

// ════════════════════════════════════════════════════════════════════════════
// Store contract
// ════════════════════════════════════════════════════════════════════════════

pub trait ScoreStore {
    /// Persist one finished session.  The name is trimmed and must not be
    /// empty afterwards.
    fn submit_score(&mut self, name: &str, score: u32, timestamp: NaiveDateTime) -> Result<ScoreRecord>;

    /// Best `limit` records, highest score first, earlier submissions first
    /// among equal scores.
    fn top_scores(&self, limit: usize) -> Result<Vec<ScoreRecord>>;
}

/// Trim and reject blank names.
pub fn clean_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        bail!("player name is empty");
    }
    Ok(trimmed.to_string())
}

pub fn format_record_time(timestamp: &NaiveDateTime) -> String {
    timestamp.format(RECORD_TIME_FORMAT).to_string()
}

/// Sort in leaderboard order and cut to `limit`.  Relies on a stable sort
/// over records kept in insertion order.
pub(crate) fn rank(mut records: Vec<ScoreRecord>, limit: usize) -> Vec<ScoreRecord> {
    records.sort_by(|a, b| b.score.cmp(&a.score));
    records.truncate(limit);
    records
}

// ════════════════════════════════════════════════════════════════════════════
// Board rendering
// ════════════════════════════════════════════════════════════════════════════

pub fn rank_marker(rank: usize) -> &'static str {
    match rank {
        1 => "🥇",
        2 => "🥈",
        3 => "🥉",
        _ => "  ",
    }
}

/// Plain-text board, one row per record, with `highlight` marked.
pub fn format_board(records: &[ScoreRecord], highlight: Option<u64>) -> String {
    let mut out = String::new();
    out.push_str("   RANK   PLAYER               SCORE   DATE\n");
    out.push_str("   ──────────────────────────────────────────────────────\n");
    if records.is_empty() {
        out.push_str("   (no scores yet)\n");
    }
    for (i, r) in records.iter().enumerate() {
        let mark = if Some(r.id) == highlight { "◀" } else { "" };
        out.push_str(&format!(
            "   {} {:>2}.  {:<20} {:>5}   {}  {}\n",
            rank_marker(i + 1),
            i + 1,
            r.name,
            r.score,
            r.record_time,
            mark,
        ));
    }
    out
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn rec(id: u64, name: &str, score: u32) -> ScoreRecord {
        ScoreRecord { id, name: name.into(), score, record_time: String::new() }
    }

    #[test]
    fn blank_names_rejected() {
        assert!(clean_name("   ").is_err());
        assert!(clean_name("").is_err());
        assert_eq!(clean_name("  Mo  ").unwrap(), "Mo");
    }

    #[test]
    fn record_time_format() {
        let t = NaiveDate::from_ymd_opt(2025, 9, 12).unwrap().and_hms_opt(14, 30, 59).unwrap();
        assert_eq!(format_record_time(&t), "2025/09/12 14:30");
    }

    #[test]
    fn rank_keeps_insertion_order_for_ties() {
        let ranked = rank(vec![rec(1, "a", 5), rec(2, "b", 9), rec(3, "c", 5)], 10);
        let ids: Vec<u64> = ranked.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
        assert_eq!(rank(ranked, 1).len(), 1);
    }

    #[test]
    fn board_marks_highlight_and_podium() {
        let board = format_board(&[rec(7, "Ada", 30), rec(8, "Lin", 12)], Some(8));
        let lines: Vec<&str> = board.lines().collect();
        assert!(lines[2].contains("🥇") && lines[2].contains("Ada"));
        assert!(lines[3].contains("Lin") && lines[3].ends_with('◀'));
        assert!(format_board(&[], None).contains("no scores yet"));
    }
}
