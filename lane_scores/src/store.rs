//! Score store implementations.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::{clean_name, format_record_time, rank, ScoreRecord, ScoreStore};

// ════════════════════════════════════════════════════════════════════════════
// MemoryStore
// ════════════════════════════════════════════════════════════════════════════

/// Records kept in insertion order, lost on drop.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Vec<ScoreRecord>,
    next_id: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore { records: Vec::new(), next_id: 1 }
    }

    pub fn len(&self) -> usize { self.records.len() }

    pub fn is_empty(&self) -> bool { self.records.is_empty() }
}

impl ScoreStore for MemoryStore {
    fn submit_score(&mut self, name: &str, score: u32, timestamp: NaiveDateTime) -> Result<ScoreRecord> {
        let record = ScoreRecord {
            id:          self.next_id.max(1),
            name:        clean_name(name)?,
            score,
            record_time: format_record_time(&timestamp),
        };
        self.next_id = record.id + 1;
        self.records.push(record.clone());
        Ok(record)
    }

    fn top_scores(&self, limit: usize) -> Result<Vec<ScoreRecord>> {
        Ok(rank(self.records.clone(), limit))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// JsonFileStore
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default, Serialize, Deserialize)]
struct BoardFile {
    records: Vec<ScoreRecord>,
}

/// The whole board in one pretty-printed JSON file.  Every submit rewrites
/// the file through a sibling temp file and a rename.
#[derive(Debug)]
pub struct JsonFileStore {
    path:  PathBuf,
    board: BoardFile,
}

impl JsonFileStore {
    /// Load `path`, or start empty when it does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let board = if path.exists() {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read score file {}", path.display()))?;
            if text.trim().is_empty() {
                BoardFile::default()
            } else {
                serde_json::from_str(&text)
                    .with_context(|| format!("Failed to parse score file {}", path.display()))?
            }
        } else {
            BoardFile::default()
        };
        tracing::debug!(path = %path.display(), records = board.records.len(), "score file opened");
        Ok(JsonFileStore { path, board })
    }

    pub fn path(&self) -> &Path { &self.path }

    fn save(&self) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let text = serde_json::to_string_pretty(&self.board).context("Failed to encode scores")?;
        fs::write(&tmp, text).with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        Ok(())
    }
}

impl ScoreStore for JsonFileStore {
    fn submit_score(&mut self, name: &str, score: u32, timestamp: NaiveDateTime) -> Result<ScoreRecord> {
        let id = self.board.records.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        let record = ScoreRecord {
            id,
            name: clean_name(name)?,
            score,
            record_time: format_record_time(&timestamp),
        };
        self.board.records.push(record.clone());
        if let Err(e) = self.save() {
            self.board.records.pop();
            return Err(e);
        }
        tracing::info!(name = %record.name, score, "score saved");
        Ok(record)
    }

    fn top_scores(&self, limit: usize) -> Result<Vec<ScoreRecord>> {
        Ok(rank(self.board.records.clone(), limit))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
