//! Completed-session history, kept as a pretty-printed JSON array.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::{CoreError, HistoryError};
use crate::protocol::PhaseKind;
use crate::timer::SessionSummary;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub mode: String,
    pub timestamp: DateTime<Utc>,
    pub work_seconds: u64,
    pub prep_seconds: u64,
    pub rest_seconds: u64,
    pub cooldown_seconds: u64,
    pub rounds_completed: u64,
    pub total_seconds: u64,
}

impl HistoryRecord {
    pub fn from_summary(summary: &SessionSummary, timestamp: DateTime<Utc>) -> Self {
        Self {
            mode: summary.protocol.clone(),
            timestamp,
            work_seconds: summary.seconds(PhaseKind::Work),
            prep_seconds: summary.seconds(PhaseKind::Prep),
            rest_seconds: summary.seconds(PhaseKind::Rest),
            cooldown_seconds: summary.seconds(PhaseKind::Cooldown),
            rounds_completed: summary.rounds,
            total_seconds: summary.total,
        }
    }
}

/// History file handle.
#[derive(Debug, Clone)]
pub struct History {
    path: PathBuf,
}

impl History {
    /// History in the data directory (`history.json`).
    pub fn open() -> Result<Self, CoreError> {
        Ok(Self::at(data_dir()?.join("history.json")))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All records, oldest first. A missing file is an empty history.
    pub fn load(&self) -> Result<Vec<HistoryRecord>, HistoryError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(HistoryError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content).map_err(|source| HistoryError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    pub fn append(&self, record: HistoryRecord) -> Result<(), HistoryError> {
        let mut records = self.load()?;
        records.push(record);
        self.write(&records)?;
        tracing::info!(path = %self.path.display(), count = records.len(), "session saved");
        Ok(())
    }

    /// Remove all records. Returns how many were dropped.
    ///
    /// An unreadable file is overwritten too; its records count as zero.
    pub fn clear(&self) -> Result<usize, HistoryError> {
        let count = match self.load() {
            Ok(records) => records.len(),
            Err(err) => {
                tracing::warn!(error = %err, "clearing unreadable history");
                0
            }
        };
        self.write(&[])?;
        Ok(count)
    }

    fn write(&self, records: &[HistoryRecord]) -> Result<(), HistoryError> {
        let write_failed = |source: std::io::Error| HistoryError::Write {
            path: self.path.clone(),
            source,
        };
        let json = serde_json::to_string_pretty(records)
            .map_err(|e| write_failed(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;
        std::fs::write(&self.path, json).map_err(write_failed)
    }
}
