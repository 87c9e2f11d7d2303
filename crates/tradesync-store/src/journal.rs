//! JSON Lines journal of primary records.
//!
//! Uses JSON Lines format (.jsonl) for robustness:
//! - Each line is a complete JSON object
//! - Partial file corruption only affects individual lines
//! - Can be read even if a write was interrupted
//!
//! Only records that cannot be rebuilt from the venue's current state are
//! journaled: trades, incomes, discovery marks and backfill completion.
//! Snapshots (balance, positions, open orders, ticks) are refreshed by the
//! workers within one cycle and stay in memory.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use tradesync_core::{Income, Trade};

use crate::error::StoreResult;

/// Journal file name inside the data directory.
pub const JOURNAL_FILE: &str = "journal.jsonl";

/// One journal line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "record", rename_all = "snake_case")]
pub enum JournalRecord {
    Trade(Trade),
    Incomes { symbol: String, incomes: Vec<Income> },
    SymbolChecked { symbol: String },
    SymbolTraded { symbol: String },
    BackfillComplete { symbol: String },
}

/// Append-only journal writer.
///
/// Opened in append mode, so existing history is never truncated.
pub struct Journal {
    path: PathBuf,
    writer: BufWriter<File>,
    records_written: usize,
}

impl Journal {
    /// Path of the journal file inside `data_dir`.
    pub fn path_in(data_dir: impl AsRef<Path>) -> PathBuf {
        data_dir.as_ref().join(JOURNAL_FILE)
    }

    /// Open (or create) the journal in `data_dir`.
    pub fn open(data_dir: impl AsRef<Path>) -> StoreResult<Self> {
        std::fs::create_dir_all(data_dir.as_ref())?;
        let path = Self::path_in(data_dir);

        info!(path = %path.display(), "Opening journal (append mode)");

        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            path,
            writer: BufWriter::new(file),
            records_written: 0,
        })
    }

    /// Append records and flush them to disk.
    pub fn append(&mut self, records: &[JournalRecord]) -> StoreResult<()> {
        if records.is_empty() {
            return Ok(());
        }

        for record in records {
            let json = serde_json::to_string(record)?;
            writeln!(self.writer, "{json}")?;
        }
        self.writer.flush()?;
        self.records_written += records.len();

        debug!(records = records.len(), "Appended to journal");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records_written(&self) -> usize {
        self.records_written
    }

    /// Read every record from the journal in `data_dir`.
    ///
    /// A missing journal yields no records. Lines that fail to parse are
    /// skipped with a warning.
    pub fn replay(data_dir: impl AsRef<Path>) -> StoreResult<Vec<JournalRecord>> {
        let path = Self::path_in(data_dir);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(File::open(&path)?);
        let mut records = Vec::new();
        let mut skipped = 0usize;

        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<JournalRecord>(&line) {
                Ok(record) => records.push(record),
                Err(e) => {
                    skipped += 1;
                    warn!(line = line_no + 1, error = %e, "Skipping corrupt journal line");
                }
            }
        }

        info!(
            path = %path.display(),
            records = records.len(),
            skipped,
            "Replayed journal"
        );

        Ok(records)
    }
}

impl Drop for Journal {
    fn drop(&mut self) {
        if let Err(e) = self.writer.flush() {
            warn!(?e, "Failed to flush journal on drop");
        }
    }
}
