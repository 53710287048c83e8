// Copyright 2025 the emg-relay developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Durable CSV log sink

use crate::sample::{Sample, CSV_HEADER};
use crate::sink::RecordSink;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// How many appended rows between explicit flushes. Bounds data loss on an
/// abrupt kill to at most FLUSH_INTERVAL - 1 rows.
const FLUSH_INTERVAL: u64 = 100;

/// Owns the output file for the lifetime of the recording.
///
/// The header is written and flushed at create time, so the file is valid
/// CSV even if the process dies before the first frame. Rows are buffered
/// and explicitly flushed every [`FLUSH_INTERVAL`] appends and on drop.
pub struct CsvSink {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    rows_appended: u64,
}

impl CsvSink {
    /// Create (or truncate) the log file and write the flushed header.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)
            .with_context(|| format!("failed to create CSV log {}", path.display()))?;
        let mut writer = BufWriter::new(file);

        writer
            .write_all(CSV_HEADER.as_bytes())
            .context("failed to write CSV header")?;
        writer.flush().context("failed to flush CSV header")?;

        info!("CSV log opened: {}", path.display());

        Ok(Self {
            path,
            writer: Some(writer),
            rows_appended: 0,
        })
    }

    /// Append one pre-formatted row.
    ///
    /// Flushes on rows 0, 100, 200, ... (modulo taken before the counter
    /// increments, matching the recorder this log format comes from).
    pub fn append(&mut self, row: &str) -> Result<()> {
        let writer = self
            .writer
            .as_mut()
            .context("CSV sink is already closed")?;

        writer
            .write_all(row.as_bytes())
            .with_context(|| format!("failed to append to {}", self.path.display()))?;

        if self.rows_appended % FLUSH_INTERVAL == 0 {
            writer
                .flush()
                .with_context(|| format!("failed to flush {}", self.path.display()))?;
            debug!("flushed CSV log at row {}", self.rows_appended);
        }

        self.rows_appended += 1;
        Ok(())
    }

    /// Flush and release the file. Idempotent.
    pub fn close(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer
                .flush()
                .with_context(|| format!("failed to flush {}", self.path.display()))?;
            info!(
                "CSV log closed: {} ({} rows)",
                self.path.display(),
                self.rows_appended
            );
        }
        Ok(())
    }

    pub fn rows_appended(&self) -> u64 {
        self.rows_appended
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for CsvSink {
    fn drop(&mut self) {
        // Errors on the exit path have nowhere to go.
        let _ = self.close();
    }
}

impl RecordSink for CsvSink {
    fn record(&mut self, sample: &Sample) -> Result<()> {
        self.append(&sample.csv_row())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer
                .flush()
                .with_context(|| format!("failed to flush {}", self.path.display()))?;
        }
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "csv"
    }
}
