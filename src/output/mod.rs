//! JSON Lines output sink
//!
//! One JSON object per fetched URL, appended as produced. Appending (rather
//! than buffering the crawl in memory) means an interrupted crawl keeps
//! every row written so far, and records with different field sets coexist
//! in one file. The sink also tracks the union of column names seen, which
//! is the effective header of the sparse-schema table.

use crate::extract::PageRecord;
use crate::CrawlError;
use std::collections::BTreeSet;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Append-only jsonlines writer for one crawl job
pub struct JsonlSink {
    writer: BufWriter<File>,
    path: PathBuf,
    columns: BTreeSet<String>,
    records_written: u64,
}

impl JsonlSink {
    /// Opens the sink, creating the file or appending to an existing one
    pub fn open(path: &Path) -> Result<Self, CrawlError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| CrawlError::Output {
                    path: path.display().to_string(),
                    source,
                })?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| CrawlError::Output {
                path: path.display().to_string(),
                source,
            })?;

        Ok(Self {
            writer: BufWriter::new(file),
            path: path.to_path_buf(),
            columns: BTreeSet::new(),
            records_written: 0,
        })
    }

    /// Appends one record as a JSON line and flushes it
    ///
    /// Flushing per record keeps the file consistent if the process dies
    /// mid-crawl; rows are small enough that this is not the bottleneck
    /// next to network fetches.
    pub fn write_record(&mut self, record: &PageRecord) -> Result<(), CrawlError> {
        for column in record.columns() {
            if !self.columns.contains(column) {
                self.columns.insert(column.to_string());
            }
        }

        let line =
            serde_json::to_string(record.as_map()).map_err(|e| CrawlError::Output {
                path: self.path.display().to_string(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
            })?;

        let io_err = |source| CrawlError::Output {
            path: self.path.display().to_string(),
            source,
        };

        self.writer.write_all(line.as_bytes()).map_err(io_err)?;
        self.writer.write_all(b"\n").map_err(io_err)?;
        self.writer.flush().map_err(io_err)?;

        self.records_written += 1;
        Ok(())
    }

    /// Number of records written by this sink
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Union of column names across every record written
    pub fn columns(&self) -> Vec<String> {
        self.columns.iter().cloned().collect()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
