use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::cotrain::TickResult;

fn append_json_line<P: AsRef<Path>, T: Serialize>(path: P, value: &T) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    serde_json::to_writer(&mut file, value)
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
    file.write_all(b"\n")
}

fn timestamp_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}

#[derive(Debug, Serialize)]
pub struct JournalEntry<'a> {
    pub sequence: u64,
    pub timestamp_ms: u128,
    #[serde(flatten)]
    pub result: &'a TickResult,
}

/// Append-only JSON-lines record of emitted tick results.
#[derive(Debug)]
pub struct TickJournal {
    path: PathBuf,
    sequence: u64,
    classified_only: bool,
}

impl TickJournal {
    /// Open (or create) a journal, creating parent directories as needed.
    pub fn create<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            sequence: 0,
            classified_only: false,
        })
    }

    /// Skip raw-only results.
    pub fn classified_only(mut self, enabled: bool) -> Self {
        self.classified_only = enabled;
        self
    }

    /// Append one result. Returns false when the result was filtered out.
    pub fn record(&mut self, result: &TickResult) -> io::Result<bool> {
        if self.classified_only && !result.is_classified() {
            return Ok(false);
        }
        let entry = JournalEntry {
            sequence: self.sequence,
            timestamp_ms: timestamp_ms(),
            result,
        };
        append_json_line(&self.path, &entry)?;
        self.sequence += 1;
        Ok(true)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lines written through this handle.
    pub fn entries_written(&self) -> u64 {
        self.sequence
    }
}
