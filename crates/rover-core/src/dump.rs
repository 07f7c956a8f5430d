//! Write-only snapshot dumps for external inspection.
//!
//! After each inventory refresh the latest raw snapshot and position are
//! written to one JSON file per account. The core never reads these back.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;

use crate::api::InventorySnapshot;
use crate::geo::Coord;

/// Dump failures. Never fatal: the loop logs and moves on.
#[derive(Debug, Error)]
pub enum DumpError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct DumpRecord<'a> {
    written_at: String,
    position: &'a Coord,
    snapshot: &'a InventorySnapshot,
}

/// Writes the latest raw snapshot to `<dir>/<account>.json`.
#[derive(Debug, Clone)]
pub struct SnapshotDump {
    dir: PathBuf,
    account: String,
}

impl SnapshotDump {
    pub fn new(dir: impl Into<PathBuf>, account: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            account: account.into(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", self.account))
    }

    /// Overwrite the dump with the given position and snapshot.
    pub fn write(
        &self,
        position: &Coord,
        snapshot: &InventorySnapshot,
    ) -> Result<PathBuf, DumpError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path();
        let file = File::create(&path)?;
        serde_json::to_writer_pretty(
            BufWriter::new(file),
            &DumpRecord {
                written_at: Utc::now().to_rfc3339(),
                position,
                snapshot,
            },
        )?;
        Ok(path)
    }
}
