use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::models::Snapshot;

/// Writes the latest snapshot to a CSV file, replacing the previous contents.
///
/// Layout: `last_published,<iso>` and `portfolio_value,<pv>` records, a blank
/// record, then the snapshot grid (header + one record per row identifier).
pub struct CsvSnapshotWriter {
    path: PathBuf,
}

impl CsvSnapshotWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, snapshot: &Snapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
        }

        // Write next to the target and rename, so readers never see a half-written file.
        let tmp_path = self.path.with_extension("csv.tmp");
        {
            let mut writer = csv::WriterBuilder::new()
                .flexible(true)
                .from_path(&tmp_path)
                .with_context(|| format!("opening {}", tmp_path.display()))?;

            writer.write_record(["last_published", snapshot.last_published_iso().as_str()])?;
            let pv = snapshot
                .portfolio_value()
                .map(|pv| pv.to_string())
                .unwrap_or_default();
            writer.write_record(["portfolio_value", pv.as_str()])?;
            writer.write_record([""])?;

            for line in snapshot.to_grid() {
                writer.write_record(&line)?;
            }
            writer.flush()?;
        }

        fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("replacing {}", self.path.display()))?;
        debug!("Wrote snapshot with {} rows to {}", snapshot.rows().len(), self.path.display());
        Ok(())
    }
}
