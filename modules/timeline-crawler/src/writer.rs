use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use timeline_common::{CrawlError, CrawlTask, Record, OUTPUT_COLUMNS};
use tracing::debug;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Writes one CSV artifact per task under `dir`.
pub struct OutputWriter {
    dir: PathBuf,
    with_bom: bool,
}

impl OutputWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            with_bom: true,
        }
    }

    /// Plain UTF-8 without the leading byte-order mark.
    pub fn without_bom(mut self) -> Self {
        self.with_bom = false;
        self
    }

    pub fn path_for(&self, task: &CrawlTask) -> PathBuf {
        self.dir.join(format!("{}.csv", task.artifact_stem()))
    }

    /// Replace the task's artifact with `records`. The file is staged next to
    /// the target and renamed into place once complete.
    pub fn write(&self, task: &CrawlTask, records: &[Record]) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create output dir {}", self.dir.display()))?;

        let path = self.path_for(task);
        let staging = path.with_extension("csv.tmp");

        if let Err(e) = self.write_csv(&staging, records) {
            let _ = std::fs::remove_file(&staging);
            return Err(CrawlError::Output(format!("{}: {e}", staging.display())).into());
        }
        std::fs::rename(&staging, &path)
            .map_err(|e| CrawlError::Output(format!("rename to {}: {e}", path.display())))?;

        debug!(path = %path.display(), rows = records.len(), "Wrote artifact");
        Ok(path)
    }

    fn write_csv(&self, path: &Path, records: &[Record]) -> Result<()> {
        let mut file = File::create(path)?;
        if self.with_bom {
            file.write_all(UTF8_BOM)?;
        }

        let mut csv = csv::Writer::from_writer(file);
        csv.write_record(OUTPUT_COLUMNS)?;
        for record in records {
            csv.write_record([record.created_at_display().as_str(), record.text.as_str()])?;
        }
        let file = csv.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        Ok(())
    }
}
