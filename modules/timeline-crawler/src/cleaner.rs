// Post-crawl cleanup of the per-day CSV artifacts.
//
// Reads every `*.csv` the crawler produced, tidies timestamps and text, drops
// keyword-specific false positives, and writes same-named files elsewhere.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;
use tracing::{info, warn};

static RE_MENTION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@\w+\s*").unwrap());

#[derive(Debug, Deserialize)]
struct Row {
    created_at: String,
    text: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanStats {
    pub files: usize,
    pub rows_in: usize,
    pub rows_out: usize,
    pub rows_excluded: usize,
}

impl fmt::Display for CleanStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} files, {} rows in, {} rows out, {} excluded",
            self.files, self.rows_in, self.rows_out, self.rows_excluded
        )
    }
}

pub struct Cleaner {
    /// keyword -> phrases marking a row as a false positive for that keyword.
    exclusions: BTreeMap<String, Vec<String>>,
}

impl Cleaner {
    pub fn new(exclusions: BTreeMap<String, Vec<String>>) -> Self {
        Self { exclusions }
    }

    pub fn clean_dir(&self, input: &Path, output: &Path) -> Result<CleanStats> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(input)
            .with_context(|| format!("Failed to read input dir {}", input.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "csv"))
            .collect();
        files.sort();

        let mut stats = CleanStats::default();
        if files.is_empty() {
            warn!(dir = %input.display(), "No CSV files to clean");
            return Ok(stats);
        }

        std::fs::create_dir_all(output)
            .with_context(|| format!("Failed to create output dir {}", output.display()))?;

        info!(files = files.len(), "Cleaning crawl output");
        for path in &files {
            let file_stats = self
                .clean_file(path, output)
                .with_context(|| format!("Failed to clean {}", path.display()))?;
            stats.files += 1;
            stats.rows_in += file_stats.rows_in;
            stats.rows_out += file_stats.rows_out;
            stats.rows_excluded += file_stats.rows_excluded;
        }

        info!("Clean complete. {stats}");
        Ok(stats)
    }

    fn clean_file(&self, path: &Path, output: &Path) -> Result<CleanStats> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .context("Non UTF-8 file name")?;
        let phrases = self.exclusions_for(name);

        let raw = std::fs::read_to_string(path)?;
        let content = raw.strip_prefix('\u{feff}').unwrap_or(&raw);

        let mut reader = csv::Reader::from_reader(content.as_bytes());
        let mut writer = csv::Writer::from_path(output.join(name))?;
        // Header even when every row is dropped.
        writer.write_record(timeline_common::OUTPUT_COLUMNS)?;

        let mut stats = CleanStats::default();
        for row in reader.deserialize::<Row>() {
            let row = row?;
            stats.rows_in += 1;

            let text = clean_text(&row.text);
            if phrases.iter().any(|p| text.contains(*p)) {
                stats.rows_excluded += 1;
                continue;
            }

            writer.write_record([clean_created_at(&row.created_at).as_str(), text.as_str()])?;
            stats.rows_out += 1;
        }
        writer.flush()?;

        info!(
            file = name,
            rows_in = stats.rows_in,
            excluded = stats.rows_excluded,
            kept = stats.rows_out,
            "Cleaned file"
        );
        Ok(stats)
    }

    /// Phrases for every keyword whose `{keyword}_` prefix matches `file_name`.
    fn exclusions_for(&self, file_name: &str) -> Vec<&str> {
        self.exclusions
            .iter()
            .filter(|(keyword, _)| file_name.starts_with(&format!("{keyword}_")))
            .flat_map(|(_, phrases)| phrases.iter().map(|p| p.as_str()))
            .collect()
    }
}

/// Drop the UTC offset suffix the crawler writes.
pub fn clean_created_at(raw: &str) -> String {
    raw.replace("+00:00", "")
}

/// Decode HTML entities, remove `@mentions`, trim.
///
/// Entities decode the way a browser reads body text: every HTML5 named
/// reference, numeric references, and the legacy names that may omit the `;`.
pub fn clean_text(raw: &str) -> String {
    let unescaped = htmlize::unescape(raw);
    RE_MENTION.replace_all(&unescaped, "").trim().to_string()
}
