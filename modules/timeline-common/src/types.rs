use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

/// Rendering used for `created_at` in output artifacts: `2025-04-18 12:34:56+00:00`.
pub const CREATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S%:z";

/// Column names of every output artifact, in order.
pub const OUTPUT_COLUMNS: [&str; 2] = ["created_at", "text"];

// --- Tasks ---

/// One unit of crawl work: every post matching `keyword` on `day`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CrawlTask {
    pub keyword: String,
    pub day: NaiveDate,
}

impl CrawlTask {
    pub fn new(keyword: impl Into<String>, day: NaiveDate) -> Self {
        Self {
            keyword: keyword.into(),
            day,
        }
    }

    /// Artifact name without extension, e.g. `SKT_20250418`.
    pub fn artifact_stem(&self) -> String {
        format!("{}_{}", self.keyword, self.day.format("%Y%m%d"))
    }
}

impl std::fmt::Display for CrawlTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.keyword, self.day)
    }
}

// --- Records ---

/// A captured post, already normalized. Timestamps keep the provider's offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub created_at: DateTime<FixedOffset>,
    pub text: String,
}

impl Record {
    pub fn created_at_display(&self) -> String {
        self.created_at.format(CREATED_AT_FORMAT).to_string()
    }
}
