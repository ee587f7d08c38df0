use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::CrawlError;

/// TOML-backed description of what to crawl: keywords, anchor dates and
/// the pacing/cap knobs. Secrets stay in env vars (`Config`).
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CrawlPlan {
    pub keywords: Vec<String>,
    /// Curated event dates, `"YYYY-MM-DD"`. Order is preserved.
    pub anchors: Vec<NaiveDate>,
    #[serde(default = "default_offsets")]
    pub offsets: Vec<i64>,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub backoff: BackoffSettings,
    #[serde(default)]
    pub cleaner: CleanerSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackoffSettings {
    pub base_secs: f64,
    pub jitter_secs: f64,
}

impl Default for BackoffSettings {
    fn default() -> Self {
        Self {
            base_secs: 15.5,
            jitter_secs: 6.3,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CleanerSettings {
    /// keyword -> phrases whose presence marks a row as a false positive.
    #[serde(default)]
    pub exclusions: BTreeMap<String, Vec<String>>,
}

fn default_offsets() -> Vec<i64> {
    vec![-1, 0, 1]
}

fn default_max_results() -> usize {
    1100
}

fn default_language() -> String {
    "ko".to_string()
}

impl CrawlPlan {
    /// Load and validate a plan file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read plan file: {}", path.display()))?;
        let plan: CrawlPlan = toml::from_str(&content)
            .with_context(|| format!("Failed to parse plan file: {}", path.display()))?;
        plan.validate()?;
        Ok(plan)
    }

    /// The SK Telecom USIM breach timeline (April to July 2025).
    pub fn reference() -> Self {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).expect("valid reference date");
        Self {
            keywords: vec!["SKT".to_string(), "유심".to_string()],
            anchors: vec![
                d(2025, 4, 18), // breach noticed internally
                d(2025, 4, 22), // KISA report
                d(2025, 4, 28), // public apology
                d(2025, 5, 7),  // group chairman apology
                d(2025, 5, 19), // first joint investigation results
                d(2025, 6, 13), // cancellation-fee dispute
                d(2025, 6, 16), // international cooperation
                d(2025, 6, 30), // government recommendation and compensation
                d(2025, 7, 4),  // final investigation results
                d(2025, 7, 7),  // follow-up sentiment
            ],
            offsets: default_offsets(),
            max_results: default_max_results(),
            language: default_language(),
            backoff: BackoffSettings::default(),
            cleaner: CleanerSettings {
                exclusions: BTreeMap::from([(
                    "유심".to_string(),
                    vec!["유심히".to_string()],
                )]),
            },
        }
    }

    pub fn validate(&self) -> std::result::Result<(), CrawlError> {
        if self.keywords.is_empty() {
            return Err(CrawlError::Config("plan has no keywords".into()));
        }
        if self.anchors.is_empty() {
            return Err(CrawlError::Config("plan has no anchor dates".into()));
        }
        if self.offsets.is_empty() {
            return Err(CrawlError::Config("plan has no day offsets".into()));
        }
        if self.max_results == 0 {
            return Err(CrawlError::Config("max_results must be at least 1".into()));
        }
        for keyword in &self.keywords {
            if keyword.trim().is_empty() {
                return Err(CrawlError::Config("keywords must not be blank".into()));
            }
            if keyword.contains('/') || keyword.contains('\\') {
                return Err(CrawlError::Config(format!(
                    "keyword {keyword:?} contains a path separator"
                )));
            }
        }
        // The longest pause is base + jitter; it has to fit in a Duration.
        let backoff = &self.backoff;
        for secs in [backoff.base_secs, backoff.jitter_secs, backoff.base_secs + backoff.jitter_secs] {
            if Duration::try_from_secs_f64(secs).is_err() {
                return Err(CrawlError::Config(format!(
                    "backoff base_secs = {}, jitter_secs = {} is not a usable pause length",
                    backoff.base_secs, backoff.jitter_secs
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_plan_is_valid() {
        let plan = CrawlPlan::reference();
        plan.validate().unwrap();
        assert_eq!(plan.keywords, vec!["SKT", "유심"]);
        assert_eq!(plan.anchors.len(), 10);
        assert_eq!(plan.max_results, 1100);
        assert_eq!(plan.offsets, vec![-1, 0, 1]);
    }

    #[test]
    fn minimal_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.toml");
        std::fs::write(
            &path,
            r#"
keywords = ["SKT"]
anchors = ["2025-04-18", "2025-04-22"]
"#,
        )
        .unwrap();

        let plan = CrawlPlan::load(&path).unwrap();
        assert_eq!(plan.anchors[1], NaiveDate::from_ymd_opt(2025, 4, 22).unwrap());
        assert_eq!(plan.max_results, 1100);
        assert_eq!(plan.language, "ko");
        assert!((plan.backoff.base_secs - 15.5).abs() < f64::EPSILON);
        assert!(plan.cleaner.exclusions.is_empty());
    }

    #[test]
    fn full_file_parses_nested_tables() {
        let plan: CrawlPlan = toml::from_str(
            r#"
keywords = ["유심"]
anchors = ["2025-05-07"]
offsets = [0]
max_results = 50
language = "en"

[backoff]
base_secs = 1.0
jitter_secs = 0.5

[cleaner.exclusions]
"유심" = ["유심히", "유심칩 이벤트"]
"#,
        )
        .unwrap();
        plan.validate().unwrap();
        assert_eq!(plan.offsets, vec![0]);
        assert_eq!(plan.cleaner.exclusions["유심"].len(), 2);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result: std::result::Result<CrawlPlan, _> =
            toml::from_str("keywords = [\"a\"]\nanchors = [\"2025-01-01\"]\ncap = 3\n");
        assert!(result.is_err());
    }

    #[test]
    fn keyword_with_separator_is_invalid() {
        let mut plan = CrawlPlan::reference();
        plan.keywords.push("a/b".into());
        assert!(matches!(plan.validate(), Err(CrawlError::Config(_))));
    }

    #[test]
    fn unrepresentable_backoff_is_invalid() {
        for (base, jitter) in [(1e30, 6.3), (15.5, f64::INFINITY), (-1.0, 0.0), (f64::NAN, 1.0)] {
            let mut plan = CrawlPlan::reference();
            plan.backoff = BackoffSettings {
                base_secs: base,
                jitter_secs: jitter,
            };
            assert!(
                matches!(plan.validate(), Err(CrawlError::Config(_))),
                "accepted base {base} jitter {jitter}"
            );
        }
    }

    #[test]
    fn huge_backoff_in_file_is_rejected_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.toml");
        std::fs::write(
            &path,
            "keywords = [\"SKT\"]\nanchors = [\"2025-04-18\"]\n[backoff]\nbase_secs = 1e30\njitter_secs = 6.3\n",
        )
        .unwrap();
        assert!(CrawlPlan::load(&path).is_err());
    }

    #[test]
    fn zero_cap_is_invalid() {
        let mut plan = CrawlPlan::reference();
        plan.max_results = 0;
        assert!(plan.validate().is_err());
    }
}
