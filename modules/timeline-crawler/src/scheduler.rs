use std::collections::HashSet;
use std::fmt;

use anyhow::{Context, Result};
use chrono::{NaiveDate, TimeDelta};
use timeline_common::CrawlTask;
use tracing::{debug, info, warn};
use x_client::Session;

use crate::backoff::Backoff;
use crate::fetcher::DayFetcher;
use crate::writer::OutputWriter;

/// Days around each anchor: the day before, the day itself, the day after.
pub const WINDOW_OFFSETS: [i64; 3] = [-1, 0, 1];

/// Expand anchors × offsets × keywords into the task queue, in that nesting
/// order. A (keyword, day) pair reached again through an overlapping window
/// keeps only its first position.
pub fn build_tasks(anchors: &[NaiveDate], offsets: &[i64], keywords: &[String]) -> Vec<CrawlTask> {
    let mut seen = HashSet::new();
    let mut tasks = Vec::with_capacity(anchors.len() * offsets.len() * keywords.len());

    for anchor in anchors {
        for &offset in offsets {
            let Some(day) = anchor.checked_add_signed(TimeDelta::days(offset)) else {
                warn!(%anchor, offset, "Day offset out of range, skipping");
                continue;
            };
            for keyword in keywords {
                let task = CrawlTask::new(keyword.clone(), day);
                if seen.insert(task.clone()) {
                    tasks.push(task);
                } else {
                    debug!(%task, "Overlapping window, task already queued");
                }
            }
        }
    }

    tasks
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    pub tasks_completed: usize,
    pub records_written: usize,
    pub tasks_truncated: usize,
    pub empty_tasks: usize,
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} tasks, {} records written, {} capped, {} empty",
            self.tasks_completed, self.records_written, self.tasks_truncated, self.empty_tasks
        )
    }
}

/// Runs tasks one after another: fetch, write, back off, next.
pub struct Scheduler {
    fetcher: DayFetcher,
    writer: OutputWriter,
    backoff: Backoff,
    cap: usize,
}

impl Scheduler {
    pub fn new(fetcher: DayFetcher, writer: OutputWriter, backoff: Backoff, cap: usize) -> Self {
        Self {
            fetcher,
            writer,
            backoff,
            cap,
        }
    }

    /// Execute `tasks` in order. The first failing task aborts the run.
    pub async fn run(&self, session: &Session, tasks: &[CrawlTask]) -> Result<RunStats> {
        let total = tasks.len();
        let mut stats = RunStats::default();
        info!(total, cap = self.cap, "Starting crawl");

        for (index, task) in tasks.iter().enumerate() {
            if index > 0 {
                self.backoff.pause("between tasks").await;
            }

            info!(
                task = index + 1,
                total,
                keyword = task.keyword.as_str(),
                day = %task.day,
                "Task started"
            );

            let result = self
                .fetcher
                .fetch_day(session, &task.keyword, task.day, self.cap)
                .await
                .with_context(|| format!("Fetch failed for task {task}"))?;

            let path = self
                .writer
                .write(task, &result.records)
                .with_context(|| format!("Write failed for task {task}"))?;

            stats.tasks_completed += 1;
            stats.records_written += result.len();
            if result.truncated {
                stats.tasks_truncated += 1;
            }
            if result.is_empty() {
                stats.empty_tasks += 1;
            }

            info!(
                task = index + 1,
                total,
                records = result.len(),
                running_total = stats.records_written,
                path = %path.display(),
                "Task complete"
            );
        }

        info!("Crawl complete. {stats}");
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::backoff::BackoffPolicy;
    use crate::testing::{MockProvider, RecordingSleeper};
    use x_client::CookieJar;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    fn keywords() -> Vec<String> {
        vec!["SKT".to_string(), "유심".to_string()]
    }

    #[test]
    fn nesting_order_is_anchor_offset_keyword() {
        let tasks = build_tasks(&[date(4, 18), date(4, 28)], &WINDOW_OFFSETS, &keywords());

        let rendered: Vec<String> = tasks.iter().map(|t| t.artifact_stem()).collect();
        assert_eq!(
            rendered,
            vec![
                "SKT_20250417", "유심_20250417",
                "SKT_20250418", "유심_20250418",
                "SKT_20250419", "유심_20250419",
                "SKT_20250427", "유심_20250427",
                "SKT_20250428", "유심_20250428",
                "SKT_20250429", "유심_20250429",
            ]
        );
    }

    #[test]
    fn schedule_is_deterministic() {
        let anchors = [date(5, 7), date(4, 22), date(7, 4)];
        let a = build_tasks(&anchors, &WINDOW_OFFSETS, &keywords());
        let b = build_tasks(&anchors, &WINDOW_OFFSETS, &keywords());
        assert_eq!(a, b);
        assert_eq!(a.len(), 18);
        // Input order of anchors is kept, not sorted.
        assert_eq!(a[0].day, date(5, 6));
    }

    #[test]
    fn overlapping_windows_keep_first_occurrence() {
        // 07-04 +1 = 07-05 and 07-06 -1 = 07-05
        let tasks = build_tasks(&[date(7, 4), date(7, 6)], &WINDOW_OFFSETS, &keywords());

        assert_eq!(tasks.len(), 10);
        let unique: HashSet<_> = tasks.iter().collect();
        assert_eq!(unique.len(), tasks.len());
        assert_eq!(tasks[4], CrawlTask::new("SKT", date(7, 5)));
        assert_eq!(tasks[6], CrawlTask::new("SKT", date(7, 6)));
    }

    #[test]
    fn empty_inputs_yield_no_tasks() {
        assert!(build_tasks(&[], &WINDOW_OFFSETS, &keywords()).is_empty());
        assert!(build_tasks(&[date(4, 18)], &WINDOW_OFFSETS, &[]).is_empty());
    }

    fn scheduler(
        provider: Arc<MockProvider>,
        sleeper: Arc<RecordingSleeper>,
        dir: &std::path::Path,
        cap: usize,
    ) -> Scheduler {
        let backoff = Backoff::new(
            BackoffPolicy::new(Duration::from_secs(15), Duration::from_secs(6)),
            sleeper,
        );
        Scheduler::new(
            DayFetcher::new(provider, backoff.clone(), "ko"),
            OutputWriter::new(dir),
            backoff,
            cap,
        )
    }

    #[tokio::test]
    async fn runs_sequentially_with_pause_between_tasks() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(MockProvider::paged(&[3]));
        let sleeper = Arc::new(RecordingSleeper::new());
        let scheduler = scheduler(provider.clone(), sleeper.clone(), dir.path(), 1100);
        let tasks = build_tasks(&[date(4, 18)], &WINDOW_OFFSETS, &keywords());

        let stats = scheduler
            .run(&Session::new(CookieJar::new()).unwrap(), &tasks)
            .await
            .unwrap();

        assert_eq!(stats.tasks_completed, 6);
        assert_eq!(stats.records_written, 18);
        assert_eq!(stats.tasks_truncated, 0);
        // single-page tasks: only the between-task pauses
        assert_eq!(sleeper.count(), 5);

        let queries = provider.search_queries();
        assert_eq!(queries.len(), 6);
        assert_eq!(queries[0], "\"SKT\" lang:ko since:2025-04-17 until:2025-04-18");
        assert_eq!(queries[1], "\"유심\" lang:ko since:2025-04-17 until:2025-04-18");
        assert_eq!(queries[5], "\"유심\" lang:ko since:2025-04-19 until:2025-04-20");
    }

    #[tokio::test]
    async fn failure_aborts_remaining_tasks() {
        let dir = tempfile::tempdir().unwrap();
        // Requests: task 1 search (0), task 2 search (1) fails.
        let provider = Arc::new(MockProvider::paged(&[2]).failing_at(1));
        let sleeper = Arc::new(RecordingSleeper::new());
        let scheduler = scheduler(provider.clone(), sleeper, dir.path(), 1100);
        let tasks = build_tasks(&[date(4, 18)], &WINDOW_OFFSETS, &keywords());

        let err = scheduler
            .run(&Session::new(CookieJar::new()).unwrap(), &tasks)
            .await
            .unwrap_err();

        assert!(format!("{err:#}").contains("[유심] 2025-04-17"));
        assert_eq!(provider.calls().len(), 2);

        let written: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(written.len(), 1, "only the completed task leaves an artifact");
        assert!(!dir.path().join("유심_20250417.csv").exists());
    }

    #[tokio::test]
    async fn capped_tasks_are_counted() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(MockProvider::paged(&[4, 4]));
        let sleeper = Arc::new(RecordingSleeper::new());
        let scheduler = scheduler(provider, sleeper, dir.path(), 5);
        let tasks = vec![CrawlTask::new("SKT", date(4, 18))];

        let stats = scheduler
            .run(&Session::new(CookieJar::new()).unwrap(), &tasks)
            .await
            .unwrap();

        assert_eq!(stats.records_written, 5);
        assert_eq!(stats.tasks_truncated, 1);
        assert_eq!(stats.to_string(), "1 tasks, 5 records written, 1 capped, 0 empty");
    }
}
