use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Days, FixedOffset, NaiveDate};
use timeline_common::{Record, CREATED_AT_FORMAT};
use tracing::{info, warn};
use x_client::{Session, Tweet};

use crate::backoff::Backoff;
use crate::normalize::normalize;
use crate::traits::SearchProvider;

/// Legacy provider timestamp, e.g. `Fri Apr 18 12:34:56 +0000 2025`.
const PROVIDER_TIME_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// Records collected for one task, in arrival order, never longer than the cap.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    pub records: Vec<Record>,
    /// Pages received, including the first.
    pub pages: usize,
    /// Whether records past the cap were discarded.
    pub truncated: bool,
}

impl ResultSet {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Drains one day's search results page by page.
pub struct DayFetcher {
    provider: Arc<dyn SearchProvider>,
    backoff: Backoff,
    language: String,
}

impl DayFetcher {
    pub fn new(provider: Arc<dyn SearchProvider>, backoff: Backoff, language: &str) -> Self {
        Self {
            provider,
            backoff,
            language: language.to_string(),
        }
    }

    pub async fn fetch_day(
        &self,
        session: &Session,
        keyword: &str,
        day: NaiveDate,
        cap: usize,
    ) -> Result<ResultSet> {
        let query = build_query(keyword, &self.language, day);
        info!(keyword, since = %day, query = query.as_str(), "Fetching day");

        let first = self.provider.search(session, &query).await?;
        let mut result = ResultSet {
            pages: 1,
            ..ResultSet::default()
        };
        append_page(&mut result.records, first.tweets);
        let mut cursor = first.next_cursor;

        while result.records.len() < cap {
            let Some(current) = cursor.take() else {
                break;
            };

            self.backoff.pause("next page").await;
            let page = self.provider.next_page(session, &query, &current).await?;
            if page.is_empty() {
                break;
            }
            result.pages += 1;
            append_page(&mut result.records, page.tweets);

            // A cursor that does not advance would page forever.
            cursor = page.next_cursor.filter(|next| *next != current);
        }

        if result.records.len() > cap {
            info!(
                keyword,
                day = %day,
                fetched = result.records.len(),
                cap,
                "Truncating to cap"
            );
            result.records.truncate(cap);
            result.truncated = true;
        }

        info!(
            keyword,
            day = %day,
            records = result.records.len(),
            pages = result.pages,
            "Day complete"
        );
        Ok(result)
    }
}

/// `"{keyword}" lang:{language} since:{day} until:{day+1}` (half-open range).
pub fn build_query(keyword: &str, language: &str, day: NaiveDate) -> String {
    let until = day.checked_add_days(Days::new(1)).unwrap_or(day);
    format!("\"{keyword}\" lang:{language} since:{day} until:{until}")
}

fn append_page(records: &mut Vec<Record>, tweets: Vec<Tweet>) {
    records.extend(tweets.into_iter().filter_map(to_record));
}

/// Map a raw tweet to a record. Tweets without a readable timestamp are dropped.
fn to_record(tweet: Tweet) -> Option<Record> {
    let Some(created_at) = tweet.created_at.as_deref().and_then(parse_created_at) else {
        warn!(
            id = tweet.id.as_deref().unwrap_or("?"),
            raw = tweet.created_at.as_deref().unwrap_or(""),
            "Dropping tweet with unreadable timestamp"
        );
        return None;
    };
    let text = normalize(tweet.content().unwrap_or_default());
    Some(Record { created_at, text })
}

/// Parse a provider timestamp without converting its timezone. Accepts the
/// legacy format, RFC 3339, the artifact format, and 10/13-digit epochs (UTC).
pub fn parse_created_at(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_str(raw, PROVIDER_TIME_FORMAT) {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, CREATED_AT_FORMAT) {
        return Some(dt);
    }
    if (raw.len() == 10 || raw.len() == 13) && raw.bytes().all(|b| b.is_ascii_digit()) {
        let secs: i64 = raw[..10].parse().ok()?;
        return DateTime::from_timestamp(secs, 0).map(|dt| dt.fixed_offset());
    }
    None
}
