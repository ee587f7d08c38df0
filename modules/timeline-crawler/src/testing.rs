// Test doubles for the crawl pipeline.
//
// - MockProvider (SearchProvider): scripted pages, call log, optional failure
// - MockAuthenticator (Authenticator): counts logins, optional failure
// - RecordingSleeper (Sleeper): records requested delays, never waits

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use x_client::{CookieJar, Credentials, SearchPage, Session, Tweet, Url};

use crate::backoff::Sleeper;
use crate::traits::{Authenticator, SearchProvider};

/// Tweet `n` with text `post {n}` and a legacy timestamp `n` seconds after
/// 2025-04-18 00:00:00 UTC.
pub fn tweet(n: usize) -> Tweet {
    let secs = n % 60;
    let mins = (n / 60) % 60;
    let hours = (n / 3600) % 24;
    Tweet {
        id: Some(n.to_string()),
        full_text: Some(format!("post {n}")),
        created_at: Some(format!(
            "Fri Apr 18 {hours:02}:{mins:02}:{secs:02} +0000 2025"
        )),
        ..Tweet::default()
    }
}

/// Cookie store as the provider hands it out after a login.
pub fn provider_jar(auth_token: &str, csrf: &str) -> CookieJar {
    let origin = Url::parse("https://x.com/i/api/1.1/onboarding/login.json")
        .expect("static provider url");
    let mut jar = CookieJar::new();
    jar.absorb_set_cookie(
        &origin,
        [
            format!("auth_token={auth_token}; Domain=.x.com; Path=/; Max-Age=31536000").as_str(),
            format!("ct0={csrf}; Domain=.x.com; Path=/; Max-Age=31536000").as_str(),
        ],
    );
    jar
}

// ---------------------------------------------------------------------------
// MockProvider
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
    Search { query: String },
    NextPage { query: String, cursor: String },
}

/// Serves the same scripted pages for every query. Cursors are `page-{i}`,
/// pointing at `pages[i]`.
pub struct MockProvider {
    pages: Vec<SearchPage>,
    fail_at: Option<usize>,
    calls: Mutex<Vec<ProviderCall>>,
}

impl MockProvider {
    pub fn from_pages(pages: Vec<SearchPage>) -> Self {
        Self {
            pages,
            fail_at: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Pages of the given sizes with consecutive tweet numbering.
    pub fn paged(sizes: &[usize]) -> Self {
        let mut next = 0;
        let pages = sizes
            .iter()
            .enumerate()
            .map(|(i, &size)| {
                let tweets = (next..next + size).map(tweet).collect();
                next += size;
                SearchPage {
                    tweets,
                    next_cursor: (i + 1 < sizes.len()).then(|| format!("page-{}", i + 1)),
                }
            })
            .collect();
        Self::from_pages(pages)
    }

    /// Fail the `n`th request (0-based, counting across all queries).
    pub fn failing_at(mut self, n: usize) -> Self {
        self.fail_at = Some(n);
        self
    }

    pub fn calls(&self) -> Vec<ProviderCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn search_queries(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ProviderCall::Search { query } => Some(query),
                ProviderCall::NextPage { .. } => None,
            })
            .collect()
    }

    fn record(&self, call: ProviderCall) -> Result<()> {
        let mut calls = self.calls.lock().unwrap();
        let index = calls.len();
        calls.push(call);
        if self.fail_at == Some(index) {
            bail!("MockProvider: scripted failure on request {index}");
        }
        Ok(())
    }
}

#[async_trait]
impl SearchProvider for MockProvider {
    async fn search(&self, _session: &Session, query: &str) -> Result<SearchPage> {
        self.record(ProviderCall::Search {
            query: query.to_string(),
        })?;
        Ok(self.pages.first().cloned().unwrap_or_default())
    }

    async fn next_page(&self, _session: &Session, query: &str, cursor: &str) -> Result<SearchPage> {
        self.record(ProviderCall::NextPage {
            query: query.to_string(),
            cursor: cursor.to_string(),
        })?;
        let index: usize = cursor
            .strip_prefix("page-")
            .and_then(|i| i.parse().ok())
            .ok_or_else(|| anyhow::anyhow!("MockProvider: unknown cursor {cursor}"))?;
        Ok(self.pages.get(index).cloned().unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// MockAuthenticator
// ---------------------------------------------------------------------------

pub struct MockAuthenticator {
    logins: AtomicUsize,
    fail: bool,
}

impl MockAuthenticator {
    pub fn new() -> Self {
        Self {
            logins: AtomicUsize::new(0),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            logins: AtomicUsize::new(0),
            fail: true,
        }
    }

    pub fn login_count(&self) -> usize {
        self.logins.load(Ordering::SeqCst)
    }
}

impl Default for MockAuthenticator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Authenticator for MockAuthenticator {
    async fn login(&self, credentials: &Credentials) -> Result<CookieJar> {
        self.logins.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            bail!("MockAuthenticator: login rejected for {}", credentials.username);
        }
        Ok(provider_jar(&format!("token-for-{}", credentials.username), "csrf"))
    }
}

// ---------------------------------------------------------------------------
// RecordingSleeper
// ---------------------------------------------------------------------------

pub struct RecordingSleeper {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self {
            sleeps: Mutex::new(Vec::new()),
        }
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.sleeps.lock().unwrap().len()
    }
}

impl Default for RecordingSleeper {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}
