pub mod cookies;
pub mod error;
pub mod types;

pub use cookies::{CookieJar, Session};
pub use error::{Result, XError};
pub use reqwest::Url;
pub use types::{Credentials, SearchPage, Tweet};

use reqwest::header::SET_COOKIE;
use types::LoginRequest;

/// Results per search page requested from the provider.
const PAGE_SIZE: u32 = 20;

/// Search timeline ordering: newest first.
const SEARCH_PRODUCT: &str = "Latest";

pub struct XClient {
    client: reqwest::Client,
    base_url: String,
    locale: String,
}

impl XClient {
    pub fn new(base_url: impl Into<String>, locale: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            locale: locale.into(),
        }
    }

    /// Interactive login. Returns the cookie store the provider set on success.
    pub async fn login(&self, credentials: &Credentials) -> Result<CookieJar> {
        tracing::info!(username = %credentials.username, "Logging in to X");

        let body = LoginRequest {
            auth_info_1: &credentials.username,
            auth_info_2: &credentials.email,
            password: &credentials.password,
        };

        let url = format!("{}/1.1/onboarding/login.json", self.base_url);
        let resp = self
            .client
            .post(&url)
            .header("x-twitter-client-language", &self.locale)
            .json(&body)
            .send()
            .await?;

        let resp = check_status(resp).await?;

        let mut jar = CookieJar::new();
        jar.absorb_set_cookie(
            resp.url(),
            resp.headers()
                .get_all(SET_COOKIE)
                .iter()
                .filter_map(|v| v.to_str().ok()),
        );

        if jar.is_empty() {
            return Err(XError::Api {
                status: resp.status().as_u16(),
                message: "login succeeded but no session cookies were returned".to_string(),
            });
        }

        tracing::info!(cookies = jar.len(), "Login complete");
        Ok(jar)
    }

    /// First page of the newest-first search timeline.
    pub async fn search(&self, session: &Session, query: &str) -> Result<SearchPage> {
        self.search_timeline(session, query, None).await
    }

    /// Page following `cursor` for the same query.
    pub async fn next_page(&self, session: &Session, query: &str, cursor: &str) -> Result<SearchPage> {
        self.search_timeline(session, query, Some(cursor)).await
    }

    async fn search_timeline(
        &self,
        session: &Session,
        query: &str,
        cursor: Option<&str>,
    ) -> Result<SearchPage> {
        let url = format!("{}/2/search/timeline.json", self.base_url);

        let count = PAGE_SIZE.to_string();
        let mut params = vec![
            ("q", query),
            ("product", SEARCH_PRODUCT),
            ("count", count.as_str()),
        ];
        if let Some(cursor) = cursor {
            params.push(("cursor", cursor));
        }

        // Cookies come from the session's cookie provider.
        let mut req = session
            .http()
            .get(&url)
            .query(&params)
            .header("x-twitter-client-language", &self.locale);
        if let Some(token) = session.csrf_token() {
            req = req.header("x-csrf-token", token);
        }

        let resp = check_status(req.send().await?).await?;
        let body = resp.text().await?;
        let page: SearchPage = serde_json::from_str(&body)?;

        tracing::debug!(
            query,
            tweets = page.tweets.len(),
            has_next = page.next_cursor.is_some(),
            "Fetched search page"
        );
        Ok(page)
    }
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    if status.as_u16() == 429 {
        return Err(XError::RateLimited(body));
    }
    Err(XError::Api {
        status: status.as_u16(),
        message: body,
    })
}
