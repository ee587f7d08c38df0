// Trait seams for the crawl pipeline.
//
// Authenticator: the one interactive login call.
// SearchProvider: search and next page, always with an explicit Session.
//
// XClient implements both; tests swap in MockAuthenticator / MockProvider
// from `testing` so the whole pipeline runs without network access.

use anyhow::Result;
use async_trait::async_trait;
use x_client::{CookieJar, Credentials, SearchPage, Session, XClient};

#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Log in and return the cookie store to persist.
    async fn login(&self, credentials: &Credentials) -> Result<CookieJar>;
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// First page of results for `query`, newest first.
    async fn search(&self, session: &Session, query: &str) -> Result<SearchPage>;

    /// The page after `cursor` for the same `query`.
    async fn next_page(&self, session: &Session, query: &str, cursor: &str)
        -> Result<SearchPage>;
}

#[async_trait]
impl Authenticator for XClient {
    async fn login(&self, credentials: &Credentials) -> Result<CookieJar> {
        Ok(XClient::login(self, credentials).await?)
    }
}

#[async_trait]
impl SearchProvider for XClient {
    async fn search(&self, session: &Session, query: &str) -> Result<SearchPage> {
        Ok(XClient::search(self, session, query).await?)
    }

    async fn next_page(
        &self,
        session: &Session,
        query: &str,
        cursor: &str,
    ) -> Result<SearchPage> {
        Ok(XClient::next_page(self, session, query, cursor).await?)
    }
}
