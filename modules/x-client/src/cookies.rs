// Cookie store persisted between runs so the interactive login can be skipped.
// Backed by `cookie_store`, which applies Domain, Path, Max-Age and Expires;
// the file on disk is that crate's JSON form.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use cookie_store::CookieStore;
use reqwest::Url;
use reqwest_cookie_store::CookieStoreMutex;

use crate::error::{Result, XError};

#[derive(Default)]
pub struct CookieJar {
    store: CookieStore,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `Set-Cookie` header values received from `origin`. A cookie that
    /// arrives already expired (`Max-Age=0`, past `Expires`) evicts the stored
    /// cookie of the same name instead of being kept.
    pub fn absorb_set_cookie<'a>(&mut self, origin: &Url, headers: impl IntoIterator<Item = &'a str>) {
        for header in headers {
            if let Err(e) = self.store.parse(header, origin) {
                tracing::debug!(error = %e, "Ignoring Set-Cookie value");
            }
        }
    }

    /// Value of the unexpired cookie called `name`, for any domain.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.store
            .iter_unexpired()
            .find(|c| c.name() == name)
            .map(|c| c.value())
    }

    pub fn len(&self) -> usize {
        self.store.iter_unexpired().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Load a store written by [`CookieJar::save`]. Cookies that expired since
    /// are dropped on the way in.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .map_err(|e| XError::CookieStore(format!("read {}: {e}", path.display())))?;
        let store = cookie_store::serde::json::load(BufReader::new(file))
            .map_err(|e| XError::CookieStore(format!("parse {}: {e}", path.display())))?;
        Ok(Self { store })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| XError::CookieStore(format!("create {}: {e}", parent.display())))?;
        }
        let file = File::create(path)
            .map_err(|e| XError::CookieStore(format!("write {}: {e}", path.display())))?;
        let mut writer = BufWriter::new(file);
        // Session cookies count too: the provider hands out some without an expiry.
        cookie_store::serde::json::save_incl_expired_and_nonpersistent(&self.store, &mut writer)
            .map_err(|e| XError::CookieStore(format!("write {}: {e}", path.display())))?;
        writer
            .flush()
            .map_err(|e| XError::CookieStore(format!("write {}: {e}", path.display())))?;
        Ok(())
    }
}

impl fmt::Debug for CookieJar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.store.iter_unexpired().map(|c| c.name()).collect();
        f.debug_struct("CookieJar").field("cookies", &names).finish()
    }
}

/// Authenticated handle shared by every request of a run.
///
/// Requests go through a client whose cookie provider is the session's
/// store, so cookies are attached per domain and path, and any `Set-Cookie`
/// the provider answers with (refresh or expiry) lands in the same store.
pub struct Session {
    store: Arc<CookieStoreMutex>,
    http: reqwest::Client,
}

impl Session {
    pub fn new(jar: CookieJar) -> Result<Self> {
        let store = Arc::new(CookieStoreMutex::new(jar.store));
        let http = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&store))
            .build()?;
        Ok(Self { store, http })
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Current value of the unexpired cookie called `name`.
    pub fn cookie(&self, name: &str) -> Option<String> {
        let store = self.store.lock().ok()?;
        let value = store
            .iter_unexpired()
            .find(|c| c.name() == name)
            .map(|c| c.value().to_string());
        value
    }

    pub fn cookie_count(&self) -> usize {
        match self.store.lock() {
            Ok(store) => store.iter_unexpired().count(),
            Err(_) => 0,
        }
    }

    /// CSRF token the provider expects mirrored from the `ct0` cookie.
    pub fn csrf_token(&self) -> Option<String> {
        self.cookie("ct0").filter(|token| !token.is_empty())
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("cookies", &self.cookie_count())
            .finish()
    }
}
