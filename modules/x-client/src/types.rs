use std::fmt;

use serde::{Deserialize, Serialize};

/// Account credentials used for the one-time interactive login.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Body of the login request. Field names follow the provider's onboarding flow.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub auth_info_1: &'a str,
    pub auth_info_2: &'a str,
    pub password: &'a str,
}

/// A single tweet as returned by the search timeline.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Tweet {
    #[serde(alias = "id_str")]
    pub id: Option<String>,
    pub text: Option<String>,
    pub full_text: Option<String>,
    /// Provider timestamp, usually `Fri Apr 18 12:34:56 +0000 2025`.
    pub created_at: Option<String>,
}

impl Tweet {
    /// Returns whichever text field is populated, preferring `full_text`.
    pub fn content(&self) -> Option<&str> {
        self.full_text.as_deref().or(self.text.as_deref())
    }
}

/// One page of search results plus the cursor for the next page, if any.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchPage {
    #[serde(default)]
    pub tweets: Vec<Tweet>,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

impl SearchPage {
    pub fn is_empty(&self) -> bool {
        self.tweets.is_empty()
    }
}
