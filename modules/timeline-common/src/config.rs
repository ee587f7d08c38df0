use std::path::PathBuf;

/// Default provider API root.
pub const DEFAULT_API_BASE: &str = "https://x.com/i/api";

/// Runtime configuration loaded from environment variables (and `.env`).
/// Holds secrets and filesystem locations; the crawl plan itself lives in
/// the TOML `CrawlPlan`.
#[derive(Debug, Clone)]
pub struct Config {
    // Interactive login, only needed when no cookie store exists yet
    pub x_username: Option<String>,
    pub x_email: Option<String>,
    pub x_password: Option<String>,

    // Provider
    pub api_base: String,

    // Filesystem
    pub cookies_path: PathBuf,
    pub data_dir: PathBuf,
    pub clean_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            x_username: get("X_USERNAME"),
            x_email: get("X_EMAIL"),
            x_password: get("X_PASSWORD"),
            api_base: get("X_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            cookies_path: get("COOKIES_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("cookies.json")),
            data_dir: get("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data")),
            clean_dir: get("CLEAN_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("edit_data")),
        }
    }

    /// `(username, email, password)` when all three are present.
    pub fn login_credentials(&self) -> Option<(&str, &str, &str)> {
        Some((
            self.x_username.as_deref()?,
            self.x_email.as_deref()?,
            self.x_password.as_deref()?,
        ))
    }

    pub fn log_redacted(&self) {
        fn preview(val: &Option<String>) -> String {
            match val {
                Some(v) => {
                    let head: String = v.chars().take(3).collect();
                    format!("{head}...({} chars)", v.chars().count())
                }
                None => "<not set>".to_string(),
            }
        }

        tracing::info!("Config loaded:");
        tracing::info!("  X_USERNAME: {}", preview(&self.x_username));
        tracing::info!("  X_EMAIL: {}", preview(&self.x_email));
        tracing::info!(
            "  X_PASSWORD: {}",
            if self.x_password.is_some() { "<set>" } else { "<not set>" }
        );
        tracing::info!("  X_API_BASE: {}", self.api_base);
        tracing::info!("  COOKIES_PATH: {}", self.cookies_path.display());
        tracing::info!("  DATA_DIR: {}", self.data_dir.display());
    }
}
