use std::path::PathBuf;

use anyhow::{Context, Result};
use timeline_common::{Config, CrawlError};
use tracing::info;
use x_client::{CookieJar, Credentials, Session};

use crate::traits::Authenticator;

/// Produces the single session a run uses: reloads the persisted cookie store
/// when present, otherwise logs in once and persists the result.
pub struct SessionManager {
    artifact_path: PathBuf,
    credentials: Option<Credentials>,
}

impl SessionManager {
    pub fn new(artifact_path: impl Into<PathBuf>, credentials: Option<Credentials>) -> Self {
        Self {
            artifact_path: artifact_path.into(),
            credentials,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let credentials = config
            .login_credentials()
            .map(|(username, email, password)| Credentials {
                username: username.to_string(),
                email: email.to_string(),
                password: password.to_string(),
            });
        Self::new(config.cookies_path.clone(), credentials)
    }

    pub async fn acquire(&self, auth: &dyn Authenticator) -> Result<Session> {
        if self.artifact_path.exists() {
            let jar = CookieJar::load(&self.artifact_path)
                .map_err(|e| CrawlError::SessionArtifact(e.to_string()))?;
            info!(
                path = %self.artifact_path.display(),
                cookies = jar.len(),
                "Loaded session from cookie store"
            );
            return Ok(Session::new(jar)?);
        }

        let credentials = self.credentials.as_ref().ok_or_else(|| {
            CrawlError::MissingCredentials(self.artifact_path.display().to_string())
        })?;

        let jar = auth
            .login(credentials)
            .await
            .context("Interactive login failed")?;
        jar.save(&self.artifact_path)
            .map_err(|e| CrawlError::SessionArtifact(e.to_string()))?;
        info!(
            path = %self.artifact_path.display(),
            cookies = jar.len(),
            "Logged in and saved cookie store"
        );

        Ok(Session::new(jar)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{provider_jar, MockAuthenticator};

    fn creds() -> Credentials {
        Credentials {
            username: "crawler".into(),
            email: "crawler@example.com".into(),
            password: "secret".into(),
        }
    }

    #[tokio::test]
    async fn persisted_store_skips_login() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");
        provider_jar("persisted", "csrf").save(&path).unwrap();

        let auth = MockAuthenticator::new();
        let manager = SessionManager::new(&path, Some(creds()));
        let session = manager.acquire(&auth).await.unwrap();

        assert_eq!(auth.login_count(), 0);
        assert_eq!(session.cookie("auth_token").as_deref(), Some("persisted"));
    }

    #[tokio::test]
    async fn persisted_store_works_without_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");
        CookieJar::new().save(&path).unwrap();

        let auth = MockAuthenticator::new();
        let session = SessionManager::new(&path, None).acquire(&auth).await;

        assert!(session.is_ok());
        assert_eq!(auth.login_count(), 0);
    }

    #[tokio::test]
    async fn login_once_then_persist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("cookies.json");

        let auth = MockAuthenticator::new();
        let manager = SessionManager::new(&path, Some(creds()));
        let session = manager.acquire(&auth).await.unwrap();

        assert_eq!(auth.login_count(), 1);
        assert!(path.exists());
        let persisted = CookieJar::load(&path).unwrap();
        assert_eq!(persisted.len(), 2);
        assert_eq!(persisted.get("auth_token"), Some("token-for-crawler"));

        // Second run reuses the artifact.
        let again = manager.acquire(&auth).await.unwrap();
        assert_eq!(auth.login_count(), 1);
        assert_eq!(again.cookie("auth_token"), session.cookie("auth_token"));
        assert_eq!(again.csrf_token().as_deref(), Some("csrf"));
    }

    #[tokio::test]
    async fn no_store_and_no_credentials_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");

        let auth = MockAuthenticator::new();
        let err = SessionManager::new(&path, None)
            .acquire(&auth)
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<CrawlError>(),
            Some(CrawlError::MissingCredentials(_))
        ));
        assert_eq!(auth.login_count(), 0);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn failed_login_persists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");

        let auth = MockAuthenticator::failing();
        let result = SessionManager::new(&path, Some(creds())).acquire(&auth).await;

        assert!(result.is_err());
        assert_eq!(auth.login_count(), 1);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn corrupt_store_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");
        std::fs::write(&path, "{ not json").unwrap();

        let auth = MockAuthenticator::new();
        let err = SessionManager::new(&path, Some(creds()))
            .acquire(&auth)
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<CrawlError>(),
            Some(CrawlError::SessionArtifact(_))
        ));
        assert_eq!(auth.login_count(), 0);
    }
}
