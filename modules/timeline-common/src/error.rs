use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("No cookie store at {0} and X_USERNAME / X_EMAIL / X_PASSWORD are not all set")]
    MissingCredentials(String),

    #[error("Session artifact error: {0}")]
    SessionArtifact(String),

    #[error("Output error: {0}")]
    Output(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
