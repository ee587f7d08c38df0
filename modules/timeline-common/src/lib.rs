pub mod types;
pub mod config;
pub mod plan;
pub mod error;

pub use types::*;
pub use config::Config;
pub use plan::{BackoffSettings, CrawlPlan};
pub use error::CrawlError;
