use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;

use crate::poller::DEFAULT_POLL_INTERVAL;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the generation backend.
    pub backend_url: String,
    /// Base URL of the remote history store; sync is disabled when unset.
    pub remote_url: Option<String>,
    /// Delay between consecutive status queries for one job.
    pub poll_interval: Duration,
    /// Directory holding the embedded history database.
    pub data_dir: PathBuf,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let backend_url = env::var("SY_BACKEND_URL")
            .unwrap_or_else(|_| "http://localhost:8000".to_string());

        let remote_url = env::var("SY_REMOTE_URL").ok().filter(|url| !url.is_empty());

        let poll_interval = match env::var("SY_POLL_INTERVAL_SECS") {
            Ok(raw) => Duration::from_secs(
                raw.parse()
                    .context("SY_POLL_INTERVAL_SECS must be a number")?,
            ),
            Err(_) => DEFAULT_POLL_INTERVAL,
        };

        let data_dir = match env::var("SY_DATA_DIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => env::current_dir()?.join("outputs/history"),
        };

        Ok(Self {
            backend_url,
            remote_url,
            poll_interval,
            data_dir,
        })
    }
}
