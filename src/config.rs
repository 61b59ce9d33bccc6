use std::env;
use std::time::Duration;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub coc_api_key: String,
    pub poll_interval_secs: u64,
    pub autokick_interval_secs: u64,
    pub member_fetch_delay_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        const DEFAULT_POLL_INTERVAL_SECS: u64 = 420;
        const DEFAULT_AUTOKICK_INTERVAL_SECS: u64 = 1800;
        const DEFAULT_MEMBER_FETCH_DELAY_MS: u64 = 1200;

        // The Discord client reads the token itself. Checked here so a
        // missing value fails at boot instead of inside client setup.
        env::var("DISCORD_BOT_TOKEN")
            .map_err(|_| AppError::Config("DISCORD_BOT_TOKEN must be set".into()))?;

        let coc_api_key = env::var("COC_API_KEY")
            .map_err(|_| AppError::Config("COC_API_KEY must be set".into()))?;

        let poll_interval_secs = env::var("POLL_INTERVAL_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_POLL_INTERVAL_SECS);

        let autokick_interval_secs = env::var("AUTOKICK_INTERVAL_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_AUTOKICK_INTERVAL_SECS);

        let member_fetch_delay_ms = env::var("MEMBER_FETCH_DELAY_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MEMBER_FETCH_DELAY_MS);

        Ok(Self {
            coc_api_key,
            poll_interval_secs,
            autokick_interval_secs,
            member_fetch_delay_ms,
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn autokick_interval(&self) -> Duration {
        Duration::from_secs(self.autokick_interval_secs)
    }

    pub fn member_fetch_delay(&self) -> Duration {
        Duration::from_millis(self.member_fetch_delay_ms)
    }
}
