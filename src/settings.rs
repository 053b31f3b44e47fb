use config::{Config, ConfigError};
use std::fmt;
use std::time::Duration;

pub const API_URL: &str = "https://www.hydrocapt.fr";
pub const ENV_PREFIX: &str = "HC";

const POLL_ATTEMPTS: u32 = 5;
const POLL_DELAY_MS: u64 = 2000;

/// Connection settings of a `HydrocaptClient`.
#[derive(Clone, serde::Deserialize)]
pub struct Settings {
    pub api_url: String,
    pub username: String,
    pub password: String,
    /// Reads performed after a write before giving up on it.
    pub poll_attempts: u32,
    pub poll_delay_ms: u64,
}

impl Settings {
    pub fn new(username: &str, password: &str) -> Settings {
        Settings {
            api_url: API_URL.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            poll_attempts: POLL_ATTEMPTS,
            poll_delay_ms: POLL_DELAY_MS,
        }
    }

    pub fn with_api_url(mut self, api_url: &str) -> Settings {
        self.api_url = api_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_polling(mut self, attempts: u32, delay: Duration) -> Settings {
        self.poll_attempts = attempts;
        self.poll_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn poll_delay(&self) -> Duration {
        Duration::from_millis(self.poll_delay_ms)
    }

    /// Read `HC_USERNAME`, `HC_PASSWORD` and the optional `HC_API_URL`,
    /// `HC_POLL_ATTEMPTS`, `HC_POLL_DELAY_MS`.
    pub fn from_env() -> Result<Settings, ConfigError> {
        Settings::from_env_prefix(ENV_PREFIX)
    }

    fn from_env_prefix(prefix: &str) -> Result<Settings, ConfigError> {
        let mut settings = Config::default();
        settings
            .set_default("api_url", API_URL)?
            .set_default("poll_attempts", POLL_ATTEMPTS as i64)?
            .set_default("poll_delay_ms", POLL_DELAY_MS as i64)?
            .merge(config::Environment::with_prefix(prefix))?;

        settings.try_into::<Settings>().map(|s| {
            let api_url = s.api_url.clone();
            s.with_api_url(&api_url)
        })
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("api_url", &self.api_url)
            .field("username", &self.username)
            .field("password", &"********")
            .field("poll_attempts", &self.poll_attempts)
            .field("poll_delay_ms", &self.poll_delay_ms)
            .finish()
    }
}
