//! Configuration file loading.

use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use seatwatch_core::{CourseCode, Credentials, PortalUrl, WatchList};

/// Production portal base.
pub const DEFAULT_PORTAL_URL: &str = "https://passport.ustc.edu.cn";

/// Production academic-service base.
pub const DEFAULT_SERVICE_URL: &str = "https://jw.ustc.edu.cn";

const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;
const DEFAULT_REFRESH_CADENCE: u32 = 10;

/// The JSON configuration file, read once at startup.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub credentials: CredentialsConfig,
    /// Course codes to acquire.
    pub courses: Vec<String>,
    /// Seconds between poll cycles.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Poll cycles between wholesale refreshes of the section metadata.
    #[serde(default = "default_refresh_cadence")]
    pub refresh_cadence: u32,
    /// SSO portal base URL override.
    #[serde(default)]
    pub portal_url: Option<String>,
    /// Academic-service base URL override.
    #[serde(default)]
    pub service_url: Option<String>,
    /// Where to POST `{title, body}` notifications. Omit to log only.
    #[serde(default)]
    pub webhook: Option<WebhookConfig>,
    /// External command answering login challenges; the image arrives on
    /// its stdin, the answer is read from its stdout. Omit to submit an
    /// empty answer.
    #[serde(default)]
    pub solver_command: Option<Vec<String>>,
}

#[derive(Deserialize)]
pub struct CredentialsConfig {
    pub username: String,
    pub password: String,
}

// Intentionally hide the password in Debug output
impl fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookConfig {
    pub url: String,
}

impl Config {
    /// Load and validate the configuration at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Config = serde_json::from_str(&raw).context("invalid config file")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.courses.is_empty() {
            bail!("config lists no courses to watch");
        }
        if self.poll_interval_secs == 0 {
            bail!("poll_interval_secs must be at least 1");
        }
        if self.refresh_cadence == 0 {
            bail!("refresh_cadence must be at least 1");
        }
        if let Some(command) = &self.solver_command {
            if command.is_empty() {
                bail!("solver_command must name a program");
            }
        }
        Ok(())
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.credentials.username, &self.credentials.password)
    }

    pub fn watch_list(&self) -> Result<WatchList> {
        let codes = self
            .courses
            .iter()
            .map(CourseCode::new)
            .collect::<seatwatch_core::Result<Vec<_>>>()
            .context("invalid course code in config")?;
        Ok(WatchList::new(codes))
    }

    pub fn portal(&self) -> Result<PortalUrl> {
        PortalUrl::new(self.portal_url.as_deref().unwrap_or(DEFAULT_PORTAL_URL))
            .context("invalid portal_url")
    }

    pub fn service(&self) -> Result<PortalUrl> {
        PortalUrl::new(self.service_url.as_deref().unwrap_or(DEFAULT_SERVICE_URL))
            .context("invalid service_url")
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

fn default_refresh_cadence() -> u32 {
    DEFAULT_REFRESH_CADENCE
}
