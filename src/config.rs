use anyhow::{Context, Result, anyhow};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use strum_macros::{AsRefStr, EnumString};

use crate::engine::delay::{DelayModel, MissingCheckout};
use crate::engine::scheduler::Cadence;

/// Which directory listings, reports and mutations work against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum StoreKind {
    Source,
    #[default]
    Derived,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub server_addr: String,

    pub attendance_dir: PathBuf,
    pub derived_dir: PathBuf,
    pub profile_path: PathBuf,
    pub tracking_path: PathBuf,
    pub store: StoreKind,

    pub delay_model: DelayModel,
    pub missing_checkout: MissingCheckout,

    pub sync_enabled: bool,
    pub sync_interval: Duration,
    pub sync_backoff: Duration,

    pub api_prefix: String,
    pub log_dir: PathBuf,
    pub log_level: tracing::Level,
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parsed<T>(key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = or_default(key, default);
    raw.trim()
        .parse()
        .map_err(|e| anyhow!("{key}: invalid value '{raw}': {e}"))
}

/// Parse with a lowercased value, for the enum-valued settings.
fn parsed_lower<T>(key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = or_default(key, default);
    raw.trim()
        .to_lowercase()
        .parse()
        .map_err(|e| anyhow!("{key}: invalid value '{raw}': {e}"))
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,

            attendance_dir: required("ATTENDANCE_DIR")?.into(),
            derived_dir: or_default("DERIVED_DIR", "data/derived").into(),
            profile_path: or_default("PROFILE_PATH", "JSON/faculty_detail.json").into(),
            tracking_path: or_default("TRACKING_PATH", "data/sync_tracking.json").into(),
            store: parsed_lower("ATTENDANCE_STORE", "derived")?,

            delay_model: parsed_lower("DELAY_MODEL", "deadline")?,
            missing_checkout: parsed_lower("MISSING_CHECKOUT", "late")?,

            sync_enabled: parsed_lower("SYNC_ENABLED", "true")?,
            sync_interval: Duration::from_secs(parsed("SYNC_INTERVAL_SECS", "30")?),
            sync_backoff: Duration::from_secs(parsed("SYNC_BACKOFF_SECS", "60")?),

            api_prefix: or_default("API_PREFIX", "/api"),
            log_dir: or_default("LOG_DIR", "logs").into(),
            log_level: parsed("LOG_LEVEL", "debug")?,
        })
    }

    pub fn cadence(&self) -> Cadence {
        Cadence {
            interval: self.sync_interval,
            backoff: self.sync_backoff,
        }
    }

    /// Directory that listings, reports and mutations read and write.
    pub fn working_dir(&self) -> &PathBuf {
        match self.store {
            StoreKind::Source => &self.attendance_dir,
            StoreKind::Derived => &self.derived_dir,
        }
    }
}
