use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chrono::TimeDelta;
use tracing::info;

use crate::error::DashboardError;

const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";

/// Sampling assumptions shared by every series the server pushes.
///
/// One interval is used for timestamps and for the trailing window, so the
/// window sample count is always `window / interval`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingConfig {
    pub interval: chrono::Duration,
    pub window: chrono::Duration,
}

impl SamplingConfig {
    pub const MAX_INTERVAL_MINUTES: i64 = 24 * 60;
    pub const MAX_WINDOW_DAYS: i64 = 366;

    pub fn new(interval_minutes: i64, window_days: i64) -> Result<Self, DashboardError> {
        if !(1..=Self::MAX_INTERVAL_MINUTES).contains(&interval_minutes) {
            return Err(DashboardError::Config(format!(
                "sample interval must be within 1..={} minutes, got {}",
                Self::MAX_INTERVAL_MINUTES,
                interval_minutes
            )));
        }
        if !(1..=Self::MAX_WINDOW_DAYS).contains(&window_days) {
            return Err(DashboardError::Config(format!(
                "window must be within 1..={} days, got {}",
                Self::MAX_WINDOW_DAYS,
                window_days
            )));
        }

        let interval = TimeDelta::try_minutes(interval_minutes).ok_or_else(|| {
            DashboardError::Config(format!("sample interval {} minutes overflows", interval_minutes))
        })?;
        let window = TimeDelta::try_days(window_days).ok_or_else(|| {
            DashboardError::Config(format!("window {} days overflows", window_days))
        })?;
        if window < interval {
            return Err(DashboardError::Config(format!(
                "window of {} days is shorter than one {} minute sample",
                window_days, interval_minutes
            )));
        }

        Ok(Self { interval, window })
    }

    /// Number of trailing samples covered by the window (672 for 15m / 7d).
    pub fn window_samples(&self) -> usize {
        (self.window.num_minutes() / self.interval.num_minutes()) as usize
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            interval: chrono::Duration::minutes(15),
            window: chrono::Duration::days(7),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub server_url: String,
    pub poll_interval: Duration,
    pub sampling: SamplingConfig,
    pub performance_capacity: usize,
    pub train_model: Option<String>,
    pub snapshot_dir: Option<PathBuf>,
}

impl DashboardConfig {
    pub fn from_env() -> Result<Self, DashboardError> {
        let server_url =
            env::var("DASHBOARD_SERVER_URL").unwrap_or_else(|_| DEFAULT_SERVER_URL.to_string());
        let poll_secs: u64 = parse_var("DASHBOARD_POLL_INTERVAL_SECS", 10)?;
        let interval_minutes: i64 = parse_var("DASHBOARD_SAMPLE_INTERVAL_MINUTES", 15)?;
        let window_days: i64 = parse_var("DASHBOARD_WINDOW_DAYS", 7)?;
        let performance_capacity: usize = parse_var("DASHBOARD_PERFORMANCE_CAPACITY", 500)?;

        if poll_secs == 0 {
            return Err(DashboardError::Config(
                "DASHBOARD_POLL_INTERVAL_SECS must be at least 1".to_string(),
            ));
        }
        if performance_capacity == 0 {
            return Err(DashboardError::Config(
                "DASHBOARD_PERFORMANCE_CAPACITY must be at least 1".to_string(),
            ));
        }

        let config = Self {
            server_url,
            poll_interval: Duration::from_secs(poll_secs),
            sampling: SamplingConfig::new(interval_minutes, window_days)?,
            performance_capacity,
            train_model: non_empty_var("DASHBOARD_TRAIN_MODEL"),
            snapshot_dir: non_empty_var("DASHBOARD_SNAPSHOT_DIR").map(PathBuf::from),
        };

        info!(
            "Configuration loaded: server={} poll={:?} window={} samples",
            config.server_url,
            config.poll_interval,
            config.sampling.window_samples()
        );

        Ok(config)
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            poll_interval: Duration::from_secs(10),
            sampling: SamplingConfig::default(),
            performance_capacity: 500,
            train_model: None,
            snapshot_dir: None,
        }
    }
}

fn parse_var<T>(key: &str, default: T) -> Result<T, DashboardError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => parse_value(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, DashboardError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| DashboardError::Config(format!("{} = {:?}: {}", key, raw, e)))
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
