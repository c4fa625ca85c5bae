use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::time::Duration;

pub const CONFIG_ENV: &str = "OPS_DASHBOARD_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardSettings {
    pub refresh_interval_ms: u64,
    pub jitter_enabled: bool,
    pub connection_check_interval_ms: u64,
    pub disconnect_probability: f64,
    pub reconnect_delay_ms: u64,
    pub queue_min: u32,
    pub queue_max: u32,
    pub poll_interval_ms: u64,
    pub poll_latency_ms: u64,
    pub unit_cost: f64,
    pub unit_revenue: f64,
    pub database_path: Option<PathBuf>,
    pub seed_sample_data: bool,
    pub log_dir: Option<PathBuf>,
    pub log_level: String,
    pub random_seed: Option<u64>,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            refresh_interval_ms: 5_000,
            jitter_enabled: true,
            connection_check_interval_ms: 10_000,
            disconnect_probability: 0.02,
            reconnect_delay_ms: 2_000,
            queue_min: 5,
            queue_max: 20,
            poll_interval_ms: 30_000,
            poll_latency_ms: 500,
            unit_cost: 15_000.0,
            unit_revenue: 500_000.0,
            database_path: None,
            seed_sample_data: true,
            log_dir: None,
            log_level: "info".to_string(),
            random_seed: None,
        }
    }
}

impl DashboardSettings {
    /// Reads JSON settings; a missing file means defaults.
    pub fn load(path: &Path) -> AppResult<Self> {
        let settings = match std::fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str::<Self>(&raw)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "settings file not found, using defaults");
                Self::default()
            }
            Err(err) => return Err(err.into()),
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_env() -> AppResult<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        let intervals = [
            ("refreshIntervalMs", self.refresh_interval_ms),
            ("connectionCheckIntervalMs", self.connection_check_interval_ms),
            ("pollIntervalMs", self.poll_interval_ms),
        ];
        for (name, value) in intervals {
            if value == 0 {
                return Err(AppError::Config(format!("{name} must be greater than zero")));
            }
        }
        if !(0.0..=1.0).contains(&self.disconnect_probability) {
            return Err(AppError::Config(format!(
                "disconnectProbability must be within [0, 1], got {}",
                self.disconnect_probability
            )));
        }
        if self.queue_min >= self.queue_max {
            return Err(AppError::Config(format!(
                "queue range [{}, {}) is empty",
                self.queue_min, self.queue_max
            )));
        }
        let non_positive = |value: f64| value.is_nan() || value <= 0.0;
        if non_positive(self.unit_cost) || non_positive(self.unit_revenue) {
            return Err(AppError::Config("unitCost and unitRevenue must be positive".to_string()));
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn connection_check_interval(&self) -> Duration {
        Duration::from_millis(self.connection_check_interval_ms)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn poll_latency(&self) -> Duration {
        Duration::from_millis(self.poll_latency_ms)
    }
}
