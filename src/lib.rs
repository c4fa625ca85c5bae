pub mod aggregator;
pub mod dashboard;
pub mod db;
pub mod errors;
pub mod models;
pub mod poller;
pub mod profitability;
pub mod random;
pub mod scheduler;
pub mod settings;
pub mod source;

use crate::dashboard::Dashboard;
use crate::errors::AppResult;
use crate::settings::DashboardSettings;
use tracing_appender::non_blocking::WorkerGuard;

pub use crate::aggregator::{apply_jitter, derive_stats, MetricsAggregator};
pub use crate::poller::{StatsFetcher, StatusPoller};
pub use crate::profitability::{campaign_name, compute_profitability};
pub use crate::source::DataSource;

static LOG_GUARD: std::sync::OnceLock<WorkerGuard> = std::sync::OnceLock::new();

/// Runs a headless dashboard until Ctrl-C, logging every published snapshot.
pub async fn run(settings: DashboardSettings) -> AppResult<()> {
    let dashboard = Dashboard::from_settings(&settings)?;

    for row in dashboard.profitability() {
        tracing::info!(
            campaign = %row.campaign_code,
            name = %row.campaign_name,
            leads = row.leads_generated,
            conversions = row.conversions,
            roi = row.roi,
            profit = row.profitability,
            "campaign profitability"
        );
    }
    let summary = dashboard.profitability_summary();
    tracing::info!(
        leads = summary.total_leads,
        conversions = summary.total_conversions,
        roi = summary.overall_roi,
        net_profit = summary.net_profit,
        "portfolio profitability"
    );

    let mut live = dashboard.live();
    let mut switch = dashboard.switch_status();
    dashboard.start();

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                if let Err(error) = signal {
                    tracing::warn!(error = %error, "ctrl-c listener failed");
                }
                break;
            }
            changed = live.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = live.borrow_and_update().clone();
                tracing::info!(
                    connection = snapshot.connection.as_str(),
                    active_agents = snapshot.stats.active_agents,
                    today_calls = snapshot.stats.today_calls,
                    calls_in_progress = snapshot.stats.calls_in_progress,
                    conversion_rate = snapshot.stats.conversion_rate,
                    avg_call_time = snapshot.stats.avg_call_time,
                    leads_today = snapshot.stats.leads_today,
                    queue_size = snapshot.stats.queue_size,
                    "live stats"
                );
            }
            changed = switch.changed() => {
                if changed.is_err() {
                    break;
                }
                let status = switch.borrow_and_update().clone();
                match (&status.stats, &status.error) {
                    (_, Some(error)) => tracing::warn!(error = %error, "switch status degraded"),
                    (Some(stats), None) if !status.loading => tracing::info!(
                        agents_online = stats.agents_online,
                        active_calls = stats.active_calls,
                        system_health = stats.system_health,
                        "switch status"
                    ),
                    _ => {}
                }
            }
        }
    }

    dashboard.shutdown();
    Ok(())
}

pub fn init_tracing(settings: &DashboardSettings) -> Result<(), String> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log_level));

    let Some(log_dir) = &settings.log_dir else {
        return tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .try_init()
            .map_err(|error| error.to_string());
    };

    std::fs::create_dir_all(log_dir).map_err(|error| error.to_string())?;
    let file_appender = tracing_appender::rolling::daily(log_dir, "dashboard.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let _ = LOG_GUARD.set(guard);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_writer(non_blocking)
        .try_init()
        .map_err(|error| error.to_string())
}
