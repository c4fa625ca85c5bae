//! Live operational KPIs over the agent/lead snapshot.
//!
//! Three cooperating timers share one `Scheduler`:
//!
//! * the primary cycle re-derives [`RealTimeStats`] from the data source
//!   (immediately on start, then every refresh interval, or on `refresh()`),
//! * the jitter step nudges the last published stats half a period later to
//!   emulate live telemetry,
//! * the connectivity check occasionally drops the feed and restores it after
//!   the reconnect delay.
//!
//! Consumers read the latest [`LiveSnapshot`] through a `watch` receiver; the
//! timers are the only writers.

use crate::models::{Agent, AgentStatus, ConnectionState, Lead, LiveSnapshot, RealTimeStats};
use crate::random::{self, RandomSource, SharedRandom};
use crate::scheduler::{task, Scheduler};
use crate::settings::DashboardSettings;
use crate::source::DataSource;
use chrono::{Local, NaiveDate, Utc};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{watch, Notify};
use tokio::time::Duration;

/// Half-open range `[min, max)` the synthetic queue depth is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueRange {
    pub min: u32,
    pub max: u32,
}

impl Default for QueueRange {
    fn default() -> Self {
        Self { min: 5, max: 20 }
    }
}

/// Derives the KPI block from one snapshot. Only `queue_size` draws from
/// `random`; every other field is a pure function of the inputs.
pub fn derive_stats(
    agents: &[Agent],
    leads: &[Lead],
    today: NaiveDate,
    queue: QueueRange,
    random: &mut dyn RandomSource,
) -> RealTimeStats {
    let active_agents = agents.iter().filter(|agent| agent.status.is_active()).count() as u32;
    let calls_in_progress = agents
        .iter()
        .filter(|agent| agent.status == AgentStatus::InCall)
        .count() as u32;
    let today_calls: u64 = agents.iter().map(|agent| u64::from(agent.calls_today)).sum();
    let sales_today: u64 = agents.iter().map(|agent| u64::from(agent.sales_today)).sum();

    let avg_call_time = if agents.is_empty() {
        0
    } else {
        let total: u64 = agents.iter().map(|agent| u64::from(agent.avg_call_time)).sum();
        (total as f64 / agents.len() as f64).round() as u64
    };

    let leads_today = leads.iter().filter(|lead| lead.entry_day() == today).count() as u64;
    let queue_size = random.range(i64::from(queue.min), i64::from(queue.max)).max(0) as u32;

    RealTimeStats {
        active_agents,
        today_calls,
        conversion_rate: conversion_rate(sales_today, today_calls),
        avg_call_time,
        calls_in_progress,
        leads_today,
        sales_today,
        queue_size,
    }
}

/// Sales over calls as a percentage with one decimal; 0 without calls.
pub fn conversion_rate(sales: u64, calls: u64) -> f64 {
    if calls == 0 {
        return 0.0;
    }
    (sales as f64 / calls as f64 * 1000.0).round() / 10.0
}

/// Perturbs a published snapshot in place. Counts never go below zero.
pub fn apply_jitter(stats: &mut RealTimeStats, random: &mut dyn RandomSource) {
    stats.today_calls += random.range(0, 3).max(0) as u64;
    stats.calls_in_progress = if random.chance(0.5) {
        stats.calls_in_progress.saturating_add(1)
    } else {
        stats.calls_in_progress.saturating_sub(1)
    };
    let step = random.range(0, 3) - 1;
    stats.queue_size = (i64::from(stats.queue_size) + step).max(0) as u32;
}

/// `CONNECTED`/`DISCONNECTED` with a probabilistic drop and forced recovery.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectionMonitor {
    state: ConnectionState,
    disconnect_probability: f64,
}

impl ConnectionMonitor {
    pub fn new(disconnect_probability: f64) -> Self {
        Self {
            state: ConnectionState::Connected,
            disconnect_probability,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// One check tick. Returns `true` when this tick dropped the connection;
    /// ticks while already disconnected are ignored.
    pub fn check(&mut self, random: &mut dyn RandomSource) -> bool {
        if self.state == ConnectionState::Disconnected {
            return false;
        }
        if random.chance(self.disconnect_probability) {
            self.state = ConnectionState::Disconnected;
            return true;
        }
        false
    }

    pub fn reconnect(&mut self) {
        self.state = ConnectionState::Connected;
    }
}

#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    pub refresh_interval: Duration,
    pub jitter_enabled: bool,
    pub connection_check_interval: Duration,
    pub disconnect_probability: f64,
    pub reconnect_delay: Duration,
    pub queue: QueueRange,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self::from(&DashboardSettings::default())
    }
}

impl From<&DashboardSettings> for AggregatorConfig {
    fn from(settings: &DashboardSettings) -> Self {
        Self {
            refresh_interval: settings.refresh_interval(),
            jitter_enabled: settings.jitter_enabled,
            connection_check_interval: settings.connection_check_interval(),
            disconnect_probability: settings.disconnect_probability,
            reconnect_delay: settings.reconnect_delay(),
            queue: QueueRange {
                min: settings.queue_min,
                max: settings.queue_max,
            },
        }
    }
}

struct Shared {
    source: Arc<dyn DataSource>,
    random: SharedRandom,
    config: AggregatorConfig,
    publisher: watch::Sender<LiveSnapshot>,
}

impl Shared {
    fn recompute(&self) {
        let agents = self.source.get_agents();
        let leads = self.source.get_leads(None);
        let campaigns = self.source.get_campaigns();
        let today = Local::now().date_naive();

        let stats = {
            let mut random = random::lock(&self.random);
            derive_stats(&agents, &leads, today, self.config.queue, &mut **random)
        };
        tracing::debug!(
            agents = agents.len(),
            leads = leads.len(),
            campaigns = campaigns.len(),
            active_agents = stats.active_agents,
            queue_size = stats.queue_size,
            "live stats recomputed"
        );
        self.publisher.send_modify(|snapshot| {
            snapshot.stats = stats;
            snapshot.updated_at = Utc::now();
        });
    }

    fn jitter(&self) {
        let mut random = random::lock(&self.random);
        self.publisher.send_modify(|snapshot| {
            apply_jitter(&mut snapshot.stats, &mut **random);
            snapshot.updated_at = Utc::now();
        });
    }

    fn set_connection(&self, connection: ConnectionState) {
        self.publisher.send_modify(|snapshot| snapshot.connection = connection);
    }
}

pub struct MetricsAggregator {
    shared: Arc<Shared>,
    scheduler: Scheduler,
    refresh_trigger: Arc<Notify>,
}

impl MetricsAggregator {
    pub fn new(source: Arc<dyn DataSource>, random: SharedRandom, config: AggregatorConfig) -> Self {
        let (publisher, _) = watch::channel(LiveSnapshot::default());
        Self {
            shared: Arc::new(Shared {
                source,
                random,
                config,
                publisher,
            }),
            scheduler: Scheduler::new("metrics-aggregator"),
            refresh_trigger: Arc::new(Notify::new()),
        }
    }

    /// Arms the primary, jitter and connectivity timers. The primary cycle
    /// runs once right away.
    pub fn start(&self) {
        let config = &self.shared.config;
        tracing::info!(
            refresh_ms = config.refresh_interval.as_millis() as u64,
            check_ms = config.connection_check_interval.as_millis() as u64,
            "starting metrics aggregator"
        );

        let shared = self.shared.clone();
        self.scheduler.every_or_triggered(
            "recompute",
            config.refresh_interval,
            Duration::ZERO,
            self.refresh_trigger.clone(),
            task(move || {
                let shared = shared.clone();
                async move { shared.recompute() }
            }),
        );

        if config.jitter_enabled {
            let shared = self.shared.clone();
            self.scheduler.every(
                "jitter",
                config.refresh_interval,
                config.refresh_interval / 2,
                task(move || {
                    let shared = shared.clone();
                    async move { shared.jitter() }
                }),
            );
        }

        let shared = self.shared.clone();
        let monitor = Arc::new(Mutex::new(ConnectionMonitor::new(config.disconnect_probability)));
        self.scheduler.every(
            "connectivity",
            config.connection_check_interval,
            config.connection_check_interval,
            task(move || {
                let shared = shared.clone();
                let monitor = monitor.clone();
                async move { check_connection(shared, monitor).await }
            }),
        );
    }

    /// Requests an immediate recompute from source data, without jitter.
    pub fn refresh(&self) {
        self.refresh_trigger.notify_one();
    }

    pub fn subscribe(&self) -> watch::Receiver<LiveSnapshot> {
        self.shared.publisher.subscribe()
    }

    pub fn snapshot(&self) -> LiveSnapshot {
        self.shared.publisher.borrow().clone()
    }

    pub fn connected(&self) -> bool {
        self.shared.publisher.borrow().connected()
    }

    /// Cancels every timer and closes any outage in progress.
    pub fn stop(&self) {
        self.scheduler.shutdown();
        self.shared.publisher.send_if_modified(|snapshot| {
            std::mem::replace(&mut snapshot.connection, ConnectionState::Connected) != ConnectionState::Connected
        });
    }
}

async fn check_connection(shared: Arc<Shared>, monitor: Arc<Mutex<ConnectionMonitor>>) {
    let dropped = {
        let mut monitor = monitor.lock().unwrap_or_else(PoisonError::into_inner);
        let mut random = random::lock(&shared.random);
        monitor.check(&mut **random)
    };
    if !dropped {
        return;
    }

    tracing::warn!(
        reconnect_ms = shared.config.reconnect_delay.as_millis() as u64,
        "telemetry feed disconnected"
    );
    shared.set_connection(ConnectionState::Disconnected);

    tokio::time::sleep(shared.config.reconnect_delay).await;

    monitor
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .reconnect();
    shared.set_connection(ConnectionState::Connected);
    tracing::info!("telemetry feed reconnected");
}
