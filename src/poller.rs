use crate::errors::AppResult;
use crate::models::{SwitchStats, SwitchStatus};
use crate::random::{self, RandomSource, SharedRandom};
use crate::scheduler::{task, Scheduler};
use chrono::Utc;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::{watch, Notify};
use tokio::time::Duration;

pub type FetchFuture = Pin<Box<dyn Future<Output = AppResult<SwitchStats>> + Send>>;

/// Connector to the telephony switch's stats endpoint.
pub trait StatsFetcher: Send + Sync {
    fn fetch(&self) -> FetchFuture;
}

/// Stand-in for the switch API: waits a fixed latency, then reports bounded
/// random figures.
pub struct SimulatedSwitch {
    random: SharedRandom,
    latency: Duration,
}

impl SimulatedSwitch {
    pub fn new(random: SharedRandom, latency: Duration) -> Self {
        Self { random, latency }
    }
}

impl StatsFetcher for SimulatedSwitch {
    fn fetch(&self) -> FetchFuture {
        let random = self.random.clone();
        let latency = self.latency;
        Box::pin(async move {
            tokio::time::sleep(latency).await;
            let stats = simulated_stats(&mut **random::lock(&random));
            Ok(stats)
        })
    }
}

fn simulated_stats(random: &mut dyn RandomSource) -> SwitchStats {
    let mut draw = |low: i64, high: i64| random.range(low, high).max(0) as u32;
    SwitchStats {
        agents_online: draw(15, 35),
        active_calls: draw(20, 80),
        conversion_rate: f64::from(draw(80, 200)) / 10.0,
        avg_call_time: draw(120, 300),
        leads_loaded: draw(500, 2_000),
        active_campaigns: draw(3, 9),
        system_health: draw(92, 101),
        fetched_at: Utc::now(),
    }
}

/// Keeps the last good switch stats and refreshes them on a fixed cadence.
/// The cached stats stay visible while a fetch is in flight or after it fails.
pub struct StatusPoller {
    fetcher: Arc<dyn StatsFetcher>,
    publisher: Arc<watch::Sender<SwitchStatus>>,
    scheduler: Scheduler,
    trigger: Arc<Notify>,
    interval: Duration,
}

impl StatusPoller {
    pub fn new(fetcher: Arc<dyn StatsFetcher>, interval: Duration) -> Self {
        let (publisher, _) = watch::channel(SwitchStatus::default());
        Self {
            fetcher,
            publisher: Arc::new(publisher),
            scheduler: Scheduler::new("status-poller"),
            trigger: Arc::new(Notify::new()),
            interval,
        }
    }

    pub fn start(&self) {
        tracing::info!(interval_ms = self.interval.as_millis() as u64, "starting switch status poller");
        let fetcher = self.fetcher.clone();
        let publisher = self.publisher.clone();
        self.scheduler.every_or_triggered(
            "poll",
            self.interval,
            Duration::ZERO,
            self.trigger.clone(),
            task(move || poll_once(fetcher.clone(), publisher.clone())),
        );
    }

    /// Requests a poll now; the regular cadence is unaffected.
    pub fn refresh(&self) {
        self.trigger.notify_one();
    }

    pub fn subscribe(&self) -> watch::Receiver<SwitchStatus> {
        self.publisher.subscribe()
    }

    pub fn status(&self) -> SwitchStatus {
        self.publisher.borrow().clone()
    }

    pub fn stop(&self) {
        self.scheduler.shutdown();
        self.publisher.send_if_modified(|status| std::mem::replace(&mut status.loading, false));
    }
}

async fn poll_once(fetcher: Arc<dyn StatsFetcher>, publisher: Arc<watch::Sender<SwitchStatus>>) {
    publisher.send_modify(|status| status.loading = true);

    match fetcher.fetch().await {
        Ok(stats) => {
            tracing::debug!(
                agents_online = stats.agents_online,
                active_calls = stats.active_calls,
                "switch stats refreshed"
            );
            publisher.send_modify(|status| {
                status.last_success = Some(stats.fetched_at);
                status.stats = Some(stats);
                status.error = None;
                status.loading = false;
            });
        }
        Err(error) => {
            tracing::warn!(error = %error, "switch stats refresh failed");
            publisher.send_modify(|status| {
                status.error = Some(error.to_string());
                status.loading = false;
            });
        }
    }
}
