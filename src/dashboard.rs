use crate::aggregator::{AggregatorConfig, MetricsAggregator};
use crate::db::Database;
use crate::errors::AppResult;
use crate::models::{CampaignProfitability, LiveSnapshot, ProfitabilitySummary, SwitchStatus};
use crate::poller::{SimulatedSwitch, StatsFetcher, StatusPoller};
use crate::profitability::{summarize, with_campaign_names, ProfitabilityEngine};
use crate::random::{self, RngSource, SharedRandom};
use crate::settings::DashboardSettings;
use crate::source::{DataSource, InMemoryDataSource};
use std::sync::Arc;
use tokio::sync::watch;

/// Owns the live aggregator and the switch poller for one dashboard instance.
pub struct Dashboard {
    source: Arc<dyn DataSource>,
    aggregator: MetricsAggregator,
    poller: StatusPoller,
    engine: ProfitabilityEngine,
}

impl Dashboard {
    pub fn new(
        settings: &DashboardSettings,
        source: Arc<dyn DataSource>,
        fetcher: Arc<dyn StatsFetcher>,
        random: SharedRandom,
    ) -> AppResult<Self> {
        settings.validate()?;
        Ok(Self {
            aggregator: MetricsAggregator::new(source.clone(), random, AggregatorConfig::from(settings)),
            poller: StatusPoller::new(fetcher, settings.poll_interval()),
            engine: ProfitabilityEngine::new(settings.unit_cost, settings.unit_revenue),
            source,
        })
    }

    /// Wires the data source, random source and simulated switch the settings
    /// describe.
    pub fn from_settings(settings: &DashboardSettings) -> AppResult<Self> {
        settings.validate()?;
        let random = match settings.random_seed {
            Some(seed) => random::shared(RngSource::seeded(seed)),
            None => random::shared(RngSource::from_entropy()),
        };

        let source: Arc<dyn DataSource> = match &settings.database_path {
            Some(path) => {
                let db = Database::new(path)?;
                if settings.seed_sample_data {
                    db.seed_sample_data_if_empty()?;
                }
                tracing::info!(path = %path.display(), "using sqlite data source");
                Arc::new(db)
            }
            None if settings.seed_sample_data => Arc::new(InMemoryDataSource::with_sample_data()),
            None => Arc::new(InMemoryDataSource::default()),
        };

        let fetcher = Arc::new(SimulatedSwitch::new(random.clone(), settings.poll_latency()));
        Self::new(settings, source, fetcher, random)
    }

    pub fn start(&self) {
        self.aggregator.start();
        self.poller.start();
    }

    pub fn shutdown(&self) {
        self.aggregator.stop();
        self.poller.stop();
        tracing::info!("dashboard stopped");
    }

    pub fn live(&self) -> watch::Receiver<LiveSnapshot> {
        self.aggregator.subscribe()
    }

    pub fn live_snapshot(&self) -> LiveSnapshot {
        self.aggregator.snapshot()
    }

    pub fn refresh_live(&self) {
        self.aggregator.refresh();
    }

    pub fn switch_status(&self) -> watch::Receiver<SwitchStatus> {
        self.poller.subscribe()
    }

    pub fn refresh_switch(&self) {
        self.poller.refresh();
    }

    /// Profitability report over the current leads, named from the campaign
    /// catalog where possible.
    pub fn profitability(&self) -> Vec<CampaignProfitability> {
        let leads = self.source.get_leads(None);
        let report = self.engine.compute(&leads);
        with_campaign_names(report, &self.source.get_campaigns())
    }

    pub fn profitability_summary(&self) -> ProfitabilitySummary {
        summarize(&self.profitability())
    }
}
