pub mod sample;

use crate::models::{Agent, Campaign, Lead, LeadFilter};
use std::sync::{PoisonError, RwLock};

/// Read-only view of the lead/agent/campaign store. Implementations return
/// empty vectors instead of failing when the store is unavailable.
pub trait DataSource: Send + Sync {
    fn get_leads(&self, filter: Option<&LeadFilter>) -> Vec<Lead>;
    fn get_agents(&self) -> Vec<Agent>;
    fn get_campaigns(&self) -> Vec<Campaign>;
}

#[derive(Debug, Default)]
struct Records {
    leads: Vec<Lead>,
    agents: Vec<Agent>,
    campaigns: Vec<Campaign>,
}

/// Thread-safe in-memory store; the owner replaces records wholesale.
#[derive(Debug, Default)]
pub struct InMemoryDataSource {
    records: RwLock<Records>,
}

impl InMemoryDataSource {
    pub fn new(leads: Vec<Lead>, agents: Vec<Agent>, campaigns: Vec<Campaign>) -> Self {
        Self {
            records: RwLock::new(Records {
                leads,
                agents,
                campaigns,
            }),
        }
    }

    pub fn with_sample_data() -> Self {
        let sample = sample::SampleData::generate();
        Self::new(sample.leads, sample.agents, sample.campaigns)
    }

    pub fn replace_leads(&self, leads: Vec<Lead>) {
        self.records.write().unwrap_or_else(PoisonError::into_inner).leads = leads;
    }

    pub fn replace_agents(&self, agents: Vec<Agent>) {
        self.records.write().unwrap_or_else(PoisonError::into_inner).agents = agents;
    }

    pub fn replace_campaigns(&self, campaigns: Vec<Campaign>) {
        self.records.write().unwrap_or_else(PoisonError::into_inner).campaigns = campaigns;
    }
}

impl DataSource for InMemoryDataSource {
    fn get_leads(&self, filter: Option<&LeadFilter>) -> Vec<Lead> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        match filter {
            Some(filter) => records.leads.iter().filter(|lead| filter.matches(lead)).cloned().collect(),
            None => records.leads.clone(),
        }
    }

    fn get_agents(&self) -> Vec<Agent> {
        self.records.read().unwrap_or_else(PoisonError::into_inner).agents.clone()
    }

    fn get_campaigns(&self) -> Vec<Campaign> {
        self.records.read().unwrap_or_else(PoisonError::into_inner).campaigns.clone()
    }
}
