use crate::models::{Agent, AgentStatus, Campaign, Lead, LeadStatus};
use chrono::{Duration, Utc};
use uuid::Uuid;

const CAMPAIGNS: [(&str, &str); 3] = [
    ("OUTB01", "Outbound Renewals"),
    ("INB02", "Inbound Quotes"),
    ("WEB03", "Web Form Follow-up"),
];

const SOURCES: [&str; 4] = ["web", "referral", "purchased-list", "inbound-call"];

const LEAD_CYCLE: [LeadStatus; 7] = [
    LeadStatus::New,
    LeadStatus::Contacted,
    LeadStatus::Callback,
    LeadStatus::Sale,
    LeadStatus::NoAnswer,
    LeadStatus::NotInterested,
    LeadStatus::Busy,
];

/// Static demo data set, shaped like a small single-site floor.
pub struct SampleData {
    pub leads: Vec<Lead>,
    pub agents: Vec<Agent>,
    pub campaigns: Vec<Campaign>,
}

impl SampleData {
    pub fn generate() -> Self {
        let campaigns = CAMPAIGNS
            .iter()
            .map(|(code, name)| Campaign {
                code: (*code).to_string(),
                name: (*name).to_string(),
            })
            .collect();

        let agents = vec![
            agent("agent-001", AgentStatus::Ready, 42, 6, 185),
            agent("agent-002", AgentStatus::InCall, 38, 4, 210),
            agent("agent-003", AgentStatus::InCall, 51, 9, 160),
            agent("agent-004", AgentStatus::Paused, 17, 1, 240),
            agent("agent-005", AgentStatus::Ready, 29, 3, 195),
            agent("agent-006", AgentStatus::Dispo, 33, 2, 175),
            agent("agent-007", AgentStatus::Offline, 0, 0, 0),
            agent("agent-008", AgentStatus::InCall, 45, 7, 150),
        ];

        let now = Utc::now();
        let leads = (0..36usize)
            .map(|index| {
                // Every fourth lead arrived without campaign attribution.
                let campaign_origin_code = if index % 4 == 3 {
                    None
                } else {
                    Some(CAMPAIGNS[index % CAMPAIGNS.len()].0.to_string())
                };
                let age_days = (index % 6) as i64;
                let status = LEAD_CYCLE[index % LEAD_CYCLE.len()];
                Lead {
                    id: Uuid::new_v4().to_string(),
                    status,
                    source: SOURCES[index % SOURCES.len()].to_string(),
                    priority: (index % 11) as u8,
                    is_active: status != LeadStatus::NotInterested && index % 5 != 0,
                    entry_date: now - Duration::days(age_days),
                    last_call_date: (status != LeadStatus::New)
                        .then(|| (now - Duration::days(age_days / 2)).date_naive()),
                    campaign_origin_code,
                }
            })
            .collect();

        Self {
            leads,
            agents,
            campaigns,
        }
    }
}

fn agent(id: &str, status: AgentStatus, calls_today: u32, sales_today: u32, avg_call_time: u32) -> Agent {
    Agent {
        id: id.to_string(),
        status,
        calls_today,
        sales_today,
        avg_call_time,
    }
}

#[cfg(test)]
mod tests {
    use super::SampleData;

    #[test]
    fn sample_covers_every_bucket_kind() {
        let sample = SampleData::generate();
        assert_eq!(sample.campaigns.len(), 3);
        assert_eq!(sample.agents.len(), 8);
        assert!(sample.leads.iter().any(|lead| lead.campaign_origin_code.is_none()));
        assert!(sample.leads.iter().all(|lead| lead.priority <= 10));
    }
}
