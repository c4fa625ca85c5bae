use crate::models::{Campaign, CampaignProfitability, Lead, LeadStatus, ProfitabilitySummary};
use std::collections::HashMap;

pub const UNKNOWN_CAMPAIGN: &str = "UNKNOWN";
pub const UNIT_COST: f64 = 15_000.0;
pub const UNIT_REVENUE: f64 = 500_000.0;

/// Per-lead acquisition cost and per-sale revenue used to price each bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfitabilityEngine {
    pub unit_cost: f64,
    pub unit_revenue: f64,
}

impl Default for ProfitabilityEngine {
    fn default() -> Self {
        Self {
            unit_cost: UNIT_COST,
            unit_revenue: UNIT_REVENUE,
        }
    }
}

#[derive(Debug, Default)]
struct Bucket {
    leads: u64,
    activated: u64,
    conversions: u64,
}

impl ProfitabilityEngine {
    pub fn new(unit_cost: f64, unit_revenue: f64) -> Self {
        Self {
            unit_cost,
            unit_revenue,
        }
    }

    /// Buckets leads by campaign origin code, in first-seen order.
    pub fn compute(&self, leads: &[Lead]) -> Vec<CampaignProfitability> {
        let mut order: Vec<&str> = Vec::new();
        let mut buckets: HashMap<&str, Bucket> = HashMap::new();

        for lead in leads {
            let code = lead.campaign_origin_code.as_deref().unwrap_or(UNKNOWN_CAMPAIGN);
            let bucket = buckets.entry(code).or_insert_with(|| {
                order.push(code);
                Bucket::default()
            });
            bucket.leads += 1;
            if lead.is_active {
                bucket.activated += 1;
            }
            if lead.status == LeadStatus::Sale {
                bucket.conversions += 1;
            }
        }

        order
            .into_iter()
            .filter_map(|code| buckets.get(code).map(|bucket| self.price(code, bucket)))
            .collect()
    }

    fn price(&self, code: &str, bucket: &Bucket) -> CampaignProfitability {
        let total_investment = bucket.leads as f64 * self.unit_cost;
        let revenue = bucket.conversions as f64 * self.unit_revenue;
        let roi = if revenue > 0.0 && total_investment > 0.0 {
            (revenue - total_investment) / total_investment * 100.0
        } else {
            0.0
        };

        CampaignProfitability {
            campaign_code: code.to_string(),
            campaign_name: campaign_name(code),
            total_investment,
            leads_generated: bucket.leads,
            activated_leads: bucket.activated,
            conversions: bucket.conversions,
            revenue,
            roi,
            cost_per_lead: per_unit(total_investment, bucket.leads),
            cost_per_activation: per_unit(total_investment, bucket.activated),
            cost_per_conversion: per_unit(total_investment, bucket.conversions),
            profitability: revenue - total_investment,
        }
    }
}

fn per_unit(total: f64, count: u64) -> f64 {
    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}

/// Profitability report at the default unit economics.
pub fn compute_profitability(leads: &[Lead]) -> Vec<CampaignProfitability> {
    ProfitabilityEngine::default().compute(leads)
}

pub fn campaign_name(code: &str) -> String {
    format!("Campaign {code}")
}

/// Swaps synthesized names for catalog names where the catalog knows the code.
pub fn with_campaign_names(
    mut report: Vec<CampaignProfitability>,
    campaigns: &[Campaign],
) -> Vec<CampaignProfitability> {
    let names: HashMap<&str, &str> = campaigns
        .iter()
        .map(|campaign| (campaign.code.as_str(), campaign.name.as_str()))
        .collect();
    for row in &mut report {
        if let Some(name) = names.get(row.campaign_code.as_str()) {
            row.campaign_name = (*name).to_string();
        }
    }
    report
}

pub fn summarize(report: &[CampaignProfitability]) -> ProfitabilitySummary {
    let mut summary = report.iter().fold(ProfitabilitySummary::default(), |mut acc, row| {
        acc.total_investment += row.total_investment;
        acc.total_revenue += row.revenue;
        acc.total_leads += row.leads_generated;
        acc.total_conversions += row.conversions;
        acc
    });
    summary.net_profit = summary.total_revenue - summary.total_investment;
    summary.overall_roi = if summary.total_revenue > 0.0 && summary.total_investment > 0.0 {
        summary.net_profit / summary.total_investment * 100.0
    } else {
        0.0
    };
    summary
}
