use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ─── Source Records ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeadStatus {
    New,
    Contacted,
    Callback,
    Sale,
    NotInterested,
    #[serde(rename = "DNC")]
    DoNotCall,
    NoAnswer,
    Busy,
}

impl LeadStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::Contacted => "CONTACTED",
            Self::Callback => "CALLBACK",
            Self::Sale => "SALE",
            Self::NotInterested => "NOT_INTERESTED",
            Self::DoNotCall => "DNC",
            Self::NoAnswer => "NO_ANSWER",
            Self::Busy => "BUSY",
        }
    }

    /// Unknown codes degrade to `New` so a foreign status never drops a lead.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "CONTACTED" => Self::Contacted,
            "CALLBACK" => Self::Callback,
            "SALE" => Self::Sale,
            "NOT_INTERESTED" => Self::NotInterested,
            "DNC" => Self::DoNotCall,
            "NO_ANSWER" => Self::NoAnswer,
            "BUSY" => Self::Busy,
            _ => Self::New,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentStatus {
    #[serde(rename = "READY")]
    Ready,
    #[serde(rename = "INCALL")]
    InCall,
    #[serde(rename = "PAUSED")]
    Paused,
    #[serde(rename = "DISPO")]
    Dispo,
    #[serde(rename = "OFFLINE")]
    Offline,
}

impl AgentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "READY",
            Self::InCall => "INCALL",
            Self::Paused => "PAUSED",
            Self::Dispo => "DISPO",
            Self::Offline => "OFFLINE",
        }
    }

    pub fn parse(raw: &str) -> Self {
        match raw {
            "READY" => Self::Ready,
            "INCALL" => Self::InCall,
            "PAUSED" => Self::Paused,
            "DISPO" => Self::Dispo,
            _ => Self::Offline,
        }
    }

    /// Logged in and able to take or handling a call.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Ready | Self::InCall)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: String,
    pub status: LeadStatus,
    pub source: String,
    pub priority: u8,
    pub is_active: bool,
    pub entry_date: DateTime<Utc>,
    pub last_call_date: Option<NaiveDate>,
    pub campaign_origin_code: Option<String>,
}

impl Lead {
    /// Calendar day of entry in the local timezone.
    pub fn entry_day(&self) -> NaiveDate {
        self.entry_date.with_timezone(&Local).date_naive()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: String,
    pub status: AgentStatus,
    pub calls_today: u32,
    pub sales_today: u32,
    pub avg_call_time: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadFilter {
    pub status: Option<LeadStatus>,
    pub source: Option<String>,
    pub campaign_code: Option<String>,
    pub active_only: bool,
    pub entered_since: Option<DateTime<Utc>>,
}

impl LeadFilter {
    pub fn matches(&self, lead: &Lead) -> bool {
        if let Some(status) = self.status {
            if lead.status != status {
                return false;
            }
        }
        if let Some(source) = &self.source {
            if &lead.source != source {
                return false;
            }
        }
        if let Some(code) = &self.campaign_code {
            if lead.campaign_origin_code.as_deref() != Some(code.as_str()) {
                return false;
            }
        }
        if self.active_only && !lead.is_active {
            return false;
        }
        if let Some(since) = self.entered_since {
            if lead.entry_date < since {
                return false;
            }
        }
        true
    }
}

// ─── Live Metrics ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealTimeStats {
    pub active_agents: u32,
    pub today_calls: u64,
    pub conversion_rate: f64,
    pub avg_call_time: u64,
    pub calls_in_progress: u32,
    pub leads_today: u64,
    pub sales_today: u64,
    pub queue_size: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionState {
    Connected,
    Disconnected,
}

impl ConnectionState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connected => "CONNECTED",
            Self::Disconnected => "DISCONNECTED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveSnapshot {
    pub stats: RealTimeStats,
    pub connection: ConnectionState,
    pub updated_at: DateTime<Utc>,
}

impl LiveSnapshot {
    pub fn connected(&self) -> bool {
        self.connection == ConnectionState::Connected
    }
}

impl Default for LiveSnapshot {
    fn default() -> Self {
        Self {
            stats: RealTimeStats::default(),
            connection: ConnectionState::Connected,
            updated_at: Utc::now(),
        }
    }
}

// ─── Campaign Profitability ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignProfitability {
    pub campaign_code: String,
    pub campaign_name: String,
    pub total_investment: f64,
    pub leads_generated: u64,
    pub activated_leads: u64,
    pub conversions: u64,
    pub revenue: f64,
    pub roi: f64,
    pub cost_per_lead: f64,
    pub cost_per_activation: f64,
    pub cost_per_conversion: f64,
    pub profitability: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfitabilitySummary {
    pub total_investment: f64,
    pub total_revenue: f64,
    pub total_leads: u64,
    pub total_conversions: u64,
    pub overall_roi: f64,
    pub net_profit: f64,
}

// ─── Switch Status ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchStats {
    pub agents_online: u32,
    pub active_calls: u32,
    pub conversion_rate: f64,
    pub avg_call_time: u32,
    pub leads_loaded: u32,
    pub active_campaigns: u32,
    pub system_health: u32,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchStatus {
    pub stats: Option<SwitchStats>,
    pub loading: bool,
    pub error: Option<String>,
    pub last_success: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::{AgentStatus, Lead, LeadFilter, LeadStatus};
    use chrono::{Duration, Utc};

    fn lead(code: Option<&str>, status: LeadStatus, active: bool) -> Lead {
        Lead {
            id: "l-1".to_string(),
            status,
            source: "web".to_string(),
            priority: 5,
            is_active: active,
            entry_date: Utc::now(),
            last_call_date: None,
            campaign_origin_code: code.map(ToString::to_string),
        }
    }

    #[test]
    fn statuses_serialize_as_switch_codes() {
        assert_eq!(serde_json::to_string(&AgentStatus::InCall).expect("json"), "\"INCALL\"");
        assert_eq!(serde_json::to_string(&LeadStatus::NotInterested).expect("json"), "\"NOT_INTERESTED\"");
        assert_eq!(serde_json::to_string(&LeadStatus::DoNotCall).expect("json"), "\"DNC\"");
    }

    #[test]
    fn unknown_status_codes_degrade() {
        assert_eq!(LeadStatus::parse("XFER"), LeadStatus::New);
        assert_eq!(AgentStatus::parse("LAGGED"), AgentStatus::Offline);
        assert_eq!(LeadStatus::parse(LeadStatus::Sale.as_str()), LeadStatus::Sale);
    }

    #[test]
    fn empty_filter_matches_everything() {
        let filter = LeadFilter::default();
        assert!(filter.matches(&lead(None, LeadStatus::New, false)));
        assert!(filter.matches(&lead(Some("C1"), LeadStatus::Sale, true)));
    }

    #[test]
    fn filter_predicates_are_conjunctive() {
        let filter = LeadFilter {
            campaign_code: Some("C1".to_string()),
            active_only: true,
            ..Default::default()
        };
        assert!(filter.matches(&lead(Some("C1"), LeadStatus::New, true)));
        assert!(!filter.matches(&lead(Some("C1"), LeadStatus::New, false)));
        assert!(!filter.matches(&lead(Some("C2"), LeadStatus::New, true)));
        assert!(!filter.matches(&lead(None, LeadStatus::New, true)));

        let recent = LeadFilter {
            entered_since: Some(Utc::now() + Duration::hours(1)),
            ..Default::default()
        };
        assert!(!recent.matches(&lead(None, LeadStatus::New, true)));
    }
}
