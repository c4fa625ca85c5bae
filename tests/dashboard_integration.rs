use ops_dashboard_lib::dashboard::Dashboard;
use ops_dashboard_lib::db::Database;
use ops_dashboard_lib::models::{Agent, AgentStatus, Campaign, Lead, LeadStatus};
use ops_dashboard_lib::poller::SimulatedSwitch;
use ops_dashboard_lib::random::{self, RngSource, ScriptedRandom};
use ops_dashboard_lib::settings::DashboardSettings;
use ops_dashboard_lib::source::{DataSource, InMemoryDataSource};
use std::sync::Arc;
use std::time::Duration;

fn lead(id: &str, code: Option<&str>, status: LeadStatus, active: bool) -> Lead {
    Lead {
        id: id.to_string(),
        status,
        source: "web".to_string(),
        priority: 2,
        is_active: active,
        entry_date: chrono::Utc::now(),
        last_call_date: None,
        campaign_origin_code: code.map(ToString::to_string),
    }
}

fn agent(id: &str, status: AgentStatus, calls: u32, sales: u32, avg: u32) -> Agent {
    Agent {
        id: id.to_string(),
        status,
        calls_today: calls,
        sales_today: sales,
        avg_call_time: avg,
    }
}

fn floor() -> Arc<InMemoryDataSource> {
    Arc::new(InMemoryDataSource::new(
        vec![
            lead("1", Some("C1"), LeadStatus::Sale, true),
            lead("2", Some("C1"), LeadStatus::Contacted, true),
            lead("3", Some("C1"), LeadStatus::New, false),
            lead("4", None, LeadStatus::New, true),
            lead("5", None, LeadStatus::New, false),
        ],
        vec![
            agent("a1", AgentStatus::Ready, 10, 2, 90),
            agent("a2", AgentStatus::InCall, 5, 1, 110),
        ],
        vec![Campaign {
            code: "C1".to_string(),
            name: "Spring Outbound".to_string(),
        }],
    ))
}

#[tokio::test(start_paused = true)]
async fn dashboard_publishes_live_stats_and_switch_status() {
    let settings = DashboardSettings {
        jitter_enabled: false,
        ..Default::default()
    };
    let random = random::shared(ScriptedRandom::new().with_ranges([7]));
    let switch = Arc::new(SimulatedSwitch::new(random::shared(RngSource::seeded(4)), settings.poll_latency()));
    let dashboard = Dashboard::new(&settings, floor(), switch, random).expect("dashboard");

    let mut live = dashboard.live();
    let mut status = dashboard.switch_status();
    dashboard.start();

    live.changed().await.expect("live stats");
    let snapshot = live.borrow_and_update().clone();
    assert!(snapshot.connected());
    assert_eq!(snapshot.stats.active_agents, 2);
    assert_eq!(snapshot.stats.calls_in_progress, 1);
    assert_eq!(snapshot.stats.today_calls, 15);
    assert_eq!(snapshot.stats.sales_today, 3);
    assert_eq!(snapshot.stats.avg_call_time, 100);
    assert_eq!(snapshot.stats.conversion_rate, 20.0);
    assert_eq!(snapshot.stats.leads_today, 5);
    assert_eq!(snapshot.stats.queue_size, 7);

    let polled = status
        .wait_for(|status| status.stats.is_some() && !status.loading)
        .await
        .expect("switch stats")
        .clone();
    assert!(polled.error.is_none());

    dashboard.shutdown();
}

#[tokio::test]
async fn profitability_report_uses_catalog_names() {
    let settings = DashboardSettings::default();
    let random = random::shared(RngSource::seeded(1));
    let switch = Arc::new(SimulatedSwitch::new(random.clone(), Duration::from_millis(1)));
    let dashboard = Dashboard::new(&settings, floor(), switch, random).expect("dashboard");

    let report = dashboard.profitability();
    assert_eq!(report.len(), 2);
    assert_eq!(report[0].campaign_name, "Spring Outbound");
    assert_eq!(report[0].total_investment, 45_000.0);
    assert!((report[0].roi - 1011.11).abs() < 0.01);
    assert_eq!(report[1].campaign_code, "UNKNOWN");
    assert_eq!(report[1].campaign_name, "Campaign UNKNOWN");
    assert_eq!(report[1].roi, 0.0);

    let summary = dashboard.profitability_summary();
    assert_eq!(summary.total_leads, 5);
    assert_eq!(summary.total_conversions, 1);
}

#[tokio::test(start_paused = true)]
async fn empty_floor_degrades_to_zeroes() {
    let settings = DashboardSettings {
        jitter_enabled: false,
        seed_sample_data: false,
        random_seed: Some(8),
        ..Default::default()
    };
    let dashboard = Dashboard::from_settings(&settings).expect("dashboard");
    let mut live = dashboard.live();
    dashboard.start();

    live.changed().await.expect("live stats");
    let stats = live.borrow().stats.clone();
    assert_eq!(stats.active_agents, 0);
    assert_eq!(stats.avg_call_time, 0);
    assert_eq!(stats.conversion_rate, 0.0);
    assert!((5..20).contains(&stats.queue_size));
    assert!(dashboard.profitability().is_empty());

    dashboard.shutdown();
}

#[tokio::test(start_paused = true)]
async fn sqlite_source_feeds_the_dashboard() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("ops.db");
    let settings = DashboardSettings {
        database_path: Some(db_path.clone()),
        random_seed: Some(21),
        ..Default::default()
    };

    let dashboard = Dashboard::from_settings(&settings).expect("dashboard");
    let db = Database::new(&db_path).expect("reopen db");
    assert_eq!(db.get_agents().len(), 8);

    let report = dashboard.profitability();
    let total: u64 = report.iter().map(|row| row.leads_generated).sum();
    assert_eq!(total, db.get_leads(None).len() as u64);
    assert!(report.iter().any(|row| row.campaign_name == "Outbound Renewals"));

    let mut live = dashboard.live();
    dashboard.start();
    live.changed().await.expect("live stats");
    assert_eq!(live.borrow().stats.active_agents, 5);
    dashboard.shutdown();
}

#[test]
fn invalid_settings_refuse_to_build_a_dashboard() {
    let settings = DashboardSettings {
        refresh_interval_ms: 0,
        ..Default::default()
    };
    assert!(Dashboard::from_settings(&settings).is_err());

    let settings = DashboardSettings {
        disconnect_probability: f64::NAN,
        ..Default::default()
    };
    let random = random::shared(RngSource::seeded(1));
    let switch = Arc::new(SimulatedSwitch::new(random.clone(), Duration::from_millis(500)));
    assert!(Dashboard::new(&settings, floor(), switch, random).is_err());
}
