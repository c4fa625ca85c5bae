use crate::errors::{AppError, AppResult};
use crate::models::{Agent, AgentStatus, Campaign, Lead, LeadFilter, LeadStatus};
use crate::source::sample::SampleData;
use crate::source::DataSource;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::{params, Connection};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

const SCHEMA_SQL: &str = include_str!("schema.sql");

/// SQLite-backed lead/agent/campaign store. Writes belong to the store's
/// owner; the metrics core only reads through `DataSource`.
#[derive(Debug)]
pub struct Database {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
}

impl Database {
    pub fn new(path: &Path) -> AppResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| AppError::Io(err.to_string()))?;
        }
        let conn = Connection::open(path).map_err(AppError::from)?;
        Self::with_connection(conn, Some(path.to_path_buf()))
    }

    pub fn in_memory() -> AppResult<Self> {
        let conn = Connection::open_in_memory().map_err(AppError::from)?;
        Self::with_connection(conn, None)
    }

    fn with_connection(conn: Connection, db_path: Option<PathBuf>) -> AppResult<Self> {
        conn.execute_batch(SCHEMA_SQL).map_err(AppError::from)?;
        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    fn conn(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Internal("database mutex poisoned".to_string()))
    }

    /// Loads the demo data set when the store holds no agents and no leads.
    pub fn seed_sample_data_if_empty(&self) -> AppResult<bool> {
        let conn = self.conn()?;
        let existing: i64 = conn.query_row(
            "SELECT (SELECT COUNT(1) FROM leads) + (SELECT COUNT(1) FROM agents)",
            [],
            |row| row.get(0),
        )?;
        drop(conn);
        if existing > 0 {
            return Ok(false);
        }

        let sample = SampleData::generate();
        for campaign in &sample.campaigns {
            self.upsert_campaign(campaign)?;
        }
        for agent in &sample.agents {
            self.upsert_agent(agent)?;
        }
        for lead in &sample.leads {
            self.upsert_lead(lead)?;
        }
        tracing::info!(
            leads = sample.leads.len(),
            agents = sample.agents.len(),
            campaigns = sample.campaigns.len(),
            "seeded sample data"
        );
        Ok(true)
    }

    pub fn upsert_campaign(&self, campaign: &Campaign) -> AppResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO campaigns (code, name) VALUES (?1, ?2)
             ON CONFLICT(code) DO UPDATE SET name = excluded.name",
            params![campaign.code, campaign.name],
        )?;
        Ok(())
    }

    pub fn upsert_agent(&self, agent: &Agent) -> AppResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO agents (id, status, calls_today, sales_today, avg_call_time)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
               status = excluded.status,
               calls_today = excluded.calls_today,
               sales_today = excluded.sales_today,
               avg_call_time = excluded.avg_call_time",
            params![
                agent.id,
                agent.status.as_str(),
                agent.calls_today,
                agent.sales_today,
                agent.avg_call_time,
            ],
        )?;
        Ok(())
    }

    pub fn upsert_lead(&self, lead: &Lead) -> AppResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO leads (
               id, status, source, priority, is_active, entry_date, last_call_date, campaign_origin_code
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(id) DO UPDATE SET
               status = excluded.status,
               source = excluded.source,
               priority = excluded.priority,
               is_active = excluded.is_active,
               entry_date = excluded.entry_date,
               last_call_date = excluded.last_call_date,
               campaign_origin_code = excluded.campaign_origin_code",
            params![
                lead.id,
                lead.status.as_str(),
                lead.source,
                lead.priority.min(10),
                lead.is_active,
                format_time(lead.entry_date),
                lead.last_call_date.map(|date| date.to_string()),
                lead.campaign_origin_code,
            ],
        )?;
        Ok(())
    }

    pub fn delete_lead(&self, id: &str) -> AppResult<bool> {
        let conn = self.conn()?;
        let changed = conn.execute("DELETE FROM leads WHERE id = ?1", [id])?;
        Ok(changed > 0)
    }

    pub fn list_leads(&self, filter: Option<&LeadFilter>) -> AppResult<Vec<Lead>> {
        let conn = self.conn()?;
        let mut query = String::from(
            "SELECT id, status, source, priority, is_active, entry_date, last_call_date, campaign_origin_code
             FROM leads WHERE 1 = 1",
        );

        let mut params_vec: Vec<String> = Vec::new();
        if let Some(filter) = filter {
            if let Some(status) = filter.status {
                query.push_str(" AND status = ?");
                params_vec.push(status.as_str().to_string());
            }
            if let Some(source) = &filter.source {
                query.push_str(" AND source = ?");
                params_vec.push(source.clone());
            }
            if let Some(code) = &filter.campaign_code {
                query.push_str(" AND campaign_origin_code = ?");
                params_vec.push(code.clone());
            }
            if filter.active_only {
                query.push_str(" AND is_active = 1");
            }
            if let Some(since) = filter.entered_since {
                query.push_str(" AND entry_date >= ?");
                params_vec.push(format_time(since));
            }
        }
        query.push_str(" ORDER BY entry_date ASC, id ASC");

        let mut statement = conn.prepare(&query)?;
        let rows = statement.query_map(rusqlite::params_from_iter(params_vec.iter()), parse_lead_row)?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    pub fn list_agents(&self) -> AppResult<Vec<Agent>> {
        let conn = self.conn()?;
        let mut statement = conn.prepare(
            "SELECT id, status, calls_today, sales_today, avg_call_time FROM agents ORDER BY id ASC",
        )?;
        let rows = statement.query_map([], parse_agent_row)?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    pub fn list_campaigns(&self) -> AppResult<Vec<Campaign>> {
        let conn = self.conn()?;
        let mut statement = conn.prepare("SELECT code, name FROM campaigns ORDER BY code ASC")?;
        let rows = statement.query_map([], |row| {
            Ok(Campaign {
                code: row.get(0)?,
                name: row.get(1)?,
            })
        })?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }
}

impl DataSource for Database {
    fn get_leads(&self, filter: Option<&LeadFilter>) -> Vec<Lead> {
        self.list_leads(filter).unwrap_or_else(|error| {
            tracing::warn!(error = %error, "lead query failed, serving empty snapshot");
            Vec::new()
        })
    }

    fn get_agents(&self) -> Vec<Agent> {
        self.list_agents().unwrap_or_else(|error| {
            tracing::warn!(error = %error, "agent query failed, serving empty snapshot");
            Vec::new()
        })
    }

    fn get_campaigns(&self) -> Vec<Campaign> {
        self.list_campaigns().unwrap_or_else(|error| {
            tracing::warn!(error = %error, "campaign query failed, serving empty snapshot");
            Vec::new()
        })
    }
}

fn format_time(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_lead_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Lead> {
    let priority: i64 = row.get(3)?;
    Ok(Lead {
        id: row.get(0)?,
        status: LeadStatus::parse(&row.get::<_, String>(1)?),
        source: row.get(2)?,
        priority: priority.clamp(0, 10) as u8,
        is_active: row.get::<_, i32>(4)? != 0,
        entry_date: parse_time(&row.get::<_, String>(5)?)?,
        last_call_date: row
            .get::<_, Option<String>>(6)?
            .map(|raw| parse_date(&raw))
            .transpose()?,
        campaign_origin_code: row.get(7)?,
    })
}

fn parse_agent_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Agent> {
    Ok(Agent {
        id: row.get(0)?,
        status: AgentStatus::parse(&row.get::<_, String>(1)?),
        calls_today: non_negative(row.get(2)?),
        sales_today: non_negative(row.get(3)?),
        avg_call_time: non_negative(row.get(4)?),
    })
}

fn non_negative(value: i64) -> u32 {
    value.clamp(0, i64::from(u32::MAX)) as u32
}

fn parse_time(raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|error| conversion_failure(error.to_string()))
}

fn parse_date(raw: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|error| conversion_failure(error.to_string()))
}

fn conversion_failure(message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, message)),
    )
}

#[cfg(test)]
mod tests {
    use super::Database;
    use crate::models::{Agent, AgentStatus, Campaign, Lead, LeadFilter, LeadStatus};
    use crate::source::DataSource;
    use chrono::{Duration, NaiveDate, Utc};

    fn lead(id: &str, code: Option<&str>, status: LeadStatus, active: bool) -> Lead {
        Lead {
            id: id.to_string(),
            status,
            source: "web".to_string(),
            priority: 4,
            is_active: active,
            entry_date: Utc::now(),
            last_call_date: NaiveDate::from_ymd_opt(2026, 3, 1),
            campaign_origin_code: code.map(ToString::to_string),
        }
    }

    #[test]
    fn database_round_trips_records() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = Database::new(&dir.path().join("nested").join("ops.db")).expect("db");

        db.upsert_campaign(&Campaign {
            code: "C1".to_string(),
            name: "Spring".to_string(),
        })
        .expect("campaign");
        db.upsert_agent(&Agent {
            id: "a1".to_string(),
            status: AgentStatus::InCall,
            calls_today: 5,
            sales_today: 1,
            avg_call_time: 110,
        })
        .expect("agent");
        let original = lead("l1", Some("C1"), LeadStatus::Sale, true);
        db.upsert_lead(&original).expect("lead");

        let leads = db.get_leads(None);
        assert_eq!(leads.len(), 1);
        assert_eq!(leads[0].id, "l1");
        assert_eq!(leads[0].status, LeadStatus::Sale);
        assert_eq!(leads[0].campaign_origin_code.as_deref(), Some("C1"));
        assert_eq!(leads[0].last_call_date, original.last_call_date);
        assert_eq!(
            leads[0].entry_date.timestamp_micros(),
            original.entry_date.timestamp_micros()
        );

        let agents = db.get_agents();
        assert_eq!(agents.len(), 1);
        assert_eq!(agents[0].status, AgentStatus::InCall);
        assert_eq!(db.get_campaigns()[0].name, "Spring");
    }

    #[test]
    fn upsert_replaces_existing_lead() {
        let db = Database::in_memory().expect("db");
        db.upsert_lead(&lead("l1", None, LeadStatus::New, true)).expect("insert");
        db.upsert_lead(&lead("l1", None, LeadStatus::Sale, false)).expect("update");

        let leads = db.list_leads(None).expect("leads");
        assert_eq!(leads.len(), 1);
        assert_eq!(leads[0].status, LeadStatus::Sale);
        assert!(!leads[0].is_active);

        assert!(db.delete_lead("l1").expect("delete"));
        assert!(!db.delete_lead("l1").expect("delete again"));
    }

    #[test]
    fn lead_filters_apply_in_sql() {
        let db = Database::in_memory().expect("db");
        db.upsert_lead(&lead("l1", Some("C1"), LeadStatus::Sale, true)).expect("l1");
        db.upsert_lead(&lead("l2", Some("C1"), LeadStatus::New, false)).expect("l2");
        db.upsert_lead(&lead("l3", None, LeadStatus::New, true)).expect("l3");

        let c1 = db.get_leads(Some(&LeadFilter {
            campaign_code: Some("C1".to_string()),
            ..Default::default()
        }));
        assert_eq!(c1.len(), 2);

        let active_new = db.get_leads(Some(&LeadFilter {
            status: Some(LeadStatus::New),
            active_only: true,
            ..Default::default()
        }));
        assert_eq!(active_new.len(), 1);
        assert_eq!(active_new[0].id, "l3");

        let future = db.get_leads(Some(&LeadFilter {
            entered_since: Some(Utc::now() + Duration::hours(1)),
            ..Default::default()
        }));
        assert!(future.is_empty());
    }

    #[test]
    fn sample_seed_runs_once() {
        let db = Database::in_memory().expect("db");
        assert!(db.seed_sample_data_if_empty().expect("seed"));
        assert!(!db.seed_sample_data_if_empty().expect("second seed"));
        assert_eq!(db.get_agents().len(), 8);
        assert_eq!(db.get_campaigns().len(), 3);
    }
}
