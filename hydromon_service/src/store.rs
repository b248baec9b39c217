//! Access to station tables and the status feed.
//!
//! [`ReadingStore`] is the seam between the engine and the database.
//! [`PgReadingStore`] reads the live PostgreSQL tables; [`MemoryStore`]
//! serves fixed batches for tests and offline replays.
//!
//! Station timestamps are stored as `dd/mm/YYYY HH:MM` text, which does
//! not sort or compare as a date in SQL. Location, project and row-limit
//! filters are pushed into the query; the date window is applied after
//! the rows are converted.

use crate::ingest::rows::{readings_from_rows, status_rows_from_json};
use crate::logging::{self, Component};
use crate::model::{Reading, StationType, StatusRow};
use crate::reception::DateWindow;
use crate::stations::{table_for, STATUS_TABLE};
use postgres::{Client, NoTls};
use serde_json::Value;
use std::collections::HashMap;
use std::env;
use std::fmt;

/// Default cap on rows fetched per table.
pub const DEFAULT_ROW_LIMIT: u32 = 10_000;

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ReadingQuery {
    /// Restrict to these locations. `None` fetches every location.
    pub location_ids: Option<Vec<String>>,
    pub project_name: Option<String>,
    /// Inclusive calendar window on the reading timestamp. Status rows are
    /// not windowed here; reception windows them by section date.
    pub window: Option<DateWindow>,
    pub limit: u32,
}

impl Default for ReadingQuery {
    fn default() -> Self {
        Self {
            location_ids: None,
            project_name: None,
            window: None,
            limit: DEFAULT_ROW_LIMIT,
        }
    }
}

impl ReadingQuery {
    pub fn with_limit(limit: u32) -> Self {
        Self { limit, ..Self::default() }
    }

    pub fn locations(mut self, ids: &[&str]) -> Self {
        self.location_ids = Some(ids.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn project(mut self, name: &str) -> Self {
        self.project_name = Some(name.to_string());
        self
    }

    pub fn window(mut self, window: DateWindow) -> Self {
        self.window = Some(window);
        self
    }

    fn matches_identity(&self, location_id: &str, project_name: &str) -> bool {
        let location_ok = self
            .location_ids
            .as_ref()
            .map(|ids| ids.iter().any(|id| id == location_id))
            .unwrap_or(true);
        let project_ok = self
            .project_name
            .as_ref()
            .map(|p| p == project_name)
            .unwrap_or(true);
        location_ok && project_ok
    }

    fn in_window(&self, reading: &Reading) -> bool {
        self.window.map(|w| w.contains(reading.date())).unwrap_or(true)
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum StoreError {
    /// The database could not be reached.
    Connection(String),
    /// A query failed or returned rows of an unexpected shape.
    Query(String),
    /// Connection settings are missing.
    Config(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Connection(msg) => write!(f, "Connection failed: {}", msg),
            StoreError::Query(msg) => write!(f, "Query failed: {}", msg),
            StoreError::Config(msg) => write!(f, "Store configuration error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

// ---------------------------------------------------------------------------
// Store trait
// ---------------------------------------------------------------------------

pub trait ReadingStore {
    /// Readings of one station type, in store order.
    fn fetch_readings(
        &mut self,
        station_type: StationType,
        query: &ReadingQuery,
    ) -> Result<Vec<Reading>, StoreError>;

    /// Status feed rows, in store order.
    fn fetch_status_rows(&mut self, query: &ReadingQuery) -> Result<Vec<StatusRow>, StoreError>;
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Serves pre-loaded batches. Filters behave like the database store:
/// identity filters and the row limit first, then the date window.
#[derive(Debug, Default)]
pub struct MemoryStore {
    readings: HashMap<StationType, Vec<Reading>>,
    status_rows: Vec<StatusRow>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds readings; each one is filed under its own station type.
    pub fn insert_readings(&mut self, readings: impl IntoIterator<Item = Reading>) {
        for reading in readings {
            self.readings.entry(reading.station_type()).or_default().push(reading);
        }
    }

    pub fn insert_status_rows(&mut self, rows: impl IntoIterator<Item = StatusRow>) {
        self.status_rows.extend(rows);
    }
}

impl ReadingStore for MemoryStore {
    fn fetch_readings(
        &mut self,
        station_type: StationType,
        query: &ReadingQuery,
    ) -> Result<Vec<Reading>, StoreError> {
        let stored = match self.readings.get(&station_type) {
            Some(rows) => rows,
            None => return Ok(Vec::new()),
        };
        Ok(stored
            .iter()
            .filter(|r| query.matches_identity(&r.location_id, &r.project_name))
            .take(query.limit as usize)
            .filter(|r| query.in_window(r))
            .cloned()
            .collect())
    }

    fn fetch_status_rows(&mut self, query: &ReadingQuery) -> Result<Vec<StatusRow>, StoreError> {
        Ok(self
            .status_rows
            .iter()
            .filter(|r| query.matches_identity(&r.location_id, &r.project_name))
            .take(query.limit as usize)
            .cloned()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// PostgreSQL store
// ---------------------------------------------------------------------------

pub struct PgReadingStore {
    client: Client,
}

impl PgReadingStore {
    pub fn connect(database_url: &str) -> Result<Self, StoreError> {
        let client =
            Client::connect(database_url, NoTls).map_err(|e| StoreError::Connection(e.to_string()))?;
        logging::debug(Component::Store, None, "Connected to database");
        Ok(Self { client })
    }

    /// Connects using `DATABASE_URL` from the environment or `.env`.
    pub fn from_env() -> Result<Self, StoreError> {
        dotenv::dotenv().ok();
        let url = env::var("DATABASE_URL")
            .map_err(|_| StoreError::Config("DATABASE_URL must be set".to_string()))?;
        Self::connect(&url)
    }

    /// Every matching row of `table` as a JSON object keyed by column.
    fn fetch_json(&mut self, table: &str, query: &ReadingQuery) -> Result<Vec<Value>, StoreError> {
        let sql = format!(
            "SELECT to_jsonb(t) FROM {} t \
             WHERE ($1::text[] IS NULL OR t.location_id::text = ANY($1)) \
               AND ($2::text IS NULL OR t.project_name::text = $2) \
             LIMIT $3",
            table
        );
        let limit = i64::from(query.limit);

        let rows = self
            .client
            .query(sql.as_str(), &[&query.location_ids, &query.project_name, &limit])
            .map_err(|e| {
                logging::log_store_failure(table, "SELECT", &e);
                StoreError::Query(e.to_string())
            })?;

        rows.iter()
            .map(|row| {
                row.try_get::<_, Value>(0)
                    .map_err(|e| StoreError::Query(format!("{}: {}", table, e)))
            })
            .collect()
    }
}

impl ReadingStore for PgReadingStore {
    fn fetch_readings(
        &mut self,
        station_type: StationType,
        query: &ReadingQuery,
    ) -> Result<Vec<Reading>, StoreError> {
        let table = table_for(station_type);
        let rows = self.fetch_json(table, query)?;
        let readings = readings_from_rows(station_type, &rows);
        Ok(readings.into_iter().filter(|r| query.in_window(r)).collect())
    }

    fn fetch_status_rows(&mut self, query: &ReadingQuery) -> Result<Vec<StatusRow>, StoreError> {
        let rows = self.fetch_json(STATUS_TABLE, query)?;
        Ok(status_rows_from_json(&rows))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
