//! In-memory [`AttendanceStore`] for handler and service tests.

use super::store::{AttendanceStore, ListFilter, StoreError};
use crate::model::attendance::{AttendanceRecord, EnrichedRecord, NewAttendance};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<Vec<AttendanceRecord>>,
    user_names: HashMap<String, String>,
    event_titles: HashMap<String, String>,
    fail_enrichment: bool,
    fail_all: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user_name(mut self, user_id: &str, name: &str) -> Self {
        self.user_names.insert(user_id.to_owned(), name.to_owned());
        self
    }

    pub fn with_event_title(mut self, event_id: &str, title: &str) -> Self {
        self.event_titles.insert(event_id.to_owned(), title.to_owned());
        self
    }

    /// The joined query fails, as it does when `users`/`events` are missing.
    pub fn failing_enrichment(mut self) -> Self {
        self.fail_enrichment = true;
        self
    }

    /// Every operation fails as if the pool were unreachable.
    pub fn failing(mut self) -> Self {
        self.fail_all = true;
        self
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or_default()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.fail_all {
            return Err(StoreError::Sqlx(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    fn snapshot(&self, filter: &ListFilter) -> Vec<AttendanceRecord> {
        let records = self.records.lock().expect("memory store lock");
        let mut matching: Vec<_> = records
            .iter()
            .filter(|r| filter.event_id.as_deref().is_none_or(|e| r.event_id == e))
            .cloned()
            .collect();
        matching.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        matching
    }
}

#[async_trait]
impl AttendanceStore for MemoryStore {
    async fn insert(&self, new: &NewAttendance) -> Result<AttendanceRecord, StoreError> {
        self.check_available()?;
        let mut records = self.records.lock().expect("memory store lock");
        let now = Utc::now();
        let record = AttendanceRecord {
            id: records.len() as i64 + 1,
            user_id: new.user_id.clone(),
            event_id: new.event_id.clone(),
            status: new.status,
            created_at: now,
            updated_at: now,
        };
        records.push(record.clone());
        Ok(record)
    }

    async fn list(&self, filter: &ListFilter) -> Result<Vec<AttendanceRecord>, StoreError> {
        self.check_available()?;
        Ok(self.snapshot(filter))
    }

    async fn list_enriched(&self, filter: &ListFilter) -> Result<Vec<EnrichedRecord>, StoreError> {
        self.check_available()?;
        if self.fail_enrichment {
            return Err(StoreError::Sqlx(sqlx::Error::Protocol(
                "Table 'attendance.users' doesn't exist".to_owned(),
            )));
        }
        Ok(self
            .snapshot(filter)
            .into_iter()
            .map(|record| EnrichedRecord {
                user_name: self.user_names.get(&record.user_id).cloned(),
                event_title: self.event_titles.get(&record.event_id).cloned(),
                record,
            })
            .collect())
    }
}
