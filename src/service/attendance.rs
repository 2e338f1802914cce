use crate::db::store::{AttendanceStore, ListFilter, StoreError};
use crate::model::attendance::{AttendanceRecord, EnrichedRecord, NewAttendance};
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of a listing: joined display data, or the plain rows when the
/// join is disabled or failed.
#[derive(Debug)]
pub enum Listing {
    Enriched(Vec<EnrichedRecord>),
    Base(Vec<AttendanceRecord>),
}

impl Listing {
    pub fn into_records(self) -> Vec<EnrichedRecord> {
        match self {
            Listing::Enriched(records) => records,
            Listing::Base(records) => records.into_iter().map(EnrichedRecord::from).collect(),
        }
    }

    pub fn is_enriched(&self) -> bool {
        matches!(self, Listing::Enriched(_))
    }
}

/// Create/list operations over a shared store handle.
pub struct AttendanceService {
    store: Arc<dyn AttendanceStore>,
    enrichment: bool,
}

impl AttendanceService {
    pub fn new(store: Arc<dyn AttendanceStore>, enrichment: bool) -> Self {
        Self { store, enrichment }
    }

    pub async fn mark(&self, new: &NewAttendance) -> Result<AttendanceRecord, StoreError> {
        self.store.insert(new).await
    }

    /// Tries the enriched query first when enabled; its failure is logged and
    /// answered with the base query, never returned.
    pub async fn list(&self, filter: &ListFilter) -> Result<Listing, StoreError> {
        if self.enrichment {
            match self.store.list_enriched(filter).await {
                Ok(records) => return Ok(Listing::Enriched(records)),
                Err(e) => warn!(error = %e, "Attendance enrichment failed, falling back to plain query"),
            }
        }

        let records = self.store.list(filter).await?;
        debug!(count = records.len(), "Fetched attendance");
        Ok(Listing::Base(records))
    }
}
