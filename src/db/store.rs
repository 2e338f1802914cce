use crate::model::attendance::{AttendanceRecord, AttendanceStatus, EnrichedRecord, NewAttendance};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use derive_more::Display;
use sqlx::{MySql, MySqlPool, QueryBuilder};
use std::str::FromStr;

/// Errors surfaced by an [`AttendanceStore`].
#[derive(Debug, Display)]
pub enum StoreError {
    #[display(fmt = "{}", _0)]
    Sqlx(sqlx::Error),
    /// A row that cannot be mapped back to a record.
    #[display(fmt = "{}", _0)]
    Corrupt(String),
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Sqlx(e) => Some(e),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Sqlx(e)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub event_id: Option<String>,
}

impl ListFilter {
    pub fn by_event(event_id: impl Into<String>) -> Self {
        Self {
            event_id: Some(event_id.into()),
        }
    }
}

/// Persistence for attendance records. Listings are ordered newest first
/// (`createdAt DESC`, ties broken by `id DESC`).
#[async_trait]
pub trait AttendanceStore: Send + Sync {
    async fn insert(&self, new: &NewAttendance) -> Result<AttendanceRecord, StoreError>;

    async fn list(&self, filter: &ListFilter) -> Result<Vec<AttendanceRecord>, StoreError>;

    /// Same ordering as [`AttendanceStore::list`], joined with user and event display data.
    async fn list_enriched(&self, filter: &ListFilter) -> Result<Vec<EnrichedRecord>, StoreError>;
}

#[derive(sqlx::FromRow)]
#[sqlx(rename_all = "camelCase")]
struct AttendanceRow {
    id: i64,
    user_id: String,
    event_id: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
#[sqlx(rename_all = "camelCase")]
struct EnrichedRow {
    #[sqlx(flatten)]
    base: AttendanceRow,
    user_name: Option<String>,
    event_title: Option<String>,
}

impl TryFrom<AttendanceRow> for AttendanceRecord {
    type Error = StoreError;

    fn try_from(row: AttendanceRow) -> Result<Self, Self::Error> {
        let status = AttendanceStatus::from_str(&row.status).map_err(|_| {
            StoreError::Corrupt(format!(
                "attendance {} has unknown status '{}'",
                row.id, row.status
            ))
        })?;

        Ok(AttendanceRecord {
            id: row.id,
            user_id: row.user_id,
            event_id: row.event_id,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<EnrichedRow> for EnrichedRecord {
    type Error = StoreError;

    fn try_from(row: EnrichedRow) -> Result<Self, Self::Error> {
        Ok(EnrichedRecord {
            record: row.base.try_into()?,
            user_name: row.user_name,
            event_title: row.event_title,
        })
    }
}

const BASE_SELECT: &str = r#"
    SELECT a.id, a.userId, a.eventId, a.status, a.createdAt, a.updatedAt
    FROM attendances a
"#;

const ENRICHED_SELECT: &str = r#"
    SELECT a.id, a.userId, a.eventId, a.status, a.createdAt, a.updatedAt,
           u.name AS userName, e.title AS eventTitle
    FROM attendances a
    LEFT JOIN users u ON u.id = a.userId
    LEFT JOIN events e ON e.id = a.eventId
"#;

/// MySQL-backed store. Cloning shares the underlying pool.
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    fn listing_query<'a>(select: &str, filter: &'a ListFilter) -> QueryBuilder<'a, MySql> {
        let mut qb = QueryBuilder::new(select);
        if let Some(event_id) = &filter.event_id {
            qb.push(" WHERE a.eventId = ").push_bind(event_id.as_str());
        }
        qb.push(" ORDER BY a.createdAt DESC, a.id DESC");
        qb
    }
}

#[async_trait]
impl AttendanceStore for MySqlStore {
    async fn insert(&self, new: &NewAttendance) -> Result<AttendanceRecord, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendances (userId, eventId, status, createdAt, updatedAt)
            VALUES (?, ?, ?, UTC_TIMESTAMP(), UTC_TIMESTAMP())
            "#,
        )
        .bind(&new.user_id)
        .bind(&new.event_id)
        .bind(new.status.as_ref())
        .execute(&self.pool)
        .await?;

        let id = i64::try_from(result.last_insert_id())
            .map_err(|_| StoreError::Corrupt("insert id out of range".to_owned()))?;

        let row = sqlx::query_as::<_, AttendanceRow>(&format!("{BASE_SELECT} WHERE a.id = ?"))
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        row.try_into()
    }

    async fn list(&self, filter: &ListFilter) -> Result<Vec<AttendanceRecord>, StoreError> {
        let rows = Self::listing_query(BASE_SELECT, filter)
            .build_query_as::<AttendanceRow>()
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(AttendanceRecord::try_from).collect()
    }

    async fn list_enriched(&self, filter: &ListFilter) -> Result<Vec<EnrichedRecord>, StoreError> {
        let rows = Self::listing_query(ENRICHED_SELECT, filter)
            .build_query_as::<EnrichedRow>()
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(EnrichedRecord::try_from).collect()
    }
}
