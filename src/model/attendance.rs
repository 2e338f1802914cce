use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// Attendance mark. Stored as `ENUM('present','absent')`.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    AsRefStr,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AttendanceStatus {
    #[default]
    Present,
    Absent,
}

/// A persisted attendance row. Append-only: never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceRecord {
    pub id: i64,
    pub user_id: String,
    pub event_id: String,
    pub status: AttendanceStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for a new record; the only fields ever written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAttendance {
    pub user_id: String,
    pub event_id: String,
    pub status: AttendanceStatus,
}

/// A record together with display data from the `users`/`events` tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichedRecord {
    pub record: AttendanceRecord,
    pub user_name: Option<String>,
    pub event_title: Option<String>,
}

impl From<AttendanceRecord> for EnrichedRecord {
    fn from(record: AttendanceRecord) -> Self {
        Self {
            record,
            user_name: None,
            event_title: None,
        }
    }
}

impl EnrichedRecord {
    /// Best-effort label: user name, then event title, then `User #<id>`.
    pub fn display_name(&self) -> Option<String> {
        non_blank(self.user_name.as_deref())
            .or_else(|| non_blank(self.event_title.as_deref()))
            .map(str::to_owned)
            .or_else(|| {
                non_blank(Some(self.record.user_id.as_str())).map(|uid| format!("User #{uid}"))
            })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
