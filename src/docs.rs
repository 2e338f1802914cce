use crate::api::attendance::{AttendanceView, CreateAttendance, CreatedAttendance};
use crate::model::attendance::AttendanceStatus;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance API",
        version = "0.1.0",
        description = r#"
## Attendance Tracking

Mark attendance for a user at an event and browse the history.

- `POST /api/attendance` records a mark (`present` by default)
- `GET /api/attendance` lists every mark, newest first
- `GET /api/attendance/{event_id}` lists the marks for one event

Errors are JSON objects with `error` and `message` fields.
"#,
    ),
    paths(
        crate::api::attendance::mark_attendance,
        crate::api::attendance::list_attendance,
        crate::api::attendance::list_event_attendance,
    ),
    components(schemas(AttendanceStatus, CreateAttendance, CreatedAttendance, AttendanceView)),
    tags((name = "Attendance", description = "Attendance marking and history"))
)]
pub struct ApiDoc;
