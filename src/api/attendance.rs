use crate::{
    api::error::ApiError,
    db::store::ListFilter,
    model::attendance::{AttendanceRecord, AttendanceStatus, EnrichedRecord, NewAttendance},
    service::attendance::AttendanceService,
};
use actix_web::{HttpResponse, web};
use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use tracing::{debug, error, info};
use utoipa::{
    ToSchema,
    openapi::schema::{ObjectBuilder, OneOfBuilder, Schema, SchemaType},
};

#[derive(Debug, Display, PartialEq, Eq)]
pub enum ValidationError {
    #[display(fmt = "userId and eventId are required")]
    MissingIdentifiers,
    #[display(fmt = "status must be one of: present, absent")]
    InvalidStatus,
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        ApiError::Validation(e.to_string())
    }
}

/// Request body for marking attendance. Unknown fields are ignored.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAttendance {
    #[schema(schema_with = identifier_schema)]
    pub user_id: Option<Value>,
    #[schema(schema_with = identifier_schema)]
    pub event_id: Option<Value>,
    /// Defaults to `present`
    #[schema(example = "present", value_type = Option<AttendanceStatus>)]
    pub status: Option<Value>,
}

/// Identifiers arrive either as text or as JSON numbers.
fn identifier_schema() -> Schema {
    let text = ObjectBuilder::new()
        .schema_type(SchemaType::String)
        .min_length(Some(1))
        .example(Some(Value::from("U1")));
    let number = ObjectBuilder::new()
        .schema_type(SchemaType::Integer)
        .minimum(Some(1.0))
        .example(Some(Value::from(42)));

    Schema::OneOf(
        OneOfBuilder::new()
            .item(Schema::Object(text.build()))
            .item(Schema::Object(number.build()))
            .description(Some("Non-blank string or positive integer"))
            .build(),
    )
}

impl CreateAttendance {
    pub fn validate(self) -> Result<NewAttendance, ValidationError> {
        let (Some(user_id), Some(event_id)) = (
            identifier(self.user_id.as_ref()),
            identifier(self.event_id.as_ref()),
        ) else {
            return Err(ValidationError::MissingIdentifiers);
        };

        let status = match self.status {
            None | Some(Value::Null) => AttendanceStatus::default(),
            Some(Value::String(s)) if s.is_empty() => AttendanceStatus::default(),
            Some(Value::String(s)) => {
                AttendanceStatus::from_str(&s).map_err(|_| ValidationError::InvalidStatus)?
            }
            Some(_) => return Err(ValidationError::InvalidStatus),
        };

        Ok(NewAttendance {
            user_id,
            event_id,
            status,
        })
    }
}

/// Identifiers are non-blank strings or positive integers; anything else is
/// treated as absent.
fn identifier(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_owned())
        }
        Value::Number(n) => n.as_u64().filter(|v| *v > 0).map(|v| v.to_string()),
        _ => None,
    }
}

/// A freshly created record. `date` mirrors `createdAt`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatedAttendance {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "U1")]
    pub user_id: String,
    #[schema(example = "E1")]
    pub event_id: String,
    pub status: AttendanceStatus,
    #[schema(example = "2026-01-01T09:00:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
    #[schema(example = "2026-01-01T09:00:00Z", format = "date-time", value_type = String)]
    pub updated_at: DateTime<Utc>,
    #[schema(example = "2026-01-01T09:00:00Z", format = "date-time", value_type = String)]
    pub date: DateTime<Utc>,
}

impl From<AttendanceRecord> for CreatedAttendance {
    fn from(r: AttendanceRecord) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            event_id: r.event_id,
            status: r.status,
            created_at: r.created_at,
            updated_at: r.updated_at,
            date: r.created_at,
        }
    }
}

/// A listed record, shaped for display.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceView {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "U1")]
    pub user_id: String,
    #[schema(example = "E1")]
    pub event_id: String,
    pub status: AttendanceStatus,
    #[schema(example = "2026-01-01T09:00:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
    #[schema(example = "2026-01-01T09:00:00Z", format = "date-time", value_type = String)]
    pub updated_at: DateTime<Utc>,
    #[schema(example = "2026-01-01T09:00:00Z", format = "date-time", value_type = String)]
    pub date: DateTime<Utc>,
    /// User name, event title, or `User #<userId>`
    #[schema(example = "User #U1", nullable = true)]
    pub name: Option<String>,
}

impl From<EnrichedRecord> for AttendanceView {
    fn from(enriched: EnrichedRecord) -> Self {
        let name = enriched.display_name();
        let r = enriched.record;
        Self {
            id: r.id,
            user_id: r.user_id,
            event_id: r.event_id,
            status: r.status,
            created_at: r.created_at,
            updated_at: r.updated_at,
            date: r.created_at,
            name,
        }
    }
}

/// Mark attendance
#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body = CreateAttendance,
    responses(
        (status = 201, description = "Attendance marked", body = CreatedAttendance),
        (status = 400, description = "Missing or invalid fields", body = Object, example = json!({
            "error": "userId and eventId are required",
            "message": "userId and eventId are required"
        })),
        (status = 500, description = "Store error", body = Object, example = json!({
            "error": "Failed to create attendance",
            "message": "pool timed out while waiting for an open connection"
        }))
    ),
    tag = "Attendance"
)]
pub async fn mark_attendance(
    service: web::Data<AttendanceService>,
    payload: web::Json<CreateAttendance>,
) -> Result<HttpResponse, ApiError> {
    let new = payload.into_inner().validate()?;

    let record = service.mark(&new).await.map_err(|e| {
        error!(error = %e, user_id = %new.user_id, event_id = %new.event_id, "Failed to create attendance");
        ApiError::store("Failed to create attendance", e)
    })?;

    info!(id = record.id, user_id = %record.user_id, event_id = %record.event_id, status = %record.status, "Attendance marked");
    Ok(HttpResponse::Created().json(CreatedAttendance::from(record)))
}

/// List all attendance, newest first
#[utoipa::path(
    get,
    path = "/api/attendance",
    responses(
        (status = 200, description = "Attendance history", body = [AttendanceView]),
        (status = 500, description = "Store error", body = Object, example = json!({
            "error": "Failed to fetch attendance",
            "message": "pool timed out while waiting for an open connection"
        }))
    ),
    tag = "Attendance"
)]
pub async fn list_attendance(
    service: web::Data<AttendanceService>,
) -> Result<HttpResponse, ApiError> {
    respond_with_listing(&service, ListFilter::default()).await
}

/// List attendance for one event, newest first
#[utoipa::path(
    get,
    path = "/api/attendance/{event_id}",
    params(("event_id" = String, Path, description = "Event identifier")),
    responses(
        (status = 200, description = "Attendance for the event", body = [AttendanceView]),
        (status = 500, description = "Store error", body = Object, example = json!({
            "error": "Failed to fetch attendance",
            "message": "pool timed out while waiting for an open connection"
        }))
    ),
    tag = "Attendance"
)]
pub async fn list_event_attendance(
    service: web::Data<AttendanceService>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    respond_with_listing(&service, ListFilter::by_event(path.into_inner())).await
}

async fn respond_with_listing(
    service: &AttendanceService,
    filter: ListFilter,
) -> Result<HttpResponse, ApiError> {
    let listing = service.list(&filter).await.map_err(|e| {
        error!(error = %e, event_id = ?filter.event_id, "Failed to fetch attendance");
        ApiError::store("Failed to fetch attendance", e)
    })?;

    debug!(enriched = listing.is_enriched(), event_id = ?filter.event_id, "Listing attendance");
    let views: Vec<AttendanceView> = listing
        .into_records()
        .into_iter()
        .map(AttendanceView::from)
        .collect();

    Ok(HttpResponse::Ok().json(views))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::app;
    use crate::utils::static_files::StaticRoot;
    use actix_web::{http::StatusCode, test as actix_test};
    use rstest::rstest;
    use serde_json::json;
    use std::sync::Arc;

    macro_rules! test_app {
        ($store:expr, $enrichment:expr) => {
            actix_test::init_service(app::build(
                web::Data::new(AttendanceService::new($store, $enrichment)),
                web::Data::new(StaticRoot::new(concat!(
                    env!("CARGO_MANIFEST_DIR"),
                    "/public"
                ))),
            ))
        };
    }

    fn post(body: Value) -> actix_test::TestRequest {
        actix_test::TestRequest::post()
            .uri("/api/attendance")
            .set_json(body)
    }

    #[rstest]
    #[case::missing_user(json!({ "eventId": "E1" }))]
    #[case::missing_event(json!({ "userId": "U1" }))]
    #[case::null_user(json!({ "userId": null, "eventId": "E1" }))]
    #[case::blank_event(json!({ "userId": "U1", "eventId": "   " }))]
    #[case::zero_user(json!({ "userId": 0, "eventId": 3 }))]
    #[case::negative_event(json!({ "userId": 1, "eventId": -4 }))]
    #[case::boolean_user(json!({ "userId": true, "eventId": "E1" }))]
    fn identifiers_are_required(#[case] body: Value) {
        let payload: CreateAttendance = serde_json::from_value(body).unwrap();
        assert_eq!(payload.validate(), Err(ValidationError::MissingIdentifiers));
    }

    #[rstest]
    #[case::omitted(json!({ "userId": "U1", "eventId": "E1" }), AttendanceStatus::Present)]
    #[case::null(json!({ "userId": "U1", "eventId": "E1", "status": null }), AttendanceStatus::Present)]
    #[case::empty(json!({ "userId": "U1", "eventId": "E1", "status": "" }), AttendanceStatus::Present)]
    #[case::absent(json!({ "userId": "U1", "eventId": "E1", "status": "absent" }), AttendanceStatus::Absent)]
    fn status_defaults_to_present(#[case] body: Value, #[case] expected: AttendanceStatus) {
        let payload: CreateAttendance = serde_json::from_value(body).unwrap();
        assert_eq!(payload.validate().unwrap().status, expected);
    }

    #[rstest]
    fn unknown_status_is_rejected() {
        let payload: CreateAttendance =
            serde_json::from_value(json!({ "userId": "U1", "eventId": "E1", "status": "late" }))
                .unwrap();
        assert_eq!(payload.validate(), Err(ValidationError::InvalidStatus));
    }

    #[rstest]
    fn numeric_identifiers_are_stored_as_text() {
        let payload: CreateAttendance =
            serde_json::from_value(json!({ "userId": 42, "eventId": " E7 ", "name": "ignored" }))
                .unwrap();
        let new = payload.validate().unwrap();
        assert_eq!(new.user_id, "42");
        assert_eq!(new.event_id, "E7");
    }

    #[actix_web::test]
    async fn create_returns_created_record() {
        let store = Arc::new(MemoryStore::new());
        let app = test_app!(store.clone(), false).await;

        let resp = actix_test::call_service(
            &app,
            post(json!({ "userId": "U1", "eventId": "E1", "status": "present" })).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let body: Value = actix_test::read_body_json(resp).await;
        assert_eq!(body["id"], 1);
        assert_eq!(body["userId"], "U1");
        assert_eq!(body["eventId"], "E1");
        assert_eq!(body["status"], "present");
        assert_eq!(body["date"], body["createdAt"]);
        assert!(body.get("updatedAt").is_some());
        assert_eq!(store.len(), 1);
    }

    #[actix_web::test]
    async fn create_defaults_status_to_present() {
        let app = test_app!(Arc::new(MemoryStore::new()), false).await;

        let resp = actix_test::call_service(&app, post(json!({ "userId": 5, "eventId": 9 })).to_request()).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let body: Value = actix_test::read_body_json(resp).await;
        assert_eq!(body["status"], "present");
        assert_eq!(body["userId"], "5");
    }

    #[actix_web::test]
    async fn create_without_event_is_rejected_and_not_persisted() {
        let store = Arc::new(MemoryStore::new());
        let app = test_app!(store.clone(), false).await;

        let resp = actix_test::call_service(&app, post(json!({ "userId": "U1" })).to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = actix_test::read_body_json(resp).await;
        assert_eq!(body["error"], "userId and eventId are required");
        assert_eq!(store.len(), 0);
    }

    #[actix_web::test]
    async fn malformed_json_is_a_bad_request() {
        let app = test_app!(Arc::new(MemoryStore::new()), false).await;

        let req = actix_test::TestRequest::post()
            .uri("/api/attendance")
            .insert_header(("content-type", "application/json"))
            .set_payload("{\"userId\":")
            .to_request();
        let resp = actix_test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(resp).await;
        assert_eq!(body["error"], "Bad Request");
    }

    #[actix_web::test]
    async fn create_surfaces_store_failure() {
        let app = test_app!(Arc::new(MemoryStore::new().failing()), false).await;

        let resp = actix_test::call_service(&app, post(json!({ "userId": "U1", "eventId": "E1" })).to_request()).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: Value = actix_test::read_body_json(resp).await;
        assert_eq!(body["error"], "Failed to create attendance");
        assert!(body["message"].is_string());
    }

    #[actix_web::test]
    async fn list_is_newest_first_and_stable() {
        let app = test_app!(Arc::new(MemoryStore::new()), false).await;
        for (user, event) in [("U1", "E1"), ("U2", "E2"), ("U3", "E3")] {
            actix_test::call_service(&app, post(json!({ "userId": user, "eventId": event })).to_request()).await;
        }

        let first: Vec<AttendanceView> = actix_test::call_and_read_body_json(
            &app,
            actix_test::TestRequest::get().uri("/api/attendance").to_request(),
        )
        .await;
        let second: Vec<AttendanceView> = actix_test::call_and_read_body_json(
            &app,
            actix_test::TestRequest::get().uri("/api/attendance").to_request(),
        )
        .await;

        let ids: Vec<i64> = first.iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
        assert_eq!(ids, second.iter().map(|v| v.id).collect::<Vec<_>>());
        assert!(first.windows(2).all(|w| w[0].created_at >= w[1].created_at));
        assert_eq!(first[0].event_id, "E3");
    }

    #[actix_web::test]
    async fn list_after_create_shows_the_record() {
        let app = test_app!(Arc::new(MemoryStore::new()), false).await;
        actix_test::call_service(
            &app,
            post(json!({ "userId": "U1", "eventId": "E1", "status": "present" })).to_request(),
        )
        .await;

        let resp = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri("/api/attendance").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = actix_test::read_body_json(resp).await;
        let items = body.as_array().unwrap();
        assert!(!items.is_empty());
        assert_eq!(items[0]["eventId"], "E1");
        assert_eq!(items[0]["name"], "User #U1");
        assert_eq!(items[0]["date"], items[0]["createdAt"]);
    }

    #[actix_web::test]
    async fn empty_store_lists_an_empty_array() {
        let app = test_app!(Arc::new(MemoryStore::new()), true).await;

        let body: Value = actix_test::call_and_read_body_json(
            &app,
            actix_test::TestRequest::get().uri("/api/attendance").to_request(),
        )
        .await;

        assert_eq!(body, json!([]));
    }

    #[actix_web::test]
    async fn enrichment_failure_still_lists() {
        let app = test_app!(Arc::new(MemoryStore::new().failing_enrichment()), true).await;
        actix_test::call_service(&app, post(json!({ "userId": "U4", "eventId": "E1" })).to_request()).await;

        let resp = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri("/api/attendance").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = actix_test::read_body_json(resp).await;
        assert_eq!(body[0]["name"], "User #U4");
        assert_eq!(body[0]["status"], "present");
    }

    #[actix_web::test]
    async fn enriched_names_prefer_user_then_event() {
        let store = MemoryStore::new()
            .with_user_name("U1", "Ada Lovelace")
            .with_event_title("E2", "Retro");
        let app = test_app!(Arc::new(store), true).await;
        actix_test::call_service(&app, post(json!({ "userId": "U1", "eventId": "E1" })).to_request()).await;
        actix_test::call_service(&app, post(json!({ "userId": "U2", "eventId": "E2" })).to_request()).await;

        let body: Vec<AttendanceView> = actix_test::call_and_read_body_json(
            &app,
            actix_test::TestRequest::get().uri("/api/attendance").to_request(),
        )
        .await;

        assert_eq!(body[0].name.as_deref(), Some("Retro"));
        assert_eq!(body[1].name.as_deref(), Some("Ada Lovelace"));
    }

    #[actix_web::test]
    async fn list_surfaces_store_failure() {
        let app = test_app!(Arc::new(MemoryStore::new().failing()), false).await;

        let resp = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri("/api/attendance").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: Value = actix_test::read_body_json(resp).await;
        assert_eq!(body["error"], "Failed to fetch attendance");
        assert!(body["message"].is_string());
    }

    #[actix_web::test]
    async fn event_listing_is_filtered() {
        let app = test_app!(Arc::new(MemoryStore::new()), false).await;
        actix_test::call_service(&app, post(json!({ "userId": "U1", "eventId": "E1" })).to_request()).await;
        actix_test::call_service(&app, post(json!({ "userId": "U2", "eventId": "E2" })).to_request()).await;

        let body: Vec<AttendanceView> = actix_test::call_and_read_body_json(
            &app,
            actix_test::TestRequest::get().uri("/api/attendance/E1").to_request(),
        )
        .await;

        assert_eq!(body.len(), 1);
        assert_eq!(body[0].user_id, "U1");
    }
}
