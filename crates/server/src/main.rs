// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]
#![allow(clippy::multiple_crate_versions)]

use axum::{
    Json, Router,
    extract::{Path, Query, State as AxumState},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

use matricula::{Clock, SystemClock};
use matricula_api::ApiError;
use matricula_api::handlers;
use matricula_api::request_response::{
    ActivatePeriodResponse, ChangeStateRequest, ChangeStateResponse, ConflictInfo,
    CreateEnrollmentRequest, CreateGroupRequest, CreatePeriodRequest, CreateRequestRequest,
    CreateRequestResponse, DeleteRequestResponse, EnrollmentInfo, GroupInfo, JoinWaitlistResponse,
    LeaveWaitlistResponse, PeriodInfo, RegisterConflictRequest, RequestInfo,
    ResolveConflictRequest, StateCountInfo, UpdateConflictRequest, UpdateRequestRequest,
    WaitlistPositionResponse,
    WaitlistRequest,
};
use matricula_audit::{Actor, AuditEvent, Cause};
use matricula_persistence::{Persistence, PersistenceError};

/// Matricula Server - HTTP server for the schedule-change request system
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the `SQLite` database file. If not provided, uses in-memory database.
    #[arg(short, long)]
    database: Option<String>,

    /// Port to bind the server to
    #[arg(short, long, default_value_t = 3000)]
    port: u16,
}

/// Application state shared across handlers.
///
/// This contains the persistence layer wrapped in a Mutex to allow
/// safe concurrent access, and the time source handed to every
/// lifecycle operation.
#[derive(Clone)]
struct AppState {
    /// The persistence layer.
    persistence: Arc<Mutex<Persistence>>,
    /// The time source.
    clock: Arc<dyn Clock + Send + Sync>,
}

/// API request for creating a schedule-change request.
///
/// This includes actor and cause information in addition to the
/// request data.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct CreateRequestApiRequest {
    /// The actor ID performing this action.
    actor_id: String,
    /// The actor type (e.g. `staff`, `system`).
    actor_type: String,
    /// The cause ID for this action.
    cause_id: String,
    /// The cause description.
    cause_description: String,
    /// The request type (`GroupChange`, `CourseChange`, `ScheduleAdjustment`, `Withdrawal`).
    request_type: String,
    /// The requesting student.
    student_id: i64,
    /// The origin enrollment being moved away from, if any.
    origin_enrollment_id: Option<i64>,
    /// The destination group, if any.
    destination_group_id: Option<i64>,
    /// The destination course, if any.
    destination_course_id: Option<i64>,
    /// Priority; lower values are more urgent.
    priority: u32,
    /// Free-text notes from the student.
    notes: Option<String>,
}

/// API request for editing a pending request.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct UpdateRequestApiRequest {
    /// The actor ID performing this action.
    actor_id: String,
    /// The actor type.
    actor_type: String,
    /// The cause ID for this action.
    cause_id: String,
    /// The cause description.
    cause_description: String,
    /// New destination group.
    destination_group_id: Option<i64>,
    /// New destination course.
    destination_course_id: Option<i64>,
    /// New priority.
    priority: Option<u32>,
    /// Notes recorded on the update history entry.
    notes: Option<String>,
}

/// API request for transitioning a request to a new state.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct ChangeStateApiRequest {
    /// The actor ID performing this action.
    actor_id: String,
    /// The actor type.
    actor_type: String,
    /// The cause ID for this action.
    cause_id: String,
    /// The cause description.
    cause_description: String,
    /// The target state.
    new_state: String,
    /// Notes recorded on the state-change history entry.
    notes: Option<String>,
}

/// API request carrying only actor and cause information.
///
/// Used for deletions and period activation, where the payload is the
/// URL path itself.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct AdminActionRequest {
    /// The actor ID performing this action.
    actor_id: String,
    /// The actor type.
    actor_type: String,
    /// The cause ID for this action.
    cause_id: String,
    /// The cause description.
    cause_description: String,
}

/// Query parameters for listing requests.
///
/// Exactly one of `student_id`, `state`, or `period_id` selects the
/// listing; `from`/`to` narrow a period listing by creation date.
#[derive(Debug, Deserialize)]
struct ListRequestsQuery {
    /// The requesting student.
    student_id: Option<i64>,
    /// One or more request states, comma-separated.
    state: Option<String>,
    /// The academic period.
    period_id: Option<i64>,
    /// Creation-date lower bound (ISO 8601).
    from: Option<DateTime<Utc>>,
    /// Creation-date upper bound (ISO 8601).
    to: Option<DateTime<Utc>>,
}

/// Query parameters for per-state request counts.
#[derive(Debug, Deserialize)]
struct CountRequestsQuery {
    /// The academic period.
    period_id: i64,
}

/// Query parameters for listing conflicts.
#[derive(Debug, Deserialize)]
struct ListConflictsQuery {
    /// The affected student.
    student_id: Option<i64>,
    /// The resolution state.
    resolved: Option<bool>,
}

/// Query parameters for listing groups.
#[derive(Debug, Deserialize)]
struct ListGroupsQuery {
    /// The academic period.
    period_id: i64,
}

/// Serializable representation of an `AuditEvent` for JSON responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AuditEventResponse {
    /// The actor ID.
    actor_id: String,
    /// The actor type.
    actor_type: String,
    /// The cause ID.
    cause_id: String,
    /// The cause description.
    cause_description: String,
    /// The action name.
    action_name: String,
    /// Optional action details.
    action_details: Option<String>,
    /// State before the transition.
    before_snapshot: String,
    /// State after the transition.
    after_snapshot: String,
    /// The academic period scope, if any.
    period_id: Option<i64>,
    /// The student scope, if any.
    student_id: Option<i64>,
}

/// Error response type.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ErrorResponse {
    /// Error indicator.
    error: bool,
    /// Error message.
    message: String,
}

/// HTTP error wrapper that implements `IntoResponse`.
struct HttpError {
    /// The HTTP status code.
    status: StatusCode,
    /// The error message.
    message: String,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body: Json<ErrorResponse> = Json(ErrorResponse {
            error: true,
            message: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        let status = match &err {
            ApiError::InvalidInput { .. } | ApiError::PriorityPolicyViolation { .. } => {
                StatusCode::BAD_REQUEST
            }
            ApiError::ResourceNotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::DomainRuleViolation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::CapacityUnavailable { .. } | ApiError::ConcurrentModification { .. } => {
                StatusCode::CONFLICT
            }
            ApiError::Internal { .. } => {
                error!(error = %err, "Internal API error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<PersistenceError> for HttpError {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::NotFound(_) | PersistenceError::EventNotFound(_) => Self {
                status: StatusCode::NOT_FOUND,
                message: err.to_string(),
            },
            other => {
                error!(error = %other, "Persistence error");
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: format!("Persistence error: {other}"),
                }
            }
        }
    }
}

/// Converts an `AuditEvent` to an `AuditEventResponse`.
fn audit_event_to_response(event: &AuditEvent) -> AuditEventResponse {
    AuditEventResponse {
        actor_id: event.actor.id.clone(),
        actor_type: event.actor.actor_type.clone(),
        cause_id: event.cause.id.clone(),
        cause_description: event.cause.description.clone(),
        action_name: event.action.name.clone(),
        action_details: event.action.details.clone(),
        before_snapshot: event.before.data.clone(),
        after_snapshot: event.after.data.clone(),
        period_id: event.period_id,
        student_id: event.student_id,
    }
}

/// Handler for POST `/requests` endpoint.
///
/// Creates a schedule-change request and reports any schedule conflicts
/// detected against the destination group.
async fn handle_create_request(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<CreateRequestApiRequest>,
) -> Result<Json<CreateRequestResponse>, HttpError> {
    info!(
        actor_id = %req.actor_id,
        student_id = req.student_id,
        request_type = %req.request_type,
        "Handling create_request request"
    );

    let actor: Actor = Actor::new(req.actor_id, req.actor_type);
    let cause: Cause = Cause::new(req.cause_id, req.cause_description);
    let payload: CreateRequestRequest = CreateRequestRequest {
        request_type: req.request_type,
        student_id: req.student_id,
        origin_enrollment_id: req.origin_enrollment_id,
        destination_group_id: req.destination_group_id,
        destination_course_id: req.destination_course_id,
        priority: req.priority,
        notes: req.notes,
    };

    let mut persistence = app_state.persistence.lock().await;
    let response: CreateRequestResponse = handlers::create_request(
        &mut persistence,
        payload,
        actor,
        cause,
        app_state.clock.as_ref(),
    )?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for GET `/requests/{request_id}` endpoint.
async fn handle_get_request(
    AxumState(app_state): AxumState<AppState>,
    Path(request_id): Path<i64>,
) -> Result<Json<RequestInfo>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let request: RequestInfo = handlers::get_request(&mut persistence, request_id)?;
    drop(persistence);

    Ok(Json(request))
}

/// Handler for GET `/requests/code/{code}` endpoint.
async fn handle_get_request_by_code(
    AxumState(app_state): AxumState<AppState>,
    Path(code): Path<String>,
) -> Result<Json<RequestInfo>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let request: RequestInfo = handlers::get_request_by_code(&mut persistence, &code)?;
    drop(persistence);

    Ok(Json(request))
}

/// Handler for GET `/requests` endpoint.
///
/// Lists requests by student, by state, or by period with an optional
/// creation-date range.
async fn handle_list_requests(
    AxumState(app_state): AxumState<AppState>,
    Query(query): Query<ListRequestsQuery>,
) -> Result<Json<Vec<RequestInfo>>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let requests: Vec<RequestInfo> = if let Some(student_id) = query.student_id {
        handlers::list_requests_for_student(&mut persistence, student_id)?
    } else if let Some(state) = &query.state {
        handlers::list_requests_in_states(&mut persistence, state)?
    } else if let Some(period_id) = query.period_id {
        handlers::list_requests_for_period(&mut persistence, period_id, query.from, query.to)?
    } else {
        return Err(HttpError {
            status: StatusCode::BAD_REQUEST,
            message: String::from(
                "one of 'student_id', 'state', or 'period_id' must be provided",
            ),
        });
    };
    drop(persistence);

    Ok(Json(requests))
}

/// Handler for GET `/requests/counts` endpoint.
async fn handle_count_requests(
    AxumState(app_state): AxumState<AppState>,
    Query(query): Query<CountRequestsQuery>,
) -> Result<Json<Vec<StateCountInfo>>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let counts: Vec<StateCountInfo> =
        handlers::count_requests_by_state(&mut persistence, query.period_id)?;
    drop(persistence);

    Ok(Json(counts))
}

/// Handler for POST `/requests/{request_id}/update` endpoint.
async fn handle_update_request(
    AxumState(app_state): AxumState<AppState>,
    Path(request_id): Path<i64>,
    Json(req): Json<UpdateRequestApiRequest>,
) -> Result<Json<RequestInfo>, HttpError> {
    info!(actor_id = %req.actor_id, request_id, "Handling update_request request");

    let actor: Actor = Actor::new(req.actor_id, req.actor_type);
    let cause: Cause = Cause::new(req.cause_id, req.cause_description);
    let changes: UpdateRequestRequest = UpdateRequestRequest {
        destination_group_id: req.destination_group_id,
        destination_course_id: req.destination_course_id,
        priority: req.priority,
        notes: req.notes,
    };

    let mut persistence = app_state.persistence.lock().await;
    let request: RequestInfo = handlers::update_request(
        &mut persistence,
        request_id,
        changes,
        actor,
        cause,
        app_state.clock.as_ref(),
    )?;
    drop(persistence);

    Ok(Json(request))
}

/// Handler for POST `/requests/{request_id}/state` endpoint.
async fn handle_change_request_state(
    AxumState(app_state): AxumState<AppState>,
    Path(request_id): Path<i64>,
    Json(req): Json<ChangeStateApiRequest>,
) -> Result<Json<ChangeStateResponse>, HttpError> {
    info!(
        actor_id = %req.actor_id,
        request_id,
        new_state = %req.new_state,
        "Handling change_request_state request"
    );

    let actor: Actor = Actor::new(req.actor_id, req.actor_type);
    let cause: Cause = Cause::new(req.cause_id, req.cause_description);

    let mut persistence = app_state.persistence.lock().await;
    let response: ChangeStateResponse = handlers::change_request_state(
        &mut persistence,
        request_id,
        ChangeStateRequest {
            new_state: req.new_state,
            notes: req.notes,
        },
        actor,
        cause,
        app_state.clock.as_ref(),
    )?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/requests/{request_id}/delete` endpoint.
async fn handle_delete_request(
    AxumState(app_state): AxumState<AppState>,
    Path(request_id): Path<i64>,
    Json(req): Json<AdminActionRequest>,
) -> Result<Json<DeleteRequestResponse>, HttpError> {
    info!(actor_id = %req.actor_id, request_id, "Handling delete_request request");

    let actor: Actor = Actor::new(req.actor_id, req.actor_type);
    let cause: Cause = Cause::new(req.cause_id, req.cause_description);

    let mut persistence = app_state.persistence.lock().await;
    let response: DeleteRequestResponse = handlers::delete_request(
        &mut persistence,
        request_id,
        actor,
        cause,
        app_state.clock.as_ref(),
    )?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/conflicts` endpoint.
async fn handle_register_conflict(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<RegisterConflictRequest>,
) -> Result<Json<ConflictInfo>, HttpError> {
    info!(student_id = req.student_id, "Handling register_conflict request");

    let mut persistence = app_state.persistence.lock().await;
    let conflict: ConflictInfo =
        handlers::register_conflict(&mut persistence, req, app_state.clock.as_ref())?;
    drop(persistence);

    Ok(Json(conflict))
}

/// Handler for GET `/conflicts/{conflict_id}` endpoint.
async fn handle_get_conflict(
    AxumState(app_state): AxumState<AppState>,
    Path(conflict_id): Path<i64>,
) -> Result<Json<ConflictInfo>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let conflict: ConflictInfo = handlers::get_conflict(&mut persistence, conflict_id)?;
    drop(persistence);

    Ok(Json(conflict))
}

/// Handler for POST `/conflicts/{conflict_id}/update` endpoint.
async fn handle_update_conflict(
    AxumState(app_state): AxumState<AppState>,
    Path(conflict_id): Path<i64>,
    Json(req): Json<UpdateConflictRequest>,
) -> Result<Json<ConflictInfo>, HttpError> {
    info!(conflict_id, "Handling update_conflict request");

    let mut persistence = app_state.persistence.lock().await;
    let conflict: ConflictInfo = handlers::update_conflict(&mut persistence, conflict_id, req)?;
    drop(persistence);

    Ok(Json(conflict))
}

/// Handler for POST `/conflicts/{conflict_id}/delete` endpoint.
async fn handle_delete_conflict(
    AxumState(app_state): AxumState<AppState>,
    Path(conflict_id): Path<i64>,
) -> Result<StatusCode, HttpError> {
    info!(conflict_id, "Handling delete_conflict request");

    let mut persistence = app_state.persistence.lock().await;
    handlers::delete_conflict(&mut persistence, conflict_id)?;
    drop(persistence);

    Ok(StatusCode::NO_CONTENT)
}

/// Handler for GET `/requests/{request_id}/conflicts` endpoint.
async fn handle_list_conflicts_for_request(
    AxumState(app_state): AxumState<AppState>,
    Path(request_id): Path<i64>,
) -> Result<Json<Vec<ConflictInfo>>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let conflicts: Vec<ConflictInfo> =
        handlers::list_conflicts_for_request(&mut persistence, request_id)?;
    drop(persistence);

    Ok(Json(conflicts))
}

/// Handler for GET `/conflicts` endpoint.
async fn handle_list_conflicts(
    AxumState(app_state): AxumState<AppState>,
    Query(query): Query<ListConflictsQuery>,
) -> Result<Json<Vec<ConflictInfo>>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let conflicts: Vec<ConflictInfo> =
        handlers::list_conflicts(&mut persistence, query.student_id, query.resolved)?;
    drop(persistence);

    Ok(Json(conflicts))
}

/// Handler for POST `/conflicts/{conflict_id}/resolve` endpoint.
async fn handle_resolve_conflict(
    AxumState(app_state): AxumState<AppState>,
    Path(conflict_id): Path<i64>,
    Json(req): Json<ResolveConflictRequest>,
) -> Result<Json<ConflictInfo>, HttpError> {
    info!(conflict_id, "Handling resolve_conflict request");

    let mut persistence = app_state.persistence.lock().await;
    let conflict: ConflictInfo = handlers::resolve_conflict(&mut persistence, conflict_id, req)?;
    drop(persistence);

    Ok(Json(conflict))
}

/// Handler for POST `/groups/{group_id}/waitlist/join` endpoint.
async fn handle_join_waitlist(
    AxumState(app_state): AxumState<AppState>,
    Path(group_id): Path<i64>,
    Json(req): Json<WaitlistRequest>,
) -> Result<Json<JoinWaitlistResponse>, HttpError> {
    info!(group_id, student_id = req.student_id, "Handling join_waitlist request");

    let mut persistence = app_state.persistence.lock().await;
    let response: JoinWaitlistResponse =
        handlers::join_waitlist(&mut persistence, group_id, req, app_state.clock.as_ref())?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/groups/{group_id}/waitlist/leave` endpoint.
async fn handle_leave_waitlist(
    AxumState(app_state): AxumState<AppState>,
    Path(group_id): Path<i64>,
    Json(req): Json<WaitlistRequest>,
) -> Result<Json<LeaveWaitlistResponse>, HttpError> {
    info!(group_id, student_id = req.student_id, "Handling leave_waitlist request");

    let mut persistence = app_state.persistence.lock().await;
    let response: LeaveWaitlistResponse =
        handlers::leave_waitlist(&mut persistence, group_id, req)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for GET `/groups/{group_id}/waitlist/{student_id}` endpoint.
async fn handle_waitlist_position(
    AxumState(app_state): AxumState<AppState>,
    Path((group_id, student_id)): Path<(i64, i64)>,
) -> Result<Json<WaitlistPositionResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: WaitlistPositionResponse =
        handlers::waitlist_position(&mut persistence, group_id, student_id)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/periods` endpoint.
async fn handle_create_period(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<CreatePeriodRequest>,
) -> Result<Json<PeriodInfo>, HttpError> {
    info!(year = req.year, term = req.term, "Handling create_period request");

    let mut persistence = app_state.persistence.lock().await;
    let period: PeriodInfo = handlers::create_period(&mut persistence, req)?;
    drop(persistence);

    Ok(Json(period))
}

/// Handler for POST `/periods/{period_id}/activate` endpoint.
async fn handle_activate_period(
    AxumState(app_state): AxumState<AppState>,
    Path(period_id): Path<i64>,
    Json(req): Json<AdminActionRequest>,
) -> Result<Json<ActivatePeriodResponse>, HttpError> {
    info!(actor_id = %req.actor_id, period_id, "Handling activate_period request");

    let actor: Actor = Actor::new(req.actor_id, req.actor_type);
    let cause: Cause = Cause::new(req.cause_id, req.cause_description);

    let mut persistence = app_state.persistence.lock().await;
    let response: ActivatePeriodResponse = handlers::activate_period(
        &mut persistence,
        period_id,
        actor,
        cause,
        app_state.clock.as_ref(),
    )?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for GET `/periods/active` endpoint.
async fn handle_get_active_period(
    AxumState(app_state): AxumState<AppState>,
) -> Result<Json<Option<PeriodInfo>>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let period: Option<PeriodInfo> = handlers::get_active_period(&mut persistence)?;
    drop(persistence);

    Ok(Json(period))
}

/// Handler for GET `/periods` endpoint.
async fn handle_list_periods(
    AxumState(app_state): AxumState<AppState>,
) -> Result<Json<Vec<PeriodInfo>>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let periods: Vec<PeriodInfo> = handlers::list_periods(&mut persistence)?;
    drop(persistence);

    Ok(Json(periods))
}

/// Handler for POST `/groups` endpoint.
async fn handle_create_group(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<CreateGroupRequest>,
) -> Result<Json<GroupInfo>, HttpError> {
    info!(course_id = req.course_id, period_id = req.period_id, "Handling create_group request");

    let mut persistence = app_state.persistence.lock().await;
    let group: GroupInfo = handlers::create_group(&mut persistence, req)?;
    drop(persistence);

    Ok(Json(group))
}

/// Handler for GET `/groups/{group_id}` endpoint.
async fn handle_get_group(
    AxumState(app_state): AxumState<AppState>,
    Path(group_id): Path<i64>,
) -> Result<Json<GroupInfo>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let group: GroupInfo = handlers::get_group(&mut persistence, group_id)?;
    drop(persistence);

    Ok(Json(group))
}

/// Handler for GET `/groups` endpoint.
async fn handle_list_groups(
    AxumState(app_state): AxumState<AppState>,
    Query(query): Query<ListGroupsQuery>,
) -> Result<Json<Vec<GroupInfo>>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let groups: Vec<GroupInfo> =
        handlers::list_groups_for_period(&mut persistence, query.period_id)?;
    drop(persistence);

    Ok(Json(groups))
}

/// Handler for POST `/enrollments` endpoint.
async fn handle_create_enrollment(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<CreateEnrollmentRequest>,
) -> Result<Json<EnrollmentInfo>, HttpError> {
    info!(student_id = req.student_id, group_id = req.group_id, "Handling create_enrollment request");

    let mut persistence = app_state.persistence.lock().await;
    let enrollment: EnrollmentInfo = handlers::create_enrollment(&mut persistence, req)?;
    drop(persistence);

    Ok(Json(enrollment))
}

/// Handler for GET `/enrollments/{enrollment_id}` endpoint.
async fn handle_get_enrollment(
    AxumState(app_state): AxumState<AppState>,
    Path(enrollment_id): Path<i64>,
) -> Result<Json<EnrollmentInfo>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let enrollment: EnrollmentInfo = handlers::get_enrollment(&mut persistence, enrollment_id)?;
    drop(persistence);

    Ok(Json(enrollment))
}

/// Handler for GET `/audit/event/{event_id}` endpoint.
async fn handle_get_audit_event(
    AxumState(app_state): AxumState<AppState>,
    Path(event_id): Path<i64>,
) -> Result<Json<AuditEventResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let event: AuditEvent = persistence.get_audit_event(event_id)?;
    drop(persistence);

    Ok(Json(audit_event_to_response(&event)))
}

/// Handler for GET `/audit/period/{period_id}` endpoint.
async fn handle_get_period_audit_trail(
    AxumState(app_state): AxumState<AppState>,
    Path(period_id): Path<i64>,
) -> Result<Json<Vec<AuditEventResponse>>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let events: Vec<AuditEvent> = persistence.list_events_for_period(period_id)?;
    drop(persistence);

    Ok(Json(events.iter().map(audit_event_to_response).collect()))
}

/// Handler for GET `/audit/student/{student_id}` endpoint.
async fn handle_get_student_audit_trail(
    AxumState(app_state): AxumState<AppState>,
    Path(student_id): Path<i64>,
) -> Result<Json<Vec<AuditEventResponse>>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let events: Vec<AuditEvent> = persistence.list_events_for_student(student_id)?;
    drop(persistence);

    Ok(Json(events.iter().map(audit_event_to_response).collect()))
}

/// Builds the application router with all endpoints.
fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/requests", post(handle_create_request))
        .route("/requests", get(handle_list_requests))
        .route("/requests/counts", get(handle_count_requests))
        .route("/requests/code/{code}", get(handle_get_request_by_code))
        .route("/requests/{request_id}", get(handle_get_request))
        .route("/requests/{request_id}/update", post(handle_update_request))
        .route("/requests/{request_id}/state", post(handle_change_request_state))
        .route("/requests/{request_id}/delete", post(handle_delete_request))
        .route(
            "/requests/{request_id}/conflicts",
            get(handle_list_conflicts_for_request),
        )
        .route("/conflicts", post(handle_register_conflict))
        .route("/conflicts", get(handle_list_conflicts))
        .route("/conflicts/{conflict_id}", get(handle_get_conflict))
        .route("/conflicts/{conflict_id}/update", post(handle_update_conflict))
        .route("/conflicts/{conflict_id}/delete", post(handle_delete_conflict))
        .route("/conflicts/{conflict_id}/resolve", post(handle_resolve_conflict))
        .route("/periods", post(handle_create_period))
        .route("/periods", get(handle_list_periods))
        .route("/periods/active", get(handle_get_active_period))
        .route("/periods/{period_id}/activate", post(handle_activate_period))
        .route("/groups", post(handle_create_group))
        .route("/groups", get(handle_list_groups))
        .route("/groups/{group_id}", get(handle_get_group))
        .route("/groups/{group_id}/waitlist/join", post(handle_join_waitlist))
        .route("/groups/{group_id}/waitlist/leave", post(handle_leave_waitlist))
        .route(
            "/groups/{group_id}/waitlist/{student_id}",
            get(handle_waitlist_position),
        )
        .route("/enrollments", post(handle_create_enrollment))
        .route("/enrollments/{enrollment_id}", get(handle_get_enrollment))
        .route("/audit/event/{event_id}", get(handle_get_audit_event))
        .route("/audit/period/{period_id}", get(handle_get_period_audit_trail))
        .route("/audit/student/{student_id}", get(handle_get_student_audit_trail))
        .with_state(app_state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command-line arguments
    let args: Args = Args::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Initializing Matricula Server");

    // Initialize persistence (in-memory or file-based based on CLI argument)
    let persistence: Persistence = if let Some(db_path) = &args.database {
        info!("Using file-based database at: {}", db_path);
        Persistence::new_with_file(db_path)?
    } else {
        info!("Using in-memory database");
        Persistence::new_in_memory()?
    };

    let app_state: AppState = AppState {
        persistence: Arc::new(Mutex::new(persistence)),
        clock: Arc::new(SystemClock),
    };

    // Build router
    let app: Router = build_router(app_state);

    // Bind to address
    let addr: std::net::SocketAddr = format!("127.0.0.1:{}", args.port).parse()?;
    info!("Server listening on {}", addr);

    // Run server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode as HttpStatusCode},
    };
    use chrono::TimeZone;
    use matricula::FixedClock;
    use serde::de::DeserializeOwned;
    use tower::ServiceExt;

    fn instant(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).unwrap()
    }

    /// Helper to create test app state with in-memory persistence and a
    /// pinned clock inside the test period's request window.
    fn create_test_app_state() -> AppState {
        let persistence: Persistence =
            Persistence::new_in_memory().expect("Failed to create in-memory persistence");
        AppState {
            persistence: Arc::new(Mutex::new(persistence)),
            clock: Arc::new(FixedClock::new(instant(2026, 2, 3, 10))),
        }
    }

    async fn post_json<B: Serialize>(app: &Router, uri: &str, body: &B) -> Response {
        app.clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(serde_json::to_string(body).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn get_uri(app: &Router, uri: &str) -> Response {
        app.clone()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn body_of<T: DeserializeOwned>(response: Response) -> T {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn admin_action() -> AdminActionRequest {
        AdminActionRequest {
            actor_id: String::from("staff-7"),
            actor_type: String::from("staff"),
            cause_id: String::from("req-456"),
            cause_description: String::from("HTTP test"),
        }
    }

    /// Creates and activates a 2026/term-1 period, returning its ID.
    async fn bootstrap_period(app: &Router) -> i64 {
        let period_req = CreatePeriodRequest {
            start: instant(2026, 1, 12, 0),
            end: instant(2026, 5, 29, 23),
            enrollment_window_start: instant(2026, 1, 5, 0),
            request_deadline: instant(2026, 2, 27, 23),
            year: 2026,
            term: 1,
        };
        let response = post_json(app, "/periods", &period_req).await;
        assert_eq!(response.status(), HttpStatusCode::OK);
        let period: PeriodInfo = body_of(response).await;
        let period_id = period.period_id.unwrap();

        let response = post_json(
            app,
            &format!("/periods/{period_id}/activate"),
            &admin_action(),
        )
        .await;
        assert_eq!(response.status(), HttpStatusCode::OK);
        period_id
    }

    /// Creates a group in the period, returning its ID.
    async fn bootstrap_group(app: &Router, period_id: i64, capacity_max: i32) -> i64 {
        let group_req = CreateGroupRequest {
            course_id: 10,
            period_id,
            instructor_id: 7,
            capacity_max,
            schedules: vec![matricula_api::request_response::TimeSlotInfo {
                weekday: String::from("Monday"),
                start_time: chrono::NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
                end_time: chrono::NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
                room: String::from("B-204"),
                session_type: String::from("Lecture"),
            }],
        };
        let response = post_json(app, "/groups", &group_req).await;
        assert_eq!(response.status(), HttpStatusCode::OK);
        let group: GroupInfo = body_of(response).await;
        group.group_id.unwrap()
    }

    fn create_request_body(group_id: i64) -> CreateRequestApiRequest {
        CreateRequestApiRequest {
            actor_id: String::from("staff-7"),
            actor_type: String::from("staff"),
            cause_id: String::from("req-456"),
            cause_description: String::from("HTTP test"),
            request_type: String::from("GroupChange"),
            student_id: 100,
            origin_enrollment_id: None,
            destination_group_id: Some(group_id),
            destination_course_id: None,
            priority: 3,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_create_request_flow() {
        let app: Router = build_router(create_test_app_state());
        let period_id = bootstrap_period(&app).await;
        let group_id = bootstrap_group(&app, period_id, 30).await;

        let response = post_json(&app, "/requests", &create_request_body(group_id)).await;
        assert_eq!(response.status(), HttpStatusCode::OK);
        let created: CreateRequestResponse = body_of(response).await;
        assert_eq!(created.request.state, "Pending");
        assert!(created.conflicts.is_empty());

        let response = get_uri(
            &app,
            &format!("/requests/{}", created.request.request_id.unwrap()),
        )
        .await;
        assert_eq!(response.status(), HttpStatusCode::OK);
        let fetched: RequestInfo = body_of(response).await;
        assert_eq!(fetched.code, created.request.code);
    }

    #[tokio::test]
    async fn test_full_group_returns_conflict_status() {
        let app: Router = build_router(create_test_app_state());
        let period_id = bootstrap_period(&app).await;
        let group_id = bootstrap_group(&app, period_id, 0).await;

        let response = post_json(&app, "/requests", &create_request_body(group_id)).await;

        assert_eq!(response.status(), HttpStatusCode::CONFLICT);
        let error: ErrorResponse = body_of(response).await;
        assert!(error.error);
    }

    #[tokio::test]
    async fn test_invalid_priority_returns_bad_request() {
        let app: Router = build_router(create_test_app_state());
        let period_id = bootstrap_period(&app).await;
        let group_id = bootstrap_group(&app, period_id, 30).await;

        let mut body = create_request_body(group_id);
        body.priority = 11;
        let response = post_json(&app, "/requests", &body).await;

        assert_eq!(response.status(), HttpStatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_request_returns_not_found() {
        let app: Router = build_router(create_test_app_state());

        let response = get_uri(&app, "/requests/999").await;

        assert_eq!(response.status(), HttpStatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalid_transition_returns_unprocessable() {
        let app: Router = build_router(create_test_app_state());
        let period_id = bootstrap_period(&app).await;
        let group_id = bootstrap_group(&app, period_id, 30).await;

        let response = post_json(&app, "/requests", &create_request_body(group_id)).await;
        let created: CreateRequestResponse = body_of(response).await;
        let request_id = created.request.request_id.unwrap();

        // Direct Pending -> Approved is not in the transition table.
        let response = post_json(
            &app,
            &format!("/requests/{request_id}/state"),
            &ChangeStateApiRequest {
                actor_id: String::from("staff-7"),
                actor_type: String::from("staff"),
                cause_id: String::from("req-456"),
                cause_description: String::from("HTTP test"),
                new_state: String::from("Approved"),
                notes: None,
            },
        )
        .await;

        assert_eq!(response.status(), HttpStatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_waitlist_round_trip() {
        let app: Router = build_router(create_test_app_state());
        let period_id = bootstrap_period(&app).await;
        let group_id = bootstrap_group(&app, period_id, 0).await;

        let response = post_json(
            &app,
            &format!("/groups/{group_id}/waitlist/join"),
            &WaitlistRequest { student_id: 100 },
        )
        .await;
        assert_eq!(response.status(), HttpStatusCode::OK);
        let joined: JoinWaitlistResponse = body_of(response).await;
        assert_eq!(joined.position, 1);
        assert!(joined.newly_joined);

        post_json(
            &app,
            &format!("/groups/{group_id}/waitlist/join"),
            &WaitlistRequest { student_id: 200 },
        )
        .await;

        let response = get_uri(&app, &format!("/groups/{group_id}/waitlist/200")).await;
        let position: WaitlistPositionResponse = body_of(response).await;
        assert_eq!(position.position, Some(2));

        let response = post_json(
            &app,
            &format!("/groups/{group_id}/waitlist/leave"),
            &WaitlistRequest { student_id: 100 },
        )
        .await;
        let left: LeaveWaitlistResponse = body_of(response).await;
        assert!(left.removed);

        let response = get_uri(&app, &format!("/groups/{group_id}/waitlist/200")).await;
        let position: WaitlistPositionResponse = body_of(response).await;
        assert_eq!(position.position, Some(1));
    }

    #[tokio::test]
    async fn test_conflict_registry_round_trip() {
        let app: Router = build_router(create_test_app_state());
        let period_id = bootstrap_period(&app).await;
        let group_id = bootstrap_group(&app, period_id, 30).await;

        let register = RegisterConflictRequest {
            category: String::from("Manual"),
            description: String::from("Student flagged a clash with their internship"),
            student_id: 100,
            request_id: None,
            group_id: Some(group_id),
        };
        let response = post_json(&app, "/conflicts", &register).await;
        assert_eq!(response.status(), HttpStatusCode::OK);
        let registered: ConflictInfo = body_of(response).await;
        let conflict_id = registered.conflict_id.unwrap();

        let mut dangling = register.clone();
        dangling.group_id = Some(999);
        let response = post_json(&app, "/conflicts", &dangling).await;
        assert_eq!(response.status(), HttpStatusCode::NOT_FOUND);

        let update = UpdateConflictRequest {
            category: String::from("Capacity"),
            description: String::from("Reclassified after staff review"),
            student_id: 100,
            request_id: None,
            group_id: Some(group_id),
        };
        let response =
            post_json(&app, &format!("/conflicts/{conflict_id}/update"), &update).await;
        assert_eq!(response.status(), HttpStatusCode::OK);
        let updated: ConflictInfo = body_of(response).await;
        assert_eq!(updated.category, "Capacity");
        assert_eq!(updated.detected_at, registered.detected_at);

        let response =
            post_json(&app, &format!("/conflicts/{conflict_id}/delete"), &()).await;
        assert_eq!(response.status(), HttpStatusCode::NO_CONTENT);

        let response = get_uri(&app, &format!("/conflicts/{conflict_id}")).await;
        assert_eq!(response.status(), HttpStatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_activating_a_period_replaces_the_previous_one() {
        let app: Router = build_router(create_test_app_state());
        let first = bootstrap_period(&app).await;

        let second_req = CreatePeriodRequest {
            start: instant(2026, 8, 10, 0),
            end: instant(2026, 12, 18, 23),
            enrollment_window_start: instant(2026, 8, 3, 0),
            request_deadline: instant(2026, 9, 25, 23),
            year: 2026,
            term: 2,
        };
        let response = post_json(&app, "/periods", &second_req).await;
        let second: PeriodInfo = body_of(response).await;
        let second_id = second.period_id.unwrap();

        let response = post_json(
            &app,
            &format!("/periods/{second_id}/activate"),
            &admin_action(),
        )
        .await;
        assert_eq!(response.status(), HttpStatusCode::OK);

        let response = get_uri(&app, "/periods/active").await;
        let active: Option<PeriodInfo> = body_of(response).await;
        assert_eq!(active.unwrap().period_id, Some(second_id));
        assert_ne!(first, second_id);
    }

    #[tokio::test]
    async fn test_period_audit_trail_records_activation() {
        let app: Router = build_router(create_test_app_state());
        let period_id = bootstrap_period(&app).await;

        let response = get_uri(&app, &format!("/audit/period/{period_id}")).await;
        assert_eq!(response.status(), HttpStatusCode::OK);
        let events: Vec<AuditEventResponse> = body_of(response).await;

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action_name, "ActivatePeriod");
        assert_eq!(events[0].after_snapshot, format!("active_period={period_id}"));
    }

    #[tokio::test]
    async fn test_list_requests_requires_a_selector() {
        let app: Router = build_router(create_test_app_state());

        let response = get_uri(&app, "/requests").await;

        assert_eq!(response.status(), HttpStatusCode::BAD_REQUEST);
    }
}
