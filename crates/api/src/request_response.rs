// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Request and response DTOs for the API boundary.
//!
//! These are distinct from domain types and represent the wire contract.
//! Enums travel as their canonical strings; timestamps travel as UTC
//! RFC 3339 values.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use matricula_domain::{ChangeRequest, Conflict, Enrollment, HistoryEntry, TimeSlot};

/// API request to create a schedule-change request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRequestRequest {
    /// The request type (`GROUP_CHANGE`, `COURSE_CHANGE`, `WITHDRAWAL`).
    pub request_type: String,
    /// The requesting student.
    pub student_id: i64,
    /// The origin enrollment being moved away from, if any.
    pub origin_enrollment_id: Option<i64>,
    /// The destination group, if any.
    pub destination_group_id: Option<i64>,
    /// The destination course, if any.
    pub destination_course_id: Option<i64>,
    /// Priority; lower values are more urgent.
    pub priority: u32,
    /// Free-text notes from the student.
    pub notes: Option<String>,
}

/// API request to edit a pending request.
///
/// `None` leaves the field untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UpdateRequestRequest {
    /// New destination group.
    pub destination_group_id: Option<i64>,
    /// New destination course.
    pub destination_course_id: Option<i64>,
    /// New priority.
    pub priority: Option<u32>,
    /// Notes recorded on the update history entry.
    pub notes: Option<String>,
}

/// API request to transition a request to a new state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeStateRequest {
    /// The target state.
    pub new_state: String,
    /// Notes recorded on the state-change history entry.
    pub notes: Option<String>,
}

/// One entry of a request's history log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntryInfo {
    /// The action taken (`CREATED`, `UPDATED`, `STATE:<to> (from <from>)`).
    pub action: String,
    /// When the action was recorded (UTC).
    pub recorded_at: DateTime<Utc>,
    /// Notes recorded with the action.
    pub notes: Option<String>,
}

impl From<&HistoryEntry> for HistoryEntryInfo {
    fn from(entry: &HistoryEntry) -> Self {
        Self {
            action: entry.action.to_string(),
            recorded_at: entry.recorded_at,
            notes: entry.notes.clone(),
        }
    }
}

/// Full request information as returned by query and mutation handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestInfo {
    /// The request ID.
    pub request_id: Option<i64>,
    /// The human-facing request code.
    pub code: String,
    /// The request type.
    pub request_type: String,
    /// The current state.
    pub state: String,
    /// The requesting student.
    pub student_id: i64,
    /// The origin enrollment, if any.
    pub origin_enrollment_id: Option<i64>,
    /// The destination group, if any.
    pub destination_group_id: Option<i64>,
    /// The destination course, if any.
    pub destination_course_id: Option<i64>,
    /// The owning academic period.
    pub period_id: i64,
    /// Priority; lower values are more urgent.
    pub priority: u32,
    /// When the request was created (UTC).
    pub created_at: DateTime<Utc>,
    /// When staff must respond by (UTC).
    pub response_deadline: DateTime<Utc>,
    /// When the request was last written (UTC).
    pub updated_at: DateTime<Utc>,
    /// The full history log, oldest first.
    pub history: Vec<HistoryEntryInfo>,
}

impl From<&ChangeRequest> for RequestInfo {
    fn from(request: &ChangeRequest) -> Self {
        Self {
            request_id: request.request_id,
            code: request.code.clone(),
            request_type: request.request_type.to_string(),
            state: request.state.to_string(),
            student_id: request.student_id,
            origin_enrollment_id: request.origin_enrollment_id,
            destination_group_id: request.destination_group_id,
            destination_course_id: request.destination_course_id,
            period_id: request.period_id,
            priority: request.priority,
            created_at: request.created_at,
            response_deadline: request.response_deadline,
            updated_at: request.updated_at,
            history: request.history.iter().map(HistoryEntryInfo::from).collect(),
        }
    }
}

/// API response for a successful request creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateRequestResponse {
    /// The created request.
    pub request: RequestInfo,
    /// Schedule conflicts detected against the destination group.
    ///
    /// Conflicts are recorded for staff review; they do not block creation.
    pub conflicts: Vec<ConflictInfo>,
    /// A success message.
    pub message: String,
}

/// API response for a successful state change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeStateResponse {
    /// The request after the transition.
    pub request: RequestInfo,
    /// A success message.
    pub message: String,
}

/// API response for a successful request deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteRequestResponse {
    /// The deleted request ID.
    pub request_id: i64,
    /// A success message.
    pub message: String,
}

/// Per-state request counts for a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateCountInfo {
    /// The request state.
    pub state: String,
    /// The number of requests currently in that state.
    pub count: i64,
}

/// One weekly time slot on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlotInfo {
    /// The weekday.
    pub weekday: String,
    /// Slot start (inclusive).
    pub start_time: NaiveTime,
    /// Slot end (exclusive).
    pub end_time: NaiveTime,
    /// Room identifier.
    pub room: String,
    /// Session type.
    pub session_type: String,
}

impl From<&TimeSlot> for TimeSlotInfo {
    fn from(slot: &TimeSlot) -> Self {
        Self {
            weekday: slot.weekday.to_string(),
            start_time: slot.start_time,
            end_time: slot.end_time,
            room: slot.room.clone(),
            session_type: slot.session_type.to_string(),
        }
    }
}

/// Group information including occupancy reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupInfo {
    /// The group ID.
    pub group_id: Option<i64>,
    /// The owning course.
    pub course_id: i64,
    /// The owning academic period.
    pub period_id: i64,
    /// The instructor.
    pub instructor_id: i64,
    /// Maximum seats.
    pub capacity_max: i32,
    /// Occupied seats.
    pub current_enrollment: i32,
    /// Occupancy as a percentage of capacity (0.0 for zero-capacity groups).
    pub occupancy_percentage: f64,
    /// Whether occupancy is at or above the near-capacity threshold.
    pub near_capacity: bool,
    /// Weekly schedule.
    pub schedules: Vec<TimeSlotInfo>,
    /// Waitlisted students in join order.
    pub waitlist: Vec<i64>,
    /// Whether the group is active.
    pub active: bool,
}

/// API request to create a class group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateGroupRequest {
    /// The owning course.
    pub course_id: i64,
    /// The owning academic period.
    pub period_id: i64,
    /// The instructor.
    pub instructor_id: i64,
    /// Maximum seats.
    pub capacity_max: i32,
    /// Weekly schedule.
    pub schedules: Vec<TimeSlotInfo>,
}

/// Academic period information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodInfo {
    /// The period ID.
    pub period_id: Option<i64>,
    /// Period start (UTC).
    pub start: DateTime<Utc>,
    /// Period end (UTC).
    pub end: DateTime<Utc>,
    /// When enrollment opens (UTC).
    pub enrollment_window_start: DateTime<Utc>,
    /// Deadline for new change requests (UTC).
    pub request_deadline: DateTime<Utc>,
    /// Academic year.
    pub year: u16,
    /// Term within the year.
    pub term: u8,
    /// Whether this is the active period.
    pub active: bool,
}

/// API request to create an academic period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePeriodRequest {
    /// Period start (UTC).
    pub start: DateTime<Utc>,
    /// Period end (UTC).
    pub end: DateTime<Utc>,
    /// When enrollment opens (UTC).
    pub enrollment_window_start: DateTime<Utc>,
    /// Deadline for new change requests (UTC).
    pub request_deadline: DateTime<Utc>,
    /// Academic year.
    pub year: u16,
    /// Term within the year.
    pub term: u8,
}

/// API response for a successful period activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivatePeriodResponse {
    /// The activated period ID.
    pub period_id: i64,
    /// A success message.
    pub message: String,
}

/// Enrollment information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentInfo {
    /// The enrollment ID.
    pub enrollment_id: Option<i64>,
    /// The enrolled student.
    pub student_id: i64,
    /// The group the student is enrolled in.
    pub group_id: i64,
    /// Whether this enrollment is active.
    pub active: bool,
}

impl From<&Enrollment> for EnrollmentInfo {
    fn from(enrollment: &Enrollment) -> Self {
        Self {
            enrollment_id: enrollment.enrollment_id,
            student_id: enrollment.student_id,
            group_id: enrollment.group_id,
            active: enrollment.active,
        }
    }
}

/// API request to enroll a student in a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateEnrollmentRequest {
    /// The student to enroll.
    pub student_id: i64,
    /// The group to enroll in.
    pub group_id: i64,
}

/// Conflict ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictInfo {
    /// The conflict ID.
    pub conflict_id: Option<i64>,
    /// The conflict category.
    pub category: String,
    /// Free-text description of the conflict.
    pub description: String,
    /// The affected student.
    pub student_id: i64,
    /// The associated request, if any.
    pub request_id: Option<i64>,
    /// The associated group, if any.
    pub group_id: Option<i64>,
    /// When the conflict was detected (UTC).
    pub detected_at: DateTime<Utc>,
    /// Whether the conflict has been resolved.
    pub resolved: bool,
    /// Notes recorded when the conflict was resolved.
    pub resolution_notes: Option<String>,
}

impl From<&Conflict> for ConflictInfo {
    fn from(conflict: &Conflict) -> Self {
        Self {
            conflict_id: conflict.conflict_id,
            category: conflict.category.to_string(),
            description: conflict.description.clone(),
            student_id: conflict.student_id,
            request_id: conflict.request_id,
            group_id: conflict.group_id,
            detected_at: conflict.detected_at,
            resolved: conflict.resolved,
            resolution_notes: conflict.resolution_notes.clone(),
        }
    }
}

/// API request to register a conflict manually.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterConflictRequest {
    /// The conflict category.
    pub category: String,
    /// Free-text description of the conflict.
    pub description: String,
    /// The affected student.
    pub student_id: i64,
    /// The associated request, if any.
    pub request_id: Option<i64>,
    /// The associated group, if any.
    pub group_id: Option<i64>,
}

/// API request to rewrite a conflict's descriptor fields.
///
/// Detection timestamp and resolution state are not editable here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateConflictRequest {
    /// The conflict category.
    pub category: String,
    /// Free-text description of the conflict.
    pub description: String,
    /// The affected student.
    pub student_id: i64,
    /// The associated request, if any.
    pub request_id: Option<i64>,
    /// The associated group, if any.
    pub group_id: Option<i64>,
}

/// API request to resolve a conflict.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResolveConflictRequest {
    /// Notes explaining the resolution.
    pub resolution_notes: Option<String>,
}

/// API request to join or leave a group waitlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitlistRequest {
    /// The student joining or leaving.
    pub student_id: i64,
}

/// API response for a waitlist join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinWaitlistResponse {
    /// The group.
    pub group_id: i64,
    /// The student.
    pub student_id: i64,
    /// The student's 1-indexed waitlist position.
    pub position: usize,
    /// Whether this call added the student (false when already waitlisted).
    pub newly_joined: bool,
}

/// API response for a waitlist leave.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveWaitlistResponse {
    /// The group.
    pub group_id: i64,
    /// The student.
    pub student_id: i64,
    /// Whether the student was on the waitlist.
    pub removed: bool,
}

/// API response for a waitlist position query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitlistPositionResponse {
    /// The group.
    pub group_id: i64,
    /// The student.
    pub student_id: i64,
    /// The student's 1-indexed position, or `None` if not waitlisted.
    pub position: Option<usize>,
}
