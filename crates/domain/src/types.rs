// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Represents a weekday for a scheduled class slot.
///
/// Weekdays are domain constants Monday through Sunday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Weekday {
    /// Monday.
    Monday,
    /// Tuesday.
    Tuesday,
    /// Wednesday.
    Wednesday,
    /// Thursday.
    Thursday,
    /// Friday.
    Friday,
    /// Saturday.
    Saturday,
    /// Sunday.
    Sunday,
}

impl FromStr for Weekday {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Monday" => Ok(Self::Monday),
            "Tuesday" => Ok(Self::Tuesday),
            "Wednesday" => Ok(Self::Wednesday),
            "Thursday" => Ok(Self::Thursday),
            "Friday" => Ok(Self::Friday),
            "Saturday" => Ok(Self::Saturday),
            "Sunday" => Ok(Self::Sunday),
            _ => Err(DomainError::InvalidWeekday(s.to_string())),
        }
    }
}

impl std::fmt::Display for Weekday {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Weekday {
    /// Converts this weekday to its string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Monday => "Monday",
            Self::Tuesday => "Tuesday",
            Self::Wednesday => "Wednesday",
            Self::Thursday => "Thursday",
            Self::Friday => "Friday",
            Self::Saturday => "Saturday",
            Self::Sunday => "Sunday",
        }
    }

    /// Returns the 0-based index of this weekday (Monday = 0).
    ///
    /// Used for deterministic ordering of conflict reports.
    #[must_use]
    pub const fn index(&self) -> u8 {
        match self {
            Self::Monday => 0,
            Self::Tuesday => 1,
            Self::Wednesday => 2,
            Self::Thursday => 3,
            Self::Friday => 4,
            Self::Saturday => 5,
            Self::Sunday => 6,
        }
    }
}

/// Represents the session type of a scheduled class slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionType {
    /// Lecture session.
    Lecture,
    /// Laboratory session.
    Lab,
}

impl FromStr for SessionType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Lecture" => Ok(Self::Lecture),
            "Lab" => Ok(Self::Lab),
            _ => Err(DomainError::InvalidSessionType(s.to_string())),
        }
    }
}

impl std::fmt::Display for SessionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl SessionType {
    /// Converts this session type to its string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Lecture => "Lecture",
            Self::Lab => "Lab",
        }
    }
}

/// Represents a weekly scheduled class slot.
///
/// A slot occupies the half-open interval `[start_time, end_time)` on its
/// weekday. Slots that are back-to-back do not overlap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    /// The weekday this slot occurs on.
    pub weekday: Weekday,
    /// The start time (inclusive).
    pub start_time: NaiveTime,
    /// The end time (exclusive).
    pub end_time: NaiveTime,
    /// The room identifier.
    pub room: String,
    /// The session type.
    pub session_type: SessionType,
}

impl TimeSlot {
    /// Creates a new `TimeSlot`.
    ///
    /// # Arguments
    ///
    /// * `weekday` - The weekday this slot occurs on
    /// * `start_time` - The start time (inclusive)
    /// * `end_time` - The end time (exclusive)
    /// * `room` - The room identifier
    /// * `session_type` - The session type
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidSchedule` if `start_time >= end_time`
    /// or the room identifier is empty.
    pub fn new(
        weekday: Weekday,
        start_time: NaiveTime,
        end_time: NaiveTime,
        room: &str,
        session_type: SessionType,
    ) -> Result<Self, DomainError> {
        if start_time >= end_time {
            return Err(DomainError::InvalidSchedule {
                reason: format!("start time {start_time} must be before end time {end_time}"),
            });
        }
        if room.trim().is_empty() {
            return Err(DomainError::InvalidSchedule {
                reason: String::from("room identifier must not be empty"),
            });
        }
        Ok(Self {
            weekday,
            start_time,
            end_time,
            room: room.to_string(),
            session_type,
        })
    }
}

/// Represents the type of a schedule-change request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestType {
    /// Switch to a different group (section) of the same course.
    GroupChange,
    /// Switch to a different course.
    CourseChange,
    /// Adjust the schedule without changing course or group ownership.
    ScheduleAdjustment,
    /// Drop the enrollment entirely.
    Withdrawal,
}

impl FromStr for RequestType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GroupChange" => Ok(Self::GroupChange),
            "CourseChange" => Ok(Self::CourseChange),
            "ScheduleAdjustment" => Ok(Self::ScheduleAdjustment),
            "Withdrawal" => Ok(Self::Withdrawal),
            _ => Err(DomainError::InvalidRequestType(s.to_string())),
        }
    }
}

impl std::fmt::Display for RequestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl RequestType {
    /// Converts this request type to its string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::GroupChange => "GroupChange",
            Self::CourseChange => "CourseChange",
            Self::ScheduleAdjustment => "ScheduleAdjustment",
            Self::Withdrawal => "Withdrawal",
        }
    }
}

/// Represents the lifecycle state of a schedule-change request.
///
/// Explicit lifecycle states govern what operations are permitted.
/// `Approved` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum RequestState {
    /// Initial state after creation. Editable by the student.
    #[default]
    Pending,
    /// Taken up by academic staff for review.
    UnderReview,
    /// Approved. Terminal; seats have been moved.
    Approved,
    /// Rejected. Terminal.
    Rejected,
    /// Returned to the student for additional information.
    NeedsMoreInfo,
}

impl FromStr for RequestState {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "UnderReview" => Ok(Self::UnderReview),
            "Approved" => Ok(Self::Approved),
            "Rejected" => Ok(Self::Rejected),
            "NeedsMoreInfo" => Ok(Self::NeedsMoreInfo),
            _ => Err(DomainError::InvalidRequestState(s.to_string())),
        }
    }
}

impl std::fmt::Display for RequestState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl RequestState {
    /// All request states, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::UnderReview,
        Self::Approved,
        Self::Rejected,
        Self::NeedsMoreInfo,
    ];

    /// Converts this state to its string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::UnderReview => "UnderReview",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
            Self::NeedsMoreInfo => "NeedsMoreInfo",
        }
    }

    /// Checks if a transition from this state to another is valid.
    ///
    /// Valid transitions are:
    /// - Pending → `UnderReview`, Rejected
    /// - `UnderReview` → Approved, Rejected, `NeedsMoreInfo`
    /// - `NeedsMoreInfo` → Pending
    ///
    /// Approved and Rejected are terminal and allow no transitions.
    /// A no-op transition (`target == self`) is never valid.
    #[must_use]
    pub const fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Pending, Self::UnderReview | Self::Rejected)
                | (
                    Self::UnderReview,
                    Self::Approved | Self::Rejected | Self::NeedsMoreInfo
                )
                | (Self::NeedsMoreInfo, Self::Pending)
        )
    }

    /// Returns whether this state is terminal.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }

    /// Returns whether the student may edit or resubmit the request in this state.
    #[must_use]
    pub const fn allows_editing(&self) -> bool {
        matches!(self, Self::Pending | Self::NeedsMoreInfo)
    }
}

/// Represents the action recorded by a request history entry.
///
/// History actions are a tagged variant rather than a free-text string so
/// transition coverage can be checked exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistoryAction {
    /// The request was created.
    Created,
    /// Mutable request fields were updated.
    Updated,
    /// The request transitioned between lifecycle states.
    StateChange {
        /// The state before the transition.
        from: RequestState,
        /// The state after the transition.
        to: RequestState,
    },
}

impl std::fmt::Display for HistoryAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "CREATED"),
            Self::Updated => write!(f, "UPDATED"),
            Self::StateChange { from, to } => write!(f, "STATE:{to} (from {from})"),
        }
    }
}

/// Represents one append-only entry in a request's history log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// The action recorded by this entry.
    pub action: HistoryAction,
    /// When the action occurred (UTC).
    pub recorded_at: DateTime<Utc>,
    /// Optional free-text notes supplied with the action.
    pub notes: Option<String>,
}

impl HistoryEntry {
    /// Creates a new `HistoryEntry`.
    #[must_use]
    pub const fn new(
        action: HistoryAction,
        recorded_at: DateTime<Utc>,
        notes: Option<String>,
    ) -> Self {
        Self {
            action,
            recorded_at,
            notes,
        }
    }
}

/// Represents a class group (section) offered within an academic period.
///
/// Groups are created by course setup. Their enrollment counter and waitlist
/// are mutated only through capacity operations; a group is never deleted
/// while it has active enrollments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Canonical numeric identifier assigned by the database.
    /// `None` indicates the group has not been persisted yet.
    pub group_id: Option<i64>,
    /// The owning course identifier.
    pub course_id: i64,
    /// The owning academic period identifier.
    pub period_id: i64,
    /// The instructor identifier.
    pub instructor_id: i64,
    /// The maximum number of seats (>= 0).
    pub capacity_max: i32,
    /// The current enrollment count (0 <= count <= max).
    pub current_enrollment: i32,
    /// The ordered weekly schedule of this group.
    pub schedules: Vec<TimeSlot>,
    /// FIFO waitlist of student identifiers, no duplicates.
    pub waitlist: Vec<i64>,
    /// Whether this group is active.
    pub active: bool,
}

impl Group {
    /// Creates a new `Group` without a persisted ID.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidCapacity` if `capacity_max` is negative
    /// or `current_enrollment` is outside `[0, capacity_max]`.
    pub fn new(
        course_id: i64,
        period_id: i64,
        instructor_id: i64,
        capacity_max: i32,
        current_enrollment: i32,
        schedules: Vec<TimeSlot>,
    ) -> Result<Self, DomainError> {
        crate::validation::validate_group_capacity(current_enrollment, capacity_max)?;
        Ok(Self {
            group_id: None,
            course_id,
            period_id,
            instructor_id,
            capacity_max,
            current_enrollment,
            schedules,
            waitlist: Vec::new(),
            active: true,
        })
    }

    /// Creates a `Group` with an existing persisted ID.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidCapacity` if the counter invariant is violated.
    #[allow(clippy::too_many_arguments)]
    pub fn with_id(
        group_id: i64,
        course_id: i64,
        period_id: i64,
        instructor_id: i64,
        capacity_max: i32,
        current_enrollment: i32,
        schedules: Vec<TimeSlot>,
        waitlist: Vec<i64>,
        active: bool,
    ) -> Result<Self, DomainError> {
        crate::validation::validate_group_capacity(current_enrollment, capacity_max)?;
        Ok(Self {
            group_id: Some(group_id),
            course_id,
            period_id,
            instructor_id,
            capacity_max,
            current_enrollment,
            schedules,
            waitlist,
            active,
        })
    }
}

/// Represents an academic period (term).
///
/// At most one period is active system-wide at any time. That invariant is
/// enforced by the period activation routine, which swaps the active flag in
/// a single atomic update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcademicPeriod {
    /// Canonical numeric identifier assigned by the database.
    /// `None` indicates the period has not been persisted yet.
    pub period_id: Option<i64>,
    /// The period start instant (UTC).
    pub start: DateTime<Utc>,
    /// The period end instant (UTC).
    pub end: DateTime<Utc>,
    /// When the enrollment window opens (UTC).
    pub enrollment_window_start: DateTime<Utc>,
    /// The deadline after which no new change requests are accepted (UTC).
    pub request_deadline: DateTime<Utc>,
    /// The calendar year of the period.
    pub year: u16,
    /// The term number within the year.
    pub term: u8,
    /// Whether this is the active period.
    pub active: bool,
}

impl AcademicPeriod {
    /// Creates a new `AcademicPeriod` without a persisted ID.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPeriodDates` if `start >= end` or the
    /// request deadline falls outside `[start, end]`.
    pub fn new(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        enrollment_window_start: DateTime<Utc>,
        request_deadline: DateTime<Utc>,
        year: u16,
        term: u8,
    ) -> Result<Self, DomainError> {
        crate::validation::validate_period_dates(start, end, request_deadline)?;
        Ok(Self {
            period_id: None,
            start,
            end,
            enrollment_window_start,
            request_deadline,
            year,
            term,
            active: false,
        })
    }

    /// Creates an `AcademicPeriod` with an existing persisted ID.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPeriodDates` if the date invariants are violated.
    #[allow(clippy::too_many_arguments)]
    pub fn with_id(
        period_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        enrollment_window_start: DateTime<Utc>,
        request_deadline: DateTime<Utc>,
        year: u16,
        term: u8,
        active: bool,
    ) -> Result<Self, DomainError> {
        crate::validation::validate_period_dates(start, end, request_deadline)?;
        Ok(Self {
            period_id: Some(period_id),
            start,
            end,
            enrollment_window_start,
            request_deadline,
            year,
            term,
            active,
        })
    }
}

/// Represents a student's enrollment in a group.
///
/// Enrollments are referenced by change requests as the origin being moved
/// away from, and their groups supply the slots checked by the overlap
/// detector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    /// Canonical numeric identifier assigned by the database.
    pub enrollment_id: Option<i64>,
    /// The enrolled student.
    pub student_id: i64,
    /// The group the student is enrolled in.
    pub group_id: i64,
    /// Whether this enrollment is active.
    pub active: bool,
}

impl Enrollment {
    /// Creates a new `Enrollment` without a persisted ID.
    #[must_use]
    pub const fn new(student_id: i64, group_id: i64) -> Self {
        Self {
            enrollment_id: None,
            student_id,
            group_id,
            active: true,
        }
    }

    /// Creates an `Enrollment` with an existing persisted ID.
    #[must_use]
    pub const fn with_id(enrollment_id: i64, student_id: i64, group_id: i64, active: bool) -> Self {
        Self {
            enrollment_id: Some(enrollment_id),
            student_id,
            group_id,
            active,
        }
    }
}

/// Represents a schedule-change request (solicitud).
///
/// Requests are owned exclusively by the request lifecycle; other components
/// read and report but never mutate a request directly. The history log is
/// append-only and never empty once the record exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRequest {
    /// Canonical numeric identifier assigned by the database.
    pub request_id: Option<i64>,
    /// Generated globally unique code (`SOL-<timestamp>-<suffix>`).
    pub code: String,
    /// The type of change requested.
    pub request_type: RequestType,
    /// The current lifecycle state.
    pub state: RequestState,
    /// The requesting student.
    pub student_id: i64,
    /// The origin enrollment being moved away from, if any.
    pub origin_enrollment_id: Option<i64>,
    /// The destination group, if the change targets a specific group.
    pub destination_group_id: Option<i64>,
    /// The destination course, if the change targets a course.
    pub destination_course_id: Option<i64>,
    /// The owning academic period.
    pub period_id: i64,
    /// Priority; lower values are more urgent.
    pub priority: u32,
    /// When the request was created (UTC).
    pub created_at: DateTime<Utc>,
    /// When staff should respond by (creation + N business days, UTC).
    /// Informational; overdue requests remain queryable.
    pub response_deadline: DateTime<Utc>,
    /// When the request was last updated (UTC).
    pub updated_at: DateTime<Utc>,
    /// Append-only history log. The first entry is always the creation event.
    pub history: Vec<HistoryEntry>,
}

impl ChangeRequest {
    /// Returns the most recent history entry.
    ///
    /// The history invariant guarantees at least one entry for any request
    /// that exists, so `None` only occurs on a malformed reconstruction.
    #[must_use]
    pub fn last_history_entry(&self) -> Option<&HistoryEntry> {
        self.history.last()
    }
}

/// Represents the category of a recorded conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConflictCategory {
    /// Two weekly time slots overlap.
    ScheduleOverlap,
    /// A capacity dispute (e.g., a seat could not be honored).
    Capacity,
    /// Manually reported by staff.
    Manual,
}

impl FromStr for ConflictCategory {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ScheduleOverlap" => Ok(Self::ScheduleOverlap),
            "Capacity" => Ok(Self::Capacity),
            "Manual" => Ok(Self::Manual),
            _ => Err(DomainError::InvalidConflictCategory(s.to_string())),
        }
    }
}

impl std::fmt::Display for ConflictCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ConflictCategory {
    /// Converts this category to its string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ScheduleOverlap => "ScheduleOverlap",
            Self::Capacity => "Capacity",
            Self::Manual => "Manual",
        }
    }
}

/// Represents a detected or manually reported conflict.
///
/// Conflicts are created by the conflict registry and mutated only to toggle
/// their resolved state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    /// Canonical numeric identifier assigned by the database.
    pub conflict_id: Option<i64>,
    /// The conflict category.
    pub category: ConflictCategory,
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

impl Conflict {
    /// Creates a new unresolved `Conflict` without a persisted ID.
    #[must_use]
    pub const fn new(
        category: ConflictCategory,
        description: String,
        student_id: i64,
        request_id: Option<i64>,
        group_id: Option<i64>,
        detected_at: DateTime<Utc>,
    ) -> Self {
        Self {
            conflict_id: None,
            category,
            description,
            student_id,
            request_id,
            group_id,
            detected_at,
            resolved: false,
            resolution_notes: None,
        }
    }
}
