// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Query modules.
//!
//! Read-only operations for the persistence layer. Queries reconstruct
//! full domain entities from their stored rows; callers never see row
//! types.
//!
//! ## Module Organization
//!
//! - `audit` — Audit event retrieval
//! - `conflicts` — Conflict registry queries
//! - `enrollments` — Enrollment and enrolled-slot queries
//! - `groups` — Group and waitlist queries
//! - `periods` — Academic period queries
//! - `requests` — Change request queries and reporting

pub mod audit;
pub mod conflicts;
pub mod enrollments;
pub mod groups;
pub mod periods;
pub mod requests;
