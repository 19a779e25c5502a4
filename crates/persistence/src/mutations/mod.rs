// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Mutation modules.
//!
//! This module contains all state-changing operations for the persistence
//! layer. Multi-step operations (request creation, approval, period
//! activation) run inside a single transaction so they either succeed
//! completely or leave no trace.
//!
//! ## Module Organization
//!
//! - `audit` — Audit event persistence
//! - `conflicts` — Conflict registry mutations
//! - `enrollments` — Enrollment mutations
//! - `groups` — Group, seat counter, and waitlist mutations
//! - `periods` — Academic period mutations
//! - `requests` — Change request lifecycle persistence

pub mod audit;
pub mod conflicts;
pub mod enrollments;
pub mod groups;
pub mod periods;
pub mod requests;

pub use requests::PersistRequestResult;
