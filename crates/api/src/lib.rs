// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API boundary layer.
//!
//! Handlers orchestrate the pure lifecycle engine over loaded entities and
//! the persistence layer, translate every lower-layer error into an
//! [`ApiError`], and attach an audit event to each state-changing operation.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

pub mod error;
pub mod handlers;
pub mod priority_policy;
pub mod request_response;

#[cfg(test)]
mod tests;

pub use error::{
    ApiError, translate_core_error, translate_domain_error, translate_persistence_error,
};
pub use priority_policy::{PriorityPolicy, PriorityPolicyError};
