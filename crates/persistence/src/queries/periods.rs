// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Academic period queries.

use diesel::prelude::*;
use diesel::SqliteConnection;

use crate::data_models::{PeriodRow, period_from_row};
use crate::diesel_schema::academic_periods;
use crate::error::PersistenceError;
use matricula_domain::AcademicPeriod;

/// Retrieves a period by ID.
///
/// # Errors
///
/// Returns `PersistenceError::NotFound` if the period does not exist.
pub fn get_period(
    conn: &mut SqliteConnection,
    period_id: i64,
) -> Result<AcademicPeriod, PersistenceError> {
    let row: PeriodRow = academic_periods::table
        .filter(academic_periods::period_id.eq(period_id))
        .first(conn)
        .optional()?
        .ok_or_else(|| PersistenceError::NotFound(format!("period {period_id}")))?;

    period_from_row(&row)
}

/// Retrieves the active period, if one exists.
///
/// # Errors
///
/// Returns an error if the query fails or the row cannot be reconstructed.
pub fn get_active_period(
    conn: &mut SqliteConnection,
) -> Result<Option<AcademicPeriod>, PersistenceError> {
    let row: Option<PeriodRow> = academic_periods::table
        .filter(academic_periods::is_active.eq(1))
        .first(conn)
        .optional()?;

    row.as_ref().map(period_from_row).transpose()
}

/// Lists all periods, newest year and term first.
///
/// # Errors
///
/// Returns an error if the query fails or a row cannot be reconstructed.
pub fn list_periods(
    conn: &mut SqliteConnection,
) -> Result<Vec<AcademicPeriod>, PersistenceError> {
    let rows: Vec<PeriodRow> = academic_periods::table
        .order((academic_periods::year.desc(), academic_periods::term.desc()))
        .load(conn)?;

    rows.iter().map(period_from_row).collect()
}
