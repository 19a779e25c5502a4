// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Request code generation.
//!
//! Codes have the shape `SOL-<14-digit UTC timestamp>-<8 uppercase
//! alphanumerics>`. The timestamp component gives practical uniqueness at
//! the expected request rate; the random suffix guards against two requests
//! created within the same second. Collision resistance does not need to be
//! cryptographic.

use chrono::{DateTime, Utc};
use rand::RngExt;

/// The fixed code prefix.
pub const REQUEST_CODE_PREFIX: &str = "SOL";

/// The length of the random suffix.
pub const REQUEST_CODE_SUFFIX_LEN: usize = 8;

const SUFFIX_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generates a request code for a request created at `now`.
///
/// # Arguments
///
/// * `now` - The creation instant, taken from the injected clock
#[must_use]
pub fn generate_request_code(now: DateTime<Utc>) -> String {
    let timestamp = now.format("%Y%m%d%H%M%S");
    let mut rng = rand::rng();
    let suffix: String = (0..REQUEST_CODE_SUFFIX_LEN)
        .map(|_| {
            let idx = rng.random_range(0..SUFFIX_CHARSET.len());
            char::from(SUFFIX_CHARSET[idx])
        })
        .collect();
    format!("{REQUEST_CODE_PREFIX}-{timestamp}-{suffix}")
}
