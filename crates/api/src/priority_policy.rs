// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Request priority policy validation.
//!
//! Priorities are caller-supplied non-negative integers where lower values
//! are more urgent; zero is the most urgent a request can be. The policy
//! bounds them to a fixed band so queue ordering stays meaningful.

use thiserror::Error;

/// Priority policy errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PriorityPolicyError {
    /// Priority is outside the allowed band.
    #[error("Priority must be between {min} and {max}, got {value}")]
    OutOfRange { min: u32, max: u32, value: u32 },
}

/// Priority policy configuration.
pub struct PriorityPolicy {
    /// Lowest allowed priority value (most urgent).
    pub min: u32,
    /// Highest allowed priority value (least urgent).
    pub max: u32,
}

impl Default for PriorityPolicy {
    fn default() -> Self {
        Self { min: 0, max: 10 }
    }
}

impl PriorityPolicy {
    /// Validates a priority value against the policy.
    ///
    /// # Errors
    ///
    /// Returns a `PriorityPolicyError` if the value falls outside the band.
    pub const fn validate(&self, priority: u32) -> Result<(), PriorityPolicyError> {
        if priority < self.min || priority > self.max {
            return Err(PriorityPolicyError::OutOfRange {
                min: self.min,
                max: self.max,
                value: priority,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_within_band_is_accepted() {
        let policy: PriorityPolicy = PriorityPolicy::default();

        assert!(policy.validate(1).is_ok());
        assert!(policy.validate(5).is_ok());
        assert!(policy.validate(10).is_ok());
    }

    #[test]
    fn test_priority_of_zero_is_most_urgent_and_accepted() {
        let policy: PriorityPolicy = PriorityPolicy::default();

        assert!(policy.validate(0).is_ok());
    }

    #[test]
    fn test_priority_above_band_is_rejected() {
        let policy: PriorityPolicy = PriorityPolicy::default();

        assert_eq!(
            policy.validate(11),
            Err(PriorityPolicyError::OutOfRange {
                min: 0,
                max: 10,
                value: 11
            })
        );
    }
}
