//! Tunable constants of the replenishment model.

use serde::{Deserialize, Serialize};

use procura_core::{DomainError, DomainResult};

/// Trailing sales window used to derive velocity.
pub const DEFAULT_WINDOW_DAYS: u32 = 30;
/// Safety buffer added on top of lead time when sizing a reorder.
pub const DEFAULT_BUFFER_DAYS: u32 = 14;
pub const DEFAULT_CRITICAL_DAYS: u32 = 3;
pub const DEFAULT_HIGH_DAYS: u32 = 7;
pub const DEFAULT_MEDIUM_DAYS: u32 = 14;

/// Replenishment policy.
///
/// `Default` yields the documented constants; builders exist so callers (and
/// tests) can inject other values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplenishmentPolicy {
    pub window_days: u32,
    pub buffer_days: u32,
    /// Days-of-stock at or below which a product is `critical`.
    pub critical_days: u32,
    /// Days-of-stock at or below which a product is `high`.
    pub high_days: u32,
    /// Days-of-stock at or below which a product is `medium`.
    pub medium_days: u32,
}

impl Default for ReplenishmentPolicy {
    fn default() -> Self {
        Self {
            window_days: DEFAULT_WINDOW_DAYS,
            buffer_days: DEFAULT_BUFFER_DAYS,
            critical_days: DEFAULT_CRITICAL_DAYS,
            high_days: DEFAULT_HIGH_DAYS,
            medium_days: DEFAULT_MEDIUM_DAYS,
        }
    }
}

impl ReplenishmentPolicy {
    pub fn with_window_days(mut self, days: u32) -> Self {
        self.window_days = days;
        self
    }

    pub fn with_buffer_days(mut self, days: u32) -> Self {
        self.buffer_days = days;
        self
    }

    pub fn with_thresholds(mut self, critical: u32, high: u32, medium: u32) -> Self {
        self.critical_days = critical;
        self.high_days = high;
        self.medium_days = medium;
        self
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.window_days == 0 {
            return Err(DomainError::malformed("window_days must be >= 1"));
        }
        if !(self.critical_days <= self.high_days && self.high_days <= self.medium_days) {
            return Err(DomainError::malformed(format!(
                "priority thresholds must not decrease (critical={}, high={}, medium={})",
                self.critical_days, self.high_days, self.medium_days
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let policy = ReplenishmentPolicy::default();
        assert_eq!(policy.window_days, 30);
        assert_eq!(policy.buffer_days, 14);
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn zero_window_is_rejected() {
        let err = ReplenishmentPolicy::default().with_window_days(0).validate().unwrap_err();
        assert_eq!(err.kind(), "malformed_input");
    }

    #[test]
    fn decreasing_thresholds_are_rejected() {
        let policy = ReplenishmentPolicy::default().with_thresholds(7, 3, 14);
        assert!(policy.validate().is_err());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let policy: ReplenishmentPolicy = serde_json::from_str(r#"{"window_days": 60}"#).unwrap();
        assert_eq!(policy.window_days, 60);
        assert_eq!(policy.buffer_days, DEFAULT_BUFFER_DAYS);
    }
}
