//! Engine configuration from `PROCURA_*` environment variables.

use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use procura_approvals::DefaultApproval;
use procura_auth::Role;
use procura_replenishment::ReplenishmentPolicy;

pub const ENV_SALES_WINDOW_DAYS: &str = "PROCURA_SALES_WINDOW_DAYS";
pub const ENV_BUFFER_DAYS: &str = "PROCURA_BUFFER_DAYS";
pub const ENV_CRITICAL_DAYS: &str = "PROCURA_CRITICAL_DAYS";
pub const ENV_HIGH_DAYS: &str = "PROCURA_HIGH_DAYS";
pub const ENV_MEDIUM_DAYS: &str = "PROCURA_MEDIUM_DAYS";
pub const ENV_DEFAULT_APPROVER_ROLE: &str = "PROCURA_DEFAULT_APPROVER_ROLE";
pub const ENV_RUNNER_INTERVAL_SECS: &str = "PROCURA_RUNNER_INTERVAL_SECS";

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub policy: ReplenishmentPolicy,
    pub default_approval: DefaultApproval,
    pub runner_interval: Duration,
    pub max_retries: u32,
    pub base_backoff: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            policy: ReplenishmentPolicy::default(),
            default_approval: DefaultApproval::default(),
            runner_interval: Duration::from_secs(3600),
            max_retries: 5,
            base_backoff: Duration::from_millis(250),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unset keys keep their default;
    /// unparsable values are logged and ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        let mut policy = cfg.policy;
        read(&lookup, ENV_SALES_WINDOW_DAYS, &mut policy.window_days);
        read(&lookup, ENV_BUFFER_DAYS, &mut policy.buffer_days);
        read(&lookup, ENV_CRITICAL_DAYS, &mut policy.critical_days);
        read(&lookup, ENV_HIGH_DAYS, &mut policy.high_days);
        read(&lookup, ENV_MEDIUM_DAYS, &mut policy.medium_days);

        match policy.validate() {
            Ok(()) => cfg.policy = policy,
            Err(e) => warn!(
                error = %e,
                "invalid replenishment policy in environment; using defaults"
            ),
        }

        read::<Role, _>(
            &lookup,
            ENV_DEFAULT_APPROVER_ROLE,
            &mut cfg.default_approval.required_role,
        );

        let mut secs = cfg.runner_interval.as_secs();
        read(&lookup, ENV_RUNNER_INTERVAL_SECS, &mut secs);
        if secs == 0 {
            warn!(
                key = ENV_RUNNER_INTERVAL_SECS,
                "runner interval must be positive; keeping default"
            );
        } else {
            cfg.runner_interval = Duration::from_secs(secs);
        }

        cfg
    }
}

fn read<T, F>(lookup: &F, key: &str, slot: &mut T)
where
    T: FromStr,
    T::Err: core::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return;
    };
    match raw.trim().parse::<T>() {
        Ok(v) => *slot = v,
        Err(e) => warn!(key, value = %raw, error = %e, "ignoring unparsable configuration value"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        assert_eq!(EngineConfig::from_lookup(lookup(&[])), EngineConfig::default());
    }

    #[test]
    fn reads_every_variable() {
        let cfg = EngineConfig::from_lookup(lookup(&[
            (ENV_SALES_WINDOW_DAYS, "60"),
            (ENV_BUFFER_DAYS, "7"),
            (ENV_CRITICAL_DAYS, "2"),
            (ENV_HIGH_DAYS, "5"),
            (ENV_MEDIUM_DAYS, "10"),
            (ENV_DEFAULT_APPROVER_ROLE, "finance_manager"),
            (ENV_RUNNER_INTERVAL_SECS, "120"),
        ]));

        assert_eq!(
            cfg.policy,
            ReplenishmentPolicy::default()
                .with_window_days(60)
                .with_buffer_days(7)
                .with_thresholds(2, 5, 10)
        );
        assert_eq!(cfg.default_approval.required_role, Role::FinanceManager);
        assert_eq!(cfg.runner_interval, Duration::from_secs(120));
    }

    #[test]
    fn bad_values_keep_defaults() {
        let cfg = EngineConfig::from_lookup(lookup(&[
            (ENV_SALES_WINDOW_DAYS, "thirty"),
            (ENV_DEFAULT_APPROVER_ROLE, "cashier"),
            (ENV_RUNNER_INTERVAL_SECS, "0"),
        ]));
        assert_eq!(cfg, EngineConfig::default());
    }

    #[test]
    fn inconsistent_thresholds_fall_back_to_default_policy() {
        let cfg = EngineConfig::from_lookup(lookup(&[
            (ENV_CRITICAL_DAYS, "20"),
            (ENV_BUFFER_DAYS, "3"),
        ]));
        assert_eq!(cfg.policy, ReplenishmentPolicy::default());
    }
}
