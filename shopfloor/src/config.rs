//! Runtime configuration
//!
//! Values are loaded from:
//! 1. `.env` file in the current directory or parent directories (if present)
//! 2. System environment variables
//!
//! Command line flags override both. Recognised variables:
//! - `SHOPFLOOR_SETUP_MINUTES`: fixed setup time added to every feasibility estimate
//! - `SHOPFLOOR_MAX_RECOMMENDATIONS`: shortlist length for planning
//! - `SHOPFLOOR_POLL_INTERVAL_SECS`: cadence of the detection/reconciliation poller
//! - `SHOPFLOOR_ENFORCE_COMPATIBILITY`: reject incompatible machine/operation pairs on assign

use std::str::FromStr;
use std::time::Duration;

use crate::error::{ShopFloorError, ShopFloorResult};

/// Fixed setup allowance in minutes added to every run-time estimate
pub const SETUP_MINUTES: i64 = 30;

/// Upper bound on the configurable setup allowance (one week)
pub const MAX_SETUP_MINUTES: i64 = 7 * 24 * 60;

/// Default shortlist length returned by the planner
pub const MAX_RECOMMENDATIONS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShopFloorConfig {
    pub setup_minutes: i64,
    pub max_recommendations: usize,
    pub poll_interval: Duration,
    pub enforce_compatibility_on_assign: bool,
}

impl Default for ShopFloorConfig {
    fn default() -> Self {
        Self {
            setup_minutes: SETUP_MINUTES,
            max_recommendations: MAX_RECOMMENDATIONS,
            poll_interval: Duration::from_secs(5),
            enforce_compatibility_on_assign: false,
        }
    }
}

impl ShopFloorConfig {
    const SETUP_MINUTES_VAR: &'static str = "SHOPFLOOR_SETUP_MINUTES";
    const MAX_RECOMMENDATIONS_VAR: &'static str = "SHOPFLOOR_MAX_RECOMMENDATIONS";
    const POLL_INTERVAL_VAR: &'static str = "SHOPFLOOR_POLL_INTERVAL_SECS";
    const ENFORCE_COMPATIBILITY_VAR: &'static str = "SHOPFLOOR_ENFORCE_COMPATIBILITY";

    /// Load `.env` if present, then read the environment over the defaults
    pub fn from_env() -> ShopFloorResult<Self> {
        let _ = dotenv::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; missing keys keep their defaults
    pub fn from_lookup<F>(lookup: F) -> ShopFloorResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(minutes) = parse_var::<i64, _>(&lookup, Self::SETUP_MINUTES_VAR)? {
            if !(0..=MAX_SETUP_MINUTES).contains(&minutes) {
                return Err(ShopFloorError::config(format!(
                    "{} must be between 0 and {}",
                    Self::SETUP_MINUTES_VAR,
                    MAX_SETUP_MINUTES
                )));
            }
            config.setup_minutes = minutes;
        }
        if let Some(count) = parse_var::<usize, _>(&lookup, Self::MAX_RECOMMENDATIONS_VAR)? {
            if count == 0 {
                return Err(ShopFloorError::config(format!("{} must be at least 1", Self::MAX_RECOMMENDATIONS_VAR)));
            }
            config.max_recommendations = count;
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, Self::POLL_INTERVAL_VAR)? {
            config = config.with_poll_interval_secs(secs)?;
        }
        if let Some(enforce) = parse_var::<bool, _>(&lookup, Self::ENFORCE_COMPATIBILITY_VAR)? {
            config.enforce_compatibility_on_assign = enforce;
        }

        Ok(config)
    }

    pub fn with_poll_interval_secs(mut self, secs: u64) -> ShopFloorResult<Self> {
        if secs == 0 {
            return Err(ShopFloorError::config(format!("{} must be at least 1 second", Self::POLL_INTERVAL_VAR)));
        }
        self.poll_interval = Duration::from_secs(secs);
        Ok(self)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> ShopFloorResult<Option<T>>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ShopFloorError::config(format!("{key}={raw}"))),
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
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = ShopFloorConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ShopFloorConfig::default());
        assert_eq!(config.setup_minutes, 30);
        assert_eq!(config.max_recommendations, 3);
    }

    #[test]
    fn test_overrides_from_environment() {
        let config = ShopFloorConfig::from_lookup(lookup(&[
            ("SHOPFLOOR_SETUP_MINUTES", "45"),
            ("SHOPFLOOR_MAX_RECOMMENDATIONS", "5"),
            ("SHOPFLOOR_POLL_INTERVAL_SECS", "12"),
            ("SHOPFLOOR_ENFORCE_COMPATIBILITY", "true"),
        ]))
        .unwrap();

        assert_eq!(config.setup_minutes, 45);
        assert_eq!(config.max_recommendations, 5);
        assert_eq!(config.poll_interval, Duration::from_secs(12));
        assert!(config.enforce_compatibility_on_assign);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = ShopFloorConfig::from_lookup(lookup(&[("SHOPFLOOR_SETUP_MINUTES", "soon")])).unwrap_err();
        assert!(matches!(err, ShopFloorError::Configuration { .. }));

        assert!(ShopFloorConfig::from_lookup(lookup(&[("SHOPFLOOR_POLL_INTERVAL_SECS", "0")])).is_err());
        assert!(ShopFloorConfig::from_lookup(lookup(&[("SHOPFLOOR_MAX_RECOMMENDATIONS", "0")])).is_err());
    }

    #[test]
    fn test_setup_minutes_are_bounded() {
        assert!(ShopFloorConfig::from_lookup(lookup(&[("SHOPFLOOR_SETUP_MINUTES", "-1")])).is_err());
        assert!(ShopFloorConfig::from_lookup(lookup(&[("SHOPFLOOR_SETUP_MINUTES", "10081")])).is_err());
        assert!(ShopFloorConfig::from_lookup(lookup(&[("SHOPFLOOR_SETUP_MINUTES", "9223372036854775807")])).is_err());

        let config = ShopFloorConfig::from_lookup(lookup(&[("SHOPFLOOR_SETUP_MINUTES", "10080")])).unwrap();
        assert_eq!(config.setup_minutes, MAX_SETUP_MINUTES);
    }
}
