//! Tuning knobs for the adaptive tutor

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

use crate::engine::error::WaypointError;

pub const MAX_PROBLEMS_VAR: &str = "WAYPOINT_MAX_PROBLEMS";
pub const HINTS_VAR: &str = "WAYPOINT_HINTS";
pub const TOLERANCE_VAR: &str = "WAYPOINT_TOLERANCE";

/// Quiz rules. Defaults give an eight-problem session with three hints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TutorConfig {
    /// Attempts after which the session finishes
    pub max_problems: u32,
    /// Hints available for the whole session
    pub hints_per_session: u32,
    /// An answer is correct when strictly closer than this to the solution
    pub tolerance: f64,
    /// Streak at which difficulty goes up
    pub level_up_streak: i32,
    /// Streak at which difficulty goes down
    pub level_down_streak: i32,
    /// Lowest value a losing streak can reach
    pub streak_floor: i32,
}

impl Default for TutorConfig {
    fn default() -> Self {
        Self {
            max_problems: 8,
            hints_per_session: 3,
            tolerance: 0.1,
            level_up_streak: 3,
            level_down_streak: -2,
            streak_floor: -3,
        }
    }
}

impl TutorConfig {
    /// Defaults overridden by `WAYPOINT_*` environment variables
    pub fn from_env() -> Result<Self, WaypointError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, WaypointError> {
        let mut config = Self::default();

        if let Some(value) = parse_var(&lookup, MAX_PROBLEMS_VAR)? {
            config.max_problems = value;
        }
        if let Some(value) = parse_var(&lookup, HINTS_VAR)? {
            config.hints_per_session = value;
        }
        if let Some(value) = parse_var(&lookup, TOLERANCE_VAR)? {
            config.tolerance = value;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make a session unplayable
    pub fn validate(&self) -> Result<(), WaypointError> {
        if self.max_problems == 0 {
            return Err(WaypointError::config("max_problems must be at least 1"));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(WaypointError::config(format!(
                "tolerance must be a positive number, got {}",
                self.tolerance
            )));
        }
        if self.level_up_streak <= 0 {
            return Err(WaypointError::config("level_up_streak must be positive"));
        }
        if self.level_down_streak >= 0 {
            return Err(WaypointError::config("level_down_streak must be negative"));
        }
        if self.streak_floor > self.level_down_streak {
            return Err(WaypointError::config(format!(
                "streak_floor ({}) must not be above level_down_streak ({})",
                self.streak_floor, self.level_down_streak
            )));
        }
        Ok(())
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, WaypointError> {
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    raw.parse::<T>()
        .map(Some)
        .map_err(|_| WaypointError::config(format!("{} has invalid value '{}'", key, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = TutorConfig::default();
        assert_eq!(config.max_problems, 8);
        assert_eq!(config.hints_per_session, 3);
        assert_eq!(config.tolerance, 0.1);
        assert_eq!(config.level_up_streak, 3);
        assert_eq!(config.level_down_streak, -2);
        assert_eq!(config.streak_floor, -3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_lookup_overrides() {
        let config = TutorConfig::from_lookup(lookup(&[
            (MAX_PROBLEMS_VAR, "5"),
            (HINTS_VAR, "1"),
            (TOLERANCE_VAR, "0.01"),
        ]))
        .unwrap();

        assert_eq!(config.max_problems, 5);
        assert_eq!(config.hints_per_session, 1);
        assert_eq!(config.tolerance, 0.01);
    }

    #[test]
    fn test_blank_value_keeps_default() {
        let config = TutorConfig::from_lookup(lookup(&[(MAX_PROBLEMS_VAR, "  ")])).unwrap();
        assert_eq!(config.max_problems, 8);
    }

    #[test]
    fn test_invalid_values() {
        let err = TutorConfig::from_lookup(lookup(&[(HINTS_VAR, "three")])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: WAYPOINT_HINTS has invalid value 'three'"
        );

        let err = TutorConfig::from_lookup(lookup(&[(MAX_PROBLEMS_VAR, "0")])).unwrap_err();
        assert!(matches!(err, WaypointError::Config(_)));

        let err = TutorConfig::from_lookup(lookup(&[(TOLERANCE_VAR, "-1")])).unwrap_err();
        assert!(matches!(err, WaypointError::Config(_)));
    }

    #[test]
    fn test_deserialize_partial_yaml() {
        let config: TutorConfig = serde_yaml::from_str("max_problems: 4\ntolerance: 0.5").unwrap();
        assert_eq!(config.max_problems, 4);
        assert_eq!(config.tolerance, 0.5);
        assert_eq!(config.hints_per_session, 3);
    }

    #[test]
    fn test_validate_streaks() {
        let config = TutorConfig {
            streak_floor: -1,
            ..TutorConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
