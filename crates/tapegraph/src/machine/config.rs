use serde::{Deserialize, Serialize};

use crate::env;
use crate::error::{GraphError, Result};

/// Runtime switches for a [`TapeMachine`](super::TapeMachine). All default to off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MachineConfig {
    /// Fail execution when an operator produces NaN.
    pub nan_guard: bool,
    /// Fail execution when an operator produces an infinity.
    pub inf_guard: bool,
    /// Emit every computed value as a `trace` event.
    pub log_values: bool,
}

impl MachineConfig {
    /// Reads `TAPEGRAPH_NAN_GUARD`, `TAPEGRAPH_INF_GUARD` and `TAPEGRAPH_LOG_VALUES`.
    /// Unset variables fall back to the default.
    pub fn from_env() -> Self {
        let defaults = MachineConfig::default();
        MachineConfig {
            nan_guard: env::flag(env::NAN_GUARD_ENV).unwrap_or(defaults.nan_guard),
            inf_guard: env::flag(env::INF_GUARD_ENV).unwrap_or(defaults.inf_guard),
            log_values: env::flag(env::LOG_VALUES_ENV).unwrap_or(defaults.log_values),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|err| GraphError::Config(err.to_string()))
    }

    pub fn with_nan_guard(mut self, enabled: bool) -> Self {
        self.nan_guard = enabled;
        self
    }

    pub fn with_inf_guard(mut self, enabled: bool) -> Self {
        self.inf_guard = enabled;
        self
    }

    pub fn with_log_values(mut self, enabled: bool) -> Self {
        self.log_values = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_use_defaults() {
        let config = MachineConfig::from_json_str(r#"{ "nan_guard": true }"#).unwrap();
        assert_eq!(config, MachineConfig::default().with_nan_guard(true));
    }

    #[test]
    fn unknown_fields_are_config_errors() {
        let err = MachineConfig::from_json_str(r#"{ "nan_gaurd": true }"#).unwrap_err();
        assert!(matches!(err, GraphError::Config(_)));
    }

    #[test]
    fn serializes_round_trip() {
        let config = MachineConfig::default()
            .with_inf_guard(true)
            .with_log_values(true);
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(MachineConfig::from_json_str(&json).unwrap(), config);
    }
}
