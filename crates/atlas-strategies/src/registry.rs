//! Explicit registry of strategy variants.

use crate::{MACrossoverConfig, MACrossoverStrategy, SupertrendMaConfig, SupertrendMaStrategy};
use atlas_core::{error::StrategyError, traits::Strategy, traits::StrategyConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Information about a registered strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyInfo {
    /// Registry key
    pub name: String,
    /// Strategy description
    pub description: String,
    /// MA labels the strategy reads
    pub averages: Vec<String>,
    /// Default configuration as JSON
    pub default_config: serde_json::Value,
}

/// Registry for available strategies.
pub struct StrategyRegistry {
    strategies: BTreeMap<String, StrategyInfo>,
}

impl StrategyRegistry {
    /// Create a new strategy registry with all built-in strategies.
    pub fn new() -> Self {
        let mut strategies = BTreeMap::new();

        let supertrend = SupertrendMaStrategy::new(SupertrendMaConfig::default());
        strategies.insert(
            "supertrend_ma".to_string(),
            Self::info(&supertrend, serde_json::to_value(SupertrendMaConfig::default())),
        );

        let crossover = MACrossoverStrategy::new(MACrossoverConfig::default());
        strategies.insert(
            "ma_crossover".to_string(),
            Self::info(&crossover, serde_json::to_value(MACrossoverConfig::default())),
        );

        Self { strategies }
    }

    fn info(
        strategy: &dyn Strategy,
        default_config: Result<serde_json::Value, serde_json::Error>,
    ) -> StrategyInfo {
        StrategyInfo {
            name: strategy.name().to_string(),
            description: strategy.description().to_string(),
            averages: strategy
                .required_averages()
                .iter()
                .map(|l| l.to_string())
                .collect(),
            default_config: default_config.unwrap_or(serde_json::Value::Null),
        }
    }

    /// List all available strategies, sorted by name.
    pub fn list(&self) -> Vec<&StrategyInfo> {
        self.strategies.values().collect()
    }

    /// Get strategy info by name.
    pub fn get(&self, name: &str) -> Option<&StrategyInfo> {
        self.strategies.get(name)
    }

    /// Check if a strategy exists.
    pub fn exists(&self, name: &str) -> bool {
        self.strategies.contains_key(name)
    }

    /// Get all strategy names.
    pub fn names(&self) -> Vec<&str> {
        self.strategies.keys().map(String::as_str).collect()
    }

    /// Create a strategy instance from configuration.
    ///
    /// A `null` config selects the defaults.
    pub fn create(
        &self,
        name: &str,
        config: serde_json::Value,
    ) -> Result<Box<dyn Strategy>, StrategyError> {
        let config = if config.is_null() {
            serde_json::json!({})
        } else {
            config
        };
        match name {
            "supertrend_ma" => {
                let config: SupertrendMaConfig = serde_json::from_value(config)
                    .map_err(|e| StrategyError::InvalidConfig(e.to_string()))?;
                config.validate()?;
                Ok(Box::new(SupertrendMaStrategy::new(config)))
            }
            "ma_crossover" => {
                let config: MACrossoverConfig = serde_json::from_value(config)
                    .map_err(|e| StrategyError::InvalidConfig(e.to_string()))?;
                config.validate()?;
                Ok(Box::new(MACrossoverStrategy::new(config)))
            }
            _ => Err(StrategyError::NotFound(name.to_string())),
        }
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_list() {
        let registry = StrategyRegistry::new();
        assert_eq!(registry.list().len(), 2);
        assert_eq!(registry.names(), vec!["ma_crossover", "supertrend_ma"]);
    }

    #[test]
    fn test_registry_get() {
        let registry = StrategyRegistry::new();

        let info = registry.get("supertrend_ma").unwrap();
        assert_eq!(info.averages, vec!["fast", "signal", "medium", "slow"]);
        assert!(registry.get("unknown").is_none());
    }

    #[test]
    fn test_null_config_selects_defaults() {
        let registry = StrategyRegistry::new();
        let strategy = registry
            .create("supertrend_ma", serde_json::Value::Null)
            .unwrap();
        assert_eq!(strategy.name(), "supertrend_ma");
    }

    #[test]
    fn test_create_with_config() {
        let registry = StrategyRegistry::new();

        let config = serde_json::json!({
            "follow_trend": false,
            "signal_threshold": "0.001"
        });
        assert!(registry.create("ma_crossover", config).is_ok());

        let invalid = serde_json::json!({ "allow_long": false, "allow_short": false });
        assert!(matches!(
            registry.create("supertrend_ma", invalid),
            Err(StrategyError::InvalidConfig(_))
        ));

        let misspelled = serde_json::json!({ "allow_shrt": false });
        assert!(matches!(
            registry.create("supertrend_ma", misspelled.clone()),
            Err(StrategyError::InvalidConfig(_))
        ));
        assert!(matches!(
            registry.create("ma_crossover", misspelled),
            Err(StrategyError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_create_unknown_strategy() {
        let registry = StrategyRegistry::new();
        let result = registry.create("unknown", serde_json::Value::Null);
        assert!(matches!(result, Err(StrategyError::NotFound(_))));
    }
}
