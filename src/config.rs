use crate::calculators::CalculatorConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Default value for parallel file processing
fn default_parallel() -> bool {
    true
}

/// Engine-level execution configuration.
///
/// Controls which calculators run and how files are scheduled. When
/// `parallel` is enabled, file-level computation runs on a bounded worker
/// pool; functions and classes within one file are always sequential.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// Process files concurrently (default: true)
    #[serde(default = "default_parallel")]
    pub parallel: bool,

    /// Worker pool size; None uses all available CPU cores
    #[serde(default)]
    pub max_workers: Option<usize>,

    /// When set, only these calculators run
    #[serde(default)]
    pub enabled_calculators: Option<Vec<String>>,

    /// Calculators excluded from the run; wins over `enabled_calculators`
    #[serde(default)]
    pub disabled_calculators: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallel: default_parallel(),
            max_workers: None,
            enabled_calculators: None,
            disabled_calculators: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Whether the enabled/disabled sets leave this calculator active
    pub fn is_calculator_active(&self, name: &str) -> bool {
        if self.disabled_calculators.iter().any(|n| n == name) {
            return false;
        }
        match &self.enabled_calculators {
            Some(enabled) => enabled.iter().any(|n| n == name),
            None => true,
        }
    }

    /// Effective worker pool size
    pub fn worker_count(&self) -> usize {
        self.max_workers
            .filter(|&n| n > 0)
            .unwrap_or_else(num_cpus::get)
    }
}

/// Top-level configuration: engine options plus per-calculator tables
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MetricsConfig {
    #[serde(default)]
    pub engine: EngineConfig,

    /// Per-calculator configuration, keyed by calculator name
    #[serde(default)]
    pub calculators: HashMap<String, CalculatorConfig>,
}

impl MetricsConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: MetricsConfig = toml::from_str(&content)?;
        log::debug!("Loaded config from {}", path.display());
        config.validate().map_err(|e| anyhow::anyhow!(e))?;
        Ok(config)
    }

    /// Configuration table for one calculator, empty when absent
    pub fn calculator_config(&self, name: &str) -> CalculatorConfig {
        self.calculators.get(name).cloned().unwrap_or_default()
    }

    /// Reject configurations that cannot produce a meaningful run
    pub fn validate(&self) -> Result<(), String> {
        if let Some(workers) = self.engine.max_workers {
            if workers == 0 {
                return Err("max_workers must be at least 1".to_string());
            }
        }
        if let Some(enabled) = &self.engine.enabled_calculators {
            if enabled.is_empty() {
                return Err(
                    "enabled_calculators is empty; omit the key to enable all calculators"
                        .to_string(),
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_enables_everything() {
        let config = MetricsConfig::default();
        assert!(config.engine.parallel);
        assert!(config.engine.is_calculator_active("cyclomatic_complexity"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn disabled_set_wins_over_enabled_set() {
        let config = EngineConfig {
            enabled_calculators: Some(vec!["lines_of_code".to_string()]),
            disabled_calculators: vec!["lines_of_code".to_string()],
            ..Default::default()
        };
        assert!(!config.is_calculator_active("lines_of_code"));
    }

    #[test]
    fn enabled_set_excludes_everything_else() {
        let config = EngineConfig {
            enabled_calculators: Some(vec!["lines_of_code".to_string()]),
            ..Default::default()
        };
        assert!(config.is_calculator_active("lines_of_code"));
        assert!(!config.is_calculator_active("halstead_volume"));
    }

    #[test]
    fn zero_workers_is_rejected() {
        let config = MetricsConfig {
            engine: EngineConfig {
                max_workers: Some(0),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_full_toml_document() {
        let toml_doc = r#"
            [engine]
            parallel = false
            max_workers = 4
            disabled_calculators = ["depth_of_inheritance"]

            [calculators.maintainability_index]
            comment_bonus = true
            min_source_lines = 5
        "#;
        let config: MetricsConfig = toml::from_str(toml_doc).unwrap();
        assert!(!config.engine.parallel);
        assert_eq!(config.engine.max_workers, Some(4));
        assert!(!config.engine.is_calculator_active("depth_of_inheritance"));
        let mi = config.calculator_config("maintainability_index");
        assert!(mi.get_bool("comment_bonus", false));
        assert_eq!(mi.get_usize("min_source_lines", 1), 5);
    }
}
