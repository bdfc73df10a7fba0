//! Maintainability index from Halstead volume, cyclomatic complexity, and
//! source line count.
//!
//! MI = 171 - 5.2*ln(V) - 0.23*CC - 16.2*ln(SLOC), plus 50 * comment
//! ratio when the comment bonus is enabled. Guard rails keep the formula
//! defined: scopes under the minimum source-line threshold short-circuit
//! to 100 (trivial code is maximally maintainable), volume is clamped up
//! to a minimum before its logarithm, and complexity is clamped to at
//! least 1. Runs after the complexity, Halstead, and line-count
//! calculators and reads their fields off the metrics value.

use super::{
    CalcOutcome, Calculator, CalculatorConfig, ConfigSchema, ConfigValueKind, FromConfig,
};
use crate::core::{ClassMetrics, FileMetrics, FunctionMetrics, LineCounts};
use crate::source::{ClassSource, FileSource, FunctionSource};
use serde::{Deserialize, Serialize};

/// Five-tier maintainability classification
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum MaintainabilityRating {
    HighlyMaintainable,
    Maintainable,
    ModeratelyMaintainable,
    Difficult,
    VeryDifficult,
}

impl std::fmt::Display for MaintainabilityRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        static DISPLAY_STRINGS: &[(MaintainabilityRating, &str)] = &[
            (
                MaintainabilityRating::HighlyMaintainable,
                "Highly Maintainable",
            ),
            (MaintainabilityRating::Maintainable, "Maintainable"),
            (
                MaintainabilityRating::ModeratelyMaintainable,
                "Moderately Maintainable",
            ),
            (MaintainabilityRating::Difficult, "Difficult"),
            (MaintainabilityRating::VeryDifficult, "Very Difficult"),
        ];

        let display_str = DISPLAY_STRINGS
            .iter()
            .find(|(r, _)| r == self)
            .map(|(_, s)| *s)
            .unwrap_or("Unknown");

        write!(f, "{display_str}")
    }
}

/// Direction of a maintainability history window comparison
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum MaintainabilityTrend {
    Improving,
    Declining,
    Stable,
}

/// Computes the composite maintainability score
pub struct MaintainabilityIndexCalculator {
    comment_bonus: bool,
    min_source_lines: usize,
    min_volume: f64,
    normalize: bool,
}

impl Default for MaintainabilityIndexCalculator {
    fn default() -> Self {
        Self {
            comment_bonus: false,
            min_source_lines: 1,
            min_volume: 1.0,
            normalize: true,
        }
    }
}

impl FromConfig for MaintainabilityIndexCalculator {
    fn from_config(config: &CalculatorConfig) -> Result<Self, crate::core::RegistryError> {
        Ok(Self {
            comment_bonus: config.get_bool("comment_bonus", false),
            min_source_lines: config.get_usize("min_source_lines", 1),
            min_volume: config.get_f64("min_volume", 1.0),
            normalize: config.get_bool("normalize", true),
        })
    }
}

impl MaintainabilityIndexCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The MI formula with all guard rails applied
    pub fn index(
        &self,
        halstead_volume: f64,
        cyclomatic: u32,
        lines: &LineCounts,
    ) -> f64 {
        if lines.source < self.min_source_lines {
            return 100.0;
        }

        let volume = halstead_volume.max(self.min_volume);
        let complexity = cyclomatic.max(1) as f64;
        let sloc = lines.source as f64;

        let mut mi = 171.0 - 5.2 * volume.ln() - 0.23 * complexity - 16.2 * sloc.ln();
        if self.comment_bonus {
            mi += 50.0 * lines.comment_ratio();
        }

        if self.normalize {
            mi.clamp(0.0, 100.0)
        } else {
            mi
        }
    }

    /// Classify an MI value into the 5-tier rating
    pub fn rating(mi: f64) -> MaintainabilityRating {
        if mi >= 85.0 {
            MaintainabilityRating::HighlyMaintainable
        } else if mi >= 65.0 {
            MaintainabilityRating::Maintainable
        } else if mi >= 45.0 {
            MaintainabilityRating::ModeratelyMaintainable
        } else if mi >= 25.0 {
            MaintainabilityRating::Difficult
        } else {
            MaintainabilityRating::VeryDifficult
        }
    }

    /// Compare the mean of the most recent `window` history values against
    /// the window before it. History is ordered oldest first. Differences
    /// inside `threshold` read as stable.
    pub fn trend(history: &[f64], window: usize, threshold: f64) -> MaintainabilityTrend {
        if window == 0 || history.len() < window * 2 {
            return MaintainabilityTrend::Stable;
        }

        let recent = &history[history.len() - window..];
        let earlier = &history[history.len() - window * 2..history.len() - window];

        let recent_mean: f64 = recent.iter().sum::<f64>() / window as f64;
        let earlier_mean: f64 = earlier.iter().sum::<f64>() / window as f64;

        let delta = recent_mean - earlier_mean;
        if delta > threshold {
            MaintainabilityTrend::Improving
        } else if delta < -threshold {
            MaintainabilityTrend::Declining
        } else {
            MaintainabilityTrend::Stable
        }
    }
}

impl Calculator for MaintainabilityIndexCalculator {
    fn name(&self) -> &str {
        "maintainability_index"
    }

    fn description(&self) -> &str {
        "Composite 0-100 maintainability score from volume, complexity, and size"
    }

    fn version(&self) -> &str {
        "1.0.2"
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::default()
            .field(
                "comment_bonus",
                ConfigValueKind::Bool,
                "Add 50 * comment ratio to the index",
            )
            .field(
                "min_source_lines",
                ConfigValueKind::Integer,
                "Scopes under this many source lines score exactly 100",
            )
            .field(
                "min_volume",
                ConfigValueKind::Float,
                "Halstead volume floor applied before the logarithm",
            )
            .field(
                "normalize",
                ConfigValueKind::Bool,
                "Clamp the final index into [0, 100]",
            )
    }

    fn calculate_for_function(
        &self,
        _source: &dyn FunctionSource,
        mut metrics: FunctionMetrics,
    ) -> CalcOutcome<FunctionMetrics> {
        metrics.maintainability_index =
            self.index(metrics.halstead.volume(), metrics.cyclomatic, &metrics.lines);
        CalcOutcome::ok(metrics)
    }

    fn calculate_for_class(
        &self,
        _source: &dyn ClassSource,
        mut metrics: ClassMetrics,
    ) -> CalcOutcome<ClassMetrics> {
        metrics.maintainability_index =
            self.index(metrics.halstead.volume(), metrics.cyclomatic, &metrics.lines);
        CalcOutcome::ok(metrics)
    }

    fn calculate_for_file(
        &self,
        _source: &dyn FileSource,
        mut metrics: FileMetrics,
    ) -> CalcOutcome<FileMetrics> {
        metrics.maintainability_index =
            self.index(metrics.halstead.volume(), metrics.cyclomatic, &metrics.lines);
        CalcOutcome::ok(metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(source: usize) -> LineCounts {
        LineCounts {
            total: source,
            logical: source,
            source,
            comment: 0,
            blank: 0,
        }
    }

    #[test]
    fn trivial_code_scores_exactly_100() {
        let calc = MaintainabilityIndexCalculator::new();
        assert_eq!(calc.index(5000.0, 80, &lines(0)), 100.0);
    }

    #[test]
    fn higher_min_source_lines_extends_the_short_circuit() {
        let config = CalculatorConfig::new().set("min_source_lines", 10i64);
        let calc = MaintainabilityIndexCalculator::from_config(&config).unwrap();
        assert_eq!(calc.index(5000.0, 80, &lines(9)), 100.0);
        assert!(calc.index(5000.0, 80, &lines(10)) < 100.0);
    }

    #[test]
    fn volume_below_minimum_is_clamped_not_nan() {
        let calc = MaintainabilityIndexCalculator::new();
        let mi = calc.index(0.0, 1, &lines(5));
        assert!(mi.is_finite());
        // ln(1.0) == 0, so the volume term vanishes
        let expected = (171.0 - 0.23 - 16.2 * 5.0_f64.ln()).clamp(0.0, 100.0);
        assert!((mi - expected).abs() < 1e-9);
    }

    #[test]
    fn normalization_clamps_into_range() {
        let calc = MaintainabilityIndexCalculator::new();
        let mi = calc.index(1e9, 500, &lines(100_000));
        assert_eq!(mi, 0.0);
    }

    #[test]
    fn comment_bonus_raises_the_index() {
        let config = CalculatorConfig::new().set("comment_bonus", true);
        let with_bonus = MaintainabilityIndexCalculator::from_config(&config).unwrap();
        let without = MaintainabilityIndexCalculator::new();
        let counts = LineCounts {
            total: 20,
            logical: 10,
            source: 10,
            comment: 10,
            blank: 0,
        };
        assert!(with_bonus.index(100.0, 5, &counts) > without.index(100.0, 5, &counts));
    }

    #[test]
    fn rating_tiers() {
        use MaintainabilityRating::*;
        assert_eq!(MaintainabilityIndexCalculator::rating(92.0), HighlyMaintainable);
        assert_eq!(MaintainabilityIndexCalculator::rating(85.0), HighlyMaintainable);
        assert_eq!(MaintainabilityIndexCalculator::rating(70.0), Maintainable);
        assert_eq!(MaintainabilityIndexCalculator::rating(50.0), ModeratelyMaintainable);
        assert_eq!(MaintainabilityIndexCalculator::rating(30.0), Difficult);
        assert_eq!(MaintainabilityIndexCalculator::rating(24.9), VeryDifficult);
    }

    #[test]
    fn trend_compares_adjacent_windows() {
        use MaintainabilityTrend::*;
        let improving = [50.0, 52.0, 51.0, 70.0, 72.0, 71.0];
        assert_eq!(
            MaintainabilityIndexCalculator::trend(&improving, 3, 2.0),
            Improving
        );

        let declining = [70.0, 72.0, 71.0, 50.0, 52.0, 51.0];
        assert_eq!(
            MaintainabilityIndexCalculator::trend(&declining, 3, 2.0),
            Declining
        );

        let flat = [60.0, 61.0, 60.0, 60.5, 60.0, 61.0];
        assert_eq!(MaintainabilityIndexCalculator::trend(&flat, 3, 2.0), Stable);
    }

    #[test]
    fn short_history_is_stable() {
        assert_eq!(
            MaintainabilityIndexCalculator::trend(&[80.0, 60.0], 3, 2.0),
            MaintainabilityTrend::Stable
        );
    }
}
