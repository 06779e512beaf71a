use serde::Deserialize;

use crate::error::{ShoprecError, ShoprecResult};

/// Root application configuration. Loaded from environment variables
/// with the prefix `SHOPREC__`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub mining: MiningConfig,
    #[serde(default)]
    pub recommend: RecommendConfig,
}

/// Thresholds and knobs for one batch mining run.
#[derive(Debug, Clone, Deserialize)]
pub struct MiningConfig {
    /// Minimum support ratio in (0, 1]. Values > 1 are treated as
    /// percentages and divided by 100.
    #[serde(default = "default_min_support_ratio")]
    pub min_support_ratio: f64,
    /// Minimum rule confidence in [0, 1]. Values > 1 are treated as
    /// percentages and divided by 100.
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
    /// Minimum rule lift, ≥ 0. 1.0 keeps only non-negative association.
    #[serde(default = "default_min_lift")]
    pub min_lift: f64,
    /// Optional cap on itemset size, guarding runaway candidate growth
    /// on dense datasets.
    #[serde(default)]
    pub max_itemset_size: Option<usize>,
    /// Weight applied to wishlist and cart snapshot transactions; a
    /// completed order always weighs 1.
    #[serde(default = "default_snapshot_weight")]
    pub snapshot_weight: u32,
}

/// Serving-side knobs for the recommendation selector.
#[derive(Debug, Clone, Deserialize)]
pub struct RecommendConfig {
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default)]
    pub aggregation: ScoreAggregation,
}

/// How per-product scores are accumulated when several rules recommend
/// the same product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreAggregation {
    /// Maximum lift across firing rules; ties broken by higher
    /// confidence, then by more specific antecedent, then by product id.
    #[default]
    MaxLift,
    /// Sum of confidence × lift across firing rules.
    SumConfidenceWeightedLift,
}

fn default_min_support_ratio() -> f64 {
    0.02
}
fn default_min_confidence() -> f64 {
    0.3
}
fn default_min_lift() -> f64 {
    1.0
}
fn default_snapshot_weight() -> u32 {
    1
}
fn default_top_n() -> usize {
    5
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            min_support_ratio: default_min_support_ratio(),
            min_confidence: default_min_confidence(),
            min_lift: default_min_lift(),
            max_itemset_size: None,
            snapshot_weight: default_snapshot_weight(),
        }
    }
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            aggregation: ScoreAggregation::default(),
        }
    }
}

impl MiningConfig {
    /// Coerce percent-style thresholds (e.g. `2.0` → `0.02`) the way the
    /// upstream data-science tooling expressed them. Lift is a ratio,
    /// not a probability, and is left untouched.
    pub fn normalized(&self) -> Self {
        let mut cfg = self.clone();
        if cfg.min_support_ratio > 1.0 {
            cfg.min_support_ratio /= 100.0;
        }
        if cfg.min_confidence > 1.0 {
            cfg.min_confidence /= 100.0;
        }
        cfg
    }

    /// Validate parameter ranges; out-of-range values are reported as
    /// `InvalidThreshold` and never silently clamped.
    pub fn validate(&self) -> ShoprecResult<()> {
        if !(self.min_support_ratio > 0.0 && self.min_support_ratio <= 1.0) {
            return Err(ShoprecError::InvalidThreshold(format!(
                "min_support_ratio must be in (0, 1], got {}",
                self.min_support_ratio
            )));
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(ShoprecError::InvalidThreshold(format!(
                "min_confidence must be in [0, 1], got {}",
                self.min_confidence
            )));
        }
        if self.min_lift < 0.0 || !self.min_lift.is_finite() {
            return Err(ShoprecError::InvalidThreshold(format!(
                "min_lift must be ≥ 0, got {}",
                self.min_lift
            )));
        }
        if self.max_itemset_size == Some(0) {
            return Err(ShoprecError::InvalidThreshold(
                "max_itemset_size must be ≥ 1 when set".to_string(),
            ));
        }
        if self.snapshot_weight == 0 {
            return Err(ShoprecError::InvalidThreshold(
                "snapshot_weight must be ≥ 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("SHOPREC")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(MiningConfig::default().validate().is_ok());
    }

    #[test]
    fn test_percent_style_thresholds_normalized() {
        let cfg = MiningConfig {
            min_support_ratio: 2.0,
            min_confidence: 50.0,
            ..MiningConfig::default()
        };
        let cfg = cfg.normalized();
        assert!((cfg.min_support_ratio - 0.02).abs() < 1e-12);
        assert!((cfg.min_confidence - 0.5).abs() < 1e-12);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_out_of_range_thresholds_rejected() {
        let zero_support = MiningConfig {
            min_support_ratio: 0.0,
            ..MiningConfig::default()
        };
        assert!(matches!(
            zero_support.validate(),
            Err(ShoprecError::InvalidThreshold(_))
        ));

        let negative_lift = MiningConfig {
            min_lift: -0.5,
            ..MiningConfig::default()
        };
        assert!(matches!(
            negative_lift.validate(),
            Err(ShoprecError::InvalidThreshold(_))
        ));

        let zero_weight = MiningConfig {
            snapshot_weight: 0,
            ..MiningConfig::default()
        };
        assert!(matches!(
            zero_weight.validate(),
            Err(ShoprecError::InvalidThreshold(_))
        ));
    }
}
