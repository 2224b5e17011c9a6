//! Run configuration: every constant the engine reads, loaded once before a run.
//!
//! Defaults reproduce the classic shop model: 10 000 on account, 360 units in
//! the basic store, 80 in the shop, prices clamped to 10–50, a fresh wholesale
//! lot every 10 days and a 100-day horizon. Any subset can be overridden from
//! JSON; missing sections fall back to their defaults.
//!
//! ```
//! use shopsim_logic::config::SimConfig;
//!
//! let config = SimConfig::from_json_str(r#"{ "horizon_days": 30 }"#).unwrap();
//! assert_eq!(config.horizon_days, 30);
//! assert_eq!(config.start.account, 10_000.0);
//! assert!(config.validate().is_empty());
//! ```

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level simulation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub start: StartingPosition,
    pub pricing: PriceRange,
    pub demand: DemandModel,
    pub expenses: FixedExpenses,
    pub offers: OfferTerms,
    /// Last simulated day (inclusive).
    pub horizon_days: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            start: StartingPosition::default(),
            pricing: PriceRange::default(),
            demand: DemandModel::default(),
            expenses: FixedExpenses::default(),
            offers: OfferTerms::default(),
            horizon_days: 100,
        }
    }
}

/// Opening balance sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartingPosition {
    pub account: f64,
    pub basic_store: f64,
    pub shop_store: f64,
    pub retail_price: f64,
}

impl Default for StartingPosition {
    fn default() -> Self {
        Self {
            account: 10_000.0,
            basic_store: 360.0,
            shop_store: 80.0,
            retail_price: 15.0,
        }
    }
}

/// Closed range every retail price is clamped into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

impl Default for PriceRange {
    fn default() -> Self {
        Self {
            min: 10.0,
            max: 50.0,
        }
    }
}

impl PriceRange {
    /// Clamp a price into the range. Idempotent; in-range prices pass through.
    /// Never panics, even on a range that fails validation.
    pub fn clamp(&self, price: f64) -> f64 {
        price.max(self.min).min(self.max)
    }

    pub fn contains(&self, price: f64) -> bool {
        (self.min..=self.max).contains(&price)
    }
}

/// Inverse price-elasticity demand curve with additive integer noise.
///
/// `demand = max(0, max_demand * (mean_price / price) + U[-noise_spread, noise_spread])`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemandModel {
    pub max_demand: f64,
    pub mean_price: f64,
    pub noise_spread: i64,
}

impl Default for DemandModel {
    fn default() -> Self {
        Self {
            max_demand: 100.0,
            mean_price: 100.0,
            noise_spread: 20,
        }
    }
}

impl DemandModel {
    /// Deterministic part of the curve at `price`.
    pub fn baseline(&self, price: f64) -> f64 {
        self.max_demand * (self.mean_price / price)
    }
}

/// Costs charged every day regardless of solvency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixedExpenses {
    pub daily_spending: f64,
    pub rent: f64,
    pub wages_and_taxes: f64,
}

impl Default for FixedExpenses {
    fn default() -> Self {
        Self {
            daily_spending: 700.0,
            rent: 200.0,
            wages_and_taxes: 500.0,
        }
    }
}

impl FixedExpenses {
    pub fn total(&self) -> f64 {
        self.daily_spending + self.rent + self.wages_and_taxes
    }
}

/// A value drawn as `base + U[-spread, spread]`, then clamped to `[floor, ceiling]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundedDraw {
    pub base: i64,
    pub spread: i64,
    pub floor: i64,
    pub ceiling: i64,
}

impl BoundedDraw {
    pub fn resolve(&self, offset: i64) -> i64 {
        (self.base + offset).clamp(self.floor, self.ceiling)
    }
}

/// Wholesale lot generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfferTerms {
    pub volume: BoundedDraw,
    pub unit_price: BoundedDraw,
    /// A new lot is drawn on days 1, 1 + period, 1 + 2·period, ...
    pub regeneration_period: u32,
}

impl Default for OfferTerms {
    fn default() -> Self {
        Self {
            volume: BoundedDraw {
                base: 40,
                spread: 10,
                floor: 30,
                ceiling: 50,
            },
            unit_price: BoundedDraw {
                base: 35,
                spread: 5,
                floor: 30,
                ceiling: 40,
            },
            regeneration_period: 10,
        }
    }
}

impl OfferTerms {
    /// Whether a fresh lot is drawn at the start of `day` (1-based).
    pub fn refreshes_on(&self, day: u32) -> bool {
        day >= 1 && (day - 1) % self.regeneration_period.max(1) == 0
    }
}

/// A single configuration problem found by [`SimConfig::validate`].
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigIssue {
    PriceRangeInverted { min: f64, max: f64 },
    NonPositivePrice(f64),
    ZeroHorizon,
    ZeroRegenerationPeriod,
    NegativeSpread { field: &'static str, spread: i64 },
    InvertedClamp { field: &'static str, floor: i64, ceiling: i64 },
    /// Lot volumes and unit prices must be at least 1.
    NonPositiveOfferFloor { field: &'static str, floor: i64 },
    NegativeStartingStock { field: &'static str, value: f64 },
    NonFinite(&'static str),
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigIssue::PriceRangeInverted { min, max } => {
                write!(f, "price range inverted: min {min} > max {max}")
            }
            ConfigIssue::NonPositivePrice(p) => write!(f, "price bound {p} must be positive"),
            ConfigIssue::ZeroHorizon => write!(f, "horizon_days must be at least 1"),
            ConfigIssue::ZeroRegenerationPeriod => {
                write!(f, "offers.regeneration_period must be at least 1")
            }
            ConfigIssue::NegativeSpread { field, spread } => {
                write!(f, "{field}: spread {spread} is negative")
            }
            ConfigIssue::InvertedClamp {
                field,
                floor,
                ceiling,
            } => write!(f, "{field}: floor {floor} above ceiling {ceiling}"),
            ConfigIssue::NonPositiveOfferFloor { field, floor } => {
                write!(f, "{field}: floor {floor} must be at least 1")
            }
            ConfigIssue::NegativeStartingStock { field, value } => {
                write!(f, "start.{field} = {value} is negative")
            }
            ConfigIssue::NonFinite(field) => write!(f, "{field} is not a finite number"),
        }
    }
}

impl SimConfig {
    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        let issues = config.validate();
        if !issues.is_empty() {
            return Err(ConfigError::Invalid(issues));
        }
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&raw)?;
        log::info!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Check every constant the engine relies on. Empty means usable.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        let finite = [
            ("start.account", self.start.account),
            ("start.basic_store", self.start.basic_store),
            ("start.shop_store", self.start.shop_store),
            ("start.retail_price", self.start.retail_price),
            ("pricing.min", self.pricing.min),
            ("pricing.max", self.pricing.max),
            ("demand.max_demand", self.demand.max_demand),
            ("demand.mean_price", self.demand.mean_price),
            ("expenses.daily_spending", self.expenses.daily_spending),
            ("expenses.rent", self.expenses.rent),
            ("expenses.wages_and_taxes", self.expenses.wages_and_taxes),
        ];
        for (field, value) in finite {
            if !value.is_finite() {
                issues.push(ConfigIssue::NonFinite(field));
            }
        }

        if self.pricing.min > self.pricing.max {
            issues.push(ConfigIssue::PriceRangeInverted {
                min: self.pricing.min,
                max: self.pricing.max,
            });
        }
        if self.pricing.min <= 0.0 {
            // demand divides by price
            issues.push(ConfigIssue::NonPositivePrice(self.pricing.min));
        }
        if self.horizon_days == 0 {
            issues.push(ConfigIssue::ZeroHorizon);
        }
        if self.offers.regeneration_period == 0 {
            issues.push(ConfigIssue::ZeroRegenerationPeriod);
        }

        let draws = [
            ("offers.volume", &self.offers.volume),
            ("offers.unit_price", &self.offers.unit_price),
        ];
        for (field, draw) in draws {
            if draw.spread < 0 {
                issues.push(ConfigIssue::NegativeSpread {
                    field,
                    spread: draw.spread,
                });
            }
            if draw.floor > draw.ceiling {
                issues.push(ConfigIssue::InvertedClamp {
                    field,
                    floor: draw.floor,
                    ceiling: draw.ceiling,
                });
            }
            // every drawn value lands in [floor, ceiling]
            if draw.floor < 1 {
                issues.push(ConfigIssue::NonPositiveOfferFloor {
                    field,
                    floor: draw.floor,
                });
            }
        }
        if self.demand.noise_spread < 0 {
            issues.push(ConfigIssue::NegativeSpread {
                field: "demand.noise",
                spread: self.demand.noise_spread,
            });
        }

        for (field, value) in [
            ("basic_store", self.start.basic_store),
            ("shop_store", self.start.shop_store),
        ] {
            if value < 0.0 {
                issues.push(ConfigIssue::NegativeStartingStock { field, value });
            }
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(SimConfig::default().validate().is_empty());
    }

    #[test]
    fn test_default_expenses_total() {
        assert_eq!(FixedExpenses::default().total(), 1400.0);
    }

    #[test]
    fn test_price_clamp() {
        let range = PriceRange::default();
        assert_eq!(range.clamp(5.0), 10.0);
        assert_eq!(range.clamp(75.0), 50.0);
        assert_eq!(range.clamp(20.0), 20.0);
    }

    #[test]
    fn test_price_clamp_idempotent() {
        let range = PriceRange::default();
        for p in [-3.0, 0.0, 9.99, 10.0, 27.5, 50.0, 50.01, 1e9] {
            let once = range.clamp(p);
            assert_eq!(range.clamp(once), once);
            assert!(range.contains(once));
        }
    }

    #[test]
    fn test_refresh_days() {
        let terms = OfferTerms::default();
        let days: Vec<u32> = (1..=35).filter(|d| terms.refreshes_on(*d)).collect();
        assert_eq!(days, vec![1, 11, 21, 31]);
        assert!(!terms.refreshes_on(0));
    }

    #[test]
    fn test_bounded_draw_clamps() {
        let volume = OfferTerms::default().volume;
        assert_eq!(volume.resolve(-10), 30);
        assert_eq!(volume.resolve(5), 45);
        assert_eq!(volume.resolve(50), 50);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config =
            SimConfig::from_json_str(r#"{ "pricing": { "max": 40.0 }, "horizon_days": 12 }"#)
                .unwrap();
        assert_eq!(config.pricing.min, 10.0);
        assert_eq!(config.pricing.max, 40.0);
        assert_eq!(config.horizon_days, 12);
        assert_eq!(config.offers.regeneration_period, 10);
    }

    #[test]
    fn test_bad_json_is_error() {
        assert!(matches!(
            SimConfig::from_json_str("{ horizon_days: }"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_validate_catches_problems() {
        let mut config = SimConfig::default();
        config.pricing = PriceRange { min: 0.0, max: -1.0 };
        config.horizon_days = 0;
        config.offers.regeneration_period = 0;
        config.offers.volume.floor = 60;
        config.start.shop_store = -1.0;
        let issues = config.validate();
        assert!(issues.contains(&ConfigIssue::ZeroHorizon));
        assert!(issues.contains(&ConfigIssue::ZeroRegenerationPeriod));
        assert!(issues
            .iter()
            .any(|i| matches!(i, ConfigIssue::PriceRangeInverted { .. })));
        assert!(issues
            .iter()
            .any(|i| matches!(i, ConfigIssue::NonPositivePrice(_))));
        assert!(issues.iter().any(|i| matches!(
            i,
            ConfigIssue::InvertedClamp {
                field: "offers.volume",
                ..
            }
        )));
        assert!(issues.iter().any(|i| matches!(
            i,
            ConfigIssue::NegativeStartingStock {
                field: "shop_store",
                ..
            }
        )));
    }

    #[test]
    fn test_json_roundtrip_preserves_config() {
        let config = SimConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(SimConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_validate_rejects_non_positive_offer_floor() {
        let mut config = SimConfig::default();
        config.offers.volume = BoundedDraw {
            base: -40,
            spread: 0,
            floor: -50,
            ceiling: -40,
        };
        config.offers.unit_price.floor = 0;
        let issues = config.validate();
        assert!(issues.contains(&ConfigIssue::NonPositiveOfferFloor {
            field: "offers.volume",
            floor: -50,
        }));
        assert!(issues.contains(&ConfigIssue::NonPositiveOfferFloor {
            field: "offers.unit_price",
            floor: 0,
        }));
        assert!(matches!(
            crate::engine::DayEngine::seeded(config, 1),
            Err(crate::error::EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_from_json_str_validates() {
        let result = SimConfig::from_json_str(r#"{ "pricing": { "min": 60.0, "max": 50.0 } }"#);
        match result {
            Err(ConfigError::Invalid(issues)) => assert!(issues
                .iter()
                .any(|i| matches!(i, ConfigIssue::PriceRangeInverted { .. }))),
            other => panic!("expected invalid config, got {other:?}"),
        }
    }

    #[test]
    fn test_clamp_on_inverted_range_does_not_panic() {
        let range = PriceRange {
            min: 60.0,
            max: 50.0,
        };
        assert_eq!(range.clamp(55.0), 50.0);
        let nan_range = PriceRange {
            min: f64::NAN,
            max: 50.0,
        };
        assert_eq!(nan_range.clamp(20.0), 20.0);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shop.json");
        std::fs::write(&path, r#"{ "horizon_days": 20 }"#).unwrap();
        let config = SimConfig::load(&path).unwrap();
        assert_eq!(config.horizon_days, 20);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            SimConfig::load(dir.path().join("absent.json")),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_load_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, r#"{ "horizon_days": 0 }"#).unwrap();
        match SimConfig::load(&path) {
            Err(ConfigError::Invalid(issues)) => {
                assert_eq!(issues, vec![ConfigIssue::ZeroHorizon])
            }
            other => panic!("expected invalid config, got {other:?}"),
        }
    }
}
