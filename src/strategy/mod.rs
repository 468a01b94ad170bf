//! Strategy layer — mode resolution, sell rules, market pool, buy rules.

pub mod buy;
pub mod market;
pub mod sell;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{PositionGroup, StrategyMode};

/// Clubs receive 85% of market value on a sale.
pub const SELL_FEE_FACTOR: Decimal = dec!(0.85);

// ---------------------------------------------------------------------------
// Strategy configuration
// ---------------------------------------------------------------------------

/// Concrete thresholds for one run. Resolved once, never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub mode: StrategyMode,
    /// Players at or above this age become sell candidates.
    pub sell_age_threshold: u32,
    /// Inclusive age window for buy candidates.
    pub buy_age_range: (u32, u32),
    /// Fraction of the opening transfer budget that may be spent.
    pub spend_cap_fraction: Decimal,
}

impl StrategyConfig {
    /// Map a mode to its policy thresholds.
    ///
    /// Win-now leans on experience through the wide upper bound of its
    /// buy window.
    pub fn resolve(mode: StrategyMode) -> Self {
        match mode {
            StrategyMode::Balanced => Self {
                mode,
                sell_age_threshold: 32,
                buy_age_range: (20, 29),
                spend_cap_fraction: Decimal::ONE,
            },
            StrategyMode::Conservative => Self {
                mode,
                sell_age_threshold: 29,
                buy_age_range: (19, 24),
                spend_cap_fraction: dec!(0.5),
            },
            StrategyMode::WinNow => Self {
                mode,
                sell_age_threshold: 35,
                buy_age_range: (20, 34),
                spend_cap_fraction: Decimal::ONE,
            },
        }
    }

    pub fn accepts_age(&self, age: u32) -> bool {
        let (min, max) = self.buy_age_range;
        (min..=max).contains(&age)
    }
}

// ---------------------------------------------------------------------------
// Squad depth rules (defaults, overridden by config.toml at runtime)
// ---------------------------------------------------------------------------

/// Depth thresholds for one position group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupDepth {
    /// Selling may never take the group below this.
    pub min_viable: usize,
    /// Target size: above it is surplus, below it is a gap.
    pub ideal: usize,
    /// Reinforcements stop at this size.
    pub max: usize,
}

/// Depth thresholds for every position group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthRules {
    pub goalkeeper: GroupDepth,
    pub defender: GroupDepth,
    pub midfielder: GroupDepth,
    pub forward: GroupDepth,
}

impl Default for DepthRules {
    fn default() -> Self {
        Self {
            goalkeeper: GroupDepth { min_viable: 2, ideal: 3, max: 3 },
            defender: GroupDepth { min_viable: 2, ideal: 8, max: 10 },
            midfielder: GroupDepth { min_viable: 2, ideal: 8, max: 10 },
            forward: GroupDepth { min_viable: 2, ideal: 6, max: 8 },
        }
    }
}

impl DepthRules {
    pub fn for_group(&self, group: PositionGroup) -> GroupDepth {
        match group {
            PositionGroup::Goalkeeper => self.goalkeeper,
            PositionGroup::Defender => self.defender,
            PositionGroup::Midfielder => self.midfielder,
            PositionGroup::Forward => self.forward,
        }
    }

    /// Same thresholds for every group.
    pub fn uniform(min_viable: usize, ideal: usize, max: usize) -> Self {
        let depth = GroupDepth { min_viable, ideal, max };
        Self {
            goalkeeper: depth,
            defender: depth,
            midfielder: depth,
            forward: depth,
        }
    }

    /// Check the thresholds are ordered `min_viable <= ideal <= max`.
    pub fn validate(&self) -> anyhow::Result<()> {
        for group in PositionGroup::ALL {
            let d = self.for_group(group);
            if d.min_viable > d.ideal || d.ideal > d.max {
                anyhow::bail!(
                    "Invalid depth for {group}: min_viable={} ideal={} max={}",
                    d.min_viable,
                    d.ideal,
                    d.max
                );
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_balanced() {
        let cfg = StrategyConfig::resolve(StrategyMode::Balanced);
        assert_eq!(cfg.sell_age_threshold, 32);
        assert_eq!(cfg.buy_age_range, (20, 29));
        assert_eq!(cfg.spend_cap_fraction, Decimal::ONE);
    }

    #[test]
    fn test_resolve_conservative() {
        let cfg = StrategyConfig::resolve(StrategyMode::Conservative);
        assert_eq!(cfg.sell_age_threshold, 29);
        assert_eq!(cfg.buy_age_range, (19, 24));
        assert_eq!(cfg.spend_cap_fraction, dec!(0.5));
    }

    #[test]
    fn test_resolve_win_now() {
        let cfg = StrategyConfig::resolve(StrategyMode::WinNow);
        assert_eq!(cfg.sell_age_threshold, 35);
        assert_eq!(cfg.buy_age_range, (20, 34));
        assert_eq!(cfg.spend_cap_fraction, Decimal::ONE);
    }

    #[test]
    fn test_accepts_age_is_inclusive() {
        let cfg = StrategyConfig::resolve(StrategyMode::Conservative);
        assert!(cfg.accepts_age(19));
        assert!(cfg.accepts_age(24));
        assert!(!cfg.accepts_age(18));
        assert!(!cfg.accepts_age(25));
    }

    #[test]
    fn test_default_depth_rules_valid() {
        let rules = DepthRules::default();
        assert!(rules.validate().is_ok());
        assert_eq!(rules.for_group(PositionGroup::Goalkeeper).min_viable, 2);
    }

    #[test]
    fn test_depth_rules_reject_inverted() {
        let rules = DepthRules::uniform(5, 3, 8);
        assert!(rules.validate().is_err());
    }
}
