//! Sizing configuration.

use anyhow::{bail, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Share counts are rounded down to a multiple of this.
pub const DEFAULT_LOT_SIZE: u32 = 100;

/// Reward multiples used for the profit target ladder.
pub const DEFAULT_REWARD_RATIOS: [u32; 5] = [2, 3, 4, 5, 6];

/// Configuration for position sizing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizingConfig {
    /// Rounding granularity for share counts
    pub lot_size: u32,

    /// Reward multiples for profit targets, strictly ascending
    pub reward_ratios: Vec<u32>,

    /// Lowest accepted risk percentage
    pub min_risk_pct: Decimal,

    /// Highest accepted risk percentage; risking this much means
    /// "use full purchase power"
    pub max_risk_pct: Decimal,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            lot_size: DEFAULT_LOT_SIZE,
            reward_ratios: DEFAULT_REWARD_RATIOS.to_vec(),
            min_risk_pct: dec!(0.1),
            max_risk_pct: dec!(100),
        }
    }
}

impl SizingConfig {
    /// Check the configuration for values the sizer cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.lot_size == 0 {
            bail!("lot size must be at least 1 share");
        }

        if self.reward_ratios.is_empty() {
            bail!("at least one reward ratio is required");
        }
        if self.reward_ratios.contains(&0) {
            bail!("reward ratios must be at least 1");
        }
        if self.reward_ratios.windows(2).any(|pair| pair[0] >= pair[1]) {
            bail!(
                "reward ratios must be strictly ascending, got {:?}",
                self.reward_ratios
            );
        }

        if self.min_risk_pct <= Decimal::ZERO {
            bail!("minimum risk percentage must be positive, got {}", self.min_risk_pct);
        }
        if self.min_risk_pct > self.max_risk_pct {
            bail!(
                "minimum risk percentage {} exceeds maximum {}",
                self.min_risk_pct,
                self.max_risk_pct
            );
        }

        Ok(())
    }

    /// Clamp a requested risk percentage into the accepted range.
    pub fn clamp_risk(&self, risk_pct: Decimal) -> Decimal {
        risk_pct.max(self.min_risk_pct).min(self.max_risk_pct)
    }

    /// Lot size as a decimal for share arithmetic.
    pub fn lot(&self) -> Decimal {
        Decimal::from(self.lot_size)
    }
}

/// Parse a comma separated list of reward ratios, e.g. `"2,3,4,5,6"`.
pub fn parse_reward_ratios(text: &str) -> Result<Vec<u32>> {
    text.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<u32>()
                .map_err(|e| anyhow::anyhow!("invalid reward ratio {:?}: {}", part, e))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SizingConfig::default();

        assert!(config.validate().is_ok());
        assert_eq!(config.lot_size, 100);
        assert_eq!(config.reward_ratios, vec![2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_rejects_zero_lot_size() {
        let config = SizingConfig {
            lot_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_ratios() {
        for ratios in [vec![], vec![0, 2], vec![3, 2], vec![2, 2, 3]] {
            let config = SizingConfig {
                reward_ratios: ratios.clone(),
                ..Default::default()
            };
            assert!(config.validate().is_err(), "{:?} should be rejected", ratios);
        }
    }

    #[test]
    fn test_rejects_bad_risk_bounds() {
        let negative = SizingConfig {
            min_risk_pct: dec!(0),
            ..Default::default()
        };
        assert!(negative.validate().is_err());

        let inverted = SizingConfig {
            min_risk_pct: dec!(50),
            max_risk_pct: dec!(10),
            ..Default::default()
        };
        assert!(inverted.validate().is_err());
    }

    #[test]
    fn test_clamp_risk() {
        let config = SizingConfig::default();

        assert_eq!(config.clamp_risk(dec!(2)), dec!(2));
        assert_eq!(config.clamp_risk(dec!(0)), dec!(0.1));
        assert_eq!(config.clamp_risk(dec!(-5)), dec!(0.1));
        assert_eq!(config.clamp_risk(dec!(150)), dec!(100));
    }

    #[test]
    fn test_parse_reward_ratios() {
        assert_eq!(parse_reward_ratios("2,3,4,5,6").unwrap(), vec![2, 3, 4, 5, 6]);
        assert_eq!(parse_reward_ratios(" 1, 2 ,").unwrap(), vec![1, 2]);
        assert!(parse_reward_ratios("2,x").is_err());
    }
}
