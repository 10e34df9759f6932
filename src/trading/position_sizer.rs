//! Risk-based position sizing with a purchase-power cap and a profit target ladder.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, warn};

use crate::models::{PositionPlan, ProfitTarget, RawInputs, SizingInputs};
use super::SizingConfig;

/// Calculator for position sizes and profit targets.
///
/// Stateless apart from its configuration: every call computes from scratch,
/// so a single sizer can be shared freely.
#[derive(Debug, Clone, Default)]
pub struct PositionSizer {
    config: SizingConfig,
}

impl PositionSizer {
    /// Create a new position sizer with given config.
    pub fn new(config: SizingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SizingConfig {
        &self.config
    }

    /// Size a position from text fields as typed. Unparseable text counts as zero.
    pub fn compute_raw(
        &self,
        account_value: &str,
        entry_price: &str,
        stop_loss: &str,
        risk_percentage: &str,
    ) -> PositionPlan {
        let raw = RawInputs::new(account_value, entry_price, stop_loss, risk_percentage);
        self.compute(&raw.parse())
    }

    /// Size a long position.
    ///
    /// The share count is the smaller of what the risk budget allows and what
    /// the account can buy outright, both rounded down to whole lots. Risking
    /// the maximum percentage always uses the purchase-power count.
    ///
    /// Missing values (zero) or a stop at or above the entry produce an empty
    /// plan instead of an error. Negative values are sized as given.
    pub fn compute(&self, inputs: &SizingInputs) -> PositionPlan {
        let risk_pct = self.config.clamp_risk(inputs.risk_percentage);
        let SizingInputs {
            account_value,
            entry_price,
            stop_loss,
            ..
        } = *inputs;

        if account_value.is_zero() || entry_price.is_zero() || stop_loss.is_zero() {
            debug!(
                account = %account_value,
                entry = %entry_price,
                stop = %stop_loss,
                "Missing input, nothing to size"
            );
            return PositionPlan::empty(entry_price, risk_pct);
        }

        if entry_price <= stop_loss {
            debug!(
                entry = %entry_price,
                stop = %stop_loss,
                "Stop loss is not below entry"
            );
            return PositionPlan::empty(entry_price, risk_pct);
        }

        match self.size(account_value, entry_price, stop_loss, risk_pct) {
            Some(plan) => plan,
            None => {
                warn!(
                    account = %account_value,
                    entry = %entry_price,
                    stop = %stop_loss,
                    "Position size overflowed decimal range"
                );
                PositionPlan::empty(entry_price, risk_pct)
            }
        }
    }

    /// Core arithmetic. `None` means a decimal overflow.
    fn size(
        &self,
        account_value: Decimal,
        entry_price: Decimal,
        stop_loss: Decimal,
        risk_pct: Decimal,
    ) -> Option<PositionPlan> {
        let risk_per_share = entry_price.checked_sub(stop_loss)?;
        let max_risk_amount = account_value.checked_mul(risk_pct)?.checked_div(dec!(100))?;

        let max_shares_by_risk = self.round_to_lot(max_risk_amount.checked_div(risk_per_share)?)?;
        let max_shares_by_purchase_power =
            self.round_to_lot(account_value.checked_div(entry_price)?)?;

        let capped = risk_pct == self.config.max_risk_pct
            || max_shares_by_risk > max_shares_by_purchase_power;
        let max_shares = if capped {
            max_shares_by_purchase_power
        } else {
            max_shares_by_risk
        };

        let targets = self
            .config
            .reward_ratios
            .iter()
            .map(|&ratio| {
                let reward = risk_per_share.checked_mul(Decimal::from(ratio))?;
                Some(ProfitTarget {
                    ratio,
                    price: entry_price.checked_add(reward)?,
                    profit: reward.checked_mul(max_shares)?,
                })
            })
            .collect::<Option<Vec<_>>>()?;

        debug!(
            risk_per_share = %risk_per_share,
            by_risk = %max_shares_by_risk,
            by_purchase_power = %max_shares_by_purchase_power,
            capped = capped,
            "Position sized"
        );

        Some(PositionPlan {
            entry_price,
            risk_percentage: risk_pct,
            risk_per_share,
            max_risk_amount,
            max_shares_by_risk,
            max_shares,
            max_shares_by_purchase_power,
            show_purchase_power_limit: capped,
            targets,
        })
    }

    /// Round a share count down to a whole number of lots.
    fn round_to_lot(&self, shares: Decimal) -> Option<Decimal> {
        let lot = self.config.lot();
        shares.checked_div(lot)?.floor().checked_mul(lot)
    }
}
