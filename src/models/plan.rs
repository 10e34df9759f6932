//! Position plan: the outcome of one sizing calculation.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Exit price at a fixed multiple of the initial risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfitTarget {
    /// Reward multiple of the risk per share (2 means 2:1)
    pub ratio: u32,

    /// Price at which the target is reached
    pub price: Decimal,

    /// Profit on the whole position if the target is hit
    pub profit: Decimal,
}

impl ProfitTarget {
    /// Reward-to-risk label, e.g. `"3:1"`.
    pub fn label(&self) -> String {
        format!("{}:1", self.ratio)
    }
}

/// Sized position with its ladder of profit targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionPlan {
    /// Entry price the plan was computed for
    pub entry_price: Decimal,

    /// Risk percentage actually applied after clamping
    pub risk_percentage: Decimal,

    /// Loss per share if the stop is hit
    pub risk_per_share: Decimal,

    /// Dollar amount the account is willing to lose
    pub max_risk_amount: Decimal,

    /// Lot-rounded share count allowed by the risk budget
    pub max_shares_by_risk: Decimal,

    /// Final share count (the binding constraint)
    pub max_shares: Decimal,

    /// Lot-rounded share count the whole account can buy
    pub max_shares_by_purchase_power: Decimal,

    /// Whether purchase power, not risk, decided the share count
    pub show_purchase_power_limit: bool,

    /// Targets in ascending ratio order; empty for an unusable setup
    pub targets: Vec<ProfitTarget>,
}

impl PositionPlan {
    /// All-zero plan returned for missing or inconsistent inputs.
    pub fn empty(entry_price: Decimal, risk_percentage: Decimal) -> Self {
        Self {
            entry_price,
            risk_percentage,
            risk_per_share: Decimal::ZERO,
            max_risk_amount: Decimal::ZERO,
            max_shares_by_risk: Decimal::ZERO,
            max_shares: Decimal::ZERO,
            max_shares_by_purchase_power: Decimal::ZERO,
            show_purchase_power_limit: false,
            targets: Vec::new(),
        }
    }

    /// True when the inputs did not describe a valid long setup.
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Capital needed to buy `max_shares` at the entry price.
    pub fn position_cost(&self) -> Decimal {
        self.max_shares * self.entry_price
    }

    /// Loss on the final position if the stop is hit.
    pub fn capital_at_risk(&self) -> Decimal {
        self.max_shares * self.risk_per_share
    }

    /// Message shown when purchase power capped the share count.
    pub fn purchase_power_warning(&self) -> Option<String> {
        if !self.show_purchase_power_limit {
            return None;
        }
        Some(format!(
            "Share quantity limited by available purchase power ({} shares at {}/share)",
            format_shares(self.max_shares_by_purchase_power),
            format_money(self.entry_price)
        ))
    }
}

impl std::fmt::Display for PositionPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n{:=^50}", " POSITION DETAILS ")?;
        writeln!(f, "Risk %:           {}%", self.risk_percentage.normalize())?;
        writeln!(f, "Risk per Share:   {}", format_money(self.risk_per_share))?;
        writeln!(f, "Max Risk Amount:  {}", format_money(self.max_risk_amount))?;
        writeln!(f, "Maximum Shares:   {}", format_shares(self.max_shares))?;
        writeln!(f, "Position Cost:    {}", format_money(self.position_cost()))?;
        writeln!(f, "Capital at Risk:  {}", format_money(self.capital_at_risk()))?;

        if let Some(warning) = self.purchase_power_warning() {
            writeln!(f)?;
            writeln!(f, "! {}", warning)?;
        }

        writeln!(f)?;
        writeln!(f, "--- Profit Targets ---")?;
        if self.targets.is_empty() {
            writeln!(f, "Enter an account value, entry price and a stop loss below entry.")?;
        }
        for target in &self.targets {
            writeln!(
                f,
                "{:<5} {:>14} {:>16}",
                target.label(),
                format_money(target.price),
                format!("+{}", format_money(target.profit))
            )?;
        }
        writeln!(f, "{:=^50}", "")?;
        Ok(())
    }
}

/// Format a dollar amount with two decimals and thousands separators.
pub fn format_money(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let text = format!("{:.2}", rounded.abs());
    let (integer, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{}${}.{}", sign, group_thousands(integer), fraction)
}

/// Format a share count as a whole number with thousands separators.
pub fn format_shares(shares: Decimal) -> String {
    let text = format!("{:.0}", shares.trunc().abs());
    let sign = if shares.is_sign_negative() && !shares.trunc().is_zero() {
        "-"
    } else {
        ""
    };
    format!("{}{}", sign, group_thousands(&text))
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}
