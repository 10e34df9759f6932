//! Calculator inputs: raw text as typed and the parsed numeric form.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Parse a user-typed amount, falling back to zero instead of failing.
///
/// Reads the longest leading number of the form
/// `[+-]digits[.digits][e[+-]digits]`, so `"12.5abc"` -> 12.5, `".5"` -> 0.5,
/// `"1e4"` -> 10000 and `"1_000"` -> 1. An exponent without digits is ignored
/// (`"3e"` -> 3). Values too small for `Decimal` round to zero and values too
/// large for it parse as zero. Text without a leading number (`""`, `"abc"`,
/// `"$100"`) parses as zero.
pub fn parse_amount(text: &str) -> Decimal {
    try_parse_amount(text).unwrap_or(Decimal::ZERO)
}

/// Like [`parse_amount`], but `None` when the text holds no number at all.
pub fn try_parse_amount(text: &str) -> Option<Decimal> {
    let number = NumberPrefix::scan(text.trim())?;
    Some(number.to_decimal().unwrap_or(Decimal::ZERO))
}

/// Leading number of a string, split into its parts.
#[derive(Debug, Default)]
struct NumberPrefix {
    negative: bool,
    integer: String,
    fraction: String,
    exponent: i64,
}

impl NumberPrefix {
    fn scan(text: &str) -> Option<Self> {
        let bytes = text.as_bytes();
        let mut pos = 0;
        let mut number = Self::default();

        if let Some(&sign) = bytes.first() {
            if sign == b'-' || sign == b'+' {
                number.negative = sign == b'-';
                pos += 1;
            }
        }

        pos += take_digits(&bytes[pos..], &mut number.integer);
        if bytes.get(pos) == Some(&b'.') {
            pos += 1;
            pos += take_digits(&bytes[pos..], &mut number.fraction);
        }

        if number.integer.is_empty() && number.fraction.is_empty() {
            return None;
        }

        if matches!(bytes.get(pos), Some(b'e') | Some(b'E')) {
            let mut exp_pos = pos + 1;
            let mut exp_negative = false;
            if let Some(&sign) = bytes.get(exp_pos) {
                if sign == b'-' || sign == b'+' {
                    exp_negative = sign == b'-';
                    exp_pos += 1;
                }
            }

            let mut digits = String::new();
            take_digits(&bytes[exp_pos..], &mut digits);
            if !digits.is_empty() {
                // Anything this long is far outside the decimal range anyway
                let magnitude = digits.parse::<i64>().unwrap_or(i64::MAX);
                number.exponent = if exp_negative { -magnitude } else { magnitude };
            }
        }

        Some(number)
    }

    /// `None` when the value is too large for `Decimal`.
    fn to_decimal(&self) -> Option<Decimal> {
        let mut text = String::with_capacity(self.integer.len() + self.fraction.len() + 3);
        if self.negative {
            text.push('-');
        }
        if self.integer.is_empty() {
            text.push('0');
        } else {
            text.push_str(&self.integer);
        }
        if !self.fraction.is_empty() {
            text.push('.');
            text.push_str(&self.fraction);
        }

        let mut value = Decimal::from_str(&text).ok()?;
        if value.is_zero() {
            return Some(Decimal::ZERO);
        }

        // Each step either overflows or reaches zero within a few dozen iterations
        let mut exponent = self.exponent;
        while exponent > 0 {
            value = value.checked_mul(Decimal::TEN)?;
            exponent -= 1;
        }
        while exponent < 0 && !value.is_zero() {
            value = value.checked_div(Decimal::TEN)?;
            exponent += 1;
        }
        Some(value)
    }
}

fn take_digits(bytes: &[u8], out: &mut String) -> usize {
    let count = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
    out.extend(bytes[..count].iter().map(|&b| b as char));
    count
}

/// The four calculator fields exactly as the user typed them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawInputs {
    pub account_value: String,
    pub entry_price: String,
    pub stop_loss: String,
    pub risk_percentage: String,
}

impl RawInputs {
    pub fn new(
        account_value: impl Into<String>,
        entry_price: impl Into<String>,
        stop_loss: impl Into<String>,
        risk_percentage: impl Into<String>,
    ) -> Self {
        Self {
            account_value: account_value.into(),
            entry_price: entry_price.into(),
            stop_loss: stop_loss.into(),
            risk_percentage: risk_percentage.into(),
        }
    }

    /// Convert every field with [`parse_amount`]. Never fails.
    pub fn parse(&self) -> SizingInputs {
        SizingInputs::new(
            parse_amount(&self.account_value),
            parse_amount(&self.entry_price),
            parse_amount(&self.stop_loss),
            parse_amount(&self.risk_percentage),
        )
    }
}

/// Numeric inputs for one position-size calculation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizingInputs {
    /// Total capital available
    pub account_value: Decimal,

    /// Intended purchase price per share
    pub entry_price: Decimal,

    /// Exit price that caps the loss
    pub stop_loss: Decimal,

    /// Percent of the account to risk (e.g. 2 for 2%)
    pub risk_percentage: Decimal,
}

impl SizingInputs {
    pub fn new(
        account_value: Decimal,
        entry_price: Decimal,
        stop_loss: Decimal,
        risk_percentage: Decimal,
    ) -> Self {
        Self {
            account_value,
            entry_price,
            stop_loss,
            risk_percentage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_plain_numbers() {
        assert_eq!(parse_amount("10000"), dec!(10000));
        assert_eq!(parse_amount("  95.5 "), dec!(95.5));
        assert_eq!(parse_amount("-2.5"), dec!(-2.5));
        assert_eq!(parse_amount("+3"), dec!(3));
        assert_eq!(parse_amount("1e4"), dec!(10000));
    }

    #[test]
    fn test_parse_partial_input() {
        // What a user has typed mid-keystroke
        assert_eq!(parse_amount("12.5abc"), dec!(12.5));
        assert_eq!(parse_amount(".5"), dec!(0.5));
        assert_eq!(parse_amount("7."), dec!(7));
        assert_eq!(parse_amount("1,000"), dec!(1));
        assert_eq!(parse_amount("1_000"), dec!(1));
        assert_eq!(parse_amount("3e"), dec!(3));
        assert_eq!(parse_amount("2.5E-3x"), dec!(0.0025));
    }

    #[test]
    fn test_parse_exponent_out_of_range() {
        // Too small rounds to zero, too large is unusable
        assert!(parse_amount("1e-40").is_zero());
        assert!(parse_amount("1e400").is_zero());
        assert!(parse_amount("-7e99999999999999999999").is_zero());
        assert!(parse_amount("99999999999999999999999999999999").is_zero());
        assert_eq!(try_parse_amount("1e400"), Some(Decimal::ZERO));
        assert_eq!(parse_amount("5e-2"), dec!(0.05));
    }

    #[test]
    fn test_parse_garbage_is_zero() {
        for text in ["", "   ", "abc", "-", ".", "$100", "+."] {
            assert!(parse_amount(text).is_zero(), "{:?} should parse as zero", text);
        }
    }

    #[test]
    fn test_try_parse_distinguishes_missing_numbers() {
        assert_eq!(try_parse_amount("0"), Some(Decimal::ZERO));
        assert_eq!(try_parse_amount("5abc"), Some(dec!(5)));
        assert_eq!(try_parse_amount("abc"), None);
        assert_eq!(try_parse_amount(""), None);
    }

    #[test]
    fn test_raw_inputs_parse() {
        let raw = RawInputs::new("50000", "50", "48", "five");
        let inputs = raw.parse();

        assert_eq!(inputs.account_value, dec!(50000));
        assert_eq!(inputs.entry_price, dec!(50));
        assert_eq!(inputs.stop_loss, dec!(48));
        assert_eq!(inputs.risk_percentage, Decimal::ZERO);
    }

    #[test]
    fn test_raw_inputs_from_partial_json() {
        let raw: RawInputs = serde_json::from_str(r#"{"accountValue":"10000","entryPrice":"1x"}"#).unwrap();
        let inputs = raw.parse();

        assert_eq!(inputs.account_value, dec!(10000));
        assert_eq!(inputs.entry_price, dec!(1));
        assert!(inputs.stop_loss.is_zero());
    }

    #[test]
    fn test_inputs_from_json() {
        let inputs: SizingInputs = serde_json::from_str(
            r#"{"accountValue":"10000","entryPrice":"100","stopLoss":"95","riskPercentage":"2"}"#,
        )
        .unwrap();

        assert_eq!(inputs, SizingInputs::new(dec!(10000), dec!(100), dec!(95), dec!(2)));
    }
}
