use std::{fmt, ops::Neg, str::FromStr};

use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine};

/// Maximum number of fraction digits accepted from user input.
const MAX_SCALE: usize = 2;

/// Monetary amount backed by a fixed-precision decimal.
///
/// Use this type for **all** monetary values (allowance, expense amounts,
/// derived totals) so that repeated sums never drift the way floats do.
///
/// The amount is currency agnostic and signed: a remaining balance may go
/// below zero when the store accepts more than the allowance.
///
/// Arithmetic is checked, see [`Amount::checked_add`].
///
/// # Examples
///
/// ```rust
/// use engine::Amount;
///
/// let amount: Amount = "12,5".parse().unwrap();
/// assert_eq!(amount.to_string(), "12.50");
/// assert!("12.345".parse::<Amount>().is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    #[must_use]
    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Returns the underlying decimal.
    #[must_use]
    pub const fn value(self) -> Decimal {
        self.0
    }

    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    /// Returns `true` if the amount is strictly greater than zero.
    #[must_use]
    pub fn is_positive(self) -> bool {
        self.0 > Decimal::ZERO
    }

    #[must_use]
    pub fn is_negative(self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Formats the amount with a currency prefix, e.g. `R$ 12.50`.
    #[must_use]
    pub fn format_with(self, symbol: &str) -> String {
        if symbol.is_empty() {
            return self.to_string();
        }
        if self.is_negative() {
            format!("-{symbol} {}", -self)
        } else {
            format!("{symbol} {self}")
        }
    }

    /// Ratio `self / total` clamped to `0.0..=1.0`, used for gauges.
    #[must_use]
    pub fn ratio_of(self, total: Amount) -> f64 {
        if !total.is_positive() {
            return 1.0;
        }
        let ratio = self
            .0
            .checked_div(total.0)
            .and_then(|ratio| ratio.to_f64())
            .unwrap_or(1.0);
        ratio.clamp(0.0, 1.0)
    }

    #[must_use]
    pub fn checked_add(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_add(rhs.0).map(Amount)
    }

    #[must_use]
    pub fn checked_sub(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_sub(rhs.0).map(Amount)
    }

    /// Sums `amounts`, failing with [`EngineError::AmountOverflow`] when the
    /// total does not fit.
    pub fn checked_sum<I>(amounts: I) -> ResultEngine<Amount>
    where
        I: IntoIterator<Item = Amount>,
    {
        amounts.into_iter().try_fold(Amount::ZERO, |total, amount| {
            total.checked_add(amount).ok_or(EngineError::AmountOverflow)
        })
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl From<Amount> for Decimal {
    fn from(value: Amount) -> Self {
        value.0
    }
}

impl Neg for Amount {
    type Output = Amount;

    fn neg(self) -> Self::Output {
        Amount(-self.0)
    }
}

impl FromStr for Amount {
    type Err = EngineError;

    /// Parses user input into an amount.
    ///
    /// Accepts `.` or `,` as decimal separator and an optional leading `+`/`-`.
    ///
    /// Validation rules:
    /// - max 2 fractional digits (rejects `12.345`)
    /// - rejects empty/invalid strings, exponents and thousands separators
    fn from_str(s: &str) -> ResultEngine<Self> {
        let empty = || EngineError::InvalidAmount("empty amount".to_string());
        let invalid = || EngineError::InvalidAmount("invalid amount".to_string());

        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(empty());
        }

        let (negative, rest) = if let Some(stripped) = trimmed.strip_prefix('-') {
            (true, stripped)
        } else if let Some(stripped) = trimmed.strip_prefix('+') {
            (false, stripped)
        } else {
            (false, trimmed)
        };

        let rest = rest.trim();
        if rest.is_empty() {
            return Err(empty());
        }

        let rest = rest.replace(',', ".");
        let mut parts = rest.split('.');
        let units = parts.next().ok_or_else(invalid)?;
        let fraction = parts.next();

        if parts.next().is_some() {
            return Err(invalid());
        }
        if units.is_empty() || !units.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        if let Some(fraction) = fraction {
            if !fraction.chars().all(|c| c.is_ascii_digit()) {
                return Err(invalid());
            }
            if fraction.len() > MAX_SCALE {
                return Err(EngineError::InvalidAmount("too many decimals".to_string()));
            }
        }

        let normalized = match fraction {
            Some(fraction) if !fraction.is_empty() => format!("{units}.{fraction}"),
            _ => units.to_string(),
        };
        let value = Decimal::from_str(&normalized)
            .map_err(|_| EngineError::InvalidAmount("amount too large".to_string()))?;

        Ok(Amount(if negative { -value } else { value }))
    }
}
