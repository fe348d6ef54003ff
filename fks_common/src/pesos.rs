use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Sub},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const CLP_CURRENCY_CODE: &str = "CLP";

//--------------------------------------        Pesos          ---------------------------------------------------------
/// An amount of Chilean pesos. The peso has no fractional unit in circulation, so amounts are always whole numbers.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Pesos(i64);

op!(binary Pesos, Add, add);
op!(binary Pesos, Sub, sub);
op!(inplace Pesos, AddAssign, add_assign);

impl Sum for Pesos {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Value cannot be represented in pesos: {0}")]
pub struct PesosConversionError(String);

impl From<i64> for Pesos {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<u64> for Pesos {
    type Error = PesosConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        i64::try_from(value).map(Self).map_err(|_| PesosConversionError(format!("{value} is too large")))
    }
}

impl TryFrom<f64> for Pesos {
    type Error = PesosConversionError;

    /// Only whole, finite values convert. `1000.0` is fine, `1000.5` is not.
    #[allow(clippy::cast_possible_truncation)]
    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() || value.fract() != 0.0 {
            return Err(PesosConversionError(format!("{value} is not a whole number of pesos")));
        }
        if value.abs() > i64::MAX as f64 {
            return Err(PesosConversionError(format!("{value} is too large")));
        }
        Ok(Self(value as i64))
    }
}

impl Display for Pesos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Chilean convention: `.` as the thousands separator
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(c);
        }
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{sign}${grouped}")
    }
}

impl Pesos {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Multiplies by a quantity, returning `None` on overflow.
    pub fn checked_mul(self, qty: i64) -> Option<Self> {
        self.0.checked_mul(qty).map(Self)
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }
}
