use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::POINT_SCALE;
use crate::errors::{Result, SettlementError};

/// Tournament points with two decimals, stored as hundredths so that partial
/// rank scores (e.g. 2.5) and the bonus stay exact integers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Points(u64);

impl Points {
    pub const ZERO: Points = Points(0);

    pub const fn from_hundredths(hundredths: u64) -> Self {
        Points(hundredths)
    }

    pub const fn whole(points: u64) -> Self {
        Points(points * POINT_SCALE)
    }

    pub const fn hundredths(self) -> u64 {
        self.0
    }

    pub fn checked_add(self, other: Points) -> Result<Points> {
        self.0
            .checked_add(other.0)
            .map(Points)
            .ok_or(SettlementError::ArithmeticOverflow)
    }

    pub fn to_decimal(self) -> Decimal {
        Decimal::from_i128_with_scale(self.0 as i128, 2).normalize()
    }
}

impl fmt::Display for Points {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}
