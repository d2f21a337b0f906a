//! Point computation for one scored bet.

use crate::confidential::{EncryptedU64, FheEngine};
use crate::constants::{EXACT_MULTIPLIER, PARTIAL_MULTIPLIER, PERCENT};
use crate::errors::{Result, SettlementError};
use crate::points::Points;
use crate::state::{ScoringRule, SealedConstants, Selection};

/// One point for the right option, nothing otherwise.
pub fn equality_points(predicted: u32, actual: u32) -> Points {
    if predicted == actual {
        Points::whole(1)
    } else {
        Points::ZERO
    }
}

/// Per slot: exact position earns the full slot value, the right entity in
/// another slot earns half, anything else earns nothing. The bonus is then
/// applied on the subtotal.
///
/// A slot value of `v` with multiplier `m` is worth `v * m / 100` points,
/// which is exactly `v * m` hundredths.
pub fn rank_points(
    predicted: &[u32],
    actual: &[u32],
    point_values: &[u64],
    bonus_percent: u64,
) -> Result<Points> {
    if predicted.len() != actual.len() || predicted.len() != point_values.len() {
        return Err(SettlementError::ShapeMismatch);
    }

    let mut subtotal: u64 = 0;
    for (slot, option) in predicted.iter().enumerate() {
        let multiplier = if actual[slot] == *option {
            EXACT_MULTIPLIER
        } else if actual.contains(option) {
            PARTIAL_MULTIPLIER
        } else {
            0
        };
        let slot_points = point_values[slot]
            .checked_mul(multiplier)
            .ok_or(SettlementError::ArithmeticOverflow)?;
        subtotal = subtotal
            .checked_add(slot_points)
            .ok_or(SettlementError::ArithmeticOverflow)?;
    }

    let bonus = u64::try_from(subtotal as u128 * bonus_percent as u128 / PERCENT as u128)
        .map_err(|_| SettlementError::ArithmeticOverflow)?;
    subtotal
        .checked_add(bonus)
        .map(Points::from_hundredths)
        .ok_or(SettlementError::ArithmeticOverflow)
}

/// Scores a plain prediction against the published result.
pub fn score(
    rule: ScoringRule,
    prediction: &Selection,
    result: &Selection,
    point_values: &[u64],
) -> Result<Points> {
    match (rule, prediction, result) {
        (ScoringRule::Equality, Selection::Single(predicted), Selection::Single(actual)) => {
            Ok(equality_points(*predicted, *actual))
        }
        (
            ScoringRule::Rank { bonus_percent },
            Selection::Ranked(predicted),
            Selection::Ranked(actual),
        ) => rank_points(predicted, actual, point_values, bonus_percent),
        _ => Err(SettlementError::ShapeMismatch),
    }
}

/// Sealed equality scoring: `select(predicted == actual, 1 point, 0)`.
pub fn sealed_equality(
    fhe: &mut dyn FheEngine,
    constants: &SealedConstants,
    predicted: &EncryptedU64,
    actual: u32,
) -> Result<EncryptedU64> {
    let actual = fhe.encrypt(actual as u64);
    let hit = fhe.eq(predicted, &actual)?;
    Ok(fhe.select(&hit, &constants.one_point, &constants.zero)?)
}
