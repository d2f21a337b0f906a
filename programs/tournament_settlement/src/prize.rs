use serde::{Deserialize, Serialize};

use crate::constants::FEE_DENOMINATOR;
use crate::errors::{Result, SettlementError};
use crate::state::{Address, LeaderboardEntry};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrizeAward {
    /// 1-based.
    pub rank: u32,
    pub participant: Address,
    pub amount: u64,
}

/// How a settled pool is split. `platform_fee + sum(awards) + remainder`
/// always equals `total_pool`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub total_pool: u64,
    pub platform_fee: u64,
    pub winner_pool: u64,
    pub awards: Vec<PrizeAward>,
    /// Flooring dust plus the shares of prize ranks nobody filled.
    pub remainder: u64,
}

fn mul_div(value: u64, numerator: u64, denominator: u64) -> Result<u64> {
    if denominator == 0 {
        return Err(SettlementError::InvalidPrizeDistribution);
    }
    let product = value as u128 * numerator as u128 / denominator as u128;
    u64::try_from(product).map_err(|_| SettlementError::ArithmeticOverflow)
}

/// Splits `pool` between the platform fee and the top ranks of `ranking`
/// weighted by `distribution`. Ranks beyond the leaderboard's length earn
/// nothing.
pub fn allocate(
    pool: u64,
    fee_bps: u64,
    distribution: &[u64],
    ranking: &[LeaderboardEntry],
) -> Result<Allocation> {
    if fee_bps > FEE_DENOMINATOR {
        return Err(SettlementError::UnsupportedConfiguration(
            "fee exceeds 100%".to_string(),
        ));
    }
    let weight_total = distribution
        .iter()
        .try_fold(0u64, |acc, w| acc.checked_add(*w))
        .ok_or(SettlementError::ArithmeticOverflow)?;
    if weight_total == 0 {
        return Err(SettlementError::InvalidPrizeDistribution);
    }

    let platform_fee = mul_div(pool, fee_bps, FEE_DENOMINATOR)?;
    let winner_pool = mul_div(pool, FEE_DENOMINATOR - fee_bps, FEE_DENOMINATOR)?;

    let mut awards = Vec::new();
    let mut awarded: u64 = 0;
    for (i, (weight, entry)) in distribution.iter().zip(ranking.iter()).enumerate() {
        let amount = mul_div(winner_pool, *weight, weight_total)?;
        if amount == 0 {
            continue;
        }
        awarded += amount;
        awards.push(PrizeAward {
            rank: i as u32 + 1,
            participant: entry.participant,
            amount,
        });
    }

    let remainder = pool
        .checked_sub(platform_fee)
        .and_then(|rest| rest.checked_sub(awarded))
        .ok_or_else(|| {
            SettlementError::ConservationViolated("allocation exceeds the pool".to_string())
        })?;

    Ok(Allocation {
        total_pool: pool,
        platform_fee,
        winner_pool,
        awards,
        remainder,
    })
}
