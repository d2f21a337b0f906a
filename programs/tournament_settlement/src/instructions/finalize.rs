use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::context::Context;
use crate::errors::{Result, SettlementError};
use crate::events::SettlementEvent;
use crate::instructions::cancel::cancel_settlement;
use crate::instructions::process_results::open_standings;
use crate::instructions::publish_leaderboard;
use crate::points::Points;
use crate::prize::{allocate, Allocation};
use crate::state::*;

pub const THRESHOLD_NOT_MET: &str = "minimum participants not reached";

/// How `finalize_and_distribute` ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Settlement {
    Distributed(Allocation),
    Cancelled { reason: String },
}

pub fn handler(state: &mut SettlementState, ctx: &mut Context<'_>) -> Result<Settlement> {
    state.require_active()?;
    state.require_admin(ctx.signer)?;
    require!(state.phase != Phase::Registration, SettlementError::TournamentNotStarted);

    if state.below_threshold() {
        warn!(
            registered = state.participant_count,
            required = state.config.min_participants,
            "threshold not met, cancelling instead of finalizing"
        );
        cancel_settlement(state, ctx.now, THRESHOLD_NOT_MET)?;
        return Ok(Settlement::Cancelled {
            reason: THRESHOLD_NOT_MET.to_string(),
        });
    }

    let standings = match state.config.privacy {
        Privacy::Public => {
            state.require_all_scored()?;
            open_standings(state)?
        }
        Privacy::Confidential => revealed_standings(state, ctx)?,
    };
    publish_leaderboard(state, standings, ctx.now);

    let allocation = allocate(
        state.ledger.total_prize_pool(),
        state.config.fee_bps,
        &state.config.prize_distribution,
        &state.leaderboard.entries,
    )?;

    let platform_share = allocation.platform_fee + allocation.remainder;
    if platform_share > 0 {
        let platform = state.config.platform;
        state.ledger.allocate_prize(platform, platform_share)?;
    }
    for award in &allocation.awards {
        state.ledger.allocate_prize(award.participant, award.amount)?;
        state.emit(SettlementEvent::PrizePaid {
            participant: award.participant,
            amount: award.amount,
            rank: award.rank,
        });
    }

    info!(
        pool = allocation.total_pool,
        platform_fee = allocation.platform_fee,
        winners = allocation.awards.len(),
        remainder = allocation.remainder,
        "tournament finalized"
    );
    state.phase = Phase::Finalized { at: ctx.now };
    state.emit(SettlementEvent::TournamentFinalized {
        platform_fee: allocation.platform_fee,
        remainder: allocation.remainder,
    });
    Ok(Settlement::Distributed(allocation))
}

/// Second half of the reveal. All tickets must be ready; a single missing
/// plaintext fails the whole call so the caller can retry.
fn revealed_standings(
    state: &mut SettlementState,
    ctx: &mut Context<'_>,
) -> Result<Vec<(Address, Points)>> {
    let tickets = match &state.phase {
        Phase::Decrypting { tickets, .. } => tickets.clone(),
        _ => return Err(SettlementError::DecryptionNotRequested),
    };

    let oracle = ctx.oracle()?;
    let mut standings = Vec::with_capacity(tickets.len());
    for ticket in &tickets {
        let points = ticket
            .poll_ready(oracle)
            .ok_or(SettlementError::DecryptionNotReady(ticket.participant))?;
        standings.push((ticket.participant, points));
    }

    state.decrypted_points = standings.iter().copied().collect();
    Ok(standings)
}
