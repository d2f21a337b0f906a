use crate::context::Context;
use crate::errors::{Result, SettlementError};
use crate::events::SettlementEvent;
use crate::points::Points;
use crate::state::*;

/// Leaves the tournament before it starts. The entry fee becomes a refund
/// credit and the caller's bets are dropped. In the ranked variant this is
/// closed to everyone once the first bet is in.
pub fn handler(state: &mut SettlementState, ctx: &mut Context<'_>) -> Result<u64> {
    state.require_active()?;
    require!(state.phase == Phase::Registration, SettlementError::WithdrawalClosed);

    let signer = ctx.signer;
    // Ranked pools lock as soon as anyone has bet
    let locked = matches!(state.config.scoring, ScoringRule::Rank { .. }) && !state.bets.is_empty();
    let zero = match state.sealed {
        Some(sealed) => Tally::Sealed(sealed.zero),
        None => Tally::Open(Points::ZERO),
    };

    let participant = state.registered_mut(&signer)?;
    require!(!locked, SettlementError::BetsAlreadyPlaced);
    participant.registered = false;
    participant.bets_placed = 0;
    participant.total_points = zero;

    state.bets.retain(|(owner, _), _| owner != &signer);
    state.participant_count -= 1;

    let amount = state.config.entry_fee;
    state.ledger.refund_withdrawal(signer, amount)?;

    state.emit(SettlementEvent::ParticipantWithdrawn {
        participant: signer,
        amount,
    });
    Ok(amount)
}
