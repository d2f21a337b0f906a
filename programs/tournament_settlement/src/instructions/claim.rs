use crate::context::Context;
use crate::errors::{Result, SettlementError};
use crate::events::SettlementEvent;
use crate::state::*;

/// Pays out the caller's whole claimable balance. Registered participants
/// wait until the tournament settles; withdrawn ones may claim right away.
pub fn handler(state: &mut SettlementState, ctx: &mut Context<'_>) -> Result<u64> {
    let signer = ctx.signer;
    require!(
        !(state.is_active() && state.is_registered(&signer)),
        SettlementError::ClaimWhileActive
    );

    let credit = state.ledger.claim(&signer)?;
    if credit.refund > 0 {
        state.emit(SettlementEvent::RefundClaimed {
            participant: signer,
            amount: credit.refund,
        });
    }
    if credit.prize > 0 {
        state.emit(SettlementEvent::PrizeClaimed {
            participant: signer,
            amount: credit.prize,
        });
    }
    Ok(credit.total())
}
