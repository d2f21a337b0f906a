use tracing::info;

use crate::context::Context;
use crate::errors::{Result, SettlementError};
use crate::events::SettlementEvent;
use crate::state::*;

pub fn handler(state: &mut SettlementState, ctx: &mut Context<'_>, reason: &str) -> Result<()> {
    state.require_active()?;

    // Anyone may cancel a started tournament that missed its threshold
    let permissionless = state.phase != Phase::Registration && state.below_threshold();
    require!(
        permissionless || ctx.signer == state.config.admin,
        SettlementError::Unauthorized
    );

    cancel_settlement(state, ctx.now, reason)
}

/// Terminal cancellation: every registered participant is credited the full
/// entry fee.
pub fn cancel_settlement(state: &mut SettlementState, now: i64, reason: &str) -> Result<()> {
    let entry_fee = state.config.entry_fee;
    let refunded: Vec<Address> = state
        .registration_order()
        .into_iter()
        .map(|p| p.address)
        .collect();

    for participant in &refunded {
        state.ledger.allocate_refund(*participant, entry_fee)?;
    }

    info!(
        refunds = refunded.len(),
        at = now,
        reason,
        "tournament cancelled"
    );
    state.phase = Phase::Cancelled {
        reason: reason.to_string(),
    };
    state.emit(SettlementEvent::TournamentCancelled {
        reason: reason.to_string(),
    });
    Ok(())
}
