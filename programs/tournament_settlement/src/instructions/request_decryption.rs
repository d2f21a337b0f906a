use tracing::info;

use crate::context::Context;
use crate::errors::{Result, SettlementError};
use crate::events::SettlementEvent;
use crate::oracle::DecryptionTicket;
use crate::state::*;

/// First half of the reveal: one oracle request per registered participant's
/// sealed total.
pub fn handler(state: &mut SettlementState, ctx: &mut Context<'_>) -> Result<usize> {
    state.require_active()?;
    state.require_admin(ctx.signer)?;
    require!(
        state.config.privacy == Privacy::Confidential,
        SettlementError::NotConfidential
    );
    require!(!state.decryption_requested, SettlementError::DecryptionAlreadyRequested);
    state.require_all_scored()?;
    require!(ctx.outcomes.is_closed(ctx.now), SettlementError::OutcomeSourceOpen);

    let totals: Vec<(Address, Tally)> = state
        .registration_order()
        .into_iter()
        .map(|p| (p.address, p.total_points))
        .collect();

    let oracle = ctx.oracle()?;
    let mut tickets = Vec::with_capacity(totals.len());
    for (participant, total) in totals {
        let ciphertext = match total {
            Tally::Sealed(ciphertext) => ciphertext,
            Tally::Open(_) => return Err(SettlementError::PrivacyMismatch),
        };
        tickets.push(DecryptionTicket::request(oracle, participant, ciphertext)?);
    }

    let requests = tickets.len();
    info!(requests, "points decryption requested");
    state.decryption_requested = true;
    state.phase = Phase::Decrypting {
        requested_at: ctx.now,
        tickets,
    };
    state.emit(SettlementEvent::DecryptionRequested { requests });
    Ok(requests)
}
