use crate::context::Context;
use crate::errors::{Result, SettlementError};
use crate::instructions::cancel::cancel_settlement;
use crate::state::*;

/// Escape hatch for an oracle that never answers: once the configured timeout
/// has passed since the request, the admin may cancel with full refunds.
pub fn handler(state: &mut SettlementState, ctx: &mut Context<'_>, reason: &str) -> Result<()> {
    state.require_active()?;
    state.require_admin(ctx.signer)?;
    let timeout = state
        .config
        .decryption_timeout_secs
        .ok_or(SettlementError::EscapeHatchDisabled)?;
    let requested_at = match state.phase {
        Phase::Decrypting { requested_at, .. } => requested_at,
        _ => return Err(SettlementError::DecryptionNotRequested),
    };
    require!(
        ctx.now >= requested_at.saturating_add(timeout),
        SettlementError::DecryptionTimeoutNotElapsed
    );

    cancel_settlement(state, ctx.now, reason)
}
