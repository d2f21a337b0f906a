use tracing::debug;

use crate::constants::MAX_NAME_LEN;
use crate::context::Context;
use crate::errors::{Result, SettlementError};
use crate::events::SettlementEvent;
use crate::points::Points;
use crate::state::*;

pub fn handler(state: &mut SettlementState, ctx: &mut Context<'_>, name: &str, fee: u64) -> Result<()> {
    state.require_active()?;
    require!(state.phase == Phase::Registration, SettlementError::RegistrationClosed);

    let signer = ctx.signer;
    require!(!state.is_registered(&signer), SettlementError::AlreadyRegistered);
    require!(
        fee == state.config.entry_fee,
        SettlementError::IncorrectEntryFee {
            expected: state.config.entry_fee,
            provided: fee,
        }
    );

    let name = name.trim();
    require!(
        !name.is_empty() && name.chars().count() <= MAX_NAME_LEN,
        SettlementError::InvalidName
    );
    // Case-sensitive, current participants only
    require!(
        !state.participants.values().any(|p| p.registered && p.name == name),
        SettlementError::NameAlreadyTaken(name.to_string())
    );
    require!(
        state.participant_count < state.config.max_participants,
        SettlementError::ParticipantLimitReached(state.config.max_participants)
    );

    state.ledger.capture_fee(fee)?;

    let total_points = match state.sealed {
        Some(sealed) => Tally::Sealed(sealed.zero),
        None => Tally::Open(Points::ZERO),
    };
    let registration_index = state.next_registration_index;
    // A withdrawn participant keeps the slot and gets a fresh tie-break index
    state.participants.insert(
        signer,
        Participant {
            address: signer,
            name: name.to_string(),
            registered: true,
            registration_index,
            registered_at: ctx.now,
            total_points,
            bets_placed: 0,
        },
    );
    state.next_registration_index += 1;
    state.participant_count += 1;

    debug!(%signer, registration_index, "participant registered");
    state.emit(SettlementEvent::ParticipantRegistered {
        participant: signer,
        name: name.to_string(),
    });
    Ok(())
}
