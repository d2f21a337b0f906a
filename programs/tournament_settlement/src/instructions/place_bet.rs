use crate::context::Context;
use crate::errors::{Result, SettlementError};
use crate::events::SettlementEvent;
use crate::state::*;

/// Records or overwrites the caller's prediction for one outcome while its
/// betting window is open.
pub fn handler(
    state: &mut SettlementState,
    ctx: &mut Context<'_>,
    outcome_id: OutcomeId,
    prediction: Prediction,
) -> Result<()> {
    state.require_active()?;
    require!(
        !matches!(state.phase, Phase::Decrypting { .. }),
        SettlementError::BettingClosed
    );

    let outcomes = ctx.outcomes;
    let signer = ctx.signer;
    require!(
        state.config.outcome_ids.contains(&outcome_id),
        SettlementError::UnknownOutcome(outcome_id)
    );
    let outcome = outcomes
        .outcome(outcome_id)
        .ok_or(SettlementError::UnknownOutcome(outcome_id))?;
    require!(state.is_registered(&signer), SettlementError::NotRegistered);
    require!(
        outcomes.is_betting_window_open(outcome_id, state.config.closing_window_secs, ctx.now),
        SettlementError::BettingWindowClosed(outcome_id)
    );

    let (stored, published) = match (state.config.privacy, prediction) {
        (Privacy::Public, Prediction::Open(selection)) => {
            let shape_fits = matches!(
                (state.config.scoring, &selection),
                (ScoringRule::Equality, Selection::Single(_))
                    | (ScoringRule::Rank { .. }, Selection::Ranked(_))
            );
            require!(shape_fits, SettlementError::ShapeMismatch);
            outcome
                .check_selection(&selection)
                .map_err(|e| SettlementError::InvalidPrediction(e.to_string()))?;
            (Prediction::Open(selection.clone()), Some(selection))
        }
        (Privacy::Confidential, Prediction::Sealed(ciphertext)) => {
            let sealed = state
                .sealed
                .ok_or(SettlementError::ConfidentialBackendRequired)?;
            let fhe = ctx.fhe()?;
            // Out-of-range picks become the invalid sentinel instead of
            // reverting, so a rejection leaks nothing about the plaintext.
            let bound = fhe.encrypt(outcome.options.len() as u64);
            let valid = fhe.lt(&ciphertext, &bound)?;
            let checked = fhe.select(&valid, &ciphertext, &sealed.invalid)?;
            (Prediction::Sealed(checked), None)
        }
        _ => return Err(SettlementError::PrivacyMismatch),
    };

    let key = (signer, outcome_id);
    if !state.bets.contains_key(&key) {
        state.registered_mut(&signer)?.bets_placed += 1;
    }
    state.bets.insert(
        key,
        Bet {
            prediction: stored,
            placed_at: ctx.now,
            scored: false,
            points_awarded: None,
        },
    );

    state.emit(SettlementEvent::BetPlaced {
        participant: signer,
        outcome_id,
        prediction: published,
    });
    Ok(())
}
