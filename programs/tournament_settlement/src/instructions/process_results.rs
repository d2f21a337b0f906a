use tracing::{debug, info};

use crate::context::Context;
use crate::errors::{Result, SettlementError};
use crate::events::SettlementEvent;
use crate::instructions::publish_leaderboard;
use crate::points::Points;
use crate::scoring::{score, sealed_equality};
use crate::state::*;

/// Scores every placed bet on one outcome. Runs at most once per outcome.
pub fn handler(
    state: &mut SettlementState,
    ctx: &mut Context<'_>,
    outcome_id: OutcomeId,
) -> Result<()> {
    state.require_active()?;
    state.require_admin(ctx.signer)?;
    require!(
        state.config.outcome_ids.contains(&outcome_id),
        SettlementError::UnknownOutcome(outcome_id)
    );
    require!(
        !state.scored_outcomes.contains(&outcome_id),
        SettlementError::AlreadyScored(outcome_id)
    );
    require!(state.phase != Phase::Registration, SettlementError::TournamentNotStarted);
    require!(
        !state.below_threshold(),
        SettlementError::NotEnoughParticipants {
            required: state.config.min_participants,
            actual: state.participant_count,
        }
    );

    let outcomes = ctx.outcomes;
    let result = outcomes
        .results(outcome_id)
        .cloned()
        .ok_or(SettlementError::ResultsNotPublished(outcome_id))?;
    let point_values = outcomes.point_values(outcome_id).unwrap_or(&[]);
    let rule = state.config.scoring;

    let bettors: Vec<Address> = state
        .registration_order()
        .into_iter()
        .map(|p| p.address)
        .filter(|address| state.bets.contains_key(&(*address, outcome_id)))
        .collect();

    for participant in bettors {
        let prediction = match state.bets.get(&(participant, outcome_id)) {
            Some(bet) => bet.prediction.clone(),
            None => continue,
        };
        let current = state.registered_mut(&participant)?.total_points;

        let (award, total) = match (prediction, current) {
            (Prediction::Open(selection), Tally::Open(total)) => {
                let points = score(rule, &selection, &result, point_values)?;
                let total = total.checked_add(points)?;
                state.emit(SettlementEvent::PointsAwarded {
                    participant,
                    outcome_id,
                    points,
                });
                (Award::Open(points), Tally::Open(total))
            }
            (Prediction::Sealed(predicted), Tally::Sealed(total)) => {
                let actual = match &result {
                    Selection::Single(actual) => *actual,
                    Selection::Ranked(_) => return Err(SettlementError::ShapeMismatch),
                };
                let sealed = state
                    .sealed
                    .ok_or(SettlementError::ConfidentialBackendRequired)?;
                let fhe = ctx.fhe()?;
                let points = sealed_equality(fhe, &sealed, &predicted, actual)?;
                let total = fhe.add(&total, &points)?;
                (Award::Sealed(points), Tally::Sealed(total))
            }
            _ => return Err(SettlementError::PrivacyMismatch),
        };

        debug!(%participant, outcome_id, "bet scored");
        state.registered_mut(&participant)?.total_points = total;
        if let Some(bet) = state.bets.get_mut(&(participant, outcome_id)) {
            bet.scored = true;
            bet.points_awarded = Some(award);
        }
    }

    state.scored_outcomes.insert(outcome_id);
    state.phase = Phase::Scoring;
    info!(
        outcome_id,
        scored = state.scored_outcomes.len(),
        required = state.config.outcome_ids.len(),
        "outcome processed"
    );
    state.emit(SettlementEvent::ResultsProcessed { outcome_id, result });

    if state.all_outcomes_scored() && state.config.privacy == Privacy::Public {
        let standings = open_standings(state)?;
        publish_leaderboard(state, standings, ctx.now);
    }
    Ok(())
}

/// Plain totals of registered participants, in registration order.
pub(crate) fn open_standings(state: &SettlementState) -> Result<Vec<(Address, Points)>> {
    state
        .registration_order()
        .into_iter()
        .map(|p| match p.total_points {
            Tally::Open(points) => Ok((p.address, points)),
            Tally::Sealed(_) => Err(SettlementError::PrivacyMismatch),
        })
        .collect()
}
