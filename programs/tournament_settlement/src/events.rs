use serde::{Deserialize, Serialize};
use tracing::info;

use crate::points::Points;
use crate::state::{Address, OutcomeId, Selection};

/// Events emitted by committed transactions, in commit order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SettlementEvent {
    ParticipantRegistered {
        participant: Address,
        name: String,
    },
    ParticipantWithdrawn {
        participant: Address,
        amount: u64,
    },
    /// `prediction` is `None` for sealed bets.
    BetPlaced {
        participant: Address,
        outcome_id: OutcomeId,
        prediction: Option<Selection>,
    },
    ResultsProcessed {
        outcome_id: OutcomeId,
        result: Selection,
    },
    /// Plain path only.
    PointsAwarded {
        participant: Address,
        outcome_id: OutcomeId,
        points: Points,
    },
    LeaderboardUpdated {
        entries: usize,
    },
    DecryptionRequested {
        requests: usize,
    },
    PrizePaid {
        participant: Address,
        amount: u64,
        rank: u32,
    },
    TournamentFinalized {
        platform_fee: u64,
        remainder: u64,
    },
    TournamentCancelled {
        reason: String,
    },
    RefundClaimed {
        participant: Address,
        amount: u64,
    },
    PrizeClaimed {
        participant: Address,
        amount: u64,
    },
}

impl SettlementEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SettlementEvent::ParticipantRegistered { .. } => "ParticipantRegistered",
            SettlementEvent::ParticipantWithdrawn { .. } => "ParticipantWithdrawn",
            SettlementEvent::BetPlaced { .. } => "BetPlaced",
            SettlementEvent::ResultsProcessed { .. } => "ResultsProcessed",
            SettlementEvent::PointsAwarded { .. } => "PointsAwarded",
            SettlementEvent::LeaderboardUpdated { .. } => "LeaderboardUpdated",
            SettlementEvent::DecryptionRequested { .. } => "DecryptionRequested",
            SettlementEvent::PrizePaid { .. } => "PrizePaid",
            SettlementEvent::TournamentFinalized { .. } => "TournamentFinalized",
            SettlementEvent::TournamentCancelled { .. } => "TournamentCancelled",
            SettlementEvent::RefundClaimed { .. } => "RefundClaimed",
            SettlementEvent::PrizeClaimed { .. } => "PrizeClaimed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub sequence: u64,
    pub timestamp: i64,
    pub event: SettlementEvent,
}

/// Append-only event log.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    records: Vec<EventRecord>,
}

impl EventLog {
    pub(crate) fn append(&mut self, timestamp: i64, events: Vec<SettlementEvent>) {
        for event in events {
            let sequence = self.records.len() as u64;
            info!(sequence, event = event.name(), "{:?}", event);
            self.records.push(EventRecord {
                sequence,
                timestamp,
                event,
            });
        }
    }

    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    /// Records with `sequence >= from`.
    pub fn since(&self, from: u64) -> &[EventRecord] {
        let start = (from as usize).min(self.records.len());
        &self.records[start..]
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
