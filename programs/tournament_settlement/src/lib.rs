//! Settlement program for prediction tournaments.
//!
//! A [`Tournament`] escrows entry fees, accepts one prediction per participant
//! per outcome, scores outcomes once their results are published, and splits
//! the pool by leaderboard rank. Predictions and totals may be sealed behind
//! an [`FheEngine`], in which case totals are revealed through a
//! [`DecryptionOracle`] before settlement.
//!
//! Every entry point is one transaction: it runs against a draft of the
//! state and commits, together with its events, only if it succeeds.

/// Returns `Err($err)` from the enclosing function unless `$cond` holds.
#[macro_export]
macro_rules! require {
    ($cond:expr, $err:expr $(,)?) => {
        if !($cond) {
            return Err($err);
        }
    };
}

pub mod confidential;
pub mod constants;
pub mod context;
pub mod errors;
pub mod events;
pub mod instructions;
pub mod leaderboard;
pub mod ledger;
pub mod oracle;
pub mod outcome_source;
pub mod points;
pub mod prize;
pub mod scoring;
pub mod state;

pub use confidential::{ClearTextEngine, Encrypted, EncryptedBool, EncryptedU64, FheEngine, FheError};
pub use context::Context;
pub use errors::{ErrorCategory, Result, SettlementError};
pub use events::{EventLog, EventRecord, SettlementEvent};
pub use instructions::Settlement;
pub use ledger::{Credit, EscrowLedger};
pub use oracle::{CallbackOracle, DecryptionOracle, DecryptionTicket, OracleError, RequestId};
pub use outcome_source::{CatalogError, Outcome, OutcomeCatalog, OutcomeShape, OutcomeSource};
pub use points::Points;
pub use prize::{Allocation, PrizeAward};
pub use state::*;

use tracing::{info, warn};

/// One tournament instance: its state plus the log of committed events.
#[derive(Debug, Clone)]
pub struct Tournament {
    state: SettlementState,
    log: EventLog,
}

impl Tournament {
    /// Deploys a tournament. Confidential tournaments need the compute
    /// backend once here to seal their public constants.
    pub fn new(config: TournamentConfig, fhe: Option<&mut dyn FheEngine>) -> Result<Self> {
        config.check_executable()?;
        let sealed = match config.privacy {
            Privacy::Public => None,
            Privacy::Confidential => {
                let fhe = fhe.ok_or(SettlementError::ConfidentialBackendRequired)?;
                Some(SealedConstants::encrypt(fhe))
            }
        };

        info!(
            admin = %config.admin,
            entry_fee = config.entry_fee,
            outcomes = config.outcome_ids.len(),
            privacy = ?config.privacy,
            "tournament deployed"
        );
        Ok(Self {
            state: SettlementState::new(config, sealed),
            log: EventLog::default(),
        })
    }

    fn transact<'a, T, F>(&mut self, op: &'static str, mut ctx: Context<'a>, handler: F) -> Result<T>
    where
        F: FnOnce(&mut SettlementState, &mut Context<'a>) -> Result<T>,
    {
        let mut draft = self.state.clone();
        draft.pending_events.clear();
        draft.sync_clock(ctx.now, ctx.outcomes.start_time());

        match handler(&mut draft, &mut ctx) {
            Ok(value) => {
                let events = std::mem::take(&mut draft.pending_events);
                self.state = draft;
                self.log.append(ctx.now, events);
                Ok(value)
            }
            Err(e) => {
                warn!(op, signer = %ctx.signer, error = %e, "transaction rejected");
                Err(e)
            }
        }
    }

    pub fn register(&mut self, ctx: Context<'_>, name: &str, fee: u64) -> Result<()> {
        self.transact("register", ctx, |state, ctx| {
            instructions::register::handler(state, ctx, name, fee)
        })
    }

    /// Returns the refunded amount, now claimable.
    pub fn withdraw(&mut self, ctx: Context<'_>) -> Result<u64> {
        self.transact("withdraw", ctx, instructions::withdraw::handler)
    }

    pub fn place_bet(
        &mut self,
        ctx: Context<'_>,
        outcome_id: OutcomeId,
        prediction: Prediction,
    ) -> Result<()> {
        self.transact("place_bet", ctx, |state, ctx| {
            instructions::place_bet::handler(state, ctx, outcome_id, prediction)
        })
    }

    pub fn process_results(&mut self, ctx: Context<'_>, outcome_id: OutcomeId) -> Result<()> {
        self.transact("process_results", ctx, |state, ctx| {
            instructions::process_results::handler(state, ctx, outcome_id)
        })
    }

    /// Returns the number of decryption requests issued.
    pub fn request_points_decryption(&mut self, ctx: Context<'_>) -> Result<usize> {
        self.transact(
            "request_points_decryption",
            ctx,
            instructions::request_decryption::handler,
        )
    }

    pub fn finalize_and_distribute(&mut self, ctx: Context<'_>) -> Result<Settlement> {
        self.transact("finalize_and_distribute", ctx, instructions::finalize::handler)
    }

    pub fn cancel(&mut self, ctx: Context<'_>, reason: &str) -> Result<()> {
        self.transact("cancel", ctx, |state, ctx| {
            instructions::cancel::handler(state, ctx, reason)
        })
    }

    pub fn abort_decryption(&mut self, ctx: Context<'_>, reason: &str) -> Result<()> {
        self.transact("abort_decryption", ctx, |state, ctx| {
            instructions::abort_decryption::handler(state, ctx, reason)
        })
    }

    /// Returns the amount paid out.
    pub fn claim(&mut self, ctx: Context<'_>) -> Result<u64> {
        self.transact("claim", ctx, instructions::claim::handler)
    }

    pub fn prize_pool(&self) -> u64 {
        self.state.ledger.total_prize_pool()
    }

    pub fn participant_count(&self) -> u32 {
        self.state.participant_count
    }

    pub fn participant(&self, address: &Address) -> Option<&Participant> {
        self.state.participants.get(address)
    }

    /// Plain total, or the revealed total once a confidential tournament has
    /// been finalized. `None` while the total is still sealed.
    pub fn points_of(&self, address: &Address) -> Option<Points> {
        if let Some(points) = self.state.decrypted_points.get(address) {
            return Some(*points);
        }
        match self.state.participants.get(address)?.total_points {
            Tally::Open(points) => Some(points),
            Tally::Sealed(_) => None,
        }
    }

    pub fn sealed_total(&self, address: &Address) -> Option<EncryptedU64> {
        match self.state.participants.get(address)?.total_points {
            Tally::Sealed(ciphertext) => Some(ciphertext),
            Tally::Open(_) => None,
        }
    }

    pub fn bet(&self, address: &Address, outcome_id: OutcomeId) -> Option<&Bet> {
        self.state.bets.get(&(*address, outcome_id))
    }

    pub fn leaderboard(&self) -> &Leaderboard {
        &self.state.leaderboard
    }

    pub fn decryption_requested(&self) -> bool {
        self.state.decryption_requested
    }

    pub fn claimable(&self, address: &Address) -> u64 {
        self.state.ledger.claimable(address)
    }

    pub fn phase(&self) -> &Phase {
        &self.state.phase
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    pub fn config(&self) -> &TournamentConfig {
        &self.state.config
    }

    pub fn ledger(&self) -> &EscrowLedger {
        &self.state.ledger
    }

    pub fn state(&self) -> &SettlementState {
        &self.state
    }

    pub fn events(&self) -> &[EventRecord] {
        self.log.records()
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    /// Fund conservation: the vault always covers every credit plus the
    /// unallocated pool; while active the pool is exactly the registered
    /// participants' fees, and once settled nothing is left unallocated.
    pub fn check_conservation(&self) -> Result<()> {
        let ledger = &self.state.ledger;
        ledger.check_conservation()?;

        if self.state.is_active() {
            let expected = (self.state.participant_count as u64)
                .checked_mul(self.state.config.entry_fee)
                .ok_or(SettlementError::ArithmeticOverflow)?;
            require!(
                ledger.total_prize_pool() == expected && ledger.unallocated() == expected,
                SettlementError::ConservationViolated(format!(
                    "pool {} with {} participants at fee {}",
                    ledger.total_prize_pool(),
                    self.state.participant_count,
                    self.state.config.entry_fee
                ))
            );
        } else {
            require!(
                ledger.unallocated() == 0,
                SettlementError::ConservationViolated(format!(
                    "{} left unallocated after settlement",
                    ledger.unallocated()
                ))
            );
        }
        Ok(())
    }
}
