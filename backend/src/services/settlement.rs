use crate::clock::Clock;
use crate::engine::ComputeEngine;
use crate::error::{option_to_result, AppError, AppResult};
use crate::services::audit::AuditTrail;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tournament_settlement::{
    Address, CallbackOracle, Context, EncryptedU64, EventRecord,
    OutcomeCatalog, OutcomeId, OutcomeSource, Prediction, Privacy, RequestId, Selection, Settlement,
    SettlementError, Tournament, TournamentConfig,
};
use tracing::{debug, error, info};

/// Decimal places of one whole unit of the entry-fee asset
pub const AMOUNT_DECIMALS: u32 = 9;

/// Base units rendered as a decimal amount
pub fn to_amount(base_units: u64) -> Decimal {
    Decimal::from_i128_with_scale(base_units as i128, AMOUNT_DECIMALS).normalize()
}

/// Deployment file: constructor parameters plus the outcome registry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TournamentDefinition {
    pub config: TournamentConfig,
    pub outcomes: OutcomeCatalog,
}

impl TournamentDefinition {
    pub fn load(path: &Path) -> AppResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Factory-side checks before deployment
    pub fn validate(&self) -> AppResult<()> {
        self.config.validate()?;
        if self.outcomes.start_time >= self.outcomes.end_time {
            return Err(AppError::Validation(
                "outcome registry must start before it ends".to_string(),
            ));
        }
        for id in &self.config.outcome_ids {
            if self.outcomes.outcome(*id).is_none() {
                return Err(AppError::Validation(format!(
                    "outcome {} missing from the registry",
                    id
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantView {
    pub address: Address,
    pub name: String,
    pub registered: bool,
    /// `None` while the total is sealed
    pub points: Option<Decimal>,
    pub claimable: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandingView {
    pub rank: u32,
    pub participant: Address,
    pub points: Decimal,
}

/// Read-only view of a tournament for operators and logs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TournamentSnapshot {
    pub phase: String,
    pub active: bool,
    pub participant_count: u32,
    pub prize_pool: Decimal,
    pub vault: Decimal,
    pub total_paid: Decimal,
    pub decryption_requested: bool,
    pub scored_outcomes: usize,
    pub required_outcomes: usize,
    pub participants: Vec<ParticipantView>,
    pub leaderboard: Vec<StandingView>,
    pub events: usize,
}

/// The tournament together with the collaborators the host runs for it
struct Host {
    tournament: Tournament,
    catalog: OutcomeCatalog,
    fhe: ComputeEngine,
    oracle: CallbackOracle,
    /// Events already handed to the audit trail
    audited: u64,
}

/// Serializes every operation on one tournament behind a single lock
pub struct SettlementService {
    host: Mutex<Host>,
    clock: Arc<dyn Clock>,
    audit: Option<Arc<AuditTrail>>,
}

impl SettlementService {
    /// Validate and deploy a tournament definition on the development engine
    pub fn deploy(definition: TournamentDefinition, clock: Arc<dyn Clock>) -> AppResult<Self> {
        Self::deploy_with_engine(definition, clock, ComputeEngine::development())
    }

    pub fn deploy_with_engine(
        definition: TournamentDefinition,
        clock: Arc<dyn Clock>,
        mut fhe: ComputeEngine,
    ) -> AppResult<Self> {
        definition.validate()?;

        let tournament = Tournament::new(definition.config, Some(fhe.engine()))?;
        info!(engine = ?fhe, "tournament constructed");

        Ok(Self {
            host: Mutex::new(Host {
                tournament,
                catalog: definition.outcomes,
                fhe,
                oracle: CallbackOracle::new(),
                audited: 0,
            }),
            clock,
            audit: None,
        })
    }

    /// Mirror committed events into an audit trail
    pub fn with_audit(mut self, audit: Arc<AuditTrail>) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn now(&self) -> i64 {
        self.clock.now()
    }

    async fn execute<T, F>(&self, signer: Address, op: F) -> AppResult<T>
    where
        T: Send,
        F: FnOnce(&mut Tournament, Context<'_>) -> Result<T, SettlementError> + Send,
    {
        let mut host = self.host.lock().await;
        let now = self.clock.now();

        let result = {
            let Host {
                tournament,
                catalog,
                fhe,
                oracle,
                ..
            } = &mut *host;
            let ctx = Context::new(signer, now, &*catalog)
                .with_fhe(fhe.engine())
                .with_oracle(oracle);
            op(tournament, ctx)
        };

        // State is already committed; unflushed events stay behind the cursor
        if let Err(e) = self.flush_audit(&mut host).await {
            error!(
                backlog = host.tournament.log().since(host.audited).len(),
                error = %e,
                "audit append failed"
            );
        }
        Ok(result?)
    }

    /// Committed events not yet in the audit trail
    pub async fn audit_backlog(&self) -> usize {
        let host = self.host.lock().await;
        host.tournament.log().since(host.audited).len()
    }

    /// Retry handing the backlog to the audit trail
    pub async fn flush_audit_backlog(&self) -> AppResult<()> {
        let mut host = self.host.lock().await;
        self.flush_audit(&mut host).await
    }

    async fn flush_audit(&self, host: &mut Host) -> AppResult<()> {
        let records: Vec<EventRecord> = host.tournament.log().since(host.audited).to_vec();
        if records.is_empty() {
            return Ok(());
        }
        if let Some(audit) = &self.audit {
            audit.append(&records).await?;
        }
        host.audited += records.len() as u64;
        Ok(())
    }

    pub async fn register(&self, who: Address, name: &str, fee: u64) -> AppResult<()> {
        self.execute(who, |t, ctx| t.register(ctx, name, fee)).await?;
        info!(%who, name, "participant registered");
        Ok(())
    }

    pub async fn withdraw(&self, who: Address) -> AppResult<u64> {
        self.execute(who, |t, ctx| t.withdraw(ctx)).await
    }

    pub async fn place_bet(&self, who: Address, outcome_id: OutcomeId, selection: Selection) -> AppResult<()> {
        self.execute(who, move |t, ctx| {
            t.place_bet(ctx, outcome_id, Prediction::Open(selection))
        })
        .await
    }

    pub async fn place_sealed_bet(
        &self,
        who: Address,
        outcome_id: OutcomeId,
        ciphertext: EncryptedU64,
    ) -> AppResult<()> {
        self.execute(who, move |t, ctx| {
            t.place_bet(ctx, outcome_id, Prediction::Sealed(ciphertext))
        })
        .await
    }

    /// Client-side encryption stand-in for the development engine
    pub async fn encrypt_prediction(&self, option: u64) -> AppResult<EncryptedU64> {
        let mut host = self.host.lock().await;
        if !host.fhe.is_development() {
            return Err(AppError::Validation(
                "predictions are encrypted client-side on this engine".to_string(),
            ));
        }
        Ok(host.fhe.engine().encrypt(option))
    }

    pub async fn uses_development_engine(&self) -> bool {
        self.host.lock().await.fhe.is_development()
    }

    pub async fn is_confidential(&self) -> bool {
        self.host.lock().await.tournament.config().privacy == Privacy::Confidential
    }

    /// Development stand-in for the external registry publishing a result
    pub async fn publish_result(&self, outcome_id: OutcomeId, result: Selection) -> AppResult<()> {
        let mut host = self.host.lock().await;
        host.catalog
            .publish_result(outcome_id, result)
            .map_err(|e| AppError::Validation(e.to_string()))?;
        info!(outcome_id, "result published");
        Ok(())
    }

    pub async fn process_results(&self, who: Address, outcome_id: OutcomeId) -> AppResult<()> {
        self.execute(who, |t, ctx| t.process_results(ctx, outcome_id)).await
    }

    pub async fn request_points_decryption(&self, who: Address) -> AppResult<usize> {
        self.execute(who, |t, ctx| t.request_points_decryption(ctx)).await
    }

    pub async fn finalize_and_distribute(&self, who: Address) -> AppResult<Settlement> {
        self.execute(who, |t, ctx| t.finalize_and_distribute(ctx)).await
    }

    pub async fn cancel(&self, who: Address, reason: &str) -> AppResult<()> {
        self.execute(who, |t, ctx| t.cancel(ctx, reason)).await
    }

    pub async fn abort_decryption(&self, who: Address, reason: &str) -> AppResult<()> {
        self.execute(who, |t, ctx| t.abort_decryption(ctx, reason)).await
    }

    pub async fn claim(&self, who: Address) -> AppResult<u64> {
        let amount = self.execute(who, |t, ctx| t.claim(ctx)).await?;
        info!(%who, amount = %to_amount(amount), "claim paid");
        Ok(amount)
    }

    /// Decryption requests the oracle has not answered yet, with the
    /// serialized ciphertext the key holder needs
    pub async fn pending_decryptions(&self) -> AppResult<Vec<(RequestId, Vec<u8>)>> {
        let host = self.host.lock().await;
        host.oracle
            .pending()
            .into_iter()
            .map(|(request, ciphertext)| -> AppResult<(RequestId, Vec<u8>)> {
                let bytes = host
                    .fhe
                    .export(&ciphertext)
                    .map_err(|e| AppError::Settlement(e.into()))?;
                Ok((request, bytes))
            })
            .collect()
    }

    /// Oracle callback with a revealed plaintext
    pub async fn fulfill_decryption(&self, request: RequestId, value: u64) -> AppResult<()> {
        let mut host = self.host.lock().await;
        host.oracle
            .fulfill(request, value)
            .map_err(|e| AppError::Settlement(e.into()))?;
        debug!(%request, "decryption fulfilled");
        Ok(())
    }

    /// Answers every pending request from the development engine
    pub async fn reveal_locally(&self) -> AppResult<usize> {
        let mut host = self.host.lock().await;
        let Host { fhe, oracle, .. } = &mut *host;
        fhe.reveal_into(oracle).ok_or_else(|| {
            AppError::Validation("this engine can only be revealed by the gateway".to_string())
        })
    }

    pub async fn admin(&self) -> Address {
        self.host.lock().await.tournament.config().admin
    }

    pub async fn check_conservation(&self) -> AppResult<()> {
        Ok(self.host.lock().await.tournament.check_conservation()?)
    }

    pub async fn participant(&self, who: &Address) -> AppResult<ParticipantView> {
        let snapshot = self.snapshot().await;
        option_to_result(
            snapshot.participants.into_iter().find(|p| &p.address == who),
            &format!("participant {}", who),
        )
    }

    pub async fn snapshot(&self) -> TournamentSnapshot {
        let host = self.host.lock().await;
        let t = &host.tournament;

        let participants = t
            .state()
            .participants
            .values()
            .map(|p| ParticipantView {
                address: p.address,
                name: p.name.clone(),
                registered: p.registered,
                points: t.points_of(&p.address).map(|points| points.to_decimal()),
                claimable: to_amount(t.claimable(&p.address)),
            })
            .collect();

        let leaderboard = t
            .leaderboard()
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| StandingView {
                rank: i as u32 + 1,
                participant: entry.participant,
                points: entry.points.to_decimal(),
            })
            .collect();

        TournamentSnapshot {
            phase: t.phase().name().to_string(),
            active: t.is_active(),
            participant_count: t.participant_count(),
            prize_pool: to_amount(t.prize_pool()),
            vault: to_amount(t.ledger().vault()),
            total_paid: to_amount(t.ledger().total_paid()),
            decryption_requested: t.decryption_requested(),
            scored_outcomes: t.state().scored_outcomes.len(),
            required_outcomes: t.config().outcome_ids.len(),
            participants,
            leaderboard,
            events: t.events().len(),
        }
    }
}
