//! gRPC surface for the settlement host
//!
//! Every RPC maps onto one `SettlementService` operation. The proto
//! definitions are compiled at build time via build.rs.

use crate::error::AppError;
use crate::services::settlement::{
    to_amount, ParticipantView, SettlementService, StandingView, TournamentSnapshot,
};
use std::sync::Arc;
use tonic::{Request, Response, Status};
use tournament_settlement::{
    Address, EncryptedU64, ErrorCategory, PrizeAward, Selection, Settlement,
};
use tracing::{error, info};

// Include the generated proto code
pub mod proto {
    tonic::include_proto!("settlement");

    /// File descriptor set for gRPC reflection
    pub const FILE_DESCRIPTOR_SET: &[u8] =
        include_bytes!(concat!(env!("OUT_DIR"), "/settlement_descriptor.bin"));
}

use proto::settlement_service_server::{SettlementService as SettlementRpc, SettlementServiceServer};
use proto::{
    selection, settlement_response, Ack, AmountResponse, Award, DecryptionResponse, Distribution,
    EncryptPredictionRequest, EncryptPredictionResponse, ParticipantResponse, PlaceBetRequest,
    PlaceSealedBetRequest, ProcessResultsRequest, PublishResultRequest, RankedSelection,
    ReasonRequest, RegisterRequest, RegisterResponse, SettlementResponse, SignerRequest,
    SnapshotRequest, SnapshotResponse, Standing,
};

/// gRPC service implementation
pub struct SettlementGrpcService {
    service: Arc<SettlementService>,
    /// Serve EncryptPrediction and PublishResult
    development_rpcs: bool,
}

impl SettlementGrpcService {
    pub fn new(service: Arc<SettlementService>) -> Self {
        Self {
            service,
            development_rpcs: false,
        }
    }

    pub fn with_development_rpcs(mut self, enabled: bool) -> Self {
        self.development_rpcs = enabled;
        self
    }

    /// Create a tonic server for this service
    pub fn into_server(self) -> SettlementServiceServer<Self> {
        SettlementServiceServer::new(self)
    }

    /// Convert AppError to tonic Status
    pub fn to_status(err: AppError) -> Status {
        match &err {
            AppError::Settlement(e) if e.is_retryable() => Status::unavailable(err.to_string()),
            AppError::Settlement(e) => match e.category() {
                ErrorCategory::Authorization => Status::permission_denied(err.to_string()),
                ErrorCategory::Validation => Status::invalid_argument(err.to_string()),
                ErrorCategory::Phase
                | ErrorCategory::Threshold
                | ErrorCategory::ConfidentialReveal => Status::failed_precondition(err.to_string()),
                ErrorCategory::FundInvariant | ErrorCategory::Integration => {
                    error!("Settlement failure: {:?}", err);
                    Status::internal(err.to_string())
                }
            },
            AppError::Validation(msg) => Status::invalid_argument(msg.clone()),
            AppError::NotFound(msg) => Status::not_found(msg.clone()),
            AppError::Http(_) | AppError::Gateway(_) => Status::unavailable(err.to_string()),
            _ => {
                error!("Internal error: {:?}", err);
                Status::internal("Internal server error")
            }
        }
    }

    fn parse_address(s: &str, field_name: &str) -> Result<Address, Status> {
        s.parse()
            .map_err(|_| Status::invalid_argument(format!("Invalid {}: {}", field_name, s)))
    }

    fn parse_selection(selection: Option<proto::Selection>) -> Result<Selection, Status> {
        match selection.and_then(|s| s.kind) {
            Some(selection::Kind::Single(option)) => Ok(Selection::Single(option)),
            Some(selection::Kind::Ranked(RankedSelection { options })) => {
                Ok(Selection::Ranked(options))
            }
            None => Err(Status::invalid_argument("selection is required")),
        }
    }

    fn require_development(&self, rpc: &str) -> Result<(), Status> {
        if self.development_rpcs {
            Ok(())
        } else {
            Err(Status::unimplemented(format!(
                "{} is only served in development",
                rpc
            )))
        }
    }
}

fn amount_response(amount: u64) -> AmountResponse {
    AmountResponse {
        amount,
        amount_display: to_amount(amount).to_string(),
    }
}

impl From<ParticipantView> for ParticipantResponse {
    fn from(view: ParticipantView) -> Self {
        Self {
            address: view.address.to_string(),
            name: view.name,
            registered: view.registered,
            points: view.points.map(|p| p.to_string()).unwrap_or_default(),
            claimable: view.claimable.to_string(),
        }
    }
}

impl From<StandingView> for Standing {
    fn from(view: StandingView) -> Self {
        Self {
            rank: view.rank,
            participant: view.participant.to_string(),
            points: view.points.to_string(),
        }
    }
}

impl From<TournamentSnapshot> for SnapshotResponse {
    fn from(snapshot: TournamentSnapshot) -> Self {
        Self {
            phase: snapshot.phase,
            active: snapshot.active,
            participant_count: snapshot.participant_count,
            prize_pool: snapshot.prize_pool.to_string(),
            vault: snapshot.vault.to_string(),
            total_paid: snapshot.total_paid.to_string(),
            decryption_requested: snapshot.decryption_requested,
            scored_outcomes: snapshot.scored_outcomes as u32,
            required_outcomes: snapshot.required_outcomes as u32,
            participants: snapshot.participants.into_iter().map(Into::into).collect(),
            leaderboard: snapshot.leaderboard.into_iter().map(Into::into).collect(),
            events: snapshot.events as u64,
        }
    }
}

impl From<Settlement> for SettlementResponse {
    fn from(settlement: Settlement) -> Self {
        let outcome = match settlement {
            Settlement::Distributed(allocation) => {
                settlement_response::Outcome::Distributed(Distribution {
                    total_pool: allocation.total_pool,
                    platform_fee: allocation.platform_fee,
                    winner_pool: allocation.winner_pool,
                    awards: allocation.awards.iter().map(award).collect(),
                    remainder: allocation.remainder,
                })
            }
            Settlement::Cancelled { reason } => {
                settlement_response::Outcome::CancelledReason(reason)
            }
        };
        Self {
            outcome: Some(outcome),
        }
    }
}

fn award(prize: &PrizeAward) -> Award {
    Award {
        rank: prize.rank,
        participant: prize.participant.to_string(),
        amount: prize.amount,
    }
}

#[tonic::async_trait]
impl SettlementRpc for SettlementGrpcService {
    async fn register(
        &self,
        request: Request<RegisterRequest>,
    ) -> Result<Response<RegisterResponse>, Status> {
        let req = request.into_inner();
        let signer = Self::parse_address(&req.signer, "signer")?;

        self.service
            .register(signer, &req.name, req.fee)
            .await
            .map_err(Self::to_status)?;

        let participant_count = self.service.snapshot().await.participant_count;
        Ok(Response::new(RegisterResponse { participant_count }))
    }

    async fn withdraw(
        &self,
        request: Request<SignerRequest>,
    ) -> Result<Response<AmountResponse>, Status> {
        let signer = Self::parse_address(&request.into_inner().signer, "signer")?;
        let amount = self.service.withdraw(signer).await.map_err(Self::to_status)?;
        info!(%signer, amount, "withdrawal refunded");
        Ok(Response::new(amount_response(amount)))
    }

    async fn place_bet(&self, request: Request<PlaceBetRequest>) -> Result<Response<Ack>, Status> {
        let req = request.into_inner();
        let signer = Self::parse_address(&req.signer, "signer")?;
        let selection = Self::parse_selection(req.selection)?;

        self.service
            .place_bet(signer, req.outcome_id, selection)
            .await
            .map_err(Self::to_status)?;
        Ok(Response::new(Ack {}))
    }

    async fn place_sealed_bet(
        &self,
        request: Request<PlaceSealedBetRequest>,
    ) -> Result<Response<Ack>, Status> {
        let req = request.into_inner();
        let signer = Self::parse_address(&req.signer, "signer")?;

        self.service
            .place_sealed_bet(
                signer,
                req.outcome_id,
                EncryptedU64::from_handle(req.ciphertext_handle),
            )
            .await
            .map_err(Self::to_status)?;
        Ok(Response::new(Ack {}))
    }

    async fn process_results(
        &self,
        request: Request<ProcessResultsRequest>,
    ) -> Result<Response<Ack>, Status> {
        let req = request.into_inner();
        let signer = Self::parse_address(&req.signer, "signer")?;

        self.service
            .process_results(signer, req.outcome_id)
            .await
            .map_err(Self::to_status)?;
        Ok(Response::new(Ack {}))
    }

    async fn request_points_decryption(
        &self,
        request: Request<SignerRequest>,
    ) -> Result<Response<DecryptionResponse>, Status> {
        let signer = Self::parse_address(&request.into_inner().signer, "signer")?;
        let requests = self
            .service
            .request_points_decryption(signer)
            .await
            .map_err(Self::to_status)?;
        Ok(Response::new(DecryptionResponse {
            requests: requests as u32,
        }))
    }

    async fn finalize_and_distribute(
        &self,
        request: Request<SignerRequest>,
    ) -> Result<Response<SettlementResponse>, Status> {
        let signer = Self::parse_address(&request.into_inner().signer, "signer")?;
        let settlement = self
            .service
            .finalize_and_distribute(signer)
            .await
            .map_err(Self::to_status)?;
        Ok(Response::new(settlement.into()))
    }

    async fn cancel(&self, request: Request<ReasonRequest>) -> Result<Response<Ack>, Status> {
        let req = request.into_inner();
        let signer = Self::parse_address(&req.signer, "signer")?;
        self.service
            .cancel(signer, &req.reason)
            .await
            .map_err(Self::to_status)?;
        Ok(Response::new(Ack {}))
    }

    async fn abort_decryption(
        &self,
        request: Request<ReasonRequest>,
    ) -> Result<Response<Ack>, Status> {
        let req = request.into_inner();
        let signer = Self::parse_address(&req.signer, "signer")?;
        self.service
            .abort_decryption(signer, &req.reason)
            .await
            .map_err(Self::to_status)?;
        Ok(Response::new(Ack {}))
    }

    async fn claim(
        &self,
        request: Request<SignerRequest>,
    ) -> Result<Response<AmountResponse>, Status> {
        let signer = Self::parse_address(&request.into_inner().signer, "signer")?;
        let amount = self.service.claim(signer).await.map_err(Self::to_status)?;
        Ok(Response::new(amount_response(amount)))
    }

    async fn get_participant(
        &self,
        request: Request<SignerRequest>,
    ) -> Result<Response<ParticipantResponse>, Status> {
        let who = Self::parse_address(&request.into_inner().signer, "signer")?;
        let view = self.service.participant(&who).await.map_err(Self::to_status)?;
        Ok(Response::new(view.into()))
    }

    async fn get_snapshot(
        &self,
        _request: Request<SnapshotRequest>,
    ) -> Result<Response<SnapshotResponse>, Status> {
        Ok(Response::new(self.service.snapshot().await.into()))
    }

    async fn encrypt_prediction(
        &self,
        request: Request<EncryptPredictionRequest>,
    ) -> Result<Response<EncryptPredictionResponse>, Status> {
        self.require_development("EncryptPrediction")?;
        let ciphertext = self
            .service
            .encrypt_prediction(request.into_inner().option)
            .await
            .map_err(Self::to_status)?;
        Ok(Response::new(EncryptPredictionResponse {
            ciphertext_handle: ciphertext.handle(),
        }))
    }

    async fn publish_result(
        &self,
        request: Request<PublishResultRequest>,
    ) -> Result<Response<Ack>, Status> {
        self.require_development("PublishResult")?;
        let req = request.into_inner();
        let result = Self::parse_selection(req.result)?;
        self.service
            .publish_result(req.outcome_id, result)
            .await
            .map_err(Self::to_status)?;
        Ok(Response::new(Ack {}))
    }
}
