use thiserror::Error;

use crate::confidential::FheError;
use crate::oracle::OracleError;
use crate::state::{Address, OutcomeId};

/// Rejections raised by the settlement program. Every error aborts the whole
/// transaction; no partial state is committed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettlementError {
    #[error("Unauthorized: only the admin can perform this action")]
    Unauthorized,

    #[error("Tournament is no longer active")]
    TournamentInactive,

    #[error("Tournament has not started yet")]
    TournamentNotStarted,

    #[error("Registration is closed")]
    RegistrationClosed,

    #[error("Withdrawals are closed")]
    WithdrawalClosed,

    #[error("Caller is already registered")]
    AlreadyRegistered,

    #[error("Caller is not a registered participant")]
    NotRegistered,

    #[error("Incorrect entry fee: expected {expected}, provided {provided}")]
    IncorrectEntryFee { expected: u64, provided: u64 },

    #[error("Name already taken: {0}")]
    NameAlreadyTaken(String),

    #[error("Invalid participant name (1 to 50 characters)")]
    InvalidName,

    #[error("Participant limit of {0} reached")]
    ParticipantLimitReached(u32),

    #[error("Cannot withdraw once bets have been placed")]
    BetsAlreadyPlaced,

    #[error("Unknown outcome {0}")]
    UnknownOutcome(OutcomeId),

    #[error("Betting window closed for outcome {0}")]
    BettingWindowClosed(OutcomeId),

    #[error("Bets are no longer accepted in this phase")]
    BettingClosed,

    #[error("Invalid prediction: {0}")]
    InvalidPrediction(String),

    #[error("Prediction or result shape does not match the scoring rule")]
    ShapeMismatch,

    #[error("Plain and sealed values cannot be mixed in this tournament")]
    PrivacyMismatch,

    #[error("Not enough participants: {actual} registered, {required} required")]
    NotEnoughParticipants { required: u32, actual: u32 },

    #[error("Outcome {0} already scored")]
    AlreadyScored(OutcomeId),

    #[error("Results not published for outcome {0}")]
    ResultsNotPublished(OutcomeId),

    #[error("Outcomes not fully scored: {scored} of {required}")]
    OutcomesNotScored { scored: usize, required: usize },

    #[error("Tournament is not confidential")]
    NotConfidential,

    #[error("Points decryption already requested")]
    DecryptionAlreadyRequested,

    #[error("Points decryption not requested")]
    DecryptionNotRequested,

    #[error("Decryption not ready for participant {0}")]
    DecryptionNotReady(Address),

    #[error("Outcome source is still open")]
    OutcomeSourceOpen,

    #[error("Decryption escape hatch is disabled")]
    EscapeHatchDisabled,

    #[error("Decryption timeout has not elapsed")]
    DecryptionTimeoutNotElapsed,

    #[error("Claims are only possible once the tournament is inactive")]
    ClaimWhileActive,

    #[error("No balance to claim")]
    NoBalanceToClaim,

    #[error("Insufficient vault balance: needed {needed}, available {available}")]
    InsufficientVaultBalance { needed: u64, available: u64 },

    #[error("Invalid prize distribution")]
    InvalidPrizeDistribution,

    #[error("Unsupported configuration: {0}")]
    UnsupportedConfiguration(String),

    #[error("Confidential compute backend required")]
    ConfidentialBackendRequired,

    #[error("Decryption oracle required")]
    OracleRequired,

    #[error("Arithmetic overflow")]
    ArithmeticOverflow,

    #[error("Conservation violated: {0}")]
    ConservationViolated(String),

    #[error("Confidential compute error: {0}")]
    Fhe(#[from] FheError),

    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),
}

/// Result type alias for program operations
pub type Result<T> = std::result::Result<T, SettlementError>;

/// Error categories used by calling infrastructure to decide what to do
/// with a rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Authorization,
    Phase,
    Validation,
    Threshold,
    ConfidentialReveal,
    FundInvariant,
    Integration,
}

impl SettlementError {
    pub fn category(&self) -> ErrorCategory {
        use SettlementError::*;
        match self {
            Unauthorized => ErrorCategory::Authorization,
            TournamentInactive
            | TournamentNotStarted
            | RegistrationClosed
            | WithdrawalClosed
            | BetsAlreadyPlaced
            | BettingWindowClosed(_)
            | BettingClosed
            | AlreadyScored(_)
            | ResultsNotPublished(_)
            | OutcomesNotScored { .. }
            | OutcomeSourceOpen
            | ClaimWhileActive => ErrorCategory::Phase,
            AlreadyRegistered
            | NotRegistered
            | IncorrectEntryFee { .. }
            | NameAlreadyTaken(_)
            | InvalidName
            | UnknownOutcome(_)
            | InvalidPrediction(_)
            | ShapeMismatch
            | PrivacyMismatch
            | InvalidPrizeDistribution
            | UnsupportedConfiguration(_) => ErrorCategory::Validation,
            NotEnoughParticipants { .. } | ParticipantLimitReached(_) => ErrorCategory::Threshold,
            NotConfidential
            | DecryptionAlreadyRequested
            | DecryptionNotRequested
            | DecryptionNotReady(_)
            | EscapeHatchDisabled
            | DecryptionTimeoutNotElapsed => ErrorCategory::ConfidentialReveal,
            NoBalanceToClaim
            | InsufficientVaultBalance { .. }
            | ArithmeticOverflow
            | ConservationViolated(_) => ErrorCategory::FundInvariant,
            ConfidentialBackendRequired | OracleRequired | Fhe(_) | Oracle(_) => {
                ErrorCategory::Integration
            }
        }
    }

    /// Whether the same call may succeed later without any other state change.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SettlementError::DecryptionNotReady(_))
    }
}
