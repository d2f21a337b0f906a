use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::confidential::{EncryptedU64, FheEngine};
use crate::constants::*;
use crate::errors::{Result, SettlementError};
use crate::events::SettlementEvent;
use crate::ledger::EscrowLedger;
use crate::oracle::DecryptionTicket;
use crate::points::Points;

pub type OutcomeId = u32;

/// 20-byte account identifier.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; 20]);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid address: {0}")]
pub struct AddressParseError(String);

impl Address {
    pub const fn new(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }

    /// Last 20 bytes of keccak256(seed).
    pub fn derive(seed: &str) -> Self {
        let digest = Keccak256::digest(seed.as_bytes());
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest[12..]);
        Address(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let raw = s.strip_prefix("0x").unwrap_or(s);
        let decoded = hex::decode(raw).map_err(|_| AddressParseError(s.to_string()))?;
        let bytes: [u8; 20] = decoded
            .try_into()
            .map_err(|_| AddressParseError(s.to_string()))?;
        Ok(Address(bytes))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A prediction or a published result: one option index, or an ordered list
/// of option indices (top-N).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    Single(u32),
    Ranked(Vec<u32>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScoringRule {
    /// One point for the right option.
    Equality,
    /// Exact/partial slot scoring with a percentage bonus on the subtotal.
    Rank { bonus_percent: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Privacy {
    Public,
    Confidential,
}

/// Constructor parameters supplied by the deploying layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentConfig {
    pub admin: Address,
    /// Fee recipient (the platform/factory account).
    pub platform: Address,
    pub description: String,
    pub entry_fee: u64,
    pub prize_distribution: Vec<u64>,
    pub closing_window_secs: i64,
    #[serde(default)]
    pub min_participants: u32,
    #[serde(default = "default_max_participants")]
    pub max_participants: u32,
    /// Outcomes that must all be scored before settlement.
    pub outcome_ids: Vec<OutcomeId>,
    pub scoring: ScoringRule,
    pub privacy: Privacy,
    #[serde(default = "default_fee_bps")]
    pub fee_bps: u64,
    /// Escape hatch for a stuck decryption oracle; `None` disables it.
    #[serde(default)]
    pub decryption_timeout_secs: Option<i64>,
}

fn default_max_participants() -> u32 {
    DEFAULT_MAX_PARTICIPANTS
}

fn default_fee_bps() -> u64 {
    DEFAULT_FEE_BPS
}

impl TournamentConfig {
    /// Cross-field checks performed by the deploying layer before a
    /// tournament is created.
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: &str| Err(SettlementError::UnsupportedConfiguration(msg.to_string()));

        if self.description.trim().is_empty() || self.description.len() > MAX_DESCRIPTION_LEN {
            return fail("description must be 1 to 500 characters");
        }
        let weight_total = self
            .prize_distribution
            .iter()
            .try_fold(0u64, |acc, w| acc.checked_add(*w));
        if !matches!(weight_total, Some(total) if total > 0) {
            return Err(SettlementError::InvalidPrizeDistribution);
        }
        if self.outcome_ids.is_empty() {
            return fail("at least one outcome is required");
        }
        let unique: BTreeSet<_> = self.outcome_ids.iter().collect();
        if unique.len() != self.outcome_ids.len() {
            return fail("duplicate outcome ids");
        }
        if self.closing_window_secs < 0 {
            return fail("closing window must not be negative");
        }
        if self.fee_bps > FEE_DENOMINATOR {
            return fail("fee exceeds 100%");
        }
        if self.max_participants == 0 || self.min_participants > self.max_participants {
            return fail("participant bounds are inconsistent");
        }
        if matches!(self.scoring, ScoringRule::Rank { bonus_percent } if bonus_percent > MAX_BONUS_PERCENT) {
            return fail("rank bonus exceeds 1000%");
        }
        if matches!(self.decryption_timeout_secs, Some(t) if t <= 0) {
            return fail("decryption timeout must be positive");
        }
        self.check_executable()
    }

    /// The subset of checks the engine itself depends on.
    pub(crate) fn check_executable(&self) -> Result<()> {
        if self.privacy == Privacy::Confidential && self.scoring != ScoringRule::Equality {
            return Err(SettlementError::UnsupportedConfiguration(
                "confidential tournaments use equality scoring".to_string(),
            ));
        }
        Ok(())
    }
}

/// Settlement phase. `Finalized` and `Cancelled` are terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Registration,
    Active,
    Scoring,
    Decrypting {
        requested_at: i64,
        tickets: Vec<DecryptionTicket>,
    },
    Finalized {
        at: i64,
    },
    Cancelled {
        reason: String,
    },
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Finalized { .. } | Phase::Cancelled { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Phase::Registration => "registration",
            Phase::Active => "active",
            Phase::Scoring => "scoring",
            Phase::Decrypting { .. } => "decrypting",
            Phase::Finalized { .. } => "finalized",
            Phase::Cancelled { .. } => "cancelled",
        }
    }
}

/// Running point total, in the clear or as a ciphertext handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tally {
    Open(Points),
    Sealed(EncryptedU64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub address: Address,
    pub name: String,
    pub registered: bool,
    /// Tie-break key; refreshed when a withdrawn participant registers again.
    pub registration_index: u32,
    pub registered_at: i64,
    pub total_points: Tally,
    pub bets_placed: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prediction {
    Open(Selection),
    Sealed(EncryptedU64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Award {
    Open(Points),
    Sealed(EncryptedU64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bet {
    pub prediction: Prediction,
    pub placed_at: i64,
    pub scored: bool,
    pub points_awarded: Option<Award>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub participant: Address,
    pub points: Points,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leaderboard {
    pub entries: Vec<LeaderboardEntry>,
    pub finalized: bool,
    pub finalized_time: Option<i64>,
}

/// Public constants encrypted once at construction for the sealed path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SealedConstants {
    pub zero: EncryptedU64,
    pub one_point: EncryptedU64,
    pub invalid: EncryptedU64,
}

impl SealedConstants {
    pub fn encrypt(fhe: &mut dyn FheEngine) -> Self {
        Self {
            zero: fhe.encrypt(0),
            one_point: fhe.encrypt(Points::whole(1).hundredths()),
            invalid: fhe.encrypt(INVALID_PREDICTION),
        }
    }
}

/// Everything a tournament owns. Instruction handlers receive it by
/// exclusive reference inside a transaction.
#[derive(Debug, Clone)]
pub struct SettlementState {
    pub config: TournamentConfig,
    pub phase: Phase,
    pub participants: IndexMap<Address, Participant>,
    pub participant_count: u32,
    pub next_registration_index: u32,
    pub bets: BTreeMap<(Address, OutcomeId), Bet>,
    pub scored_outcomes: BTreeSet<OutcomeId>,
    pub ledger: EscrowLedger,
    pub leaderboard: Leaderboard,
    pub sealed: Option<SealedConstants>,
    pub decryption_requested: bool,
    pub decrypted_points: IndexMap<Address, Points>,
    pub(crate) pending_events: Vec<SettlementEvent>,
}

impl SettlementState {
    pub fn new(config: TournamentConfig, sealed: Option<SealedConstants>) -> Self {
        Self {
            config,
            phase: Phase::Registration,
            participants: IndexMap::new(),
            participant_count: 0,
            next_registration_index: 0,
            bets: BTreeMap::new(),
            scored_outcomes: BTreeSet::new(),
            ledger: EscrowLedger::default(),
            leaderboard: Leaderboard::default(),
            sealed,
            decryption_requested: false,
            decrypted_points: IndexMap::new(),
            pending_events: Vec::new(),
        }
    }

    pub(crate) fn emit(&mut self, event: SettlementEvent) {
        self.pending_events.push(event);
    }

    /// Registration closes when the outcome source starts.
    pub(crate) fn sync_clock(&mut self, now: i64, start_time: i64) {
        if self.phase == Phase::Registration && now >= start_time {
            self.phase = Phase::Active;
        }
    }

    pub fn is_active(&self) -> bool {
        !self.phase.is_terminal()
    }

    pub(crate) fn require_active(&self) -> Result<()> {
        if self.is_active() {
            Ok(())
        } else {
            Err(SettlementError::TournamentInactive)
        }
    }

    pub(crate) fn require_admin(&self, signer: Address) -> Result<()> {
        if signer == self.config.admin {
            Ok(())
        } else {
            Err(SettlementError::Unauthorized)
        }
    }

    pub fn is_registered(&self, address: &Address) -> bool {
        self.participants
            .get(address)
            .map(|p| p.registered)
            .unwrap_or(false)
    }

    pub(crate) fn registered_mut(&mut self, address: &Address) -> Result<&mut Participant> {
        self.participants
            .get_mut(address)
            .filter(|p| p.registered)
            .ok_or(SettlementError::NotRegistered)
    }

    /// Registered participants in registration order.
    pub fn registration_order(&self) -> Vec<&Participant> {
        let mut registered: Vec<&Participant> =
            self.participants.values().filter(|p| p.registered).collect();
        registered.sort_by_key(|p| p.registration_index);
        registered
    }

    pub fn all_outcomes_scored(&self) -> bool {
        self.config
            .outcome_ids
            .iter()
            .all(|id| self.scored_outcomes.contains(id))
    }

    pub(crate) fn require_all_scored(&self) -> Result<()> {
        if self.all_outcomes_scored() {
            Ok(())
        } else {
            Err(SettlementError::OutcomesNotScored {
                scored: self.scored_outcomes.len(),
                required: self.config.outcome_ids.len(),
            })
        }
    }

    pub fn below_threshold(&self) -> bool {
        self.participant_count < self.config.min_participants
    }
}
