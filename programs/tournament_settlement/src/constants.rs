/// Denominator for platform fee basis points (fee_bps / 1000).
pub const FEE_DENOMINATOR: u64 = 1000;

/// Default platform fee: 5 / 1000 = 0.5%.
pub const DEFAULT_FEE_BPS: u64 = 5;

/// Rank scoring: share of a slot's point value for an exact position hit.
pub const EXACT_MULTIPLIER: u64 = 100;

/// Rank scoring: share of a slot's point value for a right-entity-wrong-slot hit.
pub const PARTIAL_MULTIPLIER: u64 = 50;

/// Percent denominator for multipliers and the bonus.
pub const PERCENT: u64 = 100;

/// Largest rank-scoring bonus a configuration may ask for (10x the subtotal).
pub const MAX_BONUS_PERCENT: u64 = 1_000;

/// Points carry two decimals.
pub const POINT_SCALE: u64 = 100;

pub const MAX_NAME_LEN: usize = 50;

pub const MAX_DESCRIPTION_LEN: usize = 500;

/// Upper bound on participants; keeps the quadratic leaderboard sort cheap.
///
/// It also bounds confidential bookkeeping. The development engine keeps every
/// ciphertext it ever produced and the callback oracle keeps every request it
/// was sent, including those of rejected transactions. A confidential
/// tournament allocates 3 constants, 4 handles per sealed bet placement, 4 per
/// scored bet and 1 oracle request per participant at reveal, so both tables
/// stay within `O(max_participants * outcomes)` entries for its lifetime.
pub const DEFAULT_MAX_PARTICIPANTS: u32 = 256;

/// Sentinel stored in place of an out-of-range sealed prediction. Never equal
/// to a published result index.
pub const INVALID_PREDICTION: u64 = u64::MAX;
