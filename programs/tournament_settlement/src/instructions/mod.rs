pub mod register;
pub mod withdraw;
pub mod place_bet;
pub mod process_results;
pub mod request_decryption;
pub mod finalize;
pub mod cancel;
pub mod abort_decryption;
pub mod claim;

pub use cancel::cancel_settlement;
pub use finalize::Settlement;

use crate::events::SettlementEvent;
use crate::leaderboard::rank;
use crate::points::Points;
use crate::state::{Address, SettlementState};

/// Ranks `standings` (registration order) and publishes the result.
pub(crate) fn publish_leaderboard(
    state: &mut SettlementState,
    standings: Vec<(Address, Points)>,
    now: i64,
) {
    let entries = rank(standings);
    let count = entries.len();
    state.leaderboard.publish(entries, now);
    state.emit(SettlementEvent::LeaderboardUpdated { entries: count });
}
