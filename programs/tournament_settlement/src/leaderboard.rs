use crate::points::Points;
use crate::state::{Address, Leaderboard, LeaderboardEntry};

/// Orders standings by points, descending. Input must be in registration
/// order; equal scores keep that order.
///
/// Adjacent-exchange insertion sort that only moves an entry past a strictly
/// smaller one. Quadratic, so participant counts are capped by configuration.
pub fn rank(standings: Vec<(Address, Points)>) -> Vec<LeaderboardEntry> {
    let mut entries: Vec<LeaderboardEntry> = standings
        .into_iter()
        .map(|(participant, points)| LeaderboardEntry { participant, points })
        .collect();

    for i in 1..entries.len() {
        let mut j = i;
        while j > 0 && entries[j - 1].points < entries[j].points {
            entries.swap(j - 1, j);
            j -= 1;
        }
    }
    entries
}

impl Leaderboard {
    pub(crate) fn publish(&mut self, entries: Vec<LeaderboardEntry>, now: i64) {
        self.entries = entries;
        self.finalized = true;
        self.finalized_time = Some(now);
    }

    /// 1-based rank of a participant.
    pub fn rank_of(&self, participant: &Address) -> Option<u32> {
        self.entries
            .iter()
            .position(|e| &e.participant == participant)
            .map(|i| i as u32 + 1)
    }

    pub fn addresses(&self) -> Vec<Address> {
        self.entries.iter().map(|e| e.participant).collect()
    }
}
