#![allow(dead_code)]

use settlement_backend::config::FinalizeConfig;
use settlement_backend::{ManualClock, SettlementService, TournamentDefinition};
use std::path::PathBuf;
use std::sync::Arc;
use tournament_settlement::*;
use uuid::Uuid;

pub const ENTRY_FEE: u64 = 1_000_000_000;
pub const REGISTRATION_TIME: i64 = 1_000;
pub const START: i64 = 10_000;
pub const KICKOFF: i64 = 20_000;
pub const AFTER_KICKOFF: i64 = 21_000;
pub const END: i64 = 50_000;

pub const HOME: u32 = 0;
pub const AWAY: u32 = 2;

pub fn admin() -> Address {
    Address::derive("admin")
}

pub fn platform() -> Address {
    Address::derive("platform")
}

pub fn player(i: usize) -> Address {
    Address::derive(&format!("player-{}", i))
}

pub fn definition(privacy: Privacy) -> TournamentDefinition {
    let outcomes = OutcomeCatalog::new(START, END)
        .with_outcome(Outcome::single(1, "Final", KICKOFF, &["Home", "Draw", "Away"]))
        .unwrap();

    TournamentDefinition {
        config: TournamentConfig {
            admin: admin(),
            platform: platform(),
            description: "Cup final".to_string(),
            entry_fee: ENTRY_FEE,
            prize_distribution: vec![995],
            closing_window_secs: 600,
            min_participants: 2,
            max_participants: 16,
            outcome_ids: vec![1],
            scoring: ScoringRule::Equality,
            privacy,
            fee_bps: 5,
            decryption_timeout_secs: Some(3_600),
        },
        outcomes,
    }
}

pub fn fast_retries(max_attempts: u32) -> FinalizeConfig {
    FinalizeConfig {
        max_attempts,
        initial_backoff_ms: 5,
        max_backoff_ms: 20,
    }
}

pub fn scratch_dir() -> PathBuf {
    std::env::temp_dir().join(format!("settlement-audit-{}", Uuid::new_v4()))
}

/// Deployed service plus the clock it reads
pub struct TestHost {
    pub clock: Arc<ManualClock>,
    pub service: Arc<SettlementService>,
}

impl TestHost {
    pub fn deploy(privacy: Privacy) -> Self {
        let clock = Arc::new(ManualClock::new(REGISTRATION_TIME));
        let service = SettlementService::deploy(definition(privacy), clock.clone())
            .expect("deploy tournament");
        Self {
            clock,
            service: Arc::new(service),
        }
    }

    pub fn with_service(clock: Arc<ManualClock>, service: SettlementService) -> Self {
        Self {
            clock,
            service: Arc::new(service),
        }
    }

    pub async fn register_players(&self, n: usize) {
        for i in 0..n {
            self.service
                .register(player(i), &format!("player {}", i), ENTRY_FEE)
                .await
                .expect("register");
        }
    }
}
