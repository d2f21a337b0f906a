#![allow(dead_code)]

use tournament_settlement::*;

pub const ENTRY_FEE: u64 = 1_000_000_000;
pub const REGISTRATION_TIME: i64 = 1_000;
pub const START: i64 = 10_000;
pub const KICKOFF: i64 = 20_000;
pub const SECOND_KICKOFF: i64 = 30_000;
pub const WINDOW: i64 = 600;
pub const AFTER_KICKOFF: i64 = 21_000;
pub const END: i64 = 50_000;

pub const HOME: u32 = 0;
pub const DRAW: u32 = 1;
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

/// Two single-choice matches.
pub fn match_catalog() -> OutcomeCatalog {
    OutcomeCatalog::new(START, END)
        .with_outcome(Outcome::single(1, "Final", KICKOFF, &["Home", "Draw", "Away"]))
        .unwrap()
        .with_outcome(Outcome::single(2, "Third place", SECOND_KICKOFF, &["Home", "Draw", "Away"]))
        .unwrap()
}

/// One ordered top-3 outcome.
pub fn podium_catalog() -> OutcomeCatalog {
    OutcomeCatalog::new(START, END)
        .with_outcome(Outcome::ranked(
            1,
            "Grand prix podium",
            KICKOFF,
            &["A", "B", "C", "D"],
            &[10, 5, 2],
        ))
        .unwrap()
}

pub fn config(outcome_ids: Vec<OutcomeId>) -> TournamentConfig {
    TournamentConfig {
        admin: admin(),
        platform: platform(),
        description: "Cup predictions".to_string(),
        entry_fee: ENTRY_FEE,
        prize_distribution: vec![995],
        closing_window_secs: WINDOW,
        min_participants: 0,
        max_participants: 64,
        outcome_ids,
        scoring: ScoringRule::Equality,
        privacy: Privacy::Public,
        fee_bps: 5,
        decryption_timeout_secs: None,
    }
}

pub fn confidential_config(outcome_ids: Vec<OutcomeId>) -> TournamentConfig {
    TournamentConfig {
        privacy: Privacy::Confidential,
        ..config(outcome_ids)
    }
}

/// A deployed tournament with its collaborators.
pub struct Harness {
    pub catalog: OutcomeCatalog,
    pub fhe: ClearTextEngine,
    pub oracle: CallbackOracle,
    pub tournament: Tournament,
}

impl Harness {
    pub fn new(config: TournamentConfig, catalog: OutcomeCatalog) -> Self {
        let mut fhe = ClearTextEngine::new();
        let tournament = Tournament::new(config, Some(&mut fhe)).expect("deploy tournament");
        Self {
            catalog,
            fhe,
            oracle: CallbackOracle::new(),
            tournament,
        }
    }

    pub fn run<T>(
        &mut self,
        signer: Address,
        now: i64,
        op: impl FnOnce(&mut Tournament, Context<'_>) -> Result<T>,
    ) -> Result<T> {
        let ctx = Context::new(signer, now, &self.catalog)
            .with_fhe(&mut self.fhe)
            .with_oracle(&mut self.oracle);
        op(&mut self.tournament, ctx)
    }

    pub fn register(&mut self, who: Address, name: &str) -> Result<()> {
        self.run(who, REGISTRATION_TIME, |t, ctx| t.register(ctx, name, ENTRY_FEE))
    }

    /// Registers `player(0..n)`.
    pub fn register_players(&mut self, n: usize) {
        for i in 0..n {
            self.register(player(i), &format!("player {}", i))
                .expect("register player");
        }
    }

    pub fn bet(&mut self, who: Address, outcome_id: OutcomeId, selection: Selection, now: i64) -> Result<()> {
        self.run(who, now, |t, ctx| {
            t.place_bet(ctx, outcome_id, Prediction::Open(selection))
        })
    }

    pub fn sealed_bet(&mut self, who: Address, outcome_id: OutcomeId, option: u64, now: i64) -> Result<()> {
        let ciphertext = self.fhe.encrypt(option);
        self.run(who, now, |t, ctx| {
            t.place_bet(ctx, outcome_id, Prediction::Sealed(ciphertext))
        })
    }

    pub fn publish(&mut self, outcome_id: OutcomeId, result: Selection) {
        self.catalog
            .publish_result(outcome_id, result)
            .expect("publish result");
    }

    pub fn process(&mut self, outcome_id: OutcomeId, now: i64) -> Result<()> {
        self.run(admin(), now, |t, ctx| t.process_results(ctx, outcome_id))
    }

    pub fn finalize(&mut self, now: i64) -> Result<Settlement> {
        self.run(admin(), now, |t, ctx| t.finalize_and_distribute(ctx))
    }

    pub fn claim(&mut self, who: Address, now: i64) -> Result<u64> {
        self.run(who, now, |t, ctx| t.claim(ctx))
    }

    pub fn assert_conserved(&self) {
        self.tournament
            .check_conservation()
            .expect("funds must be conserved");
    }
}
