mod helpers;

use helpers::*;
use tournament_settlement::*;

#[test]
fn test_single_winner_scenario() {
    let mut h = Harness::new(config(vec![1]), match_catalog());
    h.register_players(10);

    let correct = [1usize, 2, 4, 5, 7, 8];
    for i in 0..10 {
        let pick = if correct.contains(&i) { HOME } else { AWAY };
        h.bet(player(i), 1, Selection::Single(pick), REGISTRATION_TIME)
            .unwrap();
    }
    assert_eq!(h.tournament.prize_pool(), 10 * ENTRY_FEE);
    h.assert_conserved();

    h.publish(1, Selection::Single(HOME));
    h.process(1, AFTER_KICKOFF).unwrap();
    assert!(h.tournament.leaderboard().finalized);

    let settlement = h.finalize(AFTER_KICKOFF).unwrap();
    let allocation = match settlement {
        Settlement::Distributed(allocation) => allocation,
        other => panic!("unexpected settlement {:?}", other),
    };

    assert_eq!(allocation.platform_fee, 50_000_000);
    assert_eq!(allocation.remainder, 0);
    assert_eq!(allocation.awards.len(), 1);
    // Six-way tie on one point: the earliest registration wins
    assert_eq!(allocation.awards[0].participant, player(1));
    assert_eq!(allocation.awards[0].amount, 9_950_000_000);

    assert_eq!(h.tournament.claimable(&player(1)), 9_950_000_000);
    assert_eq!(h.tournament.claimable(&platform()), 50_000_000);
    assert_eq!(h.tournament.points_of(&player(2)), Some(Points::whole(1)));
    assert_eq!(h.tournament.points_of(&player(0)), Some(Points::ZERO));
    assert!(!h.tournament.is_active());
    h.assert_conserved();

    assert_eq!(h.claim(player(1), END).unwrap(), 9_950_000_000);
    assert_eq!(h.claim(player(2), END), Err(SettlementError::NoBalanceToClaim));
    assert_eq!(h.claim(platform(), END).unwrap(), 50_000_000);
    assert_eq!(h.tournament.ledger().vault(), 0);
    h.assert_conserved();
}

#[test]
fn test_rank_scoring_with_partial_matches_and_bonus() {
    let mut cfg = config(vec![1]);
    cfg.scoring = ScoringRule::Rank { bonus_percent: 20 };
    let mut h = Harness::new(cfg, podium_catalog());
    h.register_players(2);

    // B, A, C against A, B, C
    h.bet(player(0), 1, Selection::Ranked(vec![1, 0, 2]), REGISTRATION_TIME)
        .unwrap();
    h.bet(player(1), 1, Selection::Ranked(vec![0, 1, 2]), REGISTRATION_TIME)
        .unwrap();

    h.publish(1, Selection::Ranked(vec![0, 1, 2]));
    h.process(1, AFTER_KICKOFF).unwrap();

    let points = h.tournament.points_of(&player(0)).unwrap();
    assert_eq!(points, Points::from_hundredths(1140));
    assert_eq!(points.to_string(), "11.4");
    // 17 * 1.2
    assert_eq!(
        h.tournament.points_of(&player(1)),
        Some(Points::from_hundredths(2040))
    );
    assert_eq!(h.tournament.leaderboard().rank_of(&player(1)), Some(1));

    let bet = h.tournament.bet(&player(0), 1).unwrap();
    assert!(bet.scored);
    assert_eq!(bet.points_awarded, Some(Award::Open(Points::from_hundredths(1140))));
}

#[test]
fn test_oversized_bonus_overflows_instead_of_wrapping() {
    let mut cfg = config(vec![1]);
    cfg.scoring = ScoringRule::Rank { bonus_percent: u64::MAX / 10 };
    assert!(matches!(
        cfg.validate(),
        Err(SettlementError::UnsupportedConfiguration(_))
    ));

    // Deployed without the factory checks, scoring still refuses to wrap
    let mut h = Harness::new(cfg, podium_catalog());
    h.register_players(1);
    h.bet(player(0), 1, Selection::Ranked(vec![0, 1, 2]), REGISTRATION_TIME)
        .unwrap();
    h.publish(1, Selection::Ranked(vec![0, 1, 2]));

    assert_eq!(h.process(1, AFTER_KICKOFF), Err(SettlementError::ArithmeticOverflow));
    assert_eq!(h.tournament.points_of(&player(0)), Some(Points::ZERO));
    assert!(!h.tournament.bet(&player(0), 1).unwrap().scored);
}

#[test]
fn test_overflowing_prize_weights_rejected_by_validation() {
    let mut cfg = config(vec![1]);
    cfg.prize_distribution = vec![u64::MAX, 1];
    assert_eq!(cfg.validate(), Err(SettlementError::InvalidPrizeDistribution));

    cfg.prize_distribution = vec![60, 40];
    assert_eq!(cfg.validate(), Ok(()));
}

#[test]
fn test_ranked_prediction_validation() {
    let mut cfg = config(vec![1]);
    cfg.scoring = ScoringRule::Rank { bonus_percent: 0 };
    let mut h = Harness::new(cfg, podium_catalog());
    h.register_players(1);

    let duplicate = h.bet(player(0), 1, Selection::Ranked(vec![1, 1, 2]), REGISTRATION_TIME);
    assert!(matches!(duplicate, Err(SettlementError::InvalidPrediction(_))));

    let short = h.bet(player(0), 1, Selection::Ranked(vec![1, 0]), REGISTRATION_TIME);
    assert!(matches!(short, Err(SettlementError::InvalidPrediction(_))));

    let single = h.bet(player(0), 1, Selection::Single(1), REGISTRATION_TIME);
    assert_eq!(single, Err(SettlementError::ShapeMismatch));
}

#[test]
fn test_cancellation_refunds_every_participant() {
    let mut cfg = config(vec![1]);
    cfg.min_participants = 10;
    let mut h = Harness::new(cfg, match_catalog());
    h.register_players(3);

    // Before the start only the admin may cancel
    let early = h.run(player(0), REGISTRATION_TIME, |t, ctx| t.cancel(ctx, "too few"));
    assert_eq!(early, Err(SettlementError::Unauthorized));

    h.run(player(0), START + 1, |t, ctx| t.cancel(ctx, "too few"))
        .unwrap();
    assert!(matches!(h.tournament.phase(), Phase::Cancelled { .. }));

    for i in 0..3 {
        assert_eq!(h.tournament.claimable(&player(i)), ENTRY_FEE);
    }
    assert_eq!(h.tournament.claimable(&platform()), 0);
    assert_eq!(h.tournament.ledger().unallocated(), 0);
    h.assert_conserved();

    for i in 0..3 {
        assert_eq!(h.claim(player(i), START + 2).unwrap(), ENTRY_FEE);
    }
    assert_eq!(h.tournament.ledger().vault(), 0);
    assert_eq!(h.tournament.ledger().total_paid(), 3 * ENTRY_FEE);

    let refunds = h
        .tournament
        .events()
        .iter()
        .filter(|r| matches!(r.event, SettlementEvent::RefundClaimed { .. }))
        .count();
    assert_eq!(refunds, 3);
}

#[test]
fn test_finalize_below_threshold_cancels() {
    let mut cfg = config(vec![1]);
    cfg.min_participants = 3;
    let mut h = Harness::new(cfg, match_catalog());
    h.register_players(2);

    let settlement = h.finalize(AFTER_KICKOFF).unwrap();
    assert!(matches!(settlement, Settlement::Cancelled { .. }));
    assert_eq!(h.tournament.claimable(&player(0)), ENTRY_FEE);
    assert_eq!(h.tournament.claimable(&player(1)), ENTRY_FEE);
    h.assert_conserved();
}

#[test]
fn test_processing_requires_threshold() {
    let mut cfg = config(vec![1]);
    cfg.min_participants = 3;
    let mut h = Harness::new(cfg, match_catalog());
    h.register_players(2);
    h.publish(1, Selection::Single(HOME));

    assert_eq!(
        h.process(1, AFTER_KICKOFF),
        Err(SettlementError::NotEnoughParticipants {
            required: 3,
            actual: 2
        })
    );
}

#[test]
fn test_betting_window_boundaries() {
    let mut h = Harness::new(config(vec![1]), match_catalog());
    h.register_players(1);

    let cutoff = KICKOFF - WINDOW;
    h.bet(player(0), 1, Selection::Single(HOME), cutoff - 1).unwrap();
    assert_eq!(
        h.bet(player(0), 1, Selection::Single(AWAY), cutoff + 1),
        Err(SettlementError::BettingWindowClosed(1))
    );

    // The accepted bet is untouched
    let bet = h.tournament.bet(&player(0), 1).unwrap();
    assert_eq!(bet.prediction, Prediction::Open(Selection::Single(HOME)));
}

#[test]
fn test_bets_overwrite_until_window_closes() {
    let mut h = Harness::new(config(vec![1]), match_catalog());
    h.register_players(1);

    h.bet(player(0), 1, Selection::Single(HOME), REGISTRATION_TIME).unwrap();
    h.bet(player(0), 1, Selection::Single(DRAW), REGISTRATION_TIME + 5).unwrap();

    let bet = h.tournament.bet(&player(0), 1).unwrap();
    assert_eq!(bet.prediction, Prediction::Open(Selection::Single(DRAW)));
    assert_eq!(bet.placed_at, REGISTRATION_TIME + 5);
    assert_eq!(h.tournament.participant(&player(0)).unwrap().bets_placed, 1);
}

#[test]
fn test_bet_validation() {
    let mut h = Harness::new(config(vec![1]), match_catalog());
    h.register_players(1);

    assert!(matches!(
        h.bet(player(0), 1, Selection::Single(3), REGISTRATION_TIME),
        Err(SettlementError::InvalidPrediction(_))
    ));
    // Outcome 2 exists in the catalog but is not part of this tournament
    assert_eq!(
        h.bet(player(0), 2, Selection::Single(HOME), REGISTRATION_TIME),
        Err(SettlementError::UnknownOutcome(2))
    );
    assert_eq!(
        h.bet(player(5), 1, Selection::Single(HOME), REGISTRATION_TIME),
        Err(SettlementError::NotRegistered)
    );
    assert_eq!(
        h.sealed_bet(player(0), 1, 0, REGISTRATION_TIME),
        Err(SettlementError::PrivacyMismatch)
    );
}

#[test]
fn test_outcomes_are_scored_exactly_once() {
    let mut h = Harness::new(config(vec![1, 2]), match_catalog());
    h.register_players(2);
    h.bet(player(0), 1, Selection::Single(HOME), REGISTRATION_TIME).unwrap();

    assert_eq!(
        h.process(1, AFTER_KICKOFF),
        Err(SettlementError::ResultsNotPublished(1))
    );

    h.publish(1, Selection::Single(HOME));
    h.process(1, AFTER_KICKOFF).unwrap();
    assert_eq!(
        h.process(1, AFTER_KICKOFF),
        Err(SettlementError::AlreadyScored(1))
    );
    assert_eq!(h.tournament.points_of(&player(0)), Some(Points::whole(1)));
    assert_eq!(*h.tournament.phase(), Phase::Scoring);

    // One of two outcomes scored: no leaderboard, no settlement
    assert!(!h.tournament.leaderboard().finalized);
    assert_eq!(
        h.finalize(AFTER_KICKOFF),
        Err(SettlementError::OutcomesNotScored {
            scored: 1,
            required: 2
        })
    );
}

#[test]
fn test_only_admin_processes_and_finalizes() {
    let mut h = Harness::new(config(vec![1]), match_catalog());
    h.register_players(1);
    h.publish(1, Selection::Single(HOME));

    let process = h.run(player(0), AFTER_KICKOFF, |t, ctx| t.process_results(ctx, 1));
    assert_eq!(process, Err(SettlementError::Unauthorized));

    h.process(1, AFTER_KICKOFF).unwrap();
    let finalize = h.run(player(0), AFTER_KICKOFF, |t, ctx| t.finalize_and_distribute(ctx));
    assert_eq!(finalize, Err(SettlementError::Unauthorized));
}

#[test]
fn test_failed_transaction_leaves_no_trace() {
    let mut h = Harness::new(config(vec![1]), match_catalog());
    h.register_players(2);

    let events_before = h.tournament.events().len();
    let state_before = h.tournament.state().clone();

    let wrong_fee = h.run(player(9), REGISTRATION_TIME, |t, ctx| {
        t.register(ctx, "late", ENTRY_FEE - 1)
    });
    assert_eq!(
        wrong_fee,
        Err(SettlementError::IncorrectEntryFee {
            expected: ENTRY_FEE,
            provided: ENTRY_FEE - 1
        })
    );
    assert_eq!(
        h.register(player(9), "player 0"),
        Err(SettlementError::NameAlreadyTaken("player 0".to_string()))
    );
    assert_eq!(
        h.register(player(0), "again"),
        Err(SettlementError::AlreadyRegistered)
    );

    assert_eq!(h.tournament.events().len(), events_before);
    assert_eq!(h.tournament.participant_count(), state_before.participant_count);
    assert_eq!(h.tournament.prize_pool(), state_before.ledger.total_prize_pool());
    assert_eq!(*h.tournament.phase(), state_before.phase);
    h.assert_conserved();
}

#[test]
fn test_registration_closes_at_start() {
    let mut h = Harness::new(config(vec![1]), match_catalog());
    let late = h.run(player(0), START, |t, ctx| t.register(ctx, "late", ENTRY_FEE));
    assert_eq!(late, Err(SettlementError::RegistrationClosed));
}

#[test]
fn test_participant_limit() {
    let mut cfg = config(vec![1]);
    cfg.max_participants = 2;
    let mut h = Harness::new(cfg, match_catalog());
    h.register_players(2);
    assert_eq!(
        h.register(player(2), "third"),
        Err(SettlementError::ParticipantLimitReached(2))
    );
}

#[test]
fn test_withdrawal_refund_is_claimable_immediately() {
    let mut h = Harness::new(config(vec![1]), match_catalog());
    h.register_players(2);
    h.bet(player(0), 1, Selection::Single(HOME), REGISTRATION_TIME).unwrap();

    let refunded = h.run(player(0), REGISTRATION_TIME, |t, ctx| t.withdraw(ctx)).unwrap();
    assert_eq!(refunded, ENTRY_FEE);
    assert_eq!(h.tournament.participant_count(), 1);
    assert_eq!(h.tournament.prize_pool(), ENTRY_FEE);
    assert!(h.tournament.bet(&player(0), 1).is_none());
    assert!(!h.tournament.participant(&player(0)).unwrap().registered);
    h.assert_conserved();

    // Registered participants wait, withdrawn ones do not
    assert_eq!(
        h.claim(player(1), REGISTRATION_TIME),
        Err(SettlementError::ClaimWhileActive)
    );
    assert_eq!(h.claim(player(0), REGISTRATION_TIME).unwrap(), ENTRY_FEE);
    h.assert_conserved();

    // The freed name can be taken again
    h.register(player(7), "player 0").unwrap();
}

#[test]
fn test_withdrawal_rules() {
    let mut cfg = config(vec![1]);
    cfg.scoring = ScoringRule::Rank { bonus_percent: 0 };
    let mut h = Harness::new(cfg, podium_catalog());
    h.register_players(2);

    h.bet(player(0), 1, Selection::Ranked(vec![0, 1, 2]), REGISTRATION_TIME)
        .unwrap();
    let with_bets = h.run(player(0), REGISTRATION_TIME, |t, ctx| t.withdraw(ctx));
    assert_eq!(with_bets, Err(SettlementError::BetsAlreadyPlaced));

    // Any bet locks the ranked pool, not only the bettor's own entry
    let without_bets = h.run(player(1), REGISTRATION_TIME, |t, ctx| t.withdraw(ctx));
    assert_eq!(without_bets, Err(SettlementError::BetsAlreadyPlaced));

    let after_start = h.run(player(1), START, |t, ctx| t.withdraw(ctx));
    assert_eq!(after_start, Err(SettlementError::WithdrawalClosed));

    let stranger = h.run(player(5), REGISTRATION_TIME, |t, ctx| t.withdraw(ctx));
    assert_eq!(stranger, Err(SettlementError::NotRegistered));
}

#[test]
fn test_rounding_remainder_goes_to_platform() {
    let mut cfg = config(vec![1]);
    cfg.entry_fee = 1_001;
    cfg.prize_distribution = vec![50, 30, 20];
    let mut h = Harness::new(cfg, match_catalog());
    for i in 0..3 {
        h.run(player(i), REGISTRATION_TIME, |t, ctx| {
            t.register(ctx, &format!("p{}", i), 1_001)
        })
        .unwrap();
    }
    h.bet(player(0), 1, Selection::Single(HOME), REGISTRATION_TIME).unwrap();
    h.publish(1, Selection::Single(HOME));
    h.process(1, AFTER_KICKOFF).unwrap();

    let allocation = match h.finalize(AFTER_KICKOFF).unwrap() {
        Settlement::Distributed(allocation) => allocation,
        other => panic!("unexpected settlement {:?}", other),
    };
    let pool = 3 * 1_001;
    let awarded: u64 = allocation.awards.iter().map(|a| a.amount).sum();
    assert_eq!(allocation.platform_fee + awarded + allocation.remainder, pool);
    assert!(allocation.remainder < allocation.awards.len() as u64 + 2);
    assert_eq!(
        h.tournament.claimable(&platform()),
        allocation.platform_fee + allocation.remainder
    );

    let credited: u64 = (0..3).map(|i| h.tournament.claimable(&player(i))).sum::<u64>()
        + h.tournament.claimable(&platform());
    assert_eq!(credited, pool);
    h.assert_conserved();
}

#[test]
fn test_terminal_phase_is_final() {
    let mut h = Harness::new(config(vec![1]), match_catalog());
    h.register_players(1);
    h.publish(1, Selection::Single(HOME));
    h.process(1, AFTER_KICKOFF).unwrap();
    h.finalize(AFTER_KICKOFF).unwrap();

    assert!(matches!(h.tournament.phase(), Phase::Finalized { at: AFTER_KICKOFF }));
    assert_eq!(h.finalize(END), Err(SettlementError::TournamentInactive));
    assert_eq!(
        h.run(admin(), END, |t, ctx| t.cancel(ctx, "late")),
        Err(SettlementError::TournamentInactive)
    );
    assert!(matches!(h.tournament.phase(), Phase::Finalized { .. }));
}

#[test]
fn test_event_log_records_lifecycle() {
    let mut h = Harness::new(config(vec![1]), match_catalog());
    h.register_players(1);
    h.bet(player(0), 1, Selection::Single(HOME), REGISTRATION_TIME).unwrap();
    h.publish(1, Selection::Single(HOME));
    h.process(1, AFTER_KICKOFF).unwrap();
    h.finalize(AFTER_KICKOFF).unwrap();

    let names: Vec<&str> = h.tournament.events().iter().map(|r| r.event.name()).collect();
    assert_eq!(
        names,
        vec![
            "ParticipantRegistered",
            "BetPlaced",
            "PointsAwarded",
            "ResultsProcessed",
            "LeaderboardUpdated",
            "LeaderboardUpdated",
            "PrizePaid",
            "TournamentFinalized",
        ]
    );
    let sequences: Vec<u64> = h.tournament.events().iter().map(|r| r.sequence).collect();
    assert_eq!(sequences, (0..8).collect::<Vec<u64>>());
}
