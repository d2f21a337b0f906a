mod helpers;

use helpers::*;
use settlement_backend::grpc_service::proto::settlement_service_server::SettlementService as _;
use settlement_backend::grpc_service::proto::{
    selection, settlement_response, PlaceBetRequest, PlaceSealedBetRequest, ProcessResultsRequest,
    PublishResultRequest, EncryptPredictionRequest, ReasonRequest, RegisterRequest, Selection,
    SignerRequest, SnapshotRequest,
};
use settlement_backend::grpc_service::SettlementGrpcService;
use tonic::{Code, Request};
use tournament_settlement::Privacy;

fn single(option: u32) -> Option<Selection> {
    Some(Selection {
        kind: Some(selection::Kind::Single(option)),
    })
}

fn signer(address: tournament_settlement::Address) -> Request<SignerRequest> {
    Request::new(SignerRequest {
        signer: address.to_string(),
    })
}

async fn register(rpc: &SettlementGrpcService, i: usize) -> u32 {
    rpc.register(Request::new(RegisterRequest {
        signer: player(i).to_string(),
        name: format!("player {}", i),
        fee: ENTRY_FEE,
    }))
    .await
    .unwrap()
    .into_inner()
    .participant_count
}

#[tokio::test]
async fn test_public_tournament_over_grpc() {
    let host = TestHost::deploy(Privacy::Public);
    let rpc = SettlementGrpcService::new(host.service.clone()).with_development_rpcs(true);

    assert_eq!(register(&rpc, 0).await, 1);
    assert_eq!(register(&rpc, 1).await, 2);

    for (i, option) in [(0, AWAY), (1, HOME)] {
        rpc.place_bet(Request::new(PlaceBetRequest {
            signer: player(i).to_string(),
            outcome_id: 1,
            selection: single(option),
        }))
        .await
        .unwrap();
    }

    host.clock.set(AFTER_KICKOFF);
    rpc.publish_result(Request::new(PublishResultRequest {
        outcome_id: 1,
        result: single(HOME),
    }))
    .await
    .unwrap();
    rpc.process_results(Request::new(ProcessResultsRequest {
        signer: admin().to_string(),
        outcome_id: 1,
    }))
    .await
    .unwrap();

    let settlement = rpc
        .finalize_and_distribute(signer(admin()))
        .await
        .unwrap()
        .into_inner();
    match settlement.outcome {
        Some(settlement_response::Outcome::Distributed(distribution)) => {
            assert_eq!(distribution.platform_fee, 10_000_000);
            assert_eq!(distribution.awards[0].participant, player(1).to_string());
        }
        other => panic!("expected a distribution, got {:?}", other),
    }

    let winner = rpc.get_participant(signer(player(1))).await.unwrap().into_inner();
    assert_eq!(winner.points, "1");
    assert_eq!(winner.claimable, "1.99");

    let claimed = rpc.claim(signer(player(1))).await.unwrap().into_inner();
    assert_eq!(claimed.amount, 1_990_000_000);
    assert_eq!(claimed.amount_display, "1.99");

    let snapshot = rpc
        .get_snapshot(Request::new(SnapshotRequest {}))
        .await
        .unwrap()
        .into_inner();
    assert_eq!(snapshot.phase, "finalized");
    assert_eq!(snapshot.leaderboard[0].participant, player(1).to_string());
}

#[tokio::test]
async fn test_rejections_map_to_status_codes() {
    let host = TestHost::deploy(Privacy::Public);
    let rpc = SettlementGrpcService::new(host.service.clone());
    register(&rpc, 0).await;

    let bad_address = rpc
        .withdraw(Request::new(SignerRequest {
            signer: "not-an-address".to_string(),
        }))
        .await
        .unwrap_err();
    assert_eq!(bad_address.code(), Code::InvalidArgument);

    let not_admin = rpc
        .cancel(Request::new(ReasonRequest {
            signer: player(0).to_string(),
            reason: "nope".to_string(),
        }))
        .await
        .unwrap_err();
    assert_eq!(not_admin.code(), Code::PermissionDenied);

    let too_early = rpc.claim(signer(player(0))).await.unwrap_err();
    assert_eq!(too_early.code(), Code::FailedPrecondition);

    let missing_selection = rpc
        .place_bet(Request::new(PlaceBetRequest {
            signer: player(0).to_string(),
            outcome_id: 1,
            selection: None,
        }))
        .await
        .unwrap_err();
    assert_eq!(missing_selection.code(), Code::InvalidArgument);

    let stranger = rpc.get_participant(signer(player(9))).await.unwrap_err();
    assert_eq!(stranger.code(), Code::NotFound);
}

#[tokio::test]
async fn test_development_rpcs_are_gated() {
    let host = TestHost::deploy(Privacy::Confidential);
    let rpc = SettlementGrpcService::new(host.service.clone());

    let encrypt = rpc
        .encrypt_prediction(Request::new(EncryptPredictionRequest { option: 0 }))
        .await
        .unwrap_err();
    assert_eq!(encrypt.code(), Code::Unimplemented);

    let publish = rpc
        .publish_result(Request::new(PublishResultRequest {
            outcome_id: 1,
            result: single(HOME),
        }))
        .await
        .unwrap_err();
    assert_eq!(publish.code(), Code::Unimplemented);
}

#[tokio::test]
async fn test_sealed_bet_by_handle() {
    let host = TestHost::deploy(Privacy::Confidential);
    let rpc = SettlementGrpcService::new(host.service.clone()).with_development_rpcs(true);
    register(&rpc, 0).await;

    let handle = rpc
        .encrypt_prediction(Request::new(EncryptPredictionRequest {
            option: HOME as u64,
        }))
        .await
        .unwrap()
        .into_inner()
        .ciphertext_handle;

    rpc.place_sealed_bet(Request::new(PlaceSealedBetRequest {
        signer: player(0).to_string(),
        outcome_id: 1,
        ciphertext_handle: handle,
    }))
    .await
    .unwrap();

    // Sealed totals stay hidden in the snapshot
    let participant = rpc.get_participant(signer(player(0))).await.unwrap().into_inner();
    assert_eq!(participant.points, "");
}
