//! Integration tests for transfers, signing shapes and submission
//!
//! This test validates:
//! - SOL transfer end to end, with and without a separate fee payer
//! - Submission failures reported as results, never errors
//! - Confirmation timeout and on-chain errors
//! - Sequential batch submission stopping at the first failure
//! - Bulk wallet signing

use std::time::Duration;

use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    transaction::TransactionError,
};
use solana_token_sdk::submit::{submit_transaction, SubmitOptions};
use solana_token_sdk::test_utils::{status_at, FakeRpc, FakeWallet};
use solana_token_sdk::{
    BlockchainConfig, Cluster, RemoteSigner, SdkError, SimulationOutcome, TokenSdk, TransferParams,
};
use solana_transaction_status::TransactionConfirmationStatus;

fn sdk(rpc: FakeRpc) -> TokenSdk<FakeRpc> {
    TokenSdk::new(BlockchainConfig::for_cluster(Cluster::Localnet), rpc).unwrap()
}

#[tokio::test]
async fn test_send_sol_end_to_end() {
    let rpc = FakeRpc::new();
    let sdk = sdk(rpc.clone());
    let sender = Keypair::new();
    let recipient = Pubkey::new_unique();

    let result = sdk.send_sol(&sender, &recipient, 0.1).await.unwrap();
    assert!(result.success);

    let sent = rpc.sent_transactions().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].message.account_keys[0], sender.pubkey());
    assert_eq!(
        result.signature.unwrap(),
        sent[0].signatures[0].to_string()
    );
}

#[tokio::test]
async fn test_negative_amount_is_validation_error() {
    let rpc = FakeRpc::new();
    let sdk = sdk(rpc.clone());

    let err = sdk
        .send_sol(&Keypair::new(), &Pubkey::new_unique(), -0.1)
        .await
        .unwrap_err();
    assert!(matches!(err, SdkError::Validation(_)));
    assert_eq!(rpc.blockhash_requests().await, 0);
}

#[tokio::test]
async fn test_transfer_with_sponsor_paying_fees() {
    let rpc = FakeRpc::new();
    let sdk = sdk(rpc.clone());
    let sender = Keypair::new();
    let sponsor = Keypair::new();

    let unsigned = sdk
        .transfer(&TransferParams::new(sender.pubkey(), Pubkey::new_unique(), 1.5))
        .unwrap();
    let signed = sdk
        .sign_with_fee_payer(unsigned, &sender, &sponsor)
        .await
        .unwrap();

    assert_eq!(signed.signatures.len(), 2);
    assert_eq!(signed.message.account_keys[0], sponsor.pubkey());
    assert!(sdk.submit(&signed).await.success);
}

#[tokio::test]
async fn test_send_failure_is_reported_not_raised() {
    let rpc = FakeRpc::new();
    rpc.fail_sends("Blockhash not found").await;
    let sdk = sdk(rpc.clone());

    let result = sdk.send_sol(&Keypair::new(), &Pubkey::new_unique(), 0.5).await.unwrap();
    assert!(!result.success);
    assert!(result.signature.is_none());
    assert!(result.error.as_deref().unwrap().contains("Blockhash not found"));
}

#[tokio::test(start_paused = true)]
async fn test_confirmation_timeout() {
    let rpc = FakeRpc::new();
    rpc.never_confirm().await;
    let sdk = sdk(rpc.clone());
    let sender = Keypair::new();

    let unsigned = sdk
        .transfer(&TransferParams::new(sender.pubkey(), Pubkey::new_unique(), 0.01))
        .unwrap();
    let signed = sdk.sign_with_keypair(unsigned, &sender).await.unwrap();

    let options = SubmitOptions::default().with_timeout(Duration::from_secs(3));
    let result = submit_transaction(sdk.rpc(), &signed, &options).await;

    assert!(!result.success);
    assert!(result.signature.is_some());
    assert!(result.error.as_deref().unwrap().starts_with("timeout"));
    assert!(matches!(
        result.into_result(),
        Err(SdkError::Transaction { .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn test_on_chain_failure_after_processing() {
    let rpc = FakeRpc::new();
    rpc.script_statuses(vec![
        None,
        Some(status_at(
            17,
            TransactionConfirmationStatus::Processed,
            Some(TransactionError::InsufficientFundsForFee),
        )),
    ])
    .await;
    let sdk = sdk(rpc.clone());

    let result = sdk.send_sol(&Keypair::new(), &Pubkey::new_unique(), 0.2).await.unwrap();
    assert!(!result.success);
    assert!(result.error.unwrap().starts_with("Transaction failed"));
}

#[tokio::test]
async fn test_wait_for_confirmation_by_signature_string() {
    let rpc = FakeRpc::new();
    let sdk = sdk(rpc.clone());
    let sender = Keypair::new();

    let unsigned = sdk
        .transfer(&TransferParams::new(sender.pubkey(), Pubkey::new_unique(), 0.3))
        .unwrap();
    let signed = sdk.sign_with_keypair(unsigned, &sender).await.unwrap();
    let confirmation = sdk
        .wait_for_confirmation(&signed.signatures[0].to_string())
        .await
        .unwrap();
    assert!(confirmation.success);
    assert_eq!(confirmation.slot, Some(1));
}

#[tokio::test]
async fn test_batch_stops_at_first_failure() {
    let rpc = FakeRpc::new();
    let sdk = sdk(rpc.clone());
    let sender = Keypair::new();

    let mut signed = Vec::new();
    for amount in [0.1, 0.2, 0.3] {
        let unsigned = sdk
            .transfer(&TransferParams::new(sender.pubkey(), Pubkey::new_unique(), amount))
            .unwrap();
        signed.push(sdk.sign_with_keypair(unsigned, &sender).await.unwrap());
    }
    // an unsigned transaction in the middle halts the batch
    signed[1].signatures[0] = Default::default();

    let batch = sdk.submit_batch(&signed).await;
    assert!(!batch.all_succeeded);
    assert_eq!(batch.attempted(), 2);
    assert!(batch.results[0].success);
    assert!(!batch.results[1].success);
    assert_eq!(rpc.sent_transactions().await.len(), 1);
}

#[tokio::test]
async fn test_bulk_wallet_signing_and_batch() {
    let rpc = FakeRpc::new();
    let sdk = sdk(rpc.clone());
    let wallet = FakeWallet::new();

    let unsigned = (0..3)
        .map(|_| {
            sdk.transfer(&TransferParams::new(wallet.pubkey(), Pubkey::new_unique(), 0.05))
                .unwrap()
        })
        .collect();
    let signed = sdk.sign_all_with_wallet(unsigned, &wallet).await.unwrap();

    assert_eq!(signed.len(), 3);
    assert_eq!(wallet.sign_calls(), 1);
    assert_eq!(rpc.blockhash_requests().await, 1);

    let batch = sdk.submit_batch(&signed).await;
    assert!(batch.all_succeeded);
    assert_eq!(rpc.sent_transactions().await.len(), 3);
}

#[tokio::test]
async fn test_rejecting_wallet() {
    let sdk = sdk(FakeRpc::new());
    let wallet = FakeWallet::rejecting();
    let unsigned = sdk
        .transfer(&TransferParams::new(wallet.pubkey(), Pubkey::new_unique(), 1.0))
        .unwrap();

    let err = sdk.sign_with_wallet(unsigned, &wallet, None).await.unwrap_err();
    assert!(matches!(err, SdkError::Signing(_)));
}

#[tokio::test]
async fn test_simulation_reports_failure_reason() {
    let rpc = FakeRpc::new();
    rpc.set_simulation(SimulationOutcome {
        err: Some("InstructionError(0, Custom(6001))".to_string()),
        logs: vec!["Program log: slippage exceeded".to_string()],
        units_consumed: Some(4_200),
    })
    .await;
    let sdk = sdk(rpc.clone());
    let sender = Keypair::new();

    let unsigned = sdk
        .transfer(&TransferParams::new(sender.pubkey(), Pubkey::new_unique(), 0.4))
        .unwrap();
    let signed = sdk.sign_with_keypair(unsigned, &sender).await.unwrap();
    let simulation = sdk.simulate(&signed).await;

    assert!(!simulation.success);
    assert_eq!(simulation.units_consumed, Some(4_200));
    assert_eq!(simulation.logs.len(), 1);
    assert!(simulation.error.unwrap().contains("6001"));
    assert!(rpc.sent_transactions().await.is_empty());
}
