//! Integration tests for token and NFT creation
//!
//! This test validates:
//! - Build, sign and submit of a fungible token against the in-memory chain
//! - Wallet signing with the new mint as co-signer
//! - NFT shape (supply 1, no decimals) and ATA reuse
//! - Validation failing before any chain access

use solana_sdk::signature::{Keypair, Signer};
use solana_token_sdk::test_utils::{rent_for, FakeRpc, FakeWallet};
use solana_token_sdk::tx_builder::{base_mint_space, estimate_metadata_space, TokenStep};
use solana_token_sdk::{
    BlockchainConfig, Cluster, NftParams, RemoteSigner, SdkError, TokenParams, TokenSdk,
    TransactionSigner,
};
use spl_associated_token_account::get_associated_token_address_with_program_id;

fn sdk(rpc: FakeRpc) -> TokenSdk<FakeRpc> {
    TokenSdk::new(BlockchainConfig::for_cluster(Cluster::Localnet), rpc).unwrap()
}

#[tokio::test]
async fn test_launch_token_with_local_keypair() {
    let rpc = FakeRpc::new();
    let sdk = sdk(rpc.clone());
    let payer = Keypair::new();
    let payer_key = payer.pubkey();
    let signer = TransactionSigner::from(payer);

    let params = TokenParams::new("Test", "TST", "https://example.com")
        .with_supply(1_000_000)
        .with_decimals(6);
    let launch = sdk.launch_token(&signer, params).await.unwrap();

    assert!(launch.result.success, "{:?}", launch.result.error);
    assert_eq!(
        launch.associated_token_account,
        get_associated_token_address_with_program_id(&payer_key, &launch.mint, &spl_token_2022::id())
    );

    let sent = rpc.sent_transactions().await;
    assert_eq!(sent.len(), 1);
    let tx = &sent[0];
    assert_eq!(tx.signatures.len(), 2);
    assert!(tx.verify().is_ok());
    assert_eq!(tx.message.account_keys[0], payer_key);
    assert_eq!(tx.message.recent_blockhash, rpc.blockhash().await);

    // every instruction of the creation sequence is present, in order
    let programs = &sdk.config().programs;
    let steps: Vec<_> = tx
        .message
        .instructions
        .iter()
        .map(|ix| {
            let instruction = solana_sdk::instruction::Instruction::new_with_bytes(
                tx.message.account_keys[ix.program_id_index as usize],
                &ix.data,
                vec![],
            );
            TokenStep::classify(&instruction, programs)
        })
        .collect();
    assert_eq!(
        steps,
        vec![
            Some(TokenStep::CreateMintAccount),
            Some(TokenStep::InitializeMetadataPointer),
            Some(TokenStep::InitializeMint),
            Some(TokenStep::RentTopUp),
            Some(TokenStep::InitializeMetadata),
            Some(TokenStep::CreateAssociatedTokenAccount),
            Some(TokenStep::MintTo),
        ]
    );
}

#[tokio::test]
async fn test_create_token_signed_by_wallet_and_mint() {
    let rpc = FakeRpc::new();
    let sdk = sdk(rpc.clone());
    let wallet = FakeWallet::new();

    let creation = sdk
        .create_token(&wallet.pubkey(), TokenParams::new("Wallet Coin", "WAL", "https://example.com/w.json"))
        .await
        .unwrap();

    // zero supply means no mint_to
    assert_eq!(creation.transaction.len(), 6);
    let space = base_mint_space().unwrap()
        + estimate_metadata_space("Wallet Coin", "WAL", "https://example.com/w.json");
    assert_eq!(creation.mint_rent_lamports, rent_for(space));

    let signed = sdk
        .sign_with_wallet(creation.transaction.clone(), &wallet, Some(&creation.mint))
        .await
        .unwrap();
    assert_eq!(wallet.sign_calls(), 1);
    assert!(signed.verify().is_ok());

    let result = sdk.submit(&signed).await;
    assert!(result.success);
    assert_eq!(result.signature, Some(signed.signatures[0].to_string()));
}

#[tokio::test]
async fn test_wallet_without_mint_signature_is_rejected() {
    let rpc = FakeRpc::new();
    let sdk = sdk(rpc.clone());
    let wallet = FakeWallet::new();

    let creation = sdk
        .create_token(&wallet.pubkey(), TokenParams::new("Coin", "C", "https://example.com"))
        .await
        .unwrap();

    let err = sdk
        .sign_with_wallet(creation.transaction, &wallet, None)
        .await
        .unwrap_err();
    assert!(matches!(err, SdkError::Signing(_)));
    assert!(rpc.sent_transactions().await.is_empty());
}

#[tokio::test]
async fn test_nft_reuses_existing_token_account() {
    let rpc = FakeRpc::new();
    let sdk = sdk(rpc.clone());
    let payer = Keypair::new();
    let mint = Keypair::new();
    let mint_key = mint.pubkey();

    let ata = get_associated_token_address_with_program_id(&payer.pubkey(), &mint_key, &spl_token_2022::id());
    rpc.add_account(ata).await;

    let creation = sdk
        .create_nft(
            &payer.pubkey(),
            NftParams::new("Art #1", "ART", "https://example.com/1.json").with_mint_keypair(mint),
        )
        .await
        .unwrap();

    assert_eq!(creation.mint_address(), mint_key);
    assert_eq!(creation.associated_token_account, ata);
    // no ATA create, but mint_to for the single unit
    let programs = &sdk.config().programs;
    assert!(creation
        .transaction
        .instructions
        .iter()
        .all(|ix| ix.program_id != programs.associated_token_program));
    let last = creation.transaction.instructions.last().unwrap();
    assert_eq!(TokenStep::classify(last, programs), Some(TokenStep::MintTo));
    assert_eq!(&last.data[1..9], &1u64.to_le_bytes());
}

#[tokio::test]
async fn test_invalid_params_fail_before_chain_access() {
    let rpc = FakeRpc::new();
    let sdk = sdk(rpc.clone());
    let payer = Keypair::new();

    let too_long = "x".repeat(33);
    let err = sdk
        .create_token(&payer.pubkey(), TokenParams::new(too_long, "TST", "https://example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, SdkError::Validation(_)));

    let err = sdk
        .create_token(
            &payer.pubkey(),
            TokenParams::new("Test", "TST", "https://example.com").with_decimals(10),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SdkError::Validation(_)));

    assert_eq!(rpc.blockhash_requests().await, 0);
    assert!(rpc.sent_transactions().await.is_empty());
}

#[test]
fn test_metadata_estimate_is_deterministic() {
    assert_eq!(estimate_metadata_space("Test", "TST", "https://example.com"), 121);
    assert_eq!(
        estimate_metadata_space("Test", "TST", "https://example.com"),
        estimate_metadata_space("Test", "TST", "https://example.com")
    );
}
