//! End-to-end build, sign and broadcast against a mock node.

use chrono::{Duration as ChronoDuration, Utc};

use hive_client::blockchain::transaction::build_with_state;
use hive_client::blockchain::types::{ChainId, ChainState};
use hive_client::blockchain::{KeyStore, Operation, PrivateKey, Role, Signer};
use hive_client::{BlockchainError, BroadcastOptions, HiveClient};

mod common;

fn posting_keys() -> KeyStore {
    let mut keys = KeyStore::new();
    keys.add_key(
        Role::Posting,
        PrivateKey::from_password("alice", "posting", "correct horse").unwrap(),
    );
    keys
}

fn vote() -> Operation {
    Operation::vote("alice", "bob", "post1", 10_000).unwrap()
}

#[tokio::test]
async fn test_vote_included_synchronously() {
    let node = common::start_mock_node().await;
    let client = HiveClient::new(common::test_config(vec![node.url()])).unwrap();

    let options = BroadcastOptions {
        synchronous: true,
        strict: false,
        expiration_secs: 60,
        verify: false,
    };
    let result = client.submit(vec![vote()], &posting_keys(), options).await.unwrap();

    assert!(result.included);
    assert!(result.block_num.is_some());
    assert!(result.error.is_none());
    assert_eq!(result.transaction_id.len(), 40);
    assert_eq!(node.broadcasts(), 1);
}

#[tokio::test]
async fn test_async_broadcast_not_included() {
    let node = common::start_mock_node().await;
    let client = HiveClient::new(common::test_config(vec![node.url()])).unwrap();

    let tx = client.prepare(vec![vote()], &posting_keys(), 30).await.unwrap();
    let result = client.broadcast(&tx, false, true).await.unwrap();
    assert!(!result.included);
    assert_eq!(result.block_num, None);
    assert_eq!(result.transaction_id, tx.id());
}

#[tokio::test]
async fn test_duplicate_strict_and_lenient() {
    let node = common::start_mock_node().await;
    let client = HiveClient::new(common::test_config(vec![node.url()])).unwrap();

    let tx = client.prepare(vec![vote()], &posting_keys(), 60).await.unwrap();
    client.broadcast(&tx, true, true).await.unwrap();

    let err = client.broadcast(&tx, true, true).await.unwrap_err();
    assert!(matches!(err, BlockchainError::DuplicateTransaction(ref id) if *id == tx.id()));

    let result = client.broadcast(&tx, true, false).await.unwrap();
    assert!(!result.included);
    assert!(matches!(result.error, Some(BlockchainError::DuplicateTransaction(_))));

    // Rejections are answers, not node failures
    assert_eq!(client.pool().nodes()[0].consecutive_failures(), 0);
}

#[tokio::test]
async fn test_expired_transaction_is_not_sent() {
    let node = common::start_mock_node().await;
    let client = HiveClient::new(common::test_config(vec![node.url()])).unwrap();

    let stale = ChainState {
        chain_id: ChainId::mainnet(),
        head_block_number: 1,
        head_block_id: [7u8; 20],
        time: Utc::now().naive_utc() - ChronoDuration::seconds(600),
    };
    let unsigned = build_with_state(&stale, vec![vote()], 60).unwrap();
    let tx = Signer::new(ChainId::mainnet()).sign(unsigned, &posting_keys()).unwrap();

    for strict in [true, false] {
        let err = client.broadcast(&tx, true, strict).await.unwrap_err();
        assert!(matches!(err, BlockchainError::ExpiredTransaction { .. }));
    }
    assert_eq!(node.broadcasts(), 0);
}

#[tokio::test]
async fn test_expired_before_inclusion() {
    let node = common::start_mock_node().await;
    let client = HiveClient::new(common::test_config(vec![node.url()])).unwrap();

    let tx = client.prepare(vec![vote()], &posting_keys(), 60).await.unwrap();
    node.expire_next_broadcast();
    let err = client.broadcast(&tx, true, false).await.unwrap_err();
    assert!(matches!(err, BlockchainError::ExpiredTransaction { .. }));
    assert_eq!(node.broadcasts(), 1);
}

#[tokio::test]
async fn test_verify_then_submit() {
    let node = common::start_mock_node().await;
    let client = HiveClient::new(common::test_config(vec![node.url()])).unwrap();
    client.verify_chain_id().await.unwrap();

    let keys = posting_keys();
    let tx = client.prepare(vec![vote()], &keys, 60).await.unwrap();
    assert!(client.verify(&tx, &keys).await.unwrap());

    let mut options = BroadcastOptions::from_config(client.config());
    options.verify = true;
    let result = client.submit(vec![vote()], &keys, options).await.unwrap();
    assert!(result.error.is_none());
    assert!(node
        .methods()
        .contains(&"condenser_api.verify_authority".to_string()));
}

#[tokio::test]
async fn test_missing_authority_never_broadcast() {
    let node = common::start_mock_node().await;
    let client = HiveClient::new(common::test_config(vec![node.url()])).unwrap();

    let transfer = Operation::transfer("alice", "bob", "0.001 HIVE".parse().unwrap(), "").unwrap();
    let err = client
        .submit(
            vec![vote(), transfer],
            &posting_keys(),
            BroadcastOptions::from_config(client.config()),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        BlockchainError::MissingAuthority { index: 1, role: Role::Active, .. }
    ));
    assert_eq!(node.broadcasts(), 0);
}
