//! Transaction building and digesting.
//!
//! # Responsibilities
//! - Bind operations to a recent reference block and an expiration
//! - Produce the canonical bytes, transaction id and signing digest
//! - Accumulate signatures (multi-sig) until broadcast
//!
//! # Data Flow
//! ```text
//! ChainStateSource::current()
//!     → TransactionBuilder::build (ref block, expiration, ordered ops)
//!     → UnsignedTransaction::digest(chain_id)
//!     → Signer → SignedTransaction
//! ```

use chrono::{Duration as ChronoDuration, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::blockchain::chain_state::ChainStateSource;
use crate::blockchain::keys::{sha256, CompactSignature};
use crate::blockchain::operation::Operation;
use crate::blockchain::serializer::{write_time, write_u16, write_u32, write_varint, HiveSerialize};
use crate::blockchain::types::{
    BlockchainError, BlockchainResult, ChainId, ChainState, MAX_EXPIRATION_SECS,
};

/// Default distance between head block time and expiration.
pub const DEFAULT_EXPIRATION_SECS: u32 = 60;

/// Transaction header plus ordered operations, not yet signed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedTransaction {
    pub ref_block_num: u16,
    pub ref_block_prefix: u32,
    #[serde(with = "hive_time")]
    pub expiration: NaiveDateTime,
    pub operations: Vec<Operation>,
    /// Always empty. Extensions are not encoded, so non-empty input is rejected.
    #[serde(default, deserialize_with = "empty_extensions")]
    pub extensions: Vec<Value>,
}

impl UnsignedTransaction {
    /// Transaction id: hex of the first 20 bytes of `sha256(bytes)`.
    pub fn id(&self) -> String {
        hex::encode(&sha256(&self.to_bytes())[..20])
    }

    /// Signing digest: `sha256(chain_id || bytes)`.
    pub fn digest(&self, chain_id: &ChainId) -> [u8; 32] {
        let mut data = chain_id.as_bytes().to_vec();
        self.write_to(&mut data);
        sha256(&data)
    }

    /// True once `now` has reached the expiration time.
    pub fn is_expired_at(&self, now: NaiveDateTime) -> bool {
        self.expiration <= now
    }
}

impl HiveSerialize for UnsignedTransaction {
    fn write_to(&self, out: &mut Vec<u8>) {
        write_u16(out, self.ref_block_num);
        write_u32(out, self.ref_block_prefix);
        write_time(out, &self.expiration);
        write_varint(out, self.operations.len() as u64);
        for op in &self.operations {
            op.write_to(out);
        }
        write_varint(out, 0);
    }
}

/// An unsigned transaction plus its signature list.
///
/// Signatures are append-only; [`SignedTransaction::push_signature`] ignores
/// duplicates so repeated signing with the same key is harmless.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    #[serde(flatten)]
    pub transaction: UnsignedTransaction,
    #[serde(default)]
    pub signatures: Vec<CompactSignature>,
}

impl SignedTransaction {
    pub fn new(transaction: UnsignedTransaction) -> Self {
        Self {
            transaction,
            signatures: Vec::new(),
        }
    }

    /// Append a signature. Returns false if it was already present.
    pub fn push_signature(&mut self, signature: CompactSignature) -> bool {
        if self.signatures.contains(&signature) {
            return false;
        }
        self.signatures.push(signature);
        true
    }

    /// Id of the underlying transaction; signatures do not contribute.
    pub fn id(&self) -> String {
        self.transaction.id()
    }

    pub fn digest(&self, chain_id: &ChainId) -> [u8; 32] {
        self.transaction.digest(chain_id)
    }

    pub fn operations(&self) -> &[Operation] {
        &self.transaction.operations
    }

    pub fn expiration(&self) -> NaiveDateTime {
        self.transaction.expiration
    }
}

/// Builds unsigned transactions against fresh chain state.
#[derive(Clone)]
pub struct TransactionBuilder {
    chain_state: Arc<dyn ChainStateSource>,
}

impl TransactionBuilder {
    pub fn new(chain_state: Arc<dyn ChainStateSource>) -> Self {
        Self { chain_state }
    }

    /// Fetch chain state and build a transaction expiring `expiration_secs`
    /// after head block time.
    ///
    /// Arguments are checked before any network call.
    pub async fn build(
        &self,
        operations: Vec<Operation>,
        expiration_secs: u32,
    ) -> BlockchainResult<UnsignedTransaction> {
        check_inputs(&operations, expiration_secs)?;
        let state = self.chain_state.current().await?;
        build_with_state(&state, operations, expiration_secs)
    }
}

/// Build against an already fetched [`ChainState`].
pub fn build_with_state(
    state: &ChainState,
    operations: Vec<Operation>,
    expiration_secs: u32,
) -> BlockchainResult<UnsignedTransaction> {
    check_inputs(&operations, expiration_secs)?;

    let expiration = state.time + ChronoDuration::seconds(i64::from(expiration_secs));
    let tx = UnsignedTransaction {
        ref_block_num: state.ref_block_num(),
        ref_block_prefix: state.ref_block_prefix(),
        expiration,
        operations,
        extensions: Vec::new(),
    };

    tracing::debug!(
        ref_block_num = tx.ref_block_num,
        ref_block_prefix = tx.ref_block_prefix,
        expiration = %tx.expiration,
        operations = tx.operations.len(),
        "Transaction built"
    );
    Ok(tx)
}

fn check_inputs(operations: &[Operation], expiration_secs: u32) -> BlockchainResult<()> {
    if operations.is_empty() {
        return Err(BlockchainError::InvalidOperation(
            "transaction needs at least one operation".to_string(),
        ));
    }
    if expiration_secs == 0 || expiration_secs > MAX_EXPIRATION_SECS {
        return Err(BlockchainError::InvalidExpiration {
            requested: expiration_secs,
            max: MAX_EXPIRATION_SECS,
        });
    }
    for op in operations {
        op.validate()?;
    }
    Ok(())
}

fn empty_extensions<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Value>, D::Error> {
    let extensions = Vec::<Value>::deserialize(deserializer)?;
    if !extensions.is_empty() {
        return Err(serde::de::Error::custom(
            "transaction extensions are not supported",
        ));
    }
    Ok(extensions)
}

/// Serde adapter for the node's zone-less UTC timestamps.
pub(crate) mod hive_time {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::blockchain::types::TIME_FORMAT;

    pub fn serialize<S: Serializer>(time: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format(TIME_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(s.trim_end_matches('Z'), TIME_FORMAT)
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::types::TIME_FORMAT;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fixed_state() -> ChainState {
        let mut head_block_id = [0u8; 20];
        head_block_id[4..8].copy_from_slice(&[0x01, 0x02, 0x03, 0x04]);
        ChainState {
            chain_id: ChainId::mainnet(),
            head_block_number: 0x0001_2345,
            head_block_id,
            time: NaiveDateTime::parse_from_str("2024-01-01T00:00:00", TIME_FORMAT).unwrap(),
        }
    }

    struct FixedSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ChainStateSource for FixedSource {
        async fn current(&self) -> BlockchainResult<ChainState> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(fixed_state())
        }
    }

    fn vote(permlink: &str) -> Operation {
        Operation::vote("alice", "bob", permlink, 10_000).unwrap()
    }

    #[test]
    fn test_header_from_state() {
        let tx = build_with_state(&fixed_state(), vec![vote("post1")], 60).unwrap();
        assert_eq!(tx.ref_block_num, 0x2345);
        assert_eq!(tx.ref_block_prefix, 0x0403_0201);
        assert_eq!(
            tx.expiration.format(TIME_FORMAT).to_string(),
            "2024-01-01T00:01:00"
        );
        assert!(tx.extensions.is_empty());
    }

    #[test]
    fn test_operation_order_preserved() {
        let ops = vec![vote("first"), vote("second"), vote("third")];
        let tx = build_with_state(&fixed_state(), ops.clone(), 60).unwrap();
        assert_eq!(tx.operations, ops);
    }

    #[test]
    fn test_expiration_bounds() {
        let state = fixed_state();
        assert!(matches!(
            build_with_state(&state, vec![vote("p")], 0),
            Err(BlockchainError::InvalidExpiration { requested: 0, .. })
        ));
        assert!(matches!(
            build_with_state(&state, vec![vote("p")], 3601),
            Err(BlockchainError::InvalidExpiration { max: 3600, .. })
        ));
        assert!(build_with_state(&state, vec![vote("p")], 3600).is_ok());
    }

    #[tokio::test]
    async fn test_build_empty_fails_without_fetch() {
        let source = Arc::new(FixedSource {
            calls: AtomicUsize::new(0),
        });
        let builder = TransactionBuilder::new(source.clone());

        let err = builder.build(Vec::new(), 60).await.unwrap_err();
        assert!(matches!(err, BlockchainError::InvalidOperation(_)));
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);

        builder.build(vec![vote("post1")], 60).await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_bytes_id_and_digest() {
        let tx = build_with_state(&fixed_state(), vec![vote("post1")], 60).unwrap();
        let bytes = tx.to_bytes();

        // ref_block_num, ref_block_prefix, expiration
        assert_eq!(&bytes[..2], &[0x45, 0x23]);
        assert_eq!(&bytes[2..6], &[0x01, 0x02, 0x03, 0x04]);
        assert_eq!(&bytes[6..10], &1_704_067_260u32.to_le_bytes());
        // one operation, then the vote, then empty extensions
        assert_eq!(bytes[10], 1);
        assert_eq!(bytes[11], 0);
        assert_eq!(*bytes.last().unwrap(), 0);

        assert_eq!(tx.id().len(), 40);
        assert_eq!(tx.id(), hex::encode(&sha256(&bytes)[..20]));
        assert_ne!(tx.digest(&ChainId::mainnet()), tx.digest(&ChainId::testnet()));
    }

    #[test]
    fn test_json_form() {
        let tx = build_with_state(&fixed_state(), vec![vote("post1")], 60).unwrap();
        let signed = SignedTransaction::new(tx);
        let value = serde_json::to_value(&signed).unwrap();

        assert_eq!(value["expiration"], "2024-01-01T00:01:00");
        assert_eq!(value["ref_block_num"], 0x2345);
        assert_eq!(value["operations"][0][0], "vote");
        assert_eq!(value["signatures"], serde_json::json!([]));

        let parsed: SignedTransaction = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, signed);
    }

    #[test]
    fn test_extensions_must_be_empty() {
        let tx = build_with_state(&fixed_state(), vec![vote("post1")], 60).unwrap();
        let mut value = serde_json::to_value(SignedTransaction::new(tx)).unwrap();
        assert_eq!(value["extensions"], serde_json::json!([]));

        value["extensions"] = serde_json::json!([[1, {"beneficiaries": []}]]);
        assert!(serde_json::from_value::<SignedTransaction>(value.clone()).is_err());

        value.as_object_mut().unwrap().remove("extensions");
        let parsed: SignedTransaction = serde_json::from_value(value).unwrap();
        assert!(parsed.transaction.extensions.is_empty());
    }

    #[test]
    fn test_push_signature_dedupes() {
        let tx = build_with_state(&fixed_state(), vec![vote("post1")], 60).unwrap();
        let mut signed = SignedTransaction::new(tx);
        let sig = CompactSignature([7u8; 65]);
        assert!(signed.push_signature(sig));
        assert!(!signed.push_signature(sig));
        assert_eq!(signed.signatures.len(), 1);
    }
}
