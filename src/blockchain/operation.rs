//! On-chain operations and assets.
//!
//! Each [`Operation`] knows three things: its wire name and ordinal, the
//! authority role it needs, and its canonical binary form. JSON uses the
//! condenser `["name", {...}]` pair.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::blockchain::serializer::{
    write_bool, write_i16, write_i64, write_string, write_string_list, write_u32, write_u8,
    write_varint, HiveSerialize,
};
use crate::blockchain::types::{BlockchainError, BlockchainResult};
use crate::blockchain::wallet::Role;

/// Maximum vote weight (100%).
pub const MAX_VOTE_WEIGHT: i16 = 10_000;

const MAX_CUSTOM_ID_LENGTH: usize = 32;
const MAX_PERMLINK_LENGTH: usize = 255;

// ---------------------------------------------------------------------------
// Assets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetSymbol {
    Hive,
    Hbd,
    Vests,
}

impl AssetSymbol {
    pub fn precision(&self) -> u8 {
        match self {
            AssetSymbol::Hive | AssetSymbol::Hbd => 3,
            AssetSymbol::Vests => 6,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetSymbol::Hive => "HIVE",
            AssetSymbol::Hbd => "HBD",
            AssetSymbol::Vests => "VESTS",
        }
    }

    /// Symbol bytes in the binary encoding, which predates the HIVE/HBD rename.
    fn legacy_name(&self) -> &'static str {
        match self {
            AssetSymbol::Hive => "STEEM",
            AssetSymbol::Hbd => "SBD",
            AssetSymbol::Vests => "VESTS",
        }
    }
}

impl FromStr for AssetSymbol {
    type Err = BlockchainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HIVE" | "STEEM" => Ok(AssetSymbol::Hive),
            "HBD" | "SBD" => Ok(AssetSymbol::Hbd),
            "VESTS" => Ok(AssetSymbol::Vests),
            other => Err(BlockchainError::InvalidOperation(format!(
                "unsupported asset symbol '{}'",
                other
            ))),
        }
    }
}

/// Fixed-point amount in the symbol's smallest unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Asset {
    pub amount: i64,
    pub symbol: AssetSymbol,
}

impl Asset {
    pub fn new(amount: i64, symbol: AssetSymbol) -> Self {
        Self { amount, symbol }
    }

    pub fn hive(amount: i64) -> Self {
        Self::new(amount, AssetSymbol::Hive)
    }

    pub fn hbd(amount: i64) -> Self {
        Self::new(amount, AssetSymbol::Hbd)
    }

    pub fn vests(amount: i64) -> Self {
        Self::new(amount, AssetSymbol::Vests)
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precision = self.symbol.precision() as u32;
        let scale = 10i64.pow(precision);
        let sign = if self.amount < 0 { "-" } else { "" };
        let abs = self.amount.unsigned_abs();
        write!(
            f,
            "{}{}.{:0width$} {}",
            sign,
            abs / scale as u64,
            abs % scale as u64,
            self.symbol.as_str(),
            width = precision as usize
        )
    }
}

impl FromStr for Asset {
    type Err = BlockchainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || BlockchainError::InvalidOperation(format!("invalid asset '{}'", s));

        let mut parts = s.split_whitespace();
        let (number, symbol) = match (parts.next(), parts.next(), parts.next()) {
            (Some(n), Some(sym), None) => (n, sym.parse::<AssetSymbol>()?),
            _ => return Err(invalid()),
        };

        let precision = symbol.precision() as usize;
        let (negative, digits) = match number.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, number),
        };
        let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
        if whole.is_empty()
            || fraction.len() > precision
            || !whole.chars().all(|c| c.is_ascii_digit())
            || !fraction.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }

        let padded = format!("{}{:0<width$}", whole, fraction, width = precision);
        let amount: i64 = padded.parse().map_err(|_| invalid())?;
        Ok(Self::new(if negative { -amount } else { amount }, symbol))
    }
}

impl Serialize for Asset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Asset {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

impl HiveSerialize for Asset {
    fn write_to(&self, out: &mut Vec<u8>) {
        write_i64(out, self.amount);
        write_u8(out, self.symbol.precision());
        let mut name = [0u8; 7];
        let legacy = self.symbol.legacy_name().as_bytes();
        name[..legacy.len()].copy_from_slice(legacy);
        out.extend_from_slice(&name);
    }
}

// ---------------------------------------------------------------------------
// Operation payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteOperation {
    pub voter: String,
    pub author: String,
    pub permlink: String,
    pub weight: i16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentOperation {
    pub parent_author: String,
    pub parent_permlink: String,
    pub author: String,
    pub permlink: String,
    pub title: String,
    pub body: String,
    pub json_metadata: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferOperation {
    pub from: String,
    pub to: String,
    pub amount: Asset,
    pub memo: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferToVestingOperation {
    pub from: String,
    pub to: String,
    pub amount: Asset,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountWitnessVoteOperation {
    pub account: String,
    pub witness: String,
    pub approve: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteCommentOperation {
    pub author: String,
    pub permlink: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomJsonOperation {
    /// Sorted and de-duplicated, matching the chain's `flat_set` encoding.
    pub required_auths: BTreeSet<String>,
    pub required_posting_auths: BTreeSet<String>,
    pub id: String,
    /// JSON document, carried as a string.
    pub json: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferFromSavingsOperation {
    pub from: String,
    pub request_id: u32,
    pub to: String,
    pub amount: Asset,
    pub memo: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRewardBalanceOperation {
    pub account: String,
    pub reward_hive: Asset,
    pub reward_hbd: Asset,
    pub reward_vests: Asset,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegateVestingSharesOperation {
    pub delegator: String,
    pub delegatee: String,
    pub vesting_shares: Asset,
}

/// A single on-chain operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Vote(VoteOperation),
    Comment(CommentOperation),
    Transfer(TransferOperation),
    TransferToVesting(TransferToVestingOperation),
    AccountWitnessVote(AccountWitnessVoteOperation),
    DeleteComment(DeleteCommentOperation),
    CustomJson(CustomJsonOperation),
    TransferToSavings(TransferOperation),
    TransferFromSavings(TransferFromSavingsOperation),
    ClaimRewardBalance(ClaimRewardBalanceOperation),
    DelegateVestingShares(DelegateVestingSharesOperation),
}

impl Operation {
    /// Validated vote.
    pub fn vote(voter: &str, author: &str, permlink: &str, weight: i16) -> BlockchainResult<Self> {
        Self::validated(Operation::Vote(VoteOperation {
            voter: voter.to_string(),
            author: author.to_string(),
            permlink: permlink.to_string(),
            weight,
        }))
    }

    /// Validated transfer with memo.
    pub fn transfer(from: &str, to: &str, amount: Asset, memo: &str) -> BlockchainResult<Self> {
        Self::validated(Operation::Transfer(TransferOperation {
            from: from.to_string(),
            to: to.to_string(),
            amount,
            memo: memo.to_string(),
        }))
    }

    /// Validated custom_json. `json` is serialized to its string form.
    pub fn custom_json(
        id: &str,
        json: &Value,
        required_auths: Vec<String>,
        required_posting_auths: Vec<String>,
    ) -> BlockchainResult<Self> {
        let json = serde_json::to_string(json)
            .map_err(|e| BlockchainError::InvalidOperation(format!("custom_json body: {}", e)))?;
        Self::validated(Operation::CustomJson(CustomJsonOperation {
            required_auths: required_auths.into_iter().collect(),
            required_posting_auths: required_posting_auths.into_iter().collect(),
            id: id.to_string(),
            json,
        }))
    }

    fn validated(op: Self) -> BlockchainResult<Self> {
        op.validate()?;
        Ok(op)
    }

    /// Wire name, e.g. `"vote"`.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Vote(_) => "vote",
            Operation::Comment(_) => "comment",
            Operation::Transfer(_) => "transfer",
            Operation::TransferToVesting(_) => "transfer_to_vesting",
            Operation::AccountWitnessVote(_) => "account_witness_vote",
            Operation::DeleteComment(_) => "delete_comment",
            Operation::CustomJson(_) => "custom_json",
            Operation::TransferToSavings(_) => "transfer_to_savings",
            Operation::TransferFromSavings(_) => "transfer_from_savings",
            Operation::ClaimRewardBalance(_) => "claim_reward_balance",
            Operation::DelegateVestingShares(_) => "delegate_vesting_shares",
        }
    }

    /// Ordinal of the operation in the protocol's operation list.
    pub fn id(&self) -> u64 {
        match self {
            Operation::Vote(_) => 0,
            Operation::Comment(_) => 1,
            Operation::Transfer(_) => 2,
            Operation::TransferToVesting(_) => 3,
            Operation::AccountWitnessVote(_) => 12,
            Operation::DeleteComment(_) => 17,
            Operation::CustomJson(_) => 18,
            Operation::TransferToSavings(_) => 32,
            Operation::TransferFromSavings(_) => 33,
            Operation::ClaimRewardBalance(_) => 39,
            Operation::DelegateVestingShares(_) => 40,
        }
    }

    /// Weakest role whose key may authorize this operation.
    pub fn required_role(&self) -> Role {
        match self {
            Operation::Vote(_)
            | Operation::Comment(_)
            | Operation::DeleteComment(_)
            | Operation::ClaimRewardBalance(_) => Role::Posting,
            Operation::CustomJson(op) if op.required_auths.is_empty() => Role::Posting,
            Operation::CustomJson(_)
            | Operation::Transfer(_)
            | Operation::TransferToVesting(_)
            | Operation::AccountWitnessVote(_)
            | Operation::TransferToSavings(_)
            | Operation::TransferFromSavings(_)
            | Operation::DelegateVestingShares(_) => Role::Active,
        }
    }

    /// Field-level checks; a failing operation never reaches the signer.
    pub fn validate(&self) -> BlockchainResult<()> {
        match self {
            Operation::Vote(op) => {
                validate_account(&op.voter)?;
                validate_account(&op.author)?;
                validate_permlink(&op.permlink)?;
                if !(-MAX_VOTE_WEIGHT..=MAX_VOTE_WEIGHT).contains(&op.weight) {
                    return Err(invalid(format!(
                        "vote weight {} outside -{}..={}",
                        op.weight, MAX_VOTE_WEIGHT, MAX_VOTE_WEIGHT
                    )));
                }
            }
            Operation::Comment(op) => {
                if !op.parent_author.is_empty() {
                    validate_account(&op.parent_author)?;
                }
                validate_account(&op.author)?;
                validate_permlink(&op.permlink)?;
                if op.parent_permlink.len() > MAX_PERMLINK_LENGTH {
                    return Err(invalid("parent permlink too long".to_string()));
                }
                if !op.json_metadata.is_empty() {
                    validate_json(&op.json_metadata)?;
                }
            }
            Operation::Transfer(op) | Operation::TransferToSavings(op) => {
                validate_account(&op.from)?;
                validate_account(&op.to)?;
                validate_liquid_amount(&op.amount)?;
            }
            Operation::TransferToVesting(op) => {
                validate_account(&op.from)?;
                if !op.to.is_empty() {
                    validate_account(&op.to)?;
                }
                if op.amount.symbol != AssetSymbol::Hive || op.amount.amount <= 0 {
                    return Err(invalid(format!("cannot vest {}", op.amount)));
                }
            }
            Operation::AccountWitnessVote(op) => {
                validate_account(&op.account)?;
                validate_account(&op.witness)?;
            }
            Operation::DeleteComment(op) => {
                validate_account(&op.author)?;
                validate_permlink(&op.permlink)?;
            }
            Operation::CustomJson(op) => {
                if op.required_auths.is_empty() && op.required_posting_auths.is_empty() {
                    return Err(invalid("custom_json needs at least one required auth".to_string()));
                }
                for account in op.required_auths.iter().chain(&op.required_posting_auths) {
                    validate_account(account)?;
                }
                validate_custom_id(&op.id)?;
                validate_json(&op.json)?;
            }
            Operation::TransferFromSavings(op) => {
                validate_account(&op.from)?;
                validate_account(&op.to)?;
                validate_liquid_amount(&op.amount)?;
            }
            Operation::ClaimRewardBalance(op) => {
                validate_account(&op.account)?;
                let expected = [
                    (&op.reward_hive, AssetSymbol::Hive),
                    (&op.reward_hbd, AssetSymbol::Hbd),
                    (&op.reward_vests, AssetSymbol::Vests),
                ];
                for (asset, symbol) in expected {
                    if asset.symbol != symbol || asset.amount < 0 {
                        return Err(invalid(format!("invalid reward {}", asset)));
                    }
                }
            }
            Operation::DelegateVestingShares(op) => {
                validate_account(&op.delegator)?;
                validate_account(&op.delegatee)?;
                if op.vesting_shares.symbol != AssetSymbol::Vests || op.vesting_shares.amount < 0
                {
                    return Err(invalid(format!("cannot delegate {}", op.vesting_shares)));
                }
            }
        }
        Ok(())
    }
}

fn invalid(reason: String) -> BlockchainError {
    BlockchainError::InvalidOperation(reason)
}

/// Account names: 3-16 chars, dot-separated segments of at least 3 chars,
/// each starting with a letter and ending with a letter or digit.
pub fn validate_account(name: &str) -> BlockchainResult<()> {
    let bad = || invalid(format!("invalid account name '{}'", name));

    if !(3..=16).contains(&name.len()) {
        return Err(bad());
    }
    for segment in name.split('.') {
        let bytes = segment.as_bytes();
        if bytes.len() < 3
            || !bytes[0].is_ascii_lowercase()
            || !bytes[bytes.len() - 1].is_ascii_alphanumeric()
            || !bytes
                .iter()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-')
        {
            return Err(bad());
        }
    }
    Ok(())
}

fn validate_permlink(permlink: &str) -> BlockchainResult<()> {
    if permlink.is_empty() || permlink.len() > MAX_PERMLINK_LENGTH {
        return Err(invalid(format!("invalid permlink '{}'", permlink)));
    }
    if !permlink
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'_' || b == b'%')
    {
        return Err(invalid(format!("invalid permlink '{}'", permlink)));
    }
    Ok(())
}

fn validate_custom_id(id: &str) -> BlockchainResult<()> {
    if id.is_empty()
        || id.len() > MAX_CUSTOM_ID_LENGTH
        || !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(invalid(format!("invalid custom_json id '{}'", id)));
    }
    Ok(())
}

fn validate_json(json: &str) -> BlockchainResult<()> {
    serde_json::from_str::<Value>(json)
        .map(|_| ())
        .map_err(|e| invalid(format!("invalid JSON: {}", e)))
}

fn validate_liquid_amount(amount: &Asset) -> BlockchainResult<()> {
    if amount.symbol == AssetSymbol::Vests || amount.amount <= 0 {
        return Err(invalid(format!("cannot transfer {}", amount)));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

impl HiveSerialize for Operation {
    fn write_to(&self, out: &mut Vec<u8>) {
        write_varint(out, self.id());
        match self {
            Operation::Vote(op) => {
                write_string(out, &op.voter);
                write_string(out, &op.author);
                write_string(out, &op.permlink);
                write_i16(out, op.weight);
            }
            Operation::Comment(op) => {
                write_string(out, &op.parent_author);
                write_string(out, &op.parent_permlink);
                write_string(out, &op.author);
                write_string(out, &op.permlink);
                write_string(out, &op.title);
                write_string(out, &op.body);
                write_string(out, &op.json_metadata);
            }
            Operation::Transfer(op) | Operation::TransferToSavings(op) => {
                write_string(out, &op.from);
                write_string(out, &op.to);
                op.amount.write_to(out);
                write_string(out, &op.memo);
            }
            Operation::TransferToVesting(op) => {
                write_string(out, &op.from);
                write_string(out, &op.to);
                op.amount.write_to(out);
            }
            Operation::AccountWitnessVote(op) => {
                write_string(out, &op.account);
                write_string(out, &op.witness);
                write_bool(out, op.approve);
            }
            Operation::DeleteComment(op) => {
                write_string(out, &op.author);
                write_string(out, &op.permlink);
            }
            Operation::CustomJson(op) => {
                write_string_list(out, &op.required_auths);
                write_string_list(out, &op.required_posting_auths);
                write_string(out, &op.id);
                write_string(out, &op.json);
            }
            Operation::TransferFromSavings(op) => {
                write_string(out, &op.from);
                write_u32(out, op.request_id);
                write_string(out, &op.to);
                op.amount.write_to(out);
                write_string(out, &op.memo);
            }
            Operation::ClaimRewardBalance(op) => {
                write_string(out, &op.account);
                op.reward_hive.write_to(out);
                op.reward_hbd.write_to(out);
                op.reward_vests.write_to(out);
            }
            Operation::DelegateVestingShares(op) => {
                write_string(out, &op.delegator);
                write_string(out, &op.delegatee);
                op.vesting_shares.write_to(out);
            }
        }
    }
}

impl Serialize for Operation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let name = self.name();
        match self {
            Operation::Vote(op) => (name, op).serialize(serializer),
            Operation::Comment(op) => (name, op).serialize(serializer),
            Operation::Transfer(op) | Operation::TransferToSavings(op) => {
                (name, op).serialize(serializer)
            }
            Operation::TransferToVesting(op) => (name, op).serialize(serializer),
            Operation::AccountWitnessVote(op) => (name, op).serialize(serializer),
            Operation::DeleteComment(op) => (name, op).serialize(serializer),
            Operation::CustomJson(op) => (name, op).serialize(serializer),
            Operation::TransferFromSavings(op) => (name, op).serialize(serializer),
            Operation::ClaimRewardBalance(op) => (name, op).serialize(serializer),
            Operation::DelegateVestingShares(op) => (name, op).serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Operation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (name, body): (String, Value) = Deserialize::deserialize(deserializer)?;
        let op = match name.as_str() {
            "vote" => Operation::Vote(from_body(body)?),
            "comment" => Operation::Comment(from_body(body)?),
            "transfer" => Operation::Transfer(from_body(body)?),
            "transfer_to_vesting" => Operation::TransferToVesting(from_body(body)?),
            "account_witness_vote" => Operation::AccountWitnessVote(from_body(body)?),
            "delete_comment" => Operation::DeleteComment(from_body(body)?),
            "custom_json" => Operation::CustomJson(from_body(body)?),
            "transfer_to_savings" => Operation::TransferToSavings(from_body(body)?),
            "transfer_from_savings" => Operation::TransferFromSavings(from_body(body)?),
            "claim_reward_balance" => Operation::ClaimRewardBalance(from_body(body)?),
            "delegate_vesting_shares" => Operation::DelegateVestingShares(from_body(body)?),
            other => {
                return Err(D::Error::custom(format!("unsupported operation '{}'", other)))
            }
        };
        Ok(op)
    }
}

fn from_body<T: serde::de::DeserializeOwned, E: serde::de::Error>(body: Value) -> Result<T, E> {
    serde_json::from_value(body).map_err(E::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_asset_parse_and_display() {
        let asset: Asset = "1.000 HIVE".parse().unwrap();
        assert_eq!(asset, Asset::hive(1000));
        assert_eq!(asset.to_string(), "1.000 HIVE");

        assert_eq!("0.5 HBD".parse::<Asset>().unwrap(), Asset::hbd(500));
        assert_eq!(
            "12.345678 VESTS".parse::<Asset>().unwrap(),
            Asset::vests(12_345_678)
        );
        assert_eq!(Asset::hbd(-1500).to_string(), "-1.500 HBD");

        assert!("1.0001 HIVE".parse::<Asset>().is_err());
        assert!("1.000 DOGE".parse::<Asset>().is_err());
        assert!("HIVE".parse::<Asset>().is_err());
    }

    #[test]
    fn test_asset_binary_uses_legacy_symbol() {
        let bytes = Asset::hive(1000).to_bytes();
        assert_eq!(bytes.len(), 16);
        assert_eq!(&bytes[..8], &1000i64.to_le_bytes());
        assert_eq!(bytes[8], 3);
        assert_eq!(&bytes[9..], b"STEEM\0\0");
    }

    #[test]
    fn test_vote_encoding() {
        let op = Operation::vote("alice", "bob", "post1", 10_000).unwrap();
        let mut expected = vec![0x00];
        expected.extend_from_slice(b"\x05alice\x03bob\x05post1");
        expected.extend_from_slice(&[0x10, 0x27]);
        assert_eq!(op.to_bytes(), expected);
    }

    #[test]
    fn test_vote_validation() {
        assert!(Operation::vote("alice", "bob", "post1", 10_001).is_err());
        assert!(Operation::vote("alice", "bob", "post1", -10_000).is_ok());
        assert!(Operation::vote("Alice", "bob", "post1", 100).is_err());
        assert!(Operation::vote("alice", "bob", "", 100).is_err());
    }

    #[test]
    fn test_account_names() {
        assert!(validate_account("alice").is_ok());
        assert!(validate_account("hive-123456").is_ok());
        assert!(validate_account("a.b").is_err());
        assert!(validate_account("abc.def").is_ok());
        assert!(validate_account("ab").is_err());
        assert!(validate_account("1abc").is_err());
        assert!(validate_account("abc-").is_err());
        assert!(validate_account("averyveryverylongname").is_err());
    }

    #[test]
    fn test_required_roles() {
        let vote = Operation::vote("alice", "bob", "post1", 100).unwrap();
        assert_eq!(vote.required_role(), Role::Posting);

        let transfer = Operation::transfer("alice", "bob", Asset::hive(1), "").unwrap();
        assert_eq!(transfer.required_role(), Role::Active);

        let follow = Operation::custom_json(
            "follow",
            &json!(["follow", {"follower": "alice", "following": "bob", "what": ["blog"]}]),
            vec![],
            vec!["alice".into()],
        )
        .unwrap();
        assert_eq!(follow.required_role(), Role::Posting);

        let engine = Operation::custom_json(
            "ssc-mainnet-hive",
            &json!({"contract": "tokens"}),
            vec!["alice".into()],
            vec![],
        )
        .unwrap();
        assert_eq!(engine.required_role(), Role::Active);
    }

    #[test]
    fn test_custom_json_validation() {
        let body = json!({});
        assert!(Operation::custom_json("has space", &body, vec![], vec!["alice".into()]).is_err());
        assert!(Operation::custom_json("ok_id", &body, vec![], vec![]).is_err());
        assert!(Operation::custom_json(&"x".repeat(33), &body, vec![], vec!["alice".into()]).is_err());
    }

    #[test]
    fn test_custom_json_auths_are_canonical() {
        let body = json!({"k": 1});
        let reversed =
            Operation::custom_json("app", &body, vec![], vec!["bob".into(), "alice".into()]).unwrap();
        let sorted = Operation::custom_json(
            "app",
            &body,
            vec![],
            vec!["alice".into(), "bob".into(), "alice".into()],
        )
        .unwrap();
        assert_eq!(reversed.to_bytes(), sorted.to_bytes());

        let value = serde_json::to_value(&reversed).unwrap();
        assert_eq!(value[1]["required_posting_auths"], json!(["alice", "bob"]));

        let parsed: Operation = serde_json::from_value(json!([
            "custom_json",
            {"required_auths": [], "required_posting_auths": ["bob", "alice"], "id": "app", "json": "{\"k\":1}"}
        ]))
        .unwrap();
        assert_eq!(parsed.to_bytes(), sorted.to_bytes());
    }

    #[test]
    fn test_transfer_validation() {
        assert!(Operation::transfer("alice", "bob", Asset::hive(0), "").is_err());
        assert!(Operation::transfer("alice", "bob", Asset::vests(10), "").is_err());
        assert!(Operation::transfer("alice", "bob", Asset::hbd(10), "thanks").is_ok());
    }

    #[test]
    fn test_condenser_json_form() {
        let op = Operation::vote("alice", "bob", "post1", 10_000).unwrap();
        let value = serde_json::to_value(&op).unwrap();
        assert_eq!(
            value,
            json!(["vote", {"voter": "alice", "author": "bob", "permlink": "post1", "weight": 10000}])
        );

        let parsed: Operation = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, op);

        let transfer = json!(["transfer", {"from": "alice", "to": "bob", "amount": "1.000 HIVE", "memo": ""}]);
        let parsed: Operation = serde_json::from_value(transfer).unwrap();
        assert_eq!(parsed.id(), 2);

        let unknown = json!(["pow", {}]);
        assert!(serde_json::from_value::<Operation>(unknown).is_err());
    }
}
