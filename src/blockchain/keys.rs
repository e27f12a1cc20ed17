//! Key material: WIF private keys, `STM` public keys and compact signatures.
//!
//! # Security
//! - Private keys are parsed into memory only; nothing here writes them out
//! - `Debug` on `PrivateKey` never prints the secret

use ripemd::Ripemd160;
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey as SecpPublicKey, SecretKey, SECP256K1};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

use crate::blockchain::types::{BlockchainError, BlockchainResult};

/// Address prefix of Hive public keys.
pub const PUBLIC_KEY_PREFIX: &str = "STM";

const WIF_VERSION: u8 = 0x80;
const MAX_CANONICAL_ATTEMPTS: u32 = 1024;

pub(crate) fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

fn ripemd160(data: &[u8]) -> [u8; 20] {
    Ripemd160::digest(data).into()
}

/// secp256k1 signing key.
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKey {
    secret: SecretKey,
}

impl PrivateKey {
    /// Decode a wallet-import-format key.
    pub fn from_wif(wif: &str) -> BlockchainResult<Self> {
        let raw = bs58::decode(wif.trim())
            .into_vec()
            .map_err(|e| BlockchainError::InvalidKey(format!("WIF is not base58: {}", e)))?;

        if raw.len() != 37 {
            return Err(BlockchainError::InvalidKey(format!(
                "WIF decodes to {} bytes, expected 37",
                raw.len()
            )));
        }
        if raw[0] != WIF_VERSION {
            return Err(BlockchainError::InvalidKey(format!(
                "unexpected WIF version byte 0x{:02x}",
                raw[0]
            )));
        }

        let (payload, checksum) = raw.split_at(33);
        if sha256(&sha256(payload))[..4] != *checksum {
            return Err(BlockchainError::InvalidKey("WIF checksum mismatch".to_string()));
        }

        Self::from_bytes(&payload[1..])
    }

    /// Build a key from 32 raw secret bytes.
    pub fn from_bytes(bytes: &[u8]) -> BlockchainResult<Self> {
        let secret = SecretKey::from_slice(bytes)
            .map_err(|e| BlockchainError::InvalidKey(format!("invalid secret: {}", e)))?;
        Ok(Self { secret })
    }

    /// Derive the key for `role` from an account password (`sha256(account + role + password)`).
    pub fn from_password(account: &str, role: &str, password: &str) -> BlockchainResult<Self> {
        let seed = format!("{}{}{}", account, role, password);
        Self::from_bytes(&sha256(seed.as_bytes()))
    }

    pub fn to_wif(&self) -> String {
        let mut payload = Vec::with_capacity(37);
        payload.push(WIF_VERSION);
        payload.extend_from_slice(&self.secret.secret_bytes());
        let checksum = sha256(&sha256(&payload));
        payload.extend_from_slice(&checksum[..4]);
        bs58::encode(payload).into_string()
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.secret.public_key(SECP256K1))
    }

    /// Sign a 32-byte digest, returning a canonical compact signature.
    ///
    /// Nonces come from RFC6979; when the result is not canonical the nonce is
    /// re-derived with a counter as extra data, so the output stays deterministic.
    pub fn sign_digest(&self, digest: &[u8; 32]) -> BlockchainResult<CompactSignature> {
        let message = Message::from_digest_slice(digest)
            .map_err(|e| BlockchainError::InvalidKey(format!("invalid digest: {}", e)))?;

        for attempt in 0..MAX_CANONICAL_ATTEMPTS {
            let signature = if attempt == 0 {
                SECP256K1.sign_ecdsa_recoverable(&message, &self.secret)
            } else {
                let mut extra = [0u8; 32];
                extra[..4].copy_from_slice(&attempt.to_le_bytes());
                SECP256K1.sign_ecdsa_recoverable_with_noncedata(&message, &self.secret, &extra)
            };

            let (recovery_id, body) = signature.serialize_compact();
            if is_canonical(&body) {
                let mut bytes = [0u8; 65];
                // compressed (4) + compact (27)
                bytes[0] = recovery_id.to_i32() as u8 + 31;
                bytes[1..].copy_from_slice(&body);
                return Ok(CompactSignature(bytes));
            }
        }

        Err(BlockchainError::InvalidKey(
            "could not produce a canonical signature".to_string(),
        ))
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("public_key", &self.public_key().to_string())
            .finish_non_exhaustive()
    }
}

impl FromStr for PrivateKey {
    type Err = BlockchainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_wif(s)
    }
}

fn is_canonical(body: &[u8; 64]) -> bool {
    body[0] & 0x80 == 0
        && !(body[0] == 0 && body[1] & 0x80 == 0)
        && body[32] & 0x80 == 0
        && !(body[32] == 0 && body[33] & 0x80 == 0)
}

/// Compressed secp256k1 public key, displayed as `STM` + base58.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey(SecpPublicKey);

impl PublicKey {
    pub fn from_bytes(bytes: &[u8]) -> BlockchainResult<Self> {
        SecpPublicKey::from_slice(bytes)
            .map(Self)
            .map_err(|e| BlockchainError::InvalidKey(format!("invalid public key: {}", e)))
    }

    /// 33-byte compressed encoding.
    pub fn to_bytes(&self) -> [u8; 33] {
        self.0.serialize()
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = self.to_bytes();
        let mut payload = key.to_vec();
        payload.extend_from_slice(&ripemd160(&key)[..4]);
        write!(f, "{}{}", PUBLIC_KEY_PREFIX, bs58::encode(payload).into_string())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self)
    }
}

impl FromStr for PublicKey {
    type Err = BlockchainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let encoded = s.trim().strip_prefix(PUBLIC_KEY_PREFIX).ok_or_else(|| {
            BlockchainError::InvalidKey(format!("public key must start with {}", PUBLIC_KEY_PREFIX))
        })?;
        let raw = bs58::decode(encoded)
            .into_vec()
            .map_err(|e| BlockchainError::InvalidKey(format!("public key is not base58: {}", e)))?;
        if raw.len() != 37 {
            return Err(BlockchainError::InvalidKey(format!(
                "public key decodes to {} bytes, expected 37",
                raw.len()
            )));
        }

        let (key, checksum) = raw.split_at(33);
        if ripemd160(key)[..4] != *checksum {
            return Err(BlockchainError::InvalidKey("public key checksum mismatch".to_string()));
        }
        Self::from_bytes(key)
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// 65-byte recoverable signature: header byte followed by `r || s`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompactSignature(pub [u8; 65]);

impl CompactSignature {
    /// Recover the public key that produced this signature over `digest`.
    pub fn recover(&self, digest: &[u8; 32]) -> BlockchainResult<PublicKey> {
        let header = self.0[0];
        let recovery = match header {
            31..=34 => header - 31,
            27..=30 => header - 27,
            _ => {
                return Err(BlockchainError::InvalidKey(format!(
                    "invalid signature header {}",
                    header
                )))
            }
        };

        let recovery_id = RecoveryId::from_i32(recovery as i32)
            .map_err(|e| BlockchainError::InvalidKey(format!("invalid recovery id: {}", e)))?;
        let signature = RecoverableSignature::from_compact(&self.0[1..], recovery_id)
            .map_err(|e| BlockchainError::InvalidKey(format!("invalid signature: {}", e)))?;
        let message = Message::from_digest_slice(digest)
            .map_err(|e| BlockchainError::InvalidKey(format!("invalid digest: {}", e)))?;

        SECP256K1
            .recover_ecdsa(&message, &signature)
            .map(PublicKey)
            .map_err(|e| BlockchainError::InvalidKey(format!("recovery failed: {}", e)))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for CompactSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CompactSignature({})", self.to_hex())
    }
}

impl FromStr for CompactSignature {
    type Err = BlockchainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)
            .map_err(|e| BlockchainError::InvalidKey(format!("signature is not hex: {}", e)))?;
        let array: [u8; 65] = bytes
            .try_into()
            .map_err(|_| BlockchainError::InvalidKey("signature must be 65 bytes".to_string()))?;
        Ok(Self(array))
    }
}

impl Serialize for CompactSignature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for CompactSignature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Private key 0C28FCA3...AA1D in uncompressed WIF form.
    const TEST_WIF: &str = "5HueCGU8rMjxEXxiPuD5BDku4MkFqeZyd4dZ1jvhTVqvbTLvyTJ";
    const TEST_SECRET_HEX: &str =
        "0c28fca386c7a227600b2fe50b7cae11ec86d3bf1fbe471be89827e19d72aa1d";

    #[test]
    fn test_wif_decode() {
        let key = PrivateKey::from_wif(TEST_WIF).unwrap();
        assert_eq!(
            hex::encode(key.secret.secret_bytes()),
            TEST_SECRET_HEX
        );
        assert_eq!(key.to_wif(), TEST_WIF);
    }

    #[test]
    fn test_invalid_wif() {
        assert!(PrivateKey::from_wif("not-a-key").is_err());
        assert!(PrivateKey::from_wif("").is_err());

        // Flip one character: checksum must catch it.
        let tampered = TEST_WIF.replacen('5', "6", 1);
        let err = PrivateKey::from_wif(&tampered).unwrap_err();
        assert!(matches!(err, BlockchainError::InvalidKey(_)));
    }

    #[test]
    fn test_public_key_format() {
        let key = PrivateKey::from_wif(TEST_WIF).unwrap();
        let public = key.public_key();
        let text = public.to_string();

        assert!(text.starts_with("STM"));
        assert_eq!(text.parse::<PublicKey>().unwrap(), public);

        assert!(text.replacen("STM", "GPH", 1).parse::<PublicKey>().is_err());
    }

    #[test]
    fn test_password_derivation() {
        let posting = PrivateKey::from_password("alice", "posting", "secret").unwrap();
        let again = PrivateKey::from_password("alice", "posting", "secret").unwrap();
        let active = PrivateKey::from_password("alice", "active", "secret").unwrap();

        assert_eq!(posting, again);
        assert_ne!(posting.public_key(), active.public_key());
    }

    #[test]
    fn test_sign_and_recover() {
        let key = PrivateKey::from_password("alice", "posting", "secret").unwrap();
        let digest = sha256(b"hello hive");

        let signature = key.sign_digest(&digest).unwrap();
        assert!((31..=34).contains(&signature.0[0]));
        assert!(is_canonical(signature.0[1..].try_into().unwrap()));
        assert_eq!(signature.recover(&digest).unwrap(), key.public_key());
    }

    #[test]
    fn test_deterministic_signature() {
        let key = PrivateKey::from_password("bob", "active", "hunter2").unwrap();
        let digest = sha256(b"same message");

        let first = key.sign_digest(&digest).unwrap();
        let second = key.sign_digest(&digest).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_signature_hex_roundtrip() {
        let key = PrivateKey::from_password("carol", "posting", "pw").unwrap();
        let signature = key.sign_digest(&sha256(b"x")).unwrap();

        let json = serde_json::to_string(&signature).unwrap();
        let parsed: CompactSignature = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, signature);
        assert!("abcd".parse::<CompactSignature>().is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let key = PrivateKey::from_wif(TEST_WIF).unwrap();
        let debug = format!("{:?}", key);
        assert!(!debug.contains(TEST_SECRET_HEX));
        assert!(!debug.contains(TEST_WIF));
    }
}
