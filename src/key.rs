/*
    secp256k1 key pairs for Meowcoin.

    Signing is deterministic (RFC6979 nonces) and always low-S, matching
    the network's standardness policy. WIF import/export uses the chain's
    secret key version byte (0x70); export always emits the compressed
    form.
*/

use rand::rngs::OsRng;
use rand::RngCore;
use secp256k1::ecdsa::Signature;
use secp256k1::{Message, PublicKey, SecretKey, SECP256K1};
use thiserror::Error;

use crate::address::Address;
use crate::encoding::base58::{Base58, Base58Error};
use crate::network;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("private key out of range (must be in (0, curve order))")]
    OutOfRange,

    #[error("invalid private key hex: {0}")]
    InvalidHex(String),

    #[error("invalid WIF version byte {0:#04x} (expected 0x70)")]
    InvalidVersion(u8),

    #[error("invalid WIF payload length {0} (expected 32 or 33)")]
    InvalidLength(usize),

    #[error("message hash must be 32 bytes, got {0}")]
    InvalidHashLength(usize),

    #[error(transparent)]
    Base58(#[from] Base58Error),
}

/// A secp256k1 key pair. The public key is always derived from the
/// private key, never stored independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPair {
    secret: SecretKey,
    public: PublicKey,
}

impl KeyPair {
    /// Generate a key pair from OS randomness. Candidates of zero or at
    /// least the curve order are rejected and redrawn.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        loop {
            OsRng.fill_bytes(&mut bytes);
            if let Ok(secret) = SecretKey::from_slice(&bytes) {
                return Self::from_secret(secret);
            }
        }
    }

    fn from_secret(secret: SecretKey) -> Self {
        Self {
            secret,
            public: PublicKey::from_secret_key(SECP256K1, &secret),
        }
    }

    /// Restore a key pair from a 32-byte private key.
    pub fn from_private_key(bytes: &[u8]) -> Result<Self, KeyError> {
        if bytes.len() != 32 {
            return Err(KeyError::OutOfRange);
        }
        let secret = SecretKey::from_slice(bytes).map_err(|_| KeyError::OutOfRange)?;
        Ok(Self::from_secret(secret))
    }

    /// Restore a key pair from a private key hex string.
    pub fn from_private_key_hex(hex_str: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_str).map_err(|e| KeyError::InvalidHex(e.to_string()))?;
        Self::from_private_key(&bytes)
    }

    /// Import a private key from Wallet Import Format. Accepts both the
    /// compressed form (33-byte payload ending in 0x01) and the bare
    /// 32-byte payload.
    pub fn from_wif(wif: &str) -> Result<Self, KeyError> {
        let (version, payload) = Base58::check_decode(wif)?;
        if version != network::SECRET_KEY_VERSION {
            return Err(KeyError::InvalidVersion(version));
        }

        let key_bytes = match payload.len() {
            33 if payload[32] == 0x01 => &payload[0..32],
            32 => &payload[..],
            len => return Err(KeyError::InvalidLength(len)),
        };

        Self::from_private_key(key_bytes)
    }

    /// Export the private key in Wallet Import Format, compressed form.
    pub fn to_wif(&self) -> String {
        let mut payload = [0u8; 33];
        payload[0..32].copy_from_slice(&self.secret.secret_bytes());
        payload[32] = 0x01; // compressed flag
        Base58::check_encode(network::SECRET_KEY_VERSION, &payload)
    }

    /// The private key as a lowercase hex string.
    pub fn private_key_hex(&self) -> String {
        hex::encode(self.secret.secret_bytes())
    }

    /// The compressed public key (33 bytes).
    pub fn compressed_public_key(&self) -> [u8; 33] {
        self.public.serialize()
    }

    /// The uncompressed public key (65 bytes).
    pub fn uncompressed_public_key(&self) -> [u8; 65] {
        self.public.serialize_uncompressed()
    }

    /// The P2PKH address for this key pair.
    pub fn to_address(&self) -> String {
        Address::from_public_key(&self.compressed_public_key())
    }

    /// Sign a 32-byte message hash. Returns the DER-encoded signature.
    ///
    /// Nonces are deterministic per RFC6979 and the signature is
    /// normalized to low-S.
    pub fn sign(&self, message_hash: &[u8]) -> Result<Vec<u8>, KeyError> {
        let message = Message::from_digest_slice(message_hash)
            .map_err(|_| KeyError::InvalidHashLength(message_hash.len()))?;

        let mut signature = SECP256K1.sign_ecdsa(&message, &self.secret);
        signature.normalize_s();
        Ok(signature.serialize_der().to_vec())
    }

    /// Verify a DER-encoded signature against a 32-byte message hash.
    /// Malformed DER verifies as false rather than erroring.
    pub fn verify(&self, message_hash: &[u8], der_signature: &[u8]) -> Result<bool, KeyError> {
        let message = Message::from_digest_slice(message_hash)
            .map_err(|_| KeyError::InvalidHashLength(message_hash.len()))?;

        let mut signature = match Signature::from_der(der_signature) {
            Ok(sig) => sig,
            Err(_) => return Ok(false),
        };
        signature.normalize_s();

        Ok(SECP256K1
            .verify_ecdsa(&message, &signature, &self.public)
            .is_ok())
    }
}
