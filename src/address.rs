/*
    Meowcoin P2PKH address derivation and validation.

    Version byte 50 (0x32) gives addresses starting with 'M'; P2SH
    addresses use version 122 (0x7A).
*/

use thiserror::Error;

use crate::encoding::base58::{Base58, Base58Error};
use crate::hash;
use crate::network;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error(transparent)]
    Base58(#[from] Base58Error),

    #[error("unknown address version byte {0:#04x}")]
    UnknownVersion(u8),

    #[error("address payload must be 20 bytes, got {0}")]
    BadPayloadLength(usize),
}

pub struct Address;

impl Address {
    /// Derive a P2PKH address from a compressed public key.
    pub fn from_public_key(compressed_pubkey: &[u8]) -> String {
        let pubkey_hash = hash::hash160(compressed_pubkey);
        Base58::check_encode(network::PUBKEY_ADDRESS_VERSION, &pubkey_hash)
    }

    /// Extract the hash160 payload of an address, checking the checksum,
    /// version byte and payload length.
    pub fn to_hash160(address: &str) -> Result<[u8; 20], AddressError> {
        let (version, payload) = Base58::check_decode(address)?;
        if version != network::PUBKEY_ADDRESS_VERSION
            && version != network::SCRIPT_ADDRESS_VERSION
        {
            return Err(AddressError::UnknownVersion(version));
        }
        let hash: [u8; 20] = payload
            .as_slice()
            .try_into()
            .map_err(|_| AddressError::BadPayloadLength(payload.len()))?;
        Ok(hash)
    }

    /// Whether the string is a well-formed Meowcoin address. Never
    /// panics on malformed input.
    pub fn is_valid(address: &str) -> bool {
        Self::to_hash160(address).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KeyPair;

    #[test]
    fn derived_addresses_start_with_m_and_validate() {
        for _ in 0..8 {
            let key = KeyPair::generate();
            let address = key.to_address();
            assert!(address.starts_with('M'), "unexpected prefix: {}", address);
            assert!(Address::is_valid(&address));
        }
    }

    #[test]
    fn known_pubkey_address() {
        let pubkey =
            hex::decode("03fd4bb6546238ffd8241a2166324ffc5ce2d61bd088c7bb78f4020940e7347add")
                .unwrap();
        assert_eq!(
            Address::from_public_key(&pubkey),
            "MGkBpVSq4tEiq8ov2gMVv1PKiD8zKGGRYq"
        );
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(!Address::is_valid(""));
        assert!(!Address::is_valid("not an address"));
        assert!(!Address::is_valid("MGkBpVSq4tEiq8ov2gMVv1PKiD8zKGGRYr")); // mutated
        // Bitcoin address: valid Base58Check, wrong version byte.
        assert!(!Address::is_valid("1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa"));
    }

    #[test]
    fn hash160_round_trip() {
        let key = KeyPair::generate();
        let address = key.to_address();
        let hash = Address::to_hash160(&address).unwrap();
        assert_eq!(hash, crate::hash::hash160(key.compressed_public_key()));
    }
}
