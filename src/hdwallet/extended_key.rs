use secp256k1::{PublicKey, SecretKey, SECP256K1};

use crate::hash;
use crate::hdwallet::{derive_child, Path, HDWError};
use crate::key::KeyPair;
use crate::network;

/// Key material of an extended key: a private scalar or a compressed
/// curve point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KeyMaterial {
    Private(SecretKey),
    Public(PublicKey),
}

/// A node in the BIP32 key tree: key material plus the chain code and
/// the metadata linking it to its parent.
///
/// Extended keys are ephemeral values recomputed from the seed on
/// demand; they are never persisted by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtendedKey {
    pub(crate) material: KeyMaterial,
    pub(crate) chain_code: [u8; 32],
    pub depth: u8,
    pub parent_fingerprint: [u8; 4],
    /// Child index under the parent; the high bit marks hardened
    /// derivation.
    pub child_index: u32,
}

impl ExtendedKey {
    /// Derive the master key from a 64-byte BIP39 seed:
    /// HMAC-SHA512(key = "Bitcoin seed", data = seed), left half the
    /// key, right half the chain code.
    pub fn master_from_seed(seed: &[u8]) -> Result<Self, HDWError> {
        if seed.len() != 64 {
            return Err(HDWError::BadSeedLength(seed.len()));
        }

        let digest = hash::hmac_sha512(b"Bitcoin seed", seed);
        let secret =
            SecretKey::from_slice(&digest[0..32]).map_err(|_| HDWError::InvalidMasterKey)?;

        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&digest[32..64]);

        Ok(Self {
            material: KeyMaterial::Private(secret),
            chain_code,
            depth: 0,
            parent_fingerprint: [0u8; 4],
            child_index: 0,
        })
    }

    pub fn is_private(&self) -> bool {
        matches!(self.material, KeyMaterial::Private(_))
    }

    pub fn chain_code(&self) -> [u8; 32] {
        self.chain_code
    }

    /// The raw private key bytes, if this is a private extended key.
    pub fn private_key_bytes(&self) -> Option<[u8; 32]> {
        match self.material {
            KeyMaterial::Private(secret) => Some(secret.secret_bytes()),
            KeyMaterial::Public(_) => None,
        }
    }

    /// The compressed public key for this node.
    pub fn public_key_bytes(&self) -> [u8; 33] {
        match self.material {
            KeyMaterial::Private(secret) => {
                PublicKey::from_secret_key(SECP256K1, &secret).serialize()
            }
            KeyMaterial::Public(public) => public.serialize(),
        }
    }

    /// First 4 bytes of hash160 of the public key. Links a child to its
    /// parent for display and debugging only.
    pub fn fingerprint(&self) -> [u8; 4] {
        let digest = hash::hash160(self.public_key_bytes());
        [digest[0], digest[1], digest[2], digest[3]]
    }

    /// Drop the private material, leaving a public-only extended key
    /// that can still derive non-hardened children.
    pub fn to_public(&self) -> Self {
        let material = match self.material {
            KeyMaterial::Private(secret) => {
                KeyMaterial::Public(PublicKey::from_secret_key(SECP256K1, &secret))
            }
            KeyMaterial::Public(public) => KeyMaterial::Public(public),
        };
        Self { material, ..*self }
    }

    /// Convert to a signing key pair. Fails on public-only keys.
    pub fn to_key_pair(&self) -> Result<KeyPair, HDWError> {
        match self.private_key_bytes() {
            Some(bytes) => Ok(KeyPair::from_private_key(&bytes)?),
            None => Err(HDWError::NotPrivate),
        }
    }

    /// Derive the key at a path string such as "m/44'/1669'/0'/0/0".
    pub fn derive_path(&self, path: &str) -> Result<Self, HDWError> {
        let parsed = Path::from_str(path)?;
        let mut current = *self;
        for &index in &parsed.components {
            current = derive_child(&current, index)?;
        }
        Ok(current)
    }

    /// Derive the BIP44 key m/44'/1669'/account'/change/address_index.
    pub fn derive_meowcoin_key(
        &self,
        account: u32,
        change: u32,
        address_index: u32,
    ) -> Result<Self, HDWError> {
        let path = format!(
            "m/44'/{}'/{}'/{}/{}",
            network::BIP44_COIN_TYPE,
            account,
            change,
            address_index
        );
        self.derive_path(&path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bip32_vector_1_master_core() {
        // https://github.com/bitcoin/bips/blob/master/bip-0032.mediawiki,
        // test vector 1. The official vector seed is 16 bytes while the
        // wallet always feeds 64-byte BIP39 seeds, so the HMAC core is
        // checked directly here; the child chain is covered in ckd.rs.
        let seed = hex::decode("000102030405060708090a0b0c0d0e0f").unwrap();
        let digest = crate::hash::hmac_sha512(b"Bitcoin seed", &seed);
        assert_eq!(
            hex::encode(&digest[0..32]),
            "e8f32e723decf4051aefac8e2c93c9c5b214313817cdb01a1494b917c8436b35"
        );
        assert_eq!(
            hex::encode(&digest[32..64]),
            "873dff81c02f525623fd1fe5167eac3a55a049de3d314bb42ee227ffed37d508"
        );
    }

    #[test]
    fn master_is_deterministic() {
        let seed = [7u8; 64];
        let a = ExtendedKey::master_from_seed(&seed).unwrap();
        let b = ExtendedKey::master_from_seed(&seed).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.depth, 0);
        assert_eq!(a.parent_fingerprint, [0u8; 4]);
        assert!(a.is_private());
    }

    #[test]
    fn rejects_short_seed() {
        assert_eq!(
            ExtendedKey::master_from_seed(&[0u8; 32]),
            Err(HDWError::BadSeedLength(32))
        );
    }

    #[test]
    fn zero_seed_regression_oracle() {
        // seed = 64 zero bytes -> m/44'/1669'/0'/0/0 must be stable
        // across releases.
        let master = ExtendedKey::master_from_seed(&[0u8; 64]).unwrap();
        assert_eq!(
            hex::encode(master.private_key_bytes().unwrap()),
            "eafd15702fca3f80beb565e66f19e20bbad0a34b46bb12075cbf1c5d94bb27d2"
        );

        let child = master.derive_path("m/44'/1669'/0'/0/0").unwrap();
        assert_eq!(
            hex::encode(child.private_key_bytes().unwrap()),
            "3a821924291ad3a5e46a2752f27090edcbbe50b284fc89f973050473cd8e4a4d"
        );
        assert_eq!(
            child.to_key_pair().unwrap().to_address(),
            "MGkBpVSq4tEiq8ov2gMVv1PKiD8zKGGRYq"
        );
    }

    #[test]
    fn to_public_strips_private_material() {
        let master = ExtendedKey::master_from_seed(&[1u8; 64]).unwrap();
        let public = master.to_public();
        assert!(!public.is_private());
        assert_eq!(public.private_key_bytes(), None);
        assert_eq!(public.public_key_bytes(), master.public_key_bytes());
        assert_eq!(public.to_key_pair(), Err(HDWError::NotPrivate));
    }
}
