/*
    BIP32 child key derivation for private and public parents.
*/

use secp256k1::{Scalar, SECP256K1};

use crate::hash;
use crate::hdwallet::extended_key::KeyMaterial;
use crate::hdwallet::{ExtendedKey, HDWError};

/// Indices at or above this are hardened.
pub const HARDENED_OFFSET: u32 = 0x8000_0000;

/// Derive the child of `parent` at `index`. The high bit of `index`
/// selects hardened derivation, which requires a private parent.
///
/// Per BIP32 an index can (with negligible probability) produce an
/// invalid key; that surfaces as `DerivationFailed` or `InfinityPoint`
/// and the caller is expected to move to the next index.
pub fn derive_child(parent: &ExtendedKey, index: u32) -> Result<ExtendedKey, HDWError> {
    // Depth is a single byte in the BIP32 serialization format.
    let depth = parent
        .depth
        .checked_add(1)
        .ok_or(HDWError::MaxDepthExceeded)?;
    let hardened = index >= HARDENED_OFFSET;

    // HMAC-SHA512 input: 0x00 | parent_priv | index for hardened,
    // parent_compressed_pub | index otherwise.
    let mut data = Vec::with_capacity(37);
    if hardened {
        match parent.private_key_bytes() {
            Some(secret) => {
                data.push(0x00);
                data.extend_from_slice(&secret);
            }
            None => return Err(HDWError::HardenedFromPublic),
        }
    } else {
        data.extend_from_slice(&parent.public_key_bytes());
    }
    data.extend_from_slice(&index.to_be_bytes());

    let digest = hash::hmac_sha512(&parent.chain_code, &data);

    let tweak_bytes: [u8; 32] = digest[0..32]
        .try_into()
        .expect("HMAC-SHA512 output is 64 bytes");
    let tweak =
        Scalar::from_be_bytes(tweak_bytes).map_err(|_| HDWError::DerivationFailed(index))?;

    let material = match parent.material {
        // child = (left + parent) mod n; zero results are rejected.
        KeyMaterial::Private(secret) => KeyMaterial::Private(
            secret
                .add_tweak(&tweak)
                .map_err(|_| HDWError::DerivationFailed(index))?,
        ),
        // child = parent_point + left*G; infinity is rejected.
        KeyMaterial::Public(public) => KeyMaterial::Public(
            public
                .add_exp_tweak(SECP256K1, &tweak)
                .map_err(|_| HDWError::InfinityPoint(index))?,
        ),
    };

    let mut chain_code = [0u8; 32];
    chain_code.copy_from_slice(&digest[32..64]);

    Ok(ExtendedKey {
        material,
        chain_code,
        depth,
        parent_fingerprint: parent.fingerprint(),
        child_index: index,
    })
}
