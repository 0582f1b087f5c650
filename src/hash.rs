/*
    Hash primitives shared across the wallet core: address hashing,
    Base58Check checksums, BIP32 key chaining and signature hashes.
*/

use hmac::{Hmac, Mac};
use ripemd::Ripemd160;
use sha2::{Digest, Sha256, Sha512};

/// SHA-256 of the input.
pub fn sha256<T: AsRef<[u8]>>(input: T) -> [u8; 32] {
    Sha256::digest(input).into()
}

/// Double SHA-256, used for checksums, signature hashes and txids.
pub fn sha256d<T: AsRef<[u8]>>(input: T) -> [u8; 32] {
    sha256(sha256(input))
}

/// RIPEMD-160 of the input.
pub fn ripemd160<T: AsRef<[u8]>>(input: T) -> [u8; 20] {
    Ripemd160::digest(input).into()
}

/// RIPEMD160(SHA256(input)), the address hash.
pub fn hash160<T: AsRef<[u8]>>(input: T) -> [u8; 20] {
    ripemd160(sha256(input))
}

/// HMAC-SHA512 keyed with `key`, used by BIP32 derivation.
pub fn hmac_sha512(key: &[u8], data: &[u8]) -> [u8; 64] {
    let mut mac =
        Hmac::<Sha512>::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().into()
}
