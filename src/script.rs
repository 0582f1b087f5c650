/*
    Script construction for the P2PKH outputs this wallet spends and
    creates.

    scriptPubKey layout:
        OP_DUP OP_HASH160 <20-byte hash> OP_EQUALVERIFY OP_CHECKSIG
*/

use crate::address::{Address, AddressError};
use crate::hash;

const OP_DUP: u8 = 0x76;
const OP_HASH160: u8 = 0xA9;
const OP_EQUALVERIFY: u8 = 0x88;
const OP_CHECKSIG: u8 = 0xAC;

/// Build a P2PKH scriptPubKey paying the given public key hash.
pub fn p2pkh_from_hash160(pubkey_hash: &[u8; 20]) -> Vec<u8> {
    let mut script = Vec::with_capacity(25);
    script.push(OP_DUP);
    script.push(OP_HASH160);
    script.push(20);
    script.extend_from_slice(pubkey_hash);
    script.push(OP_EQUALVERIFY);
    script.push(OP_CHECKSIG);
    script
}

/// Build a P2PKH scriptPubKey paying the given base58check address.
pub fn p2pkh_from_address(address: &str) -> Result<Vec<u8>, AddressError> {
    Ok(p2pkh_from_hash160(&Address::to_hash160(address)?))
}

/// Build the scriptSig unlocking a P2PKH output: the DER signature
/// with its sighash byte appended, then the compressed public key,
/// each as a push.
pub fn p2pkh_script_sig(signature_with_hashtype: &[u8], public_key: &[u8; 33]) -> Vec<u8> {
    let mut script = Vec::with_capacity(2 + signature_with_hashtype.len() + public_key.len());
    script.push(signature_with_hashtype.len() as u8);
    script.extend_from_slice(signature_with_hashtype);
    script.push(public_key.len() as u8);
    script.extend_from_slice(public_key);
    script
}

/// Whether a script has the exact P2PKH template shape.
pub fn is_p2pkh(script: &[u8]) -> bool {
    script.len() == 25
        && script[0] == OP_DUP
        && script[1] == OP_HASH160
        && script[2] == 20
        && script[23] == OP_EQUALVERIFY
        && script[24] == OP_CHECKSIG
}

/// Electrum script hash for an address: SHA256 of its scriptPubKey,
/// byte-reversed, hex encoded.
pub fn electrum_script_hash(address: &str) -> Result<String, AddressError> {
    let script = p2pkh_from_address(address)?;
    let mut digest = hash::sha256(&script);
    digest.reverse();
    Ok(hex::encode(digest))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDRESS: &str = "MGkBpVSq4tEiq8ov2gMVv1PKiD8zKGGRYq";

    #[test]
    fn builds_p2pkh_script_pubkey() {
        let script = p2pkh_from_address(ADDRESS).unwrap();
        assert_eq!(
            hex::encode(&script),
            "76a9146106b69fc8a03ff8e8ffa13e9a73aedc9f1d6d7388ac"
        );
        assert!(is_p2pkh(&script));
    }

    #[test]
    fn rejects_foreign_address() {
        assert!(p2pkh_from_address("1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa").is_err());
    }

    #[test]
    fn script_sig_layout() {
        let signature = vec![0x30, 0x06, 0x02, 0x01, 0x01, 0x02, 0x01, 0x01, 0x01];
        let pubkey = [0x02u8; 33];
        let script = p2pkh_script_sig(&signature, &pubkey);

        assert_eq!(script[0] as usize, signature.len());
        assert_eq!(&script[1..1 + signature.len()], &signature[..]);
        assert_eq!(script[1 + signature.len()] as usize, pubkey.len());
        assert_eq!(script.len(), 2 + signature.len() + pubkey.len());
    }

    #[test]
    fn non_template_scripts_are_rejected() {
        assert!(!is_p2pkh(&[]));
        assert!(!is_p2pkh(&[0u8; 25]));
        let mut script = p2pkh_from_address(ADDRESS).unwrap();
        script[24] = 0x00;
        assert!(!is_p2pkh(&script));
    }

    #[test]
    fn electrum_script_hash_is_reversed_sha256() {
        assert_eq!(
            electrum_script_hash(ADDRESS).unwrap(),
            "18b71650fa5a1890d10bb4209803a9a9c907e7bdc145fcf845cf41b13f212b3e"
        );
    }
}
