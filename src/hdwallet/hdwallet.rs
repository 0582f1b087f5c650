/*
    Wallet-level wrapper around the BIP32 key tree.

    Keys live under the BIP44 account m/44'/1669'/0'; external
    (receiving) addresses sit on the change=0 branch, internal change
    addresses on change=1.
*/

use crate::address::Address;
use crate::bip39::{Mnemonic, WordCount};
use crate::hdwallet::{ExtendedKey, HDWError};
use crate::key::KeyPair;

/// Number of addresses scanned per branch when matching an address
/// back to its key.
const DEFAULT_SCAN_LIMIT: u32 = 50;

/// An HD wallet rooted in a BIP39 mnemonic. Holds the master extended
/// key and the phrase it was derived from; all addresses and signing
/// keys are recomputed from the master on demand.
#[derive(Debug, Clone)]
pub struct HdWallet {
    master: ExtendedKey,
    mnemonic: Mnemonic,
}

impl HdWallet {
    /// Create a wallet from a freshly generated mnemonic with an empty
    /// passphrase.
    pub fn create(count: WordCount) -> Result<Self, HDWError> {
        let mnemonic = Mnemonic::generate(count);
        Self::from_mnemonic(&mnemonic, "")
    }

    /// Restore a wallet from an existing mnemonic and passphrase.
    pub fn from_mnemonic(mnemonic: &Mnemonic, passphrase: &str) -> Result<Self, HDWError> {
        let seed = mnemonic.to_seed(passphrase);
        Ok(Self {
            master: ExtendedKey::master_from_seed(&seed)?,
            mnemonic: mnemonic.clone(),
        })
    }

    /// The mnemonic this wallet was created from. Callers are expected
    /// to treat it as the wallet backup.
    pub fn mnemonic(&self) -> &Mnemonic {
        &self.mnemonic
    }

    /// The master extended key (account 0 root is derived from it).
    pub fn master_key(&self) -> &ExtendedKey {
        &self.master
    }

    /// Signing key for the external branch at `index`.
    pub fn receiving_key(&self, index: u32) -> Result<KeyPair, HDWError> {
        self.master.derive_meowcoin_key(0, 0, index)?.to_key_pair()
    }

    /// Signing key for the internal (change) branch at `index`.
    pub fn change_key(&self, index: u32) -> Result<KeyPair, HDWError> {
        self.master.derive_meowcoin_key(0, 1, index)?.to_key_pair()
    }

    pub fn receiving_address(&self, index: u32) -> Result<String, HDWError> {
        Ok(Address::from_public_key(
            &self.receiving_key(index)?.compressed_public_key(),
        ))
    }

    pub fn change_address(&self, index: u32) -> Result<String, HDWError> {
        Ok(Address::from_public_key(
            &self.change_key(index)?.compressed_public_key(),
        ))
    }

    /// Receiving addresses for indices `start..start + count`.
    pub fn receiving_addresses(&self, count: u32, start: u32) -> Result<Vec<String>, HDWError> {
        (start..start + count)
            .map(|index| self.receiving_address(index))
            .collect()
    }

    /// Scan both branches up to `max_scan` indices for the key behind
    /// `address`. Returns `Ok(None)` when the address is not one of
    /// ours within the scan window.
    pub fn find_key_for_address(
        &self,
        address: &str,
        max_scan: Option<u32>,
    ) -> Result<Option<KeyPair>, HDWError> {
        let limit = max_scan.unwrap_or(DEFAULT_SCAN_LIMIT);
        for change in [0, 1] {
            for index in 0..limit {
                let pair = self.master.derive_meowcoin_key(0, change, index)?.to_key_pair()?;
                if pair.to_address() == address {
                    return Ok(Some(pair));
                }
            }
        }
        Ok(None)
    }
}
