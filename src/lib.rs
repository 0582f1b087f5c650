/*
    Non-custodial wallet core for the Meowcoin network.

    Implements the cryptographic and transaction-construction engine of
    a light (SPV) wallet:
        - Base58Check encoding for addresses and WIF keys
        - secp256k1 key pairs with deterministic (RFC6979) low-S ECDSA
        - BIP39 mnemonic phrases and seed derivation
        - BIP32/BIP44 hierarchical key derivation (coin type 1669)
        - Raw P2PKH transaction building and SIGHASH_ALL signing
        - An asynchronous Electrum/Stratum JSON-RPC client

    References:
        - BIP32/BIP39/BIP44 (https://github.com/bitcoin/bips)
        - Electrum protocol (https://electrumx.readthedocs.io/en/latest/protocol.html)
        - Meowcoin chain parameters
          (https://github.com/Meowcoin-Foundation/Meowcoin/blob/main/src/chainparams.cpp)

    The UI, encrypted key store and local cache live outside this crate;
    everything here operates on caller-owned inputs and returns typed errors.
*/

pub mod address;
pub mod bip39;
pub mod electrum;
pub mod encoding;
pub mod hash;
pub mod hdwallet;
pub mod key;
pub mod network;
pub mod script;
pub mod transaction;

pub use crate::address::Address;
pub use crate::electrum::ElectrumClient;
pub use crate::encoding::base58::{Base58, Base58Error};
pub use crate::hdwallet::{ExtendedKey, HdWallet};
pub use crate::key::KeyPair;
pub use crate::transaction::{SignedTransaction, TxOutput, Utxo};
