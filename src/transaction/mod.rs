/*
    Transaction construction and signing for P2PKH spends.

    The wire layout follows the chain's consensus serialization:
        version | varint(inputs) | inputs | varint(outputs) | outputs | locktime
*/

mod builder;
pub mod encode;

pub use builder::{build_transaction, estimate_size, select_utxos};

use thiserror::Error;

use crate::address::AddressError;
use crate::key::KeyError;

/// An unspent output as reported by the Electrum index. `tx_hash` is
/// the display-order (reversed) hex transaction id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utxo {
    pub tx_hash: String,
    pub output_index: u32,
    pub value: i64,
    pub script_pub_key: String,
}

/// A payment destination for a transaction being built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutput {
    pub address: String,
    pub value: i64,
}

/// A fully signed transaction ready for broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    /// Hex-encoded wire bytes.
    pub tx_hex: String,
    /// Display-order transaction id: reverse(sha256d(wire bytes)).
    pub tx_id: String,
    /// Wire size in bytes.
    pub size: usize,
    /// Fee paid, in satoshi. Includes any dust change absorbed into it.
    pub fee: i64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TxError {
    #[error("no spendable UTXOs supplied")]
    NoUtxos,

    #[error("transaction has no outputs")]
    NoOutputs,

    #[error("total output amount must be positive")]
    NonPositiveAmount,

    #[error("insufficient funds: need {needed} satoshi, have {available}")]
    InsufficientFunds { needed: i64, available: i64 },

    #[error("UTXO transaction hash '{0}' is not 32 bytes of hex")]
    BadTxHash(String),

    #[error("UTXO scriptPubKey '{0}' is not valid hex")]
    BadScript(String),

    #[error("transaction bytes truncated: wanted {wanted} more, {remaining} left")]
    Truncated { wanted: usize, remaining: usize },

    #[error(transparent)]
    Address(#[from] AddressError),

    #[error(transparent)]
    Key(#[from] KeyError),
}
