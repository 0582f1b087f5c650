/*
    BIP32 hierarchical deterministic key derivation, BIP44 path
    conventions and the HD wallet wrapper built on them.

    Reference:
        https://github.com/bitcoin/bips/blob/master/bip-0032.mediawiki
*/

mod ckd;
mod extended_key;
#[allow(clippy::module_inception)]
mod hdwallet;
mod path;

pub use ckd::{derive_child, HARDENED_OFFSET};
pub use extended_key::ExtendedKey;
pub use hdwallet::HdWallet;
pub use path::Path;

use thiserror::Error;

use crate::bip39::MnemonicError;
use crate::key::KeyError;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HDWError {
    #[error("seed must be 64 bytes, got {0}")]
    BadSeedLength(usize),

    #[error("master key out of range for the curve")]
    InvalidMasterKey,

    #[error("cannot derive a hardened child from a public-only key")]
    HardenedFromPublic,

    #[error("child key derivation failed at index {0:#010x}; retry with the next index")]
    DerivationFailed(u32),

    #[error("derived public key is the point at infinity at index {0:#010x}")]
    InfinityPoint(u32),

    #[error("derivation depth exceeds 255")]
    MaxDepthExceeded,

    #[error("malformed derivation path '{0}'")]
    MalformedPath(String),

    #[error("child index {0} exceeds 2^31 - 1")]
    IndexTooLarge(u32),

    #[error("operation requires a private extended key")]
    NotPrivate,

    #[error(transparent)]
    Mnemonic(#[from] MnemonicError),

    #[error(transparent)]
    Key(#[from] KeyError),
}
