/*
    BIP39 mnemonic phrases and seed derivation.

    Reference:
        https://github.com/bitcoin/bips/blob/master/bip-0039.mediawiki
*/

mod mnemonic;

pub use mnemonic::{Mnemonic, MnemonicError, WordCount};
