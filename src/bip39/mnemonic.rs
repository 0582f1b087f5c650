use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha512;
use thiserror::Error;

use crate::hash;

/// PBKDF2 iteration count fixed by BIP39.
const PBKDF2_ROUNDS: u32 = 2048;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MnemonicError {
    #[error("phrase must contain 12 or 24 words, got {0}")]
    BadWordCount(usize),

    #[error("entropy must be 16 or 32 bytes, got {0}")]
    BadEntropyLength(usize),

    #[error("word '{0}' is not in the BIP39 wordlist")]
    UnknownWord(String),

    #[error("mnemonic checksum mismatch")]
    ChecksumMismatch,
}

/// Supported phrase lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordCount {
    Twelve,
    TwentyFour,
}

impl WordCount {
    fn entropy_bytes(self) -> usize {
        match self {
            WordCount::Twelve => 16,
            WordCount::TwentyFour => 32,
        }
    }
}

/// A validated BIP39 mnemonic phrase. The stored phrase is normalized:
/// trimmed, lowercased, single-spaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mnemonic {
    phrase: String,
}

fn wordlist() -> &'static [&'static str] {
    bip39::Language::English.words_by_prefix("")
}

impl Mnemonic {
    /// Generate a fresh mnemonic from OS randomness.
    pub fn generate(count: WordCount) -> Self {
        let mut entropy = vec![0u8; count.entropy_bytes()];
        OsRng.fill_bytes(&mut entropy);
        // Length is 16 or 32 by construction.
        Self::from_entropy(&entropy).expect("entropy length is valid")
    }

    /// Build a mnemonic from raw entropy (16 or 32 bytes). The checksum
    /// is the high `entropy_len/4` bits of SHA256(entropy).
    pub fn from_entropy(entropy: &[u8]) -> Result<Self, MnemonicError> {
        if entropy.len() != 16 && entropy.len() != 32 {
            return Err(MnemonicError::BadEntropyLength(entropy.len()));
        }

        let checksum = hash::sha256(entropy)[0];
        let entropy_bits = entropy.len() * 8;
        let checksum_bits = entropy.len() / 4;

        // Bit i of the stream entropy | checksum, most significant first.
        let bit = |i: usize| -> usize {
            if i < entropy_bits {
                ((entropy[i / 8] >> (7 - i % 8)) & 1) as usize
            } else {
                ((checksum >> (7 - (i - entropy_bits))) & 1) as usize
            }
        };

        let list = wordlist();
        let word_count = (entropy_bits + checksum_bits) / 11;
        let mut words = Vec::with_capacity(word_count);
        for w in 0..word_count {
            let mut index = 0usize;
            for b in 0..11 {
                index = (index << 1) | bit(w * 11 + b);
            }
            words.push(list[index]);
        }

        Ok(Self {
            phrase: words.join(" "),
        })
    }

    /// Parse and validate a phrase: word count, wordlist membership and
    /// checksum. Case-insensitive, whitespace-normalized.
    pub fn from_phrase(phrase: &str) -> Result<Self, MnemonicError> {
        let normalized = phrase.trim().to_lowercase();
        let words: Vec<&str> = normalized.split_whitespace().collect();
        if words.len() != 12 && words.len() != 24 {
            return Err(MnemonicError::BadWordCount(words.len()));
        }

        let list = wordlist();
        let mut indices = Vec::with_capacity(words.len());
        for word in &words {
            let index = list
                .binary_search(word)
                .map_err(|_| MnemonicError::UnknownWord(word.to_string()))?;
            indices.push(index);
        }

        // Reassemble the bitstream and split it back into entropy and
        // checksum.
        let total_bits = indices.len() * 11;
        let entropy_bits = total_bits * 32 / 33;
        let checksum_bits = total_bits - entropy_bits;

        let bit = |i: usize| -> u8 {
            let index = indices[i / 11];
            ((index >> (10 - i % 11)) & 1) as u8
        };

        let mut entropy = vec![0u8; entropy_bits / 8];
        for i in 0..entropy_bits {
            entropy[i / 8] |= bit(i) << (7 - i % 8);
        }

        let expected = hash::sha256(&entropy)[0];
        for i in 0..checksum_bits {
            if bit(entropy_bits + i) != (expected >> (7 - i)) & 1 {
                return Err(MnemonicError::ChecksumMismatch);
            }
        }

        Ok(Self {
            phrase: words.join(" "),
        })
    }

    /// Whether a phrase passes word-count, wordlist and checksum checks.
    pub fn validate(phrase: &str) -> bool {
        Self::from_phrase(phrase).is_ok()
    }

    /// The normalized phrase.
    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    /// Derive the 512-bit BIP39 seed: PBKDF2-HMAC-SHA512 over the
    /// normalized phrase, salted with "mnemonic" plus the passphrase,
    /// 2048 iterations.
    pub fn to_seed(&self, passphrase: &str) -> [u8; 64] {
        let salt = format!("mnemonic{}", passphrase);
        let mut seed = [0u8; 64];
        pbkdf2_hmac::<Sha512>(
            self.phrase.as_bytes(),
            salt.as_bytes(),
            PBKDF2_ROUNDS,
            &mut seed,
        );
        seed
    }
}
