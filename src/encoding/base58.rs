/*
    Base58 and Base58Check codec used by Meowcoin addresses and WIF keys.

    Base58Check layout: version byte | payload | first 4 bytes of
    SHA256(SHA256(version | payload)).
*/

use thiserror::Error;

use crate::hash;

const ALPHABET: &[u8; 58] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

// Maps an ASCII byte to its base58 digit, -1 for characters outside the
// alphabet.
const DIGITS: [i8; 128] = [
    -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, //
    -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, //
    -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, //
    -1, 0, 1, 2, 3, 4, 5, 6, 7, 8, -1, -1, -1, -1, -1, -1, //
    -1, 9, 10, 11, 12, 13, 14, 15, 16, -1, 17, 18, 19, 20, 21, -1, //
    22, 23, 24, 25, 26, 27, 28, 29, 30, 31, 32, -1, -1, -1, -1, -1, //
    -1, 33, 34, 35, 36, 37, 38, 39, 40, 41, 42, 43, -1, 44, 45, 46, //
    47, 48, 49, 50, 51, 52, 53, 54, 55, 56, 57, -1, -1, -1, -1, -1, //
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Base58Error {
    #[error("invalid base58 character '{0}'")]
    InvalidCharacter(char),

    #[error("decoded data too short for a checksum ({0} bytes)")]
    TooShort(usize),

    #[error("checksum mismatch")]
    ChecksumMismatch,
}

pub struct Base58;

impl Base58 {
    /// Encode bytes as base58. Leading zero bytes are preserved as
    /// leading '1' characters. Empty input encodes to the empty string.
    pub fn encode(data: &[u8]) -> String {
        let zeros = data.iter().take_while(|&&b| b == 0).count();

        // Repeated divmod of the big-endian base-256 number by 58,
        // collecting remainders as base58 digits (least significant first).
        let mut digits: Vec<u8> = Vec::with_capacity(data.len() * 138 / 100 + 1);
        for &byte in &data[zeros..] {
            let mut carry = byte as u32;
            for digit in digits.iter_mut() {
                let value = (*digit as u32) * 256 + carry;
                *digit = (value % 58) as u8;
                carry = value / 58;
            }
            while carry > 0 {
                digits.push((carry % 58) as u8);
                carry /= 58;
            }
        }

        let mut out = String::with_capacity(zeros + digits.len());
        for _ in 0..zeros {
            out.push('1');
        }
        for &digit in digits.iter().rev() {
            out.push(ALPHABET[digit as usize] as char);
        }
        out
    }

    /// Decode a base58 string into bytes. Fails on any character outside
    /// the 58-symbol alphabet.
    pub fn decode(encoded: &str) -> Result<Vec<u8>, Base58Error> {
        let mut digits: Vec<u8> = Vec::with_capacity(encoded.len());
        for c in encoded.chars() {
            let digit = if (c as usize) < DIGITS.len() {
                DIGITS[c as usize]
            } else {
                -1
            };
            if digit < 0 {
                return Err(Base58Error::InvalidCharacter(c));
            }
            digits.push(digit as u8);
        }

        let zeros = digits.iter().take_while(|&&d| d == 0).count();

        // Inverse divmod: base-58 digits back into base-256 bytes.
        let mut bytes: Vec<u8> = Vec::with_capacity(encoded.len());
        for &digit in &digits[zeros..] {
            let mut carry = digit as u32;
            for byte in bytes.iter_mut() {
                let value = (*byte as u32) * 58 + carry;
                *byte = (value % 256) as u8;
                carry = value / 256;
            }
            while carry > 0 {
                bytes.push((carry % 256) as u8);
                carry /= 256;
            }
        }

        let mut out = vec![0u8; zeros];
        out.extend(bytes.iter().rev());
        Ok(out)
    }

    /// Base58Check-encode a payload under the given version byte.
    pub fn check_encode(version: u8, payload: &[u8]) -> String {
        let mut data = Vec::with_capacity(1 + payload.len() + 4);
        data.push(version);
        data.extend_from_slice(payload);
        let checksum = hash::sha256d(&data);
        data.extend_from_slice(&checksum[0..4]);
        Self::encode(&data)
    }

    /// Decode a Base58Check string, verify the trailing checksum, and
    /// return the version byte and payload.
    pub fn check_decode(encoded: &str) -> Result<(u8, Vec<u8>), Base58Error> {
        let decoded = Self::decode(encoded)?;
        if decoded.len() < 5 {
            return Err(Base58Error::TooShort(decoded.len()));
        }

        let (data, checksum) = decoded.split_at(decoded.len() - 4);
        if hash::sha256d(data)[0..4] != *checksum {
            return Err(Base58Error::ChecksumMismatch);
        }

        Ok((data[0], data[1..].to_vec()))
    }
}
