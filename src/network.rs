/*
    Meowcoin chain parameters used by the wallet core.

    Source: https://github.com/Meowcoin-Foundation/Meowcoin/blob/main/src/chainparams.cpp
*/

pub const COIN_NAME: &str = "Meowcoin";
pub const COIN_TICKER: &str = "MEWC";

/// Registered BIP44 coin type (m/44'/1669'/...).
pub const BIP44_COIN_TYPE: u32 = 1669;

// Base58 version bytes.
pub const PUBKEY_ADDRESS_VERSION: u8 = 50; // 0x32, addresses start with 'M'
pub const SCRIPT_ADDRESS_VERSION: u8 = 122; // 0x7A, P2SH
pub const SECRET_KEY_VERSION: u8 = 112; // 0x70, WIF

/// Current Meowcoin transaction version.
pub const TX_VERSION: i32 = 2;

/// Outputs at or below this value (satoshis) are folded into the fee
/// rather than created as change.
pub const DUST_THRESHOLD: i64 = 100_000;

/// Default fee rate in satoshis per byte.
pub const DEFAULT_FEE_RATE: i64 = 1_000;

pub const COIN_DECIMALS: u32 = 8;
pub const COIN_MULTIPLIER: i64 = 100_000_000; // 1 MEWC = 10^8 satoshis

/// A public Electrum (Stratum) server for the Meowcoin network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElectrumServer {
    pub host: &'static str,
    /// Unencrypted TCP port.
    pub tcp_port: u16,
    /// SSL/TLS port.
    pub ssl_port: u16,
}

/// Known public Electrum servers, tried in order when connecting.
pub const ELECTRUM_SERVERS: [ElectrumServer; 3] = [
    ElectrumServer {
        host: "electrum.mewccrypto.com",
        tcp_port: 50001,
        ssl_port: 50002,
    },
    ElectrumServer {
        host: "meowelectrum.xyz",
        tcp_port: 50001,
        ssl_port: 50002,
    },
    ElectrumServer {
        host: "meowelectrum2.testtopper.biz",
        tcp_port: 50001,
        ssl_port: 50002,
    },
];
