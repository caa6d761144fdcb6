#![forbid(unsafe_code)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::multiple_crate_versions
)]

//! ODIS primitives: Keccak-256, 32-byte ABI words, and EIP-712 typed data hashing.
//
// This crate implements the byte-exact utilities shared by the ODIS domain crates:
//
// - Keccak-256 (the pre-standard SHA-3 padding used by Ethereum)
// - Big-endian 32-byte ABI words for the EIP-712 atomic types
// - Hex helpers for `0x`-prefixed addresses and byte strings

use primitive_types::U256;
use sha3::{Digest, Keccak256};

/// 32-byte hash (Keccak-256 output).
pub type Hash256 = [u8; 32];

/// 32-byte ABI word.
pub type Word = [u8; 32];

/// 20-byte account address.
pub type Address = [u8; 20];

pub mod constants;
pub mod eip712;

pub use eip712::Eip712Error;

/// Keccak-256 of a single byte string.
#[must_use]
pub fn keccak256(input: &[u8]) -> Hash256 {
    keccak256_concat(&[input])
}

/// Keccak-256 over the concatenation of `parts`, without copying them into one buffer.
#[must_use]
pub fn keccak256_concat(parts: &[&[u8]]) -> Hash256 {
    let mut hasher = Keccak256::new();
    for p in parts {
        hasher.update(p);
    }
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

/// ABI word for a `bool`.
#[must_use]
pub fn word_from_bool(b: bool) -> Word {
    let mut w = [0u8; 32];
    w[31] = u8::from(b);
    w
}

/// ABI word for an unsigned integer (big-endian, left padded).
#[must_use]
pub fn word_from_u256(x: U256) -> Word {
    let mut w = [0u8; 32];
    x.to_big_endian(&mut w);
    w
}

/// ABI word for a signed integer (two's complement, sign extended).
#[must_use]
pub fn word_from_i128(x: i128) -> Word {
    let mut w = if x < 0 { [0xFFu8; 32] } else { [0u8; 32] };
    w[16..].copy_from_slice(&x.to_be_bytes());
    w
}

/// ABI word for an address (left padded with 12 zero bytes).
#[must_use]
pub fn word_from_address(a: &Address) -> Word {
    let mut w = [0u8; 32];
    w[12..].copy_from_slice(a);
    w
}

/// Decode a hex string with an optional `0x` prefix.
pub fn decode_hex(s: &str) -> Result<Vec<u8>, Eip712Error> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    hex::decode(digits).map_err(|_| Eip712Error::InvalidValue {
        kind: "hex".into(),
        reason: format!("not a hex string: {s:?}"),
    })
}

/// Parse a `0x`-prefixed, 40 hex digit address. Checksum casing is not enforced.
pub fn parse_address(s: &str) -> Result<Address, Eip712Error> {
    let invalid = || Eip712Error::InvalidValue {
        kind: "address".into(),
        reason: format!("expected 0x followed by 40 hex digits, got {s:?}"),
    };
    let digits = s.strip_prefix("0x").ok_or_else(invalid)?;
    if digits.len() != 40 {
        return Err(invalid());
    }
    let bytes = hex::decode(digits).map_err(|_| invalid())?;
    let mut out = [0u8; 20];
    out.copy_from_slice(&bytes);
    Ok(out)
}

/// Lowercase `0x`-prefixed hex encoding.
#[must_use]
pub fn to_hex_prefixed(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}
