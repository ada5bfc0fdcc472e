// src/address.rs

//! 34-byte UMI address: a big-endian 16-bit version word followed by an
//! Ed25519 public key.
//!
//! The version word packs a three-letter lowercase prefix as three 5-bit
//! character fields (`a..z` mapped to `1..26`), so `v = (c0 << 10) |
//! (c1 << 5) | c2`. The all-zero word is reserved for the seven-character
//! `genesis` sentinel.

use thiserror::Error;

use crate::bech32;
use crate::codec::{get_u16, put_u16};

pub const ADDRESS_LENGTH: usize = 34;

pub(crate) const VER_GENESIS: u16 = 0;
pub(crate) const VER_UMI: u16 = 21929;

const GENESIS_PREFIX: &str = "genesis";

/// Every Bech32 or prefix decoding failure collapses into this one error;
/// callers only ever need to know that the text was not an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid address")]
pub struct InvalidAddress;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    /// A zero-key address with the default `umi` prefix.
    pub fn new() -> Self {
        let mut bytes = [0u8; ADDRESS_LENGTH];
        put_u16(&mut bytes, 0, VER_UMI);

        Address(bytes)
    }

    /// An `umi` address owning the given public key.
    pub fn from_public_key(key: &[u8; 32]) -> Self {
        let mut adr = Address::new();
        adr.set_public_key(key);

        adr
    }

    /// A zero-key address with a validated prefix.
    pub fn with_prefix(prefix: &str) -> Result<Self, InvalidAddress> {
        let mut adr = Address::new();
        adr.set_prefix(prefix)?;

        Ok(adr)
    }

    pub fn from_bech32(s: &str) -> Result<Self, InvalidAddress> {
        let (prefix, key) = bech32::decode(s)?;

        let mut adr = Address::from_public_key(&key);
        adr.set_prefix(&prefix)?;

        Ok(adr)
    }

    pub fn bech32(&self) -> String {
        bech32::encode(&self.prefix(), &self.public_key())
    }

    pub fn version(&self) -> u16 {
        get_u16(&self.0, 0)
    }

    pub fn set_version(&mut self, version: u16) {
        put_u16(&mut self.0, 0, version);
    }

    pub fn prefix(&self) -> String {
        unpack_prefix(self.version())
    }

    pub fn set_prefix(&mut self, prefix: &str) -> Result<(), InvalidAddress> {
        self.set_version(pack_prefix(prefix)?);

        Ok(())
    }

    pub fn public_key(&self) -> [u8; 32] {
        let mut key = [0u8; 32];
        key.copy_from_slice(&self.0[2..]);

        key
    }

    pub fn set_public_key(&mut self, key: &[u8; 32]) {
        self.0[2..].copy_from_slice(key);
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8; ADDRESS_LENGTH] {
        &mut self.0
    }
}

impl Default for Address {
    fn default() -> Self {
        Address::new()
    }
}

impl From<[u8; ADDRESS_LENGTH]> for Address {
    fn from(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Address(bytes)
    }
}

impl TryFrom<&[u8]> for Address {
    type Error = InvalidAddress;

    fn try_from(bytes: &[u8]) -> Result<Self, InvalidAddress> {
        if bytes.len() != ADDRESS_LENGTH {
            return Err(InvalidAddress);
        }

        let mut adr = [0u8; ADDRESS_LENGTH];
        adr.copy_from_slice(bytes);

        Ok(Address(adr))
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Pack a prefix into the 16-bit version word. Accepts `genesis` or exactly
/// three lowercase ASCII letters.
pub(crate) fn pack_prefix(prefix: &str) -> Result<u16, InvalidAddress> {
    if prefix == GENESIS_PREFIX {
        return Ok(VER_GENESIS);
    }

    let bytes = prefix.as_bytes();
    if bytes.len() != 3 || !bytes.iter().all(|b| b.is_ascii_lowercase()) {
        return Err(InvalidAddress);
    }

    let c = |i: usize| u16::from(bytes[i] - 96);

    Ok((c(0) << 10) | (c(1) << 5) | c(2))
}

/// Unpack a version word into its textual prefix. The inverse of
/// [`pack_prefix`] for valid words; out-of-range character fields map to
/// whatever byte `field + 96` lands on, mirroring the wire behaviour of the
/// protocol.
pub(crate) fn unpack_prefix(version: u16) -> String {
    if version == VER_GENESIS {
        return GENESIS_PREFIX.to_string();
    }

    [version >> 10, version >> 5, version]
        .iter()
        .map(|&field| char::from((field & 31) as u8 + 96))
        .collect()
}

/// A version word is valid when it is the genesis sentinel or when all three
/// character fields fall in `1..=26` (`a..z`).
pub(crate) fn version_is_valid(version: u16) -> bool {
    if version == VER_GENESIS {
        return true;
    }

    [version >> 10, version >> 5, version]
        .iter()
        .all(|&field| matches!(field & 31, 1..=26))
}
