// src/transaction.rs

//! 150-byte UMI transaction record.
//!
//! The buffer is the canonical form: accessors read and write fixed offsets,
//! and signing covers the leading 85 bytes directly, so there is nothing to
//! re-serialize. Later operation versions overlay the recipient slot with
//! structure fields; the accessors expose both views and the verifier
//! decides which one is live.

use std::borrow::Cow;
use std::time::SystemTime;

use ed25519_dalek::SigningKey;

use crate::address::{Address, InvalidAddress, ADDRESS_LENGTH};
use crate::codec::{get_u16, get_u64, put_u16, put_u64};
use crate::crypto::{self, Hash};

pub const TRANSACTION_LENGTH: usize = 150;

/// Structure names are capped at 35 bytes of UTF-8.
pub const MAX_NAME_LENGTH: usize = 35;

/// The eight operation kinds, in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TxVersion {
    Genesis = 0,
    Basic = 1,
    CreateStructure = 2,
    UpdateStructure = 3,
    UpdateProfitAddress = 4,
    UpdateFeeAddress = 5,
    CreateTransitAddress = 6,
    DeleteTransitAddress = 7,
}

impl TxVersion {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(TxVersion::Genesis),
            1 => Some(TxVersion::Basic),
            2 => Some(TxVersion::CreateStructure),
            3 => Some(TxVersion::UpdateStructure),
            4 => Some(TxVersion::UpdateProfitAddress),
            5 => Some(TxVersion::UpdateFeeAddress),
            6 => Some(TxVersion::CreateTransitAddress),
            7 => Some(TxVersion::DeleteTransitAddress),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction([u8; TRANSACTION_LENGTH]);

impl Transaction {
    /// A zeroed transaction with the `Basic` version stamped.
    pub fn new() -> Self {
        Transaction::with_version(TxVersion::Basic)
    }

    pub fn with_version(version: TxVersion) -> Self {
        let mut bytes = [0u8; TRANSACTION_LENGTH];
        bytes[0] = version as u8;

        Transaction(bytes)
    }

    /// The raw version byte; unverified buffers may carry any value.
    pub fn version(&self) -> u8 {
        self.0[0]
    }

    pub fn set_version(&mut self, version: u8) {
        self.0[0] = version;
    }

    pub fn sender(&self) -> Address {
        address_at(&self.0, 1)
    }

    pub fn set_sender(&mut self, adr: &Address) {
        self.0[1..35].copy_from_slice(adr.as_bytes());
    }

    pub fn recipient(&self) -> Address {
        address_at(&self.0, 35)
    }

    pub fn set_recipient(&mut self, adr: &Address) {
        self.0[35..69].copy_from_slice(adr.as_bytes());
    }

    /// Structure prefix; overlays the first two recipient bytes.
    pub fn prefix(&self) -> String {
        crate::address::unpack_prefix(get_u16(&self.0, 35))
    }

    pub fn set_prefix(&mut self, prefix: &str) -> Result<(), InvalidAddress> {
        put_u16(&mut self.0, 35, crate::address::pack_prefix(prefix)?);

        Ok(())
    }

    pub fn profit_percent(&self) -> u16 {
        get_u16(&self.0, 37)
    }

    pub fn set_profit_percent(&mut self, percent: u16) {
        put_u16(&mut self.0, 37, percent);
    }

    pub fn fee_percent(&self) -> u16 {
        get_u16(&self.0, 39)
    }

    pub fn set_fee_percent(&mut self, percent: u16) {
        put_u16(&mut self.0, 39, percent);
    }

    /// Structure name. Reading an unverified buffer is lossy: the length
    /// byte is clamped to capacity and invalid UTF-8 is replaced.
    pub fn name(&self) -> Cow<'_, str> {
        let len = usize::from(self.0[41]).min(MAX_NAME_LENGTH);

        String::from_utf8_lossy(&self.0[42..42 + len])
    }

    /// # Panics
    ///
    /// Panics when the name exceeds [`MAX_NAME_LENGTH`] bytes.
    pub fn set_name(&mut self, name: &str) {
        assert!(
            name.len() <= MAX_NAME_LENGTH,
            "structure name exceeds {MAX_NAME_LENGTH} bytes"
        );

        self.0[41] = name.len() as u8;
        self.0[42..42 + name.len()].copy_from_slice(name.as_bytes());
    }

    pub fn value(&self) -> u64 {
        get_u64(&self.0, 69)
    }

    pub fn set_value(&mut self, value: u64) {
        put_u64(&mut self.0, 69, value);
    }

    pub fn nonce(&self) -> u64 {
        get_u64(&self.0, 77)
    }

    pub fn set_nonce(&mut self, nonce: u64) {
        put_u64(&mut self.0, 77, nonce);
    }

    pub fn signature(&self) -> [u8; 64] {
        let mut sig = [0u8; 64];
        sig.copy_from_slice(&self.0[85..149]);

        sig
    }

    pub fn set_signature(&mut self, sig: &[u8; 64]) {
        self.0[85..149].copy_from_slice(sig);
    }

    /// SHA-256 over the full 150-byte record; the Merkle leaf hash.
    pub fn hash(&self) -> Hash {
        crypto::hash_bytes_sha256(&self.0)
    }

    /// Stamp the nonce with the wall clock (nanoseconds, big-endian) and
    /// sign bytes `[0..85)`. The sender slot must already hold the public
    /// key matching `key`.
    pub fn sign(&mut self, key: &SigningKey) {
        let nanos = SystemTime::UNIX_EPOCH
            .elapsed()
            .map_or(0, |d| d.as_nanos() as u64);
        self.set_nonce(nanos);

        let sig = crypto::sign_bytes(key, &self.0[..85]);
        self.set_signature(&sig);
    }

    pub fn as_bytes(&self) -> &[u8; TRANSACTION_LENGTH] {
        &self.0
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8; TRANSACTION_LENGTH] {
        &mut self.0
    }
}

impl Default for Transaction {
    fn default() -> Self {
        Transaction::new()
    }
}

impl From<[u8; TRANSACTION_LENGTH]> for Transaction {
    fn from(bytes: [u8; TRANSACTION_LENGTH]) -> Self {
        Transaction(bytes)
    }
}

impl AsRef<[u8]> for Transaction {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

fn address_at(buf: &[u8], at: usize) -> Address {
    let mut bytes = [0u8; ADDRESS_LENGTH];
    bytes.copy_from_slice(&buf[at..at + ADDRESS_LENGTH]);

    Address::from(bytes)
}
