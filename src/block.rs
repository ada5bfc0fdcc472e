// src/block.rs

//! UMI block: a 167-byte header followed by the concatenated 150-byte
//! transaction records. The header carries the previous block hash, the
//! Merkle root over the transactions, a timestamp, the transaction count and
//! the author's Ed25519 key and signature.

use ed25519_dalek::SigningKey;

use crate::codec::{get_u16, get_u32, put_u16, put_u32};
use crate::crypto::{self, Hash};
use crate::transaction::{Transaction, TxVersion, TRANSACTION_LENGTH};

pub const HEADER_LENGTH: usize = 167;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BlockVersion {
    Genesis = 0,
    Basic = 1,
}

impl BlockVersion {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(BlockVersion::Genesis),
            1 => Some(BlockVersion::Basic),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block(Vec<u8>);

impl Block {
    /// An empty block with the `Basic` version stamped and no transactions.
    pub fn new() -> Self {
        let mut bytes = vec![0u8; HEADER_LENGTH];
        bytes[0] = BlockVersion::Basic as u8;

        Block(bytes)
    }

    /// The raw version byte; unverified buffers may carry any value.
    pub fn version(&self) -> u8 {
        self.0[0]
    }

    pub fn set_version(&mut self, version: u8) {
        self.0[0] = version;
    }

    pub fn previous_block_hash(&self) -> Hash {
        bytes32_at(&self.0, 1)
    }

    pub fn set_previous_block_hash(&mut self, hash: &Hash) {
        self.0[1..33].copy_from_slice(hash);
    }

    pub fn merkle_root(&self) -> Hash {
        bytes32_at(&self.0, 33)
    }

    pub fn set_merkle_root(&mut self, hash: &Hash) {
        self.0[33..65].copy_from_slice(hash);
    }

    /// Seconds since the Unix epoch.
    pub fn timestamp(&self) -> u32 {
        get_u32(&self.0, 65)
    }

    pub fn set_timestamp(&mut self, timestamp: u32) {
        put_u32(&mut self.0, 65, timestamp);
    }

    pub fn tx_count(&self) -> u16 {
        get_u16(&self.0, 69)
    }

    pub fn public_key(&self) -> [u8; 32] {
        bytes32_at(&self.0, 71)
    }

    pub fn set_public_key(&mut self, key: &[u8; 32]) {
        self.0[71..103].copy_from_slice(key);
    }

    pub fn signature(&self) -> [u8; 64] {
        let mut sig = [0u8; 64];
        sig.copy_from_slice(&self.0[103..167]);

        sig
    }

    pub fn set_signature(&mut self, sig: &[u8; 64]) {
        self.0[103..167].copy_from_slice(sig);
    }

    /// Append a transaction record and bump the count field.
    pub fn append_transaction(&mut self, tx: &Transaction) {
        self.0.extend_from_slice(tx.as_bytes());

        let count = self.tx_count() + 1;
        put_u16(&mut self.0, 69, count);
    }

    /// Copy of the record at `idx`.
    ///
    /// # Panics
    ///
    /// Panics when `idx` is not backed by appended bytes.
    pub fn transaction(&self, idx: u16) -> Transaction {
        let mut bytes = [0u8; TRANSACTION_LENGTH];
        bytes.copy_from_slice(self.transaction_bytes(idx));

        Transaction::from(bytes)
    }

    pub(crate) fn transaction_bytes(&self, idx: u16) -> &[u8] {
        let start = HEADER_LENGTH + usize::from(idx) * TRANSACTION_LENGTH;

        &self.0[start..start + TRANSACTION_LENGTH]
    }

    /// SHA-256 over the header bytes `[0..167)` only.
    pub fn hash(&self) -> Hash {
        crypto::hash_bytes_sha256(&self.0[..HEADER_LENGTH])
    }

    /// Write the author public key derived from `key`, then sign the header
    /// prefix `[0..103)`.
    pub fn sign(&mut self, key: &SigningKey) {
        self.set_public_key(&key.verifying_key().to_bytes());

        let sig = crypto::sign_bytes(key, &self.0[..103]);
        self.set_signature(&sig);
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.0
    }
}

impl Default for Block {
    fn default() -> Self {
        Block::new()
    }
}

impl AsRef<[u8]> for Block {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

fn bytes32_at(buf: &[u8], at: usize) -> Hash {
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&buf[at..at + 32]);

    hash
}

/// Genesis blocks carry only genesis transactions; basic blocks carry none.
pub(crate) fn tx_version_allowed(block_version: BlockVersion, tx_version: u8) -> bool {
    match block_version {
        BlockVersion::Genesis => tx_version == TxVersion::Genesis as u8,
        BlockVersion::Basic => tx_version != TxVersion::Genesis as u8,
    }
}
