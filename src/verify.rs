// src/verify.rs

//! Verification engine for transactions and blocks.
//!
//! Both verifiers run a fixed sequence of predicates over the raw wire
//! buffer and stop at the first failure. The predicate order is part of the
//! contract: callers dispatch on the exact error kind, so reordering checks
//! changes observable behaviour.

use std::collections::HashSet;

use rayon::prelude::*;
use thiserror::Error;
use tracing::debug;

use crate::address::{self, VER_GENESIS, VER_UMI};
use crate::block::{tx_version_allowed, Block, BlockVersion, HEADER_LENGTH};
use crate::codec::{get_u16, get_u64};
use crate::crypto::{self, Hash};
use crate::transaction::{TxVersion, MAX_NAME_LENGTH, TRANSACTION_LENGTH};

/// Largest value the protocol accepts; 2^53 - 1, inherited from the
/// reference wallet's integer range.
pub const MAX_VALUE: u64 = 9_007_199_254_740_991;

const MIN_PROFIT_PERCENT: u16 = 100;
const MAX_PROFIT_PERCENT: u16 = 500;
const MAX_FEE_PERCENT: u16 = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransactionError {
    #[error("invalid length")]
    InvalidLength,
    #[error("invalid version")]
    InvalidVersion,
    #[error("invalid sender")]
    InvalidSender,
    #[error("invalid recipient")]
    InvalidRecipient,
    #[error("invalid prefix")]
    InvalidPrefix,
    #[error("invalid profit percent")]
    InvalidProfitPercent,
    #[error("invalid fee percent")]
    InvalidFeePercent,
    #[error("invalid name")]
    InvalidName,
    #[error("invalid value")]
    InvalidValue,
    #[error("invalid signature")]
    InvalidSignature,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BlockError {
    #[error("invalid length")]
    InvalidLength,
    #[error("invalid version")]
    InvalidVersion,
    #[error("invalid previous block hash")]
    InvalidPrevHash,
    #[error("invalid merkle root")]
    InvalidMerkle,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("invalid transaction")]
    InvalidTransaction,
    #[error("non-unique transaction")]
    NonUniqueTransaction,
}

/// Check a 150-byte transaction buffer against every rule of its version.
pub fn verify_transaction(buf: &[u8]) -> Result<(), TransactionError> {
    if buf.len() != TRANSACTION_LENGTH {
        return Err(TransactionError::InvalidLength);
    }

    let version = TxVersion::from_u8(buf[0]).ok_or(TransactionError::InvalidVersion)?;

    // The value slot overlays structure fields on non-value versions; the
    // bound is applied regardless, matching the wire protocol.
    if get_u64(buf, 69) > MAX_VALUE {
        return Err(TransactionError::InvalidValue);
    }

    match version {
        TxVersion::Genesis => genesis_addresses_are_valid(buf)?,
        TxVersion::Basic => basic_addresses_are_valid(buf)?,
        TxVersion::CreateStructure | TxVersion::UpdateStructure => {
            structure_fields_are_valid(buf)?
        }
        TxVersion::UpdateProfitAddress
        | TxVersion::UpdateFeeAddress
        | TxVersion::CreateTransitAddress
        | TxVersion::DeleteTransitAddress => address_op_fields_are_valid(buf)?,
    }

    tx_signature_is_valid(buf)
}

fn sender_version(buf: &[u8]) -> u16 {
    get_u16(buf, 1)
}

fn recipient_version(buf: &[u8]) -> u16 {
    get_u16(buf, 35)
}

fn genesis_addresses_are_valid(buf: &[u8]) -> Result<(), TransactionError> {
    if sender_version(buf) != VER_GENESIS {
        return Err(TransactionError::InvalidSender);
    }
    if recipient_version(buf) != VER_UMI {
        return Err(TransactionError::InvalidRecipient);
    }

    Ok(())
}

fn basic_addresses_are_valid(buf: &[u8]) -> Result<(), TransactionError> {
    if !address::version_is_valid(sender_version(buf)) {
        return Err(TransactionError::InvalidSender);
    }
    if !address::version_is_valid(recipient_version(buf)) {
        return Err(TransactionError::InvalidRecipient);
    }
    if buf[1..35] == buf[35..69] {
        return Err(TransactionError::InvalidRecipient);
    }
    if sender_version(buf) == VER_GENESIS {
        return Err(TransactionError::InvalidSender);
    }
    if recipient_version(buf) == VER_GENESIS {
        return Err(TransactionError::InvalidRecipient);
    }

    Ok(())
}

fn structure_fields_are_valid(buf: &[u8]) -> Result<(), TransactionError> {
    if sender_version(buf) != VER_UMI {
        return Err(TransactionError::InvalidSender);
    }

    // The structure prefix occupies the recipient version slot.
    let prefix = recipient_version(buf);
    if prefix == VER_GENESIS || prefix == VER_UMI {
        return Err(TransactionError::InvalidPrefix);
    }
    if !address::version_is_valid(prefix) {
        return Err(TransactionError::InvalidPrefix);
    }

    let profit = get_u16(buf, 37);
    if !(MIN_PROFIT_PERCENT..=MAX_PROFIT_PERCENT).contains(&profit) {
        return Err(TransactionError::InvalidProfitPercent);
    }

    if get_u16(buf, 39) > MAX_FEE_PERCENT {
        return Err(TransactionError::InvalidFeePercent);
    }

    let name_len = usize::from(buf[41]);
    if name_len > MAX_NAME_LENGTH {
        return Err(TransactionError::InvalidName);
    }
    if std::str::from_utf8(&buf[42..42 + name_len]).is_err() {
        return Err(TransactionError::InvalidName);
    }

    Ok(())
}

fn address_op_fields_are_valid(buf: &[u8]) -> Result<(), TransactionError> {
    if sender_version(buf) != VER_UMI {
        return Err(TransactionError::InvalidSender);
    }

    let recipient = recipient_version(buf);
    if recipient == VER_GENESIS || recipient == VER_UMI {
        return Err(TransactionError::InvalidRecipient);
    }
    if !address::version_is_valid(recipient) {
        return Err(TransactionError::InvalidRecipient);
    }

    Ok(())
}

fn tx_signature_is_valid(buf: &[u8]) -> Result<(), TransactionError> {
    let mut pubkey = [0u8; 32];
    pubkey.copy_from_slice(&buf[3..35]);

    let mut sig = [0u8; 64];
    sig.copy_from_slice(&buf[85..149]);

    if !crypto::signature_is_valid(&pubkey, &buf[..85], &sig) {
        return Err(TransactionError::InvalidSignature);
    }

    Ok(())
}

/// Check a full block buffer: structure, previous-hash rule, Merkle root,
/// header signature, then every embedded transaction in parallel.
pub fn verify_block(buf: &[u8]) -> Result<(), BlockError> {
    if buf.len() < HEADER_LENGTH + TRANSACTION_LENGTH {
        return Err(BlockError::InvalidLength);
    }

    let count = usize::from(get_u16(buf, 69));
    if buf.len() != HEADER_LENGTH + count * TRANSACTION_LENGTH {
        return Err(BlockError::InvalidLength);
    }

    let version = BlockVersion::from_u8(buf[0]).ok_or(BlockError::InvalidVersion)?;

    debug!(version = buf[0], tx_count = count, "verifying block");

    let prev_is_null = buf[1..33].iter().all(|&b| b == 0);
    match version {
        BlockVersion::Genesis if !prev_is_null => return Err(BlockError::InvalidPrevHash),
        BlockVersion::Basic if prev_is_null => return Err(BlockError::InvalidPrevHash),
        _ => {}
    }

    let txs = &buf[HEADER_LENGTH..];
    if txs
        .chunks_exact(TRANSACTION_LENGTH)
        .any(|tx| !tx_version_allowed(version, tx[0]))
    {
        return Err(BlockError::InvalidTransaction);
    }

    let root = merkle_root_over(txs)?;
    if buf[33..65] != root[..] {
        debug!(
            expected = %hex::encode(&buf[33..65]),
            computed = %hex::encode(root),
            "merkle root mismatch"
        );
        return Err(BlockError::InvalidMerkle);
    }

    block_signature_is_valid(buf)?;

    txs.par_chunks_exact(TRANSACTION_LENGTH)
        .try_for_each(|tx| match verify_transaction(tx) {
            Ok(()) => Ok(()),
            Err(err) => {
                debug!(%err, "embedded transaction rejected");
                Err(BlockError::InvalidTransaction)
            }
        })
}

fn block_signature_is_valid(buf: &[u8]) -> Result<(), BlockError> {
    let mut pubkey = [0u8; 32];
    pubkey.copy_from_slice(&buf[71..103]);

    let mut sig = [0u8; 64];
    sig.copy_from_slice(&buf[103..167]);

    if !crypto::signature_is_valid(&pubkey, &buf[..103], &sig) {
        return Err(BlockError::InvalidSignature);
    }

    Ok(())
}

/// Merkle root over a block's transactions. Fails when two records hash
/// identically; an empty block yields the all-zero root.
pub fn calculate_merkle_root(block: &Block) -> Result<Hash, BlockError> {
    merkle_root_over(&block.as_bytes()[HEADER_LENGTH..])
}

fn merkle_root_over(txs: &[u8]) -> Result<Hash, BlockError> {
    let count = txs.len() / TRANSACTION_LENGTH;
    if count == 0 {
        return Ok([0u8; 32]);
    }

    let mut hashes: Vec<Hash> = Vec::with_capacity(count);
    let mut seen: HashSet<Hash> = HashSet::with_capacity(count);

    for tx in txs.chunks_exact(TRANSACTION_LENGTH) {
        let leaf = crypto::hash_bytes_sha256(tx);
        if !seen.insert(leaf) {
            return Err(BlockError::NonUniqueTransaction);
        }
        hashes.push(leaf);
    }

    // Reduce in place; odd-width levels pair the terminal hash with itself.
    let mut pair = [0u8; 64];
    let mut width = count;
    while width > 1 {
        let last = width - 1;
        let next = if width > 2 { (width + width % 2) / 2 } else { 1 };

        for i in 0..next {
            let k1 = 2 * i;
            let k2 = (k1 + 1).min(last);

            pair[..32].copy_from_slice(&hashes[k1]);
            pair[32..].copy_from_slice(&hashes[k2]);
            hashes[i] = crypto::hash_bytes_sha256(&pair);
        }

        width = next;
    }

    Ok(hashes[0])
}
