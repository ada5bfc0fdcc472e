//! Transaction verification matrix, external (integration) test.
//!
//! One test per rule of the version-dispatched engine, mirroring the
//! reference implementation's coverage: every predicate is exercised from
//! both sides.

use ed25519_dalek::SigningKey;

use umi_core::{verify_transaction, Address, Transaction, TransactionError, TxVersion};

fn keyed_address(key: &SigningKey, prefix: &str) -> Address {
    let mut adr = Address::with_prefix(prefix).unwrap();
    adr.set_public_key(&key.verifying_key().to_bytes());

    adr
}

/// A correctly signed `Basic` transfer between distinct addresses.
fn signed_basic(key: &SigningKey) -> Transaction {
    let mut tx = Transaction::new();
    tx.set_sender(&keyed_address(key, "umi"));
    tx.set_recipient(&Address::with_prefix("aaa").unwrap());
    tx.set_value(500);
    tx.sign(key);

    tx
}

#[test]
fn version_above_seven_is_rejected() {
    let mut tx = Transaction::new();
    tx.set_version(255);

    assert_eq!(
        verify_transaction(tx.as_bytes()),
        Err(TransactionError::InvalidVersion)
    );
}

#[test]
fn value_above_safe_integer_ceiling_is_rejected() {
    let mut tx = Transaction::new();
    tx.set_value(u64::MAX);

    assert_eq!(
        verify_transaction(tx.as_bytes()),
        Err(TransactionError::InvalidValue)
    );
}

#[test]
fn basic_sender_and_recipient_must_differ() {
    let mut tx = Transaction::new();
    tx.set_sender(&Address::new());
    tx.set_recipient(&Address::new());

    assert_eq!(
        verify_transaction(tx.as_bytes()),
        Err(TransactionError::InvalidRecipient)
    );
}

#[test]
fn basic_sender_must_not_be_genesis() {
    let mut tx = Transaction::new();
    tx.set_sender(&Address::with_prefix("genesis").unwrap());
    tx.set_recipient(&Address::new());

    assert_eq!(
        verify_transaction(tx.as_bytes()),
        Err(TransactionError::InvalidSender)
    );
}

#[test]
fn basic_recipient_must_not_be_genesis() {
    let mut tx = Transaction::new();
    tx.set_sender(&Address::new());
    tx.set_recipient(&Address::with_prefix("genesis").unwrap());

    assert_eq!(
        verify_transaction(tx.as_bytes()),
        Err(TransactionError::InvalidRecipient)
    );
}

#[test]
fn basic_addresses_must_carry_valid_versions() {
    let mut tx = Transaction::new();
    let mut sender = Address::new();
    // Character field value 27 has no letter assigned.
    sender.set_version((27 << 10) | (1 << 5) | 1);
    tx.set_sender(&sender);
    tx.set_recipient(&Address::with_prefix("aaa").unwrap());

    assert_eq!(
        verify_transaction(tx.as_bytes()),
        Err(TransactionError::InvalidSender)
    );
}

#[test]
fn genesis_sender_must_be_the_genesis_address() {
    let mut tx = Transaction::with_version(TxVersion::Genesis);
    tx.set_sender(&Address::with_prefix("bbb").unwrap());
    tx.set_recipient(&Address::new());

    assert_eq!(
        verify_transaction(tx.as_bytes()),
        Err(TransactionError::InvalidSender)
    );
}

#[test]
fn genesis_recipient_must_be_umi() {
    let mut tx = Transaction::with_version(TxVersion::Genesis);
    tx.set_sender(&Address::with_prefix("genesis").unwrap());
    tx.set_recipient(&Address::with_prefix("aaa").unwrap());

    assert_eq!(
        verify_transaction(tx.as_bytes()),
        Err(TransactionError::InvalidRecipient)
    );
}

#[test]
fn genesis_transfer_round_trips_through_signing() {
    let key = SigningKey::from_bytes(&[11u8; 32]);

    let mut tx = Transaction::with_version(TxVersion::Genesis);
    tx.set_sender(&keyed_address(&key, "genesis"));
    tx.set_recipient(&Address::new());
    tx.set_value(1);
    tx.sign(&key);

    assert_eq!(verify_transaction(tx.as_bytes()), Ok(()));
}

#[test]
fn structure_sender_must_be_umi() {
    let mut tx = Transaction::with_version(TxVersion::CreateStructure);
    tx.set_sender(&Address::with_prefix("aaa").unwrap());

    assert_eq!(
        verify_transaction(tx.as_bytes()),
        Err(TransactionError::InvalidSender)
    );
}

#[test]
fn structure_prefix_must_not_be_reserved() {
    for reserved in ["umi", "genesis"] {
        let mut tx = Transaction::with_version(TxVersion::UpdateStructure);
        tx.set_sender(&Address::new());
        tx.set_prefix(reserved).unwrap();

        assert_eq!(
            verify_transaction(tx.as_bytes()),
            Err(TransactionError::InvalidPrefix),
            "accepted reserved prefix {reserved}"
        );
    }
}

#[test]
fn structure_prefix_fields_must_be_letters() {
    let mut tx = Transaction::with_version(TxVersion::CreateStructure);
    tx.set_sender(&Address::new());
    // Middle character field zero: not a letter and not the sentinel.
    tx.as_bytes_mut()[35..37].copy_from_slice(&((1u16 << 10) | 1).to_be_bytes());

    assert_eq!(
        verify_transaction(tx.as_bytes()),
        Err(TransactionError::InvalidPrefix)
    );
}

#[test]
fn structure_profit_percent_must_stay_in_range() {
    for percent in [0, 99, 501, u16::MAX] {
        let mut tx = Transaction::with_version(TxVersion::CreateStructure);
        tx.set_sender(&Address::new());
        tx.set_prefix("aaa").unwrap();
        tx.set_profit_percent(percent);

        assert_eq!(
            verify_transaction(tx.as_bytes()),
            Err(TransactionError::InvalidProfitPercent),
            "accepted profit percent {percent}"
        );
    }
}

#[test]
fn structure_fee_percent_must_stay_in_range() {
    let mut tx = Transaction::with_version(TxVersion::CreateStructure);
    tx.set_sender(&Address::new());
    tx.set_prefix("aaa").unwrap();
    tx.set_profit_percent(250);
    tx.set_fee_percent(2001);

    assert_eq!(
        verify_transaction(tx.as_bytes()),
        Err(TransactionError::InvalidFeePercent)
    );
}

#[test]
fn structure_name_length_is_bounded() {
    let mut tx = Transaction::with_version(TxVersion::CreateStructure);
    tx.set_sender(&Address::new());
    tx.set_prefix("aaa").unwrap();
    tx.set_profit_percent(250);
    tx.as_bytes_mut()[41] = 36;

    assert_eq!(
        verify_transaction(tx.as_bytes()),
        Err(TransactionError::InvalidName)
    );
}

#[test]
fn structure_name_must_be_utf8() {
    let mut tx = Transaction::with_version(TxVersion::CreateStructure);
    tx.set_sender(&Address::new());
    tx.set_prefix("aaa").unwrap();
    tx.set_profit_percent(250);
    tx.as_bytes_mut()[41] = 1;
    tx.as_bytes_mut()[42] = 0xff;

    assert_eq!(
        verify_transaction(tx.as_bytes()),
        Err(TransactionError::InvalidName)
    );
}

#[test]
fn structure_update_round_trips_through_signing() {
    let key = SigningKey::from_bytes(&[12u8; 32]);

    let mut tx = Transaction::with_version(TxVersion::UpdateStructure);
    tx.set_sender(&keyed_address(&key, "umi"));
    tx.set_prefix("aaa").unwrap();
    tx.set_name("hello world");
    tx.set_profit_percent(100);
    tx.set_fee_percent(1);
    tx.sign(&key);

    assert_eq!(verify_transaction(tx.as_bytes()), Ok(()));
}

#[test]
fn address_op_sender_must_be_umi() {
    let mut tx = Transaction::with_version(TxVersion::UpdateFeeAddress);
    tx.set_sender(&Address::with_prefix("aaa").unwrap());

    assert_eq!(
        verify_transaction(tx.as_bytes()),
        Err(TransactionError::InvalidSender)
    );
}

#[test]
fn address_op_recipient_must_be_a_structure_address() {
    for reserved in ["umi", "genesis"] {
        let mut tx = Transaction::with_version(TxVersion::CreateTransitAddress);
        tx.set_sender(&Address::new());
        tx.set_recipient(&Address::with_prefix(reserved).unwrap());

        assert_eq!(
            verify_transaction(tx.as_bytes()),
            Err(TransactionError::InvalidRecipient),
            "accepted reserved recipient {reserved}"
        );
    }
}

#[test]
fn address_op_round_trips_through_signing() {
    let key = SigningKey::from_bytes(&[13u8; 32]);

    for version in [
        TxVersion::UpdateProfitAddress,
        TxVersion::UpdateFeeAddress,
        TxVersion::CreateTransitAddress,
        TxVersion::DeleteTransitAddress,
    ] {
        let mut tx = Transaction::with_version(version);
        tx.set_sender(&keyed_address(&key, "umi"));
        tx.set_recipient(&Address::with_prefix("aaa").unwrap());
        tx.sign(&key);

        assert_eq!(verify_transaction(tx.as_bytes()), Ok(()));
    }
}

#[test]
fn basic_transfer_round_trips_through_signing() {
    let key = SigningKey::from_bytes(&[14u8; 32]);

    assert_eq!(verify_transaction(signed_basic(&key).as_bytes()), Ok(()));
}

#[test]
fn signature_by_a_foreign_key_is_rejected() {
    let key = SigningKey::from_bytes(&[15u8; 32]);

    let mut tx = Transaction::new();
    // Sender key does not match the signing key.
    tx.set_sender(&Address::from_public_key(&[0xaau8; 32]));
    tx.set_recipient(&Address::with_prefix("aaa").unwrap());
    tx.sign(&key);

    assert_eq!(
        verify_transaction(tx.as_bytes()),
        Err(TransactionError::InvalidSignature)
    );
}

#[test]
fn tampering_any_signed_byte_invalidates_the_transaction() {
    let key = SigningKey::from_bytes(&[16u8; 32]);
    let tx = signed_basic(&key);

    for i in 0..85 {
        let mut bad = tx.clone();
        bad.as_bytes_mut()[i] ^= 1;

        assert!(
            verify_transaction(bad.as_bytes()).is_err(),
            "byte {i} tamper went unnoticed"
        );
    }
}

#[test]
fn nonce_tampering_fails_as_a_signature_error() {
    let key = SigningKey::from_bytes(&[17u8; 32]);
    let tx = signed_basic(&key);

    // The nonce carries no structural meaning, so the only predicate that
    // can notice a flipped bit there is the signature itself.
    for i in 77..85 {
        let mut bad = tx.clone();
        bad.as_bytes_mut()[i] ^= 1;

        assert_eq!(
            verify_transaction(bad.as_bytes()),
            Err(TransactionError::InvalidSignature),
            "byte {i}"
        );
    }
}
