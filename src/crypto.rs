// src/crypto.rs

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use sha2::{Digest, Sha256};

pub type Hash = [u8; 32];

pub fn hash_bytes_sha256(data: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

pub(crate) fn sign_bytes(key: &SigningKey, msg: &[u8]) -> [u8; 64] {
    key.sign(msg).to_bytes()
}

/// Ed25519 verification over raw wire bytes. A public key that does not
/// decode to a curve point counts as a failed verification, the same as a
/// wrong signature.
pub(crate) fn signature_is_valid(pubkey: &[u8; 32], msg: &[u8], sig: &[u8; 64]) -> bool {
    match VerifyingKey::from_bytes(pubkey) {
        Ok(key) => key.verify(msg, &Signature::from_bytes(sig)).is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_matches_known_vector() {
        // SHA-256 of the empty string.
        assert_eq!(
            hex::encode(hash_bytes_sha256(&[])),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn sign_then_verify_round_trips() {
        let key = SigningKey::from_bytes(&[7u8; 32]);
        let msg = b"canonical bytes";
        let sig = sign_bytes(&key, msg);

        assert!(signature_is_valid(
            &key.verifying_key().to_bytes(),
            msg,
            &sig
        ));
        assert!(!signature_is_valid(
            &key.verifying_key().to_bytes(),
            b"other bytes",
            &sig
        ));
    }

    #[test]
    fn garbage_public_key_fails_verification() {
        let sig = [0u8; 64];
        assert!(!signature_is_valid(&[0xffu8; 32], b"msg", &sig));
    }
}
