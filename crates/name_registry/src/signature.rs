//! Recoverable secp256k1 signatures and signer recovery.

use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use namereg_types::{keccak256, Address};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Message a user signs to authorize deletion of their record by the operator.
pub const DELETE_MESSAGE: &[u8] = b"Delete";

/// Digest signed over for operator-assisted user deletion.
pub fn delete_message_digest() -> [u8; 32] {
    keccak256(DELETE_MESSAGE)
}

#[derive(Error, Debug)]
pub enum SignatureParseError {
    #[error("signature must be 65 bytes (r || s || v), got {0}")]
    InvalidLength(usize),
    #[error("signature is not valid hexadecimal")]
    InvalidHex(#[from] hex::FromHexError),
}

/// ECDSA signature in `(v, r, s)` form.
///
/// `v` is accepted both as a raw recovery id (0/1) and in the
/// `27 + id` convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoverableSignature {
    pub v: u8,
    pub r: [u8; 32],
    pub s: [u8; 32],
}

impl RecoverableSignature {
    pub fn new(v: u8, r: [u8; 32], s: [u8; 32]) -> Self {
        Self { v, r, s }
    }

    /// Recovery id encoded by `v`, if it is one of the accepted values.
    pub fn recovery_id(&self) -> Option<u8> {
        match self.v {
            0 | 1 => Some(self.v),
            27 | 28 => Some(self.v - 27),
            _ => None,
        }
    }

    /// `r || s || v`
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[..32].copy_from_slice(&self.r);
        out[32..64].copy_from_slice(&self.s);
        out[64] = self.v;
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignatureParseError> {
        if bytes.len() != 65 {
            return Err(SignatureParseError::InvalidLength(bytes.len()));
        }
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..64]);
        Ok(Self { v: bytes[64], r, s })
    }
}

impl FromStr for RecoverableSignature {
    type Err = SignatureParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let payload = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(payload)?;
        Self::from_bytes(&bytes)
    }
}

/// Recovers the address that produced a signature over a digest.
pub trait SignerRecovery: Send + Sync {
    /// `None` when no public key can be recovered from the inputs.
    fn recover_signer(&self, digest: &[u8; 32], signature: &RecoverableSignature)
        -> Option<Address>;
}

/// secp256k1 public-key recovery.
#[derive(Debug, Clone, Copy, Default)]
pub struct Secp256k1Recovery;

impl SignerRecovery for Secp256k1Recovery {
    fn recover_signer(
        &self,
        digest: &[u8; 32],
        signature: &RecoverableSignature,
    ) -> Option<Address> {
        let mut recovery_id = RecoveryId::from_byte(signature.recovery_id()?)?;
        let mut signature = Signature::from_scalars(signature.r, signature.s).ok()?;

        // High-S form recovers the same key once s is negated and the y parity flipped.
        if let Some(normalized) = signature.normalize_s() {
            signature = normalized;
            recovery_id = RecoveryId::new(!recovery_id.is_y_odd(), recovery_id.is_x_reduced());
        }

        let key = VerifyingKey::recover_from_prehash(digest, &signature, recovery_id).ok()?;
        let point = key.to_encoded_point(false);
        Address::from_public_key(point.as_bytes()).ok()
    }
}

/// True when `signature` over `digest` was produced by the key behind `address`.
///
/// Malformed signatures simply do not match. Both low-S and high-S forms
/// are accepted, and `v` may be a raw recovery id (0/1) as well as 27/28.
pub fn is_signed(
    recovery: &dyn SignerRecovery,
    address: &Address,
    digest: &[u8; 32],
    signature: &RecoverableSignature,
) -> bool {
    recovery
        .recover_signer(digest, signature)
        .is_some_and(|signer| signer == *address)
}

#[cfg(test)]
mod tests {
    use super::*;
    use k256::ecdsa::SigningKey;
    use k256::Scalar;

    fn sign(key: &SigningKey, digest: &[u8; 32]) -> RecoverableSignature {
        let (signature, recovery_id) = key.sign_prehash_recoverable(digest).unwrap();
        let bytes = signature.to_bytes();
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..]);
        RecoverableSignature::new(27 + recovery_id.to_byte(), r, s)
    }

    fn address_of(key: &SigningKey) -> Address {
        let point = key.verifying_key().to_encoded_point(false);
        Address::from_public_key(point.as_bytes()).unwrap()
    }

    #[test]
    fn recovers_signer_address() {
        let key = SigningKey::from_slice(&[42u8; 32]).unwrap();
        let digest = delete_message_digest();
        let signature = sign(&key, &digest);

        let recovered = Secp256k1Recovery.recover_signer(&digest, &signature);
        assert_eq!(recovered, Some(address_of(&key)));
        assert!(is_signed(
            &Secp256k1Recovery,
            &address_of(&key),
            &digest,
            &signature
        ));
    }

    #[test]
    fn raw_recovery_id_is_accepted() {
        let key = SigningKey::from_slice(&[7u8; 32]).unwrap();
        let digest = delete_message_digest();
        let mut signature = sign(&key, &digest);
        signature.v -= 27;
        assert!(is_signed(
            &Secp256k1Recovery,
            &address_of(&key),
            &digest,
            &signature
        ));
    }

    #[test]
    fn high_s_signature_recovers_signer() {
        let key = SigningKey::from_slice(&[42u8; 32]).unwrap();
        let digest = delete_message_digest();
        let low = sign(&key, &digest);

        let s = Signature::from_scalars(low.r, low.s).unwrap();
        let negated: Scalar = -*s.s().as_ref();
        let mut high_s = [0u8; 32];
        high_s.copy_from_slice(&negated.to_bytes());
        let high = RecoverableSignature::new(low.v ^ 1, low.r, high_s);
        assert_ne!(high.s, low.s);

        assert_eq!(
            Secp256k1Recovery.recover_signer(&digest, &high),
            Some(address_of(&key))
        );
        assert!(is_signed(
            &Secp256k1Recovery,
            &address_of(&key),
            &digest,
            &high
        ));
    }

    #[test]
    fn other_key_does_not_match() {
        let signer = SigningKey::from_slice(&[42u8; 32]).unwrap();
        let other = SigningKey::from_slice(&[99u8; 32]).unwrap();
        let digest = delete_message_digest();
        let signature = sign(&signer, &digest);
        assert!(!is_signed(
            &Secp256k1Recovery,
            &address_of(&other),
            &digest,
            &signature
        ));
    }

    #[test]
    fn different_message_does_not_match() {
        let key = SigningKey::from_slice(&[42u8; 32]).unwrap();
        let signature = sign(&key, &keccak256(b"Keep"));
        assert!(!is_signed(
            &Secp256k1Recovery,
            &address_of(&key),
            &delete_message_digest(),
            &signature
        ));
    }

    #[test]
    fn malformed_signature_is_not_an_error() {
        let digest = delete_message_digest();
        let zero = RecoverableSignature::new(27, [0u8; 32], [0u8; 32]);
        assert_eq!(Secp256k1Recovery.recover_signer(&digest, &zero), None);

        let bad_v = RecoverableSignature::new(5, [1u8; 32], [1u8; 32]);
        assert_eq!(bad_v.recovery_id(), None);
        assert!(!is_signed(&Secp256k1Recovery, &Address::ZERO, &digest, &bad_v));
    }

    #[test]
    fn hex_parsing() {
        let key = SigningKey::from_slice(&[3u8; 32]).unwrap();
        let signature = sign(&key, &delete_message_digest());
        let encoded = format!("0x{}", hex::encode(signature.to_bytes()));
        assert_eq!(encoded.parse::<RecoverableSignature>().unwrap(), signature);

        let err = "0xdeadbeef".parse::<RecoverableSignature>().unwrap_err();
        assert!(matches!(err, SignatureParseError::InvalidLength(4)));
    }
}
