use p256::ecdsa::signature::{Signer, Verifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use rand_core::OsRng;
use ring::digest::{Context, SHA256};
use ripemd::{Digest as RipemdDigest, Ripemd160};

use crate::error::{BlockchainError, Result};
use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time in seconds since the Unix epoch
pub fn current_timestamp() -> Result<i64> {
    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| BlockchainError::Crypto(format!("System time error: {e}")))?
        .as_secs();

    if duration > i64::MAX as u64 {
        return Err(BlockchainError::Crypto("Timestamp overflow".to_string()));
    }

    Ok(duration as i64)
}

pub fn sha256_digest(data: &[u8]) -> Vec<u8> {
    let mut context = Context::new(&SHA256);
    context.update(data);
    let digest = context.finish();
    digest.as_ref().to_vec()
}

pub fn ripemd160_digest(data: &[u8]) -> Vec<u8> {
    let mut hasher = Ripemd160::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}

pub fn base58_encode(data: &[u8]) -> String {
    bs58::encode(data).into_string()
}

pub fn base58_decode(data: &str) -> Result<Vec<u8>> {
    bs58::decode(data)
        .into_vec()
        .map_err(|e| BlockchainError::InvalidAddress(format!("Invalid base58 encoding: {e}")))
}

/// Generate a P-256 keypair. Returns the raw private scalar `D` and the
/// coordinates `X` and `Y`, each as fixed-width 32-byte big-endian strings.
pub fn new_key_pair() -> Result<(Vec<u8>, Vec<u8>, Vec<u8>)> {
    let signing_key = SigningKey::random(&mut OsRng);
    let d = signing_key.to_bytes().to_vec();

    let point = VerifyingKey::from(&signing_key).to_encoded_point(false);
    let x = point
        .x()
        .ok_or_else(|| BlockchainError::Crypto("Public key is the identity point".to_string()))?
        .to_vec();
    let y = point
        .y()
        .ok_or_else(|| BlockchainError::Crypto("Public key is the identity point".to_string()))?
        .to_vec();

    Ok((d, x, y))
}

/// ECDSA-P256 signature over `message`, from the raw private scalar.
/// The result is the 64-byte `r ‖ s` concatenation.
pub fn ecdsa_p256_sha256_sign_digest(private_key: &[u8], message: &[u8]) -> Result<Vec<u8>> {
    let signing_key = SigningKey::from_slice(private_key)
        .map_err(|e| BlockchainError::Crypto(format!("Failed to load private key: {e}")))?;
    let signature: Signature = signing_key.sign(message);
    Ok(signature.to_bytes().to_vec())
}

/// Verify a 64-byte `r ‖ s` signature against a raw `X ‖ Y` public key
pub fn ecdsa_p256_sha256_sign_verify(public_key: &[u8], signature: &[u8], message: &[u8]) -> bool {
    let mut sec1 = Vec::with_capacity(public_key.len() + 1);
    sec1.push(0x04);
    sec1.extend_from_slice(public_key);

    let verifying_key = match VerifyingKey::from_sec1_bytes(&sec1) {
        Ok(key) => key,
        Err(_) => return false,
    };
    let signature = match Signature::from_slice(signature) {
        Ok(sig) => sig,
        Err(_) => return false,
    };
    verifying_key.verify(message, &signature).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_lengths() {
        assert_eq!(sha256_digest(b"abc").len(), 32);
        assert_eq!(ripemd160_digest(b"abc").len(), 20);
    }

    #[test]
    fn test_key_pair_shapes() {
        let (d, x, y) = new_key_pair().unwrap();
        assert_eq!(d.len(), 32);
        assert_eq!(x.len(), 32);
        assert_eq!(y.len(), 32);
    }

    #[test]
    fn test_sign_and_verify() {
        let (d, x, y) = new_key_pair().unwrap();
        let mut public_key = x;
        public_key.extend(y);

        let message = sha256_digest(b"spend 10 to somebody");
        let signature = ecdsa_p256_sha256_sign_digest(&d, &message).unwrap();
        assert_eq!(signature.len(), 64);

        assert!(ecdsa_p256_sha256_sign_verify(&public_key, &signature, &message));

        let other = sha256_digest(b"spend 1000000 to somebody else");
        assert!(!ecdsa_p256_sha256_sign_verify(&public_key, &signature, &other));
    }

    #[test]
    fn test_base58_round_trip_preserves_leading_zeros() {
        let payload = vec![0x00, 0x00, 0x12, 0x34, 0x56];
        let encoded = base58_encode(&payload);
        assert!(encoded.starts_with("11"));
        assert_eq!(base58_decode(&encoded).unwrap(), payload);
    }

    #[test]
    fn test_base58_rejects_invalid_characters() {
        // 0, O, I and l are not in the alphabet
        assert!(base58_decode("0OIl").is_err());
    }
}
