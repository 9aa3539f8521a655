use crate::error::Result;
use crate::utils::{base58_decode, base58_encode, ripemd160_digest, sha256_digest};
use serde::{Deserialize, Serialize};

const VERSION: u8 = 0x00;
pub const ADDRESS_CHECK_SUM_LEN: usize = 4;

// version byte + 20-byte pubkey hash + 4-byte checksum
const ADDRESS_PAYLOAD_LEN: usize = 25;

/// An ECDSA-P256 keypair. The private key is held as the raw scalar `D` and
/// the public point as its `X` and `Y` coordinates, so the persisted form
/// never depends on any runtime-defined curve value.
#[derive(Clone, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct Wallet {
    d: Vec<u8>,
    x: Vec<u8>,
    y: Vec<u8>,
    public_key: Vec<u8>,
}

impl Wallet {
    pub fn new() -> Result<Wallet> {
        let (d, x, y) = crate::utils::new_key_pair()?;
        let mut public_key = Vec::with_capacity(x.len() + y.len());
        public_key.extend_from_slice(&x);
        public_key.extend_from_slice(&y);
        Ok(Wallet { d, x, y, public_key })
    }

    pub fn get_address(&self) -> String {
        convert_address(&hash_pub_key(self.public_key.as_slice()))
    }

    /// Uncompressed public key as raw `X ‖ Y`
    pub fn get_public_key(&self) -> &[u8] {
        self.public_key.as_slice()
    }

    /// Raw private scalar `D`
    pub fn get_private_key(&self) -> &[u8] {
        self.d.as_slice()
    }
}

/// `RIPEMD160(SHA256(pub_key))`
pub fn hash_pub_key(pub_key: &[u8]) -> Vec<u8> {
    let pub_key_sha256 = sha256_digest(pub_key);
    ripemd160_digest(pub_key_sha256.as_slice())
}

fn checksum(payload: &[u8]) -> Vec<u8> {
    let first_sha = sha256_digest(payload);
    let second_sha = sha256_digest(first_sha.as_slice());
    second_sha[0..ADDRESS_CHECK_SUM_LEN].to_vec()
}

/// Base58-encode `version ‖ pub_key_hash ‖ checksum`
pub fn convert_address(pub_key_hash: &[u8]) -> String {
    let mut payload: Vec<u8> = vec![VERSION];
    payload.extend_from_slice(pub_key_hash);
    let check = checksum(payload.as_slice());
    payload.extend(check);
    base58_encode(payload.as_slice())
}

/// An address is valid iff it Base58-decodes to exactly 25 bytes whose
/// trailing 4 bytes equal the double-SHA256 checksum of the rest
pub fn validate_address(address: &str) -> bool {
    let payload = match base58_decode(address) {
        Ok(payload) => payload,
        Err(_) => return false,
    };

    if payload.len() != ADDRESS_PAYLOAD_LEN {
        return false;
    }

    let actual_checksum = &payload[payload.len() - ADDRESS_CHECK_SUM_LEN..];
    let versioned_payload = &payload[..payload.len() - ADDRESS_CHECK_SUM_LEN];

    let target_checksum = checksum(versioned_payload);
    actual_checksum.eq(target_checksum.as_slice())
}

/// Extract the pubkey hash a valid address locks to
pub fn get_pub_key_hash_from_address(address: &str) -> Result<Vec<u8>> {
    if !validate_address(address) {
        return Err(crate::error::BlockchainError::InvalidAddress(
            address.to_string(),
        ));
    }
    let payload = base58_decode(address)?;
    Ok(payload[1..payload.len() - ADDRESS_CHECK_SUM_LEN].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_round_trip() {
        let wallet = Wallet::new().unwrap();
        let address = wallet.get_address();

        assert!(validate_address(&address));
        assert_eq!(
            get_pub_key_hash_from_address(&address).unwrap(),
            hash_pub_key(wallet.get_public_key())
        );
    }

    #[test]
    fn test_validate_address_rejects_garbage() {
        assert!(!validate_address("not_a_real_address"));
        assert!(!validate_address(""));
        // valid base58, wrong length
        assert!(!validate_address("1A1zP1"));
    }

    #[test]
    fn test_validate_address_rejects_bad_checksum() {
        let wallet = Wallet::new().unwrap();
        let address = wallet.get_address();

        let mut payload = base58_decode(&address).unwrap();
        let last = payload.len() - 1;
        payload[last] ^= 0x01;
        let tampered = crate::utils::base58_encode(&payload);

        assert!(!validate_address(&tampered));
    }

    #[test]
    fn test_distinct_wallets_get_distinct_addresses() {
        let a = Wallet::new().unwrap();
        let b = Wallet::new().unwrap();
        assert_ne!(a.get_address(), b.get_address());
    }
}
