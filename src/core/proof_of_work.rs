use crate::core::Block;
use crate::error::{BlockchainError, Result};
use crate::utils::{current_timestamp, sha256_digest};
use data_encoding::HEXLOWER;
use log::info;
use num_bigint::{BigInt, Sign};
use std::borrow::Borrow;
use std::ops::ShlAssign;

const MAX_NONCE: i64 = i64::MAX;

/// A proof-of-work puzzle over one block. The target is
/// `1 << (256 - difficulty_bits)`; a nonce satisfies the puzzle when the
/// SHA-256 of the preimage, read as a big-endian 256-bit integer, is
/// strictly below the target.
pub struct ProofOfWork {
    block: Block,
    target: BigInt,
    difficulty_bits: u32,
}

impl ProofOfWork {
    pub fn new_proof_of_work(block: Block, difficulty_bits: u32) -> ProofOfWork {
        let mut target = BigInt::from(1);
        target.shl_assign(256 - difficulty_bits);
        ProofOfWork {
            block,
            target,
            difficulty_bits,
        }
    }

    /// Recompute the preimage hash for the block's stored nonce and compare
    /// it against the target
    pub fn validate(block: &Block, difficulty_bits: u32) -> bool {
        let pow = ProofOfWork::new_proof_of_work(block.clone(), difficulty_bits);
        let data = pow.prepare_data(block.get_nonce());
        let hash = sha256_digest(data.as_slice());
        let hash_int = BigInt::from_bytes_be(Sign::Plus, hash.as_slice());

        hash_int < pow.target
    }

    fn prepare_data(&self, nonce: i64) -> Vec<u8> {
        // Blocks persisted with a non-positive timestamp hash against the
        // current wall-clock instead; stores written by older builds carry
        // such blocks and must stay replayable.
        let mut timestamp = self.block.get_timestamp();
        if timestamp <= 0 {
            timestamp = current_timestamp().unwrap_or(timestamp);
        }

        let mut data_bytes = vec![];
        data_bytes.extend(self.block.get_pre_block_hash());
        data_bytes.extend(self.block.hash_transactions());
        data_bytes.extend(timestamp.to_be_bytes());
        data_bytes.extend((self.difficulty_bits as i64).to_be_bytes());
        data_bytes.extend(nonce.to_be_bytes());
        data_bytes
    }

    /// Search nonces from zero upward until the target is met. Fails with
    /// [`BlockchainError::MiningExhausted`] if the whole space is consumed.
    pub fn run(&self) -> Result<(i64, Vec<u8>)> {
        let mut nonce = 0;
        info!(
            "Mining block at height {} (difficulty: {} bits)",
            self.block.get_height(),
            self.difficulty_bits
        );
        while nonce < MAX_NONCE {
            let data = self.prepare_data(nonce);
            let hash = sha256_digest(data.as_slice());
            let hash_int = BigInt::from_bytes_be(Sign::Plus, hash.as_slice());

            if hash_int.lt(self.target.borrow()) {
                info!("Found block hash {}", HEXLOWER.encode(hash.as_slice()));
                return Ok((nonce, hash));
            }
            nonce += 1;
        }
        Err(BlockchainError::MiningExhausted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Transaction;

    const TEST_BITS: u32 = 16;

    fn create_test_block() -> Block {
        let test_address = "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa";
        let coinbase_tx = Transaction::new_coinbase_tx(test_address, None, 50).unwrap();

        Block::new_block(vec![], &[coinbase_tx], 0, TEST_BITS).unwrap()
    }

    #[test]
    fn test_target_scales_with_difficulty() {
        let block = create_test_block();
        let easy = ProofOfWork::new_proof_of_work(block.clone(), 8);
        let hard = ProofOfWork::new_proof_of_work(block, 16);

        assert!(hard.target < easy.target);
    }

    #[test]
    fn test_mined_block_validates() {
        let block = create_test_block();
        assert!(ProofOfWork::validate(&block, TEST_BITS));
    }

    #[test]
    fn test_validation_fails_at_higher_difficulty() {
        // A nonce found for 16 bits is almost never valid at 64 bits
        let block = create_test_block();
        assert!(!ProofOfWork::validate(&block, 64));
    }

    #[test]
    fn test_tampered_nonce_fails_validation() {
        let block = create_test_block();
        let tampered = Block::new_test_block(
            block.get_timestamp(),
            block.get_pre_block_hash().to_vec(),
            block.get_transactions(),
            block.get_height(),
            block.get_nonce() + 1,
        );

        assert!(!ProofOfWork::validate(&tampered, TEST_BITS));
    }

    #[test]
    fn test_tampered_timestamp_fails_validation() {
        let block = create_test_block();
        let tampered = Block::new_test_block(
            block.get_timestamp() + 1,
            block.get_pre_block_hash().to_vec(),
            block.get_transactions(),
            block.get_height(),
            block.get_nonce(),
        );

        assert!(!ProofOfWork::validate(&tampered, TEST_BITS));
    }

    #[test]
    fn test_prepare_data_is_deterministic() {
        let block = create_test_block();
        let pow = ProofOfWork::new_proof_of_work(block, TEST_BITS);

        assert_eq!(pow.prepare_data(12345), pow.prepare_data(12345));
        assert_ne!(pow.prepare_data(12345), pow.prepare_data(54321));
    }
}
