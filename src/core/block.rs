use crate::core::{ProofOfWork, Transaction};
use crate::error::{BlockchainError, Result};
use crate::utils::{current_timestamp, deserialize, serialize};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct Block {
    timestamp: i64,
    pre_block_hash: Vec<u8>,
    hash: Vec<u8>,
    transactions: Vec<Transaction>,
    height: usize,
    nonce: i64,
}

impl Block {
    /// Assemble a block over `transactions` and mine it. Returns only once
    /// the proof-of-work search has found a satisfying nonce.
    pub fn new_block(
        pre_block_hash: Vec<u8>,
        transactions: &[Transaction],
        height: usize,
        difficulty_bits: u32,
    ) -> Result<Block> {
        if transactions.is_empty() {
            return Err(BlockchainError::InvalidTransaction(
                "Block must contain at least one transaction".to_string(),
            ));
        }

        let mut block = Block {
            timestamp: current_timestamp()?,
            pre_block_hash,
            hash: vec![],
            transactions: transactions.to_vec(),
            height,
            nonce: 0,
        };

        let pow = ProofOfWork::new_proof_of_work(block.clone(), difficulty_bits);
        let (nonce, hash) = pow.run()?;
        block.nonce = nonce;
        block.hash = hash;

        Ok(block)
    }

    /// The genesis block: no predecessor, height 0, a single coinbase
    pub fn generate_genesis_block(coinbase: &Transaction, difficulty_bits: u32) -> Result<Block> {
        Block::new_block(vec![], &[coinbase.clone()], 0, difficulty_bits)
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Block> {
        deserialize::<Block>(bytes)
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        serialize(self)
    }

    pub fn get_transactions(&self) -> &[Transaction] {
        self.transactions.as_slice()
    }

    pub fn get_pre_block_hash(&self) -> &[u8] {
        self.pre_block_hash.as_slice()
    }

    pub fn get_hash(&self) -> &[u8] {
        self.hash.as_slice()
    }

    pub fn get_hash_bytes(&self) -> Vec<u8> {
        self.hash.clone()
    }

    pub fn get_timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn get_height(&self) -> usize {
        self.height
    }

    pub fn get_nonce(&self) -> i64 {
        self.nonce
    }

    /// `SHA256` over the concatenated transaction IDs, in block order
    pub fn hash_transactions(&self) -> Vec<u8> {
        let mut tx_hashes = vec![];
        for transaction in &self.transactions {
            tx_hashes.extend(transaction.get_id());
        }

        crate::utils::sha256_digest(tx_hashes.as_slice())
    }

    /// Build a block with explicit fields and no mining (for testing only)
    #[cfg(test)]
    pub fn new_test_block(
        timestamp: i64,
        pre_block_hash: Vec<u8>,
        transactions: &[Transaction],
        height: usize,
        nonce: i64,
    ) -> Block {
        Block {
            timestamp,
            pre_block_hash,
            hash: vec![],
            transactions: transactions.to_vec(),
            height,
            nonce,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coinbase() -> Transaction {
        let address = "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa";
        Transaction::new_coinbase_tx(address, None, 50).unwrap()
    }

    #[test]
    fn test_block_serialization_round_trip() {
        let block = Block::new_block(vec![], &[coinbase()], 0, 8).unwrap();

        let bytes = block.serialize().unwrap();
        let decoded = Block::deserialize(&bytes).unwrap();

        assert_eq!(decoded.get_hash(), block.get_hash());
        assert_eq!(decoded.get_height(), block.get_height());
        assert_eq!(decoded.get_nonce(), block.get_nonce());
        assert_eq!(decoded.get_timestamp(), block.get_timestamp());
        assert_eq!(decoded.get_transactions().len(), 1);
    }

    #[test]
    fn test_empty_block_is_rejected() {
        assert!(Block::new_block(vec![], &[], 0, 8).is_err());
    }

    #[test]
    fn test_hash_transactions_depends_on_order() {
        let tx_a = coinbase();
        let tx_b = coinbase();

        let forward = Block::new_test_block(1, vec![], &[tx_a.clone(), tx_b.clone()], 0, 0);
        let reversed = Block::new_test_block(1, vec![], &[tx_b, tx_a], 0, 0);

        assert_ne!(forward.hash_transactions(), reversed.hash_transactions());
    }
}
