// The chain store: append-only, content-addressed block storage on top of
// sled. Blocks are keyed by their hash; the "lh" key points at the tip. A
// block and the tip advance are committed in one transaction, so a crash can
// orphan a block but never lose the tip.

use crate::config::Config;
use crate::core::{Block, Transaction};
use crate::error::{BlockchainError, Result};
use data_encoding::HEXLOWER;
use log::info;
use sled::{Db, Tree};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

const TIP_BLOCK_HASH_KEY: &[u8] = b"lh";
const BLOCKS_TREE: &str = "blocks";

const GENESIS_COINBASE_DATA: &[u8] = b"Genesis block reward";

/// Handle on the persistent chain: the sled database plus a cached copy of
/// the tip hash. Cloning shares both.
#[derive(Clone)]
pub struct Blockchain {
    tip_hash: Arc<RwLock<Vec<u8>>>,
    db: Db,
    difficulty_bits: u32,
}

impl Blockchain {
    /// Initialize a brand-new chain at `config.blockchain_dir()`: mine a
    /// genesis block over a coinbase paying the configured reward to
    /// `genesis_address`. Fails if a store already exists there.
    pub fn create(config: &Config, genesis_address: &str) -> Result<Blockchain> {
        if !crate::wallet::validate_address(genesis_address) {
            return Err(BlockchainError::InvalidAddress(genesis_address.to_string()));
        }

        let path = config.blockchain_dir();
        if path.exists() {
            return Err(BlockchainError::AlreadyInitialized(
                path.display().to_string(),
            ));
        }

        let db = sled::open(&path)
            .map_err(|e| BlockchainError::Database(format!("Failed to open database: {e}")))?;
        let blocks_tree = db
            .open_tree(BLOCKS_TREE)
            .map_err(|e| BlockchainError::Database(format!("Failed to open blocks tree: {e}")))?;

        info!("Creating genesis block for address: {genesis_address}");
        let coinbase_tx = Transaction::new_coinbase_tx(
            genesis_address,
            Some(GENESIS_COINBASE_DATA),
            config.get_reward(),
        )?;
        let genesis = Block::generate_genesis_block(&coinbase_tx, config.get_difficulty_bits())?;
        Self::update_blocks_tree(&blocks_tree, &genesis)?;

        Ok(Blockchain {
            tip_hash: Arc::new(RwLock::new(genesis.get_hash_bytes())),
            db,
            difficulty_bits: config.get_difficulty_bits(),
        })
    }

    /// Open an existing chain, caching the stored tip hash. Fails if the
    /// store does not exist or carries no tip pointer.
    pub fn open(config: &Config) -> Result<Blockchain> {
        let path = config.blockchain_dir();
        if !path.exists() {
            return Err(BlockchainError::NotInitialized);
        }

        let db = sled::open(&path)
            .map_err(|e| BlockchainError::Database(format!("Failed to open database: {e}")))?;
        let blocks_tree = db
            .open_tree(BLOCKS_TREE)
            .map_err(|e| BlockchainError::Database(format!("Failed to open blocks tree: {e}")))?;

        let tip_hash = blocks_tree
            .get(TIP_BLOCK_HASH_KEY)
            .map_err(|e| BlockchainError::Database(format!("Failed to get tip hash: {e}")))?
            .ok_or(BlockchainError::NotInitialized)?;

        Ok(Blockchain {
            tip_hash: Arc::new(RwLock::new(tip_hash.to_vec())),
            db,
            difficulty_bits: config.get_difficulty_bits(),
        })
    }

    // Commit a block and advance the tip pointer in one write transaction,
    // then flush so the commit survives process exit.
    fn update_blocks_tree(blocks_tree: &Tree, block: &Block) -> Result<()> {
        let block_data = block.serialize()?;

        blocks_tree
            .transaction(|tx_db| {
                tx_db.insert(block.get_hash(), block_data.as_slice())?;
                tx_db.insert(TIP_BLOCK_HASH_KEY, block.get_hash())?;
                Ok(())
            })
            .map_err(|e: sled::transaction::TransactionError| {
                BlockchainError::Database(format!("Failed to update blocks tree: {e}"))
            })?;

        blocks_tree
            .flush()
            .map_err(|e| BlockchainError::Database(format!("Failed to flush blocks tree: {e}")))?;
        Ok(())
    }

    pub fn get_db(&self) -> &Db {
        &self.db
    }

    pub fn get_difficulty_bits(&self) -> u32 {
        self.difficulty_bits
    }

    pub fn get_tip_hash(&self) -> Vec<u8> {
        self.tip_hash
            .read()
            .expect("tip_hash lock poisoned")
            .clone()
    }

    fn set_tip_hash(&self, new_tip_hash: &[u8]) {
        let mut tip_hash = self.tip_hash.write().expect("tip_hash lock poisoned");
        *tip_hash = new_tip_hash.to_vec();
    }

    /// Verify `transactions`, mine a block over them on top of the current
    /// tip and commit it. No partial state is visible on failure.
    pub fn mine_block(&self, transactions: &[Transaction]) -> Result<Block> {
        for (i, transaction) in transactions.iter().enumerate() {
            if !self.verify_transaction(transaction)? {
                return Err(BlockchainError::InvalidTransaction(format!(
                    "Transaction at index {i} failed verification"
                )));
            }
        }
        self.check_for_double_spending(transactions)?;

        let best_height = self.get_best_height()?;
        let block = Block::new_block(
            self.get_tip_hash(),
            transactions,
            best_height + 1,
            self.difficulty_bits,
        )?;

        let blocks_tree = self
            .db
            .open_tree(BLOCKS_TREE)
            .map_err(|e| BlockchainError::Database(format!("Failed to open blocks tree: {e}")))?;
        Self::update_blocks_tree(&blocks_tree, &block)?;
        self.set_tip_hash(block.get_hash());

        info!(
            "Mined block {} at height {}",
            HEXLOWER.encode(block.get_hash()),
            block.get_height()
        );
        Ok(block)
    }

    /// Cursor over the chain from the tip back to genesis
    pub fn iterator(&self) -> BlockchainIterator {
        BlockchainIterator::new(self.get_tip_hash(), self.db.clone())
    }

    /// Linear reverse search for a transaction by ID
    pub fn find_transaction(&self, txid: &[u8]) -> Result<Transaction> {
        for block in self.iterator() {
            for transaction in block.get_transactions() {
                if txid.eq(transaction.get_id()) {
                    return Ok(transaction.clone());
                }
            }
        }
        Err(BlockchainError::NotFound(format!(
            "transaction {}",
            HEXLOWER.encode(txid)
        )))
    }

    /// Sign `tx` with `private_key`, resolving every referenced prevout from
    /// the chain
    pub fn sign_transaction(&self, tx: &mut Transaction, private_key: &[u8]) -> Result<()> {
        let prev_txs = self.collect_previous_transactions(tx)?;
        tx.sign(private_key, &prev_txs)
    }

    /// Verify a transaction against the chain: its prevouts must exist and
    /// be unspent, and every input signature must hold
    pub fn verify_transaction(&self, tx: &Transaction) -> Result<bool> {
        if tx.is_coinbase() {
            return Ok(true);
        }

        for vin in tx.get_vin() {
            if self.is_output_spent(vin.get_txid(), vin.get_vout()) {
                log::error!(
                    "Input already spent: {}:{}",
                    HEXLOWER.encode(vin.get_txid()),
                    vin.get_vout()
                );
                return Ok(false);
            }
        }

        let prev_txs = match self.collect_previous_transactions(tx) {
            Ok(prev_txs) => prev_txs,
            Err(BlockchainError::NotFound(what)) => {
                log::error!("Referenced {what} does not exist");
                return Ok(false);
            }
            Err(e) => return Err(e),
        };
        Ok(tx.verify(&prev_txs))
    }

    fn collect_previous_transactions(
        &self,
        tx: &Transaction,
    ) -> Result<HashMap<String, Transaction>> {
        let mut prev_txs = HashMap::new();
        for vin in tx.get_vin() {
            let prev_tx = self.find_transaction(vin.get_txid())?;
            prev_txs.insert(HEXLOWER.encode(vin.get_txid()), prev_tx);
        }
        Ok(prev_txs)
    }

    // No two transactions in one candidate block may consume the same
    // outpoint.
    fn check_for_double_spending(&self, transactions: &[Transaction]) -> Result<()> {
        let mut spent_outputs: HashSet<(Vec<u8>, i64)> = HashSet::new();

        for (tx_index, transaction) in transactions.iter().enumerate() {
            if transaction.is_coinbase() {
                continue;
            }

            for input in transaction.get_vin() {
                let outpoint = (input.get_txid().to_vec(), input.get_vout());
                if !spent_outputs.insert(outpoint) {
                    return Err(BlockchainError::InvalidTransaction(format!(
                        "Double spend in transaction {}: output {}:{} already spent in this block",
                        tx_index,
                        HEXLOWER.encode(input.get_txid()),
                        input.get_vout()
                    )));
                }
            }
        }
        Ok(())
    }

    /// Whether any transaction already on chain spends the given outpoint
    pub fn is_output_spent(&self, txid: &[u8], vout: i64) -> bool {
        for block in self.iterator() {
            for transaction in block.get_transactions() {
                if transaction.is_coinbase() {
                    continue;
                }
                for input in transaction.get_vin() {
                    if input.get_txid() == txid && input.get_vout() == vout {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Height of the tip block
    pub fn get_best_height(&self) -> Result<usize> {
        let tip_block = self
            .get_block(&self.get_tip_hash())?
            .ok_or_else(|| BlockchainError::Database("Tip block not found".to_string()))?;
        Ok(tip_block.get_height())
    }

    /// Fetch a block by its raw hash
    pub fn get_block(&self, block_hash: &[u8]) -> Result<Option<Block>> {
        let blocks_tree = self
            .db
            .open_tree(BLOCKS_TREE)
            .map_err(|e| BlockchainError::Database(format!("Failed to open blocks tree: {e}")))?;

        if let Some(block_bytes) = blocks_tree
            .get(block_hash)
            .map_err(|e| BlockchainError::Database(format!("Failed to get block: {e}")))?
        {
            let block = Block::deserialize(block_bytes.as_ref())?;
            return Ok(Some(block));
        }
        Ok(None)
    }
}

/// Read-only cursor over the chain. Holds the database handle and the hash
/// of the next block to yield; consistent with the tip at construction time.
pub struct BlockchainIterator {
    db: Db,
    current_hash: Vec<u8>,
}

impl BlockchainIterator {
    fn new(tip_hash: Vec<u8>, db: Db) -> BlockchainIterator {
        BlockchainIterator {
            current_hash: tip_hash,
            db,
        }
    }
}

impl Iterator for BlockchainIterator {
    type Item = Block;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_hash.is_empty() {
            return None;
        }
        let blocks_tree = self.db.open_tree(BLOCKS_TREE).ok()?;
        let data = blocks_tree.get(&self.current_hash).ok()??;
        let block = Block::deserialize(data.as_ref()).ok()?;
        self.current_hash = block.get_pre_block_hash().to_vec();
        Some(block)
    }
}
