use crate::config::Config;
use crate::core::{Blockchain, Transaction};
use crate::error::{BlockchainError, Result};
use crate::query::views::{block_view, transaction_view};
use crate::query::{BlockView, ChainInfo, TransactionReceipt, TransactionView};
use crate::storage::UTXOSet;
use crate::wallet::{get_pub_key_hash_from_address, Wallets};
use data_encoding::HEXLOWER;

/// Defaults applied when a listing is requested without explicit paging
pub const DEFAULT_BLOCK_PAGE: usize = 10;
pub const DEFAULT_TX_PAGE: usize = 20;

/// The operations consumed by external surfaces (CLI, HTTP). Every result
/// is a serializable view with hex-encoded hashes and IDs.
pub struct QueryService {
    blockchain: Blockchain,
    config: Config,
}

impl QueryService {
    pub fn new(blockchain: Blockchain, config: Config) -> QueryService {
        QueryService { blockchain, config }
    }

    pub fn get_blockchain(&self) -> &Blockchain {
        &self.blockchain
    }

    /// Tip height, total transaction count and crate version
    pub fn info(&self) -> Result<ChainInfo> {
        let height = self.blockchain.get_best_height()?;
        let transactions = self
            .blockchain
            .iterator()
            .map(|block| block.get_transactions().len())
            .sum();

        Ok(ChainInfo {
            height,
            transactions,
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }

    /// Blocks from the tip backward, `offset` skipped, at most `limit`
    /// returned (a zero limit falls back to the default page size)
    pub fn blocks(&self, limit: usize, offset: usize) -> Result<Vec<BlockView>> {
        let limit = if limit == 0 { DEFAULT_BLOCK_PAGE } else { limit };
        let views = self
            .blockchain
            .iterator()
            .skip(offset)
            .take(limit)
            .map(|block| block_view(&block, self.blockchain.get_difficulty_bits()))
            .collect();
        Ok(views)
    }

    /// A single block by hex-encoded hash
    pub fn block(&self, hash_hex: &str) -> Result<BlockView> {
        let hash = HEXLOWER
            .decode(hash_hex.as_bytes())
            .map_err(|_| BlockchainError::NotFound(format!("block {hash_hex}")))?;
        let block = self
            .blockchain
            .get_block(&hash)?
            .ok_or_else(|| BlockchainError::NotFound(format!("block {hash_hex}")))?;
        Ok(block_view(&block, self.blockchain.get_difficulty_bits()))
    }

    /// A single block by height
    pub fn block_at_height(&self, height: usize) -> Result<BlockView> {
        for block in self.blockchain.iterator() {
            if block.get_height() == height {
                return Ok(block_view(&block, self.blockchain.get_difficulty_bits()));
            }
            if block.get_height() < height {
                break;
            }
        }
        Err(BlockchainError::NotFound(format!("block at height {height}")))
    }

    /// Transactions from the tip backward, paged like [`Self::blocks`]
    pub fn transactions(&self, limit: usize, offset: usize) -> Result<Vec<TransactionView>> {
        let limit = if limit == 0 { DEFAULT_TX_PAGE } else { limit };
        let mut views = vec![];
        let mut current = 0;

        for block in self.blockchain.iterator() {
            for tx in block.get_transactions() {
                if current >= offset {
                    views.push(transaction_view(tx, block.get_timestamp()));
                    if views.len() >= limit {
                        return Ok(views);
                    }
                }
                current += 1;
            }
        }
        Ok(views)
    }

    /// A single transaction by hex-encoded ID, stamped with the timestamp of
    /// its containing block
    pub fn transaction(&self, id_hex: &str) -> Result<TransactionView> {
        let id = HEXLOWER
            .decode(id_hex.as_bytes())
            .map_err(|_| BlockchainError::NotFound(format!("transaction {id_hex}")))?;

        for block in self.blockchain.iterator() {
            for tx in block.get_transactions() {
                if tx.get_id() == id.as_slice() {
                    return Ok(transaction_view(tx, block.get_timestamp()));
                }
            }
        }
        Err(BlockchainError::NotFound(format!("transaction {id_hex}")))
    }

    /// Addresses present in the keyring
    pub fn wallets(&self) -> Result<Vec<String>> {
        let wallets = Wallets::new(self.config.wallet_file())?;
        Ok(wallets.get_addresses())
    }

    /// Create a keypair, persist the keyring and return the new address
    pub fn create_wallet(&self) -> Result<String> {
        let mut wallets = Wallets::new(self.config.wallet_file())?;
        let address = wallets.create_wallet()?;
        wallets.save()?;
        Ok(address)
    }

    /// Balance of `address`: the sum of unspent outputs locked to its
    /// pubkey hash
    pub fn balance(&self, address: &str) -> Result<u64> {
        let pub_key_hash = get_pub_key_hash_from_address(address)?;
        let utxo_set = UTXOSet::new(self.blockchain.clone());
        Ok(utxo_set.get_balance(&pub_key_hash))
    }

    /// Every transaction `address` took part in, as sender or recipient,
    /// from the tip backward
    pub fn wallet_history(&self, address: &str) -> Result<Vec<TransactionView>> {
        let pub_key_hash = get_pub_key_hash_from_address(address)?;
        let mut views = vec![];

        for block in self.blockchain.iterator() {
            for tx in block.get_transactions() {
                let sends = !tx.is_coinbase()
                    && tx.get_vin().iter().any(|vin| vin.uses_key(&pub_key_hash));
                let receives = tx
                    .get_vout()
                    .iter()
                    .any(|vout| vout.is_locked_with_key(&pub_key_hash));

                if sends || receives {
                    views.push(transaction_view(tx, block.get_timestamp()));
                }
            }
        }
        Ok(views)
    }

    /// Build, sign and mine a transfer. The transaction is committed in a
    /// new block before this returns; there is no mempool.
    pub fn create_transaction(
        &self,
        from: &str,
        to: &str,
        amount: u64,
    ) -> Result<TransactionReceipt> {
        let wallets = Wallets::new(self.config.wallet_file())?;
        let utxo_set = UTXOSet::new(self.blockchain.clone());

        let tx = Transaction::new_utxo_transaction(from, to, amount, &utxo_set, &wallets)?;
        let block = self.blockchain.mine_block(std::slice::from_ref(&tx))?;

        Ok(TransactionReceipt {
            txid: HEXLOWER.encode(tx.get_id()),
            block: HEXLOWER.encode(block.get_hash()),
        })
    }
}
