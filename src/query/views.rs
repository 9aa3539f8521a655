use crate::core::{Block, ProofOfWork, Transaction};
use crate::wallet::{convert_address, hash_pub_key};
use data_encoding::HEXLOWER;
use serde::Serialize;

/// Sender shown for coinbase transactions, which create value from nothing
const COINBASE_SENDER: &str = "coinbase";

/// Chain-level summary
#[derive(Debug, Clone, Serialize)]
pub struct ChainInfo {
    pub height: usize,
    pub transactions: usize,
    pub version: String,
}

/// Serializable block view with hex-encoded hashes. `valid` reports whether
/// the stored block still satisfies its proof-of-work, so corrupted storage
/// is visible to every consumer.
#[derive(Debug, Clone, Serialize)]
pub struct BlockView {
    pub hash: String,
    pub prev_block_hash: String,
    pub timestamp: i64,
    pub height: usize,
    pub nonce: i64,
    pub valid: bool,
    pub transactions: Vec<TransactionView>,
}

/// Serializable transaction view. `from`/`to`/`amount` summarize the
/// transfer with the change output folded away; `inputs` lists the consumed
/// outpoints as `txid:vout`.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionView {
    pub id: String,
    pub from: String,
    pub to: String,
    pub amount: u64,
    pub timestamp: i64,
    pub inputs: Vec<String>,
}

/// Result of creating and mining a transaction
#[derive(Debug, Clone, Serialize)]
pub struct TransactionReceipt {
    pub txid: String,
    pub block: String,
}

pub(crate) fn block_view(block: &Block, difficulty_bits: u32) -> BlockView {
    let transactions = block
        .get_transactions()
        .iter()
        .map(|tx| transaction_view(tx, block.get_timestamp()))
        .collect();

    BlockView {
        hash: HEXLOWER.encode(block.get_hash()),
        prev_block_hash: HEXLOWER.encode(block.get_pre_block_hash()),
        timestamp: block.get_timestamp(),
        height: block.get_height(),
        nonce: block.get_nonce(),
        valid: ProofOfWork::validate(block, difficulty_bits),
        transactions,
    }
}

pub(crate) fn transaction_view(tx: &Transaction, block_timestamp: i64) -> TransactionView {
    let (from, to, amount) = summarize_transfer(tx);

    let inputs = tx
        .get_vin()
        .iter()
        .filter(|vin| !vin.get_txid().is_empty())
        .map(|vin| format!("{}:{}", HEXLOWER.encode(vin.get_txid()), vin.get_vout()))
        .collect();

    TransactionView {
        id: HEXLOWER.encode(tx.get_id()),
        from,
        to,
        amount,
        timestamp: block_timestamp,
        inputs,
    }
}

// Derive a human-readable (from, to, amount) triple. The recipient is the
// first output not locked back to the sender; a self-transfer falls back to
// the first output.
fn summarize_transfer(tx: &Transaction) -> (String, String, u64) {
    if tx.is_coinbase() {
        let out = &tx.get_vout()[0];
        return (
            COINBASE_SENDER.to_string(),
            convert_address(out.get_pub_key_hash()),
            out.get_value(),
        );
    }

    let sender_hash = hash_pub_key(tx.get_vin()[0].get_pub_key());
    let from = convert_address(&sender_hash);

    for out in tx.get_vout() {
        if !out.is_locked_with_key(&sender_hash) {
            return (from, convert_address(out.get_pub_key_hash()), out.get_value());
        }
    }

    let out = &tx.get_vout()[0];
    (
        from,
        convert_address(out.get_pub_key_hash()),
        out.get_value(),
    )
}
