use crate::core::{Blockchain, TXOutput};
use data_encoding::HEXLOWER;
use std::collections::HashMap;

/// The UTXO engine: derives the unspent-output set by scanning the chain
/// from the tip back to genesis. An output is unspent iff no later block
/// spends its outpoint, so outputs are emitted on first encounter and every
/// input seen along the way marks its outpoint as spent.
pub struct UTXOSet {
    blockchain: Blockchain,
}

impl UTXOSet {
    pub fn new(blockchain: Blockchain) -> UTXOSet {
        UTXOSet { blockchain }
    }

    pub fn get_blockchain(&self) -> &Blockchain {
        &self.blockchain
    }

    // One reverse scan over the chain, yielding every unspent output as
    // (txid hex, output index, output) in encounter order. Selection and
    // balance queries all fold over this.
    fn collect_unspent(&self) -> Vec<(String, usize, TXOutput)> {
        let mut unspent: Vec<(String, usize, TXOutput)> = vec![];
        let mut spent_txos: HashMap<String, Vec<i64>> = HashMap::new();

        for block in self.blockchain.iterator() {
            for tx in block.get_transactions() {
                let txid_hex = HEXLOWER.encode(tx.get_id());
                'outputs: for (idx, out) in tx.get_vout().iter().enumerate() {
                    if let Some(outs) = spent_txos.get(txid_hex.as_str()) {
                        for spent_out_idx in outs {
                            if (idx as i64).eq(spent_out_idx) {
                                continue 'outputs;
                            }
                        }
                    }
                    unspent.push((txid_hex.clone(), idx, out.clone()));
                }
                if tx.is_coinbase() {
                    continue;
                }

                for txin in tx.get_vin() {
                    let txid_hex = HEXLOWER.encode(txin.get_txid());
                    spent_txos
                        .entry(txid_hex)
                        .or_default()
                        .push(txin.get_vout());
                }
            }
        }
        unspent
    }

    /// The full unspent-output set, grouped by hex-encoded transaction ID
    pub fn find_utxo(&self) -> HashMap<String, Vec<TXOutput>> {
        let mut utxo: HashMap<String, Vec<TXOutput>> = HashMap::new();
        for (txid_hex, _, out) in self.collect_unspent() {
            utxo.entry(txid_hex).or_default().push(out);
        }
        utxo
    }

    /// Greedily select unspent outputs locked to `pub_key_hash` until the
    /// requested amount is covered, in chain reverse order. Returns the
    /// accumulated value and the picked output indices per transaction; the
    /// accumulated value is below `amount` when the address cannot cover it.
    pub fn find_spendable_outputs(
        &self,
        pub_key_hash: &[u8],
        amount: u64,
    ) -> (u64, HashMap<String, Vec<usize>>) {
        let mut unspent_outputs: HashMap<String, Vec<usize>> = HashMap::new();
        let mut accumulated = 0;

        for (txid_hex, idx, out) in self.collect_unspent() {
            if !out.is_locked_with_key(pub_key_hash) {
                continue;
            }
            accumulated += out.get_value();
            unspent_outputs.entry(txid_hex).or_default().push(idx);
            if accumulated >= amount {
                break;
            }
        }
        (accumulated, unspent_outputs)
    }

    /// Sum of all unspent outputs locked to `pub_key_hash`
    pub fn get_balance(&self, pub_key_hash: &[u8]) -> u64 {
        self.collect_unspent()
            .iter()
            .filter(|(_, _, out)| out.is_locked_with_key(pub_key_hash))
            .map(|(_, _, out)| out.get_value())
            .sum()
    }
}
