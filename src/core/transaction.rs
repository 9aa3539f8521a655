// The UTXO transaction system. Every transaction consumes outputs of earlier
// transactions and creates new ones; outputs are locked to a pubkey hash and
// inputs prove ownership with an ECDSA-P256 signature over a trimmed copy of
// the spending transaction.

use crate::error::{BlockchainError, Result};
use crate::storage::UTXOSet;
use crate::utils::{
    deserialize, ecdsa_p256_sha256_sign_digest, ecdsa_p256_sha256_sign_verify, serialize,
    sha256_digest,
};
use crate::wallet::{hash_pub_key, validate_address, Wallets};
use data_encoding::HEXLOWER;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Output index a coinbase input carries in place of a real reference
pub const COINBASE_VOUT: i64 = -1;

/// A reference to an output of an earlier transaction, plus the signature
/// and public key that unlock it
#[derive(Debug, Clone, Default, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct TXInput {
    txid: Vec<u8>,
    vout: i64,
    signature: Vec<u8>,
    pub_key: Vec<u8>,
}

impl TXInput {
    pub fn new(txid: &[u8], vout: i64) -> TXInput {
        TXInput {
            txid: txid.to_vec(),
            vout,
            signature: vec![],
            pub_key: vec![],
        }
    }

    pub fn get_txid(&self) -> &[u8] {
        self.txid.as_slice()
    }

    pub fn get_vout(&self) -> i64 {
        self.vout
    }

    pub fn get_pub_key(&self) -> &[u8] {
        self.pub_key.as_slice()
    }

    pub fn get_signature(&self) -> &[u8] {
        self.signature.as_slice()
    }

    /// Whether this input was created by the owner of `pub_key_hash`
    pub fn uses_key(&self, pub_key_hash: &[u8]) -> bool {
        let locking_hash = hash_pub_key(self.pub_key.as_slice());
        locking_hash.eq(pub_key_hash)
    }
}

/// An amount locked to a pubkey hash
#[derive(Debug, Clone, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct TXOutput {
    value: u64,
    pub_key_hash: Vec<u8>,
}

impl TXOutput {
    pub fn new(value: u64, address: &str) -> Result<TXOutput> {
        if value == 0 {
            return Err(BlockchainError::InvalidTransaction(
                "Transaction value must be positive".to_string(),
            ));
        }

        let mut output = TXOutput {
            value,
            pub_key_hash: vec![],
        };
        output.lock(address)?;
        Ok(output)
    }

    pub fn get_value(&self) -> u64 {
        self.value
    }

    pub fn get_pub_key_hash(&self) -> &[u8] {
        self.pub_key_hash.as_slice()
    }

    fn lock(&mut self, address: &str) -> Result<()> {
        self.pub_key_hash = crate::wallet::get_pub_key_hash_from_address(address)?;
        Ok(())
    }

    pub fn is_locked_with_key(&self, pub_key_hash: &[u8]) -> bool {
        self.pub_key_hash.eq(pub_key_hash)
    }
}

/// A transfer of value. The ID is the SHA-256 of the canonical encoding of
/// the transaction with the ID field empty, so it is a pure function of the
/// inputs and outputs.
#[derive(Debug, Clone, Default, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct Transaction {
    id: Vec<u8>,
    vin: Vec<TXInput>,
    vout: Vec<TXOutput>,
}

impl Transaction {
    /// A coinbase transaction: one synthetic input (empty txid, output index
    /// -1, no signature) and one output paying `reward` to `to`. The input's
    /// pub_key field carries `data`, or random bytes when none is given so
    /// two coinbases to the same address never share an ID.
    pub fn new_coinbase_tx(to: &str, data: Option<&[u8]>, reward: u64) -> Result<Transaction> {
        let pub_key = match data {
            Some(data) => data.to_vec(),
            None => Uuid::new_v4().as_bytes().to_vec(),
        };
        let tx_input = TXInput {
            txid: vec![],
            vout: COINBASE_VOUT,
            signature: vec![],
            pub_key,
        };
        let tx_output = TXOutput::new(reward, to)?;

        let mut tx = Transaction {
            id: vec![],
            vin: vec![tx_input],
            vout: vec![tx_output],
        };
        tx.id = tx.hash()?;
        Ok(tx)
    }

    /// Build and sign a transfer of `amount` from `from` to `to`, spending
    /// outputs selected by the UTXO engine and returning change to `from`.
    pub fn new_utxo_transaction(
        from: &str,
        to: &str,
        amount: u64,
        utxo_set: &UTXOSet,
        wallets: &Wallets,
    ) -> Result<Transaction> {
        if amount == 0 {
            return Err(BlockchainError::InvalidTransaction(
                "Amount must be positive".to_string(),
            ));
        }
        if !validate_address(from) {
            return Err(BlockchainError::InvalidAddress(from.to_string()));
        }
        if !validate_address(to) {
            return Err(BlockchainError::InvalidAddress(to.to_string()));
        }

        let wallet = wallets
            .get_wallet(from)
            .ok_or_else(|| BlockchainError::Wallet(format!("No wallet for address: {from}")))?;
        let pub_key_hash = hash_pub_key(wallet.get_public_key());

        let (accumulated, valid_outputs) =
            utxo_set.find_spendable_outputs(pub_key_hash.as_slice(), amount);
        if accumulated < amount {
            return Err(BlockchainError::InsufficientFunds {
                required: amount,
                available: accumulated,
            });
        }

        let mut inputs = vec![];
        for (txid_hex, outs) in valid_outputs {
            let txid = HEXLOWER.decode(txid_hex.as_bytes()).map_err(|e| {
                BlockchainError::Serialization(format!("Invalid transaction ID: {e}"))
            })?;
            for out in outs {
                inputs.push(TXInput {
                    txid: txid.clone(),
                    vout: out as i64,
                    signature: vec![],
                    pub_key: wallet.get_public_key().to_vec(),
                });
            }
        }

        let mut outputs = vec![TXOutput::new(amount, to)?];
        if accumulated > amount {
            outputs.push(TXOutput::new(accumulated - amount, from)?);
        }

        let mut tx = Transaction {
            id: vec![],
            vin: inputs,
            vout: outputs,
        };
        tx.id = tx.hash()?;

        utxo_set
            .get_blockchain()
            .sign_transaction(&mut tx, wallet.get_private_key())?;
        Ok(tx)
    }

    pub fn is_coinbase(&self) -> bool {
        self.vin.len() == 1 && self.vin[0].txid.is_empty() && self.vin[0].vout == COINBASE_VOUT
    }

    /// Clone with every input reduced to its outpoint reference. Signature
    /// preimages are derived from this copy.
    fn trimmed_copy(&self) -> Transaction {
        let mut inputs = vec![];
        for input in &self.vin {
            inputs.push(TXInput::new(input.get_txid(), input.get_vout()));
        }
        Transaction {
            id: self.id.clone(),
            vin: inputs,
            vout: self.vout.clone(),
        }
    }

    /// Sign every input against the outputs it spends. `prev_txs` maps
    /// hex-encoded transaction IDs to the referenced transactions.
    pub fn sign(
        &mut self,
        private_key: &[u8],
        prev_txs: &HashMap<String, Transaction>,
    ) -> Result<()> {
        if self.is_coinbase() {
            return Ok(());
        }

        let mut tx_copy = self.trimmed_copy();

        for (idx, vin) in self.vin.iter_mut().enumerate() {
            let txid_hex = HEXLOWER.encode(vin.get_txid());
            let prev_tx = prev_txs.get(txid_hex.as_str()).ok_or_else(|| {
                BlockchainError::NotFound(format!("previous transaction {txid_hex}"))
            })?;
            let out_idx = prevout_index(vin.vout, prev_tx)?;

            tx_copy.vin[idx].signature = vec![];
            tx_copy.vin[idx].pub_key = prev_tx.vout[out_idx].pub_key_hash.clone();
            tx_copy.id = tx_copy.hash()?;
            tx_copy.vin[idx].pub_key = vec![];

            vin.signature = ecdsa_p256_sha256_sign_digest(private_key, tx_copy.get_id())?;
        }
        Ok(())
    }

    /// Verify every input signature, mirroring the signing preimage
    /// construction. Coinbase transactions verify unconditionally. Any
    /// missing prevout, value imbalance or bad signature fails the whole
    /// transaction.
    pub fn verify(&self, prev_txs: &HashMap<String, Transaction>) -> bool {
        if self.is_coinbase() {
            return true;
        }

        if !self.verify_balance(prev_txs) {
            return false;
        }

        let mut tx_copy = self.trimmed_copy();

        for (idx, vin) in self.vin.iter().enumerate() {
            let txid_hex = HEXLOWER.encode(vin.get_txid());
            let prev_tx = match prev_txs.get(txid_hex.as_str()) {
                Some(tx) => tx,
                None => {
                    log::error!("Previous transaction {txid_hex} not found during verification");
                    return false;
                }
            };
            let out_idx = match prevout_index(vin.vout, prev_tx) {
                Ok(idx) => idx,
                Err(e) => {
                    log::error!("Invalid prevout reference during verification: {e}");
                    return false;
                }
            };

            tx_copy.vin[idx].signature = vec![];
            tx_copy.vin[idx].pub_key = prev_tx.vout[out_idx].pub_key_hash.clone();
            tx_copy.id = match tx_copy.hash() {
                Ok(id) => id,
                Err(e) => {
                    log::error!("Failed to hash signing preimage: {e}");
                    return false;
                }
            };
            tx_copy.vin[idx].pub_key = vec![];

            if !ecdsa_p256_sha256_sign_verify(
                vin.pub_key.as_slice(),
                vin.signature.as_slice(),
                tx_copy.get_id(),
            ) {
                return false;
            }
        }
        true
    }

    // Value conservation: the inputs of a non-coinbase transaction must carry
    // exactly the value its outputs create. There are no fees.
    fn verify_balance(&self, prev_txs: &HashMap<String, Transaction>) -> bool {
        let mut input_value: u64 = 0;
        for vin in &self.vin {
            let txid_hex = HEXLOWER.encode(vin.get_txid());
            let prev_tx = match prev_txs.get(txid_hex.as_str()) {
                Some(tx) => tx,
                None => return false,
            };
            let out_idx = match prevout_index(vin.vout, prev_tx) {
                Ok(idx) => idx,
                Err(_) => return false,
            };
            input_value = match input_value.checked_add(prev_tx.vout[out_idx].value) {
                Some(sum) => sum,
                None => return false,
            };
        }

        let mut output_value: u64 = 0;
        for vout in &self.vout {
            output_value = match output_value.checked_add(vout.value) {
                Some(sum) => sum,
                None => return false,
            };
        }

        if input_value != output_value {
            log::error!(
                "Transaction balance violation: inputs={input_value}, outputs={output_value}"
            );
            return false;
        }
        true
    }

    /// SHA-256 over the canonical encoding with the ID field empty
    fn hash(&self) -> Result<Vec<u8>> {
        let tx_copy = Transaction {
            id: vec![],
            vin: self.vin.clone(),
            vout: self.vout.clone(),
        };
        Ok(sha256_digest(&tx_copy.serialize()?))
    }

    pub fn get_id(&self) -> &[u8] {
        self.id.as_slice()
    }

    pub fn get_vin(&self) -> &[TXInput] {
        self.vin.as_slice()
    }

    pub fn get_vout(&self) -> &[TXOutput] {
        self.vout.as_slice()
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        serialize(self)
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Transaction> {
        deserialize(bytes)
    }
}

/// Bounds-checked conversion of an input's output index into a usable index
/// into the referenced transaction's outputs
fn prevout_index(vout: i64, prev_tx: &Transaction) -> Result<usize> {
    let idx = usize::try_from(vout).map_err(|_| {
        BlockchainError::InvalidTransaction(format!("Negative output index: {vout}"))
    })?;
    if idx >= prev_tx.vout.len() {
        return Err(BlockchainError::InvalidTransaction(format!(
            "Output index {idx} out of range"
        )));
    }
    Ok(idx)
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Transaction {}:", HEXLOWER.encode(&self.id))?;
        for (i, input) in self.vin.iter().enumerate() {
            writeln!(f, "     Input {i}:")?;
            writeln!(f, "       TXID:      {}", HEXLOWER.encode(&input.txid))?;
            writeln!(f, "       Out:       {}", input.vout)?;
            writeln!(f, "       Signature: {}", HEXLOWER.encode(&input.signature))?;
            writeln!(f, "       PubKey:    {}", HEXLOWER.encode(&input.pub_key))?;
        }
        for (i, output) in self.vout.iter().enumerate() {
            writeln!(f, "     Output {i}:")?;
            writeln!(f, "       Value:  {}", output.value)?;
            writeln!(f, "       Script: {}", HEXLOWER.encode(&output.pub_key_hash))?;
        }
        Ok(())
    }
}
