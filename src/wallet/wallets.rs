use crate::error::{BlockchainError, Result};
use crate::utils::{deserialize, serialize};
use crate::wallet::Wallet;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

/// The wallet keyring: every keypair this node controls, keyed by address.
/// Persisted as a single file; the private keys are stored in the clear.
pub struct Wallets {
    wallets: HashMap<String, Wallet>,
    wallet_file: PathBuf,
}

impl Wallets {
    /// Load the keyring at `wallet_file`. A missing file yields an empty
    /// keyring; a file that exists but does not decode is an error.
    pub fn new(wallet_file: impl Into<PathBuf>) -> Result<Wallets> {
        let mut wallets = Wallets {
            wallets: HashMap::new(),
            wallet_file: wallet_file.into(),
        };
        wallets.load_from_file()?;
        Ok(wallets)
    }

    /// Generate a keypair, derive its address and add it to the keyring.
    /// Persisting the keyring is the caller's responsibility.
    pub fn create_wallet(&mut self) -> Result<String> {
        let wallet = Wallet::new()?;
        let address = wallet.get_address();
        self.wallets.insert(address.clone(), wallet);
        Ok(address)
    }

    pub fn get_addresses(&self) -> Vec<String> {
        self.wallets.keys().cloned().collect()
    }

    pub fn get_wallet(&self, address: &str) -> Option<&Wallet> {
        self.wallets.get(address)
    }

    /// Write the keyring to disk atomically: encode to `<wallet_file>.tmp`,
    /// then rename over the real file.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.wallet_file.parent() {
            fs::create_dir_all(parent)?;
        }

        let wallets_bytes = serialize(&self.wallets)?;
        let tmp_path = self.wallet_file.with_extension("dat.tmp");
        fs::write(&tmp_path, wallets_bytes)?;
        fs::rename(&tmp_path, &self.wallet_file)?;
        Ok(())
    }

    fn load_from_file(&mut self) -> Result<()> {
        if !self.wallet_file.exists() {
            log::warn!(
                "Wallet file {} not found, starting with an empty keyring",
                self.wallet_file.display()
            );
            return Ok(());
        }

        let buf = fs::read(&self.wallet_file)?;
        self.wallets = deserialize(&buf).map_err(|e| {
            BlockchainError::CorruptWalletFile(format!(
                "{}: {e}",
                self.wallet_file.display()
            ))
        })?;
        Ok(())
    }
}
