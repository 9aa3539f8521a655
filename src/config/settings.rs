use std::env;
use std::path::{Path, PathBuf};

/// Environment variable overriding the root data directory
pub const DATA_DIR_ENV: &str = "BLOCKCHAIN_DATA_DIR";

const DEFAULT_DATA_DIR: &str = "data";
const BLOCKCHAIN_SUBDIR: &str = "blockchain";
const WALLETS_SUBDIR: &str = "wallets";
const WALLET_FILE: &str = "wallet.dat";

/// Default proof-of-work difficulty in leading zero bits
pub const DEFAULT_DIFFICULTY_BITS: u32 = 20;

/// Coinbase reward paid by the genesis block
pub const GENESIS_REWARD: u64 = 50;

/// Process configuration, passed explicitly to every subsystem that touches
/// disk. `difficulty_bits` participates in the proof-of-work preimage and is
/// frozen for the lifetime of a chain instance.
#[derive(Debug, Clone)]
pub struct Config {
    data_dir: PathBuf,
    difficulty_bits: u32,
    reward: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

impl Config {
    /// Build a configuration from the environment: `BLOCKCHAIN_DATA_DIR` if
    /// set, `./data` otherwise.
    pub fn from_env() -> Config {
        let data_dir = match env::var(DATA_DIR_ENV) {
            Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => PathBuf::from(DEFAULT_DATA_DIR),
        };
        Config::new(data_dir)
    }

    pub fn new(data_dir: impl Into<PathBuf>) -> Config {
        Config {
            data_dir: data_dir.into(),
            difficulty_bits: DEFAULT_DIFFICULTY_BITS,
            reward: GENESIS_REWARD,
        }
    }

    pub fn with_difficulty_bits(mut self, bits: u32) -> Config {
        self.difficulty_bits = bits;
        self
    }

    pub fn with_reward(mut self, reward: u64) -> Config {
        self.reward = reward;
        self
    }

    pub fn get_data_dir(&self) -> &Path {
        self.data_dir.as_path()
    }

    /// Directory holding the KV store files
    pub fn blockchain_dir(&self) -> PathBuf {
        self.data_dir.join(BLOCKCHAIN_SUBDIR)
    }

    /// Path of the wallet keyring file
    pub fn wallet_file(&self) -> PathBuf {
        self.data_dir.join(WALLETS_SUBDIR).join(WALLET_FILE)
    }

    pub fn get_difficulty_bits(&self) -> u32 {
        self.difficulty_bits
    }

    pub fn get_reward(&self) -> u64 {
        self.reward
    }
}
