use clap::Parser;
use data_encoding::HEXLOWER;
use log::{error, LevelFilter};
use std::process;
use utxo_chain::{
    Blockchain, Command, Config, Opt, ProofOfWork, QueryService, Wallets,
};

fn main() {
    env_logger::builder().filter_level(LevelFilter::Info).init();

    let opt = Opt::parse();
    if let Err(e) = run_command(opt.command) {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn run_command(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env();

    match command {
        Command::Createblockchain { address } => {
            Blockchain::create(&config, &address)?;
            println!("Done!");
        }
        Command::Createwallet => {
            let mut wallets = Wallets::new(config.wallet_file())?;
            let address = wallets.create_wallet()?;
            wallets.save()?;
            println!("Your new address: {address}");
        }
        Command::GetBalance { address } => {
            let blockchain = Blockchain::open(&config)?;
            let service = QueryService::new(blockchain, config);
            let balance = service.balance(&address)?;
            println!("Balance of '{address}': {balance}");
        }
        Command::ListAddresses => {
            let wallets = Wallets::new(config.wallet_file())?;
            for address in wallets.get_addresses() {
                println!("{address}");
            }
        }
        Command::Send { from, to, amount } => {
            let blockchain = Blockchain::open(&config)?;
            let service = QueryService::new(blockchain, config);
            let receipt = service.create_transaction(&from, &to, amount)?;
            println!("Success! Transaction {} mined into block {}", receipt.txid, receipt.block);
        }
        Command::Printchain => {
            let blockchain = Blockchain::open(&config)?;
            for block in blockchain.iterator() {
                println!(
                    "Prev hash: {}",
                    HEXLOWER.encode(block.get_pre_block_hash())
                );
                println!("Hash:      {}", HEXLOWER.encode(block.get_hash()));
                println!("Height:    {}", block.get_height());
                println!(
                    "PoW:       {}",
                    ProofOfWork::validate(&block, blockchain.get_difficulty_bits())
                );
                for tx in block.get_transactions() {
                    println!("{tx}");
                }
                println!();
            }
        }
    }
    Ok(())
}
