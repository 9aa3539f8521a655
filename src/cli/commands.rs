use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "utxo-chain", about = "A minimal UTXO-model blockchain")]
pub struct Opt {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(
        name = "createblockchain",
        about = "Create a new blockchain and send the genesis reward to ADDRESS"
    )]
    Createblockchain {
        #[arg(long, help = "The address to send the genesis block reward to")]
        address: String,
    },
    #[command(name = "createwallet", about = "Create a new wallet")]
    Createwallet,
    #[command(name = "getbalance", about = "Get the balance of the target address")]
    GetBalance {
        #[arg(long, help = "The wallet address")]
        address: String,
    },
    #[command(name = "listaddresses", about = "Print local wallet addresses")]
    ListAddresses,
    #[command(
        name = "send",
        about = "Send AMOUNT from FROM to TO, mining the transaction into a new block"
    )]
    Send {
        #[arg(long, help = "Source wallet address")]
        from: String,
        #[arg(long, help = "Destination wallet address")]
        to: String,
        #[arg(long, help = "Amount to send")]
        amount: u64,
    },
    #[command(name = "printchain", about = "Print all blocks from the tip to genesis")]
    Printchain,
}
