//! End-to-end tests over the ledger engine: genesis, transfers with change,
//! overspend rejection, corruption detection and persistence across reopen.

use tempfile::{tempdir, TempDir};
use utxo_chain::{Blockchain, BlockchainError, Config, ProofOfWork, QueryService, Wallets};

// Low enough to mine instantly, high enough that a tampered block passing
// validation by chance is not a realistic flake.
const TEST_DIFFICULTY_BITS: u32 = 16;

struct TestChain {
    _dir: TempDir,
    config: Config,
    blockchain: Blockchain,
    alice: String,
    bob: String,
}

// A fresh chain in a temp directory with two wallets, genesis paying alice.
fn setup() -> TestChain {
    let dir = tempdir().unwrap();
    let config = Config::new(dir.path()).with_difficulty_bits(TEST_DIFFICULTY_BITS);

    let mut wallets = Wallets::new(config.wallet_file()).unwrap();
    let alice = wallets.create_wallet().unwrap();
    let bob = wallets.create_wallet().unwrap();
    wallets.save().unwrap();

    let blockchain = Blockchain::create(&config, &alice).unwrap();

    TestChain {
        _dir: dir,
        config,
        blockchain,
        alice,
        bob,
    }
}

fn service(chain: &TestChain) -> QueryService {
    QueryService::new(chain.blockchain.clone(), chain.config.clone())
}

fn total_supply(service: &QueryService) -> u64 {
    let utxo_set = utxo_chain::UTXOSet::new(service.get_blockchain().clone());
    utxo_set
        .find_utxo()
        .values()
        .flatten()
        .map(|out| out.get_value())
        .sum()
}

#[test]
fn test_genesis() {
    let chain = setup();
    let service = service(&chain);

    assert_eq!(chain.blockchain.get_best_height().unwrap(), 0);
    assert_eq!(service.balance(&chain.alice).unwrap(), 50);
    assert_eq!(service.balance(&chain.bob).unwrap(), 0);

    let tip = chain
        .blockchain
        .get_block(&chain.blockchain.get_tip_hash())
        .unwrap()
        .unwrap();
    assert!(tip.get_pre_block_hash().is_empty());
    assert!(ProofOfWork::validate(&tip, TEST_DIFFICULTY_BITS));
    assert!(tip.get_transactions()[0].is_coinbase());
}

#[test]
fn test_chain_must_not_exist_before_create() {
    let chain = setup();
    match Blockchain::create(&chain.config, &chain.alice) {
        Err(BlockchainError::AlreadyInitialized(_)) => {}
        Err(other) => panic!("expected AlreadyInitialized, got {other}"),
        Ok(_) => panic!("second create must fail"),
    }
}

#[test]
fn test_open_requires_existing_chain() {
    let dir = tempdir().unwrap();
    let config = Config::new(dir.path());
    match Blockchain::open(&config) {
        Err(BlockchainError::NotInitialized) => {}
        Err(other) => panic!("expected NotInitialized, got {other}"),
        Ok(_) => panic!("open must fail before create"),
    }
}

#[test]
fn test_simple_transfer() {
    let chain = setup();
    let service = service(&chain);

    let old_tip = chain.blockchain.get_tip_hash();
    let receipt = service
        .create_transaction(&chain.alice, &chain.bob, 10)
        .unwrap();

    // ledger monotonicity: one new block on top of the old tip
    assert_eq!(chain.blockchain.get_best_height().unwrap(), 1);
    let tip = chain
        .blockchain
        .get_block(&chain.blockchain.get_tip_hash())
        .unwrap()
        .unwrap();
    assert_eq!(tip.get_pre_block_hash(), old_tip.as_slice());
    assert_eq!(data_encoding::HEXLOWER.encode(tip.get_hash()), receipt.block);

    assert_eq!(service.balance(&chain.alice).unwrap(), 40);
    assert_eq!(service.balance(&chain.bob).unwrap(), 10);
    assert_eq!(total_supply(&service), 50);
}

#[test]
fn test_change_outputs_across_sequential_sends() {
    let chain = setup();
    let service = service(&chain);

    service
        .create_transaction(&chain.alice, &chain.bob, 7)
        .unwrap();
    service
        .create_transaction(&chain.alice, &chain.bob, 7)
        .unwrap();

    assert_eq!(service.balance(&chain.alice).unwrap(), 36);
    assert_eq!(service.balance(&chain.bob).unwrap(), 14);
    assert_eq!(total_supply(&service), 50);
    assert_eq!(chain.blockchain.get_best_height().unwrap(), 2);
}

#[test]
fn test_overspend_is_rejected_and_chain_unchanged() {
    let chain = setup();
    let service = service(&chain);

    service
        .create_transaction(&chain.alice, &chain.bob, 10)
        .unwrap();
    let height_before = chain.blockchain.get_best_height().unwrap();

    match service.create_transaction(&chain.bob, &chain.alice, 1_000_000) {
        Err(BlockchainError::InsufficientFunds {
            required,
            available,
        }) => {
            assert_eq!(required, 1_000_000);
            assert_eq!(available, 10);
        }
        other => panic!("expected InsufficientFunds, got {other:?}"),
    }

    assert_eq!(chain.blockchain.get_best_height().unwrap(), height_before);
    assert_eq!(service.balance(&chain.bob).unwrap(), 10);
}

#[test]
fn test_balance_of_invalid_address() {
    let chain = setup();
    let service = service(&chain);

    match service.balance("not_a_real_address") {
        Err(BlockchainError::InvalidAddress(_)) => {}
        other => panic!("expected InvalidAddress, got {other:?}"),
    }
}

#[test]
fn test_double_spend_is_rejected_at_mine_time() {
    let chain = setup();
    let wallets = Wallets::new(chain.config.wallet_file()).unwrap();
    let utxo_set = utxo_chain::UTXOSet::new(chain.blockchain.clone());

    let tx = utxo_chain::Transaction::new_utxo_transaction(
        &chain.alice,
        &chain.bob,
        5,
        &utxo_set,
        &wallets,
    )
    .unwrap();

    chain
        .blockchain
        .mine_block(std::slice::from_ref(&tx))
        .unwrap();

    // the same transaction now spends an already-consumed outpoint
    match chain.blockchain.mine_block(std::slice::from_ref(&tx)) {
        Err(BlockchainError::InvalidTransaction(_)) => {}
        other => panic!("expected InvalidTransaction, got {other:?}"),
    }
}

#[test]
fn test_corrupted_block_fails_validation_on_read() {
    let chain = setup();
    let service = service(&chain);
    service
        .create_transaction(&chain.alice, &chain.bob, 10)
        .unwrap();

    // flip a byte in the stored bytes of the (non-genesis) tip block
    let tip_hash = chain.blockchain.get_tip_hash();
    let blocks_tree = chain.blockchain.get_db().open_tree("blocks").unwrap();
    let mut bytes = blocks_tree.get(&tip_hash).unwrap().unwrap().to_vec();
    let last = bytes.len() - 1;
    bytes[last] ^= 0x01;
    blocks_tree.insert(tip_hash.as_slice(), bytes).unwrap();

    let tampered = chain.blockchain.get_block(&tip_hash).unwrap().unwrap();
    assert!(!ProofOfWork::validate(&tampered, TEST_DIFFICULTY_BITS));

    // the iterator still yields the block, the façade flags it as corrupt
    let views = service.blocks(1, 0).unwrap();
    assert!(!views[0].valid);
}

#[test]
fn test_utxo_balance_equivalence() {
    let chain = setup();
    let service = service(&chain);
    service
        .create_transaction(&chain.alice, &chain.bob, 13)
        .unwrap();

    let utxo_set = utxo_chain::UTXOSet::new(chain.blockchain.clone());
    for address in [&chain.alice, &chain.bob] {
        let pub_key_hash = utxo_chain::get_pub_key_hash_from_address(address).unwrap();
        let summed: u64 = utxo_set
            .find_utxo()
            .values()
            .flatten()
            .filter(|out| out.is_locked_with_key(&pub_key_hash))
            .map(|out| out.get_value())
            .sum();
        assert_eq!(service.balance(address).unwrap(), summed);
    }
}

#[test]
fn test_query_facade_views() {
    let chain = setup();
    let service = service(&chain);
    let receipt = service
        .create_transaction(&chain.alice, &chain.bob, 10)
        .unwrap();

    let info = service.info().unwrap();
    assert_eq!(info.height, 1);
    assert_eq!(info.transactions, 2); // genesis coinbase + the transfer
    assert!(!info.version.is_empty());

    let blocks = service.blocks(0, 0).unwrap();
    assert_eq!(blocks.len(), 2);
    assert!(blocks.iter().all(|b| b.valid));
    assert_eq!(blocks[0].height, 1);
    assert_eq!(blocks[1].height, 0);
    assert_eq!(blocks[0].prev_block_hash, blocks[1].hash);

    let by_hash = service.block(&receipt.block).unwrap();
    assert_eq!(by_hash.height, 1);
    let by_height = service.block_at_height(0).unwrap();
    assert_eq!(by_height.hash, blocks[1].hash);

    let tx = service.transaction(&receipt.txid).unwrap();
    assert_eq!(tx.from, chain.alice);
    assert_eq!(tx.to, chain.bob);
    assert_eq!(tx.amount, 10);
    assert_eq!(tx.inputs.len(), 1);

    match service.block("00ff00ff") {
        Err(BlockchainError::NotFound(_)) => {}
        other => panic!("expected NotFound, got {other:?}"),
    }
    match service.transaction("deadbeef") {
        Err(BlockchainError::NotFound(_)) => {}
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[test]
fn test_wallet_history() {
    let chain = setup();
    let service = service(&chain);
    service
        .create_transaction(&chain.alice, &chain.bob, 10)
        .unwrap();

    // alice: genesis coinbase + the transfer; bob: the transfer only
    let alice_history = service.wallet_history(&chain.alice).unwrap();
    assert_eq!(alice_history.len(), 2);
    let bob_history = service.wallet_history(&chain.bob).unwrap();
    assert_eq!(bob_history.len(), 1);
    assert_eq!(bob_history[0].amount, 10);

    let addresses = service.wallets().unwrap();
    assert!(addresses.contains(&chain.alice));
    assert!(addresses.contains(&chain.bob));
}

#[test]
fn test_chain_persists_across_reopen() {
    let dir = tempdir().unwrap();
    let config = Config::new(dir.path()).with_difficulty_bits(TEST_DIFFICULTY_BITS);

    let mut wallets = Wallets::new(config.wallet_file()).unwrap();
    let alice = wallets.create_wallet().unwrap();
    let bob = wallets.create_wallet().unwrap();
    wallets.save().unwrap();

    let tip_hash;
    {
        let blockchain = Blockchain::create(&config, &alice).unwrap();
        let service = QueryService::new(blockchain.clone(), config.clone());
        service.create_transaction(&alice, &bob, 10).unwrap();
        tip_hash = blockchain.get_tip_hash();
    }

    let reopened = Blockchain::open(&config).unwrap();
    assert_eq!(reopened.get_tip_hash(), tip_hash);
    assert_eq!(reopened.get_best_height().unwrap(), 1);

    let service = QueryService::new(reopened, config);
    assert_eq!(service.balance(&alice).unwrap(), 40);
    assert_eq!(service.balance(&bob).unwrap(), 10);
}
