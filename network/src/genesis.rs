//! Deterministic genesis blocks.

use chain::{Block, BlockHeader, Transaction, TransactionOutput, merkle_root};
use chain::constants::SOMPI_PER_COIN;
use chain::SUBNETWORK_ID_COINBASE;
use primitives::compact::Compact;
use primitives::hash::H256;
use network::Network;

const OP_TRUE: u8 = 0x51;

fn genesis_coinbase(payload: &[u8]) -> Transaction {
	Transaction {
		version: 1,
		inputs: vec![],
		outputs: vec![TransactionOutput {
			value: 50 * SOMPI_PER_COIN,
			script_pubkey: vec![OP_TRUE].into(),
		}],
		lock_time: 0,
		subnetwork_id: SUBNETWORK_ID_COINBASE,
		payload: payload.to_vec().into(),
	}
}

/// Builds the genesis block of the given network. The block has no
/// parents, an empty past UTXO, and carries a single coinbase.
pub fn genesis_block(network: Network) -> Block {
	let (payload, time, bits) = match network {
		Network::Mainnet => (&b"dag-mainnet-genesis"[..], 1_593_526_800_000, 0x1e00ffff),
		Network::Testnet => (&b"dag-testnet-genesis"[..], 1_593_526_800_000, 0x1e7fffff),
		Network::Unitest => (&b"dag-unitest-genesis"[..], 1_000_000_000_000, 0x207fffff),
	};

	let coinbase = genesis_coinbase(payload);
	let header = BlockHeader {
		version: 1,
		parent_hashes: vec![],
		hash_merkle_root: merkle_root(&[coinbase.hash()]),
		accepted_id_merkle_root: H256::zero(),
		utxo_commitment: H256::zero(),
		time: time,
		bits: Compact::new(bits),
		nonce: 0,
	};

	Block::new(header, vec![coinbase])
}
