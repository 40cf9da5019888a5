extern crate rustc_hex as hex;
extern crate primitives;
extern crate dagcrypto as crypto;
extern crate serialization as ser;

pub mod constants;

mod block;
mod block_header;
mod indexed_block;
mod indexed_header;
mod indexed_transaction;
mod merkle_root;
mod subnetwork;
mod transaction;

pub use primitives::{hash, bytes, compact};

pub use block::Block;
pub use block_header::{BlockHeader, block_header_hash};
pub use indexed_block::IndexedBlock;
pub use indexed_header::IndexedBlockHeader;
pub use indexed_transaction::IndexedTransaction;
pub use merkle_root::merkle_root;
pub use subnetwork::{SubnetworkId, SUBNETWORK_ID_NATIVE, SUBNETWORK_ID_COINBASE};
pub use transaction::{OutPoint, Transaction, TransactionInput, TransactionOutput, transaction_hash, transaction_id};
