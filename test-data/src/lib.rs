//! Builders for blocks and transactions used across the crates' tests.

extern crate chain;
extern crate primitives;
extern crate serialization as ser;

mod block_builder;
mod chain_builder;
mod transaction_builder;

pub use block_builder::{block_builder, BlockBuilder};
pub use chain_builder::ChainBuilder;
pub use transaction_builder::{transaction_builder, TransactionBuilder};
