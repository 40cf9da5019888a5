//! Primitive types used across the DAG consensus crates.

extern crate byteorder;
extern crate rustc_hex as hex;
pub extern crate bigint;

pub mod bytes;
pub mod compact;
pub mod hash;

pub use bigint::U256;
pub use bytes::Bytes;
pub use compact::Compact;
pub use hash::H256;
