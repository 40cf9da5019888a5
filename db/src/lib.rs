#[macro_use]
extern crate log;
extern crate parking_lot;
extern crate primitives;
extern crate chain;
extern crate serialization as ser;
extern crate storage;
extern crate dagcrypto as crypto;

pub mod dag_db;
pub mod kv;

pub use primitives::{hash, bytes};
pub use dag_db::DagDatabase;
