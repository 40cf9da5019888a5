mod db;
mod memorydb;
mod overlaydb;
mod transaction;

pub use self::db::KeyValueDatabase;
pub use self::memorydb::{MemoryDatabase, SharedMemoryDatabase};
pub use self::overlaydb::OverlayDatabase;
pub use self::transaction::{Key, KeyState, KeyValue, Operation, Transaction, Value};
