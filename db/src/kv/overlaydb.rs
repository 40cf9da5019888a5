//! Staging overlay over another database.

use kv::{Key, KeyState, KeyValueDatabase, MemoryDatabase, Transaction, Value};

/// Memory overlay over a backing database. Writes are staged locally;
/// reads see staged state first and fall through to the parent. The
/// overlay is either flushed into the parent as one transaction or
/// simply dropped, which discards everything staged.
pub struct OverlayDatabase<'a, T> where T: 'a + KeyValueDatabase {
	db: &'a T,
	overlay: MemoryDatabase,
}

impl<'a, T> OverlayDatabase<'a, T> where T: 'a + KeyValueDatabase {
	pub fn new(db: &'a T) -> Self {
		OverlayDatabase {
			db: db,
			overlay: MemoryDatabase::default(),
		}
	}

	/// Writes everything staged into the backing database as a single
	/// transaction.
	pub fn flush(&self) -> Result<(), String> {
		self.db.write(self.overlay.drain_transaction())
	}
}

impl<'a, T> KeyValueDatabase for OverlayDatabase<'a, T> where T: 'a + KeyValueDatabase {
	fn write(&self, tx: Transaction) -> Result<(), String> {
		self.overlay.write(tx)
	}

	fn get(&self, key: &Key) -> Result<KeyState<Value>, String> {
		if self.overlay.is_known(key) {
			self.overlay.get(key)
		} else {
			self.db.get(key)
		}
	}
}
