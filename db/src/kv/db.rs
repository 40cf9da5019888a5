use kv::{Key, KeyState, Transaction, Value};

pub trait KeyValueDatabase: Send + Sync {
	fn write(&self, tx: Transaction) -> Result<(), String>;

	fn get(&self, key: &Key) -> Result<KeyState<Value>, String>;
}

impl<'a, T> KeyValueDatabase for &'a T where T: KeyValueDatabase {
	fn write(&self, tx: Transaction) -> Result<(), String> {
		(**self).write(tx)
	}

	fn get(&self, key: &Key) -> Result<KeyState<Value>, String> {
		(**self).get(key)
	}
}
