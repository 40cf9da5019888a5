use std::{cmp, fmt};
use hash::H256;
use transaction::{Transaction, transaction_hash, transaction_id};

#[derive(Default, Clone)]
pub struct IndexedTransaction {
	/// Id: the hash that excludes signature scripts.
	pub id: H256,
	/// Hash of the full serialization.
	pub hash: H256,
	pub raw: Transaction,
}

impl fmt::Debug for IndexedTransaction {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.debug_struct("IndexedTransaction")
			.field("id", &self.id)
			.field("hash", &self.hash)
			.field("raw", &self.raw)
			.finish()
	}
}

impl<T> From<T> for IndexedTransaction where Transaction: From<T> {
	fn from(other: T) -> Self {
		Self::from_raw(other)
	}
}

impl IndexedTransaction {
	pub fn new(id: H256, hash: H256, transaction: Transaction) -> Self {
		IndexedTransaction {
			id: id,
			hash: hash,
			raw: transaction,
		}
	}

	/// Explicit conversion of the raw Transaction into IndexedTransaction.
	///
	/// Computes both the transaction id and the transaction hash.
	pub fn from_raw<T>(transaction: T) -> Self where Transaction: From<T> {
		let transaction = Transaction::from(transaction);
		Self::new(transaction_id(&transaction), transaction_hash(&transaction), transaction)
	}
}

impl cmp::PartialEq for IndexedTransaction {
	fn eq(&self, other: &Self) -> bool {
		self.hash == other.hash
	}
}
