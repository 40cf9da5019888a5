use std::fmt;
use chain::OutPoint;
use hash::H256;
use ser::Error as ReaderError;

/// Infrastructure error: the database misbehaved, a stored record failed
/// to decode, or a consensus invariant broke. Unlike rule errors these
/// propagate up and abort the operation with staged state discarded.
#[derive(Debug, PartialEq)]
pub enum Error {
	/// Low level database error
	DatabaseDriverError(String),
	/// Stored value failed to deserialize
	DeserializationFailed,
	/// A record that has to exist was not found
	MissingRecord(&'static str, H256),
	/// UTXO diff application touched an outpoint it must not
	DiffConflict(OutPoint),
	/// The reachability root interval ran out of slots
	ReachabilityReindexOverflow,
	/// Stored state contradicts itself
	InconsistentData(&'static str),
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match *self {
			Error::DatabaseDriverError(ref msg) => write!(f, "database driver error: {}", msg),
			Error::DeserializationFailed => "stored value failed to deserialize".fmt(f),
			Error::MissingRecord(store, ref hash) => write!(f, "no {} record for block {}", store, hash),
			Error::DiffConflict(ref outpoint) => write!(f, "utxo diff conflict on {:?}", outpoint),
			Error::ReachabilityReindexOverflow => "reachability root interval exhausted".fmt(f),
			Error::InconsistentData(what) => write!(f, "inconsistent data: {}", what),
		}
	}
}

impl From<ReaderError> for Error {
	fn from(_: ReaderError) -> Self {
		Error::DeserializationFailed
	}
}

impl From<String> for Error {
	fn from(msg: String) -> Self {
		Error::DatabaseDriverError(msg)
	}
}
