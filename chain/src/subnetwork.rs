use std::{cmp, fmt, io};
use hex::ToHex;
use ser::{Deserializable, Error as ReaderError, Reader, Serializable, Stream};

/// The native subnetwork: ordinary value-transfer transactions.
pub const SUBNETWORK_ID_NATIVE: SubnetworkId = SubnetworkId([0; 20]);

/// The built-in subnetwork carrying coinbase transactions.
pub const SUBNETWORK_ID_COINBASE: SubnetworkId = SubnetworkId([
	1, 0, 0, 0, 0, 0, 0, 0, 0, 0,
	0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
]);

/// 20-byte subnetwork identifier.
#[derive(Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubnetworkId([u8; 20]);

impl SubnetworkId {
	pub fn is_native(&self) -> bool {
		*self == SUBNETWORK_ID_NATIVE
	}

	pub fn is_coinbase(&self) -> bool {
		*self == SUBNETWORK_ID_COINBASE
	}

	/// A subnetwork every node understands without registration.
	pub fn is_builtin(&self) -> bool {
		self.is_native() || self.is_coinbase()
	}
}

impl From<[u8; 20]> for SubnetworkId {
	fn from(raw: [u8; 20]) -> Self {
		SubnetworkId(raw)
	}
}

impl PartialOrd for SubnetworkId {
	fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for SubnetworkId {
	fn cmp(&self, other: &Self) -> cmp::Ordering {
		self.0[..].cmp(&other.0[..])
	}
}

impl fmt::Debug for SubnetworkId {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.write_str(&self.0.to_hex::<String>())
	}
}

impl Serializable for SubnetworkId {
	fn serialize(&self, stream: &mut Stream) {
		stream.append_slice(&self.0);
	}

	fn serialized_size(&self) -> usize {
		20
	}
}

impl Deserializable for SubnetworkId {
	fn deserialize<T>(reader: &mut Reader<T>) -> Result<Self, ReaderError> where T: io::Read {
		let mut raw = [0u8; 20];
		reader.read_slice(&mut raw)?;
		Ok(SubnetworkId(raw))
	}
}

#[cfg(test)]
mod tests {
	use super::{SubnetworkId, SUBNETWORK_ID_COINBASE, SUBNETWORK_ID_NATIVE};

	#[test]
	fn test_builtin_subnetworks() {
		assert!(SUBNETWORK_ID_NATIVE.is_builtin());
		assert!(SUBNETWORK_ID_COINBASE.is_builtin());
		assert!(!SubnetworkId::from([7; 20]).is_builtin());
	}

	#[test]
	fn test_subnetwork_ordering() {
		assert!(SUBNETWORK_ID_NATIVE < SUBNETWORK_ID_COINBASE);
		assert!(SUBNETWORK_ID_COINBASE < SubnetworkId::from([7; 20]));
	}
}
