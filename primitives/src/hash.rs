//! Fixed-size 32-byte hash.

use std::{cmp, fmt, ops, str};
use hex::{FromHex, FromHexError, ToHex};
use bigint::U256;

/// 32-byte hash. Ordering is lexicographic over the raw bytes.
#[derive(Default, Clone, Copy)]
pub struct H256([u8; 32]);

impl H256 {
	pub fn from_slice(slice: &[u8]) -> Self {
		let mut result = H256::default();
		result.0.copy_from_slice(slice);
		result
	}

	/// The distinguished all-zero hash.
	pub fn zero() -> Self {
		H256::default()
	}

	pub fn is_zero(&self) -> bool {
		self.0.iter().all(|b| *b == 0)
	}

	pub fn take(self) -> [u8; 32] {
		self.0
	}

	/// Big-endian interpretation of the raw bytes, used by proof-of-work
	/// comparisons.
	pub fn to_u256(&self) -> U256 {
		U256::from(&self.0 as &[u8])
	}
}

impl From<[u8; 32]> for H256 {
	fn from(h: [u8; 32]) -> Self {
		H256(h)
	}
}

impl From<H256> for [u8; 32] {
	fn from(h: H256) -> Self {
		h.0
	}
}

impl<'a> From<&'a [u8]> for H256 {
	fn from(slice: &'a [u8]) -> Self {
		H256::from_slice(slice)
	}
}

impl From<&'static str> for H256 {
	fn from(s: &'static str) -> Self {
		s.parse().unwrap()
	}
}

impl From<u8> for H256 {
	fn from(v: u8) -> Self {
		let mut result = H256::default();
		result.0[31] = v;
		result
	}
}

impl str::FromStr for H256 {
	type Err = FromHexError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let vec: Vec<u8> = s.from_hex()?;
		match vec.len() {
			32 => {
				let mut result = [0u8; 32];
				result.copy_from_slice(&vec);
				Ok(H256(result))
			},
			_ => Err(FromHexError::InvalidHexLength),
		}
	}
}

impl fmt::Debug for H256 {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.write_str(&self.0.to_hex::<String>())
	}
}

impl fmt::Display for H256 {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.write_str(&self.0.to_hex::<String>())
	}
}

impl ops::Deref for H256 {
	type Target = [u8; 32];

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

impl ops::DerefMut for H256 {
	fn deref_mut(&mut self) -> &mut Self::Target {
		&mut self.0
	}
}

impl AsRef<[u8]> for H256 {
	fn as_ref(&self) -> &[u8] {
		&self.0
	}
}

impl PartialEq for H256 {
	fn eq(&self, other: &Self) -> bool {
		self.0[..] == other.0[..]
	}
}

impl Eq for H256 {}

impl PartialOrd for H256 {
	fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for H256 {
	fn cmp(&self, other: &Self) -> cmp::Ordering {
		self.0[..].cmp(&other.0[..])
	}
}

impl ::std::hash::Hash for H256 {
	fn hash<H>(&self, state: &mut H) where H: ::std::hash::Hasher {
		state.write(&self.0);
		state.finish();
	}
}

#[cfg(test)]
mod tests {
	use super::H256;

	#[test]
	fn hash_ordering_is_lexicographic() {
		let lo = H256::from(1u8);
		let hi = H256::from(2u8);
		assert!(lo < hi);

		let mut top = H256::default();
		top[0] = 1;
		assert!(hi < top);
	}

	#[test]
	fn hash_from_str() {
		let h: H256 = "0000000000000000000000000000000000000000000000000000000000000001".into();
		assert_eq!(h, H256::from(1u8));
		assert!(!h.is_zero());
		assert!(H256::zero().is_zero());
	}
}
