//! Per-block GHOSTDAG record.

use std::collections::HashMap;
use std::io;
use hash::H256;
use primitives::U256;
use ser::{CompactInteger, Deserializable, Error as ReaderError, Reader, Serializable, Stream};

/// Everything GHOSTDAG decided about one block: its selected parent, the
/// blue/red partition of its merge set and the accumulated blue totals.
#[derive(Debug, Clone, PartialEq)]
pub struct GhostdagData {
	/// `None` only for genesis.
	pub selected_parent: Option<H256>,
	/// Blue blocks of the merge set, in merge ordering.
	pub mergeset_blues: Vec<H256>,
	/// Red blocks of the merge set, in merge ordering.
	pub mergeset_reds: Vec<H256>,
	/// For every blue of this block's merge set: the size of its anticone
	/// within this block's blue past. Needed to extend the coloring.
	pub blues_anticone_sizes: HashMap<H256, u64>,
	pub blue_score: u64,
	pub blue_work: U256,
}

impl GhostdagData {
	pub fn genesis(blue_work: U256) -> Self {
		GhostdagData {
			selected_parent: None,
			mergeset_blues: vec![],
			mergeset_reds: vec![],
			blues_anticone_sizes: HashMap::new(),
			blue_score: 0,
			blue_work: blue_work,
		}
	}

	/// The merge set in merge ordering: blues first, then reds.
	pub fn mergeset(&self) -> impl Iterator<Item = &H256> {
		self.mergeset_blues.iter().chain(self.mergeset_reds.iter())
	}
}

impl Serializable for GhostdagData {
	fn serialize(&self, stream: &mut Stream) {
		stream.append(&self.selected_parent.unwrap_or_else(H256::zero));
		stream.append_list(&self.mergeset_blues);
		stream.append_list(&self.mergeset_reds);

		let mut anticone_sizes: Vec<_> = self.blues_anticone_sizes.iter().collect();
		anticone_sizes.sort_by(|a, b| a.0.cmp(b.0));
		stream.append(&CompactInteger::from(anticone_sizes.len()));
		for (hash, size) in anticone_sizes {
			stream.append(hash).append(size);
		}

		stream.append(&self.blue_score);
		let mut blue_work = [0u8; 32];
		self.blue_work.to_big_endian(&mut blue_work);
		stream.append_slice(&blue_work);
	}
}

impl Deserializable for GhostdagData {
	fn deserialize<T>(reader: &mut Reader<T>) -> Result<Self, ReaderError> where T: io::Read {
		let selected_parent: H256 = reader.read()?;
		let mergeset_blues = reader.read_list()?;
		let mergeset_reds = reader.read_list()?;

		let anticone_count: usize = reader.read::<CompactInteger>()?.into();
		let mut blues_anticone_sizes = HashMap::with_capacity(anticone_count);
		for _ in 0..anticone_count {
			let hash: H256 = reader.read()?;
			let size: u64 = reader.read()?;
			blues_anticone_sizes.insert(hash, size);
		}

		let blue_score = reader.read()?;
		let mut blue_work = [0u8; 32];
		reader.read_slice(&mut blue_work)?;

		Ok(GhostdagData {
			selected_parent: if selected_parent.is_zero() { None } else { Some(selected_parent) },
			mergeset_blues: mergeset_blues,
			mergeset_reds: mergeset_reds,
			blues_anticone_sizes: blues_anticone_sizes,
			blue_score: blue_score,
			blue_work: U256::from(&blue_work as &[u8]),
		})
	}
}
