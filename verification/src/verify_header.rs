use std::time::Duration;
use chain::IndexedBlockHeader;
use network::ConsensusParams;
use work::is_valid_proof_of_work;
use error::Error;

/// Context-free header checks.
///
/// `check` returns the duration the block has to wait before becoming
/// valid when its timestamp is ahead of local time; every other problem
/// is an error.
pub struct HeaderVerifier<'a> {
	pub proof_of_work: HeaderProofOfWork<'a>,
	pub parents: HeaderParents<'a>,
	pub timestamp: HeaderTimestamp<'a>,
}

impl<'a> HeaderVerifier<'a> {
	pub fn new(header: &'a IndexedBlockHeader, consensus: &'a ConsensusParams, current_time: u64) -> Self {
		HeaderVerifier {
			proof_of_work: HeaderProofOfWork::new(header, consensus),
			parents: HeaderParents::new(header, consensus),
			timestamp: HeaderTimestamp::new(header, consensus, current_time),
		}
	}

	pub fn check(&self) -> Result<Option<Duration>, Error> {
		self.proof_of_work.check()?;
		self.parents.check()?;
		// the delay check comes last: a delayed block is not an invalid one
		Ok(self.timestamp.delay())
	}
}

pub struct HeaderProofOfWork<'a> {
	header: &'a IndexedBlockHeader,
	max_work_bits: ::compact::Compact,
	skip_pow: bool,
}

impl<'a> HeaderProofOfWork<'a> {
	fn new(header: &'a IndexedBlockHeader, consensus: &ConsensusParams) -> Self {
		HeaderProofOfWork {
			header: header,
			max_work_bits: consensus.pow_max,
			skip_pow: consensus.skip_proof_of_work,
		}
	}

	fn check(&self) -> Result<(), Error> {
		let target = self.header.raw.bits.to_u256()
			.map_err(|_| Error::UnexpectedDifficulty { expected: self.max_work_bits, actual: self.header.raw.bits })?;

		let maximum = self.max_work_bits.to_u256()
			.expect("pow_max is a validated network constant");
		if target.is_zero() || target > maximum {
			return Err(Error::UnexpectedDifficulty { expected: self.max_work_bits, actual: self.header.raw.bits });
		}

		if self.skip_pow || is_valid_proof_of_work(self.max_work_bits, self.header.raw.bits, &self.header.hash) {
			Ok(())
		} else {
			Err(Error::HighHash)
		}
	}
}

pub struct HeaderParents<'a> {
	header: &'a IndexedBlockHeader,
	genesis_hash: ::hash::H256,
}

impl<'a> HeaderParents<'a> {
	fn new(header: &'a IndexedBlockHeader, consensus: &ConsensusParams) -> Self {
		HeaderParents {
			header: header,
			genesis_hash: consensus.genesis_hash,
		}
	}

	fn check(&self) -> Result<(), Error> {
		if self.header.raw.parent_hashes.is_empty() {
			if self.header.hash != self.genesis_hash {
				return Err(Error::NoParents);
			}
			return Ok(());
		}

		let sorted = self.header.raw.parent_hashes
			.windows(2)
			.all(|pair| pair[0] <= pair[1]);
		if !sorted {
			return Err(Error::WrongParentsOrder);
		}

		Ok(())
	}
}

pub struct HeaderTimestamp<'a> {
	header: &'a IndexedBlockHeader,
	current_time: u64,
	max_future: u64,
}

impl<'a> HeaderTimestamp<'a> {
	fn new(header: &'a IndexedBlockHeader, consensus: &ConsensusParams, current_time: u64) -> Self {
		HeaderTimestamp {
			header: header,
			current_time: current_time,
			max_future: consensus.max_future_block_time(),
		}
	}

	fn delay(&self) -> Option<Duration> {
		let max_timestamp = self.current_time + self.max_future;
		if self.header.raw.time > max_timestamp {
			Some(Duration::from_millis(self.header.raw.time - max_timestamp))
		} else {
			None
		}
	}
}

#[cfg(test)]
mod tests {
	use std::time::Duration;
	use chain::IndexedBlockHeader;
	use network::{ConsensusParams, Network};
	use error::Error;
	use super::HeaderVerifier;

	fn consensus() -> ConsensusParams {
		ConsensusParams::new(Network::Unitest)
	}

	#[test]
	fn test_genesis_header_passes() {
		let consensus = consensus();
		let genesis = consensus.genesis_block.header.clone();
		assert_eq!(HeaderVerifier::new(&genesis, &consensus, genesis.raw.time).check(), Ok(None));
	}

	#[test]
	fn test_orphaned_non_genesis_header_fails() {
		let consensus = consensus();
		let mut header = consensus.genesis_block.header.raw.clone();
		header.nonce = 1;
		let header = IndexedBlockHeader::from_raw(header);
		assert_eq!(HeaderVerifier::new(&header, &consensus, header.raw.time).check(), Err(Error::NoParents));
	}

	#[test]
	fn test_unsorted_parents_fail() {
		let consensus = consensus();
		let mut header = consensus.genesis_block.header.raw.clone();
		header.parent_hashes = vec![2u8.into(), 1u8.into()];
		let header = IndexedBlockHeader::from_raw(header);
		assert_eq!(HeaderVerifier::new(&header, &consensus, header.raw.time).check(), Err(Error::WrongParentsOrder));

		let mut header = header.raw;
		header.parent_hashes = vec![1u8.into(), 2u8.into()];
		let header = IndexedBlockHeader::from_raw(header);
		assert_eq!(HeaderVerifier::new(&header, &consensus, header.raw.time).check(), Ok(None));
	}

	#[test]
	fn test_futuristic_timestamp_is_delayed_not_rejected() {
		let consensus = consensus();
		let genesis = consensus.genesis_block.header.clone();
		let now = genesis.raw.time - consensus.max_future_block_time() - 2_000;

		assert_eq!(
			HeaderVerifier::new(&genesis, &consensus, now).check(),
			Ok(Some(Duration::from_millis(2_000))),
		);
	}

	#[test]
	fn test_bits_above_network_maximum_fail() {
		let consensus = ConsensusParams::new(Network::Mainnet);
		let mut header = consensus.genesis_block.header.raw.clone();
		header.bits = 0x207fffff.into();
		let header = IndexedBlockHeader::from_raw(header);

		assert_matches!(
			HeaderVerifier::new(&header, &consensus, header.raw.time).check(),
			Err(Error::UnexpectedDifficulty { .. })
		);
	}
}
