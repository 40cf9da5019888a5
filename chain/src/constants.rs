/// Sequence value that disables both the relative lock and the lock-time
/// check for the input carrying it.
pub const SEQUENCE_FINAL: u64 = ::std::u64::MAX;

/// Below this threshold `lock_time` is interpreted as a blue score,
/// above it as a millisecond timestamp.
pub const LOCK_TIME_THRESHOLD: u64 = 500_000_000_000;

/// Number of sompi in one coin.
pub const SOMPI_PER_COIN: u64 = 100_000_000;

/// Maximum amount of money that can ever exist, in sompi.
pub const MAX_SOMPI: u64 = 21_000_000 * SOMPI_PER_COIN;

/// Index of the coinbase transaction within a block.
pub const COINBASE_TRANSACTION_INDEX: usize = 0;
