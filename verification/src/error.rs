use chain::OutPoint;
use compact::Compact;
use hash::H256;
use script::Error as SignatureError;
use storage::Error as DBError;

/// All possible verification errors. A block failing with any of these is
/// invalid or disqualified; the caller marks it and carries on.
#[derive(Debug, PartialEq)]
pub enum Error {
	/// Block is already known
	Duplicate,
	/// Some of the referenced parents are missing from the DAG
	ParentsUnknown(Vec<H256>),
	/// Compact target is zero, negative or above the network maximum,
	/// or does not match the retargeting rule
	UnexpectedDifficulty { expected: Compact, actual: Compact },
	/// Block hash is above the target described by the header bits
	HighHash,
	/// A non-genesis block without parents
	NoParents,
	/// Parent hashes are not sorted ascending
	WrongParentsOrder,
	/// No transactions in block
	NoTransactions,
	/// Accumulated block mass is above the allowed limit
	BlockMassTooHigh { mass: u64, max: u64 },
	/// First transaction in block is not a coinbase
	FirstTxNotCoinbase,
	/// Block contains a second coinbase (index is provided)
	MultipleCoinbases(usize),
	/// Transactions after the coinbase are not sorted by subnetwork
	TransactionsNotSorted,
	/// Non-native subnetworks are not active on this network
	InvalidSubnetwork,
	/// Invalid merkle root
	BadMerkleRoot { expected: H256, actual: H256 },
	/// Block contains the same transaction twice
	DuplicateTx(H256),
	/// Two transactions of the block spend the same outpoint
	DoubleSpendInSameBlock(OutPoint),
	/// A transaction overwrites an older transaction that is not fully
	/// spent
	OverwriteTx(H256),
	/// Block timestamp is not after the past median time of its
	/// selected parent
	TimeTooOld { timestamp: u64, median: u64 },
	/// A parent is behind the finality point
	Finality(H256),
	/// A parent is an ancestor of another parent
	InvalidParentsRelation(H256, H256),
	/// Total transaction fees overflowed
	BadFees,
	/// Coinbase claims more than subsidy plus accepted fees
	BadCoinbaseValue { expected_max: u64, actual: u64 },
	/// Header UTXO commitment does not match the computed multiset
	BadUTXOCommitment { expected: H256, actual: H256 },
	/// Header accepted-id merkle root does not match the acceptance data
	BadAcceptedIDMerkleRoot { expected: H256, actual: H256 },
	/// One of the transactions is invalid (corresponding index and
	/// specific transaction error)
	Transaction(usize, TransactionError),
	/// Database error
	Database(DBError),
}

impl From<DBError> for Error {
	fn from(err: DBError) -> Self {
		Error::Database(err)
	}
}

/// Possible transactions verification errors
#[derive(Debug, PartialEq)]
pub enum TransactionError {
	/// Transaction has no inputs or no outputs
	Empty,
	/// Coinbase marker on a transaction with inputs
	CoinbaseWithInputs,
	/// Coinbase payload is longer than allowed
	CoinbasePayloadLength(usize),
	/// Transaction has duplicate inputs
	DuplicateInput(OutPoint),
	/// Referenced output does not exist or is already spent
	MissingTxOut(OutPoint),
	/// An output value is above the money ceiling
	BadTxOutValue { value: u64, max: u64 },
	/// Outputs claim more than the inputs provide
	SpendTooHigh { spent: u64, available: u64 },
	/// Referenced coinbase output has not matured yet
	ImmatureSpend { origin: u64, spend: u64, maturity: u64 },
	/// Lock time or sequence locks are not satisfied yet
	UnfinalizedTx,
	/// Transaction mass is above the allowed limit
	TxMassTooHigh { mass: u64, max: u64 },
	/// Signature invalid for given input
	Signature(usize, SignatureError),
}
