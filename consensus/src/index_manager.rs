use std::sync::Arc;
use storage::{AcceptanceDataStore, Error, GhostdagStore, SelectedParentChainChanges};

/// Optional indexes hooking block connection. Implementations are
/// handed every selected-parent chain delta under the same commit that
/// advanced the chain.
pub trait IndexManager: Send + Sync {
	/// Invoked once when the DAG finishes initializing, before any
	/// block is submitted.
	fn init(&self, acceptance: &AcceptanceDataStore, ghostdag: &GhostdagStore) -> Result<(), Error>;

	/// Invoked after a committed chain advance with the emitted delta.
	fn connect_block(
		&self,
		chain_changes: &SelectedParentChainChanges,
		acceptance: &AcceptanceDataStore,
		ghostdag: &GhostdagStore,
	) -> Result<(), Error>;
}

impl<T: IndexManager + ?Sized> IndexManager for Arc<T> {
	fn init(&self, acceptance: &AcceptanceDataStore, ghostdag: &GhostdagStore) -> Result<(), Error> {
		(**self).init(acceptance, ghostdag)
	}

	fn connect_block(
		&self,
		chain_changes: &SelectedParentChainChanges,
		acceptance: &AcceptanceDataStore,
		ghostdag: &GhostdagStore,
	) -> Result<(), Error> {
		(**self).connect_block(chain_changes, acceptance, ghostdag)
	}
}
