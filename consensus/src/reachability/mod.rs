//! Persistent tree-interval index answering "is A in the past of B?".

mod interval;
mod store;
mod tree;

pub use self::interval::Interval;
pub use self::store::{flush_reachability, load_reachability};
pub use self::tree::{NodeId, ReachabilityIndex, TreeNode};
