//! Ordering constraints between scheduled actions and the connection
//! resources of remote and guest nodes.
//!
//! One pass per planning cycle: a read-only `Snapshot` goes in, a
//! `Transition` (ordering constraints plus fencing requests) comes out.

pub mod classifier;
pub mod config;
pub mod container;
pub mod driver;
pub mod error;
pub mod fencing;
pub mod io;
pub mod options;
pub mod ordering;
pub mod plan;
pub mod query;
pub mod remote;
pub mod snapshot;
pub mod types;

pub use classifier::{classify, node_state, RemoteConnectionState};
pub use driver::{order_remote_connection_actions, plan};
pub use error::{Result, SchedError};
pub use plan::Transition;
pub use query::{is_failed_remote_node, rsc_corresponds_to_guest};
pub use snapshot::Snapshot;
