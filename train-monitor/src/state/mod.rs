//! Board state tracking and change detection.
//!
//! [`StateStore`] remembers the last board seen per station, diffs each new
//! snapshot against it, and applies per-station notification filters to the
//! result. With a [`StateDir`] attached, snapshots also survive restarts.

mod diff;
mod disk;
mod filter;
mod store;

pub use diff::detect_changes;
pub use disk::{PersistenceError, StateDir, StateEnvelope};
pub use filter::apply_filters;
pub use store::StateStore;
