//! Live departure board clients.
//!
//! Two real backends serve the same canonical [`crate::domain::StationBoard`]
//! snapshot: the authenticated Darwin LDB gateway and the keyless
//! departureboard.io mirror. [`BoardSource`] picks between them from the
//! configured credential and owns the retry policy; [`mock`] provides a
//! scripted stand-in for tests.

mod convert;
mod error;
mod ldb;
pub mod mock;
mod public;
mod source;
mod types;

pub use error::{SourceError, UpstreamError};
pub use ldb::{LdbClient, LdbConfig};
pub use public::{PublicClient, PublicConfig};
pub use source::{BoardSource, PLACEHOLDER_API_KEY, SourceHealth};
pub use types::Direction;
