//! Train station departure monitor.
//!
//! Polls UK National Rail departure/arrival boards on a schedule, diffs
//! each fetch against the previously stored snapshot, and pushes the
//! changes that matter (delays, cancellations, platform moves) to
//! Telegram chats.

pub mod darwin;
pub mod domain;
pub mod monitor;
pub mod notify;
pub mod provider;
pub mod state;
