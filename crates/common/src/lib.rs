//! Shared types for the tessera workspace: identifiers and the
//! single-threaded change-notification primitive every other crate uses.

pub mod event;
pub mod types;

pub use event::{Event, Subscription};
pub use types::{AssetId, ProjectId};
