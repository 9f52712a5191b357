//! Resources: a project namespace of named assets whose lifecycle and
//! properties change only inside transactions.
//!
//! # Invariants
//! - An asset is bound to at most one atom, and an atom to at most one asset.
//! - `on_asset_appear` / `on_asset_disappear` fire for every binding change,
//!   whether it happens while a transaction runs, on rollback, undo or redo.
//! - Refs and trackers hold lookup keys, never owning pointers.

pub mod asset;
pub mod atom;
pub mod error;
pub mod project;
pub mod reference;
pub mod tracker;

pub use asset::{AnyAsset, Asset, AssetKind, Handle, Kind, Reflector};
pub use atom::Atom;
pub use error::ResError;
pub use project::Project;
pub use reference::{AnyRef, Ref};
pub use tracker::{PropTracker, Tracker, TreeTracker};

pub use tessera_transact::{Nexus, Property, Status, Teller, TransactError};

/// Crate name and version, for diagnostics.
pub fn crate_info() -> &'static str {
    concat!(env!("CARGO_PKG_NAME"), " v", env!("CARGO_PKG_VERSION"))
}
