//! Transactions: every state change is a self-inverse [`Operation`], grouped
//! by a [`Teller`] into a [`Transaction`], and linked into the undo/redo
//! history owned by a [`Nexus`].
//!
//! # Invariants
//! - Executing an operation twice leaves its storage exactly as it was.
//! - At most one teller is open per nexus.
//! - A teller dropped without committing rolls back every operation it ran.
//! - Committing a transaction discards the redo history.

pub mod error;
pub mod nexus;
pub mod op;
pub mod property;
pub mod teller;
pub mod transaction;

pub use error::TransactError;
pub use nexus::{History, Nexus, Status};
pub use op::{Exchange, Operation, Signal, Splice};
pub use property::{Property, PropertyView};
pub use teller::{DEFAULT_DESCRIPTION, Teller};
pub use transaction::Transaction;

/// Crate name and version, for diagnostics.
pub fn crate_info() -> &'static str {
    concat!(env!("CARGO_PKG_NAME"), " v", env!("CARGO_PKG_VERSION"))
}
