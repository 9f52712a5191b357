use crate::atom::Atom;
use tessera_transact::TransactError;

/// Errors from namespace and asset operations.
///
/// Every mutator validates before it records anything, so returning one of
/// these never leaves a half-applied change behind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResError {
    #[error("null atom")]
    NullAtom,
    #[error("invalid name component {0:?}")]
    InvalidName(String),
    #[error("name {0} is already bound")]
    NameTaken(Atom),
    #[error("nothing is bound to {0}")]
    NotBound(Atom),
    #[error("asset is not alive")]
    AssetDead,
    #[error("expected a {expected} asset, found {found}")]
    KindMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("project no longer exists")]
    ProjectGone,
    #[error(transparent)]
    Transact(#[from] TransactError),
}
