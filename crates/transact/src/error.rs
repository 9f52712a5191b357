/// Errors from the transaction engine.
///
/// All of these report a caller defect; none of them leaves state partially
/// changed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransactError {
    #[error("nexus is busy with another transaction")]
    Busy,
    #[error("nothing to undo")]
    NothingToUndo,
    #[error("nothing to redo")]
    NothingToRedo,
    #[error("teller has already committed")]
    AlreadyCommitted,
    #[error("list position {index} out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },
}
