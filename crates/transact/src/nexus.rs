use crate::error::TransactError;
use crate::teller::Teller;
use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::fmt;
use tessera_common::Event;
use tracing::{debug, trace};

/// Whether a nexus can start a transaction, undo or redo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Ready,
    Busy,
    /// Reserved; never entered on the success path.
    Failed,
}

/// Descriptions of the undo and redo chains, nearest entry first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct History {
    pub undo: Vec<String>,
    pub redo: Vec<String>,
}

type Chain = Option<Box<Transaction>>;

/// Owner of the undo/redo history and the ready/busy state machine.
///
/// All methods take `&self`, so a nexus can be shared with the observers it
/// ends up notifying. The busy flag is the reentrancy guard: `run`, `undo`
/// and `redo` called while another one is in progress fail with
/// [`TransactError::Busy`] and change nothing.
pub struct Nexus {
    status: Cell<Status>,
    undo: RefCell<Chain>,
    redo: RefCell<Chain>,
    on_status_change: Event<Status>,
}

impl Nexus {
    pub fn new() -> Self {
        Self {
            status: Cell::new(Status::Ready),
            undo: RefCell::new(None),
            redo: RefCell::new(None),
            on_status_change: Event::new(),
        }
    }

    pub fn get_status(&self) -> Status {
        self.status.get()
    }

    /// Fires on every ready/busy transition with the new status.
    pub fn on_status_change(&self) -> &Event<Status> {
        &self.on_status_change
    }

    pub fn has_undo(&self) -> bool {
        self.undo.borrow().is_some()
    }

    pub fn has_redo(&self) -> bool {
        self.redo.borrow().is_some()
    }

    /// Description of the transaction `undo` would revert.
    pub fn get_undo(&self) -> Option<String> {
        self.undo.borrow().as_ref().map(|t| t.describe().to_owned())
    }

    /// Description of the transaction `redo` would reapply.
    pub fn get_redo(&self) -> Option<String> {
        self.redo.borrow().as_ref().map(|t| t.describe().to_owned())
    }

    /// Edit-menu label, e.g. `Undo: Move vertex`, or `Undo` when empty.
    pub fn undo_label(&self) -> String {
        match self.get_undo() {
            Some(desc) => format!("Undo: {desc}"),
            None => "Undo".to_owned(),
        }
    }

    pub fn redo_label(&self) -> String {
        match self.get_redo() {
            Some(desc) => format!("Redo: {desc}"),
            None => "Redo".to_owned(),
        }
    }

    pub fn undo_depth(&self) -> usize {
        chain_descriptions(&self.undo.borrow()).len()
    }

    pub fn redo_depth(&self) -> usize {
        chain_descriptions(&self.redo.borrow()).len()
    }

    pub fn history(&self) -> History {
        History {
            undo: chain_descriptions(&self.undo.borrow()),
            redo: chain_descriptions(&self.redo.borrow()),
        }
    }

    /// Run `job` as one transaction.
    ///
    /// On `Ok` the teller's operations are committed onto the undo chain and
    /// the redo chain is discarded. If `job` returns `Err` or panics, every
    /// operation it performed is rolled back before the error or panic
    /// reaches the caller, and the history is left untouched.
    pub fn run<R, E>(&self, job: impl FnOnce(&mut Teller) -> Result<R, E>) -> Result<R, E>
    where
        E: From<TransactError>,
    {
        let _busy = self.begin()?;
        // Declared after the guard so it drops (and rolls back) first, while
        // the nexus still reports busy.
        let mut teller = Teller::new();
        let value = job(&mut teller)?;
        let mut transaction = Box::new(teller.commit()?);
        debug!(
            description = transaction.describe(),
            operations = transaction.len(),
            "committed transaction"
        );

        {
            let mut undo = self.undo.borrow_mut();
            transaction.next = undo.take();
            *undo = Some(transaction);
        }
        let discarded = self.redo.borrow_mut().take();
        drop(discarded);
        Ok(value)
    }

    /// Revert the most recent transaction and move it onto the redo chain.
    pub fn undo(&self) -> Result<(), TransactError> {
        self.ensure_ready()?;
        if !self.has_undo() {
            return Err(TransactError::NothingToUndo);
        }
        let _busy = self.begin()?;
        let mut transaction = pop(&self.undo).ok_or(TransactError::NothingToUndo)?;
        transaction.replay();
        debug!(description = transaction.describe(), "undo");
        push(&self.redo, transaction);
        Ok(())
    }

    /// Reapply the most recently undone transaction and move it back onto
    /// the undo chain.
    pub fn redo(&self) -> Result<(), TransactError> {
        self.ensure_ready()?;
        if !self.has_redo() {
            return Err(TransactError::NothingToRedo);
        }
        let _busy = self.begin()?;
        let mut transaction = pop(&self.redo).ok_or(TransactError::NothingToRedo)?;
        transaction.replay();
        debug!(description = transaction.describe(), "redo");
        push(&self.undo, transaction);
        Ok(())
    }

    fn ensure_ready(&self) -> Result<(), TransactError> {
        if self.status.get() != Status::Ready {
            return Err(TransactError::Busy);
        }
        Ok(())
    }

    fn begin(&self) -> Result<BusyGuard<'_>, TransactError> {
        self.ensure_ready()?;
        self.set_status(Status::Busy);
        Ok(BusyGuard { nexus: self })
    }

    fn set_status(&self, status: Status) {
        self.status.set(status);
        trace!(?status, "nexus status changed");
        self.on_status_change.emit(&status);
    }
}

impl Default for Nexus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Nexus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Nexus")
            .field("status", &self.status.get())
            .field("history", &self.history())
            .finish()
    }
}

/// Returns the nexus to ready when dropped, including during unwinding.
struct BusyGuard<'a> {
    nexus: &'a Nexus,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.nexus.set_status(Status::Ready);
    }
}

fn pop(chain: &RefCell<Chain>) -> Option<Box<Transaction>> {
    let mut chain = chain.borrow_mut();
    let mut head = chain.take()?;
    *chain = head.next.take();
    Some(head)
}

fn push(chain: &RefCell<Chain>, mut transaction: Box<Transaction>) {
    let mut chain = chain.borrow_mut();
    transaction.next = chain.take();
    *chain = Some(transaction);
}

fn chain_descriptions(chain: &Chain) -> Vec<String> {
    let mut out = Vec::new();
    let mut cursor = chain.as_deref();
    while let Some(t) = cursor {
        out.push(t.describe().to_owned());
        cursor = t.next.as_deref();
    }
    out
}
