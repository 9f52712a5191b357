//! Self-inverse primitive mutations.
//!
//! Every [`Operation`] toggles between "applied" and "unapplied" each time it
//! executes. There is no separate undo path: rolling back, undoing and
//! redoing all just execute the same operations again, in the right order.

use crate::property::{PropCell, Property};
use std::fmt;
use std::rc::Rc;

/// Storage that swaps a staged value in and out on every call.
///
/// `exchange` only touches storage. Observers are told in `notify`, which
/// runs after the operation has been recorded.
pub trait Exchange {
    fn exchange(&mut self);

    fn notify(&self) {}
}

/// A single list element that can be moved into its list and back out.
pub trait Splice {
    fn attach(&mut self);
    fn detach(&mut self);

    fn notify(&self) {}
}

/// A reversible primitive mutation.
///
/// `Insert` and `Erase` turn into each other when executed: running an
/// insert produces the erase that removes the element again.
pub enum Operation {
    Assign(Box<dyn Exchange>),
    Insert(Box<dyn Splice>),
    Erase(Box<dyn Splice>),
    Signal(Signal),
}

impl Operation {
    /// Swap `value` into `prop`.
    pub fn assign<T: 'static>(prop: &Property<T>, value: T) -> Self {
        Self::Assign(Box::new(AssignOp {
            cell: prop.cell(),
            staged: value,
        }))
    }

    /// Insert `value` at `index` of a list property. The caller checks that
    /// `index <= len`.
    pub fn insert<T: 'static>(prop: &Property<Vec<T>>, index: usize, value: T) -> Self {
        Self::Insert(Box::new(ListOp {
            cell: prop.cell(),
            index,
            held: Some(value),
        }))
    }

    /// Remove the element at `index` of a list property. The caller checks
    /// that `index < len`.
    pub fn erase<T: 'static>(prop: &Property<Vec<T>>, index: usize) -> Self {
        Self::Erase(Box::new(ListOp {
            cell: prop.cell(),
            index,
            held: None,
        }))
    }

    /// A notification with no storage of its own. See [`Signal`].
    pub fn signal(raised: bool, fire: impl FnMut(bool) + 'static) -> Self {
        Self::Signal(Signal::new(raised, fire))
    }

    /// Apply the operation if it is unapplied, revert it otherwise, then
    /// notify observers.
    pub fn execute(&mut self) {
        self.apply();
        self.notify();
    }

    /// The storage half of [`Operation::execute`]. Nothing is notified.
    pub(crate) fn apply(&mut self) {
        match self {
            Self::Assign(slot) => slot.exchange(),
            Self::Signal(signal) => signal.flip(),
            Self::Insert(splice) => {
                splice.attach();
                let vacant: Box<dyn Splice> = Box::new(Vacant);
                let splice = std::mem::replace(splice, vacant);
                *self = Self::Erase(splice);
            }
            Self::Erase(splice) => {
                splice.detach();
                let vacant: Box<dyn Splice> = Box::new(Vacant);
                let splice = std::mem::replace(splice, vacant);
                *self = Self::Insert(splice);
            }
        }
    }

    /// The notification half of [`Operation::execute`].
    pub(crate) fn notify(&mut self) {
        match self {
            Self::Assign(slot) => slot.notify(),
            Self::Signal(signal) => signal.fire(),
            Self::Insert(splice) | Self::Erase(splice) => splice.notify(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Assign(_) => "assign",
            Self::Insert(_) => "insert",
            Self::Erase(_) => "erase",
            Self::Signal(_) => "signal",
        }
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Operation::{}", self.kind())
    }
}

/// A two-state notification, e.g. "asset appeared" / "asset disappeared".
///
/// The first execution calls `fire(raised)`; each later one announces the
/// opposite transition of the one before.
pub struct Signal {
    raised: bool,
    fire: Box<dyn FnMut(bool)>,
}

impl Signal {
    pub fn new(raised: bool, fire: impl FnMut(bool) + 'static) -> Self {
        Self {
            raised,
            fire: Box::new(fire),
        }
    }

    fn flip(&mut self) {
        self.raised = !self.raised;
    }

    // `raised` already holds the state for the next execution.
    fn fire(&mut self) {
        (self.fire)(!self.raised);
    }
}

struct AssignOp<T> {
    cell: Rc<PropCell<T>>,
    staged: T,
}

impl<T: 'static> Exchange for AssignOp<T> {
    fn exchange(&mut self) {
        std::mem::swap(&mut *self.cell.value.borrow_mut(), &mut self.staged);
    }

    fn notify(&self) {
        self.cell.on_change.emit(&());
    }
}

struct ListOp<T> {
    cell: Rc<PropCell<Vec<T>>>,
    index: usize,
    held: Option<T>,
}

impl<T: 'static> Splice for ListOp<T> {
    fn attach(&mut self) {
        let mut list = self.cell.value.borrow_mut();
        if let Some(item) = self.held.take() {
            list.insert(self.index, item);
        }
    }

    fn detach(&mut self) {
        let mut list = self.cell.value.borrow_mut();
        if self.index < list.len() {
            self.held = Some(list.remove(self.index));
        }
    }

    fn notify(&self) {
        self.cell.on_change.emit(&());
    }
}

// Placeholder left behind while an insert/erase flips. Zero-sized, so
// boxing it does not allocate.
struct Vacant;

impl Splice for Vacant {
    fn attach(&mut self) {}
    fn detach(&mut self) {}
}
