use crate::teller::Teller;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use tessera_common::Event;

pub(crate) struct PropCell<T> {
    pub(crate) value: RefCell<T>,
    pub(crate) on_change: Event<()>,
}

/// A value cell that only changes through a [`Teller`].
///
/// `on_change` fires whenever an operation swaps the stored value, whether
/// that happens while the transaction runs, during rollback, or on
/// undo/redo.
///
/// Reading a property from inside [`Property::with`] and writing it in the
/// same closure panics: the value is borrowed for the whole closure.
pub struct Property<T> {
    cell: Rc<PropCell<T>>,
}

impl<T: 'static> Property<T> {
    pub fn new(value: T) -> Self {
        Self {
            cell: Rc::new(PropCell {
                value: RefCell::new(value),
                on_change: Event::new(),
            }),
        }
    }

    /// Clone of the current value.
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.cell.value.borrow().clone()
    }

    /// Borrow the current value for the duration of `f`.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.cell.value.borrow())
    }

    /// Record an assignment in `ts`. Same as `ts.set(self, value)`.
    pub fn set(&self, ts: &mut Teller, value: T) {
        ts.set(self, value);
    }

    pub fn on_change(&self) -> &Event<()> {
        &self.cell.on_change
    }

    /// A non-owning read handle, for observers that must read the value
    /// from inside an `on_change` handler.
    pub fn view(&self) -> PropertyView<T> {
        PropertyView {
            cell: Rc::downgrade(&self.cell),
        }
    }

    pub(crate) fn cell(&self) -> Rc<PropCell<T>> {
        Rc::clone(&self.cell)
    }
}

impl<T: 'static> Property<Vec<T>> {
    pub fn len(&self) -> usize {
        self.cell.value.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cell.value.borrow().is_empty()
    }
}

impl<T: Default + 'static> Default for Property<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Property")
            .field(&*self.cell.value.borrow())
            .finish()
    }
}

/// Weak read handle returned by [`Property::view`].
pub struct PropertyView<T> {
    cell: Weak<PropCell<T>>,
}

impl<T> PropertyView<T> {
    /// Current value, or `None` once the property has been dropped.
    pub fn get(&self) -> Option<T>
    where
        T: Clone,
    {
        self.cell.upgrade().map(|cell| cell.value.borrow().clone())
    }
}

impl<T> Clone for PropertyView<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Weak::clone(&self.cell),
        }
    }
}
