use crate::error::TransactError;
use crate::op::Operation;
use crate::property::Property;
use crate::transaction::Transaction;
use std::collections::VecDeque;
use tracing::warn;

/// Description used when a transaction commits without calling
/// [`Teller::describe`].
pub const DEFAULT_DESCRIPTION: &str = "[unlabeled action]";

/// Builder for one in-progress transaction.
///
/// Operations execute as soon as they are pushed. The pending list is kept
/// most-recent-first so that replaying it front to back undoes them in
/// reverse order. A teller that is dropped without committing replays its
/// list, restoring the state it started from.
///
/// Tellers are only created by [`crate::Nexus::run`].
pub struct Teller {
    done: bool,
    ops: VecDeque<Operation>,
    desc: String,
}

impl Teller {
    pub(crate) fn new() -> Self {
        Self {
            done: false,
            ops: VecDeque::new(),
            desc: DEFAULT_DESCRIPTION.to_owned(),
        }
    }

    /// Set the human-readable summary shown in undo/redo labels.
    pub fn describe(&mut self, desc: impl Into<String>) {
        self.desc = desc.into();
    }

    pub fn description(&self) -> &str {
        &self.desc
    }

    /// Number of operations executed so far.
    pub fn op_count(&self) -> usize {
        self.ops.len()
    }

    /// Execute `op` and record it.
    ///
    /// The op is recorded once its storage change has happened and before
    /// observers hear about it, so a panic in either place rolls back
    /// exactly what was applied.
    pub fn push_op(&mut self, mut op: Operation) {
        debug_assert!(!self.done, "push_op on a committed teller");
        op.apply();
        self.ops.push_front(op);
        if let Some(op) = self.ops.front_mut() {
            op.notify();
        }
    }

    /// Assign `value` to `prop`.
    pub fn set<T: 'static>(&mut self, prop: &Property<T>, value: T) {
        self.push_op(Operation::assign(prop, value));
    }

    /// Insert `value` at `index` of a list property and return the
    /// position it now occupies.
    pub fn insert<T: 'static>(
        &mut self,
        prop: &Property<Vec<T>>,
        index: usize,
        value: T,
    ) -> Result<usize, TransactError> {
        let len = prop.len();
        if index > len {
            return Err(TransactError::IndexOutOfRange { index, len });
        }
        self.push_op(Operation::insert(prop, index, value));
        Ok(index)
    }

    /// Append `value` to a list property and return its position.
    pub fn push<T: 'static>(&mut self, prop: &Property<Vec<T>>, value: T) -> usize {
        let index = prop.len();
        self.push_op(Operation::insert(prop, index, value));
        index
    }

    /// Remove the element at `index` of a list property.
    pub fn erase<T: 'static>(
        &mut self,
        prop: &Property<Vec<T>>,
        index: usize,
    ) -> Result<(), TransactError> {
        let len = prop.len();
        if index >= len {
            return Err(TransactError::IndexOutOfRange { index, len });
        }
        self.push_op(Operation::erase(prop, index));
        Ok(())
    }

    pub(crate) fn commit(&mut self) -> Result<Transaction, TransactError> {
        if self.done {
            return Err(TransactError::AlreadyCommitted);
        }
        self.done = true;
        Ok(Transaction::new(
            std::mem::take(&mut self.ops),
            std::mem::take(&mut self.desc),
        ))
    }
}

impl Drop for Teller {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        if !self.ops.is_empty() {
            warn!(
                description = %self.desc,
                operations = self.ops.len(),
                "rolling back uncommitted transaction"
            );
        }
        for op in self.ops.iter_mut() {
            op.execute();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drop_without_commit_rolls_back() {
        let a = Property::new(1);
        let b = Property::new(String::from("old"));
        {
            let mut ts = Teller::new();
            ts.set(&a, 2);
            ts.set(&a, 3);
            ts.set(&b, String::from("new"));
            assert_eq!(a.get(), 3);
            assert_eq!(b.get(), "new");
        }
        assert_eq!(a.get(), 1);
        assert_eq!(b.get(), "old");
    }

    #[test]
    fn commit_keeps_changes() {
        let a = Property::new(1);
        let mut ts = Teller::new();
        ts.describe("Set a");
        ts.set(&a, 9);
        let t = ts.commit().unwrap();
        drop(ts);
        assert_eq!(a.get(), 9);
        assert_eq!(t.describe(), "Set a");
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn double_commit_is_an_error() {
        let mut ts = Teller::new();
        ts.commit().unwrap();
        assert_eq!(ts.commit().unwrap_err(), TransactError::AlreadyCommitted);
    }

    #[test]
    fn default_description() {
        let mut ts = Teller::new();
        let t = ts.commit().unwrap();
        assert_eq!(t.describe(), DEFAULT_DESCRIPTION);
    }

    #[test]
    fn list_edits_validate_position() {
        let list = Property::new(vec![1, 2, 3]);
        let mut ts = Teller::new();
        assert_eq!(
            ts.insert(&list, 4, 0).unwrap_err(),
            TransactError::IndexOutOfRange { index: 4, len: 3 }
        );
        assert_eq!(
            ts.erase(&list, 3).unwrap_err(),
            TransactError::IndexOutOfRange { index: 3, len: 3 }
        );
        assert_eq!(ts.op_count(), 0);
    }

    #[test]
    fn mixed_list_edits_roll_back() {
        let list = Property::new(vec![1, 2, 3]);
        {
            let mut ts = Teller::new();
            assert_eq!(ts.insert(&list, 0, 0).unwrap(), 0);
            ts.erase(&list, 2).unwrap();
            assert_eq!(ts.push(&list, 4), 3);
            assert_eq!(list.get(), vec![0, 1, 3, 4]);
        }
        assert_eq!(list.get(), vec![1, 2, 3]);
    }

    #[test]
    fn conflicting_write_is_not_recorded() {
        let p = Property::new(1);
        let q = Property::new(0);
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let mut ts = Teller::new();
            ts.set(&q, 5);
            p.with(|_| ts.set(&p, 99));
        }));
        assert!(outcome.is_err());
        assert_eq!(p.get(), 1);
        assert_eq!(q.get(), 0);
    }

    #[test]
    fn panicking_observer_change_is_rolled_back() {
        let p = Property::new(1);
        let armed = std::rc::Rc::new(std::cell::Cell::new(true));
        let _sub = {
            let armed = std::rc::Rc::clone(&armed);
            p.on_change().subscribe(move |_| {
                if armed.replace(false) {
                    panic!("observer failed");
                }
            })
        };
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let mut ts = Teller::new();
            ts.set(&p, 2);
        }));
        assert!(outcome.is_err());
        assert_eq!(p.get(), 1);
    }
}
