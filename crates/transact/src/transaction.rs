use crate::op::Operation;
use std::collections::VecDeque;
use std::fmt;

/// A committed, immutable list of operations with its description.
///
/// Transactions form the nexus's undo and redo chains through their owning
/// `next` link. A transaction sits in exactly one chain at a time.
pub struct Transaction {
    ops: VecDeque<Operation>,
    desc: String,
    pub(crate) next: Option<Box<Transaction>>,
}

impl Transaction {
    pub(crate) fn new(ops: VecDeque<Operation>, desc: String) -> Self {
        Self {
            ops,
            desc,
            next: None,
        }
    }

    pub fn describe(&self) -> &str {
        &self.desc
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Execute every operation front to back, then reverse the list so the
    /// next replay walks it in the opposite order.
    pub(crate) fn replay(&mut self) {
        for op in self.ops.iter_mut() {
            op.execute();
        }
        self.ops.make_contiguous().reverse();
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("desc", &self.desc)
            .field("ops", &self.ops.len())
            .finish()
    }
}

// Unlink the chain iteratively; the default recursive drop would use one
// stack frame per transaction in the history.
impl Drop for Transaction {
    fn drop(&mut self) {
        let mut next = self.next.take();
        while let Some(mut t) = next {
            next = t.next.take();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::Property;

    #[test]
    fn replay_alternates_direction() {
        let p = Property::new(vec![0]);
        let mut ops = VecDeque::new();
        let mut first = Operation::insert(&p, 1, 1);
        first.execute();
        ops.push_front(first);
        let mut second = Operation::insert(&p, 2, 2);
        second.execute();
        ops.push_front(second);
        let mut t = Transaction::new(ops, String::from("grow"));
        assert_eq!(p.get(), vec![0, 1, 2]);

        t.replay();
        assert_eq!(p.get(), vec![0]);
        t.replay();
        assert_eq!(p.get(), vec![0, 1, 2]);
    }

    #[test]
    fn long_chain_drops_without_recursion() {
        let mut head: Option<Box<Transaction>> = None;
        for i in 0..100_000 {
            let mut t = Box::new(Transaction::new(VecDeque::new(), i.to_string()));
            t.next = head.take();
            head = Some(t);
        }
        drop(head);
    }
}
