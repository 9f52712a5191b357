//! Single-threaded event with RAII subscriptions.
//!
//! # Failure Modes
//!
//! - A handler may subscribe to or drop subscriptions of the event that is
//!   currently emitting. Handlers are collected before the first call, so
//!   such changes take effect from the next emission.
//! - Dropping a [`Subscription`] while its event is mid-emission does not
//!   cancel the call already scheduled for that emission.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

type Handler<A> = Rc<dyn Fn(&A)>;
type WeakHandler<A> = Weak<dyn Fn(&A)>;

/// A list of handlers called in registration order on [`Event::emit`].
///
/// The event holds its handlers weakly. A handler stays registered for as
/// long as the [`Subscription`] returned by [`Event::subscribe`] is alive,
/// so a source never keeps its observers alive.
pub struct Event<A> {
    handlers: RefCell<Vec<WeakHandler<A>>>,
}

impl<A> Default for Event<A> {
    fn default() -> Self {
        Self {
            handlers: RefCell::new(Vec::new()),
        }
    }
}

impl<A> fmt::Debug for Event<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("handlers", &self.handlers.borrow().len())
            .finish()
    }
}

impl<A: 'static> Event<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler`. It is called on every emission until the
    /// returned [`Subscription`] is dropped.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe(&self, handler: impl Fn(&A) + 'static) -> Subscription {
        let strong: Handler<A> = Rc::new(handler);
        let mut handlers = self.handlers.borrow_mut();
        handlers.retain(|h| h.strong_count() > 0);
        handlers.push(Rc::downgrade(&strong));
        drop(handlers);
        Subscription {
            _guard: Box::new(strong),
        }
    }

    /// Call every live handler with `arg`, pruning dropped ones.
    pub fn emit(&self, arg: &A) {
        let live: Vec<Handler<A>> = {
            let mut handlers = self.handlers.borrow_mut();
            handlers.retain(|h| h.strong_count() > 0);
            handlers.iter().filter_map(Weak::upgrade).collect()
        };
        for handler in &live {
            handler(arg);
        }
    }

    /// Number of handlers whose subscription is still alive.
    pub fn subscriber_count(&self) -> usize {
        self.handlers
            .borrow()
            .iter()
            .filter(|h| h.strong_count() > 0)
            .count()
    }
}

/// Keeps a handler registered. Dropping it unsubscribes.
pub struct Subscription {
    _guard: Box<dyn std::any::Any>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Subscription")
    }
}
