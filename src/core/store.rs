//! Explicit state container with subscriptions.
//!
//! Views never observe fields implicitly: they read through
//! [`Store::with`] (a selector) and get told about changes through
//! [`Store::subscribe`]. Every mutation goes through [`Store::update`],
//! which notifies subscribers once the mutation is complete.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber<S> = Rc<dyn Fn(&S)>;

pub struct Store<S> {
    state: RefCell<S>,
    subscribers: RefCell<Vec<(SubscriptionId, Subscriber<S>)>>,
    next_id: Cell<u64>,
}

impl<S: Default> Default for Store<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

impl<S> Store<S> {
    pub fn new(state: S) -> Self {
        Self {
            state: RefCell::new(state),
            subscribers: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        }
    }

    /// Read a value derived from the current state.
    pub fn with<R>(&self, select: impl FnOnce(&S) -> R) -> R {
        select(&self.state.borrow())
    }

    /// Mutate the state, then notify every subscriber.
    ///
    /// Subscribers receive a shared borrow of the new state and must not call
    /// `update` re-entrantly.
    pub fn update<R>(&self, mutate: impl FnOnce(&mut S) -> R) -> R {
        let result = mutate(&mut self.state.borrow_mut());
        self.notify();
        result
    }

    /// Register `callback`, called after every [`update`](Self::update).
    pub fn subscribe(&self, callback: impl Fn(&S) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.subscribers.borrow_mut().push((id, Rc::new(callback)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.subscribers.borrow_mut().retain(|(sid, _)| *sid != id);
    }

    fn notify(&self) {
        // Snapshot so a callback may subscribe/unsubscribe safely.
        let subscribers: Vec<Subscriber<S>> = self
            .subscribers
            .borrow()
            .iter()
            .map(|(_, callback)| callback.clone())
            .collect();
        let state = self.state.borrow();
        for callback in subscribers {
            callback(&state);
        }
    }
}

impl<S: Clone> Store<S> {
    pub fn snapshot(&self) -> S {
        self.state.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_notifies_subscribers() {
        let store = Store::new(0u32);
        let seen = Rc::new(RefCell::new(Vec::new()));

        let sink = seen.clone();
        let id = store.subscribe(move |value| sink.borrow_mut().push(*value));

        store.update(|v| *v += 1);
        store.update(|v| *v += 2);
        assert_eq!(seen.borrow().as_slice(), [1, 3]);

        store.unsubscribe(id);
        store.update(|v| *v += 1);
        assert_eq!(seen.borrow().len(), 2);
        assert_eq!(store.with(|v| *v), 4);
    }

    #[test]
    fn test_selector_reads_do_not_notify() {
        let store = Store::new(vec![1, 2, 3]);
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        store.subscribe(move |_| counter.set(counter.get() + 1));

        assert_eq!(store.with(|v| v.len()), 3);
        assert_eq!(calls.get(), 0);
        assert_eq!(store.snapshot(), vec![1, 2, 3]);
    }
}
