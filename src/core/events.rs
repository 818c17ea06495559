use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Rc<RefCell<dyn FnMut()>>;

struct Registry<E> {
    next_id: u64,
    listeners: Vec<(ListenerId, E, Listener)>,
}

/// Clones share one registry. Listeners may add or remove listeners while
/// being invoked.
pub struct EventEmitter<E> {
    inner: Rc<RefCell<Registry<E>>>,
}

impl<E> Clone for EventEmitter<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<E> Default for EventEmitter<E> {
    fn default() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Registry {
                next_id: 0,
                listeners: Vec::new(),
            })),
        }
    }
}

impl<E> fmt::Debug for EventEmitter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("listeners", &self.inner.borrow().listeners.len())
            .finish()
    }
}

impl<E: PartialEq + fmt::Debug> EventEmitter<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&self, event: E, callback: impl FnMut() + 'static) -> ListenerId {
        let mut inner = self.inner.borrow_mut();
        let id = ListenerId(inner.next_id);
        inner.next_id += 1;
        let listener: Listener = Rc::new(RefCell::new(callback));
        inner.listeners.push((id, event, listener));
        id
    }

    /// Returns `false` when the listener was not registered.
    pub fn off(&self, id: ListenerId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.listeners.len();
        inner.listeners.retain(|(listener_id, _, _)| *listener_id != id);
        inner.listeners.len() != before
    }

    pub fn listener_count(&self, event: E) -> usize {
        self.inner
            .borrow()
            .listeners
            .iter()
            .filter(|(_, e, _)| e == &event)
            .count()
    }

    pub fn emit(&self, event: E) -> usize {
        let snapshot: Vec<(ListenerId, Listener)> = self
            .inner
            .borrow()
            .listeners
            .iter()
            .filter(|(_, e, _)| e == &event)
            .map(|(id, _, listener)| (*id, Rc::clone(listener)))
            .collect();

        let mut invoked = 0;
        for (id, listener) in snapshot {
            if !self.is_registered(id) {
                continue;
            }
            match listener.try_borrow_mut() {
                Ok(mut callback) => {
                    (&mut *callback)();
                    invoked += 1;
                }
                Err(_) => {
                    tracing::warn!(?event, ?id, "Skipping listener re-entered during emit");
                }
            }
        }
        invoked
    }

    fn is_registered(&self, id: ListenerId) -> bool {
        self.inner
            .borrow()
            .listeners
            .iter()
            .any(|(listener_id, _, _)| *listener_id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Signal {
        Refresh,
        Quit,
    }

    #[test]
    fn test_emit_in_registration_order() {
        let emitter = EventEmitter::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        for n in 0..3 {
            let order = Rc::clone(&order);
            emitter.on(Signal::Refresh, move || order.borrow_mut().push(n));
        }

        assert_eq!(emitter.emit(Signal::Refresh), 3);
        assert_eq!(*order.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn test_off_removes_listener() {
        let emitter = EventEmitter::new();
        let calls = Rc::new(Cell::new(0));

        let counter = Rc::clone(&calls);
        let id = emitter.on(Signal::Refresh, move || counter.set(counter.get() + 1));
        assert_eq!(emitter.listener_count(Signal::Refresh), 1);

        assert!(emitter.off(id));
        assert!(!emitter.off(id));
        assert_eq!(emitter.emit(Signal::Refresh), 0);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_emit_filters_by_event() {
        let emitter = EventEmitter::new();
        let calls = Rc::new(Cell::new(0));

        let counter = Rc::clone(&calls);
        emitter.on(Signal::Quit, move || counter.set(counter.get() + 1));
        emitter.on(Signal::Refresh, || {});

        assert_eq!(emitter.emit(Signal::Refresh), 1);
        assert_eq!(calls.get(), 0);
        assert_eq!(emitter.emit(Signal::Quit), 1);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_string_tags() {
        let emitter = EventEmitter::new();
        let calls = Rc::new(Cell::new(0));

        let counter = Rc::clone(&calls);
        emitter.on("a.b".to_string(), move || counter.set(counter.get() + 1));

        assert_eq!(emitter.emit("a.c".to_string()), 0);
        assert_eq!(emitter.emit("a.b".to_string()), 1);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_clones_share_registry() {
        let emitter = EventEmitter::new();
        let handle = emitter.clone();
        let calls = Rc::new(Cell::new(0));

        let counter = Rc::clone(&calls);
        emitter.on(Signal::Refresh, move || counter.set(counter.get() + 1));

        handle.emit(Signal::Refresh);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_listener_may_unregister_during_emit() {
        let emitter = EventEmitter::new();
        let second_calls = Rc::new(Cell::new(0));
        let second_id = Rc::new(Cell::new(None));

        let handle = emitter.clone();
        let target = Rc::clone(&second_id);
        emitter.on(Signal::Refresh, move || {
            if let Some(id) = target.get() {
                handle.off(id);
            }
        });

        let counter = Rc::clone(&second_calls);
        let id = emitter.on(Signal::Refresh, move || counter.set(counter.get() + 1));
        second_id.set(Some(id));

        assert_eq!(emitter.emit(Signal::Refresh), 1);
        assert_eq!(second_calls.get(), 0);
        assert_eq!(emitter.listener_count(Signal::Refresh), 1);
    }

    #[test]
    fn test_listener_may_register_during_emit() {
        let emitter = EventEmitter::new();
        let handle = emitter.clone();

        emitter.on(Signal::Refresh, move || {
            handle.on(Signal::Refresh, || {});
        });

        assert_eq!(emitter.emit(Signal::Refresh), 1);
        assert_eq!(emitter.listener_count(Signal::Refresh), 2);
    }
}
