//! One-shot readiness signal with a FIFO callback queue.

use futures::channel::oneshot;
use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::rc::Rc;

type Callback = Box<dyn FnOnce()>;

/// `ready` flips to true once and stays true; queued callbacks run once, in
/// registration order.
#[derive(Default)]
pub struct ReadinessState {
    ready: bool,
    pending_callbacks: Vec<Callback>,
}

/// Shared handle to a [`ReadinessState`]. Clones observe the same gate.
#[derive(Clone, Default)]
pub struct ReadinessGate {
    state: Rc<RefCell<ReadinessState>>,
}

impl ReadinessGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_ready(&self) -> bool {
        self.state.borrow().ready
    }

    /// Runs `callback` now if the gate is open, otherwise once it opens.
    pub fn ready(&self, callback: impl FnOnce() + 'static) {
        {
            let mut state = self.state.borrow_mut();
            if !state.ready {
                state.pending_callbacks.push(Box::new(callback));
                return;
            }
        }
        callback();
    }

    /// Opens the gate and flushes the queue. Later calls do nothing.
    pub fn open(&self) {
        let pending = {
            let mut state = self.state.borrow_mut();
            if state.ready {
                return;
            }
            state.ready = true;
            std::mem::take(&mut state.pending_callbacks)
        };
        for callback in pending {
            callback();
        }
    }

    /// Resolves once the gate is open.
    pub fn wait(&self) -> impl Future<Output = ()> {
        let (tx, rx) = oneshot::channel();
        self.ready(move || {
            let _ = tx.send(());
        });
        async move {
            let _ = rx.await;
        }
    }
}

impl fmt::Debug for ReadinessGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("ReadinessGate")
            .field("ready", &state.ready)
            .field("pending_callbacks", &state.pending_callbacks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;

    #[test]
    fn callbacks_fire_in_order_exactly_once() {
        let gate = ReadinessGate::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for i in 0..3 {
            let log = Rc::clone(&log);
            gate.ready(move || log.borrow_mut().push(i));
        }
        assert!(log.borrow().is_empty());

        gate.open();
        gate.open();
        assert_eq!(*log.borrow(), vec![0, 1, 2]);
        assert!(gate.is_ready());
    }

    #[test]
    fn late_callbacks_fire_immediately() {
        let gate = ReadinessGate::new();
        gate.open();
        let fired = Rc::new(RefCell::new(false));
        let flag = Rc::clone(&fired);
        gate.ready(move || *flag.borrow_mut() = true);
        assert!(*fired.borrow());
    }

    #[test]
    fn callbacks_may_register_more_callbacks() {
        let gate = ReadinessGate::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let inner_gate = gate.clone();
        let inner_log = Rc::clone(&log);
        gate.ready(move || {
            inner_log.borrow_mut().push("outer");
            let nested = Rc::clone(&inner_log);
            inner_gate.ready(move || nested.borrow_mut().push("nested"));
        });
        gate.open();
        assert_eq!(*log.borrow(), vec!["outer", "nested"]);
    }

    #[test]
    fn wait_resolves_after_open() {
        let gate = ReadinessGate::new();
        let mut waiting = gate.wait().boxed_local();
        assert!((&mut waiting).now_or_never().is_none());
        gate.open();
        assert!(waiting.now_or_never().is_some());
    }
}
