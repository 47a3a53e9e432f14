//! Shared reference to the live engine and its load signal.
//!
//! The lifecycle manager is the only writer: it creates the engine, hands out
//! [`MapHandle`] clones for read access, and on teardown marks the handle dead.
//! Every engine access goes through [`MapHandle::with`], which refuses to run
//! once the handle is dead, so late callbacks degrade to no-ops.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use tracing::warn;

/// Handle to a live engine instance.
pub struct MapHandle<E> {
    engine: Rc<RefCell<E>>,
    alive: Rc<Cell<bool>>,
}

impl<E> Clone for MapHandle<E> {
    fn clone(&self) -> Self {
        Self {
            engine: Rc::clone(&self.engine),
            alive: Rc::clone(&self.alive),
        }
    }
}

impl<E> MapHandle<E> {
    pub(crate) fn new(engine: E) -> Self {
        Self {
            engine: Rc::new(RefCell::new(engine)),
            alive: Rc::new(Cell::new(true)),
        }
    }

    /// Whether the engine has not been torn down yet.
    pub fn is_live(&self) -> bool {
        self.alive.get()
    }

    /// Run `f` against the engine if it is still live.
    ///
    /// Returns `None` when the handle is dead or the engine is already
    /// borrowed further up the stack.
    pub fn with<R>(&self, f: impl FnOnce(&mut E) -> R) -> Option<R> {
        if !self.alive.get() {
            return None;
        }
        match self.engine.try_borrow_mut() {
            Ok(mut engine) => Some(f(&mut engine)),
            Err(_) => {
                warn!("Map engine re-entered while borrowed; skipping operation");
                None
            }
        }
    }

    /// The shared engine cell. Event drivers dispatch through it.
    pub fn engine(&self) -> &Rc<RefCell<E>> {
        &self.engine
    }

    /// Weak reference for event handlers.
    pub fn downgrade(&self) -> WeakMapHandle<E> {
        WeakMapHandle {
            engine: Rc::downgrade(&self.engine),
            alive: Rc::clone(&self.alive),
        }
    }

    /// Whether two handles refer to the same engine instance.
    pub fn same_instance(&self, other: &MapHandle<E>) -> bool {
        Rc::ptr_eq(&self.engine, &other.engine)
    }

    pub(crate) fn kill(&self) {
        self.alive.set(false);
    }
}

/// Non-owning handle captured by event handlers.
pub struct WeakMapHandle<E> {
    engine: Weak<RefCell<E>>,
    alive: Rc<Cell<bool>>,
}

impl<E> Clone for WeakMapHandle<E> {
    fn clone(&self) -> Self {
        Self {
            engine: Weak::clone(&self.engine),
            alive: Rc::clone(&self.alive),
        }
    }
}

impl<E> WeakMapHandle<E> {
    /// Upgrade if the engine is still the live one.
    pub fn upgrade(&self) -> Option<MapHandle<E>> {
        if !self.alive.get() {
            return None;
        }
        self.engine.upgrade().map(|engine| MapHandle {
            engine,
            alive: Rc::clone(&self.alive),
        })
    }
}

struct SignalInner {
    loaded: Cell<bool>,
    subscribers: RefCell<Vec<Box<dyn FnOnce()>>>,
}

/// Load-completion flag of one engine instance.
///
/// Flips false to true at most once; subscribers run on that transition.
#[derive(Clone)]
pub struct LoadedSignal {
    inner: Rc<SignalInner>,
}

impl LoadedSignal {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(SignalInner {
                loaded: Cell::new(false),
                subscribers: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.inner.loaded.get()
    }

    /// Run `f` when the signal becomes loaded. Runs immediately if it already is.
    pub fn subscribe(&self, f: impl FnOnce() + 'static) {
        if self.is_loaded() {
            f();
        } else {
            self.inner.subscribers.borrow_mut().push(Box::new(f));
        }
    }

    /// Transition to loaded. Returns false if already loaded.
    pub(crate) fn mark_loaded(&self) -> bool {
        if self.inner.loaded.replace(true) {
            return false;
        }
        let subscribers = std::mem::take(&mut *self.inner.subscribers.borrow_mut());
        for subscriber in subscribers {
            subscriber();
        }
        true
    }

    pub(crate) fn reset(&self) {
        self.inner.loaded.set(false);
        self.inner.subscribers.borrow_mut().clear();
    }
}

impl Default for LoadedSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LoadedSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedSignal")
            .field("loaded", &self.is_loaded())
            .finish()
    }
}
