//! Creation and teardown of the single engine instance.

use std::rc::Rc;

use tracing::debug;

use crate::engine::{EngineFactory, EventKind, Handler, MapEngine, MapEvent, MapOptions, MountTarget};
use crate::handle::{LoadedSignal, MapHandle};

/// Owns the engine instance bound to a mount target.
///
/// The lifecycle is the only writer of the [`MapHandle`]; everything else
/// receives clones. Teardown runs on drop as well.
pub struct MapLifecycle<F: EngineFactory> {
    factory: F,
    options: MapOptions,
    handle: Option<MapHandle<F::Engine>>,
    loaded: LoadedSignal,
}

impl<F: EngineFactory> MapLifecycle<F> {
    pub fn new(factory: F, options: MapOptions) -> Self {
        Self {
            factory,
            options,
            handle: None,
            loaded: LoadedSignal::new(),
        }
    }

    /// Create the engine if there is a target and no live instance yet.
    ///
    /// Returns the new handle and its load signal, or `None` when nothing was
    /// created.
    pub fn initialize(
        &mut self,
        target: Option<&MountTarget>,
    ) -> Option<(MapHandle<F::Engine>, LoadedSignal)> {
        if self.handle.is_some() {
            return None;
        }
        let target = target?;

        let handle = MapHandle::new(self.factory.create(target, &self.options));
        let loaded = LoadedSignal::new();

        let weak = handle.downgrade();
        let signal = loaded.clone();
        let on_ready: Handler = Rc::new(move |event: &MapEvent| {
            if !matches!(event, MapEvent::Load) || weak.upgrade().is_none() {
                return;
            }
            if signal.mark_loaded() {
                debug!("Map engine loaded");
            }
        });
        handle.with(|engine| engine.once(EventKind::Load, on_ready));

        debug!(target_id = %target.id, zoom = self.options.zoom, "Map engine created");
        self.handle = Some(handle.clone());
        self.loaded = loaded.clone();
        Some((handle, loaded))
    }

    /// Destroy the engine, drop the handle and reset the load signal.
    pub fn teardown(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.with(|engine| engine.remove());
            handle.kill();
            debug!("Map engine torn down");
        }
        self.loaded.reset();
    }

    pub fn handle(&self) -> Option<&MapHandle<F::Engine>> {
        self.handle.as_ref()
    }

    pub fn loaded(&self) -> &LoadedSignal {
        &self.loaded
    }

    pub fn options(&self) -> &MapOptions {
        &self.options
    }
}

impl<F: EngineFactory> Drop for MapLifecycle<F> {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{EngineCall, HeadlessMap};
    use std::cell::Cell;

    fn lifecycle() -> MapLifecycle<fn(&MountTarget, &MapOptions) -> HeadlessMap> {
        MapLifecycle::new(HeadlessMap::factory(), MapOptions::default())
    }

    fn target() -> MountTarget {
        MountTarget::new("map", 800, 600)
    }

    #[test]
    fn test_no_target_is_noop() {
        let mut lifecycle = lifecycle();
        assert!(lifecycle.initialize(None).is_none());
        assert!(lifecycle.handle().is_none());
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let mut lifecycle = lifecycle();
        let (first, _) = lifecycle.initialize(Some(&target())).unwrap();
        assert!(lifecycle.initialize(Some(&target())).is_none());
        assert!(lifecycle.handle().unwrap().same_instance(&first));
    }

    #[test]
    fn test_ready_flips_signal_once() {
        let mut lifecycle = lifecycle();
        let (handle, loaded) = lifecycle.initialize(Some(&target())).unwrap();
        assert!(!loaded.is_loaded());

        HeadlessMap::emit_ready(handle.engine());
        assert!(loaded.is_loaded());
        assert!(lifecycle.loaded().is_loaded());
    }

    #[test]
    fn test_factory_receives_options() {
        let created = std::rc::Rc::new(Cell::new(0));
        let counter = created.clone();
        let factory = move |target: &MountTarget, options: &MapOptions| {
            counter.set(counter.get() + 1);
            HeadlessMap::new(target, options)
        };
        let mut lifecycle = MapLifecycle::new(factory, MapOptions::with_api_key("k"));
        let (handle, _) = lifecycle.initialize(Some(&target())).unwrap();

        assert_eq!(created.get(), 1);
        assert!(handle.engine().borrow().options().style_url.ends_with("key=k"));
    }

    #[test]
    fn test_teardown_before_ready() {
        let mut lifecycle = lifecycle();
        let (handle, loaded) = lifecycle.initialize(Some(&target())).unwrap();
        lifecycle.teardown();

        assert!(!handle.is_live());
        assert!(handle.engine().borrow().is_removed());
        // Late ready from the dead engine does nothing
        HeadlessMap::emit_ready(handle.engine());
        assert!(!loaded.is_loaded());
    }

    #[test]
    fn test_teardown_after_ready_resets_signal() {
        let mut lifecycle = lifecycle();
        let (handle, loaded) = lifecycle.initialize(Some(&target())).unwrap();
        HeadlessMap::emit_ready(handle.engine());
        lifecycle.teardown();

        assert!(!loaded.is_loaded());
        assert!(lifecycle.handle().is_none());
        assert_eq!(handle.engine().borrow().calls().last(), Some(&EngineCall::Remove));
    }

    #[test]
    fn test_reinitialize_after_teardown() {
        let mut lifecycle = lifecycle();
        let (first, _) = lifecycle.initialize(Some(&target())).unwrap();
        lifecycle.teardown();
        let (second, _) = lifecycle.initialize(Some(&target())).unwrap();
        assert!(!second.same_instance(&first));
        assert!(second.is_live());
    }

    #[test]
    fn test_drop_tears_down() {
        let mut lifecycle = lifecycle();
        let (handle, _) = lifecycle.initialize(Some(&target())).unwrap();
        drop(lifecycle);
        assert!(!handle.is_live());
        assert!(handle.engine().borrow().is_removed());
    }
}
