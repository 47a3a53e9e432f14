//! Host-facing controller.
//!
//! The host calls one method per kind of state change: mounting, new
//! datasets, new filter inputs, disposal. The controller remembers the latest
//! inputs and replays them when the engine finishes loading.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use advisory_common::{AltitudeRange, VisibilitySet};
use tracing::{debug, warn};

use crate::engine::{EngineFactory, MapOptions, MountTarget};
use crate::error::MapResult;
use crate::filter::apply_filter_inputs;
use crate::handle::{LoadedSignal, MapHandle};
use crate::interaction::{InteractionController, PopupState};
use crate::lifecycle::MapLifecycle;
use crate::reconcile::{Datasets, LayerReconciler, Reconciled};

struct ControllerState<F: EngineFactory> {
    lifecycle: MapLifecycle<F>,
    reconciler: LayerReconciler,
    interaction: Option<InteractionController<F::Engine>>,
    datasets: Datasets,
    visibility: VisibilitySet,
    range: AltitudeRange,
}

impl<F: EngineFactory> ControllerState<F> {
    fn live(&self) -> Option<(MapHandle<F::Engine>, LoadedSignal)> {
        let handle = self.lifecycle.handle()?.clone();
        Some((handle, self.lifecycle.loaded().clone()))
    }

    fn reconcile(&mut self) -> MapResult<Reconciled> {
        let Some((handle, loaded)) = self.live() else {
            return Ok(Reconciled::NotReady);
        };
        let outcome = self.reconciler.reconcile(&handle, &loaded, &self.datasets)?;
        if matches!(outcome, Reconciled::Applied(_)) {
            // Newly created layers need the current filter inputs
            self.apply_filters()?;
        }
        Ok(outcome)
    }

    fn apply_filters(&self) -> MapResult<bool> {
        let Some((handle, loaded)) = self.live() else {
            return Ok(false);
        };
        apply_filter_inputs(&handle, &loaded, &self.visibility, self.range)
    }

    fn attach_interaction(&mut self) {
        if self.interaction.is_some() {
            return;
        }
        let Some((handle, loaded)) = self.live() else {
            return;
        };
        let popup = self.lifecycle.options().popup.clone();
        self.interaction = InteractionController::attach(&handle, &loaded, popup);
    }

    /// Every step runs even if an earlier one failed; the first error wins.
    fn on_loaded(&mut self) -> MapResult<()> {
        let reconciled = self.reconcile();
        self.attach_interaction();
        let filtered = self.apply_filters();
        reconciled?;
        filtered?;
        Ok(())
    }

    fn dispose(&mut self) {
        // Listeners go first, while the style is still loaded
        if let Some(mut interaction) = self.interaction.take() {
            interaction.detach();
        }
        self.lifecycle.teardown();
        self.reconciler.reset();
    }
}

/// Synchronizes one map engine with host state.
pub struct MapController<F: EngineFactory + 'static> {
    state: Rc<RefCell<ControllerState<F>>>,
}

impl<F: EngineFactory + 'static> MapController<F> {
    pub fn new(factory: F, options: MapOptions) -> Self {
        Self {
            state: Rc::new(RefCell::new(ControllerState {
                lifecycle: MapLifecycle::new(factory, options),
                reconciler: LayerReconciler::new(),
                interaction: None,
                datasets: Datasets::new(),
                visibility: VisibilitySet::default(),
                range: AltitudeRange::default(),
            })),
        }
    }

    /// Create the engine on `target`. A no-op without a target or while an
    /// engine is already mounted. Returns whether an engine was created.
    pub fn mount(&self, target: Option<&MountTarget>) -> bool {
        let created = self.state.borrow_mut().lifecycle.initialize(target);
        let Some((_, loaded)) = created else {
            return false;
        };

        let weak = Rc::downgrade(&self.state);
        loaded.subscribe(move || replay_on_load(&weak));
        true
    }

    /// Forward the latest datasets. Deferred until the map is loaded and
    /// every category has a dataset.
    pub fn on_datasets_changed(&self, datasets: Datasets) -> MapResult<Reconciled> {
        let mut state = self.state.borrow_mut();
        state.datasets = datasets;
        state.reconcile()
    }

    /// Apply category visibility and the altitude band to existing layers.
    /// Returns false while the map is not loaded or no longer live. Once
    /// loaded it returns true even if no layer exists yet; the stored inputs
    /// are applied to layers as reconciliation creates them.
    pub fn on_filter_inputs_changed(
        &self,
        visibility: VisibilitySet,
        range: AltitudeRange,
    ) -> MapResult<bool> {
        let mut state = self.state.borrow_mut();
        state.visibility = visibility;
        state.range = range;
        state.apply_filters()
    }

    /// Detach listeners, destroy the engine and reset the load signal.
    pub fn dispose(&self) {
        match self.state.try_borrow_mut() {
            Ok(mut state) => state.dispose(),
            Err(_) => warn!("Map controller busy; dispose skipped"),
        }
    }

    /// The live engine handle, if mounted.
    pub fn handle(&self) -> Option<MapHandle<F::Engine>> {
        self.state.borrow().lifecycle.handle().cloned()
    }

    pub fn is_loaded(&self) -> bool {
        self.state.borrow().lifecycle.loaded().is_loaded()
    }

    pub fn popup_state(&self) -> PopupState {
        self.state
            .borrow()
            .interaction
            .as_ref()
            .map(InteractionController::popup_state)
            .unwrap_or_default()
    }
}

impl<F: EngineFactory + 'static> Drop for MapController<F> {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn replay_on_load<F: EngineFactory>(weak: &Weak<RefCell<ControllerState<F>>>) {
    let Some(cell) = weak.upgrade() else {
        return;
    };
    let Ok(mut state) = cell.try_borrow_mut() else {
        warn!("Map loaded while controller was busy; inputs not replayed");
        return;
    };
    match state.on_loaded() {
        Ok(()) => debug!("Replayed host state onto loaded map"),
        Err(e) => warn!(error = %e, "Failed to sync map after load"),
    }
}
