//! Advisory map core.
//!
//! Keeps a single map-engine instance in sync with declarative host state:
//! which advisory categories are visible, which altitude band is selected and
//! which datasets are loaded. The host drives everything through
//! [`MapController`]; the engine itself sits behind the [`MapEngine`] trait so
//! a browser binding and the in-memory [`HeadlessMap`] are interchangeable.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use advisory_common::{AltitudeRange, Category, FeatureCollection, VisibilitySet};
//! use map_core::{Datasets, HeadlessMap, MapController, MapOptions, MountTarget};
//!
//! let controller = MapController::new(HeadlessMap::factory(), MapOptions::default());
//! controller.mount(Some(&MountTarget::new("map", 800, 600)));
//!
//! let handle = controller.handle().unwrap();
//! HeadlessMap::emit_ready(handle.engine());
//!
//! let datasets = Datasets::new()
//!     .with(Category::Sigmet, Arc::new(FeatureCollection::new()))
//!     .with(Category::Airsigmet, Arc::new(FeatureCollection::new()));
//! controller.on_datasets_changed(datasets).unwrap();
//! controller
//!     .on_filter_inputs_changed(VisibilitySet::all(), AltitudeRange::FULL)
//!     .unwrap();
//! controller.dispose();
//! ```

pub mod controller;
pub mod engine;
pub mod error;
pub mod filter;
pub mod handle;
pub mod headless;
pub mod interaction;
pub mod lifecycle;
pub mod popup;
pub mod projection;
pub mod reconcile;

pub use controller::MapController;
pub use engine::{
    Cursor, EngineFactory, EventKind, FillLayer, Handler, LngLat, MapEngine, MapEvent,
    MapOptions, MountTarget, PointerEvent, PopupOptions, RenderedFeature, ScreenPoint,
    Visibility,
};
pub use error::{MapError, MapResult};
pub use filter::{
    apply_filter_inputs, build_altitude_filter, category_filter, project_visibility, Expression,
};
pub use handle::{LoadedSignal, MapHandle, WeakMapHandle};
pub use headless::{EngineCall, HeadlessMap, LayerState, ShownPopup};
pub use interaction::{InteractionController, PopupState};
pub use lifecycle::MapLifecycle;
pub use popup::{create_popup_markup, format_altitude};
pub use projection::Viewport;
pub use reconcile::{Datasets, LayerAction, LayerReconciler, Reconciled};
