//! In-memory map engine.
//!
//! `HeadlessMap` keeps sources, layers, listeners, the cursor and the popup
//! slot in plain collections and evaluates layer filters per feature, so the
//! core can run without a browser. Every engine operation is appended to a
//! call log for assertions.
//!
//! Events are driven through associated functions taking the shared engine
//! cell ([`HeadlessMap::emit_ready`], [`HeadlessMap::click`],
//! [`HeadlessMap::pointer_move`]). They collect the matching handlers, release
//! the borrow, then invoke them, so handlers are free to call back into the
//! engine.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use advisory_common::FeatureCollection;
use tracing::{debug, trace};

use crate::engine::{
    same_handler, Cursor, EventKind, FillLayer, Handler, LngLat, MapEngine, MapEvent,
    MapOptions, MountTarget, PointerEvent, PopupOptions, RenderedFeature, ScreenPoint,
    Visibility,
};
use crate::error::{MapError, MapResult};
use crate::filter::Expression;
use crate::projection::Viewport;

/// One recorded engine operation.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    AddSource(String),
    SetSourceData(String),
    RemoveSource(String),
    AddLayer(String),
    SetVisibility(String, Visibility),
    SetFilter(String, Expression),
    QueryRenderedFeatures(Vec<String>),
    SetCursor(Cursor),
    On(EventKind),
    Once(EventKind),
    Off(EventKind),
    ShowPopup { lng_lat: LngLat, html: String },
    RemovePopup,
    Remove,
}

/// A fill layer and its mutable layout state.
#[derive(Debug, Clone)]
pub struct LayerState {
    pub layer: FillLayer,
    pub visibility: Visibility,
    pub filter: Option<Expression>,
}

/// The popup currently attached to the map.
#[derive(Debug, Clone, PartialEq)]
pub struct ShownPopup {
    pub lng_lat: LngLat,
    pub html: String,
    pub options: PopupOptions,
}

struct Listener {
    kind: EventKind,
    layers: Vec<String>,
    handler: Handler,
    once: bool,
    /// Pointer currently over a feature of `layers` (enter/leave only).
    hovered: bool,
}

/// Headless engine instance.
pub struct HeadlessMap {
    target: MountTarget,
    options: MapOptions,
    viewport: Viewport,
    sources: HashMap<String, Arc<FeatureCollection>>,
    /// Bottom to top.
    layers: Vec<LayerState>,
    listeners: Vec<Listener>,
    cursor: Cursor,
    popup: Option<ShownPopup>,
    style_loaded: bool,
    removed: bool,
    calls: Vec<EngineCall>,
}

impl HeadlessMap {
    pub fn new(target: &MountTarget, options: &MapOptions) -> Self {
        debug!(
            map = %target.id,
            width = target.width,
            height = target.height,
            "Creating headless map"
        );
        Self {
            target: target.clone(),
            options: options.clone(),
            viewport: Viewport::new(options.center, options.zoom, target.width, target.height),
            sources: HashMap::new(),
            layers: Vec::new(),
            listeners: Vec::new(),
            cursor: Cursor::Default,
            popup: None,
            style_loaded: false,
            removed: false,
            calls: Vec::new(),
        }
    }

    /// Factory usable with [`crate::MapLifecycle`] and [`crate::MapController`].
    pub fn factory() -> fn(&MountTarget, &MapOptions) -> HeadlessMap {
        HeadlessMap::new
    }

    pub fn target(&self) -> &MountTarget {
        &self.target
    }

    pub fn options(&self) -> &MapOptions {
        &self.options
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn calls(&self) -> &[EngineCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn popup(&self) -> Option<&ShownPopup> {
        self.popup.as_ref()
    }

    pub fn source(&self, id: &str) -> Option<&Arc<FeatureCollection>> {
        self.sources.get(id)
    }

    pub fn layer(&self, id: &str) -> Option<&LayerState> {
        self.layers.iter().find(|l| l.layer.id == id)
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }

    /// Number of registered listeners of `kind`.
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.iter().filter(|l| l.kind == kind).count()
    }

    /// Registered handlers of `kind`, in registration order.
    pub fn handlers(&self, kind: EventKind) -> Vec<Handler> {
        self.listeners
            .iter()
            .filter(|l| l.kind == kind)
            .map(|l| Handler::clone(&l.handler))
            .collect()
    }

    /// Simulate the style being torn down underneath the map.
    pub fn unload_style(&mut self) {
        self.style_loaded = false;
    }

    /// Fire the ready event. Returns the number of handlers invoked.
    pub fn emit_ready(engine: &RefCell<HeadlessMap>) -> usize {
        let handlers = {
            let mut map = engine.borrow_mut();
            if map.removed {
                return 0;
            }
            map.style_loaded = true;
            map.take_handlers(EventKind::Load, |_| true)
        };
        dispatch(&handlers, &MapEvent::Load)
    }

    /// Click at a canvas pixel. Returns the number of handlers invoked.
    pub fn click(engine: &RefCell<HeadlessMap>, point: impl Into<ScreenPoint>) -> usize {
        let point = point.into();
        let (handlers, event) = {
            let mut map = engine.borrow_mut();
            if map.removed {
                return 0;
            }
            let event = map.pointer_event(point);
            let hits = map.hit_layers(point);
            let handlers = map.take_handlers(EventKind::Click, |l| {
                l.layers.is_empty() || l.layers.iter().any(|id| hits.contains(id))
            });
            (handlers, event)
        };
        dispatch(&handlers, &MapEvent::Pointer(event))
    }

    /// Move the pointer to a canvas pixel, firing enter/leave on transitions.
    ///
    /// A layer-scoped listener tracks whether any feature of its whole layer
    /// set is under the pointer; moving between two of its layers fires
    /// nothing. Returns the number of handlers invoked.
    pub fn pointer_move(engine: &RefCell<HeadlessMap>, point: impl Into<ScreenPoint>) -> usize {
        let point = point.into();
        let (handlers, event) = {
            let mut map = engine.borrow_mut();
            if map.removed {
                return 0;
            }
            let event = map.pointer_event(point);
            let hits = map.hit_layers(point);
            let mut handlers = Vec::new();
            for listener in map.listeners.iter_mut() {
                if listener.layers.is_empty() {
                    continue;
                }
                let over = listener.layers.iter().any(|id| hits.contains(id));
                let fire = match listener.kind {
                    EventKind::MouseEnter => over && !listener.hovered,
                    EventKind::MouseLeave => !over && listener.hovered,
                    _ => false,
                };
                if matches!(listener.kind, EventKind::MouseEnter | EventKind::MouseLeave) {
                    listener.hovered = over;
                }
                if fire {
                    handlers.push(Handler::clone(&listener.handler));
                }
            }
            (handlers, event)
        };
        dispatch(&handlers, &MapEvent::Pointer(event))
    }

    fn pointer_event(&self, point: ScreenPoint) -> PointerEvent {
        PointerEvent {
            point,
            lng_lat: self.viewport.unproject(point),
        }
    }

    /// Handlers to run for `kind`; matching `once` listeners are unregistered.
    fn take_handlers(&mut self, kind: EventKind, matches: impl Fn(&Listener) -> bool) -> Vec<Handler> {
        let mut handlers = Vec::new();
        self.listeners.retain(|l| {
            if l.kind != kind || !matches(l) {
                return true;
            }
            handlers.push(Handler::clone(&l.handler));
            !l.once
        });
        handlers
    }

    /// Ids of layers with at least one rendered feature under `point`.
    fn hit_layers(&self, point: ScreenPoint) -> Vec<String> {
        let mut ids: Vec<String> = self
            .features_at(point, &[])
            .into_iter()
            .map(|f| f.layer_id)
            .collect();
        ids.dedup();
        ids
    }

    /// Rendered features under `point`, topmost layer first and later
    /// features of a layer before earlier ones.
    fn features_at(&self, point: ScreenPoint, layers: &[&str]) -> Vec<RenderedFeature> {
        let lng_lat = self.viewport.unproject(point);
        let mut hits = Vec::new();

        for state in self.layers.iter().rev() {
            if !layers.is_empty() && !layers.contains(&state.layer.id.as_str()) {
                continue;
            }
            if state.visibility == Visibility::None {
                continue;
            }
            let Some(data) = self.sources.get(&state.layer.source) else {
                continue;
            };
            for feature in data.features.iter().rev() {
                if let Some(filter) = &state.filter {
                    if !filter.matches(feature.properties.as_ref()) {
                        continue;
                    }
                }
                if feature.contains(lng_lat.lng, lng_lat.lat) {
                    hits.push(RenderedFeature {
                        layer_id: state.layer.id.clone(),
                        source_id: state.layer.source.clone(),
                        feature: feature.clone(),
                    });
                }
            }
        }
        hits
    }

    fn ensure_live(&self) -> MapResult<()> {
        if self.removed {
            Err(MapError::EngineRemoved)
        } else {
            Ok(())
        }
    }

    fn layer_mut(&mut self, id: &str) -> MapResult<&mut LayerState> {
        self.layers
            .iter_mut()
            .find(|l| l.layer.id == id)
            .ok_or_else(|| MapError::UnknownLayer(id.to_string()))
    }
}

fn dispatch(handlers: &[Handler], event: &MapEvent) -> usize {
    for handler in handlers {
        handler(event);
    }
    handlers.len()
}

impl MapEngine for HeadlessMap {
    fn has_source(&self, id: &str) -> bool {
        self.sources.contains_key(id)
    }

    fn add_source(&mut self, id: &str, data: Arc<FeatureCollection>) -> MapResult<()> {
        self.ensure_live()?;
        if self.sources.contains_key(id) {
            return Err(MapError::DuplicateSource(id.to_string()));
        }
        self.calls.push(EngineCall::AddSource(id.to_string()));
        self.sources.insert(id.to_string(), data);
        Ok(())
    }

    fn set_source_data(&mut self, id: &str, data: Arc<FeatureCollection>) -> MapResult<()> {
        self.ensure_live()?;
        let slot = self
            .sources
            .get_mut(id)
            .ok_or_else(|| MapError::UnknownSource(id.to_string()))?;
        *slot = data;
        self.calls.push(EngineCall::SetSourceData(id.to_string()));
        Ok(())
    }

    fn remove_source(&mut self, id: &str) -> MapResult<()> {
        self.ensure_live()?;
        if self.sources.remove(id).is_none() {
            return Err(MapError::UnknownSource(id.to_string()));
        }
        self.calls.push(EngineCall::RemoveSource(id.to_string()));
        Ok(())
    }

    fn has_layer(&self, id: &str) -> bool {
        self.layers.iter().any(|l| l.layer.id == id)
    }

    fn add_layer(&mut self, layer: FillLayer) -> MapResult<()> {
        self.ensure_live()?;
        if self.has_layer(&layer.id) {
            return Err(MapError::DuplicateLayer(layer.id));
        }
        if !self.sources.contains_key(&layer.source) {
            return Err(MapError::UnknownSource(layer.source));
        }
        self.calls.push(EngineCall::AddLayer(layer.id.clone()));
        self.layers.push(LayerState {
            layer,
            visibility: Visibility::Visible,
            filter: None,
        });
        Ok(())
    }

    fn set_visibility(&mut self, layer_id: &str, visibility: Visibility) -> MapResult<()> {
        self.ensure_live()?;
        self.layer_mut(layer_id)?.visibility = visibility;
        self.calls
            .push(EngineCall::SetVisibility(layer_id.to_string(), visibility));
        Ok(())
    }

    fn set_filter(&mut self, layer_id: &str, filter: Expression) -> MapResult<()> {
        self.ensure_live()?;
        self.layer_mut(layer_id)?.filter = Some(filter.clone());
        self.calls
            .push(EngineCall::SetFilter(layer_id.to_string(), filter));
        Ok(())
    }

    fn query_rendered_features(
        &mut self,
        point: ScreenPoint,
        layers: &[&str],
    ) -> Vec<RenderedFeature> {
        if self.removed {
            return Vec::new();
        }
        self.calls.push(EngineCall::QueryRenderedFeatures(
            layers.iter().map(|id| id.to_string()).collect(),
        ));
        let features = self.features_at(point, layers);
        trace!(x = point.x, y = point.y, hits = features.len(), "Queried rendered features");
        features
    }

    fn set_cursor(&mut self, cursor: Cursor) {
        if self.removed {
            return;
        }
        self.cursor = cursor;
        self.calls.push(EngineCall::SetCursor(cursor));
    }

    fn is_style_loaded(&self) -> bool {
        self.style_loaded && !self.removed
    }

    fn on(&mut self, kind: EventKind, layers: &[&str], handler: Handler) {
        if self.removed {
            return;
        }
        self.calls.push(EngineCall::On(kind));
        self.listeners.push(Listener {
            kind,
            layers: layers.iter().map(|id| id.to_string()).collect(),
            handler,
            once: false,
            hovered: false,
        });
    }

    fn once(&mut self, kind: EventKind, handler: Handler) {
        if self.removed {
            return;
        }
        self.calls.push(EngineCall::Once(kind));
        self.listeners.push(Listener {
            kind,
            layers: Vec::new(),
            handler,
            once: true,
            hovered: false,
        });
    }

    fn off(&mut self, kind: EventKind, layers: &[&str], handler: &Handler) {
        if self.removed {
            return;
        }
        self.calls.push(EngineCall::Off(kind));
        self.listeners.retain(|l| {
            !(l.kind == kind
                && l.layers.iter().map(String::as_str).eq(layers.iter().copied())
                && same_handler(&l.handler, handler))
        });
    }

    fn show_popup(&mut self, lng_lat: LngLat, html: &str, options: &PopupOptions) {
        if self.removed {
            return;
        }
        self.calls.push(EngineCall::ShowPopup {
            lng_lat,
            html: html.to_string(),
        });
        self.popup = Some(ShownPopup {
            lng_lat,
            html: html.to_string(),
            options: options.clone(),
        });
    }

    fn remove_popup(&mut self) {
        if self.removed {
            return;
        }
        self.calls.push(EngineCall::RemovePopup);
        self.popup = None;
    }

    fn remove(&mut self) {
        if self.removed {
            return;
        }
        debug!(map = %self.target.id, "Removing headless map");
        self.calls.push(EngineCall::Remove);
        self.removed = true;
        self.style_loaded = false;
        self.listeners.clear();
        self.layers.clear();
        self.sources.clear();
        self.popup = None;
    }
}
