//! Map engine interface.
//!
//! Mirrors the small slice of a MapLibre-style engine the core needs:
//! GeoJSON sources, fill layers with visibility and filter, rendered-feature
//! queries, canvas cursor, one popup slot and an event listener registry.

use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use advisory_common::{Feature, FeatureCollection, FillPaint};
use serde::Serialize;

use crate::error::{MapError, MapResult};
use crate::filter::Expression;

/// Base style template; `{key}` is replaced by the MapTiler API key.
pub const STYLE_URL_TEMPLATE: &str = "https://api.maptiler.com/maps/streets/style.json?key={key}";

/// Drawable surface the engine is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountTarget {
    pub id: String,
    pub width: u32,
    pub height: u32,
}

impl MountTarget {
    pub fn new(id: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            id: id.into(),
            width,
            height,
        }
    }
}

/// Geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }
}

/// Pixel position on the canvas, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for ScreenPoint {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

/// Layout visibility of a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Visible,
    None,
}

impl Visibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Visible => "visible",
            Visibility::None => "none",
        }
    }
}

/// Canvas cursor style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cursor {
    #[default]
    Default,
    Pointer,
}

impl Cursor {
    /// CSS value; the default cursor clears the inline style.
    pub fn as_css(self) -> &'static str {
        match self {
            Cursor::Default => "",
            Cursor::Pointer => "pointer",
        }
    }
}

/// A polygon fill layer referencing a GeoJSON source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FillLayer {
    pub id: String,
    pub source: String,
    #[serde(rename = "type")]
    pub type_: &'static str,
    pub paint: FillPaint,
}

impl FillLayer {
    pub fn new(id: impl Into<String>, source: impl Into<String>, paint: FillPaint) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            type_: "fill",
            paint,
        }
    }
}

/// A feature as rendered by a specific layer.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedFeature {
    pub layer_id: String,
    pub source_id: String,
    pub feature: Feature,
}

/// Popup presentation options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupOptions {
    pub close_button: bool,
    pub close_on_click: bool,
    pub max_width: String,
}

impl Default for PopupOptions {
    fn default() -> Self {
        Self {
            close_button: true,
            close_on_click: false,
            max_width: "400px".to_string(),
        }
    }
}

/// Construction options for a map engine instance.
#[derive(Debug, Clone, PartialEq)]
pub struct MapOptions {
    pub style_url: String,
    pub center: LngLat,
    pub zoom: f64,
    pub popup: PopupOptions,
}

impl MapOptions {
    /// Default viewport with the base style for the given API key.
    pub fn with_api_key(api_key: &str) -> Self {
        Self {
            style_url: STYLE_URL_TEMPLATE.replace("{key}", api_key),
            ..Self::default()
        }
    }

    /// Read the MapTiler key from `MAPTILER_API_KEY`.
    pub fn from_env() -> MapResult<Self> {
        match std::env::var("MAPTILER_API_KEY") {
            Ok(key) if !key.is_empty() => Ok(Self::with_api_key(&key)),
            _ => Err(MapError::MissingApiKey),
        }
    }
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            style_url: STYLE_URL_TEMPLATE.replace("{key}", ""),
            center: LngLat::new(0.0, 0.0),
            zoom: 2.0,
            popup: PopupOptions::default(),
        }
    }
}

/// Events a handler can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Style and initial resources finished loading.
    Load,
    Click,
    MouseEnter,
    MouseLeave,
}

/// Pointer event payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub point: ScreenPoint,
    pub lng_lat: LngLat,
}

/// Event delivered to handlers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapEvent {
    Load,
    Pointer(PointerEvent),
}

/// Event handler. Registration and removal match on the `Rc` allocation, so
/// callers keep the same `Handler` to unregister it.
pub type Handler = Rc<dyn Fn(&MapEvent)>;

/// Whether two handlers are the same registration.
pub fn same_handler(a: &Handler, b: &Handler) -> bool {
    std::ptr::eq(Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ())
}

/// The engine operations used by the core.
///
/// An empty `layers` slice registers a map-wide listener; otherwise the
/// listener is scoped to the set of layers.
pub trait MapEngine {
    fn has_source(&self, id: &str) -> bool;
    fn add_source(&mut self, id: &str, data: Arc<FeatureCollection>) -> MapResult<()>;
    fn set_source_data(&mut self, id: &str, data: Arc<FeatureCollection>) -> MapResult<()>;
    fn remove_source(&mut self, id: &str) -> MapResult<()>;

    fn has_layer(&self, id: &str) -> bool;
    fn add_layer(&mut self, layer: FillLayer) -> MapResult<()>;
    fn set_visibility(&mut self, layer_id: &str, visibility: Visibility) -> MapResult<()>;
    fn set_filter(&mut self, layer_id: &str, filter: Expression) -> MapResult<()>;

    /// Features under `point`, topmost first.
    fn query_rendered_features(&mut self, point: ScreenPoint, layers: &[&str])
        -> Vec<RenderedFeature>;

    fn set_cursor(&mut self, cursor: Cursor);

    /// False once the style has been torn down.
    fn is_style_loaded(&self) -> bool;

    fn on(&mut self, kind: EventKind, layers: &[&str], handler: Handler);
    fn once(&mut self, kind: EventKind, handler: Handler);
    fn off(&mut self, kind: EventKind, layers: &[&str], handler: &Handler);

    fn show_popup(&mut self, lng_lat: LngLat, html: &str, options: &PopupOptions);
    fn remove_popup(&mut self);

    /// Destroy the instance and release its resources.
    fn remove(&mut self);
}

/// Builds engine instances for the lifecycle manager.
pub trait EngineFactory {
    type Engine: MapEngine + 'static;

    fn create(&mut self, target: &MountTarget, options: &MapOptions) -> Self::Engine;
}

impl<E, F> EngineFactory for F
where
    E: MapEngine + 'static,
    F: FnMut(&MountTarget, &MapOptions) -> E,
{
    type Engine = E;

    fn create(&mut self, target: &MountTarget, options: &MapOptions) -> E {
        self(target, options)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::Load => "load",
            EventKind::Click => "click",
            EventKind::MouseEnter => "mouseenter",
            EventKind::MouseLeave => "mouseleave",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_same_handler_matches_clones_only() {
        let a: Handler = Rc::new(|_| {});
        let b: Handler = Rc::new(|_| {});
        assert!(same_handler(&a, &a.clone()));
        assert!(!same_handler(&a, &b));
    }

    #[test]
    fn test_handler_invocation() {
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        let handler: Handler = Rc::new(move |_| counter.set(counter.get() + 1));
        handler(&MapEvent::Load);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_style_url_contains_key() {
        let options = MapOptions::with_api_key("abc123");
        assert_eq!(
            options.style_url,
            "https://api.maptiler.com/maps/streets/style.json?key=abc123"
        );
        assert_eq!(options.center, LngLat::new(0.0, 0.0));
        assert_eq!(options.zoom, 2.0);
    }

    #[test]
    fn test_cursor_css() {
        assert_eq!(Cursor::Pointer.as_css(), "pointer");
        assert_eq!(Cursor::Default.as_css(), "");
    }
}
