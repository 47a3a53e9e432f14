//! Click picking, hover cursor and the single popup.

use std::cell::Cell;
use std::rc::Rc;

use advisory_common::Category;
use tracing::{debug, trace};

use crate::engine::{Cursor, EventKind, Handler, LngLat, MapEngine, MapEvent, PopupOptions};
use crate::handle::{LoadedSignal, MapHandle, WeakMapHandle};
use crate::popup::create_popup_markup;

/// Popup state of one engine instance.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PopupState {
    #[default]
    Idle,
    Shown { category: Category, lng_lat: LngLat },
}

/// The three registered handlers, kept so `off` receives the same references.
struct Registration {
    click: Handler,
    enter: Handler,
    leave: Handler,
}

/// Listener wiring for one engine instance.
pub struct InteractionController<E: MapEngine + 'static> {
    handle: MapHandle<E>,
    state: Rc<Cell<PopupState>>,
    registration: Option<Registration>,
}

impl<E: MapEngine + 'static> InteractionController<E> {
    /// Register click and hover listeners. Returns `None` until the map is
    /// loaded or when the handle is no longer live.
    pub fn attach(
        handle: &MapHandle<E>,
        loaded: &LoadedSignal,
        popup_options: PopupOptions,
    ) -> Option<Self> {
        if !loaded.is_loaded() || !handle.is_live() {
            return None;
        }

        let state = Rc::new(Cell::new(PopupState::Idle));
        let weak = handle.downgrade();
        let registration = Registration {
            click: click_handler(weak.clone(), Rc::clone(&state), popup_options),
            enter: cursor_handler(weak.clone(), Cursor::Pointer),
            leave: cursor_handler(weak, Cursor::Default),
        };

        let layers = Category::layer_ids();
        handle.with(|engine| {
            engine.on(EventKind::Click, &[], Handler::clone(&registration.click));
            engine.on(EventKind::MouseEnter, &layers, Handler::clone(&registration.enter));
            engine.on(EventKind::MouseLeave, &layers, Handler::clone(&registration.leave));
        })?;
        debug!("Attached map interaction listeners");

        Some(Self {
            handle: handle.clone(),
            state,
            registration: Some(registration),
        })
    }

    pub fn popup_state(&self) -> PopupState {
        self.state.get()
    }

    pub fn is_attached(&self) -> bool {
        self.registration.is_some()
    }

    /// Remove the popup and unregister every listener. Skipped when the
    /// engine's style is already gone. Safe to call more than once.
    pub fn detach(&mut self) {
        let Some(registration) = self.registration.take() else {
            return;
        };
        self.state.set(PopupState::Idle);

        let layers = Category::layer_ids();
        let cleaned = self.handle.with(|engine| {
            if !engine.is_style_loaded() {
                return false;
            }
            engine.remove_popup();
            engine.off(EventKind::Click, &[], &registration.click);
            engine.off(EventKind::MouseEnter, &layers, &registration.enter);
            engine.off(EventKind::MouseLeave, &layers, &registration.leave);
            true
        });

        if cleaned == Some(true) {
            debug!("Detached map interaction listeners");
        } else {
            debug!("Map style already gone; skipped listener cleanup");
        }
    }
}

impl<E: MapEngine + 'static> Drop for InteractionController<E> {
    fn drop(&mut self) {
        self.detach();
    }
}

fn click_handler<E: MapEngine + 'static>(
    weak: WeakMapHandle<E>,
    state: Rc<Cell<PopupState>>,
    options: PopupOptions,
) -> Handler {
    Rc::new(move |event: &MapEvent| {
        let MapEvent::Pointer(pointer) = event else {
            return;
        };
        let Some(handle) = weak.upgrade() else {
            return;
        };

        handle.with(|engine| {
            let layers = Category::layer_ids();
            let features = engine.query_rendered_features(pointer.point, &layers);
            let picked = features.first().and_then(|rendered| {
                Category::from_layer_id(&rendered.layer_id).map(|category| (category, rendered))
            });

            let shown = picked.and_then(|(category, rendered)| {
                let html = create_popup_markup(rendered.feature.properties.as_ref(), category);
                (!html.is_empty()).then_some((category, html))
            });

            match shown {
                Some((category, html)) => {
                    trace!(category = %category, "Showing advisory popup");
                    engine.show_popup(pointer.lng_lat, &html, &options);
                    state.set(PopupState::Shown {
                        category,
                        lng_lat: pointer.lng_lat,
                    });
                }
                None => {
                    engine.remove_popup();
                    state.set(PopupState::Idle);
                }
            }
        });
    })
}

fn cursor_handler<E: MapEngine + 'static>(weak: WeakMapHandle<E>, cursor: Cursor) -> Handler {
    Rc::new(move |_: &MapEvent| {
        if let Some(handle) = weak.upgrade() {
            handle.with(|engine| engine.set_cursor(cursor));
        }
    })
}
