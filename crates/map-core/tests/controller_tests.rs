//! End-to-end tests of the map controller against the headless engine.

use std::sync::Arc;

use advisory_common::{AltitudeRange, Category, FeatureCollection, VisibilitySet};
use map_core::{
    build_altitude_filter, create_popup_markup, format_altitude, Datasets, EngineCall,
    EventKind, Expression, FillLayer, HeadlessMap, LayerAction, MapController, MapEngine,
    MapEvent, MapOptions,
    MountTarget, PointerEvent, PopupState, Reconciled, ScreenPoint, Visibility,
};
use serde_json::json;
use test_utils::{
    airsigmet_collection, assert_approx_eq, pixels, sigmet_collection, viewport,
};

type Factory = fn(&MountTarget, &MapOptions) -> HeadlessMap;

fn collection(value: serde_json::Value) -> Arc<FeatureCollection> {
    Arc::new(serde_json::from_value(value).unwrap())
}

fn fixture_datasets() -> Datasets {
    Datasets::new()
        .with(Category::Sigmet, collection(sigmet_collection()))
        .with(Category::Airsigmet, collection(airsigmet_collection()))
}

fn mounted() -> MapController<Factory> {
    let controller = MapController::new(HeadlessMap::factory(), MapOptions::default());
    controller.mount(Some(&MountTarget::new("map", viewport::WIDTH, viewport::HEIGHT)));
    HeadlessMap::emit_ready(controller.handle().unwrap().engine());
    controller
}

/// Loaded map with both fixture datasets and the full altitude band.
fn ready() -> MapController<Factory> {
    let controller = mounted();
    controller.on_datasets_changed(fixture_datasets()).unwrap();
    controller
        .on_filter_inputs_changed(VisibilitySet::all(), AltitudeRange::FULL)
        .unwrap();
    controller
        .handle()
        .unwrap()
        .engine()
        .borrow_mut()
        .clear_calls();
    controller
}

fn calls(controller: &MapController<Factory>) -> Vec<EngineCall> {
    controller.handle().unwrap().engine().borrow().calls().to_vec()
}

fn show_calls(calls: &[EngineCall]) -> Vec<(f64, f64, String)> {
    calls
        .iter()
        .filter_map(|c| match c {
            EngineCall::ShowPopup { lng_lat, html } => Some((lng_lat.lng, lng_lat.lat, html.clone())),
            _ => None,
        })
        .collect()
}

fn click(controller: &MapController<Factory>, point: (f64, f64)) {
    HeadlessMap::click(controller.handle().unwrap().engine(), point);
}

// ============================================================================
// Filter compilation
// ============================================================================

#[test]
fn test_filter_structure_for_all_ranges() {
    let pairs = [("base", "top"), ("altitudeHi1", "altitudeHi2"), ("a", "b")];
    for (lower, upper) in pairs {
        for min in (0..=48_000).step_by(6_000) {
            for max in (min..=48_000).step_by(8_000) {
                let expected = Expression::All(vec![
                    Expression::le(
                        Expression::Coalesce(vec![
                            Expression::get(lower),
                            Expression::get(upper),
                            Expression::literal(0),
                        ]),
                        Expression::literal(max),
                    ),
                    Expression::ge(
                        Expression::Coalesce(vec![
                            Expression::get(upper),
                            Expression::get(lower),
                            Expression::literal(0),
                        ]),
                        Expression::literal(min),
                    ),
                ]);
                assert_eq!(build_altitude_filter(lower, upper, min, max), expected);
            }
        }
    }
}

#[test]
fn test_visibility_is_independent_of_range() {
    let only_airsigmet: VisibilitySet = [Category::Airsigmet].into_iter().collect();
    let controller = ready();
    let handle = controller.handle().unwrap();

    for range in [
        AltitudeRange::FULL,
        AltitudeRange::new(0, 0).unwrap(),
        AltitudeRange::new(30_000, 48_000).unwrap(),
    ] {
        controller
            .on_filter_inputs_changed(only_airsigmet.clone(), range)
            .unwrap();
        let engine = handle.engine().borrow();
        assert_eq!(engine.layer("sigmet-layer").unwrap().visibility, Visibility::None);
        assert_eq!(engine.layer("airsigmet-layer").unwrap().visibility, Visibility::Visible);
    }
}

#[test]
fn test_hidden_layer_still_receives_filter() {
    let controller = ready();
    let range = AltitudeRange::new(20_000, 30_000).unwrap();
    controller
        .on_filter_inputs_changed(VisibilitySet::empty(), range)
        .unwrap();

    let calls = calls(&controller);
    assert!(calls.contains(&EngineCall::SetVisibility(
        "sigmet-layer".to_string(),
        Visibility::None
    )));
    assert!(calls.contains(&EngineCall::SetFilter(
        "sigmet-layer".to_string(),
        build_altitude_filter("base", "top", 20_000, 30_000)
    )));
}

// ============================================================================
// Reconciliation
// ============================================================================

#[test]
fn test_same_datasets_cause_no_engine_calls() {
    let controller = mounted();
    let datasets = fixture_datasets();
    controller.on_datasets_changed(datasets.clone()).unwrap();
    controller.handle().unwrap().engine().borrow_mut().clear_calls();

    let outcome = controller.on_datasets_changed(datasets).unwrap();
    assert_eq!(
        outcome,
        Reconciled::Applied(vec![
            (Category::Sigmet, LayerAction::Unchanged),
            (Category::Airsigmet, LayerAction::Unchanged),
        ])
    );
    assert!(!calls(&controller)
        .iter()
        .any(|c| matches!(c, EngineCall::AddSource(_) | EngineCall::AddLayer(_))));
}

#[test]
fn test_refreshed_datasets_update_in_place() {
    let controller = ready();

    for _ in 0..3 {
        controller.on_datasets_changed(fixture_datasets()).unwrap();
    }

    let calls = calls(&controller);
    assert!(!calls
        .iter()
        .any(|c| matches!(c, EngineCall::AddSource(_) | EngineCall::AddLayer(_))));
    let updates = calls
        .iter()
        .filter(|c| matches!(c, EngineCall::SetSourceData(_)))
        .count();
    assert_eq!(updates, 6);
}

#[test]
fn test_missing_dataset_defers_both_categories() {
    let controller = mounted();
    let outcome = controller
        .on_datasets_changed(
            Datasets::new().with(Category::Airsigmet, collection(airsigmet_collection())),
        )
        .unwrap();

    assert_eq!(
        outcome,
        Reconciled::Deferred {
            missing: vec![Category::Sigmet]
        }
    );
    let handle = controller.handle().unwrap();
    assert!(handle.engine().borrow().source("airsigmet-source").is_none());
}

// ============================================================================
// Interaction
// ============================================================================

#[test]
fn test_click_on_empty_space_hides_popup() {
    let controller = ready();
    click(&controller, pixels::OVERLAP);
    assert!(matches!(controller.popup_state(), PopupState::Shown { .. }));

    click(&controller, pixels::EMPTY);
    let calls = calls(&controller);
    assert_eq!(calls.last(), Some(&EngineCall::RemovePopup));
    assert_eq!(show_calls(&calls).len(), 1);
    assert_eq!(controller.popup_state(), PopupState::Idle);

    let handle = controller.handle().unwrap();
    assert!(handle.engine().borrow().popup().is_none());
}

#[test]
fn test_click_shows_topmost_feature_once() {
    let controller = ready();
    click(&controller, pixels::OVERLAP);

    let shows = show_calls(&calls(&controller));
    assert_eq!(shows.len(), 1);
    let (lng, lat, html) = &shows[0];
    assert_approx_eq!(*lng, 5.2734375, 1e-9);
    assert_approx_eq!(*lat, 5.266, 1e-3);
    assert!(html.contains(">AIRSIGMET<"));
    assert!(html.contains("IFR"));

    match controller.popup_state() {
        PopupState::Shown { category, .. } => assert_eq!(category, Category::Airsigmet),
        PopupState::Idle => panic!("popup should be shown"),
    }
}

#[test]
fn test_filtered_out_feature_is_not_picked() {
    let controller = ready();
    // AIRSIGMET band tops out at 18000 ft
    controller
        .on_filter_inputs_changed(VisibilitySet::all(), AltitudeRange::new(20_000, 48_000).unwrap())
        .unwrap();
    click(&controller, pixels::OVERLAP);

    let shows = show_calls(&calls(&controller));
    assert_eq!(shows.len(), 1);
    assert!(shows[0].2.contains(">SIGMET<"));
    assert!(shows[0].2.contains("TURB"));
}

#[test]
fn test_base_only_feature_matches_by_fallback() {
    let controller = ready();
    controller
        .on_filter_inputs_changed(VisibilitySet::all(), AltitudeRange::new(20_000, 30_000).unwrap())
        .unwrap();
    click(&controller, pixels::BASE_ONLY_SIGMET);

    let shows = show_calls(&calls(&controller));
    assert_eq!(shows.len(), 1);
    assert!(shows[0].2.contains("<strong>Altitude:</strong> 25000 ft"));
}

#[test]
fn test_hidden_category_is_not_picked() {
    let controller = ready();
    let only_airsigmet: VisibilitySet = [Category::Airsigmet].into_iter().collect();
    controller
        .on_filter_inputs_changed(only_airsigmet, AltitudeRange::FULL)
        .unwrap();
    click(&controller, pixels::SIGMET_ONLY);

    let calls = calls(&controller);
    assert!(show_calls(&calls).is_empty());
    assert_eq!(calls.last(), Some(&EngineCall::RemovePopup));
}

#[test]
fn test_popup_is_replaced_not_duplicated() {
    let controller = ready();
    click(&controller, pixels::OVERLAP);
    click(&controller, pixels::SIGMET_ONLY);

    let handle = controller.handle().unwrap();
    let engine = handle.engine().borrow();
    let popup = engine.popup().unwrap();
    assert!(popup.html.contains(">SIGMET<"));
    assert!(popup.lng_lat.lng < 0.0);
    assert!(popup.options.close_button);
    assert!(!popup.options.close_on_click);
    assert_eq!(popup.options.max_width, "400px");
}

#[test]
fn test_hover_toggles_cursor() {
    let controller = ready();
    let handle = controller.handle().unwrap();

    HeadlessMap::pointer_move(handle.engine(), pixels::SIGMET_ONLY);
    assert_eq!(handle.engine().borrow().cursor().as_css(), "pointer");

    HeadlessMap::pointer_move(handle.engine(), pixels::EMPTY);
    assert_eq!(handle.engine().borrow().cursor().as_css(), "");
}

// ============================================================================
// Teardown
// ============================================================================

#[test]
fn test_dispose_detaches_and_silences_late_handlers() {
    let controller = ready();
    let handle = controller.handle().unwrap();
    let late_click = handle.engine().borrow().handlers(EventKind::Click);
    assert_eq!(late_click.len(), 1);

    controller.dispose();
    assert!(!controller.is_loaded());

    let log = handle.engine().borrow().calls().to_vec();
    let offs = log
        .iter()
        .filter(|c| matches!(c, EngineCall::Off(_)))
        .count();
    assert_eq!(offs, 3);
    assert_eq!(log.last(), Some(&EngineCall::Remove));

    let event = MapEvent::Pointer(PointerEvent {
        point: ScreenPoint::from(pixels::OVERLAP),
        lng_lat: map_core::LngLat::new(5.0, 5.0),
    });
    late_click[0](&event);
    HeadlessMap::click(handle.engine(), pixels::OVERLAP);
    HeadlessMap::pointer_move(handle.engine(), pixels::OVERLAP);
    assert_eq!(handle.engine().borrow().calls().len(), log.len());
}

#[test]
fn test_dispose_before_load_is_clean() {
    let controller = MapController::new(HeadlessMap::factory(), MapOptions::default());
    controller.mount(Some(&MountTarget::new("map", viewport::WIDTH, viewport::HEIGHT)));
    let handle = controller.handle().unwrap();
    controller.dispose();

    HeadlessMap::emit_ready(handle.engine());
    assert!(!controller.is_loaded());
    assert_eq!(handle.engine().borrow().listener_count(EventKind::Click), 0);
}

// ============================================================================
// Load with engine failures
// ============================================================================

#[test]
fn test_rejected_layer_does_not_block_interaction() {
    let controller = MapController::new(HeadlessMap::factory(), MapOptions::default());
    controller.mount(Some(&MountTarget::new("map", viewport::WIDTH, viewport::HEIGHT)));
    let handle = controller.handle().unwrap();
    {
        // A foreign layer already holds the AIRSIGMET layer id
        let mut engine = handle.engine().borrow_mut();
        engine
            .add_source("other-source", Arc::new(FeatureCollection::new()))
            .unwrap();
        engine
            .add_layer(FillLayer::new(
                "airsigmet-layer",
                "other-source",
                Category::Airsigmet.spec().paint(),
            ))
            .unwrap();
    }
    controller.on_datasets_changed(fixture_datasets()).unwrap();
    controller
        .on_filter_inputs_changed(VisibilitySet::all(), AltitudeRange::FULL)
        .unwrap();

    HeadlessMap::emit_ready(handle.engine());
    assert!(controller.is_loaded());
    {
        let engine = handle.engine().borrow();
        assert_eq!(engine.listener_count(EventKind::Click), 1);
        assert_eq!(engine.listener_count(EventKind::MouseEnter), 1);
        assert_eq!(engine.listener_count(EventKind::MouseLeave), 1);
        assert!(engine.layer("sigmet-layer").unwrap().filter.is_some());
        assert!(!engine.has_source("airsigmet-source"));
    }

    assert_eq!(HeadlessMap::click(handle.engine(), pixels::SIGMET_ONLY), 1);
    assert!(matches!(
        controller.popup_state(),
        PopupState::Shown {
            category: Category::Sigmet,
            ..
        }
    ));
}

// ============================================================================
// Popup text
// ============================================================================

#[test]
fn test_altitude_text_cases() {
    assert_eq!(format_altitude(None, Some(30_000.0)), "30000 ft");
    assert_eq!(format_altitude(Some(15_000.0), Some(15_000.0)), "15000 – 15000 ft");
    assert_eq!(format_altitude(None, None), "Unknown");

    let top_only = json!({"top": 30000}).as_object().cloned().unwrap();
    let html = create_popup_markup(Some(&top_only), Category::Sigmet);
    assert!(html.contains("<strong>Altitude:</strong> 30000 ft"));
}
