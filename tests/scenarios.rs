//! End-to-end scenarios for the map widget.
//!
//! Each test mounts the whole app into a page through `start`, drives the
//! headless SDK and checks what the SDK was asked to do.
//!
//! Run with: cargo test --test scenarios

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use spark_maps::{
    start, AppEnv, Clock, Document, Fixtures, Handler, HeadlessMaps, LatLng, LoadError,
    LoadStatus, Loader, LoaderOptions, Location, MapInit, MarkerData, StartHandle,
    MOUNT_POINT_ID,
};

// =============================================================================
// HARNESS
// =============================================================================

struct Page {
    document: Document,
    api: HeadlessMaps,
    loader: Rc<Loader>,
    now: Rc<Cell<i64>>,
    clicked: Rc<RefCell<Vec<String>>>,
    handle: StartHandle,
}

fn marker_data(id: &str, title: Option<&str>, lat: f64, lon: f64) -> MarkerData {
    MarkerData {
        diff_id: id.to_string(),
        location: Location { lat, lon },
        title: title.map(String::from),
        ..Default::default()
    }
}

fn mount(fixtures: Fixtures) -> Page {
    mount_with(fixtures, HeadlessMaps::new())
}

fn mount_with(fixtures: Fixtures, api: HeadlessMaps) -> Page {
    let document = Document::new();
    let root = document.create_element("div");
    root.set_id(MOUNT_POINT_ID);
    document.body().append_child(&root);

    let loader = Rc::new(Loader::new(LoaderOptions::new("test-key")));
    let now = Rc::new(Cell::new(0_i64));
    let clicked = Rc::new(RefCell::new(Vec::new()));

    let clock_now = now.clone();
    let clock: Rc<dyn Clock> = Rc::new(move || clock_now.get());
    let clicked_sink = clicked.clone();

    let env = AppEnv {
        api: Rc::new(api.clone()),
        loader: loader.clone(),
        fixtures: Rc::new(fixtures),
        clock,
        init: MapInit::default(),
        on_marker_click: Some(Handler::new(move |data: &MarkerData| {
            clicked_sink.borrow_mut().push(data.diff_id.clone());
        })),
    };

    let handle = start(&document, env);
    document.finish_loading();

    Page {
        document,
        api,
        loader,
        now,
        clicked,
        handle,
    }
}

// =============================================================================
// SCENARIOS
// =============================================================================

#[test]
fn titled_marker_unmounts_when_idle_selects_untitled_dataset() {
    let page = mount(Fixtures::new(
        vec![marker_data("a", Some("Alpha"), 1.0, 2.0)],
        vec![
            marker_data("b1", None, 3.0, 4.0),
            marker_data("b2", None, 5.0, 6.0),
            marker_data("b3", None, 7.0, 8.0),
        ],
    ));
    assert_eq!(page.loader.status(), LoadStatus::Success);
    let map = page.api.maps()[0].clone();

    page.now.set(4);
    map.settle();
    let markers = page.api.markers();
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0].content().text_content(), "Alpha");
    assert!(markers[0].is_attached());

    page.now.set(5);
    map.settle();
    assert_eq!(markers[0].detach_count(), 1, "Alpha detached exactly once");
    assert!(page.api.attached_markers().is_empty());
    assert_eq!(page.api.markers().len(), 1, "untitled markers never construct");
}

#[test]
fn clicks_are_recorded_in_order() {
    let page = mount(Fixtures::default());
    let map = page.api.maps()[0].clone();

    map.click(LatLng::new(10.0, 20.0));
    map.click(LatLng::new(30.0, 40.0));

    assert_eq!(
        page.handle.state().clicks.get(),
        vec![LatLng::new(10.0, 20.0), LatLng::new(30.0, 40.0)]
    );
}

#[test]
fn one_map_for_many_state_changes() {
    let page = mount(Fixtures::default());
    let map = page.api.maps()[0].clone();
    let state = page.handle.state();

    for zoom in [4.0, 5.0, 5.0, 6.0] {
        state.zoom.set(zoom);
    }
    state.center.set(LatLng::new(10.0, 10.0));

    assert_eq!(page.api.map_count(), 1);
    assert!(map.option_updates().len() <= 6);
    assert_eq!(map.zoom(), 6.0);
    assert_eq!(map.center(), Some(LatLng::new(10.0, 10.0)));
}

#[test]
fn double_click_keeps_zoom() {
    let page = mount(Fixtures::default());
    let map = page.api.maps()[0].clone();

    map.double_click(LatLng::new(1.0, 1.0));
    map.double_click(LatLng::new(1.0, 1.0));
    assert_eq!(map.zoom(), 3.0);
}

#[test]
fn marker_click_reports_descriptor() {
    let page = mount(Fixtures::new(
        vec![
            marker_data("1", Some("Paris"), 48.85, 2.35),
            marker_data("2", Some("Berlin"), 52.52, 13.4),
        ],
        vec![],
    ));
    page.api.maps()[0].settle();

    let markers = page.api.markers();
    assert_eq!(markers.len(), 2);
    markers[1].click();
    assert_eq!(*page.clicked.borrow(), vec!["2".to_string()]);
}

#[test]
fn embedded_fixtures_render_titled_markers_only() {
    let fixtures = Fixtures::embedded().expect("embedded fixtures decode");
    let visible_secondary = fixtures
        .secondary
        .iter()
        .filter(|d| d.visible_title().is_some())
        .count();
    let page = mount(fixtures);
    let map = page.api.maps()[0].clone();

    page.now.set(1);
    map.settle();
    assert_eq!(page.api.attached_markers().len(), visible_secondary);
}

#[test]
fn start_loads_sdk_and_constructs_map() {
    let page = mount(Fixtures::default());

    assert_eq!(page.api.load_calls(), vec![LoaderOptions::new("test-key")]);
    assert_eq!(page.loader.status(), LoadStatus::Success);
    assert_eq!(page.api.map_count(), 1);
    assert!(page.handle.is_mounted());
}

#[test]
fn deferred_load_constructs_map_when_sdk_arrives() {
    let api = HeadlessMaps::new();
    api.defer_loading();
    let page = mount_with(Fixtures::default(), api);

    let root = page
        .document
        .get_element_by_id(MOUNT_POINT_ID)
        .expect("mount point");
    assert_eq!(root.text_content(), "LOADING");
    assert_eq!(page.api.map_count(), 0);

    assert_eq!(page.api.complete_loading(), 1);
    assert_eq!(page.api.map_count(), 1);
    assert_eq!(page.api.load_calls().len(), 1);
}

#[test]
fn failed_load_shows_status_and_no_map() {
    let api = HeadlessMaps::new();
    api.fail_loading(LoadError::Unauthorized);
    let page = mount_with(Fixtures::default(), api);

    assert_eq!(page.loader.status(), LoadStatus::Failure);
    assert_eq!(page.api.map_count(), 0);
    assert_eq!(page.api.load_calls().len(), 1);

    let root = page
        .document
        .get_element_by_id(MOUNT_POINT_ID)
        .expect("mount point");
    assert_eq!(root.text_content(), "FAILURE");
}

#[test]
fn unmount_tears_down_map_and_markers() {
    let page = mount(Fixtures::new(
        vec![marker_data("1", Some("Paris"), 48.85, 2.35)],
        vec![],
    ));
    let map = page.api.maps()[0].clone();
    map.settle();
    assert_eq!(page.api.attached_markers().len(), 1);

    page.handle.unmount();

    assert!(page.api.attached_markers().is_empty());
    assert_eq!(page.api.markers()[0].detach_count(), 1);
    map.click(LatLng::new(0.0, 0.0));
    assert!(page.handle.state().clicks.get().is_empty());

    let root = page
        .document
        .get_element_by_id(MOUNT_POINT_ID)
        .expect("mount point");
    assert!(root.children().is_empty());
}
