//! In-process mapping SDK.
//!
//! Implements [`MapsApi`] without a browser. Every construction, options
//! update, listener change and detach is recorded so callers can assert on
//! exactly what the widget asked the SDK to do. Interaction is simulated with
//! [`HeadlessMap::click`], [`HeadlessMap::double_click`], [`HeadlessMap::settle`]
//! and [`HeadlessMarker::click`].
//!
//! Loading completes inside [`MapsApi::load`] unless [`HeadlessMaps::defer_loading`]
//! was called; deferred loads stay pending until [`HeadlessMaps::complete_loading`].
//!
//! Listener lists are cloned before dispatch: a handler is free to re-bind
//! listeners on the very map that is dispatching to it.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use tracing::{debug, trace};

use super::{
    ListenerId, LoadCallback, MapEvent, MapInstance, MapListener, MapMouseEvent, MapRef, MapsApi, MarkerListener,
    MarkerRef, MarkerView, MarkerViewOptions,
};
use crate::dom::Element;
use crate::error::LoadError;
use crate::loader::LoaderOptions;
use crate::types::{
    CollisionBehavior, LatLng, MapEventName, MapEvents, MapInit, MapOptions, OPT_DISABLE_DOUBLE_CLICK_ZOOM,
};

/// Zoom used when options never set one.
const DEFAULT_ZOOM: f64 = 0.0;

// =============================================================================
// HeadlessMaps
// =============================================================================

#[derive(Default)]
struct Registry {
    maps: Vec<Rc<HeadlessMap>>,
    markers: Vec<Rc<HeadlessMarker>>,
    load_calls: Vec<LoaderOptions>,
    load_failure: Option<LoadError>,
    defer_loads: bool,
    pending_loads: Vec<LoadCallback>,
}

impl Registry {
    fn load_outcome(&self) -> Result<(), LoadError> {
        match &self.load_failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

/// Recording SDK. Clones share the same registry.
#[derive(Clone, Default)]
pub struct HeadlessMaps {
    registry: Rc<RefCell<Registry>>,
}

impl HeadlessMaps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent load outcome a failure with `error`.
    pub fn fail_loading(&self, error: LoadError) {
        self.registry.borrow_mut().load_failure = Some(error);
    }

    /// Keep subsequent loads pending until [`HeadlessMaps::complete_loading`].
    pub fn defer_loading(&self) {
        self.registry.borrow_mut().defer_loads = true;
    }

    /// Number of loads waiting for completion.
    pub fn pending_loads(&self) -> usize {
        self.registry.borrow().pending_loads.len()
    }

    /// Finish every pending load (failing them if [`HeadlessMaps::fail_loading`]
    /// was called) and stop deferring. Returns how many were finished.
    pub fn complete_loading(&self) -> usize {
        let (pending, outcome) = {
            let mut registry = self.registry.borrow_mut();
            registry.defer_loads = false;
            (std::mem::take(&mut registry.pending_loads), registry.load_outcome())
        };
        let finished = pending.len();
        for done in pending {
            done(outcome.clone());
        }
        finished
    }

    /// Every map constructed so far, in order.
    pub fn maps(&self) -> Vec<Rc<HeadlessMap>> {
        self.registry.borrow().maps.clone()
    }

    /// Number of map constructions.
    pub fn map_count(&self) -> usize {
        self.registry.borrow().maps.len()
    }

    /// Every marker view constructed so far, in order.
    pub fn markers(&self) -> Vec<Rc<HeadlessMarker>> {
        self.registry.borrow().markers.clone()
    }

    /// Marker views currently attached to a map.
    pub fn attached_markers(&self) -> Vec<Rc<HeadlessMarker>> {
        self.registry
            .borrow()
            .markers
            .iter()
            .filter(|m| m.is_attached())
            .cloned()
            .collect()
    }

    /// Options passed to each load call.
    pub fn load_calls(&self) -> Vec<LoaderOptions> {
        self.registry.borrow().load_calls.clone()
    }
}

impl MapsApi for HeadlessMaps {
    fn load(&self, options: &LoaderOptions, done: LoadCallback) {
        let outcome = {
            let mut registry = self.registry.borrow_mut();
            registry.load_calls.push(options.clone());
            if registry.defer_loads {
                registry.pending_loads.push(done);
                trace!("headless load deferred");
                return;
            }
            registry.load_outcome()
        };
        done(outcome);
    }

    fn new_map(&self, container: &Element, init: &MapInit) -> MapRef {
        let map = Rc::new(HeadlessMap::new(container.clone(), init.clone()));
        debug!(map_id = %init.map_id, "headless map constructed");
        self.registry.borrow_mut().maps.push(map.clone());
        MapRef::new(map)
    }

    fn new_marker_view(&self, options: MarkerViewOptions) -> MarkerRef {
        let marker = Rc::new(HeadlessMarker {
            position: options.position,
            content: options.content,
            z_index: options.z_index,
            collision_behavior: options.collision_behavior,
            map: RefCell::new(options.map),
            click_listeners: RefCell::new(Vec::new()),
            next_listener: Cell::new(0),
            detach_count: Cell::new(0),
        });
        trace!(position = %marker.position, z_index = marker.z_index, "headless marker constructed");
        self.registry.borrow_mut().markers.push(marker.clone());
        MarkerRef::new(marker)
    }
}

// =============================================================================
// HeadlessMap
// =============================================================================

/// A recorded map instance.
pub struct HeadlessMap {
    container: Element,
    init: MapInit,
    options: RefCell<MapOptions>,
    option_updates: RefCell<Vec<MapOptions>>,
    listeners: RefCell<BTreeMap<MapEventName, Vec<(ListenerId, MapListener)>>>,
    next_listener: Cell<u64>,
    clear_calls: Cell<usize>,
}

impl HeadlessMap {
    fn new(container: Element, init: MapInit) -> Self {
        let options = MapOptions::new()
            .map_id(init.map_id.clone())
            .clickable_icons(init.clickable_icons);
        Self {
            container,
            init,
            options: RefCell::new(options),
            option_updates: RefCell::new(Vec::new()),
            listeners: RefCell::new(BTreeMap::new()),
            next_listener: Cell::new(0),
            clear_calls: Cell::new(0),
        }
    }

    pub fn init(&self) -> &MapInit {
        &self.init
    }

    /// Current merged options.
    pub fn options(&self) -> MapOptions {
        self.options.borrow().clone()
    }

    /// Every `set_options` payload, in order.
    pub fn option_updates(&self) -> Vec<MapOptions> {
        self.option_updates.borrow().clone()
    }

    pub fn zoom(&self) -> f64 {
        self.options.borrow().get_zoom().unwrap_or(DEFAULT_ZOOM)
    }

    pub fn center(&self) -> Option<LatLng> {
        self.options.borrow().get_center()
    }

    pub fn listener_count(&self, event: MapEventName) -> usize {
        self.listeners.borrow().get(&event).map_or(0, Vec::len)
    }

    /// Events with at least one listener.
    pub fn listener_events(&self) -> MapEvents {
        self.listeners
            .borrow()
            .iter()
            .filter(|(_, list)| !list.is_empty())
            .fold(MapEvents::empty(), |set, (name, _)| set | name.flag())
    }

    /// Number of `clear_listeners` calls (any event).
    pub fn clear_calls(&self) -> usize {
        self.clear_calls.get()
    }

    /// Simulate a click at `at`.
    pub fn click(&self, at: LatLng) {
        self.dispatch(MapEventName::Click, &MapEvent::Mouse(MapMouseEvent::new(Some(at))));
    }

    /// Simulate a double-click at `at`. Zooms in by one unless a listener
    /// stops the event or double-click zoom is disabled.
    pub fn double_click(&self, at: LatLng) {
        let event = MapEvent::Mouse(MapMouseEvent::new(Some(at)));
        self.dispatch(MapEventName::DblClick, &event);

        let stopped = matches!(&event, MapEvent::Mouse(e) if e.is_stopped());
        let disabled = self
            .options
            .borrow()
            .get(OPT_DISABLE_DOUBLE_CLICK_ZOOM)
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        if !stopped && !disabled {
            let zoom = self.zoom() + 1.0;
            self.options.borrow_mut().insert(crate::types::OPT_ZOOM, zoom);
        }
    }

    /// Simulate the map settling after a pan/zoom/load.
    pub fn settle(&self) {
        self.dispatch(MapEventName::Idle, &MapEvent::Idle);
    }

    fn dispatch(&self, name: MapEventName, event: &MapEvent) {
        let listeners: Vec<MapListener> = self
            .listeners
            .borrow()
            .get(&name)
            .map(|list| list.iter().map(|(_, l)| l.clone()).collect())
            .unwrap_or_default();
        trace!(event = %name, listeners = listeners.len(), "dispatch");
        for listener in listeners {
            listener(event);
        }
    }
}

impl MapInstance for HeadlessMap {
    fn set_options(&self, options: &MapOptions) {
        self.options.borrow_mut().merge(options);
        self.option_updates.borrow_mut().push(options.clone());
    }

    fn add_listener(&self, event: MapEventName, listener: MapListener) -> ListenerId {
        let id = ListenerId(self.next_listener.get());
        self.next_listener.set(id.0 + 1);
        self.listeners
            .borrow_mut()
            .entry(event)
            .or_default()
            .push((id, listener));
        id
    }

    fn clear_listeners(&self, event: MapEventName) {
        self.clear_calls.set(self.clear_calls.get() + 1);
        self.listeners.borrow_mut().remove(&event);
    }

    fn container(&self) -> Element {
        self.container.clone()
    }
}

// =============================================================================
// HeadlessMarker
// =============================================================================

/// A recorded marker view.
pub struct HeadlessMarker {
    position: LatLng,
    content: Element,
    z_index: i32,
    collision_behavior: CollisionBehavior,
    map: RefCell<Option<MapRef>>,
    click_listeners: RefCell<Vec<(ListenerId, MarkerListener)>>,
    next_listener: Cell<u64>,
    detach_count: Cell<usize>,
}

impl HeadlessMarker {
    pub fn content(&self) -> Element {
        self.content.clone()
    }

    pub fn z_index(&self) -> i32 {
        self.z_index
    }

    pub fn collision_behavior(&self) -> CollisionBehavior {
        self.collision_behavior
    }

    pub fn is_attached(&self) -> bool {
        self.map.borrow().is_some()
    }

    /// Number of `set_map(None)` calls.
    pub fn detach_count(&self) -> usize {
        self.detach_count.get()
    }

    /// Simulate a click on the marker.
    pub fn click(&self) {
        let listeners: Vec<MarkerListener> = self
            .click_listeners
            .borrow()
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        for listener in listeners {
            listener();
        }
    }
}

impl MarkerView for HeadlessMarker {
    fn add_click_listener(&self, listener: MarkerListener) -> ListenerId {
        let id = ListenerId(self.next_listener.get());
        self.next_listener.set(id.0 + 1);
        self.click_listeners.borrow_mut().push((id, listener));
        id
    }

    fn set_map(&self, map: Option<MapRef>) {
        if map.is_none() {
            self.detach_count.set(self.detach_count.get() + 1);
        }
        *self.map.borrow_mut() = map;
    }

    fn map(&self) -> Option<MapRef> {
        self.map.borrow().clone()
    }

    fn position(&self) -> LatLng {
        self.position
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn new_map(api: &HeadlessMaps) -> (MapRef, Rc<HeadlessMap>) {
        let map = api.new_map(&Element::new("div"), &MapInit::default());
        let recorded = api.maps().last().cloned().unwrap();
        (map, recorded)
    }

    fn load_into(api: &HeadlessMaps, results: &Rc<RefCell<Vec<Result<(), LoadError>>>>) {
        let sink = results.clone();
        api.load(
            &LoaderOptions::new("key"),
            Box::new(move |result: Result<(), LoadError>| sink.borrow_mut().push(result)),
        );
    }

    #[test]
    fn test_load_records_and_fails_on_demand() {
        let api = HeadlessMaps::new();
        let results = Rc::new(RefCell::new(Vec::new()));
        load_into(&api, &results);

        api.fail_loading(LoadError::Unauthorized);
        load_into(&api, &results);

        assert_eq!(*results.borrow(), vec![Ok(()), Err(LoadError::Unauthorized)]);
        assert_eq!(api.load_calls().len(), 2);
    }

    #[test]
    fn test_deferred_load_completes_on_request() {
        let api = HeadlessMaps::new();
        api.defer_loading();
        let results = Rc::new(RefCell::new(Vec::new()));

        load_into(&api, &results);
        assert!(results.borrow().is_empty());
        assert_eq!(api.pending_loads(), 1);

        assert_eq!(api.complete_loading(), 1);
        assert_eq!(*results.borrow(), vec![Ok(())]);
        assert_eq!(api.pending_loads(), 0);

        // No longer deferring.
        load_into(&api, &results);
        assert_eq!(results.borrow().len(), 2);
    }

    #[test]
    fn test_set_options_merges_and_records() {
        let api = HeadlessMaps::new();
        let (map, recorded) = new_map(&api);

        map.set_options(&MapOptions::new().zoom(3.0));
        map.set_options(&MapOptions::new().center(LatLng::new(1.0, 2.0)));

        assert_eq!(recorded.option_updates().len(), 2);
        assert_eq!(recorded.zoom(), 3.0);
        assert_eq!(recorded.center(), Some(LatLng::new(1.0, 2.0)));
        assert_eq!(
            recorded.options().get(crate::types::OPT_MAP_ID).and_then(|v| v.as_str()),
            Some(crate::types::DEFAULT_MAP_ID)
        );
    }

    #[test]
    fn test_listeners_dispatch_and_clear() {
        let api = HeadlessMaps::new();
        let (map, recorded) = new_map(&api);
        let hits = Rc::new(Cell::new(0));

        let h = hits.clone();
        map.add_listener(MapEventName::Click, Rc::new(move |_: &MapEvent| h.set(h.get() + 1)));
        recorded.click(LatLng::new(0.0, 0.0));
        assert_eq!(hits.get(), 1);
        assert_eq!(recorded.listener_events(), MapEvents::CLICK);

        map.clear_listeners(MapEventName::Click);
        recorded.click(LatLng::new(0.0, 0.0));
        assert_eq!(hits.get(), 1);
        assert_eq!(recorded.listener_events(), MapEvents::empty());
    }

    #[test]
    fn test_double_click_default_zoom() {
        let api = HeadlessMaps::new();
        let (map, recorded) = new_map(&api);
        map.set_options(&MapOptions::new().zoom(3.0));

        recorded.double_click(LatLng::new(0.0, 0.0));
        assert_eq!(recorded.zoom(), 4.0);

        map.add_listener(
            MapEventName::DblClick,
            Rc::new(|event: &MapEvent| {
                if let MapEvent::Mouse(e) = event {
                    e.stop();
                }
            }),
        );
        recorded.double_click(LatLng::new(0.0, 0.0));
        assert_eq!(recorded.zoom(), 4.0);
    }

    #[test]
    fn test_double_click_zoom_can_be_disabled() {
        let api = HeadlessMaps::new();
        let (map, recorded) = new_map(&api);
        map.set_options(&MapOptions::new().zoom(3.0).disable_double_click_zoom(true));

        recorded.double_click(LatLng::new(0.0, 0.0));
        assert_eq!(recorded.zoom(), 3.0);
    }

    #[test]
    fn test_marker_attach_detach() {
        let api = HeadlessMaps::new();
        let (map, _) = new_map(&api);
        let marker = api.new_marker_view(MarkerViewOptions {
            map: Some(map.clone()),
            position: LatLng::new(1.0, 2.0),
            content: Element::new("div"),
            z_index: 5,
            collision_behavior: CollisionBehavior::OptionalAndHidesLowerPriority,
        });
        assert_eq!(marker.map(), Some(map));
        assert_eq!(api.attached_markers().len(), 1);

        marker.set_map(None);
        assert_eq!(api.attached_markers().len(), 0);
        assert_eq!(api.markers()[0].detach_count(), 1);
        assert_eq!(api.markers()[0].z_index(), 5);
    }
}
