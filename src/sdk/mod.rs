//! Mapping SDK seam.
//!
//! The external SDK owns everything visual: the map surface, tiles, marker
//! rendering, hit testing. The widget only needs the imperative surface below:
//! - [`MapsApi`] - load the SDK, construct maps and marker views
//! - [`MapInstance`] - options updates and per-event listener lists
//! - [`MarkerView`] - click listeners and the map association
//!
//! [`headless`] implements the seam in-process. It records every call and can
//! simulate user interaction, which is what the tests and the demo binary run
//! against.

pub mod headless;

use std::cell::Cell;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use crate::error::LoadError;
use crate::loader::LoaderOptions;
use crate::dom::Element;
use crate::types::{CollisionBehavior, LatLng, MapEventName, MapInit, MapOptions};

pub use headless::{HeadlessMap, HeadlessMaps, HeadlessMarker};

// =============================================================================
// Events
// =============================================================================

/// Mouse event delivered for `click` and `dblclick`.
#[derive(Debug, Clone, PartialEq)]
pub struct MapMouseEvent {
    lat_lng: Option<LatLng>,
    stopped: Cell<bool>,
}

impl MapMouseEvent {
    pub fn new(lat_lng: Option<LatLng>) -> Self {
        Self {
            lat_lng,
            stopped: Cell::new(false),
        }
    }

    /// Coordinate under the pointer.
    pub fn lat_lng(&self) -> Option<LatLng> {
        self.lat_lng
    }

    /// Prevent the SDK's default handling (e.g. zoom-in on double-click).
    pub fn stop(&self) {
        self.stopped.set(true);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.get()
    }
}

/// What an SDK map listener receives.
#[derive(Debug)]
pub enum MapEvent {
    Mouse(MapMouseEvent),
    Idle,
}

/// Listener registered on a map instance.
pub type MapListener = Rc<dyn Fn(&MapEvent)>;

/// Listener registered on a marker view.
pub type MarkerListener = Rc<dyn Fn()>;

/// Receives the outcome of [`MapsApi::load`], possibly after `load` returned.
pub type LoadCallback = Box<dyn FnOnce(Result<(), LoadError>)>;

/// Identifies one registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

// =============================================================================
// Traits
// =============================================================================

/// Entry point of the mapping SDK.
pub trait MapsApi {
    /// Start loading the SDK script/libraries and report to `done` when
    /// finished. Called once by the loader.
    fn load(&self, options: &LoaderOptions, done: LoadCallback);

    /// Construct a map bound to `container`.
    fn new_map(&self, container: &Element, init: &MapInit) -> MapRef;

    /// Construct a marker view. It is shown on `options.map` if set.
    fn new_marker_view(&self, options: MarkerViewOptions) -> MarkerRef;
}

/// A live map surface.
pub trait MapInstance {
    /// Merge `options` into the map's current options.
    fn set_options(&self, options: &MapOptions);

    fn add_listener(&self, event: MapEventName, listener: MapListener) -> ListenerId;

    /// Remove every listener registered for `event`.
    fn clear_listeners(&self, event: MapEventName);

    fn container(&self) -> Element;
}

/// A labelled overlay on a map.
pub trait MarkerView {
    fn add_click_listener(&self, listener: MarkerListener) -> ListenerId;

    /// Attach to `map`, or detach with `None`.
    fn set_map(&self, map: Option<MapRef>);

    fn map(&self) -> Option<MapRef>;

    fn position(&self) -> LatLng;
}

/// Construction options for a marker view.
pub struct MarkerViewOptions {
    pub map: Option<MapRef>,
    pub position: LatLng,
    pub content: Element,
    /// Draw priority; also decides who wins a collision.
    pub z_index: i32,
    pub collision_behavior: CollisionBehavior,
}

// =============================================================================
// Handles
// =============================================================================

/// Shared handle to a map instance. Equality is identity.
#[derive(Clone)]
pub struct MapRef(Rc<dyn MapInstance>);

impl MapRef {
    pub fn new(instance: Rc<dyn MapInstance>) -> Self {
        Self(instance)
    }
}

impl Deref for MapRef {
    type Target = dyn MapInstance;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl PartialEq for MapRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for MapRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MapRef({:p})", Rc::as_ptr(&self.0) as *const ())
    }
}

/// Shared handle to a marker view. Equality is identity.
#[derive(Clone)]
pub struct MarkerRef(Rc<dyn MarkerView>);

impl MarkerRef {
    pub fn new(view: Rc<dyn MarkerView>) -> Self {
        Self(view)
    }
}

impl Deref for MarkerRef {
    type Target = dyn MarkerView;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl PartialEq for MarkerRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for MarkerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MarkerRef({:p})", Rc::as_ptr(&self.0) as *const ())
    }
}
