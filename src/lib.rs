//! # spark-maps
//!
//! Reactive map widget adapter for Rust.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals) for fine-grained reactivity.
//!
//! ## Architecture
//!
//! An external mapping SDK owns an imperative map object. This crate keeps it
//! in sync with a declarative component tree: props are diffed, the map is
//! constructed once, listeners are re-bound without stacking and markers are
//! torn down exactly once.
//!
//! ```text
//! bootstrap → app (state) → wrapper (load status) → map_host → each → marker
//!                                                      │            │
//!                                                      └── MapsApi ─┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Coordinates, map options, marker descriptors, events
//! - [`memo`] - Deep-equality memoizer for options values
//! - [`components`] - Map host and marker components
//! - [`primitives`] - Elements, control flow, props and handlers
//! - [`loader`] - SDK loader status and wrapper
//! - [`sdk`] - Mapping SDK seam and the in-process headless implementation
//! - [`app`] / [`bootstrap`] - Root application and page start-up

pub mod app;
pub mod bootstrap;
pub mod components;
pub mod config;
pub mod dom;
pub mod error;
pub mod fixtures;
pub mod loader;
pub mod memo;
pub mod primitives;
pub mod sdk;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use app::{app, AppEnv, AppState, Clock, SystemClock, INITIAL_ZOOM};

pub use bootstrap::{create_root, start, Root, StartHandle, MOUNT_POINT_ID};

pub use components::{label_element, map_host, marker, MapContext, MapProps, MarkerProps};

pub use config::WidgetConfig;

pub use dom::{with_parent, Document, Element};

pub use error::{BootstrapError, ConfigError, FixtureError, LoadError};

pub use fixtures::Fixtures;

pub use loader::{wrapper, LoadStatus, Loader, LoaderOptions, StatusRender};

pub use memo::{values_equal, DeepEq, DeepMemo};

pub use primitives::{
    div, each, heading, switch, Cleanup, DivProps, EachItem, Handler, IdleHandler, MarkerClickHandler,
    MouseHandler, PropValue,
};

pub use sdk::{
    HeadlessMap, HeadlessMaps, HeadlessMarker, LoadCallback, MapEvent, MapInstance, MapMouseEvent, MapRef,
    MapsApi, MarkerRef, MarkerView,
};
