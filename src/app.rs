//! Root application component.
//!
//! Holds the UI state and composes the widget:
//!
//! ```text
//! div (flex) ─► wrapper (load status) ─► map_host ─► each(markers) ─► marker
//! ```
//!
//! - click: append the coordinate to the click history
//! - dblclick: stop the SDK's default zoom-in
//! - idle: swap the marker dataset by time parity

use std::rc::Rc;

use spark_signals::{signal, Signal};
use tracing::{debug, info};

use crate::components::{map_host, marker, MapContext, MapProps, MarkerProps};
use crate::fixtures::Fixtures;
use crate::loader::{wrapper, LoadStatus, Loader, StatusRender};
use crate::primitives::{
    div, each, heading, Cleanup, DivProps, EachItem, Handler, IdleHandler, MarkerClickHandler, MouseHandler,
    PropValue,
};
use crate::sdk::{MapMouseEvent, MapRef, MapsApi};
use crate::types::{style, LatLng, MapInit, MapOptions, MarkerData};

/// Zoom the app starts at.
pub const INITIAL_ZOOM: f64 = 3.0;

// =============================================================================
// Clock
// =============================================================================

/// Source of the idle parity check.
pub trait Clock {
    fn now_millis(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

impl<F: Fn() -> i64> Clock for F {
    fn now_millis(&self) -> i64 {
        self()
    }
}

// =============================================================================
// State
// =============================================================================

/// Reactive UI state owned by the root component.
#[derive(Clone)]
pub struct AppState {
    /// Append-only click history.
    pub clicks: Signal<Vec<LatLng>>,
    pub zoom: Signal<f64>,
    pub center: Signal<LatLng>,
    /// Active marker dataset.
    pub markers: Signal<Vec<MarkerData>>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            clicks: signal(Vec::new()),
            zoom: signal(INITIAL_ZOOM),
            center: signal(LatLng::new(0.0, 0.0)),
            markers: signal(Vec::new()),
        }
    }

    /// Options derived from the current state.
    pub fn map_options(&self) -> MapOptions {
        MapOptions::new()
            .center(self.center.get().to_literal())
            .zoom(self.zoom.get())
    }

    fn record_click(&self, at: LatLng) {
        let mut clicks = self.clicks.get();
        clicks.push(at);
        self.clicks.set(clicks);
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Environment
// =============================================================================

/// Collaborators the app is rendered with.
#[derive(Clone)]
pub struct AppEnv {
    pub api: Rc<dyn MapsApi>,
    pub loader: Rc<Loader>,
    pub fixtures: Rc<Fixtures>,
    pub clock: Rc<dyn Clock>,
    /// Map construction parameters.
    pub init: MapInit,
    /// Called with a marker's descriptor when it is clicked.
    pub on_marker_click: Option<MarkerClickHandler>,
}

// =============================================================================
// Handlers
// =============================================================================

fn click_handler(state: &AppState) -> MouseHandler {
    let state = state.clone();
    Handler::new(move |event: &MapMouseEvent| {
        debug!("map click");
        if let Some(at) = event.lat_lng() {
            state.record_click(at);
        }
    })
}

fn dblclick_handler() -> MouseHandler {
    Handler::new(|event: &MapMouseEvent| {
        debug!("map dblclick, suppressing zoom");
        event.stop();
    })
}

fn idle_handler(state: &AppState, fixtures: Rc<Fixtures>, clock: Rc<dyn Clock>) -> IdleHandler {
    let state = state.clone();
    Handler::new(move |_map: &MapRef| {
        let now = clock.now_millis();
        let next = fixtures.for_parity(now).to_vec();
        debug!(now, markers = next.len(), "map idle, swapping dataset");
        state.markers.set(next);
    })
}

// =============================================================================
// Component
// =============================================================================

/// Render the app under the current parent.
pub fn app(env: AppEnv, state: AppState) -> Cleanup {
    info!("rendering app");
    let AppEnv {
        api,
        loader,
        fixtures,
        clock,
        init,
        on_marker_click,
    } = env;

    let status_view: StatusRender = Rc::new(|status: LoadStatus| heading(&status.to_string()));

    div(DivProps {
        style: style([("display", "flex"), ("height", "100%")]),
        children: Some(Box::new(move || {
            let load_api = api.clone();
            wrapper(&loader, &*load_api, Some(status_view), move || {
                let options_state = state.clone();
                let markers = state.markers.clone();
                let on_marker_click = on_marker_click.clone();

                map_host(
                    api.clone(),
                    MapProps {
                        style: style([("flex-grow", "1"), ("height", "100%")]),
                        init: init.clone(),
                        options: PropValue::getter(move || options_state.map_options()),
                        on_click: Some(click_handler(&state)).into(),
                        on_dblclick: Some(dblclick_handler()).into(),
                        on_idle: Some(idle_handler(&state, fixtures.clone(), clock.clone())).into(),
                        children: Some(Box::new(move |ctx: MapContext| {
                            each(
                                move || markers.get(),
                                move |item: EachItem<MarkerData>, _key| {
                                    let props = MarkerProps::from_data(item.peek())
                                        .with_on_click(on_marker_click.clone());
                                    marker(&ctx, props)
                                },
                                |data: &MarkerData| data.key(),
                            )
                        })),
                    },
                )
            })
        })),
        ..Default::default()
    })
}

// =============================================================================
// Tests
// =============================================================================
