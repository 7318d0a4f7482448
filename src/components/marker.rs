//! Marker - one labelled marker view on the live map.
//!
//! # Marker slot
//!
//! `Absent → Live → Unmounted`. The component builds its view at most once:
//! as soon as the map is live and the label has a visible title. After that
//! the marker is immobile; a different position or map never moves or
//! rebuilds it. Showing new data means mounting a new component under a new
//! list key.
//!
//! Unmount detaches the view from its map exactly once. `Unmounted` is
//! terminal, so a late map change cannot resurrect the marker.

use std::cell::RefCell;
use std::rc::Rc;

use spark_signals::{effect, effect_scope, on_scope_dispose};
use tracing::trace;

use crate::components::MapContext;
use crate::dom::Element;
use crate::primitives::{Cleanup, MarkerClickHandler};
use crate::sdk::{MapRef, MarkerRef, MarkerViewOptions, MapsApi};
use crate::types::{CollisionBehavior, LatLng, MarkerData};

/// Class of the label container.
pub const LABEL_CLASS: &str = "markerTitle";
/// Class of the title line.
pub const TITLE_CLASS: &str = "main";
/// Class of the subtitle line.
pub const SUBTITLE_CLASS: &str = "sub";

/// Properties for [`marker`].
#[derive(Clone)]
pub struct MarkerProps {
    pub position: LatLng,
    /// Label text, stacking index, hide flag.
    pub data: MarkerData,
    pub on_click: Option<MarkerClickHandler>,
}

impl MarkerProps {
    /// Props positioned at the descriptor's own location.
    pub fn from_data(data: MarkerData) -> Self {
        Self {
            position: data.position(),
            data,
            on_click: None,
        }
    }

    pub fn with_on_click(mut self, handler: Option<MarkerClickHandler>) -> Self {
        self.on_click = handler;
        self
    }
}

enum MarkerSlot {
    Absent,
    Live(MarkerRef),
    Unmounted,
}

/// Lifecycle of one marker view.
struct MarkerCell {
    slot: RefCell<MarkerSlot>,
}

impl MarkerCell {
    fn new() -> Self {
        Self {
            slot: RefCell::new(MarkerSlot::Absent),
        }
    }

    /// Build the view if nothing exists yet and everything it needs is there.
    fn mount(&self, api: &dyn MapsApi, map: Option<MapRef>, props: &MarkerProps) {
        if !matches!(*self.slot.borrow(), MarkerSlot::Absent) {
            return;
        }
        let Some(title) = props.data.visible_title() else {
            trace!(key = %props.data.key(), "marker has no visible title, skipping");
            return;
        };
        let Some(map) = map else {
            return;
        };

        let view = api.new_marker_view(MarkerViewOptions {
            map: Some(map),
            position: props.position,
            content: label_element(title, props.data.sub_title.as_deref()),
            z_index: props.data.text_index,
            collision_behavior: CollisionBehavior::OptionalAndHidesLowerPriority,
        });

        if let Some(handler) = props.on_click.clone() {
            let data = props.data.clone();
            view.add_click_listener(Rc::new(move || handler.call(&data)));
        }

        trace!(key = %props.data.key(), position = %props.position, "marker mounted");
        *self.slot.borrow_mut() = MarkerSlot::Live(view);
    }

    /// Detach the view. Returns whether this call did the detaching.
    fn unmount(&self) -> bool {
        let previous = std::mem::replace(&mut *self.slot.borrow_mut(), MarkerSlot::Unmounted);
        match previous {
            MarkerSlot::Live(view) => {
                view.set_map(None);
                true
            }
            MarkerSlot::Absent | MarkerSlot::Unmounted => false,
        }
    }
}

/// Build the label: a title line and an optional subtitle line.
pub fn label_element(title: &str, subtitle: Option<&str>) -> Element {
    let content = Element::new("div");
    content.set_class_name(LABEL_CLASS);

    let title_span = Element::new("span");
    title_span.set_class_name(TITLE_CLASS);
    title_span.set_text_content(title);
    content.append_child(&title_span);

    if let Some(subtitle) = subtitle.filter(|s| !s.is_empty()) {
        let subtitle_span = Element::new("span");
        subtitle_span.set_class_name(SUBTITLE_CLASS);
        subtitle_span.set_text_content(subtitle);
        content.append_child(&subtitle_span);
    }
    content
}

/// Mount a marker for `props` on the map in `ctx`.
///
/// Renders no element of its own; the label lives inside the SDK's view.
pub fn marker(ctx: &MapContext, props: MarkerProps) -> Cleanup {
    let cell = Rc::new(MarkerCell::new());
    let scope = effect_scope();

    let ctx = ctx.clone();
    let mount_cell = cell.clone();
    let dispose_cell = cell;

    scope.run(move || {
        let _mount = effect(move || {
            let map = ctx.map();
            mount_cell.mount(&*ctx.api(), map, &props);
        });

        on_scope_dispose(move || {
            dispose_cell.unmount();
        });
    });

    Box::new(move || {
        scope.stop();
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdk::{HeadlessMaps, MarkerView};
    use crate::primitives::Handler;
    use crate::types::{Location, MapInit};
    use spark_signals::signal;

    fn data(id: &str, title: Option<&str>) -> MarkerData {
        MarkerData {
            diff_id: id.to_string(),
            location: Location { lat: 1.0, lon: 2.0 },
            title: title.map(String::from),
            sub_title: None,
            hide_text: false,
            text_index: 3,
        }
    }

    fn live_context(api: &HeadlessMaps) -> (MapContext, MapRef) {
        let map = api.new_map(&Element::new("div"), &MapInit::default());
        let ctx = MapContext::new(Rc::new(api.clone()), signal(Some(map.clone())));
        (ctx, map)
    }

    #[test]
    fn test_mounts_labelled_marker() {
        let api = HeadlessMaps::new();
        let (ctx, map) = live_context(&api);
        let mut d = data("1", Some("Alpha"));
        d.sub_title = Some("first".into());

        let _cleanup = marker(&ctx, MarkerProps::from_data(d));

        let markers = api.markers();
        assert_eq!(markers.len(), 1);
        let view = &markers[0];
        assert_eq!(view.map(), Some(map));
        assert_eq!(view.position(), LatLng::new(1.0, 2.0));
        assert_eq!(view.z_index(), 3);
        assert_eq!(
            view.collision_behavior(),
            CollisionBehavior::OptionalAndHidesLowerPriority
        );

        let content = view.content();
        assert_eq!(content.class_name().as_deref(), Some(LABEL_CLASS));
        assert_eq!(content.find_by_class(TITLE_CLASS)[0].text().as_deref(), Some("Alpha"));
        assert_eq!(content.find_by_class(SUBTITLE_CLASS)[0].text().as_deref(), Some("first"));
    }

    #[test]
    fn test_label_without_subtitle_has_single_line() {
        let content = label_element("Alpha", None);
        assert_eq!(content.children().len(), 1);
        assert!(content.find_by_class(SUBTITLE_CLASS).is_empty());
    }

    #[test]
    fn test_untitled_or_hidden_never_constructs() {
        let api = HeadlessMaps::new();
        let (ctx, _map) = live_context(&api);

        let _a = marker(&ctx, MarkerProps::from_data(data("1", None)));
        let _b = marker(&ctx, MarkerProps::from_data(data("2", Some(""))));
        let mut hidden = data("3", Some("Hidden"));
        hidden.hide_text = true;
        let _c = marker(&ctx, MarkerProps::from_data(hidden));

        assert!(api.markers().is_empty());
    }

    #[test]
    fn test_waits_for_map_then_stays_put() {
        let api = HeadlessMaps::new();
        let live = signal(None);
        let ctx = MapContext::new(Rc::new(api.clone()), live.clone());

        let _cleanup = marker(&ctx, MarkerProps::from_data(data("1", Some("Alpha"))));
        assert!(api.markers().is_empty(), "no map yet");

        let first = api.new_map(&Element::new("div"), &MapInit::default());
        live.set(Some(first.clone()));
        assert_eq!(api.markers().len(), 1);

        // A different map later does not move or rebuild the marker.
        let second = api.new_map(&Element::new("div"), &MapInit::default());
        live.set(Some(second));
        assert_eq!(api.markers().len(), 1);
        assert_eq!(api.markers()[0].map(), Some(first));
    }

    #[test]
    fn test_click_forwards_data() {
        let api = HeadlessMaps::new();
        let (ctx, _map) = live_context(&api);
        let clicked: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
        let clicked_clone = clicked.clone();

        let props = MarkerProps::from_data(data("9", Some("Alpha"))).with_on_click(Some(Handler::new(
            move |d: &MarkerData| clicked_clone.borrow_mut().push(d.diff_id.clone()),
        )));
        let _cleanup = marker(&ctx, props);

        api.markers()[0].click();
        assert_eq!(*clicked.borrow(), vec!["9".to_string()]);
    }

    #[test]
    fn test_unmount_detaches_once() {
        let api = HeadlessMaps::new();
        let (ctx, map) = live_context(&api);
        let cell = MarkerCell::new();
        let props = MarkerProps::from_data(data("1", Some("Alpha")));

        cell.mount(&api, ctx.map(), &props);
        assert!(cell.unmount());
        assert!(!cell.unmount());
        assert!(!cell.unmount());
        assert_eq!(api.markers()[0].detach_count(), 1);

        // Terminal: mounting again after unmount does nothing.
        cell.mount(&api, Some(map), &props);
        assert_eq!(api.markers().len(), 1);
    }

    #[test]
    fn test_cleanup_detaches() {
        let api = HeadlessMaps::new();
        let (ctx, _map) = live_context(&api);

        let cleanup = marker(&ctx, MarkerProps::from_data(data("1", Some("Alpha"))));
        assert_eq!(api.attached_markers().len(), 1);

        cleanup();
        assert_eq!(api.markers()[0].detach_count(), 1);
        assert!(api.attached_markers().is_empty());
    }

    #[test]
    fn test_unmount_without_marker_is_noop() {
        let api = HeadlessMaps::new();
        let (ctx, _map) = live_context(&api);
        let cleanup = marker(&ctx, MarkerProps::from_data(data("1", None)));
        cleanup();
        assert!(api.markers().is_empty());
    }
}
