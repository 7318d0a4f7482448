//! Map host - owns one live map and keeps it in sync with its props.
//!
//! The host renders a container element, and reconciles the external map
//! against it with three effects:
//!
//! ```text
//! container.connected ──► construct (once) ──► live_map ─┬─► apply options (memoized)
//!                                                        └─► re-bind listeners
//! ```
//!
//! # Map slot
//!
//! `Absent → Constructing → Live`. Only the construction effect moves the
//! slot, and only out of `Absent`, so a host constructs at most one map for
//! its whole lifetime no matter how often its effects re-run.
//!
//! # Listeners
//!
//! Every re-bind first clears `click`, `idle` and `dblclick` on the map, then
//! attaches the handlers currently provided. A replaced handler can never fire
//! again and handlers never stack.
//!
//! # Children
//!
//! Children get the live map through an explicit [`MapContext`]. The map is
//! `None` until construction; children that need it read it inside an effect.

use std::cell::RefCell;
use std::rc::Rc;

use spark_signals::{effect, effect_scope, on_scope_dispose, signal, Signal};
use tracing::{debug, info, trace};

use crate::dom::{attach_to_current_parent, Element};
use crate::memo::DeepMemo;
use crate::primitives::{Cleanup, IdleHandler, MouseHandler, PropValue};
use crate::sdk::{MapEvent, MapRef, MapsApi};
use crate::types::{MapEventName, MapEvents, MapInit, MapOptions, Style};

// =============================================================================
// Context
// =============================================================================

/// What a map host hands to its children.
#[derive(Clone)]
pub struct MapContext {
    api: Rc<dyn MapsApi>,
    map: Signal<Option<MapRef>>,
}

impl MapContext {
    pub fn new(api: Rc<dyn MapsApi>, map: Signal<Option<MapRef>>) -> Self {
        Self { api, map }
    }

    pub fn api(&self) -> Rc<dyn MapsApi> {
        self.api.clone()
    }

    /// The live map, if constructed. Tracked when read inside an effect.
    pub fn map(&self) -> Option<MapRef> {
        self.map.get()
    }
}

// =============================================================================
// Props
// =============================================================================

/// Properties for [`map_host`].
#[derive(Default)]
pub struct MapProps {
    /// Inline style of the container element.
    pub style: Style,
    /// Construction parameters, used once.
    pub init: MapInit,
    /// Declared display options, diffed before every apply.
    pub options: PropValue<MapOptions>,
    pub on_click: PropValue<Option<MouseHandler>>,
    /// May call [`crate::sdk::MapMouseEvent::stop`] to suppress the default zoom.
    pub on_dblclick: PropValue<Option<MouseHandler>>,
    /// Receives the map itself.
    pub on_idle: PropValue<Option<IdleHandler>>,
    pub children: Option<Box<dyn FnOnce(MapContext) -> Cleanup>>,
}

enum MapSlot {
    Absent,
    Constructing,
    Live(MapRef),
}

// =============================================================================
// Component
// =============================================================================

/// Render a map container under the current parent and manage its map.
pub fn map_host(api: Rc<dyn MapsApi>, props: MapProps) -> Cleanup {
    let MapProps {
        style,
        init,
        options,
        on_click,
        on_dblclick,
        on_idle,
        children,
    } = props;

    let container = Element::new("div");
    container.set_style(style);
    attach_to_current_parent(&container);

    let slot = Rc::new(RefCell::new(MapSlot::Absent));
    let live_map: Signal<Option<MapRef>> = signal(None);
    let child_cleanup: Rc<RefCell<Option<Cleanup>>> = Rc::new(RefCell::new(None));

    let scope = effect_scope();

    let context = MapContext::new(api.clone(), live_map.clone());

    let construct_container = container.clone();
    let connected = container.connected_signal();
    let construct_map = live_map.clone();

    let options_map = live_map.clone();
    let listeners_map = live_map.clone();

    let dispose_slot = slot.clone();
    let dispose_children = child_cleanup.clone();
    let dispose_container = container.clone();
    let child_cleanup_slot = child_cleanup.clone();

    scope.run(move || {
        // Construction: once, as soon as the container is in the document.
        let _construct = effect(move || {
            if !connected.get() {
                trace!("map container not attached yet, deferring construction");
                return;
            }
            if !matches!(*slot.borrow(), MapSlot::Absent) {
                return;
            }
            *slot.borrow_mut() = MapSlot::Constructing;
            let map = api.new_map(&construct_container, &init);
            *slot.borrow_mut() = MapSlot::Live(map.clone());
            info!(map_id = %init.map_id, "map constructed");
            construct_map.set(Some(map));
        });

        // Options: reapply only when the memoized value or the map changes.
        let memo: RefCell<DeepMemo<MapOptions>> = RefCell::new(DeepMemo::new());
        let last_applied: RefCell<Option<(MapRef, Rc<MapOptions>)>> = RefCell::new(None);
        let _options = effect(move || {
            let memoized = memo.borrow_mut().memoize(options.get());
            let Some(map) = options_map.get() else {
                return;
            };
            let unchanged = matches!(
                &*last_applied.borrow(),
                Some((applied_map, applied)) if *applied_map == map && Rc::ptr_eq(applied, &memoized)
            );
            if unchanged {
                return;
            }
            debug!(options = memoized.len(), "applying map options");
            map.set_options(&memoized);
            *last_applied.borrow_mut() = Some((map, memoized));
        });

        // Listeners: clear, then bind what is provided now.
        let _listeners = effect(move || {
            let click = on_click.get();
            let dblclick = on_dblclick.get();
            let idle = on_idle.get();
            let Some(map) = listeners_map.get() else {
                return;
            };

            for event in MapEventName::ALL {
                map.clear_listeners(event);
            }

            let mut bound = MapEvents::empty();
            if let Some(handler) = click {
                map.add_listener(MapEventName::Click, mouse_listener(handler));
                bound |= MapEvents::CLICK;
            }
            if let Some(handler) = dblclick {
                map.add_listener(MapEventName::DblClick, mouse_listener(handler));
                bound |= MapEvents::DBLCLICK;
            }
            if let Some(handler) = idle {
                let idle_map = map.clone();
                map.add_listener(MapEventName::Idle, Rc::new(move |_: &MapEvent| handler.call(&idle_map)));
                bound |= MapEvents::IDLE;
            }
            debug!(events = ?bound, "map listeners bound");
        });

        if let Some(render_children) = children {
            *child_cleanup_slot.borrow_mut() = Some(render_children(context));
        }

        on_scope_dispose(move || {
            let children = dispose_children.borrow_mut().take();
            if let Some(cleanup) = children {
                cleanup();
            }
            // Also breaks the idle listener's reference back to its map.
            let live = match &*dispose_slot.borrow() {
                MapSlot::Live(map) => Some(map.clone()),
                _ => None,
            };
            if let Some(map) = live {
                for event in MapEventName::ALL {
                    map.clear_listeners(event);
                }
            }
            dispose_container.remove();
        });
    });

    Box::new(move || {
        scope.stop();
    })
}

fn mouse_listener(handler: MouseHandler) -> Rc<dyn Fn(&MapEvent)> {
    Rc::new(move |event: &MapEvent| {
        if let MapEvent::Mouse(mouse) = event {
            handler.call(mouse);
        }
    })
}

// =============================================================================
// Tests
// =============================================================================
