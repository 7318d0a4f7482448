//! Control Flow Primitives - Keyed lists and value-driven branches.
//!
//! - [`each`] - List rendering keyed by identity; only added/removed keys
//!   mount/unmount. Items reach components as an [`EachItem`] handle
//! - [`switch`] - Render one branch per distinct value of a reactive getter
//!
//! # Pattern: EffectScope-based Cleanup
//!
//! Both primitives use spark-signals' EffectScope for cleanup:
//! 1. Create an EffectScope to manage the lifetime of child effects/components
//! 2. Run rendering logic inside `scope.run()`
//! 3. Register cleanup with `on_scope_dispose()`
//! 4. Return `Box::new(move || scope.stop())` as the Cleanup
//!
//! # Pattern: Parent Context Restoration
//!
//! Branches and items may render later, from inside an effect, when the
//! parent context stack no longer points at the right element. The parent is
//! captured at creation time and pushed again around every render.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::rc::Rc;

use spark_signals::{effect, effect_scope, on_scope_dispose, signal, Signal};
use tracing::warn;

use crate::dom::{current_parent, pop_parent, push_parent};
use crate::primitives::Cleanup;

// =============================================================================
// each() - Keyed list rendering
// =============================================================================

/// Current value of one keyed list item.
///
/// [`EachItem::get`] subscribes the surrounding effect to later updates of the
/// item; [`EachItem::peek`] reads without subscribing. Render functions run
/// inside the list's own effect, so they should `peek`.
pub struct EachItem<T> {
    signal: Signal<T>,
    latest: Rc<RefCell<T>>,
}

impl<T: Clone + PartialEq + 'static> EachItem<T> {
    fn new(value: T) -> Self {
        Self {
            signal: signal(value.clone()),
            latest: Rc::new(RefCell::new(value)),
        }
    }

    /// Tracked read.
    pub fn get(&self) -> T {
        self.signal.get()
    }

    /// Untracked read.
    pub fn peek(&self) -> T {
        self.latest.borrow().clone()
    }

    fn set(&self, value: T) {
        *self.latest.borrow_mut() = value.clone();
        self.signal.set(value);
    }
}

impl<T> Clone for EachItem<T> {
    fn clone(&self) -> Self {
        Self {
            signal: self.signal.clone(),
            latest: self.latest.clone(),
        }
    }
}

/// Render a list of components reactively, keyed by `key_fn`.
///
/// When the list changes:
/// - New keys: create item + component
/// - Existing keys: update the item (NO component recreation)
/// - Removed keys: cleanup + destroy component
///
/// A component that must be rebuilt for new data needs a new key.
///
/// # Example
///
/// ```ignore
/// let markers = signal(vec![alpha, beta]);
/// let markers_clone = markers.clone();
///
/// let cleanup = each(
///     move || markers_clone.get(),
///     move |item, _key| marker(&ctx, MarkerProps::from_data(item.peek())),
///     |data| data.key(),
/// );
///
/// markers.set(vec![beta]); // alpha's marker unmounts, beta's is untouched
/// ```
///
/// # Duplicate Key Handling
///
/// Duplicate keys are warned but don't crash. Only the first occurrence is tracked.
pub fn each<T, K, RenderF, R>(
    items_getter: impl Fn() -> Vec<T> + 'static,
    render_fn: RenderF,
    key_fn: impl Fn(&T) -> K + 'static,
) -> Cleanup
where
    T: Clone + PartialEq + 'static,
    K: Clone + Eq + Hash + std::fmt::Debug + 'static,
    RenderF: Fn(EachItem<T>, K) -> R + Clone + 'static,
    R: Into<Cleanup>,
{
    let parent = current_parent();

    let scope = effect_scope();

    // Key -> Cleanup for destroying component
    let cleanups: Rc<RefCell<HashMap<K, Cleanup>>> = Rc::new(RefCell::new(HashMap::new()));
    // Key -> item for fine-grained updates
    let item_signals: Rc<RefCell<HashMap<K, EachItem<T>>>> = Rc::new(RefCell::new(HashMap::new()));

    let cleanups_effect = cleanups.clone();
    let item_signals_effect = item_signals.clone();

    let cleanups_dispose = cleanups.clone();
    let item_signals_dispose = item_signals.clone();

    scope.run(move || {
        let _effect_cleanup = effect(move || {
            let items = items_getter();
            let mut current_keys = HashSet::new();

            if let Some(parent) = &parent {
                push_parent(parent.clone());
            }

            for item in items.iter() {
                let key = key_fn(item);

                if current_keys.contains(&key) {
                    warn!(key = ?key, "each(): duplicate key, keys must be unique");
                    continue;
                }
                current_keys.insert(key.clone());

                let existing = item_signals_effect.borrow().get(&key).cloned();
                match existing {
                    Some(existing) => existing.set(item.clone()),
                    None => {
                        let handle = EachItem::new(item.clone());
                        item_signals_effect
                            .borrow_mut()
                            .insert(key.clone(), handle.clone());

                        // Render outside of any map borrow: a component may
                        // synchronously touch state that re-enters this list.
                        let render_fn_clone = render_fn.clone();
                        let cleanup = render_fn_clone(handle, key.clone()).into();
                        cleanups_effect.borrow_mut().insert(key.clone(), cleanup);
                    }
                }
            }

            if parent.is_some() {
                pop_parent();
            }

            let keys_to_remove: Vec<K> = cleanups_effect
                .borrow()
                .keys()
                .filter(|k| !current_keys.contains(*k))
                .cloned()
                .collect();

            for key in keys_to_remove {
                let cleanup = cleanups_effect.borrow_mut().remove(&key);
                item_signals_effect.borrow_mut().remove(&key);
                if let Some(cleanup) = cleanup {
                    cleanup();
                }
            }
        });

        on_scope_dispose(move || {
            let drained: Vec<Cleanup> = cleanups_dispose
                .borrow_mut()
                .drain()
                .map(|(_, c)| c)
                .collect();
            item_signals_dispose.borrow_mut().clear();
            for cleanup in drained {
                cleanup();
            }
        });
    });

    Box::new(move || {
        scope.stop();
    })
}

// =============================================================================
// switch() - Value-driven branch rendering
// =============================================================================

/// Render a branch for the current value of `value_getter`.
///
/// Whenever the value changes, the previous branch is cleaned up and
/// `render_fn` is called with the new value. Returning `None` renders nothing.
/// Repeated equal values do not re-render.
///
/// # Example
///
/// ```ignore
/// let cleanup = switch(
///     move || loader.status(),
///     move |status| match status {
///         LoadStatus::Success => Some(render_map()),
///         other => Some(heading(&other.to_string())),
///     },
/// );
/// ```
pub fn switch<V, RenderF>(value_getter: impl Fn() -> V + 'static, render_fn: RenderF) -> Cleanup
where
    V: Clone + PartialEq + 'static,
    RenderF: Fn(V) -> Option<Cleanup> + 'static,
{
    let parent = current_parent();

    let scope = effect_scope();

    let current_cleanup: Rc<RefCell<Option<Cleanup>>> = Rc::new(RefCell::new(None));
    let last_value: Rc<RefCell<Option<V>>> = Rc::new(RefCell::new(None));
    let cleanup_for_effect = current_cleanup.clone();
    let cleanup_for_dispose = current_cleanup.clone();

    scope.run(move || {
        let _effect_cleanup = effect(move || {
            let value = value_getter();

            if last_value.borrow().as_ref() == Some(&value) {
                return;
            }
            *last_value.borrow_mut() = Some(value.clone());

            let previous = cleanup_for_effect.borrow_mut().take();
            if let Some(prev_cleanup) = previous {
                prev_cleanup();
            }

            if let Some(parent) = &parent {
                push_parent(parent.clone());
            }

            let new_cleanup = render_fn(value);

            if parent.is_some() {
                pop_parent();
            }

            *cleanup_for_effect.borrow_mut() = new_cleanup;
        });

        on_scope_dispose(move || {
            let cleanup = cleanup_for_dispose.borrow_mut().take();
            if let Some(cleanup_fn) = cleanup {
                cleanup_fn();
            }
        });
    });

    Box::new(move || {
        scope.stop();
    })
}

// =============================================================================
// Tests
// =============================================================================
