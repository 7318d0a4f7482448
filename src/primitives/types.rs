//! Primitive types - Cleanup, props and handlers.
//!
//! Props support static values, signals, and getters for reactivity.
//! Handlers compare by identity so a component can tell "same callback"
//! from "new callback" without comparing closures.

use std::fmt;
use std::rc::Rc;

use spark_signals::Signal;

use crate::sdk::{MapMouseEvent, MapRef};
use crate::types::MarkerData;

// =============================================================================
// Cleanup Function
// =============================================================================

/// Cleanup function returned by components.
///
/// Call this to unmount the component and release resources.
pub type Cleanup = Box<dyn FnOnce()>;

// =============================================================================
// Handlers
// =============================================================================

/// Shared event callback. Two handlers are equal only if they are the same
/// allocation, so re-wrapping a closure counts as a change.
pub struct Handler<A: ?Sized>(Rc<dyn Fn(&A)>);

impl<A: ?Sized> Handler<A> {
    pub fn new(f: impl Fn(&A) + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self, arg: &A) {
        (self.0)(arg)
    }
}

impl<A: ?Sized> Clone for Handler<A> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<A: ?Sized> PartialEq for Handler<A> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<A: ?Sized> fmt::Debug for Handler<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler({:p})", Rc::as_ptr(&self.0) as *const ())
    }
}

/// Map click / double-click callback.
pub type MouseHandler = Handler<MapMouseEvent>;

/// Map idle callback. Receives the map itself.
pub type IdleHandler = Handler<MapRef>;

/// Marker click callback. Receives the marker's descriptor.
pub type MarkerClickHandler = Handler<MarkerData>;

// =============================================================================
// Prop Value - Reactive property wrapper
// =============================================================================

/// A property value that can be static, a signal, or a getter.
///
/// Reading a `Signal` or `Getter` inside an effect subscribes that effect.
#[derive(Clone)]
pub enum PropValue<T: Clone + PartialEq + 'static> {
    /// Static value (not reactive).
    Static(T),
    /// Reactive signal (changes propagate automatically).
    Signal(Signal<T>),
    /// Getter function (called each time value is needed).
    Getter(Rc<dyn Fn() -> T>),
}

impl<T: Clone + PartialEq + 'static> PropValue<T> {
    /// Get the current value (for immediate reads).
    pub fn get(&self) -> T {
        match self {
            PropValue::Static(v) => v.clone(),
            PropValue::Signal(s) => s.get(),
            PropValue::Getter(f) => f(),
        }
    }

    /// Wrap a getter closure.
    pub fn getter(f: impl Fn() -> T + 'static) -> Self {
        PropValue::Getter(Rc::new(f))
    }
}

impl<T: Clone + PartialEq + Default + 'static> Default for PropValue<T> {
    fn default() -> Self {
        PropValue::Static(T::default())
    }
}

impl<T: Clone + PartialEq + 'static> From<T> for PropValue<T> {
    fn from(value: T) -> Self {
        PropValue::Static(value)
    }
}

impl<T: Clone + PartialEq + 'static> From<Signal<T>> for PropValue<T> {
    fn from(signal: Signal<T>) -> Self {
        PropValue::Signal(signal)
    }
}
