//! Primitives - Component building blocks.
//!
//! - [`div`] / [`heading`] - plain elements under the current parent
//! - [`each`] - keyed list rendering
//! - [`switch`] - one branch per distinct value
//!
//! # Architecture
//!
//! A component is a function that renders into the current parent element,
//! sets up its effects, and returns a [`Cleanup`]. Nothing re-runs the
//! function itself: effects inside it react to the signals they read.
//!
//! # Reactivity
//!
//! Props can be:
//! - Static values: `zoom: 3.0.into()`
//! - Signals: `options: my_signal.into()` (stays connected!)
//! - Getters: `PropValue::getter(|| compute_options())`
//!
//! Pass props directly - reading a signal before building props breaks the
//! connection.

mod control_flow;
mod element;
mod types;

pub use control_flow::{each, switch, EachItem};
pub use element::{div, heading, DivProps};
pub use types::*;
