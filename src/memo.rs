//! Deep-equality memoization with coordinate-aware comparison.
//!
//! Callers rebuild an equivalent options value on every update. Reactive
//! identity would treat each rebuild as a change; [`DeepMemo`] keeps handing
//! back the previously stored `Rc` until the value is semantically different.
//!
//! # Equality
//!
//! - Two coordinates are equal iff their latitude and longitude match, whether
//!   each side is a `{lat, lng}` literal object or a
//!   [`LatLng`](crate::types::LatLng).
//!   A coordinate never equals a non-coordinate.
//! - Everything else compares structurally: lists are order-sensitive, objects
//!   are key-set-sensitive, and the coordinate rule applies at every depth.
//! - `NaN` equals `NaN` outside of coordinates.
//!
//! ```ignore
//! let mut memo = DeepMemo::new();
//! let a = memo.memoize(MapOptions::new().center(OptionValue::literal(1.0, 2.0)));
//! let b = memo.memoize(MapOptions::new().center(LatLng::new(1.0, 2.0)));
//! assert!(Rc::ptr_eq(&a, &b));
//! ```

use std::rc::Rc;

use crate::types::{MapOptions, OptionValue};

/// Semantic equality used by [`DeepMemo`].
pub trait DeepEq {
    fn deep_eq(&self, other: &Self) -> bool;
}

impl DeepEq for OptionValue {
    fn deep_eq(&self, other: &Self) -> bool {
        values_equal(self, other)
    }
}

impl DeepEq for MapOptions {
    fn deep_eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(key, value)| other.get(key).is_some_and(|o| values_equal(value, o)))
    }
}

/// Coordinate-aware structural equality for option values.
pub fn values_equal(a: &OptionValue, b: &OptionValue) -> bool {
    let (ca, cb) = (a.as_coordinate(), b.as_coordinate());
    if ca.is_some() || cb.is_some() {
        return match (ca, cb) {
            (Some(x), Some(y)) => x.equals(&y),
            _ => false,
        };
    }

    match (a, b) {
        (OptionValue::Null, OptionValue::Null) => true,
        (OptionValue::Bool(x), OptionValue::Bool(y)) => x == y,
        (OptionValue::Number(x), OptionValue::Number(y)) => numbers_equal(*x, *y),
        (OptionValue::Text(x), OptionValue::Text(y)) => x == y,
        (OptionValue::List(x), OptionValue::List(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| values_equal(a, b))
        }
        (OptionValue::Object(x), OptionValue::Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(key, value)| y.get(key).is_some_and(|o| values_equal(value, o)))
        }
        _ => false,
    }
}

fn numbers_equal(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

// =============================================================================
// DeepMemo
// =============================================================================

/// Remembers the last semantically distinct value.
pub struct DeepMemo<T> {
    current: Option<Rc<T>>,
}

impl<T: DeepEq> DeepMemo<T> {
    pub fn new() -> Self {
        Self { current: None }
    }

    /// Return the stored reference if `value` deep-equals it, otherwise store
    /// and return `value`.
    pub fn memoize(&mut self, value: T) -> Rc<T> {
        if let Some(current) = &self.current {
            if current.deep_eq(&value) {
                return current.clone();
            }
        }
        let value = Rc::new(value);
        self.current = Some(value.clone());
        value
    }

    /// The stored value, if any.
    pub fn current(&self) -> Option<Rc<T>> {
        self.current.clone()
    }
}

impl<T: DeepEq> Default for DeepMemo<T> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LatLng;

    fn object(pairs: &[(&str, OptionValue)]) -> OptionValue {
        OptionValue::Object(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn test_coordinates_equal_across_representations() {
        let samples = [(0.0, 0.0), (1.0, 2.0), (-33.86, 151.2), (89.9, -179.9)];
        for (lat, lng) in samples {
            let literal = OptionValue::literal(lat, lng);
            let object = OptionValue::LatLng(LatLng::new(lat, lng));
            assert!(values_equal(&literal, &object), "({lat}, {lng}) literal vs object");
            assert!(values_equal(&object, &literal), "({lat}, {lng}) object vs literal");
            assert!(values_equal(&literal, &OptionValue::literal(lat, lng)));
        }
    }

    #[test]
    fn test_coordinate_vs_non_coordinate_unequal() {
        let literal = OptionValue::literal(1.0, 2.0);
        assert!(!values_equal(&literal, &OptionValue::Null));
        assert!(!values_equal(&OptionValue::Number(1.0), &literal));
        assert!(!values_equal(
            &literal,
            &object(&[("lat", 1.0.into()), ("lon", 2.0.into())])
        ));
    }

    #[test]
    fn test_literal_extra_keys_still_coordinate() {
        let with_extra = object(&[
            ("lat", 1.0.into()),
            ("lng", 2.0.into()),
            ("label", "x".into()),
        ]);
        assert!(values_equal(&with_extra, &OptionValue::LatLng(LatLng::new(1.0, 2.0))));
    }

    #[test]
    fn test_structural_rules() {
        let list_a = OptionValue::List(vec![1.0.into(), 2.0.into()]);
        let list_b = OptionValue::List(vec![2.0.into(), 1.0.into()]);
        assert!(!values_equal(&list_a, &list_b), "lists are order-sensitive");
        assert!(values_equal(&list_a, &list_a.clone()));

        let obj_a = object(&[("a", true.into())]);
        let obj_b = object(&[("a", true.into()), ("b", OptionValue::Null)]);
        assert!(!values_equal(&obj_a, &obj_b), "objects are key-set-sensitive");

        assert!(values_equal(&OptionValue::Number(f64::NAN), &OptionValue::Number(f64::NAN)));
        assert!(!values_equal(&OptionValue::Number(1.0), &OptionValue::Text("1".into())));
    }

    #[test]
    fn test_nested_coordinates() {
        let a = OptionValue::List(vec![object(&[("center", OptionValue::literal(5.0, 6.0))])]);
        let b = OptionValue::List(vec![object(&[(
            "center",
            OptionValue::LatLng(LatLng::new(5.0, 6.0)),
        )])]);
        assert!(values_equal(&a, &b));
    }

    #[test]
    fn test_memoize_returns_stored_reference_when_equal() {
        let mut memo = DeepMemo::new();
        let first = memo.memoize(MapOptions::new().zoom(3.0).center(OptionValue::literal(0.0, 0.0)));
        let second = memo.memoize(MapOptions::new().zoom(3.0).center(LatLng::new(0.0, 0.0)));
        assert!(Rc::ptr_eq(&first, &second));

        let third = memo.memoize(MapOptions::new().zoom(4.0).center(LatLng::new(0.0, 0.0)));
        assert!(!Rc::ptr_eq(&first, &third));
        assert!(Rc::ptr_eq(&third, &memo.current().unwrap()));
    }

    #[test]
    fn test_memoize_option_values() {
        let mut memo: DeepMemo<OptionValue> = DeepMemo::default();
        let a = memo.memoize(OptionValue::List(vec![OptionValue::literal(1.0, 2.0), "x".into()]));
        let b = memo.memoize(OptionValue::List(vec![
            OptionValue::LatLng(LatLng::new(1.0, 2.0)),
            "x".into(),
        ]));
        assert!(Rc::ptr_eq(&a, &b));

        let c = memo.memoize(OptionValue::List(vec!["x".into(), OptionValue::literal(1.0, 2.0)]));
        assert!(!Rc::ptr_eq(&a, &c));
    }

    #[test]
    fn test_map_options_deep_eq_key_sets() {
        let a = MapOptions::new().zoom(3.0);
        let b = MapOptions::new().zoom(3.0).clickable_icons(false);
        assert!(!a.deep_eq(&b));
        assert!(b.deep_eq(&b.clone()));
    }
}
