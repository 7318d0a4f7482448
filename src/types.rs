//! Core types for spark-maps.
//!
//! Coordinates, map options, marker descriptors and the event vocabulary.
//! These are the values that flow between the app state, the components and
//! the external SDK.

use std::collections::BTreeMap;
use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

// =============================================================================
// Coordinates
// =============================================================================

/// Absolute tolerance used when comparing coordinates.
pub const COORDINATE_EPSILON: f64 = 1e-9;

/// A plain latitude/longitude pair, as written in options and JSON.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LatLngLiteral {
    pub lat: f64,
    pub lng: f64,
}

/// The SDK's coordinate object.
///
/// Construction normalizes the pair: latitude is clamped to [-90, 90] and
/// longitude is wrapped into [-180, 180).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct LatLng {
    lat: f64,
    lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self {
            lat: clamp_latitude(lat),
            lng: wrap_longitude(lng),
        }
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }

    /// Coordinate equality: both components within [`COORDINATE_EPSILON`].
    ///
    /// `NaN` never equals anything, including itself.
    pub fn equals(&self, other: &LatLng) -> bool {
        (self.lat - other.lat).abs() <= COORDINATE_EPSILON
            && (self.lng - other.lng).abs() <= COORDINATE_EPSILON
    }

    pub fn to_literal(&self) -> LatLngLiteral {
        LatLngLiteral {
            lat: self.lat,
            lng: self.lng,
        }
    }
}

impl From<LatLngLiteral> for LatLng {
    fn from(literal: LatLngLiteral) -> Self {
        LatLng::new(literal.lat, literal.lng)
    }
}

impl<'de> Deserialize<'de> for LatLng {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        LatLngLiteral::deserialize(deserializer).map(LatLng::from)
    }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.lat, self.lng)
    }
}

fn clamp_latitude(lat: f64) -> f64 {
    if lat.is_nan() { lat } else { lat.clamp(-90.0, 90.0) }
}

fn wrap_longitude(lng: f64) -> f64 {
    if !lng.is_finite() || (-180.0..180.0).contains(&lng) {
        return lng;
    }
    (lng + 180.0).rem_euclid(360.0) - 180.0
}

// =============================================================================
// Option values
// =============================================================================

/// A dynamically typed map option value.
///
/// `Object`s holding numeric `lat` and `lng` keys are coordinate literals and
/// compare as coordinates (see [`crate::memo`]).
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    LatLng(LatLng),
    List(Vec<OptionValue>),
    Object(BTreeMap<String, OptionValue>),
}

impl OptionValue {
    /// Coordinate literal object.
    pub fn literal(lat: f64, lng: f64) -> Self {
        let mut object = BTreeMap::new();
        object.insert("lat".to_string(), OptionValue::Number(lat));
        object.insert("lng".to_string(), OptionValue::Number(lng));
        OptionValue::Object(object)
    }

    /// The value as a coordinate, if it is one in either representation.
    pub fn as_coordinate(&self) -> Option<LatLng> {
        match self {
            OptionValue::LatLng(latlng) => Some(*latlng),
            OptionValue::Object(object) => match (object.get("lat"), object.get("lng")) {
                (Some(OptionValue::Number(lat)), Some(OptionValue::Number(lng))) => {
                    Some(LatLng::new(*lat, *lng))
                }
                _ => None,
            },
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            OptionValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Bool(value)
    }
}

impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        OptionValue::Number(value)
    }
}

impl From<i32> for OptionValue {
    fn from(value: i32) -> Self {
        OptionValue::Number(value as f64)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Text(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::Text(value)
    }
}

impl From<LatLng> for OptionValue {
    fn from(value: LatLng) -> Self {
        OptionValue::LatLng(value)
    }
}

impl From<LatLngLiteral> for OptionValue {
    fn from(value: LatLngLiteral) -> Self {
        OptionValue::literal(value.lat, value.lng)
    }
}

impl From<serde_json::Value> for OptionValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => OptionValue::Null,
            Value::Bool(b) => OptionValue::Bool(b),
            Value::Number(n) => OptionValue::Number(n.as_f64().unwrap_or(f64::NAN)),
            Value::String(s) => OptionValue::Text(s),
            Value::Array(items) => OptionValue::List(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => {
                OptionValue::Object(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

// =============================================================================
// Map options
// =============================================================================

/// Option key for the map center.
pub const OPT_CENTER: &str = "center";
/// Option key for the zoom level.
pub const OPT_ZOOM: &str = "zoom";
/// Option key for the map style identifier.
pub const OPT_MAP_ID: &str = "mapId";
/// Option key for clickable points of interest.
pub const OPT_CLICKABLE_ICONS: &str = "clickableIcons";
/// Option key for double-click zoom.
pub const OPT_DISABLE_DOUBLE_CLICK_ZOOM: &str = "disableDoubleClickZoom";

/// Named display options for a map.
///
/// Replaced wholesale on every state change; the map host decides whether
/// the new set actually differs before reapplying it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MapOptions {
    entries: BTreeMap<String, OptionValue>,
}

impl MapOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    pub fn center(self, center: impl Into<OptionValue>) -> Self {
        self.with(OPT_CENTER, center)
    }

    pub fn zoom(self, zoom: f64) -> Self {
        self.with(OPT_ZOOM, zoom)
    }

    pub fn map_id(self, map_id: impl Into<String>) -> Self {
        self.with(OPT_MAP_ID, map_id.into())
    }

    pub fn clickable_icons(self, clickable: bool) -> Self {
        self.with(OPT_CLICKABLE_ICONS, clickable)
    }

    pub fn disable_double_click_zoom(self, disabled: bool) -> Self {
        self.with(OPT_DISABLE_DOUBLE_CLICK_ZOOM, disabled)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<OptionValue>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.entries.get(key)
    }

    pub fn get_center(&self) -> Option<LatLng> {
        self.get(OPT_CENTER).and_then(OptionValue::as_coordinate)
    }

    pub fn get_zoom(&self) -> Option<f64> {
        self.get(OPT_ZOOM).and_then(OptionValue::as_number)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &OptionValue)> {
        self.entries.iter()
    }

    /// Overlay `other` on top of `self`, the way the SDK merges option updates.
    pub fn merge(&mut self, other: &MapOptions) {
        for (key, value) in other.iter() {
            self.entries.insert(key.clone(), value.clone());
        }
    }
}

/// Construction parameters for a map instance.
#[derive(Debug, Clone, PartialEq)]
pub struct MapInit {
    /// Map style identifier.
    pub map_id: String,
    /// Whether points of interest react to clicks.
    pub clickable_icons: bool,
}

/// Map style identifier used by the demo widget.
pub const DEFAULT_MAP_ID: &str = "e489a9cc5e3c637b";

impl Default for MapInit {
    fn default() -> Self {
        Self {
            map_id: DEFAULT_MAP_ID.to_string(),
            clickable_icons: false,
        }
    }
}

// =============================================================================
// Events
// =============================================================================

/// Map events the host manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MapEventName {
    Click,
    DblClick,
    Idle,
}

impl MapEventName {
    /// Every event the host clears before re-binding.
    pub const ALL: [MapEventName; 3] = [MapEventName::Click, MapEventName::Idle, MapEventName::DblClick];

    /// The SDK event name.
    pub fn as_str(&self) -> &'static str {
        match self {
            MapEventName::Click => "click",
            MapEventName::DblClick => "dblclick",
            MapEventName::Idle => "idle",
        }
    }

    pub fn flag(&self) -> MapEvents {
        match self {
            MapEventName::Click => MapEvents::CLICK,
            MapEventName::DblClick => MapEvents::DBLCLICK,
            MapEventName::Idle => MapEvents::IDLE,
        }
    }
}

impl fmt::Display for MapEventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

bitflags! {
    /// A set of map events.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MapEvents: u8 {
        const CLICK = 0b001;
        const DBLCLICK = 0b010;
        const IDLE = 0b100;
    }
}

impl MapEvents {
    /// Individual event names contained in this set.
    pub fn names(self) -> impl Iterator<Item = MapEventName> {
        MapEventName::ALL
            .into_iter()
            .filter(move |name| self.contains(name.flag()))
    }
}

/// How a marker behaves when it overlaps another marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollisionBehavior {
    /// Always shown.
    #[default]
    Required,
    /// Always shown, hides optional markers it overlaps.
    RequiredAndHidesOptional,
    /// Shown unless it overlaps a marker with higher priority.
    OptionalAndHidesLowerPriority,
}

// =============================================================================
// Marker data
// =============================================================================

/// Position of a marker descriptor, as stored in the fixture data.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

/// One labelled point in a marker dataset.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerData {
    /// Stable identifier; the list key is derived from it.
    pub diff_id: String,
    pub location: Location,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub sub_title: Option<String>,
    #[serde(default)]
    pub hide_text: bool,
    /// Stacking index; higher draws on top and wins collisions.
    #[serde(default)]
    pub text_index: i32,
}

impl MarkerData {
    pub fn position(&self) -> LatLng {
        LatLng::new(self.location.lat, self.location.lon)
    }

    /// List key for this descriptor.
    pub fn key(&self) -> String {
        format!("text-{}", self.diff_id)
    }

    /// The title to render, or `None` when the label is hidden or blank.
    pub fn visible_title(&self) -> Option<&str> {
        if self.hide_text {
            return None;
        }
        self.title.as_deref().filter(|t| !t.is_empty())
    }
}

// =============================================================================
// Style
// =============================================================================

/// Inline style declarations, e.g. `("height", "100%")`.
pub type Style = BTreeMap<String, String>;

/// Build a [`Style`] from pairs.
pub fn style<const N: usize>(pairs: [(&str, &str); N]) -> Style {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latlng_normalizes() {
        let p = LatLng::new(95.0, 190.0);
        assert_eq!(p.lat(), 90.0);
        assert_eq!(p.lng(), -170.0);

        let q = LatLng::new(-10.0, -180.0);
        assert_eq!(q.lng(), -180.0);

        let r = LatLng::new(0.0, 180.0);
        assert_eq!(r.lng(), -180.0);
    }

    #[test]
    fn test_latlng_equals_tolerance() {
        let a = LatLng::new(1.0, 2.0);
        assert!(a.equals(&LatLng::new(1.0 + 1e-12, 2.0)));
        assert!(!a.equals(&LatLng::new(1.001, 2.0)));
        assert!(!LatLng::new(f64::NAN, 0.0).equals(&LatLng::new(f64::NAN, 0.0)));
    }

    #[test]
    fn test_option_value_coordinate_detection() {
        assert_eq!(
            OptionValue::literal(1.0, 2.0).as_coordinate(),
            Some(LatLng::new(1.0, 2.0))
        );
        assert_eq!(
            OptionValue::LatLng(LatLng::new(3.0, 4.0)).as_coordinate(),
            Some(LatLng::new(3.0, 4.0))
        );

        let mut not_coordinate = BTreeMap::new();
        not_coordinate.insert("lat".to_string(), OptionValue::Text("1".into()));
        not_coordinate.insert("lng".to_string(), OptionValue::Number(2.0));
        assert_eq!(OptionValue::Object(not_coordinate).as_coordinate(), None);
        assert_eq!(OptionValue::Number(1.0).as_coordinate(), None);
    }

    #[test]
    fn test_option_value_from_json() {
        let value: OptionValue = serde_json::json!({"center": {"lat": 1.5, "lng": 2.5}, "zoom": 3}).into();
        let OptionValue::Object(object) = value else {
            panic!("expected object");
        };
        assert_eq!(object["center"].as_coordinate(), Some(LatLng::new(1.5, 2.5)));
        assert_eq!(object["zoom"].as_number(), Some(3.0));
    }

    #[test]
    fn test_map_options_merge() {
        let mut current = MapOptions::new().zoom(3.0).center(LatLng::new(0.0, 0.0));
        current.merge(&MapOptions::new().zoom(5.0));
        assert_eq!(current.get_zoom(), Some(5.0));
        assert_eq!(current.get_center(), Some(LatLng::new(0.0, 0.0)));
        assert_eq!(current.len(), 2);
    }

    #[test]
    fn test_map_events_names() {
        let set = MapEvents::CLICK | MapEvents::IDLE;
        let names: Vec<_> = set.names().collect();
        assert_eq!(names, vec![MapEventName::Click, MapEventName::Idle]);
        assert_eq!(MapEvents::all().names().count(), 3);
    }

    #[test]
    fn test_marker_data_visible_title() {
        let mut data = MarkerData {
            diff_id: "1".into(),
            title: Some("Alpha".into()),
            ..Default::default()
        };
        assert_eq!(data.visible_title(), Some("Alpha"));
        assert_eq!(data.key(), "text-1");

        data.hide_text = true;
        assert_eq!(data.visible_title(), None);

        data.hide_text = false;
        data.title = Some(String::new());
        assert_eq!(data.visible_title(), None);

        data.title = None;
        assert_eq!(data.visible_title(), None);
    }

    #[test]
    fn test_marker_data_deserializes_camel_case() {
        let data: MarkerData = serde_json::from_str(
            r#"{"diffId":"7","location":{"lat":1.0,"lon":2.0},"title":"T","subTitle":"S","hideText":false,"textIndex":4}"#,
        )
        .unwrap();
        assert_eq!(data.diff_id, "7");
        assert_eq!(data.position(), LatLng::new(1.0, 2.0));
        assert_eq!(data.sub_title.as_deref(), Some("S"));
        assert_eq!(data.text_index, 4);
    }
}
