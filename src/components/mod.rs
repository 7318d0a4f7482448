//! Components - the adapter between the component tree and the mapping SDK.
//!
//! - [`map_host`] - owns the one live map: construction, options, listeners
//! - [`marker`] - one labelled marker view on that map

mod map_host;
mod marker;

pub use map_host::{map_host, MapContext, MapProps};
pub use marker::{label_element, marker, MarkerProps, LABEL_CLASS, SUBTITLE_CLASS, TITLE_CLASS};
