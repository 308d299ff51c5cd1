//! Place and content validation.
//!
//! - [`PlaceValidator`] - geocoder-backed existence and namesake check
//! - [`ContentValidator`] - cross-region checks on text and source URLs

pub mod content;
pub mod place;

pub use content::{
    conflicting_host_region, count_place_mentions, count_region_mentions, ContentValidator,
    ContentVerdict, SourceCheck,
};
pub use place::{PlaceValidator, PlaceVerdict, ValidationCache};
