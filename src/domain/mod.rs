pub mod manifest;

pub use manifest::{
    DONT_DISCOVER_KEY, Manifest, SectionError, ensure_nested_object, merge_unique_ordered,
};
