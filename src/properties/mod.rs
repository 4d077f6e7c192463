//! Translating caller-friendly property maps into typed Notion property values.

mod mapper;

pub use mapper::{map_properties, MappingReason, PropertyError, PropertyMapping};
