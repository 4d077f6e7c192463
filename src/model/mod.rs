//! Domain model: schemas and values for writing, nodes and catalogs for reading.

pub mod blocks;
mod property_value;
mod schema;
mod workspace;

pub use blocks::{BlockItem, BlockNode};
pub use property_value::{text_content, DateInput, PropertyValue};
pub use schema::{PropertyDefinition, PropertySchema, PropertySummary, PropertyType, SchemaSummary};
pub use workspace::{Catalog, NodeKind, Parent, WorkspaceNode};
