//! Resource catalog wiring.
//!
//! This module wraps the JSON catalog under `catalog/resource_types.json` so
//! callers can load a validated document and hand it to
//! [`crate::registry::TemplateRegistry`]. Types here mirror the schema fields;
//! nothing in this module interprets URL templates.

pub mod identity;
pub mod loader;
pub mod model;

pub use identity::{CatalogKey, EdgeKind, NodeId, Verb};
pub use loader::{CATALOG_SCHEMA_VERSION, load_catalog, parse_catalog};
pub use model::{EndpointEntry, ResourceCatalog, ResourceTypeEntry};
