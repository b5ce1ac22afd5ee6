//! Validated loading of resource catalogs.
//!
//! Documents are checked against `schema/resource_catalog.schema.json` before
//! deserialization, then their `schema_version` and `key` are checked by hand.
//! The loader is strict: a catalog that fails any check is rejected whole so
//! the registry is never built from a partially understood document.

use crate::catalog::identity::CatalogKey;
use crate::catalog::model::ResourceCatalog;
use crate::schema_loader::{SchemaLoadResult, load_embedded_schema, load_json_schema};
use anyhow::{Context, Result, bail};
use serde_json::Value;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

pub const CATALOG_SCHEMA_VERSION: &str = "resource_catalog_v1";
const CATALOG_SCHEMA_FILE: &str = "schema/resource_catalog.schema.json";
const EMBEDDED_CATALOG_SCHEMA: &str = include_str!("../../schema/resource_catalog.schema.json");

/// Load, schema-check and parse the catalog at `path`.
pub fn load_catalog(path: &Path) -> Result<ResourceCatalog> {
    let file = File::open(path).with_context(|| format!("opening catalog {}", path.display()))?;
    let value: Value = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing catalog {}", path.display()))?;

    let schema = match resolve_catalog_schema_path(path) {
        Some(schema_path) => load_json_schema(&schema_path)?,
        None => load_embedded_schema(EMBEDDED_CATALOG_SCHEMA)?,
    };
    catalog_from_value(value, &schema, &path.display().to_string())
}

/// Same checks as [`load_catalog`] for a document already in memory.
pub fn parse_catalog(json: &str) -> Result<ResourceCatalog> {
    let value: Value = serde_json::from_str(json).context("parsing catalog document")?;
    let schema = load_embedded_schema(EMBEDDED_CATALOG_SCHEMA)?;
    catalog_from_value(value, &schema, "catalog document")
}

fn catalog_from_value(
    value: Value,
    schema: &SchemaLoadResult,
    origin: &str,
) -> Result<ResourceCatalog> {
    schema.check(&value, origin)?;
    let catalog: ResourceCatalog =
        serde_json::from_value(value).with_context(|| format!("deserializing {origin}"))?;
    validate_schema_version(&catalog.schema_version, &schema.schema_version)?;
    validate_catalog_key(&catalog.key)?;
    if catalog.resource_types.is_empty() {
        bail!("{origin} contains no resource types");
    }
    Ok(catalog)
}

fn validate_schema_version(found: &str, pinned: &str) -> Result<()> {
    if found != pinned {
        bail!("schema_version '{found}' does not match the catalog schema ('{pinned}')");
    }
    if found != CATALOG_SCHEMA_VERSION {
        bail!("schema_version '{found}' is not supported (expected '{CATALOG_SCHEMA_VERSION}')");
    }
    Ok(())
}

fn validate_catalog_key(key: &CatalogKey) -> Result<()> {
    if key.0.is_empty() {
        bail!("catalog key must not be empty");
    }

    if !key
        .0
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        bail!("catalog key must match ^[A-Za-z0-9_.-]+$, got {}", key.0);
    }

    Ok(())
}

/// Prefer a schema shipped beside the catalog (`<root>/catalog/x.json` pairs
/// with `<root>/schema/...`); otherwise the embedded copy is used.
fn resolve_catalog_schema_path(catalog_path: &Path) -> Option<PathBuf> {
    let base = catalog_path.parent().and_then(|p| p.parent())?;
    let candidate = base.join(CATALOG_SCHEMA_FILE);
    candidate.is_file().then_some(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(extra: Value) -> String {
        let mut doc = json!({
            "schema_version": CATALOG_SCHEMA_VERSION,
            "key": "unit_catalog",
            "resource_types": [
                {
                    "display": "widgets",
                    "endpoint": {"url": "/providers/Microsoft.Example/widgets", "api_version": "2021-01-01"}
                }
            ]
        });
        if let (Some(target), Value::Object(fields)) = (doc.as_object_mut(), extra) {
            target.extend(fields);
        }
        doc.to_string()
    }

    #[test]
    fn accepts_minimal_catalog() {
        let catalog = parse_catalog(&document(json!({}))).unwrap();
        assert_eq!(catalog.key.0, "unit_catalog");
        assert_eq!(catalog.entry_count(), 1);
    }

    #[test]
    fn rejects_unknown_schema_version() {
        let err = parse_catalog(&document(json!({"schema_version": "resource_catalog_v0"})))
            .unwrap_err();
        assert!(format!("{err:#}").contains("schema"), "{err:#}");
    }

    #[test]
    fn rejects_bad_key_and_empty_catalog() {
        assert!(parse_catalog(&document(json!({"key": "has space"}))).is_err());
        assert!(parse_catalog(&document(json!({"resource_types": []}))).is_err());
    }

    #[test]
    fn rejects_unknown_mutation_verb() {
        let doc = document(json!({
            "resource_types": [{
                "display": "widgets",
                "endpoint": {"url": "/providers/Microsoft.Example/widgets"},
                "mutations": {"OPTIONS": {"url": "/providers/Microsoft.Example/widgets"}}
            }]
        }));
        assert!(parse_catalog(&doc).is_err());
    }
}
