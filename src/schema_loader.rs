//! JSON Schema loading for catalog documents.
//!
//! Schemas are read from disk when a copy sits next to the catalog and fall
//! back to the copy compiled into the crate, so an installed binary can still
//! validate catalogs. The `schema_version` const inside the schema is
//! extracted so callers can cross-check it against the document.

use anyhow::{Context, Result, anyhow, bail};
use jsonschema::JSONSchema;
use serde_json::Value;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

const SCHEMA_VERSION_POINTER: &str = "/properties/schema_version/const";

/// Result of loading and compiling a JSON Schema.
pub(crate) struct SchemaLoadResult {
    pub schema_version: String,
    pub compiled: JSONSchema,
}

impl SchemaLoadResult {
    /// Validate `instance`, collecting every violation into one message.
    pub fn check(&self, instance: &Value, origin: &str) -> Result<()> {
        if let Err(errors) = self.compiled.validate(instance) {
            let details = errors
                .map(|err| format!("{}: {err}", err.instance_path))
                .collect::<Vec<_>>()
                .join("\n");
            bail!("{origin} failed schema validation:\n{details}");
        }
        Ok(())
    }
}

pub(crate) fn load_json_schema(path: &Path) -> Result<SchemaLoadResult> {
    let file = File::open(path).with_context(|| format!("opening schema {}", path.display()))?;
    let schema: Value = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing schema {}", path.display()))?;
    compile_schema(&schema, &path.display().to_string())
}

pub(crate) fn load_embedded_schema(raw: &str) -> Result<SchemaLoadResult> {
    let schema: Value = serde_json::from_str(raw).context("parsing embedded catalog schema")?;
    compile_schema(&schema, "embedded catalog schema")
}

fn compile_schema(schema: &Value, origin: &str) -> Result<SchemaLoadResult> {
    let schema_version = schema
        .pointer(SCHEMA_VERSION_POINTER)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            anyhow!("{origin} does not pin schema_version at {SCHEMA_VERSION_POINTER}")
        })?;

    // ValidationError borrows the schema, so flatten it before it escapes.
    let compiled = JSONSchema::compile(schema)
        .map_err(|err| anyhow!("compiling {origin}: {err}"))?;

    Ok(SchemaLoadResult {
        schema_version,
        compiled,
    })
}
