use anyhow::{Context, Result};
use armtrail::{CATALOG_SCHEMA_VERSION, TemplateRegistry, parse_catalog};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

pub fn repo_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

pub fn sample_catalog_path() -> PathBuf {
    repo_root().join("catalog").join("resource_types.json")
}

pub fn sample_registry() -> Result<TemplateRegistry> {
    TemplateRegistry::load(&sample_catalog_path())
}

/// Wrap `resource_types` in a minimal catalog document.
pub fn catalog_doc(resource_types: Value) -> Value {
    json!({
        "schema_version": CATALOG_SCHEMA_VERSION,
        "key": "suite_catalog",
        "resource_types": resource_types,
    })
}

/// Build a registry from an in-memory synthetic catalog.
pub fn registry_from(resource_types: Value) -> Result<TemplateRegistry> {
    let catalog = parse_catalog(&catalog_doc(resource_types).to_string())?;
    TemplateRegistry::from_catalog(&catalog)
}

/// Write `doc` under `<dir>/catalog/resource_types.json`.
pub fn write_catalog(dir: &TempDir, doc: &Value) -> Result<PathBuf> {
    let catalog_dir = dir.path().join("catalog");
    std::fs::create_dir_all(&catalog_dir)?;
    let path = catalog_dir.join("resource_types.json");
    std::fs::write(&path, serde_json::to_vec_pretty(doc)?)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

/// Run the `armtrail` binary against `catalog`; the exit status is left to
/// the caller.
pub fn run_armtrail(catalog: &Path, args: &[&str]) -> Result<Output> {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_armtrail"));
    cmd.arg("--catalog")
        .arg(catalog)
        .args(args)
        .env("ARMTRAIL_LOG", "armtrail=warn")
        .env_remove("RUST_LOG")
        .env_remove("ARMTRAIL_LITERAL_CASE");
    cmd.output()
        .with_context(|| format!("failed to run command: {:?}", cmd))
}

pub fn stdout_json(output: &Output) -> Result<Value> {
    serde_json::from_slice(&output.stdout).with_context(|| {
        format!(
            "stdout is not JSON\nstdout: {}\nstderr: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        )
    })
}
