//! Runtime configuration read from the environment.
//!
//! Catalog discovery follows a fixed order: `ARMTRAIL_CATALOG` if it names a
//! readable file, then `catalog/resource_types.json` in the nearest ancestor
//! of the running executable, then the checkout recorded at build time in
//! `ARMTRAIL_ROOT_HINT`. Command-line flags override all of these.

use crate::template::LiteralCase;
use anyhow::{Result, bail};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const CATALOG_ENV: &str = "ARMTRAIL_CATALOG";
pub const LITERAL_CASE_ENV: &str = "ARMTRAIL_LITERAL_CASE";
pub const LOG_ENV: &str = "ARMTRAIL_LOG";
pub const DEFAULT_LOG_FILTER: &str = "armtrail=info";
const CATALOG_RELATIVE: &str = "catalog/resource_types.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigatorConfig {
    /// `None` when no catalog could be located; the caller decides whether
    /// that is fatal.
    pub catalog_path: Option<PathBuf>,
    pub literal_case: LiteralCase,
    pub log_filter: String,
}

impl NavigatorConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source. `RUST_LOG` is consulted when
    /// `ARMTRAIL_LOG` is unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let literal_case = match lookup(LITERAL_CASE_ENV).filter(|v| !v.trim().is_empty()) {
            Some(raw) => match LiteralCase::parse(&raw) {
                Some(case) => case,
                None => bail!("{LITERAL_CASE_ENV} must be 'namespace' or 'all', got '{raw}'"),
            },
            None => LiteralCase::default(),
        };

        let log_filter = lookup(LOG_ENV)
            .or_else(|| lookup("RUST_LOG"))
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        let catalog_path = lookup(CATALOG_ENV)
            .and_then(|raw| catalog_from_hint(&raw))
            .or_else(catalog_near_executable)
            .or_else(|| option_env!("ARMTRAIL_ROOT_HINT").and_then(catalog_under_root));

        Ok(Self {
            catalog_path,
            literal_case,
            log_filter,
        })
    }

    /// The catalog path, or an error naming the variable to set.
    pub fn require_catalog(&self) -> Result<&Path> {
        match self.catalog_path.as_deref() {
            Some(path) => Ok(path),
            None => bail!(
                "Unable to locate a resource catalog. Set {CATALOG_ENV} or pass --catalog."
            ),
        }
    }
}

fn catalog_from_hint(hint: &str) -> Option<PathBuf> {
    let trimmed = hint.trim();
    if trimmed.is_empty() {
        return None;
    }
    let path = PathBuf::from(trimmed);
    if !path.is_file() {
        return None;
    }
    fs::canonicalize(path).ok()
}

fn catalog_under_root(root: &str) -> Option<PathBuf> {
    let candidate = Path::new(root).join(CATALOG_RELATIVE);
    candidate.is_file().then_some(candidate)
}

fn catalog_near_executable() -> Option<PathBuf> {
    let exe = env::current_exe().ok()?;
    search_upwards(exe.parent()?)
}

fn search_upwards(start: &Path) -> Option<PathBuf> {
    let mut dir = fs::canonicalize(start).ok()?;
    loop {
        let candidate = dir.join(CATALOG_RELATIVE);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !dir.pop() {
            return None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = NavigatorConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.literal_case, LiteralCase::NamespaceOnly);
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
    }

    #[test]
    fn explicit_catalog_and_policy_are_honoured() {
        let dir = TempDir::new().unwrap();
        let catalog = dir.path().join("catalog.json");
        fs::write(&catalog, "{}").unwrap();
        let config = NavigatorConfig::from_lookup(lookup(&[
            (CATALOG_ENV, catalog.to_str().unwrap()),
            (LITERAL_CASE_ENV, "ALL"),
            ("RUST_LOG", "armtrail=debug"),
        ]))
        .unwrap();
        assert_eq!(
            config.require_catalog().unwrap(),
            fs::canonicalize(&catalog).unwrap()
        );
        assert_eq!(config.literal_case, LiteralCase::All);
        assert_eq!(config.log_filter, "armtrail=debug");
    }

    #[test]
    fn rejects_unknown_literal_case() {
        let err = NavigatorConfig::from_lookup(lookup(&[(LITERAL_CASE_ENV, "loose")])).unwrap_err();
        assert!(err.to_string().contains(LITERAL_CASE_ENV));
    }

    #[test]
    fn search_upwards_finds_catalog_in_ancestor() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("target").join("debug");
        fs::create_dir_all(&nested).unwrap();
        fs::create_dir_all(dir.path().join("catalog")).unwrap();
        fs::write(dir.path().join(CATALOG_RELATIVE), "{}").unwrap();
        let found = search_upwards(&nested).unwrap();
        assert_eq!(found, fs::canonicalize(dir.path()).unwrap().join(CATALOG_RELATIVE));
    }
}
