//! Deserializable representation of `catalog/resource_types.json`.
//!
//! The types mirror the catalog schema one-to-one so the registry builder can
//! walk nested entries without ad-hoc JSON handling. Use
//! [`crate::catalog::load_catalog`] for the validated path; this module only
//! parses.

use crate::catalog::identity::{CatalogKey, Verb};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, Deserialize, Serialize)]
/// Full resource catalog as stored on disk.
pub struct ResourceCatalog {
    pub schema_version: String,
    pub key: CatalogKey,
    #[serde(default)]
    pub title: Option<String>,
    pub resource_types: Vec<ResourceTypeEntry>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
/// One resource type; children and sub-resources nest recursively.
pub struct ResourceTypeEntry {
    pub display: String,
    /// Read endpoint. Entries without one are navigation groupings.
    #[serde(default)]
    pub endpoint: Option<EndpointEntry>,
    /// Verb for the read endpoint; `GET` when omitted.
    #[serde(default)]
    pub verb: Option<Verb>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub mutations: BTreeMap<Verb, EndpointEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ResourceTypeEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_resources: Vec<ResourceTypeEntry>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
/// URL template plus the API version it is served under.
pub struct EndpointEntry {
    pub url: String,
    #[serde(default)]
    pub api_version: String,
}

impl EndpointEntry {
    pub fn new(url: impl Into<String>, api_version: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_version: api_version.into(),
        }
    }
}

impl ResourceCatalog {
    /// Total number of entries, nested ones included.
    pub fn entry_count(&self) -> usize {
        fn count(entries: &[ResourceTypeEntry]) -> usize {
            entries
                .iter()
                .map(|e| 1 + count(&e.children) + count(&e.sub_resources))
                .sum()
        }
        count(&self.resource_types)
    }
}
