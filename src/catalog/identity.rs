use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Key naming a catalog snapshot (e.g., `arm_sample_v1`).
///
/// Reported alongside match output so consumers know which catalog produced a
/// resolution.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogKey(pub String);

/// Index of a node inside a registry's arena.
///
/// Only meaningful for the registry that produced it.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
#[serde(transparent)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// HTTP verb attached to an endpoint.
///
/// Declaration order is the order actions are offered in.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Verb {
    Get,
    Put,
    Patch,
    Delete,
    Post,
}

/// How a node was reached from its parent.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Root,
    /// Sibling action or fixed view; no identifier segment consumed.
    Child,
    /// Collection item; exactly one identifier segment consumed.
    SubResource,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Put => "PUT",
            Verb::Patch => "PATCH",
            Verb::Delete => "DELETE",
            Verb::Post => "POST",
        }
    }

    /// Verbs a catalog may list under `mutations`.
    pub fn is_mutation(&self) -> bool {
        matches!(self, Verb::Put | Verb::Patch | Verb::Delete)
    }

    fn from_str(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "GET" => Some(Verb::Get),
            "PUT" => Some(Verb::Put),
            "PATCH" => Some(Verb::Patch),
            "DELETE" => Some(Verb::Delete),
            "POST" => Some(Verb::Post),
            _ => None,
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Verb {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Verb {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::from_str(&value).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "unknown verb '{value}' (expected GET|PUT|PATCH|DELETE|POST)"
            ))
        })
    }
}
