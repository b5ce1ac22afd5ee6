//! Segment-level tokenization of template URLs and concrete identifiers.
//!
//! Both sides are split on `/` after dropping one leading and one trailing
//! slash. Template segments are classified as literals or `{name}` parameters;
//! concrete segments are kept verbatim because resource names are
//! case-sensitive. Only provider namespaces (the literal after `providers`)
//! compare case-insensitively by default.

use crate::error::NavigationError;
use std::fmt;
use thiserror::Error;

const PROVIDERS_LITERAL: &str = "providers";

/// How literal template segments compare against concrete segments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LiteralCase {
    /// Only provider-namespace literals ignore ASCII case.
    #[default]
    NamespaceOnly,
    /// Every literal ignores ASCII case.
    All,
}

impl LiteralCase {
    pub fn as_str(self) -> &'static str {
        match self {
            LiteralCase::NamespaceOnly => "namespace",
            LiteralCase::All => "all",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "namespace" | "namespace-only" => Some(LiteralCase::NamespaceOnly),
            "all" => Some(LiteralCase::All),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal {
    value: String,
    namespace: bool,
}

impl Literal {
    pub fn value(&self) -> &str {
        &self.value
    }

    /// True when the literal sits directly after a `providers` segment.
    pub fn is_namespace(&self) -> bool {
        self.namespace
    }

    pub fn matches(&self, concrete: &str, case: LiteralCase) -> bool {
        if self.namespace || case == LiteralCase::All {
            self.value.eq_ignore_ascii_case(concrete)
        } else {
            self.value == concrete
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(Literal),
    Parameter(String),
}

impl Segment {
    pub fn is_parameter(&self) -> bool {
        matches!(self, Segment::Parameter(_))
    }

    fn shape(&self) -> ShapeSegment {
        match self {
            Segment::Literal(lit) if lit.namespace => {
                ShapeSegment::Literal(lit.value.to_ascii_lowercase())
            }
            Segment::Literal(lit) => ShapeSegment::Literal(lit.value.clone()),
            Segment::Parameter(_) => ShapeSegment::Parameter,
        }
    }
}

/// Segment kind with parameter names erased; two templates with equal shapes
/// address the same logical resource type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ShapeSegment {
    Literal(String),
    Parameter,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShapeKey(Vec<ShapeSegment>);

impl ShapeKey {
    pub fn segments(&self) -> &[ShapeSegment] {
        &self.0
    }

    pub fn starts_with(&self, prefix: &ShapeKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for ShapeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.0 {
            match segment {
                ShapeSegment::Literal(value) => write!(f, "/{value}")?,
                ShapeSegment::Parameter => write!(f, "/{{}}")?,
            }
        }
        Ok(())
    }
}

/// Binding failed because the value count does not match the parameter count.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("template {template} takes {expected} value(s), {provided} provided")]
pub struct ArityMismatch {
    pub template: String,
    pub expected: usize,
    pub provided: usize,
}

/// Tokenized URL template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    raw: String,
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(url: &str) -> Result<Self, NavigationError> {
        let parts = split_segments(url)?;
        if parts.is_empty() {
            return Err(NavigationError::malformed(url, "template has no segments"));
        }

        let mut segments: Vec<Segment> = Vec::with_capacity(parts.len());
        for part in parts {
            let segment = classify(url, part, segments.last())?;
            segments.push(segment);
        }

        Ok(Self {
            raw: url.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn parameter_count(&self) -> usize {
        self.segments.iter().filter(|s| s.is_parameter()).count()
    }

    pub fn parameter_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Parameter(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Scope-rooted templates start with a parameter (`{scope}`, `{resourceUri}`).
    pub fn is_scope_rooted(&self) -> bool {
        self.segments.first().is_some_and(Segment::is_parameter)
    }

    /// Lowercased first literal, used as the registry bucket key.
    pub fn root_key(&self) -> Option<String> {
        match self.segments.first() {
            Some(Segment::Literal(lit)) => Some(lit.value.to_ascii_lowercase()),
            _ => None,
        }
    }

    pub fn shape(&self) -> ShapeKey {
        ShapeKey(self.segments.iter().map(Segment::shape).collect())
    }

    /// True when `parent` is a prefix of this template: same segment kinds in
    /// the same positions, literals equal under the default case policy (only
    /// provider namespaces fold). Parameter names may differ between parent and
    /// child entries.
    pub fn extends(&self, parent: &Template) -> bool {
        if parent.len() > self.len() {
            return false;
        }
        self.segments
            .iter()
            .zip(&parent.segments)
            .all(|pair| match pair {
                (Segment::Literal(own), Segment::Literal(theirs)) => {
                    own.matches(&theirs.value, LiteralCase::NamespaceOnly)
                }
                (Segment::Parameter(_), Segment::Parameter(_)) => true,
                _ => false,
            })
    }

    /// Segments beyond the first `parent_len`, i.e. what an edge adds.
    pub fn tail(&self, parent_len: usize) -> &[Segment] {
        self.segments.get(parent_len..).unwrap_or(&[])
    }

    /// Substitute `values` into the parameter segments, in order.
    pub fn bind(&self, values: &[String]) -> Result<String, ArityMismatch> {
        let expected = self.parameter_count();
        if expected != values.len() {
            return Err(ArityMismatch {
                template: self.raw.clone(),
                expected,
                provided: values.len(),
            });
        }

        let mut url = String::new();
        let mut next = values.iter();
        for segment in &self.segments {
            url.push('/');
            match segment {
                Segment::Literal(lit) => url.push_str(&lit.value),
                Segment::Parameter(_) => {
                    if let Some(value) = next.next() {
                        url.push_str(value);
                    }
                }
            }
        }
        Ok(url)
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Tokenized concrete identifier (no placeholders, query string dropped).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcretePath {
    raw: String,
    segments: Vec<String>,
}

impl ConcretePath {
    pub fn parse(raw: &str) -> Result<Self, NavigationError> {
        let path = raw.split_once('?').map_or(raw, |(path, _query)| path);
        let parts = split_segments(path)?;
        if let Some(part) = parts.iter().find(|p| p.contains(['{', '}'])) {
            return Err(NavigationError::malformed(
                raw,
                format!("segment '{part}' contains template syntax"),
            ));
        }

        Ok(Self {
            raw: raw.to_string(),
            segments: parts.into_iter().map(str::to_string).collect(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

fn split_segments(raw: &str) -> Result<Vec<&str>, NavigationError> {
    let trimmed = raw.strip_prefix('/').unwrap_or(raw);
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let parts: Vec<&str> = trimmed.split('/').collect();
    if let Some(idx) = parts.iter().position(|p| p.is_empty()) {
        return Err(NavigationError::malformed(
            raw,
            format!("empty segment at position {idx}"),
        ));
    }
    Ok(parts)
}

fn classify(url: &str, part: &str, previous: Option<&Segment>) -> Result<Segment, NavigationError> {
    if let Some(name) = part.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
        if name.is_empty() {
            return Err(NavigationError::malformed(url, "parameter segment has no name"));
        }
        if name.contains(['{', '}']) {
            return Err(NavigationError::malformed(
                url,
                format!("segment '{part}' mixes literal and parameter syntax"),
            ));
        }
        return Ok(Segment::Parameter(name.to_string()));
    }

    if part.contains(['{', '}']) {
        return Err(NavigationError::malformed(
            url,
            format!("segment '{part}' mixes literal and parameter syntax"),
        ));
    }

    let namespace = matches!(
        previous,
        Some(Segment::Literal(prev)) if prev.value.eq_ignore_ascii_case(PROVIDERS_LITERAL)
    );
    Ok(Segment::Literal(Literal {
        value: part.to_string(),
        namespace,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_literals_parameters_and_namespaces() {
        let template = Template::parse(
            "/subscriptions/{subscriptionId}/providers/Microsoft.Web/sites/{name}/",
        )
        .unwrap();
        assert_eq!(template.len(), 6);
        assert_eq!(template.parameter_count(), 2);
        assert_eq!(
            template.parameter_names().collect::<Vec<_>>(),
            vec!["subscriptionId", "name"]
        );
        let Segment::Literal(ns) = &template.segments()[3] else {
            panic!("expected namespace literal");
        };
        assert!(ns.is_namespace());
        assert!(ns.matches("microsoft.web", LiteralCase::NamespaceOnly));
        let Segment::Literal(sites) = &template.segments()[4] else {
            panic!("expected literal");
        };
        assert!(!sites.is_namespace());
        assert!(!sites.matches("SITES", LiteralCase::NamespaceOnly));
        assert!(sites.matches("SITES", LiteralCase::All));
        assert_eq!(template.root_key().as_deref(), Some("subscriptions"));
    }

    #[test]
    fn rejects_mixed_and_empty_template_segments() {
        for bad in [
            "/datasources('{name}')",
            "/widgets/{a}{b}",
            "/widgets/{}",
            "/widgets/na}me",
            "/widgets//parts",
            "/",
        ] {
            let err = Template::parse(bad).unwrap_err();
            assert!(
                matches!(err, NavigationError::MalformedPath { .. }),
                "{bad} should be malformed, got {err:?}"
            );
        }
    }

    #[test]
    fn concrete_paths_drop_query_and_outer_slashes() {
        let path = ConcretePath::parse("/providers/Microsoft.Example/widgets/abc/?api-version=1")
            .unwrap();
        assert_eq!(
            path.segments(),
            &["providers", "Microsoft.Example", "widgets", "abc"]
        );
        assert!(ConcretePath::parse("/").unwrap().is_empty());
        assert!(ConcretePath::parse("").unwrap().is_empty());
    }

    #[test]
    fn concrete_paths_reject_empty_segments_and_placeholders() {
        assert!(matches!(
            ConcretePath::parse("//widgets"),
            Err(NavigationError::MalformedPath { .. })
        ));
        assert!(matches!(
            ConcretePath::parse("/widgets//parts"),
            Err(NavigationError::MalformedPath { .. })
        ));
        assert!(matches!(
            ConcretePath::parse("/widgets/{id}"),
            Err(NavigationError::MalformedPath { .. })
        ));
    }

    #[test]
    fn shapes_ignore_parameter_names_and_namespace_case() {
        let a = Template::parse("/providers/Microsoft.Example/widgets/{widgetName}").unwrap();
        let b = Template::parse("/providers/microsoft.example/widgets/{name}").unwrap();
        let c = Template::parse("/providers/Microsoft.Example/Widgets/{name}").unwrap();
        assert_eq!(a.shape(), b.shape());
        assert_ne!(a.shape(), c.shape());
        assert_eq!(a.shape().to_string(), "/providers/microsoft.example/widgets/{}");

        let parent = Template::parse("/providers/Microsoft.Example/widgets").unwrap();
        assert!(a.shape().starts_with(&parent.shape()));
        assert!(b.extends(&parent));
        assert!(!c.extends(&parent));
        assert!(!parent.extends(&a));
        assert_eq!(a.tail(parent.len()).len(), 1);

        let unrelated = Template::parse("/subscriptions/{subscriptionId}").unwrap();
        assert!(!a.extends(&unrelated));
    }

    #[test]
    fn bind_requires_exact_arity() {
        let template =
            Template::parse("/{scope}/providers/Microsoft.Insights/diagnosticSettings/{name}")
                .unwrap();
        let url = template
            .bind(&["subscriptions/s1".to_string(), "audit".to_string()])
            .unwrap();
        assert_eq!(
            url,
            "/subscriptions/s1/providers/Microsoft.Insights/diagnosticSettings/audit"
        );

        let err = template.bind(&["only-one".to_string()]).unwrap_err();
        assert_eq!(err.expected, 2);
        assert_eq!(err.provided, 1);
    }
}
