//! Matching concrete resource identifiers against the template registry.
//!
//! Matching is a depth-first walk from the indexed roots. Every node template
//! spells out the full URL, so each node is aligned against the whole concrete
//! path rather than against a suffix; children and sub-resources only differ
//! in how many segments their templates add. A node whose template covers the
//! entire path and carries a read endpoint is a terminal match. All terminal
//! matches are collected and then ranked:
//!
//! - identical shapes collapse to the newest API version;
//! - across shapes the template with fewer parameters wins, then the one
//!   with more literal segments, then catalog order.
//!
//! Scope-rooted fallback templates are only walked when no literal-rooted
//! root produced a terminal match. Their leading parameter absorbs one or
//! more concrete segments, joined with `/` in the binding.

use crate::catalog::{EdgeKind, NodeId};
use crate::error::NavigationError;
use crate::registry::{ResourceTypeNode, TemplateRegistry};
use crate::template::{ApiVersion, ConcretePath, LiteralCase, Segment, ShapeKey, Template};
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchOptions {
    pub literal_case: LiteralCase,
}

/// One step of the walk from a root to the matched node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrailStep {
    pub node: NodeId,
    pub edge: EdgeKind,
}

/// A successful lookup. Borrows the registry it was produced from.
#[derive(Debug, Clone)]
pub struct MatchResult<'r> {
    node: &'r ResourceTypeNode,
    path: ConcretePath,
    values: Vec<String>,
    bindings: BTreeMap<String, String>,
    trail: Vec<TrailStep>,
    fallback: bool,
}

impl<'r> MatchResult<'r> {
    pub fn node(&self) -> &'r ResourceTypeNode {
        self.node
    }

    pub fn path(&self) -> &ConcretePath {
        &self.path
    }

    /// Bound values in read-template parameter order.
    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn bindings(&self) -> &BTreeMap<String, String> {
        &self.bindings
    }

    pub fn binding(&self, name: &str) -> Option<&str> {
        self.bindings.get(name).map(String::as_str)
    }

    pub fn trail(&self) -> &[TrailStep] {
        &self.trail
    }

    /// Number of sub-resource edges taken; children edges do not count.
    pub fn identifier_depth(&self) -> usize {
        self.trail
            .iter()
            .filter(|step| step.edge == EdgeKind::SubResource)
            .count()
    }

    pub fn is_fallback(&self) -> bool {
        self.fallback
    }

    pub fn summary(&self, registry: &TemplateRegistry) -> MatchSummary {
        MatchSummary {
            path: self.path.as_str().to_string(),
            display: self.node.display().to_string(),
            template: self
                .node
                .template()
                .map(|t| t.as_str().to_string())
                .unwrap_or_default(),
            api_version: self
                .node
                .api_version()
                .map(|v| v.as_str().to_string())
                .unwrap_or_default(),
            location: self.node.location().to_string(),
            bindings: self.bindings.clone(),
            trail: self
                .trail
                .iter()
                .map(|step| TrailEntry {
                    display: registry.node(step.node).display().to_string(),
                    edge: step.edge,
                })
                .collect(),
            identifier_depth: self.identifier_depth(),
            fallback: self.fallback,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TrailEntry {
    pub display: String,
    pub edge: EdgeKind,
}

/// JSON projection of a [`MatchResult`] for the command-line front end.
#[derive(Debug, Clone, Serialize)]
pub struct MatchSummary {
    pub path: String,
    pub display: String,
    pub template: String,
    pub api_version: String,
    pub location: String,
    pub bindings: BTreeMap<String, String>,
    pub trail: Vec<TrailEntry>,
    pub identifier_depth: usize,
    pub fallback: bool,
}

pub struct TemplateMatcher<'r> {
    registry: &'r TemplateRegistry,
    options: MatchOptions,
}

impl<'r> TemplateMatcher<'r> {
    pub fn new(registry: &'r TemplateRegistry) -> Self {
        Self::with_options(registry, MatchOptions::default())
    }

    pub fn with_options(registry: &'r TemplateRegistry, options: MatchOptions) -> Self {
        Self { registry, options }
    }

    pub fn registry(&self) -> &'r TemplateRegistry {
        self.registry
    }

    /// Tokenize `raw` and match it. Malformed input fails before any lookup.
    pub fn match_path(&self, raw: &str) -> Result<MatchResult<'r>, NavigationError> {
        let path = ConcretePath::parse(raw)?;
        self.match_concrete(&path)
    }

    pub fn match_concrete(&self, path: &ConcretePath) -> Result<MatchResult<'r>, NavigationError> {
        let Some(first) = path.segments().first() else {
            tracing::debug!(path = path.as_str(), "empty identifier");
            return Err(no_match(path, None));
        };

        let candidates = self.registry.candidates_for(first);
        let mut walk = Walk::new(self.registry, path, self.options.literal_case, 0);
        for &root in candidates {
            walk.visit(root, 0, EdgeKind::Root, &mut Vec::new());
        }
        tracing::debug!(
            path = path.as_str(),
            candidates = candidates.len(),
            terminals = walk.terminals.len(),
            "literal-rooted walk finished"
        );
        let mut deepest = walk.deepest;
        if let Some(found) = self.select(walk.terminals, path, false) {
            return Ok(found);
        }

        // Each fallback template aligns at exactly one scope length, so
        // terminals from every length are ranked together. On equal parameter
        // counts the template with more literals (shorter scope) wins.
        let mut terminals = Vec::new();
        for span in (1..=path.len()).rev() {
            let mut walk = Walk::new(self.registry, path, self.options.literal_case, span - 1);
            for &root in self.registry.fallback() {
                walk.visit(root, 0, EdgeKind::Root, &mut Vec::new());
            }
            if deepest.is_none() {
                deepest = walk.deepest;
            }
            terminals.extend(walk.terminals);
        }
        if let Some(found) = self.select(terminals, path, true) {
            tracing::debug!(
                path = path.as_str(),
                node = found.node.display(),
                scope = found.values.first().map(String::as_str).unwrap_or_default(),
                "matched via scope fallback"
            );
            return Ok(found);
        }

        Err(no_match(path, deepest.map(|d| (self.registry.node(d.node), d.consumed))))
    }

    fn select(
        &self,
        terminals: Vec<Terminal>,
        path: &ConcretePath,
        fallback: bool,
    ) -> Option<MatchResult<'r>> {
        // Same shape: keep the newest read version, first found on ties.
        let mut by_shape: BTreeMap<&ShapeKey, (usize, Terminal)> = BTreeMap::new();
        let mut shapes = 0usize;
        for terminal in terminals {
            let node = self.registry.node(terminal.node);
            let Some(shape) = node.shape_key() else {
                continue;
            };
            match by_shape.get_mut(shape) {
                Some((_, best)) => {
                    if version_of(self.registry, terminal.node)
                        > version_of(self.registry, best.node)
                    {
                        *best = terminal;
                    }
                }
                None => {
                    by_shape.insert(shape, (shapes, terminal));
                    shapes += 1;
                }
            }
        }

        if by_shape.len() > 1 {
            tracing::debug!(
                path = path.as_str(),
                shapes = by_shape.len(),
                "structurally distinct templates matched; preferring fewest parameters"
            );
        }

        let (_, winner) = by_shape.into_values().min_by_key(|(order, terminal)| {
            (terminal.parameters, Reverse(terminal.literals), *order)
        })?;
        let node = self.registry.node(winner.node);
        let bindings = node
            .template()
            .map(|t| {
                t.parameter_names()
                    .map(str::to_string)
                    .zip(winner.values.iter().cloned())
                    .collect()
            })
            .unwrap_or_default();
        Some(MatchResult {
            node,
            path: path.clone(),
            values: winner.values,
            bindings,
            trail: winner.trail,
            fallback,
        })
    }
}

fn version_of(registry: &TemplateRegistry, id: NodeId) -> Option<&ApiVersion> {
    registry.node(id).api_version()
}

fn no_match(path: &ConcretePath, deepest: Option<(&ResourceTypeNode, usize)>) -> NavigationError {
    let (deepest, remaining) = match deepest {
        Some((node, consumed)) => (
            Some(node.display().to_string()),
            path.segments()[consumed.min(path.len())..].to_vec(),
        ),
        None => (None, path.segments().to_vec()),
    };
    NavigationError::NoMatch {
        path: path.as_str().to_string(),
        deepest,
        remaining,
    }
}

struct Terminal {
    node: NodeId,
    parameters: usize,
    literals: usize,
    values: Vec<String>,
    trail: Vec<TrailStep>,
}

#[derive(Clone, Copy)]
struct Deepest {
    node: NodeId,
    consumed: usize,
}

/// One alignment pass over a set of roots with a fixed scope offset.
struct Walk<'a> {
    registry: &'a TemplateRegistry,
    path: &'a ConcretePath,
    case: LiteralCase,
    /// Extra segments absorbed by a leading scope parameter.
    offset: usize,
    terminals: Vec<Terminal>,
    deepest: Option<Deepest>,
}

impl<'a> Walk<'a> {
    fn new(
        registry: &'a TemplateRegistry,
        path: &'a ConcretePath,
        case: LiteralCase,
        offset: usize,
    ) -> Self {
        Self {
            registry,
            path,
            case,
            offset,
            terminals: Vec::new(),
            deepest: None,
        }
    }

    fn visit(&mut self, id: NodeId, inherited: usize, edge: EdgeKind, trail: &mut Vec<TrailStep>) {
        let node = self.registry.node(id);
        let consumed = match node.template() {
            Some(template) => match self.align(template) {
                Some(consumed) => consumed,
                None => return,
            },
            // Groupings add no segments of their own.
            None => inherited,
        };

        trail.push(TrailStep { node: id, edge });
        if node.template().is_some() && self.deepest.is_none_or(|d| consumed > d.consumed) {
            self.deepest = Some(Deepest { node: id, consumed });
        }

        if consumed == self.path.len() {
            if let (Some(read), Some(template)) = (node.read_endpoint(), node.template()) {
                self.terminals.push(Terminal {
                    node: id,
                    parameters: read.arity(),
                    literals: template.len() - template.parameter_count(),
                    values: self.extract(template),
                    trail: trail.clone(),
                });
            }
        } else if consumed < self.path.len() {
            for &child in node.children() {
                self.visit(child, consumed, EdgeKind::Child, trail);
            }
            for &sub in node.sub_resources() {
                self.visit(sub, consumed, EdgeKind::SubResource, trail);
            }
        }
        trail.pop();
    }

    /// Number of concrete segments the template covers, or `None` when it
    /// does not line up with the path.
    fn align(&self, template: &Template) -> Option<usize> {
        let consumed = template.len() + self.offset;
        if consumed > self.path.len() {
            return None;
        }
        if self.offset > 0 && !template.is_scope_rooted() {
            return None;
        }
        let concrete = self.path.segments();
        template
            .segments()
            .iter()
            .enumerate()
            .all(|(idx, segment)| match segment {
                Segment::Literal(literal) => {
                    literal.matches(&concrete[self.position(idx)], self.case)
                }
                Segment::Parameter(_) => true,
            })
            .then_some(consumed)
    }

    fn extract(&self, template: &Template) -> Vec<String> {
        let concrete = self.path.segments();
        template
            .segments()
            .iter()
            .enumerate()
            .filter(|(_, segment)| segment.is_parameter())
            .map(|(idx, _)| {
                if idx == 0 && self.offset > 0 {
                    concrete[..=self.offset].join("/")
                } else {
                    concrete[self.position(idx)].clone()
                }
            })
            .collect()
    }

    fn position(&self, idx: usize) -> usize {
        if idx == 0 { 0 } else { idx + self.offset }
    }
}
