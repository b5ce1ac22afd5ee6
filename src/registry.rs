//! Immutable forest of resource type nodes, indexed for matching.
//!
//! The registry is built once from a validated [`ResourceCatalog`] and never
//! mutated afterwards, so it can be shared by reference across threads. Nodes
//! live in an arena addressed by [`NodeId`]; roots are bucketed by their
//! lowercased first literal segment, and scope-rooted templates (`/{scope}/...`)
//! are kept in a separate fallback list that the matcher only consults when no
//! literal-rooted root produces a match.
//!
//! Construction rejects entries the matcher cannot reason about (bad
//! templates, unknown verbs, edges whose template does not extend the parent's)
//! and records softer catalog defects as lint findings instead.

use crate::catalog::{
    CatalogKey, EdgeKind, EndpointEntry, NodeId, ResourceCatalog, ResourceTypeEntry, Verb,
    load_catalog,
};
use crate::template::{ApiVersion, Endpoint, Segment, ShapeKey, Template};
use anyhow::{Context, Result, bail};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

#[derive(Debug)]
/// One catalog entry with its endpoints resolved and its edges as arena ids.
pub struct ResourceTypeNode {
    id: NodeId,
    display: String,
    read: Option<Endpoint>,
    mutations: BTreeMap<Verb, Endpoint>,
    fixed_content: Option<String>,
    children: Vec<NodeId>,
    sub_resources: Vec<NodeId>,
    parent: Option<NodeId>,
    edge: EdgeKind,
    shape: Option<Template>,
    shape_key: Option<ShapeKey>,
    location: String,
}

impl ResourceTypeNode {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn read_endpoint(&self) -> Option<&Endpoint> {
        self.read.as_ref()
    }

    pub fn mutation(&self, verb: Verb) -> Option<&Endpoint> {
        self.mutations.get(&verb)
    }

    /// Mutation endpoints in offer order (`PUT`, `PATCH`, `DELETE`).
    pub fn mutations(&self) -> impl Iterator<Item = (Verb, &Endpoint)> {
        self.mutations.iter().map(|(verb, endpoint)| (*verb, endpoint))
    }

    pub fn fixed_content(&self) -> Option<&str> {
        self.fixed_content.as_deref()
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn sub_resources(&self) -> &[NodeId] {
        &self.sub_resources
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn edge(&self) -> EdgeKind {
        self.edge
    }

    /// Template the node is matched by: the read template, or the first
    /// mutation template for write-only entries. `None` for groupings.
    pub fn template(&self) -> Option<&Template> {
        self.shape.as_ref()
    }

    pub fn shape_key(&self) -> Option<&ShapeKey> {
        self.shape_key.as_ref()
    }

    pub fn api_version(&self) -> Option<&ApiVersion> {
        self.read.as_ref().map(Endpoint::api_version)
    }

    /// Pure navigation grouping: no endpoint of any kind.
    pub fn is_grouping(&self) -> bool {
        self.shape.is_none()
    }

    /// Position of the entry in the catalog, e.g. `resource_types[2].children[0]`.
    pub fn location(&self) -> &str {
        &self.location
    }
}

#[derive(Debug)]
/// The full node forest plus its lookup indexes.
pub struct TemplateRegistry {
    key: CatalogKey,
    nodes: Vec<ResourceTypeNode>,
    roots: Vec<NodeId>,
    by_root_key: BTreeMap<String, Vec<NodeId>>,
    fallback: Vec<NodeId>,
    findings: Vec<String>,
}

impl TemplateRegistry {
    /// Load a catalog from disk (schema-checked) and build the registry.
    pub fn load(path: &Path) -> Result<Self> {
        let catalog = load_catalog(path)?;
        Self::from_catalog(&catalog)
            .with_context(|| format!("building registry from {}", path.display()))
    }

    pub fn from_catalog(catalog: &ResourceCatalog) -> Result<Self> {
        let mut builder = RegistryBuilder::default();
        let mut roots = Vec::with_capacity(catalog.resource_types.len());
        for (idx, entry) in catalog.resource_types.iter().enumerate() {
            let location = format!("resource_types[{idx}]");
            roots.push(builder.insert(entry, None, EdgeKind::Root, location)?);
        }
        builder.lint_duplicates(&roots, "resource_types");

        let mut by_root_key: BTreeMap<String, Vec<NodeId>> = BTreeMap::new();
        let mut fallback = Vec::new();
        for &root in &roots {
            let (keys, scoped) = builder.root_keys(root);
            if keys.is_empty() && !scoped {
                let node = &builder.nodes[root.0];
                builder.findings.push(format!(
                    "{}: grouping '{}' has no endpoint-bearing descendants and is unreachable",
                    node.location, node.display
                ));
            }
            for key in keys {
                by_root_key.entry(key).or_default().push(root);
            }
            if scoped {
                fallback.push(root);
            }
        }

        for finding in &builder.findings {
            tracing::warn!(catalog = %catalog.key.0, "{finding}");
        }
        tracing::debug!(
            catalog = %catalog.key.0,
            nodes = builder.nodes.len(),
            roots = roots.len(),
            root_keys = by_root_key.len(),
            fallback = fallback.len(),
            "template registry built"
        );

        Ok(Self {
            key: catalog.key.clone(),
            nodes: builder.nodes,
            roots,
            by_root_key,
            fallback,
            findings: builder.findings,
        })
    }

    pub fn key(&self) -> &CatalogKey {
        &self.key
    }

    /// Resolve a node id produced by this registry.
    ///
    /// Panics on ids from another registry; ids never outlive the registry
    /// that issued them in normal use.
    pub fn node(&self, id: NodeId) -> &ResourceTypeNode {
        &self.nodes[id.0]
    }

    /// Every node in catalog (depth-first) order.
    pub fn nodes(&self) -> impl Iterator<Item = &ResourceTypeNode> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Literal-rooted roots whose first segment is `first_segment`
    /// (compared lowercased), in catalog order.
    pub fn candidates_for(&self, first_segment: &str) -> &[NodeId] {
        self.by_root_key
            .get(&first_segment.to_ascii_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Scope-rooted roots, tried only after every literal-rooted candidate.
    pub fn fallback(&self) -> &[NodeId] {
        &self.fallback
    }

    /// Catalog defects that did not prevent construction.
    pub fn lint(&self) -> &[String] {
        &self.findings
    }

    /// Nodes whose matching template is exactly `url`.
    pub fn nodes_with_template<'a>(
        &'a self,
        url: &'a str,
    ) -> impl Iterator<Item = &'a ResourceTypeNode> {
        self.nodes
            .iter()
            .filter(move |node| node.template().is_some_and(|t| t.as_str() == url))
    }

    /// Chain of ids from the root down to `id`, inclusive.
    pub fn lineage(&self, id: NodeId) -> Vec<NodeId> {
        let mut chain = vec![id];
        let mut current = self.node(id).parent;
        while let Some(parent) = current {
            chain.push(parent);
            current = self.node(parent).parent;
        }
        chain.reverse();
        chain
    }
}

#[derive(Default)]
struct RegistryBuilder {
    nodes: Vec<ResourceTypeNode>,
    findings: Vec<String>,
}

impl RegistryBuilder {
    fn insert(
        &mut self,
        entry: &ResourceTypeEntry,
        parent: Option<NodeId>,
        edge: EdgeKind,
        location: String,
    ) -> Result<NodeId> {
        let read_verb = entry.verb.unwrap_or(Verb::Get);
        if !matches!(read_verb, Verb::Get | Verb::Post) {
            bail!("{location}: read verb must be GET or POST, got {read_verb}");
        }

        let read = entry
            .endpoint
            .as_ref()
            .map(|e| build_endpoint(e, read_verb))
            .transpose()
            .with_context(|| format!("{location}: read endpoint"))?;

        let mut mutations = BTreeMap::new();
        for (verb, declared) in &entry.mutations {
            if !verb.is_mutation() {
                bail!("{location}: '{verb}' is not a mutation verb (expected PUT|PATCH|DELETE)");
            }
            let endpoint = build_endpoint(declared, *verb)
                .with_context(|| format!("{location}: {verb} endpoint"))?;
            mutations.insert(*verb, endpoint);
        }

        let shape = read
            .as_ref()
            .or_else(|| mutations.values().next())
            .map(|endpoint| endpoint.template().clone());

        if let (Some(own), Some(ancestor)) = (shape.as_ref(), self.nearest_template(parent)) {
            if !own.extends(ancestor) {
                bail!(
                    "{location}: template {} does not extend parent template {}",
                    own,
                    ancestor
                );
            }
        }

        let parent_template = parent.and_then(|p| self.nodes[p.0].shape.clone());
        if let (Some(own), Some(parent_template)) = (shape.as_ref(), parent_template.as_ref()) {
            self.lint_edge(&location, edge, own, parent_template);
        }
        if let Some(read) = read.as_ref() {
            self.lint_arity(&location, &entry.display, read, &mutations);
        }

        let id = NodeId(self.nodes.len());
        self.nodes.push(ResourceTypeNode {
            id,
            display: entry.display.clone(),
            shape_key: shape.as_ref().map(Template::shape),
            shape,
            read,
            mutations,
            fixed_content: entry.fixed_content.clone(),
            children: Vec::new(),
            sub_resources: Vec::new(),
            parent,
            edge,
            location: location.clone(),
        });

        let mut children = Vec::with_capacity(entry.children.len());
        for (idx, child) in entry.children.iter().enumerate() {
            let child_location = format!("{location}.children[{idx}]");
            children.push(self.insert(child, Some(id), EdgeKind::Child, child_location)?);
        }
        let mut sub_resources = Vec::with_capacity(entry.sub_resources.len());
        for (idx, sub) in entry.sub_resources.iter().enumerate() {
            let sub_location = format!("{location}.sub_resources[{idx}]");
            sub_resources.push(self.insert(sub, Some(id), EdgeKind::SubResource, sub_location)?);
        }

        self.lint_duplicates(&children, &format!("{location}.children"));
        self.lint_duplicates(&sub_resources, &format!("{location}.sub_resources"));

        let node = &mut self.nodes[id.0];
        node.children = children;
        node.sub_resources = sub_resources;
        Ok(id)
    }

    fn nearest_template(&self, mut current: Option<NodeId>) -> Option<&Template> {
        while let Some(id) = current {
            let node = &self.nodes[id.0];
            if let Some(template) = node.shape.as_ref() {
                return Some(template);
            }
            current = node.parent;
        }
        None
    }

    fn lint_edge(&mut self, location: &str, edge: EdgeKind, own: &Template, parent: &Template) {
        let tail = own.tail(parent.len());
        let problem = match edge {
            EdgeKind::Child if tail.is_empty() => Some("child edge adds no segments"),
            EdgeKind::Child if tail.iter().any(Segment::is_parameter) => {
                Some("child edge adds a parameter segment; it should only add literals")
            }
            EdgeKind::SubResource => match tail.split_first() {
                Some((first, rest))
                    if first.is_parameter() && !rest.iter().any(Segment::is_parameter) =>
                {
                    None
                }
                _ => Some("sub-resource edge should add exactly one leading parameter segment"),
            },
            _ => None,
        };
        if let Some(problem) = problem {
            self.findings.push(format!(
                "{location}: {problem} ({} under {})",
                own, parent
            ));
        }
    }

    fn lint_arity(
        &mut self,
        location: &str,
        display: &str,
        read: &Endpoint,
        mutations: &BTreeMap<Verb, Endpoint>,
    ) {
        for (verb, endpoint) in mutations {
            if endpoint.arity() != read.arity() {
                self.findings.push(format!(
                    "{location}: inconsistent template for '{display}': {verb} {} takes {} parameter(s), read {} takes {}",
                    endpoint.template(),
                    endpoint.arity(),
                    read.template(),
                    read.arity()
                ));
            }
        }
    }

    fn lint_duplicates(&mut self, siblings: &[NodeId], location: &str) {
        let mut seen: BTreeSet<(&ShapeKey, &str)> = BTreeSet::new();
        let mut duplicates = Vec::new();
        for id in siblings {
            let node = &self.nodes[id.0];
            let (Some(shape), Some(read)) = (node.shape_key.as_ref(), node.read.as_ref()) else {
                continue;
            };
            if !seen.insert((shape, read.api_version().as_str())) {
                duplicates.push(format!(
                    "{location}: duplicate entry for {} at api-version '{}'",
                    read.template(),
                    read.api_version()
                ));
            }
        }
        self.findings.extend(duplicates);
    }

    /// Bucket keys for a root: its own first literal, or for groupings the
    /// keys of the nearest endpoint-bearing descendants. The flag reports
    /// whether the root (or such a descendant) is scope-rooted.
    fn root_keys(&self, root: NodeId) -> (BTreeSet<String>, bool) {
        let mut keys = BTreeSet::new();
        let mut scoped = false;
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id.0];
            match node.shape.as_ref() {
                Some(template) if template.is_scope_rooted() => scoped = true,
                Some(template) => keys.extend(template.root_key()),
                None => {
                    stack.extend(node.children.iter().copied());
                    stack.extend(node.sub_resources.iter().copied());
                }
            }
        }
        (keys, scoped)
    }
}

fn build_endpoint(entry: &EndpointEntry, verb: Verb) -> Result<Endpoint> {
    Ok(Endpoint::new(&entry.url, ApiVersion::new(entry.api_version.as_str()), verb)?)
}
