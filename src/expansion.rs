//! Next navigable layer below a matched node.
//!
//! The planner only projects the static edges of the node the matcher already
//! found. Direct children are reachable with the bindings at hand, so each one
//! carries its bound path. Grouping nodes have no path of their own, so their
//! edges are lifted into the layer of the nearest node that has one.
//! Drill-downs need one more identifier segment from the caller (usually an
//! item picked from the listing of the current node) and are turned into
//! concrete paths with [`ExpansionPlanner::drill_down_path`].

use crate::catalog::{EdgeKind, NodeId};
use crate::error::NavigationError;
use crate::matcher::MatchResult;
use crate::registry::{ResourceTypeNode, TemplateRegistry};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayerEntry {
    /// Display name with known `{param}` placeholders filled in.
    pub display: String,
    pub node: NodeId,
    pub edge: EdgeKind,
    pub template: Option<String>,
    /// Concrete path of a direct child. `None` for drill-downs, fixed-content
    /// groupings and children whose template needs values the match lacks.
    pub expand_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_content: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NextLayer {
    pub direct_children: Vec<LayerEntry>,
    pub drill_downs: Vec<LayerEntry>,
}

impl NextLayer {
    pub fn is_empty(&self) -> bool {
        self.direct_children.is_empty() && self.drill_downs.is_empty()
    }
}

pub struct ExpansionPlanner<'r> {
    registry: &'r TemplateRegistry,
}

impl<'r> ExpansionPlanner<'r> {
    pub fn new(registry: &'r TemplateRegistry) -> Self {
        Self { registry }
    }

    pub fn next_layer(&self, result: &MatchResult<'_>) -> NextLayer {
        let mut layer = NextLayer::default();
        self.collect(result.node(), result, &mut layer);
        layer
    }

    /// Concrete path of the `identifier` item under a drill-down entry.
    pub fn drill_down_path(
        &self,
        result: &MatchResult<'_>,
        entry: &LayerEntry,
        identifier: &str,
    ) -> Result<String, NavigationError> {
        if identifier.is_empty() || identifier.contains(['/', '{', '}', '?']) {
            return Err(NavigationError::malformed(
                identifier,
                "identifier must be a single non-empty path segment",
            ));
        }
        let node = self.registry.node(entry.node);
        let Some(template) = node.template() else {
            return Err(NavigationError::malformed(
                &entry.display,
                "drill-down target has no endpoint",
            ));
        };
        let mut values = result.values().to_vec();
        values.push(identifier.to_string());
        template
            .bind(&values)
            .map_err(|err| NavigationError::malformed(template.as_str(), err.to_string()))
    }

    /// Groupings are transparent: their edges are listed as if declared on
    /// `node`. A grouping with fixed content keeps its own entry ahead of them.
    fn collect(&self, node: &ResourceTypeNode, result: &MatchResult<'_>, layer: &mut NextLayer) {
        for &id in node.children() {
            let child = self.registry.node(id);
            if child.is_grouping() {
                if child.fixed_content().is_some() {
                    layer
                        .direct_children
                        .push(self.entry(child, EdgeKind::Child, result.bindings()));
                }
                self.collect(child, result, layer);
                continue;
            }
            let mut entry = self.entry(child, EdgeKind::Child, result.bindings());
            entry.expand_path = self.child_path(child, result);
            layer.direct_children.push(entry);
        }
        for &id in node.sub_resources() {
            let sub = self.registry.node(id);
            if sub.is_grouping() {
                self.collect(sub, result, layer);
                continue;
            }
            layer
                .drill_downs
                .push(self.entry(sub, EdgeKind::SubResource, result.bindings()));
        }
    }

    fn entry(
        &self,
        node: &ResourceTypeNode,
        edge: EdgeKind,
        bindings: &BTreeMap<String, String>,
    ) -> LayerEntry {
        LayerEntry {
            display: substitute_display(node.display(), bindings),
            node: node.id(),
            edge,
            template: node.template().map(|t| t.as_str().to_string()),
            expand_path: None,
            fixed_content: node.fixed_content().map(str::to_string),
        }
    }

    fn child_path(&self, child: &ResourceTypeNode, result: &MatchResult<'_>) -> Option<String> {
        let template = child.template()?;
        match template.bind(result.values()) {
            Ok(path) => Some(path),
            Err(err) => {
                tracing::warn!(
                    location = child.location(),
                    "child '{}' cannot be expanded from {}: {err}",
                    child.display(),
                    result.path().as_str()
                );
                None
            }
        }
    }
}

/// Replace `{name}` placeholders that have a binding; leave the rest as-is.
pub fn substitute_display(display: &str, bindings: &BTreeMap<String, String>) -> String {
    let mut out = String::with_capacity(display.len());
    let mut rest = display;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end) => {
                let name = &after[..end];
                match bindings.get(name) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::parse_catalog;
    use crate::matcher::TemplateMatcher;
    use serde_json::json;

    fn registry() -> TemplateRegistry {
        let doc = json!({
            "schema_version": "resource_catalog_v1",
            "key": "expansion_unit",
            "resource_types": [{
                "display": "widgets",
                "endpoint": {"url": "/widgets"},
                "children": [
                    {"display": "counts", "endpoint": {"url": "/widgets/counts"}},
                    {"display": "readme", "fixed_content": "Widgets are small."}
                ],
                "sub_resources": [{
                    "display": "{widgetName}",
                    "endpoint": {"url": "/widgets/{widgetName}"},
                    "children": [
                        {"display": "parts of {widgetName}", "endpoint": {"url": "/widgets/{widgetName}/parts"}}
                    ]
                }]
            }]
        });
        TemplateRegistry::from_catalog(&parse_catalog(&doc.to_string()).unwrap()).unwrap()
    }

    #[test]
    fn splits_children_and_drill_downs() {
        let registry = registry();
        let matcher = TemplateMatcher::new(&registry);
        let planner = ExpansionPlanner::new(&registry);
        let result = matcher.match_path("/widgets").unwrap();
        let layer = planner.next_layer(&result);

        let children: Vec<&str> = layer
            .direct_children
            .iter()
            .map(|e| e.display.as_str())
            .collect();
        assert_eq!(children, vec!["counts", "readme"]);
        assert_eq!(layer.direct_children[0].expand_path.as_deref(), Some("/widgets/counts"));
        assert_eq!(layer.direct_children[1].expand_path, None);
        assert_eq!(
            layer.direct_children[1].fixed_content.as_deref(),
            Some("Widgets are small.")
        );

        assert_eq!(layer.drill_downs.len(), 1);
        assert_eq!(layer.drill_downs[0].display, "{widgetName}");
        let path = planner
            .drill_down_path(&result, &layer.drill_downs[0], "w1")
            .unwrap();
        assert_eq!(path, "/widgets/w1");
        assert!(planner.drill_down_path(&result, &layer.drill_downs[0], "a/b").is_err());

        let item = matcher.match_path(&path).unwrap();
        let layer = planner.next_layer(&item);
        assert_eq!(layer.direct_children[0].display, "parts of w1");
        assert_eq!(layer.direct_children[0].expand_path.as_deref(), Some("/widgets/w1/parts"));
        assert!(layer.drill_downs.is_empty());
    }

    #[test]
    fn groupings_are_looked_through() {
        let doc = json!({
            "schema_version": "resource_catalog_v1",
            "key": "expansion_grouping",
            "resource_types": [{
                "display": "tenants",
                "endpoint": {"url": "/tenants"},
                "children": [{
                    "display": "by kind",
                    "children": [{
                        "display": "nested",
                        "children": [
                            {"display": "active", "endpoint": {"url": "/tenants/active"}}
                        ]
                    }],
                    "sub_resources": [
                        {"display": "{tenantId}", "endpoint": {"url": "/tenants/{tenantId}"}}
                    ]
                }]
            }]
        });
        let registry =
            TemplateRegistry::from_catalog(&parse_catalog(&doc.to_string()).unwrap()).unwrap();
        let matcher = TemplateMatcher::new(&registry);
        let planner = ExpansionPlanner::new(&registry);
        let result = matcher.match_path("/tenants").unwrap();
        let layer = planner.next_layer(&result);

        assert_eq!(layer.direct_children.len(), 1);
        assert_eq!(layer.direct_children[0].display, "active");
        assert_eq!(layer.direct_children[0].expand_path.as_deref(), Some("/tenants/active"));
        assert_eq!(layer.drill_downs.len(), 1);
        let path = planner
            .drill_down_path(&result, &layer.drill_downs[0], "t1")
            .unwrap();
        assert_eq!(path, "/tenants/t1");
        assert_eq!(matcher.match_path(&path).unwrap().node().display(), "{tenantId}");
    }

    #[test]
    fn display_substitution_leaves_unknown_placeholders() {
        let mut bindings = BTreeMap::new();
        bindings.insert("name".to_string(), "web1".to_string());
        assert_eq!(substitute_display("{name} ({slot})", &bindings), "web1 ({slot})");
        assert_eq!(substitute_display("open {brace", &bindings), "open {brace");
    }
}
