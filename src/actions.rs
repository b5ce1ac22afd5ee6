//! Operations offered at a matched node.

use crate::catalog::Verb;
use crate::error::NavigationError;
use crate::matcher::MatchResult;
use crate::template::Endpoint;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Action {
    pub verb: Verb,
    /// Bound path without query string.
    pub path: String,
    /// Bound path with `?api-version=` when the endpoint is versioned.
    pub url: String,
    pub api_version: String,
}

#[derive(Debug, Clone, Default)]
pub struct ActionSet {
    pub actions: Vec<Action>,
    /// Mutations left out because their arity disagrees with the read template.
    pub inconsistencies: Vec<NavigationError>,
}

impl ActionSet {
    pub fn verbs(&self) -> Vec<Verb> {
        self.actions.iter().map(|action| action.verb).collect()
    }

    pub fn get(&self, verb: Verb) -> Option<&Action> {
        self.actions.iter().find(|action| action.verb == verb)
    }
}

/// Read action first (with its declared verb), then `PUT`, `PATCH`, `DELETE`.
pub fn available_actions(result: &MatchResult<'_>) -> ActionSet {
    let node = result.node();
    let values = result.values();
    let mut set = ActionSet::default();

    let Some(read) = node.read_endpoint() else {
        return set;
    };
    match bind(read, values) {
        Some(action) => set.actions.push(action),
        None => return set,
    }

    for (verb, endpoint) in node.mutations() {
        if endpoint.arity() != read.arity() {
            let err = NavigationError::InconsistentTemplate {
                display: node.display().to_string(),
                verb,
                template: endpoint.template().to_string(),
                read_arity: read.arity(),
                mutation_arity: endpoint.arity(),
            };
            tracing::warn!(location = node.location(), "{err}; omitting {verb}");
            set.inconsistencies.push(err);
            continue;
        }
        if let Some(action) = bind(endpoint, values) {
            set.actions.push(action);
        }
    }
    set
}

fn bind(endpoint: &Endpoint, values: &[String]) -> Option<Action> {
    let path = endpoint.bind_path(values).ok()?;
    let url = endpoint.bind_url(values).ok()?;
    Some(Action {
        verb: endpoint.verb(),
        path,
        url,
        api_version: endpoint.api_version().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::parse_catalog;
    use crate::matcher::TemplateMatcher;
    use crate::registry::TemplateRegistry;
    use serde_json::json;

    fn registry() -> TemplateRegistry {
        let doc = json!({
            "schema_version": "resource_catalog_v1",
            "key": "actions_unit",
            "resource_types": [{
                "display": "sites",
                "endpoint": {"url": "/sites", "api_version": "2022-03-01"},
                "sub_resources": [{
                    "display": "{name}",
                    "endpoint": {"url": "/sites/{name}", "api_version": "2022-03-01"},
                    "mutations": {
                        "DELETE": {"url": "/sites/{name}", "api_version": "2022-03-01"},
                        "PATCH": {"url": "/sites/{name}/{slot}", "api_version": "2022-03-01"},
                        "PUT": {"url": "/sites/{siteName}", "api_version": "2023-01-01"}
                    },
                    "children": [{
                        "display": "keys",
                        "verb": "POST",
                        "endpoint": {"url": "/sites/{name}/listKeys"}
                    }]
                }]
            }]
        });
        TemplateRegistry::from_catalog(&parse_catalog(&doc.to_string()).unwrap()).unwrap()
    }

    #[test]
    fn offers_read_then_mutations_in_fixed_order() {
        let registry = registry();
        let result = TemplateMatcher::new(&registry).match_path("/sites/web1").unwrap();
        let set = available_actions(&result);

        assert_eq!(set.verbs(), vec![Verb::Get, Verb::Put, Verb::Delete]);
        let put = set.get(Verb::Put).unwrap();
        assert_eq!(put.url, "/sites/web1?api-version=2023-01-01");
        assert_eq!(put.path, "/sites/web1");

        assert_eq!(set.inconsistencies.len(), 1);
        assert!(matches!(
            &set.inconsistencies[0],
            NavigationError::InconsistentTemplate {
                verb: Verb::Patch,
                read_arity: 1,
                mutation_arity: 2,
                ..
            }
        ));
    }

    #[test]
    fn read_action_keeps_declared_verb() {
        let registry = registry();
        let result = TemplateMatcher::new(&registry)
            .match_path("/sites/web1/listKeys")
            .unwrap();
        let set = available_actions(&result);
        assert_eq!(set.verbs(), vec![Verb::Post]);
        assert_eq!(set.actions[0].url, "/sites/web1/listKeys");
        assert!(set.actions[0].api_version.is_empty());
    }
}
