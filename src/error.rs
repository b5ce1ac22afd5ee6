//! Typed outcomes shared by the tokenizer, matcher and action resolver.
//!
//! `NoMatch` is an expected result rather than a failure; callers are expected
//! to render a generic view for it. Catalog loading errors are not part of this
//! enum: they surface as `anyhow::Error` with the offending entry in context.

use crate::catalog::Verb;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    /// A concrete identifier or template could not be tokenized.
    #[error("malformed path '{path}': {reason}")]
    MalformedPath { path: String, reason: String },

    /// No template (literal-rooted or fallback) matches the identifier.
    #[error("no resource type matches '{path}'{}", describe_miss(.deepest, .remaining))]
    NoMatch {
        path: String,
        /// Display name of the deepest node whose template aligned with a prefix.
        deepest: Option<String>,
        /// Concrete segments left over after the deepest aligned prefix.
        remaining: Vec<String>,
    },

    /// A mutation endpoint disagrees with the read endpoint's parameter arity.
    #[error(
        "inconsistent template for '{display}': {verb} endpoint {template} takes {mutation_arity} parameter(s), read endpoint takes {read_arity}"
    )]
    InconsistentTemplate {
        display: String,
        verb: Verb,
        template: String,
        read_arity: usize,
        mutation_arity: usize,
    },
}

impl NavigationError {
    pub(crate) fn malformed(path: &str, reason: impl Into<String>) -> Self {
        NavigationError::MalformedPath {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    pub fn is_no_match(&self) -> bool {
        matches!(self, NavigationError::NoMatch { .. })
    }
}

fn describe_miss(deepest: &Option<String>, remaining: &[String]) -> String {
    match deepest {
        Some(node) if !remaining.is_empty() => {
            format!(" (deepest match '{node}', unmatched: {})", remaining.join("/"))
        }
        Some(node) => format!(" (deepest match '{node}' has no read endpoint)"),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_match_message_names_leftover_segments() {
        let err = NavigationError::NoMatch {
            path: "/providers/Microsoft.Example/widgets/a/b".into(),
            deepest: Some("{widgetName}".into()),
            remaining: vec!["b".into()],
        };
        let text = err.to_string();
        assert!(text.contains("deepest match '{widgetName}'"), "{text}");
        assert!(text.ends_with("unmatched: b)"), "{text}");
        assert!(err.is_no_match());
    }
}
