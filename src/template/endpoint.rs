//! A single versioned URL template plus the verb used to call it.

use crate::catalog::Verb;
use crate::error::NavigationError;
use crate::template::tokenizer::{ArityMismatch, Template};
use crate::template::version::ApiVersion;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    template: Template,
    api_version: ApiVersion,
    verb: Verb,
}

impl Endpoint {
    pub fn new(url: &str, api_version: ApiVersion, verb: Verb) -> Result<Self, NavigationError> {
        Ok(Self {
            template: Template::parse(url)?,
            api_version,
            verb,
        })
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn api_version(&self) -> &ApiVersion {
        &self.api_version
    }

    pub fn verb(&self) -> Verb {
        self.verb
    }

    pub fn arity(&self) -> usize {
        self.template.parameter_count()
    }

    /// Bound path without query string.
    pub fn bind_path(&self, values: &[String]) -> Result<String, ArityMismatch> {
        self.template.bind(values)
    }

    /// Bound path with `?api-version=` appended when this endpoint is versioned.
    pub fn bind_url(&self, values: &[String]) -> Result<String, ArityMismatch> {
        let path = self.bind_path(values)?;
        Ok(with_api_version(path, &self.api_version))
    }
}

fn with_api_version(path: String, api_version: &ApiVersion) -> String {
    if api_version.is_empty() {
        path
    } else {
        format!("{path}?api-version={api_version}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_url_appends_version_only_when_present() {
        let versioned = Endpoint::new(
            "/providers/Microsoft.Example/widgets/{widgetName}",
            ApiVersion::new("2022-09-01"),
            Verb::Put,
        )
        .unwrap();
        assert_eq!(versioned.arity(), 1);
        assert_eq!(
            versioned.bind_url(&["abc".to_string()]).unwrap(),
            "/providers/Microsoft.Example/widgets/abc?api-version=2022-09-01"
        );

        let bare = Endpoint::new("/api/2.0/clusters/list", ApiVersion::default(), Verb::Get)
            .unwrap();
        assert_eq!(bare.bind_url(&[]).unwrap(), "/api/2.0/clusters/list");
    }
}
