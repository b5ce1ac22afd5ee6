//! Resource type template matching and expansion for ARM-style resource trees.
//!
//! A catalog of versioned URL templates is loaded once into an immutable
//! [`TemplateRegistry`]. Concrete identifiers are then matched against it with
//! [`TemplateMatcher`], and the resulting [`MatchResult`] feeds
//! [`available_actions`] (bound URLs per verb) and [`ExpansionPlanner`] (the
//! next navigable layer). Everything after registry construction is a pure
//! read, so a single registry can serve any number of threads.
//!
//! ```text
//! ConcretePath -> TemplateMatcher -> MatchResult -> available_actions
//!                                               \-> ExpansionPlanner::next_layer
//! ```

pub mod actions;
pub mod catalog;
pub mod config;
pub mod error;
pub mod expansion;
pub mod logging;
pub mod matcher;
pub mod registry;
mod schema_loader;
pub mod template;

pub use actions::{Action, ActionSet, available_actions};
pub use catalog::{
    CATALOG_SCHEMA_VERSION, CatalogKey, EdgeKind, NodeId, ResourceCatalog, ResourceTypeEntry,
    Verb, load_catalog, parse_catalog,
};
pub use config::NavigatorConfig;
pub use error::NavigationError;
pub use expansion::{ExpansionPlanner, LayerEntry, NextLayer};
pub use matcher::{MatchOptions, MatchResult, MatchSummary, TemplateMatcher, TrailStep};
pub use registry::{ResourceTypeNode, TemplateRegistry};
pub use template::{ApiVersion, ConcretePath, Endpoint, LiteralCase, Template};
