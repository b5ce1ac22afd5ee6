//! URL template primitives: tokenization, endpoints and API versions.
//!
//! Everything here is pure and catalog-agnostic; the registry and matcher build
//! on these types without re-parsing strings.

pub mod endpoint;
pub mod tokenizer;
pub mod version;

pub use endpoint::Endpoint;
pub use tokenizer::{
    ArityMismatch, ConcretePath, Literal, LiteralCase, Segment, ShapeKey, ShapeSegment, Template,
};
pub use version::ApiVersion;
