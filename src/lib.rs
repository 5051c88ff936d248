//! # Traversify
//!
//! Request-driven search, filter, sort, range, eager-load and count-load
//! scopes for a select query, with relation joins resolved from dot-paths.
//!
//! Models declare which dot-paths each feature may use. A [`Traversal`] walks
//! those paths over the relation graph, emitting each LEFT JOIN once per call
//! and aliasing tables that are joined more than once under different keys.

pub mod config;
pub mod error;
pub mod feature;
pub mod join;
pub mod model;
pub mod query;
pub mod relation;
pub mod request;
pub mod traverse;

pub use config::{MissingConfigPolicy, TraversifyConfig};
pub use error::TraverseError;
pub use feature::Feature;
pub use model::{ModelDef, Schema};
pub use query::{Backend, SelectQuery};
pub use relation::{Constraint, RelationDef, RelationType};
pub use request::{SearchInput, TraverseRequest};
pub use traverse::{traverse, traverse_query, Traversal};
