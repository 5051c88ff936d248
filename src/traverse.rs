//! Per-call traversal context.
//!
//! A [`Traversal`] binds a root model to one query-build call. Every feature
//! scope run through it shares the same join cache and alias sequence, so a
//! relation used by several scopes (say, filter and sort) is joined once.
//! Create a new `Traversal` for every query.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use traversify::{traverse, ModelDef, RelationDef, Schema, TraverseRequest};
//!
//! let schema = Schema::new()
//!     .with(
//!         ModelDef::new("Post", "posts")
//!             .relation("author", RelationDef::belongs_to("User", "author_id", "id"))
//!             .filters(["status", "author.email"])
//!             .sort(["author.name"]),
//!     )
//!     .with(ModelDef::new("User", "users"));
//!
//! let request = TraverseRequest::from_value(json!({
//!     "filter": { "author.email": "joe@example.com" },
//!     "sort": { "author.name": "asc" }
//! }))?;
//!
//! let query = traverse(&schema, "Post", &request)?;
//! assert_eq!(query.joins().len(), 1);
//! # Ok::<(), traversify::TraverseError>(())
//! ```

use crate::config::{MissingConfigPolicy, TraversifyConfig};
use crate::error::TraverseError;
use crate::feature::{self, Feature};
use crate::join::{JoinContext, Resolved};
use crate::model::{ModelDef, Schema};
use crate::query::{ColumnRef, SelectQuery, TrashedScope};
use crate::request::{SearchInput, TraverseRequest};
use serde_json::{Map, Value as JsonValue};

/// Traversal state for one query-build call
#[derive(Debug)]
pub struct Traversal<'s> {
    schema: &'s Schema,
    root: &'s ModelDef,
    config: TraversifyConfig,
    joins: JoinContext,
    search_override: Option<Vec<String>>,
}

impl<'s> Traversal<'s> {
    /// Start a traversal rooted at `model`, using the process-wide settings.
    pub fn new(schema: &'s Schema, model: &str) -> Result<Self, TraverseError> {
        Ok(Self {
            schema,
            root: schema.model(model)?,
            config: TraversifyConfig::global().clone(),
            joins: JoinContext::new(),
            search_override: None,
        })
    }

    pub fn with_config(mut self, config: TraversifyConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &TraversifyConfig {
        &self.config
    }

    pub fn schema(&self) -> &'s Schema {
        self.schema
    }

    pub fn root(&self) -> &'s ModelDef {
        self.root
    }

    /// Joins emitted and aliases issued so far
    pub fn joins(&self) -> &JoinContext {
        &self.joins
    }

    /// Fresh query over the root model
    pub fn query(&self) -> SelectQuery {
        SelectQuery::for_model(self.root)
    }

    /// Replace the search allow-list for this traversal only
    pub fn set_search<I, S>(&mut self, paths: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.search_override = Some(paths.into_iter().map(Into::into).collect());
        self
    }

    /// Allow-list for `feature`, applying the missing-configuration policy.
    ///
    /// `Ok(None)` means the scope should leave the query untouched.
    pub(crate) fn allowed(&self, feature: Feature) -> Result<Option<Vec<String>>, TraverseError> {
        let list = match (feature, &self.search_override) {
            (Feature::Search, Some(paths)) => Some(paths.as_slice()),
            _ => self.root.allow_list(feature),
        };
        match list {
            Some(paths) if !paths.is_empty() => Ok(Some(paths.to_vec())),
            _ => match self.config.missing_config {
                MissingConfigPolicy::Strict => Err(TraverseError::FeatureNotConfigured {
                    model: self.root.name().to_string(),
                    feature,
                }),
                MissingConfigPolicy::Lenient => {
                    log::warn!(
                        "No column configured to be {} on model {}",
                        feature.verb(),
                        self.root.name()
                    );
                    Ok(None)
                }
            },
        }
    }

    /// Join along `relations` from the root model
    pub fn walk(&mut self, query: &mut SelectQuery, relations: &[&str]) -> Result<Resolved<'s>, TraverseError> {
        self.joins.walk(self.schema, self.root, relations, query)
    }

    /// Join along the relation part of `path` and qualify its column
    pub fn qualify(&mut self, query: &mut SelectQuery, path: &str) -> Result<ColumnRef, TraverseError> {
        self.joins.qualify(self.schema, self.root, path, query)
    }

    pub fn search(&mut self, query: &mut SelectQuery, keywords: &[String]) -> Result<(), TraverseError> {
        feature::search::apply(self, query, keywords)
    }

    pub fn filter(&mut self, query: &mut SelectQuery, filter: &Map<String, JsonValue>) -> Result<(), TraverseError> {
        feature::filter::apply(self, query, filter)
    }

    pub fn range(&mut self, query: &mut SelectQuery, range: &Map<String, JsonValue>) -> Result<(), TraverseError> {
        feature::range::apply(self, query, range)
    }

    pub fn sort(&mut self, query: &mut SelectQuery, sort: &Map<String, JsonValue>) -> Result<(), TraverseError> {
        feature::sort::apply(self, query, sort)
    }

    pub fn autoload(&mut self, query: &mut SelectQuery, relations: &[String]) -> Result<(), TraverseError> {
        feature::autoload::apply(self, query, relations)
    }

    pub fn load_count(&mut self, query: &mut SelectQuery, relations: &[String]) -> Result<(), TraverseError> {
        feature::load_count::apply(self, query, relations)
    }

    /// Restrict to soft-deleted rows when the root model soft-deletes
    pub fn only_trashed(&self, query: &mut SelectQuery) {
        if self.root.uses_soft_deletes() {
            query.set_trashed(TrashedScope::Only);
        }
    }

    /// Run every scope the request carries, in a fixed order: trashed,
    /// search, filter, range, autoload, load count, sort.
    pub fn apply(&mut self, query: &mut SelectQuery, request: &TraverseRequest) -> Result<(), TraverseError> {
        if request.trashed {
            self.only_trashed(query);
        }
        if let Some(search) = &request.search {
            let keywords = match search {
                SearchInput::One(keyword) => vec![keyword.clone()],
                SearchInput::Many(keywords) => keywords.clone(),
            };
            self.search(query, &keywords)?;
        }
        if let Some(filter) = &request.filter {
            self.filter(query, filter)?;
        }
        if let Some(range) = &request.range {
            self.range(query, range)?;
        }
        if let Some(autoload) = &request.autoload {
            self.autoload(query, autoload)?;
        }
        if let Some(load_count) = &request.load_count {
            self.load_count(query, load_count)?;
        }
        if let Some(sort) = &request.sort {
            self.sort(query, sort)?;
        }
        Ok(())
    }
}

/// Build a query over `model` shaped by `request`
pub fn traverse(schema: &Schema, model: &str, request: &TraverseRequest) -> Result<SelectQuery, TraverseError> {
    let traversal = Traversal::new(schema, model)?;
    let query = traversal.query();
    traverse_query(traversal, query, request)
}

/// Apply `request` to an existing `query` with a fresh traversal
pub fn traverse_query(
    mut traversal: Traversal<'_>,
    mut query: SelectQuery,
    request: &TraverseRequest,
) -> Result<SelectQuery, TraverseError> {
    #[cfg(feature = "tracing")]
    let _span = tracing::debug_span!("traverse", model = traversal.root().name()).entered();

    traversal.apply(&mut query, request)?;
    log::debug!(
        "Traversed {}: {} joins, {} predicates",
        traversal.root().name(),
        query.joins().len(),
        query.wheres().len()
    );
    Ok(query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relation::RelationDef;

    fn schema() -> Schema {
        Schema::new()
            .with(
                ModelDef::new("Post", "posts")
                    .soft_deletes()
                    .relation("author", RelationDef::belongs_to("User", "author_id", "id"))
                    .filters(["status"])
                    .search(["title"]),
            )
            .with(ModelDef::new("User", "users"))
    }

    #[test]
    fn test_unknown_root_model() {
        let schema = schema();
        let err = Traversal::new(&schema, "Ghost").unwrap_err();
        assert_eq!(err, TraverseError::UnknownModel("Ghost".to_string()));
    }

    #[test]
    fn test_allowed_strict_and_lenient() {
        let schema = schema();
        let traversal = Traversal::new(&schema, "Post").unwrap().with_config(TraversifyConfig::default());
        assert!(traversal.allowed(Feature::Filter).unwrap().is_some());
        assert!(matches!(
            traversal.allowed(Feature::Sort),
            Err(TraverseError::FeatureNotConfigured {
                feature: Feature::Sort,
                ..
            })
        ));

        let traversal = traversal
            .with_config(TraversifyConfig::default().with_missing_config(MissingConfigPolicy::Lenient));
        assert_eq!(traversal.allowed(Feature::Sort).unwrap(), None);
    }

    #[test]
    fn test_set_search_overrides_allow_list() {
        let schema = schema();
        let mut traversal = Traversal::new(&schema, "Post").unwrap();
        traversal.set_search(["author.name"]);
        assert_eq!(
            traversal.allowed(Feature::Search).unwrap(),
            Some(vec!["author.name".to_string()])
        );
    }

    #[test]
    fn test_trashed_request() {
        let schema = schema();
        let mut request = TraverseRequest::default();
        request.trashed = true;
        let query = traverse(&schema, "Post", &request).unwrap();
        assert_eq!(query.trashed(), TrashedScope::Only);
    }

    #[test]
    fn test_trashed_ignored_without_soft_deletes() {
        let schema = schema();
        let traversal = Traversal::new(&schema, "User").unwrap();
        let mut query = traversal.query();
        traversal.only_trashed(&mut query);
        assert_eq!(query.trashed(), TrashedScope::Without);
    }
}
