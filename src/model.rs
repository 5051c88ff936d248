//! Model metadata consumed by the traversal scopes.
//!
//! A [`ModelDef`] describes one table: its primary key, soft-delete column,
//! the dot-paths each feature may use, and its named relations. Models are
//! registered in a [`Schema`] so relation chains can be walked by name.
//!
//! # Example
//!
//! ```
//! use traversify::{ModelDef, RelationDef, Schema};
//!
//! let schema = Schema::new()
//!     .with(
//!         ModelDef::new("Post", "posts")
//!             .relation("author", RelationDef::belongs_to("User", "author_id", "id"))
//!             .filters(["status", "author.email"])
//!             .sort(["title", "author.name"]),
//!     )
//!     .with(ModelDef::new("User", "users"));
//!
//! assert!(schema.model("Post").is_ok());
//! ```

use crate::error::TraverseError;
use crate::feature::Feature;
use crate::relation::RelationDef;
use std::collections::{BTreeMap, HashMap};

/// Soft-delete column used when none is given explicitly
pub const DEFAULT_DELETED_AT: &str = "deleted_at";

/// Per-feature allow-lists of dot-paths (or relation names)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowLists {
    pub filters: Option<Vec<String>>,
    pub search: Option<Vec<String>>,
    pub sort: Option<Vec<String>>,
    pub range: Option<Vec<String>>,
    pub autoload: Option<Vec<String>>,
    pub load_count: Option<Vec<String>>,
}

impl AllowLists {
    pub fn get(&self, feature: Feature) -> Option<&[String]> {
        let list = match feature {
            Feature::Search => &self.search,
            Feature::Filter => &self.filters,
            Feature::Sort => &self.sort,
            Feature::Range => &self.range,
            Feature::Autoload => &self.autoload,
            Feature::LoadCount => &self.load_count,
        };
        list.as_deref()
    }
}

/// Static description of a data model
#[derive(Debug, Clone)]
pub struct ModelDef {
    name: String,
    table: String,
    primary_key: String,
    soft_delete: Option<String>,
    id_prefix: Option<String>,
    id_column: Option<String>,
    allow: AllowLists,
    relations: BTreeMap<String, RelationDef>,
}

fn to_strings<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}

impl ModelDef {
    /// Create a model named `name` stored in `table`, keyed by `id`.
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            primary_key: "id".to_string(),
            soft_delete: None,
            id_prefix: None,
            id_column: None,
            allow: AllowLists::default(),
            relations: BTreeMap::new(),
        }
    }

    pub fn primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary_key = column.into();
        self
    }

    /// Mark the model as soft-deleting through `deleted_at`.
    pub fn soft_deletes(self) -> Self {
        self.soft_deletes_column(DEFAULT_DELETED_AT)
    }

    pub fn soft_deletes_column(mut self, column: impl Into<String>) -> Self {
        self.soft_delete = Some(column.into());
        self
    }

    /// Label prefix used when searching the primary key as `PREFIX-id`
    pub fn id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.id_prefix = Some(prefix.into());
        self
    }

    /// Column searched in place of the primary key when prefixing is enabled
    pub fn id_column(mut self, column: impl Into<String>) -> Self {
        self.id_column = Some(column.into());
        self
    }

    pub fn relation(mut self, name: impl Into<String>, relation: RelationDef) -> Self {
        self.relations.insert(name.into(), relation);
        self
    }

    pub fn filters<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allow.filters = Some(to_strings(paths));
        self
    }

    pub fn search<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allow.search = Some(to_strings(paths));
        self
    }

    pub fn sort<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allow.sort = Some(to_strings(paths));
        self
    }

    pub fn range<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allow.range = Some(to_strings(paths));
        self
    }

    pub fn autoload<I, S>(mut self, relations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allow.autoload = Some(to_strings(relations));
        self
    }

    pub fn load_count<I, S>(mut self, relations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allow.load_count = Some(to_strings(relations));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn key_name(&self) -> &str {
        &self.primary_key
    }

    pub fn uses_soft_deletes(&self) -> bool {
        self.soft_delete.is_some()
    }

    /// Soft-delete column, if the model soft-deletes
    pub fn deleted_at_column(&self) -> Option<&str> {
        self.soft_delete.as_deref()
    }

    pub fn search_prefix(&self) -> Option<&str> {
        self.id_prefix.as_deref()
    }

    pub fn search_id_column(&self) -> Option<&str> {
        self.id_column.as_deref()
    }

    pub fn allow_lists(&self) -> &AllowLists {
        &self.allow
    }

    /// Allow-list for `feature`; `None` when the model was not set up for it
    pub fn allow_list(&self, feature: Feature) -> Option<&[String]> {
        self.allow.get(feature)
    }

    pub fn get_relation(&self, name: &str) -> Option<&RelationDef> {
        self.relations.get(name)
    }

    pub fn relations(&self) -> impl Iterator<Item = (&str, &RelationDef)> {
        self.relations.iter().map(|(name, rel)| (name.as_str(), rel))
    }
}

/// Registry of models addressable by name
#[derive(Debug, Clone, Default)]
pub struct Schema {
    models: HashMap<String, ModelDef>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style registration
    pub fn with(mut self, model: ModelDef) -> Self {
        self.register(model);
        self
    }

    /// Register (or replace) a model
    pub fn register(&mut self, model: ModelDef) {
        self.models.insert(model.name.clone(), model);
    }

    pub fn model(&self, name: &str) -> Result<&ModelDef, TraverseError> {
        self.models
            .get(name)
            .ok_or_else(|| TraverseError::UnknownModel(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_defaults() {
        let model = ModelDef::new("Post", "posts");
        assert_eq!(model.key_name(), "id");
        assert!(!model.uses_soft_deletes());
        assert!(model.allow_list(Feature::Filter).is_none());
    }

    #[test]
    fn test_soft_deletes_default_column() {
        let model = ModelDef::new("Post", "posts").soft_deletes();
        assert_eq!(model.deleted_at_column(), Some("deleted_at"));

        let model = ModelDef::new("Post", "posts").soft_deletes_column("archived_at");
        assert_eq!(model.deleted_at_column(), Some("archived_at"));
    }

    #[test]
    fn test_allow_lists_per_feature() {
        let model = ModelDef::new("Post", "posts")
            .filters(["status"])
            .sort(Vec::<String>::new())
            .load_count(["comments"]);

        assert_eq!(model.allow_list(Feature::Filter), Some(&["status".to_string()][..]));
        assert_eq!(model.allow_list(Feature::Sort), Some(&[][..]));
        assert_eq!(model.allow_list(Feature::LoadCount).map(<[String]>::len), Some(1));
        assert!(model.allow_list(Feature::Range).is_none());
    }

    #[test]
    fn test_schema_lookup() {
        let schema = Schema::new().with(ModelDef::new("Post", "posts"));
        assert_eq!(schema.len(), 1);
        assert_eq!(schema.model("Post").unwrap().table(), "posts");
        assert_eq!(
            schema.model("Ghost").unwrap_err(),
            TraverseError::UnknownModel("Ghost".to_string())
        );
    }
}
