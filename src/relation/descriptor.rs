//! Relationship descriptor resolution.
//!
//! [`resolve`] turns a relation accessor on a model into a normalized
//! [`RelationDescriptor`]: the tables involved, the join steps in order, and
//! the key pairs each step's ON clause must contain. Key columns remember
//! which side of the relation they belong to, so a descriptor can be rendered
//! against any table-or-alias assignment (see [`TableRefs`]).

use crate::error::TraverseError;
use crate::model::{ModelDef, Schema};
use crate::query::{ColumnRef, Predicate, Scalar};
use crate::relation::def::{Constraint, JoinShape, RelationKeys, RelationType};

/// Which table of a relation a key column lives on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Parent,
    Through,
    Related,
}

/// A join key column in base-table terms
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyColumn {
    pub side: Side,
    pub table: String,
    pub column: String,
}

impl KeyColumn {
    fn new(side: Side, table: &str, column: &str) -> Self {
        Self {
            side,
            table: table.to_string(),
            column: column.to_string(),
        }
    }

    pub fn qualified(&self) -> String {
        format!("{}.{}", self.table, self.column)
    }
}

/// One correspondence in a join's ON clause
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyPair {
    /// `left = right`
    Columns { left: KeyColumn, right: KeyColumn },
    /// `column = 'value'`, the type column of a polymorphic relation
    Discriminator { column: KeyColumn, value: String },
}

impl KeyPair {
    fn columns(left: KeyColumn, right: KeyColumn) -> Self {
        KeyPair::Columns { left, right }
    }

    /// Column names without tables
    pub fn unqualified(&self) -> (&str, &str) {
        match self {
            KeyPair::Columns { left, right } => (&left.column, &right.column),
            KeyPair::Discriminator { column, value } => (&column.column, value),
        }
    }

    /// Columns qualified with base table names
    pub fn qualified(&self) -> (String, String) {
        match self {
            KeyPair::Columns { left, right } => (left.qualified(), right.qualified()),
            KeyPair::Discriminator { column, value } => (column.qualified(), value.clone()),
        }
    }

    pub fn key_columns(&self) -> Vec<&KeyColumn> {
        match self {
            KeyPair::Columns { left, right } => vec![left, right],
            KeyPair::Discriminator { column, .. } => vec![column],
        }
    }

    /// ON-clause predicate with each side qualified by its table-or-alias
    pub fn to_predicate(&self, refs: &TableRefs) -> Predicate {
        match self {
            KeyPair::Columns { left, right } => Predicate::Columns {
                left: refs.column(left),
                right: refs.column(right),
            },
            KeyPair::Discriminator { column, value } => {
                Predicate::eq(refs.column(column), Scalar::Text(value.clone()))
            }
        }
    }
}

/// Table-or-alias chosen for each side of a relation in one query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRefs {
    pub parent: String,
    pub through: Option<String>,
    pub related: String,
}

impl TableRefs {
    pub fn resolve(&self, side: Side) -> &str {
        match side {
            Side::Parent => &self.parent,
            Side::Related => &self.related,
            // only relations with a through table produce through columns
            Side::Through => self.through.as_deref().unwrap_or(&self.related),
        }
    }

    pub fn column(&self, key: &KeyColumn) -> ColumnRef {
        ColumnRef::new(self.resolve(key.side), key.column.clone())
    }
}

/// One LEFT JOIN a relation needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinStep {
    /// `Through` for the pivot/intermediate table, `Related` for the far table
    pub side: Side,
    pub table: String,
    /// Soft-delete column guarded with `IS NULL` on this step
    pub soft_delete: Option<String>,
    pub on: Vec<KeyPair>,
}

/// Normalized view of one relation hop
#[derive(Debug, Clone, PartialEq)]
pub struct RelationDescriptor {
    pub name: String,
    pub kind: RelationType,
    pub parent_model: String,
    pub parent_table: String,
    pub related_model: String,
    pub related_table: String,
    /// Pivot (many-to-many) or intermediate (through) table
    pub through_table: Option<String>,
    pub steps: Vec<JoinStep>,
    pub constraints: Vec<Constraint>,
}

impl RelationDescriptor {
    pub fn shape(&self) -> JoinShape {
        self.kind.shape()
    }

    pub fn key_pairs(&self) -> impl Iterator<Item = &KeyPair> {
        self.steps.iter().flat_map(|step| step.on.iter())
    }

    /// Whether the related model soft-deletes
    pub fn uses_soft_deletes(&self) -> bool {
        self.steps
            .iter()
            .any(|step| step.side == Side::Related && step.soft_delete.is_some())
    }

    /// Join key columns as `ColumnRef`s over base table names
    pub fn key_columns(&self) -> Vec<ColumnRef> {
        self.key_pairs()
            .flat_map(KeyPair::key_columns)
            .map(|key| ColumnRef::new(key.table.clone(), key.column.clone()))
            .collect()
    }

    /// Re-qualify a constraint column from base tables onto `refs`.
    ///
    /// Bare columns belong to the related table.
    fn qualify(&self, column: &str, refs: &TableRefs) -> (ColumnRef, ColumnRef) {
        let base = ColumnRef::parse(column, &self.related_table);
        let table = if base.table == self.related_table {
            refs.related.clone()
        } else if self.through_table.as_deref() == Some(base.table.as_str()) {
            refs.resolve(Side::Through).to_string()
        } else if base.table == self.parent_table {
            refs.parent.clone()
        } else {
            base.table.clone()
        };
        let column = ColumnRef::new(table, base.column.clone());
        (base, column)
    }

    /// Relationship constraints that propagate onto a join
    ///
    /// Only basic comparisons, null checks and nested groups carry over; null
    /// checks on the join key columns are dropped.
    pub fn constraint_predicates(&self, refs: &TableRefs) -> Vec<Predicate> {
        let ignored = self.key_columns();
        self.constraints
            .iter()
            .filter_map(|constraint| self.constraint_predicate(constraint, refs, &ignored))
            .collect()
    }

    fn constraint_predicate(
        &self,
        constraint: &Constraint,
        refs: &TableRefs,
        ignored: &[ColumnRef],
    ) -> Option<Predicate> {
        match constraint {
            Constraint::Basic {
                column,
                operator,
                value,
            } => Some(Predicate::Compare {
                column: self.qualify(column, refs).1,
                operator: *operator,
                value: value.clone(),
            }),
            Constraint::Null(column) | Constraint::NotNull(column) => {
                let (base, column) = self.qualify(column, refs);
                if ignored.contains(&base) {
                    return None;
                }
                Some(Predicate::Null {
                    column,
                    negated: matches!(constraint, Constraint::NotNull(_)),
                })
            }
            Constraint::Nested { any, constraints } => {
                let predicates: Vec<Predicate> = constraints
                    .iter()
                    .filter_map(|inner| self.constraint_predicate(inner, refs, ignored))
                    .collect();
                if predicates.is_empty() {
                    None
                } else {
                    Some(Predicate::Group {
                        any: *any,
                        predicates,
                    })
                }
            }
            Constraint::In { .. } | Constraint::Raw(_) => None,
        }
    }
}

/// Resolve relation `accessor` on `model` into a descriptor.
///
/// Fails when the accessor is unknown, when a referenced model is not in the
/// schema, or when the relation has no joinable target.
pub fn resolve(
    schema: &Schema,
    model: &ModelDef,
    accessor: &str,
) -> Result<RelationDescriptor, TraverseError> {
    let relation = model
        .get_relation(accessor)
        .ok_or_else(|| TraverseError::UnknownRelation {
            model: model.name().to_string(),
            relation: accessor.to_string(),
        })?;
    let kind = relation.relation_type();
    let unsupported = || TraverseError::UnsupportedRelation {
        model: model.name().to_string(),
        relation: accessor.to_string(),
        kind,
    };

    let related = schema.model(relation.related().ok_or_else(unsupported)?)?;
    let parent_table = model.table();
    let related_table = related.table();

    let parent = |column: &str| KeyColumn::new(Side::Parent, parent_table, column);
    let far = |column: &str| KeyColumn::new(Side::Related, related_table, column);
    let far_step = |on: Vec<KeyPair>| JoinStep {
        side: Side::Related,
        table: related_table.to_string(),
        soft_delete: related.deleted_at_column().map(str::to_string),
        on,
    };

    let (through_table, steps) = match relation.keys() {
        RelationKeys::BelongsTo {
            foreign_key,
            owner_key,
        } => (
            None,
            vec![far_step(vec![KeyPair::columns(far(owner_key), parent(foreign_key))])],
        ),
        RelationKeys::HasOne {
            foreign_key,
            local_key,
        }
        | RelationKeys::HasMany {
            foreign_key,
            local_key,
        } => (
            None,
            vec![far_step(vec![KeyPair::columns(parent(local_key), far(foreign_key))])],
        ),
        RelationKeys::BelongsToMany {
            pivot_table,
            foreign_pivot_key,
            related_pivot_key,
            parent_key,
            related_key,
        } => {
            let pivot = |column: &str| KeyColumn::new(Side::Through, pivot_table, column);
            (
                Some(pivot_table.clone()),
                vec![
                    JoinStep {
                        side: Side::Through,
                        table: pivot_table.clone(),
                        soft_delete: None,
                        on: vec![KeyPair::columns(pivot(foreign_pivot_key), parent(parent_key))],
                    },
                    far_step(vec![KeyPair::columns(far(related_key), pivot(related_pivot_key))]),
                ],
            )
        }
        RelationKeys::MorphOne(keys) | RelationKeys::MorphMany(keys) => {
            let class = keys.morph_class.clone().ok_or_else(unsupported)?;
            (
                None,
                vec![far_step(vec![
                    KeyPair::columns(far(&keys.id_column), parent(&keys.key)),
                    KeyPair::Discriminator {
                        column: far(&keys.type_column),
                        value: class,
                    },
                ])],
            )
        }
        RelationKeys::MorphTo(keys) => {
            let class = keys.morph_class.clone().ok_or_else(unsupported)?;
            (
                None,
                vec![far_step(vec![
                    KeyPair::columns(far(&keys.key), parent(&keys.id_column)),
                    KeyPair::Discriminator {
                        column: parent(&keys.type_column),
                        value: class,
                    },
                ])],
            )
        }
        RelationKeys::HasOneThrough(keys) | RelationKeys::HasManyThrough(keys) => {
            let through = schema.model(&keys.through)?;
            let through_table = through.table();
            let mid = |column: &str| KeyColumn::new(Side::Through, through_table, column);
            (
                Some(through_table.to_string()),
                vec![
                    JoinStep {
                        side: Side::Through,
                        table: through_table.to_string(),
                        soft_delete: through.deleted_at_column().map(str::to_string),
                        on: vec![KeyPair::columns(mid(&keys.first_key), parent(&keys.local_key))],
                    },
                    far_step(vec![KeyPair::columns(far(&keys.second_key), mid(&keys.second_local_key))]),
                ],
            )
        }
    };

    Ok(RelationDescriptor {
        name: accessor.to_string(),
        kind,
        parent_model: model.name().to_string(),
        parent_table: parent_table.to_string(),
        related_model: related.name().to_string(),
        related_table: related_table.to_string(),
        through_table,
        steps,
        constraints: relation.constraints().to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Operator;
    use crate::relation::RelationDef;

    fn schema() -> Schema {
        Schema::new()
            .with(
                ModelDef::new("Post", "posts")
                    .relation("author", RelationDef::belongs_to("User", "author_id", "id"))
                    .relation(
                        "comments",
                        RelationDef::has_many("Comment", "post_id", "id")
                            .where_eq("approved", true)
                            .where_null("comments.post_id")
                            .where_not_null("published_at"),
                    )
                    .relation("tags", RelationDef::belongs_to_many("Tag", "post_tag", "post_id", "tag_id"))
                    .relation("images", RelationDef::morph_many("Image", "imageable", "post", "id"))
                    .relation("commentable", RelationDef::morph_to("commentable", "id"))
                    .relation("missing", RelationDef::belongs_to("Ghost", "ghost_id", "id")),
            )
            .with(ModelDef::new("User", "users").soft_deletes())
            .with(ModelDef::new("Comment", "comments"))
            .with(ModelDef::new("Tag", "tags"))
            .with(ModelDef::new("Image", "images"))
            .with(
                ModelDef::new("Country", "countries").relation(
                    "posts",
                    RelationDef::has_many_through("Post", "User", "country_id", "author_id", "id", "id"),
                ),
            )
    }

    fn resolve_on(model: &str, accessor: &str) -> Result<RelationDescriptor, TraverseError> {
        let schema = schema();
        let model = schema.model(model).unwrap().clone();
        resolve(&schema, &model, accessor)
    }

    #[test]
    fn test_belongs_to() {
        let d = resolve_on("Post", "author").unwrap();
        assert_eq!(d.kind, RelationType::BelongsTo);
        assert_eq!(d.related_table, "users");
        assert_eq!(d.steps.len(), 1);
        assert!(d.uses_soft_deletes());
        let pair = d.key_pairs().next().unwrap();
        assert_eq!(pair.qualified(), ("users.id".to_string(), "posts.author_id".to_string()));
        assert_eq!(pair.unqualified(), ("id", "author_id"));
    }

    #[test]
    fn test_has_many() {
        let d = resolve_on("Post", "comments").unwrap();
        assert_eq!(d.shape(), JoinShape::HasOneOrMany);
        assert!(!d.uses_soft_deletes());
        assert_eq!(
            d.key_pairs().next().unwrap().qualified(),
            ("posts.id".to_string(), "comments.post_id".to_string())
        );
    }

    #[test]
    fn test_belongs_to_many_two_steps() {
        let d = resolve_on("Post", "tags").unwrap();
        assert_eq!(d.through_table.as_deref(), Some("post_tag"));
        assert_eq!(d.steps.len(), 2);
        assert_eq!(d.steps[0].side, Side::Through);
        assert_eq!(d.steps[0].table, "post_tag");
        assert_eq!(d.steps[1].table, "tags");
        assert_eq!(d.key_pairs().count(), 2);
    }

    #[test]
    fn test_morph_many_has_discriminator() {
        let d = resolve_on("Post", "images").unwrap();
        let pairs: Vec<_> = d.key_pairs().collect();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].unqualified(), ("imageable_id", "id"));
        assert_eq!(pairs[1].unqualified(), ("imageable_type", "post"));
    }

    #[test]
    fn test_has_many_through() {
        let d = resolve_on("Country", "posts").unwrap();
        assert_eq!(d.kind, RelationType::HasManyThrough);
        assert_eq!(d.through_table.as_deref(), Some("users"));
        // intermediate users soft-delete, far posts do not
        assert_eq!(d.steps[0].soft_delete.as_deref(), Some("deleted_at"));
        assert!(!d.uses_soft_deletes());
        assert_eq!(
            d.steps[1].on[0].qualified(),
            ("posts.author_id".to_string(), "users.id".to_string())
        );
    }

    #[test]
    fn test_unknown_relation_is_fatal() {
        let err = resolve_on("Post", "publisher").unwrap_err();
        assert_eq!(
            err,
            TraverseError::UnknownRelation {
                model: "Post".to_string(),
                relation: "publisher".to_string()
            }
        );
    }

    #[test]
    fn test_untargeted_morph_to_is_unsupported() {
        let err = resolve_on("Post", "commentable").unwrap_err();
        assert!(matches!(
            err,
            TraverseError::UnsupportedRelation {
                kind: RelationType::MorphTo,
                ..
            }
        ));
    }

    #[test]
    fn test_related_model_must_be_registered() {
        let err = resolve_on("Post", "missing").unwrap_err();
        assert_eq!(err, TraverseError::UnknownModel("Ghost".to_string()));
    }

    #[test]
    fn test_constraints_requalified_onto_alias() {
        let d = resolve_on("Post", "comments").unwrap();
        let refs = TableRefs {
            parent: "posts".to_string(),
            through: None,
            related: "j0".to_string(),
        };
        let predicates = d.constraint_predicates(&refs);
        // the null check on the join key is dropped
        assert_eq!(predicates.len(), 2);
        assert_eq!(
            predicates[0],
            Predicate::Compare {
                column: ColumnRef::new("j0", "approved"),
                operator: Operator::Eq,
                value: Scalar::Bool(true),
            }
        );
        assert_eq!(predicates[1], Predicate::is_not_null(ColumnRef::new("j0", "published_at")));
    }

    #[test]
    fn test_nested_constraints_keep_grouping() {
        let schema = Schema::new()
            .with(ModelDef::new("Post", "posts").relation(
                "comments",
                RelationDef::has_many("Comment", "post_id", "id").constrain(Constraint::Nested {
                    any: true,
                    constraints: vec![
                        Constraint::Null("hidden_at".to_string()),
                        Constraint::Raw("score > 3".to_string()),
                        Constraint::Basic {
                            column: "comments.score".to_string(),
                            operator: Operator::Gt,
                            value: Scalar::Int(3),
                        },
                    ],
                }),
            ))
            .with(ModelDef::new("Comment", "comments"));
        let post = schema.model("Post").unwrap();
        let d = resolve(&schema, post, "comments").unwrap();
        let refs = TableRefs {
            parent: "posts".to_string(),
            through: None,
            related: "comments".to_string(),
        };
        let predicates = d.constraint_predicates(&refs);
        match &predicates[..] {
            [Predicate::Group { any: true, predicates }] => assert_eq!(predicates.len(), 2),
            other => panic!("unexpected predicates: {other:?}"),
        }
    }
}
