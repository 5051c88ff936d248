//! Relation metadata declared on a model.
//!
//! This module provides the closed [`RelationType`] enum, the per-kind key
//! layout in [`RelationKeys`], and [`RelationDef`] which ties the keys to a
//! related model plus any relationship-level [`Constraint`]s.

use crate::query::{Operator, Scalar};

/// Type of relationship between entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationType {
    /// One-to-one relationship
    HasOne,
    /// One-to-many relationship
    HasMany,
    /// Many-to-one relationship (belongs_to)
    BelongsTo,
    /// Many-to-many relationship through a pivot table
    BelongsToMany,
    /// Polymorphic one-to-one (the related row carries `<name>_id` / `<name>_type`)
    MorphOne,
    /// Polymorphic one-to-many
    MorphMany,
    /// Inverse of a polymorphic relation (the parent row carries the morph columns)
    MorphTo,
    /// One-to-one through an intermediate model
    HasOneThrough,
    /// One-to-many through an intermediate model
    HasManyThrough,
}

/// Join layout family of a relation type
///
/// Relations sharing a shape produce the same join steps and need the same
/// number of key correspondences before an existing join can be reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinShape {
    BelongsTo,
    HasOneOrMany,
    BelongsToMany,
    Morph,
    Through,
}

impl RelationType {
    pub fn shape(self) -> JoinShape {
        match self {
            RelationType::BelongsTo => JoinShape::BelongsTo,
            RelationType::HasOne | RelationType::HasMany => JoinShape::HasOneOrMany,
            RelationType::BelongsToMany => JoinShape::BelongsToMany,
            RelationType::MorphOne | RelationType::MorphMany | RelationType::MorphTo => {
                JoinShape::Morph
            }
            RelationType::HasOneThrough | RelationType::HasManyThrough => JoinShape::Through,
        }
    }
}

impl JoinShape {
    /// Key pairs that must match for two joins of this shape to be the same join
    pub fn expected_matches(self) -> usize {
        match self {
            JoinShape::BelongsTo | JoinShape::HasOneOrMany => 1,
            // pivot hop and far hop; two pivots may share unqualified key names
            JoinShape::BelongsToMany => 2,
            // id correspondence plus the type discriminator
            JoinShape::Morph => 2,
            JoinShape::Through => 2,
        }
    }

    /// Number of LEFT JOIN clauses a relation of this shape emits
    pub fn join_count(self) -> usize {
        match self {
            JoinShape::BelongsToMany | JoinShape::Through => 2,
            JoinShape::BelongsTo | JoinShape::HasOneOrMany | JoinShape::Morph => 1,
        }
    }
}

/// Polymorphic key columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MorphKeys {
    /// `<name>_id`
    pub id_column: String,
    /// `<name>_type`
    pub type_column: String,
    /// Value stored in the type column for this side of the relation
    pub morph_class: Option<String>,
    /// Local key (morph one/many) or owner key on the target (morph to)
    pub key: String,
}

impl MorphKeys {
    fn named(name: &str, morph_class: Option<String>, key: String) -> Self {
        Self {
            id_column: format!("{name}_id"),
            type_column: format!("{name}_type"),
            morph_class,
            key,
        }
    }
}

/// Keys of a relation reached through an intermediate model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThroughKeys {
    /// Intermediate model name
    pub through: String,
    /// Column on the intermediate table pointing at the parent
    pub first_key: String,
    /// Column on the far table pointing at the intermediate table
    pub second_key: String,
    /// Parent column referenced by `first_key`
    pub local_key: String,
    /// Intermediate column referenced by `second_key`
    pub second_local_key: String,
}

/// Key layout of a relation, one variant per relation type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationKeys {
    BelongsTo {
        foreign_key: String,
        owner_key: String,
    },
    HasOne {
        foreign_key: String,
        local_key: String,
    },
    HasMany {
        foreign_key: String,
        local_key: String,
    },
    BelongsToMany {
        pivot_table: String,
        foreign_pivot_key: String,
        related_pivot_key: String,
        parent_key: String,
        related_key: String,
    },
    MorphOne(MorphKeys),
    MorphMany(MorphKeys),
    MorphTo(MorphKeys),
    HasOneThrough(ThroughKeys),
    HasManyThrough(ThroughKeys),
}

impl RelationKeys {
    pub fn relation_type(&self) -> RelationType {
        match self {
            RelationKeys::BelongsTo { .. } => RelationType::BelongsTo,
            RelationKeys::HasOne { .. } => RelationType::HasOne,
            RelationKeys::HasMany { .. } => RelationType::HasMany,
            RelationKeys::BelongsToMany { .. } => RelationType::BelongsToMany,
            RelationKeys::MorphOne(_) => RelationType::MorphOne,
            RelationKeys::MorphMany(_) => RelationType::MorphMany,
            RelationKeys::MorphTo(_) => RelationType::MorphTo,
            RelationKeys::HasOneThrough(_) => RelationType::HasOneThrough,
            RelationKeys::HasManyThrough(_) => RelationType::HasManyThrough,
        }
    }
}

/// A condition declared on the relationship itself
///
/// `Basic`, `Null`, `NotNull` and `Nested` conditions are copied onto the join
/// clause when the relation is joined; `In` and `Raw` only apply when the
/// relation is loaded by the host ORM.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    Basic {
        column: String,
        operator: Operator,
        value: Scalar,
    },
    Null(String),
    NotNull(String),
    Nested {
        any: bool,
        constraints: Vec<Constraint>,
    },
    In {
        column: String,
        values: Vec<Scalar>,
    },
    Raw(String),
}

/// Defines a relationship from a model to a related model
#[derive(Debug, Clone, PartialEq)]
pub struct RelationDef {
    related: Option<String>,
    keys: RelationKeys,
    constraints: Vec<Constraint>,
}

impl RelationDef {
    fn new(related: Option<String>, keys: RelationKeys) -> Self {
        Self {
            related,
            keys,
            constraints: Vec::new(),
        }
    }

    /// `parent.foreign_key` references `related.owner_key`
    pub fn belongs_to(
        related: impl Into<String>,
        foreign_key: impl Into<String>,
        owner_key: impl Into<String>,
    ) -> Self {
        Self::new(
            Some(related.into()),
            RelationKeys::BelongsTo {
                foreign_key: foreign_key.into(),
                owner_key: owner_key.into(),
            },
        )
    }

    /// `related.foreign_key` references `parent.local_key`
    pub fn has_one(
        related: impl Into<String>,
        foreign_key: impl Into<String>,
        local_key: impl Into<String>,
    ) -> Self {
        Self::new(
            Some(related.into()),
            RelationKeys::HasOne {
                foreign_key: foreign_key.into(),
                local_key: local_key.into(),
            },
        )
    }

    pub fn has_many(
        related: impl Into<String>,
        foreign_key: impl Into<String>,
        local_key: impl Into<String>,
    ) -> Self {
        Self::new(
            Some(related.into()),
            RelationKeys::HasMany {
                foreign_key: foreign_key.into(),
                local_key: local_key.into(),
            },
        )
    }

    /// Many-to-many through `pivot_table`, keyed on `id` at both ends
    pub fn belongs_to_many(
        related: impl Into<String>,
        pivot_table: impl Into<String>,
        foreign_pivot_key: impl Into<String>,
        related_pivot_key: impl Into<String>,
    ) -> Self {
        Self::belongs_to_many_using(
            related,
            pivot_table,
            foreign_pivot_key,
            related_pivot_key,
            "id",
            "id",
        )
    }

    pub fn belongs_to_many_using(
        related: impl Into<String>,
        pivot_table: impl Into<String>,
        foreign_pivot_key: impl Into<String>,
        related_pivot_key: impl Into<String>,
        parent_key: impl Into<String>,
        related_key: impl Into<String>,
    ) -> Self {
        Self::new(
            Some(related.into()),
            RelationKeys::BelongsToMany {
                pivot_table: pivot_table.into(),
                foreign_pivot_key: foreign_pivot_key.into(),
                related_pivot_key: related_pivot_key.into(),
                parent_key: parent_key.into(),
                related_key: related_key.into(),
            },
        )
    }

    /// Polymorphic one-to-one; `morph_name` expands to `<name>_id` / `<name>_type`
    pub fn morph_one(
        related: impl Into<String>,
        morph_name: &str,
        morph_class: impl Into<String>,
        local_key: impl Into<String>,
    ) -> Self {
        Self::new(
            Some(related.into()),
            RelationKeys::MorphOne(MorphKeys::named(
                morph_name,
                Some(morph_class.into()),
                local_key.into(),
            )),
        )
    }

    pub fn morph_many(
        related: impl Into<String>,
        morph_name: &str,
        morph_class: impl Into<String>,
        local_key: impl Into<String>,
    ) -> Self {
        Self::new(
            Some(related.into()),
            RelationKeys::MorphMany(MorphKeys::named(
                morph_name,
                Some(morph_class.into()),
                local_key.into(),
            )),
        )
    }

    /// Inverse polymorphic relation. It can only be joined once a target is
    /// fixed with [`RelationDef::targeting`].
    pub fn morph_to(morph_name: &str, owner_key: impl Into<String>) -> Self {
        Self::new(
            None,
            RelationKeys::MorphTo(MorphKeys::named(morph_name, None, owner_key.into())),
        )
    }

    /// Fix the target model (and its stored morph class) of a `morph_to` relation
    pub fn targeting(mut self, related: impl Into<String>, morph_class: impl Into<String>) -> Self {
        if let RelationKeys::MorphTo(keys) = &mut self.keys {
            keys.morph_class = Some(morph_class.into());
            self.related = Some(related.into());
        }
        self
    }

    pub fn has_one_through(
        related: impl Into<String>,
        through: impl Into<String>,
        first_key: impl Into<String>,
        second_key: impl Into<String>,
        local_key: impl Into<String>,
        second_local_key: impl Into<String>,
    ) -> Self {
        Self::new(
            Some(related.into()),
            RelationKeys::HasOneThrough(ThroughKeys {
                through: through.into(),
                first_key: first_key.into(),
                second_key: second_key.into(),
                local_key: local_key.into(),
                second_local_key: second_local_key.into(),
            }),
        )
    }

    pub fn has_many_through(
        related: impl Into<String>,
        through: impl Into<String>,
        first_key: impl Into<String>,
        second_key: impl Into<String>,
        local_key: impl Into<String>,
        second_local_key: impl Into<String>,
    ) -> Self {
        Self::new(
            Some(related.into()),
            RelationKeys::HasManyThrough(ThroughKeys {
                through: through.into(),
                first_key: first_key.into(),
                second_key: second_key.into(),
                local_key: local_key.into(),
                second_local_key: second_local_key.into(),
            }),
        )
    }

    pub fn constrain(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn where_eq(self, column: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.constrain(Constraint::Basic {
            column: column.into(),
            operator: Operator::Eq,
            value: value.into(),
        })
    }

    pub fn where_null(self, column: impl Into<String>) -> Self {
        self.constrain(Constraint::Null(column.into()))
    }

    pub fn where_not_null(self, column: impl Into<String>) -> Self {
        self.constrain(Constraint::NotNull(column.into()))
    }

    /// Related model name; `None` for an untargeted `morph_to`
    pub fn related(&self) -> Option<&str> {
        self.related.as_deref()
    }

    pub fn keys(&self) -> &RelationKeys {
        &self.keys
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn relation_type(&self) -> RelationType {
        self.keys.relation_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shapes() {
        assert_eq!(RelationType::HasOne.shape(), JoinShape::HasOneOrMany);
        assert_eq!(RelationType::MorphTo.shape(), JoinShape::Morph);
        assert_eq!(RelationType::HasOneThrough.shape(), JoinShape::Through);
        assert_eq!(JoinShape::BelongsTo.expected_matches(), 1);
        assert_eq!(JoinShape::Morph.expected_matches(), 2);
        assert_eq!(JoinShape::Through.join_count(), 2);
        assert_eq!(JoinShape::HasOneOrMany.join_count(), 1);
    }

    #[test]
    fn test_morph_many_expands_column_names() {
        let rel = RelationDef::morph_many("Image", "imageable", "post", "id");
        assert_eq!(rel.relation_type(), RelationType::MorphMany);
        match rel.keys() {
            RelationKeys::MorphMany(keys) => {
                assert_eq!(keys.id_column, "imageable_id");
                assert_eq!(keys.type_column, "imageable_type");
                assert_eq!(keys.morph_class.as_deref(), Some("post"));
            }
            other => panic!("unexpected keys: {other:?}"),
        }
    }

    #[test]
    fn test_morph_to_targeting() {
        let rel = RelationDef::morph_to("commentable", "id");
        assert!(rel.related().is_none());

        let rel = rel.targeting("Post", "post");
        assert_eq!(rel.related(), Some("Post"));
    }

    #[test]
    fn test_targeting_ignored_for_other_kinds() {
        let rel = RelationDef::belongs_to("User", "author_id", "id").targeting("Company", "company");
        assert_eq!(rel.related(), Some("User"));
    }

    #[test]
    fn test_constraint_helpers() {
        let rel = RelationDef::has_many("Comment", "post_id", "id")
            .where_eq("approved", true)
            .where_null("flagged_at");
        assert_eq!(rel.constraints().len(), 2);
        assert_eq!(rel.constraints()[1], Constraint::Null("flagged_at".to_string()));
    }
}
