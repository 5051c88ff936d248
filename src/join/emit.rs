//! Join emission for a resolved relation.

use crate::join::{AliasGenerator, JoinCache, JoinRecord, JoinSignature};
use crate::query::{ColumnRef, JoinClause, Predicate, SelectQuery};
use crate::relation::{RelationDescriptor, Side, TableRefs};

/// Append the LEFT JOIN(s) for `descriptor` hanging off `parent_ref`.
///
/// The far table is joined under `alias` when one is given. A pivot or
/// intermediate table that is already referenced by the query gets a fresh
/// alias. Soft-delete guards and the relation's own constraints are added to
/// the join clauses unless an identical predicate is already present. The
/// emitted join is recorded in `cache`.
pub fn emit_join(
    query: &mut SelectQuery,
    cache: &mut JoinCache,
    aliases: &mut AliasGenerator,
    descriptor: &RelationDescriptor,
    parent_ref: &str,
    alias: Option<String>,
) -> JoinRecord {
    let through = descriptor.through_table.as_ref().map(|table| {
        if query.is_reference_taken(table) {
            aliases.next_alias(query)
        } else {
            table.clone()
        }
    });
    let refs = TableRefs {
        parent: parent_ref.to_string(),
        through,
        related: alias.unwrap_or_else(|| descriptor.related_table.clone()),
    };

    for step in &descriptor.steps {
        let reference = refs.resolve(step.side).to_string();
        let mut join = JoinClause::left(step.table.clone());
        if reference != step.table {
            join = join.alias(reference.clone());
        }
        for pair in &step.on {
            join = join.on(pair.to_predicate(&refs));
        }
        if let Some(deleted_at) = &step.soft_delete {
            join.add_condition(Predicate::is_null(ColumnRef::new(reference.clone(), deleted_at.clone())));
        }
        if step.side == Side::Related {
            for predicate in descriptor.constraint_predicates(&refs) {
                if !query.has_where(&predicate) {
                    join.add_condition(predicate);
                }
            }
        }
        log::debug!(
            "Joining {} as {} for relation '{}' of {}",
            step.table,
            reference,
            descriptor.name,
            descriptor.parent_model
        );
        query.add_join(join);
    }

    let record = JoinRecord {
        signature: JoinSignature::new(descriptor, parent_ref),
        reference: refs.related,
        through_reference: refs.through,
    };
    cache.record(record.clone());
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ModelDef, Schema};
    use crate::relation::{resolve, RelationDef};

    fn schema() -> Schema {
        Schema::new()
            .with(
                ModelDef::new("Post", "posts")
                    .relation("author", RelationDef::belongs_to("User", "author_id", "id"))
                    .relation(
                        "comments",
                        RelationDef::has_many("Comment", "post_id", "id")
                            .where_eq("approved", true)
                            .where_null("post_id"),
                    )
                    .relation("tags", RelationDef::belongs_to_many("Tag", "post_tag", "post_id", "tag_id")),
            )
            .with(ModelDef::new("User", "users").soft_deletes())
            .with(ModelDef::new("Comment", "comments"))
            .with(ModelDef::new("Tag", "tags"))
    }

    fn emit(query: &mut SelectQuery, cache: &mut JoinCache, accessor: &str, alias: Option<&str>) -> JoinRecord {
        let schema = schema();
        let post = schema.model("Post").unwrap();
        let descriptor = resolve(&schema, post, accessor).unwrap();
        let mut aliases = AliasGenerator::new();
        emit_join(query, cache, &mut aliases, &descriptor, "posts", alias.map(str::to_string))
    }

    #[test]
    fn test_belongs_to_with_soft_delete_guard() {
        let mut query = SelectQuery::new("posts");
        let mut cache = JoinCache::new();
        let record = emit(&mut query, &mut cache, "author", None);

        assert_eq!(record.reference, "users");
        assert_eq!(cache.len(), 1);
        let join = &query.joins()[0];
        assert_eq!(join.table, "users");
        assert!(join.alias.is_none());
        assert_eq!(
            join.on,
            vec![Predicate::Columns {
                left: ColumnRef::new("users", "id"),
                right: ColumnRef::new("posts", "author_id"),
            }]
        );
        assert_eq!(join.conditions, vec![Predicate::is_null(ColumnRef::new("users", "deleted_at"))]);
    }

    #[test]
    fn test_aliased_join_qualifies_with_alias() {
        let mut query = SelectQuery::new("posts");
        let mut cache = JoinCache::new();
        emit(&mut query, &mut cache, "author", Some("j0"));

        let join = &query.joins()[0];
        assert_eq!(join.table_or_alias(), "j0");
        assert!(join.has_condition(&Predicate::is_null(ColumnRef::new("j0", "deleted_at"))));
    }

    #[test]
    fn test_constraints_propagate_without_key_nulls() {
        let mut query = SelectQuery::new("posts");
        let mut cache = JoinCache::new();
        emit(&mut query, &mut cache, "comments", None);

        assert_eq!(
            query.joins()[0].conditions,
            vec![Predicate::eq(ColumnRef::new("comments", "approved"), true)]
        );
    }

    #[test]
    fn test_constraint_already_in_where_is_skipped() {
        let mut query = SelectQuery::new("posts").filter(Predicate::eq(ColumnRef::new("comments", "approved"), true));
        let mut cache = JoinCache::new();
        emit(&mut query, &mut cache, "comments", None);
        assert!(query.joins()[0].conditions.is_empty());
    }

    #[test]
    fn test_pivot_emits_two_joins() {
        let mut query = SelectQuery::new("posts");
        let mut cache = JoinCache::new();
        let record = emit(&mut query, &mut cache, "tags", None);

        assert_eq!(query.joins().len(), 2);
        assert_eq!(query.joins()[0].table, "post_tag");
        assert_eq!(query.joins()[1].table, "tags");
        assert_eq!(record.through_reference.as_deref(), Some("post_tag"));
        assert_eq!(
            query.joins()[1].on,
            vec![Predicate::Columns {
                left: ColumnRef::new("tags", "id"),
                right: ColumnRef::new("post_tag", "tag_id"),
            }]
        );
    }
}
