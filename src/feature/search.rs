//! Search scope.
//!
//! All searchable columns, across every allowed relation path, are
//! concatenated into one `CONCAT_WS(' ', ...)` expression which each keyword
//! is matched against with `LIKE` (`ILIKE` on PostgreSQL). Paths are sorted,
//! deduplicated and grouped by relation chain so each chain is walked once.
//!
//! With `search_with_prefix` enabled, a model's primary key is searched as a
//! `PREFIX-<id>` label. The prefix is the model's id prefix, or the first
//! letter of its table, upper-cased.

use crate::config::TraversifyConfig;
use crate::error::TraverseError;
use crate::feature::{ensure_base_select, Feature};
use crate::join::{split_path, Resolved};
use crate::query::{Predicate, Scalar, SelectQuery};
use crate::traverse::Traversal;

/// Searchable columns grouped by relation path (`""` for the root model)
pub fn group_paths(paths: &[String]) -> Result<Vec<(String, Vec<String>)>, TraverseError> {
    let mut sorted: Vec<&String> = paths.iter().collect();
    sorted.sort();
    sorted.dedup();

    let mut groups: Vec<(String, Vec<String>)> = Vec::new();
    for path in sorted {
        let (relations, column) = split_path(path)?;
        let relation = relations.join(".");
        match groups.iter_mut().find(|(existing, _)| *existing == relation) {
            Some((_, columns)) => columns.push(column.to_string()),
            None => groups.push((relation, vec![column.to_string()])),
        }
    }
    Ok(groups)
}

/// SQL for one searchable column of the model reached by `resolved`
fn search_column(resolved: &Resolved<'_>, column: &str, config: &TraversifyConfig) -> String {
    let backend = config.backend;
    let model = resolved.model;
    if !(config.search_with_prefix && column == model.key_name()) {
        return backend.quote_column(&resolved.reference, column);
    }

    let prefix = match model.search_prefix() {
        Some(prefix) => prefix.to_uppercase(),
        None => model
            .table()
            .chars()
            .next()
            .map(|c| c.to_uppercase().collect())
            .unwrap_or_default(),
    };
    let id_column = model.search_id_column().unwrap_or(column);
    format!(
        "CONCAT('{}-', {})",
        prefix.replace('\'', "''"),
        backend.quote_column(&resolved.reference, id_column)
    )
}

pub(crate) fn apply(
    traversal: &mut Traversal<'_>,
    query: &mut SelectQuery,
    keywords: &[String],
) -> Result<(), TraverseError> {
    let Some(allowed) = traversal.allowed(Feature::Search)? else {
        return Ok(());
    };
    let keywords: Vec<&String> = keywords.iter().filter(|k| !k.is_empty()).collect();
    if keywords.is_empty() {
        return Ok(());
    }
    ensure_base_select(query);

    let config = traversal.config().clone();
    let mut columns = Vec::new();
    for (relation, names) in group_paths(&allowed)? {
        let relations: Vec<&str> = if relation.is_empty() {
            Vec::new()
        } else {
            relation.split('.').collect()
        };
        let resolved = traversal.walk(query, &relations)?;
        columns.extend(names.iter().map(|name| search_column(&resolved, name, &config)));
    }

    let sql = format!(
        "CONCAT_WS(' ', {}) {} ?",
        columns.join(", "),
        config.backend.like_operator()
    );
    for keyword in keywords {
        let predicate = Predicate::Raw {
            sql: sql.clone(),
            values: vec![Scalar::Text(format!("%{keyword}%"))],
        };
        if !query.has_where(&predicate) {
            query.add_where(predicate);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelDef;
    use crate::query::Backend;

    #[test]
    fn test_group_paths_sorts_and_groups() {
        let paths: Vec<String> = ["title", "author.name", "body", "author.email", "title"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let groups = group_paths(&paths).unwrap();
        assert_eq!(
            groups,
            vec![
                ("author".to_string(), vec!["email".to_string(), "name".to_string()]),
                (String::new(), vec!["body".to_string(), "title".to_string()]),
            ]
        );
    }

    #[test]
    fn test_group_paths_rejects_empty_segment() {
        let paths = vec!["author..name".to_string()];
        assert!(matches!(group_paths(&paths), Err(TraverseError::InvalidPath(_))));
    }

    #[test]
    fn test_prefixed_id_column() {
        let model = ModelDef::new("Post", "posts");
        let resolved = Resolved {
            model: &model,
            reference: "posts".to_string(),
        };
        let config = TraversifyConfig::default().with_search_prefix(true);
        assert_eq!(search_column(&resolved, "id", &config), r#"CONCAT('P-', "posts"."id")"#);
        assert_eq!(search_column(&resolved, "title", &config), r#""posts"."title""#);

        let config = TraversifyConfig::default();
        assert_eq!(search_column(&resolved, "id", &config), r#""posts"."id""#);
    }

    #[test]
    fn test_prefix_and_id_column_overrides() {
        let model = ModelDef::new("Invoice", "invoices").id_prefix("inv").id_column("number");
        let resolved = Resolved {
            model: &model,
            reference: "j0".to_string(),
        };
        let config = TraversifyConfig::default()
            .with_search_prefix(true)
            .with_backend(Backend::MySql);
        assert_eq!(search_column(&resolved, "id", &config), "CONCAT('INV-', `j0`.`number`)");
    }
}
