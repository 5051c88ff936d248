//! Filter scope: equality, `IN` and null checks.

use crate::error::TraverseError;
use crate::feature::{ensure_base_select, Feature};
use crate::query::{ColumnRef, Predicate, Scalar, SelectQuery};
use crate::traverse::Traversal;
use serde_json::{Map, Value as JsonValue};

/// Request value marking an `IS NULL` filter
pub const NULL_MARKER: &str = "{null}";
/// Request value marking an `IS NOT NULL` filter
pub const NOT_NULL_MARKER: &str = "{!null}";

/// Parsed value of one filter entry
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Null,
    NotNull,
    In(Vec<Scalar>),
    Eq(Scalar),
}

impl FilterValue {
    /// `None` when the value cannot be filtered on
    pub fn parse(value: &JsonValue) -> Option<Self> {
        match value {
            JsonValue::String(marker) if marker == NULL_MARKER => Some(FilterValue::Null),
            JsonValue::String(marker) if marker == NOT_NULL_MARKER => Some(FilterValue::NotNull),
            JsonValue::Array(items) => {
                let values: Vec<Scalar> = items.iter().filter_map(Scalar::from_json).collect();
                (!values.is_empty()).then_some(FilterValue::In(values))
            }
            other => Scalar::from_json(other).map(FilterValue::Eq),
        }
    }

    pub fn predicate(self, column: ColumnRef) -> Predicate {
        match self {
            FilterValue::Null => Predicate::is_null(column),
            FilterValue::NotNull => Predicate::is_not_null(column),
            FilterValue::In(values) => Predicate::In { column, values },
            FilterValue::Eq(value) => Predicate::eq(column, value),
        }
    }
}

/// Predicate for one filter entry; `None` when the value cannot be filtered on
pub fn filter_predicate(column: ColumnRef, value: &JsonValue) -> Option<Predicate> {
    FilterValue::parse(value).map(|parsed| parsed.predicate(column))
}

pub(crate) fn apply(
    traversal: &mut Traversal<'_>,
    query: &mut SelectQuery,
    filter: &Map<String, JsonValue>,
) -> Result<(), TraverseError> {
    let Some(allowed) = traversal.allowed(Feature::Filter)? else {
        return Ok(());
    };
    if filter.is_empty() {
        return Ok(());
    }
    ensure_base_select(query);

    for (path, value) in filter {
        if !allowed.contains(path) {
            log::debug!("Skipping filter on '{}': not filterable", path);
            continue;
        }
        let Some(parsed) = FilterValue::parse(value) else {
            log::debug!("Skipping filter on '{}': unsupported value {}", path, value);
            continue;
        };
        let predicate = parsed.predicate(traversal.qualify(query, path)?);
        if !query.has_where(&predicate) {
            query.add_where(predicate);
        }
    }
    Ok(())
}
