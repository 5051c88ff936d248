//! Range scope: two-sided `BETWEEN`.

use crate::error::TraverseError;
use crate::feature::{ensure_base_select, Feature};
use crate::query::{ColumnRef, Predicate, Scalar, SelectQuery};
use crate::traverse::Traversal;
use serde_json::{Map, Value as JsonValue};

/// Exactly two scalar boundaries
pub fn boundaries(value: &JsonValue) -> Option<(Scalar, Scalar)> {
    match value.as_array().map(Vec::as_slice) {
        Some([low, high]) => Some((Scalar::from_json(low)?, Scalar::from_json(high)?)),
        _ => None,
    }
}

/// `BETWEEN` predicate for a range entry
pub fn range_predicate(column: ColumnRef, value: &JsonValue) -> Option<Predicate> {
    let (low, high) = boundaries(value)?;
    Some(Predicate::Between { column, low, high })
}

pub(crate) fn apply(
    traversal: &mut Traversal<'_>,
    query: &mut SelectQuery,
    range: &Map<String, JsonValue>,
) -> Result<(), TraverseError> {
    let Some(allowed) = traversal.allowed(Feature::Range)? else {
        return Ok(());
    };
    if range.is_empty() {
        return Ok(());
    }
    ensure_base_select(query);

    for (path, value) in range {
        if !allowed.contains(path) {
            log::debug!("Skipping range on '{}': not rangeable", path);
            continue;
        }
        let Some((low, high)) = boundaries(value) else {
            log::debug!("Skipping range on '{}': expected two boundaries, got {}", path, value);
            continue;
        };
        let column = traversal.qualify(query, path)?;
        let predicate = Predicate::Between { column, low, high };
        if !query.has_where(&predicate) {
            query.add_where(predicate);
        }
    }
    Ok(())
}
