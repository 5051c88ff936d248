//! Sort scope: `ORDER BY` in request order.

use crate::error::TraverseError;
use crate::feature::{ensure_base_select, Feature};
use crate::query::{SelectQuery, SortDirection};
use crate::traverse::Traversal;
use serde_json::{Map, Value as JsonValue};

pub(crate) fn apply(
    traversal: &mut Traversal<'_>,
    query: &mut SelectQuery,
    sort: &Map<String, JsonValue>,
) -> Result<(), TraverseError> {
    let Some(allowed) = traversal.allowed(Feature::Sort)? else {
        return Ok(());
    };
    if sort.is_empty() {
        return Ok(());
    }
    ensure_base_select(query);

    for (path, value) in sort {
        if !allowed.contains(path) {
            log::debug!("Skipping sort on '{}': not sortable", path);
            continue;
        }
        let Some(direction) = value.as_str().and_then(SortDirection::parse) else {
            log::debug!("Skipping sort on '{}': invalid direction {}", path, value);
            continue;
        };
        let column = traversal.qualify(query, path)?;
        query.add_order(column, direction);
    }
    Ok(())
}
