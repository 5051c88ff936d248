//! Autoload scope: one eager-load instruction for the allowed relations.

use crate::error::TraverseError;
use crate::feature::{ensure_base_select, intersect, Feature};
use crate::query::SelectQuery;
use crate::traverse::Traversal;

pub(crate) fn apply(
    traversal: &mut Traversal<'_>,
    query: &mut SelectQuery,
    relations: &[String],
) -> Result<(), TraverseError> {
    let Some(allowed) = traversal.allowed(Feature::Autoload)? else {
        return Ok(());
    };
    let load = intersect(&allowed, relations);
    if !load.is_empty() {
        ensure_base_select(query);
        query.add_with(load);
    }
    Ok(())
}
