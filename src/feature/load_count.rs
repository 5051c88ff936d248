//! Load-count scope: one count-aggregate column per allowed relation.

use crate::error::TraverseError;
use crate::feature::{ensure_base_select, intersect, Feature};
use crate::query::{CountLoad, SelectQuery};
use crate::relation::resolve;
use crate::traverse::Traversal;

pub(crate) fn apply(
    traversal: &mut Traversal<'_>,
    query: &mut SelectQuery,
    relations: &[String],
) -> Result<(), TraverseError> {
    let Some(allowed) = traversal.allowed(Feature::LoadCount)? else {
        return Ok(());
    };
    let counted = intersect(&allowed, relations);
    if counted.is_empty() {
        return Ok(());
    }
    ensure_base_select(query);

    let root = traversal.root();
    for relation in counted {
        let descriptor = resolve(traversal.schema(), root, &relation)?;
        query.add_count(CountLoad {
            relation,
            descriptor,
            parent: root.table().to_string(),
        });
    }
    Ok(())
}
