//! Relation path walking.
//!
//! Walks the relation segments of a dot-path one hop at a time, reusing joins
//! the traversal already emitted and emitting new ones (aliased where needed)
//! otherwise. The result is the model reached by the last segment and the
//! table-or-alias its columns must be qualified with.

use crate::error::TraverseError;
use crate::join::{emit_join, AliasGenerator, JoinCache, JoinSignature};
use crate::model::{ModelDef, Schema};
use crate::query::{ColumnRef, SelectQuery};
use crate::relation::resolve;
use convert_case::{Case, Casing};

/// End of a walked relation chain
#[derive(Debug, Clone)]
pub struct Resolved<'s> {
    pub model: &'s ModelDef,
    /// Table-or-alias for the model's columns
    pub reference: String,
}

impl Resolved<'_> {
    pub fn column(&self, column: impl Into<String>) -> ColumnRef {
        ColumnRef::new(self.reference.clone(), column)
    }
}

/// Split `a.b.column` into relation segments and the column name
pub fn split_path(path: &str) -> Result<(Vec<&str>, &str), TraverseError> {
    let mut segments: Vec<&str> = path.split('.').collect();
    let column = segments.pop().unwrap_or_default();
    if column.is_empty() || segments.iter().any(|segment| segment.is_empty()) {
        return Err(TraverseError::InvalidPath(path.to_string()));
    }
    Ok((segments, column))
}

/// Path walking state shared by every scope of one traversal
#[derive(Debug, Clone, Default)]
pub struct JoinContext {
    pub cache: JoinCache,
    pub aliases: AliasGenerator,
}

impl JoinContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join along `relations` starting at `root`.
    ///
    /// A segment naming the root table refers to the root itself when it comes
    /// first; further along the chain it forces an alias on its join.
    pub fn walk<'s>(
        &mut self,
        schema: &'s Schema,
        root: &'s ModelDef,
        relations: &[&str],
        query: &mut SelectQuery,
    ) -> Result<Resolved<'s>, TraverseError> {
        let mut model = root;
        let mut reference = root.table().to_string();

        for (idx, segment) in relations.iter().enumerate() {
            if segment.is_empty() {
                return Err(TraverseError::InvalidPath(relations.join(".")));
            }
            let self_reference = segment.to_case(Case::Snake) == root.table();
            if self_reference && idx == 0 {
                continue;
            }

            let descriptor = resolve(schema, model, segment)?;
            let signature = JoinSignature::new(&descriptor, reference.clone());
            let verdict = self.cache.check(query, &signature);

            let record = match verdict.equivalent {
                Some(existing) => {
                    log::debug!(
                        "Reusing join {} for relation '{}' of {}",
                        existing.reference,
                        segment,
                        model.name()
                    );
                    existing
                }
                None => {
                    let alias = if self_reference
                        || verdict.table_present
                        || descriptor.related_table == root.table()
                        || query.is_reference_taken(&descriptor.related_table)
                    {
                        Some(self.aliases.next_alias(query))
                    } else {
                        None
                    };
                    emit_join(query, &mut self.cache, &mut self.aliases, &descriptor, &reference, alias)
                }
            };

            reference = record.reference;
            model = schema.model(&descriptor.related_model)?;
        }

        Ok(Resolved { model, reference })
    }

    /// Walk the relation part of `path` and qualify its column
    pub fn qualify<'s>(
        &mut self,
        schema: &'s Schema,
        root: &'s ModelDef,
        path: &str,
        query: &mut SelectQuery,
    ) -> Result<ColumnRef, TraverseError> {
        let (relations, column) = split_path(path)?;
        Ok(self.walk(schema, root, &relations, query)?.column(column))
    }
}
