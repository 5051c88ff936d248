//! Join existence checking.
//!
//! The query only records table names and aliases for its joins, which cannot
//! tell two joins of the same table apart. Every join the traversal emits is
//! therefore recorded here together with the key pairs that produced it, and
//! equivalence is decided against these records.

use crate::query::SelectQuery;
use crate::relation::{JoinShape, KeyPair, RelationDescriptor, RelationType};

/// Identity of a relation join: kind, endpoint tables and key pairs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinSignature {
    pub kind: RelationType,
    /// Table-or-alias the join hangs off
    pub parent_ref: String,
    /// Base names of `[parent, related]`
    pub tables: [String; 2],
    /// Base name of the pivot/intermediate table
    pub through: Option<String>,
    /// Key pairs in base-table terms
    pub pairs: Vec<KeyPair>,
}

impl JoinSignature {
    pub fn new(descriptor: &RelationDescriptor, parent_ref: impl Into<String>) -> Self {
        Self {
            kind: descriptor.kind,
            parent_ref: parent_ref.into(),
            tables: [descriptor.parent_table.clone(), descriptor.related_table.clone()],
            through: descriptor.through_table.clone(),
            pairs: descriptor.key_pairs().cloned().collect(),
        }
    }

    pub fn shape(&self) -> JoinShape {
        self.kind.shape()
    }

    pub fn same_tables(&self, other: &JoinSignature) -> bool {
        self.tables == other.tables && self.through == other.through
    }

    /// Unqualified key pairs of `self` also present in `other`
    pub fn matched_pairs(&self, other: &JoinSignature) -> usize {
        self.pairs
            .iter()
            .filter(|pair| {
                other
                    .pairs
                    .iter()
                    .any(|candidate| candidate.unqualified() == pair.unqualified())
            })
            .count()
    }

    /// Whether a join recorded under `other` already satisfies `self`
    pub fn is_equivalent(&self, other: &JoinSignature) -> bool {
        self.parent_ref == other.parent_ref
            && self.same_tables(other)
            && self.matched_pairs(other) >= self.shape().expected_matches()
    }
}

/// A join the traversal emitted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinRecord {
    pub signature: JoinSignature,
    /// Table-or-alias of the far table
    pub reference: String,
    /// Table-or-alias of the pivot/intermediate table
    pub through_reference: Option<String>,
}

/// Outcome of checking a candidate join
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JoinVerdict {
    /// The far table is already joined, possibly under other keys
    pub table_present: bool,
    /// An existing join satisfying the candidate
    pub equivalent: Option<JoinRecord>,
}

/// Joins emitted during one traversal
#[derive(Debug, Clone, Default)]
pub struct JoinCache {
    records: Vec<JoinRecord>,
}

impl JoinCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&self, query: &SelectQuery, candidate: &JoinSignature) -> JoinVerdict {
        let [_, far] = &candidate.tables;
        let mut verdict = JoinVerdict {
            table_present: query.has_joined_table(far),
            equivalent: None,
        };
        for record in &self.records {
            if record.signature.tables == candidate.tables {
                verdict.table_present = true;
            }
            if verdict.equivalent.is_none() && candidate.is_equivalent(&record.signature) {
                verdict.equivalent = Some(record.clone());
            }
        }
        verdict
    }

    /// Record an emitted join; a join equivalent to a recorded one is ignored
    pub fn record(&mut self, record: JoinRecord) -> bool {
        if self
            .records
            .iter()
            .any(|existing| record.signature.is_equivalent(&existing.signature))
        {
            return false;
        }
        self.records.push(record);
        true
    }

    pub fn records(&self) -> &[JoinRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
