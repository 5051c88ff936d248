//! Relation join resolution and deduplication.
//!
//! - **Alias** (`alias`): deterministic `j0`, `j1`, ... aliases
//! - **Cache** (`cache`): join signatures and the existence check
//! - **Emit** (`emit`): LEFT JOIN clauses for a relation descriptor
//! - **Walker** (`walker`): dot-path walking over the relation graph

pub mod alias;
pub mod cache;
pub mod emit;
pub mod walker;

#[doc(inline)]
pub use alias::AliasGenerator;
#[doc(inline)]
pub use cache::{JoinCache, JoinRecord, JoinSignature, JoinVerdict};
#[doc(inline)]
pub use emit::emit_join;
#[doc(inline)]
pub use walker::{split_path, JoinContext, Resolved};
