//! Query building for traversal scopes.
//!
//! The module follows the usual split of a query builder:
//! - **Predicate**: clause model (`Predicate`, `Scalar`, `Operator`, `ColumnRef`)
//! - **Select**: the introspectable `SelectQuery` builder
//! - **Backend**: SQL dialect selection
//! - **Render**: conversion to SeaQuery statements

pub mod backend;
pub mod predicate;
pub mod select;
mod render;

#[doc(inline)]
pub use backend::Backend;
#[doc(inline)]
pub use predicate::{ColumnRef, Operator, Predicate, Scalar};
#[doc(inline)]
pub use select::{
    CountLoad, JoinClause, JoinKind, OrderClause, SelectItem, SelectQuery, SortDirection, TrashedScope,
};
