//! Relations between models.
//!
//! - **Definitions** (`def`): `RelationType`, `RelationDef`, relationship constraints
//! - **Descriptors** (`descriptor`): normalized join layout of one relation hop

pub mod def;
pub mod descriptor;

#[doc(inline)]
pub use def::{Constraint, JoinShape, MorphKeys, RelationDef, RelationKeys, RelationType, ThroughKeys};
#[doc(inline)]
pub use descriptor::{resolve, JoinStep, KeyColumn, KeyPair, RelationDescriptor, Side, TableRefs};
