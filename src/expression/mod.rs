//! Expression validation and internal representation.
//!
//! Raw, untrusted JSON expressions are validated once into an [`Expression`]
//! tree. All value-shape shorthand (bare literal = `$eq`, bare array = OR
//! over membership, nested plain objects = dot-path conditions) is resolved
//! here so the matcher never re-inspects shapes per record.

pub mod ast;
pub mod validate;

pub use ast::{ConditionValue, Expression, OperatorCond};
pub use validate::validate;
