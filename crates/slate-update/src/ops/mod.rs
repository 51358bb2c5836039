//! Operator handlers. Each returns `Ok(true)` when the document changed.

pub(crate) mod array;
pub(crate) mod field;
