//! MongoDB-style update operators over BSON documents.
//!
//! ```
//! use slate_update::{UpdateOptions, apply_updates, doc};
//!
//! let updated = apply_updates(
//!     &doc! { "n": 1, "tags": ["a"] },
//!     &[doc! { "$inc": { "n": 2 }, "$addToSet": { "tags": "b" } }],
//!     &UpdateOptions::default(),
//! )
//! .unwrap();
//! assert_eq!(updated, doc! { "n": 3, "tags": ["a", "b"] });
//! ```

pub mod condition;
mod error;
mod operator;
mod ops;
mod options;
pub mod path;
mod pipeline;
mod spec;
pub mod value;

pub use bson::{Bson, Document, doc};
pub use error::{ErrorKind, UpdateError};
pub use operator::UpdateOperator;
pub use ops::array::{PopEnd, PushSort, PushUpdate, Sort, SortDirection};
pub use ops::field::{BitOp, Bound, DateKind};
pub use options::UpdateOptions;
pub use path::Path;
pub use pipeline::{UpdatePipeline, Updated, apply_updates, validate_document};
pub use spec::{FieldMutation, FieldUpdate, UpdateSpec};
pub use value::{compare, values_equal};
