//! Request data merging and validation.
//!
//! # Data Flow
//! ```text
//! Admitted request
//!     → extract.rs (path params, query string, JSON body)
//!     → merge.rs (ordered, last-wins merge into one object)
//!     → schema.rs (field rules → typed value or field errors)
//!     → handler, or 400 VALIDATION_ERROR
//! ```

pub mod extract;
pub mod merge;
pub mod schema;

pub use extract::{RequestInput, Validated};
pub use merge::{RequestDataMerger, RequestSources, Source, DEFAULT_TARGETS};
pub use schema::{Field, FieldError, ObjectSchema, Schema, Typed};
