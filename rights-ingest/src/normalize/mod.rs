//! Metadata normalization
//!
//! Turns submissions of unknown shape into [`crate::models::CanonicalMetadata`]:
//! - **locator** - dotted-path lookup with "first present alias wins", and path writes
//! - **aliases** - the alias table, one ordered path list per canonical field
//! - **shape** - bare-string or object party entries, converted at ingestion
//! - **detector** - canonical vs. variant classification
//! - **normalizer** - the mapping itself, plus best-effort fill
//! - **resolver** - pluggable source of values for fields the table cannot find
//! - **amend** - field-level corrections to an already canonical record

pub mod aliases;
pub mod amend;
pub mod detector;
pub mod locator;
pub mod normalizer;
pub mod resolver;
pub mod shape;

pub use amend::{apply_updates, AmendError, FieldUpdate, FieldUpdates};
pub use detector::{classify, RecordFormat};
pub use locator::{locate, set_path, PathError};
pub use normalizer::{normalize, normalize_with, FillSource, NormalizationOutcome, NormalizeMode};
pub use resolver::{FieldResolver, NoopResolver};
pub use shape::StringOrStruct;
