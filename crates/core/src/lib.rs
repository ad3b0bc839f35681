//! hrforms-core: typed document model for HR travel form rules.
//!
//! Documents are addressed through enumerated [`Field`] identifiers checked
//! against a per-[`DocType`] schema. Values are [`Value`]s with permissive
//! numeric and date coercions, matching how the host framework casts form
//! input.

pub mod doctype;
pub mod document;
pub mod error;
pub mod value;

pub use doctype::{DocStatus, DocType, Field, FieldKind};
pub use document::{ChildRow, Document, RowId, RowOrigin, Target};
pub use error::DocumentError;
pub use value::{flt_json, format_date, parse_date, Value};
