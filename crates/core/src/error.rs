use crate::doctype::{DocType, Field};
use crate::document::RowId;

/// Errors raised when a document is read or mutated outside its schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    /// The field is not declared on the document type.
    #[error("field '{field}' is not defined on {doctype}")]
    UnknownField { doctype: DocType, field: Field },

    /// No row with this id exists in the document.
    #[error("row {row} not found in {doctype} '{name}'")]
    UnknownRow {
        doctype: DocType,
        name: String,
        row: RowId,
    },

    /// A row operation named a scalar field.
    #[error("field '{field}' on {doctype} is not a child table")]
    NotATable { doctype: DocType, field: Field },

    /// A value operation named a child table.
    #[error("field '{field}' on {doctype} is a child table")]
    IsATable { doctype: DocType, field: Field },

    /// The grid only accepts programmatically derived rows.
    #[error("rows cannot be added manually to '{field}' on {doctype}")]
    RowAddNotAllowed { doctype: DocType, field: Field },

    /// Unknown document type name in JSON input.
    #[error("unknown document type '{0}'")]
    UnknownDocType(String),

    /// A value could not be parsed for its field kind.
    #[error("invalid value: {message}")]
    InvalidValue { message: String },

    /// Structural problem in document JSON.
    #[error("invalid document JSON: {message}")]
    InvalidJson { message: String },
}
