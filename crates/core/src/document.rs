//! In-progress form instances: scalar fields, child tables and UI state.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::doctype::{DocStatus, DocType, Field, FieldKind};
use crate::error::DocumentError;
use crate::value::Value;

static NULL: Value = Value::Null;

// ──────────────────────────────────────────────
// Row identity and addressing
// ──────────────────────────────────────────────

/// Stable identity of a child row within its parent document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowId(pub u32);

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row-{}", self.0)
    }
}

/// Where a field lives: on the parent document or on one of its rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Target {
    Parent,
    Row(RowId),
}

/// Who is adding a row. Locked grids only accept derived rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOrigin {
    User,
    Derived,
}

/// A record nested under a parent document's table field.
#[derive(Debug, Clone, PartialEq)]
pub struct ChildRow {
    id: RowId,
    doctype: DocType,
    fields: BTreeMap<Field, Value>,
}

impl ChildRow {
    pub fn id(&self) -> RowId {
        self.id
    }

    pub fn doctype(&self) -> DocType {
        self.doctype
    }

    pub fn get(&self, field: Field) -> &Value {
        self.fields.get(&field).unwrap_or(&NULL)
    }
}

// ──────────────────────────────────────────────
// UI state
// ──────────────────────────────────────────────

/// Presentation hints the host surface renders. The engine only records
/// them; it never draws anything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UiState {
    hidden: BTreeSet<Field>,
    descriptions: BTreeMap<Field, String>,
    row_add_disabled: BTreeSet<Field>,
}

// ──────────────────────────────────────────────
// Document
// ──────────────────────────────────────────────

/// One editable form instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    doctype: DocType,
    name: String,
    docstatus: DocStatus,
    fields: BTreeMap<Field, Value>,
    tables: BTreeMap<Field, Vec<ChildRow>>,
    ui: UiState,
    next_row: u32,
}

impl Document {
    pub fn new(doctype: DocType, name: impl Into<String>) -> Self {
        Document {
            doctype,
            name: name.into(),
            docstatus: DocStatus::Draft,
            fields: BTreeMap::new(),
            tables: BTreeMap::new(),
            ui: UiState::default(),
            next_row: 1,
        }
    }

    pub fn doctype(&self) -> DocType {
        self.doctype
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn docstatus(&self) -> DocStatus {
        self.docstatus
    }

    pub fn set_docstatus(&mut self, status: DocStatus) {
        self.docstatus = status;
    }

    /// The document type whose schema governs `target`.
    pub fn doctype_of(&self, target: Target) -> Result<DocType, DocumentError> {
        match target {
            Target::Parent => Ok(self.doctype),
            Target::Row(id) => self
                .row(id)
                .map(ChildRow::doctype)
                .ok_or_else(|| self.unknown_row(id)),
        }
    }

    /// Read a field, checking it against the schema.
    pub fn get(&self, target: Target, field: Field) -> Result<&Value, DocumentError> {
        let doctype = self.doctype_of(target)?;
        match doctype.kind_of(field) {
            None => return Err(DocumentError::UnknownField { doctype, field }),
            Some(FieldKind::Table { .. }) => {
                return Err(DocumentError::IsATable { doctype, field })
            }
            Some(_) => {}
        }
        Ok(self.value(target, field))
    }

    /// Read a field leniently: anything missing reads as `Null`.
    pub fn value(&self, target: Target, field: Field) -> &Value {
        match target {
            Target::Parent => self.fields.get(&field).unwrap_or(&NULL),
            Target::Row(id) => self.row(id).map(|r| r.get(field)).unwrap_or(&NULL),
        }
    }

    /// Write a field. Returns `true` if the stored value changed; writing
    /// an identical value is a no-op.
    pub fn set(
        &mut self,
        target: Target,
        field: Field,
        value: Value,
    ) -> Result<bool, DocumentError> {
        let doctype = self.doctype_of(target)?;
        match doctype.kind_of(field) {
            None => return Err(DocumentError::UnknownField { doctype, field }),
            Some(FieldKind::Table { .. }) => {
                return Err(DocumentError::IsATable { doctype, field })
            }
            Some(_) => {}
        }

        let slot = match target {
            Target::Parent => &mut self.fields,
            Target::Row(id) => match self.tables.values_mut().flatten().find(|r| r.id == id) {
                Some(row) => &mut row.fields,
                None => {
                    return Err(DocumentError::UnknownRow {
                        doctype: self.doctype,
                        name: self.name.clone(),
                        row: id,
                    })
                }
            },
        };

        if slot.get(&field).unwrap_or(&NULL) == &value {
            return Ok(false);
        }
        if value == Value::Null {
            slot.remove(&field);
        } else {
            slot.insert(field, value);
        }
        Ok(true)
    }

    /// Append an empty row to a child table.
    pub fn add_row(&mut self, table: Field, origin: RowOrigin) -> Result<RowId, DocumentError> {
        self.add_row_with(table, origin, std::iter::empty())
    }

    /// Append a row with initial values to a child table.
    pub fn add_row_with(
        &mut self,
        table: Field,
        origin: RowOrigin,
        values: impl IntoIterator<Item = (Field, Value)>,
    ) -> Result<RowId, DocumentError> {
        let (child, allow_user_rows) = match self.doctype.kind_of(table) {
            Some(FieldKind::Table {
                child,
                allow_user_rows,
            }) => (child, allow_user_rows),
            Some(_) => {
                return Err(DocumentError::NotATable {
                    doctype: self.doctype,
                    field: table,
                })
            }
            None => {
                return Err(DocumentError::UnknownField {
                    doctype: self.doctype,
                    field: table,
                })
            }
        };
        if origin == RowOrigin::User && !allow_user_rows {
            return Err(DocumentError::RowAddNotAllowed {
                doctype: self.doctype,
                field: table,
            });
        }

        let mut fields = BTreeMap::new();
        for (field, value) in values {
            if child.kind_of(field).is_none() {
                return Err(DocumentError::UnknownField {
                    doctype: child,
                    field,
                });
            }
            if value != Value::Null {
                fields.insert(field, value);
            }
        }

        let id = RowId(self.next_row);
        self.next_row += 1;
        self.tables.entry(table).or_default().push(ChildRow {
            id,
            doctype: child,
            fields,
        });
        Ok(id)
    }

    /// Rows of a child table, in order.
    pub fn rows(&self, table: Field) -> Result<&[ChildRow], DocumentError> {
        match self.doctype.kind_of(table) {
            Some(FieldKind::Table { .. }) => Ok(self
                .tables
                .get(&table)
                .map(Vec::as_slice)
                .unwrap_or(&[])),
            Some(_) => Err(DocumentError::NotATable {
                doctype: self.doctype,
                field: table,
            }),
            None => Err(DocumentError::UnknownField {
                doctype: self.doctype,
                field: table,
            }),
        }
    }

    pub fn row(&self, id: RowId) -> Option<&ChildRow> {
        self.tables.values().flatten().find(|r| r.id == id)
    }

    /// The table a row belongs to and its 1-based position in it.
    pub fn locate(&self, id: RowId) -> Option<(Field, usize)> {
        self.tables.iter().find_map(|(table, rows)| {
            rows.iter()
                .position(|r| r.id == id)
                .map(|pos| (*table, pos + 1))
        })
    }

    /// Id of the row at a 0-based position in a table.
    pub fn row_at(&self, table: Field, index: usize) -> Option<RowId> {
        self.tables.get(&table)?.get(index).map(ChildRow::id)
    }

    fn unknown_row(&self, row: RowId) -> DocumentError {
        DocumentError::UnknownRow {
            doctype: self.doctype,
            name: self.name.clone(),
            row,
        }
    }

    // ── UI state ────────────────────────────────────────────────────────

    pub fn is_hidden(&self, field: Field) -> bool {
        self.ui.hidden.contains(&field)
    }

    pub fn set_hidden(&mut self, field: Field, hidden: bool) {
        if hidden {
            self.ui.hidden.insert(field);
        } else {
            self.ui.hidden.remove(&field);
        }
    }

    pub fn description(&self, field: Field) -> Option<&str> {
        self.ui.descriptions.get(&field).map(String::as_str)
    }

    /// Set the help text shown under a field. Empty text clears it.
    pub fn set_description(&mut self, field: Field, text: impl Into<String>) {
        let text = text.into();
        if text.is_empty() {
            self.ui.descriptions.remove(&field);
        } else {
            self.ui.descriptions.insert(field, text);
        }
    }

    pub fn is_row_add_disabled(&self, table: Field) -> bool {
        self.ui.row_add_disabled.contains(&table)
    }

    pub fn disable_row_add(&mut self, table: Field) {
        self.ui.row_add_disabled.insert(table);
    }

    // ── JSON ────────────────────────────────────────────────────────────

    /// Parse a document from its JSON form:
    /// `{"doctype", "name", "docstatus", "fields": {..}, "tables": {"items": [{..}]}}`.
    pub fn from_json(v: &serde_json::Value) -> Result<Document, DocumentError> {
        let doctype_name = get_str(v, "doctype")?;
        let doctype = DocType::from_name(doctype_name)
            .ok_or_else(|| DocumentError::UnknownDocType(doctype_name.to_string()))?;
        if doctype.is_child() {
            return Err(DocumentError::InvalidJson {
                message: format!("{} cannot be edited as a standalone document", doctype),
            });
        }
        let name = v.get("name").and_then(|n| n.as_str()).unwrap_or("");
        let mut doc = Document::new(doctype, name);

        if let Some(code) = v.get("docstatus") {
            let status = code
                .as_i64()
                .and_then(DocStatus::from_code)
                .ok_or_else(|| DocumentError::InvalidJson {
                    message: format!("invalid docstatus {}", code),
                })?;
            doc.docstatus = status;
        }

        if let Some(fields) = v.get("fields") {
            for (field, value) in parse_fields(fields, doctype)? {
                doc.set(Target::Parent, field, value)?;
            }
        }

        if let Some(tables) = v.get("tables") {
            let tables = tables.as_object().ok_or_else(|| DocumentError::InvalidJson {
                message: "'tables' must be an object".to_string(),
            })?;
            for (table_name, rows) in tables {
                let table = field_named(table_name)?;
                let child = match doctype.kind_of(table) {
                    Some(FieldKind::Table { child, .. }) => child,
                    Some(_) => return Err(DocumentError::NotATable { doctype, field: table }),
                    None => return Err(DocumentError::UnknownField { doctype, field: table }),
                };
                let rows = rows.as_array().ok_or_else(|| DocumentError::InvalidJson {
                    message: format!("table '{}' must be an array", table_name),
                })?;
                for row in rows {
                    let values = parse_fields(row, child)?;
                    doc.add_row_with(table, RowOrigin::Derived, values)?;
                }
            }
        }

        Ok(doc)
    }

    /// Serialize to the JSON form accepted by [`Document::from_json`].
    pub fn to_json(&self) -> serde_json::Value {
        let fields: serde_json::Map<String, serde_json::Value> = self
            .fields
            .iter()
            .map(|(f, v)| (f.as_str().to_string(), v.to_json()))
            .collect();
        let tables: serde_json::Map<String, serde_json::Value> = self
            .tables
            .iter()
            .map(|(table, rows)| {
                let rows: Vec<serde_json::Value> = rows
                    .iter()
                    .map(|r| {
                        let obj: serde_json::Map<String, serde_json::Value> = r
                            .fields
                            .iter()
                            .map(|(f, v)| (f.as_str().to_string(), v.to_json()))
                            .collect();
                        serde_json::Value::Object(obj)
                    })
                    .collect();
                (table.as_str().to_string(), serde_json::Value::Array(rows))
            })
            .collect();

        serde_json::json!({
            "doctype": self.doctype.as_str(),
            "name": self.name,
            "docstatus": self.docstatus.code(),
            "fields": fields,
            "tables": tables,
        })
    }
}

fn get_str<'a>(obj: &'a serde_json::Value, key: &str) -> Result<&'a str, DocumentError> {
    obj.get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| DocumentError::InvalidJson {
            message: format!("missing string field '{}'", key),
        })
}

fn field_named(name: &str) -> Result<Field, DocumentError> {
    Field::from_name(name).ok_or_else(|| DocumentError::InvalidJson {
        message: format!("unknown field '{}'", name),
    })
}

fn parse_fields(
    obj: &serde_json::Value,
    doctype: DocType,
) -> Result<Vec<(Field, Value)>, DocumentError> {
    let obj = obj.as_object().ok_or_else(|| DocumentError::InvalidJson {
        message: format!("{} fields must be an object", doctype),
    })?;
    let mut out = Vec::with_capacity(obj.len());
    for (name, raw) in obj {
        let field = field_named(name)?;
        let kind = doctype
            .kind_of(field)
            .ok_or(DocumentError::UnknownField { doctype, field })?;
        out.push((field, Value::from_json(raw, kind)?));
    }
    Ok(out)
}
