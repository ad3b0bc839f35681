pub(crate) mod draft;
pub(crate) mod replay;
pub(crate) mod validate;

use std::path::Path;

use hrforms_core::{Document, FieldKind, Target, Value};
use hrforms_engine::{Diagnostic, HostEffect, Severity};

pub(crate) fn read_json(path: &Path, what: &str) -> Result<serde_json::Value, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|_| format!("error: {} file not found: {}", what, path.display()))?;
    serde_json::from_str(&text)
        .map_err(|e| format!("error: invalid JSON in {}: {}", path.display(), e))
}

pub(crate) fn load_document(path: &Path) -> Result<Document, String> {
    let json = read_json(path, "document")?;
    Document::from_json(&json).map_err(|e| format!("error: {}: {}", path.display(), e))
}

fn show(value: &Value) -> String {
    match value.to_json() {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Human-readable dump of a document, in schema order.
pub(crate) fn print_document(doc: &Document) {
    let status = match doc.docstatus().code() {
        0 => "draft",
        1 => "submitted",
        _ => "cancelled",
    };
    println!("{} {} ({})", doc.doctype(), doc.name(), status);
    for (field, kind) in doc.doctype().schema() {
        if let FieldKind::Table { .. } = kind {
            let rows = doc.rows(*field).unwrap_or(&[]);
            if rows.is_empty() {
                continue;
            }
            println!("  {}:", field);
            for (pos, row) in rows.iter().enumerate() {
                let cells: Vec<String> = row
                    .doctype()
                    .schema()
                    .iter()
                    .filter(|(f, _)| row.get(*f).is_set())
                    .map(|(f, _)| format!("{}={}", f, show(row.get(*f))))
                    .collect();
                println!("    #{} {}", pos + 1, cells.join(", "));
            }
            continue;
        }
        let value = doc.value(Target::Parent, *field);
        if value.is_set() {
            let hidden = if doc.is_hidden(*field) { " (hidden)" } else { "" };
            println!("  {}: {}{}", field, show(value), hidden);
            if let Some(text) = doc.description(*field) {
                println!("    {}", text);
            }
        }
    }
}

pub(crate) fn print_diagnostics(doc: &Document, diagnostics: &[Diagnostic]) {
    for d in diagnostics {
        let level = match d.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        let location = match d.target {
            Target::Parent => String::new(),
            Target::Row(id) => doc
                .locate(id)
                .map(|(table, idx)| format!(" [{} #{}]", table, idx))
                .unwrap_or_default(),
        };
        println!("{}{}: {}", level, location, d.message);
    }
}

pub(crate) fn print_effects(effects: &[HostEffect]) {
    for effect in effects {
        match effect {
            HostEffect::Hidden { field, hidden } => {
                println!("effect: {} {}", if *hidden { "hide" } else { "show" }, field)
            }
            HostEffect::Description { field, text } => {
                println!("effect: describe {} \"{}\"", field, text)
            }
            HostEffect::RowAddDisabled { table } => {
                println!("effect: disable row add on {}", table)
            }
            HostEffect::OfferActions { kinds } => {
                let names: Vec<_> = kinds.iter().map(|k| k.doctype_name()).collect();
                println!("effect: offer {}", names.join(", "))
            }
        }
    }
}
