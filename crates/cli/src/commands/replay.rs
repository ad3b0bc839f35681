//! `hrforms replay`: drive a form session from a JSON edit script.
//!
//! ```json
//! {
//!   "document": { "doctype": "Travel Claim", "name": "TC-0001", "fields": {}, "tables": {} },
//!   "steps": [
//!     { "op": "set", "field": "employee", "value": "EMP-0001" },
//!     { "op": "add_row", "table": "items" },
//!     { "op": "set", "row": 1, "field": "distance", "value": 3 },
//!     { "op": "trigger", "row": 1, "field": "distance" },
//!     { "op": "refresh" },
//!     { "op": "prepare_save" }
//!   ]
//! }
//! ```
//!
//! `row` is the 1-based position in `table` (default `items`). Lookups are
//! settled after every step.

use std::path::Path;
use std::process;
use std::sync::Arc;

use hrforms_core::{Document, Field, Target, Value};
use hrforms_engine::{
    standard_registry, Collaborators, Diagnostic, DispatchReport, FieldEvent, FormSession,
    FrappeCollaborators, HostEffect, StaticCollaborators,
};
use serde::Deserialize;

use super::{print_diagnostics, print_document, print_effects, read_json};
use crate::settings::Settings;
use crate::{report_error, OutputFormat};

fn default_table() -> String {
    Field::Items.as_str().to_string()
}

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Step {
    Set {
        field: String,
        #[serde(default)]
        value: serde_json::Value,
        #[serde(default)]
        row: Option<usize>,
        #[serde(default = "default_table")]
        table: String,
    },
    Trigger {
        field: String,
        #[serde(default)]
        row: Option<usize>,
        #[serde(default = "default_table")]
        table: String,
    },
    Refresh,
    AddRow {
        #[serde(default = "default_table")]
        table: String,
    },
    PrepareSave,
}

#[derive(Debug, Deserialize)]
struct Script {
    document: serde_json::Value,
    #[serde(default)]
    steps: Vec<Step>,
}

/// What a replay produced, across all steps.
#[derive(Debug, Default)]
struct Replay {
    diagnostics: Vec<Diagnostic>,
    effects: Vec<HostEffect>,
    stale_replies: usize,
}

impl Replay {
    fn absorb(&mut self, report: DispatchReport) {
        self.diagnostics.extend(report.diagnostics);
        self.effects.extend(report.effects);
        self.stale_replies += report.stale_replies;
    }
}

fn field(name: &str) -> Result<Field, String> {
    Field::from_name(name).ok_or_else(|| format!("unknown field '{}'", name))
}

fn target(doc: &Document, table: &str, row: Option<usize>) -> Result<Target, String> {
    let Some(idx) = row else {
        return Ok(Target::Parent);
    };
    let table = field(table)?;
    idx.checked_sub(1)
        .and_then(|pos| doc.row_at(table, pos))
        .map(Target::Row)
        .ok_or_else(|| format!("{} has no row #{}", table, idx))
}

async fn run<C>(script: Script, collaborators: &C, settings: &Settings) -> Result<(Document, Replay), String>
where
    C: Collaborators + ?Sized,
{
    let doc = Document::from_json(&script.document).map_err(|e| format!("document: {}", e))?;
    let mut session = FormSession::new(doc, Arc::new(standard_registry()), settings.engine.clone());
    let mut replay = Replay::default();

    for (n, step) in script.steps.into_iter().enumerate() {
        let step_no = n + 1;
        let fail = |e: String| format!("step {}: {}", step_no, e);
        tracing::debug!(step = step_no, ?step, "replay step");

        match step {
            Step::Set {
                field: name,
                value,
                row,
                table,
            } => {
                let field = field(&name).map_err(fail)?;
                let target = target(session.document(), &table, row).map_err(fail)?;
                let kind = session
                    .document()
                    .doctype_of(target)
                    .ok()
                    .and_then(|dt| dt.kind_of(field))
                    .ok_or_else(|| fail(format!("'{}' is not a field here", name)))?;
                let value = Value::from_json(&value, kind).map_err(|e| fail(e.to_string()))?;
                let report = session
                    .dispatch(FieldEvent {
                        target,
                        field,
                        value,
                    })
                    .map_err(|e| fail(e.to_string()))?;
                replay.absorb(report);
            }
            Step::Trigger {
                field: name,
                row,
                table,
            } => {
                let field = field(&name).map_err(fail)?;
                let target = target(session.document(), &table, row).map_err(fail)?;
                let report = session
                    .trigger(target, field)
                    .map_err(|e| fail(e.to_string()))?;
                replay.absorb(report);
            }
            Step::Refresh => {
                let report = session.refresh().map_err(|e| fail(e.to_string()))?;
                replay.absorb(report);
            }
            Step::AddRow { table } => {
                let table = field(&table).map_err(fail)?;
                session.add_row(table).map_err(|e| fail(e.to_string()))?;
            }
            Step::PrepareSave => {
                let diagnostics = session.prepare_save().map_err(|e| fail(e.to_string()))?;
                replay.diagnostics.extend(diagnostics);
            }
        }

        let settled = session
            .settle(collaborators)
            .await
            .map_err(|e| fail(e.to_string()))?;
        replay.absorb(settled);
    }

    Ok((session.into_document(), replay))
}

fn collaborators(
    fixtures: Option<&Path>,
    remote: bool,
    settings: &Settings,
) -> Result<Box<dyn Collaborators>, String> {
    if remote {
        let frappe = FrappeCollaborators::new(&settings.frappe).map_err(|e| e.to_string())?;
        return Ok(Box::new(frappe));
    }
    match fixtures {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|_| format!("error: fixtures file not found: {}", path.display()))?;
            let fixtures = StaticCollaborators::from_json_str(&text)
                .map_err(|e| format!("error: {}: {}", path.display(), e))?;
            Ok(Box::new(fixtures))
        }
        None => Ok(Box::new(StaticCollaborators::new())),
    }
}

pub(crate) fn cmd_replay(
    script_path: &Path,
    fixtures: Option<&Path>,
    remote: bool,
    settings: &Settings,
    output: OutputFormat,
    quiet: bool,
) {
    let script: Script = match read_json(script_path, "script").and_then(|v| {
        serde_json::from_value(v)
            .map_err(|e| format!("error: invalid script {}: {}", script_path.display(), e))
    }) {
        Ok(s) => s,
        Err(msg) => {
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };

    let collaborators = match collaborators(fixtures, remote, settings) {
        Ok(c) => c,
        Err(msg) => {
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            report_error(&format!("error: failed to start runtime: {}", e), output, quiet);
            process::exit(1);
        }
    };

    let (doc, replay) = match rt.block_on(run(script, collaborators.as_ref(), settings)) {
        Ok(r) => r,
        Err(msg) => {
            report_error(&format!("error: {}", msg), output, quiet);
            process::exit(1);
        }
    };

    match output {
        OutputFormat::Json => {
            let result = serde_json::json!({
                "document": doc.to_json(),
                "diagnostics": replay.diagnostics.iter().map(Diagnostic::to_json).collect::<Vec<_>>(),
                "effects": replay.effects.iter().map(HostEffect::to_json).collect::<Vec<_>>(),
                "stale_replies": replay.stale_replies,
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&result)
                    .unwrap_or_else(|e| format!("serialization error: {}", e))
            );
        }
        OutputFormat::Text => {
            print_document(&doc);
            if !quiet {
                print_diagnostics(&doc, &replay.diagnostics);
                print_effects(&replay.effects);
            }
        }
    }
}
