use std::path::Path;
use std::process;
use std::sync::Arc;

use hrforms_core::{Field, Target};
use hrforms_engine::{standard_registry, Diagnostic, DsaPolicy, FormSession};

use super::{load_document, print_diagnostics};
use crate::settings::Settings;
use crate::{report_error, OutputFormat};

pub(crate) fn cmd_validate(
    path: &Path,
    policy: Option<DsaPolicy>,
    settings: &Settings,
    output: OutputFormat,
    quiet: bool,
) {
    let doc = match load_document(path) {
        Ok(d) => d,
        Err(msg) => {
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };

    let mut session = FormSession::new(
        doc,
        Arc::new(standard_registry()),
        settings.engine.clone(),
    );
    if let Some(policy) = policy {
        session = session.with_dsa_policy(policy);
    }
    let diagnostics = match session.prepare_save() {
        Ok(d) => d,
        Err(e) => {
            report_error(&format!("error: {}", e), output, quiet);
            process::exit(1);
        }
    };
    let failed = diagnostics.iter().any(Diagnostic::is_error);

    match output {
        OutputFormat::Json => {
            let result = serde_json::json!({
                "document": session.document().name(),
                "valid": !failed,
                "estimated_amount": session
                    .document()
                    .value(Target::Parent, Field::EstimatedAmount)
                    .to_json(),
                "diagnostics": diagnostics.iter().map(Diagnostic::to_json).collect::<Vec<_>>(),
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&result)
                    .unwrap_or_else(|e| format!("serialization error: {}", e))
            );
        }
        OutputFormat::Text => {
            if !quiet {
                print_diagnostics(session.document(), &diagnostics);
                if !failed {
                    println!("{}: ok", session.document().name());
                }
            }
        }
    }

    if failed {
        process::exit(1);
    }
}
