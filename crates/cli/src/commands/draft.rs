use std::path::Path;
use std::process;

use hrforms_engine::{draft_adjustment, draft_claim, DsaPolicy};
use rust_decimal::Decimal;

use super::{load_document, print_document};
use crate::{report_error, DraftKind, OutputFormat};

pub(crate) fn cmd_draft(
    path: &Path,
    kind: DraftKind,
    dsa: Option<Decimal>,
    return_day_percent: Option<Decimal>,
    output: OutputFormat,
    quiet: bool,
) {
    let authorization = match load_document(path) {
        Ok(d) => d,
        Err(msg) => {
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };

    let drafted = match kind {
        DraftKind::Claim => {
            let Some(dsa) = dsa else {
                report_error("error: --dsa is required when drafting a claim", output, quiet);
                process::exit(1);
            };
            let policy = DsaPolicy {
                dsa,
                return_day_percent,
            };
            draft_claim(
                &authorization,
                &policy,
                time::OffsetDateTime::now_utc().date(),
            )
        }
        DraftKind::Adjustment => draft_adjustment(&authorization),
    };

    match drafted {
        Ok(doc) => match output {
            OutputFormat::Json => println!(
                "{}",
                serde_json::to_string_pretty(&doc.to_json())
                    .unwrap_or_else(|e| format!("serialization error: {}", e))
            ),
            OutputFormat::Text => print_document(&doc),
        },
        Err(e) => {
            report_error(&format!("error: {}", e), output, quiet);
            process::exit(1);
        }
    }
}
