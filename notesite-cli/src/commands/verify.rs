//! Verify content and configuration, emitting diagnostics.

use anyhow::{bail, Context, Result};
use notesite_core::{Config, Diagnostic, DiagnosticSeverity, SiteBuilder};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct VerificationSummary<'a> {
    pages: usize,
    errors: usize,
    warnings: usize,
    infos: usize,
    diagnostics: &'a [Diagnostic],
}

/// Run the build pipeline without rendering output and surface diagnostics.
///
/// Fails (non-zero exit) when any error-level diagnostic is present.
pub fn verify_site(config_path: &Path, json: bool) -> Result<()> {
    let config = Config::from_file(config_path).context("Failed to load configuration")?;
    let builder = SiteBuilder::new(config);
    let site_index = builder
        .build()
        .context("Failed to build site for verification")?;

    let diagnostics = &site_index.diagnostics;
    let summary = VerificationSummary {
        pages: site_index.pages.len(),
        errors: site_index.count(DiagnosticSeverity::Error),
        warnings: site_index.count(DiagnosticSeverity::Warning),
        infos: site_index.count(DiagnosticSeverity::Info),
        diagnostics,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "Verification complete: {} pages, {} errors, {} warnings, {} info",
            summary.pages, summary.errors, summary.warnings, summary.infos
        );
        for diag in diagnostics {
            let route = diag
                .route
                .as_deref()
                .map(|r| format!(" [{}]", r))
                .unwrap_or_default();
            let source = diag
                .source_path
                .as_deref()
                .map(|s| format!(" ({})", s))
                .unwrap_or_default();
            println!(
                "- {:?} {}{}{}: {}",
                diag.severity, diag.code, route, source, diag.message
            );
            if let Some(ctx) = &diag.context {
                println!("  context: {}", ctx);
            }
        }
    }

    if summary.errors > 0 {
        bail!("Verification found {} error(s)", summary.errors);
    }

    Ok(())
}
