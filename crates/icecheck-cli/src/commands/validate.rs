//! Validate command - run all checks and print the report.

use colored::Colorize;
use icecheck::{Finding, IceCheck, Severity, ValidationReport};

use crate::cli::Cli;

const RULE_WIDTH: usize = 70;

/// Run validation and print the report. Returns whether the table passed.
pub fn run(cli: &Cli) -> Result<bool, Box<dyn std::error::Error>> {
    log::debug!(
        "Validating '{}' in {}",
        cli.table,
        cli.warehouse.display()
    );
    let engine = IceCheck::local()?.with_config(cli.config());
    let report = engine.validate(&cli.warehouse, &cli.table);

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render(&report, cli.verbose));
    }

    Ok(report.passed)
}

/// Section a finding is printed under.
fn section(finding: &Finding) -> &'static str {
    if finding.check == "table_summary" {
        return "Additional metadata";
    }
    match finding.category {
        icecheck::Category::Metadata => "Table metadata",
        icecheck::Category::Schema => "Schema validation",
        icecheck::Category::Snapshot => "Snapshots",
        icecheck::Category::Scan => "Data scan",
    }
}

fn marker(finding: &Finding) -> String {
    match finding.severity {
        Severity::Info => "✓".green().to_string(),
        Severity::Warning if finding.fails_run => "⚠".red().bold().to_string(),
        Severity::Warning => "⚠".yellow().to_string(),
        Severity::Error => "✗".red().bold().to_string(),
    }
}

/// Human-readable report: banner, one section per stage, verdict.
pub fn render(report: &ValidationReport, verbose: bool) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut lines = vec![
        rule.clone(),
        "Iceberg Table Validation".cyan().bold().to_string(),
        rule.clone(),
        format!("Warehouse: {}", report.warehouse.display()),
        format!("Table: {}", report.table),
    ];
    if verbose {
        if let Some(location) = &report.metadata_location {
            lines.push(format!("Metadata file: {}", location.display()));
        }
        if let Some(hash) = &report.metadata_sha256 {
            lines.push(format!("Metadata hash: {}", hash));
        }
        lines.push(format!("Started: {}", report.validated_at.to_rfc3339()));
    }
    lines.push(rule.clone());

    let mut current: Option<&str> = None;
    for finding in &report.findings {
        let title = section(finding);
        if current != Some(title) {
            lines.push(String::new());
            lines.push(format!("{}:", title).yellow().bold().to_string());
            current = Some(title);
        }

        let mut message = finding.message.lines();
        let first = message.next().unwrap_or_default();
        lines.push(format!("  {} {}", marker(finding), first));
        lines.extend(message.map(|line| format!("      {}", line)));
    }

    lines.push(String::new());
    lines.push("Summary:".yellow().bold().to_string());
    lines.push(format!(
        "  {} errors, {} warnings, {} info",
        report.counts.error.to_string().red(),
        report.counts.warning.to_string().yellow(),
        report.counts.info.to_string().blue()
    ));
    lines.extend(
        report
            .failures()
            .filter(|f| f.severity != Severity::Error)
            .map(|f| format!("  {} {} (fails the run)", marker(f), f.message)),
    );

    lines.push(String::new());
    lines.push(rule.clone());
    if report.passed {
        lines.push("RESULT: PASSED".green().bold().to_string());
    } else {
        lines.push("RESULT: FAILED".red().bold().to_string());
    }
    lines.push(rule);

    let mut out = lines.join("\n");
    out.push('\n');
    out
}
