//! CLI argument definitions using clap.

use clap::Parser;
use icecheck::ValidatorConfig;
use std::path::PathBuf;

/// icecheck: validate an Apache Iceberg v2 table in a local warehouse
#[derive(Parser)]
#[command(name = "icecheck")]
#[command(version, about, long_about = None)]
#[command(after_help = "Example:\n  icecheck /tmp/iceberg-warehouse test_table")]
pub struct Cli {
    /// Path to the warehouse directory
    #[arg(value_name = "WAREHOUSE")]
    pub warehouse: PathBuf,

    /// Table name (use dots for namespaces, e.g. "sales.orders")
    #[arg(value_name = "TABLE")]
    pub table: String,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Number of rows to include in the sample
    #[arg(long, default_value = "5")]
    pub sample_rows: usize,

    /// Check metadata only, without scanning data files
    #[arg(long)]
    pub no_scan: bool,

    /// Keep invalid field ID warnings from failing the run
    #[arg(long)]
    pub lenient_field_ids: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Engine configuration derived from the flags.
    pub fn config(&self) -> ValidatorConfig {
        ValidatorConfig {
            sample_rows: self.sample_rows,
            field_id_warnings_fail: !self.lenient_field_ids,
            scan_data: !self.no_scan,
            ..ValidatorConfig::default()
        }
    }
}
