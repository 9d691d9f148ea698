//! Startup configuration.
//!
//! Parsed from CLI flags with environment-variable fallbacks, so a kiosk
//! deployment can pin everything via env and launch plain `usms`.

use clap::Parser;
use std::path::PathBuf;

/// Uniform Sales & Management System — terminal shell.
#[derive(Debug, Parser)]
#[command(name = "usms", version, about)]
pub struct AppArgs {
    /// Path to the SQLite database file (created on first run).
    #[arg(long, env = "USMS_DATABASE", default_value = "usms.db")]
    pub database: PathBuf,

    /// Directory receipts and quotation slips are written into.
    #[arg(long, env = "USMS_RECEIPT_DIR", default_value = ".")]
    pub receipt_dir: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = AppArgs::parse_from(["usms"]);
        assert_eq!(args.database, PathBuf::from("usms.db"));
        assert_eq!(args.receipt_dir, PathBuf::from("."));
    }

    #[test]
    fn test_flags_override() {
        let args = AppArgs::parse_from([
            "usms",
            "--database",
            "/var/lib/usms/store.db",
            "--receipt-dir",
            "/var/lib/usms/receipts",
        ]);
        assert_eq!(args.database, PathBuf::from("/var/lib/usms/store.db"));
        assert_eq!(args.receipt_dir, PathBuf::from("/var/lib/usms/receipts"));
    }
}
