use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "archivist")]
#[command(about = "Backup record maintenance and pre-archive scan validation", long_about = None)]
pub struct Cli {
    /// Read settings from this file instead of ./Config.*
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Check that the scan roots contain files an archive can include
    ScanValidate {
        /// Descend into subdirectories (1/0, true/false, on/off, yes/no)
        #[arg(long)]
        recursive: Option<String>,
        /// Scan these roots instead of the configured ones
        #[arg(long = "root")]
        roots: Vec<PathBuf>,
    },
    /// Count completed backup records with no readable copy in any storage
    ReportInvalid,
    /// Delete completed backup records with no readable copy in any storage
    PurgeInvalid {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Print configuration values
    PrintConfig,
}
