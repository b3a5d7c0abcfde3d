mod commands;
mod logging;
mod progress;

use std::io::{self, BufRead, Write};
use std::process;

use anyhow::{Context, Result};
use archivist_core::{AppConfig, Database, MaintenanceService, ProcessHost};
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands};
use dotenv::dotenv;
use progress::CliReporter;
use serde::Serialize;
use tracing::{debug, error, info};

type Service = MaintenanceService<Database, ProcessHost>;

fn main() {
    dotenv().ok();

    let _guard = logging::init_logger();

    let args = Cli::parse();

    let loaded = match &args.config {
        Some(path) => archivist_core::config::load_configuration_from(path),
        None => archivist_core::config::load_configuration(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let outcome = match args.command {
        Some(Commands::ScanValidate { recursive, roots }) => {
            run_scan_validate(&config, recursive.as_deref(), roots)
        }
        Some(Commands::ReportInvalid) => run_report_invalid(&config),
        Some(Commands::PurgeInvalid { yes }) => run_purge_invalid(&config, yes),
        Some(Commands::PrintConfig) => print_json(&config),
        None => {
            let _ = Cli::command().print_long_help();
            Ok(())
        }
    };

    if let Err(err) = outcome {
        error!("Error: {:#}", err);
        process::exit(1);
    }
}

fn open_service(config: &AppConfig) -> Result<Service> {
    let service = MaintenanceService::from_config(config)
        .with_context(|| format!("opening record store at {}", config.db_path))?;
    Ok(service.with_reporter(Box::new(CliReporter::new())))
}

fn run_scan_validate(
    config: &AppConfig,
    recursive: Option<&str>,
    roots: Vec<std::path::PathBuf>,
) -> Result<()> {
    let roots = if roots.is_empty() {
        config.scan_roots()
    } else {
        roots
    };
    let service = open_service(config)?;
    let response = service.validate_scan_request(&roots, recursive);

    print_json(&response)?;
    log_time_budget(&service);
    match &response.scan_data {
        Some(report) if response.success => info!(
            "{} includable files, {} bytes",
            format!("{}", report.file_count).green(),
            format!("{}", report.total_size).green(),
        ),
        Some(report) => info!(
            "{}: nothing an archive could include ({} entries seen)",
            "Scan invalid".red(),
            report.entries.len(),
        ),
        None => info!("{}", response.message.red()),
    }
    Ok(())
}

fn run_report_invalid(config: &AppConfig) -> Result<()> {
    let service = open_service(config)?;
    let report = service
        .report_invalid_records()
        .context("counting invalid backup records")?;

    print_json(&report)?;
    log_time_budget(&service);
    info!(
        "{} invalid of {} checked",
        format!("{}", report.stats.invalid).red(),
        format!("{}", report.stats.total).cyan(),
    );
    Ok(())
}

fn run_purge_invalid(config: &AppConfig, yes: bool) -> Result<()> {
    if !yes && !confirm("Delete every completed backup record that has no copy in any storage?")? {
        println!("Aborted");
        return Ok(());
    }

    let service = open_service(config)?;
    let report = service
        .purge_invalid_records()
        .context("purging invalid backup records")?;

    print_json(&report)?;
    log_time_budget(&service);
    let message = if report.outcome.failed > 0 {
        report.message.yellow()
    } else {
        report.message.green()
    };
    info!("{}", message);
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("serializing response")?;
    println!("{}", json);
    Ok(())
}

/// Time spent so far against whatever ceiling is back in force.
fn log_time_budget(service: &Service) {
    let host = service.host();
    match host.remaining() {
        Some(left) => debug!(
            elapsed_secs = host.elapsed().as_secs_f64(),
            remaining_secs = left.as_secs_f64(),
            "Execution time budget"
        ),
        None => debug!(
            elapsed_secs = host.elapsed().as_secs_f64(),
            "Execution time unbounded"
        ),
    }
}

/// Ask a yes/no question on stdin. Anything but an explicit yes declines,
/// including a closed stdin.
fn confirm(prompt: &str) -> io::Result<bool> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    confirm_with(prompt, &mut stdin.lock(), &mut stdout.lock())
}

fn confirm_with<R: BufRead, W: Write>(prompt: &str, input: &mut R, out: &mut W) -> io::Result<bool> {
    let mut line = String::new();

    loop {
        write!(out, "{} [y/N]: ", prompt)?;
        out.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            return Ok(false);
        }

        match line.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => return Ok(true),
            "" | "n" | "no" => return Ok(false),
            other => writeln!(out, "Please answer yes or no (got '{}')", other)?,
        }
    }
}
