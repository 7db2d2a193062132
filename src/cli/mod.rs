//! Command-line interface for audio-triage.
//!
//! A thin shell over the engine: parses arguments, wires the batch
//! orchestrator to the tag store, and renders reports. All decision logic
//! lives in the library modules.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::batch::BatchOrchestrator;
use crate::config::ValidationConfig;
use crate::repair::{RepairEngine, rename_directory, rename_file};
use crate::tags;

/// Audio compatibility checker and repair tool
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Check files against the strict compatibility profile
    Check {
        /// File or directory to check
        path: PathBuf,
        /// Recurse into subdirectories
        #[arg(short, long)]
        recursive: bool,
        /// Hash files and run structural integrity checks
        #[arg(long)]
        integrity: bool,
        /// Skip file/directory name validation
        #[arg(long)]
        no_path_check: bool,
        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check files, then apply automatic tag fixes and content repairs
    Fix {
        /// File or directory to fix
        path: PathBuf,
        /// Recurse into subdirectories
        #[arg(short, long)]
        recursive: bool,
        /// Also rename files/directories to their suggested names
        #[arg(long)]
        rename: bool,
    },
    /// Rename a single file or directory to an explicit new name
    Rename {
        /// Current path
        path: PathBuf,
        /// New name (within the same parent)
        new_name: String,
        /// Target is a directory
        #[arg(short, long)]
        directory: bool,
    },
}

/// Execute a parsed command.
pub fn run(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Check {
            path,
            recursive,
            integrity,
            no_path_check,
            json,
        } => {
            let config = ValidationConfig {
                perform_integrity_check: *integrity,
                perform_path_validation: !*no_path_check,
                validate_directory_names: !*no_path_check,
            };
            cmd_check(path, *recursive, config, *json)
        }
        Commands::Fix {
            path,
            recursive,
            rename,
        } => cmd_fix(path, *recursive, *rename),
        Commands::Rename {
            path,
            new_name,
            directory,
        } => {
            let outcome = if *directory {
                rename_directory(path, new_name)
            } else {
                rename_file(path, new_name)
            };
            println!("{}", outcome.message);
            if !outcome.renamed {
                std::process::exit(1);
            }
            Ok(())
        }
    }
}

fn scan(orchestrator: &mut BatchOrchestrator, path: &PathBuf, recursive: bool) -> usize {
    if path.is_file() {
        orchestrator.set_files(std::slice::from_ref(path))
    } else {
        orchestrator.scan_directory(path, recursive)
    }
}

fn cmd_check(
    path: &PathBuf,
    recursive: bool,
    config: ValidationConfig,
    json: bool,
) -> anyhow::Result<()> {
    let mut orchestrator = BatchOrchestrator::new(config);
    let count = scan(&mut orchestrator, path, recursive);
    if count == 0 {
        println!("No audio files found under {}", path.display());
        return Ok(());
    }

    let report = orchestrator.check_all(tags::read_metadata, None);

    if json {
        let entries: Vec<serde_json::Value> = report
            .entries
            .iter()
            .map(|entry| {
                serde_json::json!({
                    "file": entry.display_name,
                    "path": entry.path,
                    "compatible": entry.report.is_compatible(),
                    "issues": entry.report.issue_messages(),
                    "warnings": entry.report.warning_messages(),
                    "recommendations": entry.report.recommendations(),
                    "format_info": entry.report.format_info,
                })
            })
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "total_issues": report.total_issues,
                "files": entries,
            }))?
        );
        return Ok(());
    }

    for entry in &report.entries {
        let marker = if entry.report.is_compatible() {
            "✓"
        } else {
            "✗"
        };
        println!("{} {}", marker, entry.display_name);
        for issue in entry.report.issue_messages() {
            println!("    issue: {issue}");
        }
        for warning in entry.report.warning_messages() {
            println!("    warning: {warning}");
        }
    }
    println!();
    if report.total_issues > 0 {
        println!(
            "Found {} issues across {} files",
            report.total_issues,
            report.entries.len()
        );
    } else {
        println!(
            "All {} files passed strict compatibility checks",
            report.entries.len()
        );
    }
    Ok(())
}

fn cmd_fix(path: &PathBuf, recursive: bool, rename: bool) -> anyhow::Result<()> {
    let mut config = ValidationConfig::full();
    if !rename {
        config.perform_path_validation = false;
        config.validate_directory_names = false;
    }

    let mut orchestrator = BatchOrchestrator::new(config);
    let count = scan(&mut orchestrator, path, recursive);
    if count == 0 {
        println!("No audio files found under {}", path.display());
        return Ok(());
    }

    let report = orchestrator.check_all(tags::read_metadata, None);
    let fixes = orchestrator.apply_tag_fixes(&report);
    let engine = RepairEngine::new();
    let repairs = orchestrator.repair_all(&engine, &report);

    println!(
        "Fixed tags in {} files ({} skipped)",
        fixes.fixed, fixes.skipped
    );
    println!(
        "Repaired {} files ({} failed), renamed {} files and {} directories",
        repairs.repaired, repairs.failed, repairs.files_renamed, repairs.dirs_renamed
    );
    Ok(())
}
