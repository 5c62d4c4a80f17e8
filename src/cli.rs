//! Command-line interface module for sorthat.
//!
//! This module handles all CLI-related functionality including:
//! - Argument definitions
//! - Deciding whether the miscellaneous sweep runs
//! - Sorting and dry-run orchestration
//! - Console reporting

use crate::config::SorterConfig;
use crate::file_category::Category;
use crate::output::OutputFormatter;
use crate::sorter::{SortReport, Sorter, Stage, SweepOutcome};
use clap::Parser;
use dialoguer::Confirm;
use dialoguer::theme::ColorfulTheme;
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "sorthat")]
#[command(about = "Sort a folder's files into movies, photos, audio, documents and applications")]
#[command(version)]
pub struct Args {
    /// Directory holding the files to sort
    pub source: PathBuf,

    /// Root directory the category folders are created in
    pub destination: PathBuf,

    /// Move files with unknown extensions into misc without asking
    #[arg(long, conflicts_with = "no_misc")]
    pub misc: bool,

    /// Leave files with unknown extensions in place without asking
    #[arg(long)]
    pub no_misc: bool,

    /// Show what would be moved without changing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Configuration file (defaults to .sorthatrc.toml or ~/.config/sorthat/config.toml)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,
}

/// How the miscellaneous sweep is decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MiscChoice {
    Enabled,
    Disabled,
    /// Use the configured answer, or prompt when there is none.
    Ask,
}

impl MiscChoice {
    fn from_flags(misc: bool, no_misc: bool) -> Self {
        match (misc, no_misc) {
            (true, _) => MiscChoice::Enabled,
            (false, true) => MiscChoice::Disabled,
            (false, false) => MiscChoice::Ask,
        }
    }

    /// Returns the configured answer without prompting, if there is one.
    pub fn decided(self, configured: Option<bool>) -> Option<bool> {
        match self {
            MiscChoice::Enabled => Some(true),
            MiscChoice::Disabled => Some(false),
            MiscChoice::Ask => configured,
        }
    }
}

/// Options for a single invocation.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub misc: MiscChoice,
    pub dry_run: bool,
    pub json: bool,
}

impl From<&Args> for RunOptions {
    fn from(args: &Args) -> Self {
        Self {
            misc: MiscChoice::from_flags(args.misc, args.no_misc),
            dry_run: args.dry_run,
            json: args.json,
        }
    }
}

/// Runs the CLI application for parsed arguments.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use sorthat::cli::{Args, run_cli};
///
/// let args = Args::parse_from(["sorthat", "/home/me/Downloads", "/home/me/Sorted", "--no-misc"]);
/// if let Err(e) = run_cli(&args) {
///     eprintln!("Error: {}", e);
/// }
/// ```
pub fn run_cli(args: &Args) -> Result<(), String> {
    run_cli_with_config(
        &args.source,
        &args.destination,
        RunOptions::from(args),
        args.config.as_deref(),
    )
}

/// Runs a sort or dry run with an optional configuration file.
///
/// # Errors
///
/// Returns a message when the configuration is invalid, when the source
/// directory is missing, when the run aborts, or when any file could not be
/// moved.
pub fn run_cli_with_config(
    source: &Path,
    destination: &Path,
    options: RunOptions,
    config_path: Option<&Path>,
) -> Result<(), String> {
    let config = SorterConfig::load(config_path)
        .map_err(|e| format!("Error loading configuration: {}", e))?
        .compile()
        .map_err(|e| format!("Error compiling configuration: {}", e))?;

    let configured_misc = config.use_misc;
    let sorter = Sorter::from_config(source, destination, config);

    let total = sorter.total_files().map_err(|e| e.to_string())?;

    if options.dry_run {
        let use_misc = options.misc.decided(configured_misc).unwrap_or(false);
        return dry_run(&sorter, total, use_misc);
    }

    if !options.json {
        OutputFormatter::plain(&format!("Sorting {} in total.", OutputFormatter::files(total)));
    }

    let use_misc = match options.misc.decided(configured_misc) {
        Some(answer) => answer,
        None => prompt_use_misc(),
    };

    let pb = if options.json {
        ProgressBar::hidden()
    } else {
        OutputFormatter::create_progress_bar(Stage::COUNT)
    };
    let result = sorter.run_with_progress(use_misc, |stage| {
        pb.set_message(stage.label());
        pb.inc(1);
    });
    pb.finish_and_clear();
    let report = result.map_err(|e| e.to_string())?;

    if options.json {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| format!("Error serializing report: {}", e))?;
        println!("{}", json);
    } else {
        print_report(&report);
    }

    if report.has_failures() {
        return Err("Some files could not be moved. Please review errors above.".to_string());
    }
    Ok(())
}

/// Asks whether leftovers go to misc. Anything but an explicit yes means no.
fn prompt_use_misc() -> bool {
    match Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("Use misc folder?")
        .default(false)
        .interact()
    {
        Ok(answer) => answer,
        Err(e) => {
            log::warn!("Could not ask about the misc folder ({}), leaving leftovers in place", e);
            false
        }
    }
}

fn print_report(report: &SortReport) {
    OutputFormatter::plain("---");
    for outcome in &report.categories {
        if outcome.moved > 0 {
            OutputFormatter::success(&format!(
                "Moved {} to {}",
                OutputFormatter::files(outcome.moved),
                report.destination.join(outcome.category.dir_name()).display()
            ));
        }
        if let Some(failure) = &outcome.failure {
            OutputFormatter::error(&format!(
                "{}: {} ({} pass stopped)",
                failure.file.display(),
                failure.reason,
                outcome.category
            ));
        }
    }

    match &report.sweep {
        SweepOutcome::Swept(outcome) => {
            OutputFormatter::success(&format!(
                "Moved {} to {}",
                OutputFormatter::files(outcome.moved),
                report.destination.join(Category::Misc.dir_name()).display()
            ));
            if let Some(failure) = &outcome.failure {
                OutputFormatter::error(&format!("{}: {}", failure.file.display(), failure.reason));
            }
        }
        SweepOutcome::Skipped { unmoved } => {
            OutputFormatter::warning(&format!("{} not moved.", OutputFormatter::files(*unmoved)));
        }
    }
    OutputFormatter::plain("---");

    OutputFormatter::cleanup_summary(report);
    OutputFormatter::summary_table(report);

    if report.unmoved > 0 {
        OutputFormatter::warning(&format!(
            "{} left in {}",
            OutputFormatter::files(report.unmoved),
            report.source.display()
        ));
    } else {
        OutputFormatter::success(&format!("{} is empty", report.source.display()));
    }
}

fn dry_run(sorter: &Sorter, total: usize, use_misc: bool) -> Result<(), String> {
    OutputFormatter::dry_run_notice(&format!(
        "Analyzing {} in {}",
        OutputFormatter::files(total),
        sorter.source().display()
    ));

    let planned = sorter.plan(use_misc).map_err(|e| e.to_string())?;
    if planned.is_empty() {
        OutputFormatter::plain("No files would be moved.");
        return Ok(());
    }

    for category in Category::ALL {
        let files: Vec<_> = planned.iter().filter(|m| m.category == category).collect();
        if files.is_empty() {
            continue;
        }
        OutputFormatter::header(&format!(
            "{} ({})",
            sorter.layout().folder(category).display(),
            OutputFormatter::files(files.len())
        ));
        for planned_move in files {
            let name = planned_move
                .file
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            OutputFormatter::plain(&format!("   → {}", name));
        }
    }

    OutputFormatter::dry_run_notice(&format!(
        "{} would be moved, {} would stay. No files were modified.",
        OutputFormatter::files(planned.len()),
        OutputFormatter::files(total - planned.len())
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_positional_arguments() {
        let args = Args::try_parse_from(["sorthat", "in", "out"]).unwrap();
        assert_eq!(args.source, PathBuf::from("in"));
        assert_eq!(args.destination, PathBuf::from("out"));
        assert!(!args.dry_run);
        assert_eq!(RunOptions::from(&args).misc, MiscChoice::Ask);
    }

    #[test]
    fn test_parse_requires_destination() {
        assert!(Args::try_parse_from(["sorthat", "in"]).is_err());
    }

    #[test]
    fn test_misc_flags_conflict() {
        assert!(Args::try_parse_from(["sorthat", "in", "out", "--misc", "--no-misc"]).is_err());
    }

    #[test]
    fn test_misc_flags() {
        let args = Args::try_parse_from(["sorthat", "in", "out", "--misc"]).unwrap();
        assert_eq!(RunOptions::from(&args).misc, MiscChoice::Enabled);

        let args = Args::try_parse_from(["sorthat", "in", "out", "--no-misc", "-c", "x.toml"])
            .unwrap();
        assert_eq!(RunOptions::from(&args).misc, MiscChoice::Disabled);
        assert_eq!(args.config, Some(PathBuf::from("x.toml")));
    }

    #[test]
    fn test_flags_override_configuration() {
        assert_eq!(MiscChoice::Enabled.decided(Some(false)), Some(true));
        assert_eq!(MiscChoice::Disabled.decided(Some(true)), Some(false));
        assert_eq!(MiscChoice::Ask.decided(Some(true)), Some(true));
        assert_eq!(MiscChoice::Ask.decided(None), None);
    }
}
