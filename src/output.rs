//! Output formatting and styling module.
//!
//! Provides a centralized interface for all console output: colored status
//! lines, the progress bar shown while categories are processed, and the
//! per-category summary table printed at the end of a run.

use crate::file_category::Category;
use crate::sorter::{SortReport, SweepOutcome};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

/// Manages all CLI output with consistent styling and formatting.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use sorthat::output::OutputFormatter;
    /// OutputFormatter::success("Sorting complete");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Creates a progress bar that advances once per sorting stage.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use sorthat::output::OutputFormatter;
    /// let pb = OutputFormatter::create_progress_bar(4);
    /// pb.set_message("moving");
    /// pb.inc(1);
    /// pb.finish_and_clear();
    /// ```
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("█▓░"));
        }
        pb
    }

    /// Formats a count with the right noun, e.g. "1 file" or "3 files".
    pub fn files(count: usize) -> String {
        format!("{} {}", count, if count == 1 { "file" } else { "files" })
    }

    /// Prints the per-category table for a finished run.
    ///
    /// Categories appear in sorting order. The misc row is only shown when the
    /// sweep ran.
    pub fn summary_table(report: &SortReport) {
        Self::header("SUMMARY");

        let mut rows: Vec<(Category, usize)> = report
            .categories
            .iter()
            .map(|outcome| (outcome.category, outcome.moved))
            .collect();
        if let SweepOutcome::Swept(outcome) = &report.sweep {
            rows.push((outcome.category, outcome.moved));
        }

        let width = rows
            .iter()
            .map(|(category, _)| category.dir_name().len())
            .max()
            .unwrap_or(0)
            .max(8);

        println!(
            "{:<width$} | {}",
            "Category".bold(),
            "Moved".bold(),
            width = width
        );
        println!("{}", "-".repeat(width + 12));

        for (category, moved) in &rows {
            let count = if *moved > 0 {
                Self::files(*moved).green()
            } else {
                Self::files(*moved).normal()
            };
            println!("{:<width$} | {}", category.dir_name(), count, width = width);
        }

        println!("{}", "-".repeat(width + 12));
        println!(
            "{:<width$} | {}",
            "Total".bold(),
            Self::files(report.total_moved()).green().bold(),
            width = width
        );
    }

    /// Prints which category folders were kept and which were removed.
    pub fn cleanup_summary(report: &SortReport) {
        let cleanup = &report.cleanup;
        for (category, count) in &cleanup.retained {
            Self::plain(&format!(
                "{} contains {}",
                report.destination.join(category.dir_name()).display(),
                Self::files(*count)
            ));
        }
        if !cleanup.removed.is_empty() {
            let removed: Vec<&str> = cleanup.removed.iter().map(|c| c.dir_name()).collect();
            Self::info(&format!("Removed empty folders: {}", removed.join(", ")));
        }
    }
}
