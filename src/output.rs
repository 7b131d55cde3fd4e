//! Console progress and summary output.

use std::path::Path;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tabled::settings::Style;
use tabled::{Table as TextTable, Tabled};

use crate::report::Table;

/// Row for the per-sheet summary table.
#[derive(Tabled)]
struct SheetRow {
    #[tabled(rename = "SHEET")]
    sheet: String,
    #[tabled(rename = "ROWS")]
    rows: usize,
}

/// Print a section header in "Collecting <name>..." style.
pub fn print_collecting(name: &str) {
    println!();
    println!("{}", format!("Collecting {}...", name).cyan().bold());
}

/// Print the number of rows collected for one resource type.
pub fn print_found(count: usize, label: &str) {
    println!("  {} Found {} {}", "✓".green(), count.to_string().bold(), label);
}

pub fn print_warning(message: &str) {
    println!("  {} {}", "⚠".yellow(), message.yellow());
}

pub fn print_saved(path: &Path) {
    println!("{} {}", "Report saved:".green().bold(), path.display());
}

/// Render the per-sheet row counts as a table string.
pub fn render_summary(tables: &[Table]) -> String {
    let rows: Vec<SheetRow> = tables
        .iter()
        .map(|t| SheetRow {
            sheet: t.name.clone(),
            rows: t.len(),
        })
        .collect();
    TextTable::new(rows).with(Style::blank()).to_string()
}

/// Print the per-sheet row counts of an exported report.
pub fn print_summary(tables: &[Table]) {
    println!();
    println!("{}", "Summary:".bold());
    println!("{}", render_summary(tables));
}

/// Spinner shown while compartments are scanned.
pub fn compartment_progress(total: usize) -> ProgressBar {
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  {spinner:.cyan} [{pos}/{len}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    pb
}
