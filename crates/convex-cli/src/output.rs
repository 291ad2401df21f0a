//! Output formatting utilities.

use colored::Colorize;
use serde::Serialize;
use tabled::{
    builder::Builder,
    settings::{object::Columns, Alignment, Modify, Style},
    Table, Tabled,
};

use crate::cli::OutputFormat;

/// Formats and prints output based on the specified format.
pub fn print_output<T: Serialize + Tabled>(data: &[T], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Table => print_table(data),
        OutputFormat::Json => print_json(data),
        OutputFormat::Csv => print_csv(data),
        OutputFormat::Minimal => print_minimal(data),
    }
}

/// Prints a numeric matrix, one row per line, under the given column labels.
///
/// JSON output is an array of row arrays; CSV carries the labels as header.
pub fn print_matrix(
    title: &str,
    columns: &[String],
    rows: &[Vec<f64>],
    format: OutputFormat,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Table => {
            print_header(title);
            let mut builder = Builder::default();
            let mut header = vec!["#".to_string()];
            header.extend(columns.iter().cloned());
            builder.push_record(header);
            for (index, row) in rows.iter().enumerate() {
                let mut record = vec![index.to_string()];
                record.extend(row.iter().map(|v| format_rate(*v)));
                builder.push_record(record);
            }
            let mut table = builder.build();
            table.with(Style::rounded());
            println!("{table}");
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(rows)?),
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(std::io::stdout());
            wtr.write_record(columns)?;
            for row in rows {
                wtr.write_record(row.iter().map(f64::to_string))?;
            }
            wtr.flush()?;
        }
        OutputFormat::Minimal => {
            for row in rows {
                let line: Vec<String> = row.iter().map(f64::to_string).collect();
                println!("{}", line.join(" "));
            }
        }
    }
    Ok(())
}

/// Prints data as a formatted table.
fn print_table<T: Tabled>(data: &[T]) -> anyhow::Result<()> {
    if data.is_empty() {
        println!("No results.");
        return Ok(());
    }

    let table = Table::new(data)
        .with(Style::rounded())
        .with(Modify::new(Columns::first()).with(Alignment::left()))
        .to_string();

    println!("{}", table);
    Ok(())
}

/// Prints data as JSON.
fn print_json<T: Serialize>(data: &[T]) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(data)?);
    Ok(())
}

/// Prints data as CSV.
fn print_csv<T: Serialize>(data: &[T]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(std::io::stdout());
    for item in data {
        wtr.serialize(item)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Prints minimal output (first value only).
fn print_minimal<T: Serialize>(data: &[T]) -> anyhow::Result<()> {
    if let Some(first) = data.first() {
        println!("{}", serde_json::to_string(first)?);
    }
    Ok(())
}

/// Formats a rate as a percentage with four decimals.
pub fn format_rate(value: f64) -> String {
    format!("{:.4}%", value * 100.0)
}

/// Formats a variance in squared basis points.
pub fn format_variance(value: f64) -> String {
    format!("{:.4} bp²", value * 1e8)
}

/// Formats a loss value.
pub fn format_loss(value: f64) -> String {
    format!("{:.6e}", value)
}

/// Prints a success message.
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Prints a warning message.
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message);
}

/// A key-value pair for display.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct KeyValue {
    #[tabled(rename = "Metric")]
    pub key: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

impl KeyValue {
    /// Creates a new key-value pair.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Prints a header for a section.
pub fn print_header(title: &str) {
    println!("\n{}", title.bold().underline());
}
