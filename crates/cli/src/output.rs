//! Output formatting for CLI

use clap::ValueEnum;
use cloudpanel_client::{Fragment, Notification, NotificationKind, Notifier};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

/// Output format
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
    /// Plain text format
    Plain,
}

/// Trait for items that can be displayed in a table
pub trait TableDisplay {
    fn headers() -> Vec<&'static str>;
    fn row(&self) -> Vec<String>;
}

impl TableDisplay for Fragment {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "Name", "Status", "Details"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            self.status.clone(),
            self.details.join("\n"),
        ]
    }
}

fn table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn print_plain(headers: &[&str], row: &[String]) {
    for (header, value) in headers.iter().zip(row.iter()) {
        println!("{}: {}", header, value.replace('\n', "; "));
    }
}

/// Print a single item
pub fn print_item<T: Serialize + TableDisplay>(item: &T, format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            let mut table = table();
            table.set_header(T::headers());
            table.add_row(item.row());
            println!("{table}");
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(item).unwrap_or_default());
        }
        OutputFormat::Plain => print_plain(&T::headers(), &item.row()),
    }
}

/// Print a list of items
pub fn print_list<T: Serialize + TableDisplay>(items: &[T], format: OutputFormat) {
    if items.is_empty() && !matches!(format, OutputFormat::Json) {
        println!("No items found.");
        return;
    }

    match format {
        OutputFormat::Table => {
            let mut table = table();
            table.set_header(T::headers());
            for item in items {
                table.add_row(item.row());
            }
            println!("{table}");
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(items).unwrap_or_default());
        }
        OutputFormat::Plain => {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    println!("---");
                }
                print_plain(&T::headers(), &item.row());
            }
        }
    }
}

/// Print success message
pub fn print_success(message: &str) {
    eprintln!("{} {}", "✅".green(), message.green());
}

/// Print error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "❌".red(), message.red());
}

/// Print info message
pub fn print_info(message: &str) {
    eprintln!("ℹ️  {}", message);
}

/// Shows notifications as coloured lines on stderr, keeping stdout for data
#[derive(Debug, Clone, Copy)]
pub struct TerminalNotifier {
    format: OutputFormat,
}

impl TerminalNotifier {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }
}

impl Notifier for TerminalNotifier {
    fn notify(&self, notification: Notification) {
        if matches!(self.format, OutputFormat::Json) {
            eprintln!("{}", serde_json::to_string(&notification).unwrap_or_default());
            return;
        }
        match notification.kind {
            NotificationKind::Success => print_success(&notification.message),
            NotificationKind::Error => print_error(&notification.message),
            NotificationKind::Info => print_info(&notification.message),
        }
    }
}
