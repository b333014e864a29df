//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::vault::Entry;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Print a dim follow-up line under an error, on stderr.
pub fn hint(msg: &str) {
    eprintln!("  {} {}", style("hint:").dim(), style(msg).dim());
}

/// Print the entry table (ID, Title, URL, Username, Updated).
pub fn print_entries_table(entries: &[Entry]) {
    if entries.is_empty() {
        info("No entries in this vault yet.");
        tip("Run `passman add --title <TITLE>` to add your first entry.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["ID", "Title", "URL", "Username", "Updated"]);

    for e in entries {
        table.add_row(vec![
            e.id.to_string(),
            e.title.clone(),
            e.url.clone().unwrap_or_default(),
            e.username.clone().unwrap_or_default(),
            e.updated_at.format(TIME_FORMAT).to_string(),
        ]);
    }

    println!("{table}");
}

/// Print a single entry as a two-column table.
pub fn print_entry(entry: &Entry, reveal: bool) {
    let secret = if reveal {
        entry.secret.clone()
    } else {
        "\u{2022}".repeat(8)
    };

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.add_row(vec!["ID".to_string(), entry.id.to_string()]);
    table.add_row(vec!["Title".to_string(), entry.title.clone()]);
    table.add_row(vec!["URL".to_string(), entry.url.clone().unwrap_or_default()]);
    table.add_row(vec![
        "Username".to_string(),
        entry.username.clone().unwrap_or_default(),
    ]);
    table.add_row(vec!["Password".to_string(), secret]);
    table.add_row(vec!["Notes".to_string(), entry.notes.clone().unwrap_or_default()]);
    table.add_row(vec![
        "Created".to_string(),
        entry.created_at.format(TIME_FORMAT).to_string(),
    ]);
    table.add_row(vec![
        "Updated".to_string(),
        entry.updated_at.format(TIME_FORMAT).to_string(),
    ]);

    println!("{table}");
}
