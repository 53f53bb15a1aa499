//! Pre-flight display and confirmation prompt.

use crate::domain::{Recipient, RunConfig, RunSummary};
use crossterm::style::Stylize;
use std::path::Path;

fn first_line_preview(text: &str) -> String {
    let first = text.trim().lines().next().unwrap_or_default();
    let mut preview: String = first.chars().take(60).collect();
    if first.chars().count() > 60 {
        preview.push('…');
    }
    if text.trim().lines().count() > 1 {
        preview.push_str(" (…multiline)");
    }
    preview
}

/// What is about to happen, before the operator commits.
pub fn print_preflight(recipients: &[Recipient], config: &RunConfig) {
    let valid = recipients.iter().filter(|r| r.is_valid()).count();
    let invalid: Vec<&Recipient> = recipients.iter().filter(|r| !r.is_valid()).collect();

    println!("{}", "=== Pre-flight ===".cyan());
    println!("   • Valid recipients: {valid}");
    if !invalid.is_empty() {
        println!("{}", "   • Skipped (invalid format):".yellow());
        for r in invalid {
            println!("       - {}", r.raw);
        }
    }
    if let Some(media) = &config.media {
        println!(
            "   • File: {} ({:?})",
            media.path.display(),
            media.kind
        );
    }
    if let Some(caption) = &config.caption {
        println!("   • Caption: {}", first_line_preview(caption));
    }
    if let Some(message) = &config.message {
        println!("   • Message: {}", first_line_preview(message));
    }
    println!();
}

/// Interactive yes/no gate. Any prompt failure (non-tty, Ctrl-C) cancels.
pub fn confirm_send(valid: usize) -> bool {
    inquire::Confirm::new(&format!("Send to {valid} recipient(s)?"))
        .with_default(false)
        .prompt()
        .unwrap_or(false)
}

pub fn print_run_summary(summary: &RunSummary, artifacts_dir: &Path) {
    println!("{}", "=== RUN SUMMARY ===".cyan());
    println!("   • Total:   {}", summary.total());
    println!("   • Sent:    {}", summary.sent().to_string().green());
    println!("   • Failed:  {}", summary.failed().to_string().red());
    println!("   • Artifacts: {}", artifacts_dir.display());
}
