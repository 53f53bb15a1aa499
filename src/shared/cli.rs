//! CLI surface and input resolution. The parser hands the run a
//! pre-validated configuration; no business logic lives here.

use crate::domain::DomainError;
use clap::{ArgGroup, Parser};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "wa-bulk",
    version,
    about = "Send WhatsApp messages/files to multiple numbers via Firefox automation",
    after_help = "Examples:\n  \
        wa-bulk --numbers 966500000001,966500000002 --message \"Hello!\"\n  \
        wa-bulk --numbers-file numbers.txt --file video.mp4 --caption @cap.txt"
)]
#[command(group(ArgGroup::new("recipients").required(true).args(["numbers", "numbers_file"])))]
pub struct Cli {
    /// Comma- or space-separated phone numbers
    #[arg(long)]
    pub numbers: Option<String>,

    /// Text file with one number per line ('#' lines are comments)
    #[arg(long)]
    pub numbers_file: Option<PathBuf>,

    /// Message text, or "@file.txt" to read it (UTF-8)
    #[arg(long)]
    pub message: Option<String>,

    /// Caption for the media, or "@file.txt" (UTF-8)
    #[arg(long)]
    pub caption: Option<String>,

    /// Path to the media/document to send (<= 50 MB)
    #[arg(long = "file")]
    pub media: Option<PathBuf>,

    /// Delay between recipients in seconds
    #[arg(long)]
    pub delay: Option<f64>,

    /// Send headless; login still happens in a visible bootstrap window
    #[arg(long)]
    pub headless: bool,

    /// Seconds to wait for QR login
    #[arg(long)]
    pub login_timeout: Option<u64>,

    /// Persistent Firefox profile directory
    #[arg(long)]
    pub profile_dir: Option<PathBuf>,

    /// Run the whole pipeline against the built-in mock browser
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

/// Resolves the `@path` convention: a leading `@` reads the file as-is,
/// preserving line breaks and script direction.
pub fn resolve_text_arg(value: Option<&str>) -> Result<Option<String>, DomainError> {
    let Some(value) = value else {
        return Ok(None);
    };
    let trimmed = value.trim();
    if let Some(path) = trimmed.strip_prefix('@') {
        let text = std::fs::read_to_string(path)
            .map_err(|e| DomainError::Config(format!("cannot read {path}: {e}")))?;
        Ok(Some(text))
    } else {
        Ok(Some(value.to_string()))
    }
}

/// Raw recipient inputs in order: the inline list split on commas and
/// whitespace, or the file's lines with blanks and comments skipped.
pub fn load_raw_recipients(
    numbers: Option<&str>,
    numbers_file: Option<&Path>,
) -> Result<Vec<String>, DomainError> {
    if let Some(inline) = numbers {
        return Ok(inline
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect());
    }
    let Some(path) = numbers_file else {
        return Err(DomainError::Config(
            "either --numbers or --numbers-file is required".into(),
        ));
    };
    let contents = std::fs::read_to_string(path)
        .map_err(|e| DomainError::Config(format!("cannot read {}: {e}", path.display())))?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn inline_numbers_split_on_commas_and_spaces() {
        let raw = load_raw_recipients(Some("966500000001, 966500000002 966500000003"), None)
            .unwrap();
        assert_eq!(
            raw,
            vec!["966500000001", "966500000002", "966500000003"]
        );
    }

    #[test]
    fn numbers_file_skips_blanks_and_comments() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "# fleet A").unwrap();
        writeln!(f, "966500000001").unwrap();
        writeln!(f).unwrap();
        writeln!(f, "  966500000002  ").unwrap();
        let raw = load_raw_recipients(None, Some(f.path())).unwrap();
        assert_eq!(raw, vec!["966500000001", "966500000002"]);
    }

    #[test]
    fn at_prefix_reads_file_preserving_newlines() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "line one\nسطر عربي\n").unwrap();
        let arg = format!("@{}", f.path().display());
        let text = resolve_text_arg(Some(&arg)).unwrap().unwrap();
        assert_eq!(text, "line one\nسطر عربي\n");
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(
            resolve_text_arg(Some("hello")).unwrap().as_deref(),
            Some("hello")
        );
        assert_eq!(resolve_text_arg(None).unwrap(), None);
    }

    #[test]
    fn missing_at_file_is_a_config_error() {
        let err = resolve_text_arg(Some("@/no/such/file.txt")).unwrap_err();
        assert!(matches!(err, DomainError::Config(_)));
    }
}
