//! Report and payload files written by the CLI.

use std::fs;
use std::path::Path;

/// Unix line endings and exactly one trailing newline for non-empty text.
pub fn normalize_output_text(content: &str) -> String {
    let mut text = content.replace("\r\n", "\n").replace('\r', "\n");
    if text.is_empty() {
        return text;
    }
    let trimmed = text.trim_end_matches('\n').len();
    text.truncate(trimmed);
    text.push('\n');
    text
}

pub fn write_output_text(path: &Path, content: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, normalize_output_text(content))
}

#[cfg(test)]
mod tests {
    use super::{normalize_output_text, write_output_text};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn output_text_uses_unix_line_endings() {
        let normalized = normalize_output_text("alpha\r\nbeta\rgamma");
        assert_eq!(normalized, "alpha\nbeta\ngamma\n");
        assert_eq!(normalize_output_text("{}\n\n\n"), "{}\n");
        assert_eq!(normalize_output_text(""), "");
    }

    #[test]
    fn repeated_text_writes_produce_identical_bytes() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("reports/report.txt");
        let input = "line 1\r\nline 2\rline 3";

        write_output_text(&path, input).expect("first write should succeed");
        let first = fs::read(&path).expect("artifact should be readable");

        write_output_text(&path, input).expect("second write should succeed");
        let second = fs::read(&path).expect("artifact should be readable");

        assert_eq!(first, second);
        assert_eq!(second, b"line 1\nline 2\nline 3\n");
    }
}
