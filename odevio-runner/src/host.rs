//! CI host adapter
//!
//! Outputs and failures are reported with the GitHub Actions workflow
//! commands. Outside of a workflow, outputs are printed to stdout.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;

use tracing::debug;

/// File the host reads step outputs from
const OUTPUT_FILE_VAR: &str = "GITHUB_OUTPUT";

const DELIMITER: &str = "ODEVIO_EOF";

#[derive(Debug, Clone, Default)]
pub struct ActionHost {
    output_file: Option<PathBuf>,
}

impl ActionHost {
    pub fn from_env() -> Self {
        Self::with_output_file(
            std::env::var_os(OUTPUT_FILE_VAR)
                .filter(|value| !value.is_empty())
                .map(PathBuf::from),
        )
    }

    pub fn with_output_file(output_file: Option<PathBuf>) -> Self {
        Self { output_file }
    }

    /// Publishes a step output
    pub fn set_output(&self, name: &str, value: &str) -> io::Result<()> {
        let Some(path) = &self.output_file else {
            println!("{}={}", name, value);
            return Ok(());
        };

        debug!("Setting output {} in {}", name, path.display());
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(format_output(name, value).as_bytes())?;
        file.flush()
    }

    /// Marks the step as failed with `message`
    pub fn fail(&self, message: &str) {
        println!("::error::{}", escape_data(message));
    }
}

fn format_output(name: &str, value: &str) -> String {
    if !value.contains('\n') && !value.contains('\r') {
        return format!("{}={}\n", name, value);
    }

    let mut delimiter = DELIMITER.to_string();
    while value.contains(&delimiter) {
        delimiter.push('_');
    }
    format!("{}<<{}\n{}\n{}\n", name, delimiter, value, delimiter)
}

/// Escapes a workflow command payload
pub fn escape_data(data: &str) -> String {
    data.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_escape_data() {
        assert_eq!(escape_data("Build failed: 100% broken"), "Build failed: 100%25 broken");
        assert_eq!(escape_data("line one\r\nline two"), "line one%0D%0Aline two");
        assert_eq!(escape_data("plain"), "plain");
    }

    #[test]
    fn test_outputs_are_appended() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output");
        fs::write(&path, "previous=1\n").unwrap();
        let host = ActionHost::with_output_file(Some(path.clone()));

        host.set_output("ipa", "https://x/y.ipa").unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "previous=1\nipa=https://x/y.ipa\n"
        );
    }

    #[test]
    fn test_multiline_output_uses_delimiter() {
        assert_eq!(
            format_output("notes", "a\nb"),
            "notes<<ODEVIO_EOF\na\nb\nODEVIO_EOF\n"
        );
        assert_eq!(
            format_output("notes", "a\nODEVIO_EOF"),
            "notes<<ODEVIO_EOF_\na\nODEVIO_EOF\nODEVIO_EOF_\n"
        );
    }
}
