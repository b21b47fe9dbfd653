//! Runner file commands (`GITHUB_OUTPUT`, `GITHUB_STATE`, `GITHUB_STEP_SUMMARY`)

use rand::Rng;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::RunnerPaths;
use crate::error::{ActionError, Result};

/// Appends step outputs, saved state and the job summary
pub struct RunnerFiles {
    paths: RunnerPaths,
}

impl RunnerFiles {
    pub fn new(paths: RunnerPaths) -> Self {
        Self { paths }
    }

    /// Append `key=value` records to the step output file and the step state file.
    ///
    /// Both files are resolved and opened before either is written, so a missing or unwritable
    /// state file leaves the outputs untouched.
    pub fn publish(&self, outputs: &[(&str, &str)], state: &[(&str, &str)]) -> Result<()> {
        let output_path = required_path(&self.paths.output, "GITHUB_OUTPUT")?;
        let state_path = required_path(&self.paths.state, "GITHUB_STATE")?;

        let mut output_file = open_append(output_path)?;
        let mut state_file = open_append(state_path)?;

        write(&mut output_file, output_path, &format_records(outputs))?;
        write(&mut state_file, state_path, &format_records(state))
    }

    /// Append markdown to the job summary. Returns `false` when the runner has no summary file.
    pub fn append_summary(&self, markdown: &str) -> Result<bool> {
        let Some(path) = &self.paths.summary else {
            return Ok(false);
        };
        let mut contents = markdown.to_string();
        if !contents.ends_with('\n') {
            contents.push('\n');
        }
        append(path, &contents)?;
        Ok(true)
    }
}

fn required_path<'a>(path: &'a Option<PathBuf>, name: &str) -> Result<&'a Path> {
    path.as_deref()
        .ok_or_else(|| ActionError::io(format!("{} is not set", name)))
}

fn open_append(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| ActionError::io(format!("failed to open {}: {}", path.display(), e)))
}

fn write(file: &mut File, path: &Path, contents: &str) -> Result<()> {
    file.write_all(contents.as_bytes())
        .map_err(|e| ActionError::io(format!("failed to write {}: {}", path.display(), e)))
}

fn append(path: &Path, contents: &str) -> Result<()> {
    let mut file = open_append(path)?;
    write(&mut file, path, contents)
}

/// One record per line; values spanning lines use the `key<<DELIMITER` form
fn format_records(records: &[(&str, &str)]) -> String {
    let mut out = String::new();
    for (key, value) in records {
        if value.contains('\n') || value.contains('\r') {
            let delimiter = unique_delimiter(value);
            out.push_str(&format!("{}<<{}\n{}\n{}\n", key, delimiter, value, delimiter));
        } else {
            out.push_str(&format!("{}={}\n", key, value));
        }
    }
    out
}

fn unique_delimiter(value: &str) -> String {
    let mut rng = rand::thread_rng();
    loop {
        let delimiter = format!("ghadelimiter_{}", hex::encode(rng.gen::<[u8; 16]>()));
        if !value.contains(&delimiter) {
            return delimiter;
        }
    }
}
