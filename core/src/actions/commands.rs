//! Runner workflow commands (`::name::value` lines on stdout)

/// Escape command data so that a multi-line value stays one command
fn escape_data(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Format a workflow command line
pub fn format_command(name: &str, value: &str) -> String {
    format!("::{}::{}", name, escape_data(value))
}

/// Annotate the job with an error
pub fn error(message: &str) {
    println!("{}", format_command("error", message));
}

/// Ask the runner to redact `value` from all subsequent log output
pub fn add_mask(value: &str) {
    println!("{}", format_command("add-mask", value));
}
