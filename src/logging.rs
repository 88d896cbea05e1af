//! Pretty-printing messages to the console

use crate::error::AssemblerError;
use colored::Colorize;

/// Pretty-print an error message to the console
pub fn error(error_message: String) {
    let error_title = "error:".red().bold();
    eprintln!("{} {}", error_title, error_message);
}

/// Pretty-print a warning message to the console
pub fn warning(message: String, line_number: usize) {
    let warning = "warning:".yellow().bold();
    eprintln!("{} line {}: {}", warning, line_number, message);
}

/// Print one diagnostic per accumulated error, in the order they were
/// recorded.
pub fn report(errors: &[AssemblerError]) {
    for err in errors {
        error(err.to_string());
    }
}
