//! Command-line interface for the `staircase` binary.

pub mod commands;
pub mod output;
pub mod types;

pub use types::{Cli, Commands, TestArg};

use crate::domain::errors::StaircaseError;

/// Print a command error and exit with a non-zero status.
///
/// Domain errors get exit code 2 so scripts can tell bad input from
/// configuration or I/O failures.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    let code = if err.downcast_ref::<StaircaseError>().is_some() { 2 } else { 1 };

    if json_mode {
        let causes: Vec<String> = err.chain().skip(1).map(ToString::to_string).collect();
        let body = serde_json::json!({
            "error": err.to_string(),
            "causes": causes,
        });
        eprintln!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("Error: {err}");
        for cause in err.chain().skip(1) {
            eprintln!("  caused by: {cause}");
        }
    }

    std::process::exit(code);
}
