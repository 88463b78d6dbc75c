// CLI layer - argument parsing and terminal output.
// Like any front end it stays THIN: it turns user input into a core
// request and core results into text.

#[path = "args.rs"]
pub mod args;

#[path = "report.rs"]
pub mod report;

pub use args::CliArgs;
