use std::fmt::Display;

use console::style;

pub fn success(msg: &str) {
    println!("{} {}", style("done").green().bold(), msg);
}

/// Errors and warnings go to stderr so artifacts printed on stdout stay clean.
pub fn error(msg: &str) {
    eprintln!("{} {}", style("error:").red().bold(), msg);
}

pub fn warn(msg: &str) {
    eprintln!("{} {}", style("warning:").yellow().bold(), msg);
}

/// Aligned `label  value` line under a heading.
pub fn detail(label: &str, value: impl Display) {
    println!("  {} {}", style(format!("{:<10}", label)).dim(), value);
}

/// Bulleted line, e.g. one validation problem.
pub fn item(msg: &str) {
    eprintln!("  - {}", msg);
}
