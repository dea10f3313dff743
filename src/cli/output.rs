//! Styled terminal output for taskpool
//!
//! Results go to stdout unstyled so they stay pipeable. Everything around
//! them (headers, summaries, warnings) is styled with `console` and honours
//! `--quiet` and `-v`.

use console::style;

/// Output handler for consistent CLI formatting
pub struct Output {
    verbose: bool,
    quiet: bool,
}

impl Output {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self { verbose, quiet }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("✔").green(), message);
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("⚠").yellow(), message);
        }
    }

    /// Print a verbose message (only if verbose mode is enabled)
    pub fn verbose(&self, message: &str) {
        if self.verbose && !self.quiet {
            println!("{} {}", style("ℹ").dim(), style(message).dim());
        }
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Print a header/title
    pub fn header(&self, title: &str) {
        if !self.quiet {
            println!("\n{}", style(title).bold().underlined());
        }
    }

    /// Print a table row
    pub fn table_row(&self, key: &str, value: &str) {
        if !self.quiet {
            println!("  {:<20} {}", style(key).dim(), value);
        }
    }

    /// Print a count with the number highlighted when non-zero
    pub fn count_row(&self, key: &str, count: usize) {
        let value = if count == 0 {
            style(count.to_string()).dim()
        } else {
            style(count.to_string()).yellow().bold()
        };
        self.table_row(key, &value.to_string());
    }

    /// Print a plain result line; shown even in quiet mode
    pub fn line(&self, message: &str) {
        println!("{message}");
    }
}
