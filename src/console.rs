//! Console output formatting with ANSI color support.
//!
//! Colors are used only when stdout is a terminal and `NO_COLOR` is unset.
//! Diagnostic logging goes through `tracing` on stderr; this module is for
//! the user-facing progress lines.

use std::io::{self, IsTerminal};

/// ANSI style codes for terminal formatting.
#[derive(Debug, Clone, Copy)]
pub enum Style {
    Bold,
    Dim,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    Gray,
}

impl Style {
    fn code(self) -> &'static str {
        match self {
            Style::Bold => "1",
            Style::Dim => "2",
            Style::Red => "31",
            Style::Green => "32",
            Style::Yellow => "33",
            Style::Blue => "34",
            Style::Magenta => "35",
            Style::Cyan => "36",
            Style::Gray => "90",
        }
    }
}

const RESET: &str = "\x1b[0m";

/// Console output handler with color support detection.
#[derive(Debug)]
pub struct Console {
    colors_enabled: bool,
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

impl Console {
    /// Creates a Console, enabling colors for an interactive stdout.
    pub fn new() -> Self {
        let colors_enabled = std::env::var("NO_COLOR").is_err() && io::stdout().is_terminal();

        Self { colors_enabled }
    }

    pub fn with_colors(enabled: bool) -> Self {
        Self {
            colors_enabled: enabled,
        }
    }

    /// Applies ANSI styles to text if colors are enabled.
    pub fn style(&self, text: &str, styles: &[Style]) -> String {
        if !self.colors_enabled || styles.is_empty() {
            return text.to_string();
        }

        let codes: Vec<&str> = styles.iter().map(|s| s.code()).collect();
        format!("\x1b[{}m{}{}", codes.join(";"), text, RESET)
    }

    /// Creates a colored label like `[INFO]`.
    pub fn label(&self, label: &str, color: Style) -> String {
        let styled = self.style(label, &[color, Style::Bold]);
        format!("[{}]", styled)
    }

    fn line(&self, label: &str, color: Style, message: &str) -> String {
        format!("{} {}", self.label(label, color), message)
    }

    pub fn info(&self, message: &str) {
        println!("{}", self.line("INFO", Style::Blue, message));
    }

    pub fn success(&self, message: &str) {
        println!("{}", self.line("OK", Style::Green, message));
    }

    pub fn warning(&self, message: &str) {
        println!("{}", self.line("WARN", Style::Yellow, message));
    }

    /// Prints an error message with red `[ERROR]` label to stderr.
    pub fn error(&self, message: &str) {
        eprintln!("{}", self.line("ERROR", Style::Red, message));
    }

    pub fn step(&self, message: &str) {
        println!("{}", self.line("STEP", Style::Cyan, message));
    }

    /// Prints a section header in magenta bold.
    pub fn section(&self, message: &str) {
        println!();
        println!("{}", self.style(message, &[Style::Magenta, Style::Bold]));
    }

    /// Returns text styled as muted (dim gray).
    pub fn muted(&self, text: &str) -> String {
        self.style(text, &[Style::Gray, Style::Dim])
    }

    pub fn count(&self, n: usize) -> String {
        self.style(&n.to_string(), &[Style::Green, Style::Bold])
    }

    /// Formats a language pair like `english -> chinese`.
    pub fn language_pair(&self, source: &str, target: &str) -> String {
        format!(
            "{} {} {}",
            self.style(source, &[Style::Cyan, Style::Bold]),
            self.muted("->"),
            self.style(target, &[Style::Cyan, Style::Bold])
        )
    }

    /// Prints one indented line of a field listing.
    pub fn field(&self, index: usize, name: &str) {
        println!("  {} {}", self.muted(&format!("{:>3}.", index)), name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_disabled() {
        let console = Console::with_colors(false);
        assert_eq!(console.style("hello", &[Style::Red]), "hello");
    }

    #[test]
    fn test_style_enabled() {
        let console = Console::with_colors(true);
        let styled = console.style("hello", &[Style::Red]);
        assert!(styled.contains("\x1b[31m"));
        assert!(styled.contains("hello"));
        assert!(styled.contains(RESET));
    }

    #[test]
    fn test_multiple_styles() {
        let console = Console::with_colors(true);
        let styled = console.style("hello", &[Style::Bold, Style::Red]);
        assert!(styled.contains("1;31"));
    }

    #[test]
    fn test_label() {
        let console = Console::with_colors(false);
        assert_eq!(console.label("INFO", Style::Blue), "[INFO]");
    }

    #[test]
    fn test_language_pair_plain() {
        let console = Console::with_colors(false);
        assert_eq!(console.language_pair("english", "chinese"), "english -> chinese");
        assert_eq!(console.count(16), "16");
    }

    #[test]
    fn test_error_line() {
        let plain = Console::with_colors(false);
        assert_eq!(
            plain.line("ERROR", Style::Red, "Translation failed: HTTP 401"),
            "[ERROR] Translation failed: HTTP 401"
        );

        let colored = Console::with_colors(true);
        assert!(colored.line("ERROR", Style::Red, "boom").contains("\x1b[31;1mERROR"));
    }
}
