use console::style;

use crate::language::language_name;
use crate::types::DetectionResult;

pub struct Output;

impl Output {
    pub fn new() -> Self {
        Self
    }

    pub fn success(&self, message: &str) {
        println!("{} {}", style("✓").green(), message);
    }

    pub fn info(&self, message: &str) {
        println!("{} {}", style("ℹ").blue(), message);
    }

    pub fn section(&self, message: &str) {
        println!("\n{}", style(message).bold());
        println!("{}", "─".repeat(40));
    }

    /// One detection verdict, e.g. `✓ fr French via baidu (confirmed)`
    pub fn verdict(&self, result: &DetectionResult) {
        let marker = if result.confirmed {
            style("✓").green()
        } else {
            style("?").yellow()
        };
        let name = if result.is_auto() {
            "Undetermined"
        } else {
            language_name(&result.language)
        };
        println!(
            "{} {} {} via {} ({})",
            marker,
            style(&result.language).bold(),
            name,
            style(result.source).cyan(),
            if result.confirmed {
                "confirmed"
            } else {
                "unconfirmed"
            }
        );
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}
