use colored::Colorize;

/// Console message styling for user-facing output.
pub struct ColorString;

impl ColorString {
    pub fn info(message: &str) -> String {
        message.green().to_string()
    }

    pub fn warning(message: &str) -> String {
        message.yellow().to_string()
    }

    pub fn error(message: &str) -> String {
        message.red().bold().to_string()
    }
}
