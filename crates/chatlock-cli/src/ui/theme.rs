//! Badges and text styles.

use owo_colors::{OwoColorize, Style};

/// Badge types for status indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Badge {
    Ok,
    Warn,
    Err,
    Info,
    Locked,
}

impl Badge {
    /// Get badge text (e.g., "[OK]")
    pub fn text(&self) -> &'static str {
        match self {
            Self::Ok => "[OK]",
            Self::Warn => "[WARN]",
            Self::Err => "[ERR]",
            Self::Info => "[INFO]",
            Self::Locked => "[LOCKED]",
        }
    }

    /// Get badge with symbol for display.
    pub fn display(&self, unicode: bool) -> &'static str {
        if !unicode {
            return self.text();
        }
        match self {
            Self::Ok => "[\u{2713}]",
            Self::Warn => "[\u{26A0}]",
            Self::Err => "[\u{2717}]",
            Self::Info => "[\u{2139}]",
            Self::Locked => "[\u{1F512}]",
        }
    }

    /// Style applied to the badge when color is on.
    pub fn style(&self) -> Style {
        match self {
            Self::Ok => styles::success(),
            Self::Warn => styles::warning(),
            Self::Err => styles::error(),
            Self::Info => styles::info(),
            Self::Locked => styles::locked(),
        }
    }
}

/// Named styles.
pub mod styles {
    use owo_colors::Style;

    pub fn bold() -> Style {
        Style::new().bold()
    }

    pub fn dim() -> Style {
        Style::new().dimmed()
    }

    pub fn success() -> Style {
        Style::new().green()
    }

    pub fn warning() -> Style {
        Style::new().yellow()
    }

    pub fn error() -> Style {
        Style::new().red()
    }

    pub fn info() -> Style {
        Style::new().cyan()
    }

    pub fn locked() -> Style {
        Style::new().magenta().bold()
    }
}

/// Apply `style` to `text` when `color` is on.
pub fn styled(text: &str, style: Style, color: bool) -> String {
    if color {
        text.style(style).to_string()
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_badge_text() {
        assert_eq!(Badge::Ok.text(), "[OK]");
        assert_eq!(Badge::Locked.text(), "[LOCKED]");
    }

    #[test]
    fn test_badge_display_ascii() {
        assert_eq!(Badge::Err.display(false), "[ERR]");
    }

    #[test]
    fn test_badge_display_unicode() {
        assert_eq!(Badge::Ok.display(true), "[\u{2713}]");
    }

    #[test]
    fn test_styled_without_color_is_plain() {
        assert_eq!(styled("hi", styles::bold(), false), "hi");
        assert_ne!(styled("hi", styles::bold(), true), "hi");
    }
}
