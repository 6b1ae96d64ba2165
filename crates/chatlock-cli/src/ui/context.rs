//! Terminal probing and the resulting output mode.

use std::io::IsTerminal;

/// How a command formats what it prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Frames and listings as JSON documents
    Json,
    /// `key=value` lines, stable for scripts
    #[default]
    Plain,
    /// Badges, colour and aligned tables
    Pretty,
}

impl OutputMode {
    /// `--json` wins; a dumb or piped terminal gets plain text.
    pub fn resolve(json: bool, stdout_tty: bool, dumb_term: bool) -> Self {
        match (json, stdout_tty && !dumb_term) {
            (true, _) => Self::Json,
            (false, true) => Self::Pretty,
            (false, false) => Self::Plain,
        }
    }

    pub fn is_json(&self) -> bool {
        *self == Self::Json
    }

    pub fn is_pretty(&self) -> bool {
        *self == Self::Pretty
    }
}

/// What the current terminal can show.
#[derive(Debug, Clone)]
pub struct UiContext {
    pub color: bool,
    pub unicode: bool,
    pub width: usize,
    pub mode: OutputMode,
}

impl UiContext {
    /// Probe stdout and the environment, then apply the global flags.
    pub fn from_env(json: bool, no_color: bool, ascii: bool) -> Self {
        let stdout_tty = std::io::stdout().is_terminal();
        let dumb_term = std::env::var("TERM").is_ok_and(|term| term == "dumb");
        let color_allowed = std::env::var_os("NO_COLOR").is_none() && !no_color;

        Self {
            color: stdout_tty && !dumb_term && color_allowed,
            unicode: !ascii,
            width: columns_from_env().or_else(tty_columns).unwrap_or(80),
            mode: OutputMode::resolve(json, stdout_tty, dumb_term),
        }
    }

    /// PIN prompts need both a keyboard and somewhere to echo the prompt.
    pub fn is_interactive() -> bool {
        std::io::stdin().is_terminal() && std::io::stderr().is_terminal()
    }
}

fn columns_from_env() -> Option<usize> {
    std::env::var("COLUMNS")
        .ok()
        .and_then(|cols| cols.trim().parse::<usize>().ok())
        .filter(|cols| *cols > 0)
}

#[cfg(unix)]
fn tty_columns() -> Option<usize> {
    let mut size = libc::winsize {
        ws_row: 0,
        ws_col: 0,
        ws_xpixel: 0,
        ws_ypixel: 0,
    };
    // SAFETY: TIOCGWINSZ fills the winsize struct we own and nothing else.
    let rc = unsafe {
        libc::ioctl(
            libc::STDOUT_FILENO,
            libc::TIOCGWINSZ,
            &mut size as *mut libc::winsize,
        )
    };
    (rc == 0 && size.ws_col > 0).then_some(size.ws_col as usize)
}

#[cfg(not(unix))]
fn tty_columns() -> Option<usize> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_flag_beats_terminal() {
        assert_eq!(OutputMode::resolve(true, true, false), OutputMode::Json);
        assert_eq!(OutputMode::resolve(true, false, true), OutputMode::Json);
    }

    #[test]
    fn test_pretty_needs_a_real_terminal() {
        assert_eq!(OutputMode::resolve(false, true, false), OutputMode::Pretty);
        assert_eq!(OutputMode::resolve(false, true, true), OutputMode::Plain);
        assert_eq!(OutputMode::resolve(false, false, false), OutputMode::Plain);
    }

    #[test]
    fn test_flags_apply_to_context() {
        let ctx = UiContext::from_env(true, true, true);
        assert_eq!(ctx.mode, OutputMode::Json);
        assert!(!ctx.color);
        assert!(!ctx.unicode);
        assert!(ctx.width > 0);
    }
}
