use crate::cli::ColorWhen;
use crate::ui::terminal::{detect_capabilities, TerminalCapabilities};

/// Rendering decisions for one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiContext {
    pub verbose: u8,
    pub color: bool,
    pub unicode: bool,
    /// Prompts are allowed
    pub interactive: bool,
}

impl UiContext {
    pub fn new(verbose: u8, cli_color: Option<ColorWhen>) -> Self {
        Self::from_caps(verbose, cli_color, detect_capabilities())
    }

    pub(crate) fn from_caps(
        verbose: u8,
        cli_color: Option<ColorWhen>,
        caps: TerminalCapabilities,
    ) -> Self {
        let color = match cli_color {
            Some(ColorWhen::Never) => false,
            Some(ColorWhen::Always) => true,
            Some(ColorWhen::Auto) | None => caps.supports_color && !caps.is_ci,
        };

        Self {
            verbose,
            color,
            unicode: caps.supports_unicode,
            interactive: caps.stdin_tty && !caps.is_ci,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tty_caps(is_ci: bool) -> TerminalCapabilities {
        TerminalCapabilities {
            stdin_tty: true,
            supports_color: true,
            supports_unicode: true,
            is_ci,
        }
    }

    #[test]
    fn cli_color_overrides_detection() {
        let ui = UiContext::from_caps(0, Some(ColorWhen::Always), tty_caps(true));
        assert!(ui.color);

        let ui = UiContext::from_caps(0, Some(ColorWhen::Never), tty_caps(false));
        assert!(!ui.color);
    }

    #[test]
    fn ci_disables_auto_color_and_prompts() {
        let ui = UiContext::from_caps(0, None, tty_caps(true));
        assert!(!ui.color);
        assert!(!ui.interactive);
    }

    #[test]
    fn tty_stdin_allows_prompts() {
        let ui = UiContext::from_caps(1, Some(ColorWhen::Auto), tty_caps(false));
        assert!(ui.color);
        assert!(ui.interactive);
    }
}
