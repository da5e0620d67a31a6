//! Operator-facing progress lines
//!
//! Everything goes to stderr so stdout stays free for compose output.

use stackup::ConfigWarning;
use stackup::StepOutcome;

use crate::ui::context::UiContext;
use crate::ui::primitives::icon::Icon;

/// Writes progress, warnings and errors for one run.
#[derive(Debug, Clone, Copy)]
pub struct Reporter {
    ui: UiContext,
}

impl Reporter {
    pub fn new(ui: UiContext) -> Self {
        Self { ui }
    }

    pub fn ui(&self) -> &UiContext {
        &self.ui
    }

    fn icon(&self, icon: Icon) -> String {
        icon.colored(self.ui.color, self.ui.unicode)
    }

    pub fn step(&self, message: impl AsRef<str>) {
        eprintln!("{} {}", self.icon(Icon::Progress), message.as_ref());
    }

    pub fn success(&self, message: impl AsRef<str>) {
        eprintln!("{} {}", self.icon(Icon::Success), message.as_ref());
    }

    pub fn warn(&self, message: impl AsRef<str>) {
        eprintln!("{} {}", self.icon(Icon::Warning), message.as_ref());
    }

    pub fn error(&self, message: impl AsRef<str>) {
        eprintln!("{} {}", self.icon(Icon::Error), message.as_ref());
    }

    pub fn hint(&self, message: impl AsRef<str>) {
        eprintln!("  {} {}", self.icon(Icon::Arrow), message.as_ref());
    }

    /// Print the warnings of a degraded step, returning them for the summary.
    pub fn outcome(&self, outcome: &StepOutcome) -> Vec<String> {
        for warning in outcome.warnings() {
            self.warn(warning);
        }
        outcome.warnings().to_vec()
    }

    pub fn config_warnings(&self, warnings: &[ConfigWarning]) {
        for w in warnings {
            let location = match w.line {
                Some(line) => format!("{}:{}", w.file.display(), line),
                None => w.file.display().to_string(),
            };
            self.warn(format!("Unknown config key '{}' in {}", w.key, location));
            if let Some(suggestion) = &w.suggestion {
                self.hint(format!("Did you mean '{}'?", suggestion));
            }
        }
    }
}
