use dialoguer::{Input, Select};
use stackup::Prompter;

use crate::ui::theme::StackupTheme;

/// [`Prompter`] backed by dialoguer, used only when stdin is a terminal.
pub struct DialoguerPrompter {
    theme: StackupTheme,
}

impl DialoguerPrompter {
    pub fn new(unicode: bool) -> Self {
        Self {
            theme: StackupTheme::new(unicode),
        }
    }
}

impl Prompter for DialoguerPrompter {
    fn input(&self, prompt: &str) -> std::io::Result<String> {
        Input::<String>::with_theme(&self.theme)
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
            .map_err(into_io)
    }

    fn select(&self, prompt: &str, items: &[&str], default: usize) -> std::io::Result<usize> {
        Select::with_theme(&self.theme)
            .with_prompt(prompt)
            .items(items)
            .default(default)
            .interact()
            .map_err(into_io)
    }
}

fn into_io(err: dialoguer::Error) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, err)
}
