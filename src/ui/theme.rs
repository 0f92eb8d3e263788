use owo_colors::Style;
use std::sync::OnceLock;

static THEME: OnceLock<Theme> = OnceLock::new();

/// Styles for CLI output; plain when stdout is not a terminal
#[derive(Debug, Clone)]
pub struct Theme {
    pub header: Style,
    pub success: Style,
    pub error: Style,
    pub warn: Style,
    pub dim: Style,
    pub tag_key: Style,
    pub tag_value: Style,
    pub tag_id: Style,
}

impl Theme {
    /// Build the theme, dropping every color when `colored` is false
    pub fn new(colored: bool) -> Self {
        let pick = |style: Style| if colored { style } else { Style::new() };
        Self {
            header: pick(Style::new().cyan().bold()),
            success: pick(Style::new().green().bold()),
            error: pick(Style::new().red().bold()),
            warn: pick(Style::new().yellow().bold()),
            dim: pick(Style::new().white().dimmed()),
            tag_key: pick(Style::new().magenta().bold()),
            tag_value: pick(Style::new().green()),
            tag_id: pick(Style::new().bright_black()),
        }
    }

    fn for_stdout() -> Self {
        Self::new(console::Term::stdout().is_term())
    }
}

pub fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::for_stdout)
}
