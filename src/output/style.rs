use owo_colors::OwoColorize;

/// Rendering preferences for report text.
///
/// Colors and emoji are applied unconditionally when enabled; piping
/// the report does not strip them. Setting `NO_COLOR` in the
/// environment disables color the same way `--no-color` does.
#[derive(Debug, Clone, Copy)]
pub struct Style {
    color: bool,
    emoji: bool,
}

impl Style {
    pub fn new(color: bool, emoji: bool) -> Self {
        Self { color, emoji }
    }

    /// Builds a style from the disable flags and the `NO_COLOR`
    /// environment variable.
    pub fn from_flags(no_color: bool, no_emoji: bool) -> Self {
        let color = !no_color && std::env::var_os("NO_COLOR").is_none();
        Self::new(color, !no_emoji)
    }

    pub fn color_enabled(&self) -> bool {
        self.color
    }

    pub fn emoji_enabled(&self) -> bool {
        self.emoji
    }

    pub fn red(&self, text: &str) -> String {
        if self.color {
            text.bright_red().to_string()
        } else {
            text.to_string()
        }
    }

    pub fn green(&self, text: &str) -> String {
        if self.color {
            text.bright_green().to_string()
        } else {
            text.to_string()
        }
    }

    pub fn yellow(&self, text: &str) -> String {
        if self.color {
            text.bright_yellow().to_string()
        } else {
            text.to_string()
        }
    }

    pub fn blue(&self, text: &str) -> String {
        if self.color {
            text.bright_blue().to_string()
        } else {
            text.to_string()
        }
    }

    /// Prefixes `text` with `symbol` when emoji output is enabled.
    pub fn emoji(&self, symbol: &str, text: &str) -> String {
        if self.emoji {
            format!("{symbol} {text}")
        } else {
            text.to_string()
        }
    }
}
