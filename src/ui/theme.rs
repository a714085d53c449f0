use owo_colors::Style;
use std::sync::OnceLock;

use crate::model::HttpMethod;

static THEME: OnceLock<Theme> = OnceLock::new();

#[derive(Debug, Clone)]
pub struct Theme {
    pub header: Style,
    pub success: Style,
    pub error: Style,
    pub warn: Style,
    pub dim: Style,
    pub muted: Style,
    pub read: Style,
    pub write: Style,
    pub destroy: Style,
}

impl Theme {
    pub fn detect() -> Self {
        if !console::Term::stdout().is_term() {
            return Self::plain();
        }
        Self::colored()
    }

    pub fn colored() -> Self {
        Self {
            header: Style::new().cyan().bold(),
            success: Style::new().green().bold(),
            error: Style::new().red().bold(),
            warn: Style::new().yellow().bold(),
            dim: Style::new().white().dimmed(),
            muted: Style::new().bright_black(),
            read: Style::new().blue().bold(),
            write: Style::new().green().bold(),
            destroy: Style::new().red().bold(),
        }
    }

    pub fn plain() -> Self {
        Self {
            header: Style::new(),
            success: Style::new(),
            error: Style::new(),
            warn: Style::new(),
            dim: Style::new(),
            muted: Style::new(),
            read: Style::new(),
            write: Style::new(),
            destroy: Style::new(),
        }
    }

    /// Style for an HTTP verb: safe reads, writes, deletes
    pub fn method(&self, method: HttpMethod) -> Style {
        match method {
            HttpMethod::Get | HttpMethod::Head | HttpMethod::Options => self.read.clone(),
            HttpMethod::Delete => self.destroy.clone(),
            HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch => self.write.clone(),
        }
    }
}

pub fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::detect)
}
