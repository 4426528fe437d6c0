use ratatui::style::{Color, Modifier, Style};
use std::time::Duration;

pub use crate::theme::ThemeMode;

/// Terminal width below which the split view falls back to unified
const DEFAULT_SPLIT_MIN_WIDTH: u16 = 100;

/// Application configuration
pub struct Config {
    pub theme: ThemeMode,
    pub colors: Colors,
    pub layout: LayoutConfig,
    pub timing: Timing,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: ThemeMode::Dark,
            colors: Colors::dark(),
            layout: LayoutConfig::default(),
            timing: Timing::default(),
        }
    }
}

impl Config {
    /// Build the configuration from the environment
    pub fn from_env() -> Self {
        let theme = ThemeMode::detect();
        let mut config = Self {
            theme,
            colors: Colors::for_theme(theme),
            ..Self::default()
        };
        if let Some(width) = std::env::var("CTXDIFF_SPLIT_WIDTH").ok().and_then(|v| v.parse().ok()) {
            config.layout.split_min_width = width;
        }
        config
    }
}

pub struct LayoutConfig {
    pub split_min_width: u16,
    /// Width of the file list, percent of the screen
    pub left_ratio: u16,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            split_min_width: DEFAULT_SPLIT_MIN_WIDTH,
            left_ratio: 30,
        }
    }
}

pub struct Timing {
    pub tick_rate: Duration,
    pub watch_debounce: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            tick_rate: Duration::from_millis(250),
            watch_debounce: Duration::from_millis(300),
        }
    }
}

/// Color palette, adapted to the theme
pub struct Colors {
    pub added: Color,
    pub removed: Color,
    pub added_bg: Color,
    pub removed_bg: Color,
    pub modified: Color,
    pub renamed: Color,
    pub header: Color,
    pub muted: Color,
    pub text: Color,
    pub border: Color,
    pub border_focused: Color,
    pub status_bar: Color,
    pub status_bar_text: Color,
    pub entity: Color,
}

impl Colors {
    pub fn for_theme(theme: ThemeMode) -> Self {
        match theme {
            ThemeMode::Dark => Self::dark(),
            ThemeMode::Light => Self::light(),
        }
    }

    /// Catppuccin Mocha
    pub fn dark() -> Self {
        Self {
            added: Color::Rgb(166, 227, 161),
            removed: Color::Rgb(243, 139, 168),
            added_bg: Color::Rgb(30, 50, 40),
            removed_bg: Color::Rgb(50, 30, 35),
            modified: Color::Rgb(250, 179, 135),
            renamed: Color::Rgb(203, 166, 247),
            header: Color::Rgb(137, 180, 250),
            muted: Color::Rgb(108, 112, 134),
            text: Color::Rgb(205, 214, 244),
            border: Color::Rgb(69, 71, 90),
            border_focused: Color::Rgb(137, 180, 250),
            status_bar: Color::Rgb(49, 50, 68),
            status_bar_text: Color::Rgb(205, 214, 244),
            entity: Color::Rgb(249, 226, 175),
        }
    }

    /// High contrast for light backgrounds
    pub fn light() -> Self {
        Self {
            added: Color::Rgb(0, 110, 0),
            removed: Color::Rgb(180, 0, 30),
            added_bg: Color::Rgb(210, 245, 210),
            removed_bg: Color::Rgb(255, 215, 220),
            modified: Color::Rgb(160, 80, 0),
            renamed: Color::Rgb(90, 20, 180),
            header: Color::Rgb(0, 60, 180),
            muted: Color::Rgb(60, 60, 70),
            text: Color::Rgb(10, 10, 15),
            border: Color::Rgb(150, 155, 170),
            border_focused: Color::Rgb(0, 60, 180),
            status_bar: Color::Rgb(220, 225, 235),
            status_bar_text: Color::Rgb(10, 10, 15),
            entity: Color::Rgb(120, 70, 0),
        }
    }

    pub fn style_added(&self) -> Style {
        Style::default().fg(self.added)
    }

    pub fn style_removed(&self) -> Style {
        Style::default().fg(self.removed)
    }

    pub fn style_modified(&self) -> Style {
        Style::default().fg(self.modified)
    }

    pub fn style_muted(&self) -> Style {
        Style::default().fg(self.muted)
    }

    pub fn style_text(&self) -> Style {
        Style::reset().fg(self.text)
    }

    pub fn style_entity(&self) -> Style {
        Style::default().fg(self.entity)
    }

    pub fn style_header(&self) -> Style {
        Style::default().fg(self.header).add_modifier(Modifier::BOLD)
    }

    pub fn style_selected(&self) -> Style {
        Style::default().fg(self.text).add_modifier(Modifier::BOLD)
    }

    pub fn border_style(&self, focused: bool) -> Style {
        Style::default().fg(if focused { self.border_focused } else { self.border })
    }

    pub fn style_status_bar(&self) -> Style {
        Style::default().bg(self.status_bar).fg(self.status_bar_text)
    }
}
