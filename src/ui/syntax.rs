use ratatui::style::{Color, Modifier, Style};
use syntect::easy::HighlightLines;
use syntect::highlighting::{FontStyle, Theme, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};

use crate::config::ThemeMode;

/// Styled fragments of one source line
pub type StyledLine = Vec<(String, Style)>;

const THEME_NAME: &str = "base16-eighties.dark";

/// Syntax highlighter using syntect
pub struct Highlighter {
    syntax_set: SyntaxSet,
    theme: Option<Theme>,
    theme_mode: ThemeMode,
}

impl Highlighter {
    pub fn for_theme(mode: ThemeMode) -> Self {
        // One dark theme for both modes; light mode darkens its colours
        let mut themes = ThemeSet::load_defaults().themes;
        Self {
            syntax_set: SyntaxSet::load_defaults_nonewlines(),
            theme: themes.remove(THEME_NAME),
            theme_mode: mode,
        }
    }

    fn syntax_for(&self, path: &str, first_line: &str) -> &SyntaxReference {
        let extension = path.rsplit('.').next().unwrap_or("");
        let mapped = match extension {
            "yml" => "yaml",
            "md" => "markdown",
            "mjs" | "cjs" | "jsx" => "js",
            ext => ext,
        };

        self.syntax_set
            .find_syntax_by_extension(mapped)
            .or_else(|| self.syntax_set.find_syntax_by_extension(extension))
            .or_else(|| self.syntax_set.find_syntax_by_first_line(first_line))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text())
    }

    /// Highlight consecutive lines of one file. Returns one entry per input
    /// line; empty when no theme is available.
    pub fn highlight_lines(&self, lines: &[&str], path: &str) -> Vec<StyledLine> {
        let Some(theme) = &self.theme else {
            return Vec::new();
        };

        let syntax = self.syntax_for(path, lines.first().copied().unwrap_or(""));
        let mut highlighter = HighlightLines::new(syntax, theme);
        let is_light = self.theme_mode == ThemeMode::Light;

        lines
            .iter()
            .map(|line| {
                highlighter
                    .highlight_line(line, &self.syntax_set)
                    .map(|ranges| {
                        ranges
                            .into_iter()
                            .map(|(style, text)| (text.to_string(), to_ratatui_style(&style, is_light)))
                            .collect()
                    })
                    .unwrap_or_else(|e| {
                        log::debug!("highlighting failed in {}: {}", path, e);
                        vec![(line.to_string(), Style::reset())]
                    })
            })
            .collect()
    }
}

/// Foreground only, so diff backgrounds show through
fn to_ratatui_style(style: &syntect::highlighting::Style, is_light: bool) -> Style {
    let fg = if is_light {
        darken_for_light_mode(style.foreground)
    } else {
        Color::Rgb(style.foreground.r, style.foreground.g, style.foreground.b)
    };

    let mut result = Style::reset().fg(fg);
    if style.font_style.contains(FontStyle::BOLD) {
        result = result.add_modifier(Modifier::BOLD);
    }
    if style.font_style.contains(FontStyle::ITALIC) {
        result = result.add_modifier(Modifier::ITALIC);
    }
    if style.font_style.contains(FontStyle::UNDERLINE) {
        result = result.add_modifier(Modifier::UNDERLINED);
    }
    result
}

/// Bright colours meant for a dark background are scaled down
fn darken_for_light_mode(color: syntect::highlighting::Color) -> Color {
    let lum = (0.299 * f32::from(color.r) + 0.587 * f32::from(color.g) + 0.114 * f32::from(color.b)) / 255.0;
    if lum <= 0.5 {
        return Color::Rgb(color.r, color.g, color.b);
    }
    let scale = |c: u8| (f32::from(c) * 0.35) as u8;
    Color::Rgb(scale(color.r), scale(color.g), scale(color.b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(line: &StyledLine) -> String {
        line.iter().map(|(t, _)| t.as_str()).collect()
    }

    #[test]
    fn highlights_one_entry_per_line() {
        let highlighter = Highlighter::for_theme(ThemeMode::Dark);
        let lines = ["id: F-1", "title: Login", "tags:", "  - auth"];
        let styled = highlighter.highlight_lines(&lines, "contexts/features/F-1.yaml");

        assert_eq!(styled.len(), lines.len());
        for (line, spans) in lines.iter().zip(&styled) {
            assert_eq!(&text_of(spans), line);
        }
    }

    #[test]
    fn yaml_line_splits_into_tokens() {
        let highlighter = Highlighter::for_theme(ThemeMode::Dark);
        let styled = highlighter.highlight_lines(&["key: value"], "x.yml");
        assert!(styled[0].len() > 1);
        assert!(styled[0].iter().all(|(_, s)| s.fg.is_some()));
    }

    #[test]
    fn light_mode_darkens_bright_colours() {
        let bright = syntect::highlighting::Color { r: 240, g: 240, b: 240, a: 255 };
        assert_eq!(darken_for_light_mode(bright), Color::Rgb(84, 84, 84));
        let dark = syntect::highlighting::Color { r: 10, g: 20, b: 30, a: 255 };
        assert_eq!(darken_for_light_mode(dark), Color::Rgb(10, 20, 30));
    }
}
