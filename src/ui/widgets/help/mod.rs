use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};

use crate::config::Colors;

/// Help modal widget
pub struct HelpModal<'a> {
    colors: &'a Colors,
}

impl<'a> HelpModal<'a> {
    pub fn new(colors: &'a Colors) -> Self {
        Self { colors }
    }
}

impl<'a> Widget for HelpModal<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.colors.border_style(true))
            .title(Span::styled("ctxdiff - keys", self.colors.style_header()))
            .title_alignment(Alignment::Center);

        let inner = block.inner(area);
        block.render(area, buf);

        let help_text = vec![
            Line::from(""),
            Line::from(Span::styled("Navigation", self.colors.style_header())),
            format_binding("j/k", "Move up/down", self.colors),
            format_binding("J/K", "Move fast (5 lines)", self.colors),
            format_binding("Ctrl-d/u", "Page down/up", self.colors),
            format_binding("g/G", "Jump to top/bottom", self.colors),
            format_binding("]/[", "Next/previous hunk", self.colors),
            format_binding("Tab", "Switch pane", self.colors),
            format_binding("Enter", "Open diff", self.colors),
            format_binding("Esc", "Back to file list", self.colors),
            Line::from(""),
            Line::from(Span::styled("Diff View", self.colors.style_header())),
            format_binding("s", "Toggle split/unified view", self.colors),
            Line::from(""),
            Line::from(Span::styled("Actions", self.colors.style_header())),
            format_binding("y", "Copy path:line to clipboard", self.colors),
            format_binding("r", "Refresh", self.colors),
            format_binding("q", "Quit", self.colors),
            Line::from(""),
            Line::from(Span::styled("Press ? or Esc to close", self.colors.style_muted())),
        ];

        Paragraph::new(help_text).wrap(Wrap { trim: false }).render(inner, buf);
    }
}

fn format_binding<'a>(key: &'a str, desc: &'a str, colors: &'a Colors) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("{:>10}", key), colors.style_header()),
        Span::raw("  "),
        Span::styled(desc, colors.style_text()),
    ])
}
