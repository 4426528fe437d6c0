use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Width below which panes stack vertically
const STACK_BELOW: u16 = 80;

/// Layout configuration
pub struct AppLayout {
    pub left_ratio: u16,
}

/// Computed layout areas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutAreas {
    pub file_list: Rect,
    pub preview: Rect,
    pub status_bar: Rect,
}

impl AppLayout {
    pub fn new(left_ratio: u16) -> Self {
        Self {
            left_ratio: left_ratio.clamp(10, 90),
        }
    }

    pub fn compute(&self, area: Rect) -> LayoutAreas {
        let [main_area, status_bar] = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .areas(area);

        let (direction, constraints) = if area.width >= STACK_BELOW {
            (
                Direction::Horizontal,
                [
                    Constraint::Percentage(self.left_ratio),
                    Constraint::Percentage(100 - self.left_ratio),
                ],
            )
        } else {
            (
                Direction::Vertical,
                [Constraint::Percentage(30), Constraint::Percentage(70)],
            )
        };

        let [file_list, preview] = Layout::default()
            .direction(direction)
            .constraints(constraints)
            .areas(main_area);

        LayoutAreas {
            file_list,
            preview,
            status_bar,
        }
    }
}

/// Calculate centered rect for modal
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let [_, middle, _] = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .areas(area);

    let [_, center, _] = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .areas(middle);
    center
}
