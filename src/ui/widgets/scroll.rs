/// Cursor and viewport offset over a list of `len` rows
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScrollState {
    pub cursor: usize,
    pub offset: usize,
    len: usize,
}

impl ScrollState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update the row count, clamping the cursor
    pub fn set_len(&mut self, len: usize) {
        self.len = len;
        self.cursor = self.cursor.min(len.saturating_sub(1));
        self.offset = self.offset.min(self.cursor);
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
        self.offset = 0;
    }

    pub fn move_down(&mut self) {
        self.move_down_n(1);
    }

    pub fn move_up(&mut self) {
        self.move_up_n(1);
    }

    pub fn move_down_n(&mut self, n: usize) {
        self.cursor = (self.cursor + n).min(self.len.saturating_sub(1));
    }

    pub fn move_up_n(&mut self, n: usize) {
        self.cursor = self.cursor.saturating_sub(n);
    }

    pub fn go_top(&mut self) {
        self.reset();
    }

    pub fn go_bottom(&mut self) {
        self.cursor = self.len.saturating_sub(1);
    }

    /// Adjust offset so the cursor is inside `visible_height` rows
    pub fn ensure_visible(&mut self, visible_height: usize) {
        if visible_height == 0 {
            return;
        }
        if self.cursor < self.offset {
            self.offset = self.cursor;
        } else if self.cursor >= self.offset + visible_height {
            self.offset = self.cursor + 1 - visible_height;
        }
    }

    pub fn scroll_percent(&self, visible_height: usize) -> String {
        if self.len <= visible_height {
            return String::new();
        }
        let percent = (self.offset * 100) / (self.len - visible_height);
        format!("{}%", percent.min(100))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(len: usize) -> ScrollState {
        let mut s = ScrollState::new();
        s.set_len(len);
        s
    }

    #[test]
    fn movement_is_clamped() {
        let mut s = state(3);
        s.move_up();
        assert_eq!(s.cursor, 0);
        s.move_down_n(10);
        assert_eq!(s.cursor, 2);
        s.move_down();
        assert_eq!(s.cursor, 2);
        s.go_top();
        assert_eq!(s.cursor, 0);
    }

    #[test]
    fn shrinking_clamps_cursor() {
        let mut s = state(10);
        s.go_bottom();
        s.ensure_visible(4);
        s.set_len(2);
        assert_eq!(s.cursor, 1);
        assert!(s.offset <= s.cursor);
        s.set_len(0);
        assert_eq!(s.cursor, 0);
    }

    #[test]
    fn viewport_follows_cursor() {
        let mut s = state(20);
        s.move_down_n(9);
        s.ensure_visible(5);
        assert_eq!(s.offset, 5);
        s.move_up_n(7);
        s.ensure_visible(5);
        assert_eq!(s.offset, 2);
    }

    #[test]
    fn percent_only_when_scrollable() {
        let mut s = state(10);
        assert_eq!(s.scroll_percent(10), "");
        s.go_bottom();
        s.ensure_visible(5);
        assert_eq!(s.scroll_percent(5), "100%");
    }
}
