/// Keeps the tail of the message list visible.
///
/// The viewport snaps to the bottom whenever the conversation length or the
/// loading flag differs from what the previous render saw. Between those
/// triggers a manual scroll position is left alone.
#[derive(Debug, Default)]
pub struct AutoScroll {
    offset: u16,
    seen_len: usize,
    seen_loading: bool,
    // snap on the very first render too
    primed: bool,
}

impl AutoScroll {
    pub fn offset(&self) -> u16 {
        self.offset
    }

    /// Called once per render with the current triggers and content size.
    /// Returns the scroll offset to draw with.
    pub fn sync(&mut self, len: usize, loading: bool, total_lines: u16, viewport: u16) -> u16 {
        let max = total_lines.saturating_sub(viewport);
        let changed = !self.primed || len != self.seen_len || loading != self.seen_loading;

        self.primed = true;
        self.seen_len = len;
        self.seen_loading = loading;

        if changed {
            self.offset = max;
        } else {
            self.offset = self.offset.min(max);
        }
        self.offset
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.offset = self.offset.saturating_sub(lines);
    }

    // Clamped against content size at the next `sync`
    pub fn scroll_down(&mut self, lines: u16) {
        self.offset = self.offset.saturating_add(lines);
    }
}
