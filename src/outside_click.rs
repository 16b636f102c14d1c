use ratatui::layout::Rect;
use tracing::trace;

/// Check if a point is within a rectangle
pub fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

/// Closes the dialog on pointer-down anywhere except the dialog or launcher.
///
/// The detector is only listening while attached. The widget attaches it
/// when the dialog opens and detaches it when the dialog closes.
#[derive(Debug, Default)]
pub struct OutsideClickDetector {
    attached: bool,
}

impl OutsideClickDetector {
    pub fn attach(&mut self) {
        if !self.attached {
            trace!("outside-click listener attached");
        }
        self.attached = true;
    }

    pub fn detach(&mut self) {
        if self.attached {
            trace!("outside-click listener detached");
        }
        self.attached = false;
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Whether a pointer-down at (`x`, `y`) should close the dialog
    pub fn should_close(&self, x: u16, y: u16, dialog: Option<Rect>, launcher: Option<Rect>) -> bool {
        if !self.attached {
            return false;
        }
        let in_dialog = dialog.map(|r| point_in_rect(x, y, r)).unwrap_or(false);
        let in_launcher = launcher.map(|r| point_in_rect(x, y, r)).unwrap_or(false);
        !in_dialog && !in_launcher
    }
}
