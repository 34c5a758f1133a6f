//! Header drag gesture state.
//
//! Pure pixel arithmetic; the facade feeds it pointer coordinates and the
//! controller applies the resulting left/top to the floating container. One
//! gesture owns the state at a time: a second mousedown while a drag is
//! active is ignored and the active gesture keeps its anchor until its own
//! mouseup.

use crate::section::SectionId;

#[derive(Debug, Clone)]
pub struct HeaderDrag {
    pub section: SectionId,
    /// Container origin when the gesture started.
    pub initial_x: i32,
    pub initial_y: i32,
    /// Pointer position when the gesture started.
    pub start_x: i32,
    pub start_y: i32,
}

#[derive(Debug, Default)]
pub struct DragState {
    active: Option<HeaderDrag>,
}

impl DragState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_section(&self) -> Option<&SectionId> {
        self.active.as_ref().map(|drag| &drag.section)
    }

    /// Returns false when a gesture is already in flight.
    pub fn begin(
        &mut self,
        section: SectionId,
        initial_x: i32,
        initial_y: i32,
        mouse_x: i32,
        mouse_y: i32,
    ) -> bool {
        if self.active.is_some() {
            return false;
        }
        self.active = Some(HeaderDrag {
            section,
            initial_x,
            initial_y,
            start_x: mouse_x,
            start_y: mouse_y,
        });
        true
    }

    /// New container origin for the current pointer position, or `None`
    /// when no gesture is active.
    pub fn update(&self, mouse_x: i32, mouse_y: i32) -> Option<(SectionId, i32, i32)> {
        let drag = self.active.as_ref()?;
        let x = drag.initial_x + (mouse_x - drag.start_x);
        let y = drag.initial_y + (mouse_y - drag.start_y);
        Some((drag.section.clone(), x, y))
    }

    pub fn end(&mut self) -> Option<SectionId> {
        self.active.take().map(|drag| drag.section)
    }
}

/// `"164px"` → 164. Unset or malformed styles anchor at 0.
pub fn parse_px(value: Option<String>) -> i32 {
    value
        .as_deref()
        .and_then(|v| v.trim().strip_suffix("px"))
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_tracks_pointer_delta_from_the_anchor() {
        let mut drag = DragState::new();
        assert!(drag.begin(SectionId::new("notes"), 32, 60, 100, 200));
        let (section, x, y) = drag.update(110, 190).unwrap();
        assert_eq!(section.as_str(), "notes");
        assert_eq!((x, y), (42, 50));
        // the anchor stays fixed across updates
        let (_, x, y) = drag.update(90, 200).unwrap();
        assert_eq!((x, y), (22, 60));
    }

    #[test]
    fn second_mousedown_during_a_gesture_is_ignored() {
        let mut drag = DragState::new();
        assert!(drag.begin(SectionId::new("notes"), 0, 0, 10, 10));
        assert!(!drag.begin(SectionId::new("timer"), 5, 5, 0, 0));
        assert_eq!(drag.end().unwrap().as_str(), "notes");
        assert!(!drag.is_active());
    }

    #[test]
    fn update_after_end_is_a_no_op() {
        let mut drag = DragState::new();
        drag.begin(SectionId::new("notes"), 0, 0, 0, 0);
        drag.end();
        assert!(drag.update(50, 50).is_none());
    }

    #[test]
    fn parse_px_handles_unset_and_malformed_values() {
        assert_eq!(parse_px(Some("164px".into())), 164);
        assert_eq!(parse_px(Some(" -8px ".into())), -8);
        assert_eq!(parse_px(Some("auto".into())), 0);
        assert_eq!(parse_px(None), 0);
    }
}
