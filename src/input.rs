// Logical controls. The window layer maps physical keys onto these; the
// session only ever sees `Control` values.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Control {
    PanLeft,
    PanRight,
    PanUp,
    PanDown,
    RotateLeft,
    RotateRight,
    Drop,
    Reset,
    ToggleHitBoxes,
    ToggleFullscreen,
}

impl Control {
    /// Slot in the held-key table for the six continuous controls.
    fn held_slot(self) -> Option<usize> {
        match self {
            Control::PanLeft => Some(0),
            Control::PanRight => Some(1),
            Control::PanUp => Some(2),
            Control::PanDown => Some(3),
            Control::RotateLeft => Some(4),
            Control::RotateRight => Some(5),
            _ => None,
        }
    }
}

/// Held state of the pan/rotate controls. Level-triggered: a key keeps acting
/// every tick until it is released.
#[derive(Clone, Debug, Default)]
pub struct ControlState {
    held: [bool; 6],
}

impl ControlState {
    pub fn press(&mut self, control: Control) {
        if let Some(i) = control.held_slot() { self.held[i] = true; }
    }

    pub fn release(&mut self, control: Control) {
        if let Some(i) = control.held_slot() { self.held[i] = false; }
    }

    pub fn is_held(&self, control: Control) -> bool {
        control.held_slot().is_some_and(|i| self.held[i])
    }

    /// (-1..=1, -1..=1): right and up are positive.
    pub fn pan_axis(&self) -> (f32, f32) {
        (
            axis(self.is_held(Control::PanRight), self.is_held(Control::PanLeft)),
            axis(self.is_held(Control::PanUp), self.is_held(Control::PanDown)),
        )
    }

    /// Counter-clockwise (rotate left) is positive.
    pub fn rotate_axis(&self) -> f32 {
        axis(self.is_held(Control::RotateLeft), self.is_held(Control::RotateRight))
    }

    /// Forget every held key, e.g. when the window that would report their
    /// release goes away.
    pub fn clear(&mut self) {
        self.held = [false; 6];
    }
}

#[inline]
fn axis(positive: bool, negative: bool) -> f32 {
    (positive as i32 - negative as i32) as f32
}
