use glam::Vec2;

use crate::sprite::Variant;

/// Host input, queued by the app and drained by the controller once per logic tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Pointer moved onto the bird.
    HoverEnter,
    /// Primary button pressed on the bird.
    Click,
    /// Touch started on the bird.
    Touch,
    /// Any user input anywhere on the desktop.
    Activity,
    SetVisible(bool),
    ToggleVisible,
    /// A modal menu opened or closed. The bird stays put while one is open.
    MenuOpened,
    MenuClosed,
    SetVariant(&'static Variant),
    /// Hop now if idle, skipping the dwell time.
    Hop,
}

/// Below this many pixels of movement the pointer counts as still.
const MOVE_EPSILON: f32 = 0.5;

/// Turns raw pointer polling into edge-triggered events.
pub struct PointerTracker {
    left_was_down: bool,
    hovering: bool,
    last_pos: Option<Vec2>,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self {
            left_was_down: false,
            hovering: false,
            last_pos: None,
        }
    }

    /// Feed one poll. `over_bird` is the hit test at `pos`. Call once per frame.
    pub fn update(&mut self, pos: Vec2, left_down: bool, over_bird: bool, out: &mut Vec<InputEvent>) {
        let moved = self
            .last_pos
            .is_some_and(|last| last.distance(pos) > MOVE_EPSILON);
        self.last_pos = Some(pos);

        let pressed = left_down && !self.left_was_down;
        self.left_was_down = left_down;

        if moved || pressed {
            out.push(InputEvent::Activity);
        }

        // Edge-detect hover so resting the pointer on the bird pets it once
        if over_bird && !self.hovering {
            out.push(InputEvent::HoverEnter);
        }
        self.hovering = over_bird;

        if pressed && over_bird {
            out.push(InputEvent::Click);
        }
    }
}
