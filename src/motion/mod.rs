pub mod arc;
pub mod layout;
pub mod planner;

use glam::Vec2;

use crate::sprite::Facing;
use layout::{ElementId, Rect};

/// Movement mode of the bird.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Idle,
    Hop,
    Fly,
}

/// The point of interest the bird is perched on or flying to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Focus {
    pub id: ElementId,
    /// Rectangle as last observed, used to detect drags.
    pub rect: Rect,
}

/// Everything the planner mutates. Positions are the bird's feet in screen pixels.
#[derive(Debug, Clone)]
pub struct MovementState {
    pub mode: Mode,
    /// Timestamp (ms) the current mode was entered.
    pub entered_at: f64,
    pub start: Vec2,
    pub target: Vec2,
    pub current: Vec2,
    pub facing: Facing,
    pub focus: Option<Focus>,
}

impl MovementState {
    pub fn new(position: Vec2, now: f64) -> Self {
        Self {
            mode: Mode::Idle,
            entered_at: now,
            start: position,
            target: position,
            current: position,
            facing: Facing::Right,
            focus: None,
        }
    }

    /// Begin a trip from the current position.
    fn begin(&mut self, mode: Mode, target: Vec2, now: f64) {
        self.mode = mode;
        self.entered_at = now;
        self.start = self.current;
        self.target = target;
    }

    /// Settle where we are.
    fn settle(&mut self, now: f64) {
        self.mode = Mode::Idle;
        self.entered_at = now;
        self.start = self.current;
        self.target = self.current;
    }
}
