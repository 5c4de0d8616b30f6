use glam::Vec2;

use crate::input::InputEvent;
use crate::motion::layout::LayoutOracle;
use crate::motion::planner::{self, TickContext};
use crate::motion::{Mode, MovementState};
use crate::settings::Settings;
use crate::sprite::bird::{AnimationKind, BirdSprites};
use crate::sprite::{RenderTarget, Variant};

/// Where the host should put the painted canvas, in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub width: u32,
    pub height: u32,
}

impl Placement {
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.x
            && p.x < self.x + self.width as f32
            && p.y >= self.y
            && p.y < self.y + self.height as f32
    }
}

/// The bird: movement, animation and input state, owned by the app and
/// driven by its logic and paint ticks.
pub struct CreatureController {
    sprites: BirdSprites,
    variant: &'static Variant,
    pixel_size: u32,

    state: MovementState,
    /// Start time of the heart reaction, if one is playing.
    reaction: Option<f64>,
    /// Animation painted last, so a switch forces a repaint.
    last_kind: Option<AnimationKind>,
    last_placement: Option<Placement>,

    visible: bool,
    menu_open: bool,
    last_activity: f64,

    queue: Vec<InputEvent>,
    rng: fastrand::Rng,
}

impl CreatureController {
    /// Create the bird standing on the ground in the middle of `viewport`.
    pub fn new(sprites: BirdSprites, settings: &Settings, viewport: Vec2) -> Self {
        let rng = match settings.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };
        Self {
            sprites,
            variant: settings.variant,
            pixel_size: settings.pixel_size,
            state: MovementState::new(Vec2::new(viewport.x / 2.0, viewport.y), 0.0),
            reaction: None,
            last_kind: None,
            last_placement: None,
            visible: !settings.start_hidden,
            menu_open: false,
            last_activity: 0.0,
            queue: Vec::with_capacity(16),
            rng,
        }
    }

    pub fn push_input(&mut self, event: InputEvent) {
        self.queue.push(event);
    }

    /// Size the render target must have, in screen pixels.
    pub fn canvas_size(&self) -> (u32, u32) {
        let (w, h) = self.sprites.frame_size;
        (w as u32 * self.pixel_size, h as u32 * self.pixel_size)
    }

    #[cfg(test)]
    pub fn position(&self) -> Vec2 {
        self.state.current
    }

    #[cfg(test)]
    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    #[cfg(test)]
    pub fn is_reacting(&self) -> bool {
        self.reaction.is_some()
    }

    pub fn variant(&self) -> &'static Variant {
        self.variant
    }

    /// Whether a screen point is on the bird as last painted.
    pub fn hit_test(&self, point: Vec2) -> bool {
        self.visible && self.last_placement.is_some_and(|p| p.contains(point))
    }

    // -----------------------------------------------------------------------
    // Logic tick
    // -----------------------------------------------------------------------

    /// Apply queued input, then run the planner's fixed-rate transitions.
    pub fn logic_tick(&mut self, now: f64, oracle: &dyn LayoutOracle) {
        let events = std::mem::take(&mut self.queue);
        for event in &events {
            self.apply(*event, now, oracle);
        }
        // Hand the allocation back
        self.queue = events;
        self.queue.clear();

        if !self.visible {
            return;
        }

        // A dragged perch carries the bird before it checks its footing.
        planner::track_focus(&mut self.state, oracle);
        let ctx = TickContext {
            busy: self.reaction.is_some() || self.menu_open,
            last_activity: self.last_activity,
        };
        if let Some(mode) = planner::logic_tick(&mut self.state, now, &ctx, oracle, &mut self.rng) {
            log::debug!("Idle -> {mode:?} toward ({:.0}, {:.0})", self.state.target.x, self.state.target.y);
        }
    }

    fn apply(&mut self, event: InputEvent, now: f64, oracle: &dyn LayoutOracle) {
        match event {
            InputEvent::HoverEnter | InputEvent::Click | InputEvent::Touch => {
                self.last_activity = now;
                self.pet(now);
            }
            InputEvent::Activity => self.last_activity = now,
            InputEvent::SetVisible(visible) => self.set_visible(visible, now),
            InputEvent::ToggleVisible => self.set_visible(!self.visible, now),
            InputEvent::MenuOpened => self.menu_open = true,
            InputEvent::MenuClosed => self.menu_open = false,
            InputEvent::SetVariant(variant) => {
                if variant != self.variant {
                    log::info!("Switching to {}", variant.name);
                    self.variant = variant;
                    self.sprites.invalidate_all();
                }
            }
            InputEvent::Hop => {
                if self.visible && self.state.mode == Mode::Idle {
                    planner::start_hop(&mut self.state, now, oracle.viewport(), &mut self.rng);
                }
            }
        }
    }

    /// Play the heart reaction if the bird is sitting still.
    fn pet(&mut self, now: f64) {
        if self.visible && self.state.mode == Mode::Idle && self.reaction.is_none() {
            log::debug!("Petted");
            self.reaction = Some(now);
        }
    }

    fn set_visible(&mut self, visible: bool, now: f64) {
        if visible == self.visible {
            return;
        }
        self.visible = visible;
        if visible {
            log::info!("Bird shown");
            self.last_kind = None;
        } else {
            log::info!("Bird hidden");
            planner::halt(&mut self.state, now);
            self.reaction = None;
            self.last_placement = None;
        }
    }

    // -----------------------------------------------------------------------
    // Paint tick
    // -----------------------------------------------------------------------

    /// Move along the current arc and paint the active animation into `target`.
    /// Returns `None` while hidden.
    pub fn paint_tick(
        &mut self,
        now: f64,
        oracle: &dyn LayoutOracle,
        target: &mut dyn RenderTarget,
    ) -> Option<Placement> {
        if !self.visible {
            return None;
        }

        planner::track_focus(&mut self.state, oracle);
        if planner::advance(&mut self.state, now, oracle.viewport()) {
            log::debug!("Landed at ({:.0}, {:.0})", self.state.current.x, self.state.current.y);
        }
        if self.state.mode != Mode::Idle {
            self.reaction = None;
        }

        let (kind, time_start) = match (self.state.mode, self.reaction) {
            (Mode::Fly, _) => (AnimationKind::Fly, self.state.entered_at),
            (Mode::Hop, _) => (AnimationKind::Hop, self.state.entered_at),
            (Mode::Idle, Some(started)) => (AnimationKind::Heart, started),
            (Mode::Idle, None) => (self.idle_kind(), self.state.entered_at),
        };

        let animation = self.sprites.get_mut(kind);
        if self.last_kind != Some(kind) {
            animation.invalidate();
            self.last_kind = Some(kind);
        }
        let complete = animation.draw(
            target,
            self.state.facing,
            time_start,
            now,
            self.pixel_size,
            self.variant,
        );
        if complete && kind == AnimationKind::Heart {
            self.reaction = None;
        }

        let (width, height) = (target.width(), target.height());
        let placement = Placement {
            x: self.state.current.x - width as f32 / 2.0,
            y: self.state.current.y - height as f32,
            width,
            height,
        };
        self.last_placement = Some(placement);
        Some(placement)
    }

    /// Bob on a perch, stand still on the ground.
    fn idle_kind(&self) -> AnimationKind {
        if self.state.focus.is_some() {
            AnimationKind::Bob
        } else {
            AnimationKind::Still
        }
    }
}
