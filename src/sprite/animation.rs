use std::sync::Arc;

use super::canvas::RenderTarget;
use super::frame::{Facing, Frame};
use super::palette::Variant;
use super::SpriteError;

/// What was last painted, so identical requests skip the redraw.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Painted {
    time_start: f64,
    frame: usize,
    facing: Facing,
}

/// An ordered, timed sequence of frames.
#[derive(Debug, Clone)]
pub struct Animation {
    frames: Vec<Arc<Frame>>,
    durations_ms: Vec<u32>,
    looping: bool,
    total_ms: u64,
    last_painted: Option<Painted>,
}

impl Animation {
    pub fn new(
        frames: Vec<Arc<Frame>>,
        durations_ms: Vec<u32>,
        looping: bool,
    ) -> Result<Self, SpriteError> {
        if frames.is_empty() {
            return Err(SpriteError::EmptyAnimation);
        }
        if frames.len() != durations_ms.len() {
            return Err(SpriteError::DurationMismatch {
                frames: frames.len(),
                durations: durations_ms.len(),
            });
        }
        if durations_ms.contains(&0) {
            return Err(SpriteError::ZeroDuration);
        }
        let total_ms = durations_ms.iter().map(|&d| d as u64).sum();
        Ok(Self {
            frames,
            durations_ms,
            looping,
            total_ms,
            last_painted: None,
        })
    }

    pub fn total_duration(&self) -> f64 {
        self.total_ms as f64
    }

    #[cfg(test)]
    pub fn is_looping(&self) -> bool {
        self.looping
    }

    #[cfg(test)]
    pub fn frame(&self, index: usize) -> &Frame {
        &self.frames[index]
    }

    /// Index of the frame showing `elapsed` ms after the start.
    pub fn current_frame_index(&self, elapsed: f64) -> usize {
        let elapsed = if self.looping {
            elapsed.rem_euclid(self.total_duration())
        } else {
            elapsed
        };
        let mut acc = 0.0;
        for (i, &d) in self.durations_ms.iter().enumerate() {
            acc += d as f64;
            if acc > elapsed {
                return i;
            }
        }
        self.frames.len() - 1
    }

    /// Forget what was painted so the next `draw` repaints unconditionally.
    pub fn invalidate(&mut self) {
        self.last_painted = None;
    }

    /// Paint the frame active at `now`, skipping the work if the same frame
    /// and facing were already painted for this `time_start`.
    /// Returns true once a non-looping sequence has run its full length.
    #[allow(clippy::too_many_arguments)]
    pub fn draw(
        &mut self,
        target: &mut dyn RenderTarget,
        facing: Facing,
        time_start: f64,
        now: f64,
        pixel_size: u32,
        variant: &Variant,
    ) -> bool {
        let elapsed = now - time_start;
        let index = self.current_frame_index(elapsed);
        let painted = Painted {
            time_start,
            frame: index,
            facing,
        };

        if self.last_painted != Some(painted) {
            target.clear();
            self.frames[index].draw(target, facing, pixel_size, variant);
            self.last_painted = Some(painted);
        }

        !self.looping && elapsed >= self.total_duration()
    }
}
