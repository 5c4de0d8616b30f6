use glam::Vec2;

use crate::sprite::Facing;

/// Speed multiplier for trips longer than half the larger viewport dimension.
pub const FAR_SPEED_BOOST: f32 = 1.5;

/// One evaluation of a hop/fly arc.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcSample {
    pub position: Vec2,
    /// Within 1 unit of the target on both axes.
    pub complete: bool,
}

/// Control point raised perpendicular to the path, on the upward side.
fn control_point(start: Vec2, target: Vec2, distance: f32, intensity: f32) -> Vec2 {
    let delta = target - start;
    let mut perp = Vec2::new(-delta.y, delta.x) / distance;
    if perp.y > 0.0 {
        perp = -perp;
    }
    (start + target) * 0.5 + perp * (distance / 4.0 * intensity)
}

/// Position along a quadratic Bézier from `start` to `target`, `elapsed_ms`
/// into the trip. `speed` is in pixels per millisecond.
pub fn parabolic_position(
    start: Vec2,
    target: Vec2,
    elapsed_ms: f64,
    speed: f32,
    intensity: f32,
    viewport: Vec2,
) -> ArcSample {
    let distance = start.distance(target);
    if distance < f32::EPSILON {
        return ArcSample {
            position: target,
            complete: true,
        };
    }

    let speed = if distance > viewport.max_element() / 2.0 {
        speed * FAR_SPEED_BOOST
    } else {
        speed
    };
    let duration = (distance / speed) as f64;
    let t = (elapsed_ms.max(0.0) / duration).min(1.0) as f32;

    let control = control_point(start, target, distance, intensity);
    let u = 1.0 - t;
    let position = start * (u * u) + control * (2.0 * u * t) + target * (t * t);
    let remaining = (target - position).abs();

    ArcSample {
        position,
        complete: remaining.x < 1.0 && remaining.y < 1.0,
    }
}

/// Face the way there is still horizontal distance to cover.
pub fn facing_towards(current: Vec2, target: Vec2, previous: Facing) -> Facing {
    let dx = target.x - current.x;
    if dx > 0.0 {
        Facing::Right
    } else if dx < 0.0 {
        Facing::Left
    } else {
        previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEW: Vec2 = Vec2::new(1920.0, 1080.0);

    #[test]
    fn starts_at_start_and_ends_at_target() {
        let start = Vec2::new(100.0, 500.0);
        let target = Vec2::new(300.0, 200.0);
        let s0 = parabolic_position(start, target, 0.0, 0.25, 1.5, VIEW);
        assert_eq!(s0.position, start);
        assert!(!s0.complete);

        let s1 = parabolic_position(start, target, 1e9, 0.25, 1.5, VIEW);
        assert!(s1.complete);
        assert!((s1.position - target).length() < 1e-3);
    }

    #[test]
    fn arc_bulges_upward() {
        let start = Vec2::new(0.0, 500.0);
        let target = Vec2::new(200.0, 500.0);
        let duration = 200.0 / 0.07;
        let mid = parabolic_position(start, target, duration / 2.0, 0.07, 1.0, VIEW);
        assert!(mid.position.y < 500.0);
        assert!((mid.position.x - 100.0).abs() < 1e-3);

        // Same when travelling right to left.
        let back = parabolic_position(target, start, duration / 2.0, 0.07, 1.0, VIEW);
        assert!(back.position.y < 500.0);
    }

    #[test]
    fn converges_in_finite_ticks() {
        let pairs = [
            (Vec2::new(0.0, 0.0), Vec2::new(1900.0, 1000.0)),
            (Vec2::new(500.0, 1080.0), Vec2::new(465.0, 1080.0)),
            (Vec2::new(10.0, 10.0), Vec2::new(10.0, 900.0)),
            (Vec2::new(3.0, 4.0), Vec2::new(3.5, 4.2)),
        ];
        for (start, target) in pairs {
            for speed in [0.01, 0.07, 0.25, 3.0] {
                let mut elapsed = 0.0;
                let mut ticks = 0;
                loop {
                    let s = parabolic_position(start, target, elapsed, speed, 1.5, VIEW);
                    if s.complete {
                        break;
                    }
                    elapsed += 1000.0 / 60.0;
                    ticks += 1;
                    assert!(ticks < 1_000_000, "never arrived");
                }
            }
        }
    }

    #[test]
    fn long_trips_are_boosted() {
        let start = Vec2::new(0.0, 1080.0);
        let near = Vec2::new(900.0, 1080.0);
        let far = Vec2::new(1100.0, 1080.0);
        // 900 px at 0.25 px/ms takes 3600 ms; 1100 px boosted takes ~2933 ms.
        assert!(!parabolic_position(start, near, 3000.0, 0.25, 1.0, VIEW).complete);
        assert!(parabolic_position(start, far, 2940.0, 0.25, 1.0, VIEW).complete);
    }

    #[test]
    fn facing_follows_remaining_travel() {
        let target = Vec2::new(100.0, 0.0);
        assert_eq!(facing_towards(Vec2::new(50.0, 0.0), target, Facing::Left), Facing::Right);
        assert_eq!(facing_towards(Vec2::new(150.0, 0.0), target, Facing::Right), Facing::Left);
        assert_eq!(facing_towards(Vec2::new(100.0, 5.0), target, Facing::Left), Facing::Left);
    }
}
