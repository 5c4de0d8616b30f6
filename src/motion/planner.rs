use glam::Vec2;

use super::arc::{facing_towards, parabolic_position};
use super::layout::{Element, ElementId, LayoutOracle};
use super::{Focus, Mode, MovementState};

/// Sideways distance of one hop.
pub const HOP_DISTANCE: f32 = 35.0;
/// Hop speed in pixels/ms.
pub const HOP_SPEED: f32 = 0.07;
/// Arc curvature for hops.
pub const HOP_INTENSITY: f32 = 1.0;
/// Flight speed in pixels/ms.
pub const FLY_SPEED: f32 = 0.25;
/// Arc curvature for flights.
pub const FLY_INTENSITY: f32 = 1.5;
/// Per logic tick chance an idle bird hops.
pub const HOP_CHANCE: f32 = 1.0 / 300.0;
/// Minimum time idle before a random hop.
pub const IDLE_MIN_DWELL_MS: f64 = 1500.0;
/// Time without user activity before a grounded bird flies off.
pub const AFK_TIME_MS: f64 = 30_000.0;
/// Smallest element worth perching on.
pub const MIN_FOCUS_WIDTH: f32 = 120.0;
pub const MIN_FOCUS_HEIGHT: f32 = 60.0;
/// Elements fainter than this count as hidden.
pub const MIN_FOCUS_OPACITY: f32 = 0.1;
/// Keep perches this far from an element's side edges.
pub const PERCH_INSET: f32 = 16.0;
/// Bird feet further than this from the perch's top edge means it fell off.
const PERCH_TOLERANCE: f32 = 1.0;

/// Inputs from the controller the planner needs each logic tick.
#[derive(Debug, Clone, Copy)]
pub struct TickContext {
    /// A happy reaction is playing or a modal menu is open.
    pub busy: bool,
    /// Timestamp (ms) of the last user activity.
    pub last_activity: f64,
}

/// Pick a hop destination `HOP_DISTANCE` to either side, staying in `[min, max]`.
pub fn choose_hop_target(x: f32, min: f32, max: f32, rng: &mut fastrand::Rng) -> Option<f32> {
    let left = x - HOP_DISTANCE;
    let right = x + HOP_DISTANCE;
    match (left >= min, right <= max) {
        (true, true) => Some(if rng.bool() { left } else { right }),
        (true, false) => Some(left),
        (false, true) => Some(right),
        (false, false) => None,
    }
}

/// Horizontal range the bird may hop within: its perch, or the whole ground,
/// clipped to the viewport.
pub fn hop_bounds(state: &MovementState, viewport: Vec2) -> (f32, f32) {
    match &state.focus {
        Some(focus) => (focus.rect.left().max(0.0), focus.rect.right().min(viewport.x)),
        None => (0.0, viewport.x),
    }
}

/// Horizontal perch range on `el` that is also inside the viewport.
fn perch_range(el: &Element, viewport: Vec2) -> (f32, f32) {
    let lo = el.rect.left().max(0.0) + PERCH_INSET;
    let hi = el.rect.right().min(viewport.x) - PERCH_INSET;
    (lo, hi)
}

fn is_candidate(
    el: &Element,
    viewport: Vec2,
    top_margin: f32,
    current: Option<ElementId>,
) -> bool {
    let (lo, hi) = perch_range(el, viewport);
    Some(el.id) != current
        && el.visibility.visible
        && el.visibility.opacity >= MIN_FOCUS_OPACITY
        && el.rect.w >= MIN_FOCUS_WIDTH
        && el.rect.h >= MIN_FOCUS_HEIGHT
        && el.rect.top() >= top_margin
        && el.rect.top() <= viewport.y
        && lo < hi
}

/// Pick where to fly: a random eligible element, else a random spot on the ground.
pub fn choose_fly_target(
    oracle: &dyn LayoutOracle,
    current: Option<ElementId>,
    rng: &mut fastrand::Rng,
) -> (Vec2, Option<Focus>) {
    let viewport = oracle.viewport();
    let margin = oracle.focus_top_margin();
    let candidates: Vec<Element> = oracle
        .candidates()
        .into_iter()
        .filter(|el| is_candidate(el, viewport, margin, current))
        .collect();

    if candidates.is_empty() {
        log::debug!("No perch candidates, flying to the ground");
        let x = rng.f32() * viewport.x;
        return (Vec2::new(x, viewport.y), None);
    }

    let el = candidates[rng.usize(0..candidates.len())];
    let (lo, hi) = perch_range(&el, viewport);
    let x = lo + rng.f32() * (hi - lo);
    log::debug!("Flying to element {:?} at x={x:.0}", el.id);
    (
        Vec2::new(x, el.rect.top()),
        Some(Focus {
            id: el.id,
            rect: el.rect,
        }),
    )
}

/// Why an idle bird must leave its spot, if it must.
fn departure_reason(
    state: &MovementState,
    now: f64,
    ctx: &TickContext,
    oracle: &dyn LayoutOracle,
) -> Option<&'static str> {
    let Some(focus) = &state.focus else {
        if (state.current.y - oracle.viewport().y).abs() > PERCH_TOLERANCE {
            return Some("stopped in mid-air");
        }
        let quiet_since = ctx.last_activity.max(state.entered_at);
        return (now - quiet_since > AFK_TIME_MS).then_some("user is away");
    };

    let Some(el) = oracle.element(focus.id) else {
        return Some("perch is gone");
    };
    if !el.visibility.visible || el.visibility.opacity < MIN_FOCUS_OPACITY {
        return Some("perch is hidden");
    }
    let viewport = oracle.viewport();
    if el.rect.top() < oracle.focus_top_margin() || el.rect.top() > viewport.y {
        return Some("perch left the visible range");
    }
    if state.current.x < el.rect.left()
        || state.current.x > el.rect.right()
        || (state.current.y - el.rect.top()).abs() > PERCH_TOLERANCE
    {
        return Some("perch moved out from under the bird");
    }
    None
}

/// Start a flight to a freshly chosen target.
pub fn start_fly(
    state: &mut MovementState,
    now: f64,
    oracle: &dyn LayoutOracle,
    rng: &mut fastrand::Rng,
) {
    let current = state.focus.map(|f| f.id);
    let (target, focus) = choose_fly_target(oracle, current, rng);
    state.focus = focus;
    state.begin(Mode::Fly, target, now);
}

/// Start a hop along the current surface. Returns false if there is no room.
pub fn start_hop(
    state: &mut MovementState,
    now: f64,
    viewport: Vec2,
    rng: &mut fastrand::Rng,
) -> bool {
    let (min, max) = hop_bounds(state, viewport);
    match choose_hop_target(state.current.x, min, max, rng) {
        Some(x) => {
            let target = Vec2::new(x, state.current.y);
            state.begin(Mode::Hop, target, now);
            true
        }
        None => false,
    }
}

/// Fixed-rate transitions out of `Idle`. Returns the mode entered, if any.
pub fn logic_tick(
    state: &mut MovementState,
    now: f64,
    ctx: &TickContext,
    oracle: &dyn LayoutOracle,
    rng: &mut fastrand::Rng,
) -> Option<Mode> {
    if state.mode != Mode::Idle {
        return None;
    }

    if let Some(reason) = departure_reason(state, now, ctx, oracle) {
        log::debug!("Taking off: {reason}");
        start_fly(state, now, oracle, rng);
        return Some(Mode::Fly);
    }

    if !ctx.busy
        && now - state.entered_at >= IDLE_MIN_DWELL_MS
        && rng.f32() < HOP_CHANCE
        && start_hop(state, now, oracle.viewport(), rng)
    {
        return Some(Mode::Hop);
    }

    None
}

/// Follow a focused element that was dragged without being resized.
pub fn track_focus(state: &mut MovementState, oracle: &dyn LayoutOracle) {
    let Some(focus) = state.focus.as_mut() else {
        return;
    };
    let Some(el) = oracle.element(focus.id) else {
        return;
    };

    if el.rect.same_size(&focus.rect) && el.rect.origin() != focus.rect.origin() {
        let delta = el.rect.origin() - focus.rect.origin();
        state.start += delta;
        state.current += delta;
        state.target += delta;
    }
    focus.rect = el.rect;
}

/// Move along the current arc. Returns true on the tick the bird arrives.
pub fn advance(state: &mut MovementState, now: f64, viewport: Vec2) -> bool {
    let (speed, intensity) = match state.mode {
        Mode::Idle => return false,
        Mode::Hop => (HOP_SPEED, HOP_INTENSITY),
        Mode::Fly => (FLY_SPEED, FLY_INTENSITY),
    };

    let sample = parabolic_position(
        state.start,
        state.target,
        now - state.entered_at,
        speed,
        intensity,
        viewport,
    );
    state.facing = facing_towards(sample.position, state.target, state.facing);
    state.current = sample.position;

    if sample.complete {
        state.current = state.target;
        state.settle(now);
        return true;
    }
    false
}

/// Freeze in place, e.g. when the bird is hidden.
pub fn halt(state: &mut MovementState, now: f64) {
    state.settle(now);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::layout::{FakeLayout, Rect, Visibility};
    use crate::sprite::Facing;

    const TICK: f64 = 1000.0 / 60.0;

    fn quiet(last_activity: f64) -> TickContext {
        TickContext {
            busy: false,
            last_activity,
        }
    }

    #[test]
    fn hop_target_scenario() {
        let mut rng = fastrand::Rng::with_seed(7);
        let mut seen = (false, false);
        for _ in 0..200 {
            let t = choose_hop_target(100.0, 0.0, 500.0, &mut rng).unwrap();
            assert!(t == 65.0 || t == 135.0);
            assert!((0.0..=500.0).contains(&t));
            if t == 65.0 {
                seen.0 = true;
            } else {
                seen.1 = true;
            }
        }
        assert!(seen.0 && seen.1);
    }

    #[test]
    fn hop_target_near_edges() {
        let mut rng = fastrand::Rng::with_seed(1);
        assert_eq!(choose_hop_target(20.0, 0.0, 500.0, &mut rng), Some(55.0));
        assert_eq!(choose_hop_target(480.0, 0.0, 500.0, &mut rng), Some(445.0));
        assert_eq!(choose_hop_target(20.0, 0.0, 50.0, &mut rng), None);
    }

    #[test]
    fn hops_stay_on_screen_on_a_clipped_perch() {
        let viewport = Vec2::new(800.0, 600.0);
        let mut state = MovementState::new(Vec2::new(20.0, 300.0), 0.0);
        state.focus = Some(Focus {
            id: ElementId(3),
            rect: Rect::new(-100.0, 300.0, 400.0, 200.0),
        });
        assert_eq!(hop_bounds(&state, viewport), (0.0, 300.0));

        for seed in 0..20 {
            let mut rng = fastrand::Rng::with_seed(seed);
            let mut hop = state.clone();
            assert!(start_hop(&mut hop, 0.0, viewport, &mut rng));
            assert_eq!(hop.target, Vec2::new(55.0, 300.0));
        }
    }

    #[test]
    fn fly_prefers_elements_over_ground() {
        let layout = FakeLayout::new(1920.0, 1080.0)
            .with_window(1, Rect::new(200.0, 300.0, 800.0, 500.0));
        let mut rng = fastrand::Rng::with_seed(3);
        for _ in 0..50 {
            let (target, focus) = choose_fly_target(&layout, None, &mut rng);
            assert_eq!(focus.map(|f| f.id), Some(ElementId(1)));
            assert_eq!(target.y, 300.0);
            assert!(target.x >= 200.0 + PERCH_INSET && target.x <= 1000.0 - PERCH_INSET);
        }
    }

    #[test]
    fn fly_filters_ineligible_elements() {
        let mut layout = FakeLayout::new(1920.0, 1080.0)
            // Too small.
            .with_window(1, Rect::new(0.0, 300.0, 50.0, 50.0))
            // Above the top margin.
            .with_window(2, Rect::new(0.0, 10.0, 800.0, 500.0))
            // Below the viewport.
            .with_window(3, Rect::new(0.0, 1200.0, 800.0, 500.0))
            // Currently focused.
            .with_window(4, Rect::new(0.0, 400.0, 800.0, 500.0))
            // Nearly transparent.
            .with_window(5, Rect::new(0.0, 400.0, 800.0, 500.0))
            // Off screen to the right.
            .with_window(6, Rect::new(2000.0, 400.0, 800.0, 500.0));
        layout.elements[4].visibility = Visibility {
            visible: true,
            opacity: 0.05,
        };

        let mut rng = fastrand::Rng::with_seed(11);
        for _ in 0..50 {
            let (target, focus) = choose_fly_target(&layout, Some(ElementId(4)), &mut rng);
            assert!(focus.is_none());
            assert_eq!(target.y, 1080.0);
            assert!((0.0..=1920.0).contains(&target.x));
        }
    }

    #[test]
    fn afk_on_the_ground_triggers_flight() {
        let layout = FakeLayout::new(1920.0, 1080.0)
            .with_window(9, Rect::new(100.0, 400.0, 600.0, 400.0));
        let mut rng = fastrand::Rng::with_seed(5);
        let mut state = MovementState::new(Vec2::new(960.0, 1080.0), 0.0);

        let busy = TickContext {
            busy: true,
            last_activity: 0.0,
        };
        assert_eq!(logic_tick(&mut state, 10_000.0, &busy, &layout, &mut rng), None);
        assert_eq!(
            logic_tick(&mut state, AFK_TIME_MS + 1.0, &busy, &layout, &mut rng),
            Some(Mode::Fly)
        );
        assert_eq!(state.focus.map(|f| f.id), Some(ElementId(9)));
        assert_eq!(state.start, Vec2::new(960.0, 1080.0));
        assert_eq!(state.target.y, 400.0);
    }

    #[test]
    fn recent_activity_keeps_bird_grounded() {
        let layout = FakeLayout::new(1920.0, 1080.0);
        let mut rng = fastrand::Rng::with_seed(5);
        let mut state = MovementState::new(Vec2::new(960.0, 1080.0), 0.0);
        let ctx = TickContext {
            busy: true,
            last_activity: 20_000.0,
        };
        assert_eq!(logic_tick(&mut state, 40_000.0, &ctx, &layout, &mut rng), None);
    }

    #[test]
    fn stopped_in_mid_air_flies_to_the_ground() {
        let layout = FakeLayout::new(800.0, 600.0);
        let mut rng = fastrand::Rng::with_seed(4);
        let mut state = MovementState::new(Vec2::new(400.0, 600.0), 0.0);
        state.begin(Mode::Hop, Vec2::new(435.0, 600.0), 0.0);
        advance(&mut state, 250.0, layout.size);
        assert!(state.current.y < 599.0);
        halt(&mut state, 260.0);

        assert_eq!(logic_tick(&mut state, 300.0, &quiet(300.0), &layout, &mut rng), Some(Mode::Fly));
        assert_eq!(state.focus, None);
        assert_eq!(state.target.y, 600.0);
    }

    #[test]
    fn idle_hops_eventually_but_not_before_dwell() {
        let layout = FakeLayout::new(500.0, 1000.0);
        let mut rng = fastrand::Rng::with_seed(99);
        let mut state = MovementState::new(Vec2::new(100.0, 1000.0), 0.0);

        let mut now = 0.0;
        while now < IDLE_MIN_DWELL_MS {
            assert_eq!(logic_tick(&mut state, now, &quiet(now), &layout, &mut rng), None);
            now += TICK;
        }

        let mut hopped = false;
        for _ in 0..100_000 {
            if logic_tick(&mut state, now, &quiet(now), &layout, &mut rng) == Some(Mode::Hop) {
                hopped = true;
                break;
            }
            now += TICK;
        }
        assert!(hopped);
        assert!(state.target.x == 65.0 || state.target.x == 135.0);
        assert_eq!(state.target.y, 1000.0);
    }

    #[test]
    fn busy_bird_never_hops() {
        let layout = FakeLayout::new(500.0, 1000.0);
        let mut rng = fastrand::Rng::with_seed(2);
        let mut state = MovementState::new(Vec2::new(100.0, 1000.0), 0.0);
        let mut now = 0.0;
        for _ in 0..20_000 {
            let ctx = TickContext {
                busy: true,
                last_activity: now,
            };
            assert_eq!(logic_tick(&mut state, now, &ctx, &layout, &mut rng), None);
            now += TICK;
        }
    }

    #[test]
    fn arrival_returns_to_idle_once() {
        let viewport = Vec2::new(1920.0, 1080.0);
        let mut state = MovementState::new(Vec2::new(100.0, 1080.0), 0.0);
        state.begin(Mode::Fly, Vec2::new(1500.0, 300.0), 0.0);

        let mut now = 0.0;
        let mut arrivals = 0;
        for _ in 0..10_000 {
            now += TICK;
            if advance(&mut state, now, viewport) {
                arrivals += 1;
            }
        }
        assert_eq!(arrivals, 1);
        assert_eq!(state.mode, Mode::Idle);
        assert_eq!(state.current, Vec2::new(1500.0, 300.0));
    }

    #[test]
    fn facing_turns_with_remaining_travel() {
        let viewport = Vec2::new(1920.0, 1080.0);
        let mut state = MovementState::new(Vec2::new(500.0, 1080.0), 0.0);
        state.facing = Facing::Left;
        state.begin(Mode::Hop, Vec2::new(535.0, 1080.0), 0.0);
        advance(&mut state, TICK, viewport);
        assert_eq!(state.facing, Facing::Right);
    }

    #[test]
    fn dragged_perch_carries_the_arc() {
        let mut layout = FakeLayout::new(1920.0, 1080.0)
            .with_window(1, Rect::new(200.0, 300.0, 800.0, 500.0));
        let mut rng = fastrand::Rng::with_seed(8);
        let mut state = MovementState::new(Vec2::new(960.0, 1080.0), 0.0);
        start_fly(&mut state, 0.0, &layout, &mut rng);
        let (start, target) = (state.start, state.target);

        layout.move_window(1, Rect::new(250.0, 280.0, 800.0, 500.0));
        track_focus(&mut state, &layout);
        let delta = Vec2::new(50.0, -20.0);
        assert_eq!(state.start, start + delta);
        assert_eq!(state.target, target + delta);

        // A resize is a fresh observation, not a drag.
        layout.move_window(1, Rect::new(0.0, 0.0, 900.0, 500.0));
        track_focus(&mut state, &layout);
        assert_eq!(state.target, target + delta);
        assert_eq!(state.focus.unwrap().rect, Rect::new(0.0, 0.0, 900.0, 500.0));
    }

    #[test]
    fn perch_leaving_triggers_flight() {
        let mut layout = FakeLayout::new(1920.0, 1080.0)
            .with_window(1, Rect::new(200.0, 300.0, 800.0, 500.0))
            .with_window(2, Rect::new(1000.0, 500.0, 600.0, 400.0));
        let mut rng = fastrand::Rng::with_seed(4);
        let mut state = MovementState::new(Vec2::new(400.0, 300.0), 0.0);
        state.focus = Some(Focus {
            id: ElementId(1),
            rect: Rect::new(200.0, 300.0, 800.0, 500.0),
        });

        let ctx = TickContext {
            busy: true,
            last_activity: 0.0,
        };
        assert_eq!(logic_tick(&mut state, 100.0, &ctx, &layout, &mut rng), None);

        // Resized so the bird is past its right edge.
        layout.move_window(1, Rect::new(200.0, 300.0, 100.0, 500.0));
        assert_eq!(logic_tick(&mut state, 200.0, &ctx, &layout, &mut rng), Some(Mode::Fly));
        assert_eq!(state.focus.map(|f| f.id), Some(ElementId(2)));
    }

    #[test]
    fn perch_scrolled_out_of_view_triggers_flight() {
        let mut layout = FakeLayout::new(1920.0, 1080.0)
            .with_window(1, Rect::new(200.0, 300.0, 800.0, 500.0));
        let mut rng = fastrand::Rng::with_seed(4);
        let mut state = MovementState::new(Vec2::new(400.0, 300.0), 0.0);
        state.focus = Some(Focus {
            id: ElementId(1),
            rect: Rect::new(200.0, 300.0, 800.0, 500.0),
        });
        layout.move_window(1, Rect::new(200.0, 40.0, 800.0, 500.0));
        track_focus(&mut state, &layout);
        let ctx = quiet(0.0);
        assert_eq!(logic_tick(&mut state, 100.0, &ctx, &layout, &mut rng), Some(Mode::Fly));
        assert!(state.focus.is_none());
        assert_eq!(state.target.y, 1080.0);
    }

    #[test]
    fn halt_freezes_in_place() {
        let mut state = MovementState::new(Vec2::new(0.0, 1000.0), 0.0);
        state.begin(Mode::Fly, Vec2::new(900.0, 200.0), 0.0);
        advance(&mut state, 500.0, Vec2::new(1920.0, 1080.0));
        let here = state.current;
        halt(&mut state, 600.0);
        assert_eq!(state.mode, Mode::Idle);
        assert_eq!(state.current, here);
        assert!(!advance(&mut state, 5000.0, Vec2::new(1920.0, 1080.0)));
        assert_eq!(state.current, here);
    }
}
