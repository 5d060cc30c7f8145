//! Closed-form flights for the dot
//!
//! A flight is the motion between a launch point and a landing point. Two
//! interpolation modes exist behind one interface: ballistic, which is real
//! constant-acceleration kinematics with a solved duration, and bezier, which
//! trades physics for a stylable quadratic curve over a fixed duration.

use kurbo::{ParamCurve, ParamCurveDeriv, Point, QuadBez, Vec2};
use ordered_float::OrderedFloat;

use crate::config::TrajectoryPhase;

/// Flight durations the arc solver will accept, ms. Roots outside this open
/// interval are degenerate (a blink or a crawl) and force the fallback.
pub const ARC_DURATION_WINDOW: (f64, f64) = (200.0, 2000.0);

/// Clamp window for the final jump's solved duration, ms.
pub const JUMP_DURATION_CLAMP: (f64, f64) = (280.0, 1200.0);

/// Below this upward speed a bounced launch isn't worth watching and the
/// peak-height fallback takes over, px/ms.
const MIN_USEFUL_LAUNCH: f64 = -0.08;

/// A time-parameterized path from launch to landing.
#[derive(Debug, Clone, PartialEq)]
pub enum Flight {
    Ballistic {
        start: Point,
        target: Point,
        /// Launch vertical velocity, px/ms, negative up.
        v0: f64,
        /// Downward acceleration, px/ms².
        gravity: f64,
        /// Constant horizontal velocity, px/ms.
        vx: f64,
        duration: f64,
    },
    Bezier { curve: QuadBez, duration: f64 },
}

impl Flight {
    /// Ballistic flight with a known launch velocity; the duration is the
    /// smallest root of the landing equation inside `window`, else
    /// `default_ms`.
    pub fn ballistic(
        start: Point,
        target: Point,
        v0: f64,
        gravity: f64,
        default_ms: f64,
        window: (f64, f64),
    ) -> Flight {
        let duration =
            solve_landing_time(start.y, target.y, v0, gravity, window).unwrap_or_else(|| {
                tracing::debug!(v0, gravity, "no admissible root, using default duration");
                default_ms
            });
        Flight::Ballistic {
            start,
            target,
            v0,
            gravity,
            vx: (target.x - start.x) / duration,
            duration,
        }
    }

    /// Ballistic flight whose duration was already solved by the caller
    /// (the final jump solves launch and duration together).
    pub fn ballistic_timed(
        start: Point,
        target: Point,
        v0: f64,
        gravity: f64,
        duration: f64,
    ) -> Flight {
        Flight::Ballistic {
            start,
            target,
            v0,
            gravity,
            vx: (target.x - start.x) / duration,
            duration,
        }
    }

    /// Quadratic-bezier flight through the configured apex. `em` converts the
    /// apex offsets to px.
    pub fn bezier(
        start: Point,
        target: Point,
        shape: &TrajectoryPhase,
        em: f64,
        duration: f64,
    ) -> Flight {
        let apex_shift = Vec2::new(shape.apex_x_em * em, shape.apex_y_em * em);
        let control = start.lerp(target, shape.t_peak) + apex_shift;
        Flight::Bezier {
            curve: QuadBez::new(start, control, target),
            duration,
        }
    }

    pub fn duration(&self) -> f64 {
        match self {
            Flight::Ballistic { duration, .. } | Flight::Bezier { duration, .. } => *duration,
        }
    }

    pub fn target(&self) -> Point {
        match self {
            Flight::Ballistic { target, .. } => *target,
            Flight::Bezier { curve, .. } => curve.p2,
        }
    }

    /// Position `elapsed` ms after launch. Past the duration the landing
    /// point is returned.
    pub fn position(&self, elapsed: f64) -> Point {
        match self {
            Flight::Ballistic {
                start,
                v0,
                gravity,
                vx,
                duration,
                ..
            } => {
                let t = elapsed.min(*duration);
                Point::new(
                    start.x + vx * t,
                    start.y + v0 * t + 0.5 * gravity * t * t,
                )
            }
            Flight::Bezier { curve, duration } => {
                curve.eval(crate::clamp01(elapsed / duration))
            }
        }
    }

    /// Instantaneous vertical velocity, px/ms. For bezier mode this is the
    /// analytic derivative of the curve and is only good enough for landing
    /// detection.
    pub fn vertical_velocity(&self, elapsed: f64) -> f64 {
        match self {
            Flight::Ballistic {
                v0,
                gravity,
                duration,
                ..
            } => v0 + gravity * elapsed.min(*duration),
            Flight::Bezier { curve, duration } => {
                let p = crate::clamp01(elapsed / duration);
                curve.deriv().eval(p).y / duration
            }
        }
    }
}

/// Smallest `t` in the open `window` with
/// `target_top = start_top + v0*t + 0.5*gravity*t²`, or `None`.
pub fn solve_landing_time(
    start_top: f64,
    target_top: f64,
    v0: f64,
    gravity: f64,
    window: (f64, f64),
) -> Option<f64> {
    // 0.5*g*t² + v0*t + (start - target) = 0
    let a = 0.5 * gravity;
    let b = v0;
    let c = start_top - target_top;
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 || a == 0.0 {
        return None;
    }
    let sqrt_disc = disc.sqrt();
    [(-b + sqrt_disc) / (2.0 * a), (-b - sqrt_disc) / (2.0 * a)]
        .into_iter()
        .filter(|t| *t > window.0 && *t < window.1)
        .min_by_key(|t| OrderedFloat(*t))
}

/// Launch parameters for the final jump.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct JumpLaunch {
    /// px/ms, negative up.
    pub v0: f64,
    /// ms, clamped to [`JUMP_DURATION_CLAMP`].
    pub duration: f64,
}

/// Solve the final jump's launch velocity and duration.
///
/// Continuity is preferred: a recorded impact speed is bounced with the
/// configured restitution. When that yields nothing usefully upward the
/// launch is back-solved from `peak_h`. A negative discriminant shrinks
/// `peak_h` by 0.7x up to three times; this is a heuristic recovery, not a
/// convergent algorithm, so the configured default duration backstops it and
/// a flight is always produced.
pub fn solve_jump(
    start_top: f64,
    target_top: f64,
    gravity: f64,
    peak_h: f64,
    impact_vy: Option<f64>,
    bounce_factor: f64,
    default_ms: f64,
) -> JumpLaunch {
    let bounce = impact_vy.map(|vy| -vy.abs() * bounce_factor);
    let mut peak_h = peak_h;
    let mut v0 = bounce.unwrap_or_else(|| -(2.0 * gravity * peak_h).sqrt());
    if !v0.is_finite() || v0 >= MIN_USEFUL_LAUNCH {
        v0 = -(2.0 * gravity * peak_h).sqrt();
    }

    // positive when the target sits above the launch point
    let climb = start_top - target_top;
    let mut disc = v0 * v0 - 2.0 * gravity * climb;
    let mut guard = 0;
    while disc < 0.0 && guard < 3 {
        peak_h *= 0.7;
        v0 = -(2.0 * gravity * peak_h.max(1.0)).sqrt();
        disc = v0 * v0 - 2.0 * gravity * climb;
        guard += 1;
    }

    let duration = if disc >= 0.0 {
        (-v0 + disc.sqrt()) / gravity
    } else {
        tracing::debug!(peak_h, climb, "jump discriminant stayed negative");
        default_ms
    };
    JumpLaunch {
        v0,
        duration: duration.clamp(JUMP_DURATION_CLAMP.0, JUMP_DURATION_CLAMP.1),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::config::{TrajectoryMode, TrajectoryPhase};

    const EPSILON: f64 = 1e-6;

    #[rstest]
    #[case(100.0, 300.0, -0.6, 0.003)]
    #[case(50.0, 400.0, -0.3, 0.0027)]
    #[case(200.0, 180.0, -0.9, 0.0033)]
    #[case(0.0, 500.0, 0.0, 0.003)]
    fn solved_root_lands_exactly_on_target(
        #[case] start: f64,
        #[case] target: f64,
        #[case] v0: f64,
        #[case] gravity: f64,
    ) {
        let t = solve_landing_time(start, target, v0, gravity, ARC_DURATION_WINDOW)
            .expect("these cases all have an admissible root");
        let reached = start + v0 * t + 0.5 * gravity * t * t;
        assert!(
            (reached - target).abs() < EPSILON,
            "t={t}: reached {reached}, wanted {target}"
        );
        assert!(t > ARC_DURATION_WINDOW.0 && t < ARC_DURATION_WINDOW.1);
    }

    #[test]
    fn root_on_window_edge_is_rejected() {
        // disc = 0.36 - 4*0.0015*60 = 0 exactly, single root t = 200 ms,
        // which sits on the open window's edge and must not be accepted
        assert_eq!(
            solve_landing_time(100.0, 40.0, -0.6, 0.003, ARC_DURATION_WINDOW),
            None
        );
        let flight = Flight::ballistic(
            Point::new(0.0, 100.0),
            Point::new(50.0, 40.0),
            -0.6,
            0.003,
            900.0,
            ARC_DURATION_WINDOW,
        );
        assert_eq!(flight.duration(), 900.0);
    }

    #[test]
    fn negative_discriminant_forces_default_duration() {
        // launching downward toward a target far above: no real root
        let flight = Flight::ballistic(
            Point::new(0.0, 500.0),
            Point::new(100.0, 0.0),
            0.1,
            0.003,
            900.0,
            ARC_DURATION_WINDOW,
        );
        assert_eq!(flight.duration(), 900.0);
    }

    #[test]
    fn ballistic_velocity_is_v0_plus_gt() {
        let flight = Flight::ballistic(
            Point::new(0.0, 100.0),
            Point::new(80.0, 300.0),
            -0.6,
            0.003,
            900.0,
            ARC_DURATION_WINDOW,
        );
        assert!((flight.vertical_velocity(0.0) - -0.6).abs() < EPSILON);
        assert!((flight.vertical_velocity(100.0) - -0.3).abs() < EPSILON);
    }

    #[test]
    fn ballistic_horizontal_motion_is_linear() {
        let start = Point::new(10.0, 100.0);
        let target = Point::new(110.0, 300.0);
        let flight = Flight::ballistic(start, target, -0.2, 0.003, 900.0, ARC_DURATION_WINDOW);
        let t = flight.duration();
        assert!((flight.position(t / 2.0).x - 60.0).abs() < EPSILON);
        assert!((flight.position(t).x - 110.0).abs() < EPSILON);
    }

    fn bezier_shape(t_peak: f64) -> TrajectoryPhase {
        TrajectoryPhase {
            mode: TrajectoryMode::Bezier,
            t_peak,
            apex_x_em: 0.06,
            apex_y_em: -0.6,
        }
    }

    #[rstest]
    #[case(0.0)]
    #[case(0.38)]
    #[case(0.5)]
    #[case(1.0)]
    fn bezier_endpoints_are_exact(#[case] t_peak: f64) {
        let start = Point::new(12.0, 80.0);
        let target = Point::new(200.0, 40.0);
        let flight = Flight::bezier(start, target, &bezier_shape(t_peak), 64.0, 700.0);
        assert_eq!(flight.position(0.0), start);
        assert_eq!(flight.position(700.0), target);
    }

    #[test]
    fn bezier_rises_toward_the_apex() {
        let start = Point::new(0.0, 100.0);
        let target = Point::new(100.0, 100.0);
        let flight = Flight::bezier(start, target, &bezier_shape(0.5), 64.0, 700.0);
        // apex_y_em is negative, so mid-flight must sit above both endpoints
        assert!(flight.position(350.0).y < 100.0);
        // ascending first, descending later
        assert!(flight.vertical_velocity(50.0) < 0.0);
        assert!(flight.vertical_velocity(650.0) > 0.0);
    }

    // the jump drops from the glyph top down onto the marker, so the target
    // top sits below the start top in these cases

    #[test]
    fn bounce_launch_scales_impact_by_restitution() {
        let launch = solve_jump(60.0, 100.0, 0.003, 20.0, Some(0.5), 0.58, 900.0);
        assert!(
            (launch.v0 - -0.29).abs() < EPSILON,
            "expected -0.29, got {}",
            launch.v0
        );
    }

    #[test]
    fn weak_bounce_falls_back_to_peak_height() {
        // 0.05 * 0.58 = -0.029, not usefully upward
        let launch = solve_jump(60.0, 100.0, 0.003, 20.0, Some(0.05), 0.58, 900.0);
        let expected = -(2.0f64 * 0.003 * 20.0).sqrt();
        assert!((launch.v0 - expected).abs() < EPSILON);
    }

    #[test]
    fn missing_impact_falls_back_to_peak_height() {
        let launch = solve_jump(60.0, 100.0, 0.003, 20.0, None, 0.58, 900.0);
        let expected = -(2.0f64 * 0.003 * 20.0).sqrt();
        assert!((launch.v0 - expected).abs() < EPSILON);
    }

    #[test]
    fn jump_duration_is_clamped() {
        // huge bounce => long flight, clamped to the window's top
        let launch = solve_jump(60.0, 100.0, 0.003, 20.0, Some(10.0), 0.58, 900.0);
        assert_eq!(launch.duration, JUMP_DURATION_CLAMP.1);
        // solved durations inside the window pass through untouched
        let easy = solve_jump(60.0, 100.0, 0.003, 20.0, Some(0.5), 0.58, 900.0);
        assert!(easy.duration > JUMP_DURATION_CLAMP.0 && easy.duration < JUMP_DURATION_CLAMP.1);
    }

    #[test]
    fn unreachable_target_still_produces_a_flight() {
        // target 300 px above with a 4 px peak: discriminant stays negative
        // through every retry, so the default duration (clamped) backstops
        let launch = solve_jump(400.0, 100.0, 0.003, 4.0, None, 0.58, 900.0);
        assert!(launch.duration >= JUMP_DURATION_CLAMP.0);
        assert!(launch.duration <= JUMP_DURATION_CLAMP.1);
        assert!(launch.v0 < 0.0);
        assert_eq!(launch.duration, 900.0);
    }

    #[test]
    fn solved_jump_lands_on_target() {
        let (start_top, target_top, g) = (60.0, 100.0, 0.003);
        let launch = solve_jump(start_top, target_top, g, 20.0, Some(0.5), 0.58, 900.0);
        let t = launch.duration;
        let reached = start_top + launch.v0 * t + 0.5 * g * t * t;
        assert!(
            (reached - target_top).abs() < EPSILON,
            "reached {reached}, wanted {target_top}"
        );
    }
}
