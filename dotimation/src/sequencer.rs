//! The four-phase intro state machine
//!
//! Retraction, arc, hop, jump-and-reveal, in that order, each exactly once.
//! Every phase is a tick-driven struct; the sequencer owns whichever one is
//! active, hands it the stage and the clock reading, and on completion builds
//! the next phase from fresh stage measurements. Cursor state crosses phase
//! boundaries only through [`PhaseState`].

use kurbo::Point;
use serde::{Deserialize, Serialize};

use crate::config::{MotionConfig, TrajectoryMode};
use crate::effects::{ease_in_quad, JellySquash, Reveal, SettleBounce};
use crate::flight::{self, Flight, ARC_DURATION_WINDOW};
use crate::responsive::Scales;
use crate::stage::{CursorFrame, Stage};
use crate::clamp01;

/// Which character the dot lands on, and which glyph's ink to measure for
/// the touch-down height. Typically the last typed character.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Script {
    pub char_index: usize,
    pub target_char: char,
}

/// Cursor state at a phase boundary: the last known position and vertical
/// velocity. Built at the end of retraction, updated by the arc's landing,
/// read by the jump, discarded when the sequence completes.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct PhaseState {
    pub left_px: f64,
    pub top_px: f64,
    /// px/ms, negative up. After a landing this is the impact velocity.
    pub vertical_velocity: f64,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Progress {
    Running,
    Done,
}

enum Phase {
    Idle,
    Retraction(Retraction),
    Arc(ArcPhase),
    Hop(HopPhase),
    Jump(JumpPhase),
    Settle(SettleBounce),
    Reveal(Reveal),
    Done,
}

/// Drives the whole intro. Construct once, tick once per frame until
/// [`Progress::Done`]; ticking after that is a no-op.
pub struct Sequencer<'a> {
    config: &'a MotionConfig,
    script: Script,
    state: PhaseState,
    phase: Phase,
}

impl<'a> Sequencer<'a> {
    pub fn new(config: &'a MotionConfig, script: Script) -> Self {
        Self {
            config,
            script,
            state: PhaseState::default(),
            phase: Phase::Idle,
        }
    }

    pub fn tick(&mut self, stage: &mut dyn Stage, now: f64) -> Progress {
        // take the phase out so completions can build the next one from self
        let phase = std::mem::replace(&mut self.phase, Phase::Done);
        self.phase = match phase {
            Phase::Done => Phase::Done,
            Phase::Idle => {
                let retraction = self.start_retraction(stage);
                self.advance_retraction(retraction, stage, now)
            }
            Phase::Retraction(retraction) => self.advance_retraction(retraction, stage, now),
            Phase::Arc(mut arc) => {
                if let Some(state) = arc.tick(stage, now) {
                    tracing::debug!(impact_vy = state.vertical_velocity, "arc landed");
                    self.state = state;
                    self.start_hop(stage)
                } else {
                    Phase::Arc(arc)
                }
            }
            Phase::Hop(mut hop) => {
                if hop.tick(stage, now).is_some() {
                    self.start_jump(stage)
                } else {
                    Phase::Hop(hop)
                }
            }
            Phase::Jump(mut jump) => {
                if jump.tick(stage, now).is_some() {
                    Phase::Settle(SettleBounce::new(self.config.timing.settle_ms))
                } else {
                    Phase::Jump(jump)
                }
            }
            Phase::Settle(mut settle) => {
                let step = settle.tick(now);
                stage.set_marker_scale(*step.value());
                if step.is_done() {
                    Phase::Reveal(Reveal::new(self.config.timing.reveal_ms))
                } else {
                    Phase::Settle(settle)
                }
            }
            Phase::Reveal(mut reveal) => {
                let step = reveal.tick(now);
                let (offset_x, opacity) = *step.value();
                stage.set_trailing(offset_x, opacity);
                if step.is_done() {
                    Phase::Done
                } else {
                    Phase::Reveal(reveal)
                }
            }
        };
        if matches!(self.phase, Phase::Done) {
            Progress::Done
        } else {
            Progress::Running
        }
    }

    fn advance_retraction(
        &mut self,
        mut retraction: Retraction,
        stage: &mut dyn Stage,
        now: f64,
    ) -> Phase {
        if let Some(state) = retraction.tick(stage, now) {
            tracing::debug!(
                top = state.top_px,
                vy = state.vertical_velocity,
                "caret retracted to a dot"
            );
            self.state = state;
            self.start_arc(stage)
        } else {
            Phase::Retraction(retraction)
        }
    }

    fn start_retraction(&self, stage: &dyn Stage) -> Retraction {
        let caret = stage.caret().unwrap_or(Point::ZERO);
        Retraction {
            t0: None,
            duration: self.config.timing.retraction_ms,
            em: stage.font_px(),
            dot_diameter: stage.dot_diameter(),
            caret_left: caret.x,
            base_top: caret.y,
            last: None,
            vy: 0.0,
        }
    }

    fn start_arc(&self, stage: &dyn Stage) -> Phase {
        let Some(slot) = stage.char_slot(self.script.char_index) else {
            tracing::debug!(
                index = self.script.char_index,
                "no slot for the landing character, skipping the arc"
            );
            return self.start_hop(stage);
        };
        let em = stage.font_px();
        let d = stage.dot_diameter();
        let (off_x, off_y) = self.config.o_landing.to_px(em);

        let target_left = slot.center_x() + off_x - d / 2.0;
        // rest the dot's bottom edge on top of the glyph's visible ink
        let ink_height = stage
            .glyph_ink(self.script.target_char)
            .map(|ink| ink.height())
            .unwrap_or(0.0);
        let ink_top = slot.bounds.top + slot.bounds.height - ink_height;
        let target_top = ink_top - d + off_y;

        let start = Point::new(self.state.left_px, self.state.top_px);
        let target = Point::new(target_left, target_top);
        let scales = Scales::resolve(self.config, stage.viewport());
        let gravity = self.config.gravity.arc_to_o * scales.arc_gravity;

        let shape = &self.config.trajectory.arc;
        let flight = match shape.mode {
            TrajectoryMode::Ballistic => Flight::ballistic(
                start,
                target,
                self.state.vertical_velocity,
                gravity,
                self.config.timing.arc_default_ms,
                ARC_DURATION_WINDOW,
            ),
            TrajectoryMode::Bezier => {
                Flight::bezier(start, target, shape, em, self.config.timing.arc_default_ms)
            }
        };
        tracing::debug!(
            duration = flight.duration(),
            landing = ?target,
            "arc solved"
        );
        Phase::Arc(ArcPhase {
            t0: None,
            flight,
            ballistic: shape.mode == TrajectoryMode::Ballistic,
            dot_diameter: d,
            bezier_impact_vy: self.config.bezier_impact_vy,
            squash_ms: self.config.timing.squash_ms,
            squash: None,
            impact_vy: 0.0,
        })
    }

    fn start_hop(&self, stage: &dyn Stage) -> Phase {
        let hop = &self.config.hop;
        if hop.attempts == 0 {
            return self.start_jump(stage);
        }
        Phase::Hop(HopPhase {
            left: self.state.left_px,
            baseline: self.state.top_px,
            dot_diameter: stage.dot_diameter(),
            gravity: self.config.gravity.arc_to_o * hop.gravity_boost,
            impulse: hop.impulse,
            pause_ms: hop.pause_ms,
            attempts_left: hop.attempts,
            state: HopState::Flying { t0: None },
        })
    }

    fn start_jump(&self, stage: &dyn Stage) -> Phase {
        let Some(marker) = stage.marker_box() else {
            tracing::debug!("no landing marker, skipping the final jump");
            return Phase::Done;
        };
        let em = stage.font_px();
        let d = stage.dot_diameter();
        let (off_x, off_y) = self.config.dot_landing.to_px(em);

        // center-to-center alignment avoids resolution variance
        let center = marker.center();
        let target = Point::new(center.x + off_x - d / 2.0, center.y + off_y - d / 2.0);
        let start = Point::new(self.state.left_px, self.state.top_px);

        let scales = Scales::resolve(self.config, stage.viewport());
        let gravity = self.config.gravity.jump * scales.jump_gravity;
        let peak_h = (d * 0.7).max(8.0) * scales.jump_peak_h;
        let launch = flight::solve_jump(
            start.y,
            target.y,
            gravity,
            peak_h,
            Some(self.state.vertical_velocity),
            self.config.elasticity.o_bounce_factor,
            self.config.timing.jump_default_ms,
        );
        tracing::debug!(v0 = launch.v0, duration = launch.duration, "jump solved");

        let shape = &self.config.trajectory.jump;
        let flight = match shape.mode {
            TrajectoryMode::Ballistic => {
                Flight::ballistic_timed(start, target, launch.v0, gravity, launch.duration)
            }
            TrajectoryMode::Bezier => Flight::bezier(start, target, shape, em, launch.duration),
        };
        Phase::Jump(JumpPhase {
            t0: None,
            flight,
            dot_diameter: d,
        })
    }
}

/// Phase 1: the typed caret shrinks upward, narrows to a bar, then morphs
/// into the dot. Records its exit velocity by finite difference.
struct Retraction {
    t0: Option<f64>,
    duration: f64,
    em: f64,
    dot_diameter: f64,
    caret_left: f64,
    base_top: f64,
    last: Option<(f64, f64)>,
    vy: f64,
}

impl Retraction {
    fn tick(&mut self, stage: &mut dyn Stage, now: f64) -> Option<PhaseState> {
        let t0 = *self.t0.get_or_insert(now);
        let p = clamp01((now - t0) / self.duration);
        let ease = ease_in_quad(p);
        let top = self.base_top - 0.8 * self.em * ease;

        let frame = if p < 0.7 {
            // narrow to a thin bar, still caret-shaped
            let width = (2.0 - 1.8 * ease).max(0.3);
            CursorFrame {
                left: self.caret_left - width / 2.0,
                top,
                width,
                height: self.em,
                scale_y: 1.0 - 0.95 * ease,
                round: false,
                opacity: 0.9,
            }
        } else {
            // morph the bar into the dot
            let k = (p - 0.7) / 0.3;
            let size = 2.0 + k * (self.dot_diameter - 2.0);
            CursorFrame {
                left: self.caret_left - size / 2.0,
                top,
                width: size,
                height: size,
                scale_y: 1.0,
                round: true,
                opacity: 1.0,
            }
        };
        stage.set_cursor(frame);

        if let Some((last_t, last_top)) = self.last {
            if now > last_t {
                self.vy = (top - last_top) / (now - last_t);
            }
        }
        self.last = Some((now, top));

        (p >= 1.0).then(|| PhaseState {
            left_px: self.caret_left - self.dot_diameter / 2.0,
            top_px: top,
            vertical_velocity: self.vy,
        })
    }
}

/// Phase 2: fly to the glyph, squash on touch-down.
struct ArcPhase {
    t0: Option<f64>,
    flight: Flight,
    ballistic: bool,
    dot_diameter: f64,
    bezier_impact_vy: f64,
    squash_ms: f64,
    squash: Option<JellySquash>,
    impact_vy: f64,
}

impl ArcPhase {
    fn tick(&mut self, stage: &mut dyn Stage, now: f64) -> Option<PhaseState> {
        let target = self.flight.target();
        if let Some(squash) = &mut self.squash {
            let step = squash.tick(now);
            stage.set_cursor(*step.value());
            return step.is_done().then(|| PhaseState {
                left_px: target.x,
                top_px: target.y,
                vertical_velocity: self.impact_vy,
            });
        }

        let t0 = *self.t0.get_or_insert(now);
        let raw = now - t0;
        let duration = self.flight.duration();
        let elapsed = raw.min(duration);
        let pos = self.flight.position(elapsed);
        let vy = self.flight.vertical_velocity(elapsed);
        let d = self.dot_diameter;

        // descending and already at the target height: numeric drift, or a
        // fallback duration that overshoots the physical landing. Snap.
        let landed_early = vy > 0.0 && pos.y >= target.y && raw < duration;
        if landed_early || raw >= duration {
            self.impact_vy = if landed_early {
                vy
            } else if self.ballistic {
                self.flight.vertical_velocity(duration)
            } else {
                self.bezier_impact_vy
            };
            let rest = CursorFrame::dot(target.x, target.y, d);
            stage.set_cursor(rest);
            self.squash = Some(JellySquash::new(rest, self.squash_ms, true));
            return None;
        }

        // slight compression into the landing
        let k = clamp01((elapsed / duration - 0.9) / 0.1);
        stage.set_cursor(CursorFrame {
            left: pos.x,
            top: pos.y,
            width: d * (1.0 + 0.03 * k),
            height: d * (1.0 - 0.05 * k),
            scale_y: 1.0,
            round: true,
            opacity: 1.0,
        });
        None
    }
}

/// Phase 3: a couple of timid bounces in place. Decorative only; horizontal
/// position and the threaded state are left untouched.
struct HopPhase {
    left: f64,
    baseline: f64,
    dot_diameter: f64,
    gravity: f64,
    impulse: f64,
    pause_ms: f64,
    attempts_left: u32,
    state: HopState,
}

enum HopState {
    Flying { t0: Option<f64> },
    Pausing { since: f64 },
}

impl HopPhase {
    fn tick(&mut self, stage: &mut dyn Stage, now: f64) -> Option<()> {
        match &mut self.state {
            HopState::Flying { t0 } => {
                let t0 = *t0.get_or_insert(now);
                let elapsed = now - t0;
                let y = self.baseline + self.impulse * elapsed
                    + 0.5 * self.gravity * elapsed * elapsed;
                if elapsed > 0.0 && y >= self.baseline {
                    stage.set_cursor(CursorFrame::dot(self.left, self.baseline, self.dot_diameter));
                    self.attempts_left -= 1;
                    self.state = HopState::Pausing { since: now };
                } else {
                    stage.set_cursor(CursorFrame::dot(self.left, y, self.dot_diameter));
                }
            }
            HopState::Pausing { since } => {
                if now - *since >= self.pause_ms {
                    if self.attempts_left == 0 {
                        return Some(());
                    }
                    self.state = HopState::Flying { t0: None };
                }
            }
        }
        None
    }
}

/// Phase 4's flight; the settle and reveal that follow are their own
/// sequencer states.
struct JumpPhase {
    t0: Option<f64>,
    flight: Flight,
    dot_diameter: f64,
}

impl JumpPhase {
    fn tick(&mut self, stage: &mut dyn Stage, now: f64) -> Option<()> {
        let t0 = *self.t0.get_or_insert(now);
        let raw = now - t0;
        let duration = self.flight.duration();
        if raw >= duration {
            let target = self.flight.target();
            stage.set_cursor(CursorFrame::dot(target.x, target.y, self.dot_diameter));
            stage.hide_cursor();
            stage.show_marker();
            return Some(());
        }
        let pos = self.flight.position(raw);
        stage.set_cursor(CursorFrame::dot(pos.x, pos.y, self.dot_diameter));
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{FixedStep, FrameClock};
    use crate::config::MotionConfig;
    use crate::play;
    use crate::stage::{BoxPx, CharSlot, InkMetrics, RecordingStage, StageEvent, StageLayout};
    use crate::responsive::Viewport;

    /// A stage shaped like the real page: 64 px title, the landing glyph
    /// tenth, the marker just past the text.
    fn layout() -> StageLayout {
        let mut layout = StageLayout {
            font_px: 64.0,
            viewport: Some(Viewport {
                width_px: 1280.0,
                portrait: false,
            }),
            caret: Some([410.0, 12.0]),
            dot_diameter: 17.0,
            ..Default::default()
        };
        layout.char_slots = vec![CharSlot {
            start_x: 360.0,
            end_x: 404.0,
            bounds: BoxPx {
                left: 358.0,
                top: 8.0,
                width: 48.0,
                height: 64.0,
            },
        }];
        layout.ink.insert(
            'o',
            InkMetrics {
                ascent: 30.0,
                descent: 0.5,
            },
        );
        layout.marker = Some(BoxPx {
            left: 420.0,
            top: 48.0,
            width: 17.0,
            height: 17.0,
        });
        layout
    }

    fn script() -> Script {
        Script {
            char_index: 0,
            target_char: 'o',
        }
    }

    fn run(layout: StageLayout, config: &MotionConfig) -> RecordingStage {
        let mut stage = RecordingStage::new(layout);
        let mut clock = FixedStep::fps(60.0);
        play(config, script(), &mut stage, &mut clock);
        stage
    }

    #[test]
    fn full_sequence_completes_and_reveals() {
        let config = MotionConfig::default();
        let stage = run(layout(), &config);
        let events = stage.events();

        let hidden = events
            .iter()
            .position(|e| matches!(e, StageEvent::CursorHidden))
            .expect("cursor should hand off");
        let shown = events
            .iter()
            .position(|e| matches!(e, StageEvent::MarkerShown))
            .expect("marker should be revealed");
        let first_scale = events
            .iter()
            .position(|e| matches!(e, StageEvent::MarkerScale { .. }))
            .expect("marker should settle");
        let first_trailing = events
            .iter()
            .position(|e| matches!(e, StageEvent::Trailing { .. }))
            .expect("trailing text should reveal");
        assert!(hidden < shown && shown < first_scale && first_scale < first_trailing);

        // no cursor writes after the hand-off
        assert!(!events[hidden..]
            .iter()
            .any(|e| matches!(e, StageEvent::Cursor(..))));

        // reveal finishes fully slid in and opaque
        let last_trailing = events
            .iter()
            .rev()
            .find_map(|e| match e {
                StageEvent::Trailing { offset_x, opacity } => Some((*offset_x, *opacity)),
                _ => None,
            })
            .unwrap();
        assert_eq!(last_trailing, (0.0, 1.0));
    }

    #[test]
    fn sequence_runs_exactly_once() {
        let config = MotionConfig::default();
        let mut stage = RecordingStage::new(layout());
        let mut clock = FixedStep::fps(60.0);
        let mut sequencer = Sequencer::new(&config, script());
        while sequencer.tick(&mut stage, clock.now()) == Progress::Running {
            clock.next_frame();
        }
        let recorded = stage.events().len();
        for _ in 0..10 {
            clock.next_frame();
            assert_eq!(sequencer.tick(&mut stage, clock.now()), Progress::Done);
        }
        assert_eq!(stage.events().len(), recorded);
    }

    #[test]
    fn cursor_lands_exactly_on_the_glyph_target() {
        let config = MotionConfig::default();
        let stage = run(layout(), &config);

        // target math: boundary center 382 + 0.05em, ink top 72 - 30.5,
        // top = ink_top - d + (-0.15em)
        let expected_left = 382.0 + 0.05 * 64.0 - 17.0 / 2.0;
        let expected_top = (72.0 - 30.5) - 17.0 - 0.15 * 64.0;
        assert!(
            stage.cursor_frames().any(|f| {
                (f.left - expected_left).abs() < 1e-9
                    && (f.top - expected_top).abs() < 1e-9
                    && f.width == 17.0
            }),
            "no frame rests on ({expected_left}, {expected_top})"
        );
    }

    #[test]
    fn retraction_morphs_caret_into_dot() {
        let config = MotionConfig::default();
        let mut stage = RecordingStage::new(layout());
        let mut retraction = Retraction {
            t0: None,
            duration: config.timing.retraction_ms,
            em: 64.0,
            dot_diameter: 17.0,
            caret_left: 410.0,
            base_top: 12.0,
            last: None,
            vy: 0.0,
        };
        let mut now = 0.0;
        let state = loop {
            if let Some(state) = retraction.tick(&mut stage, now) {
                break state;
            }
            now += 1000.0 / 60.0;
        };

        let frames: Vec<_> = stage.cursor_frames().copied().collect();
        // starts as a narrowing bar
        assert!(!frames[1].round);
        assert_eq!(frames[1].height, 64.0);
        assert!(frames[1].width <= 2.0);
        // ends as the dot, risen 0.8 em
        let last = frames.last().unwrap();
        assert!(last.round);
        assert_eq!(last.width, 17.0);
        assert_eq!(last.height, 17.0);
        assert!((last.top - (12.0 - 0.8 * 64.0)).abs() < 1e-9);
        // exit velocity points up
        assert!(state.vertical_velocity < 0.0);
        assert_eq!(state.left_px, 410.0 - 8.5);
    }

    #[test]
    fn hop_never_moves_horizontally_and_returns_to_baseline() {
        let mut stage = RecordingStage::new(layout());
        let mut hop = HopPhase {
            left: 123.0,
            baseline: 40.0,
            dot_diameter: 17.0,
            gravity: 0.003 * 1.4,
            impulse: -0.35,
            pause_ms: 120.0,
            attempts_left: 2,
            state: HopState::Flying { t0: None },
        };
        let mut now = 0.0;
        let mut ticks = 0;
        while hop.tick(&mut stage, now).is_none() {
            now += 1000.0 / 60.0;
            ticks += 1;
            assert!(ticks < 200, "hop must terminate");
        }

        let frames: Vec<_> = stage.cursor_frames().copied().collect();
        assert!(frames.iter().all(|f| f.left == 123.0));
        // it did leave the ground
        assert!(frames.iter().any(|f| f.top < 39.0));
        // and never dipped below it
        assert!(frames.iter().all(|f| f.top <= 40.0 + 1e-9));
        assert_eq!(frames.last().unwrap().top, 40.0);
    }

    #[test]
    fn arc_fallback_duration_still_snaps_at_physical_landing() {
        // launched downward at a target below: the only root is ~173 ms,
        // rejected by the window, so the flight runs on the 900 ms fallback
        // and the drift guard must snap at the real touch-down instead
        let flight = Flight::ballistic(
            Point::new(0.0, 100.0),
            Point::new(90.0, 300.0),
            0.9,
            0.003,
            900.0,
            ARC_DURATION_WINDOW,
        );
        assert_eq!(flight.duration(), 900.0);

        let mut stage = RecordingStage::new(layout());
        let mut arc = ArcPhase {
            t0: None,
            flight,
            ballistic: true,
            dot_diameter: 17.0,
            bezier_impact_vy: 0.02,
            squash_ms: 220.0,
            squash: None,
            impact_vy: 0.0,
        };
        let mut now = 0.0;
        let state = loop {
            if let Some(state) = arc.tick(&mut stage, now) {
                break state;
            }
            now += 1000.0 / 60.0;
            assert!(now < 600.0, "should land long before the fallback runs out");
        };
        assert_eq!(state.left_px, 90.0);
        assert_eq!(state.top_px, 300.0);
        assert!(state.vertical_velocity > 0.0);
    }

    #[test]
    fn missing_char_slot_skips_the_arc_silently() {
        let mut layout = layout();
        layout.char_slots.clear();
        let config = MotionConfig::default();
        let stage = run(layout, &config);
        // still completes the whole show
        assert!(stage
            .events()
            .iter()
            .any(|e| matches!(e, StageEvent::MarkerShown)));
    }

    #[test]
    fn missing_marker_ends_the_sequence_without_reveal() {
        let mut layout = layout();
        layout.marker = None;
        let config = MotionConfig::default();
        let stage = run(layout, &config);
        assert!(!stage.events().iter().any(|e| matches!(
            e,
            StageEvent::CursorHidden | StageEvent::MarkerShown | StageEvent::Trailing { .. }
        )));
    }

    #[test]
    fn bezier_arc_lands_on_the_same_target() {
        let mut config = MotionConfig::default();
        config.trajectory.arc.mode = TrajectoryMode::Bezier;
        let stage = run(layout(), &config);
        let expected_left = 382.0 + 0.05 * 64.0 - 17.0 / 2.0;
        let expected_top = (72.0 - 30.5) - 17.0 - 0.15 * 64.0;
        assert!(stage.cursor_frames().any(|f| {
            (f.left - expected_left).abs() < 1e-9 && (f.top - expected_top).abs() < 1e-9
        }));
    }

    #[test]
    fn ballistic_jump_config_flies_ballistically() {
        let mut config = MotionConfig::default();
        config.trajectory.jump.mode = TrajectoryMode::Ballistic;
        let stage = run(layout(), &config);
        // sanity: sequence still completes with the alternate mode
        assert!(stage
            .events()
            .iter()
            .any(|e| matches!(e, StageEvent::Trailing { .. })));
    }

    #[test]
    fn no_responsive_config_plays_identically_to_missing_viewport() {
        let mut config = MotionConfig::default();
        config.responsive = None;
        config.responsive_continuous = None;

        let with_viewport = run(layout(), &config);

        let mut no_viewport = layout();
        no_viewport.viewport = None;
        let without_viewport = run(no_viewport, &config);

        assert_eq!(with_viewport.events(), without_viewport.events());
    }
}
