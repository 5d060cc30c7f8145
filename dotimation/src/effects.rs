//! Landing and reveal effects
//!
//! Nothing here moves the dot anywhere; these only massage size, scale and
//! opacity around the moments the physics already decided. Each effect is a
//! small tick-driven struct that latches its start time on the first tick,
//! like every phase does.

use std::f64::consts::PI;

use crate::stage::CursorFrame;
use crate::{clamp01, lerp};

/// One advance of a tick-driven animation.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Tick<T> {
    Running(T),
    Done(T),
}

impl<T> Tick<T> {
    pub fn value(&self) -> &T {
        match self {
            Tick::Running(v) | Tick::Done(v) => v,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Tick::Done(..))
    }
}

/// Damped squash-and-stretch oscillation scales at progress `p` in [0, 1].
/// Returns `(width_scale, height_scale)`. The oscillation does not decay to
/// exactly 1 by `p = 1`; callers snap to rest dimensions on their final tick.
pub fn jelly_scales(p: f64) -> (f64, f64) {
    let damp = (-2.2 * p).exp();
    let osc = (p * PI * 3.5).sin() * 0.28 * damp;
    (1.0 + osc * 0.7, 1.0 - osc)
}

/// Elastic scale of the revealed marker at progress `q` in [0, 1].
pub fn settle_scale(q: f64) -> f64 {
    1.0 + (q * PI * 2.0).sin() * 0.05 * (1.0 - q)
}

pub fn ease_in_quad(p: f64) -> f64 {
    p * p
}

pub fn ease_out_quad(p: f64) -> f64 {
    1.0 - (1.0 - p) * (1.0 - p)
}

/// The squash played where the dot lands. Oscillates width against height
/// with exponential damping; optionally keeps the bottom edge glued to the
/// contact point and the horizontal center fixed.
#[derive(Debug, Clone)]
pub struct JellySquash {
    t0: Option<f64>,
    duration: f64,
    rest: CursorFrame,
    anchor_bottom: bool,
}

impl JellySquash {
    pub fn new(rest: CursorFrame, duration: f64, anchor_bottom: bool) -> Self {
        Self {
            t0: None,
            duration,
            rest,
            anchor_bottom,
        }
    }

    pub fn tick(&mut self, now: f64) -> Tick<CursorFrame> {
        let t0 = *self.t0.get_or_insert(now);
        let p = clamp01((now - t0) / self.duration);
        if p >= 1.0 {
            return Tick::Done(self.rest);
        }

        let (width_scale, height_scale) = jelly_scales(p);
        let width = self.rest.width * width_scale;
        let height = self.rest.height * height_scale;
        let mut frame = CursorFrame {
            width,
            height,
            ..self.rest
        };
        if self.anchor_bottom {
            let bottom = self.rest.top + self.rest.height;
            let center_x = self.rest.left + self.rest.width / 2.0;
            frame.top = bottom - height;
            frame.left = center_x - width / 2.0;
        }
        Tick::Running(frame)
    }
}

/// Elastic-decay scale bounce of the static marker once the cursor hands off.
#[derive(Debug, Clone)]
pub struct SettleBounce {
    t0: Option<f64>,
    duration: f64,
}

impl SettleBounce {
    pub fn new(duration: f64) -> Self {
        Self { t0: None, duration }
    }

    /// Yields the marker's scale for this frame.
    pub fn tick(&mut self, now: f64) -> Tick<f64> {
        let t0 = *self.t0.get_or_insert(now);
        let q = clamp01((now - t0) / self.duration);
        if q >= 1.0 {
            Tick::Done(1.0)
        } else {
            Tick::Running(settle_scale(q))
        }
    }
}

/// Fade/slide of the trailing text: ease-out quadratic, -5 px to rest.
#[derive(Debug, Clone)]
pub struct Reveal {
    t0: Option<f64>,
    duration: f64,
}

impl Reveal {
    pub fn new(duration: f64) -> Self {
        Self { t0: None, duration }
    }

    /// Yields `(offset_x, opacity)` for this frame.
    pub fn tick(&mut self, now: f64) -> Tick<(f64, f64)> {
        let t0 = *self.t0.get_or_insert(now);
        let p = clamp01((now - t0) / self.duration);
        let ease = ease_out_quad(p);
        let value = (lerp(-5.0, 0.0, ease), ease);
        if p >= 1.0 {
            Tick::Done(value)
        } else {
            Tick::Running(value)
        }
    }
}
