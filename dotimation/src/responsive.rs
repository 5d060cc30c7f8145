//! Viewport-dependent scaling of gravity and peak height
//!
//! Two forms: a continuous one that lerps multipliers over a width span, and
//! a discrete breakpoint fallback. Continuous wins when both are configured;
//! with neither, or with no viewport reading at all, every multiplier is 1
//! and the animation plays its desktop tuning.

use serde::{Deserialize, Serialize};

use crate::config::{MotionConfig, Range};
use crate::{clamp01, lerp};

/// A snapshot of the viewport, taken by the collaborator. `None` anywhere a
/// reading is expected means "no responsive adjustment", never an error.
#[derive(Debug, Copy, Clone, PartialEq, Deserialize, Serialize)]
pub struct Viewport {
    pub width_px: f64,
    pub portrait: bool,
}

/// Multipliers resolved for one run. Pure function of `(config, viewport)`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Scales {
    pub arc_gravity: f64,
    pub jump_gravity: f64,
    pub jump_peak_h: f64,
}

impl Scales {
    pub const NEUTRAL: Scales = Scales {
        arc_gravity: 1.0,
        jump_gravity: 1.0,
        jump_peak_h: 1.0,
    };

    pub fn resolve(config: &MotionConfig, viewport: Option<Viewport>) -> Scales {
        let Some(viewport) = viewport else {
            return Self::NEUTRAL;
        };

        if let Some(rc) = &config.responsive_continuous {
            let t = span_fraction(viewport.width_px, rc.width_px);
            return Scales {
                arc_gravity: continuous(rc.arc_to_o.and_then(|s| s.gravity_scale), t),
                jump_gravity: continuous(rc.jump.and_then(|s| s.gravity_scale), t),
                jump_peak_h: continuous(rc.jump.and_then(|s| s.peak_h_scale), t),
            };
        }

        if let Some(resp) = &config.responsive {
            if viewport.portrait || viewport.width_px <= resp.breakpoint_px {
                return Scales {
                    arc_gravity: resp
                        .arc_to_o
                        .and_then(|s| s.gravity_scale)
                        .unwrap_or(1.0),
                    jump_gravity: resp.jump.and_then(|s| s.gravity_scale).unwrap_or(1.0),
                    jump_peak_h: resp.jump.and_then(|s| s.peak_h_scale).unwrap_or(1.0),
                };
            }
        }

        Self::NEUTRAL
    }
}

/// Where `width` sits within the configured span, clamped to [0, 1].
fn span_fraction(width: f64, span: Range) -> f64 {
    clamp01((width - span.min) / (span.max - span.min).max(1.0))
}

fn continuous(scale: Option<Range>, t: f64) -> f64 {
    match scale {
        Some(s) if s.min.is_finite() && s.max.is_finite() => lerp(s.min, s.max, t),
        _ => 1.0,
    }
}
