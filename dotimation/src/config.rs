//! Motion tuning for the intro sequence
//!
//! Everything feel-related lives here so a deploy can carry a partial JSON
//! tweak file instead of a code change. A rough guide:
//!
//! * `o_landing.offset_x_em` / `offset_y_em`: nudge the landing on the glyph
//!   (±0.002–0.02 horizontal, ±0.01 steps vertical; negative = higher)
//! * `gravity.arc_to_o` / `gravity.jump`: 0.0027–0.0033 px/ms²; lower = floatier
//! * `elasticity.o_bounce_factor`: 0.5–0.65; how peppy the final jump is
//! * `trajectory.*.mode`: `ballistic` rides the shrink inertia, `bezier` gives
//!   a stylable curve via `t_peak` and the `apex_*_em` shifts
//! * set `responsive` and `responsive_continuous` to null to disable all
//!   viewport-dependent scaling
//!
//! All `*_em` values scale with font size; prefer them over px for
//! resolution independence.

use serde::{Deserialize, Serialize};

/// The full parameter tree. Immutable once built; phases read it fresh on
/// every invocation.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Caret nudge applied by the typing collaborator, carried here so the
    /// whole visual tuning lives in one tree.
    pub cursor: EmOffset,
    /// Landing alignment on top of the target glyph.
    pub o_landing: EmOffset,
    /// Landing alignment on the final marker.
    pub dot_landing: EmOffset,
    pub gravity: Gravity,
    pub elasticity: Elasticity,
    /// Discrete breakpoint scaling. Only consulted when
    /// `responsive_continuous` is absent.
    pub responsive: Option<ResponsiveDiscrete>,
    /// Width-interpolated scaling. Wins over `responsive` when both are set.
    pub responsive_continuous: Option<ResponsiveContinuous>,
    pub trajectory: Trajectory,
    pub hop: Hop,
    pub timing: Timing,
    /// Impact velocity recorded when a bezier-mode arc lands, px/ms.
    /// There is no physical derivation behind the value; it only exists so
    /// the next phase has a usable downward speed to bounce from.
    pub bezier_impact_vy: f64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            cursor: EmOffset {
                offset_x_em: 0.1,
                offset_y_em: -0.05,
            },
            o_landing: EmOffset {
                offset_x_em: 0.05,
                offset_y_em: -0.15,
            },
            dot_landing: EmOffset {
                offset_x_em: 0.0,
                offset_y_em: -0.016,
            },
            gravity: Gravity::default(),
            elasticity: Elasticity::default(),
            responsive: Some(ResponsiveDiscrete {
                breakpoint_px: 640.0,
                arc_to_o: Some(DiscreteArcScales {
                    gravity_scale: Some(0.88),
                }),
                jump: Some(DiscreteJumpScales {
                    gravity_scale: Some(0.82),
                    peak_h_scale: Some(1.15),
                }),
            }),
            responsive_continuous: Some(ResponsiveContinuous {
                width_px: Range {
                    min: 360.0,
                    max: 1440.0,
                },
                arc_to_o: Some(ContinuousArcScales {
                    // smaller screens get a slightly floatier, wider arc
                    gravity_scale: Some(Range {
                        min: 0.86,
                        max: 1.0,
                    }),
                }),
                jump: Some(ContinuousJumpScales {
                    gravity_scale: Some(Range {
                        min: 0.82,
                        max: 1.0,
                    }),
                    // a touch more height on smaller screens
                    peak_h_scale: Some(Range {
                        min: 1.12,
                        max: 1.0,
                    }),
                }),
            }),
            trajectory: Trajectory::default(),
            hop: Hop::default(),
            timing: Timing::default(),
            bezier_impact_vy: 0.02,
        }
    }
}

/// Font-relative offset pair, px = em * font size.
#[derive(Debug, Copy, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EmOffset {
    pub offset_x_em: f64,
    pub offset_y_em: f64,
}

impl EmOffset {
    /// Resolve to px at a given font size.
    pub fn to_px(&self, font_px: f64) -> (f64, f64) {
        (self.offset_x_em * font_px, self.offset_y_em * font_px)
    }
}

/// Downward acceleration per phase, px/ms².
#[derive(Debug, Copy, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Gravity {
    pub arc_to_o: f64,
    pub jump: f64,
}

impl Default for Gravity {
    fn default() -> Self {
        Self {
            arc_to_o: 0.003,
            jump: 0.003,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Elasticity {
    /// Restitution applied to the recorded impact speed when launching the
    /// final jump, 0..1.
    pub o_bounce_factor: f64,
}

impl Default for Elasticity {
    fn default() -> Self {
        Self {
            o_bounce_factor: 0.58,
        }
    }
}

/// A closed numeric range, used both for viewport widths and scale spans.
/// Scale spans may run "backwards" (min width maps to the larger scale).
#[derive(Debug, Copy, Clone, PartialEq, Deserialize, Serialize)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

/// Fixed multipliers applied when the viewport is at or below a breakpoint
/// or in portrait orientation.
#[derive(Debug, Copy, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ResponsiveDiscrete {
    pub breakpoint_px: f64,
    pub arc_to_o: Option<DiscreteArcScales>,
    pub jump: Option<DiscreteJumpScales>,
}

impl Default for ResponsiveDiscrete {
    fn default() -> Self {
        Self {
            breakpoint_px: 640.0,
            arc_to_o: None,
            jump: None,
        }
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DiscreteArcScales {
    pub gravity_scale: Option<f64>,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DiscreteJumpScales {
    pub gravity_scale: Option<f64>,
    pub peak_h_scale: Option<f64>,
}

/// Multipliers interpolated linearly over a viewport width span.
#[derive(Debug, Copy, Clone, PartialEq, Deserialize, Serialize)]
pub struct ResponsiveContinuous {
    pub width_px: Range,
    #[serde(default)]
    pub arc_to_o: Option<ContinuousArcScales>,
    #[serde(default)]
    pub jump: Option<ContinuousJumpScales>,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ContinuousArcScales {
    pub gravity_scale: Option<Range>,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ContinuousJumpScales {
    pub gravity_scale: Option<Range>,
    pub peak_h_scale: Option<Range>,
}

/// How a flight interpolates between launch and landing.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrajectoryMode {
    /// Constant-acceleration kinematics; duration is solved, not chosen.
    Ballistic,
    /// Quadratic curve through a configured control point; duration is fixed.
    Bezier,
}

/// Shape parameters for one flight phase.
#[derive(Debug, Copy, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TrajectoryPhase {
    pub mode: TrajectoryMode,
    /// Parametric fraction at which the bezier control point is referenced.
    /// Not a time fraction; the apex of the drawn curve lands nearby.
    pub t_peak: f64,
    pub apex_x_em: f64,
    pub apex_y_em: f64,
}

impl Default for TrajectoryPhase {
    fn default() -> Self {
        Self {
            mode: TrajectoryMode::Ballistic,
            t_peak: 0.38,
            apex_x_em: 0.0,
            apex_y_em: -0.6,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Trajectory {
    pub arc: TrajectoryPhase,
    pub jump: TrajectoryPhase,
}

impl Default for Trajectory {
    fn default() -> Self {
        Self {
            arc: TrajectoryPhase {
                mode: TrajectoryMode::Ballistic,
                t_peak: 0.38,
                apex_x_em: 0.06,
                apex_y_em: -0.6,
            },
            jump: TrajectoryPhase {
                mode: TrajectoryMode::Bezier,
                t_peak: 0.45,
                apex_x_em: 0.0,
                apex_y_em: -0.9,
            },
        }
    }
}

/// The decorative bounce-in-place between the arc landing and the final jump.
#[derive(Debug, Copy, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Hop {
    pub attempts: u32,
    /// Multiplier on `gravity.arc_to_o`; heavier gravity keeps the hop quick.
    pub gravity_boost: f64,
    /// Upward launch speed, px/ms (negative is up).
    pub impulse: f64,
    /// Rest between attempts, ms.
    pub pause_ms: f64,
}

impl Default for Hop {
    fn default() -> Self {
        Self {
            attempts: 1,
            gravity_boost: 1.4,
            impulse: -0.35,
            pause_ms: 120.0,
        }
    }
}

/// Fixed durations, ms. Flight phases may solve their own duration; these are
/// the fallbacks and the fixed-length effects.
#[derive(Debug, Copy, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Timing {
    pub retraction_ms: f64,
    pub arc_default_ms: f64,
    pub jump_default_ms: f64,
    pub squash_ms: f64,
    pub settle_ms: f64,
    pub reveal_ms: f64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            retraction_ms: 800.0,
            arc_default_ms: 900.0,
            jump_default_ms: 900.0,
            squash_ms: 220.0,
            settle_ms: 220.0,
            reveal_ms: 500.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_carries_reference_tuning() {
        let config = MotionConfig::default();
        assert_eq!(config.gravity.arc_to_o, 0.003);
        assert_eq!(config.elasticity.o_bounce_factor, 0.58);
        assert_eq!(config.trajectory.arc.mode, TrajectoryMode::Ballistic);
        assert_eq!(config.trajectory.jump.mode, TrajectoryMode::Bezier);
    }

    #[test]
    fn partial_json_overrides_only_what_it_names() {
        let config: MotionConfig = serde_json::from_str(
            r#"{
                "gravity": { "jump": 0.0028 },
                "responsive_continuous": null
            }"#,
        )
        .unwrap();
        assert_eq!(config.gravity.jump, 0.0028);
        // untouched siblings keep their defaults
        assert_eq!(config.gravity.arc_to_o, 0.003);
        assert!(config.responsive_continuous.is_none());
        assert!(config.responsive.is_some());
    }

    #[test]
    fn em_offsets_scale_with_font_size() {
        let off = EmOffset {
            offset_x_em: 0.05,
            offset_y_em: -0.15,
        };
        let (x, y) = off.to_px(64.0);
        assert_eq!(x, 3.2);
        assert_eq!(y, -9.6);
    }
}
