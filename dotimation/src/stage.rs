//! The boundary between the motion engine and whatever actually renders
//!
//! The engine never touches a DOM. It asks a [`Stage`] for measurements
//! (caret position, character slots, glyph ink, the marker box, viewport) and
//! writes visual state back (cursor frames, marker reveal, trailing text).
//! A missing measurement is an answer, not an error; phases degrade silently.

use std::collections::BTreeMap;

use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

use crate::responsive::Viewport;

/// Ink extent of a glyph around the alphabetic baseline, px at the current
/// font size. Mirrors canvas `actualBoundingBoxAscent`/`Descent`: descent may
/// be negative for glyphs drawn entirely above the baseline.
#[derive(Debug, Copy, Clone, PartialEq, Deserialize, Serialize)]
pub struct InkMetrics {
    pub ascent: f64,
    pub descent: f64,
}

impl InkMetrics {
    pub fn height(&self) -> f64 {
        self.ascent + self.descent
    }
}

/// An axis-aligned box in title-relative px. Kept as plain fields so stage
/// descriptions round-trip through JSON without ceremony.
#[derive(Debug, Copy, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct BoxPx {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl BoxPx {
    pub fn rect(&self) -> Rect {
        Rect::new(
            self.left,
            self.top,
            self.left + self.width,
            self.top + self.height,
        )
    }

    pub fn center(&self) -> Point {
        self.rect().center()
    }
}

/// Where one typed character sits: the caret x at each of its boundaries plus
/// its selection box. The boundary positions give a center that is stable
/// across resolutions where the box alone is not.
#[derive(Debug, Copy, Clone, PartialEq, Deserialize, Serialize)]
pub struct CharSlot {
    pub start_x: f64,
    pub end_x: f64,
    pub bounds: BoxPx,
}

impl CharSlot {
    /// Horizontal center of the glyph, preferring the caret boundaries.
    pub fn center_x(&self) -> f64 {
        if self.start_x.is_finite() && self.end_x.is_finite() && self.start_x != self.end_x {
            (self.start_x + self.end_x) / 2.0
        } else {
            self.bounds.left + self.bounds.width / 2.0
        }
    }
}

/// What the cursor element should look like on one frame.
#[derive(Debug, Copy, Clone, PartialEq, Deserialize, Serialize)]
pub struct CursorFrame {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    /// Vertical-only shrink used while the caret collapses; 1 everywhere else.
    pub scale_y: f64,
    /// Fully rounded corners (a dot) vs square (a caret bar).
    pub round: bool,
    pub opacity: f64,
}

impl CursorFrame {
    /// A resting dot of diameter `d` with its top-left at `(left, top)`.
    pub fn dot(left: f64, top: f64, d: f64) -> Self {
        Self {
            left,
            top,
            width: d,
            height: d,
            scale_y: 1.0,
            round: true,
            opacity: 1.0,
        }
    }
}

/// Measurement and write-back surface the collaborator implements.
pub trait Stage {
    /// Font size, px, of the text the cursor plays against.
    fn font_px(&self) -> f64;
    /// `None` when viewport APIs are unavailable; scaling then stays neutral.
    fn viewport(&self) -> Option<Viewport>;
    /// Where the typing collaborator left the caret, title-relative px.
    fn caret(&self) -> Option<Point>;
    fn char_slot(&self, index: usize) -> Option<CharSlot>;
    fn glyph_ink(&self, ch: char) -> Option<InkMetrics>;
    /// Box of the pre-placed, initially invisible landing marker.
    fn marker_box(&self) -> Option<BoxPx>;
    /// Diameter the morphed dot should take, px.
    fn dot_diameter(&self) -> f64;

    fn set_cursor(&mut self, frame: CursorFrame);
    fn hide_cursor(&mut self);
    fn show_marker(&mut self);
    fn set_marker_scale(&mut self, scale: f64);
    fn set_trailing(&mut self, offset_x: f64, opacity: f64);
}

/// A static description of everything a [`Stage`] can be asked, measured once
/// by the collaborator (or synthesized from a font by the CLI).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StageLayout {
    pub font_px: f64,
    pub viewport: Option<Viewport>,
    pub caret: Option<[f64; 2]>,
    pub char_slots: Vec<CharSlot>,
    pub ink: BTreeMap<char, InkMetrics>,
    pub marker: Option<BoxPx>,
    pub dot_diameter: f64,
}

impl Default for StageLayout {
    fn default() -> Self {
        Self {
            font_px: 16.0,
            viewport: None,
            caret: None,
            char_slots: Vec::new(),
            ink: BTreeMap::new(),
            marker: None,
            dot_diameter: 4.0,
        }
    }
}

/// Everything written back to a stage, in order. This is the engine's output
/// format: a headless run is exactly a `Vec<StageEvent>`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StageEvent {
    Cursor(CursorFrame),
    CursorHidden,
    MarkerShown,
    MarkerScale { scale: f64 },
    Trailing { offset_x: f64, opacity: f64 },
}

/// A [`Stage`] over a fixed [`StageLayout`] that records every write-back.
/// Tests assert on the recording; the CLI and wasm surface serialize it.
#[derive(Debug, Clone)]
pub struct RecordingStage {
    layout: StageLayout,
    events: Vec<StageEvent>,
}

impl RecordingStage {
    pub fn new(layout: StageLayout) -> Self {
        Self {
            layout,
            events: Vec::new(),
        }
    }

    pub fn events(&self) -> &[StageEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<StageEvent> {
        self.events
    }

    pub fn cursor_frames(&self) -> impl Iterator<Item = &CursorFrame> {
        self.events.iter().filter_map(|e| match e {
            StageEvent::Cursor(frame) => Some(frame),
            _ => None,
        })
    }
}

impl Stage for RecordingStage {
    fn font_px(&self) -> f64 {
        self.layout.font_px
    }

    fn viewport(&self) -> Option<Viewport> {
        self.layout.viewport
    }

    fn caret(&self) -> Option<Point> {
        self.layout.caret.map(|[x, y]| Point::new(x, y))
    }

    fn char_slot(&self, index: usize) -> Option<CharSlot> {
        self.layout.char_slots.get(index).copied()
    }

    fn glyph_ink(&self, ch: char) -> Option<InkMetrics> {
        self.layout.ink.get(&ch).copied()
    }

    fn marker_box(&self) -> Option<BoxPx> {
        self.layout.marker
    }

    fn dot_diameter(&self) -> f64 {
        self.layout.dot_diameter
    }

    fn set_cursor(&mut self, frame: CursorFrame) {
        self.events.push(StageEvent::Cursor(frame));
    }

    fn hide_cursor(&mut self) {
        self.events.push(StageEvent::CursorHidden);
    }

    fn show_marker(&mut self) {
        self.events.push(StageEvent::MarkerShown);
    }

    fn set_marker_scale(&mut self, scale: f64) {
        self.events.push(StageEvent::MarkerScale { scale });
    }

    fn set_trailing(&mut self, offset_x: f64, opacity: f64) {
        self.events.push(StageEvent::Trailing { offset_x, opacity });
    }
}
