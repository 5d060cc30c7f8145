//! Font-backed stage measurements
//!
//! The page measures glyph ink with a canvas; headless we get the same
//! numbers from the font itself. Outlines are drawn at pixel size through a
//! pen and the control box of the result is the ink. Coordinates here are
//! y-up font space; [`InkMetrics`] carries baseline-relative extents so the
//! caller never sees the flip.

use kurbo::{BezPath, Shape};
use skrifa::{
    instance::{LocationRef, Size},
    outline::DrawSettings,
    raw::FontRef,
    GlyphId, MetadataProvider,
};
use write_fonts::pens::BezPathPen;

use crate::error::Error;
use crate::stage::InkMetrics;

/// A font pinned to a pixel size, ready to answer stage measurement queries.
pub struct ScaledFont<'a> {
    font: FontRef<'a>,
    font_px: f32,
}

impl<'a> ScaledFont<'a> {
    pub fn new(font_data: &'a [u8], font_px: f64) -> Result<Self, Error> {
        Ok(Self {
            font: FontRef::new(font_data)?,
            font_px: font_px as f32,
        })
    }

    pub fn font_px(&self) -> f64 {
        self.font_px as f64
    }

    /// Line-box ascent above the baseline, px.
    pub fn line_ascent(&self) -> f64 {
        self.metrics().ascent as f64
    }

    /// Line-box descent below the baseline, px, positive.
    pub fn line_descent(&self) -> f64 {
        -(self.metrics().descent as f64)
    }

    /// Ink extent of a glyph: what canvas `measureText` calls the actual
    /// bounding box ascent/descent.
    pub fn ink(&self, ch: char) -> Result<InkMetrics, Error> {
        let bbox = self.draw(ch)?.bounding_box();
        Ok(InkMetrics {
            ascent: bbox.y1,
            descent: -bbox.y0,
        })
    }

    /// Horizontal advance of a glyph, px. This is what a probe `<span>`
    /// around a single character measures as its width.
    pub fn advance(&self, ch: char) -> Result<f64, Error> {
        let gid = self.gid(ch)?;
        self.font
            .glyph_metrics(Size::new(self.font_px), LocationRef::default())
            .advance_width(gid)
            .map(f64::from)
            .ok_or(Error::NoAdvance(ch))
    }

    /// Diameter the morphed dot should take: the rendered width of '.'.
    pub fn dot_diameter(&self) -> Result<f64, Error> {
        self.advance('.')
    }

    fn metrics(&self) -> skrifa::metrics::Metrics {
        self.font
            .metrics(Size::new(self.font_px), LocationRef::default())
    }

    fn gid(&self, ch: char) -> Result<GlyphId, Error> {
        self.font.charmap().map(ch).ok_or(Error::UnmappedChar(ch))
    }

    fn draw(&self, ch: char) -> Result<BezPath, Error> {
        let gid = self.gid(ch)?;
        let glyph = self
            .font
            .outline_glyphs()
            .get(gid)
            .ok_or(Error::NoOutline(ch))?;
        let mut pen = BezPathPen::new();
        let settings = DrawSettings::unhinted(Size::new(self.font_px), LocationRef::default());
        glyph
            .draw(settings, &mut pen)
            .map_err(|e| Error::DrawError(ch, e))?;
        Ok(pen.into_inner())
    }
}
