//! Error types
//!
//! The sequencer itself never errors; degenerate math and missing stage
//! elements take fallback paths by design. These types cover the loading
//! boundary only: fonts, glyph resolution, and config files.

use skrifa::outline::DrawError;
use skrifa::raw::ReadError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unable to read font: {0}")]
    ReadError(#[from] ReadError),
    #[error("No character mapping for '{0}'")]
    UnmappedChar(char),
    #[error("No outline for '{0}'")]
    NoOutline(char),
    #[error("No advance width for '{0}'")]
    NoAdvance(char),
    #[error("Unable to draw '{0}': {1}")]
    DrawError(char, DrawError),
}
