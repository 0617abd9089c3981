//! Raster model shared by the renderer and effects
//!
//! - **Modes** (`mode.rs`): the ten raw encodings and `ModeSet`
//! - **Buffer** (`buffer.rs`): validated `PixelBuffer` value type
//! - **Conversion** (`convert.rs`): mode-to-mode conversion

mod buffer;
mod convert;
mod mode;

pub use buffer::PixelBuffer;
pub use convert::{conversion_defined, convert, luminance, BILEVEL_THRESHOLD};
pub use mode::{ModeSet, Pixel, PixelMode};
