//! Tile Effects Library
//!
//! Post-processing pixel effects for rendered map tile layers. The rendering
//! pipeline hands each layer's raster to an [`EffectInvoker`], which looks up
//! the layer's configured effect, normalizes the raster into a mode the effect
//! accepts and applies it.

pub mod effects;
pub mod error;
pub mod pixel;
pub mod settings;
pub mod telemetry;

pub use effects::{
    EffectFactory, EffectInvoker, EffectParameters, EffectRegistry, LayerDescriptor,
    LayerEffectBinding, ParameterValue, PixelEffect,
};
pub use error::{ApplicationFailure, EffectError, InvokeError, PixelError, RegistryError};
pub use pixel::{convert, ModeSet, Pixel, PixelBuffer, PixelMode};
