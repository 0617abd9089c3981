//! The extension contract for effect implementations
//!
//! - `PixelEffect` - transforms one layer's buffer
//! - `EffectFactory` - creates `PixelEffect` instances for the registry

use crate::error::EffectError;
use crate::pixel::{ModeSet, PixelBuffer};

use super::EffectParameters;

/// A pixel effect applied to a rendered layer.
///
/// The invoker converts the buffer into one of [`declared_modes`] before
/// calling [`apply`], so implementations never see an encoding they did not
/// ask for. Declaring [`ModeSet::all()`] opts out of conversion entirely.
///
/// `apply` takes the buffer by value: the effect owns it and may reuse its
/// allocation or return a fresh one. The result must keep the input's width
/// and height, though its mode may differ. Output must depend only on the
/// buffer and parameters, since tiles are cached and re-rendered.
///
/// [`declared_modes`]: PixelEffect::declared_modes
/// [`apply`]: PixelEffect::apply
pub trait PixelEffect: Send {
    /// Modes `apply` accepts
    fn declared_modes(&self) -> ModeSet;

    /// Transform the buffer.
    ///
    /// Fail with [`EffectError::Parameter`] for a malformed parameter and
    /// [`EffectError::Application`] for anything else.
    fn apply(
        &mut self,
        buffer: PixelBuffer,
        parameters: &EffectParameters,
    ) -> Result<PixelBuffer, EffectError>;
}

/// Creates effect instances.
///
/// The registry calls [`create`](EffectFactory::create) once per resolved
/// layer, so state kept on the instance is private to one render. State
/// shared across instances must be safe under concurrent renders.
pub trait EffectFactory: Send + Sync {
    fn create(&self) -> Box<dyn PixelEffect>;
}

impl<F> EffectFactory for F
where
    F: Fn() -> Box<dyn PixelEffect> + Send + Sync,
{
    fn create(&self) -> Box<dyn PixelEffect> {
        self()
    }
}
