//! Effect invoker - applies a layer's bound effect to its rendered raster
//!
//! The single integration point for the rendering pipeline. Each call is
//! independent: `(layer, buffer) -> buffer`, with nothing retained between
//! tiles. Failures are returned tagged with the layer and effect so the
//! pipeline can decide between falling back, failing the tile or retrying.

use std::sync::Arc;

use crate::error::{ApplicationFailure, EffectError, InvokeError, RegistryError};
use crate::pixel::{conversion_defined, convert, ModeSet, PixelBuffer, PixelMode};

use super::registry::global_registry;
use super::types::LayerDescriptor;
use super::EffectRegistry;

/// Applies configured effects to rendered layers
#[derive(Debug, Clone)]
pub struct EffectInvoker {
    registry: Arc<EffectRegistry>,
}

impl EffectInvoker {
    pub fn new(registry: Arc<EffectRegistry>) -> Self {
        Self { registry }
    }

    /// Invoker backed by the process-wide registry, if installed
    pub fn from_global() -> Option<Self> {
        global_registry().map(Self::new)
    }

    pub fn registry(&self) -> &EffectRegistry {
        &self.registry
    }

    /// Check every layer's effect id against the registry.
    ///
    /// Meant for startup, so an unknown id blocks serving instead of failing
    /// each tile. Returns the first offending layer.
    pub fn validate<'a>(
        &self,
        layers: impl IntoIterator<Item = &'a LayerDescriptor>,
    ) -> Result<(), InvokeError> {
        for layer in layers {
            if let Some(effect_id) = layer.effect.effect_id() {
                if !self.registry.contains(effect_id) {
                    tracing::error!(layer = %layer.name, effect = %effect_id, "Layer references unknown pixel effect");
                    return Err(InvokeError::Configuration {
                        layer: layer.name.clone(),
                        effect_id: effect_id.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Apply the layer's effect to its rendered buffer.
    ///
    /// Layers without an effect get their buffer back untouched.
    pub fn process(
        &self,
        layer: &LayerDescriptor,
        buffer: PixelBuffer,
    ) -> Result<PixelBuffer, InvokeError> {
        let Some(effect_id) = layer.effect.effect_id() else {
            return Ok(buffer);
        };

        let span = tracing::debug_span!("pixel_effect", layer = %layer.name, effect = %effect_id);
        let _enter = span.enter();

        let mut effect = self.registry.resolve(effect_id).map_err(|e| {
            tracing::error!(error = %e, "Layer references unknown pixel effect");
            match e {
                RegistryError::UnknownEffectId(effect_id) => InvokeError::Configuration {
                    layer: layer.name.clone(),
                    effect_id,
                },
                other => InvokeError::EffectApplication {
                    layer: layer.name.clone(),
                    effect_id: effect_id.to_string(),
                    cause: ApplicationFailure::Effect(other.to_string()),
                },
            }
        })?;

        let application_error = |cause: ApplicationFailure| InvokeError::EffectApplication {
            layer: layer.name.clone(),
            effect_id: effect_id.to_string(),
            cause,
        };

        let declared = effect.declared_modes();
        let from = buffer.mode();
        let dimensions = buffer.dimensions();
        let (buffer, _) = conform_to(buffer, declared).map_err(|cause| {
            tracing::warn!(%from, %declared, error = %cause, "No usable mode for effect");
            application_error(cause)
        })?;

        let mut output = effect
            .apply(buffer, layer.effect.parameters())
            .map_err(|e| {
                tracing::warn!(error = %e, "Pixel effect failed");
                match e {
                    EffectError::Parameter { name, reason } => InvokeError::EffectParameter {
                        layer: layer.name.clone(),
                        effect_id: effect_id.to_string(),
                        name,
                        reason,
                    },
                    EffectError::Application(reason) => {
                        application_error(ApplicationFailure::Effect(reason))
                    }
                }
            })?;

        if output.dimensions() != dimensions {
            tracing::warn!(
                expected = ?dimensions,
                actual = ?output.dimensions(),
                "Pixel effect resized the buffer"
            );
            return Err(application_error(ApplicationFailure::DimensionsChanged {
                expected: dimensions,
                actual: output.dimensions(),
            }));
        }

        output.clear_padding();
        tracing::trace!(mode = %output.mode(), "Applied pixel effect");
        Ok(output)
    }
}

/// Bring `buffer` into a mode the effect declares.
///
/// Converts at most once. Returns the buffer with the mode it was converted
/// into, or `None` when it was already acceptable.
pub fn conform_to(
    buffer: PixelBuffer,
    declared: ModeSet,
) -> Result<(PixelBuffer, Option<PixelMode>), ApplicationFailure> {
    let from = buffer.mode();
    let Some(target) = negotiate_mode(from, declared)? else {
        return Ok((buffer, None));
    };
    tracing::debug!(%from, to = %target, "Converting buffer for effect");
    let converted = convert(buffer, target).map_err(|e| {
        tracing::warn!(error = %e, "Mode conversion failed");
        ApplicationFailure::ModeNegotiation { from, declared }
    })?;
    Ok((converted, Some(target)))
}

/// Pick the mode to convert into before applying an effect.
///
/// `Ok(None)` means the buffer is already acceptable. Otherwise prefers a
/// declared mode in the same family (lossless), then one at least as deep,
/// then any narrowing conversion; ties go to table order.
pub fn negotiate_mode(
    current: PixelMode,
    declared: ModeSet,
) -> Result<Option<PixelMode>, ApplicationFailure> {
    if declared.accepts(current) {
        return Ok(None);
    }

    let cost = |target: PixelMode| {
        if target.family() == current.family() {
            0
        } else if target.bits_per_pixel() >= current.bits_per_pixel() {
            1
        } else {
            2
        }
    };

    declared
        .modes()
        .filter(|&target| conversion_defined(current, target))
        .min_by_key(|&target| cost(target))
        .map(Some)
        .ok_or(ApplicationFailure::ModeNegotiation {
            from: current,
            declared,
        })
}
