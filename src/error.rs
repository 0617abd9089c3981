//! Error types for pixel buffers, effects, the registry and the invoker

use thiserror::Error;

use crate::pixel::{ModeSet, PixelMode};

/// Errors raised while building, reading or converting a [`PixelBuffer`](crate::PixelBuffer)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PixelError {
    /// Raw sample data does not match the size implied by width, height and mode
    #[error("{mode} buffer needs {expected} bytes of sample data, got {actual}")]
    DataLength {
        mode: PixelMode,
        expected: usize,
        actual: usize,
    },

    /// Width and height describe a buffer too large to address
    #[error("buffer dimensions overflow addressable memory")]
    DimensionsOverflow,

    /// A palette-indexed buffer was built without a palette
    #[error("palette-indexed buffer requires a palette")]
    MissingPalette,

    /// A palette was supplied for a direct-colour or bilevel mode
    #[error("{mode} buffer must not carry a palette")]
    UnexpectedPalette { mode: PixelMode },

    /// Palette must hold between 1 and 256 entries
    #[error("palette must hold 1 to 256 entries, got {0}")]
    PaletteSize(usize),

    /// Sample data references a palette entry that does not exist
    #[error("palette index {index} out of range for palette of {len} entries")]
    PaletteIndex { index: u8, len: usize },

    /// No defined mapping between the two modes
    #[error("no conversion defined from {from} to {to}")]
    UnsupportedConversion { from: PixelMode, to: PixelMode },

    /// Pixel access outside the buffer
    #[error("pixel ({x}, {y}) is outside a {width}x{height} buffer")]
    OutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
}

/// Errors raised by effect implementations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EffectError {
    /// Malformed or unsupported parameter value
    #[error("invalid parameter `{name}`: {reason}")]
    Parameter { name: String, reason: String },

    /// Internal failure while transforming the buffer
    #[error("{0}")]
    Application(String),
}

impl EffectError {
    /// Shorthand for a parameter validation failure
    pub fn parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        EffectError::Parameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

impl From<PixelError> for EffectError {
    fn from(e: PixelError) -> Self {
        EffectError::Application(e.to_string())
    }
}

/// Errors raised by the effect registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("effect `{0}` is already registered")]
    DuplicateEffectId(String),

    #[error("no effect registered as `{0}`")]
    UnknownEffectId(String),

    /// The process-wide registry was installed twice
    #[error("the global effect registry is already installed")]
    AlreadyInstalled,
}

/// Why an effect could not be applied to a layer
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApplicationFailure {
    /// The effect itself reported a failure
    #[error("{0}")]
    Effect(String),

    /// The buffer could not be converted into any mode the effect accepts
    #[error("cannot convert {from} into any mode the effect accepts ({declared})")]
    ModeNegotiation { from: PixelMode, declared: ModeSet },

    /// The effect returned a buffer of a different size
    #[error("effect resized the buffer from {}x{} to {}x{}", .expected.0, .expected.1, .actual.0, .actual.1)]
    DimensionsChanged {
        expected: (u32, u32),
        actual: (u32, u32),
    },
}

/// Errors surfaced to the rendering pipeline, tagged with layer and effect
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvokeError {
    /// A layer references an effect id that is not registered
    #[error("layer `{layer}` references unknown effect `{effect_id}`")]
    Configuration { layer: String, effect_id: String },

    /// The effect rejected one of the layer's parameters
    #[error("layer `{layer}` effect `{effect_id}`: invalid parameter `{name}`: {reason}")]
    EffectParameter {
        layer: String,
        effect_id: String,
        name: String,
        reason: String,
    },

    /// The effect could not be applied
    #[error("layer `{layer}` effect `{effect_id}` failed: {cause}")]
    EffectApplication {
        layer: String,
        effect_id: String,
        cause: ApplicationFailure,
    },
}

impl InvokeError {
    /// Name of the layer that failed
    pub fn layer(&self) -> &str {
        match self {
            InvokeError::Configuration { layer, .. }
            | InvokeError::EffectParameter { layer, .. }
            | InvokeError::EffectApplication { layer, .. } => layer,
        }
    }

    /// Effect id bound to the failing layer
    pub fn effect_id(&self) -> &str {
        match self {
            InvokeError::Configuration { effect_id, .. }
            | InvokeError::EffectParameter { effect_id, .. }
            | InvokeError::EffectApplication { effect_id, .. } => effect_id,
        }
    }

    /// Whether the failure is a configuration problem rather than a per-render one
    pub fn is_configuration(&self) -> bool {
        matches!(self, InvokeError::Configuration { .. })
    }
}
