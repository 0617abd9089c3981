//! Pixel effects for rendered layers
//!
//! # Architecture
//!
//! Configuration data is kept apart from behaviour:
//!
//! - **Data types** (`types.rs`): serializable `LayerEffectBinding`,
//!   `EffectParameters` and `LayerDescriptor`, attached to layers by the
//!   configuration loader
//! - **Traits** (`traits.rs`): the `PixelEffect` contract and `EffectFactory`
//! - **Registry** (`registry.rs`): effect ids to factories, populated at
//!   startup and read-only afterwards
//! - **Invoker** (`invoker.rs`): resolves a layer's binding, negotiates the
//!   pixel mode and applies the effect
//!
//! # Usage
//!
//! ```ignore
//! let mut registry = EffectRegistry::new();
//! registry.register("threshold", || -> Box<dyn PixelEffect> { Box::new(Threshold) })?;
//! let invoker = EffectInvoker::new(install_registry(registry)?);
//!
//! invoker.validate(&layers)?;
//! let tile = invoker.process(&layers[0], rendered)?;
//! ```

mod invoker;
mod registry;
mod traits;
mod types;

pub use invoker::*;
pub use registry::*;
pub use traits::*;
pub use types::*;
