//! Layer effect settings
//!
//! Reads the effect bindings out of a tile server configuration document.
//! Only the `layers` table is inspected; every other key, and every layer
//! key besides the effect, belongs to other parts of the server.
//!
//! ```json
//! {
//!     "layers": {
//!         "roads": { "pixel effect": { "name": "desaturate", "factor": 0.85 } },
//!         "labels": {}
//!     }
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::effects::{LayerDescriptor, LayerEffectBinding};

/// Errors while loading layer settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid settings document: {0}")]
    Parse(#[from] serde_json::Error),

    /// A layer carries the effect under both accepted keys
    #[error("layer `{layer}` sets both `pixel effect` and `effect`")]
    ConflictingEffectKeys { layer: String },

    #[error("layer `{layer}` has an invalid effect binding: {source}")]
    Binding {
        layer: String,
        source: serde_json::Error,
    },
}

const EFFECT_KEY: &str = "pixel effect";
const EFFECT_ALIAS: &str = "effect";

#[derive(Debug, Deserialize)]
struct SettingsDocument {
    #[serde(default)]
    layers: BTreeMap<String, Map<String, Value>>,
}

fn layer_binding(layer: &str, mut settings: Map<String, Value>) -> Result<LayerEffectBinding, SettingsError> {
    let value = match (settings.remove(EFFECT_KEY), settings.remove(EFFECT_ALIAS)) {
        (Some(_), Some(_)) => {
            return Err(SettingsError::ConflictingEffectKeys {
                layer: layer.to_string(),
            })
        }
        (Some(value), None) | (None, Some(value)) => value,
        (None, None) => return Ok(LayerEffectBinding::none()),
    };
    serde_json::from_value(value).map_err(|source| SettingsError::Binding {
        layer: layer.to_string(),
        source,
    })
}

/// Parse layer descriptors from a configuration document, in name order
pub fn load_layers(json: &str) -> Result<Vec<LayerDescriptor>, SettingsError> {
    let document: SettingsDocument = serde_json::from_str(json)?;
    let layers = document
        .layers
        .into_iter()
        .map(|(name, settings)| {
            let effect = layer_binding(&name, settings)?;
            Ok(LayerDescriptor::new(name).with_effect(effect))
        })
        .collect::<Result<Vec<_>, SettingsError>>()?;

    tracing::debug!(
        layers = layers.len(),
        with_effects = layers.iter().filter(|l| l.effect.is_bound()).count(),
        "Loaded layer effect settings"
    );
    Ok(layers)
}

/// Read and parse a configuration file
pub fn load_layers_from_path(path: impl AsRef<Path>) -> Result<Vec<LayerDescriptor>, SettingsError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    tracing::info!(path = %path.display(), "Reading layer settings");
    load_layers(&contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::EffectParameters;

    const CONFIG: &str = r#"{
        "cache": { "name": "Disk", "path": "/tmp/stache" },
        "layers": {
            "roads": {
                "provider": { "name": "mapnik", "mapfile": "roads.xml" },
                "pixel effect": { "name": "desaturate", "factor": 0.85 }
            },
            "water": { "effect": { "name": "blur", "radius": 5 } },
            "labels": { "provider": { "name": "mapnik", "mapfile": "labels.xml" } }
        }
    }"#;

    #[test]
    fn test_load_layers() {
        let layers = load_layers(CONFIG).unwrap();
        let names: Vec<&str> = layers.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["labels", "roads", "water"]);

        assert!(!layers[0].effect.is_bound());
        assert_eq!(
            layers[1].effect,
            LayerEffectBinding::new("desaturate", EffectParameters::new().with("factor", 0.85))
        );
        assert_eq!(layers[2].effect.effect_id(), Some("blur"));
        assert_eq!(layers[2].effect.parameters().integer("radius").unwrap(), Some(5));
    }

    #[test]
    fn test_load_layers_without_layers_table() {
        assert!(load_layers("{}").unwrap().is_empty());
    }

    #[test]
    fn test_load_layers_rejects_malformed_json() {
        assert!(matches!(
            load_layers("{ \"layers\": [").unwrap_err(),
            SettingsError::Parse(_)
        ));
    }

    #[test]
    fn test_load_layers_rejects_both_effect_keys() {
        let json = r#"{
            "layers": {
                "roads": {},
                "water": {
                    "pixel effect": { "name": "blur" },
                    "effect": { "name": "desaturate" }
                }
            }
        }"#;
        let err = load_layers(json).unwrap_err();
        assert!(matches!(
            &err,
            SettingsError::ConflictingEffectKeys { layer } if layer == "water"
        ));
        assert_eq!(
            err.to_string(),
            "layer `water` sets both `pixel effect` and `effect`"
        );
    }

    #[test]
    fn test_load_layers_names_layer_with_bad_binding() {
        let json = r#"{ "layers": { "roads": { "pixel effect": [1, 2] } } }"#;
        let err = load_layers(json).unwrap_err();
        assert!(matches!(&err, SettingsError::Binding { layer, .. } if layer == "roads"));
        assert!(err.to_string().starts_with("layer `roads` has an invalid effect binding"));
    }

    #[test]
    fn test_load_layers_from_missing_path() {
        assert!(matches!(
            load_layers_from_path("/nonexistent/tile-effects.json").unwrap_err(),
            SettingsError::Io(_)
        ));
    }
}
