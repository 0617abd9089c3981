//! Effect configuration data types
//!
//! Serializable per-layer bindings. They carry no behaviour; the invoker
//! resolves them against the registry at render time.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::EffectError;

/// A parameter value as written in layer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<ParameterValue>),
}

impl ParameterValue {
    /// Short name of the value's type, for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            ParameterValue::Bool(_) => "boolean",
            ParameterValue::Int(_) => "integer",
            ParameterValue::Float(_) => "number",
            ParameterValue::String(_) => "string",
            ParameterValue::List(_) => "list",
        }
    }
}

impl From<bool> for ParameterValue {
    fn from(v: bool) -> Self {
        ParameterValue::Bool(v)
    }
}

impl From<i64> for ParameterValue {
    fn from(v: i64) -> Self {
        ParameterValue::Int(v)
    }
}

impl From<i32> for ParameterValue {
    fn from(v: i32) -> Self {
        ParameterValue::Int(i64::from(v))
    }
}

impl From<f64> for ParameterValue {
    fn from(v: f64) -> Self {
        ParameterValue::Float(v)
    }
}

impl From<&str> for ParameterValue {
    fn from(v: &str) -> Self {
        ParameterValue::String(v.to_string())
    }
}

impl From<String> for ParameterValue {
    fn from(v: String) -> Self {
        ParameterValue::String(v)
    }
}

/// Parameter mapping handed to an effect.
///
/// Opaque to the framework. The typed getters return `Ok(None)` for a
/// missing key and [`EffectError::Parameter`] for a value of the wrong type,
/// so effects can validate with `?`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EffectParameters(BTreeMap<String, ParameterValue>);

impl EffectParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParameterValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ParameterValue>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&ParameterValue> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parameters in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParameterValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Integer or float parameter
    pub fn number(&self, name: &str) -> Result<Option<f64>, EffectError> {
        match self.get(name) {
            None => Ok(None),
            Some(ParameterValue::Int(v)) => Ok(Some(*v as f64)),
            Some(ParameterValue::Float(v)) => Ok(Some(*v)),
            Some(other) => Err(mismatch(name, "number", other)),
        }
    }

    /// Number parameter with a fallback when absent
    pub fn number_or(&self, name: &str, default: f64) -> Result<f64, EffectError> {
        Ok(self.number(name)?.unwrap_or(default))
    }

    pub fn integer(&self, name: &str) -> Result<Option<i64>, EffectError> {
        match self.get(name) {
            None => Ok(None),
            Some(ParameterValue::Int(v)) => Ok(Some(*v)),
            Some(other) => Err(mismatch(name, "integer", other)),
        }
    }

    /// Integer parameter in `0..=255`, e.g. a sample level
    pub fn u8_value(&self, name: &str) -> Result<Option<u8>, EffectError> {
        match self.integer(name)? {
            None => Ok(None),
            Some(v) => u8::try_from(v)
                .map(Some)
                .map_err(|_| EffectError::parameter(name, format!("{v} is outside 0..=255"))),
        }
    }

    pub fn boolean(&self, name: &str) -> Result<Option<bool>, EffectError> {
        match self.get(name) {
            None => Ok(None),
            Some(ParameterValue::Bool(v)) => Ok(Some(*v)),
            Some(other) => Err(mismatch(name, "boolean", other)),
        }
    }

    pub fn string(&self, name: &str) -> Result<Option<&str>, EffectError> {
        match self.get(name) {
            None => Ok(None),
            Some(ParameterValue::String(v)) => Ok(Some(v.as_str())),
            Some(other) => Err(mismatch(name, "string", other)),
        }
    }

    pub fn list(&self, name: &str) -> Result<Option<&[ParameterValue]>, EffectError> {
        match self.get(name) {
            None => Ok(None),
            Some(ParameterValue::List(v)) => Ok(Some(v.as_slice())),
            Some(other) => Err(mismatch(name, "list", other)),
        }
    }
}

fn mismatch(name: &str, expected: &str, found: &ParameterValue) -> EffectError {
    EffectError::parameter(name, format!("expected {expected}, found {}", found.type_name()))
}

impl FromIterator<(String, ParameterValue)> for EffectParameters {
    fn from_iter<I: IntoIterator<Item = (String, ParameterValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Configuration shape of a binding: `name` is the effect id, every other
/// key is a parameter
#[derive(Serialize, Deserialize)]
struct BindingHelper {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(flatten)]
    parameters: EffectParameters,
}

/// A layer's optional effect and its parameters.
///
/// A binding without an effect id carries no parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BindingHelper", into = "BindingHelper")]
pub struct LayerEffectBinding {
    effect_id: Option<String>,
    parameters: EffectParameters,
}

impl From<BindingHelper> for LayerEffectBinding {
    fn from(helper: BindingHelper) -> Self {
        match helper.name {
            Some(effect_id) => LayerEffectBinding::new(effect_id, helper.parameters),
            None => LayerEffectBinding::none(),
        }
    }
}

impl From<LayerEffectBinding> for BindingHelper {
    fn from(binding: LayerEffectBinding) -> Self {
        BindingHelper {
            name: binding.effect_id,
            parameters: binding.parameters,
        }
    }
}

impl LayerEffectBinding {
    /// Binding with no effect
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new(effect_id: impl Into<String>, parameters: EffectParameters) -> Self {
        Self {
            effect_id: Some(effect_id.into()),
            parameters,
        }
    }

    pub fn effect_id(&self) -> Option<&str> {
        self.effect_id.as_deref()
    }

    pub fn parameters(&self) -> &EffectParameters {
        &self.parameters
    }

    /// Whether an effect is bound
    pub fn is_bound(&self) -> bool {
        self.effect_id.is_some()
    }
}

/// The slice of a layer's runtime descriptor this crate reads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerDescriptor {
    /// Layer name, used to tag diagnostics
    pub name: String,
    #[serde(default, skip_serializing_if = "is_unbound")]
    pub effect: LayerEffectBinding,
}

fn is_unbound(binding: &LayerEffectBinding) -> bool {
    !binding.is_bound()
}

impl LayerDescriptor {
    /// Layer without an effect
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            effect: LayerEffectBinding::none(),
        }
    }

    pub fn with_effect(mut self, effect: LayerEffectBinding) -> Self {
        self.effect = effect;
        self
    }
}
