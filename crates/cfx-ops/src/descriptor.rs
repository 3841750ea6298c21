//! Filter and action descriptors: the serialized request vocabulary.
//!
//! A [`FilterDescriptor`] is what callers write: a catalog `method`, an
//! opacity, free-form parameters, and an `actions` list that starts empty.
//! The catalog fills `actions` the first time the descriptor is seen and
//! skips it afterwards, so a descriptor reused across frames is only
//! expanded once.
//!
//! ```rust
//! use cfx_ops::FilterDescriptor;
//!
//! let f: FilterDescriptor =
//!     serde_json::from_str(r#"{"method":"brightness","level":"150%","opacity":"50%"}"#).unwrap();
//! assert_eq!(f.method, "brightness");
//! assert_eq!(f.opacity.get(), 0.5);
//! assert!(f.params.contains_key("level"));
//! assert!(f.actions.is_empty());
//! ```

use cfx_core::Fraction;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::actions::Action;

fn is_false(b: &bool) -> bool {
    !*b
}

/// One user-facing filter request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterDescriptor {
    /// Catalog key.
    pub method: String,
    /// Strength, 0..1; also accepts `"NN%"`.
    #[serde(default)]
    pub opacity: Fraction,
    /// Input line for the first produced action.
    #[serde(default, alias = "in", skip_serializing_if = "Option::is_none")]
    pub line_in: Option<String>,
    /// Interim name the last produced action caches its output under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_out: Option<String>,
    /// Inverted blend for the last produced action.
    #[serde(default, skip_serializing_if = "is_false")]
    pub out: bool,
    /// Expanded actions; filled once by the catalog.
    #[serde(default)]
    pub actions: Vec<ActionDescriptor>,
    /// Method-specific parameters.
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

impl FilterDescriptor {
    /// Descriptor for `method` at full opacity with no parameters.
    pub fn new(method: impl Into<String>) -> Self {
        Self { method: method.into(), ..Default::default() }
    }

    /// Sets a parameter.
    pub fn with_param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    /// Sets the opacity.
    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = Fraction(opacity);
        self
    }

    /// True once the catalog has expanded this descriptor.
    pub fn is_preprocessed(&self) -> bool {
        !self.actions.is_empty()
    }
}

/// One primitive action plus its routing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDescriptor {
    /// The operation and its parameters.
    #[serde(flatten)]
    pub action: Action,
    /// Blend strength, 0..1.
    #[serde(default)]
    pub opacity: Fraction,
    /// `"source"`, `"source-alpha"`, an interim name, or `None` for work.
    #[serde(default, alias = "in", skip_serializing_if = "Option::is_none")]
    pub line_in: Option<String>,
    /// Cache the output under this name instead of blending into work.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_out: Option<String>,
    /// Output becomes the base, work the overlay at `1 - opacity`, and the
    /// result replaces work.
    #[serde(default, skip_serializing_if = "is_false")]
    pub out: bool,
}

impl ActionDescriptor {
    /// Wraps an action at full opacity reading from work.
    pub fn new(action: Action) -> Self {
        Self { action, opacity: Fraction::ONE, line_in: None, line_out: None, out: false }
    }

    /// Sets the opacity.
    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = Fraction(opacity);
        self
    }

    /// Sets the input line.
    pub fn with_line_in(mut self, name: &str) -> Self {
        self.line_in = Some(name.to_string());
        self
    }

    /// Sets the output line.
    pub fn with_line_out(mut self, name: &str) -> Self {
        self.line_out = Some(name.to_string());
        self
    }

    /// Sets the inverted-blend flag.
    pub fn with_out(mut self, out: bool) -> Self {
        self.out = out;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{Brightness, Grayscale};

    #[test]
    fn test_action_descriptor_roundtrip_keeps_routing() {
        let json = r#"{"action":"grayscale","opacity":0.5,"in":"source","lineOut":"g"}"#;
        let a: ActionDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(a.action, Action::Grayscale(Grayscale {}));
        assert_eq!(a.line_in.as_deref(), Some("source"));
        assert_eq!(a.line_out.as_deref(), Some("g"));
        let back = serde_json::to_value(&a).unwrap();
        assert_eq!(back["action"], "grayscale");
        assert_eq!(back["lineIn"], "source");
        assert!(back.get("out").is_none());
    }

    #[test]
    fn test_action_params_accept_percent() {
        let a: ActionDescriptor =
            serde_json::from_str(r#"{"action":"brightness","level":"40%","opacity":"25%"}"#).unwrap();
        match a.action {
            Action::Brightness(Brightness { level, .. }) => assert_eq!(level.get(), 0.4),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(a.opacity.get(), 0.25);
    }

    #[test]
    fn test_unknown_action_fails_to_parse() {
        let r: Result<ActionDescriptor, _> = serde_json::from_str(r#"{"action":"melt"}"#);
        assert!(r.is_err());
    }

    #[test]
    fn test_filter_descriptor_collects_params() {
        let f: FilterDescriptor =
            serde_json::from_str(r#"{"method":"threshold","level":100,"low":[1,2,3],"actions":[]}"#).unwrap();
        assert_eq!(f.opacity, Fraction::ONE);
        assert_eq!(f.params.len(), 2);
        assert!(!f.is_preprocessed());
    }
}
