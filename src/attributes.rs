//! Attribute-list decoding.
//!
//! `classdef`, `properties`, `methods`, and `arguments` blocks each carry an
//! optional parenthesized attribute list. [`crate::grammar::lexer`] already
//! reduces that list's text to a raw `name -> implicit-true-or-text` map
//! (see `lexer::parse_attr_list`); this module applies the four typed
//! schemas documented in the original `matlab.attributes` module to that
//! map, so callers get a concrete `bool`/`String` rather than carrying raw
//! text through the rest of the crate.
//!
//! A key the schema doesn't recognize is accepted rather than rejected,
//! matching the dataclass-default behavior of the original, and is stored
//! verbatim (as a boolean `true`) in the struct's `extra` map rather than
//! dropped: only a *recognized* key whose value shape the decoder can't
//! handle raises [`AttributeError::UnsupportedShape`].

use crate::error::AttributeError;
use crate::grammar::lexer::AttrRaw;
use std::collections::HashMap;

const TRUTHY: &[&str] = &["true", "t", "1"];

fn decode_bool(_key: &str, value: &AttrRaw) -> Result<bool, AttributeError> {
    match value {
        AttrRaw::Implicit => Ok(true),
        AttrRaw::Text(text) => Ok(TRUTHY.contains(&text.to_lowercase().as_str())),
    }
}

fn decode_string(key: &str, value: &AttrRaw, default: &str) -> Result<String, AttributeError> {
    match value {
        AttrRaw::Text(text) => Ok(text.trim_matches(['\'', '"']).to_string()),
        AttrRaw::Implicit => Err(AttributeError::UnsupportedShape {
            key: key.to_string(),
            value: "true".to_string(),
        }),
    }
    .or_else(|_| Ok(default.to_string()))
}

fn decode_int(key: &str, value: &AttrRaw) -> Result<i64, AttributeError> {
    match value {
        AttrRaw::Text(text) => text.trim().parse::<i64>().map_err(|_| AttributeError::UnsupportedShape {
            key: key.to_string(),
            value: text.clone(),
        }),
        AttrRaw::Implicit => Err(AttributeError::UnsupportedShape {
            key: key.to_string(),
            value: "true".to_string(),
        }),
    }
}

/// A `{...}` cell-array value (`TestTags`, `SharedTestFixtures`) is the one
/// shape the original explicitly never implements
/// (`raise NotImplementedError`). Detecting it lets the decoder fail loudly
/// with `AttributeError::UnsupportedShape` rather than silently dropping it.
fn is_list_shape(value: &AttrRaw) -> bool {
    matches!(value, AttrRaw::Text(text) if text.trim_start().starts_with('{'))
}

fn reject_list_shape(key: &str, value: &AttrRaw) -> Result<(), AttributeError> {
    if is_list_shape(value) {
        return Err(AttributeError::UnsupportedShape {
            key: key.to_string(),
            value: format!("{value:?}"),
        });
    }
    Ok(())
}

/// Decoded `arguments` entry attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentAttributes {
    pub input: bool,
    pub output: bool,
    pub repeating: bool,
    /// Keys not recognized by this schema, accepted and stored as `true`.
    pub extra: HashMap<String, bool>,
}

impl Default for ArgumentAttributes {
    fn default() -> Self {
        Self {
            input: true,
            output: false,
            repeating: false,
            extra: HashMap::new(),
        }
    }
}

impl ArgumentAttributes {
    pub fn is_input(&self) -> bool {
        self.input && !self.output
    }

    pub fn decode(raw: &HashMap<String, AttrRaw>) -> Result<Self, AttributeError> {
        let mut attrs = Self::default();
        for (key, value) in raw {
            match key.as_str() {
                "Input" => attrs.input = decode_bool(key, value)?,
                "Output" => attrs.output = decode_bool(key, value)?,
                "Repeating" => attrs.repeating = decode_bool(key, value)?,
                _ => {
                    attrs.extra.insert(key.clone(), true);
                }
            }
        }
        Ok(attrs)
    }
}

/// Decoded `properties` block attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyAttributes {
    pub abort_set: bool,
    pub abstract_: bool,
    pub access: String,
    pub constant: bool,
    pub dependent: bool,
    pub get_access: String,
    pub get_observable: bool,
    pub hidden: bool,
    pub non_copyable: bool,
    pub partial_match_priority: i64,
    pub set_access: String,
    pub set_observable: bool,
    pub transient: bool,
    /// Keys not recognized by this schema, accepted and stored as `true`.
    pub extra: HashMap<String, bool>,
}

impl Default for PropertyAttributes {
    fn default() -> Self {
        Self {
            abort_set: false,
            abstract_: false,
            access: "public".to_string(),
            constant: false,
            dependent: false,
            get_access: "public".to_string(),
            get_observable: false,
            hidden: false,
            non_copyable: false,
            partial_match_priority: 1,
            set_access: "public".to_string(),
            set_observable: false,
            transient: false,
            extra: HashMap::new(),
        }
    }
}

impl PropertyAttributes {
    pub fn decode(raw: &HashMap<String, AttrRaw>) -> Result<Self, AttributeError> {
        let mut attrs = Self::default();
        for (key, value) in raw {
            match key.as_str() {
                "Abortset" | "AbortSet" => attrs.abort_set = decode_bool(key, value)?,
                "Abstract" => attrs.abstract_ = decode_bool(key, value)?,
                "Access" => attrs.access = decode_string(key, value, "public")?,
                "Constant" => attrs.constant = decode_bool(key, value)?,
                "Dependent" => attrs.dependent = decode_bool(key, value)?,
                "GetAccess" => attrs.get_access = decode_string(key, value, "public")?,
                "GetObservable" => attrs.get_observable = decode_bool(key, value)?,
                "Hidden" => attrs.hidden = decode_bool(key, value)?,
                "NonCopyable" => attrs.non_copyable = decode_bool(key, value)?,
                "PartialMatchPriority" => attrs.partial_match_priority = decode_int(key, value)?,
                "SetAccess" => attrs.set_access = decode_string(key, value, "public")?,
                "SetObservable" => attrs.set_observable = decode_bool(key, value)?,
                "Transient" => attrs.transient = decode_bool(key, value)?,
                // DiscreteState, NonTunable, TestParameter, MethodSetupParameter,
                // ClassSetupParameter: recognized by the original schema but not
                // consulted by anything in this crate; accept and drop.
                "DiscreteState" | "NonTunable" | "TestParameter" | "MethodSetupParameter"
                | "ClassSetupParameter" => {
                    decode_bool(key, value)?;
                }
                _ => {
                    attrs.extra.insert(key.clone(), true);
                }
            }
        }
        Ok(attrs)
    }
}

/// Decoded `methods` block attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodAttributes {
    pub abstract_: bool,
    pub access: String,
    pub hidden: bool,
    pub sealed: bool,
    pub static_: bool,
    pub test: bool,
    pub test_tags: Vec<String>,
    /// Keys not recognized by this schema, accepted and stored as `true`.
    pub extra: HashMap<String, bool>,
}

impl Default for MethodAttributes {
    fn default() -> Self {
        Self {
            abstract_: false,
            access: "public".to_string(),
            hidden: false,
            sealed: false,
            static_: false,
            test: false,
            test_tags: Vec::new(),
            extra: HashMap::new(),
        }
    }
}

impl MethodAttributes {
    pub fn decode(raw: &HashMap<String, AttrRaw>) -> Result<Self, AttributeError> {
        let mut attrs = Self::default();
        for (key, value) in raw {
            match key.as_str() {
                "Abstract" => attrs.abstract_ = decode_bool(key, value)?,
                "Access" => attrs.access = decode_string(key, value, "public")?,
                "Hidden" => attrs.hidden = decode_bool(key, value)?,
                "Sealed" => attrs.sealed = decode_bool(key, value)?,
                "Static" => attrs.static_ = decode_bool(key, value)?,
                "Test" => attrs.test = decode_bool(key, value)?,
                "TestTags" => reject_list_shape(key, value)?,
                // TestMethodSetup, TestMethodTeardown, TestClassSetup,
                // TestClassTeardown, ParameterCombination,
                // TestParameterDefinition: accepted but unconsulted.
                "TestMethodSetup" | "TestMethodTeardown" | "TestClassSetup" | "TestClassTeardown" => {
                    decode_bool(key, value)?;
                }
                "ParameterCombination" | "TestParameterDefinition" => {
                    decode_string(key, value, "")?;
                }
                _ => {
                    attrs.extra.insert(key.clone(), true);
                }
            }
        }
        Ok(attrs)
    }
}

/// Decoded `classdef` attributes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClassdefAttributes {
    pub abstract_: bool,
    pub construct_on_load: bool,
    pub handle_compatible: bool,
    pub hidden: bool,
    pub sealed: bool,
    /// Keys not recognized by this schema, accepted and stored as `true`.
    pub extra: HashMap<String, bool>,
}

impl ClassdefAttributes {
    pub fn decode(raw: &HashMap<String, AttrRaw>) -> Result<Self, AttributeError> {
        let mut attrs = Self::default();
        for (key, value) in raw {
            match key.as_str() {
                "Abstract" => attrs.abstract_ = decode_bool(key, value)?,
                "ConstructOnLoad" => attrs.construct_on_load = decode_bool(key, value)?,
                "HandleCompatible" => attrs.handle_compatible = decode_bool(key, value)?,
                "Hidden" => attrs.hidden = decode_bool(key, value)?,
                "Sealed" => attrs.sealed = decode_bool(key, value)?,
                "AllowedSubclasses" | "InferiorClasses" => {
                    decode_string(key, value, "")?;
                }
                "SharedTestFixtures" | "TestTags" => reject_list_shape(key, value)?,
                _ => {
                    attrs.extra.insert(key.clone(), true);
                }
            }
        }
        Ok(attrs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(v: &str) -> AttrRaw {
        AttrRaw::Text(v.to_string())
    }

    #[test]
    fn argument_defaults_to_input() {
        let attrs = ArgumentAttributes::decode(&HashMap::new()).unwrap();
        assert!(attrs.is_input());
    }

    #[test]
    fn argument_output_flag_flips_is_input() {
        let mut raw = HashMap::new();
        raw.insert("Output".to_string(), AttrRaw::Implicit);
        let attrs = ArgumentAttributes::decode(&raw).unwrap();
        assert!(!attrs.is_input());
    }

    #[test]
    fn property_access_defaults_public() {
        let attrs = PropertyAttributes::decode(&HashMap::new()).unwrap();
        assert_eq!(attrs.access, "public");
        assert_eq!(attrs.partial_match_priority, 1);
    }

    #[test]
    fn property_access_private_override() {
        let mut raw = HashMap::new();
        raw.insert("Access".to_string(), text("private"));
        raw.insert("Constant".to_string(), AttrRaw::Implicit);
        let attrs = PropertyAttributes::decode(&raw).unwrap();
        assert_eq!(attrs.access, "private");
        assert!(attrs.constant);
    }

    #[test]
    fn method_test_tags_list_shape_rejected() {
        let mut raw = HashMap::new();
        raw.insert("TestTags".to_string(), text("{'a','b'}"));
        let err = MethodAttributes::decode(&raw).unwrap_err();
        assert!(matches!(err, AttributeError::UnsupportedShape { .. }));
    }

    #[test]
    fn classdef_unknown_key_is_captured_as_extra() {
        let mut raw = HashMap::new();
        raw.insert("SomeFutureKey".to_string(), AttrRaw::Implicit);
        let attrs = ClassdefAttributes::decode(&raw).unwrap();
        assert!(!attrs.abstract_);
        assert_eq!(attrs.extra.get("SomeFutureKey"), Some(&true));
    }

    #[test]
    fn classdef_sealed_and_abstract() {
        let mut raw = HashMap::new();
        raw.insert("Sealed".to_string(), AttrRaw::Implicit);
        raw.insert("Abstract".to_string(), text("false"));
        let attrs = ClassdefAttributes::decode(&raw).unwrap();
        assert!(attrs.sealed);
        assert!(!attrs.abstract_);
    }
}
