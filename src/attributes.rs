//! Attribute metadata for sample records.
//!
//! Every named property a record may carry is described by an [`Attribute`]:
//! its value type and whether it is a durable *output* attribute (survives
//! past the run that produced it) or a transient intermediate. The
//! process-wide [`AttributeRegistry`] collects these descriptions and is
//! consulted by the record views and by the propagation scheduler's
//! end-of-run purge.
//!
//! Registry lookups are deliberately forgiving: an unregistered attribute
//! name falls back to string semantics and non-output status. A miss is
//! never fatal.
//!
//! # Examples
//!
//! ```
//! use coreflow::attributes::{AttrType, AttrValue, Attribute, AttributeRegistry};
//!
//! let mut registry = AttributeRegistry::default();
//! registry.register(Attribute::new("age", AttrType::Float, true));
//!
//! assert!(registry.is_output("age"));
//! assert!(!registry.is_output("scratch")); // unregistered -> transient
//! assert_eq!(
//!     registry.format_value("age", Some(&AttrValue::Float(1234.5))),
//!     "1234.50",
//! );
//! ```

use miette::Diagnostic;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Name of the position attribute every input layer carries.
pub const DEPTH_ATTRIBUTE: &str = "depth";

/// Synthetic attribute name that reads back a view's run identifier.
pub const PLAN_ATTRIBUTE: &str = "computation plan";

/// Attribute names that are always registered and can never be removed.
pub const BASE_ATTRIBUTES: [&str; 2] = [DEPTH_ATTRIBUTE, PLAN_ATTRIBUTE];

/// Value type of an attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttrType {
    String,
    Integer,
    Float,
    Boolean,
}

impl AttrType {
    /// Parse a user-visible type name (case-insensitive).
    pub fn parse(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("string") {
            Some(Self::String)
        } else if name.eq_ignore_ascii_case("integer") {
            Some(Self::Integer)
        } else if name.eq_ignore_ascii_case("float") {
            Some(Self::Float)
        } else if name.eq_ignore_ascii_case("boolean") {
            Some(Self::Boolean)
        } else {
            None
        }
    }
}

impl fmt::Display for AttrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Integer => write!(f, "integer"),
            Self::Float => write!(f, "float"),
            Self::Boolean => write!(f, "boolean"),
        }
    }
}

/// A typed attribute value stored in a record layer.
///
/// Equality and hashing are *total*: floats compare by bit pattern, so
/// values can key reference tables and participate in work-item identity.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

impl PartialEq for AttrValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for AttrValue {}

impl std::hash::Hash for AttrValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::String(s) => s.hash(state),
            Self::Integer(i) => i.hash(state),
            Self::Float(f) => f.to_bits().hash(state),
            Self::Boolean(b) => b.hash(state),
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Boolean(b) => write!(f, "{b}"),
        }
    }
}

impl AttrValue {
    /// The type this value naturally belongs to.
    pub fn attr_type(&self) -> AttrType {
        match self {
            Self::String(_) => AttrType::String,
            Self::Integer(_) => AttrType::Integer,
            Self::Float(_) => AttrType::Float,
            Self::Boolean(_) => AttrType::Boolean,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric reading of the value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for AttrValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<f64> for AttrValue {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

/// Textual input could not be parsed as the attribute's declared type.
#[derive(Debug, Error, Diagnostic)]
#[error("cannot parse {value:?} as {ty}")]
#[diagnostic(
    code(coreflow::attributes::parse),
    help("check the attribute's declared type against the incoming data")
)]
pub struct ValueParseError {
    pub value: String,
    pub ty: AttrType,
}

/// Errors from registry maintenance. Lookups never produce these.
#[derive(Debug, Error, Diagnostic)]
pub enum RegistryError {
    /// The base attributes are part of the record model and stay registered.
    #[error("attribute {name:?} is reserved and cannot be removed")]
    #[diagnostic(code(coreflow::attributes::reserved))]
    Reserved { name: String },

    #[error("attribute {name:?} is not registered")]
    #[diagnostic(code(coreflow::attributes::unknown))]
    Unknown { name: String },
}

/// Truthiness of textual input: empty means "no value", otherwise the first
/// character decides (p/y/s/t/1 are true).
pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    let first = raw.chars().next()?;
    Some("pyst1".contains(first.to_ascii_lowercase()))
}

/// Metadata for one named record property.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub ty: AttrType,
    /// Output attributes survive the end-of-run purge; everything else is a
    /// transient intermediate.
    pub output: bool,
}

impl Attribute {
    pub fn new(name: impl Into<String>, ty: AttrType, output: bool) -> Self {
        Self {
            name: name.into(),
            ty,
            output,
        }
    }

    /// Convert textual input to a typed value.
    ///
    /// `Ok(None)` means the input carried no value (an empty boolean field).
    /// Parse failures are errors; they are the caller's to re-raise, unlike
    /// registry misses.
    pub fn convert_value(&self, raw: &str) -> Result<Option<AttrValue>, ValueParseError> {
        let err = || ValueParseError {
            value: raw.to_owned(),
            ty: self.ty,
        };
        Ok(match self.ty {
            AttrType::String => Some(AttrValue::String(raw.to_owned())),
            AttrType::Integer => Some(AttrValue::Integer(
                raw.trim().parse::<i64>().map_err(|_| err())?,
            )),
            AttrType::Float => Some(AttrValue::Float(
                raw.trim().parse::<f64>().map_err(|_| err())?,
            )),
            AttrType::Boolean => parse_bool(raw).map(AttrValue::Boolean),
        })
    }

    /// Format a value for user visibility: absent values render as `N/A`,
    /// floats with two decimals, everything else naturally.
    pub fn format_value(&self, value: Option<&AttrValue>) -> String {
        match value {
            None => "N/A".to_owned(),
            Some(AttrValue::Float(f)) if self.ty == AttrType::Float => format!("{f:.2}"),
            Some(v) => v.to_string(),
        }
    }
}

/// Process-wide registry of attribute metadata.
///
/// Keeps a display ordering alongside the lookup map: the base attributes
/// first, then every other registered name sorted. [`Default`] yields a
/// registry with the base attributes already present.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AttributeRegistry {
    attributes: FxHashMap<String, Attribute>,
    sorted_keys: Vec<String>,
}

impl Default for AttributeRegistry {
    fn default() -> Self {
        let mut registry = Self {
            attributes: FxHashMap::default(),
            sorted_keys: BASE_ATTRIBUTES.iter().map(|s| (*s).to_owned()).collect(),
        };
        registry.attributes.insert(
            DEPTH_ATTRIBUTE.to_owned(),
            Attribute::new(DEPTH_ATTRIBUTE, AttrType::Float, false),
        );
        registry.attributes.insert(
            PLAN_ATTRIBUTE.to_owned(),
            Attribute::new(PLAN_ATTRIBUTE, AttrType::String, false),
        );
        registry
    }
}

impl AttributeRegistry {
    /// Register (or redefine) an attribute.
    pub fn register(&mut self, attribute: Attribute) {
        if !self.attributes.contains_key(&attribute.name)
            && !BASE_ATTRIBUTES.contains(&attribute.name.as_str())
        {
            // Base attributes stay out of the sorted region.
            let base = BASE_ATTRIBUTES.len();
            let pos = self.sorted_keys[base..]
                .partition_point(|k| k.as_str() < attribute.name.as_str());
            self.sorted_keys.insert(base + pos, attribute.name.clone());
        }
        self.attributes.insert(attribute.name.clone(), attribute);
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Remove a registered attribute. The base attributes are reserved.
    pub fn remove(&mut self, name: &str) -> Result<Attribute, RegistryError> {
        if BASE_ATTRIBUTES.contains(&name) {
            return Err(RegistryError::Reserved {
                name: name.to_owned(),
            });
        }
        let attribute = self
            .attributes
            .remove(name)
            .ok_or_else(|| RegistryError::Unknown {
                name: name.to_owned(),
            })?;
        self.sorted_keys.retain(|k| k != name);
        Ok(attribute)
    }

    /// Whether the named attribute survives the end-of-run purge.
    /// Unregistered names are treated as transient.
    pub fn is_output(&self, name: &str) -> bool {
        self.attributes.get(name).map(|a| a.output).unwrap_or(false)
    }

    /// Convert textual input through the named attribute's type, falling
    /// back to string semantics when the name is unregistered.
    pub fn convert_value(
        &self,
        name: &str,
        raw: &str,
    ) -> Result<Option<AttrValue>, ValueParseError> {
        match self.attributes.get(name) {
            Some(attribute) => attribute.convert_value(raw),
            None => Ok(Some(AttrValue::String(raw.to_owned()))),
        }
    }

    /// Format a value through the named attribute, falling back to string
    /// semantics when the name is unregistered.
    pub fn format_value(&self, name: &str, value: Option<&AttrValue>) -> String {
        match self.attributes.get(name) {
            Some(attribute) => attribute.format_value(value),
            None => match value {
                None => "N/A".to_owned(),
                Some(v) => v.to_string(),
            },
        }
    }

    /// Attributes in display order: base attributes first, the rest sorted.
    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.sorted_keys
            .iter()
            .filter_map(|k| self.attributes.get(k))
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}
