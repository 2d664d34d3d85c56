use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Value of a named audio descriptor: either a measurement or a label.
///
/// Integers are kept apart from floats so each renders in its own form
/// (`120` versus `120.0`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DescriptorValue {
    Integer(i64),
    Number(f64),
    Text(String),
}

impl fmt::Display for DescriptorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DescriptorValue::Integer(value) => write!(f, "{value}"),
            DescriptorValue::Number(value) => f.write_str(&float_text(*value)),
            DescriptorValue::Text(value) => f.write_str(value),
        }
    }
}

/// Shortest round-trip text of a float. Whole numbers keep `.0` and the
/// exponent carries an explicit sign and at least two digits (`1e+16`,
/// `2.5e-05`).
fn float_text(value: f64) -> String {
    let text = format!("{value:?}");
    let Some((mantissa, exponent)) = text.split_once('e') else {
        return text;
    };
    let (sign, digits) = match exponent.strip_prefix('-') {
        Some(digits) => ('-', digits),
        None => ('+', exponent),
    };
    format!("{mantissa}e{sign}{digits:0>2}")
}

impl From<i64> for DescriptorValue {
    fn from(value: i64) -> Self {
        DescriptorValue::Integer(value)
    }
}

impl From<f64> for DescriptorValue {
    fn from(value: f64) -> Self {
        DescriptorValue::Number(value)
    }
}

impl From<String> for DescriptorValue {
    fn from(value: String) -> Self {
        DescriptorValue::Text(value)
    }
}

impl From<&str> for DescriptorValue {
    fn from(value: &str) -> Self {
        DescriptorValue::Text(value.to_string())
    }
}

impl std::str::FromStr for DescriptorValue {
    type Err = std::convert::Infallible;

    /// Integers parse as [`DescriptorValue::Integer`], other finite numbers as
    /// [`DescriptorValue::Number`], anything else is kept as text.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(value) = trimmed.parse::<i64>() {
            return Ok(DescriptorValue::Integer(value));
        }
        Ok(match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => DescriptorValue::Number(value),
            _ => DescriptorValue::Text(s.to_string()),
        })
    }
}

/// Named descriptors of the analysed audio, kept in insertion order.
///
/// Names are unique; inserting an existing name replaces its value in place.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Descriptors(IndexMap<String, DescriptorValue>);

impl Descriptors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(mut self, name: impl Into<String>, value: impl Into<DescriptorValue>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&DescriptorValue> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &DescriptorValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<DescriptorValue>> FromIterator<(K, V)> for Descriptors {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }
}
