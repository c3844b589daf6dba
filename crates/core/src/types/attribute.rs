//! Variant attributes and the ordered, name-keyed attribute set.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

/// Errors that can occur when adding a value to an [`Attribute`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AttributeValueError {
    /// The value is empty after trimming.
    #[error("Value cannot be empty")]
    Empty,
    /// The value matches an existing value, ignoring case.
    #[error("Value already exists")]
    Duplicate {
        /// The rejected (trimmed) value.
        value: String,
    },
}

/// Name of a variant attribute.
///
/// `Color` and `Size` are reserved: they are always present and are the only
/// attributes combined during matrix generation. Names are matched exactly,
/// so `"color"` is a custom attribute distinct from `Color`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AttributeName {
    Color,
    Size,
    Custom(String),
}

impl AttributeName {
    /// Wire name of the color attribute.
    pub const COLOR: &'static str = "Color";
    /// Wire name of the size attribute.
    pub const SIZE: &'static str = "Size";

    /// Returns the attribute name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Color => Self::COLOR,
            Self::Size => Self::SIZE,
            Self::Custom(name) => name,
        }
    }

    /// Whether this is one of the reserved `Color`/`Size` attributes.
    #[must_use]
    pub const fn is_reserved(&self) -> bool {
        matches!(self, Self::Color | Self::Size)
    }
}

impl From<&str> for AttributeName {
    fn from(name: &str) -> Self {
        match name {
            Self::COLOR => Self::Color,
            Self::SIZE => Self::Size,
            other => Self::Custom(other.to_owned()),
        }
    }
}

impl From<String> for AttributeName {
    fn from(name: String) -> Self {
        match name.as_str() {
            Self::COLOR => Self::Color,
            Self::SIZE => Self::Size,
            _ => Self::Custom(name),
        }
    }
}

impl From<AttributeName> for String {
    fn from(name: AttributeName) -> Self {
        match name {
            AttributeName::Custom(name) => name,
            reserved => reserved.as_str().to_owned(),
        }
    }
}

impl fmt::Display for AttributeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named facet with an ordered list of values.
///
/// ## Constraints
///
/// - Values are trimmed and non-empty
/// - No two values are equal under case-insensitive comparison
/// - Insertion order is preserved
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribute {
    name: AttributeName,
    values: Vec<String>,
}

impl Attribute {
    /// Create an attribute with no values.
    #[must_use]
    pub const fn new(name: AttributeName) -> Self {
        Self {
            name,
            values: Vec::new(),
        }
    }

    #[must_use]
    pub const fn name(&self) -> &AttributeName {
        &self.name
    }

    /// Values in insertion order.
    #[must_use]
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Whether `candidate` matches an existing value, ignoring case.
    #[must_use]
    pub fn contains(&self, candidate: &str) -> bool {
        let candidate = candidate.to_lowercase();
        self.values.iter().any(|v| v.to_lowercase() == candidate)
    }

    /// Trim `raw` and append it.
    ///
    /// Returns the stored (trimmed) value.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed value is empty or duplicates an
    /// existing value ignoring case. The attribute is left unchanged.
    ///
    /// ```
    /// use univendor_core::{Attribute, AttributeName};
    ///
    /// let mut size = Attribute::new(AttributeName::Size);
    /// assert_eq!(size.push_value("  XL ").unwrap(), "XL");
    /// assert!(size.push_value("xl").is_err());
    /// assert_eq!(size.values(), ["XL"]);
    /// ```
    pub fn push_value(&mut self, raw: &str) -> Result<String, AttributeValueError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AttributeValueError::Empty);
        }
        if self.contains(trimmed) {
            return Err(AttributeValueError::Duplicate {
                value: trimmed.to_owned(),
            });
        }
        self.values.push(trimmed.to_owned());
        Ok(trimmed.to_owned())
    }

    /// Remove the value at `index`, returning it.
    pub fn remove_value(&mut self, index: usize) -> Option<String> {
        (index < self.values.len()).then(|| self.values.remove(index))
    }
}

/// Attributes keyed by name, in insertion order.
///
/// `Color` and `Size` are created up front and can never be removed.
#[derive(Debug, Clone)]
pub struct AttributeSet {
    attributes: Vec<Attribute>,
    index: HashMap<AttributeName, usize>,
}

impl Default for AttributeSet {
    fn default() -> Self {
        Self::new()
    }
}

impl AttributeSet {
    /// Create a set holding empty `Color` and `Size` attributes.
    #[must_use]
    pub fn new() -> Self {
        let mut set = Self {
            attributes: Vec::new(),
            index: HashMap::new(),
        };
        set.add(AttributeName::Color);
        set.add(AttributeName::Size);
        set
    }

    /// Add an empty attribute. Returns `false` if the name already exists.
    pub fn add(&mut self, name: AttributeName) -> bool {
        if self.index.contains_key(&name) {
            return false;
        }
        self.index.insert(name.clone(), self.attributes.len());
        self.attributes.push(Attribute::new(name));
        true
    }

    /// Remove a custom attribute.
    ///
    /// Returns `None` for reserved attributes and unknown names.
    pub fn remove(&mut self, name: &AttributeName) -> Option<Attribute> {
        if name.is_reserved() {
            return None;
        }
        let position = self.index.remove(name)?;
        let removed = self.attributes.remove(position);
        for slot in self.index.values_mut() {
            if *slot > position {
                *slot -= 1;
            }
        }
        Some(removed)
    }

    #[must_use]
    pub fn get(&self, name: &AttributeName) -> Option<&Attribute> {
        self.index
            .get(name)
            .and_then(|&position| self.attributes.get(position))
    }

    pub fn get_mut(&mut self, name: &AttributeName) -> Option<&mut Attribute> {
        let position = *self.index.get(name)?;
        self.attributes.get_mut(position)
    }

    /// Values of the `Color` attribute.
    #[must_use]
    pub fn colors(&self) -> &[String] {
        self.get(&AttributeName::Color)
            .map_or(&[][..], Attribute::values)
    }

    /// Values of the `Size` attribute.
    #[must_use]
    pub fn sizes(&self) -> &[String] {
        self.get(&AttributeName::Size)
            .map_or(&[][..], Attribute::values)
    }

    /// Attributes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Always false: the reserved attributes are never removed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

impl Serialize for AttributeSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.attributes)
    }
}
