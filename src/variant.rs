//! Typed values returned by metadata and processing-attribute queries.
//!
//! The native codec reports every metadata entry and attribute as a tagged
//! [`Variant`]. Before attachment to an
//! [`ImageDescription`](crate::ImageDescription) each value is rendered to a
//! string with [`Variant::to_attribute_string`].

use std::fmt::{Display, Formatter, Result as FmtResult};

/// Scalar kind a processing attribute is expected to carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    /// Signed 16-bit integer.
    S16,
    /// Unsigned 16-bit integer.
    U16,
    /// Signed 32-bit integer.
    S32,
    /// Unsigned 32-bit integer.
    U32,
    /// 32-bit float.
    F32,
    /// UTF-8 string.
    String,
}

/// Fixed-length numeric array payload of a [`Variant`].
#[derive(Debug, Clone, PartialEq)]
pub enum VariantArray {
    U8(Vec<u8>),
    S16(Vec<i16>),
    U16(Vec<u16>),
    S32(Vec<i32>),
    U32(Vec<u32>),
    F32(Vec<f32>),
}

impl VariantArray {
    /// Number of elements in the array.
    pub fn len(&self) -> usize {
        match self {
            VariantArray::U8(values) => values.len(),
            VariantArray::S16(values) => values.len(),
            VariantArray::U16(values) => values.len(),
            VariantArray::S32(values) => values.len(),
            VariantArray::U32(values) => values.len(),
            VariantArray::F32(values) => values.len(),
        }
    }

    /// Returns `true` if the array has no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A tagged value produced by the native codec.
#[derive(Debug, Clone, PartialEq)]
pub enum Variant {
    /// No value.
    Empty,
    S16(i16),
    U16(u16),
    S32(i32),
    U32(u32),
    F32(f32),
    String(String),
    Array(VariantArray),
}

impl Variant {
    /// Render the value as an attribute string.
    ///
    /// Scalars use their natural decimal form, arrays are space-separated,
    /// and [`Variant::Empty`] becomes an empty string.
    pub fn to_attribute_string(&self) -> String {
        match self {
            Variant::Empty => String::new(),
            Variant::S16(value) => value.to_string(),
            Variant::U16(value) => value.to_string(),
            Variant::S32(value) => value.to_string(),
            Variant::U32(value) => value.to_string(),
            Variant::F32(value) => value.to_string(),
            Variant::String(value) => value.clone(),
            Variant::Array(array) => match array {
                VariantArray::U8(values) => join(values),
                VariantArray::S16(values) => join(values),
                VariantArray::U16(values) => join(values),
                VariantArray::S32(values) => join(values),
                VariantArray::U32(values) => join(values),
                VariantArray::F32(values) => join(values),
            },
        }
    }

    /// The string payload, if this is a [`Variant::String`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Variant::String(value) => Some(value),
            _ => None,
        }
    }

    /// The scalar kind of this value, or `None` for empty and array values.
    pub fn scalar_type(&self) -> Option<ScalarType> {
        match self {
            Variant::S16(_) => Some(ScalarType::S16),
            Variant::U16(_) => Some(ScalarType::U16),
            Variant::S32(_) => Some(ScalarType::S32),
            Variant::U32(_) => Some(ScalarType::U32),
            Variant::F32(_) => Some(ScalarType::F32),
            Variant::String(_) => Some(ScalarType::String),
            Variant::Empty | Variant::Array(_) => None,
        }
    }
}

impl Display for Variant {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.to_attribute_string())
    }
}

impl From<&str> for Variant {
    fn from(value: &str) -> Self {
        Variant::String(value.to_string())
    }
}

impl From<String> for Variant {
    fn from(value: String) -> Self {
        Variant::String(value)
    }
}

impl From<f32> for Variant {
    fn from(value: f32) -> Self {
        Variant::F32(value)
    }
}

impl From<u32> for Variant {
    fn from(value: u32) -> Self {
        Variant::U32(value)
    }
}

impl From<u16> for Variant {
    fn from(value: u16) -> Self {
        Variant::U16(value)
    }
}

fn join<T: ToString>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// One metadata key/value pair reported by a clip or frame.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataEntry {
    /// Metadata key as reported by the codec (e.g. `"camera_type"`).
    pub key: String,
    /// Typed value.
    pub value: Variant,
}

impl MetadataEntry {
    /// Create an entry from a key and anything convertible to a [`Variant`].
    pub fn new(key: impl Into<String>, value: impl Into<Variant>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_render_in_decimal() {
        assert_eq!(Variant::S16(-12).to_attribute_string(), "-12");
        assert_eq!(Variant::U32(4_000_000_000).to_attribute_string(), "4000000000");
        assert_eq!(Variant::F32(5600.5).to_attribute_string(), "5600.5");
    }

    #[test]
    fn arrays_are_space_separated() {
        let value = Variant::Array(VariantArray::U16(vec![1, 2, 3]));
        assert_eq!(value.to_attribute_string(), "1 2 3");
        assert_eq!(Variant::Array(VariantArray::F32(Vec::new())).to_string(), "");
    }

    #[test]
    fn empty_renders_as_empty_string() {
        assert_eq!(Variant::Empty.to_attribute_string(), "");
        assert_eq!(Variant::Empty.scalar_type(), None);
    }
}
