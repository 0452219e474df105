//! Tagged variable values and their declared data types.
//!
//! Every variable in the address space declares a [`DataType`]. A [`Value`]
//! carries its own tag, and the variable store compares the two at the write
//! boundary, so a type mismatch is rejected before any state changes.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Declared data type of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum DataType {
    /// Two-state discrete value.
    Boolean,
    /// Signed 32-bit integer.
    Int32,
    /// Unsigned 32-bit integer.
    UInt32,
    /// 64-bit floating point.
    Double,
    /// UTF-8 text.
    String,
}

impl DataType {
    /// Whether values of this type can be compared against a numeric range.
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Int32 | Self::UInt32 | Self::Double)
    }
}

/// A variable value tagged with its data type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(tag = "type", content = "value")]
pub enum Value {
    /// Boolean value.
    Boolean(bool),
    /// Signed 32-bit integer value.
    Int32(i32),
    /// Unsigned 32-bit integer value.
    UInt32(u32),
    /// Floating point value.
    Double(f64),
    /// Text value.
    String(String),
}

impl Value {
    /// Return the data type tag of this value.
    pub const fn data_type(&self) -> DataType {
        match self {
            Self::Boolean(_) => DataType::Boolean,
            Self::Int32(_) => DataType::Int32,
            Self::UInt32(_) => DataType::UInt32,
            Self::Double(_) => DataType::Double,
            Self::String(_) => DataType::String,
        }
    }

    /// Numeric view of the value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int32(v) => Some(f64::from(*v)),
            Self::UInt32(v) => Some(f64::from(*v)),
            Self::Double(v) => Some(*v),
            Self::Boolean(_) | Self::String(_) => None,
        }
    }

    /// Boolean view of the value, if it is a boolean.
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    /// The zero value for a data type, used when a variable has no explicit
    /// initial value.
    pub fn default_for(data_type: DataType) -> Self {
        match data_type {
            DataType::Boolean => Self::Boolean(false),
            DataType::Int32 => Self::Int32(0),
            DataType::UInt32 => Self::UInt32(0),
            DataType::Double => Self::Double(0.0),
            DataType::String => Self::String(String::new()),
        }
    }
}

impl core::fmt::Display for Value {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Boolean(v) => write!(f, "{v}"),
            Self::Int32(v) => write!(f, "{v}"),
            Self::UInt32(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::String(v) => f.write_str(v),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int32(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::UInt32(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

/// Inclusive engineering range `[min, max]` of a numeric variable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ValueRange {
    /// Lowest accepted value (inclusive).
    pub min: f64,
    /// Highest accepted value (inclusive).
    pub max: f64,
}

impl ValueRange {
    /// Build a range, returning `None` if either bound is not finite or
    /// `min > max`.
    pub fn new(min: f64, max: f64) -> Option<Self> {
        if !min.is_finite() || !max.is_finite() || min > max {
            return None;
        }
        Some(Self { min, max })
    }

    /// Whether `value` lies inside the range, bounds included.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}
