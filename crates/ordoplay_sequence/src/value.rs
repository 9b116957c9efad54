// SPDX-License-Identifier: MIT OR Apache-2.0
//! Typed values carried by override fields, binding slots and player parameters.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Reference to a host object (transform, audio source, ...) a node acts on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    /// Create a new random entity ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self(Uuid::nil())
    }
}

/// RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Color(pub [f32; 4]);

impl Color {
    /// Opaque white
    pub const WHITE: Self = Self([1.0, 1.0, 1.0, 1.0]);
}

/// Concrete type of a value slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    /// Boolean value
    Bool,
    /// Integer value
    Int,
    /// Floating point value
    Float,
    /// 2D vector
    Vector2,
    /// 3D vector
    Vector3,
    /// 4D vector / quaternion
    Vector4,
    /// Color (RGBA)
    Color,
    /// String value
    String,
    /// Host entity reference
    Entity,
}

impl ValueType {
    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bool => "Bool",
            Self::Int => "Int",
            Self::Float => "Float",
            Self::Vector2 => "Vector2",
            Self::Vector3 => "Vector3",
            Self::Vector4 => "Vector4",
            Self::Color => "Color",
            Self::String => "String",
            Self::Entity => "Entity",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A dynamically typed value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i32),
    /// Float
    Float(f32),
    /// 2D vector
    Vector2([f32; 2]),
    /// 3D vector
    Vector3([f32; 3]),
    /// 4D vector
    Vector4([f32; 4]),
    /// Color
    Color(Color),
    /// String
    String(String),
    /// Host entity reference
    Entity(EntityId),
}

impl Value {
    /// Get the value type
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Bool(_) => ValueType::Bool,
            Self::Int(_) => ValueType::Int,
            Self::Float(_) => ValueType::Float,
            Self::Vector2(_) => ValueType::Vector2,
            Self::Vector3(_) => ValueType::Vector3,
            Self::Vector4(_) => ValueType::Vector4,
            Self::Color(_) => ValueType::Color,
            Self::String(_) => ValueType::String,
            Self::Entity(_) => ValueType::Entity,
        }
    }

    /// Convert into a concrete Rust type, if the variant matches
    pub fn get<T: ValueKind>(&self) -> Option<T> {
        T::from_value(self)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Vector2([x, y]) => write!(f, "({x}, {y})"),
            Self::Vector3([x, y, z]) => write!(f, "({x}, {y}, {z})"),
            Self::Vector4([x, y, z, w]) => write!(f, "({x}, {y}, {z}, {w})"),
            Self::Color(Color([r, g, b, a])) => write!(f, "rgba({r}, {g}, {b}, {a})"),
            Self::String(v) => write!(f, "\"{v}\""),
            Self::Entity(EntityId(id)) => write!(f, "entity {id}"),
        }
    }
}

/// Rust types that map onto exactly one [`ValueType`]
pub trait ValueKind: Clone + Send + Sync + 'static {
    /// The value type this Rust type maps to
    const VALUE_TYPE: ValueType;

    /// Wrap into a [`Value`]
    fn into_value(self) -> Value;

    /// Extract from a [`Value`] of the matching variant
    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! impl_value_kind {
    ($ty:ty, $variant:ident) => {
        impl ValueKind for $ty {
            const VALUE_TYPE: ValueType = ValueType::$variant;

            fn into_value(self) -> Value {
                Value::$variant(self)
            }

            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::$variant(v) => Some(v.clone()),
                    _ => None,
                }
            }
        }

        impl From<$ty> for Value {
            fn from(value: $ty) -> Self {
                Value::$variant(value)
            }
        }
    };
}

impl_value_kind!(bool, Bool);
impl_value_kind!(i32, Int);
impl_value_kind!(f32, Float);
impl_value_kind!([f32; 2], Vector2);
impl_value_kind!([f32; 3], Vector3);
impl_value_kind!([f32; 4], Vector4);
impl_value_kind!(Color, Color);
impl_value_kind!(String, String);
impl_value_kind!(EntityId, Entity);

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}
