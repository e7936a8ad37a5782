//! Conversion between transfer objects and domain objects.
//!
//! ZAPI encodes the same boolean in several ways: native JSON booleans,
//! `"yes"`/`"no"`, `"enabled"`/`"disabled"` and `"true"`/`"false"`. Resource
//! code keeps a wire-shaped struct that mirrors the JSON and a domain struct
//! with normalised types, and declares the pairing once with [`field_map!`]:
//!
//! ```
//! use zapi_core::field_map;
//! use zapi_core::mapping::map;
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Service {
//!     name: String,
//!     farm_guardian: bool,
//! }
//!
//! #[derive(Debug, Default)]
//! struct ServiceWire {
//!     name: String,
//!     farm_guardian: String,
//! }
//!
//! field_map! {
//!     Service <=> ServiceWire {
//!         name,
//!         farm_guardian as TrueFalse,
//!     }
//! }
//!
//! let wire = ServiceWire { name: "web".into(), farm_guardian: "true".into() };
//! let mut service = Service::default();
//! map(&mut service, &wire).unwrap();
//! assert!(service.farm_guardian);
//! ```
//!
//! Field names are checked by the compiler. Field kinds are checked when the
//! mapping runs, and a mismatch is reported as a [`MappingError`] naming the
//! field. A mapping either converts every declared field or changes nothing.

use std::fmt;
use thiserror::Error;

/// Errors raised while mapping between transfer and domain objects.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    /// A string could not be read as a boolean
    #[error("Unknown boolean conversion for {field}: {value}")]
    UnrecognizedBool {
        /// Field being mapped
        field: String,
        /// Offending wire value
        value: String,
    },

    /// A boolean had to be written as a string but no pair was declared
    #[error("No boolean representation declared for {field}")]
    MissingBoolRepr {
        /// Field being mapped
        field: String,
    },

    /// The two sides of a field have incompatible kinds
    #[error("Unknown type conversion for {field}: {from} -> {to}")]
    NoConversion {
        /// Field being mapped
        field: String,
        /// Source kind
        from: FieldKind,
        /// Target kind
        to: FieldKind,
    },
}

/// Pair of strings the appliance uses for a boolean attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoolRepr {
    /// `"yes"` / `"no"`
    YesNo,
    /// `"enabled"` / `"disabled"`
    EnabledDisabled,
    /// `"true"` / `"false"`
    TrueFalse,
}

impl BoolRepr {
    /// Returns the `(true, false)` strings for this representation.
    #[must_use]
    pub const fn pair(self) -> (&'static str, &'static str) {
        match self {
            Self::YesNo => ("yes", "no"),
            Self::EnabledDisabled => ("enabled", "disabled"),
            Self::TrueFalse => ("true", "false"),
        }
    }

    /// Render a boolean through this representation.
    #[must_use]
    pub const fn render(self, value: bool) -> &'static str {
        let (on, off) = self.pair();
        if value {
            on
        } else {
            off
        }
    }
}

/// Read a wire string as a boolean.
///
/// Matching is case-sensitive. The empty string reads as `false`.
///
/// # Errors
///
/// Returns [`MappingError::UnrecognizedBool`] for any other token.
pub fn parse_bool(field: &str, value: &str) -> Result<bool, MappingError> {
    match value {
        "yes" | "enabled" | "true" => Ok(true),
        "no" | "disabled" | "false" | "" => Ok(false),
        other => Err(MappingError::UnrecognizedBool {
            field: field.to_string(),
            value: other.to_string(),
        }),
    }
}

/// Kind of a mapped field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Boolean
    Bool,
    /// String
    String,
    /// Signed integer
    Int,
    /// Unsigned integer
    Uint,
    /// Floating point number
    Float,
    /// Absent optional value
    Null,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::String => "string",
            Self::Int => "int",
            Self::Uint => "uint",
            Self::Float => "float",
            Self::Null => "null",
        };
        f.write_str(name)
    }
}

/// A field value in transit between two structs.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Boolean
    Bool(bool),
    /// String
    String(String),
    /// Signed integer
    Int(i64),
    /// Unsigned integer
    Uint(u64),
    /// Floating point number
    Float(f64),
    /// Absent optional value
    Null,
}

impl FieldValue {
    /// Returns the kind of this value.
    #[must_use]
    pub const fn kind(&self) -> FieldKind {
        match self {
            Self::Bool(_) => FieldKind::Bool,
            Self::String(_) => FieldKind::String,
            Self::Int(_) => FieldKind::Int,
            Self::Uint(_) => FieldKind::Uint,
            Self::Float(_) => FieldKind::Float,
            Self::Null => FieldKind::Null,
        }
    }
}

/// Convert one field value to the target kind.
///
/// # Errors
///
/// Returns a [`MappingError`] when no rule converts `value` to `target`.
pub fn convert(
    field: &str,
    value: FieldValue,
    target: FieldKind,
    repr: Option<BoolRepr>,
) -> Result<FieldValue, MappingError> {
    match (value, target) {
        (value, target) if value.kind() == target => Ok(value),
        (FieldValue::Null, _) => Ok(FieldValue::Null),
        (FieldValue::String(text), FieldKind::Bool) => {
            parse_bool(field, &text).map(FieldValue::Bool)
        }
        (FieldValue::Bool(flag), FieldKind::String) => match repr {
            Some(repr) => Ok(FieldValue::String(repr.render(flag).to_string())),
            None => Err(MappingError::MissingBoolRepr {
                field: field.to_string(),
            }),
        },
        (value, target) => Err(MappingError::NoConversion {
            field: field.to_string(),
            from: value.kind(),
            to: target,
        }),
    }
}

/// A type that can sit on either side of a field mapping.
pub trait MappedField: Sized {
    /// Kind this type converts to.
    const KIND: FieldKind;

    /// Lower the value for conversion.
    fn to_field_value(&self) -> FieldValue;

    /// Rebuild the value after conversion; `None` if the kind does not fit.
    fn from_field_value(value: FieldValue) -> Option<Self>;
}

impl MappedField for bool {
    const KIND: FieldKind = FieldKind::Bool;

    fn to_field_value(&self) -> FieldValue {
        FieldValue::Bool(*self)
    }

    fn from_field_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Bool(flag) => Some(flag),
            _ => None,
        }
    }
}

impl MappedField for String {
    const KIND: FieldKind = FieldKind::String;

    fn to_field_value(&self) -> FieldValue {
        FieldValue::String(self.clone())
    }

    fn from_field_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::String(text) => Some(text),
            _ => None,
        }
    }
}

impl MappedField for f64 {
    const KIND: FieldKind = FieldKind::Float;

    fn to_field_value(&self) -> FieldValue {
        FieldValue::Float(*self)
    }

    fn from_field_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Float(number) => Some(number),
            _ => None,
        }
    }
}

macro_rules! mapped_integer {
    ($variant:ident, $wide:ty, $($ty:ty),+) => {
        $(
            impl MappedField for $ty {
                const KIND: FieldKind = FieldKind::$variant;

                fn to_field_value(&self) -> FieldValue {
                    FieldValue::$variant(<$wide>::from(*self))
                }

                fn from_field_value(value: FieldValue) -> Option<Self> {
                    match value {
                        FieldValue::$variant(number) => <$ty>::try_from(number).ok(),
                        _ => None,
                    }
                }
            }
        )+
    };
}

mapped_integer!(Int, i64, i8, i16, i32, i64);
mapped_integer!(Uint, u64, u8, u16, u32, u64);

impl<T: MappedField> MappedField for Option<T> {
    const KIND: FieldKind = T::KIND;

    fn to_field_value(&self) -> FieldValue {
        self.as_ref().map_or(FieldValue::Null, T::to_field_value)
    }

    fn from_field_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Null => Some(None),
            other => T::from_field_value(other).map(Some),
        }
    }
}

/// Map a single field from `source` into a value of type `T`.
///
/// # Errors
///
/// Returns a [`MappingError`] when the conversion is not available.
pub fn map_field<S, T>(field: &str, source: &S, repr: Option<BoolRepr>) -> Result<T, MappingError>
where
    S: MappedField,
    T: MappedField,
{
    let value = source.to_field_value();
    let from = value.kind();
    let converted = convert(field, value, T::KIND, repr)?;
    T::from_field_value(converted).ok_or_else(|| MappingError::NoConversion {
        field: field.to_string(),
        from,
        to: T::KIND,
    })
}

/// Populate `Self` from the same-named fields of `Source`.
///
/// Implemented by [`field_map!`]; implementations must leave `self`
/// untouched when they return an error.
pub trait MapFrom<Source> {
    /// Overwrite every declared field of `self` from `source`.
    ///
    /// # Errors
    ///
    /// Returns the first [`MappingError`] encountered.
    fn map_from(&mut self, source: &Source) -> Result<(), MappingError>;
}

/// Copy every declared field of `from` into `to`.
///
/// # Errors
///
/// Returns the first [`MappingError`] encountered; `to` is left unchanged.
pub fn map<To, From>(to: &mut To, from: &From) -> Result<(), MappingError>
where
    To: MapFrom<From>,
{
    to.map_from(from)
}

/// Declare the field pairing between a domain struct and a transfer struct.
///
/// Each entry names a field present on both structs. `field as Repr` marks a
/// boolean that the other side stores as a string, using one of the
/// [`BoolRepr`] variants. Both directions are generated.
#[macro_export]
macro_rules! field_map {
    ($domain:ident <=> $wire:ident { $($field:ident $(as $repr:ident)?),+ $(,)? }) => {
        $crate::field_map!(@impl $domain, $wire, $($field $(as $repr)?),+);
        $crate::field_map!(@impl $wire, $domain, $($field $(as $repr)?),+);
    };
    (@impl $to:ty, $from:ty, $($field:ident $(as $repr:ident)?),+) => {
        impl $crate::mapping::MapFrom<$from> for $to {
            fn map_from(
                &mut self,
                source: &$from,
            ) -> ::std::result::Result<(), $crate::mapping::MappingError> {
                // Every read of `source` completes before any field name is bound.
                let staged = ($(
                    $crate::mapping::map_field(
                        stringify!($field),
                        &source.$field,
                        $crate::field_map!(@repr $($repr)?),
                    )?,
                )+);
                let ($($field,)+) = staged;
                $(
                    self.$field = $field;
                )+
                Ok(())
            }
        }
    };
    (@repr $repr:ident) => {
        ::std::option::Option::Some($crate::mapping::BoolRepr::$repr)
    };
    (@repr) => {
        ::std::option::Option::None
    };
}
