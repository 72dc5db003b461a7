//! Scalar type conversion
//!
//! The reader and writer only need a way to turn one scalar into another
//! field type. [`Converter`] is that seam; [`DefaultConverter`] covers the
//! common string/numeric/boolean/char/date-time pairs with range checking.
//!
//! Copyright (c) 2025 Fieldmap Team
//! Licensed under the Apache-2.0 license

use crate::types::{FieldType, ScalarValue};
use chrono::{DateTime, FixedOffset, Utc};
use thiserror::Error;

/// Errors produced when a scalar cannot be converted
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversionError {
    /// Input text could not be parsed as the target type
    #[error("Cannot parse '{value}' as {to}")]
    Unparseable { value: String, to: FieldType },

    /// Value does not fit the target type
    #[error("Value '{value}' is out of range for {to}")]
    OutOfRange { value: String, to: FieldType },

    /// No conversion exists between the two types
    #[error("Unsupported conversion from {from} to {to}")]
    Unsupported { from: FieldType, to: FieldType },
}

/// Conversion service used by the reader and writer
///
/// Implementations must be free of side effects.
pub trait Converter {
    fn convert(
        &self,
        value: &ScalarValue,
        from: FieldType,
        to: FieldType,
    ) -> Result<ScalarValue, ConversionError>;
}

/// Built-in converter
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultConverter;

impl DefaultConverter {
    pub fn new() -> Self {
        Self
    }

    fn to_integral(value: &ScalarValue, to: FieldType) -> Result<i64, ConversionError> {
        let out_of_range = || ConversionError::OutOfRange {
            value: value.to_string(),
            to,
        };
        match value {
            ScalarValue::String(s) => {
                let trimmed = s.trim();
                if let Ok(v) = trimmed.parse::<i64>() {
                    return Ok(v);
                }
                let parsed = trimmed.parse::<f64>().map_err(|_| ConversionError::Unparseable {
                    value: s.clone(),
                    to,
                })?;
                Self::truncate(parsed).ok_or_else(out_of_range)
            }
            ScalarValue::Boolean(b) => Ok(i64::from(*b)),
            ScalarValue::Char(c) => Ok(*c as i64),
            ScalarValue::Float(v) => Self::truncate(*v as f64).ok_or_else(out_of_range),
            ScalarValue::Double(v) => Self::truncate(*v).ok_or_else(out_of_range),
            ScalarValue::DateTime(dt) => Ok(dt.timestamp_millis()),
            integral => integral.as_i64().ok_or_else(out_of_range),
        }
    }

    /// Truncate toward zero; `None` outside `[-2^63, 2^63)`
    fn truncate(v: f64) -> Option<i64> {
        // i64::MAX as f64 rounds up to 2^63, which is already out of range
        if v.is_finite() && v >= i64::MIN as f64 && v < -(i64::MIN as f64) {
            Some(v.trunc() as i64)
        } else {
            None
        }
    }

    fn to_floating(value: &ScalarValue, to: FieldType) -> Result<f64, ConversionError> {
        match value {
            ScalarValue::String(s) => s.trim().parse::<f64>().map_err(|_| ConversionError::Unparseable {
                value: s.clone(),
                to,
            }),
            ScalarValue::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
            ScalarValue::Char(c) => Ok(*c as u32 as f64),
            ScalarValue::DateTime(dt) => Ok(dt.timestamp_millis() as f64),
            numeric => numeric.as_f64().ok_or(ConversionError::Unsupported {
                from: numeric.field_type(),
                to,
            }),
        }
    }

    fn narrow<T: TryFrom<i64>>(value: &ScalarValue, to: FieldType) -> Result<T, ConversionError> {
        let wide = Self::to_integral(value, to)?;
        T::try_from(wide).map_err(|_| ConversionError::OutOfRange {
            value: value.to_string(),
            to,
        })
    }

    fn to_boolean(value: &ScalarValue) -> Result<bool, ConversionError> {
        match value {
            ScalarValue::Boolean(b) => Ok(*b),
            ScalarValue::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "y" | "t" => Ok(true),
                "false" | "0" | "no" | "n" | "f" => Ok(false),
                _ => Err(ConversionError::Unparseable {
                    value: s.clone(),
                    to: FieldType::Boolean,
                }),
            },
            ScalarValue::Char(c) => Self::to_boolean(&ScalarValue::String(c.to_string())),
            ScalarValue::Float(v) => Ok(*v != 0.0),
            ScalarValue::Double(v) => Ok(*v != 0.0),
            other => other.as_i64().map(|v| v != 0).ok_or(ConversionError::Unsupported {
                from: other.field_type(),
                to: FieldType::Boolean,
            }),
        }
    }

    fn to_char(value: &ScalarValue) -> Result<char, ConversionError> {
        let unparseable = || ConversionError::Unparseable {
            value: value.to_string(),
            to: FieldType::Char,
        };
        match value {
            ScalarValue::Char(c) => Ok(*c),
            ScalarValue::String(s) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(c),
                    _ => Err(unparseable()),
                }
            }
            other => {
                let code = other.as_i64().ok_or_else(unparseable)?;
                u32::try_from(code)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or(ConversionError::OutOfRange {
                        value: other.to_string(),
                        to: FieldType::Char,
                    })
            }
        }
    }

    fn to_date_time(value: &ScalarValue) -> Result<DateTime<FixedOffset>, ConversionError> {
        match value {
            ScalarValue::DateTime(dt) => Ok(*dt),
            ScalarValue::String(s) => {
                DateTime::parse_from_rfc3339(s.trim()).map_err(|_| ConversionError::Unparseable {
                    value: s.clone(),
                    to: FieldType::DateTime,
                })
            }
            other => {
                let millis = other.as_i64().ok_or(ConversionError::Unsupported {
                    from: other.field_type(),
                    to: FieldType::DateTime,
                })?;
                DateTime::<Utc>::from_timestamp_millis(millis)
                    .map(|dt| dt.fixed_offset())
                    .ok_or(ConversionError::OutOfRange {
                        value: other.to_string(),
                        to: FieldType::DateTime,
                    })
            }
        }
    }
}

impl Converter for DefaultConverter {
    fn convert(
        &self,
        value: &ScalarValue,
        from: FieldType,
        to: FieldType,
    ) -> Result<ScalarValue, ConversionError> {
        if to == FieldType::Any || to == value.field_type() {
            return Ok(value.clone());
        }

        match to {
            FieldType::String => Ok(ScalarValue::String(value.to_string())),
            FieldType::Boolean => Self::to_boolean(value).map(ScalarValue::Boolean),
            FieldType::Char => Self::to_char(value).map(ScalarValue::Char),
            FieldType::Byte => Self::narrow::<i8>(value, to).map(ScalarValue::Byte),
            FieldType::Short => Self::narrow::<i16>(value, to).map(ScalarValue::Short),
            FieldType::Integer => Self::narrow::<i32>(value, to).map(ScalarValue::Integer),
            FieldType::Long => Self::to_integral(value, to).map(ScalarValue::Long),
            FieldType::Double => Self::to_floating(value, to).map(ScalarValue::Double),
            FieldType::Float => {
                let v = Self::to_floating(value, to)?;
                if v.is_finite() && v.abs() > f32::MAX as f64 {
                    return Err(ConversionError::OutOfRange {
                        value: value.to_string(),
                        to,
                    });
                }
                Ok(ScalarValue::Float(v as f32))
            }
            FieldType::Number => match value {
                ScalarValue::Float(_) | ScalarValue::Double(_) => {
                    Self::to_floating(value, to).map(ScalarValue::Double)
                }
                ScalarValue::String(s) if s.trim().parse::<i64>().is_err() => {
                    Self::to_floating(value, to).map(ScalarValue::Double)
                }
                _ => Self::to_integral(value, to).map(ScalarValue::Long),
            },
            FieldType::DateTime => Self::to_date_time(value).map(ScalarValue::DateTime),
            FieldType::Complex | FieldType::Any => Err(ConversionError::Unsupported { from, to }),
        }
    }
}
