//! Attribute value kinds and values.

use std::fmt;

use chrono::{DateTime, Utc};
use graphwire_rpc::proto::{self, attribute_value};
use graphwire_rpc::{DriverError, DriverResult};

/// The value kind of an attribute type.
///
/// `Object` is the kind of the root attribute type only; no value has it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Object,
    Boolean,
    Long,
    Double,
    String,
    DateTime,
}

impl ValueKind {
    /// Whether attributes of this kind can be used as keys.
    pub fn is_keyable(self) -> bool {
        matches!(self, ValueKind::Long | ValueKind::String | ValueKind::DateTime)
    }

    /// Whether values of this kind can be put.
    pub fn is_writable(self) -> bool {
        self != ValueKind::Object
    }

    pub fn from_proto(value_type: i32) -> DriverResult<Self> {
        let kind = match proto::ValueType::try_from(value_type) {
            Ok(proto::ValueType::Object) => ValueKind::Object,
            Ok(proto::ValueType::Boolean) => ValueKind::Boolean,
            Ok(proto::ValueType::Long) => ValueKind::Long,
            Ok(proto::ValueType::Double) => ValueKind::Double,
            Ok(proto::ValueType::String) => ValueKind::String,
            Ok(proto::ValueType::DateTime) => ValueKind::DateTime,
            Err(_) => {
                return Err(DriverError::Protocol(format!(
                    "unknown value type {value_type}"
                )));
            }
        };
        Ok(kind)
    }

    pub fn to_proto(self) -> proto::ValueType {
        match self {
            ValueKind::Object => proto::ValueType::Object,
            ValueKind::Boolean => proto::ValueType::Boolean,
            ValueKind::Long => proto::ValueType::Long,
            ValueKind::Double => proto::ValueType::Double,
            ValueKind::String => proto::ValueType::String,
            ValueKind::DateTime => proto::ValueType::DateTime,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Object => "object",
            ValueKind::Boolean => "boolean",
            ValueKind::Long => "long",
            ValueKind::Double => "double",
            ValueKind::String => "string",
            ValueKind::DateTime => "datetime",
        };
        f.write_str(name)
    }
}

/// An attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Boolean(bool),
    Long(i64),
    Double(f64),
    String(String),
    DateTime(DateTime<Utc>),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Long(_) => ValueKind::Long,
            Value::Double(_) => ValueKind::Double,
            Value::String(_) => ValueKind::String,
            Value::DateTime(_) => ValueKind::DateTime,
        }
    }

    pub fn to_proto(&self) -> proto::AttributeValue {
        let value = match self {
            Value::Boolean(v) => attribute_value::Value::Boolean(*v),
            Value::Long(v) => attribute_value::Value::Long(*v),
            Value::Double(v) => attribute_value::Value::Double(*v),
            Value::String(v) => attribute_value::Value::String(v.clone()),
            Value::DateTime(v) => attribute_value::Value::DateTime(v.timestamp_millis()),
        };
        proto::AttributeValue { value: Some(value) }
    }

    pub fn from_proto(value: &proto::AttributeValue) -> DriverResult<Self> {
        let value = match &value.value {
            Some(attribute_value::Value::Boolean(v)) => Value::Boolean(*v),
            Some(attribute_value::Value::Long(v)) => Value::Long(*v),
            Some(attribute_value::Value::Double(v)) => Value::Double(*v),
            Some(attribute_value::Value::String(v)) => Value::String(v.clone()),
            Some(attribute_value::Value::DateTime(millis)) => {
                let at = DateTime::from_timestamp_millis(*millis).ok_or_else(|| {
                    DriverError::Protocol(format!("datetime {millis} out of range"))
                })?;
                Value::DateTime(at)
            }
            None => return Err(DriverError::Protocol("attribute value missing".into())),
        };
        Ok(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(v) => write!(f, "{v}"),
            Value::Long(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "{v:?}"),
            Value::DateTime(v) => write!(f, "{}", v.format("%Y-%m-%dT%H:%M:%S%.3f")),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::DateTime(v)
    }
}
