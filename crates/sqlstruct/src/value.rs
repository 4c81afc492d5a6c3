//! Bound values and the column value traits.
//!
//! Every tagged record field implements [`Column`], which turns it into a
//! [`Value`] and answers the zero-value question used by omission policies:
//!
//! - containers (`Vec`, maps) are zero iff empty
//! - `Option<T>` is zero iff `None`
//! - scalars are zero iff equal to their default

use bytes::{Bytes, BytesMut};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::error::Error;
use std::fmt;
use tokio_postgres::types::{FromSql, IsNull, Kind, ToSql, Type, to_sql_checked};
use uuid::Uuid;

/// A bound SQL argument.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Text(String),
    Bytes(Vec<u8>),
    Json(serde_json::Value),
    Uuid(Uuid),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
    Date(NaiveDate),
    Array(Vec<Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Zero test for values that are used as columns directly.
    pub fn is_zero(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Bool(v) => !v,
            Value::I16(v) => *v == 0,
            Value::I32(v) => *v == 0,
            Value::I64(v) => *v == 0,
            Value::F32(v) => *v == 0.0,
            Value::F64(v) => *v == 0.0,
            Value::Text(v) => v.is_empty(),
            Value::Bytes(v) => v.is_empty(),
            Value::Json(v) => v.is_null(),
            Value::Uuid(v) => v.is_nil(),
            Value::Timestamp(v) => *v == NaiveDateTime::default(),
            Value::TimestampTz(v) => *v == DateTime::<Utc>::default(),
            Value::Date(v) => *v == NaiveDate::default(),
            Value::Array(v) => v.is_empty(),
        }
    }

    fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I16(v) => Some(i64::from(*v)),
            Value::I32(v) => Some(i64::from(*v)),
            Value::I64(v) => Some(*v),
            _ => None,
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::I16(_) => "i16",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::Json(_) => "json",
            Value::Uuid(_) => "uuid",
            Value::Timestamp(_) => "timestamp",
            Value::TimestampTz(_) => "timestamptz",
            Value::Date(_) => "date",
            Value::Array(_) => "array",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::I16(v) => write!(f, "{v}"),
            Value::I32(v) => write!(f, "{v}"),
            Value::I64(v) => write!(f, "{v}"),
            Value::F32(v) => write!(f, "{v}"),
            Value::F64(v) => write!(f, "{v}"),
            Value::Text(v) => f.write_str(v),
            Value::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            Value::Json(v) => write!(f, "{v}"),
            Value::Uuid(v) => write!(f, "{v}"),
            Value::Timestamp(v) => write!(f, "{v}"),
            Value::TimestampTz(v) => write!(f, "{v}"),
            Value::Date(v) => write!(f, "{v}"),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

// ==================== Conversions into Value ====================

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v.into())
                }
            }
        )*
    };
}

value_from! {
    bool => Bool,
    i8 => I16,
    u8 => I16,
    i16 => I16,
    u16 => I32,
    i32 => I32,
    u32 => I64,
    i64 => I64,
    f32 => F32,
    f64 => F64,
    String => Text,
    &str => Text,
    serde_json::Value => Json,
    Uuid => Uuid,
    NaiveDateTime => Timestamp,
    DateTime<Utc> => TimestampTz,
    NaiveDate => Date,
}

impl From<Bytes> for Value {
    fn from(v: Bytes) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

// ==================== Column ====================

/// A record field that can be bound as a SQL argument.
pub trait Column: Any {
    /// Convert the field into a bound value.
    fn to_value(&self) -> Value;

    /// Whether the field holds its type's zero value.
    fn is_zero(&self) -> bool;
}

macro_rules! scalar_column {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Column for $ty {
                fn to_value(&self) -> Value {
                    Value::from(self.clone())
                }

                fn is_zero(&self) -> bool {
                    *self == <$ty>::default()
                }
            }
        )*
    };
}

scalar_column!(
    bool,
    i8,
    u8,
    i16,
    u16,
    i32,
    u32,
    i64,
    f32,
    f64,
    String,
    &'static str,
    Uuid,
    NaiveDateTime,
    DateTime<Utc>,
    NaiveDate,
);

impl Column for Bytes {
    fn to_value(&self) -> Value {
        Value::from(self.clone())
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl Column for serde_json::Value {
    fn to_value(&self) -> Value {
        Value::Json(self.clone())
    }

    fn is_zero(&self) -> bool {
        self.is_null()
    }
}

impl Column for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }

    fn is_zero(&self) -> bool {
        Value::is_zero(self)
    }
}

impl<T: Column> Column for Option<T> {
    fn to_value(&self) -> Value {
        self.as_ref().map_or(Value::Null, Column::to_value)
    }

    fn is_zero(&self) -> bool {
        self.is_none()
    }
}

impl<T: Column> Column for Vec<T> {
    fn to_value(&self) -> Value {
        Value::Array(self.iter().map(Column::to_value).collect())
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl<K, V> Column for HashMap<K, V>
where
    K: Serialize + Eq + std::hash::Hash + 'static,
    V: Serialize + 'static,
{
    fn to_value(&self) -> Value {
        json_value(self)
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl<K, V> Column for BTreeMap<K, V>
where
    K: Serialize + Ord + 'static,
    V: Serialize + 'static,
{
    fn to_value(&self) -> Value {
        json_value(self)
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

/// Serialization failures bind as NULL.
fn json_value<T: Serialize + ?Sized>(v: &T) -> Value {
    serde_json::to_value(v).map_or(Value::Null, Value::Json)
}

// ==================== Json<T> ====================

/// A column stored as JSON.
///
/// Serializes transparently, so a record containing `Json<T>` has the same
/// JSON shape as one containing `T`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> std::ops::Deref for Json<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> std::ops::DerefMut for Json<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

impl<T> Column for Json<T>
where
    T: Serialize + Default + PartialEq + 'static,
{
    fn to_value(&self) -> Value {
        json_value(&self.0)
    }

    fn is_zero(&self) -> bool {
        self.0 == T::default()
    }
}

// ==================== FromValue ====================

/// Conversion from a decoded [`Value`] into a field type.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, String>;
}

fn mismatch<T>(expected: &str, got: &Value) -> Result<T, String> {
    Err(format!("expected {expected}, got {}", got.kind_name()))
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, String> {
        Ok(value)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Bool(v) => Ok(v),
            other => mismatch("bool", &other),
        }
    }
}

macro_rules! int_from_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: Value) -> Result<Self, String> {
                    match value.as_i64() {
                        Some(v) => <$ty>::try_from(v).map_err(|e| e.to_string()),
                        None => mismatch(stringify!($ty), &value),
                    }
                }
            }
        )*
    };
}

int_from_value!(i8, u8, i16, u16, i32, u32, i64, u64, usize);

impl FromValue for f32 {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::F32(v) => Ok(v),
            other => mismatch("f32", &other),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::F64(v) => Ok(v),
            Value::F32(v) => Ok(f64::from(v)),
            other => match other.as_i64() {
                Some(v) => Ok(v as f64),
                None => mismatch("f64", &other),
            },
        }
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Text(v) => Ok(v),
            Value::Json(serde_json::Value::String(v)) => Ok(v),
            other => mismatch("text", &other),
        }
    }
}

impl FromValue for Bytes {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Bytes(v) => Ok(Bytes::from(v)),
            other => mismatch("bytes", &other),
        }
    }
}

impl FromValue for Uuid {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Uuid(v) => Ok(v),
            Value::Text(s) => Uuid::parse_str(&s).map_err(|e| e.to_string()),
            other => mismatch("uuid", &other),
        }
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Timestamp(v) => Ok(v),
            Value::TimestampTz(v) => Ok(v.naive_utc()),
            other => mismatch("timestamp", &other),
        }
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::TimestampTz(v) => Ok(v),
            Value::Timestamp(v) => Ok(v.and_utc()),
            other => mismatch("timestamptz", &other),
        }
    }
}

impl FromValue for NaiveDate {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Date(v) => Ok(v),
            other => mismatch("date", &other),
        }
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Json(v) => Ok(v),
            Value::Text(s) => serde_json::from_str(&s).map_err(|e| e.to_string()),
            Value::Null => Ok(serde_json::Value::Null),
            other => mismatch("json", &other),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Array(items) => items.into_iter().map(T::from_value).collect(),
            other => mismatch("array", &other),
        }
    }
}

fn from_json<T: DeserializeOwned>(value: Value) -> Result<T, String> {
    let json = serde_json::Value::from_value(value)?;
    serde_json::from_value(json).map_err(|e| e.to_string())
}

impl<T: DeserializeOwned> FromValue for Json<T> {
    fn from_value(value: Value) -> Result<Self, String> {
        from_json(value).map(Json)
    }
}

impl<K, V> FromValue for HashMap<K, V>
where
    K: DeserializeOwned + Eq + std::hash::Hash,
    V: DeserializeOwned,
{
    fn from_value(value: Value) -> Result<Self, String> {
        from_json(value)
    }
}

impl<K, V> FromValue for BTreeMap<K, V>
where
    K: DeserializeOwned + Ord,
    V: DeserializeOwned,
{
    fn from_value(value: Value) -> Result<Self, String> {
        from_json(value)
    }
}

// ==================== tokio-postgres bindings ====================

type BoxError = Box<dyn Error + Sync + Send>;

impl Value {
    /// Integers widen or narrow to the declared parameter type.
    fn int_to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        let v = self.as_i64().unwrap_or_default();
        if *ty == Type::INT2 {
            i16::try_from(v)?.to_sql(ty, out)
        } else if *ty == Type::INT4 {
            i32::try_from(v)?.to_sql(ty, out)
        } else if *ty == Type::INT8 {
            v.to_sql(ty, out)
        } else if *ty == Type::FLOAT8 {
            (v as f64).to_sql(ty, out)
        } else {
            match self {
                Value::I16(v) => v.to_sql_checked(ty, out),
                Value::I32(v) => v.to_sql_checked(ty, out),
                _ => v.to_sql_checked(ty, out),
            }
        }
    }
}

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(v) => v.to_sql_checked(ty, out),
            Value::F32(v) if *ty == Type::FLOAT8 => f64::from(*v).to_sql(ty, out),
            Value::F32(v) => v.to_sql_checked(ty, out),
            Value::F64(v) => v.to_sql_checked(ty, out),
            Value::Text(v) => v.to_sql_checked(ty, out),
            Value::Bytes(v) => v.to_sql_checked(ty, out),
            Value::Json(v) if <String as ToSql>::accepts(ty) => v.to_string().to_sql(ty, out),
            Value::Json(v) => v.to_sql_checked(ty, out),
            Value::Uuid(v) => v.to_sql_checked(ty, out),
            Value::Timestamp(v) => v.to_sql_checked(ty, out),
            Value::TimestampTz(v) => v.to_sql_checked(ty, out),
            Value::Date(v) => v.to_sql_checked(ty, out),
            Value::Array(items) => items.to_sql(ty, out),
            Value::I16(_) | Value::I32(_) | Value::I64(_) => self.int_to_sql(ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

impl<'a> FromSql<'a> for Value {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, BoxError> {
        if let Kind::Array(_) = ty.kind() {
            return Ok(Value::Array(Vec::<Value>::from_sql(ty, raw)?));
        }
        if let Kind::Enum(_) = ty.kind() {
            return Ok(Value::Text(String::from_sql(ty, raw)?));
        }

        let value = if *ty == Type::BOOL {
            Value::Bool(bool::from_sql(ty, raw)?)
        } else if *ty == Type::INT2 {
            Value::I16(i16::from_sql(ty, raw)?)
        } else if *ty == Type::INT4 {
            Value::I32(i32::from_sql(ty, raw)?)
        } else if *ty == Type::INT8 {
            Value::I64(i64::from_sql(ty, raw)?)
        } else if *ty == Type::OID {
            Value::I64(i64::from(u32::from_sql(ty, raw)?))
        } else if *ty == Type::FLOAT4 {
            Value::F32(f32::from_sql(ty, raw)?)
        } else if *ty == Type::FLOAT8 {
            Value::F64(f64::from_sql(ty, raw)?)
        } else if *ty == Type::BYTEA {
            Value::Bytes(Vec::<u8>::from_sql(ty, raw)?)
        } else if *ty == Type::JSON || *ty == Type::JSONB {
            Value::Json(serde_json::Value::from_sql(ty, raw)?)
        } else if *ty == Type::UUID {
            Value::Uuid(Uuid::from_sql(ty, raw)?)
        } else if *ty == Type::TIMESTAMP {
            Value::Timestamp(NaiveDateTime::from_sql(ty, raw)?)
        } else if *ty == Type::TIMESTAMPTZ {
            Value::TimestampTz(DateTime::<Utc>::from_sql(ty, raw)?)
        } else if *ty == Type::DATE {
            Value::Date(NaiveDate::from_sql(ty, raw)?)
        } else if <String as FromSql>::accepts(ty) {
            Value::Text(String::from_sql(ty, raw)?)
        } else {
            return Err(format!("unsupported column type {ty}").into());
        };
        Ok(value)
    }

    fn from_sql_null(_ty: &Type) -> Result<Self, BoxError> {
        Ok(Value::Null)
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}
