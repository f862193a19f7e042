//! Runtime values and argument bags.
//!
//! [`Value`] is the dynamically typed value that flows from an argument bag
//! ([`Args`]) or a transformer into the positional parameter list handed to a
//! [`Connection`](crate::Connection). It implements `tokio_postgres::types::ToSql`
//! and adapts itself to the parameter type Postgres inferred for each `$n`.

use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};

/// A dynamically typed SQL parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL `NULL`
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// Calendar date without time zone
    Date(NaiveDate),
    /// Point in time (UTC)
    Timestamp(DateTime<Utc>),
    Json(serde_json::Value),
}

impl Value {
    /// Short name of the variant, used in validation messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Text(_) => "string",
            Value::Date(_) => "date",
            Value::Timestamp(_) => "timestamp",
            Value::Json(_) => "json",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Infer a scalar value from JSON.
    ///
    /// Numbers become `Int` when they fit an `i64` and `Float` otherwise,
    /// strings become `Text`. Arrays and objects stay `Json`.
    /// Use `Value::from(json)` to always keep the `Json` variant.
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => n.as_f64().map(Value::Float).unwrap_or(Value::Null),
            },
            serde_json::Value::String(s) => Value::Text(s),
            other => Value::Json(other),
        }
    }
}

/// Parse the textual date forms accepted by `date` placeholders.
///
/// Accepts RFC 3339, `YYYY-MM-DD`, and `YYYY-MM-DD HH:MM:SS[.f]` (space or `T`).
pub fn parse_date_text(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|dt| dt.and_utc())
}

/// Renders the value as raw SQL text (used for raw template interpolation).
///
/// No quoting or escaping is applied.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(n) => write!(f, "{n}"),
            Value::Text(s) => f.write_str(s),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Timestamp(ts) => f.write_str(&ts.to_rfc3339()),
            Value::Json(v) => write!(f, "{v}"),
        }
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::Int(i64::from(v))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Json(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

type BoxError = Box<dyn Error + Sync + Send>;

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(b) => {
                if <&str as ToSql>::accepts(ty) {
                    b.to_string().to_sql(ty, out)
                } else {
                    b.to_sql_checked(ty, out)
                }
            }
            Value::Int(n) => int_to_sql(*n, ty, out),
            Value::Float(n) => float_to_sql(*n, ty, out),
            Value::Text(s) => text_to_sql(s, ty, out),
            Value::Date(d) => {
                if *ty == Type::TIMESTAMP || *ty == Type::TIMESTAMPTZ {
                    let midnight = d.and_hms_opt(0, 0, 0).ok_or("invalid date")?;
                    Value::Timestamp(midnight.and_utc()).to_sql(ty, out)
                } else {
                    d.to_sql_checked(ty, out)
                }
            }
            Value::Timestamp(ts) => {
                if *ty == Type::TIMESTAMP {
                    ts.naive_utc().to_sql(ty, out)
                } else if *ty == Type::DATE {
                    ts.date_naive().to_sql(ty, out)
                } else {
                    ts.to_sql_checked(ty, out)
                }
            }
            Value::Json(v) => {
                if <&str as ToSql>::accepts(ty) {
                    v.to_string().to_sql(ty, out)
                } else {
                    v.to_sql_checked(ty, out)
                }
            }
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

fn int_to_sql(n: i64, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    if *ty == Type::INT2 {
        i16::try_from(n)?.to_sql(ty, out)
    } else if *ty == Type::INT4 {
        i32::try_from(n)?.to_sql(ty, out)
    } else if *ty == Type::FLOAT4 {
        (n as f32).to_sql(ty, out)
    } else if *ty == Type::FLOAT8 {
        (n as f64).to_sql(ty, out)
    } else if *ty == Type::NUMERIC {
        Decimal::from(n).to_sql(ty, out)
    } else if <&str as ToSql>::accepts(ty) {
        n.to_string().to_sql(ty, out)
    } else {
        n.to_sql_checked(ty, out)
    }
}

// `integer` placeholders accept floats without a fractional part, so those
// must encode to the integer types too.
fn float_to_sql(n: f64, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    let is_int_type = *ty == Type::INT2 || *ty == Type::INT4 || *ty == Type::INT8;
    if is_int_type {
        // `i64::MAX as f64` rounds up to 2^63, which is already out of range.
        if n.fract() == 0.0 && n >= i64::MIN as f64 && n < i64::MAX as f64 {
            return int_to_sql(n as i64, ty, out);
        }
        return Err(format!("{n} is not an integer in the range of {ty}").into());
    }

    if *ty == Type::FLOAT4 {
        (n as f32).to_sql(ty, out)
    } else if *ty == Type::NUMERIC {
        // Display is the shortest text that round-trips, so 9.99 stays 9.99.
        n.to_string().parse::<Decimal>()?.to_sql(ty, out)
    } else if <&str as ToSql>::accepts(ty) {
        n.to_string().to_sql(ty, out)
    } else {
        n.to_sql_checked(ty, out)
    }
}

// Text is the common currency of raw templates and file-loaded args, so it is
// converted when Postgres expects a date, timestamp or JSON parameter.
fn text_to_sql(s: &str, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    if *ty == Type::JSON || *ty == Type::JSONB {
        let json: serde_json::Value = serde_json::from_str(s)?;
        return json.to_sql(ty, out);
    }
    if *ty == Type::DATE || *ty == Type::TIMESTAMP || *ty == Type::TIMESTAMPTZ {
        let ts = parse_date_text(s).ok_or_else(|| format!("invalid date/time text: {s}"))?;
        return Value::Timestamp(ts).to_sql(ty, out);
    }
    s.to_sql_checked(ty, out)
}

/// A runtime argument bag: placeholder name -> value.
///
/// # Example
///
/// ```ignore
/// let args = Args::new().with("id", 1).with("status", "active");
/// let rows = find_user.invoke(&args).await?;
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    values: BTreeMap<String, Value>,
}

impl Args {
    /// Create an empty argument bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value and return `self` (builder style).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Insert a value, returning the previous one for this name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Args {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Args {
    type Item = (&'a String, &'a Value);
    type IntoIter = std::collections::btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

/// Build an [`Args`] bag inline.
///
/// ```ignore
/// let args = sqlify::args! { "id" => 1, "flag" => true };
/// ```
#[macro_export]
macro_rules! args {
    () => { $crate::Args::new() };
    ($($name:expr => $value:expr),+ $(,)?) => {{
        let mut args = $crate::Args::new();
        $( args.insert($name, $value); )+
        args
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_json_infers_scalars() {
        assert_eq!(Value::from_json(serde_json::json!(3)), Value::Int(3));
        assert_eq!(Value::from_json(serde_json::json!(3.5)), Value::Float(3.5));
        assert_eq!(Value::from_json(serde_json::json!("x")), Value::Text("x".into()));
        assert_eq!(Value::from_json(serde_json::json!(null)), Value::Null);
        assert_eq!(
            Value::from_json(serde_json::json!({"a": 1})),
            Value::Json(serde_json::json!({"a": 1}))
        );
    }

    #[test]
    fn display_is_raw_sql_text() {
        assert_eq!(Value::from("users").to_string(), "users");
        assert_eq!(Value::from(42).to_string(), "42");
        assert_eq!(Value::Null.to_string(), "NULL");
        let d = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert_eq!(Value::from(d).to_string(), "2024-01-31");
    }

    #[test]
    fn option_maps_none_to_null() {
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(Some(7)), Value::Int(7));
    }

    #[test]
    fn parse_date_text_accepts_common_forms() {
        assert!(parse_date_text("2024-01-31").is_some());
        assert!(parse_date_text("2024-01-31T10:20:30Z").is_some());
        assert!(parse_date_text("2024-01-31 10:20:30").is_some());
        assert!(parse_date_text("2024-01-31T10:20:30.125").is_some());
        assert!(parse_date_text("yesterday").is_none());
        assert!(parse_date_text("2024-13-01").is_none());
    }

    #[test]
    fn args_macro_and_builder_agree() {
        let a = crate::args! { "id" => 1, "name" => "x" };
        let b = Args::new().with("name", "x").with("id", 1);
        assert_eq!(a, b);
        assert_eq!(a.len(), 2);
        assert!(a.contains("id"));
        assert_eq!(a.get("name").and_then(Value::as_str), Some("x"));
    }

    #[test]
    fn int_binds_to_narrower_integer_types() {
        let mut out = BytesMut::new();
        Value::Int(7).to_sql(&Type::INT4, &mut out).unwrap();
        assert_eq!(&out[..], &7_i32.to_be_bytes());

        let mut out = BytesMut::new();
        assert!(Value::Int(i64::MAX).to_sql(&Type::INT2, &mut out).is_err());
    }

    #[test]
    fn integral_float_binds_to_integer_types() {
        let mut out = BytesMut::new();
        Value::Float(3.0).to_sql_checked(&Type::INT4, &mut out).unwrap();
        assert_eq!(&out[..], &3_i32.to_be_bytes());

        let mut out = BytesMut::new();
        Value::Float(-2.0).to_sql_checked(&Type::INT8, &mut out).unwrap();
        assert_eq!(&out[..], &(-2_i64).to_be_bytes());

        let mut out = BytesMut::new();
        assert!(Value::Float(3.5).to_sql_checked(&Type::INT4, &mut out).is_err());
        let mut out = BytesMut::new();
        assert!(Value::Float(1e19).to_sql_checked(&Type::INT8, &mut out).is_err());
        let mut out = BytesMut::new();
        assert!(Value::Float(70000.0).to_sql_checked(&Type::INT2, &mut out).is_err());
    }

    #[test]
    fn numbers_bind_to_numeric() {
        use tokio_postgres::types::FromSql;

        let round_trip = |value: Value| {
            let mut out = BytesMut::new();
            value.to_sql_checked(&Type::NUMERIC, &mut out).unwrap();
            Decimal::from_sql(&Type::NUMERIC, &out).unwrap()
        };
        assert_eq!(round_trip(Value::Float(9.99)), Decimal::new(999, 2));
        assert_eq!(round_trip(Value::Int(42)), Decimal::from(42));
        assert_eq!(round_trip(Value::Float(-0.5)), Decimal::new(-5, 1));

        let mut out = BytesMut::new();
        assert!(Value::Float(f64::NAN).to_sql_checked(&Type::NUMERIC, &mut out).is_err());
    }

    #[test]
    fn scalars_fall_back_to_text_parameters() {
        let mut out = BytesMut::new();
        Value::Bool(true).to_sql_checked(&Type::TEXT, &mut out).unwrap();
        assert_eq!(&out[..], b"true");

        let mut out = BytesMut::new();
        Value::Float(1.5).to_sql_checked(&Type::VARCHAR, &mut out).unwrap();
        assert_eq!(&out[..], b"1.5");

        let mut out = BytesMut::new();
        Value::Bool(false).to_sql_checked(&Type::BOOL, &mut out).unwrap();
        assert_eq!(&out[..], &[0]);
    }

    #[test]
    fn text_is_parsed_for_json_parameters() {
        let mut out = BytesMut::new();
        let res = Value::from("{\"a\":1}").to_sql(&Type::JSONB, &mut out);
        assert!(res.is_ok());

        let mut out = BytesMut::new();
        assert!(Value::from("{oops").to_sql(&Type::JSONB, &mut out).is_err());
    }

    #[test]
    fn text_rejects_non_text_targets() {
        let mut out = BytesMut::new();
        assert!(Value::from("abc").to_sql(&Type::INT4, &mut out).is_err());
    }
}
