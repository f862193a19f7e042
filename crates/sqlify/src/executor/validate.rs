use crate::error::{SqlifyError, SqlifyResult};
use crate::template::ParamType;
use crate::value::{Value, parse_date_text};

/// Check a bound value against the declared placeholder type.
///
/// - `integer`: an `Int`, or a `Float` without fractional part
/// - `float`: any number
/// - `boolean`: a `Bool`
/// - `date`: a `Date`/`Timestamp`, or text that parses as a date
/// - `json`: text must parse as JSON, other values pass unchecked
/// - `string`: no check
pub(crate) fn validate(name: &str, ty: ParamType, value: &Value) -> SqlifyResult<()> {
    let ok = match (ty, value) {
        (ParamType::String, _) => true,
        (ParamType::Integer, Value::Int(_)) => true,
        (ParamType::Integer, Value::Float(f)) => f.is_finite() && f.fract() == 0.0,
        (ParamType::Float, Value::Int(_) | Value::Float(_)) => true,
        (ParamType::Boolean, Value::Bool(_)) => true,
        (ParamType::Date, Value::Date(_) | Value::Timestamp(_)) => true,
        (ParamType::Date, Value::Text(s)) => parse_date_text(s).is_some(),
        (ParamType::Json, Value::Text(s)) => {
            return serde_json::from_str::<serde_json::Value>(s)
                .map(|_| ())
                .map_err(|e| SqlifyError::MalformedJson {
                    name: name.to_string(),
                    message: e.to_string(),
                });
        }
        (ParamType::Json, _) => true,
        _ => false,
    };

    if ok {
        Ok(())
    } else {
        Err(SqlifyError::type_validation(name, ty, describe(value)))
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "got null".to_string(),
        Value::Text(s) => format!("got string {s:?}"),
        Value::Json(_) => "got json".to_string(),
        other => format!("got {} {other}", other.kind()),
    }
}
