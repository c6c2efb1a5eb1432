use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// Built-in target types for converted tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    #[default]
    String,
    Int,
    Float,
    Bool,
}

impl ValueType {
    pub fn convert(self, raw: &str) -> Result<Value, String> {
        match self {
            ValueType::String => Ok(Value::String(raw.to_owned())),
            ValueType::Int => raw
                .parse::<i64>()
                .map(Value::from)
                .map_err(|e| e.to_string()),
            ValueType::Float => {
                let x = raw.parse::<f64>().map_err(|e| e.to_string())?;
                Number::from_f64(x)
                    .map(Value::Number)
                    .ok_or_else(|| "not a finite number".to_owned())
            }
            ValueType::Bool => match raw.to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Ok(Value::Bool(true)),
                "false" | "no" | "0" => Ok(Value::Bool(false)),
                _ => Err("expected true or false".to_owned()),
            },
        }
    }

    /// Whether `value` already has this type. Used to check declared defaults.
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            ValueType::String => value.is_string(),
            ValueType::Int => value.is_i64() || value.is_u64(),
            ValueType::Float => value.is_number(),
            ValueType::Bool => value.is_boolean(),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::String => "string",
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::Bool => "bool",
        };
        f.write_str(name)
    }
}

type ConvertFn = dyn Fn(&str) -> Result<Value, String> + Send + Sync;

/// Converts a raw token into a bound value. The error string is the reason
/// reported in `ConversionFailed`.
#[derive(Clone)]
pub struct Converter {
    convert: Arc<ConvertFn>,
}

impl Converter {
    pub fn new<F>(convert: F) -> Self
    where
        F: Fn(&str) -> Result<Value, String> + Send + Sync + 'static,
    {
        Converter {
            convert: Arc::new(convert),
        }
    }

    pub fn apply(&self, raw: &str) -> Result<Value, String> {
        (self.convert)(raw)
    }
}

impl Default for Converter {
    fn default() -> Self {
        ValueType::String.into()
    }
}

impl From<ValueType> for Converter {
    fn from(ty: ValueType) -> Self {
        Converter::new(move |raw| ty.convert(raw))
    }
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Converter")
    }
}
