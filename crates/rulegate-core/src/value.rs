//! Untyped configuration values and their coercion rules.

use std::collections::BTreeMap;
use std::fmt;

/// A configuration value as it sits in the tree, before anyone asks for a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// A string scalar.
    String(String),
    /// An integer scalar.
    Int(i64),
    /// A boolean scalar.
    Bool(bool),
    /// A list of strings.
    List(Vec<String>),
    /// A nested map.
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Returns the nested map if this value is one.
    #[must_use]
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Returns true for nested maps.
    #[must_use]
    pub fn is_map(&self) -> bool {
        matches!(self, Self::Map(_))
    }

    /// Coerces this value into the requested kind.
    ///
    /// # Errors
    ///
    /// Returns [`Coercion::Mismatch`] when the value cannot be read as `kind`,
    /// and [`Coercion::Unsupported`] when `kind` is not a scalar or list type.
    pub fn coerce(self, kind: ValueKind) -> Result<Self, Coercion> {
        match (kind, self) {
            (ValueKind::Map, _) => Err(Coercion::Unsupported),
            (ValueKind::String, value @ Self::String(_))
            | (ValueKind::Int, value @ Self::Int(_))
            | (ValueKind::Bool, value @ Self::Bool(_))
            | (ValueKind::List, value @ Self::List(_)) => Ok(value),
            (ValueKind::Bool, Self::String(s)) => match s.as_str() {
                "true" => Ok(Self::Bool(true)),
                "false" => Ok(Self::Bool(false)),
                _ => Err(Coercion::Mismatch),
            },
            (ValueKind::Int, Self::String(s)) => {
                s.parse::<i64>().map(Self::Int).map_err(|_| Coercion::Mismatch)
            }
            (ValueKind::List, Self::String(s)) => Ok(Self::List(split_comma_list(&s))),
            _ => Err(Coercion::Mismatch),
        }
    }
}

/// Splits a comma-separated string into trimmed, non-empty segments.
#[must_use]
pub fn split_comma_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::List(items) => write!(f, "[{}]", items.join(", ")),
            Self::Map(map) => {
                write!(f, "{{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}={value}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<toml::Value> for Value {
    fn from(value: toml::Value) -> Self {
        match value {
            toml::Value::String(s) => Self::String(s),
            toml::Value::Integer(i) => Self::Int(i),
            toml::Value::Boolean(b) => Self::Bool(b),
            toml::Value::Float(f) => Self::String(f.to_string()),
            toml::Value::Datetime(d) => Self::String(d.to_string()),
            toml::Value::Array(items) => Self::List(
                items
                    .into_iter()
                    .map(|item| match item {
                        toml::Value::String(s) => s,
                        other => other.to_string(),
                    })
                    .collect(),
            ),
            toml::Value::Table(table) => Self::Map(
                table
                    .into_iter()
                    .map(|(key, value)| (key, Self::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Vec<String>> for Value {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(value: BTreeMap<String, Value>) -> Self {
        Self::Map(value)
    }
}

/// The shape a caller asks a configuration value to have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// A string.
    String,
    /// An integer.
    Int,
    /// A boolean.
    Bool,
    /// A list of strings.
    List,
    /// A nested map. Never a valid requested type for a property.
    Map,
}

impl ValueKind {
    /// The type name used in error messages.
    #[must_use]
    pub fn type_name(self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Int => "Int",
            Self::Bool => "Boolean",
            Self::List => "List<String>",
            Self::Map => "Map",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Why a coercion failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    /// The value exists but cannot be read as the requested kind.
    Mismatch,
    /// The requested kind is not supported at all.
    Unsupported,
}

/// A Rust type that can be read out of a configuration value.
///
/// Implemented for the closed set of supported property types: `String`,
/// `bool`, the integer types and `Vec<String>`.
pub trait ConfigValue: Sized {
    /// The value kind this type is read from.
    const KIND: ValueKind;

    /// Extracts `Self` from a value already coerced to [`Self::KIND`].
    ///
    /// Returns `None` when the value is out of range for `Self`.
    fn from_value(value: Value) -> Option<Self>;
}

impl ConfigValue for String {
    const KIND: ValueKind = ValueKind::String;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl ConfigValue for bool {
    const KIND: ValueKind = ValueKind::Bool;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(b),
            _ => None,
        }
    }
}

impl ConfigValue for i64 {
    const KIND: ValueKind = ValueKind::Int;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Int(i) => Some(i),
            _ => None,
        }
    }
}

macro_rules! narrowed_int {
    ($($ty:ty),*) => {
        $(
            impl ConfigValue for $ty {
                const KIND: ValueKind = ValueKind::Int;

                fn from_value(value: Value) -> Option<Self> {
                    match value {
                        Value::Int(i) => <$ty>::try_from(i).ok(),
                        _ => None,
                    }
                }
            }
        )*
    };
}

narrowed_int!(i32, u32, usize);

impl ConfigValue for Vec<String> {
    const KIND: ValueKind = ValueKind::List;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::List(items) => Some(items),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_accepts_only_exact_literals() {
        assert_eq!(
            Value::from("true").coerce(ValueKind::Bool),
            Ok(Value::Bool(true))
        );
        assert_eq!(
            Value::from("false").coerce(ValueKind::Bool),
            Ok(Value::Bool(false))
        );
        assert_eq!(
            Value::from("True").coerce(ValueKind::Bool),
            Err(Coercion::Mismatch)
        );
        assert_eq!(
            Value::from("yes").coerce(ValueKind::Bool),
            Err(Coercion::Mismatch)
        );
    }

    #[test]
    fn int_parses_numeric_strings() {
        assert_eq!(Value::from("42").coerce(ValueKind::Int), Ok(Value::Int(42)));
        assert_eq!(
            Value::from("4x2").coerce(ValueKind::Int),
            Err(Coercion::Mismatch)
        );
        assert_eq!(
            Value::Bool(true).coerce(ValueKind::Int),
            Err(Coercion::Mismatch)
        );
    }

    #[test]
    fn string_is_not_produced_from_other_scalars() {
        assert_eq!(
            Value::Int(3).coerce(ValueKind::String),
            Err(Coercion::Mismatch)
        );
    }

    #[test]
    fn list_accepts_comma_separated_string() {
        assert_eq!(
            Value::from(" a, b ,,c ").coerce(ValueKind::List),
            Ok(Value::List(vec!["a".into(), "b".into(), "c".into()]))
        );
    }

    #[test]
    fn map_is_never_a_supported_request() {
        assert_eq!(
            Value::Map(BTreeMap::new()).coerce(ValueKind::Map),
            Err(Coercion::Unsupported)
        );
    }

    #[test]
    fn narrowed_ints_reject_out_of_range() {
        assert_eq!(u32::from_value(Value::Int(-1)), None);
        assert_eq!(usize::from_value(Value::Int(7)), Some(7));
    }

    #[test]
    fn converts_toml_tables() {
        let table: toml::Table = toml::from_str(
            r#"
name = "x"
ratio = 1.5
tags = ["a", 2]
[nested]
on = true
"#,
        )
        .unwrap();
        let value = Value::from(toml::Value::Table(table));
        let map = value.as_map().unwrap();
        assert_eq!(map["name"], Value::from("x"));
        assert_eq!(map["ratio"], Value::from("1.5"));
        assert_eq!(map["tags"], Value::List(vec!["a".into(), "2".into()]));
        assert!(map["nested"].is_map());
    }

    #[test]
    fn display_renders_lists_and_maps() {
        let mut map = BTreeMap::new();
        map.insert("a".to_string(), Value::Int(1));
        assert_eq!(Value::Map(map).to_string(), "{a=1}");
        assert_eq!(
            Value::List(vec!["x".into(), "y".into()]).to_string(),
            "[x, y]"
        );
    }
}
