//! Positional message parameters.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single positional parameter substituted into a message template.
///
/// Each placeholder in a template accepts a specific set of variants; the
/// renderer rejects mismatches instead of coercing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LogParam {
    /// Boolean value
    Bool(bool),
    /// Signed integer value
    Int(i64),
    /// Floating-point value
    Float(f64),
    /// Single character
    Char(char),
    /// Text value
    Str(String),
}

impl LogParam {
    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            LogParam::Bool(_) => "bool",
            LogParam::Int(_) => "integer",
            LogParam::Float(_) => "float",
            LogParam::Char(_) => "char",
            LogParam::Str(_) => "string",
        }
    }
}

impl fmt::Display for LogParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogParam::Bool(b) => write!(f, "{}", b),
            LogParam::Int(i) => write!(f, "{}", i),
            LogParam::Float(x) => write!(f, "{:?}", x),
            LogParam::Char(c) => write!(f, "{}", c),
            LogParam::Str(s) => f.write_str(s),
        }
    }
}

impl From<bool> for LogParam {
    fn from(b: bool) -> Self {
        LogParam::Bool(b)
    }
}

impl From<char> for LogParam {
    fn from(c: char) -> Self {
        LogParam::Char(c)
    }
}

impl From<&str> for LogParam {
    fn from(s: &str) -> Self {
        LogParam::Str(s.to_string())
    }
}

impl From<String> for LogParam {
    fn from(s: String) -> Self {
        LogParam::Str(s)
    }
}

impl From<&String> for LogParam {
    fn from(s: &String) -> Self {
        LogParam::Str(s.clone())
    }
}

macro_rules! int_param {
    ($($t:ty),*) => {
        $(
            impl From<$t> for LogParam {
                fn from(v: $t) -> Self {
                    LogParam::Int(v as i64)
                }
            }
        )*
    };
}

int_param!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl From<f32> for LogParam {
    fn from(v: f32) -> Self {
        LogParam::Float(v as f64)
    }
}

impl From<f64> for LogParam {
    fn from(v: f64) -> Self {
        LogParam::Float(v)
    }
}

/// Build a `Vec<LogParam>` from a list of convertible values.
///
/// # Example
///
/// ```
/// use catlog_types::{params, LogParam};
///
/// let p = params!["disk", 3, 0.5];
/// assert_eq!(p, vec![LogParam::Str("disk".into()), LogParam::Int(3), LogParam::Float(0.5)]);
/// ```
#[macro_export]
macro_rules! params {
    () => {
        ::std::vec::Vec::<$crate::LogParam>::new()
    };
    ($($value:expr),+ $(,)?) => {
        vec![$($crate::LogParam::from($value)),+]
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(LogParam::from("x").to_string(), "x");
        assert_eq!(LogParam::from(12u16).to_string(), "12");
        assert_eq!(LogParam::from(1.0).to_string(), "1.0");
        assert_eq!(LogParam::from(true).to_string(), "true");
    }

    #[test]
    fn test_params_macro() {
        let empty = params![];
        assert!(empty.is_empty());

        let p = params!['c', -4i8, String::from("s")];
        assert_eq!(p[0].kind(), "char");
        assert_eq!(p[1], LogParam::Int(-4));
        assert_eq!(p[2].kind(), "string");
    }
}
