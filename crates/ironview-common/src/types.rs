//! Logical type system for IronView
//!
//! Every catalog column has a LogicalType. Column types arrive from the
//! metastore as textual type descriptors (`int`, `decimal(10,2)`,
//! `map<string,array<int>>`, ...) and are mapped with
//! [`LogicalType::from_type_descriptor`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// The logical type of a catalog column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalType {
    /// Boolean (true/false)
    Boolean,

    // ============================================
    // Numeric types
    // ============================================
    /// 8-bit signed integer
    TinyInt,
    /// 16-bit signed integer
    SmallInt,
    /// 32-bit signed integer
    Integer,
    /// 64-bit signed integer
    BigInt,
    /// 32-bit IEEE 754 floating point
    Float,
    /// 64-bit IEEE 754 floating point
    Double,
    /// Fixed-point decimal
    /// - width: total number of digits (1-38)
    /// - scale: digits after decimal point
    Decimal { width: u8, scale: u8 },

    // ============================================
    // String types
    // ============================================
    /// Unbounded string (UTF-8)
    Varchar,
    /// String with a maximum length
    BoundedVarchar(u32),
    /// Fixed-length, blank padded string
    Char(u32),
    /// Binary large object
    Blob,

    // ============================================
    // Date/Time types
    // ============================================
    Date,
    /// Timestamp without timezone
    Timestamp,

    // ============================================
    // Nested types
    // ============================================
    /// Variable-length list of elements of the same type
    List(Box<LogicalType>),

    /// Map from key type to value type
    Map {
        key: Box<LogicalType>,
        value: Box<LogicalType>,
    },

    /// Struct with named fields
    Struct(Vec<(String, LogicalType)>),
}

const DEFAULT_DECIMAL_WIDTH: u8 = 10;
const MAX_DECIMAL_WIDTH: u8 = 38;
const MAX_VARCHAR_LENGTH: u32 = 65535;
const MAX_CHAR_LENGTH: u32 = 255;

impl LogicalType {
    /// Map a metastore type descriptor to a logical type.
    ///
    /// Keywords are matched case-insensitively, struct field names keep their
    /// case. Returns None for anything the catalog cannot represent.
    pub fn from_type_descriptor(descriptor: &str) -> Option<LogicalType> {
        let descriptor = descriptor.trim();
        let (head, args) = match descriptor.find(['<', '(']) {
            Some(pos) => (&descriptor[..pos], Some(descriptor[pos..].trim())),
            None => (descriptor, None),
        };

        match (head.trim().to_ascii_lowercase().as_str(), args) {
            ("boolean", None) => Some(LogicalType::Boolean),
            ("tinyint", None) => Some(LogicalType::TinyInt),
            ("smallint", None) => Some(LogicalType::SmallInt),
            ("int" | "integer", None) => Some(LogicalType::Integer),
            ("bigint", None) => Some(LogicalType::BigInt),
            ("float", None) => Some(LogicalType::Float),
            ("double", None) => Some(LogicalType::Double),
            ("string", None) => Some(LogicalType::Varchar),
            ("binary", None) => Some(LogicalType::Blob),
            ("date", None) => Some(LogicalType::Date),
            ("timestamp", None) => Some(LogicalType::Timestamp),
            ("decimal", None) => Some(LogicalType::Decimal {
                width: DEFAULT_DECIMAL_WIDTH,
                scale: 0,
            }),
            ("decimal", Some(args)) => parse_decimal(enclosed(args, '(', ')')?),
            ("varchar", Some(args)) => {
                let length = parse_length(enclosed(args, '(', ')')?, MAX_VARCHAR_LENGTH)?;
                Some(LogicalType::BoundedVarchar(length))
            }
            ("char", Some(args)) => {
                let length = parse_length(enclosed(args, '(', ')')?, MAX_CHAR_LENGTH)?;
                Some(LogicalType::Char(length))
            }
            ("array", Some(args)) => {
                let element = LogicalType::from_type_descriptor(enclosed(args, '<', '>')?)?;
                Some(LogicalType::List(Box::new(element)))
            }
            ("map", Some(args)) => {
                let parts = split_top_level(enclosed(args, '<', '>')?)?;
                let [key, value] = parts.as_slice() else {
                    return None;
                };
                Some(LogicalType::Map {
                    key: Box::new(LogicalType::from_type_descriptor(key)?),
                    value: Box::new(LogicalType::from_type_descriptor(value)?),
                })
            }
            ("struct", Some(args)) => {
                let mut fields = Vec::new();
                for part in split_top_level(enclosed(args, '<', '>')?)? {
                    let (name, field_type) = part.split_once(':')?;
                    let name = name.trim();
                    if name.is_empty() {
                        return None;
                    }
                    fields.push((
                        name.to_string(),
                        LogicalType::from_type_descriptor(field_type)?,
                    ));
                }
                Some(LogicalType::Struct(fields))
            }
            _ => None,
        }
    }
}

/// Strip the surrounding `open`/`close` pair from a type argument list
fn enclosed(args: &str, open: char, close: char) -> Option<&str> {
    args.strip_prefix(open)?.strip_suffix(close)
}

/// Split on commas that are not nested inside `<>` or `()`.
/// Returns None when the brackets do not balance or a part is empty.
fn split_top_level(input: &str) -> Option<Vec<&str>> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, ch) in input.char_indices() {
        match ch {
            '<' | '(' => depth += 1,
            '>' | ')' => depth = depth.checked_sub(1)?,
            ',' if depth == 0 => {
                parts.push(input[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return None;
    }
    parts.push(input[start..].trim());
    if parts.iter().any(|p| p.is_empty()) {
        return None;
    }
    Some(parts)
}

fn parse_decimal(args: &str) -> Option<LogicalType> {
    let parts = split_top_level(args)?;
    let (width, scale) = match parts.as_slice() {
        [width] => (width.parse::<u8>().ok()?, 0),
        [width, scale] => (width.parse::<u8>().ok()?, scale.parse::<u8>().ok()?),
        _ => return None,
    };
    if width == 0 || width > MAX_DECIMAL_WIDTH || scale > width {
        return None;
    }
    Some(LogicalType::Decimal { width, scale })
}

fn parse_length(args: &str, max: u32) -> Option<u32> {
    let length = args.trim().parse::<u32>().ok()?;
    (1..=max).contains(&length).then_some(length)
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalType::Boolean => write!(f, "BOOLEAN"),
            LogicalType::TinyInt => write!(f, "TINYINT"),
            LogicalType::SmallInt => write!(f, "SMALLINT"),
            LogicalType::Integer => write!(f, "INT"),
            LogicalType::BigInt => write!(f, "BIGINT"),
            LogicalType::Float => write!(f, "FLOAT"),
            LogicalType::Double => write!(f, "DOUBLE"),
            LogicalType::Decimal { width, scale } => write!(f, "DECIMAL({},{})", width, scale),
            LogicalType::Varchar => write!(f, "STRING"),
            LogicalType::BoundedVarchar(len) => write!(f, "VARCHAR({})", len),
            LogicalType::Char(len) => write!(f, "CHAR({})", len),
            LogicalType::Blob => write!(f, "BINARY"),
            LogicalType::Date => write!(f, "DATE"),
            LogicalType::Timestamp => write!(f, "TIMESTAMP"),
            LogicalType::List(inner) => write!(f, "ARRAY<{}>", inner),
            LogicalType::Map { key, value } => write!(f, "MAP<{},{}>", key, value),
            LogicalType::Struct(fields) => {
                write!(f, "STRUCT<")?;
                for (i, (name, ty)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}:{}", name, ty)?;
                }
                write!(f, ">")
            }
        }
    }
}
