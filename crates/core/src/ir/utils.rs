//! Common utilities for TypeScript code generation.
//!
//! This module provides shared helper functions used across synthesis and printing.

use super::types::{TsLiteral, TsPrimitive, TsType};
use crate::spec::EnumValue;

/// Check if an identifier needs bracket notation (or quoting) for property/key access.
///
/// Returns true if the name:
/// - Is empty
/// - Doesn't start with a letter, underscore, or dollar sign
/// - Contains characters other than alphanumeric, underscore, or dollar sign
pub fn needs_bracket_notation(name: &str) -> bool {
    name.is_empty()
        || !name
            .chars()
            .next()
            .map(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
            .unwrap_or(false)
        || !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Escape a string for use in JavaScript/TypeScript string literals.
pub fn escape_js_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out
}

/// Quote a string if needed for use as a property key or enum key.
/// Returns the name quoted with escaped special characters if needed,
/// or the original name if it's a valid identifier.
pub fn quote_if_needed(name: &str) -> String {
    if needs_bracket_notation(name) {
        format!("\"{}\"", escape_js_string(name))
    } else {
        name.to_string()
    }
}

/// Capitalize the first letter of a string.
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}

/// Split on every non-alphanumeric character and capitalize each word.
///
/// The rest of each word keeps its case: `guild_id` → `GuildId`,
/// `widget.json` → `WidgetJson`, `@me` → `Me`, `nsfwLevel` → `NsfwLevel`.
pub fn pascal_words(s: &str) -> String {
    s.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(capitalize_first)
        .collect()
}

/// Turn an arbitrary name into a PascalCase TypeScript identifier.
///
/// A leading digit gets an underscore prefix; an empty result becomes `_`.
pub fn pascal_identifier(s: &str) -> String {
    let words = pascal_words(s);
    match words.chars().next() {
        None => "_".to_string(),
        Some(c) if c.is_ascii_digit() => format!("_{words}"),
        Some(_) => words,
    }
}

/// Convert an enum value to a TypeScript literal.
pub fn enum_value_to_literal(v: &EnumValue) -> TsLiteral {
    match v {
        EnumValue::String(s) => TsLiteral::String(s.clone()),
        EnumValue::Integer(n) => TsLiteral::Int(*n),
        EnumValue::Float(f) => TsLiteral::Number(*f),
        EnumValue::Bool(b) => TsLiteral::Bool(*b),
        EnumValue::Null => TsLiteral::Null,
    }
}

/// Generate a key name for an enum value (used in const enum objects).
pub fn enum_value_to_key(v: &EnumValue, index: usize) -> String {
    match v {
        EnumValue::String(s) => quote_if_needed(s),
        EnumValue::Integer(n) if *n < 0 => format!("VALUE_MINUS_{}", n.unsigned_abs()),
        EnumValue::Integer(n) => format!("VALUE_{n}"),
        EnumValue::Float(_) => format!("VALUE_{index}"),
        EnumValue::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        EnumValue::Null => "NULL".to_string(),
    }
}

/// Create a `Record<string, T>` type.
pub fn make_string_record(value_type: TsType) -> TsType {
    TsType::Record {
        key: Box::new(TsType::Primitive(TsPrimitive::String)),
        value: Box::new(value_type),
    }
}

/// Create a `Record<string, unknown>` type (common default for additionalProperties: true).
pub fn make_unknown_record() -> TsType {
    make_string_record(TsType::Primitive(TsPrimitive::Unknown))
}

/// Create a `Record<string, never>` type (an object that admits no keys).
pub fn make_never_record() -> TsType {
    make_string_record(TsType::Primitive(TsPrimitive::Never))
}
