//! Unit-aware animatable values.
//!
//! Style values arrive from the host as serialized strings ("10px",
//! "rgba(0, 0, 0, 1)", "translate(10px, 20px)") and leave as the same.
//! This module parses them into a typed [`Value`], decomposes multi-part
//! strings into a [`ComplexTemplate`] whose numeric and color components
//! can be interpolated independently, and re-serializes the results.

use serde::{Deserialize, Serialize};
use std::fmt;

/// RGBA color with 0-255 channels and 0-1 alpha.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub alpha: f64,
}

impl Rgba {
    pub fn new(red: f64, green: f64, blue: f64, alpha: f64) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Per-channel linear mix towards `to` at progress `t`.
    ///
    /// `t` may overshoot past 1.0 (a spring does); channels are clamped
    /// back into their valid ranges.
    pub fn mix(&self, to: &Rgba, t: f64) -> Rgba {
        let lerp = |a: f64, b: f64| a + (b - a) * t;
        Rgba {
            red: lerp(self.red, to.red).clamp(0.0, 255.0),
            green: lerp(self.green, to.green).clamp(0.0, 255.0),
            blue: lerp(self.blue, to.blue).clamp(0.0, 255.0),
            alpha: lerp(self.alpha, to.alpha).clamp(0.0, 1.0),
        }
    }

    /// Parse `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb(...)` or `rgba(...)`.
    pub fn parse(input: &str) -> Option<Rgba> {
        parse_color_token(input.trim()).and_then(|(color, len)| {
            if len == input.trim().len() {
                Some(color)
            } else {
                None
            }
        })
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rgba({}, {}, {}, {})",
            format_number(self.red.round()),
            format_number(self.green.round()),
            format_number(self.blue.round()),
            format_number(self.alpha)
        )
    }
}

/// A single animatable value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Value {
    /// Plain number, no unit.
    Number { value: f64 },
    /// Number with a unit suffix, e.g. `10px` or `50%`.
    Unit { value: f64, unit: String },
    /// RGBA color.
    Color { rgba: Rgba },
    /// Anything else, kept verbatim. Serialized composite results land
    /// here too.
    Text { value: String },
}

impl Value {
    /// Parse a serialized style value.
    pub fn parse(input: &str) -> Value {
        let trimmed = input.trim();
        if let Some(color) = Rgba::parse(trimmed) {
            return Value::Color { rgba: color };
        }
        if !trimmed.contains(char::is_whitespace) {
            if let Ok(value) = trimmed.parse::<f64>() {
                return Value::Number { value };
            }
            if let Some((value, unit)) = split_unit(trimmed) {
                return Value::Unit { value, unit };
            }
        }
        Value::Text {
            value: trimmed.to_string(),
        }
    }

    /// Numeric magnitude, for `Number` and `Unit` values.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number { value } => Some(*value),
            Value::Unit { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn unit(&self) -> Option<&str> {
        match self {
            Value::Unit { unit, .. } => Some(unit),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<Rgba> {
        match self {
            Value::Color { rgba } => Some(*rgba),
            _ => None,
        }
    }

    pub fn is_color(&self) -> bool {
        matches!(self, Value::Color { .. })
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Number { .. } | Value::Unit { .. })
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number { value } => write!(f, "{}", format_number(*value)),
            Value::Unit { value, unit } => write!(f, "{}{}", format_number(*value), unit),
            Value::Color { rgba } => write!(f, "{}", rgba),
            Value::Text { value } => write!(f, "{}", value),
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number { value }
    }
}

impl From<Rgba> for Value {
    fn from(rgba: Rgba) -> Self {
        Value::Color { rgba }
    }
}

/// One interpolatable component of a composite value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ComplexComponent {
    Number(f64),
    Color(Rgba),
}

/// A multi-part value split into literal text and interpolatable
/// components.
///
/// `literals` always has one more entry than `components`; serializing
/// interleaves them back together. Units stay inside the literal segments,
/// so components are bare numbers.
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexTemplate {
    literals: Vec<String>,
    components: Vec<ComplexComponent>,
}

impl ComplexTemplate {
    /// Decompose a serialized value. Returns `None` when the input holds
    /// no interpolatable components at all.
    pub fn parse(input: &str) -> Option<ComplexTemplate> {
        let mut literals = vec![String::new()];
        let mut components = Vec::new();
        let mut rest = input;

        while !rest.is_empty() {
            if let Some((color, len)) = parse_color_token(rest) {
                components.push(ComplexComponent::Color(color));
                literals.push(String::new());
                rest = &rest[len..];
                continue;
            }
            let prev_alphanumeric = literals
                .last()
                .and_then(|l| l.chars().last())
                .is_some_and(|c| c.is_ascii_alphanumeric());
            if !prev_alphanumeric {
                if let Some((number, len)) = parse_number_token(rest) {
                    components.push(ComplexComponent::Number(number));
                    literals.push(String::new());
                    rest = &rest[len..];
                    continue;
                }
            }
            let ch = rest.chars().next().expect("non-empty remainder");
            literals
                .last_mut()
                .expect("at least one literal segment")
                .push(ch);
            rest = &rest[ch.len_utf8()..];
        }

        if components.is_empty() {
            None
        } else {
            Some(ComplexTemplate {
                literals,
                components,
            })
        }
    }

    pub fn components(&self) -> &[ComplexComponent] {
        &self.components
    }

    /// Same component count and kinds, position by position.
    pub fn matches_structure(&self, other: &ComplexTemplate) -> bool {
        self.components.len() == other.components.len()
            && self
                .components
                .iter()
                .zip(other.components.iter())
                .all(|(a, b)| {
                    matches!(
                        (a, b),
                        (ComplexComponent::Number(_), ComplexComponent::Number(_))
                            | (ComplexComponent::Color(_), ComplexComponent::Color(_))
                    )
                })
    }

    /// Re-serialize with substituted component values.
    pub fn serialize(&self, values: &[ComplexComponent]) -> String {
        debug_assert_eq!(values.len(), self.components.len());
        let mut result = String::new();
        for (index, literal) in self.literals.iter().enumerate() {
            result.push_str(literal);
            if let Some(component) = values.get(index) {
                match component {
                    ComplexComponent::Number(value) => result.push_str(&format_number(*value)),
                    ComplexComponent::Color(color) => result.push_str(&color.to_string()),
                }
            }
        }
        result
    }
}

/// One property's value at one generated frame.
///
/// A frame with no value only occupies time; wait behaviors produce those.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleFrame {
    pub property: String,
    pub value: Option<Value>,
    pub velocity: f64,
}

impl SimpleFrame {
    pub fn new(property: impl Into<String>, value: Value) -> Self {
        Self {
            property: property.into(),
            value: Some(value),
            velocity: 0.0,
        }
    }

    pub fn empty(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            value: None,
            velocity: 0.0,
        }
    }
}

/// Map shorthand property names onto their canonical transform parts.
pub fn normalize_property(property: &str) -> &str {
    match property {
        "x" => "translateX",
        "y" => "translateY",
        "z" => "translateZ",
        other => other,
    }
}

/// camelCase to kebab-case, for style-map lookups.
pub fn dasherize(property: &str) -> String {
    let mut result = String::with_capacity(property.len() + 4);
    for ch in property.chars() {
        if ch.is_ascii_uppercase() {
            result.push('-');
            result.push(ch.to_ascii_lowercase());
        } else {
            result.push(ch);
        }
    }
    result
}

fn format_number(value: f64) -> String {
    if value == 0.0 {
        // Avoid "-0"
        "0".to_string()
    } else {
        format!("{}", value)
    }
}

/// Split a token like `10px` into magnitude and unit suffix.
fn split_unit(token: &str) -> Option<(f64, String)> {
    let (number, len) = parse_number_token(token)?;
    let unit = &token[len..];
    if unit.is_empty() || unit.chars().any(|c| c.is_whitespace()) {
        return None;
    }
    Some((number, unit.to_string()))
}

/// Parse a leading float literal; returns the value and its byte length.
fn parse_number_token(input: &str) -> Option<(f64, usize)> {
    let bytes = input.as_bytes();
    let mut index = 0;
    if index < bytes.len() && (bytes[index] == b'-' || bytes[index] == b'+') {
        index += 1;
    }
    let digits_start = index;
    let mut seen_dot = false;
    while index < bytes.len() {
        let b = bytes[index];
        if b.is_ascii_digit() {
            index += 1;
        } else if b == b'.' && !seen_dot {
            seen_dot = true;
            index += 1;
        } else {
            break;
        }
    }
    if index == digits_start || !bytes[digits_start..index].iter().any(u8::is_ascii_digit) {
        return None;
    }
    input[..index].parse::<f64>().ok().map(|v| (v, index))
}

/// Parse a leading color literal; returns the color and its byte length.
fn parse_color_token(input: &str) -> Option<(Rgba, usize)> {
    if let Some(rest) = input.strip_prefix('#') {
        let len = rest.chars().take_while(|c| c.is_ascii_hexdigit()).count();
        let hex = &rest[..len];
        let color = match len {
            3 | 4 => {
                let channel = |i: usize| {
                    u8::from_str_radix(&hex[i..i + 1], 16)
                        .map(|v| (v * 17) as f64)
                        .ok()
                };
                Some(Rgba::new(
                    channel(0)?,
                    channel(1)?,
                    channel(2)?,
                    if len == 4 { channel(3)? / 255.0 } else { 1.0 },
                ))
            }
            6 | 8 => {
                let channel =
                    |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map(f64::from).ok();
                Some(Rgba::new(
                    channel(0)?,
                    channel(2)?,
                    channel(4)?,
                    if len == 8 { channel(6)? / 255.0 } else { 1.0 },
                ))
            }
            _ => None,
        };
        return color.map(|c| (c, 1 + len));
    }

    for prefix in ["rgba(", "rgb("] {
        if let Some(rest) = input.strip_prefix(prefix) {
            let close = rest.find(')')?;
            let parts: Vec<f64> = rest[..close]
                .split(',')
                .map(|p| p.trim().parse::<f64>())
                .collect::<Result<_, _>>()
                .ok()?;
            let color = match parts.as_slice() {
                [r, g, b] => Rgba::new(*r, *g, *b, 1.0),
                [r, g, b, a] => Rgba::new(*r, *g, *b, *a),
                _ => return None,
            };
            return Some((color, prefix.len() + close + 1));
        }
    }
    None
}
