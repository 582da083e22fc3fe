//! Core value types shared by the generator, the syntax writers and the node
//! implementations.

use serde::{Deserialize, Serialize};

/// Value type of a shader expression or declared variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Float,
    Int,
    Bool,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
}

impl ValueType {
    /// Number of scalar components, for vector promotion decisions.
    pub fn components(self) -> usize {
        match self {
            ValueType::Float | ValueType::Int | ValueType::Bool => 1,
            ValueType::Vec2 => 2,
            ValueType::Vec3 => 3,
            ValueType::Vec4 => 4,
            ValueType::Mat4 => 16,
        }
    }

    pub fn is_scalar(self) -> bool {
        matches!(self, ValueType::Float | ValueType::Int | ValueType::Bool)
    }

    pub fn is_vector(self) -> bool {
        matches!(self, ValueType::Vec2 | ValueType::Vec3 | ValueType::Vec4)
    }

    /// Vector type with the given component count (2..=4).
    pub fn vector_of(components: usize) -> Option<ValueType> {
        match components {
            1 => Some(ValueType::Float),
            2 => Some(ValueType::Vec2),
            3 => Some(ValueType::Vec3),
            4 => Some(ValueType::Vec4),
            _ => None,
        }
    }
}

/// A generated expression together with its value type.
///
/// Node implementations produce one of these per output port; downstream
/// nodes read inputs strictly through them.
#[derive(Clone, Debug, PartialEq)]
pub struct TypedExpr {
    pub ty: ValueType,
    pub expr: String,
}

impl TypedExpr {
    pub fn new(expr: impl Into<String>, ty: ValueType) -> Self {
        Self {
            ty,
            expr: expr.into(),
        }
    }
}

/// Format a float the way both WGSL and GLSL accept it, without trailing
/// zeros but always with a decimal point.
pub fn fmt_float(v: f64) -> String {
    if !v.is_finite() {
        return "0.0".to_string();
    }
    let s = format!("{v:.9}");
    let trimmed = s.trim_end_matches('0');
    if trimmed.ends_with('.') {
        format!("{trimmed}0")
    } else {
        trimmed.to_string()
    }
}

/// Sanitize an arbitrary string (typically a node id) into a valid shader
/// identifier fragment.
pub fn sanitize_ident(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            out.push(ch);
        } else {
            out.push('_');
        }
    }
    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fmt_float_trims_trailing_zeros() {
        assert_eq!(fmt_float(1.0), "1.0");
        assert_eq!(fmt_float(0.25), "0.25");
        assert_eq!(fmt_float(-2.5), "-2.5");
        assert_eq!(fmt_float(f64::NAN), "0.0");
    }

    #[test]
    fn sanitize_ident_handles_leading_digits_and_dashes() {
        assert_eq!(sanitize_ident("node-1"), "node_1");
        assert_eq!(sanitize_ident("42ab"), "_42ab");
        assert_eq!(sanitize_ident(""), "_");
    }

    #[test]
    fn vector_of_roundtrips_components() {
        assert_eq!(ValueType::vector_of(3), Some(ValueType::Vec3));
        assert_eq!(ValueType::Vec3.components(), 3);
        assert_eq!(ValueType::vector_of(5), None);
    }
}
