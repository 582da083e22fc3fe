//! Per-target source writers.
//!
//! A `Syntax` implementation owns every target-specific spelling decision:
//! type names, literal and constructor formatting, how attributes and
//! varyings are referenced from the body, and final stage assembly. Node
//! implementations that go through this trait work for every target they are
//! registered under; only genuinely target-bound nodes (texture sampling,
//! helper-function sources) carry per-target code.

pub mod glsl;
pub mod wgsl;

use std::sync::Arc;

use super::error::CodegenError;
use super::stage::{Shader, StageId};
use super::types::{TypedExpr, ValueType};

/// Physical names seeded by the orchestrator during `Init`. The stage
/// writers reference them in their fixed entry-point boilerplate.
pub const POSITION_ATTRIBUTE: &str = "i_position";
pub const VIEW_PROJECTION_UNIFORM: &str = "u_view_projection_matrix";

pub trait Syntax: Send + Sync + std::fmt::Debug {
    /// Target language identifier this writer serves.
    fn target(&self) -> &'static str;

    fn type_name(&self, ty: ValueType) -> &'static str;

    /// Format a JSON literal (node param or port default) as a source
    /// expression of the given type. `None` when the JSON shape does not fit.
    fn literal(&self, ty: ValueType, value: &serde_json::Value) -> Option<String>;

    /// Constructor expression, e.g. `vec3f(a, b, c)` / `vec3(a, b, c)`.
    fn constructor(&self, ty: ValueType, args: &[&str]) -> String;

    /// Splat a scalar expression to a vector type.
    fn splat(&self, ty: ValueType, scalar_expr: &str) -> String {
        self.constructor(ty, &[scalar_expr])
    }

    /// Immutable local declaration statement for the body block.
    fn local_decl(&self, name: &str, ty: ValueType, expr: &str) -> String;

    /// Reference a vertex input attribute from the vertex body.
    fn attribute_ref(&self, physical: &str) -> String;

    /// Reference an interpolant from the fragment body.
    fn varying_ref(&self, physical: &str) -> String;

    /// Vertex-stage statement writing an interpolant.
    fn varying_assign(&self, physical: &str, expr: &str) -> String;

    /// Texture sampling expression (always vec4).
    fn sample_texture(&self, texture: &str, sampler: &str, uv: &str) -> String;

    /// Convert an arbitrary expression to the vec4 color the fragment stage
    /// returns. `None` when the type has no sensible color interpretation.
    fn to_vec4_color(&self, value: &TypedExpr) -> Option<String>;

    /// Serialize one completed stage: declaration blocks in fixed order
    /// (uniforms, attributes/varyings, functions), then the body.
    /// `frag_return` is the already-converted vec4 expression the fragment
    /// entry point returns; ignored for the vertex stage.
    fn write_stage(&self, shader: &Shader, stage_id: StageId, frag_return: &str) -> String;
}

/// Look up the built-in writer for a target language.
pub fn for_target(target: &str) -> Result<Arc<dyn Syntax>, CodegenError> {
    match target {
        wgsl::TARGET => Ok(Arc::new(wgsl::WgslSyntax)),
        glsl::TARGET => Ok(Arc::new(glsl::GlslSyntax)),
        other => Err(CodegenError::UnknownTarget {
            target: other.to_string(),
        }),
    }
}

pub(crate) fn json_number(value: &serde_json::Value) -> Option<f64> {
    value
        .as_f64()
        .or_else(|| value.as_i64().map(|v| v as f64))
        .or_else(|| value.as_u64().map(|v| v as f64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_target_is_rejected() {
        let err = for_target("msl").unwrap_err();
        assert!(matches!(err, CodegenError::UnknownTarget { .. }));
    }

    #[test]
    fn builtin_targets_resolve() {
        assert_eq!(for_target("wgsl").unwrap().target(), "wgsl");
        assert_eq!(for_target("glsl").unwrap().target(), "glsl");
    }
}
