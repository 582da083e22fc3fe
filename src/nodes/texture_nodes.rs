//! Texture sampling and procedural pattern nodes.
//!
//! These declare their resources in `create_variables` (texture bindings,
//! texcoord plumbing) and only read the recorded symbols when emitting, so
//! declaration blocks stay identical no matter which stage is active.

use crate::codegen::{
    sanitize_ident, CodegenError, GenContext, NodeImpl, ResolvedNode, Shader, ShaderStage,
    TypedExpr, ValueType,
};

use super::common::{emit_output, input_or_float};
use super::source_nodes::{lookup, require_texcoord};

const NOISE2D_FN: &str = "noise2d";
const NOISE2D_SRC: &str = "\
fn noise2d_hash(p: vec2f) -> f32 {
    return fract(sin(dot(p, vec2f(127.1, 311.7))) * 43758.5453123);
}

fn noise2d(p: vec2f) -> f32 {
    let i = floor(p);
    let f = fract(p);
    let u = f * f * (3.0 - 2.0 * f);
    let a = noise2d_hash(i);
    let b = noise2d_hash(i + vec2f(1.0, 0.0));
    let c = noise2d_hash(i + vec2f(0.0, 1.0));
    let d = noise2d_hash(i + vec2f(1.0, 1.0));
    return mix(mix(a, b, u.x), mix(c, d, u.x), u.y);
}";

const CHECKERBOARD_FN: &str = "checkerboard";
const CHECKERBOARD_SRC: &str = "\
fn checkerboard(uv: vec2f) -> f32 {
    let cell = floor(uv);
    return (cell.x + cell.y) - 2.0 * floor((cell.x + cell.y) / 2.0);
}";

fn texture_logical(node: &ResolvedNode) -> String {
    format!("image_{}", sanitize_ident(node.id()))
}

/// Resolve the sampling coordinate for a pattern/texture node: the connected
/// `uv` input when present, otherwise the default texcoord stream declared
/// during `create_variables`.
fn uv_expr(node: &ResolvedNode, ctx: &GenContext) -> Result<TypedExpr, CodegenError> {
    if let Some(uv) = node.input_opt("uv") {
        if uv.ty != ValueType::Vec2 {
            return Err(CodegenError::TypeMismatch {
                node_id: node.id().to_string(),
                detail: format!("uv input must be vec2, got {:?}", uv.ty),
            });
        }
        return Ok(uv.clone());
    }
    let varying = lookup(ctx, "texcoord_0_varying")?;
    Ok(TypedExpr::new(
        ctx.syntax().varying_ref(&varying.physical),
        ValueType::Vec2,
    ))
}

fn declare_default_texcoord(
    node: &ResolvedNode,
    ctx: &mut GenContext,
    shader: &mut Shader,
) -> Result<(), CodegenError> {
    if node.input_opt("uv").is_none() {
        require_texcoord(0, ctx, shader)?;
    }
    Ok(())
}

/// Samples a bound 2D texture. Port: `uv` (defaults to texcoord stream 0).
///
/// Each image node owns a distinct texture/sampler binding pair keyed by the
/// node id, so two image nodes never alias the same texture slot.
#[derive(Debug)]
pub struct ImageImpl;

impl NodeImpl for ImageImpl {
    fn create_variables(
        &self,
        node: &ResolvedNode,
        ctx: &mut GenContext,
        shader: &mut Shader,
    ) -> Result<(), CodegenError> {
        shader.require_texture(ctx, &texture_logical(node))?;
        declare_default_texcoord(node, ctx, shader)
    }

    fn emit_function_call(
        &self,
        node: &ResolvedNode,
        ctx: &mut GenContext,
        stage: &mut ShaderStage,
    ) -> Result<(), CodegenError> {
        let logical = texture_logical(node);
        let texture = lookup(ctx, &logical)?;
        let sampler = lookup(ctx, &format!("{logical}/sampler"))?;
        let uv = uv_expr(node, ctx)?;
        let expr = ctx
            .syntax()
            .sample_texture(&texture.physical, &sampler.physical, &uv.expr);
        emit_output(node, ctx, stage, "out", ValueType::Vec4, &expr)?;
        Ok(())
    }
}

/// Value noise over the sampling coordinate. Ports: `uv`, `scale` (default 1).
#[derive(Debug)]
pub struct Noise2dImpl;

impl NodeImpl for Noise2dImpl {
    fn create_variables(
        &self,
        node: &ResolvedNode,
        ctx: &mut GenContext,
        shader: &mut Shader,
    ) -> Result<(), CodegenError> {
        declare_default_texcoord(node, ctx, shader)
    }

    fn emit_function_call(
        &self,
        node: &ResolvedNode,
        ctx: &mut GenContext,
        stage: &mut ShaderStage,
    ) -> Result<(), CodegenError> {
        let uv = uv_expr(node, ctx)?;
        let scale = input_or_float(node, "scale", 1.0);
        stage.add_function(NOISE2D_FN, NOISE2D_SRC);
        let expr = format!("{NOISE2D_FN}({} * {})", uv.expr, scale.expr);
        emit_output(node, ctx, stage, "out", ValueType::Float, &expr)?;
        Ok(())
    }
}

/// Unit checker pattern. Ports: `uv`, `scale` (default 8).
#[derive(Debug)]
pub struct CheckerboardImpl;

impl NodeImpl for CheckerboardImpl {
    fn create_variables(
        &self,
        node: &ResolvedNode,
        ctx: &mut GenContext,
        shader: &mut Shader,
    ) -> Result<(), CodegenError> {
        declare_default_texcoord(node, ctx, shader)
    }

    fn emit_function_call(
        &self,
        node: &ResolvedNode,
        ctx: &mut GenContext,
        stage: &mut ShaderStage,
    ) -> Result<(), CodegenError> {
        let uv = uv_expr(node, ctx)?;
        let scale = input_or_float(node, "scale", 8.0);
        stage.add_function(CHECKERBOARD_FN, CHECKERBOARD_SRC);
        let expr = format!("{CHECKERBOARD_FN}({} * {})", uv.expr, scale.expr);
        emit_output(node, ctx, stage, "out", ValueType::Float, &expr)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::{syntax, GenOptions, StageId};
    use crate::ir::Node;
    use std::collections::BTreeMap;

    fn fragment_ctx() -> (GenContext, Shader) {
        let ctx = GenContext::new(
            "wgsl",
            StageId::Fragment,
            GenOptions::default(),
            syntax::for_target("wgsl").unwrap(),
        );
        (ctx, Shader::new())
    }

    fn resolved<'a>(node: &'a Node, inputs: &[(&str, TypedExpr)]) -> ResolvedNode<'a> {
        let map: BTreeMap<String, TypedExpr> = inputs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        ResolvedNode::new(node, map)
    }

    #[test]
    fn image_samples_its_own_binding_pair() {
        let (mut ctx, mut shader) = fragment_ctx();
        let node = Node::new("tex-1", "image");
        let resolved = resolved(&node, &[("uv", TypedExpr::new("uv", ValueType::Vec2))]);
        ImageImpl
            .create_variables(&resolved, &mut ctx, &mut shader)
            .unwrap();
        let mut stage = ShaderStage::new(StageId::Fragment);
        ImageImpl
            .emit_function_call(&resolved, &mut ctx, &mut stage)
            .unwrap();
        assert!(
            stage.body()[0].contains("textureSample(t_image_tex_1, s_image_tex_1, uv)"),
            "{}",
            stage.body()[0]
        );
    }

    #[test]
    fn image_declares_texcoord_stream_when_uv_unconnected() {
        let (mut ctx, mut shader) = fragment_ctx();
        let node = Node::new("tex", "image");
        let resolved = resolved(&node, &[]);
        ImageImpl
            .create_variables(&resolved, &mut ctx, &mut shader)
            .unwrap();
        assert!(shader
            .stage(StageId::Vertex)
            .attributes()
            .iter()
            .any(|a| a.name == "i_texcoord_0"));
        let mut stage = ShaderStage::new(StageId::Fragment);
        ImageImpl
            .emit_function_call(&resolved, &mut ctx, &mut stage)
            .unwrap();
        assert!(stage.body()[0].contains("v_texcoord_0_varying"));
    }

    #[test]
    fn noise_registers_helper_and_scales_uv() {
        let (mut ctx, mut shader) = fragment_ctx();
        let node = Node::new("n", "noise2d");
        let resolved = resolved(&node, &[("uv", TypedExpr::new("p", ValueType::Vec2))]);
        Noise2dImpl
            .create_variables(&resolved, &mut ctx, &mut shader)
            .unwrap();
        let mut stage = ShaderStage::new(StageId::Fragment);
        Noise2dImpl
            .emit_function_call(&resolved, &mut ctx, &mut stage)
            .unwrap();
        assert!(stage.functions().iter().any(|f| f.name == "noise2d"));
        assert!(stage.body()[0].contains("noise2d(p * 1.0)"));
    }

    #[test]
    fn pattern_rejects_non_vec2_uv() {
        let (mut ctx, _shader) = fragment_ctx();
        let node = Node::new("n", "checkerboard");
        let resolved = resolved(&node, &[("uv", TypedExpr::new("p", ValueType::Vec3))]);
        let mut stage = ShaderStage::new(StageId::Fragment);
        let err = CheckerboardImpl
            .emit_function_call(&resolved, &mut ctx, &mut stage)
            .unwrap_err();
        assert!(matches!(err, CodegenError::TypeMismatch { .. }));
    }
}
