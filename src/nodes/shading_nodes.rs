//! Lighting and surface output nodes.
//!
//! The BSDF math is a deliberately small single-light model; these nodes
//! exist to exercise the full declaration surface (shared light uniforms,
//! view-direction plumbing, helper functions), not to be physically exact.

use crate::codegen::{
    CodegenError, CoordinateSpace, GenContext, NodeImpl, ResolvedNode, Shader, ShaderStage,
    StageId, TypedExpr, ValueType,
};

use super::common::{coerce, emit_output, input_or_float};
use super::source_nodes::{lookup, require_geometric, GeomKind};

const LIGHT_DIRECTION: &str = "light_direction";
const LIGHT_COLOR: &str = "light_color";
const CAMERA_POSITION: &str = "camera_position";

const LAMBERT_FN: &str = "lambert_diffuse";
const LAMBERT_SRC: &str = "\
fn lambert_diffuse(base: vec3f, n: vec3f, l: vec3f, light: vec3f) -> vec3f {
    return base * light * max(dot(n, normalize(l)), 0.0);
}";

const BLINN_SPECULAR_FN: &str = "blinn_specular";
const BLINN_SPECULAR_SRC: &str = "\
fn blinn_specular(tint: vec3f, n: vec3f, l: vec3f, v: vec3f, roughness: f32, light: vec3f) -> vec3f {
    let h = normalize(normalize(l) + normalize(v));
    let exponent = 2.0 / max(roughness * roughness, 0.0001);
    return tint * light * pow(max(dot(n, h), 0.0), exponent);
}";

const SCHLICK_FN: &str = "schlick_fresnel";
const SCHLICK_SRC: &str = "\
fn schlick_fresnel(ior: f32, n: vec3f, v: vec3f) -> f32 {
    let r0 = pow((ior - 1.0) / (ior + 1.0), 2.0);
    let cos_theta = max(dot(n, normalize(v)), 0.0);
    return r0 + (1.0 - r0) * pow(1.0 - cos_theta, 5.0);
}";

/// Declare the shared directional light uniforms. Every lit node funnels
/// through here so one light block serves the whole shader.
fn require_light(ctx: &mut GenContext, shader: &mut Shader) -> Result<(), CodegenError> {
    shader.require_uniform(ctx, StageId::Fragment, LIGHT_DIRECTION, ValueType::Vec3)?;
    shader.require_uniform(ctx, StageId::Fragment, LIGHT_COLOR, ValueType::Vec3)?;
    Ok(())
}

fn light_exprs(ctx: &GenContext) -> Result<(String, String), CodegenError> {
    let dir = lookup(ctx, LIGHT_DIRECTION)?;
    let color = lookup(ctx, LIGHT_COLOR)?;
    Ok((dir.physical, color.physical))
}

/// Declare the camera uniform and world-position varying, returning the
/// fragment-side view direction expression at emit time.
fn require_view(ctx: &mut GenContext, shader: &mut Shader) -> Result<(), CodegenError> {
    shader.require_uniform(ctx, StageId::Fragment, CAMERA_POSITION, ValueType::Vec3)?;
    require_geometric(GeomKind::Position, CoordinateSpace::World, ctx, shader)?;
    Ok(())
}

fn view_expr(ctx: &GenContext) -> Result<String, CodegenError> {
    let camera = lookup(ctx, CAMERA_POSITION)?;
    let position = lookup(ctx, "position_world")?;
    Ok(format!(
        "({} - {})",
        camera.physical,
        ctx.syntax().varying_ref(&position.physical)
    ))
}

/// Fragment-side shading normal: the connected `normal` input when present,
/// otherwise the interpolated world normal declared in `create_variables`.
fn normal_expr(node: &ResolvedNode, ctx: &GenContext) -> Result<String, CodegenError> {
    if let Some(normal) = node.input_opt("normal") {
        if normal.ty != ValueType::Vec3 {
            return Err(CodegenError::TypeMismatch {
                node_id: node.id().to_string(),
                detail: format!("normal input must be vec3, got {:?}", normal.ty),
            });
        }
        return Ok(normal.expr.clone());
    }
    let varying = lookup(ctx, "normal_world")?;
    Ok(ctx.syntax().varying_ref(&varying.physical))
}

fn declare_default_normal(
    node: &ResolvedNode,
    ctx: &mut GenContext,
    shader: &mut Shader,
) -> Result<(), CodegenError> {
    if node.input_opt("normal").is_none() {
        require_geometric(GeomKind::Normal, CoordinateSpace::World, ctx, shader)?;
    }
    Ok(())
}

fn base_color(node: &ResolvedNode, ctx: &GenContext, port: &str, default: f64) -> Result<TypedExpr, CodegenError> {
    let value = input_or_float(node, port, default);
    coerce(node.id(), &value, ValueType::Vec3, ctx)
}

/// Single-light Lambert term. Ports: `color` (default 0.8), `normal`.
#[derive(Debug)]
pub struct DiffuseBsdfImpl;

impl NodeImpl for DiffuseBsdfImpl {
    fn create_variables(
        &self,
        node: &ResolvedNode,
        ctx: &mut GenContext,
        shader: &mut Shader,
    ) -> Result<(), CodegenError> {
        require_light(ctx, shader)?;
        declare_default_normal(node, ctx, shader)
    }

    fn emit_function_call(
        &self,
        node: &ResolvedNode,
        ctx: &mut GenContext,
        stage: &mut ShaderStage,
    ) -> Result<(), CodegenError> {
        let color = base_color(node, ctx, "color", 0.8)?;
        let normal = normal_expr(node, ctx)?;
        let (light_dir, light_color) = light_exprs(ctx)?;
        stage.add_function(LAMBERT_FN, LAMBERT_SRC);
        let expr = format!(
            "{LAMBERT_FN}({}, {normal}, {light_dir}, {light_color})",
            color.expr
        );
        emit_output(node, ctx, stage, "out", ValueType::Vec3, &expr)?;
        Ok(())
    }
}

/// Single-light Blinn-Phong specular term. Ports: `color` (default 1),
/// `roughness` (default 0.25), `normal`.
#[derive(Debug)]
pub struct SpecularBsdfImpl;

impl NodeImpl for SpecularBsdfImpl {
    fn create_variables(
        &self,
        node: &ResolvedNode,
        ctx: &mut GenContext,
        shader: &mut Shader,
    ) -> Result<(), CodegenError> {
        require_light(ctx, shader)?;
        require_view(ctx, shader)?;
        declare_default_normal(node, ctx, shader)
    }

    fn emit_function_call(
        &self,
        node: &ResolvedNode,
        ctx: &mut GenContext,
        stage: &mut ShaderStage,
    ) -> Result<(), CodegenError> {
        let color = base_color(node, ctx, "color", 1.0)?;
        let roughness = input_or_float(node, "roughness", 0.25);
        let normal = normal_expr(node, ctx)?;
        let view = view_expr(ctx)?;
        let (light_dir, light_color) = light_exprs(ctx)?;
        stage.add_function(BLINN_SPECULAR_FN, BLINN_SPECULAR_SRC);
        let expr = format!(
            "{BLINN_SPECULAR_FN}({}, {normal}, {light_dir}, {view}, {}, {light_color})",
            color.expr, roughness.expr
        );
        emit_output(node, ctx, stage, "out", ValueType::Vec3, &expr)?;
        Ok(())
    }
}

/// Schlick fresnel weight against the view direction. Ports: `ior`
/// (default 1.5), `normal`. Output: float.
#[derive(Debug)]
pub struct FresnelImpl;

impl NodeImpl for FresnelImpl {
    fn create_variables(
        &self,
        node: &ResolvedNode,
        ctx: &mut GenContext,
        shader: &mut Shader,
    ) -> Result<(), CodegenError> {
        require_view(ctx, shader)?;
        declare_default_normal(node, ctx, shader)
    }

    fn emit_function_call(
        &self,
        node: &ResolvedNode,
        ctx: &mut GenContext,
        stage: &mut ShaderStage,
    ) -> Result<(), CodegenError> {
        let ior = input_or_float(node, "ior", 1.5);
        let normal = normal_expr(node, ctx)?;
        let view = view_expr(ctx)?;
        stage.add_function(SCHLICK_FN, SCHLICK_SRC);
        let expr = format!("{SCHLICK_FN}({}, {normal}, {view})", ior.expr);
        emit_output(node, ctx, stage, "out", ValueType::Float, &expr)?;
        Ok(())
    }
}

/// Terminal surface node combining a shaded color with opacity into the
/// vec4 the fragment stage returns. Ports: `bsdf` (vec3), `opacity`
/// (default 1).
#[derive(Debug)]
pub struct SurfaceOutputImpl;

impl NodeImpl for SurfaceOutputImpl {
    fn emit_function_call(
        &self,
        node: &ResolvedNode,
        ctx: &mut GenContext,
        stage: &mut ShaderStage,
    ) -> Result<(), CodegenError> {
        let bsdf = node.input("bsdf")?.clone();
        let bsdf = coerce(node.id(), &bsdf, ValueType::Vec3, ctx)?;
        let opacity = input_or_float(node, "opacity", 1.0);
        if !opacity.ty.is_scalar() {
            return Err(CodegenError::TypeMismatch {
                node_id: node.id().to_string(),
                detail: format!("opacity must be scalar, got {:?}", opacity.ty),
            });
        }
        let expr = ctx
            .syntax()
            .constructor(ValueType::Vec4, &[&bsdf.expr, &opacity.expr]);
        emit_output(node, ctx, stage, "out", ValueType::Vec4, &expr)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::{syntax, GenContext, GenOptions};
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
    fn diffuse_declares_shared_light_uniforms_once() {
        let (mut ctx, mut shader) = fragment_ctx();
        let node_a = Node::new("a", "diffusebsdf");
        let node_b = Node::new("b", "diffusebsdf");
        let ra = resolved(&node_a, &[]);
        let rb = resolved(&node_b, &[]);
        DiffuseBsdfImpl.create_variables(&ra, &mut ctx, &mut shader).unwrap();
        DiffuseBsdfImpl.create_variables(&rb, &mut ctx, &mut shader).unwrap();
        let fragment = shader.stage(StageId::Fragment);
        let lights = fragment
            .uniforms()
            .iter()
            .filter(|u| u.name.starts_with("u_light"))
            .count();
        assert_eq!(lights, 2);
    }

    #[test]
    fn diffuse_uses_connected_normal_over_default() {
        let (mut ctx, mut shader) = fragment_ctx();
        let node = Node::new("d", "diffusebsdf");
        let resolved = resolved(&node, &[("normal", TypedExpr::new("n", ValueType::Vec3))]);
        DiffuseBsdfImpl
            .create_variables(&resolved, &mut ctx, &mut shader)
            .unwrap();
        // No default normal stream declared when the port is connected.
        assert!(ctx.symbols().lookup("normal_world").is_none());
        let mut stage = ShaderStage::new(StageId::Fragment);
        DiffuseBsdfImpl
            .emit_function_call(&resolved, &mut ctx, &mut stage)
            .unwrap();
        assert!(
            stage.body()[0].contains("lambert_diffuse(vec3f(0.8), n, u_light_direction, u_light_color)"),
            "{}",
            stage.body()[0]
        );
    }

    #[test]
    fn fresnel_builds_view_direction_from_camera_and_position() {
        let (mut ctx, mut shader) = fragment_ctx();
        let node = Node::new("f", "fresnel");
        let resolved = resolved(&node, &[]);
        FresnelImpl
            .create_variables(&resolved, &mut ctx, &mut shader)
            .unwrap();
        let mut stage = ShaderStage::new(StageId::Fragment);
        FresnelImpl
            .emit_function_call(&resolved, &mut ctx, &mut stage)
            .unwrap();
        assert!(
            stage.body()[0].contains("(u_camera_position - v_position_world)"),
            "{}",
            stage.body()[0]
        );
    }

    #[test]
    fn surface_output_packs_color_and_opacity() {
        let (mut ctx, _shader) = fragment_ctx();
        let node = Node::new("srf", "surfaceoutput");
        let resolved = resolved(&node, &[("bsdf", TypedExpr::new("c", ValueType::Vec3))]);
        let mut stage = ShaderStage::new(StageId::Fragment);
        SurfaceOutputImpl
            .emit_function_call(&resolved, &mut ctx, &mut stage)
            .unwrap();
        assert!(stage.body()[0].contains("vec4f(c, 1.0)"));
        assert_eq!(ctx.node_output("srf", "out").unwrap().ty, ValueType::Vec4);
    }
}
