//! Geometric and stream source nodes: position, normal, tangent, bitangent,
//! texcoord, geomcolor, viewdirection, time, frame.
//!
//! Source nodes have no free inputs. Their `create_variables` hook
//! contributes the shared attribute/varying/uniform declarations (one
//! declaration no matter how many consumers, via the symbol table) and their
//! `emit_function_call` is usually a no-op because the value is fully
//! available from the declarations alone.

use crate::codegen::{
    CodegenError, CoordinateSpace, GenContext, NodeImpl, ResolvedNode, Shader, ShaderStage,
    StageId, Symbol, TypedExpr, ValueType,
};

use super::common::{emit_output, inline_output, promote_pair};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GeomKind {
    Position,
    Normal,
    Tangent,
    Bitangent,
}

impl GeomKind {
    fn logical(self) -> &'static str {
        match self {
            GeomKind::Position => "position",
            GeomKind::Normal => "normal",
            GeomKind::Tangent => "tangent",
            GeomKind::Bitangent => "bitangent",
        }
    }
}

pub(crate) fn lookup(ctx: &GenContext, logical: &str) -> Result<Symbol, CodegenError> {
    ctx.symbols().lookup(logical).cloned().ok_or_else(|| {
        CodegenError::InvalidGraph(format!(
            "symbol '{logical}' referenced before its declaration"
        ))
    })
}

/// Vertex-stage expression for a raw (object space) geometric attribute.
fn object_expr(kind: GeomKind, ctx: &mut GenContext, shader: &mut Shader) -> Result<String, CodegenError> {
    let syntax = ctx.syntax();
    match kind {
        GeomKind::Position => {
            let attr = shader.require_attribute(ctx, "position", ValueType::Vec3)?;
            Ok(syntax.attribute_ref(&attr.physical))
        }
        GeomKind::Normal | GeomKind::Tangent => {
            let attr = shader.require_attribute(ctx, kind.logical(), ValueType::Vec3)?;
            Ok(format!("normalize({})", syntax.attribute_ref(&attr.physical)))
        }
        GeomKind::Bitangent => {
            let n = object_expr(GeomKind::Normal, ctx, shader)?;
            let t = object_expr(GeomKind::Tangent, ctx, shader)?;
            Ok(format!("normalize(cross({n}, {t}))"))
        }
    }
}

/// Vertex-stage expression for a world space geometric quantity. Pulls in
/// the world matrix uniforms the transform needs.
fn world_expr(kind: GeomKind, ctx: &mut GenContext, shader: &mut Shader) -> Result<String, CodegenError> {
    let syntax = ctx.syntax();
    match kind {
        GeomKind::Position => {
            let attr = shader.require_attribute(ctx, "position", ValueType::Vec3)?;
            let world = shader.require_uniform(ctx, StageId::Vertex, "world_matrix", ValueType::Mat4)?;
            let hom = syntax.constructor(
                ValueType::Vec4,
                &[&syntax.attribute_ref(&attr.physical), "1.0"],
            );
            Ok(format!("({} * {hom}).xyz", world.physical))
        }
        GeomKind::Normal => {
            let attr = shader.require_attribute(ctx, "normal", ValueType::Vec3)?;
            let inv_t = shader.require_uniform(
                ctx,
                StageId::Vertex,
                "world_inverse_transpose_matrix",
                ValueType::Mat4,
            )?;
            let hom = syntax.constructor(
                ValueType::Vec4,
                &[&syntax.attribute_ref(&attr.physical), "0.0"],
            );
            Ok(format!("normalize(({} * {hom}).xyz)", inv_t.physical))
        }
        GeomKind::Tangent => {
            let attr = shader.require_attribute(ctx, "tangent", ValueType::Vec3)?;
            let world = shader.require_uniform(ctx, StageId::Vertex, "world_matrix", ValueType::Mat4)?;
            let hom = syntax.constructor(
                ValueType::Vec4,
                &[&syntax.attribute_ref(&attr.physical), "0.0"],
            );
            Ok(format!("normalize(({} * {hom}).xyz)", world.physical))
        }
        GeomKind::Bitangent => {
            let n = world_expr(GeomKind::Normal, ctx, shader)?;
            let t = world_expr(GeomKind::Tangent, ctx, shader)?;
            Ok(format!("normalize(cross({n}, {t}))"))
        }
    }
}

/// Declare (once) the storage backing a geometric quantity in the requested
/// space and return the fragment-side expression that reads it.
pub(crate) fn require_geometric(
    kind: GeomKind,
    space: CoordinateSpace,
    ctx: &mut GenContext,
    shader: &mut Shader,
) -> Result<TypedExpr, CodegenError> {
    // Tangent-frame space: the frame axes are constant by definition;
    // position has no tangent-space reading and degrades to object space.
    if space == CoordinateSpace::Tangent && kind != GeomKind::Position {
        let axis = match kind {
            GeomKind::Tangent => ["1.0", "0.0", "0.0"],
            GeomKind::Bitangent => ["0.0", "1.0", "0.0"],
            _ => ["0.0", "0.0", "1.0"],
        };
        let expr = ctx
            .syntax()
            .constructor(ValueType::Vec3, &[axis[0], axis[1], axis[2]]);
        return Ok(TypedExpr::new(expr, ValueType::Vec3));
    }

    let space = if kind == GeomKind::Position && space == CoordinateSpace::Tangent {
        CoordinateSpace::Object
    } else {
        space
    };

    let logical = format!("{}_{}", kind.logical(), space.suffix());
    let vertex_expr = match space {
        CoordinateSpace::Object => object_expr(kind, ctx, shader)?,
        CoordinateSpace::World => world_expr(kind, ctx, shader)?,
        CoordinateSpace::Tangent => unreachable!("handled above"),
    };
    let varying = shader.require_varying(ctx, &logical, ValueType::Vec3, &vertex_expr)?;
    let expr = ctx.syntax().varying_ref(&varying.physical);
    Ok(TypedExpr::new(expr, ValueType::Vec3))
}

fn node_space(node: &ResolvedNode, ctx: &GenContext) -> CoordinateSpace {
    node.param_str("space")
        .and_then(CoordinateSpace::parse)
        .unwrap_or(ctx.options().coordinate_space)
}

/// Geometric source node (position/normal/tangent/bitangent).
///
/// A bitangent node whose `normal` and `tangent` inputs are both connected
/// computes the cross product of the upstream values in the body instead of
/// declaring its own backing storage.
#[derive(Debug)]
pub struct GeometricImpl {
    kind: GeomKind,
}

impl GeometricImpl {
    pub fn new(kind: GeomKind) -> Self {
        Self { kind }
    }

    fn has_connected_frame(&self, node: &ResolvedNode) -> bool {
        self.kind == GeomKind::Bitangent
            && node.input_opt("normal").is_some()
            && node.input_opt("tangent").is_some()
    }
}

impl NodeImpl for GeometricImpl {
    fn create_variables(
        &self,
        node: &ResolvedNode,
        ctx: &mut GenContext,
        shader: &mut Shader,
    ) -> Result<(), CodegenError> {
        if self.has_connected_frame(node) {
            return Ok(());
        }
        let space = node_space(node, ctx);
        let value = require_geometric(self.kind, space, ctx, shader)?;
        ctx.set_node_output(node.id(), "out", value);
        Ok(())
    }

    fn emit_function_call(
        &self,
        node: &ResolvedNode,
        ctx: &mut GenContext,
        stage: &mut ShaderStage,
    ) -> Result<(), CodegenError> {
        if self.has_connected_frame(node) {
            let (n, t, _) = promote_pair(node.id(), node.input("normal")?, node.input("tangent")?, ctx)?;
            let expr = format!("normalize(cross({}, {}))", n.expr, t.expr);
            emit_output(node, ctx, stage, "out", ValueType::Vec3, &expr)?;
        }
        // Otherwise the output was recorded from the declarations alone.
        Ok(())
    }
}

/// Texture coordinate stream; `index` selects the UV set.
#[derive(Debug)]
pub struct TexcoordImpl;

impl NodeImpl for TexcoordImpl {
    fn create_variables(
        &self,
        node: &ResolvedNode,
        ctx: &mut GenContext,
        shader: &mut Shader,
    ) -> Result<(), CodegenError> {
        let index = node.param_f64("index").unwrap_or(0.0).max(0.0) as u32;
        let value = require_texcoord(index, ctx, shader)?;
        ctx.set_node_output(node.id(), "out", value);
        Ok(())
    }

    fn emit_function_call(
        &self,
        _node: &ResolvedNode,
        _ctx: &mut GenContext,
        _stage: &mut ShaderStage,
    ) -> Result<(), CodegenError> {
        Ok(())
    }
}

pub(crate) fn require_texcoord(
    index: u32,
    ctx: &mut GenContext,
    shader: &mut Shader,
) -> Result<TypedExpr, CodegenError> {
    let logical = format!("texcoord_{index}");
    let attr = shader.require_attribute(ctx, &logical, ValueType::Vec2)?;
    let vertex_expr = ctx.syntax().attribute_ref(&attr.physical);
    let varying_logical = format!("texcoord_{index}_varying");
    let varying = shader.require_varying(ctx, &varying_logical, ValueType::Vec2, &vertex_expr)?;
    Ok(TypedExpr::new(
        ctx.syntax().varying_ref(&varying.physical),
        ValueType::Vec2,
    ))
}

/// Interpolated vertex color stream.
#[derive(Debug)]
pub struct GeomColorImpl;

impl NodeImpl for GeomColorImpl {
    fn create_variables(
        &self,
        node: &ResolvedNode,
        ctx: &mut GenContext,
        shader: &mut Shader,
    ) -> Result<(), CodegenError> {
        let attr = shader.require_attribute(ctx, "color", ValueType::Vec4)?;
        let vertex_expr = ctx.syntax().attribute_ref(&attr.physical);
        let varying = shader.require_varying(ctx, "color_varying", ValueType::Vec4, &vertex_expr)?;
        let expr = ctx.syntax().varying_ref(&varying.physical);
        ctx.set_node_output(node.id(), "out", TypedExpr::new(expr, ValueType::Vec4));
        Ok(())
    }

    fn emit_function_call(
        &self,
        _node: &ResolvedNode,
        _ctx: &mut GenContext,
        _stage: &mut ShaderStage,
    ) -> Result<(), CodegenError> {
        Ok(())
    }
}

/// Unit vector from the shaded point toward the camera.
#[derive(Debug)]
pub struct ViewDirectionImpl;

impl NodeImpl for ViewDirectionImpl {
    fn create_variables(
        &self,
        _node: &ResolvedNode,
        ctx: &mut GenContext,
        shader: &mut Shader,
    ) -> Result<(), CodegenError> {
        shader.require_uniform(ctx, StageId::Fragment, "camera_position", ValueType::Vec3)?;
        require_geometric(GeomKind::Position, CoordinateSpace::World, ctx, shader)?;
        Ok(())
    }

    fn emit_function_call(
        &self,
        node: &ResolvedNode,
        ctx: &mut GenContext,
        stage: &mut ShaderStage,
    ) -> Result<(), CodegenError> {
        let camera = lookup(ctx, "camera_position")?;
        let position = lookup(ctx, "position_world")?;
        let pos_ref = ctx.syntax().varying_ref(&position.physical);
        let expr = format!("normalize({} - {pos_ref})", camera.physical);
        emit_output(node, ctx, stage, "out", ValueType::Vec3, &expr)?;
        Ok(())
    }
}

/// Scalar uniform source (time in seconds, frame counter). The whole value
/// is one shared uniform declaration; the emission hook is a no-op.
#[derive(Debug)]
pub struct UniformSourceImpl {
    logical: &'static str,
}

impl UniformSourceImpl {
    pub fn new(logical: &'static str) -> Self {
        Self { logical }
    }
}

impl NodeImpl for UniformSourceImpl {
    fn create_variables(
        &self,
        node: &ResolvedNode,
        ctx: &mut GenContext,
        shader: &mut Shader,
    ) -> Result<(), CodegenError> {
        let sym = shader.require_uniform(ctx, StageId::Fragment, self.logical, ValueType::Float)?;
        inline_output(node, ctx, "out", ValueType::Float, sym.physical);
        Ok(())
    }

    fn emit_function_call(
        &self,
        _node: &ResolvedNode,
        _ctx: &mut GenContext,
        _stage: &mut ShaderStage,
    ) -> Result<(), CodegenError> {
        Ok(())
    }
}
