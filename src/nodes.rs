//! Built-in node vocabulary, grouped by category the way the registry
//! consumes it.
//!
//! `register_builtins` populates a registry with every built-in
//! implementation. The `wgsl` target carries the full vocabulary; `glsl`
//! carries the geometric, constant, math, and vector subset, so sampling and
//! shading nodes resolve to `UnsupportedNode` there. Implementations are
//! shared `Arc`s, one instance per node type serving every target it is
//! registered for.

pub mod color_nodes;
mod common;
pub mod input_nodes;
pub mod math_nodes;
pub mod shading_nodes;
pub mod source_nodes;
pub mod texture_nodes;
pub mod vector_nodes;

use std::sync::Arc;

use crate::codegen::{CodegenError, NodeImpl, NodeImplRegistry};

use color_nodes::{GammaImpl, HsvDirection, HsvImpl, LuminanceImpl};
use input_nodes::{ConstantImpl, ParameterImpl};
use math_nodes::{
    BinaryOp, BinaryOpImpl, ClampImpl, MixImpl, RemapImpl, SmoothstepImpl, UnaryFnImpl,
};
use shading_nodes::{DiffuseBsdfImpl, FresnelImpl, SpecularBsdfImpl, SurfaceOutputImpl};
use source_nodes::{
    GeomColorImpl, GeomKind, GeometricImpl, TexcoordImpl, UniformSourceImpl, ViewDirectionImpl,
};
use texture_nodes::{CheckerboardImpl, ImageImpl, Noise2dImpl};
use vector_nodes::{CombineImpl, SeparateImpl, SwizzleImpl, VectorFn, VectorFnImpl};

/// Targets that receive the portable (non-sampling, non-shading) vocabulary.
const PORTABLE_TARGETS: [&str; 2] = ["wgsl", "glsl"];

fn register_portable(
    registry: &mut NodeImplRegistry,
    node_type: &str,
    implementation: Arc<dyn NodeImpl>,
) -> Result<(), CodegenError> {
    for target in PORTABLE_TARGETS {
        registry.register(node_type, target, Arc::clone(&implementation))?;
    }
    Ok(())
}

/// Register the complete built-in vocabulary into `registry`.
///
/// Callers extending the vocabulary register their own implementations on
/// the same registry before or after this call; a clash with a built-in name
/// surfaces as `DuplicateRegistration`.
pub fn register_builtins(registry: &mut NodeImplRegistry) -> Result<(), CodegenError> {
    // Geometric and stream sources.
    register_portable(registry, "position", Arc::new(GeometricImpl::new(GeomKind::Position)))?;
    register_portable(registry, "normal", Arc::new(GeometricImpl::new(GeomKind::Normal)))?;
    register_portable(registry, "tangent", Arc::new(GeometricImpl::new(GeomKind::Tangent)))?;
    register_portable(registry, "bitangent", Arc::new(GeometricImpl::new(GeomKind::Bitangent)))?;
    register_portable(registry, "texcoord", Arc::new(TexcoordImpl))?;
    register_portable(registry, "geomcolor", Arc::new(GeomColorImpl))?;
    register_portable(registry, "viewdirection", Arc::new(ViewDirectionImpl))?;
    register_portable(registry, "time", Arc::new(UniformSourceImpl::new("time")))?;
    register_portable(registry, "frame", Arc::new(UniformSourceImpl::new("frame")))?;

    // Values.
    register_portable(registry, "constant", Arc::new(ConstantImpl))?;
    register_portable(registry, "parameter", Arc::new(ParameterImpl))?;

    // Scalar/vector math.
    let binary: [(&str, BinaryOp); 8] = [
        ("add", BinaryOp::Add),
        ("subtract", BinaryOp::Subtract),
        ("multiply", BinaryOp::Multiply),
        ("divide", BinaryOp::Divide),
        ("modulo", BinaryOp::Modulo),
        ("power", BinaryOp::Power),
        ("min", BinaryOp::Min),
        ("max", BinaryOp::Max),
    ];
    for (name, op) in binary {
        register_portable(registry, name, Arc::new(BinaryOpImpl::new(op)))?;
    }
    let unary: [(&str, &str); 14] = [
        ("abs", "abs"),
        ("floor", "floor"),
        ("ceil", "ceil"),
        ("fract", "fract"),
        ("sqrt", "sqrt"),
        ("sign", "sign"),
        ("exp", "exp"),
        ("ln", "log"),
        ("sin", "sin"),
        ("cos", "cos"),
        ("tan", "tan"),
        ("asin", "asin"),
        ("acos", "acos"),
        ("atan", "atan"),
    ];
    for (name, func) in unary {
        register_portable(registry, name, Arc::new(UnaryFnImpl::new(func)))?;
    }
    register_portable(registry, "clamp", Arc::new(ClampImpl))?;
    register_portable(registry, "mix", Arc::new(MixImpl))?;
    register_portable(registry, "smoothstep", Arc::new(SmoothstepImpl))?;
    register_portable(registry, "remap", Arc::new(RemapImpl))?;

    // Vector algebra and channel plumbing.
    register_portable(registry, "dotproduct", Arc::new(VectorFnImpl::new(VectorFn::Dot)))?;
    register_portable(registry, "crossproduct", Arc::new(VectorFnImpl::new(VectorFn::Cross)))?;
    register_portable(registry, "normalize", Arc::new(VectorFnImpl::new(VectorFn::Normalize)))?;
    register_portable(registry, "length", Arc::new(VectorFnImpl::new(VectorFn::Length)))?;
    register_portable(registry, "distance", Arc::new(VectorFnImpl::new(VectorFn::Distance)))?;
    register_portable(registry, "reflect", Arc::new(VectorFnImpl::new(VectorFn::Reflect)))?;
    register_portable(registry, "combine2", Arc::new(CombineImpl::new(2)))?;
    register_portable(registry, "combine3", Arc::new(CombineImpl::new(3)))?;
    register_portable(registry, "combine4", Arc::new(CombineImpl::new(4)))?;
    register_portable(registry, "separate", Arc::new(SeparateImpl))?;
    register_portable(registry, "swizzle", Arc::new(SwizzleImpl))?;

    // Color processing.
    register_portable(registry, "luminance", Arc::new(LuminanceImpl))?;
    register_portable(registry, "gamma", Arc::new(GammaImpl))?;
    registry.register("hsvtorgb", "wgsl", Arc::new(HsvImpl::new(HsvDirection::HsvToRgb)))?;
    registry.register("rgbtohsv", "wgsl", Arc::new(HsvImpl::new(HsvDirection::RgbToHsv)))?;

    // Sampling and patterns (wgsl only, the helper sources are WGSL).
    registry.register("image", "wgsl", Arc::new(ImageImpl))?;
    registry.register("noise2d", "wgsl", Arc::new(Noise2dImpl))?;
    registry.register("checkerboard", "wgsl", Arc::new(CheckerboardImpl))?;

    // Shading (wgsl only).
    registry.register("diffusebsdf", "wgsl", Arc::new(DiffuseBsdfImpl))?;
    registry.register("specularbsdf", "wgsl", Arc::new(SpecularBsdfImpl))?;
    registry.register("fresnel", "wgsl", Arc::new(FresnelImpl))?;
    registry.register("surfaceoutput", "wgsl", Arc::new(SurfaceOutputImpl))?;

    log::debug!("registered {} built-in node implementations", registry.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_register_without_clashes() {
        let mut registry = NodeImplRegistry::new();
        register_builtins(&mut registry).unwrap();
        assert!(registry.contains("add", "wgsl"));
        assert!(registry.contains("add", "glsl"));
        assert!(registry.contains("bitangent", "glsl"));
        assert!(registry.contains("surfaceoutput", "wgsl"));
    }

    #[test]
    fn sampling_and_shading_are_wgsl_only() {
        let mut registry = NodeImplRegistry::new();
        register_builtins(&mut registry).unwrap();
        for node_type in ["image", "noise2d", "checkerboard", "diffusebsdf", "fresnel"] {
            assert!(registry.contains(node_type, "wgsl"), "{node_type}");
            assert!(!registry.contains(node_type, "glsl"), "{node_type}");
        }
    }

    #[test]
    fn registering_builtins_twice_is_rejected() {
        let mut registry = NodeImplRegistry::new();
        register_builtins(&mut registry).unwrap();
        let err = register_builtins(&mut registry).unwrap_err();
        assert!(matches!(
            err,
            crate::codegen::CodegenError::DuplicateRegistration { .. }
        ));
    }
}
