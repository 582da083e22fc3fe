//! Vector algebra and channel plumbing nodes: dot/cross/normalize families,
//! combine/separate, and swizzle.

use crate::codegen::{
    CodegenError, GenContext, NodeImpl, ResolvedNode, ShaderStage, TypedExpr, ValueType,
};

use super::common::{emit_output, inline_output, input_or_float};

const CHANNELS: [&str; 4] = ["x", "y", "z", "w"];

/// Vector intrinsics whose result type differs from the operand type.
#[derive(Clone, Copy, Debug)]
pub enum VectorFn {
    Dot,
    Cross,
    Normalize,
    Length,
    Distance,
    Reflect,
}

impl VectorFn {
    fn arity(self) -> usize {
        match self {
            VectorFn::Normalize | VectorFn::Length => 1,
            _ => 2,
        }
    }

    fn name(self) -> &'static str {
        match self {
            VectorFn::Dot => "dot",
            VectorFn::Cross => "cross",
            VectorFn::Normalize => "normalize",
            VectorFn::Length => "length",
            VectorFn::Distance => "distance",
            VectorFn::Reflect => "reflect",
        }
    }

    fn result_type(self, operand: ValueType) -> ValueType {
        match self {
            VectorFn::Dot | VectorFn::Length | VectorFn::Distance => ValueType::Float,
            VectorFn::Cross | VectorFn::Normalize | VectorFn::Reflect => operand,
        }
    }
}

/// One- or two-operand vector intrinsic. Ports: `in1` (and `in2` for arity 2).
#[derive(Debug)]
pub struct VectorFnImpl {
    func: VectorFn,
}

impl VectorFnImpl {
    pub fn new(func: VectorFn) -> Self {
        Self { func }
    }

    fn check_operand(&self, node: &ResolvedNode, value: &TypedExpr) -> Result<(), CodegenError> {
        let ok = match self.func {
            VectorFn::Cross => value.ty == ValueType::Vec3,
            _ => value.ty.is_vector(),
        };
        if ok {
            Ok(())
        } else {
            Err(CodegenError::TypeMismatch {
                node_id: node.id().to_string(),
                detail: format!("{} expects a vector operand, got {:?}", self.func.name(), value.ty),
            })
        }
    }
}

impl NodeImpl for VectorFnImpl {
    fn emit_function_call(
        &self,
        node: &ResolvedNode,
        ctx: &mut GenContext,
        stage: &mut ShaderStage,
    ) -> Result<(), CodegenError> {
        let a = node.input("in1")?.clone();
        self.check_operand(node, &a)?;
        let expr = if self.func.arity() == 1 {
            format!("{}({})", self.func.name(), a.expr)
        } else {
            let b = node.input("in2")?.clone();
            self.check_operand(node, &b)?;
            if b.ty != a.ty {
                return Err(CodegenError::TypeMismatch {
                    node_id: node.id().to_string(),
                    detail: format!(
                        "{} operands must agree, got {:?} and {:?}",
                        self.func.name(),
                        a.ty,
                        b.ty
                    ),
                });
            }
            format!("{}({}, {})", self.func.name(), a.expr, b.expr)
        };
        emit_output(node, ctx, stage, "out", self.func.result_type(a.ty), &expr)?;
        Ok(())
    }
}

/// Builds a vecN from scalar ports `in1..inN` (unconnected ports default to 0).
#[derive(Debug)]
pub struct CombineImpl {
    components: usize,
}

impl CombineImpl {
    pub fn new(components: usize) -> Self {
        debug_assert!((2..=4).contains(&components));
        Self { components }
    }
}

impl NodeImpl for CombineImpl {
    fn emit_function_call(
        &self,
        node: &ResolvedNode,
        ctx: &mut GenContext,
        stage: &mut ShaderStage,
    ) -> Result<(), CodegenError> {
        let ty = ValueType::vector_of(self.components)
            .ok_or_else(|| CodegenError::InvalidGraph(format!(
                "combine node '{}' has unsupported component count {}",
                node.id(),
                self.components
            )))?;
        let mut parts = Vec::with_capacity(self.components);
        for i in 0..self.components {
            let value = input_or_float(node, &format!("in{}", i + 1), 0.0);
            if !value.ty.is_scalar() {
                return Err(CodegenError::TypeMismatch {
                    node_id: node.id().to_string(),
                    detail: format!("combine input in{} must be scalar, got {:?}", i + 1, value.ty),
                });
            }
            parts.push(value.expr);
        }
        let part_refs: Vec<&str> = parts.iter().map(String::as_str).collect();
        let expr = ctx.syntax().constructor(ty, &part_refs);
        emit_output(node, ctx, stage, "out", ty, &expr)?;
        Ok(())
    }
}

/// Splits a vector into scalar component outputs `x`, `y`, `z`, `w`.
///
/// Components are pure swizzles of the already-emitted input expression, so
/// the outputs are recorded inline and the body stays untouched.
#[derive(Debug)]
pub struct SeparateImpl;

impl NodeImpl for SeparateImpl {
    fn emit_function_call(
        &self,
        node: &ResolvedNode,
        ctx: &mut GenContext,
        _stage: &mut ShaderStage,
    ) -> Result<(), CodegenError> {
        let value = node.input("in")?.clone();
        let n = value.ty.components();
        if !value.ty.is_vector() {
            return Err(CodegenError::TypeMismatch {
                node_id: node.id().to_string(),
                detail: format!("separate expects a vector input, got {:?}", value.ty),
            });
        }
        for channel in CHANNELS.iter().take(n) {
            inline_output(
                node,
                ctx,
                channel,
                ValueType::Float,
                format!("({}).{}", value.expr, channel),
            );
        }
        Ok(())
    }
}

/// Reorders channels per the `channels` param (e.g. "zyx", "xxy").
#[derive(Debug)]
pub struct SwizzleImpl;

impl NodeImpl for SwizzleImpl {
    fn emit_function_call(
        &self,
        node: &ResolvedNode,
        ctx: &mut GenContext,
        stage: &mut ShaderStage,
    ) -> Result<(), CodegenError> {
        let value = node.input("in")?.clone();
        let channels = node.param_str("channels").unwrap_or("x").to_string();
        if channels.is_empty() || channels.len() > 4 {
            return Err(CodegenError::InvalidGraph(format!(
                "swizzle node '{}' has invalid channel mask '{}'",
                node.id(),
                channels
            )));
        }
        let available = value.ty.components();
        for c in channels.chars() {
            match "xyzw".find(c) {
                Some(i) if i < available => {}
                _ => {
                    return Err(CodegenError::TypeMismatch {
                        node_id: node.id().to_string(),
                        detail: format!("channel '{c}' is not present in {:?}", value.ty),
                    });
                }
            }
        }
        let ty = if channels.len() == 1 {
            ValueType::Float
        } else {
            ValueType::vector_of(channels.len()).ok_or_else(|| {
                CodegenError::InvalidGraph(format!(
                    "swizzle node '{}' has invalid channel mask '{}'",
                    node.id(),
                    channels
                ))
            })?
        };
        let expr = format!("({}).{}", value.expr, channels);
        emit_output(node, ctx, stage, "out", ty, &expr)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::{syntax, GenOptions, StageId};
    use crate::ir::Node;
    use std::collections::BTreeMap;

    fn fragment_ctx() -> (GenContext, ShaderStage) {
        let ctx = GenContext::new(
            "wgsl",
            StageId::Fragment,
            GenOptions::default(),
            syntax::for_target("wgsl").unwrap(),
        );
        (ctx, ShaderStage::new(StageId::Fragment))
    }

    fn resolved<'a>(node: &'a Node, inputs: &[(&str, TypedExpr)]) -> ResolvedNode<'a> {
        let map: BTreeMap<String, TypedExpr> = inputs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        ResolvedNode::new(node, map)
    }

    #[test]
    fn dot_collapses_to_scalar() {
        let (mut ctx, mut stage) = fragment_ctx();
        let node = Node::new("d", "dot");
        let resolved = resolved(
            &node,
            &[
                ("in1", TypedExpr::new("a", ValueType::Vec3)),
                ("in2", TypedExpr::new("b", ValueType::Vec3)),
            ],
        );
        VectorFnImpl::new(VectorFn::Dot)
            .emit_function_call(&resolved, &mut ctx, &mut stage)
            .unwrap();
        let out = ctx.node_output("d", "out").unwrap();
        assert_eq!(out.ty, ValueType::Float);
        assert!(stage.body()[0].contains("dot(a, b)"));
    }

    #[test]
    fn cross_rejects_non_vec3_operands() {
        let (mut ctx, mut stage) = fragment_ctx();
        let node = Node::new("c", "cross");
        let resolved = resolved(
            &node,
            &[
                ("in1", TypedExpr::new("a", ValueType::Vec2)),
                ("in2", TypedExpr::new("b", ValueType::Vec2)),
            ],
        );
        let err = VectorFnImpl::new(VectorFn::Cross)
            .emit_function_call(&resolved, &mut ctx, &mut stage)
            .unwrap_err();
        assert!(matches!(err, CodegenError::TypeMismatch { .. }));
    }

    #[test]
    fn combine3_defaults_missing_components_to_zero() {
        let (mut ctx, mut stage) = fragment_ctx();
        let node = Node::new("c", "combine3");
        let resolved = resolved(&node, &[("in2", TypedExpr::new("y", ValueType::Float))]);
        CombineImpl::new(3)
            .emit_function_call(&resolved, &mut ctx, &mut stage)
            .unwrap();
        assert!(stage.body()[0].contains("vec3f(0.0, y, 0.0)"), "{}", stage.body()[0]);
    }

    #[test]
    fn separate_records_inline_component_outputs() {
        let (mut ctx, mut stage) = fragment_ctx();
        let node = Node::new("s", "separate3");
        let resolved = resolved(&node, &[("in", TypedExpr::new("v", ValueType::Vec3))]);
        SeparateImpl
            .emit_function_call(&resolved, &mut ctx, &mut stage)
            .unwrap();
        assert!(stage.body().is_empty());
        assert_eq!(ctx.node_output("s", "y").unwrap().expr, "(v).y");
        assert!(ctx.node_output("s", "w").is_none());
    }

    #[test]
    fn swizzle_validates_channels_against_input_width() {
        let (mut ctx, mut stage) = fragment_ctx();
        let node = Node::new("sw", "swizzle").with_param("channels", serde_json::json!("zyx"));
        let resolved = resolved(&node, &[("in", TypedExpr::new("v", ValueType::Vec3))]);
        SwizzleImpl
            .emit_function_call(&resolved, &mut ctx, &mut stage)
            .unwrap();
        assert!(stage.body()[0].contains("(v).zyx"));

        let (mut ctx, mut stage) = fragment_ctx();
        let node = Node::new("sw", "swizzle").with_param("channels", serde_json::json!("xw"));
        let resolved = self::resolved(&node, &[("in", TypedExpr::new("v", ValueType::Vec2))]);
        let err = SwizzleImpl
            .emit_function_call(&resolved, &mut ctx, &mut stage)
            .unwrap_err();
        assert!(matches!(err, CodegenError::TypeMismatch { .. }));
    }
}
