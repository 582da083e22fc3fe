//! Scalar/vector math nodes. One implementation struct per operator shape
//! (binary, unary intrinsic, clamp/mix/smoothstep/remap), registered once per
//! node type.

use crate::codegen::{
    CodegenError, GenContext, NodeImpl, ResolvedNode, ShaderStage,
};

use super::common::{coerce, emit_output, input_or_float, promote_pair};

#[derive(Clone, Copy, Debug)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,
    Min,
    Max,
}

impl BinaryOp {
    fn format(self, a: &str, b: &str) -> String {
        match self {
            BinaryOp::Add => format!("({a} + {b})"),
            BinaryOp::Subtract => format!("({a} - {b})"),
            BinaryOp::Multiply => format!("({a} * {b})"),
            BinaryOp::Divide => format!("({a} / {b})"),
            // Written out so the same spelling works for float operands in
            // every target (GLSL restricts `%` to integers).
            BinaryOp::Modulo => format!("({a} - {b} * floor({a} / {b}))"),
            BinaryOp::Power => format!("pow({a}, {b})"),
            BinaryOp::Min => format!("min({a}, {b})"),
            BinaryOp::Max => format!("max({a}, {b})"),
        }
    }
}

/// Two-operand math node with scalar-to-vector promotion. Ports: `in1`, `in2`.
#[derive(Debug)]
pub struct BinaryOpImpl {
    op: BinaryOp,
}

impl BinaryOpImpl {
    pub fn new(op: BinaryOp) -> Self {
        Self { op }
    }
}

impl NodeImpl for BinaryOpImpl {
    fn emit_function_call(
        &self,
        node: &ResolvedNode,
        ctx: &mut GenContext,
        stage: &mut ShaderStage,
    ) -> Result<(), CodegenError> {
        let a = node.input("in1")?.clone();
        let b = node.input("in2")?.clone();
        let (a, b, ty) = promote_pair(node.id(), &a, &b, ctx)?;
        let expr = self.op.format(&a.expr, &b.expr);
        emit_output(node, ctx, stage, "out", ty, &expr)?;
        Ok(())
    }
}

/// Single-operand intrinsic call (same spelling in WGSL and GLSL). Port: `in`.
#[derive(Debug)]
pub struct UnaryFnImpl {
    func: &'static str,
}

impl UnaryFnImpl {
    pub fn new(func: &'static str) -> Self {
        Self { func }
    }
}

impl NodeImpl for UnaryFnImpl {
    fn emit_function_call(
        &self,
        node: &ResolvedNode,
        ctx: &mut GenContext,
        stage: &mut ShaderStage,
    ) -> Result<(), CodegenError> {
        let value = node.input("in")?.clone();
        let expr = format!("{}({})", self.func, value.expr);
        emit_output(node, ctx, stage, "out", value.ty, &expr)?;
        Ok(())
    }
}

/// Clamp `in` between `low` and `high` (defaults 0 and 1).
#[derive(Debug)]
pub struct ClampImpl;

impl NodeImpl for ClampImpl {
    fn emit_function_call(
        &self,
        node: &ResolvedNode,
        ctx: &mut GenContext,
        stage: &mut ShaderStage,
    ) -> Result<(), CodegenError> {
        let value = node.input("in")?.clone();
        let low = coerce(node.id(), &input_or_float(node, "low", 0.0), value.ty, ctx)?;
        let high = coerce(node.id(), &input_or_float(node, "high", 1.0), value.ty, ctx)?;
        let expr = format!("clamp({}, {}, {})", value.expr, low.expr, high.expr);
        emit_output(node, ctx, stage, "out", value.ty, &expr)?;
        Ok(())
    }
}

/// Blend `fg` over `bg` by `mix` (defaults 0.5). Ports: `bg`, `fg`, `mix`.
#[derive(Debug)]
pub struct MixImpl;

impl NodeImpl for MixImpl {
    fn emit_function_call(
        &self,
        node: &ResolvedNode,
        ctx: &mut GenContext,
        stage: &mut ShaderStage,
    ) -> Result<(), CodegenError> {
        let bg = node.input("bg")?.clone();
        let fg = node.input("fg")?.clone();
        let (bg, fg, ty) = promote_pair(node.id(), &bg, &fg, ctx)?;
        let t = input_or_float(node, "mix", 0.5);
        let expr = format!("mix({}, {}, {})", bg.expr, fg.expr, t.expr);
        emit_output(node, ctx, stage, "out", ty, &expr)?;
        Ok(())
    }
}

/// Hermite step between `low` and `high`. Ports: `in`, `low`, `high`.
#[derive(Debug)]
pub struct SmoothstepImpl;

impl NodeImpl for SmoothstepImpl {
    fn emit_function_call(
        &self,
        node: &ResolvedNode,
        ctx: &mut GenContext,
        stage: &mut ShaderStage,
    ) -> Result<(), CodegenError> {
        let value = node.input("in")?.clone();
        let low = coerce(node.id(), &input_or_float(node, "low", 0.0), value.ty, ctx)?;
        let high = coerce(node.id(), &input_or_float(node, "high", 1.0), value.ty, ctx)?;
        let expr = format!("smoothstep({}, {}, {})", low.expr, high.expr, value.expr);
        emit_output(node, ctx, stage, "out", value.ty, &expr)?;
        Ok(())
    }
}

/// Linear remap of `in` from [inlow, inhigh] to [outlow, outhigh].
#[derive(Debug)]
pub struct RemapImpl;

impl NodeImpl for RemapImpl {
    fn emit_function_call(
        &self,
        node: &ResolvedNode,
        ctx: &mut GenContext,
        stage: &mut ShaderStage,
    ) -> Result<(), CodegenError> {
        let value = node.input("in")?.clone();
        let in_low = coerce(node.id(), &input_or_float(node, "inlow", 0.0), value.ty, ctx)?;
        let in_high = coerce(node.id(), &input_or_float(node, "inhigh", 1.0), value.ty, ctx)?;
        let out_low = coerce(node.id(), &input_or_float(node, "outlow", 0.0), value.ty, ctx)?;
        let out_high = coerce(node.id(), &input_or_float(node, "outhigh", 1.0), value.ty, ctx)?;
        let expr = format!(
            "({} + ({} - {}) * ({} - {}) / ({} - {}))",
            out_low.expr, value.expr, in_low.expr, out_high.expr, out_low.expr, in_high.expr, in_low.expr
        );
        emit_output(node, ctx, stage, "out", value.ty, &expr)?;
        Ok(())
    }
}
