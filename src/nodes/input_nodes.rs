//! Value input nodes: inline constants and named uniform parameters.

use crate::codegen::{
    CodegenError, GenContext, NodeImpl, ResolvedNode, Shader, ShaderStage, StageId,
    ValueType,
};

use super::common::{emit_output, inline_output};

/// Value type for a node that produces a literal: the declared output port
/// wins, otherwise the JSON shape of `value` decides.
fn value_type_of(node: &ResolvedNode) -> Option<ValueType> {
    if let Some(port) = node.node().outputs.first() {
        return Some(port.port_type);
    }
    match node.node().params.get("value")? {
        serde_json::Value::Number(_) => Some(ValueType::Float),
        serde_json::Value::Bool(_) => Some(ValueType::Bool),
        serde_json::Value::Array(arr) => ValueType::vector_of(arr.len()),
        _ => None,
    }
}

/// Inline literal from the node's `value` param.
///
/// At optimization level 0 the constant still gets its own body statement so
/// every node is visible in the emitted source; at level 1 and above the
/// literal is shared with consumers directly.
#[derive(Debug)]
pub struct ConstantImpl;

impl NodeImpl for ConstantImpl {
    fn emit_function_call(
        &self,
        node: &ResolvedNode,
        ctx: &mut GenContext,
        stage: &mut ShaderStage,
    ) -> Result<(), CodegenError> {
        let ty = value_type_of(node).ok_or_else(|| CodegenError::TypeMismatch {
            node_id: node.id().to_string(),
            detail: "constant node needs a typed output port or a 'value' param".to_string(),
        })?;
        let value = node
            .node()
            .params
            .get("value")
            .cloned()
            .unwrap_or_else(|| serde_json::json!(0.0));
        let literal =
            ctx.syntax()
                .literal(ty, &value)
                .ok_or_else(|| CodegenError::TypeMismatch {
                    node_id: node.id().to_string(),
                    detail: format!("constant value {value} does not fit type {ty:?}"),
                })?;

        if ctx.options().optimization_level == 0 {
            emit_output(node, ctx, stage, "out", ty, &literal)?;
        } else {
            inline_output(node, ctx, "out", ty, literal);
        }
        Ok(())
    }
}

/// Named uniform parameter. Two parameter nodes sharing a `name` share one
/// uniform declaration; the symbol table makes the second request a no-op.
#[derive(Debug)]
pub struct ParameterImpl;

impl NodeImpl for ParameterImpl {
    fn create_variables(
        &self,
        node: &ResolvedNode,
        ctx: &mut GenContext,
        shader: &mut Shader,
    ) -> Result<(), CodegenError> {
        let ty = value_type_of(node).unwrap_or(ValueType::Float);
        let name = node.param_str("name").unwrap_or(node.id()).to_string();
        let sym = shader.require_uniform(ctx, StageId::Fragment, &name, ty)?;
        inline_output(node, ctx, "out", sym.ty, sym.physical);
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
