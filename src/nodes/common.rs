//! Shared helpers for the built-in node implementations.

use crate::codegen::{
    CodegenError, GenContext, ResolvedNode, ShaderStage, StorageClass, TypedExpr, ValueType,
};

/// Emit the canonical `let <node>_<port> = <expr>;` statement for a node
/// output, bind its local symbol and record the output expression for
/// downstream consumers.
pub(crate) fn emit_output(
    node: &ResolvedNode,
    ctx: &mut GenContext,
    stage: &mut ShaderStage,
    port: &str,
    ty: ValueType,
    expr: &str,
) -> Result<TypedExpr, CodegenError> {
    let var = node.output_var(port);
    let logical = format!("{}.{}", node.id(), port);
    ctx.symbols_mut()
        .bind(&logical, &var, ty, StorageClass::Local)?;
    let stmt = ctx.syntax().local_decl(&var, ty, expr);
    stage.push_stmt(stmt);
    let out = TypedExpr::new(var, ty);
    ctx.set_node_output(node.id(), port, out.clone());
    Ok(out)
}

/// Record an output as a plain expression without emitting a statement.
/// Used by value nodes when constant inlining is enabled and by pure source
/// nodes whose value is a declaration reference.
pub(crate) fn inline_output(
    node: &ResolvedNode,
    ctx: &mut GenContext,
    port: &str,
    ty: ValueType,
    expr: impl Into<String>,
) -> TypedExpr {
    let out = TypedExpr::new(expr, ty);
    ctx.set_node_output(node.id(), port, out.clone());
    out
}

/// Coerce an expression to a target type. Scalars splat to vectors; any
/// other conversion is a type mismatch.
pub(crate) fn coerce(
    node_id: &str,
    value: &TypedExpr,
    to: ValueType,
    ctx: &GenContext,
) -> Result<TypedExpr, CodegenError> {
    if value.ty == to {
        return Ok(value.clone());
    }
    if value.ty == ValueType::Float && to.is_vector() {
        return Ok(TypedExpr::new(ctx.syntax().splat(to, &value.expr), to));
    }
    Err(CodegenError::TypeMismatch {
        node_id: node_id.to_string(),
        detail: format!("cannot convert {:?} to {:?}", value.ty, to),
    })
}

/// Promote two operands to a common type (scalar-to-vector promotion).
pub(crate) fn promote_pair(
    node_id: &str,
    a: &TypedExpr,
    b: &TypedExpr,
    ctx: &GenContext,
) -> Result<(TypedExpr, TypedExpr, ValueType), CodegenError> {
    let common = if a.ty == b.ty {
        a.ty
    } else if a.ty == ValueType::Float && b.ty.is_vector() {
        b.ty
    } else if b.ty == ValueType::Float && a.ty.is_vector() {
        a.ty
    } else {
        return Err(CodegenError::TypeMismatch {
            node_id: node_id.to_string(),
            detail: format!("incompatible operand types {:?} and {:?}", a.ty, b.ty),
        });
    };
    Ok((
        coerce(node_id, a, common, ctx)?,
        coerce(node_id, b, common, ctx)?,
        common,
    ))
}

/// A required vec-or-float input, defaulting to the given float literal when
/// neither a connection, a port default, nor an inline param provides it.
pub(crate) fn input_or_float(node: &ResolvedNode, port: &str, default: f64) -> TypedExpr {
    node.input_opt(port).cloned().unwrap_or_else(|| {
        TypedExpr::new(crate::codegen::fmt_float(default), ValueType::Float)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::{syntax, GenOptions, StageId};

    fn wgsl_ctx() -> GenContext {
        GenContext::new(
            "wgsl",
            StageId::Fragment,
            GenOptions::default(),
            syntax::for_target("wgsl").unwrap(),
        )
    }

    #[test]
    fn scalars_splat_to_vectors() {
        let ctx = wgsl_ctx();
        let a = TypedExpr::new("x", ValueType::Float);
        let b = TypedExpr::new("v", ValueType::Vec3);
        let (a2, b2, ty) = promote_pair("n", &a, &b, &ctx).unwrap();
        assert_eq!(ty, ValueType::Vec3);
        assert_eq!(a2.expr, "vec3f(x)");
        assert_eq!(b2.expr, "v");
    }

    #[test]
    fn vector_size_mismatch_is_an_error() {
        let ctx = wgsl_ctx();
        let a = TypedExpr::new("a", ValueType::Vec2);
        let b = TypedExpr::new("b", ValueType::Vec3);
        assert!(matches!(
            promote_pair("n", &a, &b, &ctx).unwrap_err(),
            CodegenError::TypeMismatch { .. }
        ));
    }
}
