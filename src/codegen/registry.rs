//! Node implementation registry: the polymorphism boundary between the
//! orchestrator and per-node code generation.
//!
//! New node types or new target languages are added by registering new
//! implementations; the orchestrator is never edited for them.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use super::context::GenContext;
use super::error::CodegenError;
use super::stage::{Shader, ShaderStage};
use super::types::{sanitize_ident, TypedExpr};
use crate::ir::Node;

/// A graph node together with its already-resolved input expressions.
///
/// By dependency-order traversal every upstream node has emitted before this
/// view is built, so each connected input port maps to the upstream output's
/// expression; unconnected ports with a usable default map to the formatted
/// literal.
pub struct ResolvedNode<'a> {
    node: &'a Node,
    inputs: BTreeMap<String, TypedExpr>,
}

impl<'a> ResolvedNode<'a> {
    pub fn new(node: &'a Node, inputs: BTreeMap<String, TypedExpr>) -> Self {
        Self { node, inputs }
    }

    pub fn id(&self) -> &str {
        &self.node.id
    }

    pub fn node_type(&self) -> &str {
        &self.node.node_type
    }

    pub fn node(&self) -> &Node {
        self.node
    }

    /// Resolved expression for a required input port.
    pub fn input(&self, port: &str) -> Result<&TypedExpr, CodegenError> {
        self.inputs.get(port).ok_or_else(|| CodegenError::MissingInput {
            node_id: self.node.id.clone(),
            port: port.to_string(),
        })
    }

    pub fn input_opt(&self, port: &str) -> Option<&TypedExpr> {
        self.inputs.get(port)
    }

    /// Resolved inputs in port-name order.
    pub fn inputs(&self) -> impl Iterator<Item = (&str, &TypedExpr)> {
        self.inputs.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Deterministic body-local variable name for one of this node's outputs.
    pub fn output_var(&self, port: &str) -> String {
        format!(
            "nd_{}_{}",
            sanitize_ident(&self.node.id),
            sanitize_ident(port)
        )
    }

    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.node.params.get(key).and_then(|v| v.as_str())
    }

    pub fn param_f64(&self, key: &str) -> Option<f64> {
        self.node.params.get(key).and_then(|v| {
            v.as_f64()
                .or_else(|| v.as_i64().map(|x| x as f64))
                .or_else(|| v.as_u64().map(|x| x as f64))
        })
    }
}

/// Code-generation strategy for one (node type, target language) pair.
///
/// The orchestrator invokes the two hooks in fixed order per node:
/// `create_variables` first (declaration blocks and symbol table only), then
/// `emit_function_call` (body block of the active stage only). A pure source
/// node may leave `emit_function_call` effectively empty when its value is
/// fully available from the declaration alone.
pub trait NodeImpl: Send + Sync + std::fmt::Debug {
    fn create_variables(
        &self,
        node: &ResolvedNode,
        ctx: &mut GenContext,
        shader: &mut Shader,
    ) -> Result<(), CodegenError> {
        let _ = (node, ctx, shader);
        Ok(())
    }

    fn emit_function_call(
        &self,
        node: &ResolvedNode,
        ctx: &mut GenContext,
        stage: &mut ShaderStage,
    ) -> Result<(), CodegenError>;
}

/// Maps (node type, target language) to the implementation instance.
/// Populated once at startup, then shared read-only across compilations.
#[derive(Default)]
pub struct NodeImplRegistry {
    impls: HashMap<(String, String), Arc<dyn NodeImpl>>,
}

impl NodeImplRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        node_type: &str,
        target: &str,
        implementation: Arc<dyn NodeImpl>,
    ) -> Result<(), CodegenError> {
        let key = (node_type.to_string(), target.to_string());
        if self.impls.contains_key(&key) {
            return Err(CodegenError::DuplicateRegistration {
                node_type: node_type.to_string(),
                target: target.to_string(),
            });
        }
        log::trace!("registered node impl ({node_type}, {target})");
        self.impls.insert(key, implementation);
        Ok(())
    }

    pub fn resolve(&self, node: &Node, target: &str) -> Result<Arc<dyn NodeImpl>, CodegenError> {
        self.impls
            .get(&(node.node_type.clone(), target.to_string()))
            .cloned()
            .ok_or_else(|| CodegenError::UnsupportedNode {
                node_id: node.id.clone(),
                node_type: node.node_type.clone(),
                target: target.to_string(),
            })
    }

    pub fn contains(&self, node_type: &str, target: &str) -> bool {
        self.impls
            .contains_key(&(node_type.to_string(), target.to_string()))
    }

    pub fn len(&self) -> usize {
        self.impls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.impls.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct NoopImpl;

    impl NodeImpl for NoopImpl {
        fn emit_function_call(
            &self,
            _node: &ResolvedNode,
            _ctx: &mut GenContext,
            _stage: &mut ShaderStage,
        ) -> Result<(), CodegenError> {
            Ok(())
        }
    }

    fn test_node(id: &str, node_type: &str) -> Node {
        Node {
            id: id.to_string(),
            node_type: node_type.to_string(),
            params: Default::default(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    #[test]
    fn duplicate_registration_fails_fast() {
        let mut registry = NodeImplRegistry::new();
        registry.register("add", "wgsl", Arc::new(NoopImpl)).unwrap();
        let err = registry
            .register("add", "wgsl", Arc::new(NoopImpl))
            .unwrap_err();
        assert!(matches!(err, CodegenError::DuplicateRegistration { .. }));
        // Same type under another target is a distinct key.
        registry.register("add", "glsl", Arc::new(NoopImpl)).unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn resolve_reports_unsupported_node_with_context() {
        let registry = NodeImplRegistry::new();
        let node = test_node("n1", "imaginary");
        let err = registry.resolve(&node, "wgsl").unwrap_err();
        match err {
            CodegenError::UnsupportedNode {
                node_id,
                node_type,
                target,
            } => {
                assert_eq!(node_id, "n1");
                assert_eq!(node_type, "imaginary");
                assert_eq!(target, "wgsl");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn output_var_names_are_sanitized_and_deterministic() {
        let node = test_node("add-1", "add");
        let resolved = ResolvedNode::new(&node, BTreeMap::new());
        assert_eq!(resolved.output_var("out"), "nd_add_1_out");
        assert_eq!(resolved.output_var("out"), "nd_add_1_out");
    }
}
