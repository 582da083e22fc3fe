//! Shader generator: walks the graph in dependency order and assembles the
//! per-stage source text.
//!
//! One `generate` call runs the whole `Init -> Traversing -> Finalizing ->
//! Done` sequence; any failure aborts the compilation and no partial source
//! escapes. Traversal is an explicit topological worklist computed up front,
//! never recursion.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::context::{GenContext, GenOptions, Hook};
use super::error::CodegenError;
use super::registry::{NodeImplRegistry, ResolvedNode};
use super::stage::{Shader, StageId};
use super::syntax::{self, Syntax};
use super::types::TypedExpr;
use crate::ir::{Node, ShaderGraph};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Init,
    Traversing,
    Finalizing,
    Done,
}

/// Result of a successful compilation: one source string per pipeline stage,
/// plus the node emission order for callers that want to inspect it.
#[derive(Debug, Clone)]
pub struct GeneratedShader {
    sources: BTreeMap<StageId, String>,
    emitted_nodes: Vec<String>,
}

impl GeneratedShader {
    pub fn source(&self, stage: StageId) -> Option<&str> {
        self.sources.get(&stage).map(String::as_str)
    }

    pub fn stages(&self) -> impl Iterator<Item = (StageId, &str)> {
        self.sources.iter().map(|(id, src)| (*id, src.as_str()))
    }

    /// Node ids in the order their body fragments were emitted.
    pub fn emitted_nodes(&self) -> &[String] {
        &self.emitted_nodes
    }
}

/// Orchestrator for one target language. Cheap to construct; holds only the
/// shared read-only registry and the target's syntax writer, so one instance
/// can serve many sequential or concurrent compilations.
pub struct ShaderGenerator {
    target: String,
    registry: Arc<NodeImplRegistry>,
    syntax: Arc<dyn Syntax>,
}

impl std::fmt::Debug for ShaderGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShaderGenerator")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

impl ShaderGenerator {
    pub fn for_target(
        target: &str,
        registry: Arc<NodeImplRegistry>,
    ) -> Result<Self, CodegenError> {
        let syntax = syntax::for_target(target)?;
        Ok(Self {
            target: target.to_string(),
            registry,
            syntax,
        })
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Compile `graph` into per-stage source text.
    pub fn generate(
        &self,
        graph: &ShaderGraph,
        options: GenOptions,
    ) -> Result<GeneratedShader, CodegenError> {
        let mut phase = Phase::Init;
        log::debug!("generate[{}]: phase {phase:?}", self.target);

        graph.validate()?;
        if graph.outputs.is_empty() {
            return Err(CodegenError::InvalidGraph(
                "graph has no output bindings".to_string(),
            ));
        }

        let mut ctx = GenContext::new(
            self.target.clone(),
            StageId::Fragment,
            options,
            Arc::clone(&self.syntax),
        );
        let mut shader = Shader::new();
        self.seed_stages(&mut ctx, &mut shader)?;

        phase = Phase::Traversing;
        log::debug!("generate[{}]: phase {phase:?}", self.target);

        let reachable = graph.reachable_from_outputs();
        let surface_writers = graph
            .nodes
            .iter()
            .filter(|n| reachable.contains(n.id.as_str()) && n.node_type == "surfaceoutput")
            .count();
        if surface_writers > 1 {
            return Err(CodegenError::InvalidGraph(format!(
                "{surface_writers} surfaceoutput nodes reach the output bindings, at most one is allowed"
            )));
        }

        let order = graph.topo_order()?;
        for node in order {
            if !reachable.contains(node.id.as_str()) {
                log::trace!("skipping node '{}': not reachable from outputs", node.id);
                continue;
            }
            let implementation = self.registry.resolve(node, &self.target)?;
            let resolved = self.resolve_inputs(graph, node, &ctx)?;

            ctx.record_visit(&node.id, Hook::CreateVariables);
            implementation.create_variables(&resolved, &mut ctx, &mut shader)?;

            ctx.record_visit(&node.id, Hook::EmitFunctionCall);
            let stage = shader.stage_mut(StageId::Fragment);
            implementation.emit_function_call(&resolved, &mut ctx, stage)?;
        }

        let emitted_nodes: Vec<String> = ctx
            .visits()
            .iter()
            .filter(|(_, hook)| *hook == Hook::EmitFunctionCall)
            .map(|(id, _)| id.clone())
            .collect();

        phase = Phase::Finalizing;
        log::debug!("generate[{}]: phase {phase:?}", self.target);

        let frag_return = self.final_color_expr(graph, &ctx)?;
        let mut sources = BTreeMap::new();
        for stage_id in shader.stage_ids() {
            let source = self.syntax.write_stage(&shader, stage_id, &frag_return);
            sources.insert(stage_id, source);
        }

        phase = Phase::Done;
        log::debug!(
            "generate[{}]: phase {phase:?} ({} nodes, {} symbols)",
            self.target,
            emitted_nodes.len(),
            ctx.symbols().len()
        );

        Ok(GeneratedShader {
            sources,
            emitted_nodes,
        })
    }

    /// Seed the declarations the stage writers' fixed boilerplate relies on:
    /// the clip-space position transform needs the position attribute and the
    /// view-projection matrix.
    fn seed_stages(&self, ctx: &mut GenContext, shader: &mut Shader) -> Result<(), CodegenError> {
        shader.require_attribute(ctx, "position", super::types::ValueType::Vec3)?;
        shader.require_uniform(
            ctx,
            StageId::Vertex,
            "view_projection_matrix",
            super::types::ValueType::Mat4,
        )?;
        Ok(())
    }

    /// Build the resolved-input view for one node. Connected ports read the
    /// upstream node's already-recorded output expression; unconnected ports
    /// fall back to the port default, then to an inline param of the same
    /// name.
    fn resolve_inputs<'a>(
        &self,
        graph: &ShaderGraph,
        node: &'a Node,
        ctx: &GenContext,
    ) -> Result<ResolvedNode<'a>, CodegenError> {
        let mut inputs: BTreeMap<String, TypedExpr> = BTreeMap::new();

        for conn in graph.connections.iter().filter(|c| c.to.node_id == node.id) {
            let upstream = ctx
                .node_output(&conn.from.node_id, &conn.from.port_id)
                .ok_or_else(|| {
                    CodegenError::InvalidGraph(format!(
                        "input '{}.{}' reads output '{}.{}' which produced no value",
                        node.id, conn.to.port_id, conn.from.node_id, conn.from.port_id
                    ))
                })?;
            inputs.insert(conn.to.port_id.clone(), upstream.clone());
        }

        for port in &node.inputs {
            if inputs.contains_key(&port.id) {
                continue;
            }
            let fallback = port.default.as_ref().or_else(|| node.params.get(&port.id));
            if let Some(value) = fallback {
                let literal = ctx.syntax().literal(port.port_type, value).ok_or_else(|| {
                    CodegenError::TypeMismatch {
                        node_id: node.id.clone(),
                        detail: format!(
                            "default for input '{}' does not fit type {:?}",
                            port.id, port.port_type
                        ),
                    }
                })?;
                inputs.insert(port.id.clone(), TypedExpr::new(literal, port.port_type));
            }
        }

        Ok(ResolvedNode::new(node, inputs))
    }

    /// Pick the graph output the fragment stage returns (an output named
    /// "color" wins, otherwise the first binding) and convert it to vec4.
    fn final_color_expr(
        &self,
        graph: &ShaderGraph,
        ctx: &GenContext,
    ) -> Result<String, CodegenError> {
        let binding = graph
            .outputs
            .iter()
            .find(|o| o.id == "color")
            .or_else(|| graph.outputs.first())
            .ok_or_else(|| {
                CodegenError::InvalidGraph("graph has no output bindings".to_string())
            })?;

        let value = ctx
            .node_output(&binding.node_id, &binding.port_id)
            .ok_or_else(|| {
                CodegenError::InvalidGraph(format!(
                    "output '{}' reads '{}.{}' which produced no value",
                    binding.id, binding.node_id, binding.port_id
                ))
            })?;

        self.syntax
            .to_vec4_color(value)
            .ok_or_else(|| CodegenError::TypeMismatch {
                node_id: binding.node_id.clone(),
                detail: format!("output type {:?} has no color interpretation", value.ty),
            })
    }
}
