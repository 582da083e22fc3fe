//! Typed failure taxonomy for shader generation.
//!
//! Every failure aborts the whole compilation; no partially emitted source is
//! ever returned. Callers that want retries re-invoke generation with a
//! corrected graph or registry.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodegenError {
    /// The registry has no implementation for this node's type under the
    /// requested target language.
    #[error("no '{target}' implementation registered for node '{node_id}' of type '{node_type}'")]
    UnsupportedNode {
        node_id: String,
        node_type: String,
        target: String,
    },

    /// Two implementations were registered under the same (type, target) key.
    /// Registry build-time programming error; fails before any compilation.
    #[error("implementation already registered for node type '{node_type}' and target '{target}'")]
    DuplicateRegistration { node_type: String, target: String },

    /// The connection graph is not acyclic. Detected during graph validation,
    /// before traversal starts.
    #[error("shader graph contains a cycle through node '{node_id}'")]
    CyclicGraph { node_id: String },

    /// An implementation tried to bind a physical variable name that is
    /// already owned by a different logical name. Implementation bug.
    #[error(
        "physical name '{physical}' requested for '{logical}' is already bound to '{existing}'"
    )]
    SymbolCollision {
        physical: String,
        logical: String,
        existing: String,
    },

    /// No syntax backend is known for the requested target language.
    #[error("no syntax backend for target language '{target}'")]
    UnknownTarget { target: String },

    /// A required input port has no incoming connection and no usable default.
    #[error("node '{node_id}' is missing required input '{port}'")]
    MissingInput { node_id: String, port: String },

    /// Incompatible value types met at a node (e.g. vec2 + vec3).
    #[error("type mismatch at node '{node_id}': {detail}")]
    TypeMismatch { node_id: String, detail: String },

    /// Structural problem other than a cycle: dangling connection endpoint,
    /// duplicate node id, fan-in on a single input port, missing output
    /// binding, and so on.
    #[error("invalid shader graph: {0}")]
    InvalidGraph(String),
}
