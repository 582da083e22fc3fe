//! Compile abstract shading node graphs into real-time shading language
//! source.
//!
//! A [`ir::ShaderGraph`] describes a material as typed nodes and
//! connections, independent of any target language. [`codegen::ShaderGenerator`]
//! walks the graph in dependency order and asks per-node implementations
//! (resolved through a [`codegen::NodeImplRegistry`] keyed by node type and
//! target) to contribute declarations and body statements, deduplicating
//! shared resources through a symbol table. The result is one compilable
//! module per pipeline stage.
//!
//! ```no_run
//! use std::sync::Arc;
//! use shadegraph::codegen::{GenOptions, NodeImplRegistry, ShaderGenerator, StageId};
//! use shadegraph::ir::ShaderGraph;
//!
//! # fn demo(graph: ShaderGraph) -> anyhow::Result<()> {
//! let mut registry = NodeImplRegistry::new();
//! shadegraph::nodes::register_builtins(&mut registry)?;
//! let generator = ShaderGenerator::for_target("wgsl", Arc::new(registry))?;
//! let shader = generator.generate(&graph, GenOptions::default())?;
//! println!("{}", shader.source(StageId::Fragment).unwrap());
//! # Ok(())
//! # }
//! ```

pub mod codegen;
pub mod ir;
pub mod nodes;
pub mod validation;

pub use codegen::{CodegenError, GenOptions, GeneratedShader, ShaderGenerator, StageId};
pub use ir::ShaderGraph;
