//! Code-generation engine: context, stage buffers, registry, syntax writers
//! and the orchestrator.

pub mod context;
pub mod error;
pub mod generator;
pub mod registry;
pub mod stage;
pub mod symbols;
pub mod syntax;
pub mod types;

pub use context::{CoordinateSpace, GenContext, GenOptions, Hook};
pub use error::CodegenError;
pub use generator::{GeneratedShader, ShaderGenerator};
pub use registry::{NodeImpl, NodeImplRegistry, ResolvedNode};
pub use stage::{Shader, ShaderStage, StageId};
pub use symbols::{StorageClass, Symbol, SymbolTable};
pub use syntax::Syntax;
pub use types::{fmt_float, sanitize_ident, TypedExpr, ValueType};
