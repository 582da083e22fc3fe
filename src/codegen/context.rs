//! Generation context: per-compilation mutable state threaded through every
//! node implementation call.
//!
//! A context is created fresh at the start of a compilation and discarded
//! once source text has been extracted. It is never shared between
//! compilations, so concurrent compilations stay independent.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::stage::StageId;
use super::symbols::SymbolTable;
use super::syntax::Syntax;
use super::types::TypedExpr;

/// Coordinate space requested for geometric inputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordinateSpace {
    Object,
    #[default]
    World,
    Tangent,
}

impl CoordinateSpace {
    pub fn parse(s: &str) -> Option<CoordinateSpace> {
        match s {
            "object" => Some(CoordinateSpace::Object),
            "world" => Some(CoordinateSpace::World),
            "tangent" => Some(CoordinateSpace::Tangent),
            _ => None,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            CoordinateSpace::Object => "object",
            CoordinateSpace::World => "world",
            CoordinateSpace::Tangent => "tangent",
        }
    }
}

/// Option set consulted through the context. Missing options fall back to the
/// documented defaults: world space, optimization level 1.
///
/// Level 0 disables constant inlining so every node emits its own statement;
/// level 1 (and above) lets value nodes share their expression text with
/// consumers directly.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenOptions {
    #[serde(default)]
    pub coordinate_space: CoordinateSpace,
    #[serde(default = "default_optimization_level")]
    pub optimization_level: u8,
    /// Free-form options for downstream backends; unrecognized keys are
    /// carried but ignored by the built-in implementations.
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

fn default_optimization_level() -> u8 {
    1
}

impl Default for GenOptions {
    fn default() -> Self {
        Self {
            coordinate_space: CoordinateSpace::default(),
            optimization_level: default_optimization_level(),
            extra: BTreeMap::new(),
        }
    }
}

impl GenOptions {
    pub fn get_option(&self, key: &str) -> Option<&str> {
        self.extra.get(key).map(String::as_str)
    }

    pub fn set_option(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.extra.insert(key.into(), value.into());
    }
}

/// Which of the two implementation hooks a visit record refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Hook {
    CreateVariables,
    EmitFunctionCall,
}

/// Per-compilation generation state. All mutation is additive: new symbols,
/// new resolved outputs, new visit records.
pub struct GenContext {
    target: String,
    active_stage: StageId,
    options: GenOptions,
    syntax: Arc<dyn Syntax>,
    symbols: SymbolTable,
    node_outputs: HashMap<(String, String), TypedExpr>,
    visits: Vec<(String, Hook)>,
}

impl GenContext {
    pub fn new(
        target: impl Into<String>,
        active_stage: StageId,
        options: GenOptions,
        syntax: Arc<dyn Syntax>,
    ) -> Self {
        Self {
            target: target.into(),
            active_stage,
            options,
            syntax,
            symbols: SymbolTable::new(),
            node_outputs: HashMap::new(),
            visits: Vec::new(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn current_stage(&self) -> StageId {
        self.active_stage
    }

    pub fn options(&self) -> &GenOptions {
        &self.options
    }

    pub fn syntax(&self) -> Arc<dyn Syntax> {
        Arc::clone(&self.syntax)
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn symbols_mut(&mut self) -> &mut SymbolTable {
        &mut self.symbols
    }

    /// Record the resolved expression for one node output port. Upstream
    /// nodes are visited first, so by the time a consumer asks for an input
    /// the producing port is already present.
    pub fn set_node_output(&mut self, node_id: &str, port_id: &str, expr: TypedExpr) {
        self.node_outputs
            .insert((node_id.to_string(), port_id.to_string()), expr);
    }

    pub fn node_output(&self, node_id: &str, port_id: &str) -> Option<&TypedExpr> {
        self.node_outputs
            .get(&(node_id.to_string(), port_id.to_string()))
    }

    pub fn record_visit(&mut self, node_id: &str, hook: Hook) {
        log::trace!("visit {hook:?} for node '{node_id}'");
        self.visits.push((node_id.to_string(), hook));
    }

    /// Visit trace in invocation order, consumed by the generator for the
    /// emission log.
    pub fn visits(&self) -> &[(String, Hook)] {
        &self.visits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::syntax;

    #[test]
    fn options_default_to_world_space_and_level_1() {
        let opts = GenOptions::default();
        assert_eq!(opts.coordinate_space, CoordinateSpace::World);
        assert_eq!(opts.optimization_level, 1);
        assert_eq!(opts.get_option("anything"), None);
    }

    #[test]
    fn option_bag_round_trips() {
        let mut opts = GenOptions::default();
        opts.set_option("debug_names", "1");
        assert_eq!(opts.get_option("debug_names"), Some("1"));
    }

    #[test]
    fn node_outputs_are_keyed_by_node_and_port() {
        let mut ctx = GenContext::new(
            "wgsl",
            StageId::Fragment,
            GenOptions::default(),
            syntax::for_target("wgsl").unwrap(),
        );
        ctx.set_node_output("n1", "out", TypedExpr::new("1.0", crate::codegen::ValueType::Float));
        assert!(ctx.node_output("n1", "out").is_some());
        assert!(ctx.node_output("n1", "other").is_none());
        assert!(ctx.node_output("n2", "out").is_none());
    }
}
