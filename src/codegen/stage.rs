//! Shader stage buffers: per-stage declaration blocks plus a body block.
//!
//! Stages are created by the orchestrator, populated by node implementations
//! during traversal, and read-only once generation completes. Declaration
//! blocks serialize in a fixed order: uniforms, then attributes/varyings,
//! then helper functions, then the body.

use std::fmt;

use super::context::GenContext;
use super::error::CodegenError;
use super::symbols::{StorageClass, Symbol};
use super::types::{sanitize_ident, ValueType};

/// Pipeline stage identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StageId {
    Vertex,
    Fragment,
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageId::Vertex => write!(f, "vertex"),
            StageId::Fragment => write!(f, "fragment"),
        }
    }
}

/// A declared variable in one of the declaration blocks.
#[derive(Clone, Debug, PartialEq)]
pub struct VariableDecl {
    pub name: String,
    pub ty: ValueType,
}

/// A texture/sampler pair declaration. Binding indices follow declaration
/// order within the stage.
#[derive(Clone, Debug, PartialEq)]
pub struct TextureDecl {
    pub texture: String,
    pub sampler: String,
}

/// A helper function contributed to the function block. Deduplicated by name
/// so two nodes needing the same helper emit it once.
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionDecl {
    pub name: String,
    pub source: String,
}

/// Accumulates emitted source fragments for one pipeline stage.
#[derive(Debug)]
pub struct ShaderStage {
    id: StageId,
    uniforms: Vec<VariableDecl>,
    attributes: Vec<VariableDecl>,
    varyings: Vec<VariableDecl>,
    textures: Vec<TextureDecl>,
    functions: Vec<FunctionDecl>,
    body: Vec<String>,
}

impl ShaderStage {
    pub fn new(id: StageId) -> Self {
        Self {
            id,
            uniforms: Vec::new(),
            attributes: Vec::new(),
            varyings: Vec::new(),
            textures: Vec::new(),
            functions: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn id(&self) -> StageId {
        self.id
    }

    pub fn uniforms(&self) -> &[VariableDecl] {
        &self.uniforms
    }

    pub fn attributes(&self) -> &[VariableDecl] {
        &self.attributes
    }

    pub fn varyings(&self) -> &[VariableDecl] {
        &self.varyings
    }

    pub fn textures(&self) -> &[TextureDecl] {
        &self.textures
    }

    pub fn functions(&self) -> &[FunctionDecl] {
        &self.functions
    }

    pub fn body(&self) -> &[String] {
        &self.body
    }

    /// Append a statement to the body block.
    pub fn push_stmt(&mut self, stmt: impl Into<String>) {
        self.body.push(stmt.into());
    }

    /// Contribute a helper function. A second contribution under the same
    /// name is a no-op.
    pub fn add_function(&mut self, name: &str, source: impl Into<String>) {
        if self.functions.iter().any(|f| f.name == name) {
            return;
        }
        self.functions.push(FunctionDecl {
            name: name.to_string(),
            source: source.into(),
        });
    }

    fn add_uniform(&mut self, name: &str, ty: ValueType) {
        if self.uniforms.iter().any(|d| d.name == name) {
            return;
        }
        self.uniforms.push(VariableDecl {
            name: name.to_string(),
            ty,
        });
    }

    fn add_attribute(&mut self, name: &str, ty: ValueType) {
        if self.attributes.iter().any(|d| d.name == name) {
            return;
        }
        self.attributes.push(VariableDecl {
            name: name.to_string(),
            ty,
        });
    }

    fn add_varying(&mut self, name: &str, ty: ValueType) {
        if self.varyings.iter().any(|d| d.name == name) {
            return;
        }
        self.varyings.push(VariableDecl {
            name: name.to_string(),
            ty,
        });
    }
}

/// The complete shader under construction: one stage buffer per pipeline
/// phase plus cross-stage bookkeeping (shader-wide uniform binding order).
#[derive(Debug)]
pub struct Shader {
    vertex: ShaderStage,
    fragment: ShaderStage,
    uniform_order: Vec<String>,
}

impl Shader {
    pub fn new() -> Self {
        Self {
            vertex: ShaderStage::new(StageId::Vertex),
            fragment: ShaderStage::new(StageId::Fragment),
            uniform_order: Vec::new(),
        }
    }

    pub fn stage(&self, id: StageId) -> &ShaderStage {
        match id {
            StageId::Vertex => &self.vertex,
            StageId::Fragment => &self.fragment,
        }
    }

    pub fn stage_mut(&mut self, id: StageId) -> &mut ShaderStage {
        match id {
            StageId::Vertex => &mut self.vertex,
            StageId::Fragment => &mut self.fragment,
        }
    }

    pub fn stage_ids(&self) -> [StageId; 2] {
        [StageId::Vertex, StageId::Fragment]
    }

    /// Shader-wide binding index for a uniform. Indices are stable across
    /// stages so the vertex and fragment modules agree on the layout.
    pub fn uniform_binding(&self, name: &str) -> Option<usize> {
        self.uniform_order.iter().position(|n| n == name)
    }

    /// Declare (once) a uniform needed by `stage_id` and bind its symbol.
    /// Repeat calls from other consumers return the existing binding.
    pub fn require_uniform(
        &mut self,
        ctx: &mut GenContext,
        stage_id: StageId,
        logical: &str,
        ty: ValueType,
    ) -> Result<Symbol, CodegenError> {
        let physical = format!("u_{}", sanitize_ident(logical));
        let (symbol, created) =
            ctx.symbols_mut()
                .bind(logical, &physical, ty, StorageClass::Uniform)?;
        if created {
            self.uniform_order.push(symbol.physical.clone());
        }
        self.stage_mut(stage_id).add_uniform(&symbol.physical, ty);
        Ok(symbol)
    }

    /// Declare (once) a vertex input attribute and bind its symbol.
    pub fn require_attribute(
        &mut self,
        ctx: &mut GenContext,
        logical: &str,
        ty: ValueType,
    ) -> Result<Symbol, CodegenError> {
        let physical = format!("i_{}", sanitize_ident(logical));
        let (symbol, _) =
            ctx.symbols_mut()
                .bind(logical, &physical, ty, StorageClass::Attribute)?;
        self.vertex.add_attribute(&symbol.physical, ty);
        Ok(symbol)
    }

    /// Declare (once) a vertex-to-fragment interpolant fed by `vertex_expr`,
    /// declared in both stages. The vertex-stage copy statement is emitted
    /// only when the binding is created, so any number of consumers share a
    /// single declaration and a single write.
    pub fn require_varying(
        &mut self,
        ctx: &mut GenContext,
        logical: &str,
        ty: ValueType,
        vertex_expr: &str,
    ) -> Result<Symbol, CodegenError> {
        let physical = format!("v_{}", sanitize_ident(logical));
        let (symbol, created) =
            ctx.symbols_mut()
                .bind(logical, &physical, ty, StorageClass::Varying)?;
        if created {
            self.vertex.add_varying(&symbol.physical, ty);
            self.fragment.add_varying(&symbol.physical, ty);
            let stmt = ctx.syntax().varying_assign(&symbol.physical, vertex_expr);
            self.vertex.push_stmt(stmt);
        }
        Ok(symbol)
    }

    /// Declare (once) a texture/sampler pair in the fragment stage. Returns
    /// the pair of physical names.
    pub fn require_texture(
        &mut self,
        ctx: &mut GenContext,
        logical: &str,
    ) -> Result<TextureDecl, CodegenError> {
        let tex_physical = format!("t_{}", sanitize_ident(logical));
        let samp_physical = format!("s_{}", sanitize_ident(logical));
        let (tex, created) = ctx.symbols_mut().bind(
            logical,
            &tex_physical,
            ValueType::Vec4,
            StorageClass::Uniform,
        )?;
        if created {
            let sampler_logical = format!("{logical}/sampler");
            ctx.symbols_mut().bind(
                &sampler_logical,
                &samp_physical,
                ValueType::Vec4,
                StorageClass::Uniform,
            )?;
            self.fragment.textures.push(TextureDecl {
                texture: tex_physical.clone(),
                sampler: samp_physical.clone(),
            });
        }
        let sampler = self
            .fragment
            .textures
            .iter()
            .find(|t| t.texture == tex.physical)
            .map(|t| t.sampler.clone())
            .unwrap_or(samp_physical);
        Ok(TextureDecl {
            texture: tex.physical,
            sampler,
        })
    }
}

impl Default for Shader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_block_dedups_by_name() {
        let mut stage = ShaderStage::new(StageId::Fragment);
        stage.add_function("noise2d_value", "fn noise2d_value() {}");
        stage.add_function("noise2d_value", "fn noise2d_value() {}");
        assert_eq!(stage.functions().len(), 1);
    }

    #[test]
    fn declaration_blocks_dedup_by_name() {
        let mut stage = ShaderStage::new(StageId::Vertex);
        stage.add_uniform("u_time", ValueType::Float);
        stage.add_uniform("u_time", ValueType::Float);
        stage.add_varying("v_normal", ValueType::Vec3);
        stage.add_varying("v_normal", ValueType::Vec3);
        assert_eq!(stage.uniforms().len(), 1);
        assert_eq!(stage.varyings().len(), 1);
    }
}
