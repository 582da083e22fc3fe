//! Symbol table: logical-name to physical-name bindings.
//!
//! Two nodes that both request the same logical input (e.g. the world-space
//! bitangent) must end up sharing one physical declaration. The table makes
//! the second request a no-op that returns the existing binding.

use std::collections::HashMap;

use super::error::CodegenError;
use super::types::ValueType;

/// Storage class of a declared shader variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageClass {
    Uniform,
    /// Vertex input attribute.
    Attribute,
    /// Vertex-to-fragment interpolant.
    Varying,
    /// Stage-local variable in the body block.
    Local,
}

/// A (logical name -> physical name) binding with its declared type.
#[derive(Clone, Debug, PartialEq)]
pub struct Symbol {
    pub logical: String,
    pub physical: String,
    pub ty: ValueType,
    pub storage: StorageClass,
}

/// Per-compilation symbol table. Physical names are unique across the whole
/// compilation; logical lookups are idempotent.
#[derive(Default, Debug)]
pub struct SymbolTable {
    by_logical: HashMap<String, Symbol>,
    logical_by_physical: HashMap<String, String>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `logical` to `physical`, or return the existing binding when the
    /// logical name is already present. The boolean is true when the binding
    /// was created by this call.
    ///
    /// Binding a physical name already owned by a *different* logical name is
    /// an implementation bug and fails with `SymbolCollision`.
    pub fn bind(
        &mut self,
        logical: &str,
        physical: &str,
        ty: ValueType,
        storage: StorageClass,
    ) -> Result<(Symbol, bool), CodegenError> {
        if let Some(existing) = self.by_logical.get(logical) {
            return Ok((existing.clone(), false));
        }
        if let Some(owner) = self.logical_by_physical.get(physical) {
            return Err(CodegenError::SymbolCollision {
                physical: physical.to_string(),
                logical: logical.to_string(),
                existing: owner.clone(),
            });
        }
        let symbol = Symbol {
            logical: logical.to_string(),
            physical: physical.to_string(),
            ty,
            storage,
        };
        self.by_logical.insert(logical.to_string(), symbol.clone());
        self.logical_by_physical
            .insert(physical.to_string(), logical.to_string());
        Ok((symbol, true))
    }

    pub fn lookup(&self, logical: &str) -> Option<&Symbol> {
        self.by_logical.get(logical)
    }

    pub fn len(&self) -> usize {
        self.by_logical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_logical.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_bind_of_same_logical_returns_existing() {
        let mut table = SymbolTable::new();
        let (first, created) = table
            .bind("bitangent", "v_bitangent", ValueType::Vec3, StorageClass::Varying)
            .unwrap();
        assert!(created);

        // A second consumer asks for the same logical input, even with a
        // different physical hint; it must get the first binding back.
        let (second, created) = table
            .bind("bitangent", "v_bitangent_2", ValueType::Vec3, StorageClass::Varying)
            .unwrap();
        assert!(!created);
        assert_eq!(first, second);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn physical_name_owned_by_other_logical_collides() {
        let mut table = SymbolTable::new();
        table
            .bind("time", "u_time", ValueType::Float, StorageClass::Uniform)
            .unwrap();
        let err = table
            .bind("frame", "u_time", ValueType::Float, StorageClass::Uniform)
            .unwrap_err();
        assert!(matches!(err, CodegenError::SymbolCollision { .. }));
    }

    #[test]
    fn lookup_sees_bound_symbols_only() {
        let mut table = SymbolTable::new();
        assert!(table.lookup("normal").is_none());
        table
            .bind("normal", "v_normal", ValueType::Vec3, StorageClass::Varying)
            .unwrap();
        assert_eq!(table.lookup("normal").unwrap().physical, "v_normal");
    }
}
