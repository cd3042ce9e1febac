//! vars.rs
//! The variable table: dense column indices keyed by `VarKey`.

use super::error::FormulationError;
use crate::solver::{Domain, VarDecl, VarIndex, VarKey};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct VariableTable {
    decls: Vec<VarDecl>,
    index: HashMap<VarKey, VarIndex>,
}

impl VariableTable {
    pub fn new() -> Self { Self::default() }

    pub fn declare(&mut self, key: VarKey, domain: Domain) -> Result<VarIndex, FormulationError> {
        if self.index.contains_key(&key) {
            return Err(FormulationError::DuplicateVariable(key));
        }
        let idx = VarIndex(self.decls.len() as u32);
        self.decls.push(VarDecl { key, domain });
        self.index.insert(key, idx);
        Ok(idx)
    }

    #[inline(always)]
    pub fn get(&self, key: &VarKey) -> Option<VarIndex> { self.index.get(key).copied() }

    pub fn contains(&self, key: &VarKey) -> bool { self.index.contains_key(key) }

    /// Like `get`, but reports which step needed the missing variable.
    pub fn require(&self, key: &VarKey, step: &'static str, what: &'static str) -> Result<VarIndex, FormulationError> {
        self.get(key).ok_or(FormulationError::MissingVariables { step, what })
    }

    /// True if at least one variable satisfies `pred`.
    pub fn any(&self, pred: impl Fn(&VarKey) -> bool) -> bool { self.decls.iter().any(|d| pred(&d.key)) }

    /// Declared variables in column order.
    pub fn iter(&self) -> impl Iterator<Item = (VarIndex, &VarKey)> + '_ {
        self.decls.iter().enumerate().map(|(i, d)| (VarIndex(i as u32), &d.key))
    }

    pub fn len(&self) -> usize { self.decls.len() }
    pub fn is_empty(&self) -> bool { self.decls.is_empty() }
    pub fn decls(&self) -> &[VarDecl] { &self.decls }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::NodeId;

    #[test]
    fn test_declare_assigns_dense_indices() {
        let mut t = VariableTable::new();
        let a = t.declare(VarKey::NodeActive(NodeId(0)), Domain::Binary).unwrap();
        let b = t.declare(VarKey::NodeActive(NodeId(1)), Domain::Binary).unwrap();
        assert_eq!((a, b), (VarIndex(0), VarIndex(1)));
        assert_eq!(t.get(&VarKey::NodeActive(NodeId(1))), Some(b));
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn test_duplicate_is_rejected() {
        let mut t = VariableTable::new();
        t.declare(VarKey::MaxLinkLoad, Domain::NON_NEGATIVE).unwrap();
        let err = t.declare(VarKey::MaxLinkLoad, Domain::NON_NEGATIVE).unwrap_err();
        assert_eq!(err, FormulationError::DuplicateVariable(VarKey::MaxLinkLoad));
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn test_require_names_the_step() {
        let t = VariableTable::new();
        let err = t.require(&VarKey::MaxLinkLoad, "objective", "a load variable").unwrap_err();
        assert_eq!(err, FormulationError::MissingVariables { step: "objective", what: "a load variable" });
    }
}
