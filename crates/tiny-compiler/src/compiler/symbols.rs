use std::collections::HashMap;

use super::ValueType;

/// A formal parameter of a procedure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Param {
    pub(crate) name: String,
    pub(crate) ty: ValueType,
    pub(crate) by_ref: bool,
}

/// What a name stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Entry {
    /// Module-level mutable global named after the variable.
    Global { ty: ValueType },
    /// Function local or parameter. A by-reference local holds the address
    /// of a cell of type `ty`.
    Local { ty: ValueType, by_ref: bool },
    Procedure { params: Vec<Param> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SymbolError {
    Duplicate(String),
    Undefined(String),
    NoEnclosingScope,
}

struct Scope {
    entries: HashMap<String, Entry>,
    parent: Option<usize>,
}

/// Scoped name table. Scopes form a stack; each one records the index of
/// its parent and lookups walk outward along those links.
pub(crate) struct SymbolTable {
    scopes: Vec<Scope>,
}

impl SymbolTable {
    pub(crate) fn new() -> Self {
        Self {
            scopes: vec![Scope {
                entries: HashMap::new(),
                parent: None,
            }],
        }
    }

    fn current(&self) -> usize {
        self.scopes.len() - 1
    }

    /// Add `name` to the current scope. Outer scopes are not consulted.
    pub(crate) fn declare(&mut self, name: &str, entry: Entry) -> Result<(), SymbolError> {
        let idx = self.current();
        let scope = &mut self.scopes[idx];
        if scope.entries.contains_key(name) {
            return Err(SymbolError::Duplicate(name.to_string()));
        }
        scope.entries.insert(name.to_string(), entry);
        Ok(())
    }

    pub(crate) fn resolve(&self, name: &str) -> Result<&Entry, SymbolError> {
        let mut idx = Some(self.current());
        while let Some(i) = idx {
            let scope = &self.scopes[i];
            if let Some(entry) = scope.entries.get(name) {
                return Ok(entry);
            }
            idx = scope.parent;
        }
        Err(SymbolError::Undefined(name.to_string()))
    }

    /// Enter a new scope holding `initial` and parented to the current one.
    pub(crate) fn push_scope(
        &mut self,
        initial: impl IntoIterator<Item = (String, Entry)>,
    ) -> Result<(), SymbolError> {
        let mut entries = HashMap::new();
        for (name, entry) in initial {
            if entries.contains_key(&name) {
                return Err(SymbolError::Duplicate(name));
            }
            entries.insert(name, entry);
        }
        let parent = Some(self.current());
        self.scopes.push(Scope { entries, parent });
        Ok(())
    }

    pub(crate) fn pop_scope(&mut self) -> Result<(), SymbolError> {
        let idx = self.current();
        if self.scopes[idx].parent.is_none() {
            return Err(SymbolError::NoEnclosingScope);
        }
        self.scopes.pop();
        Ok(())
    }

    /// Number of live scopes, the global scope included.
    #[cfg(test)]
    pub(crate) fn depth(&self) -> usize {
        self.scopes.len()
    }
}
