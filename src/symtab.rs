//! The two-level scoped symbol table.
//!
//! At most one subroutine scope is active at a time (SIMPL forbids nested
//! subroutines), so a single saved-global-scope slot is enough: there is no
//! need for a general scope stack. `open_subroutine` swaps the active global
//! scope out for a fresh local one and remembers it; `close_subroutine`
//! swaps it back. Lookup honors the spec's visibility rule: the active
//! scope is searched first, then the global scope, but a global hit is only
//! accepted if it is callable — global variables never leak into a
//! subroutine.

use crate::hashtable::HashTable;
use crate::types::ValType;

/// Properties attached to a declared name. Immutable once created.
#[derive(Debug, Clone)]
pub struct IdProp {
    pub val_type: ValType,
    /// Local slot index, 1-based. 0 for names that do not occupy a slot
    /// (callables are not themselves stored in a frame).
    pub offset: u32,
    pub nparams: usize,
    pub params: Vec<ValType>,
}

impl IdProp {
    pub fn variable(val_type: ValType, offset: u32) -> Self {
        IdProp {
            val_type,
            offset,
            nparams: 0,
            params: Vec::new(),
        }
    }

    pub fn callable(val_type: ValType, params: Vec<ValType>) -> Self {
        let nparams = params.len();
        IdProp {
            val_type,
            offset: 0,
            nparams,
            params,
        }
    }
}

#[derive(Debug)]
pub enum SymbolError {
    Duplicate,
}

struct Scope {
    table: HashTable<IdProp>,
    curr_offset: u32,
}

impl Scope {
    fn new() -> Self {
        Scope {
            table: HashTable::new(),
            curr_offset: 1,
        }
    }
}

pub struct SymbolTable {
    global: Scope,
    active: Option<Scope>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            global: Scope::new(),
            active: None,
        }
    }

    fn current_scope_mut(&mut self) -> &mut Scope {
        self.active.as_mut().unwrap_or(&mut self.global)
    }

    /// Inserts `name` in the active scope (or the global scope, if no
    /// subroutine is open). Variables are assigned the next local slot in
    /// that scope; callables are not.
    pub fn insert(&mut self, name: &str, mut props: IdProp) -> Result<(), SymbolError> {
        let scope = self.current_scope_mut();
        if scope.table.contains_key(name) {
            return Err(SymbolError::Duplicate);
        }
        if props.val_type.is_variable() {
            props.offset = scope.curr_offset;
            scope.curr_offset += 1;
        }
        scope.table.insert(name, props);
        Ok(())
    }

    /// Inserts a callable into the *global* scope regardless of whether a
    /// subroutine is currently open, then opens a fresh subroutine scope.
    /// Used by `funcdef` to register the subroutine before entering its
    /// body.
    pub fn open_subroutine(&mut self, name: &str, props: IdProp) -> Result<(), SymbolError> {
        if self.global.table.contains_key(name) {
            return Err(SymbolError::Duplicate);
        }
        self.global.table.insert(name, props);
        self.active = Some(Scope::new());
        Ok(())
    }

    /// Frees the active scope and restores global-only visibility. Must be
    /// exactly balanced with `open_subroutine`.
    pub fn close_subroutine(&mut self) {
        self.active = None;
    }

    /// Opens a scope for the implicit top-level `main` body, which is not a
    /// callable and so has no global-table entry of its own. Balanced with
    /// `close_subroutine`.
    pub fn open_main_scope(&mut self) {
        self.active = Some(Scope::new());
    }

    pub fn in_subroutine(&self) -> bool {
        self.active.is_some()
    }

    /// Active-scope hit wins; otherwise the global scope is searched, and a
    /// hit there is only honored if it is callable.
    pub fn find(&self, name: &str) -> Option<&IdProp> {
        if let Some(active) = &self.active {
            if let Some(props) = active.table.get(name) {
                return Some(props);
            }
            return self
                .global
                .table
                .get(name)
                .filter(|p| p.val_type.is_callable());
        }
        self.global.table.get(name)
    }

    /// Width of the currently active scope's frame (or the global scope's,
    /// if no subroutine is open), consumed by the emitter to size a frame.
    pub fn locals_width(&self) -> u32 {
        match &self.active {
            Some(scope) => scope.curr_offset,
            None => self.global.curr_offset,
        }
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_find_round_trips() {
        let mut st = SymbolTable::new();
        st.insert("x", IdProp::variable(ValType::INTEGER, 0)).unwrap();
        let found = st.find("x").unwrap();
        assert_eq!(found.val_type, ValType::INTEGER);
        assert_eq!(found.offset, 1);
    }

    #[test]
    fn duplicate_insert_in_same_scope_fails() {
        let mut st = SymbolTable::new();
        st.insert("x", IdProp::variable(ValType::INTEGER, 0)).unwrap();
        assert!(matches!(
            st.insert("x", IdProp::variable(ValType::INTEGER, 0)),
            Err(SymbolError::Duplicate)
        ));
    }

    #[test]
    fn global_variable_not_visible_inside_subroutine() {
        let mut st = SymbolTable::new();
        st.insert("v", IdProp::variable(ValType::INTEGER, 0)).unwrap();
        st.open_subroutine("f", IdProp::callable(ValType::CALLABLE, vec![]))
            .unwrap();
        assert!(st.find("v").is_none());
        assert!(st.find("f").is_some());
        st.close_subroutine();
        assert!(st.find("v").is_some());
    }

    #[test]
    fn slots_are_contiguous_and_start_at_one() {
        let mut st = SymbolTable::new();
        st.open_subroutine("f", IdProp::callable(ValType::CALLABLE, vec![]))
            .unwrap();
        st.insert("a", IdProp::variable(ValType::INTEGER, 0)).unwrap();
        st.insert("b", IdProp::variable(ValType::BOOLEAN, 0)).unwrap();
        assert_eq!(st.find("a").unwrap().offset, 1);
        assert_eq!(st.find("b").unwrap().offset, 2);
        assert_eq!(st.locals_width(), 3);
    }

    #[test]
    fn close_restores_saved_global_scope() {
        let mut st = SymbolTable::new();
        st.insert("g", IdProp::variable(ValType::INTEGER, 0)).unwrap();
        st.open_subroutine("f", IdProp::callable(ValType::CALLABLE, vec![]))
            .unwrap();
        st.insert("local", IdProp::variable(ValType::INTEGER, 0))
            .unwrap();
        st.close_subroutine();
        assert!(st.find("local").is_none());
        assert!(st.find("g").is_some());
        assert!(!st.in_subroutine());
    }

    #[test]
    fn callables_cross_the_scope_boundary() {
        let mut st = SymbolTable::new();
        st.insert(
            "p",
            IdProp::callable(ValType::CALLABLE, vec![ValType::INTEGER]),
        )
        .unwrap();
        st.open_subroutine("f", IdProp::callable(ValType::CALLABLE, vec![]))
            .unwrap();
        let found = st.find("p").unwrap();
        assert_eq!(found.nparams, 1);
    }
}
