//! The four C scope kinds and their two identifier namespaces.
//!
//! Grounded directly on `scope.h`/`scope.cpp`: a `Scope` owns two maps
//! (tags; everything else) and a parent pointer, and lookups walk the
//! parent chain testing the current scope's own map first. The
//! original stores scopes as `std::shared_ptr<Scope>` with an explicit
//! `GetParent()`; `Rc<RefCell<ScopeData>>` is the direct translation —
//! shared ownership (a struct type's scope outlives the block that
//! declared it) plus interior mutability (identifiers keep being
//! inserted as a scope's declaration list is parsed).

use crate::ast::{EnumeratorRef, ObjectRef};
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    File,
    Block,
    Function,
    FunctionPrototype,
}

/// Either namespace can hold an object, an enumerator constant, or (via
/// `typedef`) a type alias recorded as an object whose `storage` is
/// `Typedef`; the scope itself doesn't need to distinguish these, the
/// consumer decides based on what it finds.
#[derive(Debug, Clone)]
pub enum Ordinary {
    Object(ObjectRef),
    Enumerator(EnumeratorRef),
}

#[derive(Debug, Clone)]
pub enum Tag {
    Struct(Rc<crate::ty::StructData>),
}

#[derive(Debug)]
pub struct ScopeData {
    pub kind: ScopeKind,
    pub parent: Option<Scope>,
    tags: RefCellMap<Tag>,
    ordinary: RefCellMap<Ordinary>,
}

type RefCellMap<V> = std::cell::RefCell<HashMap<String, V>>;

pub type Scope = Rc<ScopeData>;

pub fn new_scope(parent: Option<Scope>, kind: ScopeKind) -> Scope {
    Rc::new(ScopeData {
        kind,
        parent,
        tags: std::cell::RefCell::new(HashMap::new()),
        ordinary: std::cell::RefCell::new(HashMap::new()),
    })
}

impl ScopeData {
    pub fn is_file_scope(&self) -> bool {
        matches!(self.kind, ScopeKind::File)
    }

    pub fn insert_tag(&self, name: impl Into<String>, tag: Tag) {
        self.tags.borrow_mut().insert(name.into(), tag);
    }

    pub fn insert_ordinary(&self, name: impl Into<String>, value: Ordinary) {
        self.ordinary.borrow_mut().insert(name.into(), value);
    }

    pub fn find_tag_in_current(&self, name: &str) -> Option<Tag> {
        self.tags.borrow().get(name).cloned()
    }

    pub fn find_ordinary_in_current(&self, name: &str) -> Option<Ordinary> {
        self.ordinary.borrow().get(name).cloned()
    }

    /// Walks from this scope up through parents, stopping as soon as a
    /// name is found or file scope's own map has been checked.
    /// Grounded on `Scope::FindTag`.
    pub fn find_tag(&self, name: &str) -> Option<Tag> {
        if let Some(found) = self.find_tag_in_current(name) {
            return Some(found);
        }
        if self.is_file_scope() {
            return None;
        }
        self.parent.as_ref().and_then(|p| p.find_tag(name))
    }

    /// Grounded on `Scope::FindNormal` (renamed `find_ordinary` here to
    /// match spec.md's "ordinary identifiers" namespace name).
    pub fn find_ordinary(&self, name: &str) -> Option<Ordinary> {
        if let Some(found) = self.find_ordinary_in_current(name) {
            return Some(found);
        }
        if self.is_file_scope() {
            return None;
        }
        self.parent.as_ref().and_then(|p| p.find_ordinary(name))
    }
}

/// Tracks the active scope chain during parsing: `enter` pushes a new
/// child scope of a given kind, `exit` pops back to the parent. Kept as
/// a thin stack wrapper (rather than threading `Scope` through every
/// parser method by hand) mirroring how the original parser holds one
/// "current scope" pointer and swaps it around compound-statement and
/// struct-body boundaries.
#[derive(Debug)]
pub struct ScopeStack {
    current: Scope,
}

impl ScopeStack {
    pub fn new() -> ScopeStack {
        ScopeStack { current: new_scope(None, ScopeKind::File) }
    }

    pub fn current(&self) -> Scope {
        self.current.clone()
    }

    pub fn enter(&mut self, kind: ScopeKind) -> Scope {
        let child = new_scope(Some(self.current.clone()), kind);
        self.current = child.clone();
        child
    }

    /// Re-enters a previously constructed scope (e.g. a struct's member
    /// scope, built ahead of time by `Type::new_struct`) as the active
    /// scope, re-parenting it onto the current chain first. This is the
    /// "tag re-parenting rule": a struct tag declared inside a block
    /// keeps lexical visibility rules of that block even though the
    /// struct's own member scope was allocated when the tag was first
    /// seen, possibly before the enclosing block scope existed.
    pub fn enter_reparented(&mut self, scope: Scope) -> Scope {
        let reparented = new_scope(Some(self.current.clone()), scope.kind);
        for (name, tag) in scope.tags.borrow().iter() {
            reparented.insert_tag(name.clone(), tag.clone());
        }
        for (name, ord) in scope.ordinary.borrow().iter() {
            reparented.insert_ordinary(name.clone(), ord.clone());
        }
        self.current = reparented.clone();
        reparented
    }

    pub fn exit(&mut self) {
        let parent = self
            .current
            .parent
            .clone()
            .expect("exit() called on file scope");
        self.current = parent;
    }
}

impl Default for ScopeStack {
    fn default() -> Self {
        ScopeStack::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ObjectData;
    use crate::loc::SourceLocation;
    use crate::ty::{QualType, Type};

    fn obj(name: &str) -> ObjectRef {
        ObjectData::new(name, QualType::unqualified(Type::void()), SourceLocation::synthetic())
    }

    #[test]
    fn lookup_walks_parent_chain() {
        let mut stack = ScopeStack::new();
        stack.current().insert_ordinary("g", Ordinary::Object(obj("g")));
        stack.enter(ScopeKind::Block);
        assert!(stack.current().find_ordinary("g").is_some());
    }

    #[test]
    fn block_shadowing_does_not_touch_parent() {
        let mut stack = ScopeStack::new();
        stack.current().insert_ordinary("x", Ordinary::Object(obj("outer")));
        stack.enter(ScopeKind::Block);
        stack.current().insert_ordinary("x", Ordinary::Object(obj("inner")));
        match stack.current().find_ordinary("x") {
            Some(Ordinary::Object(o)) => assert_eq!(o.name, "inner"),
            _ => panic!("expected a shadowed binding"),
        }
        stack.exit();
        match stack.current().find_ordinary("x") {
            Some(Ordinary::Object(o)) => assert_eq!(o.name, "outer"),
            _ => panic!("expected the outer binding after exiting the block"),
        }
    }

    #[test]
    fn tags_and_ordinary_identifiers_are_independent_namespaces() {
        let stack = ScopeStack::new();
        stack.current().insert_ordinary("point", Ordinary::Object(obj("point")));
        assert!(stack.current().find_tag("point").is_none());
    }
}
