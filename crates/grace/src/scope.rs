//! Scope chain operations: creating, entering and leaving environments.
//!
//! A scope is a `Value::Ref` to a `ValueData::Scope` like any other heap
//! value; it just happens to carry a parent link and to be the thing
//! name resolution walks. This mirrors the parent-pointer, map-based
//! environment of the interpreter this one is modeled on, deliberately
//! not the compiled slot-index layout some Rust bytecode interpreters use
//! -- that layout bakes name resolution in at compile time, which is
//! incompatible with resolving arbitrary names against a runtime chain.
//!
//! While an `ObjectConstructor` body is executing, the evaluator's current
//! scope is the `UserObject` under construction rather than a `Scope`
//! value (so declarations land directly on the object). `UserObject`
//! carries the same field/method map shape plus a parent link installed
//! only for that window, so the chain walks below treat `Scope` and
//! `UserObject` uniformly.

use std::collections::HashMap;

use crate::heap::{Heap, ObjectId};
use crate::value::{Binding, MethodDef, Value, ValueData};

/// Allocates a fresh scope whose parent is `parent` (if any).
pub fn make_scope(heap: &mut Heap, parent: Option<ObjectId>) -> Value {
    let id = heap.allocate(ValueData::Scope {
        fields: HashMap::new(),
        methods: HashMap::new(),
        parent,
    });
    Value::Ref(id)
}

/// The heap id backing a scope-like value. Panics on primitives, which
/// are never used as a current scope.
pub fn id(scope: &Value) -> ObjectId {
    match scope {
        Value::Ref(id) => *id,
        _ => unreachable!("scope-like values are always heap-backed"),
    }
}

fn chain_node(heap: &Heap, node: ObjectId) -> Option<(&HashMap<String, Binding>, &HashMap<String, MethodDef>, Option<ObjectId>)> {
    match heap.get(node) {
        ValueData::Scope { fields, methods, parent } => Some((fields, methods, *parent)),
        ValueData::UserObject { fields, methods, parent } => Some((fields, methods, *parent)),
        ValueData::Block { .. } | ValueData::Done => None,
    }
}

/// The enclosing scope, or `None` at the root.
pub fn parent_scope(heap: &Heap, scope: &Value) -> Option<Value> {
    chain_node(heap, id(scope)).and_then(|(_, _, parent)| parent).map(Value::Ref)
}

/// Walks the chain starting at `scope` looking for a binding named
/// `name`, returning the scope (not the value) that owns it.
pub fn owning_scope(heap: &Heap, scope: &Value, name: &str) -> Option<Value> {
    let mut current = id(scope);
    loop {
        let (fields, _, parent) = chain_node(heap, current)?;
        if fields.contains_key(name) {
            return Some(Value::Ref(current));
        }
        current = parent?;
    }
}

/// Walks the chain starting at `scope` looking for a method named
/// `selector`, returning the scope that owns it.
pub fn owning_scope_for_method(heap: &Heap, scope: &Value, selector: &str) -> Option<Value> {
    let mut current = id(scope);
    loop {
        let (_, methods, parent) = chain_node(heap, current)?;
        if methods.contains_key(selector) {
            return Some(Value::Ref(current));
        }
        current = parent?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owning_scope_finds_binding_in_parent() {
        let mut heap = Heap::new();
        let root = make_scope(&mut heap, None);
        root.declare_field(&mut heap, "x", Value::Number(1.0), true).unwrap();
        let child = make_scope(&mut heap, Some(id(&root)));

        let owner = owning_scope(&heap, &child, "x").expect("found");
        assert_eq!(owner, root);
    }

    #[test]
    fn owning_scope_returns_none_when_absent() {
        let mut heap = Heap::new();
        let root = make_scope(&mut heap, None);
        assert!(owning_scope(&heap, &root, "missing").is_none());
    }

    #[test]
    fn scope_round_trip_preserves_identity() {
        let mut heap = Heap::new();
        let root = make_scope(&mut heap, None);
        let child = make_scope(&mut heap, Some(id(&root)));
        let back = parent_scope(&heap, &child);
        assert_eq!(back, Some(root));
    }
}
