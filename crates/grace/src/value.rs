//! The runtime value model: a small tagged union of handles, backed by
//! heap-allocated payloads for the variants that carry field and method
//! maps (blocks, user objects and scopes).
//!
//! Primitives (`Boolean`, `Number`, `String`, `Done`) are stored inline and
//! never touch the heap. They still satisfy the "every value has a self
//! field and a method map" rule, just not by literally carrying a
//! `HashMap` per instance -- their methods come from the fixed tables in
//! [`crate::natives`] and their `self` field is synthesized by returning
//! the value itself.

use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::{Identifier, Node};
use crate::error::EvalError;
use crate::heap::{Heap, ObjectId};

/// A handle to a runtime value. Cheap to copy; primitives are inline,
/// everything else indirects through the heap.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Boolean(bool),
    Number(f64),
    String(Rc<str>),
    Done,
    Ref(ObjectId),
}

/// A binding in a field map: the value plus whether it was declared with
/// `ConstantDeclaration` (immutable) or `VariableDeclaration` (mutable).
#[derive(Debug, Clone)]
pub struct Binding {
    pub value: Value,
    pub mutable: bool,
}

impl Binding {
    pub fn constant(value: Value) -> Self {
        Self { value, mutable: false }
    }

    pub fn variable(value: Value) -> Self {
        Self { value, mutable: true }
    }
}

/// Either a host-implemented operation or a user-written method body.
#[derive(Clone)]
pub enum MethodDef {
    Native(Rc<dyn Fn(&mut crate::evaluator::Evaluator, Value, &[Value]) -> Result<Value, EvalError>>),
    User {
        params: Rc<[Identifier]>,
        body: Rc<[Node]>,
        defining_scope: ObjectId,
    },
}

impl std::fmt::Debug for MethodDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MethodDef::Native(_) => write!(f, "MethodDef::Native(..)"),
            MethodDef::User { params, .. } => {
                write!(f, "MethodDef::User({} params)", params.len())
            }
        }
    }
}

/// The heap-resident payload for a `Value::Ref`.
#[derive(Debug)]
pub enum ValueData {
    Done,
    Block {
        params: Rc<[Identifier]>,
        body: Rc<[Node]>,
        captured_scope: ObjectId,
        fields: HashMap<String, Binding>,
        methods: HashMap<String, MethodDef>,
    },
    UserObject {
        fields: HashMap<String, Binding>,
        methods: HashMap<String, MethodDef>,
        /// The scope the `ObjectConstructor` body ran in, so the
        /// constructor's implicit-request lookups can walk past `self`
        /// to the enclosing scope. Unused once construction finishes.
        parent: Option<ObjectId>,
    },
    Scope {
        fields: HashMap<String, Binding>,
        methods: HashMap<String, MethodDef>,
        parent: Option<ObjectId>,
    },
}

impl ValueData {
    fn fields(&self) -> Option<&HashMap<String, Binding>> {
        match self {
            ValueData::UserObject { fields, .. }
            | ValueData::Scope { fields, .. }
            | ValueData::Block { fields, .. } => Some(fields),
            ValueData::Done => None,
        }
    }

    fn fields_mut(&mut self) -> Option<&mut HashMap<String, Binding>> {
        match self {
            ValueData::UserObject { fields, .. }
            | ValueData::Scope { fields, .. }
            | ValueData::Block { fields, .. } => Some(fields),
            ValueData::Done => None,
        }
    }

    fn methods(&self) -> &HashMap<String, MethodDef> {
        match self {
            ValueData::UserObject { methods, .. }
            | ValueData::Scope { methods, .. }
            | ValueData::Block { methods, .. } => methods,
            ValueData::Done => {
                static EMPTY: std::sync::OnceLock<HashMap<String, MethodDef>> = std::sync::OnceLock::new();
                EMPTY.get_or_init(HashMap::new)
            }
        }
    }

    fn methods_mut(&mut self) -> Option<&mut HashMap<String, MethodDef>> {
        match self {
            ValueData::UserObject { methods, .. }
            | ValueData::Scope { methods, .. }
            | ValueData::Block { methods, .. } => Some(methods),
            ValueData::Done => None,
        }
    }
}

pub const TYPE_BOOLEAN: &str = "Boolean";
pub const TYPE_NUMBER: &str = "Number";
pub const TYPE_STRING: &str = "String";
pub const TYPE_DONE: &str = "Done";
pub const TYPE_BLOCK: &str = "Block";
pub const TYPE_OBJECT: &str = "Object";
pub const TYPE_SCOPE: &str = "Scope";

impl Value {
    /// The query operations are total -- every value answers exactly one
    /// of `is_boolean`/`is_number`/`is_string`/`is_block`/`is_scope`/
    /// `is_user_object`, or is the `Done` singleton. `type_name` is just
    /// those predicates folded into a name for error messages.
    pub fn type_name(&self, heap: &Heap) -> &'static str {
        if self.is_boolean() {
            TYPE_BOOLEAN
        } else if self.is_number() {
            TYPE_NUMBER
        } else if self.is_string() {
            TYPE_STRING
        } else if self.is_block(heap) {
            TYPE_BLOCK
        } else if self.is_scope(heap) {
            TYPE_SCOPE
        } else if self.is_user_object(heap) {
            TYPE_OBJECT
        } else {
            TYPE_DONE
        }
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, Value::Boolean(_))
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    pub fn is_block(&self, heap: &Heap) -> bool {
        matches!(self, Value::Ref(id) if matches!(heap.get(*id), ValueData::Block { .. }))
    }

    pub fn is_scope(&self, heap: &Heap) -> bool {
        matches!(self, Value::Ref(id) if matches!(heap.get(*id), ValueData::Scope { .. }))
    }

    pub fn is_user_object(&self, heap: &Heap) -> bool {
        matches!(self, Value::Ref(id) if matches!(heap.get(*id), ValueData::UserObject { .. }))
    }

    pub fn as_boolean(&self, heap: &Heap) -> Result<bool, EvalError> {
        match self {
            Value::Boolean(b) => Ok(*b),
            other => Err(EvalError::TypeMismatch {
                expected: TYPE_BOOLEAN,
                got: other.type_name(heap),
            }),
        }
    }

    pub fn as_number(&self, heap: &Heap) -> Result<f64, EvalError> {
        match self {
            Value::Number(n) => Ok(*n),
            other => Err(EvalError::TypeMismatch {
                expected: TYPE_NUMBER,
                got: other.type_name(heap),
            }),
        }
    }

    pub fn as_string(&self, heap: &Heap) -> Result<Rc<str>, EvalError> {
        match self {
            Value::String(s) => Ok(s.clone()),
            other => Err(EvalError::TypeMismatch {
                expected: TYPE_STRING,
                got: other.type_name(heap),
            }),
        }
    }

    pub fn is_heap(&self) -> bool {
        matches!(self, Value::Ref(_))
    }

    /// Structural equality for primitives, handle identity for everything
    /// heap-backed.
    pub fn value_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Done, Value::Done) => true,
            (Value::Ref(a), Value::Ref(b)) => a == b,
            _ => false,
        }
    }

    pub fn has_field(&self, heap: &Heap, name: &str) -> bool {
        match self {
            Value::Ref(id) => heap
                .get(*id)
                .fields()
                .map(|fields| fields.contains_key(name))
                .unwrap_or(false),
            _ => name == "self",
        }
    }

    /// Reads a field. Primitives only answer to `self` (there is no map
    /// to install a binding into); heap-backed values consult their field
    /// map, which always has `self` installed at construction time.
    pub fn get_field(&self, heap: &Heap, name: &str) -> Result<Value, EvalError> {
        match self {
            Value::Ref(id) => heap
                .get(*id)
                .fields()
                .and_then(|fields| fields.get(name))
                .map(|binding| binding.value.clone())
                .ok_or_else(|| EvalError::UndefinedName(name.to_owned())),
            _ if name == "self" => Ok(self.clone()),
            _ => Err(EvalError::UndefinedName(name.to_owned())),
        }
    }

    /// Binds `name` in this value's field map. `mutable` controls whether
    /// the binding may later be reassigned. Fails on primitives, which
    /// carry no field map of their own.
    pub fn declare_field(&self, heap: &mut Heap, name: &str, value: Value, mutable: bool) -> Result<(), EvalError> {
        match self {
            Value::Ref(id) => {
                let fields = heap
                    .get_mut(*id)
                    .fields_mut()
                    .ok_or_else(|| EvalError::TypeMismatch {
                        expected: "an object or scope",
                        got: TYPE_DONE,
                    })?;
                fields.insert(name.to_owned(), Binding { value, mutable });
                Ok(())
            }
            _ => Err(EvalError::TypeMismatch {
                expected: "an object or scope",
                got: "primitive",
            }),
        }
    }

    /// Updates an existing binding in place, failing if it does not exist
    /// or was declared constant.
    pub fn assign_field(&self, heap: &mut Heap, name: &str, value: Value) -> Result<(), EvalError> {
        match self {
            Value::Ref(id) => {
                let fields = heap
                    .get_mut(*id)
                    .fields_mut()
                    .ok_or_else(|| EvalError::UndefinedName(name.to_owned()))?;
                match fields.get_mut(name) {
                    Some(binding) if binding.mutable => {
                        binding.value = value;
                        Ok(())
                    }
                    Some(_) => Err(EvalError::ConstantReassignment(name.to_owned())),
                    None => Err(EvalError::UndefinedName(name.to_owned())),
                }
            }
            _ => Err(EvalError::UndefinedName(name.to_owned())),
        }
    }

    pub fn has_method(&self, heap: &Heap, selector: &str) -> bool {
        self.get_method(heap, selector).is_some()
    }

    /// Looks up a method, checking the value's own method map first (so a
    /// `setMethod` call can override a native) and falling back, for
    /// blocks, to the fixed `apply` native matching its declared arity.
    pub fn get_method(&self, heap: &Heap, selector: &str) -> Option<MethodDef> {
        match self {
            Value::Ref(id) => {
                let data = heap.get(*id);
                if let Some(def) = data.methods().get(selector) {
                    return Some(def.clone());
                }
                match data {
                    ValueData::Block { params, .. } if crate::natives::is_block_apply_selector(selector, params.len()) => {
                        Some(crate::natives::block_apply_native(params.len()))
                    }
                    _ => None,
                }
            }
            _ => crate::natives::lookup(self, selector),
        }
    }

    pub fn set_method(&self, heap: &mut Heap, selector: &str, def: MethodDef) -> Result<(), EvalError> {
        match self {
            Value::Ref(id) => {
                let methods = heap
                    .get_mut(*id)
                    .methods_mut()
                    .ok_or_else(|| EvalError::TypeMismatch {
                        expected: "an object or scope",
                        got: "primitive",
                    })?;
                methods.insert(selector.to_owned(), def);
                Ok(())
            }
            _ => Err(EvalError::TypeMismatch {
                expected: "an object or scope",
                got: "primitive",
            }),
        }
    }
}

/// Installs the `self` field on a freshly allocated heap value, per the
/// construction-time invariant that every value's `self` lookup resolves
/// to a handle to itself. A no-op on primitives, which synthesize `self`
/// on read instead of storing it.
pub fn install_self(heap: &mut Heap, value: &Value) {
    if value.is_heap() {
        value
            .declare_field(heap, "self", value.clone(), false)
            .expect("freshly allocated heap values always accept a self field");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_report_self_field() {
        let v = Value::Number(3.0);
        assert!(v.has_field(&Heap::new(), "self"));
        assert!(v.get_field(&Heap::new(), "self").unwrap().value_eq(&v));
    }

    #[test]
    fn type_mismatch_reports_both_names() {
        let heap = Heap::new();
        let err = Value::Boolean(true).as_number(&heap).unwrap_err();
        match err {
            EvalError::TypeMismatch { expected, got } => {
                assert_eq!(expected, TYPE_NUMBER);
                assert_eq!(got, TYPE_BOOLEAN);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn is_predicates_are_mutually_exclusive_for_primitives() {
        let heap = Heap::new();
        let b = Value::Boolean(true);
        assert!(b.is_boolean() && !b.is_number() && !b.is_string());
        assert!(!b.is_block(&heap) && !b.is_scope(&heap) && !b.is_user_object(&heap));

        let n = Value::Number(1.0);
        assert!(n.is_number() && !n.is_boolean() && !n.is_string());

        let s = Value::String(Rc::from("x"));
        assert!(s.is_string() && !s.is_boolean() && !s.is_number());
    }

    #[test]
    fn is_block_is_scope_is_user_object_match_heap_payload() {
        let mut heap = Heap::new();
        let scope = Value::Ref(heap.allocate(ValueData::Scope {
            fields: HashMap::new(),
            methods: HashMap::new(),
            parent: None,
        }));
        let object = Value::Ref(heap.allocate(ValueData::UserObject {
            fields: HashMap::new(),
            methods: HashMap::new(),
            parent: None,
        }));
        let block = Value::Ref(heap.allocate(ValueData::Block {
            params: Rc::from(Vec::new()),
            body: Rc::from(Vec::new()),
            captured_scope: scope_id(&scope),
            fields: HashMap::new(),
            methods: HashMap::new(),
        }));

        assert!(scope.is_scope(&heap) && !scope.is_block(&heap) && !scope.is_user_object(&heap));
        assert!(object.is_user_object(&heap) && !object.is_scope(&heap) && !object.is_block(&heap));
        assert!(block.is_block(&heap) && !block.is_scope(&heap) && !block.is_user_object(&heap));

        assert_eq!(scope.type_name(&heap), TYPE_SCOPE);
        assert_eq!(object.type_name(&heap), TYPE_OBJECT);
        assert_eq!(block.type_name(&heap), TYPE_BLOCK);
    }

    fn scope_id(scope: &Value) -> crate::heap::ObjectId {
        match scope {
            Value::Ref(id) => *id,
            _ => unreachable!(),
        }
    }

    #[test]
    fn declare_then_assign_const_fails() {
        let mut heap = Heap::new();
        let id = heap.allocate(ValueData::Scope {
            fields: HashMap::new(),
            methods: HashMap::new(),
            parent: None,
        });
        let scope = Value::Ref(id);
        scope.declare_field(&mut heap, "x", Value::Number(1.0), false).unwrap();
        let err = scope.assign_field(&mut heap, "x", Value::Number(2.0)).unwrap_err();
        assert!(matches!(err, EvalError::ConstantReassignment(name) if name == "x"));
    }
}
