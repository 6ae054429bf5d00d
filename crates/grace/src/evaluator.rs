//! The AST-walking evaluator: the component that actually drives the
//! value model, scope chain and dispatch machinery against a prepared
//! syntax tree.
//!
//! Evaluation proceeds node by node via [`Evaluator::eval_node`], which
//! consults the debug hook (if any) before each node's effect and folds
//! its result into [`Evaluator::partial`]. Non-local control flow -- the
//! `Return` signal -- is represented by [`Flow`], an internal enum never
//! exposed past the public `evaluate_ast`/`evaluate_sandbox` boundary.

use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::{Identifier, Node, NodeKind};
use crate::debug::{DebugHook, NullHook};
use crate::error::{CodeLoc, EvalError, EvalResult, GraceException, StackFrame};
use crate::heap::{Heap, ObjectId};
use crate::scope;
use crate::value::{self, MethodDef, Value, ValueData};

/// Internal control signal threaded through node evaluation: either a
/// genuine failure or a `Return` unwinding toward its enclosing
/// method/block frame. Never surfaces outside this module -- the public
/// entry points translate it into `EvalResult`.
pub(crate) enum Flow {
    Error(GraceException),
    Return(Value),
}

impl From<EvalError> for Flow {
    fn from(reason: EvalError) -> Self {
        Flow::Error(reason.into())
    }
}

impl From<GraceException> for Flow {
    fn from(exc: GraceException) -> Self {
        Flow::Error(exc)
    }
}

type Flowing<T> = Result<T, Flow>;

/// Drives one AST against one heap and scope chain. Construct with
/// [`Evaluator::new`], feed it top-level statements with
/// [`Evaluator::evaluate_ast`] or [`Evaluator::evaluate_sandbox`], and
/// read the result back from [`Evaluator::partial`].
pub struct Evaluator {
    heap: Heap,
    current_scope: Value,
    partial: Value,
    debug_hook: Option<Box<dyn DebugHook>>,
}

impl Evaluator {
    /// Builds a fresh evaluator with an empty heap and a single root
    /// scope. `debug_hook` is invoked before and after every node; pass
    /// `None` to run at full speed with no stepping support.
    pub fn new(debug_hook: Option<Box<dyn DebugHook>>) -> Self {
        let mut heap = Heap::new();
        let root = scope::make_scope(&mut heap, None);
        value::install_self(&mut heap, &root);
        Self {
            heap,
            current_scope: root,
            partial: Value::Done,
            debug_hook,
        }
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub fn heap_mut(&mut self) -> &mut Heap {
        &mut self.heap
    }

    pub fn partial(&self) -> &Value {
        &self.partial
    }

    pub fn current_scope(&self) -> &Value {
        &self.current_scope
    }

    /// Installs a new hook, replacing whatever was configured at
    /// construction (including `None`).
    pub fn set_debug_hook(&mut self, hook: Option<Box<dyn DebugHook>>) {
        self.debug_hook = hook;
    }

    /// Allocates a scope whose parent is the current scope, installs it
    /// as current, and returns it.
    pub fn create_new_scope(&mut self) -> Value {
        let parent = scope::id(&self.current_scope);
        let child = scope::make_scope(&mut self.heap, Some(parent));
        value::install_self(&mut self.heap, &child);
        self.current_scope = child.clone();
        child
    }

    /// Replaces the current scope with its parent. Fails at the root.
    pub fn restore_scope(&mut self) -> Result<(), EvalError> {
        match scope::parent_scope(&self.heap, &self.current_scope) {
            Some(parent) => {
                self.current_scope = parent;
                Ok(())
            }
            None => Err(EvalError::ScopeUnderflow),
        }
    }

    /// Unconditionally replaces the current scope, used by dispatch when
    /// entering a method or block body over its own defining scope.
    pub fn set_scope(&mut self, scope: Value) {
        self.current_scope = scope;
    }

    pub fn make_boolean(&self, b: bool) -> Value {
        Value::Boolean(b)
    }

    pub fn make_number(&self, n: f64) -> Value {
        Value::Number(n)
    }

    pub fn make_string(&self, text: impl Into<Rc<str>>) -> Value {
        Value::String(text.into())
    }

    pub fn make_done(&self) -> Value {
        Value::Done
    }

    pub fn make_block(&mut self, params: Rc<[Identifier]>, body: Rc<[Node]>) -> Value {
        let captured_scope = scope::id(&self.current_scope);
        let id = self.heap.allocate(ValueData::Block {
            params,
            body,
            captured_scope,
            fields: HashMap::new(),
            methods: HashMap::new(),
        });
        let v = Value::Ref(id);
        value::install_self(&mut self.heap, &v);
        v
    }

    pub fn make_user_object(&mut self) -> Value {
        let parent = scope::id(&self.current_scope);
        let id = self.heap.allocate(ValueData::UserObject {
            fields: HashMap::new(),
            methods: HashMap::new(),
            parent: Some(parent),
        });
        let v = Value::Ref(id);
        value::install_self(&mut self.heap, &v);
        v
    }

    pub fn make_scope(&mut self, parent: Option<&Value>) -> Value {
        let parent_id = parent.map(scope::id);
        let v = scope::make_scope(&mut self.heap, parent_id);
        value::install_self(&mut self.heap, &v);
        v
    }

    /// Evaluates a sequence of top-level statements directly in the
    /// current scope (the root scope, for a freshly constructed
    /// evaluator), leaving the last value in `partial`. On error, the
    /// current scope is reset to what it was before this call so the
    /// evaluator remains usable for the next top-level statement; the
    /// heap is always retained.
    pub fn evaluate_ast(&mut self, ast: &[Node]) -> EvalResult<Value> {
        let saved_scope = self.current_scope.clone();
        match self.eval_statements(ast) {
            Ok(v) | Err(Flow::Return(v)) => {
                self.partial = v.clone();
                Ok(v)
            }
            Err(Flow::Error(exc)) => {
                self.current_scope = saved_scope;
                Err(exc)
            }
        }
    }

    /// Like `evaluate_ast`, but pushes a fresh child scope before
    /// evaluating and pops it afterward regardless of outcome, so the
    /// caller's own scope and bindings are never observably altered.
    pub fn evaluate_sandbox(&mut self, ast: &[Node]) -> EvalResult<Value> {
        let parent = scope::id(&self.current_scope);
        let child = scope::make_scope(&mut self.heap, Some(parent));
        value::install_self(&mut self.heap, &child);
        let saved = std::mem::replace(&mut self.current_scope, child);
        let outcome = self.eval_statements(ast);
        self.current_scope = saved;
        match outcome {
            Ok(v) | Err(Flow::Return(v)) => {
                self.partial = v.clone();
                Ok(v)
            }
            Err(Flow::Error(exc)) => Err(exc),
        }
    }

    fn eval_statements(&mut self, ast: &[Node]) -> Flowing<Value> {
        let mut last = Value::Done;
        for node in ast {
            last = self.eval_node(node)?;
        }
        Ok(last)
    }

    fn eval_node(&mut self, node: &Node) -> Flowing<Value> {
        self.run_before_hook(node)?;
        let result = self.eval_kind(&node.kind).map_err(|flow| attach_loc(flow, node.loc));
        let value = match result {
            Ok(v) => v,
            Err(flow) => return Err(flow),
        };
        self.partial = value.clone();
        self.run_after_hook(node)?;
        Ok(value)
    }

    fn run_before_hook(&mut self, node: &Node) -> Flowing<()> {
        let Some(mut hook) = self.debug_hook.take() else {
            return Ok(());
        };
        let outcome = hook.on_before_node(node, self);
        self.debug_hook = Some(hook);
        outcome.map_err(|e| attach_loc(Flow::Error(e.into()), node.loc))
    }

    fn run_after_hook(&mut self, node: &Node) -> Flowing<()> {
        let Some(mut hook) = self.debug_hook.take() else {
            return Ok(());
        };
        let outcome = hook.on_after_node(node, self);
        self.debug_hook = Some(hook);
        outcome.map_err(|e| attach_loc(Flow::Error(e.into()), node.loc))
    }

    fn eval_kind(&mut self, kind: &NodeKind) -> Flowing<Value> {
        match kind {
            NodeKind::BooleanLiteral(b) => Ok(Value::Boolean(*b)),
            NodeKind::NumberLiteral(n) => Ok(Value::Number(*n)),
            NodeKind::StringLiteral(s) => Ok(Value::String(s.clone())),
            NodeKind::VariableReference(name) => self.resolve_implicit(name, Vec::new()),
            NodeKind::VariableDeclaration { name, init } => {
                let value = match init {
                    Some(expr) => self.eval_node(expr)?,
                    None => Value::Done,
                };
                self.current_scope
                    .declare_field(&mut self.heap, name, value.clone(), true)
                    .map_err(Flow::from)?;
                Ok(value)
            }
            NodeKind::ConstantDeclaration { name, init } => {
                let value = self.eval_node(init)?;
                self.current_scope
                    .declare_field(&mut self.heap, name, value.clone(), false)
                    .map_err(Flow::from)?;
                Ok(value)
            }
            NodeKind::Assignment { name, value } => {
                let new_value = self.eval_node(value)?;
                match scope::owning_scope(&self.heap, &self.current_scope, name) {
                    Some(owner) => {
                        owner
                            .assign_field(&mut self.heap, name, new_value.clone())
                            .map_err(Flow::from)?;
                        Ok(new_value)
                    }
                    None => Err(EvalError::UndefinedName(name.to_string()).into()),
                }
            }
            NodeKind::MethodDeclaration { selector, params, body } => {
                let defining_scope = scope::id(&self.current_scope);
                let def = MethodDef::User {
                    params: params.clone(),
                    body: body.clone(),
                    defining_scope,
                };
                self.current_scope
                    .set_method(&mut self.heap, selector, def)
                    .map_err(Flow::from)?;
                Ok(Value::Done)
            }
            NodeKind::Block { params, body } => Ok(self.make_block(params.clone(), body.clone())),
            NodeKind::ObjectConstructor { body } => self.eval_object_constructor(body),
            NodeKind::ImplicitRequest { selector, args } => {
                let values = self.eval_args(args)?;
                self.resolve_implicit(selector, values)
            }
            NodeKind::ExplicitRequest { selector, receiver, args } => {
                let receiver_value = self.eval_node(receiver)?;
                let values = self.eval_args(args)?;
                self.dispatch(selector, receiver_value, values)
            }
            NodeKind::Return(expr) => {
                let value = match expr {
                    Some(expr) => self.eval_node(expr)?,
                    None => self.partial.clone(),
                };
                Err(Flow::Return(value))
            }
            NodeKind::IfThen { cond, then_body } => {
                if self.eval_node(cond)?.as_boolean(&self.heap).map_err(Flow::from)? {
                    self.eval_in_child_scope(then_body)
                } else {
                    Ok(Value::Done)
                }
            }
            NodeKind::IfThenElse { cond, then_body, else_body } => {
                if self.eval_node(cond)?.as_boolean(&self.heap).map_err(Flow::from)? {
                    self.eval_in_child_scope(then_body)
                } else {
                    self.eval_in_child_scope(else_body)
                }
            }
            NodeKind::While { cond, body } => {
                loop {
                    let keep_going = self.eval_node(cond)?.as_boolean(&self.heap).map_err(Flow::from)?;
                    if !keep_going {
                        break;
                    }
                    self.eval_in_child_scope(body)?;
                }
                Ok(Value::Done)
            }
        }
    }

    fn eval_args(&mut self, args: &[Node]) -> Flowing<Vec<Value>> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval_node(arg)?);
        }
        Ok(values)
    }

    /// Evaluates `body` in a fresh scope that is a child of the current
    /// one, discarding the scope afterward. Used for `IfThen`/`IfThenElse`
    /// branches and `While` iterations; unlike a method or block
    /// invocation this is *not* a frame, so a `Return` inside keeps
    /// unwinding past it.
    fn eval_in_child_scope(&mut self, body: &[Node]) -> Flowing<Value> {
        let parent = scope::id(&self.current_scope);
        let child = scope::make_scope(&mut self.heap, Some(parent));
        value::install_self(&mut self.heap, &child);
        let saved = std::mem::replace(&mut self.current_scope, child);
        let result = self.eval_statements(body);
        self.current_scope = saved;
        result
    }

    /// Builds the `UserObject` for an `ObjectConstructor`: declarations in
    /// `body` land on the object itself (it is installed as the current
    /// scope while the body runs), non-declaration statements run for
    /// effect. There is no enclosing method/block frame inside a
    /// constructor body, so a bare `Return` directly in it (as opposed to
    /// one nested inside a `MethodDeclaration`, which is caught by that
    /// method's own invocation) has nowhere to unwind to; it raises the
    /// same `ScopeUnderflow` internal error a stray `restore_scope` past
    /// the root would.
    fn eval_object_constructor(&mut self, body: &[Node]) -> Flowing<Value> {
        let obj = self.make_user_object();
        let saved = std::mem::replace(&mut self.current_scope, obj.clone());
        let outcome = self.eval_statements(body);
        self.current_scope = saved;
        match outcome {
            Ok(_) => Ok(obj),
            Err(Flow::Return(_)) => Err(EvalError::ScopeUnderflow.into()),
            Err(err @ Flow::Error(_)) => Err(err),
        }
    }

    /// Implicit-request resolution: walks the scope chain starting at
    /// the current scope, and at each level prefers a zero-argument field
    /// read over a method of the same name before moving to the parent.
    fn resolve_implicit(&mut self, selector: &str, args: Vec<Value>) -> Flowing<Value> {
        let mut current = self.current_scope.clone();
        loop {
            if args.is_empty() && current.has_field(&self.heap, selector) {
                return current.get_field(&self.heap, selector).map_err(Flow::from);
            }
            if let Some(def) = current.get_method(&self.heap, selector) {
                return self.invoke_method_def(selector, def, current, args);
            }
            match scope::parent_scope(&self.heap, &current) {
                Some(parent) => current = parent,
                None => return Err(EvalError::UndefinedName(selector.to_owned()).into()),
            }
        }
    }

    /// Explicit-request dispatch: the receiver's method table decides,
    /// with no further fallback.
    pub(crate) fn dispatch(&mut self, selector: &str, receiver: Value, args: Vec<Value>) -> Flowing<Value> {
        match receiver.get_method(&self.heap, selector) {
            Some(def) => self.invoke_method_def(selector, def, receiver, args),
            None => Err(EvalError::NoSuchMethod {
                type_name: receiver.type_name(&self.heap),
                selector: selector.to_owned(),
            }
            .into()),
        }
    }

    fn invoke_method_def(&mut self, selector: &str, def: MethodDef, receiver: Value, args: Vec<Value>) -> Flowing<Value> {
        match def {
            MethodDef::Native(f) => f(self, receiver, &args).map_err(Flow::from),
            MethodDef::User { params, body, defining_scope } => {
                self.invoke_callable(selector, &params, &body, defining_scope, args)
            }
        }
    }

    /// Invokes a user method or block body: a fresh scope parented at
    /// `lexical_parent` (the defining or captured scope, never the
    /// caller's scope), parameters bound there, statements run
    /// sequentially, and a `Return` caught here fixes the result.
    fn invoke_callable(
        &mut self,
        selector: &str,
        params: &[Identifier],
        body: &[Node],
        lexical_parent: ObjectId,
        args: Vec<Value>,
    ) -> Flowing<Value> {
        if args.len() != params.len() {
            return Err(EvalError::ArityMismatch {
                selector: selector.to_owned(),
                expected: params.len(),
                got: args.len(),
            }
            .into());
        }
        let new_scope = scope::make_scope(&mut self.heap, Some(lexical_parent));
        value::install_self(&mut self.heap, &new_scope);
        for (param, arg) in params.iter().zip(args) {
            new_scope.declare_field(&mut self.heap, param, arg, true).map_err(Flow::from)?;
        }
        let saved = std::mem::replace(&mut self.current_scope, new_scope);
        let result = self.eval_body_catching_return(body);
        self.current_scope = saved;
        result.map_err(|flow| match flow {
            Flow::Error(exc) => Flow::Error(exc.push_frame(StackFrame { selector: selector.to_owned(), loc: None })),
            other => other,
        })
    }

    fn eval_body_catching_return(&mut self, body: &[Node]) -> Flowing<Value> {
        match self.eval_statements(body) {
            Ok(v) => Ok(v),
            Err(Flow::Return(v)) => Ok(v),
            Err(err @ Flow::Error(_)) => Err(err),
        }
    }

    /// Applies a block to `args`. Called from the native `apply` family
    /// installed on every `Block` value; surfaced as a plain `EvalError`
    /// because the native method signature cannot carry a `Return` (the
    /// block's own body already absorbed it by the time this returns).
    pub(crate) fn apply_block(&mut self, block: &Value, args: &[Value]) -> Result<Value, EvalError> {
        let Value::Ref(id) = block else {
            return Err(EvalError::TypeMismatch {
                expected: value::TYPE_BLOCK,
                got: block.type_name(&self.heap),
            });
        };
        let (params, body, captured_scope) = match self.heap.get(*id) {
            ValueData::Block { params, body, captured_scope, .. } => (params.clone(), body.clone(), *captured_scope),
            _ => {
                return Err(EvalError::TypeMismatch {
                    expected: value::TYPE_BLOCK,
                    got: block.type_name(&self.heap),
                })
            }
        };
        let selector = crate::natives::block_apply_selector(params.len());
        match self.invoke_callable(&selector, &params, &body, captured_scope, args.to_vec()) {
            Ok(v) => Ok(v),
            Err(Flow::Return(v)) => Ok(v),
            Err(Flow::Error(exc)) => Err(exc.reason),
        }
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(Some(Box::new(NullHook)))
    }
}

fn attach_loc(flow: Flow, loc: Option<CodeLoc>) -> Flow {
    match flow {
        Flow::Error(mut exc) => {
            if exc.loc.is_none() {
                exc.loc = loc;
            }
            Flow::Error(exc)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeKind;

    fn lit(kind: NodeKind) -> Node {
        Node::new(kind)
    }

    #[test]
    fn partial_starts_as_done() {
        let ev = Evaluator::new(None);
        assert_eq!(*ev.partial(), Value::Done);
    }

    #[test]
    fn boolean_literal_becomes_partial() {
        let mut ev = Evaluator::new(None);
        let ast = vec![lit(NodeKind::BooleanLiteral(true))];
        let result = ev.evaluate_ast(&ast).unwrap();
        assert_eq!(result, Value::Boolean(true));
        assert_eq!(*ev.partial(), Value::Boolean(true));
    }

    #[test]
    fn prefix_not_flips_boolean() {
        let mut ev = Evaluator::new(None);
        let ast = vec![lit(NodeKind::ExplicitRequest {
            selector: "prefix!".into(),
            receiver: Box::new(lit(NodeKind::BooleanLiteral(true))),
            args: vec![],
        })];
        let result = ev.evaluate_ast(&ast).unwrap();
        assert_eq!(result, Value::Boolean(false));
    }

    #[test]
    fn short_circuit_and_evaluates_both_sides_eagerly() {
        let mut ev = Evaluator::new(None);
        let ast = vec![lit(NodeKind::ExplicitRequest {
            selector: "&&(_)".into(),
            receiver: Box::new(lit(NodeKind::BooleanLiteral(true))),
            args: vec![lit(NodeKind::BooleanLiteral(false))],
        })];
        let result = ev.evaluate_ast(&ast).unwrap();
        assert_eq!(result, Value::Boolean(false));
    }

    #[test]
    fn block_apply_runs_body_and_returns_negated_param() {
        let mut ev = Evaluator::new(None);
        let block = lit(NodeKind::Block {
            params: Rc::from(vec![Identifier::from("x")]),
            body: Rc::from(vec![
                lit(NodeKind::ExplicitRequest {
                    selector: "prefix!".into(),
                    receiver: Box::new(lit(NodeKind::VariableReference("x".into()))),
                    args: vec![],
                }),
                lit(NodeKind::Return(None)),
            ]),
        });
        let ast = vec![lit(NodeKind::ExplicitRequest {
            selector: "apply(_)".into(),
            receiver: Box::new(block),
            args: vec![lit(NodeKind::BooleanLiteral(true))],
        })];
        let result = ev.evaluate_ast(&ast).unwrap();
        assert_eq!(result, Value::Boolean(false));
    }

    #[test]
    fn undefined_name_then_resolves_after_set_scope() {
        let mut ev = Evaluator::new(None);
        let ast = vec![lit(NodeKind::VariableReference("x".into()))];
        let err = ev.evaluate_ast(&ast).unwrap_err();
        assert!(matches!(err.reason, EvalError::UndefinedName(name) if name == "x"));

        let scope = ev.make_scope(None);
        scope.declare_field(ev.heap_mut(), "x", Value::Boolean(true), true).unwrap();
        ev.set_scope(scope);
        let result = ev.evaluate_ast(&ast).unwrap();
        assert_eq!(result, Value::Boolean(true));
    }

    #[test]
    fn object_constructor_installs_methods_and_explicit_call_dispatches() {
        let mut ev = Evaluator::new(None);
        let ctor = lit(NodeKind::ObjectConstructor {
            body: Rc::from(vec![lit(NodeKind::MethodDeclaration {
                selector: "f(_)".into(),
                params: Rc::from(vec![Identifier::from("param")]),
                body: Rc::from(vec![lit(NodeKind::Return(Some(Box::new(lit(NodeKind::VariableReference(
                    "param".into(),
                ))))))]),
            })]),
        });
        let ast = vec![
            lit(NodeKind::ConstantDeclaration {
                name: "x".into(),
                init: Box::new(ctor),
            }),
            lit(NodeKind::ExplicitRequest {
                selector: "f(_)".into(),
                receiver: Box::new(lit(NodeKind::VariableReference("x".into()))),
                args: vec![lit(NodeKind::BooleanLiteral(false))],
            }),
        ];
        let result = ev.evaluate_ast(&ast).unwrap();
        assert_eq!(result, Value::Boolean(false));
    }

    #[test]
    fn bare_return_directly_in_object_constructor_body_errors() {
        let mut ev = Evaluator::new(None);
        let ast = vec![lit(NodeKind::ObjectConstructor {
            body: Rc::from(vec![lit(NodeKind::Return(None))]),
        })];
        let err = ev.evaluate_ast(&ast).unwrap_err();
        assert!(matches!(err.reason, EvalError::ScopeUnderflow));
    }

    #[test]
    fn assignment_to_undeclared_name_fails() {
        let mut ev = Evaluator::new(None);
        let ast = vec![lit(NodeKind::Assignment {
            name: "x".into(),
            value: Box::new(lit(NodeKind::BooleanLiteral(true))),
        })];
        let err = ev.evaluate_ast(&ast).unwrap_err();
        assert!(matches!(err.reason, EvalError::UndefinedName(name) if name == "x"));
    }

    #[test]
    fn while_loop_runs_body_in_fresh_scope_each_iteration() {
        let mut ev = Evaluator::new(None);
        let ast = vec![
            lit(NodeKind::VariableDeclaration {
                name: "n".into(),
                init: Some(Box::new(lit(NodeKind::NumberLiteral(0.0)))),
            }),
            lit(NodeKind::While {
                cond: Box::new(lit(NodeKind::ExplicitRequest {
                    selector: "<(_)".into(),
                    receiver: Box::new(lit(NodeKind::VariableReference("n".into()))),
                    args: vec![lit(NodeKind::NumberLiteral(3.0))],
                })),
                body: Rc::from(vec![lit(NodeKind::Assignment {
                    name: "n".into(),
                    value: Box::new(lit(NodeKind::ExplicitRequest {
                        selector: "+(_)".into(),
                        receiver: Box::new(lit(NodeKind::VariableReference("n".into()))),
                        args: vec![lit(NodeKind::NumberLiteral(1.0))],
                    })),
                })]),
            }),
            lit(NodeKind::VariableReference("n".into())),
        ];
        let result = ev.evaluate_ast(&ast).unwrap();
        assert_eq!(result, Value::Number(3.0));
    }

    #[test]
    fn evaluate_sandbox_leaves_caller_scope_unchanged() {
        let mut ev = Evaluator::new(None);
        let before = ev.current_scope().clone();
        let ast = vec![lit(NodeKind::ConstantDeclaration {
            name: "y".into(),
            init: Box::new(lit(NodeKind::NumberLiteral(1.0))),
        })];
        ev.evaluate_sandbox(&ast).unwrap();
        assert_eq!(*ev.current_scope(), before);
        assert!(!before.has_field(ev.heap(), "y"));
    }

    #[test]
    fn arity_mismatch_on_user_method() {
        let mut ev = Evaluator::new(None);
        let ast = vec![
            lit(NodeKind::MethodDeclaration {
                selector: "f(_)".into(),
                params: Rc::from(vec![Identifier::from("a")]),
                body: Rc::from(vec![lit(NodeKind::VariableReference("a".into()))]),
            }),
            lit(NodeKind::ImplicitRequest {
                selector: "f(_)".into(),
                args: vec![],
            }),
        ];
        let err = ev.evaluate_ast(&ast).unwrap_err();
        assert!(matches!(err.reason, EvalError::ArityMismatch { .. }));
    }
}
