//! The fixed native method table installed on every primitive value.
//!
//! Unlike user objects, primitives don't materialize a `HashMap` of
//! methods per instance -- that table is static and keyed only by type,
//! so [`lookup`] just matches on the receiver's variant and the selector
//! string. This mirrors how the tree-walking revision of the interpreter
//! this one descends from dispatched primitive operations by matching on
//! its `Object` enum rather than consulting a per-instance map.

use std::rc::Rc;

use crate::error::EvalError;
use crate::evaluator::Evaluator;
use crate::value::{MethodDef, Value};

type NativeFn = Rc<dyn Fn(&mut Evaluator, Value, &[Value]) -> Result<Value, EvalError>>;

fn native(f: impl Fn(&mut Evaluator, Value, &[Value]) -> Result<Value, EvalError> + 'static) -> MethodDef {
    let boxed: NativeFn = Rc::new(f);
    MethodDef::Native(boxed)
}

fn expect_arity(selector: &str, expected: usize, args: &[Value]) -> Result<(), EvalError> {
    if args.len() != expected {
        return Err(EvalError::ArityMismatch {
            selector: selector.to_owned(),
            expected,
            got: args.len(),
        });
    }
    Ok(())
}

/// Looks up a native method for `receiver` by selector, or `None` if the
/// receiver's type has no such native.
pub fn lookup(receiver: &Value, selector: &str) -> Option<MethodDef> {
    match receiver {
        Value::Boolean(_) => boolean_native(selector),
        Value::Number(_) => number_native(selector),
        Value::String(_) => string_native(selector),
        Value::Done | Value::Ref(_) => None,
    }
}

/// The selector a block of the given arity answers `apply` requests to:
/// `apply` for zero parameters, `apply(_)` for one, `apply(_,_)` for two,
/// and so on.
pub fn block_apply_selector(arity: usize) -> String {
    if arity == 0 {
        "apply".to_owned()
    } else {
        format!("apply({})", vec!["_"; arity].join(","))
    }
}

pub fn is_block_apply_selector(selector: &str, arity: usize) -> bool {
    selector == block_apply_selector(arity)
}

/// The native backing a block's `apply` family: delegates to the
/// evaluator, which runs the block's body as a fresh invocation over its
/// captured scope.
pub fn block_apply_native(arity: usize) -> MethodDef {
    native(move |ev, recv, args| {
        expect_arity(&block_apply_selector(arity), arity, args)?;
        ev.apply_block(&recv, args)
    })
}

fn boolean_native(selector: &str) -> Option<MethodDef> {
    match selector {
        "prefix!" => Some(native(|ev, recv, args| {
            expect_arity("prefix!", 0, args)?;
            let b = recv.as_boolean(ev.heap())?;
            Ok(Value::Boolean(!b))
        })),
        "&&(_)" => Some(native(|ev, recv, args| {
            expect_arity("&&(_)", 1, args)?;
            let a = recv.as_boolean(ev.heap())?;
            let b = args[0].as_boolean(ev.heap())?;
            Ok(Value::Boolean(a && b))
        })),
        "||(_)" => Some(native(|ev, recv, args| {
            expect_arity("||(_)", 1, args)?;
            let a = recv.as_boolean(ev.heap())?;
            let b = args[0].as_boolean(ev.heap())?;
            Ok(Value::Boolean(a || b))
        })),
        "==(_)" => Some(native(|ev, recv, args| {
            expect_arity("==(_)", 1, args)?;
            let a = recv.as_boolean(ev.heap())?;
            let eq = match &args[0] {
                Value::Boolean(b) => a == *b,
                _ => false,
            };
            Ok(Value::Boolean(eq))
        })),
        "!=(_)" => Some(native(|ev, recv, args| {
            expect_arity("!=(_)", 1, args)?;
            let a = recv.as_boolean(ev.heap())?;
            let eq = match &args[0] {
                Value::Boolean(b) => a == *b,
                _ => false,
            };
            Ok(Value::Boolean(!eq))
        })),
        _ => None,
    }
}

fn number_binop(
    selector: &'static str,
    f: impl Fn(f64, f64) -> Result<f64, EvalError> + 'static,
) -> MethodDef {
    native(move |ev, recv, args| {
        expect_arity(selector, 1, args)?;
        let a = recv.as_number(ev.heap())?;
        let b = args[0].as_number(ev.heap())?;
        Ok(Value::Number(f(a, b)?))
    })
}

fn number_cmp(selector: &'static str, f: impl Fn(f64, f64) -> bool + 'static) -> MethodDef {
    native(move |ev, recv, args| {
        expect_arity(selector, 1, args)?;
        let a = recv.as_number(ev.heap())?;
        let b = args[0].as_number(ev.heap())?;
        Ok(Value::Boolean(f(a, b)))
    })
}

fn number_native(selector: &str) -> Option<MethodDef> {
    match selector {
        "+(_)" => Some(number_binop("+(_)", |a, b| Ok(a + b))),
        "-(_)" => Some(number_binop("-(_)", |a, b| Ok(a - b))),
        "*(_)" => Some(number_binop("*(_)", |a, b| Ok(a * b))),
        "/(_)" => Some(number_binop("/(_)", |a, b| {
            if b == 0.0 {
                Err(EvalError::DivisionByZero)
            } else {
                Ok(a / b)
            }
        })),
        "prefix-" => Some(native(|ev, recv, args| {
            expect_arity("prefix-", 0, args)?;
            Ok(Value::Number(-recv.as_number(ev.heap())?))
        })),
        "==(_)" => Some(native(|ev, recv, args| {
            expect_arity("==(_)", 1, args)?;
            let a = recv.as_number(ev.heap())?;
            let eq = matches!(&args[0], Value::Number(b) if a == *b);
            Ok(Value::Boolean(eq))
        })),
        "!=(_)" => Some(native(|ev, recv, args| {
            expect_arity("!=(_)", 1, args)?;
            let a = recv.as_number(ev.heap())?;
            let eq = matches!(&args[0], Value::Number(b) if a == *b);
            Ok(Value::Boolean(!eq))
        })),
        "<(_)" => Some(number_cmp("<(_)", |a, b| a < b)),
        "<=(_)" => Some(number_cmp("<=(_)", |a, b| a <= b)),
        ">(_)" => Some(number_cmp(">(_)", |a, b| a > b)),
        ">=(_)" => Some(number_cmp(">=(_)", |a, b| a >= b)),
        _ => None,
    }
}

fn string_native(selector: &str) -> Option<MethodDef> {
    match selector {
        "==(_)" => Some(native(|ev, recv, args| {
            expect_arity("==(_)", 1, args)?;
            let a = recv.as_string(ev.heap())?;
            let eq = matches!(&args[0], Value::String(b) if a == *b);
            Ok(Value::Boolean(eq))
        })),
        "!=(_)" => Some(native(|ev, recv, args| {
            expect_arity("!=(_)", 1, args)?;
            let a = recv.as_string(ev.heap())?;
            let eq = matches!(&args[0], Value::String(b) if a == *b);
            Ok(Value::Boolean(!eq))
        })),
        "<(_)" => Some(string_cmp("<(_)", |a, b| a < b)),
        "<=(_)" => Some(string_cmp("<=(_)", |a, b| a <= b)),
        ">(_)" => Some(string_cmp(">(_)", |a, b| a > b)),
        ">=(_)" => Some(string_cmp(">=(_)", |a, b| a >= b)),
        "++(_)" => Some(native(|ev, recv, args| {
            expect_arity("++(_)", 1, args)?;
            let a = recv.as_string(ev.heap())?;
            let b = args[0].as_string(ev.heap())?;
            Ok(Value::String(Rc::from(format!("{a}{b}"))))
        })),
        _ => None,
    }
}

fn string_cmp(selector: &'static str, f: impl Fn(&str, &str) -> bool + 'static) -> MethodDef {
    native(move |ev, recv, args| {
        expect_arity(selector, 1, args)?;
        let a = recv.as_string(ev.heap())?;
        let b = args[0].as_string(ev.heap())?;
        Ok(Value::Boolean(f(&a, &b)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boolean_and_combines_both_operands() {
        let def = boolean_native("&&(_)").expect("native exists");
        let MethodDef::Native(f) = def else { unreachable!() };
        let mut ev = Evaluator::new(None);
        let result = f(&mut ev, Value::Boolean(true), &[Value::Boolean(false)]).unwrap();
        assert_eq!(result, Value::Boolean(false));
    }

    #[test]
    fn division_by_zero_is_a_typed_error() {
        let def = number_native("/(_)").unwrap();
        let MethodDef::Native(f) = def else { unreachable!() };
        let mut ev = Evaluator::new(None);
        let err = f(&mut ev, Value::Number(1.0), &[Value::Number(0.0)]).unwrap_err();
        assert_eq!(err, EvalError::DivisionByZero);
    }

    #[test]
    fn string_ordering_is_lexicographic() {
        let def = string_native("<(_)").unwrap();
        let MethodDef::Native(f) = def else { unreachable!() };
        let mut ev = Evaluator::new(None);
        let result = f(
            &mut ev,
            Value::String(Rc::from("hello")),
            &[Value::String(Rc::from("world"))],
        )
        .unwrap();
        assert_eq!(result, Value::Boolean(true));
    }
}
