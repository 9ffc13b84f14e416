//! Call-context emulation.
//!
//! `call`, `apply` and `bind` pass the receiver explicitly to the target
//! function. Nothing is ever attached to the receiver, so its own property
//! set is the same before and after a call.
//!
//! The functions here take the receiver as given. Substituting the global
//! object for a nullish receiver is the realm's job, see
//! [`Realm::call`](crate::realm::Realm::call).

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;

use crate::error::{JsError, JsResult};
use crate::object::{BoundFunction, Callable, JsObject, PropertyKey};
use crate::value::Value;

/// Call a function value with an explicit receiver.
pub fn call_function(func: &Value, this_value: &Value, args: &[Value]) -> JsResult<Value> {
    // Clone the callable out so the callee may borrow its own function object.
    let callable = func
        .as_object()
        .and_then(|obj| obj.borrow().callable().cloned());

    match callable {
        Some(callable) => call_callable(&callable, this_value, args),
        None => Err(JsError::not_callable(describe(func))),
    }
}

fn call_callable(callable: &Callable, this_value: &Value, args: &[Value]) -> JsResult<Value> {
    match callable {
        Callable::Native(native) => (native.func)(this_value, args),
        Callable::Bound(bound) => {
            log::trace!(
                "[KPIO Polyfill] bound call: {} bound + {} late args",
                bound.bound_args.len(),
                args.len()
            );
            let all_args = concat_args(&bound.bound_args, args);
            call_function(&Value::Object(bound.target.clone()), &bound.bound_this, &all_args)
        }
    }
}

/// Invoke `func` as a constructor (`new func(...args)`).
///
/// A fresh object inheriting from `func.prototype` becomes the receiver; an
/// object returned by the body replaces it. Bound functions construct their
/// target and ignore the bound receiver, keeping only the bound arguments.
pub fn construct(func: &Value, args: &[Value]) -> JsResult<Value> {
    let Some(obj) = func.as_object() else {
        return Err(JsError::not_constructor(describe(func)));
    };

    let (callable, constructable) = {
        let obj = obj.borrow();
        (obj.callable().cloned(), obj.is_constructable())
    };

    match callable {
        Some(Callable::Bound(bound)) if constructable => {
            log::trace!("[KPIO Polyfill] constructing through bound function");
            let all_args = concat_args(&bound.bound_args, args);
            construct(&Value::Object(bound.target.clone()), &all_args)
        }
        Some(Callable::Native(native)) if constructable => {
            let mut instance = JsObject::new();
            if let Value::Object(proto) = obj.borrow().get(&PropertyKey::string("prototype")) {
                instance.set_prototype(Some(proto));
            }
            let instance = Value::object(instance);

            let result = (native.func)(&instance, args)?;
            if result.is_object() {
                Ok(result)
            } else {
                Ok(instance)
            }
        }
        _ => Err(JsError::not_constructor(describe(func))),
    }
}

/// `Function.prototype.apply` with an already-resolved receiver.
///
/// `args` is spread as the positional arguments; anything that is not an
/// array counts as an empty list, and holes are passed as `undefined`.
pub fn invoke_with(func: &Value, this_value: &Value, args: &Value) -> JsResult<Value> {
    ensure_callable(func)?;
    call_function(func, this_value, &spread_args(args))
}

/// `Function.prototype.bind` with an already-resolved receiver.
///
/// The returned function calls `func` with `this_value` and
/// `bound_args ++ later_args`. It is a constructor exactly when `func` is.
pub fn bind(func: &Value, this_value: &Value, bound_args: &[Value]) -> JsResult<Value> {
    let target = ensure_callable(func)?;
    let constructable = target.borrow().is_constructable();

    let callable = Callable::Bound(BoundFunction {
        target: target.clone(),
        bound_this: this_value.clone(),
        bound_args: bound_args.to_vec(),
    });

    let mut bound = JsObject::function(callable);
    bound.set_prototype(target.borrow().prototype().cloned());
    if constructable {
        bound = bound.into_constructable();
    }
    Ok(Value::object(bound))
}

/// Return the function object behind `func`, or `NotCallable`.
pub fn ensure_callable(func: &Value) -> JsResult<&Rc<RefCell<JsObject>>> {
    match func.as_object() {
        Some(obj) if obj.borrow().is_callable() => Ok(obj),
        _ => Err(JsError::not_callable(describe(func))),
    }
}

/// Positional arguments from an array-like argument list.
pub fn spread_args(args: &Value) -> Vec<Value> {
    match args.as_object() {
        Some(obj) if obj.borrow().is_array() => obj
            .borrow()
            .elements()
            .iter()
            .map(|slot| slot.clone().unwrap_or_default())
            .collect(),
        _ => Vec::new(),
    }
}

/// Short description of a value for error messages.
pub(crate) fn describe(value: &Value) -> alloc::string::String {
    match value {
        Value::String(s) => alloc::format!("\"{}\"", s),
        Value::Object(obj) if obj.borrow().is_array() => "[object Array]".into(),
        Value::Object(obj) if obj.borrow().is_callable() => obj.borrow().function_name(),
        other => other.to_js_string(),
    }
}

fn concat_args(first: &[Value], rest: &[Value]) -> Vec<Value> {
    let mut all = Vec::with_capacity(first.len() + rest.len());
    all.extend_from_slice(first);
    all.extend_from_slice(rest);
    all
}
