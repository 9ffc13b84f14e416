//! Built-in method installation.
//!
//! Registers the polyfills as methods on the realm's array and function
//! prototypes, and `deepClone` on the `Object` global. The wrappers here do the
//! argument defaulting and receiver checks of the method surface and hand
//! off to `array`, `function` and `object`.

use alloc::format;
use alloc::rc::{Rc, Weak};
use core::cell::RefCell;

use crate::array;
use crate::error::{JsError, JsResult};
use crate::function;
use crate::object::{self, Callable, JsObject, NativeFunction, PropertyFlags, PropertyKey};
use crate::realm::{effective_receiver, Realm};
use crate::value::Value;

/// Install built-ins according to the realm's configuration.
pub fn init(realm: &mut Realm) {
    let config = realm.config().clone();

    if config.install_array {
        init_array(realm);
    }

    if config.install_function {
        init_function(realm);
    }

    if config.install_object {
        init_object(realm);
    }
}

/// Define a hidden method on `target`, named per the realm's naming scheme.
fn define_method<F>(realm: &Realm, target: &Rc<RefCell<JsObject>>, base: &str, length: usize, func: F)
where
    F: Fn(&Value, &[Value]) -> JsResult<Value> + 'static,
{
    let name = realm.method_name(base);
    // Built-in methods carry no prototype link back to the object they live
    // on, so installing them creates no reference cycle.
    let method = JsObject::function(Callable::Native(NativeFunction::new(&name, length, func)));
    target
        .borrow_mut()
        .define_property(PropertyKey::String(name), Value::object(method), PropertyFlags::hidden());
}

fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or_default()
}

// Array prototype

fn init_array(realm: &mut Realm) {
    log::debug!(
        "[KPIO Polyfill] Installing Array.prototype polyfills ({:?} naming)",
        realm.config().naming
    );

    let proto = realm.array_prototype();
    define_method(realm, &proto, "forEach", 1, array_for_each);
    define_method(realm, &proto, "map", 1, array_map);
    define_method(realm, &proto, "filter", 1, array_filter);
    define_method(realm, &proto, "reduce", 1, array_reduce);
    define_method(realm, &proto, "some", 1, array_some);
    define_method(realm, &proto, "every", 1, array_every);
    define_method(realm, &proto, "find", 1, array_find);
    define_method(realm, &proto, "flat", 0, array_flat);
    define_method(realm, &proto, "flatMap", 1, array_flat_map);
    define_method(realm, &proto, "concat", 1, array_concat);
    define_method(realm, &proto, "includes", 1, array_includes);
    define_method(realm, &proto, "at", 1, array_at);
    define_method(realm, &proto, "reverse", 0, array_reverse);
}

/// The array behind `this`, or the error the method surface reports.
fn this_array<'a>(this: &'a Value, method: &str) -> JsResult<&'a Rc<RefCell<JsObject>>> {
    match this {
        Value::Undefined | Value::Null => Err(JsError::nullish_receiver(format!(
            "Array.prototype.{}",
            method
        ))),
        Value::Object(obj) if obj.borrow().is_array() => Ok(obj),
        _ => Err(JsError::type_error(format!(
            "Array.prototype.{} called on non-array",
            method
        ))),
    }
}

fn array_for_each(this: &Value, args: &[Value]) -> JsResult<Value> {
    let arr = this_array(this, "forEach")?;
    array::for_each(arr, &arg(args, 0), &arg(args, 1))?;
    Ok(Value::undefined())
}

fn array_map(this: &Value, args: &[Value]) -> JsResult<Value> {
    let arr = this_array(this, "map")?;
    array::map(arr, &arg(args, 0), &arg(args, 1))
}

fn array_filter(this: &Value, args: &[Value]) -> JsResult<Value> {
    let arr = this_array(this, "filter")?;
    array::filter(arr, &arg(args, 0), &arg(args, 1))
}

fn array_reduce(this: &Value, args: &[Value]) -> JsResult<Value> {
    let arr = this_array(this, "reduce")?;
    // An explicit second argument seeds the fold, even when undefined.
    array::reduce(arr, &arg(args, 0), args.get(1).cloned())
}

fn array_some(this: &Value, args: &[Value]) -> JsResult<Value> {
    let arr = this_array(this, "some")?;
    Ok(Value::boolean(array::some(arr, &arg(args, 0), &arg(args, 1))?))
}

fn array_every(this: &Value, args: &[Value]) -> JsResult<Value> {
    let arr = this_array(this, "every")?;
    Ok(Value::boolean(array::every(arr, &arg(args, 0), &arg(args, 1))?))
}

fn array_find(this: &Value, args: &[Value]) -> JsResult<Value> {
    let arr = this_array(this, "find")?;
    Ok(array::find(arr, &arg(args, 0), &arg(args, 1))?.unwrap_or_default())
}

fn array_flat(this: &Value, args: &[Value]) -> JsResult<Value> {
    let arr = this_array(this, "flat")?;
    let depth = match args.first() {
        None | Some(Value::Undefined) => 1,
        Some(depth) => flat_depth(depth),
    };
    array::flat(arr, depth)
}

/// `ToIntegerOrInfinity(depth)`, clamped to a non-negative level count.
fn flat_depth(depth: &Value) -> usize {
    let n = depth.to_integer();
    if n <= 0.0 {
        0
    } else if n.is_infinite() {
        usize::MAX
    } else {
        n as usize
    }
}

fn array_flat_map(this: &Value, args: &[Value]) -> JsResult<Value> {
    let arr = this_array(this, "flatMap")?;
    array::flat_map(arr, &arg(args, 0), &arg(args, 1))
}

fn array_concat(this: &Value, args: &[Value]) -> JsResult<Value> {
    let arr = this_array(this, "concat")?;
    Ok(array::concat(arr, args))
}

fn array_includes(this: &Value, args: &[Value]) -> JsResult<Value> {
    let arr = this_array(this, "includes")?;
    Ok(Value::boolean(array::includes(arr, &arg(args, 0), &arg(args, 1))))
}

fn array_at(this: &Value, args: &[Value]) -> JsResult<Value> {
    let arr = this_array(this, "at")?;
    Ok(array::at(arr, &arg(args, 0)).unwrap_or_default())
}

fn array_reverse(this: &Value, _args: &[Value]) -> JsResult<Value> {
    let arr = this_array(this, "reverse")?;
    Ok(Value::Object(array::reverse(arr)))
}

// Function prototype

fn init_function(realm: &mut Realm) {
    log::debug!(
        "[KPIO Polyfill] Installing Function.prototype polyfills ({:?} naming)",
        realm.config().naming
    );

    let proto = realm.function_prototype();
    let global = Rc::downgrade(&realm.global_object());

    let g = global.clone();
    define_method(realm, &proto, "call", 1, move |this, args| {
        function::ensure_callable(this)?;
        let receiver = receiver_arg(args, &g);
        function::call_function(this, &receiver, args.get(1..).unwrap_or(&[]))
    });

    let g = global.clone();
    define_method(realm, &proto, "apply", 2, move |this, args| {
        let receiver = receiver_arg(args, &g);
        function::invoke_with(this, &receiver, &arg(args, 1))
    });

    define_method(realm, &proto, "bind", 1, move |this, args| {
        let receiver = receiver_arg(args, &global);
        function::bind(this, &receiver, args.get(1..).unwrap_or(&[]))
    });
}

/// First argument as the receiver, nullish replaced by the global object.
fn receiver_arg(args: &[Value], global: &Weak<RefCell<JsObject>>) -> Value {
    effective_receiver(&arg(args, 0), global.upgrade())
}

// Object helpers

fn init_object(realm: &mut Realm) {
    let object = match realm.get_global("Object") {
        Value::Object(object) => object,
        _ => {
            let object = Rc::new(RefCell::new(JsObject::new()));
            realm.define_global("Object", Value::Object(object.clone()));
            object
        }
    };

    log::debug!(
        "[KPIO Polyfill] Installing Object.{}",
        realm.method_name("deepClone")
    );
    define_method(realm, &object, "deepClone", 1, object_deep_clone);
}

fn object_deep_clone(_this: &Value, args: &[Value]) -> JsResult<Value> {
    Ok(object::deep_clone(&arg(args, 0)))
}
