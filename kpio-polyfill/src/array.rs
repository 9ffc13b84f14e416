//! Array iteration polyfills.
//!
//! Every callback-driven operation follows the same protocol: the length is
//! read once before the first callback, indices are visited in ascending
//! order, and an index is visited only if it is occupied at the moment it is
//! reached. Callbacks receive `(element, index, array)` and run with the
//! supplied receiver.
//!
//! None of these hold a borrow of the array while a callback runs, so
//! callbacks are free to read or mutate it.

use alloc::rc::Rc;
use alloc::vec;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::ops::ControlFlow;
use hashbrown::HashSet;

use crate::error::{JsError, JsResult};
use crate::function::{call_function, ensure_callable};
use crate::object::JsObject;
use crate::value::Value;

/// Shared handle to an array object.
pub type ArrayRef = Rc<RefCell<JsObject>>;

/// Visit every occupied index. Stops early when `visit` breaks.
fn visit_occupied<B>(
    array: &ArrayRef,
    mut visit: impl FnMut(usize, Value) -> JsResult<ControlFlow<B>>,
) -> JsResult<Option<B>> {
    let len = array.borrow().array_length();
    for i in 0..len {
        let slot = array.borrow().element(i);
        if let Some(element) = slot {
            if let ControlFlow::Break(b) = visit(i, element)? {
                return Ok(Some(b));
            }
        }
    }
    Ok(None)
}

fn invoke(callback: &Value, this_arg: &Value, element: Value, index: usize, array: &Value) -> JsResult<Value> {
    call_function(callback, this_arg, &[element, Value::number(index as f64), array.clone()])
}

fn new_array_like(array: &ArrayRef, elements: Vec<Option<Value>>) -> Value {
    Value::object(JsObject::array_like(&array.borrow(), elements))
}

/// `Array.prototype.forEach`.
pub fn for_each(array: &ArrayRef, callback: &Value, this_arg: &Value) -> JsResult<()> {
    ensure_callable(callback)?;
    let array_value = Value::Object(array.clone());
    visit_occupied::<()>(array, |i, element| {
        invoke(callback, this_arg, element, i, &array_value)?;
        Ok(ControlFlow::Continue(()))
    })?;
    Ok(())
}

/// `Array.prototype.map`. The result has the source's length and keeps its
/// holes.
pub fn map(array: &ArrayRef, callback: &Value, this_arg: &Value) -> JsResult<Value> {
    ensure_callable(callback)?;
    let array_value = Value::Object(array.clone());
    let mut result = vec![None; array.borrow().array_length()];
    visit_occupied::<()>(array, |i, element| {
        result[i] = Some(invoke(callback, this_arg, element, i, &array_value)?);
        Ok(ControlFlow::Continue(()))
    })?;
    Ok(new_array_like(array, result))
}

/// `Array.prototype.filter`. The result is dense.
pub fn filter(array: &ArrayRef, predicate: &Value, this_arg: &Value) -> JsResult<Value> {
    ensure_callable(predicate)?;
    let array_value = Value::Object(array.clone());
    let mut kept = Vec::new();
    visit_occupied::<()>(array, |i, element| {
        if invoke(predicate, this_arg, element.clone(), i, &array_value)?.to_boolean() {
            kept.push(Some(element));
        }
        Ok(ControlFlow::Continue(()))
    })?;
    Ok(new_array_like(array, kept))
}

/// `Array.prototype.reduce`.
///
/// Without a seed the first occupied element becomes the accumulator and
/// folding starts after it. The combiner is called with an undefined
/// receiver as `(accumulator, element, index, array)`.
pub fn reduce(array: &ArrayRef, callback: &Value, initial: Option<Value>) -> JsResult<Value> {
    ensure_callable(callback)?;
    let array_value = Value::Object(array.clone());
    let mut accumulator = initial;
    visit_occupied::<()>(array, |i, element| {
        accumulator = Some(match accumulator.take() {
            None => element,
            Some(acc) => call_function(
                callback,
                &Value::undefined(),
                &[acc, element, Value::number(i as f64), array_value.clone()],
            )?,
        });
        Ok(ControlFlow::Continue(()))
    })?;
    accumulator.ok_or(JsError::EmptyReduction)
}

/// `Array.prototype.some`. False for empty and fully sparse arrays.
pub fn some(array: &ArrayRef, predicate: &Value, this_arg: &Value) -> JsResult<bool> {
    ensure_callable(predicate)?;
    let array_value = Value::Object(array.clone());
    let hit = visit_occupied(array, |i, element| {
        if invoke(predicate, this_arg, element, i, &array_value)?.to_boolean() {
            Ok(ControlFlow::Break(()))
        } else {
            Ok(ControlFlow::Continue(()))
        }
    })?;
    Ok(hit.is_some())
}

/// `Array.prototype.every`. Vacuously true for empty and fully sparse arrays.
pub fn every(array: &ArrayRef, predicate: &Value, this_arg: &Value) -> JsResult<bool> {
    ensure_callable(predicate)?;
    let array_value = Value::Object(array.clone());
    let miss = visit_occupied(array, |i, element| {
        if invoke(predicate, this_arg, element, i, &array_value)?.to_boolean() {
            Ok(ControlFlow::Continue(()))
        } else {
            Ok(ControlFlow::Break(()))
        }
    })?;
    Ok(miss.is_none())
}

/// `Array.prototype.find`. `None` when nothing matches; a matching element
/// that is itself `undefined` is `Some(Value::Undefined)`.
pub fn find(array: &ArrayRef, predicate: &Value, this_arg: &Value) -> JsResult<Option<Value>> {
    ensure_callable(predicate)?;
    let array_value = Value::Object(array.clone());
    visit_occupied(array, |i, element| {
        if invoke(predicate, this_arg, element.clone(), i, &array_value)?.to_boolean() {
            Ok(ControlFlow::Break(element))
        } else {
            Ok(ControlFlow::Continue(()))
        }
    })
}

/// Deepest nesting `flat` will expand before giving up.
pub const MAX_FLAT_NESTING: usize = 1024;

type ExpandingSet = HashSet<*const RefCell<JsObject>>;

/// `Array.prototype.flat`.
///
/// Nested arrays are spliced in up to `depth` levels; anything else is
/// appended as is. Holes are copied as holes at every level, so a depth of
/// zero is a shallow copy.
///
/// An array that contains itself cannot be flattened without a bound: with
/// unlimited depth, or once nesting passes [`MAX_FLAT_NESTING`], this fails
/// with a `RangeError`.
pub fn flat(array: &ArrayRef, depth: usize) -> JsResult<Value> {
    let mut out = Vec::new();
    let mut expanding = ExpandingSet::new();
    flatten_into(&mut out, array, depth, &mut expanding, 0)?;
    Ok(new_array_like(array, out))
}

fn flatten_into(
    out: &mut Vec<Option<Value>>,
    array: &ArrayRef,
    depth: usize,
    expanding: &mut ExpandingSet,
    nesting: usize,
) -> JsResult<()> {
    if nesting > MAX_FLAT_NESTING {
        return Err(JsError::range_error("Maximum flat nesting exceeded"));
    }

    let key = Rc::as_ptr(array);
    let entered = expanding.insert(key);
    if !entered && depth == usize::MAX {
        return Err(JsError::range_error("Cannot flatten a cyclic array with infinite depth"));
    }

    let result = splice_elements(out, array, depth, expanding, nesting);

    if entered {
        expanding.remove(&key);
    }
    result
}

fn splice_elements(
    out: &mut Vec<Option<Value>>,
    array: &ArrayRef,
    depth: usize,
    expanding: &mut ExpandingSet,
    nesting: usize,
) -> JsResult<()> {
    for slot in array.borrow().elements() {
        match slot {
            Some(Value::Object(obj)) if depth > 0 && obj.borrow().is_array() => {
                let next = if depth == usize::MAX { depth } else { depth - 1 };
                flatten_into(out, obj, next, expanding, nesting + 1)?;
            }
            other => out.push(other.clone()),
        }
    }
    Ok(())
}

/// `Array.prototype.flatMap`: `map` followed by `flat` with depth 1.
pub fn flat_map(array: &ArrayRef, callback: &Value, this_arg: &Value) -> JsResult<Value> {
    let mapped = map(array, callback, this_arg)?;
    let mapped = mapped
        .as_object()
        .ok_or_else(|| JsError::type_error("map did not produce an array"))?;
    flat(mapped, 1)
}

/// `Array.prototype.concat`.
///
/// Copies the occupied elements of `array`, then for each item either its
/// occupied elements (arrays, one level only) or the item itself.
pub fn concat(array: &ArrayRef, items: &[Value]) -> Value {
    let mut out: Vec<Option<Value>> = occupied(&array.borrow());
    for item in items {
        match item {
            Value::Object(obj) if obj.borrow().is_array() => {
                out.extend(occupied(&obj.borrow()));
            }
            other => out.push(Some(other.clone())),
        }
    }
    new_array_like(array, out)
}

fn occupied(array: &JsObject) -> Vec<Option<Value>> {
    array.elements().iter().filter(|slot| slot.is_some()).cloned().collect()
}

/// `Array.prototype.includes`.
///
/// `from_index` goes through `ToIntegerOrInfinity`, then infinities reset to
/// 0 and negative values count from the end, clamping at 0. Comparison is
/// SameValueZero, so NaN finds NaN. Holes read as `undefined`.
pub fn includes(array: &ArrayRef, search: &Value, from_index: &Value) -> bool {
    let array = array.borrow();
    let len = array.array_length();

    let n = from_index.to_integer();
    let n = if n.is_finite() { n } else { 0.0 };
    let start = if n < 0.0 {
        (len as f64 + n).max(0.0) as usize
    } else {
        n as usize
    };

    (start..len).any(|i| {
        let element = array.element(i).unwrap_or_default();
        element.same_value_zero(search)
    })
}

/// `Array.prototype.at`.
///
/// The index goes through `ToIntegerOrInfinity` and negative values count
/// from the end. Out of range and holes give `None`.
pub fn at(array: &ArrayRef, index: &Value) -> Option<Value> {
    let array = array.borrow();
    let len = array.array_length() as f64;

    let n = index.to_integer();
    let k = if n < 0.0 { len + n } else { n };
    if k < 0.0 || k >= len {
        return None;
    }
    array.element(k as usize)
}

/// `Array.prototype.reverse`. Reverses in place, holes included, and
/// returns the same array.
pub fn reverse(array: &ArrayRef) -> ArrayRef {
    array.borrow_mut().elements_mut().reverse();
    array.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{Callable, NativeFunction, PropertyKey};
    use alloc::string::String;
    use alloc::vec;

    fn native<F>(f: F) -> Value
    where
        F: Fn(&Value, &[Value]) -> JsResult<Value> + 'static,
    {
        Value::object(JsObject::function(Callable::Native(NativeFunction::new("cb", 3, f))))
    }

    fn numbers(values: &[f64]) -> ArrayRef {
        let elements = values.iter().map(|n| Some(Value::number(*n))).collect();
        Rc::new(RefCell::new(JsObject::array(elements)))
    }

    fn sparse(slots: &[Option<f64>]) -> ArrayRef {
        let elements = slots.iter().map(|s| s.map(Value::number)).collect();
        Rc::new(RefCell::new(JsObject::array(elements)))
    }

    /// Slots of an array value as numbers; `None` for holes.
    fn slots(value: &Value) -> Vec<Option<f64>> {
        value
            .as_object()
            .expect("array")
            .borrow()
            .elements()
            .iter()
            .map(|slot| slot.as_ref().map(Value::to_number))
            .collect()
    }

    fn arg(args: &[Value], i: usize) -> Value {
        args.get(i).cloned().unwrap_or_default()
    }

    fn is_even() -> Value {
        native(|_, args| Ok(Value::boolean(arg(args, 0).to_number() % 2.0 == 0.0)))
    }

    #[test]
    fn test_map_preserves_holes_and_length() {
        let arr = sparse(&[Some(1.0), None, Some(3.0)]);
        let double = native(|_, args| Ok(Value::number(arg(args, 0).to_number() * 2.0)));
        let result = map(&arr, &double, &Value::undefined()).unwrap();
        assert_eq!(slots(&result), vec![Some(2.0), None, Some(6.0)]);
    }

    #[test]
    fn test_map_passes_index_array_and_receiver() {
        let arr = numbers(&[10.0, 20.0]);
        let mut ctx = JsObject::new();
        ctx.set(PropertyKey::string("offset"), Value::number(1000.0)).unwrap();
        let ctx = Value::object(ctx);

        let source = Value::Object(arr.clone());
        let cb = native(move |this, args| {
            assert!(arg(args, 2).strict_equals(&source));
            let offset = this.get(&PropertyKey::string("offset")).to_number();
            Ok(Value::number(offset + arg(args, 1).to_number()))
        });
        let result = map(&arr, &cb, &ctx).unwrap();
        assert_eq!(slots(&result), vec![Some(1000.0), Some(1001.0)]);
    }

    #[test]
    fn test_callbacks_receive_this_arg() {
        let arr = numbers(&[1.0, 2.0]);
        let mut ctx = JsObject::new();
        ctx.set(PropertyKey::string("tag"), Value::number(7.0)).unwrap();
        let ctx = Value::object(ctx);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = seen.clone();
        let expected = ctx.clone();
        let cb = native(move |this, args| {
            log.borrow_mut().push(this.strict_equals(&expected));
            Ok(arg(args, 0))
        });

        for_each(&arr, &cb, &ctx).unwrap();
        filter(&arr, &cb, &ctx).unwrap();
        some(&arr, &cb, &ctx).unwrap();
        every(&arr, &cb, &ctx).unwrap();
        find(&arr, &cb, &ctx).unwrap();
        flat_map(&arr, &cb, &ctx).unwrap();

        // some and find stop at the first truthy result.
        let seen = seen.borrow();
        assert_eq!(seen.len(), 10);
        assert!(seen.iter().all(|same| *same));
    }

    #[test]
    fn test_missing_this_arg_stays_undefined() {
        let arr = numbers(&[1.0]);
        let this_is_undefined = native(|this, _| Ok(Value::boolean(this.is_undefined())));
        assert!(every(&arr, &this_is_undefined, &Value::undefined()).unwrap());
        assert!(find(&arr, &this_is_undefined, &Value::undefined()).unwrap().is_some());
    }

    #[test]
    fn test_map_does_not_mutate_source() {
        let arr = numbers(&[1.0, 2.0]);
        let zero = native(|_, _| Ok(Value::number(0.0)));
        map(&arr, &zero, &Value::undefined()).unwrap();
        assert_eq!(slots(&Value::Object(arr)), vec![Some(1.0), Some(2.0)]);
    }

    #[test]
    fn test_non_callable_callback() {
        let arr = numbers(&[1.0]);
        let not_fn = Value::string("nope");
        assert!(matches!(map(&arr, &not_fn, &Value::undefined()), Err(JsError::NotCallable(_))));
        assert!(matches!(filter(&arr, &not_fn, &Value::undefined()), Err(JsError::NotCallable(_))));
        assert!(matches!(for_each(&arr, &not_fn, &Value::undefined()), Err(JsError::NotCallable(_))));
        assert!(matches!(flat_map(&arr, &not_fn, &Value::undefined()), Err(JsError::NotCallable(_))));
        assert!(matches!(reduce(&arr, &not_fn, None), Err(JsError::NotCallable(_))));
        assert!(matches!(some(&arr, &not_fn, &Value::undefined()), Err(JsError::NotCallable(_))));
        assert!(matches!(every(&arr, &not_fn, &Value::undefined()), Err(JsError::NotCallable(_))));
        assert!(matches!(find(&arr, &not_fn, &Value::undefined()), Err(JsError::NotCallable(_))));
    }

    #[test]
    fn test_non_callable_checked_before_empty_reduction() {
        let empty = numbers(&[]);
        let err = reduce(&empty, &Value::null(), None).unwrap_err();
        assert!(matches!(err, JsError::NotCallable(_)));
    }

    #[test]
    fn test_for_each_visits_occupied_in_order() {
        let arr = sparse(&[Some(1.0), None, Some(3.0), None]);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = seen.clone();
        let cb = native(move |_, args| {
            log.borrow_mut().push(arg(args, 1).to_number());
            Ok(Value::undefined())
        });
        for_each(&arr, &cb, &Value::undefined()).unwrap();
        assert_eq!(*seen.borrow(), vec![0.0, 2.0]);
    }

    #[test]
    fn test_iteration_uses_initial_length_and_live_holes() {
        let arr = numbers(&[1.0, 2.0, 3.0]);
        let handle = arr.clone();
        let calls = Rc::new(RefCell::new(0));
        let counter = calls.clone();
        let cb = native(move |_, args| {
            *counter.borrow_mut() += 1;
            if arg(args, 1).to_number() == 0.0 {
                // Grow the array and punch a hole ahead of the cursor.
                let mut arr = handle.borrow_mut();
                arr.array_push(Value::number(4.0));
                arr.elements_mut()[2] = None;
            }
            Ok(Value::undefined())
        });
        for_each(&arr, &cb, &Value::undefined()).unwrap();
        assert_eq!(*calls.borrow(), 2);
    }

    #[test]
    fn test_callback_errors_propagate() {
        let arr = numbers(&[1.0, 2.0]);
        let boom = native(|_, _| Err(JsError::error("boom")));
        assert_eq!(
            map(&arr, &boom, &Value::undefined()).unwrap_err(),
            JsError::Error(String::from("boom"))
        );
    }

    #[test]
    fn test_filter() {
        let arr = sparse(&[Some(1.0), None, Some(2.0), Some(4.0), Some(5.0)]);
        let result = filter(&arr, &is_even(), &Value::undefined()).unwrap();
        assert_eq!(slots(&result), vec![Some(2.0), Some(4.0)]);

        let always = native(|_, _| Ok(Value::boolean(true)));
        let all = filter(&arr, &always, &Value::undefined()).unwrap();
        assert_eq!(slots(&all), vec![Some(1.0), Some(2.0), Some(4.0), Some(5.0)]);

        let never = native(|_, _| Ok(Value::number(0.0)));
        assert!(slots(&filter(&arr, &never, &Value::undefined()).unwrap()).is_empty());
    }

    #[test]
    fn test_reduce() {
        let add = native(|_, args| Ok(Value::number(arg(args, 0).to_number() + arg(args, 1).to_number())));
        let arr = numbers(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(reduce(&arr, &add, Some(Value::number(0.0))).unwrap().to_number(), 15.0);
        assert_eq!(reduce(&arr, &add, None).unwrap().to_number(), 15.0);

        let empty = numbers(&[]);
        assert_eq!(reduce(&empty, &add, None).unwrap_err(), JsError::EmptyReduction);
        assert_eq!(reduce(&empty, &add, Some(Value::number(0.0))).unwrap().to_number(), 0.0);
    }

    #[test]
    fn test_reduce_seeds_from_first_occupied() {
        let indices = Rc::new(RefCell::new(Vec::new()));
        let log = indices.clone();
        let add = native(move |_, args| {
            log.borrow_mut().push(arg(args, 2).to_number());
            Ok(Value::number(arg(args, 0).to_number() + arg(args, 1).to_number()))
        });
        let arr = sparse(&[None, Some(5.0), None, Some(7.0)]);
        assert_eq!(reduce(&arr, &add, None).unwrap().to_number(), 12.0);
        assert_eq!(*indices.borrow(), vec![3.0]);

        let holes = sparse(&[None, None]);
        assert_eq!(reduce(&holes, &add, None).unwrap_err(), JsError::EmptyReduction);
    }

    #[test]
    fn test_reduce_with_undefined_seed_is_seeded() {
        let count = native(|_, args| {
            let acc = arg(args, 0);
            let n = if acc.is_undefined() { 0.0 } else { acc.to_number() };
            Ok(Value::number(n + 1.0))
        });
        let arr = numbers(&[9.0, 9.0]);
        assert_eq!(reduce(&arr, &count, Some(Value::undefined())).unwrap().to_number(), 2.0);
    }

    #[test]
    fn test_some_and_every() {
        let arr = numbers(&[1.0, 2.0, 3.0]);
        assert!(some(&arr, &is_even(), &Value::undefined()).unwrap());
        assert!(!every(&arr, &is_even(), &Value::undefined()).unwrap());

        let empty = numbers(&[]);
        assert!(every(&empty, &is_even(), &Value::undefined()).unwrap());
        assert!(!some(&empty, &is_even(), &Value::undefined()).unwrap());

        let holes = sparse(&[None, None]);
        assert!(every(&holes, &is_even(), &Value::undefined()).unwrap());
        assert!(!some(&holes, &is_even(), &Value::undefined()).unwrap());
    }

    #[test]
    fn test_some_short_circuits() {
        let calls = Rc::new(RefCell::new(0));
        let counter = calls.clone();
        let pred = native(move |_, args| {
            *counter.borrow_mut() += 1;
            Ok(Value::boolean(arg(args, 0).to_number() == 2.0))
        });
        let arr = numbers(&[1.0, 2.0, 3.0, 4.0]);
        assert!(some(&arr, &pred, &Value::undefined()).unwrap());
        assert_eq!(*calls.borrow(), 2);

        *calls.borrow_mut() = 0;
        assert!(!every(&arr, &pred, &Value::undefined()).unwrap());
        assert_eq!(*calls.borrow(), 1);
    }

    #[test]
    fn test_find() {
        let arr = numbers(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let found = find(&arr, &is_even(), &Value::undefined()).unwrap();
        assert_eq!(found.map(|v| v.to_number()), Some(2.0));

        let odd = numbers(&[1.0, 3.0, 5.0]);
        assert!(find(&odd, &is_even(), &Value::undefined()).unwrap().is_none());
    }

    #[test]
    fn test_find_distinguishes_found_undefined() {
        let arr = Rc::new(RefCell::new(JsObject::array(vec![None, Some(Value::undefined())])));
        let calls = Rc::new(RefCell::new(0));
        let counter = calls.clone();
        let is_undefined = native(move |_, args| {
            *counter.borrow_mut() += 1;
            Ok(Value::boolean(arg(args, 0).is_undefined()))
        });
        let found = find(&arr, &is_undefined, &Value::undefined()).unwrap();
        assert!(matches!(found, Some(Value::Undefined)));
        // The hole at index 0 was skipped.
        assert_eq!(*calls.borrow(), 1);
    }

    fn nested() -> ArrayRef {
        // [1, 2, [3, 4, [5, 6]]]
        let inner = Value::array([Value::number(5.0), Value::number(6.0)]);
        let middle = Value::array([Value::number(3.0), Value::number(4.0), inner]);
        Rc::new(RefCell::new(JsObject::array(vec![
            Some(Value::number(1.0)),
            Some(Value::number(2.0)),
            Some(middle),
        ])))
    }

    #[test]
    fn test_flat_depths() {
        let arr = nested();
        let one = flat(&arr, 1).unwrap();
        let one_obj = one.as_object().unwrap().borrow();
        assert_eq!(one_obj.array_length(), 5);
        assert!(one_obj.element(4).unwrap().is_array());

        let two = flat(&arr, 2).unwrap();
        assert_eq!(slots(&two), vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0), Some(5.0), Some(6.0)]);

        let all = flat(&arr, usize::MAX).unwrap();
        assert_eq!(slots(&all).len(), 6);
    }

    #[test]
    fn test_flat_zero_is_shallow_copy() {
        let arr = nested();
        let copy = flat(&arr, 0).unwrap();
        assert!(!copy.strict_equals(&Value::Object(arr.clone())));
        let copy = copy.as_object().unwrap().borrow();
        assert_eq!(copy.array_length(), 3);
        assert!(copy.element(2).unwrap().strict_equals(&arr.borrow().element(2).unwrap()));
    }

    #[test]
    fn test_flat_is_idempotent_at_depth_zero() {
        let once = flat(&nested(), 1).unwrap();
        let again = flat(once.as_object().unwrap(), 0).unwrap();
        let a = once.as_object().unwrap().borrow();
        let b = again.as_object().unwrap().borrow();
        assert_eq!(a.array_length(), b.array_length());
        for i in 0..a.array_length() {
            assert!(a.element(i).unwrap().strict_equals(&b.element(i).unwrap()));
        }
    }

    #[test]
    fn test_flat_keeps_holes() {
        let inner = Value::sparse_array(vec![Some(Value::number(2.0)), None]);
        let arr = Rc::new(RefCell::new(JsObject::array(vec![Some(Value::number(1.0)), None, Some(inner)])));
        assert_eq!(slots(&flat(&arr, 1).unwrap()), vec![Some(1.0), None, Some(2.0), None]);
    }

    #[test]
    fn test_flat_map_is_one_level() {
        let arr = numbers(&[1.0, 2.0]);
        // x => [x, [x * 10]]
        let cb = native(|_, args| {
            let x = arg(args, 0).to_number();
            Ok(Value::array([Value::number(x), Value::array([Value::number(x * 10.0)])]))
        });
        let result = flat_map(&arr, &cb, &Value::undefined()).unwrap();
        let obj = result.as_object().unwrap().borrow();
        assert_eq!(obj.array_length(), 4);
        assert_eq!(obj.element(0).unwrap().to_number(), 1.0);
        assert!(obj.element(1).unwrap().is_array());
        assert_eq!(obj.element(2).unwrap().to_number(), 2.0);
        assert!(obj.element(3).unwrap().is_array());
    }

    #[test]
    fn test_flat_map_keeps_holes() {
        // Holes in the source stay holes, and holes inside the returned
        // arrays are spliced in as holes.
        let arr = sparse(&[Some(1.0), None, Some(2.0)]);
        let cb = native(|_, args| {
            let x = arg(args, 0);
            Ok(Value::sparse_array(vec![Some(x), None]))
        });
        let result = flat_map(&arr, &cb, &Value::undefined()).unwrap();
        assert_eq!(slots(&result), vec![Some(1.0), None, None, Some(2.0), None]);
    }

    #[test]
    fn test_flat_map_flattens_one_level_of_sparse_results() {
        let arr = numbers(&[3.0]);
        // x => [[x, <empty>]]
        let cb = native(|_, args| {
            let inner = Value::sparse_array(vec![Some(arg(args, 0)), None]);
            Ok(Value::array([inner]))
        });
        let result = flat_map(&arr, &cb, &Value::undefined()).unwrap();
        let obj = result.as_object().unwrap().borrow();
        assert_eq!(obj.array_length(), 1);
        assert_eq!(slots(&obj.element(0).unwrap()), vec![Some(3.0), None]);
    }

    #[test]
    fn test_flat_rejects_unbounded_cycle() {
        let arr = numbers(&[1.0]);
        let this = Value::Object(arr.clone());
        arr.borrow_mut().array_push(this.clone());

        let err = flat(&arr, usize::MAX).unwrap_err();
        assert!(matches!(err, JsError::RangeError(_)));

        // A bounded depth unrolls the cycle that many times.
        let two = flat(&arr, 2).unwrap();
        let two = two.as_object().unwrap().borrow();
        assert_eq!(two.array_length(), 4);
        assert!(two.element(3).unwrap().strict_equals(&this));

        let err = flat(&arr, MAX_FLAT_NESTING * 2).unwrap_err();
        assert!(matches!(err, JsError::RangeError(_)));

        // Break the cycle so the array is freed.
        arr.borrow_mut().elements_mut().clear();
    }

    #[test]
    fn test_flat_shared_subarray_is_not_a_cycle() {
        let shared = Value::array([Value::number(1.0)]);
        let arr = Rc::new(RefCell::new(JsObject::array(vec![Some(shared.clone()), Some(shared)])));
        assert_eq!(slots(&flat(&arr, usize::MAX).unwrap()), vec![Some(1.0), Some(1.0)]);
    }

    #[test]
    fn test_concat() {
        let arr = sparse(&[Some(1.0), None, Some(2.0)]);
        let tail = Value::sparse_array(vec![Some(Value::number(3.0)), None, Some(Value::array([Value::number(4.0)]))]);
        let result = concat(&arr, &[tail, Value::number(5.0)]);
        let obj = result.as_object().unwrap().borrow();
        assert_eq!(obj.array_length(), 5);
        assert_eq!(obj.element(2).unwrap().to_number(), 3.0);
        // Only one level is spliced.
        assert!(obj.element(3).unwrap().is_array());
        assert_eq!(obj.element(4).unwrap().to_number(), 5.0);
    }

    #[test]
    fn test_concat_without_items_copies() {
        let arr = numbers(&[1.0, 2.0]);
        let copy = concat(&arr, &[]);
        assert!(!copy.strict_equals(&Value::Object(arr.clone())));
        assert_eq!(slots(&copy), vec![Some(1.0), Some(2.0)]);
    }

    #[test]
    fn test_includes() {
        let arr = Rc::new(RefCell::new(JsObject::array(vec![
            Some(Value::number(1.0)),
            Some(Value::number(f64::NAN)),
            Some(Value::number(3.0)),
        ])));
        assert!(includes(&arr, &Value::number(f64::NAN), &Value::number(0.0)));
        assert!(includes(&arr, &Value::number(3.0), &Value::number(0.0)));
        assert!(!includes(&arr, &Value::string("3"), &Value::number(0.0)));

        let arr = numbers(&[1.0, 2.0, 3.0]);
        assert!(includes(&arr, &Value::number(2.0), &Value::number(-2.0)));
        assert!(!includes(&arr, &Value::number(1.0), &Value::number(-2.0)));
        assert!(!includes(&arr, &Value::number(1.0), &Value::number(1.0)));
        assert!(includes(&arr, &Value::number(1.0), &Value::number(-100.0)));
        assert!(includes(&arr, &Value::number(1.0), &Value::number(f64::INFINITY)));
        assert!(includes(&arr, &Value::number(1.0), &Value::number(f64::NAN)));
        assert!(!includes(&arr, &Value::number(1.0), &Value::number(10.0)));
    }

    #[test]
    fn test_includes_reads_holes_as_undefined() {
        let arr = sparse(&[Some(1.0), None]);
        assert!(includes(&arr, &Value::undefined(), &Value::number(0.0)));
    }

    #[test]
    fn test_at() {
        let arr = numbers(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(at(&arr, &Value::number(-1.0)).map(|v| v.to_number()), Some(5.0));
        assert_eq!(at(&arr, &Value::number(0.0)).map(|v| v.to_number()), Some(1.0));
        assert_eq!(at(&arr, &Value::number(1.9)).map(|v| v.to_number()), Some(2.0));
        assert_eq!(at(&arr, &Value::number(-1.5)).map(|v| v.to_number()), Some(5.0));
        assert_eq!(at(&arr, &Value::number(f64::NAN)).map(|v| v.to_number()), Some(1.0));
        assert!(at(&arr, &Value::number(-6.0)).is_none());
        assert!(at(&numbers(&[1.0, 2.0, 3.0]), &Value::number(5.0)).is_none());
        assert!(at(&arr, &Value::number(f64::INFINITY)).is_none());
        assert!(at(&sparse(&[None]), &Value::number(0.0)).is_none());
    }

    #[test]
    fn test_reverse_in_place() {
        let arr = numbers(&[1.0, 2.0, 3.0]);
        let returned = reverse(&arr);
        assert!(Rc::ptr_eq(&returned, &arr));
        assert_eq!(slots(&Value::Object(arr)), vec![Some(3.0), Some(2.0), Some(1.0)]);

        let empty = numbers(&[]);
        assert_eq!(reverse(&empty).borrow().array_length(), 0);
    }

    #[test]
    fn test_reverse_mirrors_holes() {
        let arr = sparse(&[Some(1.0), None, Some(3.0), Some(4.0)]);
        reverse(&arr);
        assert_eq!(slots(&Value::Object(arr)), vec![Some(4.0), Some(3.0), None, Some(1.0)]);
    }

    #[test]
    fn test_results_inherit_prototype() {
        let proto = Rc::new(RefCell::new(JsObject::new()));
        let arr = numbers(&[1.0, 2.0]);
        arr.borrow_mut().set_prototype(Some(proto.clone()));

        let id = native(|_, args| Ok(arg(args, 0)));
        let mapped = map(&arr, &id, &Value::undefined()).unwrap();
        let mapped = mapped.as_object().unwrap().borrow();
        assert!(Rc::ptr_eq(mapped.prototype().unwrap(), &proto));
    }
}
