//! JavaScript object system.
//!
//! One object type backs all three container shapes the polyfills work
//! with: ordinary objects (mappings), arrays (sparse sequences) and
//! function objects (callables).

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;

use bitflags::bitflags;
use hashbrown::HashMap;

use crate::error::{JsError, JsResult};
use crate::value::Value;

/// Property key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    /// String key.
    String(String),
    /// Index key.
    Index(u32),
}

impl PropertyKey {
    /// Create a string key.
    pub fn string<S: Into<String>>(s: S) -> Self {
        PropertyKey::String(s.into())
    }

    /// Create an index key.
    pub fn index(i: u32) -> Self {
        PropertyKey::Index(i)
    }

    /// Convert to string.
    pub fn to_key_string(&self) -> String {
        match self {
            PropertyKey::String(s) => s.clone(),
            PropertyKey::Index(i) => alloc::format!("{}", i),
        }
    }
}

impl From<&str> for PropertyKey {
    fn from(s: &str) -> Self {
        // Canonical numeric strings address the same slot as the index.
        match s.parse::<u32>() {
            Ok(i) if alloc::format!("{}", i) == s => PropertyKey::Index(i),
            _ => PropertyKey::String(s.into()),
        }
    }
}

impl From<String> for PropertyKey {
    fn from(s: String) -> Self {
        PropertyKey::from(s.as_str())
    }
}

impl From<u32> for PropertyKey {
    fn from(i: u32) -> Self {
        PropertyKey::Index(i)
    }
}

bitflags! {
    /// Property attributes.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct PropertyFlags: u8 {
        const WRITABLE = 0b001;
        const ENUMERABLE = 0b010;
        const CONFIGURABLE = 0b100;
    }
}

impl PropertyFlags {
    /// Attributes of a property created by plain assignment.
    pub fn data() -> Self {
        PropertyFlags::all()
    }

    /// Attributes of a built-in method: writable and configurable, hidden
    /// from enumeration.
    pub fn hidden() -> Self {
        PropertyFlags::WRITABLE | PropertyFlags::CONFIGURABLE
    }
}

/// Property storage.
#[derive(Clone, Debug)]
pub struct Property {
    /// The key.
    pub key: PropertyKey,
    /// The value.
    pub value: Value,
    /// Attributes.
    pub flags: PropertyFlags,
}

/// Object type classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectKind {
    /// Ordinary object.
    Ordinary,
    /// Array object.
    Array,
    /// Function object.
    Function,
}

/// A JavaScript object.
#[derive(Clone, Debug)]
pub struct JsObject {
    /// Object kind.
    kind: ObjectKind,
    /// Own properties, in insertion order.
    properties: Vec<Property>,
    /// Prototype.
    prototype: Option<Rc<RefCell<JsObject>>>,
    /// Call internal method (for functions).
    callable: Option<Callable>,
    /// Construct internal method (for constructors).
    constructable: bool,
    /// Array slots; `None` is a hole.
    elements: Vec<Option<Value>>,
}

impl JsObject {
    /// Create a new ordinary object.
    pub fn new() -> Self {
        JsObject {
            kind: ObjectKind::Ordinary,
            properties: Vec::new(),
            prototype: None,
            callable: None,
            constructable: false,
            elements: Vec::new(),
        }
    }

    /// Create an array object.
    pub fn array(elements: Vec<Option<Value>>) -> Self {
        JsObject {
            kind: ObjectKind::Array,
            elements,
            ..JsObject::new()
        }
    }

    /// Create an array sharing `source`'s prototype, so results built from
    /// an array keep the methods of the array they came from.
    pub fn array_like(source: &JsObject, elements: Vec<Option<Value>>) -> Self {
        let mut obj = JsObject::array(elements);
        obj.prototype = source.prototype.clone();
        obj
    }

    /// Create a function object.
    pub fn function(callable: Callable) -> Self {
        let name = callable.name();
        let length = callable.length();

        let mut obj = JsObject {
            kind: ObjectKind::Function,
            callable: Some(callable),
            ..JsObject::new()
        };

        obj.define_property(
            PropertyKey::string("name"),
            Value::string(name),
            PropertyFlags::CONFIGURABLE,
        );
        obj.define_property(
            PropertyKey::string("length"),
            Value::number(length as f64),
            PropertyFlags::CONFIGURABLE,
        );

        obj
    }

    /// Create a constructor function object with a fresh `prototype` object.
    pub fn constructor(callable: Callable) -> Self {
        let mut obj = JsObject::function(callable);
        obj.constructable = true;
        obj.define_property(
            PropertyKey::string("prototype"),
            Value::object(JsObject::new()),
            PropertyFlags::WRITABLE,
        );
        obj
    }

    /// Mark a function object as a constructor without giving it a
    /// `prototype` property (bound functions construct through their target).
    pub fn into_constructable(mut self) -> Self {
        self.constructable = self.is_callable();
        self
    }

    /// Get the object kind.
    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    /// Check if object is callable.
    pub fn is_callable(&self) -> bool {
        self.callable.is_some()
    }

    /// Check if object is constructable.
    pub fn is_constructable(&self) -> bool {
        self.constructable
    }

    /// Check if object is an array.
    pub fn is_array(&self) -> bool {
        self.kind == ObjectKind::Array
    }

    /// Get the callable.
    pub fn callable(&self) -> Option<&Callable> {
        self.callable.as_ref()
    }

    /// Name of the function, or empty for non-functions.
    pub fn function_name(&self) -> String {
        self.callable.as_ref().map(Callable::name).unwrap_or_default()
    }

    /// Set the prototype.
    pub fn set_prototype(&mut self, proto: Option<Rc<RefCell<JsObject>>>) {
        self.prototype = proto;
    }

    /// Get the prototype.
    pub fn prototype(&self) -> Option<&Rc<RefCell<JsObject>>> {
        self.prototype.as_ref()
    }

    /// Get a property, following the prototype chain.
    pub fn get(&self, key: &PropertyKey) -> Value {
        if let Some(value) = self.get_own(key) {
            return value;
        }

        if let Some(proto) = &self.prototype {
            return proto.borrow().get(key);
        }

        Value::undefined()
    }

    /// Get an own property.
    pub fn get_own(&self, key: &PropertyKey) -> Option<Value> {
        if self.is_array() {
            match key {
                PropertyKey::Index(i) => {
                    if let Some(Some(v)) = self.elements.get(*i as usize) {
                        return Some(v.clone());
                    }
                }
                PropertyKey::String(s) if s == "length" => {
                    return Some(Value::number(self.elements.len() as f64));
                }
                _ => {}
            }
        }

        self.properties
            .iter()
            .find(|p| &p.key == key)
            .map(|p| p.value.clone())
    }

    /// Set a property.
    pub fn set(&mut self, key: PropertyKey, value: Value) -> JsResult<()> {
        if self.is_array() {
            if let PropertyKey::Index(i) = key {
                self.set_element(i as usize, value);
                return Ok(());
            }
        }

        if let Some(prop) = self.properties.iter_mut().find(|p| p.key == key) {
            if !prop.flags.contains(PropertyFlags::WRITABLE) {
                return Err(JsError::type_error(alloc::format!(
                    "Cannot assign to read only property '{}'",
                    key.to_key_string()
                )));
            }
            prop.value = value;
            return Ok(());
        }

        self.properties.push(Property {
            key,
            value,
            flags: PropertyFlags::data(),
        });

        Ok(())
    }

    /// Define (or redefine) an own property with the given attributes.
    pub fn define_property(&mut self, key: PropertyKey, value: Value, flags: PropertyFlags) {
        if let Some(prop) = self.properties.iter_mut().find(|p| p.key == key) {
            prop.value = value;
            prop.flags = flags;
            return;
        }

        self.properties.push(Property { key, value, flags });
    }

    /// Check if object has own property.
    pub fn has_own_property(&self, key: &PropertyKey) -> bool {
        if self.is_array() {
            match key {
                PropertyKey::Index(i) => {
                    if self.has_element(*i as usize) {
                        return true;
                    }
                }
                PropertyKey::String(s) if s == "length" => return true,
                _ => {}
            }
        }

        self.properties.iter().any(|p| &p.key == key)
    }

    /// Check if property exists (including prototype chain).
    pub fn has(&self, key: &PropertyKey) -> bool {
        if self.has_own_property(key) {
            return true;
        }

        if let Some(proto) = &self.prototype {
            return proto.borrow().has(key);
        }

        false
    }

    /// Delete a property. Deleting an array element leaves a hole.
    pub fn delete(&mut self, key: &PropertyKey) -> bool {
        if self.is_array() {
            if let PropertyKey::Index(i) = key {
                if let Some(slot) = self.elements.get_mut(*i as usize) {
                    *slot = None;
                    return true;
                }
            }
        }

        if let Some(pos) = self.properties.iter().position(|p| &p.key == key) {
            if !self.properties[pos].flags.contains(PropertyFlags::CONFIGURABLE) {
                return false;
            }
            self.properties.remove(pos);
        }

        true
    }

    /// Get own property keys: occupied indices ascending, then string keys
    /// in insertion order.
    pub fn own_keys(&self) -> Vec<PropertyKey> {
        self.collect_keys(|_| true)
    }

    /// Get own enumerable property keys, in the same order as `own_keys`.
    pub fn own_enumerable_keys(&self) -> Vec<PropertyKey> {
        self.collect_keys(|p| p.flags.contains(PropertyFlags::ENUMERABLE))
    }

    fn collect_keys(&self, include: impl Fn(&Property) -> bool) -> Vec<PropertyKey> {
        let mut indices: Vec<u32> = self
            .elements
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(i, _)| i as u32)
            .collect();

        for prop in self.properties.iter().filter(|p| include(p)) {
            if let PropertyKey::Index(i) = prop.key {
                indices.push(i);
            }
        }
        indices.sort_unstable();

        let mut keys: Vec<PropertyKey> = indices.into_iter().map(PropertyKey::Index).collect();
        keys.extend(
            self.properties
                .iter()
                .filter(|p| include(p) && matches!(p.key, PropertyKey::String(_)))
                .map(|p| p.key.clone()),
        );
        keys
    }

    /// Array length (0 for non-arrays).
    pub fn array_length(&self) -> usize {
        self.elements.len()
    }

    /// Array slots, holes included.
    pub fn elements(&self) -> &[Option<Value>] {
        &self.elements
    }

    /// Mutable array slots.
    pub fn elements_mut(&mut self) -> &mut Vec<Option<Value>> {
        &mut self.elements
    }

    /// Check whether index `i` is occupied.
    pub fn has_element(&self, i: usize) -> bool {
        matches!(self.elements.get(i), Some(Some(_)))
    }

    /// Element at an occupied index, `None` for holes and out of range.
    pub fn element(&self, i: usize) -> Option<Value> {
        self.elements.get(i).cloned().flatten()
    }

    /// Assign index `i`, growing the array with holes if needed.
    pub fn set_element(&mut self, i: usize, value: Value) {
        if self.elements.len() <= i {
            self.elements.resize(i + 1, None);
        }
        self.elements[i] = Some(value);
    }

    /// Push to array.
    pub fn array_push(&mut self, value: Value) {
        self.elements.push(Some(value));
    }

    /// Join elements with a separator; holes and nullish values print empty.
    pub fn join(&self, separator: &str) -> String {
        let parts: Vec<String> = self
            .elements
            .iter()
            .map(|slot| match slot {
                Some(v) if !v.is_nullish() => v.to_js_string(),
                _ => String::new(),
            })
            .collect();
        parts.join(separator)
    }
}

impl Default for JsObject {
    fn default() -> Self {
        Self::new()
    }
}

/// Signature of a native function: receiver and positional arguments.
pub type NativeFn = Rc<dyn Fn(&Value, &[Value]) -> JsResult<Value>>;

/// Callable function type.
#[derive(Clone, Debug)]
pub enum Callable {
    /// Native function.
    Native(NativeFunction),
    /// Bound function.
    Bound(BoundFunction),
}

impl Callable {
    /// Get function name.
    pub fn name(&self) -> String {
        match self {
            Callable::Native(f) => f.name.clone(),
            Callable::Bound(f) => alloc::format!("bound {}", f.target.borrow().function_name()),
        }
    }

    /// Get function length (parameter count).
    pub fn length(&self) -> usize {
        match self {
            Callable::Native(f) => f.length,
            Callable::Bound(f) => {
                let target_len = f
                    .target
                    .borrow()
                    .callable()
                    .map(Callable::length)
                    .unwrap_or(0);
                target_len.saturating_sub(f.bound_args.len())
            }
        }
    }
}

/// Native function.
#[derive(Clone)]
pub struct NativeFunction {
    /// Function name.
    pub name: String,
    /// Function length.
    pub length: usize,
    /// Function body.
    pub func: NativeFn,
}

impl NativeFunction {
    /// Wrap a closure.
    pub fn new<F>(name: &str, length: usize, func: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> JsResult<Value> + 'static,
    {
        NativeFunction {
            name: name.into(),
            length,
            func: Rc::new(func),
        }
    }
}

impl core::fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("length", &self.length)
            .finish()
    }
}

/// Bound function.
#[derive(Clone)]
pub struct BoundFunction {
    /// Target function object.
    pub target: Rc<RefCell<JsObject>>,
    /// Bound this value.
    pub bound_this: Value,
    /// Bound arguments.
    pub bound_args: Vec<Value>,
}

impl core::fmt::Debug for BoundFunction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BoundFunction")
            .field("target", &self.target.borrow().function_name())
            .field("bound_this", &self.bound_this)
            .field("bound_args", &self.bound_args)
            .finish()
    }
}

/// Deep-clone a value.
///
/// Primitives and functions are returned as they are. Arrays are copied slot
/// by slot (holes stay holes); other objects are copied through their own
/// enumerable properties and lose their prototype. An object reached twice
/// is cloned once, so shared and cyclic structure survives.
pub fn deep_clone(value: &Value) -> Value {
    let mut seen = HashMap::new();
    clone_value(value, &mut seen)
}

type CloneMap = HashMap<*const RefCell<JsObject>, Rc<RefCell<JsObject>>>;

fn clone_value(value: &Value, seen: &mut CloneMap) -> Value {
    let Value::Object(obj) = value else {
        return value.clone();
    };
    if obj.borrow().is_callable() {
        return value.clone();
    }
    if let Some(copy) = seen.get(&Rc::as_ptr(obj)) {
        return Value::Object(copy.clone());
    }

    let source = obj.borrow();
    let copy = if source.is_array() {
        JsObject::array_like(&source, Vec::new())
    } else {
        JsObject::new()
    };
    let copy = Rc::new(RefCell::new(copy));
    seen.insert(Rc::as_ptr(obj), copy.clone());

    if source.is_array() {
        let slots: Vec<Option<Value>> = source
            .elements()
            .iter()
            .map(|slot| slot.as_ref().map(|v| clone_value(v, seen)))
            .collect();
        *copy.borrow_mut().elements_mut() = slots;
    } else {
        for key in source.own_enumerable_keys() {
            let field = clone_value(&source.get(&key), seen);
            copy.borrow_mut().define_property(key, field, PropertyFlags::data());
        }
    }

    Value::Object(copy)
}
