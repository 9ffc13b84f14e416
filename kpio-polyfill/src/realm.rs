//! Realm.
//!
//! Owns the global object (the default receiver for `call`, `apply` and
//! `bind`) and the prototypes the polyfills are installed on.

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;

use crate::builtin;
use crate::error::{JsError, JsResult};
use crate::function::{self, describe};
use crate::object::{Callable, JsObject, NativeFunction, PropertyKey};
use crate::value::Value;

/// How installed methods are named.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MethodNaming {
    /// Standard names: `map`, `flatMap`, `call`.
    Standard,
    /// Prefixed names: with prefix `my`, `myMap`, `myFlatMap`, `myCall`.
    Prefixed(String),
}

impl MethodNaming {
    /// Installed name for a standard method name.
    pub fn method_name(&self, base: &str) -> String {
        match self {
            MethodNaming::Standard => base.into(),
            MethodNaming::Prefixed(prefix) => {
                let mut chars = base.chars();
                let mut name = prefix.clone();
                if let Some(first) = chars.next() {
                    name.extend(first.to_uppercase());
                    name.push_str(chars.as_str());
                }
                name
            }
        }
    }
}

/// Realm configuration.
#[derive(Clone, Debug)]
pub struct RealmConfig {
    /// Method naming scheme.
    pub naming: MethodNaming,
    /// Install the array polyfills on the array prototype.
    pub install_array: bool,
    /// Install `call`, `apply` and `bind` on the function prototype.
    pub install_function: bool,
    /// Install `deepClone` on the `Object` global.
    pub install_object: bool,
}

impl Default for RealmConfig {
    fn default() -> Self {
        RealmConfig {
            naming: MethodNaming::Standard,
            install_array: true,
            install_function: true,
            install_object: true,
        }
    }
}

impl RealmConfig {
    /// Configuration using prefixed method names.
    pub fn prefixed<S: Into<String>>(prefix: S) -> Self {
        RealmConfig {
            naming: MethodNaming::Prefixed(prefix.into()),
            ..RealmConfig::default()
        }
    }
}

/// A realm.
pub struct Realm {
    /// Global object.
    global_object: Rc<RefCell<JsObject>>,
    /// Prototype of arrays created through the realm.
    array_prototype: Rc<RefCell<JsObject>>,
    /// Prototype of functions created through the realm.
    function_prototype: Rc<RefCell<JsObject>>,
    /// Configuration.
    config: RealmConfig,
}

impl Realm {
    /// Create a realm with every polyfill installed under standard names.
    pub fn new() -> Self {
        Self::with_config(RealmConfig::default())
    }

    /// Create a realm with the given configuration.
    pub fn with_config(config: RealmConfig) -> Self {
        let mut realm = Realm {
            global_object: Rc::new(RefCell::new(JsObject::new())),
            array_prototype: Rc::new(RefCell::new(JsObject::new())),
            function_prototype: Rc::new(RefCell::new(JsObject::new())),
            config,
        };

        builtin::init(&mut realm);

        realm
    }

    /// Get the configuration.
    pub fn config(&self) -> &RealmConfig {
        &self.config
    }

    /// Get the global object.
    pub fn global_object(&self) -> Rc<RefCell<JsObject>> {
        self.global_object.clone()
    }

    /// The global object as a value (`globalThis`).
    pub fn global_this(&self) -> Value {
        Value::Object(self.global_object.clone())
    }

    /// Get the array prototype.
    pub fn array_prototype(&self) -> Rc<RefCell<JsObject>> {
        self.array_prototype.clone()
    }

    /// Get the function prototype.
    pub fn function_prototype(&self) -> Rc<RefCell<JsObject>> {
        self.function_prototype.clone()
    }

    /// Installed name for a standard method name.
    pub fn method_name(&self, base: &str) -> String {
        self.config.naming.method_name(base)
    }

    /// Define a global variable.
    pub fn define_global(&mut self, name: &str, value: Value) {
        // Every global is a writable data property.
        self.global_object
            .borrow_mut()
            .set(PropertyKey::from(name), value)
            .ok();
    }

    /// Get a global variable (`undefined` if missing).
    pub fn get_global(&self, name: &str) -> Value {
        self.global_object.borrow().get(&PropertyKey::from(name))
    }

    /// Create a function inheriting from the realm's function prototype.
    pub fn new_function<F>(&self, name: &str, length: usize, func: F) -> Value
    where
        F: Fn(&Value, &[Value]) -> JsResult<Value> + 'static,
    {
        let mut obj = JsObject::function(Callable::Native(NativeFunction::new(name, length, func)));
        obj.set_prototype(Some(self.function_prototype.clone()));
        Value::object(obj)
    }

    /// Create a constructor inheriting from the realm's function prototype.
    pub fn new_constructor<F>(&self, name: &str, length: usize, func: F) -> Value
    where
        F: Fn(&Value, &[Value]) -> JsResult<Value> + 'static,
    {
        let mut obj = JsObject::constructor(Callable::Native(NativeFunction::new(name, length, func)));
        obj.set_prototype(Some(self.function_prototype.clone()));
        Value::object(obj)
    }

    /// Create an array inheriting from the realm's array prototype.
    pub fn new_array(&self, elements: Vec<Option<Value>>) -> Value {
        let mut obj = JsObject::array(elements);
        obj.set_prototype(Some(self.array_prototype.clone()));
        Value::object(obj)
    }

    /// Create a dense array inheriting from the realm's array prototype.
    pub fn array<I: IntoIterator<Item = Value>>(&self, values: I) -> Value {
        self.new_array(values.into_iter().map(Some).collect())
    }

    /// The receiver a call runs with: `this_value`, or the global object if
    /// it is nullish.
    pub fn resolve_receiver(&self, this_value: &Value) -> Value {
        effective_receiver(this_value, Some(self.global_object.clone()))
    }

    /// `func.call(thisArg, ...args)`.
    pub fn call(&self, func: &Value, this_value: &Value, args: &[Value]) -> JsResult<Value> {
        function::ensure_callable(func)?;
        function::call_function(func, &self.resolve_receiver(this_value), args)
    }

    /// `func.apply(thisArg, argsArray)`.
    pub fn apply(&self, func: &Value, this_value: &Value, args: &Value) -> JsResult<Value> {
        function::invoke_with(func, &self.resolve_receiver(this_value), args)
    }

    /// `func.bind(thisArg, ...args)`.
    pub fn bind(&self, func: &Value, this_value: &Value, args: &[Value]) -> JsResult<Value> {
        function::bind(func, &self.resolve_receiver(this_value), args)
    }

    /// `new func(...args)`.
    pub fn construct(&self, func: &Value, args: &[Value]) -> JsResult<Value> {
        function::construct(func, args)
    }

    /// `receiver[name](...args)`, looking the method up through the
    /// prototype chain.
    pub fn invoke_method(&self, receiver: &Value, name: &str, args: &[Value]) -> JsResult<Value> {
        if receiver.is_nullish() {
            return Err(JsError::nullish_receiver(name));
        }

        let method = receiver.get(&PropertyKey::from(name));
        if !method.is_function() {
            return Err(JsError::not_callable(alloc::format!(
                "{}.{}",
                describe(receiver),
                name
            )));
        }

        function::call_function(&method, receiver, args)
    }
}

impl Default for Realm {
    fn default() -> Self {
        Self::new()
    }
}

/// `this_value`, or the global object when `this_value` is nullish and a
/// global is available.
pub(crate) fn effective_receiver(
    this_value: &Value,
    global: Option<Rc<RefCell<JsObject>>>,
) -> Value {
    if this_value.is_nullish() {
        if let Some(global) = global {
            return Value::Object(global);
        }
    }
    this_value.clone()
}
