//! JavaScript value types.
//!
//! The dynamic values that flow through the polyfills: array elements,
//! callback arguments and results, and invocation receivers.

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;
use libm::{fabs, trunc};

use crate::object::{JsObject, ObjectKind, PropertyKey};

/// A JavaScript value.
#[derive(Clone)]
pub enum Value {
    /// The undefined value.
    Undefined,
    /// The null value.
    Null,
    /// A boolean value.
    Boolean(bool),
    /// A numeric value.
    Number(f64),
    /// A string value.
    String(String),
    /// An object value (ordinary object, array or function).
    Object(Rc<RefCell<JsObject>>),
}

impl Value {
    /// Create undefined.
    pub fn undefined() -> Self {
        Value::Undefined
    }

    /// Create null.
    pub fn null() -> Self {
        Value::Null
    }

    /// Create a boolean.
    pub fn boolean(b: bool) -> Self {
        Value::Boolean(b)
    }

    /// Create a number.
    pub fn number(n: f64) -> Self {
        Value::Number(n)
    }

    /// Create a string.
    pub fn string<S: Into<String>>(s: S) -> Self {
        Value::String(s.into())
    }

    /// Create an object.
    pub fn object(obj: JsObject) -> Self {
        Value::Object(Rc::new(RefCell::new(obj)))
    }

    /// Create a dense array from the given values.
    pub fn array<I: IntoIterator<Item = Value>>(values: I) -> Self {
        Value::object(JsObject::array(values.into_iter().map(Some).collect()))
    }

    /// Create a possibly sparse array; `None` entries are holes.
    pub fn sparse_array(elements: Vec<Option<Value>>) -> Self {
        Value::object(JsObject::array(elements))
    }

    /// Check if value is undefined.
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Check if value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if value is nullish (undefined or null).
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// Check if value is the number NaN.
    pub fn is_nan(&self) -> bool {
        matches!(self, Value::Number(n) if n.is_nan())
    }

    /// Check if value is an object (or function).
    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    /// Check if value is callable.
    pub fn is_function(&self) -> bool {
        if let Value::Object(obj) = self {
            obj.borrow().is_callable()
        } else {
            false
        }
    }

    /// Check if value is an array.
    pub fn is_array(&self) -> bool {
        if let Value::Object(obj) = self {
            obj.borrow().is_array()
        } else {
            false
        }
    }

    /// Borrow the underlying object handle, if any.
    pub fn as_object(&self) -> Option<&Rc<RefCell<JsObject>>> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Convert to boolean (ToBoolean).
    pub fn to_boolean(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Object(_) => true,
        }
    }

    /// Convert to number (ToNumber). Unparsable input yields NaN.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Number(n) => *n,
            Value::String(s) => parse_number(s),
            Value::Object(obj) => {
                let obj = obj.borrow();
                // Arrays go through their string form, as ToPrimitive would.
                if obj.is_array() {
                    parse_number(&obj.join(","))
                } else {
                    f64::NAN
                }
            }
        }
    }

    /// `ToIntegerOrInfinity`: NaN becomes 0, the fraction is truncated
    /// toward zero and infinities are kept.
    pub fn to_integer(&self) -> f64 {
        let n = self.to_number();
        if n.is_nan() {
            0.0
        } else if n.is_infinite() {
            n
        } else {
            trunc(n)
        }
    }

    /// Convert to string (ToString).
    pub fn to_js_string(&self) -> String {
        match self {
            Value::Undefined => "undefined".into(),
            Value::Null => "null".into(),
            Value::Boolean(b) => String::from(if *b { "true" } else { "false" }),
            Value::Number(n) => number_to_string(*n),
            Value::String(s) => s.clone(),
            Value::Object(obj) => {
                let obj = obj.borrow();
                match obj.kind() {
                    ObjectKind::Array => obj.join(","),
                    ObjectKind::Function => {
                        alloc::format!("function {}() {{ [native code] }}", obj.function_name())
                    }
                    ObjectKind::Ordinary => "[object Object]".into(),
                }
            }
        }
    }

    /// Get a property, following the prototype chain. Primitives have no
    /// properties here.
    pub fn get(&self, key: &PropertyKey) -> Value {
        match self {
            Value::Object(obj) => obj.borrow().get(key),
            Value::String(s) => match key {
                PropertyKey::String(k) if k == "length" => {
                    Value::number(s.chars().count() as f64)
                }
                _ => Value::undefined(),
            },
            _ => Value::undefined(),
        }
    }

    /// Strict equality (===).
    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            // NaN != NaN falls out of IEEE comparison.
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// SameValueZero: strict equality, except NaN equals NaN.
    pub fn same_value_zero(&self, other: &Value) -> bool {
        if self.is_nan() && other.is_nan() {
            return true;
        }
        self.strict_equals(other)
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Undefined
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", number_to_string(*n)),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Object(obj) => {
                let Ok(obj) = obj.try_borrow() else {
                    return write!(f, "[Borrowed]");
                };
                match obj.kind() {
                    ObjectKind::Array => {
                        write!(f, "[")?;
                        for (i, slot) in obj.elements().iter().enumerate() {
                            if i > 0 {
                                write!(f, ", ")?;
                            }
                            match slot {
                                Some(v) => write!(f, "{:?}", v)?,
                                None => write!(f, "<empty>")?,
                            }
                        }
                        write!(f, "]")
                    }
                    ObjectKind::Function => write!(f, "[Function: {}]", obj.function_name()),
                    ObjectKind::Ordinary => write!(f, "[object Object]"),
                }
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_js_string())
    }
}

/// Parse a number from string (StringToNumber).
fn parse_number(s: &str) -> f64 {
    let s = s.trim();
    if s.is_empty() {
        return 0.0;
    }

    match s {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    let radix = match s.get(..2) {
        Some("0x") | Some("0X") => Some(16),
        Some("0o") | Some("0O") => Some(8),
        Some("0b") | Some("0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        return u64::from_str_radix(&s[2..], radix)
            .map(|n| n as f64)
            .unwrap_or(f64::NAN);
    }

    // Rust accepts "inf" and "nan" spellings that JavaScript does not.
    if s.bytes().any(|b| b.is_ascii_alphabetic() && b != b'e' && b != b'E') {
        return f64::NAN;
    }
    s.parse::<f64>().unwrap_or(f64::NAN)
}

/// Convert number to string (Number::toString).
pub(crate) fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".into();
    }
    if n.is_infinite() {
        return String::from(if n > 0.0 { "Infinity" } else { "-Infinity" });
    }
    if n == 0.0 {
        return "0".into();
    }
    if trunc(n) == n && fabs(n) < 1e15 {
        return alloc::format!("{}", n as i64);
    }
    alloc::format!("{}", n)
}
