//! KPIO Polyfills
//!
//! Standard library emulation for the KPIO JavaScript engine: the array
//! iteration methods and `call` / `apply` / `bind`, with the exact edge-case
//! behavior of their ECMAScript counterparts (sparse arrays, receiver
//! handling, bound constructors).
//!
//! # Architecture
//!
//! - `value`: JavaScript value representation
//! - `object`: Objects, sparse arrays, function objects, `deep_clone`
//! - `function`: Call-context emulation (`call_function`, `invoke_with`, `bind`, `construct`)
//! - `array`: Array iteration polyfills
//! - `realm`: Global object, prototypes and configuration
//! - `builtin`: Installs the polyfills as prototype methods
//! - `error`: Error kinds
//!
//! # Usage
//!
//! ```ignore
//! use kpio_polyfill::{Realm, Value};
//!
//! let realm = Realm::new();
//! let arr = realm.array([Value::number(1.0), Value::number(2.0)]);
//! let double = realm.new_function("double", 1, |_, args| {
//!     Ok(Value::number(args[0].to_number() * 2.0))
//! });
//! let doubled = realm.invoke_method(&arr, "map", &[double])?;
//! ```

#![no_std]

extern crate alloc;

pub mod array;
pub mod builtin;
pub mod error;
pub mod function;
pub mod object;
pub mod realm;
pub mod value;


pub use error::{JsError, JsResult};
pub use object::{deep_clone, JsObject, PropertyKey};
pub use realm::{MethodNaming, Realm, RealmConfig};
pub use value::Value;
