/*!
 * Shareable Values
 *
 * The boundary check every structure runs before storing a value, plus a
 * small dynamic value model for hosts whose values carry a runtime
 * "frozen" tag instead of static guarantees.
 *
 * # Design
 *
 * Rust's `Send + Sync` bounds already rule out data races on the handle
 * itself. `Shareable` adds the host-level rule on top: a value may only be
 * published to other holders if none of them can observe it being mutated
 * in place. Scalars and immutable shared data are always shareable; the
 * `Value` model decides at runtime from its frozen tag.
 */

use crate::core::errors::{SyncError, SyncResult};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tracing::trace;

/// Shareability predicate consulted by `set`/`push` before anything is stored
pub trait Shareable {
    /// Whether this value may be seen by several concurrent holders
    fn is_shareable(&self) -> bool;
}

/// Fail with `InvalidArgument` unless `value` passes the shareability check
///
/// `what` names the rejected argument in the error ("key", "value").
pub(crate) fn ensure_shareable<T: Shareable + ?Sized>(what: &str, value: &T) -> SyncResult<()> {
    if value.is_shareable() {
        Ok(())
    } else {
        trace!(argument = what, "rejected non-shareable argument");
        Err(SyncError::invalid(format!("{} must be shareable", what)))
    }
}

macro_rules! always_shareable {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Shareable for $ty {
                #[inline(always)]
                fn is_shareable(&self) -> bool {
                    true
                }
            }
        )*
    };
}

always_shareable!(
    (), bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64,
    str, String,
);

impl<T: Shareable + ?Sized> Shareable for &T {
    fn is_shareable(&self) -> bool {
        (**self).is_shareable()
    }
}

impl<T: Shareable + ?Sized> Shareable for Arc<T> {
    fn is_shareable(&self) -> bool {
        (**self).is_shareable()
    }
}

impl<T: Shareable + ?Sized> Shareable for Box<T> {
    fn is_shareable(&self) -> bool {
        (**self).is_shareable()
    }
}

impl<T: Shareable> Shareable for [T] {
    fn is_shareable(&self) -> bool {
        self.iter().all(Shareable::is_shareable)
    }
}

impl<T: Shareable> Shareable for Vec<T> {
    fn is_shareable(&self) -> bool {
        self.as_slice().is_shareable()
    }
}

impl<T: Shareable> Shareable for Option<T> {
    fn is_shareable(&self) -> bool {
        self.as_ref().map_or(true, Shareable::is_shareable)
    }
}

impl<A: Shareable, B: Shareable> Shareable for (A, B) {
    fn is_shareable(&self) -> bool {
        self.0.is_shareable() && self.1.is_shareable()
    }
}

impl<A: Shareable, B: Shareable, C: Shareable> Shareable for (A, B, C) {
    fn is_shareable(&self) -> bool {
        self.0.is_shareable() && self.1.is_shareable() && self.2.is_shareable()
    }
}

/// Dynamic host value
///
/// Equality and hashing are by content (`"a" == "a"`, `[1, 2] == [1, 2]`)
/// and ignore the frozen tag, so two equal keys always land in the same
/// map slot no matter which copy was used to insert them. Cloning is cheap:
/// strings and arrays share their payload through `Arc`.
#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    /// Interned name; immutable by construction
    Symbol(Arc<str>),
    Str { text: Arc<str>, frozen: bool },
    Array { items: Arc<[Value]>, frozen: bool },
}

impl Value {
    pub fn symbol(name: &str) -> Self {
        Value::Symbol(Arc::from(name))
    }

    /// Mutable (unfrozen) string; rejected by every shared structure
    pub fn string(text: &str) -> Self {
        Value::Str {
            text: Arc::from(text),
            frozen: false,
        }
    }

    pub fn frozen_str(text: &str) -> Self {
        Value::Str {
            text: Arc::from(text),
            frozen: true,
        }
    }

    /// Mutable array
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array {
            items: Arc::from(items),
            frozen: false,
        }
    }

    pub fn frozen_array(items: Vec<Value>) -> Self {
        Value::Array {
            items: Arc::from(items),
            frozen: true,
        }
    }

    /// Shallow freeze: nested arrays keep their own tag
    pub fn freeze(self) -> Self {
        match self {
            Value::Str { text, .. } => Value::Str { text, frozen: true },
            Value::Array { items, .. } => Value::Array {
                items,
                frozen: true,
            },
            other => other,
        }
    }

    pub fn is_frozen(&self) -> bool {
        match self {
            Value::Str { frozen, .. } | Value::Array { frozen, .. } => *frozen,
            _ => true,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str { text, .. } => Some(text),
            Value::Symbol(name) => Some(name),
            _ => None,
        }
    }

    fn discriminant(&self) -> u8 {
        match self {
            Value::Nil => 0,
            Value::Bool(_) => 1,
            Value::Int(_) => 2,
            Value::Symbol(_) => 3,
            Value::Str { .. } => 4,
            Value::Array { .. } => 5,
        }
    }
}

impl Shareable for Value {
    fn is_shareable(&self) -> bool {
        match self {
            Value::Nil | Value::Bool(_) | Value::Int(_) | Value::Symbol(_) => true,
            Value::Str { frozen, .. } => *frozen,
            // Deep check: a frozen array holding a mutable string is still unsafe
            Value::Array { items, frozen } => *frozen && items.is_shareable(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Str { text: a, .. }, Value::Str { text: b, .. }) => a == b,
            (Value::Array { items: a, .. }, Value::Array { items: b, .. }) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.discriminant().hash(state);
        match self {
            Value::Nil => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(n) => n.hash(state),
            Value::Symbol(name) => name.hash(state),
            Value::Str { text, .. } => text.hash(state),
            Value::Array { items, .. } => items.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Symbol(name) => write!(f, ":{}", name),
            Value::Str { text, .. } => write!(f, "{:?}", text),
            Value::Array { items, .. } => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(value: &Value) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_scalars_are_shareable() {
        assert!(Value::Nil.is_shareable());
        assert!(Value::Int(42).is_shareable());
        assert!(Value::symbol("foo").is_shareable());
        assert!(42_i64.is_shareable());
        assert!("static".is_shareable());
    }

    #[test]
    fn test_mutable_strings_are_not_shareable() {
        assert!(!Value::string("mutable").is_shareable());
        assert!(Value::string("mutable").freeze().is_shareable());
        assert!(Value::frozen_str("frozen").is_shareable());
    }

    #[test]
    fn test_arrays_check_contents() {
        let ok = Value::frozen_array(vec![Value::Int(1), Value::frozen_str("x")]);
        assert!(ok.is_shareable());

        let unfrozen = Value::array(vec![Value::Int(1)]);
        assert!(!unfrozen.is_shareable());

        let nested_mutable = Value::frozen_array(vec![Value::string("x")]);
        assert!(!nested_mutable.is_shareable());
    }

    #[test]
    fn test_content_equality_ignores_frozen_tag() {
        let a = Value::string("test");
        let b = Value::frozen_str("test");
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));

        let x = Value::frozen_array(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        let y = Value::array(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        assert_eq!(x, y);
        assert_eq!(hash_of(&x), hash_of(&y));
    }

    #[test]
    fn test_symbol_is_not_string() {
        assert_ne!(Value::symbol("a"), Value::frozen_str("a"));
    }

    #[test]
    fn test_display() {
        let v = Value::frozen_array(vec![Value::Int(1), Value::symbol("a"), Value::Nil]);
        assert_eq!(v.to_string(), "[1, :a, nil]");
    }
}
