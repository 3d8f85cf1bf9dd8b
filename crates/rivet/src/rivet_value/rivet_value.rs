// RivetValue - tagged value representation
//
// A value is exactly one of: nil, boolean, integer, real, a reference to a
// heap object, or a native function pointer. The enum discriminant is the
// type tag; payload accessors return `None` on a kind mismatch.
use std::fmt;

use crate::rivet_value::StringRef;
use crate::rivet_vm::RivetVM;
use crate::RivetResult;

/// Native (Rust) function callable from the runtime.
pub type NativeFunction = fn(&mut RivetVM, &[RivetValue]) -> RivetResult<RivetValue>;

#[derive(Clone, Copy, Default)]
pub enum RivetValue {
    #[default]
    Nil,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    String(StringRef),
    NativeFunction(NativeFunction),
}

/// Discriminant of a `RivetValue`, for matching without the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RivetValueKind {
    Nil,
    Boolean,
    Integer,
    Real,
    String,
    NativeFunction,
}

impl RivetValue {
    // ============ Constructors ============

    #[inline(always)]
    pub const fn nil() -> Self {
        RivetValue::Nil
    }

    #[inline(always)]
    pub const fn boolean(b: bool) -> Self {
        RivetValue::Boolean(b)
    }

    #[inline(always)]
    pub const fn integer(i: i64) -> Self {
        RivetValue::Integer(i)
    }

    #[inline(always)]
    pub const fn real(n: f64) -> Self {
        RivetValue::Real(n)
    }

    #[inline(always)]
    pub const fn string(s: StringRef) -> Self {
        RivetValue::String(s)
    }

    #[inline(always)]
    pub const fn native_function(f: NativeFunction) -> Self {
        RivetValue::NativeFunction(f)
    }

    // ============ Type checks ============

    #[inline(always)]
    pub fn kind(&self) -> RivetValueKind {
        match self {
            RivetValue::Nil => RivetValueKind::Nil,
            RivetValue::Boolean(_) => RivetValueKind::Boolean,
            RivetValue::Integer(_) => RivetValueKind::Integer,
            RivetValue::Real(_) => RivetValueKind::Real,
            RivetValue::String(_) => RivetValueKind::String,
            RivetValue::NativeFunction(_) => RivetValueKind::NativeFunction,
        }
    }

    #[inline(always)]
    pub fn is_nil(&self) -> bool {
        matches!(self, RivetValue::Nil)
    }

    #[inline(always)]
    pub fn is_number(&self) -> bool {
        matches!(self, RivetValue::Integer(_) | RivetValue::Real(_))
    }

    #[inline(always)]
    pub fn is_string(&self) -> bool {
        matches!(self, RivetValue::String(_))
    }

    /// Values that refer to a GC-managed object.
    #[inline(always)]
    pub fn is_collectable(&self) -> bool {
        matches!(self, RivetValue::String(s) if !s.is_const())
    }

    /// Only nil and false are falsy.
    #[inline(always)]
    pub fn is_falsy(&self) -> bool {
        matches!(self, RivetValue::Nil | RivetValue::Boolean(false))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            RivetValue::Nil => "nil",
            RivetValue::Boolean(_) => "bool",
            RivetValue::Integer(_) => "int",
            RivetValue::Real(_) => "real",
            RivetValue::String(_) => "string",
            RivetValue::NativeFunction(_) => "function",
        }
    }

    // ============ Payload access ============

    #[inline(always)]
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            RivetValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    #[inline(always)]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            RivetValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    #[inline(always)]
    pub fn as_real(&self) -> Option<f64> {
        match self {
            RivetValue::Real(n) => Some(*n),
            _ => None,
        }
    }

    #[inline(always)]
    pub fn as_string(&self) -> Option<StringRef> {
        match self {
            RivetValue::String(s) => Some(*s),
            _ => None,
        }
    }

    #[inline(always)]
    pub fn as_native_function(&self) -> Option<NativeFunction> {
        match self {
            RivetValue::NativeFunction(f) => Some(*f),
            _ => None,
        }
    }
}

/// Identity comparison: strings compare by handle, functions by address.
/// Content equality of long strings needs `RivetVM::raw_equal`.
impl PartialEq for RivetValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (RivetValue::Nil, RivetValue::Nil) => true,
            (RivetValue::Boolean(a), RivetValue::Boolean(b)) => a == b,
            (RivetValue::Integer(a), RivetValue::Integer(b)) => a == b,
            (RivetValue::Real(a), RivetValue::Real(b)) => a == b,
            (RivetValue::String(a), RivetValue::String(b)) => a == b,
            (RivetValue::NativeFunction(a), RivetValue::NativeFunction(b)) => {
                std::ptr::fn_addr_eq(*a, *b)
            }
            _ => false,
        }
    }
}

impl fmt::Debug for RivetValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RivetValue::Nil => write!(f, "nil"),
            RivetValue::Boolean(b) => write!(f, "{b}"),
            RivetValue::Integer(i) => write!(f, "{i}"),
            RivetValue::Real(n) => write!(f, "{n:?}"),
            RivetValue::String(s) => write!(f, "string({s:?})"),
            RivetValue::NativeFunction(func) => write!(f, "function({:p})", *func as *const ()),
        }
    }
}

impl From<bool> for RivetValue {
    fn from(b: bool) -> Self {
        RivetValue::Boolean(b)
    }
}

impl From<i64> for RivetValue {
    fn from(i: i64) -> Self {
        RivetValue::Integer(i)
    }
}

impl From<f64> for RivetValue {
    fn from(n: f64) -> Self {
        RivetValue::Real(n)
    }
}

impl From<StringRef> for RivetValue {
    fn from(s: StringRef) -> Self {
        RivetValue::String(s)
    }
}
