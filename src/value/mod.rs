// Copyright 2019-2020 PolkaX Authors. Licensed under GPL-3.0.

mod datetime;
mod source_location;

pub use self::datetime::DateTimeValue;
pub use self::source_location::SourceLocation;

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_rational::BigRational;

use facts_hamt::{TrieMap, TrieSet};
use facts_intern::Identity;

use crate::types::{ConsSignature, Field, Type};

/// Canonical shared reference to a value.
///
/// The factory returns values behind `Arc`, hash-consed so that equal
/// live values share one physical instance.
pub type VRef = Arc<Value>;

/// An untyped term: a name applied to children, with an optional keyword
/// parameter map.
#[derive(Clone, Debug)]
pub struct NodeValue {
    pub(crate) name: String,
    pub(crate) children: Vec<VRef>,
    pub(crate) keywords: BTreeMap<String, VRef>,
}

impl NodeValue {
    /// The node name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The positional children.
    pub fn children(&self) -> &[VRef] {
        &self.children
    }

    /// The keyword parameters, sorted by label.
    pub fn keywords(&self) -> &BTreeMap<String, VRef> {
        &self.keywords
    }
}

/// A typed term over a declared constructor.
#[derive(Clone, Debug)]
pub struct ConsValue {
    pub(crate) signature: Arc<ConsSignature>,
    pub(crate) children: Vec<VRef>,
    pub(crate) keywords: BTreeMap<String, VRef>,
}

impl ConsValue {
    /// The constructor declaration this term was built from.
    pub fn signature(&self) -> &Arc<ConsSignature> {
        &self.signature
    }

    /// The positional children.
    pub fn children(&self) -> &[VRef] {
        &self.children
    }

    /// The keyword parameters, sorted by label.
    pub fn keywords(&self) -> &BTreeMap<String, VRef> {
        &self.keywords
    }
}

/// An immutable first-class value.
///
/// Equality is structural per kind; node and constructor equality
/// ignores the keyword parameter maps, while the stricter
/// [`Identity`] used for hash-consing includes them.
#[derive(Clone, Debug)]
pub enum Value {
    /// A boolean.
    Boolean(bool),
    /// An arbitrary-precision integer.
    Integer(BigInt),
    /// A rational in reduced form.
    Rational(BigRational),
    /// A real, normalized at construction.
    Real(BigDecimal),
    /// A string.
    String(String),
    /// A date, time of day or full instant.
    DateTime(DateTimeValue),
    /// A source location.
    SourceLocation(SourceLocation),
    /// An ordered sequence.
    List(Vec<VRef>),
    /// A fixed-arity product.
    Tuple(Vec<VRef>),
    /// An unordered collection of distinct elements.
    Set(TrieSet<VRef>),
    /// An unordered key/value collection.
    Map(TrieMap<VRef, VRef>),
    /// An untyped term.
    Node(NodeValue),
    /// A typed term.
    Constructor(ConsValue),
}

fn vrefs_eq(a: &[VRef], b: &[VRef]) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b.iter())
            .all(|(x, y)| Arc::ptr_eq(x, y) || x == y)
}

fn vrefs_identical(a: &[VRef], b: &[VRef]) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b.iter())
            .all(|(x, y)| Arc::ptr_eq(x, y) || x.identical(y.as_ref()))
}

fn keywords_identical(a: &BTreeMap<String, VRef>, b: &BTreeMap<String, VRef>) -> bool {
    a.len() == b.len()
        && a.iter().zip(b.iter()).all(|((ka, va), (kb, vb))| {
            ka == kb && (Arc::ptr_eq(va, vb) || va.identical(vb.as_ref()))
        })
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Rational(a), Value::Rational(b)) => a == b,
            (Value::Real(a), Value::Real(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::SourceLocation(a), Value::SourceLocation(b)) => a == b,
            (Value::List(a), Value::List(b)) => vrefs_eq(a, b),
            (Value::Tuple(a), Value::Tuple(b)) => vrefs_eq(a, b),
            (Value::Set(a), Value::Set(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            // keyword parameter maps are invisible to this equality
            (Value::Node(a), Value::Node(b)) => {
                a.name == b.name && vrefs_eq(&a.children, &b.children)
            }
            (Value::Constructor(a), Value::Constructor(b)) => {
                (Arc::ptr_eq(&a.signature, &b.signature) || a.signature == b.signature)
                    && vrefs_eq(&a.children, &b.children)
            }
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Value::Boolean(b) => {
                state.write_u8(0);
                b.hash(state);
            }
            Value::Integer(i) => {
                state.write_u8(1);
                i.hash(state);
            }
            Value::Rational(r) => {
                state.write_u8(2);
                r.numer().hash(state);
                r.denom().hash(state);
            }
            Value::Real(d) => {
                state.write_u8(3);
                // reals are normalized at construction, so the digit and
                // exponent pair is canonical: 1.0 and 1.00 agree here
                let (digits, exponent) = d.as_bigint_and_exponent();
                digits.hash(state);
                exponent.hash(state);
            }
            Value::String(s) => {
                state.write_u8(4);
                s.hash(state);
            }
            Value::DateTime(dt) => {
                state.write_u8(5);
                dt.hash(state);
            }
            Value::SourceLocation(loc) => {
                state.write_u8(6);
                loc.hash(state);
            }
            Value::List(items) => {
                state.write_u8(7);
                state.write_usize(items.len());
                for item in items {
                    item.hash(state);
                }
            }
            Value::Tuple(items) => {
                state.write_u8(8);
                state.write_usize(items.len());
                for item in items {
                    item.hash(state);
                }
            }
            Value::Set(set) => {
                state.write_u8(9);
                set.hash(state);
            }
            Value::Map(map) => {
                state.write_u8(10);
                map.hash(state);
            }
            // keyword parameter maps stay out, matching equality
            Value::Node(node) => {
                state.write_u8(11);
                node.name.hash(state);
                state.write_usize(node.children.len());
                for child in &node.children {
                    child.hash(state);
                }
            }
            Value::Constructor(cons) => {
                state.write_u8(12);
                cons.signature.adt.hash(state);
                cons.signature.name.hash(state);
                state.write_usize(cons.children.len());
                for child in &cons.children {
                    child.hash(state);
                }
            }
        }
    }
}

impl Identity for Value {
    fn identity_hash(&self) -> u64 {
        // the user-facing hash is a valid (coarser) identity hash:
        // identical values are equal, and equal values agree on it
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }

    fn identical(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::List(a), Value::List(b)) => vrefs_identical(a, b),
            (Value::Tuple(a), Value::Tuple(b)) => vrefs_identical(a, b),
            (Value::Set(a), Value::Set(b)) => {
                a.len() == b.len()
                    && a.iter().all(|x| match b.get(x) {
                        Some(y) => x.identical(y.as_ref()),
                        None => false,
                    })
            }
            (Value::Map(a), Value::Map(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(k, v)| match b.get_key_value(k) {
                        Some((k2, v2)) => {
                            k.identical(k2.as_ref()) && v.identical(v2.as_ref())
                        }
                        None => false,
                    })
            }
            (Value::Node(a), Value::Node(b)) => {
                a.name == b.name
                    && vrefs_identical(&a.children, &b.children)
                    && keywords_identical(&a.keywords, &b.keywords)
            }
            (Value::Constructor(a), Value::Constructor(b)) => {
                (Arc::ptr_eq(&a.signature, &b.signature) || a.signature == b.signature)
                    && vrefs_identical(&a.children, &b.children)
                    && keywords_identical(&a.keywords, &b.keywords)
            }
            _ => self == other,
        }
    }
}

impl Value {
    /// The dynamic type of this value.
    ///
    /// Container literals carry the least upper bound of their element
    /// types, with unlabelled fields.
    pub fn type_of(&self) -> Type {
        match self {
            Value::Boolean(_) => Type::Boolean,
            Value::Integer(_) => Type::Integer,
            Value::Rational(_) => Type::Rational,
            Value::Real(_) => Type::Real,
            Value::String(_) => Type::Str,
            Value::DateTime(_) => Type::DateTime,
            Value::SourceLocation(_) => Type::SourceLocation,
            Value::List(items) => Type::List(Box::new(lub_of(items.iter()))),
            Value::Tuple(items) => Type::Tuple(
                items
                    .iter()
                    .map(|item| Field::unlabelled(item.type_of()))
                    .collect(),
            ),
            Value::Set(set) => Type::Set(Box::new(lub_of(set.iter()))),
            Value::Map(map) => Type::Map(
                Box::new(lub_of(map.keys())),
                Box::new(lub_of(map.values())),
            ),
            Value::Node(_) => Type::Node,
            Value::Constructor(cons) => Type::Cons(cons.signature.clone()),
        }
    }

    /// Dispatch on the value kind.
    pub fn accept<V: ValueVisitor>(&self, visitor: &mut V) -> V::Output {
        match self {
            Value::Boolean(b) => visitor.visit_boolean(*b),
            Value::Integer(i) => visitor.visit_integer(i),
            Value::Rational(r) => visitor.visit_rational(r),
            Value::Real(d) => visitor.visit_real(d),
            Value::String(s) => visitor.visit_string(s),
            Value::DateTime(dt) => visitor.visit_datetime(dt),
            Value::SourceLocation(loc) => visitor.visit_source_location(loc),
            Value::List(items) => visitor.visit_list(items),
            Value::Tuple(items) => visitor.visit_tuple(items),
            Value::Set(set) => visitor.visit_set(set),
            Value::Map(map) => visitor.visit_map(map),
            Value::Node(node) => visitor.visit_node(node),
            Value::Constructor(cons) => visitor.visit_constructor(cons),
        }
    }
}

fn lub_of<'a>(items: impl Iterator<Item = &'a VRef>) -> Type {
    items.fold(Type::Void, |acc, item| acc.lub(&item.type_of()))
}

/// One visitation capability per value kind; traversal goes through
/// [`Value::accept`] instead of per-kind dispatch at every call site.
pub trait ValueVisitor {
    /// Result of a visit.
    type Output;

    /// Visit a boolean.
    fn visit_boolean(&mut self, value: bool) -> Self::Output;
    /// Visit an integer.
    fn visit_integer(&mut self, value: &BigInt) -> Self::Output;
    /// Visit a rational.
    fn visit_rational(&mut self, value: &BigRational) -> Self::Output;
    /// Visit a real.
    fn visit_real(&mut self, value: &BigDecimal) -> Self::Output;
    /// Visit a string.
    fn visit_string(&mut self, value: &str) -> Self::Output;
    /// Visit a datetime.
    fn visit_datetime(&mut self, value: &DateTimeValue) -> Self::Output;
    /// Visit a source location.
    fn visit_source_location(&mut self, value: &SourceLocation) -> Self::Output;
    /// Visit a list.
    fn visit_list(&mut self, items: &[VRef]) -> Self::Output;
    /// Visit a tuple.
    fn visit_tuple(&mut self, items: &[VRef]) -> Self::Output;
    /// Visit a set.
    fn visit_set(&mut self, set: &TrieSet<VRef>) -> Self::Output;
    /// Visit a map.
    fn visit_map(&mut self, map: &TrieMap<VRef, VRef>) -> Self::Output;
    /// Visit an untyped term.
    fn visit_node(&mut self, node: &NodeValue) -> Self::Output;
    /// Visit a typed term.
    fn visit_constructor(&mut self, cons: &ConsValue) -> Self::Output;
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::text::write_value(self, f)
    }
}
