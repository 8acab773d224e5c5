// Copyright 2019-2020 PolkaX Authors. Licensed under GPL-3.0.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{Result, ValueError};

/// The type of a value.
///
/// This is the minimal lattice the reader and the factory need: `Value`
/// on top, `Void` at the bottom, the numeric kinds below `Number`,
/// covariant containers, and constructor types below their abstract data
/// type, which in turn sits below `Node`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Type {
    /// Top: every value conforms.
    Value,
    /// Bottom: no value conforms; the element type of empty literals.
    Void,
    /// Booleans.
    Boolean,
    /// Arbitrary-precision integers.
    Integer,
    /// Rationals.
    Rational,
    /// Reals.
    Real,
    /// Supertype of the three numeric kinds.
    Number,
    /// Strings.
    Str,
    /// Dates, times of day and full instants.
    DateTime,
    /// Source locations.
    SourceLocation,
    /// Lists with the given element type.
    List(Box<Type>),
    /// Sets with the given element type.
    Set(Box<Type>),
    /// Maps with the given key and value types.
    Map(Box<Type>, Box<Type>),
    /// Tuples with per-position fields.
    Tuple(Vec<Field>),
    /// Untyped terms.
    Node,
    /// An abstract data type, by name.
    Adt(String),
    /// A declared constructor.
    Cons(Arc<ConsSignature>),
}

/// One positional field of a tuple or constructor type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    /// The field type.
    pub ty: Type,
    /// Optional field name; literals carry unlabelled fields.
    pub name: Option<String>,
}

impl Field {
    /// An unlabelled field.
    pub fn unlabelled(ty: Type) -> Self {
        Field { ty, name: None }
    }

    /// A labelled field.
    pub fn labelled(ty: Type, name: impl Into<String>) -> Self {
        Field {
            ty,
            name: Some(name.into()),
        }
    }
}

/// A declared constructor of an abstract data type.
#[derive(Debug, PartialEq, Eq)]
pub struct ConsSignature {
    /// The abstract data type this constructor belongs to.
    pub adt: String,
    /// The constructor name.
    pub name: String,
    /// Positional fields.
    pub fields: Vec<Field>,
    /// Declared keyword parameters and their types.
    pub keywords: Vec<(String, Type)>,
}

impl ConsSignature {
    /// The declared type of the keyword parameter `label`, if any.
    pub fn keyword_type(&self, label: &str) -> Option<&Type> {
        self.keywords
            .iter()
            .find(|(name, _)| name == label)
            .map(|(_, ty)| ty)
    }
}

impl Type {
    /// Reflexive-transitive subtype check.
    pub fn is_subtype_of(&self, other: &Type) -> bool {
        if self == other || *other == Type::Value || *self == Type::Void {
            return true;
        }
        match (self, other) {
            (Type::Integer, Type::Number)
            | (Type::Rational, Type::Number)
            | (Type::Real, Type::Number) => true,
            (Type::List(a), Type::List(b)) => a.is_subtype_of(b),
            (Type::Set(a), Type::Set(b)) => a.is_subtype_of(b),
            (Type::Map(ka, va), Type::Map(kb, vb)) => {
                ka.is_subtype_of(kb) && va.is_subtype_of(vb)
            }
            // field names are not part of the subtype relation
            (Type::Tuple(a), Type::Tuple(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b.iter()).all(|(x, y)| x.ty.is_subtype_of(&y.ty))
            }
            (Type::Cons(sig), Type::Adt(name)) => sig.adt == *name,
            (Type::Cons(_), Type::Node) | (Type::Adt(_), Type::Node) => true,
            _ => false,
        }
    }

    /// Least upper bound, used for the element types of literals.
    pub fn lub(&self, other: &Type) -> Type {
        if self.is_subtype_of(other) {
            return other.clone();
        }
        if other.is_subtype_of(self) {
            return self.clone();
        }
        match (self, other) {
            (Type::Integer, _) | (Type::Rational, _) | (Type::Real, _)
                if other.is_subtype_of(&Type::Number) =>
            {
                Type::Number
            }
            (Type::List(a), Type::List(b)) => Type::List(Box::new(a.lub(b))),
            (Type::Set(a), Type::Set(b)) => Type::Set(Box::new(a.lub(b))),
            (Type::Map(ka, va), Type::Map(kb, vb)) => {
                Type::Map(Box::new(ka.lub(kb)), Box::new(va.lub(vb)))
            }
            (Type::Tuple(a), Type::Tuple(b)) if a.len() == b.len() => Type::Tuple(
                a.iter()
                    .zip(b.iter())
                    .map(|(x, y)| Field::unlabelled(x.ty.lub(&y.ty)))
                    .collect(),
            ),
            (Type::Cons(a), Type::Cons(b)) if a.adt == b.adt => Type::Adt(a.adt.clone()),
            (Type::Cons(a), Type::Adt(b)) | (Type::Adt(b), Type::Cons(a)) if a.adt == *b => {
                Type::Adt(b.clone())
            }
            _ if self.is_subtype_of(&Type::Node) && other.is_subtype_of(&Type::Node) => Type::Node,
            _ => Type::Value,
        }
    }

    /// Whether any tuple field carries a name.
    pub fn has_field_names(&self) -> bool {
        match self {
            Type::Tuple(fields) => fields.iter().any(|field| field.name.is_some()),
            Type::Cons(sig) => sig.fields.iter().any(|field| field.name.is_some()),
            _ => false,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Value => write!(f, "value"),
            Type::Void => write!(f, "void"),
            Type::Boolean => write!(f, "bool"),
            Type::Integer => write!(f, "int"),
            Type::Rational => write!(f, "rat"),
            Type::Real => write!(f, "real"),
            Type::Number => write!(f, "num"),
            Type::Str => write!(f, "str"),
            Type::DateTime => write!(f, "datetime"),
            Type::SourceLocation => write!(f, "loc"),
            Type::List(t) => write!(f, "list[{}]", t),
            Type::Set(t) => write!(f, "set[{}]", t),
            Type::Map(k, v) => write!(f, "map[{}, {}]", k, v),
            Type::Tuple(fields) => {
                write!(f, "tuple[")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", field.ty)?;
                    if let Some(name) = &field.name {
                        write!(f, " {}", name)?;
                    }
                }
                write!(f, "]")
            }
            Type::Node => write!(f, "node"),
            Type::Adt(name) => write!(f, "{}", name),
            Type::Cons(sig) => write!(f, "{}::{}", sig.adt, sig.name),
        }
    }
}

/// Declared abstract data types and their constructors.
#[derive(Debug, Default)]
pub struct TypeStore {
    constructors: HashMap<String, Vec<Arc<ConsSignature>>>,
}

impl TypeStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a constructor with positional fields only.
    pub fn declare_constructor(
        &mut self,
        adt: impl Into<String>,
        name: impl Into<String>,
        fields: Vec<Field>,
    ) -> Arc<ConsSignature> {
        self.declare_constructor_with_keywords(adt, name, fields, Vec::new())
    }

    /// Declare a constructor with positional fields and keyword
    /// parameters. Redeclaring the same signature returns the existing
    /// declaration.
    pub fn declare_constructor_with_keywords(
        &mut self,
        adt: impl Into<String>,
        name: impl Into<String>,
        fields: Vec<Field>,
        keywords: Vec<(String, Type)>,
    ) -> Arc<ConsSignature> {
        let signature = ConsSignature {
            adt: adt.into(),
            name: name.into(),
            fields,
            keywords,
        };
        let declared = self.constructors.entry(signature.name.clone()).or_default();
        if let Some(existing) = declared.iter().find(|s| ***s == signature) {
            return existing.clone();
        }
        let signature = Arc::new(signature);
        declared.push(signature.clone());
        signature
    }

    /// All declarations of a constructor name.
    pub fn constructors(&self, name: &str) -> &[Arc<ConsSignature>] {
        self.constructors
            .get(name)
            .map(|declared| declared.as_slice())
            .unwrap_or(&[])
    }

    /// Resolve a constructor name against an arity, narrowed to one
    /// abstract data type when the caller has one in scope.
    pub fn resolve(
        &self,
        name: &str,
        arity: usize,
        adt: Option<&str>,
    ) -> Result<Arc<ConsSignature>> {
        let by_name: Vec<&Arc<ConsSignature>> = self
            .constructors(name)
            .iter()
            .filter(|sig| adt.map_or(true, |adt| sig.adt == adt))
            .collect();
        if by_name.is_empty() {
            return Err(ValueError::UndeclaredConstructor(name.to_string()));
        }
        let matches: Vec<&&Arc<ConsSignature>> = by_name
            .iter()
            .filter(|sig| sig.fields.len() == arity)
            .collect();
        match matches.as_slice() {
            [] => Err(ValueError::Arity {
                name: name.to_string(),
                expected: by_name[0].fields.len(),
                actual: arity,
            }),
            [sig] => Ok((**sig).clone()),
            _ => Err(ValueError::Overload {
                name: name.to_string(),
                candidates: matches
                    .iter()
                    .map(|sig| format!("{}::{}", sig.adt, sig.name))
                    .collect(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_tower_and_top_bottom() {
        assert!(Type::Integer.is_subtype_of(&Type::Number));
        assert!(Type::Real.is_subtype_of(&Type::Number));
        assert!(Type::Void.is_subtype_of(&Type::Integer));
        assert!(Type::Number.is_subtype_of(&Type::Value));
        assert!(!Type::Number.is_subtype_of(&Type::Integer));
        assert!(!Type::Str.is_subtype_of(&Type::Number));
    }

    #[test]
    fn containers_are_covariant() {
        let ints = Type::List(Box::new(Type::Integer));
        let nums = Type::List(Box::new(Type::Number));
        assert!(ints.is_subtype_of(&nums));
        assert!(!nums.is_subtype_of(&ints));
        assert_eq!(ints.lub(&Type::List(Box::new(Type::Real))), nums);
    }

    #[test]
    fn lub_of_unrelated_kinds_is_value() {
        assert_eq!(Type::Str.lub(&Type::Integer), Type::Value);
        assert_eq!(Type::Integer.lub(&Type::Real), Type::Number);
        assert_eq!(Type::Void.lub(&Type::Str), Type::Str);
    }

    #[test]
    fn constructors_sit_below_their_adt() {
        let mut store = TypeStore::new();
        let leaf = store.declare_constructor("Tree", "leaf", vec![]);
        let node = store.declare_constructor(
            "Tree",
            "branch",
            vec![
                Field::unlabelled(Type::Adt("Tree".into())),
                Field::unlabelled(Type::Adt("Tree".into())),
            ],
        );
        assert!(Type::Cons(leaf.clone()).is_subtype_of(&Type::Adt("Tree".into())));
        assert!(Type::Cons(node).is_subtype_of(&Type::Node));
        assert_eq!(
            Type::Cons(leaf.clone()).lub(&Type::Adt("Tree".into())),
            Type::Adt("Tree".into())
        );
        // redeclaration is idempotent
        let again = store.declare_constructor("Tree", "leaf", vec![]);
        assert!(Arc::ptr_eq(&leaf, &again));
    }

    #[test]
    fn resolution_reports_overloads_and_unknowns() {
        let mut store = TypeStore::new();
        store.declare_constructor("A", "mk", vec![Field::unlabelled(Type::Integer)]);
        store.declare_constructor("B", "mk", vec![Field::unlabelled(Type::Integer)]);

        assert!(store.resolve("mk", 1, Some("A")).is_ok());
        match store.resolve("mk", 1, None) {
            Err(ValueError::Overload { candidates, .. }) => assert_eq!(candidates.len(), 2),
            other => panic!("expected an overload error, got {:?}", other.map(|_| ())),
        }
        match store.resolve("absent", 0, None) {
            Err(ValueError::UndeclaredConstructor(name)) => assert_eq!(name, "absent"),
            other => panic!("expected an undeclared error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn field_names_are_observable() {
        let unlabelled = Type::Tuple(vec![
            Field::unlabelled(Type::Integer),
            Field::unlabelled(Type::Str),
        ]);
        let labelled = Type::Tuple(vec![
            Field::labelled(Type::Integer, "count"),
            Field::unlabelled(Type::Str),
        ]);
        assert!(!unlabelled.has_field_names());
        assert!(labelled.has_field_names());
        // names do not affect the subtype relation
        assert!(labelled.is_subtype_of(&unlabelled));
    }
}
