// Copyright 2019-2020 PolkaX Authors. Licensed under GPL-3.0.

//! The value factory.
//!
//! One operation per value kind. Every product is funneled through the
//! process-wide weak cache, so structurally identical live values share
//! one `Arc`; set and map literals are assembled through a transient
//! trie builder and frozen before interning.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use lazy_static::lazy_static;
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::Zero;

use facts_hamt::{TransientMap, TransientSet};
use facts_intern::WeakCache;

use crate::error::{Result, ValueError};
use crate::precision::real_precision;
use crate::types::{ConsSignature, Type};
use crate::value::{ConsValue, DateTimeValue, NodeValue, SourceLocation, VRef, Value};

lazy_static! {
    /// The process-wide hash-consing cache over all values.
    static ref VALUES: WeakCache<Value> = WeakCache::new();
}

/// Intern a freshly built value, returning the canonical instance.
pub(crate) fn canonical(value: Value) -> VRef {
    VALUES.intern(value)
}

/// The number of entries currently tracked by the value cache.
pub fn cache_len() -> usize {
    VALUES.len()
}

/// Reclaim value-cache entries whose referent has been dropped.
pub fn cache_purge() {
    VALUES.purge()
}

/// A boolean value.
pub fn boolean(value: bool) -> VRef {
    canonical(Value::Boolean(value))
}

/// An integer value.
pub fn integer(value: impl Into<BigInt>) -> VRef {
    canonical(Value::Integer(value.into()))
}

/// An integer value from its decimal notation.
pub fn integer_from_str(digits: &str) -> Result<VRef> {
    let value = BigInt::from_str(digits).map_err(|_| ValueError::Domain {
        what: "integer notation",
        value: digits.to_string(),
    })?;
    Ok(integer(value))
}

/// A rational value in reduced form. The denominator may not be zero.
pub fn rational(numerator: impl Into<BigInt>, denominator: impl Into<BigInt>) -> Result<VRef> {
    let numerator = numerator.into();
    let denominator = denominator.into();
    if denominator.is_zero() {
        return Err(ValueError::Domain {
            what: "rational denominator",
            value: denominator.to_string(),
        });
    }
    Ok(canonical(Value::Rational(BigRational::new(
        numerator,
        denominator,
    ))))
}

/// A real value from its decimal notation, kept exact.
pub fn real_from_str(notation: &str) -> Result<VRef> {
    let value = BigDecimal::from_str(notation).map_err(|_| ValueError::Domain {
        what: "real notation",
        value: notation.to_string(),
    })?;
    Ok(canonical(Value::Real(value.normalized())))
}

/// A real value from its decimal notation, rounded to an explicit
/// number of significant digits.
pub fn real_from_str_with_precision(notation: &str, digits: u32) -> Result<VRef> {
    let value = BigDecimal::from_str(notation).map_err(|_| ValueError::Domain {
        what: "real notation",
        value: notation.to_string(),
    })?;
    Ok(canonical(Value::Real(
        value.with_prec(u64::from(digits.max(1))).normalized(),
    )))
}

/// A real value from a float, rounded to the process-wide precision.
pub fn real(value: f64) -> Result<VRef> {
    if !value.is_finite() {
        return Err(ValueError::Domain {
            what: "real value",
            value: value.to_string(),
        });
    }
    real_from_str_with_precision(&value.to_string(), real_precision())
}

/// A string value.
pub fn string(value: impl Into<String>) -> VRef {
    canonical(Value::String(value.into()))
}

/// A calendar date value.
pub fn date(year: i32, month: u32, day: u32) -> Result<VRef> {
    Ok(canonical(Value::DateTime(DateTimeValue::date(
        year, month, day,
    )?)))
}

/// A time-of-day value; `offset_minutes` is the signed offset from UTC.
pub fn time(
    hour: u32,
    minute: u32,
    second: u32,
    millisecond: u32,
    offset_minutes: i32,
) -> Result<VRef> {
    Ok(canonical(Value::DateTime(DateTimeValue::time(
        hour,
        minute,
        second,
        millisecond,
        offset_minutes,
    )?)))
}

/// A full instant value.
#[allow(clippy::too_many_arguments)]
pub fn datetime(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
    millisecond: u32,
    offset_minutes: i32,
) -> Result<VRef> {
    Ok(canonical(Value::DateTime(DateTimeValue::instant(
        year,
        month,
        day,
        hour,
        minute,
        second,
        millisecond,
        offset_minutes,
    )?)))
}

/// A source location naming a whole artifact.
pub fn source_location(uri: impl Into<String>) -> Result<VRef> {
    Ok(canonical(Value::SourceLocation(SourceLocation::new(uri)?)))
}

/// A source location narrowed to a character range.
pub fn source_location_with_range(
    uri: impl Into<String>,
    offset: i64,
    length: i64,
) -> Result<VRef> {
    Ok(canonical(Value::SourceLocation(SourceLocation::with_range(
        uri, offset, length,
    )?)))
}

/// A source location with a character range and line/column bounds.
#[allow(clippy::too_many_arguments)]
pub fn source_location_with_span(
    uri: impl Into<String>,
    offset: i64,
    length: i64,
    begin_line: i64,
    begin_column: i64,
    end_line: i64,
    end_column: i64,
) -> Result<VRef> {
    Ok(canonical(Value::SourceLocation(SourceLocation::with_span(
        uri,
        offset,
        length,
        begin_line,
        begin_column,
        end_line,
        end_column,
    )?)))
}

/// A list value.
pub fn list(items: Vec<VRef>) -> VRef {
    canonical(Value::List(items))
}

/// A tuple value.
pub fn tuple(items: Vec<VRef>) -> VRef {
    canonical(Value::Tuple(items))
}

/// A set value; duplicate elements collapse.
pub fn set(items: Vec<VRef>) -> VRef {
    let mut builder = TransientSet::new();
    for item in items {
        builder
            .insert(item)
            .expect("a fresh set builder is never frozen");
    }
    let frozen = builder
        .freeze()
        .expect("a fresh set builder freezes exactly once");
    canonical(Value::Set(frozen))
}

/// A map value; later entries replace earlier ones with an equal key.
pub fn map(entries: Vec<(VRef, VRef)>) -> VRef {
    let mut builder = TransientMap::new();
    for (key, value) in entries {
        builder
            .insert(key, value)
            .expect("a fresh map builder is never frozen");
    }
    let frozen = builder
        .freeze()
        .expect("a fresh map builder freezes exactly once");
    canonical(Value::Map(frozen))
}

/// An untyped term.
pub fn node(name: impl Into<String>, children: Vec<VRef>) -> VRef {
    node_with_keywords(name, children, Vec::new())
}

/// An untyped term with keyword parameters.
pub fn node_with_keywords(
    name: impl Into<String>,
    children: Vec<VRef>,
    keywords: Vec<(String, VRef)>,
) -> VRef {
    canonical(Value::Node(NodeValue {
        name: name.into(),
        children,
        keywords: keywords.into_iter().collect(),
    }))
}

/// A typed term over a declared constructor.
pub fn constructor(signature: Arc<ConsSignature>, children: Vec<VRef>) -> Result<VRef> {
    constructor_with_keywords(signature, children, Vec::new())
}

/// A typed term with keyword parameters. Children must conform to the
/// declared field types and keyword labels to their declared types.
pub fn constructor_with_keywords(
    signature: Arc<ConsSignature>,
    children: Vec<VRef>,
    keywords: Vec<(String, VRef)>,
) -> Result<VRef> {
    if children.len() != signature.fields.len() {
        return Err(ValueError::Arity {
            name: signature.name.clone(),
            expected: signature.fields.len(),
            actual: children.len(),
        });
    }
    for (child, field) in children.iter().zip(signature.fields.iter()) {
        let actual = child.type_of();
        if !actual.is_subtype_of(&field.ty) {
            return Err(ValueError::Type {
                expected: field.ty.clone(),
                actual,
            });
        }
    }
    let mut collected: BTreeMap<String, VRef> = BTreeMap::new();
    for (label, value) in keywords {
        match signature.keyword_type(&label) {
            Some(declared) => {
                let actual = value.type_of();
                if !actual.is_subtype_of(declared) {
                    return Err(ValueError::Type {
                        expected: declared.clone(),
                        actual,
                    });
                }
            }
            None => {
                return Err(ValueError::Domain {
                    what: "keyword parameter",
                    value: format!("{} has no `{}`", signature.name, label),
                });
            }
        }
        collected.insert(label, value);
    }
    Ok(canonical(Value::Constructor(ConsValue {
        signature,
        children,
        keywords: collected,
    })))
}

/// Builder façade for list values, with an optional declared element
/// type.
#[derive(Debug, Default)]
pub struct ListWriter {
    declared: Option<Type>,
    items: Vec<VRef>,
}

impl ListWriter {
    /// A writer accepting any element.
    pub fn new() -> Self {
        Self::default()
    }

    /// A writer enforcing an element type.
    pub fn with_type(element: Type) -> Self {
        ListWriter {
            declared: Some(element),
            items: Vec::new(),
        }
    }

    /// Append an element.
    pub fn append(&mut self, item: VRef) -> Result<()> {
        if let Some(declared) = &self.declared {
            let actual = item.type_of();
            if !actual.is_subtype_of(declared) {
                return Err(ValueError::Type {
                    expected: declared.clone(),
                    actual,
                });
            }
        }
        self.items.push(item);
        Ok(())
    }

    /// Finish and intern the list.
    pub fn done(self) -> VRef {
        list(self.items)
    }
}

/// Builder façade for set values, with an optional declared element
/// type.
#[derive(Debug)]
pub struct SetWriter {
    declared: Option<Type>,
    builder: TransientSet<VRef>,
}

impl SetWriter {
    /// A writer accepting any element.
    pub fn new() -> Self {
        SetWriter {
            declared: None,
            builder: TransientSet::new(),
        }
    }

    /// A writer enforcing an element type.
    pub fn with_type(element: Type) -> Self {
        SetWriter {
            declared: Some(element),
            builder: TransientSet::new(),
        }
    }

    /// Insert an element.
    pub fn insert(&mut self, item: VRef) -> Result<()> {
        if let Some(declared) = &self.declared {
            let actual = item.type_of();
            if !actual.is_subtype_of(declared) {
                return Err(ValueError::Type {
                    expected: declared.clone(),
                    actual,
                });
            }
        }
        self.builder.insert(item)?;
        Ok(())
    }

    /// Finish and intern the set.
    pub fn done(&mut self) -> Result<VRef> {
        Ok(canonical(Value::Set(self.builder.freeze()?)))
    }
}

impl Default for SetWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder façade for map values, with optional declared key and value
/// types.
#[derive(Debug)]
pub struct MapWriter {
    declared: Option<(Type, Type)>,
    builder: TransientMap<VRef, VRef>,
}

impl MapWriter {
    /// A writer accepting any entry.
    pub fn new() -> Self {
        MapWriter {
            declared: None,
            builder: TransientMap::new(),
        }
    }

    /// A writer enforcing key and value types.
    pub fn with_types(key: Type, value: Type) -> Self {
        MapWriter {
            declared: Some((key, value)),
            builder: TransientMap::new(),
        }
    }

    /// Put an entry, replacing any previous value for an equal key.
    pub fn put(&mut self, key: VRef, value: VRef) -> Result<()> {
        if let Some((key_type, value_type)) = &self.declared {
            let actual = key.type_of();
            if !actual.is_subtype_of(key_type) {
                return Err(ValueError::KeyType {
                    expected: key_type.clone(),
                    actual,
                });
            }
            let actual = value.type_of();
            if !actual.is_subtype_of(value_type) {
                return Err(ValueError::ValueType {
                    expected: value_type.clone(),
                    actual,
                });
            }
        }
        self.builder.insert(key, value)?;
        Ok(())
    }

    /// Finish and intern the map.
    pub fn done(&mut self) -> Result<VRef> {
        Ok(canonical(Value::Map(self.builder.freeze()?)))
    }
}

impl Default for MapWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Field;

    #[test]
    fn writers_enforce_declared_types() {
        let mut writer = MapWriter::with_types(Type::Integer, Type::Str);
        writer.put(integer(1), string("one")).unwrap();
        match writer.put(string("oops"), string("x")) {
            Err(ValueError::KeyType { expected, actual }) => {
                assert_eq!(expected, Type::Integer);
                assert_eq!(actual, Type::Str);
            }
            other => panic!("expected a key type error, got {:?}", other),
        }
        match writer.put(integer(2), boolean(true)) {
            Err(ValueError::ValueType { expected, .. }) => assert_eq!(expected, Type::Str),
            other => panic!("expected a value type error, got {:?}", other),
        }
        let done = writer.done().unwrap();
        assert_eq!(*done, *map(vec![(integer(1), string("one"))]));
        // the writer is single-shot
        assert!(writer.done().is_err());
        assert!(writer.put(integer(3), string("three")).is_err());
    }

    #[test]
    fn set_and_list_writers() {
        let mut sets = SetWriter::with_type(Type::Integer);
        sets.insert(integer(1)).unwrap();
        sets.insert(integer(1)).unwrap();
        sets.insert(integer(2)).unwrap();
        assert!(sets.insert(string("x")).is_err());
        let value = sets.done().unwrap();
        assert_eq!(*value, *set(vec![integer(1), integer(2)]));

        let mut lists = ListWriter::with_type(Type::Number);
        lists.append(integer(1)).unwrap();
        lists.append(rational(1, 2).unwrap()).unwrap();
        assert!(lists.append(boolean(true)).is_err());
        let value = lists.done();
        assert_eq!(*value, *list(vec![integer(1), rational(1, 2).unwrap()]));
    }

    #[test]
    fn constructor_application_checks_shape() {
        let mut store = crate::types::TypeStore::new();
        let sig = store.declare_constructor_with_keywords(
            "Shape",
            "circle",
            vec![Field::unlabelled(Type::Integer)],
            vec![("label".to_string(), Type::Str)],
        );

        assert!(constructor(sig.clone(), vec![integer(3)]).is_ok());
        match constructor(sig.clone(), vec![]) {
            Err(ValueError::Arity { expected, actual, .. }) => {
                assert_eq!((expected, actual), (1, 0));
            }
            other => panic!("expected an arity error, got {:?}", other.map(|_| ())),
        }
        match constructor(sig.clone(), vec![string("big")]) {
            Err(ValueError::Type { expected, .. }) => assert_eq!(expected, Type::Integer),
            other => panic!("expected a type error, got {:?}", other.map(|_| ())),
        }
        assert!(constructor_with_keywords(
            sig.clone(),
            vec![integer(3)],
            vec![("label".to_string(), string("unit"))],
        )
        .is_ok());
        assert!(constructor_with_keywords(
            sig.clone(),
            vec![integer(3)],
            vec![("label".to_string(), integer(9))],
        )
        .is_err());
        assert!(constructor_with_keywords(
            sig,
            vec![integer(3)],
            vec![("unknown".to_string(), integer(9))],
        )
        .is_err());
    }

    #[test]
    fn domain_preconditions() {
        assert!(integer_from_str("12x").is_err());
        assert!(integer_from_str("-12").is_ok());
        assert!(real_from_str("abc").is_err());
        assert!(real(f64::NAN).is_err());
        assert!(real(1.5).is_ok());
        assert!(source_location("with|bar").is_err());
        assert!(source_location_with_range("file:///ok", -1, 0).is_err());
    }

    #[test]
    fn explicit_precision_rounds() {
        let rounded = real_from_str_with_precision("4.875329280939582", 5).unwrap();
        assert_eq!(*rounded, *real_from_str("4.8753").unwrap());
        // construction from notation is exact
        let exact = real_from_str("4.875329280939582").unwrap();
        assert_ne!(*rounded, *exact);
    }
}
