// Copyright 2019-2020 PolkaX Authors. Licensed under GPL-3.0.

use std::fmt::{self, Write};

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_rational::BigRational;

use facts_hamt::{TrieMap, TrieSet};

use crate::value::{
    ConsValue, DateTimeValue, NodeValue, SourceLocation, VRef, Value, ValueVisitor,
};

/// Print a value to its canonical textual form.
pub fn value_to_string(value: &Value) -> String {
    let mut out = String::new();
    write_value(value, &mut out).expect("writing to a string buffer never fails");
    out
}

pub(crate) fn write_value(value: &Value, out: &mut impl Write) -> fmt::Result {
    let mut writer = StandardTextWriter { out };
    value.accept(&mut writer)
}

/// The standard writer, a visitor over the value kinds.
struct StandardTextWriter<'a, W> {
    out: &'a mut W,
}

impl<'a, W: Write> StandardTextWriter<'a, W> {
    fn write_child(&mut self, child: &VRef) -> fmt::Result {
        child.accept(self)
    }

    fn write_comma_separated(&mut self, items: &[VRef]) -> fmt::Result {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.out.write_char(',')?;
            }
            self.write_child(item)?;
        }
        Ok(())
    }

    fn write_term(
        &mut self,
        name: &str,
        children: &[VRef],
        keywords: &std::collections::BTreeMap<String, VRef>,
    ) -> fmt::Result {
        write_name(name, self.out)?;
        self.out.write_char('(')?;
        self.write_comma_separated(children)?;
        let mut first = children.is_empty();
        for (label, value) in keywords {
            if !first {
                self.out.write_char(',')?;
            }
            first = false;
            write!(self.out, "{}=", label)?;
            self.write_child(value)?;
        }
        self.out.write_char(')')
    }
}

impl<'a, W: Write> ValueVisitor for StandardTextWriter<'a, W> {
    type Output = fmt::Result;

    fn visit_boolean(&mut self, value: bool) -> fmt::Result {
        self.out.write_str(if value { "true" } else { "false" })
    }

    fn visit_integer(&mut self, value: &BigInt) -> fmt::Result {
        write!(self.out, "{}", value)
    }

    fn visit_rational(&mut self, value: &BigRational) -> fmt::Result {
        write!(self.out, "{}r{}", value.numer(), value.denom())
    }

    fn visit_real(&mut self, value: &BigDecimal) -> fmt::Result {
        let notation = value.to_string();
        // the grammar requires a fraction or an exponent to tell reals
        // from integers
        if notation.contains('.') || notation.contains('e') || notation.contains('E') {
            self.out.write_str(&notation)
        } else {
            write!(self.out, "{}.0", notation)
        }
    }

    fn visit_string(&mut self, value: &str) -> fmt::Result {
        write_quoted(value, self.out)
    }

    fn visit_datetime(&mut self, value: &DateTimeValue) -> fmt::Result {
        value.write_canonical(self.out)
    }

    fn visit_source_location(&mut self, value: &SourceLocation) -> fmt::Result {
        value.write_canonical(self.out)
    }

    fn visit_list(&mut self, items: &[VRef]) -> fmt::Result {
        self.out.write_char('[')?;
        self.write_comma_separated(items)?;
        self.out.write_char(']')
    }

    fn visit_tuple(&mut self, items: &[VRef]) -> fmt::Result {
        self.out.write_char('<')?;
        self.write_comma_separated(items)?;
        self.out.write_char('>')
    }

    fn visit_set(&mut self, set: &TrieSet<VRef>) -> fmt::Result {
        self.out.write_char('{')?;
        for (i, item) in set.iter().enumerate() {
            if i > 0 {
                self.out.write_char(',')?;
            }
            self.write_child(item)?;
        }
        self.out.write_char('}')
    }

    fn visit_map(&mut self, map: &TrieMap<VRef, VRef>) -> fmt::Result {
        self.out.write_char('(')?;
        for (i, (key, value)) in map.iter().enumerate() {
            if i > 0 {
                self.out.write_char(',')?;
            }
            self.write_child(key)?;
            self.out.write_char(':')?;
            self.write_child(value)?;
        }
        self.out.write_char(')')
    }

    fn visit_node(&mut self, node: &NodeValue) -> fmt::Result {
        self.write_term(node.name(), node.children(), node.keywords())
    }

    fn visit_constructor(&mut self, cons: &ConsValue) -> fmt::Result {
        self.write_term(&cons.signature().name, cons.children(), cons.keywords())
    }
}

/// Whether a term name can print bare, without quotes.
pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Print a term name: bare when it is an identifier, as a string
/// literal otherwise.
pub(crate) fn write_name(name: &str, out: &mut impl Write) -> fmt::Result {
    if is_identifier(name) {
        out.write_str(name)
    } else {
        write_quoted(name, out)
    }
}

/// Print a string literal, choosing the shortest well-formed escape for
/// every character.
fn write_quoted(value: &str, out: &mut impl Write) -> fmt::Result {
    out.write_char('"')?;
    for c in value.chars() {
        match c {
            '"' => out.write_str("\\\"")?,
            '\\' => out.write_str("\\\\")?,
            '\n' => out.write_str("\\n")?,
            '\t' => out.write_str("\\t")?,
            '\r' => out.write_str("\\r")?,
            '\u{c}' => out.write_str("\\f")?,
            '\u{8}' => out.write_str("\\b")?,
            '<' => out.write_str("\\<")?,
            '>' => out.write_str("\\>")?,
            c if c.is_control() => write!(out, "\\a{:02x}", c as u32)?,
            c => out.write_char(c)?,
        }
    }
    out.write_char('"')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory;

    #[test]
    fn primitive_forms() {
        assert_eq!(value_to_string(&factory::integer(-6)), "-6");
        assert_eq!(value_to_string(&factory::boolean(true)), "true");
        assert_eq!(
            value_to_string(&factory::rational(2, 4).unwrap()),
            "1r2"
        );
        assert_eq!(
            value_to_string(&factory::rational(-3, 9).unwrap()),
            "-1r3"
        );
        assert_eq!(
            value_to_string(&factory::real_from_str("4.875329280939582").unwrap()),
            "4.875329280939582"
        );
        // whole reals keep a fraction so they read back as reals
        assert_eq!(value_to_string(&factory::real_from_str("5").unwrap()), "5.0");
    }

    #[test]
    fn string_escapes_are_shortest_well_formed() {
        let text = "a\"b\\c\nd<e>f\u{1}";
        assert_eq!(
            value_to_string(&factory::string(text)),
            "\"a\\\"b\\\\c\\nd\\<e\\>f\\a01\""
        );
        assert_eq!(value_to_string(&factory::string("")), "\"\"");
        // DEL and the C1 range are control characters too
        assert_eq!(
            value_to_string(&factory::string("x\u{7f}y\u{85}")),
            "\"x\\a7fy\\a85\""
        );
    }

    #[test]
    fn container_forms() {
        assert_eq!(value_to_string(&factory::list(vec![])), "[]");
        assert_eq!(
            value_to_string(&factory::list(vec![factory::integer(1), factory::integer(2)])),
            "[1,2]"
        );
        assert_eq!(
            value_to_string(&factory::tuple(vec![
                factory::integer(1),
                factory::string("x")
            ])),
            "<1,\"x\">"
        );
        assert_eq!(
            value_to_string(&factory::set(vec![factory::integer(7)])),
            "{7}"
        );
        assert_eq!(
            value_to_string(&factory::map(vec![(
                factory::integer(2),
                factory::string("b")
            )])),
            "(2:\"b\")"
        );
        assert_eq!(value_to_string(&factory::map(vec![])), "()");
    }

    #[test]
    fn term_forms() {
        assert_eq!(
            value_to_string(&factory::node("point", vec![factory::integer(1)])),
            "point(1)"
        );
        // keyword parameters print inline, sorted by label
        let tagged = factory::node_with_keywords(
            "point",
            vec![factory::integer(1)],
            vec![
                ("y".to_string(), factory::integer(3)),
                ("x".to_string(), factory::integer(2)),
            ],
        );
        assert_eq!(value_to_string(&tagged), "point(1,x=2,y=3)");
        // names that are not identifiers print quoted
        assert_eq!(
            value_to_string(&factory::node("59", vec![factory::boolean(false)])),
            "\"59\"(false)"
        );
    }

    #[test]
    fn equal_containers_print_identically() {
        let a = factory::set(vec![
            factory::integer(1),
            factory::integer(2),
            factory::integer(3),
        ]);
        let b = factory::set(vec![
            factory::integer(3),
            factory::integer(1),
            factory::integer(2),
        ]);
        assert_eq!(value_to_string(&a), value_to_string(&b));
    }

    #[test]
    fn display_matches_the_writer() {
        let value = factory::node("f", vec![factory::integer(1)]);
        assert_eq!(format!("{}", value), value_to_string(&value));
    }
}
