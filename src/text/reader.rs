// Copyright 2019-2020 PolkaX Authors. Licensed under GPL-3.0.

use std::io;
use std::str::FromStr;
use std::sync::Arc;

use num_bigint::BigInt;

use crate::error::{Result, ValueError};
use crate::factory;
use crate::types::{ConsSignature, Type, TypeStore};
use crate::value::VRef;

/// Parse one value from a stream, validating it against `expected`.
pub fn read<R: io::Read>(store: &TypeStore, expected: &Type, mut input: R) -> Result<VRef> {
    let mut text = String::new();
    input.read_to_string(&mut text)?;
    read_str(store, expected, &text)
}

/// Parse one value from a string, validating it against `expected`.
///
/// Offsets in parse errors count characters from the start of the
/// input. The produced value must be a subtype of `expected`.
pub fn read_str(store: &TypeStore, expected: &Type, input: &str) -> Result<VRef> {
    let mut parser = Parser {
        store,
        chars: input.chars().collect(),
        pos: 0,
    };
    let value = parser.parse_value(expected)?;
    parser.skip_whitespace();
    if parser.pos < parser.chars.len() {
        return Err(parser.error("trailing input after the value"));
    }
    let actual = value.type_of();
    if !actual.is_subtype_of(expected) {
        return Err(ValueError::Type {
            expected: expected.clone(),
            actual,
        });
    }
    Ok(value)
}

/// Single-pass scanner over the input characters. Whitespace is
/// insignificant everywhere except inside string literals.
struct Parser<'a> {
    store: &'a TypeStore,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn error(&self, message: impl Into<String>) -> ValueError {
        ValueError::Parse {
            offset: self.pos,
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn eat(&mut self, want: char) -> bool {
        if self.peek() == Some(want) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_char(&mut self, want: char) -> Result<()> {
        if self.eat(want) {
            Ok(())
        } else {
            Err(self.error(format!("expected `{}`", want)))
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().map_or(false, char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn parse_value(&mut self, expected: &Type) -> Result<VRef> {
        self.skip_whitespace();
        match self.peek() {
            None => Err(self.error("expected a value, found end of input")),
            Some('[') => self.parse_list(expected),
            Some('{') => self.parse_set(expected),
            Some('<') => self.parse_tuple(expected),
            Some('(') => self.parse_map(expected),
            Some('"') => self.parse_string_or_term(expected),
            Some('$') => self.parse_datetime(),
            Some('|') => self.parse_location(),
            Some(c) if c == '-' || c.is_ascii_digit() => self.parse_number(),
            Some(c) if is_identifier_start(c) => self.parse_identifier(expected),
            Some(c) => Err(self.error(format!("unexpected character `{}`", c))),
        }
    }

    fn parse_list(&mut self, expected: &Type) -> Result<VRef> {
        let element = match expected {
            Type::List(t) => (**t).clone(),
            _ => Type::Value,
        };
        self.expect_char('[')?;
        let mut items = Vec::new();
        self.skip_whitespace();
        if !self.eat(']') {
            loop {
                items.push(self.parse_value(&element)?);
                self.skip_whitespace();
                if self.eat(',') {
                    continue;
                }
                self.expect_char(']')?;
                break;
            }
        }
        Ok(factory::list(items))
    }

    fn parse_set(&mut self, expected: &Type) -> Result<VRef> {
        let element = match expected {
            Type::Set(t) => (**t).clone(),
            _ => Type::Value,
        };
        self.expect_char('{')?;
        let mut items = Vec::new();
        self.skip_whitespace();
        if !self.eat('}') {
            loop {
                items.push(self.parse_value(&element)?);
                self.skip_whitespace();
                if self.eat(',') {
                    continue;
                }
                self.expect_char('}')?;
                break;
            }
        }
        Ok(factory::set(items))
    }

    fn parse_tuple(&mut self, expected: &Type) -> Result<VRef> {
        let fields = match expected {
            Type::Tuple(fields) => Some(fields.clone()),
            _ => None,
        };
        self.expect_char('<')?;
        let mut items = Vec::new();
        self.skip_whitespace();
        if !self.eat('>') {
            loop {
                let element = fields
                    .as_ref()
                    .and_then(|fields| fields.get(items.len()))
                    .map(|field| field.ty.clone())
                    .unwrap_or(Type::Value);
                items.push(self.parse_value(&element)?);
                self.skip_whitespace();
                if self.eat(',') {
                    continue;
                }
                self.expect_char('>')?;
                break;
            }
        }
        Ok(factory::tuple(items))
    }

    fn parse_map(&mut self, expected: &Type) -> Result<VRef> {
        let (key_type, value_type) = match expected {
            Type::Map(k, v) => ((**k).clone(), (**v).clone()),
            _ => (Type::Value, Type::Value),
        };
        self.expect_char('(')?;
        let mut entries = Vec::new();
        self.skip_whitespace();
        if !self.eat(')') {
            loop {
                let key = self.parse_value(&key_type)?;
                self.skip_whitespace();
                self.expect_char(':')?;
                let value = self.parse_value(&value_type)?;
                entries.push((key, value));
                self.skip_whitespace();
                if self.eat(',') {
                    continue;
                }
                self.expect_char(')')?;
                break;
            }
        }
        Ok(factory::map(entries))
    }

    fn parse_identifier(&mut self, expected: &Type) -> Result<VRef> {
        let name = self.scan_identifier();
        match name.as_str() {
            "true" => Ok(factory::boolean(true)),
            "false" => Ok(factory::boolean(false)),
            _ => {
                self.skip_whitespace();
                if self.peek() == Some('(') {
                    self.parse_term(name, expected)
                } else {
                    Err(self.error(format!("bare identifier `{}` is not a value", name)))
                }
            }
        }
    }

    fn parse_string_or_term(&mut self, expected: &Type) -> Result<VRef> {
        let text = self.parse_string_literal()?;
        let save = self.pos;
        self.skip_whitespace();
        if self.peek() == Some('(') {
            // a quoted name applied to children is a term
            return self.parse_term(text, expected);
        }
        self.pos = save;
        Ok(factory::string(text))
    }

    /// A node or constructor application: positional children, inline
    /// keyword parameters, and the legacy trailing `[@k=v, ...]` block.
    fn parse_term(&mut self, name: String, expected: &Type) -> Result<VRef> {
        let adt_scope: Option<String> = match expected {
            Type::Adt(adt) => Some(adt.clone()),
            Type::Cons(sig) => Some(sig.adt.clone()),
            _ => None,
        };
        // with exactly one declaration in scope, its field types steer
        // the children; otherwise resolution waits until the arity is
        // known
        let sole: Option<Arc<ConsSignature>> = adt_scope.as_ref().and_then(|adt| {
            let matching: Vec<_> = self
                .store
                .constructors(&name)
                .iter()
                .filter(|sig| sig.adt == *adt)
                .collect();
            match matching.as_slice() {
                [sig] => Some((*sig).clone()),
                _ => None,
            }
        });

        self.expect_char('(')?;
        let mut children: Vec<VRef> = Vec::new();
        let mut keywords: Vec<(String, VRef)> = Vec::new();
        self.skip_whitespace();
        if !self.eat(')') {
            loop {
                self.skip_whitespace();
                if let Some(label) = self.try_keyword_label() {
                    let declared = sole
                        .as_ref()
                        .and_then(|sig| sig.keyword_type(&label))
                        .cloned()
                        .unwrap_or(Type::Value);
                    let value = self.parse_value(&declared)?;
                    keywords.push((label, value));
                } else {
                    if !keywords.is_empty() {
                        return Err(self.error("positional child after a keyword parameter"));
                    }
                    let declared = sole
                        .as_ref()
                        .and_then(|sig| sig.fields.get(children.len()))
                        .map(|field| field.ty.clone())
                        .unwrap_or(Type::Value);
                    children.push(self.parse_value(&declared)?);
                }
                self.skip_whitespace();
                if self.eat(',') {
                    continue;
                }
                self.expect_char(')')?;
                break;
            }
        }
        self.parse_annotation_block(&mut keywords, sole.as_ref())?;

        if adt_scope.is_some() {
            let signature =
                self.store
                    .resolve(&name, children.len(), adt_scope.as_deref())?;
            factory::constructor_with_keywords(signature, children, keywords)
        } else {
            Ok(factory::node_with_keywords(name, children, keywords))
        }
    }

    /// An identifier directly followed by `=` is a keyword label.
    fn try_keyword_label(&mut self) -> Option<String> {
        if !self.peek().map_or(false, is_identifier_start) {
            return None;
        }
        let save = self.pos;
        let label = self.scan_identifier();
        self.skip_whitespace();
        if self.eat('=') {
            Some(label)
        } else {
            self.pos = save;
            None
        }
    }

    /// The legacy annotation block `[@k=v, ...]`; accepted on read and
    /// merged into the keyword parameter map.
    fn parse_annotation_block(
        &mut self,
        keywords: &mut Vec<(String, VRef)>,
        sole: Option<&Arc<ConsSignature>>,
    ) -> Result<()> {
        let save = self.pos;
        self.skip_whitespace();
        if !self.eat('[') {
            self.pos = save;
            return Ok(());
        }
        self.skip_whitespace();
        if !self.eat('@') {
            self.pos = save;
            return Ok(());
        }
        loop {
            self.skip_whitespace();
            if !self.peek().map_or(false, is_identifier_start) {
                return Err(self.error("expected an annotation label"));
            }
            let label = self.scan_identifier();
            self.skip_whitespace();
            self.expect_char('=')?;
            let declared = sole
                .and_then(|sig| sig.keyword_type(&label))
                .cloned()
                .unwrap_or(Type::Value);
            let value = self.parse_value(&declared)?;
            keywords.push((label, value));
            self.skip_whitespace();
            if self.eat(',') {
                self.skip_whitespace();
                self.expect_char('@')?;
                continue;
            }
            self.expect_char(']')?;
            return Ok(());
        }
    }

    fn parse_number(&mut self) -> Result<VRef> {
        let mut text = String::new();
        if self.eat('-') {
            text.push('-');
        }
        if !self.peek().map_or(false, |c| c.is_ascii_digit()) {
            return Err(self.error("expected digits"));
        }
        self.scan_digits_into(&mut text);

        // `r` splits numerator and denominator
        if self.eat('r') {
            let mut denominator = String::new();
            if self.peek() == Some('-') && self.peek_at(1).map_or(false, |c| c.is_ascii_digit()) {
                denominator.push('-');
                self.pos += 1;
            }
            self.scan_digits_into(&mut denominator);
            if denominator.is_empty() {
                denominator.push('1');
            }
            let numerator = BigInt::from_str(&text)
                .map_err(|_| self.error("malformed rational numerator"))?;
            let denominator = BigInt::from_str(&denominator)
                .map_err(|_| self.error("malformed rational denominator"))?;
            return factory::rational(numerator, denominator);
        }

        // a fraction or an exponent makes it a real
        let mut is_real = false;
        if self.peek() == Some('.') && self.peek_at(1).map_or(false, |c| c.is_ascii_digit()) {
            is_real = true;
            text.push('.');
            self.pos += 1;
            self.scan_digits_into(&mut text);
        }
        if let Some(e) = self.peek() {
            if e == 'e' || e == 'E' {
                let mut ahead = 1;
                if matches!(self.peek_at(1), Some('+') | Some('-')) {
                    ahead = 2;
                }
                if self.peek_at(ahead).map_or(false, |c| c.is_ascii_digit()) {
                    is_real = true;
                    text.push(e);
                    self.pos += 1;
                    if let Some(sign) = self.peek() {
                        if sign == '+' || sign == '-' {
                            text.push(sign);
                            self.pos += 1;
                        }
                    }
                    self.scan_digits_into(&mut text);
                }
            }
        }
        if is_real {
            factory::real_from_str(&text)
        } else {
            factory::integer_from_str(&text)
        }
    }

    fn parse_datetime(&mut self) -> Result<VRef> {
        self.expect_char('$')?;
        if self.peek() == Some('T') {
            let (hour, minute, second, milli, offset) = self.parse_time_body()?;
            self.expect_char('$')?;
            return factory::time(hour, minute, second, milli, offset);
        }
        let year = self.scan_number::<i32>("year")?;
        self.expect_char('-')?;
        let month = self.scan_number::<u32>("month")?;
        self.expect_char('-')?;
        let day = self.scan_number::<u32>("day")?;
        if self.peek() == Some('T') {
            let (hour, minute, second, milli, offset) = self.parse_time_body()?;
            self.expect_char('$')?;
            factory::datetime(year, month, day, hour, minute, second, milli, offset)
        } else {
            self.expect_char('$')?;
            factory::date(year, month, day)
        }
    }

    fn parse_time_body(&mut self) -> Result<(u32, u32, u32, u32, i32)> {
        self.expect_char('T')?;
        let hour = self.scan_number::<u32>("hour")?;
        self.expect_char(':')?;
        let minute = self.scan_number::<u32>("minute")?;
        self.expect_char(':')?;
        let second = self.scan_number::<u32>("second")?;
        let milli = if self.eat('.') {
            let mut digits = String::new();
            self.scan_digits_into(&mut digits);
            if digits.is_empty() {
                return Err(self.error("expected milliseconds after `.`"));
            }
            // scale to milliseconds: `.2` is 200, `.036` is 36
            while digits.len() < 3 {
                digits.push('0');
            }
            digits.truncate(3);
            digits
                .parse::<u32>()
                .map_err(|_| self.error("malformed milliseconds"))?
        } else {
            0
        };
        let sign = match self.bump() {
            Some('+') => 1,
            Some('-') => -1,
            _ => return Err(self.error("expected a UTC offset sign")),
        };
        let offset_hours = self.scan_fixed_digits(2, "offset hours")?;
        self.eat(':');
        let offset_minutes = self.scan_fixed_digits(2, "offset minutes")?;
        Ok((
            hour,
            minute,
            second,
            milli,
            sign * (offset_hours * 60 + offset_minutes) as i32,
        ))
    }

    fn parse_location(&mut self) -> Result<VRef> {
        self.expect_char('|')?;
        let mut uri = String::new();
        loop {
            match self.bump() {
                Some('|') => break,
                Some(c) if !c.is_control() => uri.push(c),
                Some(_) => return Err(self.error("control character in a source location")),
                None => return Err(self.error("unterminated source location")),
            }
        }
        // the range must follow immediately, or it belongs elsewhere
        if self.peek() != Some('(') {
            return factory::source_location(uri);
        }
        self.pos += 1;
        self.skip_whitespace();
        let offset = self.scan_number::<i64>("offset")?;
        self.skip_whitespace();
        self.expect_char(',')?;
        self.skip_whitespace();
        let length = self.scan_number::<i64>("length")?;
        self.skip_whitespace();
        if !self.eat(',') {
            self.expect_char(')')?;
            return factory::source_location_with_range(uri, offset, length);
        }
        self.skip_whitespace();
        let (begin_line, begin_column) = self.parse_line_column()?;
        self.skip_whitespace();
        self.expect_char(',')?;
        self.skip_whitespace();
        let (end_line, end_column) = self.parse_line_column()?;
        self.skip_whitespace();
        self.expect_char(')')?;
        factory::source_location_with_span(
            uri,
            offset,
            length,
            begin_line,
            begin_column,
            end_line,
            end_column,
        )
    }

    fn parse_line_column(&mut self) -> Result<(i64, i64)> {
        self.expect_char('<')?;
        self.skip_whitespace();
        let line = self.scan_number::<i64>("line")?;
        self.skip_whitespace();
        self.expect_char(',')?;
        self.skip_whitespace();
        let column = self.scan_number::<i64>("column")?;
        self.skip_whitespace();
        self.expect_char('>')?;
        Ok((line, column))
    }

    fn parse_string_literal(&mut self) -> Result<String> {
        self.expect_char('"')?;
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated string literal")),
                Some('"') => return Ok(out),
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('r') => out.push('\r'),
                    Some('f') => out.push('\u{c}'),
                    Some('b') => out.push('\u{8}'),
                    Some('"') => out.push('"'),
                    Some('\\') => out.push('\\'),
                    Some('\'') => out.push('\''),
                    Some('<') => out.push('<'),
                    Some('>') => out.push('>'),
                    Some('a') => out.push(self.scan_escape_code(2)?),
                    Some('u') => out.push(self.scan_escape_code(4)?),
                    Some('U') => out.push(self.scan_escape_code(6)?),
                    Some(c) => return Err(self.error(format!("unknown escape `\\{}`", c))),
                    None => return Err(self.error("unterminated escape")),
                },
                Some(c) => out.push(c),
            }
        }
    }

    fn scan_escape_code(&mut self, digits: usize) -> Result<char> {
        let mut code = 0u32;
        for _ in 0..digits {
            let digit = self
                .bump()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| self.error("expected a hex digit in an escape"))?;
            code = code * 16 + digit;
        }
        std::char::from_u32(code).ok_or_else(|| self.error("escape is not a valid code point"))
    }

    fn scan_identifier(&mut self) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                out.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        out
    }

    fn scan_digits_into(&mut self, out: &mut String) {
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                out.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn scan_number<T: FromStr>(&mut self, what: &str) -> Result<T> {
        let mut digits = String::new();
        self.scan_digits_into(&mut digits);
        if digits.is_empty() {
            return Err(self.error(format!("expected a {}", what)));
        }
        digits
            .parse::<T>()
            .map_err(|_| self.error(format!("{} out of range", what)))
    }

    fn scan_fixed_digits(&mut self, count: usize, what: &str) -> Result<u32> {
        let mut value = 0u32;
        for _ in 0..count {
            let digit = self
                .bump()
                .and_then(|c| c.to_digit(10))
                .ok_or_else(|| self.error(format!("expected a {} digit", what)))?;
            value = value * 10 + digit;
        }
        Ok(value)
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}
