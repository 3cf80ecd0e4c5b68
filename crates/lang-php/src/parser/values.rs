//! Constant expressions: attribute arguments, property defaults, returned arrays.

use super::Parser;
use crate::error::{ParseError, Result};
use crate::lexer::Token;
use markscope_api::{ArrayEntry, ClassName, MarkerArgument, MarkerValue};

impl<'t> Parser<'t> {
    /// Argument list after its `(`, up to and including the closing `)`.
    pub(crate) fn parse_arguments(&mut self) -> Result<Vec<MarkerArgument>> {
        let mut arguments = Vec::new();
        loop {
            if self.eat_punct(')') {
                return Ok(arguments);
            }
            if self.peek().is_none() {
                return Err(ParseError::UnexpectedEof("argument list"));
            }

            let name = match (self.peek(), self.peek_at(1)) {
                (Some(Token::Name(name)), Some(Token::Punct(':'))) => {
                    self.pos += 2;
                    Some(name.clone())
                }
                _ => None,
            };
            let value = self.parse_value()?;
            arguments.push(MarkerArgument { name, value });

            if !self.eat_punct(',') {
                return self.expect_punct(')', "`)` after argument").map(|_| arguments);
            }
        }
    }

    /// One value, stopping before the next `,` `)` `]` `;` `}` or `=>`.
    pub(crate) fn parse_value(&mut self) -> Result<MarkerValue> {
        let start = self.pos;
        let mut parts = vec![self.parse_primary()?];
        while self.eat_punct('.') {
            parts.push(self.parse_primary()?);
        }

        if !self.at_value_end() {
            return self.raw_expression(start);
        }

        if parts.len() == 1 {
            return Ok(parts.remove(0));
        }
        let joined: Option<String> = parts.iter().map(|p| p.as_str()).collect();
        match joined {
            Some(joined) => Ok(MarkerValue::Str(joined)),
            None => Ok(MarkerValue::Expr(self.render_from(start))),
        }
    }

    fn at_value_end(&self) -> bool {
        match self.peek() {
            None => true,
            Some(Token::DoubleArrow) => true,
            Some(Token::Punct(c)) => matches!(c, ',' | ')' | ']' | ';' | '}'),
            Some(_) => false,
        }
    }

    fn parse_primary(&mut self) -> Result<MarkerValue> {
        let Some(token) = self.peek() else {
            return Err(ParseError::UnexpectedEof("value"));
        };
        if let (Token::Punct('-'), Some(Token::Number(raw))) = (token, self.peek_at(1)) {
            self.pos += 2;
            return Ok(number(raw, true));
        }

        let value = match token {
            Token::Str(s) => {
                self.pos += 1;
                MarkerValue::Str(s.clone())
            }
            Token::Number(raw) => {
                self.pos += 1;
                number(raw, false)
            }
            Token::Punct('[') => {
                self.pos += 1;
                MarkerValue::Array(self.parse_array(']')?)
            }
            Token::Name(name)
                if name.eq_ignore_ascii_case("array")
                    && self.peek_at(1).is_some_and(|t| t.is_punct('(')) =>
            {
                self.pos += 2;
                MarkerValue::Array(self.parse_array(')')?)
            }
            Token::Name(name) if matches!(self.peek_at(1), Some(Token::DoubleColon)) => {
                if self.peek_at(2).is_some_and(|t| t.is_name("class")) {
                    self.pos += 3;
                    MarkerValue::ClassRef(self.resolve_class_ref(name))
                } else {
                    let start = self.pos;
                    self.pos += 3;
                    return Ok(MarkerValue::Expr(self.render_from(start)));
                }
            }
            Token::Name(name) if name.eq_ignore_ascii_case("true") => {
                self.pos += 1;
                MarkerValue::Bool(true)
            }
            Token::Name(name) if name.eq_ignore_ascii_case("false") => {
                self.pos += 1;
                MarkerValue::Bool(false)
            }
            Token::Name(name) if name.eq_ignore_ascii_case("null") => {
                self.pos += 1;
                MarkerValue::Null
            }
            _ => {
                let start = self.pos;
                self.skip_to_value_end()?;
                return Ok(MarkerValue::Expr(self.render_from(start)));
            }
        };
        Ok(value)
    }

    fn parse_array(&mut self, close: char) -> Result<Vec<ArrayEntry>> {
        let mut entries = Vec::new();
        loop {
            if self.eat_punct(close) {
                return Ok(entries);
            }
            if self.peek().is_none() {
                return Err(ParseError::UnexpectedEof("array literal"));
            }

            let first = self.parse_value()?;
            let entry = if matches!(self.peek(), Some(Token::DoubleArrow)) {
                self.pos += 1;
                ArrayEntry {
                    key: Some(first),
                    value: self.parse_value()?,
                }
            } else {
                ArrayEntry {
                    key: None,
                    value: first,
                }
            };
            entries.push(entry);

            if !self.eat_punct(',') {
                self.expect_punct(close, "end of array literal")?;
                return Ok(entries);
            }
        }
    }

    fn resolve_class_ref(&self, name: &str) -> ClassName {
        let lower = name.to_ascii_lowercase();
        let own = match lower.as_str() {
            "self" | "static" => self.current_class(),
            "parent" => self.current_parent(),
            _ => None,
        };
        own.cloned().unwrap_or_else(|| self.scope.resolve(name))
    }

    fn skip_to_value_end(&mut self) -> Result<()> {
        while !self.at_value_end() {
            match self.peek() {
                Some(Token::AttrOpen | Token::Punct('(' | '[' | '{')) => self.skip_group("expression")?,
                Some(_) => self.pos += 1,
                None => break,
            }
        }
        Ok(())
    }

    /// Text of everything from `start` up to the end of the current value.
    fn raw_expression(&mut self, start: usize) -> Result<MarkerValue> {
        self.skip_to_value_end()?;
        Ok(MarkerValue::Expr(self.render_from(start)))
    }

    fn render_from(&self, start: usize) -> String {
        let mut out = String::new();
        let mut previous_word = false;
        for spanned in &self.tokens[start..self.pos] {
            let word = matches!(
                spanned.token,
                Token::Name(_) | Token::Variable(_) | Token::Number(_)
            );
            if word && previous_word {
                out.push(' ');
            }
            previous_word = word;
            out.push_str(&render(&spanned.token));
        }
        out
    }
}

fn number(raw: &str, negative: bool) -> MarkerValue {
    let digits = raw.replace('_', "");
    let sign = if negative { "-" } else { "" };
    if let Ok(int) = format!("{sign}{digits}").parse::<i64>() {
        return MarkerValue::Int(int);
    }
    if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        if let Ok(int) = i64::from_str_radix(hex, 16) {
            return MarkerValue::Int(if negative { -int } else { int });
        }
    }
    match format!("{sign}{digits}").parse::<f64>() {
        Ok(float) => MarkerValue::Float(float),
        Err(_) => MarkerValue::Expr(format!("{sign}{raw}")),
    }
}

fn render(token: &Token) -> String {
    match token {
        Token::Name(name) => name.clone(),
        Token::Variable(name) => format!("${name}"),
        Token::Str(s) => format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
        Token::Number(n) => n.clone(),
        Token::AttrOpen => "#[".to_string(),
        Token::DoubleArrow => " => ".to_string(),
        Token::DoubleColon => "::".to_string(),
        Token::ObjectOp => "->".to_string(),
        Token::Ellipsis => "...".to_string(),
        Token::Punct(',') => ", ".to_string(),
        Token::Punct(c) => c.to_string(),
    }
}
