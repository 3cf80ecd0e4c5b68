//! Token stream over PHP source, precise enough for declaration-level reading.
//!
//! Strings are unescaped, comments and inline HTML are dropped, and
//! qualified names (`Foo\Bar`) come out as a single token.

use crate::error::{ParseError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Identifiers, keywords and qualified names.
    Name(String),
    /// `$name`, without the sigil.
    Variable(String),
    Str(String),
    Number(String),
    /// `#[`
    AttrOpen,
    /// `=>`
    DoubleArrow,
    /// `::`
    DoubleColon,
    /// `->` and `?->`
    ObjectOp,
    /// `...`
    Ellipsis,
    Punct(char),
}

impl Token {
    pub fn is_name(&self, expected: &str) -> bool {
        matches!(self, Token::Name(n) if n.eq_ignore_ascii_case(expected))
    }

    pub fn is_punct(&self, expected: char) -> bool {
        matches!(self, Token::Punct(c) if *c == expected)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub line: usize,
}

pub fn tokenize(source: &str) -> Result<Vec<Spanned>> {
    Lexer::new(source).run()
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    tokens: Vec<Spanned>,
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '\\' || !c.is_ascii()
}

fn is_name_part(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '\\' || !c.is_ascii()
}

impl Lexer {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            tokens: Vec::new(),
        }
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn starts_with(&self, pattern: &str) -> bool {
        pattern
            .chars()
            .enumerate()
            .all(|(i, c)| self.peek(i).is_some_and(|p| p.eq_ignore_ascii_case(&c)))
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek(0)?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn push(&mut self, token: Token, line: usize) {
        self.tokens.push(Spanned { token, line });
    }

    fn run(mut self) -> Result<Vec<Spanned>> {
        self.skip_inline_html();

        while let Some(c) = self.peek(0) {
            let line = self.line;

            if c.is_whitespace() {
                self.bump();
            } else if self.starts_with("?>") {
                self.pos += 2;
                self.skip_inline_html();
            } else if self.starts_with("#[") {
                self.pos += 2;
                self.push(Token::AttrOpen, line);
            } else if c == '#' || self.starts_with("//") {
                self.skip_line_comment();
            } else if self.starts_with("/*") {
                self.skip_block_comment()?;
            } else if c == '\'' {
                let s = self.single_quoted()?;
                self.push(Token::Str(s), line);
            } else if c == '"' || c == '`' {
                let s = self.double_quoted(c)?;
                self.push(Token::Str(s), line);
            } else if self.starts_with("<<<") {
                let s = self.heredoc()?;
                self.push(Token::Str(s), line);
            } else if c == '$' && self.peek(1).is_some_and(|n| is_name_start(n) && n != '\\') {
                self.bump();
                let name = self.take_while(is_name_part);
                self.push(Token::Variable(name), line);
            } else if c.is_ascii_digit() || (c == '.' && self.peek(1).is_some_and(|n| n.is_ascii_digit())) {
                let number = self.take_while(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
                self.push(Token::Number(number), line);
            } else if is_name_start(c) {
                let name = self.take_while(is_name_part);
                self.push(Token::Name(name), line);
            } else if self.starts_with("=>") {
                self.pos += 2;
                self.push(Token::DoubleArrow, line);
            } else if self.starts_with("::") {
                self.pos += 2;
                self.push(Token::DoubleColon, line);
            } else if self.starts_with("?->") {
                self.pos += 3;
                self.push(Token::ObjectOp, line);
            } else if self.starts_with("->") {
                self.pos += 2;
                self.push(Token::ObjectOp, line);
            } else if self.starts_with("...") {
                self.pos += 3;
                self.push(Token::Ellipsis, line);
            } else {
                self.bump();
                self.push(Token::Punct(c), line);
            }
        }

        Ok(self.tokens)
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek(0) {
            if !pred(c) {
                break;
            }
            out.push(c);
            self.bump();
        }
        out
    }

    /// Skip everything up to and including the next `<?php` / `<?=` open tag.
    fn skip_inline_html(&mut self) {
        while self.peek(0).is_some() {
            if self.starts_with("<?php") {
                self.pos += 5;
                return;
            }
            if self.starts_with("<?=") {
                self.pos += 3;
                return;
            }
            self.bump();
        }
    }

    fn skip_line_comment(&mut self) {
        while let Some(c) = self.peek(0) {
            if c == '\n' || self.starts_with("?>") {
                return;
            }
            self.bump();
        }
    }

    fn skip_block_comment(&mut self) -> Result<()> {
        let line = self.line;
        self.pos += 2;
        while self.peek(0).is_some() {
            if self.starts_with("*/") {
                self.pos += 2;
                return Ok(());
            }
            self.bump();
        }
        Err(ParseError::Unterminated {
            what: "comment",
            line,
        })
    }

    fn single_quoted(&mut self) -> Result<String> {
        let line = self.line;
        self.bump();
        let mut out = String::new();
        while let Some(c) = self.bump() {
            match c {
                '\'' => return Ok(out),
                '\\' => match self.peek(0) {
                    Some(next @ ('\\' | '\'')) => {
                        self.bump();
                        out.push(next);
                    }
                    _ => out.push('\\'),
                },
                _ => out.push(c),
            }
        }
        Err(ParseError::Unterminated {
            what: "string",
            line,
        })
    }

    fn double_quoted(&mut self, quote: char) -> Result<String> {
        let line = self.line;
        self.bump();
        let mut out = String::new();
        while let Some(c) = self.bump() {
            if c == quote {
                return Ok(out);
            }
            if c != '\\' {
                out.push(c);
                continue;
            }
            match self.bump() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some('0') => out.push('\0'),
                Some(e @ ('\\' | '$' | '"' | '`')) => out.push(e),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => break,
            }
        }
        Err(ParseError::Unterminated {
            what: "string",
            line,
        })
    }

    /// Heredoc and nowdoc bodies are returned verbatim.
    fn heredoc(&mut self) -> Result<String> {
        let line = self.line;
        self.pos += 3;
        self.take_while(|c| c == ' ' || c == '\t');
        let quoted = matches!(self.peek(0), Some('\'' | '"'));
        if quoted {
            self.bump();
        }
        let label = self.take_while(|c| c.is_ascii_alphanumeric() || c == '_');
        if quoted {
            self.bump();
        }
        if label.is_empty() {
            return Err(ParseError::Expected {
                expected: "heredoc label",
                line,
            });
        }

        let mut body = String::new();
        let mut at_line_start = false;
        while self.peek(0).is_some() {
            if at_line_start {
                let indent = self.take_while(|c| c == ' ' || c == '\t');
                let closes = self.starts_with(&label)
                    && !self.peek(label.len()).is_some_and(|c| c.is_ascii_alphanumeric() || c == '_');
                if closes {
                    self.pos += label.len();
                    if body.ends_with('\n') {
                        body.pop();
                    }
                    return Ok(body);
                }
                body.push_str(&indent);
            }
            let Some(c) = self.bump() else { break };
            at_line_start = c == '\n';
            body.push(c);
        }

        Err(ParseError::Unterminated {
            what: "heredoc",
            line,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(src: &str) -> Vec<Token> {
        tokenize(src).unwrap().into_iter().map(|s| s.token).collect()
    }

    #[test]
    fn test_skips_comments_and_open_tag() {
        let toks = tokens("<?php // hello\n# note\n/* block */ namespace App\\Foo;");
        assert_eq!(
            toks,
            vec![
                Token::Name("namespace".into()),
                Token::Name("App\\Foo".into()),
                Token::Punct(';')
            ]
        );
    }

    #[test]
    fn test_attribute_open_is_not_a_comment() {
        let toks = tokens("<?php #[AsPolicy(model: Invoice::class)]");
        assert_eq!(toks[0], Token::AttrOpen);
        assert_eq!(toks[1], Token::Name("AsPolicy".into()));
        assert!(toks.contains(&Token::DoubleColon));
    }

    #[test]
    fn test_string_escapes() {
        let toks = tokens(r#"<?php 'it\'s \\ \n' "a\tb \$x \q""#);
        assert_eq!(toks[0], Token::Str("it's \\ \\n".into()));
        assert_eq!(toks[1], Token::Str("a\tb $x \\q".into()));
    }

    #[test]
    fn test_operators_and_variables() {
        let toks = tokens("<?php $a => $b::c->d ?-> ...");
        assert_eq!(
            toks,
            vec![
                Token::Variable("a".into()),
                Token::DoubleArrow,
                Token::Variable("b".into()),
                Token::DoubleColon,
                Token::Name("c".into()),
                Token::ObjectOp,
                Token::Name("d".into()),
                Token::ObjectOp,
                Token::Ellipsis,
            ]
        );
    }

    #[test]
    fn test_heredoc_body() {
        let toks = tokens("<?php $x = <<<SQL\n  select 1\n  SQL;\n$y;");
        assert_eq!(toks[2], Token::Str("  select 1".into()));
        assert_eq!(toks[3], Token::Punct(';'));
        assert_eq!(toks[4], Token::Variable("y".into()));
    }

    #[test]
    fn test_inline_html_is_dropped() {
        let toks = tokens("<h1>Title</h1><?php echo 1; ?><p>x</p>");
        assert_eq!(
            toks,
            vec![
                Token::Name("echo".into()),
                Token::Number("1".into()),
                Token::Punct(';')
            ]
        );
    }

    #[test]
    fn test_unterminated_string() {
        let err = tokenize("<?php\n'abc").unwrap_err();
        assert_eq!(
            err,
            ParseError::Unterminated {
                what: "string",
                line: 2
            }
        );
    }

    #[test]
    fn test_line_numbers() {
        let spanned = tokenize("<?php\n\nclass Foo {}").unwrap();
        assert_eq!(spanned[0].line, 3);
    }
}
