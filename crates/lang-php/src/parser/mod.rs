//! Declaration-level reader for PHP files.
//!
//! Only what discovery needs is recognized: namespaces, imports, class-like
//! declarations with their supertypes, attributes on classes and methods,
//! and the schema properties of persistence models. Function bodies and
//! initializers outside of those are skipped by bracket balancing.

mod scope;
mod values;

use crate::error::{ParseError, Result};
use crate::lexer::{Spanned, Token, tokenize};
use markscope_api::{
    ClassDescriptor, ClassKind, ClassName, MarkerInstance, MarkerValue, MethodDescriptor,
    ModelSchema, Visibility,
};
use scope::Scope;
use std::collections::BTreeMap;
use std::path::Path;

const DEFAULT_SOFT_DELETE_COLUMN: &str = "deleted_at";
const SOFT_DELETES_TRAIT: &str = "SoftDeletes";

/// Read every class, interface, trait and enum declared in `source`.
pub fn parse_declarations(source: &str, path: &Path) -> Result<Vec<ClassDescriptor>> {
    let tokens = tokenize(source)?;
    let mut parser = Parser::new(&tokens);
    let mut classes = parser.parse_file()?;
    for class in &mut classes {
        class.path = Some(path.to_path_buf());
    }
    Ok(classes)
}

#[derive(Debug, Default, Clone, Copy)]
struct Modifiers {
    is_abstract: bool,
    is_static: bool,
    visibility: Option<Visibility>,
}

/// Per-declaration state collected while walking a class body.
#[derive(Default)]
struct BodyState {
    methods: Vec<MethodDescriptor>,
    traits: Vec<ClassName>,
    constants: BTreeMap<String, MarkerValue>,
    fillable: Option<MarkerValue>,
    casts_property: Option<MarkerValue>,
    casts_method: Option<MarkerValue>,
}

pub(crate) struct Parser<'t> {
    tokens: &'t [Spanned],
    pos: usize,
    scope: Scope,
    /// Name and parent of the declaration being read, for `self::class`.
    current: Option<(ClassName, Option<ClassName>)>,
}

impl<'t> Parser<'t> {
    fn new(tokens: &'t [Spanned]) -> Self {
        Self {
            tokens,
            pos: 0,
            scope: Scope::default(),
            current: None,
        }
    }

    // cursor

    pub(crate) fn peek(&self) -> Option<&'t Token> {
        self.peek_at(0)
    }

    pub(crate) fn peek_at(&self, offset: usize) -> Option<&'t Token> {
        self.tokens.get(self.pos + offset).map(|s| &s.token)
    }

    pub(crate) fn advance(&mut self) -> Option<&'t Token> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    pub(crate) fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(0, |s| s.line)
    }

    fn previous(&self) -> Option<&'t Token> {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|s| &s.token)
    }

    pub(crate) fn eat_punct(&mut self, c: char) -> bool {
        if self.peek().is_some_and(|t| t.is_punct(c)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub(crate) fn expect_punct(&mut self, c: char, expected: &'static str) -> Result<()> {
        if self.eat_punct(c) {
            Ok(())
        } else if self.peek().is_none() {
            Err(ParseError::UnexpectedEof(expected))
        } else {
            Err(ParseError::Expected {
                expected,
                line: self.line(),
            })
        }
    }

    pub(crate) fn expect_name(&mut self, expected: &'static str) -> Result<&'t str> {
        match self.advance() {
            Some(Token::Name(name)) => Ok(name),
            Some(_) => Err(ParseError::Expected {
                expected,
                line: self.line(),
            }),
            None => Err(ParseError::UnexpectedEof(expected)),
        }
    }

    /// Skip a bracketed group starting at the current opener, inclusive.
    pub(crate) fn skip_group(&mut self, what: &'static str) -> Result<()> {
        let mut depth = 0usize;
        while let Some(token) = self.advance() {
            match token {
                Token::AttrOpen | Token::Punct('(' | '[' | '{') => depth += 1,
                Token::Punct(')' | ']' | '}') => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return Ok(());
                    }
                }
                _ => {}
            }
        }
        Err(ParseError::UnexpectedEof(what))
    }

    /// Skip to the end of the current statement (`;` at depth zero).
    fn skip_statement(&mut self) -> Result<()> {
        while let Some(token) = self.peek() {
            match token {
                Token::Punct(';') => {
                    self.pos += 1;
                    return Ok(());
                }
                Token::AttrOpen | Token::Punct('(' | '[' | '{') => self.skip_group("statement")?,
                _ => self.pos += 1,
            }
        }
        Ok(())
    }

    // file level

    fn parse_file(&mut self) -> Result<Vec<ClassDescriptor>> {
        let mut classes = Vec::new();
        let mut markers = Vec::new();
        let mut modifiers = Modifiers::default();

        while let Some(token) = self.peek() {
            match token {
                Token::AttrOpen => {
                    let group = self.parse_attribute_group()?;
                    markers.extend(group);
                    continue;
                }
                Token::Name(name) if name.eq_ignore_ascii_case("namespace") => {
                    self.pos += 1;
                    self.parse_namespace()?;
                }
                Token::Name(name)
                    if name.eq_ignore_ascii_case("use") && !self.peek_at(1).is_some_and(|t| t.is_punct('(')) =>
                {
                    self.pos += 1;
                    self.parse_imports()?;
                }
                Token::Name(name) if name.eq_ignore_ascii_case("abstract") => {
                    self.pos += 1;
                    modifiers.is_abstract = true;
                    continue;
                }
                Token::Name(name)
                    if name.eq_ignore_ascii_case("final") || name.eq_ignore_ascii_case("readonly") =>
                {
                    self.pos += 1;
                    continue;
                }
                Token::Name(name) if self.starts_declaration(name) => {
                    let kind = declaration_kind(name, modifiers.is_abstract);
                    self.pos += 1;
                    let class = self.parse_declaration(kind, std::mem::take(&mut markers))?;
                    classes.push(class);
                }
                Token::Name(name) if name.eq_ignore_ascii_case("function") => {
                    self.pos += 1;
                    self.skip_function()?;
                }
                _ => {
                    self.pos += 1;
                }
            }
            markers.clear();
            modifiers = Modifiers::default();
        }

        Ok(classes)
    }

    /// `class` after `::` or `new` is not a declaration.
    fn starts_declaration(&self, keyword: &str) -> bool {
        let is_keyword = ["class", "interface", "trait", "enum"]
            .iter()
            .any(|k| keyword.eq_ignore_ascii_case(k));
        if !is_keyword || !matches!(self.peek_at(1), Some(Token::Name(_))) {
            return false;
        }
        !matches!(self.previous(), Some(Token::DoubleColon))
            && !self.previous().is_some_and(|t| t.is_name("new"))
    }

    fn parse_namespace(&mut self) -> Result<()> {
        match self.peek() {
            Some(Token::Name(name)) => {
                self.scope.enter_namespace(Some(name));
                self.pos += 1;
            }
            _ => self.scope.enter_namespace(None),
        }
        // braced namespaces: the block contents are read by the file loop
        if !self.eat_punct('{') {
            self.eat_punct(';');
        }
        Ok(())
    }

    fn parse_imports(&mut self) -> Result<()> {
        if self
            .peek()
            .is_some_and(|t| t.is_name("function") || t.is_name("const"))
        {
            return self.skip_statement();
        }

        loop {
            let prefix = self.expect_name("imported name")?;
            if self.peek().is_some_and(|t| t.is_punct('{')) {
                self.pos += 1;
                self.parse_group_import(prefix)?;
            } else {
                let alias = self.parse_alias()?;
                self.scope.import(ClassName::new(prefix), alias);
            }

            if self.eat_punct(',') {
                continue;
            }
            return self.expect_punct(';', "`;` after import");
        }
    }

    fn parse_group_import(&mut self, prefix: &str) -> Result<()> {
        let prefix = ClassName::new(prefix.trim_end_matches('\\'));
        loop {
            if self.eat_punct('}') {
                return Ok(());
            }
            let skip = self
                .peek()
                .is_some_and(|t| t.is_name("function") || t.is_name("const"));
            if skip {
                self.pos += 1;
            }
            let name = self.expect_name("grouped import")?;
            let alias = self.parse_alias()?;
            if !skip {
                self.scope.import(prefix.join(name), alias);
            }
            self.eat_punct(',');
        }
    }

    fn parse_alias(&mut self) -> Result<Option<&'t str>> {
        if self.peek().is_some_and(|t| t.is_name("as")) {
            self.pos += 1;
            return self.expect_name("import alias").map(Some);
        }
        Ok(None)
    }

    /// Skip a function signature and its body.
    fn skip_function(&mut self) -> Result<()> {
        while let Some(token) = self.peek() {
            match token {
                Token::Punct('{') => return self.skip_group("function body"),
                Token::Punct(';') => {
                    self.pos += 1;
                    return Ok(());
                }
                Token::AttrOpen | Token::Punct('(' | '[') => self.skip_group("function signature")?,
                _ => self.pos += 1,
            }
        }
        Ok(())
    }

    // attributes

    /// `#[A, B(x: 1)]`, the opener is the current token.
    fn parse_attribute_group(&mut self) -> Result<Vec<MarkerInstance>> {
        self.pos += 1;
        let mut markers = Vec::new();
        loop {
            if self.eat_punct(']') {
                return Ok(markers);
            }
            let name = self.expect_name("attribute name")?;
            let mut marker = MarkerInstance::new(self.scope.resolve(name));
            if self.peek().is_some_and(|t| t.is_punct('(')) {
                self.pos += 1;
                marker.arguments = self.parse_arguments()?;
            }
            markers.push(marker);
            self.eat_punct(',');
        }
    }

    // declarations

    fn parse_declaration(
        &mut self,
        kind: ClassKind,
        markers: Vec<MarkerInstance>,
    ) -> Result<ClassDescriptor> {
        let short = self.expect_name("declaration name")?;
        let mut class = ClassDescriptor::new(self.scope.declare(short), kind);
        class.markers = markers;

        // enum backing type
        if kind == ClassKind::Enum && self.eat_punct(':') {
            self.expect_name("enum backing type")?;
        }

        while let Some(Token::Name(keyword)) = self.peek() {
            if keyword.eq_ignore_ascii_case("extends") {
                self.pos += 1;
                let supertypes = self.parse_name_list()?;
                if kind == ClassKind::Interface {
                    class.interfaces.extend(supertypes);
                } else {
                    class.parent = supertypes.into_iter().next();
                }
            } else if keyword.eq_ignore_ascii_case("implements") {
                self.pos += 1;
                class.interfaces.extend(self.parse_name_list()?);
            } else {
                return Err(ParseError::Expected {
                    expected: "`{` after declaration header",
                    line: self.line(),
                });
            }
        }

        self.current = Some((class.name.clone(), class.parent.clone()));
        self.expect_punct('{', "declaration body")?;
        let body = self.parse_body()?;
        self.current = None;

        class.model = body.model_schema();
        class.traits = body.traits;
        class.methods = body.methods;
        Ok(class)
    }

    fn parse_name_list(&mut self) -> Result<Vec<ClassName>> {
        let mut names = Vec::new();
        loop {
            let name = self.expect_name("type name")?;
            names.push(self.scope.resolve(name));
            if !self.eat_punct(',') {
                return Ok(names);
            }
        }
    }

    fn parse_body(&mut self) -> Result<BodyState> {
        let mut body = BodyState::default();
        let mut markers = Vec::new();
        let mut modifiers = Modifiers::default();

        loop {
            let Some(token) = self.peek() else {
                return Err(ParseError::UnexpectedEof("declaration body"));
            };

            match token {
                Token::Punct('}') => {
                    self.pos += 1;
                    return Ok(body);
                }
                Token::AttrOpen => {
                    let group = self.parse_attribute_group()?;
                    markers.extend(group);
                    continue;
                }
                Token::Name(word) => {
                    let word = word.to_ascii_lowercase();
                    match word.as_str() {
                        "public" | "protected" | "private" => {
                            self.pos += 1;
                            modifiers.visibility = Some(visibility(&word));
                            continue;
                        }
                        "static" => {
                            self.pos += 1;
                            modifiers.is_static = true;
                            continue;
                        }
                        "abstract" | "final" | "readonly" | "var" => {
                            self.pos += 1;
                            continue;
                        }
                        "use" => {
                            self.pos += 1;
                            self.parse_trait_uses(&mut body)?;
                        }
                        "const" => {
                            self.pos += 1;
                            self.parse_constants(&mut body)?;
                        }
                        "case" => {
                            self.pos += 1;
                            self.skip_statement()?;
                        }
                        "function" => {
                            self.pos += 1;
                            let method = self.parse_method(modifiers, std::mem::take(&mut markers), &mut body)?;
                            body.methods.push(method);
                        }
                        // property types
                        _ => {
                            self.pos += 1;
                            continue;
                        }
                    }
                }
                Token::Variable(_) => self.parse_properties(&mut body)?,
                Token::Punct('?' | '|' | '&' | '(' | ')') => {
                    self.pos += 1;
                    continue;
                }
                _ => {
                    return Err(ParseError::Expected {
                        expected: "class member",
                        line: self.line(),
                    });
                }
            }

            markers.clear();
            modifiers = Modifiers::default();
        }
    }

    fn parse_trait_uses(&mut self, body: &mut BodyState) -> Result<()> {
        body.traits.extend(self.parse_name_list()?);
        if self.peek().is_some_and(|t| t.is_punct('{')) {
            return self.skip_group("trait adaptations");
        }
        self.expect_punct(';', "`;` after trait use")
    }

    fn parse_constants(&mut self, body: &mut BodyState) -> Result<()> {
        loop {
            // an optional type precedes the constant name
            let mut name = self.expect_name("constant name")?;
            while let Some(Token::Name(next)) = self.peek() {
                self.pos += 1;
                name = next;
            }
            self.expect_punct('=', "`=` in constant")?;
            let value = self.parse_value()?;
            body.constants.insert(name.to_string(), value);

            if !self.eat_punct(',') {
                return self.expect_punct(';', "`;` after constant");
            }
        }
    }

    fn parse_properties(&mut self, body: &mut BodyState) -> Result<()> {
        loop {
            let Some(Token::Variable(name)) = self.advance() else {
                return Err(ParseError::Expected {
                    expected: "property name",
                    line: self.line(),
                });
            };
            let value = if self.eat_punct('=') {
                Some(self.parse_value()?)
            } else {
                None
            };

            match name.as_str() {
                "fillable" => body.fillable = Some(value.unwrap_or(MarkerValue::Null)),
                "casts" => body.casts_property = Some(value.unwrap_or(MarkerValue::Null)),
                _ => {}
            }

            if !self.eat_punct(',') {
                break;
            }
        }

        // property hooks
        if self.peek().is_some_and(|t| t.is_punct('{')) {
            return self.skip_group("property hooks");
        }
        self.expect_punct(';', "`;` after property")
    }

    fn parse_method(
        &mut self,
        modifiers: Modifiers,
        markers: Vec<MarkerInstance>,
        body: &mut BodyState,
    ) -> Result<MethodDescriptor> {
        self.eat_punct('&');
        let name = self.expect_name("method name")?.to_string();

        if !self.peek().is_some_and(|t| t.is_punct('(')) {
            return Err(ParseError::Expected {
                expected: "`(` after method name",
                line: self.line(),
            });
        }
        self.skip_group("parameter list")?;

        // return type
        while let Some(token) = self.peek() {
            if token.is_punct('{') || token.is_punct(';') {
                break;
            }
            self.pos += 1;
        }

        if self.eat_punct(';') {
            // abstract or interface method
        } else if name.eq_ignore_ascii_case("casts") {
            body.casts_method = self.parse_returned_value()?;
        } else {
            self.skip_group("method body")?;
        }

        Ok(MethodDescriptor {
            name,
            visibility: modifiers.visibility.unwrap_or(Visibility::Public),
            is_static: modifiers.is_static,
            markers,
        })
    }

    /// Read a method body, keeping the value of its first top-level `return`.
    fn parse_returned_value(&mut self) -> Result<Option<MarkerValue>> {
        self.expect_punct('{', "method body")?;
        let mut returned = None;
        loop {
            match self.peek() {
                None => return Err(ParseError::UnexpectedEof("method body")),
                Some(Token::Punct('}')) => {
                    self.pos += 1;
                    return Ok(returned);
                }
                Some(token) if returned.is_none() && token.is_name("return") => {
                    self.pos += 1;
                    returned = Some(self.parse_value()?);
                }
                Some(Token::AttrOpen | Token::Punct('(' | '[' | '{')) => {
                    self.skip_group("method body")?;
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    pub(crate) fn current_class(&self) -> Option<&ClassName> {
        self.current.as_ref().map(|(name, _)| name)
    }

    pub(crate) fn current_parent(&self) -> Option<&ClassName> {
        self.current.as_ref().and_then(|(_, parent)| parent.as_ref())
    }
}

impl BodyState {
    fn model_schema(&self) -> Option<ModelSchema> {
        let soft_deletes = self
            .traits
            .iter()
            .any(|t| t.short_name() == SOFT_DELETES_TRAIT);

        let deleted_at = self
            .constants
            .get("DELETED_AT")
            .and_then(MarkerValue::as_str)
            .map(str::to_string);

        if self.fillable.is_none()
            && self.casts_property.is_none()
            && self.casts_method.is_none()
            && !soft_deletes
            && deleted_at.is_none()
        {
            return None;
        }

        let fillable = self
            .fillable
            .as_ref()
            .and_then(MarkerValue::as_string_list)
            .unwrap_or_default();

        let mut casts = BTreeMap::new();
        for source in [&self.casts_property, &self.casts_method].into_iter().flatten() {
            if let Some(map) = source.as_string_map() {
                casts.extend(map);
            }
        }

        let soft_delete_column = soft_deletes.then(|| {
            deleted_at
                .clone()
                .unwrap_or_else(|| DEFAULT_SOFT_DELETE_COLUMN.to_string())
        });

        Some(ModelSchema {
            fillable,
            casts,
            soft_delete_column,
            deleted_at,
        })
    }
}

fn declaration_kind(keyword: &str, is_abstract: bool) -> ClassKind {
    match keyword.to_ascii_lowercase().as_str() {
        "interface" => ClassKind::Interface,
        "trait" => ClassKind::Trait,
        "enum" => ClassKind::Enum,
        _ if is_abstract => ClassKind::AbstractClass,
        _ => ClassKind::Class,
    }
}

fn visibility(word: &str) -> Visibility {
    match word {
        "protected" => Visibility::Protected,
        "private" => Visibility::Private,
        _ => Visibility::Public,
    }
}
