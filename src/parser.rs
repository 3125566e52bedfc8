use std::collections::HashMap;

use tracing::debug;

use crate::lexer::{LexError, Lexer, Spanned, Token};
use crate::model::*;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Lex error: {0}")]
    Lex(#[from] LexError),
    #[error("Unexpected token '{found}' on line {line}, expected {expected}")]
    Unexpected {
        found: Token,
        expected: &'static str,
        line: usize,
    },
    #[error("Unexpected end of input, expected {0}")]
    UnexpectedEof(&'static str),
    #[error("Duplicate table '{name}' on line {line}")]
    DuplicateTable { name: String, line: usize },
    #[error("Invalid reference endpoint '{endpoint}' on line {line}, expected <table>.<column>")]
    InvalidEndpoint { endpoint: String, line: usize },
    #[error("No Table or Ref definitions found")]
    NoDefinitions,
}

/// Parse DBML source into a [`Schema`].
pub fn parse(input: &str) -> Result<Schema, ParseError> {
    Parser::new(input)?.parse()
}

pub struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    aliases: HashMap<String, String>,
}

impl Parser {
    pub fn new(input: &str) -> Result<Self, ParseError> {
        let tokens = Lexer::new(input).tokenize()?;
        Ok(Self {
            tokens,
            pos: 0,
            aliases: HashMap::new(),
        })
    }

    fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> &Token {
        self.tokens
            .get(self.pos + offset)
            .map(|s| &s.token)
            .unwrap_or(&Token::Eof)
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|s| s.line)
            .unwrap_or(1)
    }

    fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        self.pos += 1;
        tok
    }

    fn unexpected(&self, expected: &'static str) -> ParseError {
        match self.peek() {
            Token::Eof => ParseError::UnexpectedEof(expected),
            tok => ParseError::Unexpected {
                found: tok.clone(),
                expected,
                line: self.line(),
            },
        }
    }

    fn expect(&mut self, expected: Token, what: &'static str) -> Result<(), ParseError> {
        if *self.peek() == expected {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(what))
        }
    }

    fn expect_name(&mut self, what: &'static str) -> Result<String, ParseError> {
        match self.peek().clone() {
            Token::Ident(s) | Token::QuotedIdent(s) => {
                self.pos += 1;
                Ok(s)
            }
            _ => Err(self.unexpected(what)),
        }
    }

    fn check_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Token::Ident(s) if s.eq_ignore_ascii_case(keyword))
    }

    fn check_name(&self) -> bool {
        matches!(self.peek(), Token::Ident(_) | Token::QuotedIdent(_))
    }

    pub fn parse(&mut self) -> Result<Schema, ParseError> {
        let mut tables: Vec<Table> = Vec::new();
        let mut relationships = Vec::new();

        while *self.peek() != Token::Eof {
            if self.check_keyword("table") {
                let line = self.line();
                self.advance();
                let (table, inline_refs) = self.parse_table()?;
                if tables.iter().any(|t| t.name == table.name) {
                    return Err(ParseError::DuplicateTable {
                        name: table.name,
                        line,
                    });
                }
                debug!(table = %table.name, columns = table.columns.len(), "parsed table");
                tables.push(table);
                relationships.extend(inline_refs);
            } else if self.check_keyword("ref") {
                self.advance();
                relationships.extend(self.parse_ref()?);
            } else if self.check_keyword("enum")
                || self.check_keyword("project")
                || self.check_keyword("tablegroup")
                || self.check_keyword("note")
            {
                let keyword = self.advance();
                debug!(%keyword, "skipping block");
                self.skip_named_block()?;
            } else {
                return Err(self.unexpected("Table, Ref, Enum, Project, TableGroup or Note"));
            }
        }

        if tables.is_empty() && relationships.is_empty() {
            return Err(ParseError::NoDefinitions);
        }

        for rel in &mut relationships {
            if let Some(real) = self.aliases.get(&rel.from_table) {
                rel.from_table = real.clone();
            }
            if let Some(real) = self.aliases.get(&rel.to_table) {
                rel.to_table = real.clone();
            }
        }

        debug!(
            tables = tables.len(),
            relationships = relationships.len(),
            "parsed schema"
        );

        Ok(Schema {
            tables,
            relationships,
        })
    }

    /// `name` or `schema.name`
    fn parse_qualified_name(&mut self, what: &'static str) -> Result<String, ParseError> {
        let mut name = self.expect_name(what)?;
        while *self.peek() == Token::Dot {
            self.advance();
            name.push('.');
            name.push_str(&self.expect_name(what)?);
        }
        Ok(name)
    }

    fn parse_table(&mut self) -> Result<(Table, Vec<Relationship>), ParseError> {
        let name = self.parse_qualified_name("table name")?;

        if self.check_keyword("as") {
            self.advance();
            let alias = self.expect_name("table alias")?;
            self.aliases.insert(alias, name.clone());
        }

        if *self.peek() == Token::LBracket {
            // Table settings such as headercolor carry nothing for the diagram.
            self.parse_settings(&name, "")?;
        }

        self.expect(Token::LBrace, "'{' after table name")?;

        let mut columns = Vec::new();
        let mut refs = Vec::new();

        while *self.peek() != Token::RBrace {
            if *self.peek() == Token::Eof {
                return Err(ParseError::UnexpectedEof("'}' closing table"));
            }

            if self.check_keyword("indexes") && *self.peek_at(1) == Token::LBrace {
                self.advance();
                self.skip_braced()?;
            } else if self.check_keyword("note") && *self.peek_at(1) == Token::Colon {
                self.advance();
                self.advance();
                match self.peek() {
                    Token::Str(_) => {
                        self.advance();
                    }
                    _ => return Err(self.unexpected("note string")),
                }
            } else if self.check_keyword("note") && *self.peek_at(1) == Token::LBrace {
                self.advance();
                self.skip_braced()?;
            } else {
                let (column, inline) = self.parse_column(&name)?;
                columns.push(column);
                refs.extend(inline);
            }
        }

        self.expect(Token::RBrace, "'}' closing table")?;

        Ok((Table { name, columns }, refs))
    }

    fn parse_column(&mut self, table: &str) -> Result<(Column, Vec<Relationship>), ParseError> {
        let name = self.expect_name("column name")?;
        let typ = self.parse_type()?;

        let (attributes, refs) = if *self.peek() == Token::LBracket {
            self.parse_settings(table, &name)?
        } else {
            (Vec::new(), Vec::new())
        };

        Ok((
            Column {
                name,
                typ,
                attributes,
            },
            refs,
        ))
    }

    /// `int`, `varchar(255)`, `decimal(10,2)`, `int[]`, `schema.enum_type`
    fn parse_type(&mut self) -> Result<String, ParseError> {
        let mut typ = self.parse_qualified_name("column type")?;

        if *self.peek() == Token::LParen {
            self.advance();
            typ.push('(');
            let mut first = true;
            loop {
                match self.peek() {
                    Token::RParen => {
                        self.advance();
                        break;
                    }
                    Token::Comma => {
                        self.advance();
                        typ.push(',');
                        first = true;
                    }
                    Token::Num(_) | Token::Ident(_) | Token::Str(_) if first => {
                        let tok = self.advance();
                        typ.push_str(&tok.to_string());
                        first = false;
                    }
                    _ => return Err(self.unexpected("type argument or ')'")),
                }
            }
            typ.push(')');
        }

        if *self.peek() == Token::LBracket && *self.peek_at(1) == Token::RBracket {
            self.advance();
            self.advance();
            typ.push_str("[]");
        }

        Ok(typ)
    }

    /// Parse a `[...]` settings list. `ref:` settings on a column also yield
    /// a relationship from `table.column`.
    fn parse_settings(
        &mut self,
        table: &str,
        column: &str,
    ) -> Result<(Vec<String>, Vec<Relationship>), ParseError> {
        self.expect(Token::LBracket, "'['")?;

        let mut attributes = Vec::new();
        let mut refs = Vec::new();

        loop {
            if *self.peek() == Token::RBracket {
                self.advance();
                break;
            }

            if self.check_keyword("ref") && *self.peek_at(1) == Token::Colon {
                self.advance();
                self.advance();
                let cardinality = self.parse_operator()?;
                let (to_table, to_field) = self.parse_endpoint()?;
                attributes.push(format!(
                    "ref: {} {}.{}",
                    cardinality.operator(),
                    to_table,
                    to_field
                ));
                refs.push(Relationship {
                    from_table: table.to_string(),
                    from_field: column.to_string(),
                    to_table,
                    to_field,
                    cardinality,
                });
            } else {
                let tokens = self.collect_setting()?;
                if tokens.is_empty() {
                    return Err(self.unexpected("column setting"));
                }
                attributes.push(render_setting(&tokens));
            }

            match self.peek() {
                Token::Comma => {
                    self.advance();
                }
                Token::RBracket => {
                    self.advance();
                    break;
                }
                _ => return Err(self.unexpected("',' or ']' in settings")),
            }
        }

        Ok((attributes, refs))
    }

    /// Tokens of one setting, up to the next top-level `,` or `]`.
    fn collect_setting(&mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        let mut depth = 0usize;
        loop {
            match self.peek() {
                Token::Eof => return Err(ParseError::UnexpectedEof("']' closing settings")),
                Token::Comma | Token::RBracket if depth == 0 => return Ok(tokens),
                Token::LParen => depth += 1,
                Token::RParen => depth = depth.saturating_sub(1),
                _ => {}
            }
            tokens.push(self.advance());
        }
    }

    fn parse_operator(&mut self) -> Result<Cardinality, ParseError> {
        let cardinality = match self.peek() {
            Token::Lt => Cardinality::OneToMany,
            Token::Gt => Cardinality::ManyToOne,
            Token::Minus => Cardinality::OneToOne,
            Token::LtGt => Cardinality::ManyToMany,
            _ => return Err(self.unexpected("relationship operator (<, >, -, <>)")),
        };
        self.advance();
        Ok(cardinality)
    }

    /// `table.column` or `schema.table.column`
    fn parse_endpoint(&mut self) -> Result<(String, String), ParseError> {
        let line = self.line();
        let mut parts = vec![self.expect_name("table name")?];
        while *self.peek() == Token::Dot {
            self.advance();
            parts.push(self.expect_name("column name")?);
        }

        if parts.len() < 2 {
            return Err(ParseError::InvalidEndpoint {
                endpoint: parts.join("."),
                line,
            });
        }

        let field = parts.pop().unwrap_or_default();
        Ok((parts.join("."), field))
    }

    fn parse_ref(&mut self) -> Result<Vec<Relationship>, ParseError> {
        if self.check_name() {
            self.advance(); // ref name
        }

        match self.peek() {
            Token::Colon => {
                self.advance();
                Ok(vec![self.parse_ref_body()?])
            }
            Token::LBrace => {
                self.advance();
                let mut rels = Vec::new();
                while *self.peek() != Token::RBrace {
                    if *self.peek() == Token::Eof {
                        return Err(ParseError::UnexpectedEof("'}' closing Ref block"));
                    }
                    rels.push(self.parse_ref_body()?);
                }
                self.advance();
                Ok(rels)
            }
            _ => Err(self.unexpected("':' or '{' after Ref")),
        }
    }

    fn parse_ref_body(&mut self) -> Result<Relationship, ParseError> {
        let (from_table, from_field) = self.parse_endpoint()?;
        let cardinality = self.parse_operator()?;
        let (to_table, to_field) = self.parse_endpoint()?;

        if *self.peek() == Token::LBracket {
            // delete/update actions are not drawn
            self.parse_settings(&from_table, &from_field)?;
        }

        Ok(Relationship {
            from_table,
            from_field,
            to_table,
            to_field,
            cardinality,
        })
    }

    /// Skip a block header up to `{`, then the balanced block.
    fn skip_named_block(&mut self) -> Result<(), ParseError> {
        loop {
            match self.peek() {
                Token::LBrace => return self.skip_braced(),
                Token::Eof => return Err(ParseError::UnexpectedEof("'{' opening block")),
                Token::Colon => {
                    // short form: `Note: 'text'`
                    self.advance();
                    return match self.peek() {
                        Token::Str(_) => {
                            self.advance();
                            Ok(())
                        }
                        _ => Err(self.unexpected("note string")),
                    };
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn skip_braced(&mut self) -> Result<(), ParseError> {
        self.expect(Token::LBrace, "'{'")?;
        let mut depth = 1usize;
        while depth > 0 {
            match self.advance() {
                Token::LBrace => depth += 1,
                Token::RBrace => depth -= 1,
                Token::Eof => return Err(ParseError::UnexpectedEof("'}' closing block")),
                _ => {}
            }
        }
        Ok(())
    }
}

/// Rebuild the display text of a setting: `note: 'text'`, `default: -1`.
fn render_setting(tokens: &[Token]) -> String {
    let mut out = String::new();
    let mut prev: Option<&Token> = None;
    for tok in tokens {
        let tight = match (prev, tok) {
            (None, _) => true,
            (_, Token::Colon | Token::Comma | Token::RParen | Token::Dot) => true,
            (Some(Token::LParen | Token::Dot), _) => true,
            (Some(Token::Minus), Token::Num(_)) => true,
            (Some(Token::Ident(_)), Token::LParen) => true,
            _ => false,
        };
        if !tight {
            out.push(' ');
        }
        out.push_str(&tok.to_string());
        prev = Some(tok);
    }
    out
}
