use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Ident(String),
    QuotedIdent(String), // "first name"
    Str(String),         // 'text' or '''text'''
    Num(String),
    Expr(String),  // `now()`
    Color(String), // #3498DB

    LBrace,   // {
    RBrace,   // }
    LParen,   // (
    RParen,   // )
    LBracket, // [
    RBracket, // ]
    Comma,    // ,
    Colon,    // :
    Dot,      // .
    Lt,       // <
    Gt,       // >
    Minus,    // -
    LtGt,     // <>

    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(s) | Token::Num(s) | Token::Color(s) => f.write_str(s),
            Token::QuotedIdent(s) => write!(f, "\"{}\"", s),
            Token::Str(s) => write!(f, "'{}'", s.replace('\'', "\\'")),
            Token::Expr(s) => write!(f, "`{}`", s),
            Token::LBrace => f.write_str("{"),
            Token::RBrace => f.write_str("}"),
            Token::LParen => f.write_str("("),
            Token::RParen => f.write_str(")"),
            Token::LBracket => f.write_str("["),
            Token::RBracket => f.write_str("]"),
            Token::Comma => f.write_str(","),
            Token::Colon => f.write_str(":"),
            Token::Dot => f.write_str("."),
            Token::Lt => f.write_str("<"),
            Token::Gt => f.write_str(">"),
            Token::Minus => f.write_str("-"),
            Token::LtGt => f.write_str("<>"),
            Token::Eof => f.write_str("end of input"),
        }
    }
}

/// A token and the 1-based line it starts on.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub line: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum LexError {
    #[error("Unexpected character '{0}' on line {1}")]
    UnexpectedChar(char, usize),
    #[error("Unterminated string starting on line {0}")]
    UnterminatedString(usize),
    #[error("Unterminated comment starting on line {0}")]
    UnterminatedComment(usize),
    #[error("Unterminated expression starting on line {0}")]
    UnterminatedExpr(usize),
}

pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            line: 1,
        }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next();
        if c == Some('\n') {
            self.line += 1;
        }
        c
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<(), LexError> {
        loop {
            match self.chars.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') => {
                    // Need a second char of lookahead; clone the iterator.
                    let mut ahead = self.chars.clone();
                    ahead.next();
                    match ahead.peek() {
                        Some('/') => {
                            while let Some(&c) = self.chars.peek() {
                                if c == '\n' {
                                    break;
                                }
                                self.bump();
                            }
                        }
                        Some('*') => self.skip_block_comment()?,
                        _ => break,
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    fn skip_block_comment(&mut self) -> Result<(), LexError> {
        let start = self.line;
        self.bump(); // /
        self.bump(); // *
        loop {
            match self.bump() {
                Some('*') if self.chars.peek() == Some(&'/') => {
                    self.bump();
                    return Ok(());
                }
                Some(_) => {}
                None => return Err(LexError::UnterminatedComment(start)),
            }
        }
    }

    fn read_ident(&mut self, first: char) -> String {
        let mut s = String::from(first);
        while let Some(&c) = self.chars.peek() {
            if c.is_alphanumeric() || c == '_' {
                s.push(c);
                self.bump();
            } else {
                break;
            }
        }
        s
    }

    fn read_delimited(&mut self, delim: char) -> Result<String, LexError> {
        let start = self.line;
        let mut s = String::new();
        loop {
            match self.bump() {
                Some(c) if c == delim => return Ok(s),
                Some('\\') => match self.bump() {
                    Some('n') => s.push('\n'),
                    Some('t') => s.push('\t'),
                    Some(c) => s.push(c),
                    None => return Err(LexError::UnterminatedString(start)),
                },
                Some(c) => s.push(c),
                None => return Err(LexError::UnterminatedString(start)),
            }
        }
    }

    /// Called after the opening quote. Handles `''` and `'''...'''`.
    fn read_single_quoted(&mut self) -> Result<String, LexError> {
        if self.chars.peek() != Some(&'\'') {
            return self.read_delimited('\'');
        }
        self.bump();
        if self.chars.peek() != Some(&'\'') {
            return Ok(String::new());
        }
        self.bump();

        let start = self.line;
        let mut s = String::new();
        loop {
            match self.bump() {
                Some('\'') if s.ends_with("''") => {
                    s.truncate(s.len() - 2);
                    return Ok(s.trim().to_string());
                }
                Some(c) => s.push(c),
                None => return Err(LexError::UnterminatedString(start)),
            }
        }
    }

    fn read_expr(&mut self) -> Result<String, LexError> {
        let start = self.line;
        let mut s = String::new();
        loop {
            match self.bump() {
                Some('`') => return Ok(s),
                Some(c) => s.push(c),
                None => return Err(LexError::UnterminatedExpr(start)),
            }
        }
    }

    fn read_number(&mut self, first: char) -> String {
        let mut s = String::from(first);
        let mut seen_dot = false;
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_digit() {
                s.push(c);
                self.bump();
            } else if c == '.' && !seen_dot {
                seen_dot = true;
                s.push(c);
                self.bump();
            } else {
                break;
            }
        }
        s
    }

    fn read_color(&mut self) -> String {
        let mut s = String::from('#');
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_alphanumeric() {
                s.push(c);
                self.bump();
            } else {
                break;
            }
        }
        s
    }

    pub fn next_token(&mut self) -> Result<Spanned, LexError> {
        self.skip_whitespace_and_comments()?;

        let line = self.line;
        let c = match self.bump() {
            Some(c) => c,
            None => {
                return Ok(Spanned {
                    token: Token::Eof,
                    line,
                });
            }
        };

        let token = match c {
            '{' => Token::LBrace,
            '}' => Token::RBrace,
            '(' => Token::LParen,
            ')' => Token::RParen,
            '[' => Token::LBracket,
            ']' => Token::RBracket,
            ',' => Token::Comma,
            ':' => Token::Colon,
            '.' => Token::Dot,
            '>' => Token::Gt,
            '-' => Token::Minus,
            '<' => {
                if self.chars.peek() == Some(&'>') {
                    self.bump();
                    Token::LtGt
                } else {
                    Token::Lt
                }
            }
            '"' => Token::QuotedIdent(self.read_delimited('"')?),
            '\'' => Token::Str(self.read_single_quoted()?),
            '`' => Token::Expr(self.read_expr()?),
            '#' => Token::Color(self.read_color()),
            c if c.is_ascii_digit() => Token::Num(self.read_number(c)),
            c if c.is_alphabetic() || c == '_' => Token::Ident(self.read_ident(c)),
            _ => return Err(LexError::UnexpectedChar(c, line)),
        };

        Ok(Spanned { token, line })
    }

    pub fn tokenize(mut self) -> Result<Vec<Spanned>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token()?;
            let done = tok.token == Token::Eof;
            tokens.push(tok);
            if done {
                break;
            }
        }
        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<Token> {
        Lexer::new(input)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|s| s.token)
            .collect()
    }

    #[test]
    fn test_basic_tokens() {
        assert_eq!(
            kinds("Table users { }"),
            vec![
                Token::Ident("Table".into()),
                Token::Ident("users".into()),
                Token::LBrace,
                Token::RBrace,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_comments() {
        let input = "// header\nTable users { /* block\ncomment */ id int // trailing\n}";
        assert_eq!(
            kinds(input),
            vec![
                Token::Ident("Table".into()),
                Token::Ident("users".into()),
                Token::LBrace,
                Token::Ident("id".into()),
                Token::Ident("int".into()),
                Token::RBrace,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_ref_operators() {
        assert_eq!(
            kinds("< > - <>"),
            vec![Token::Lt, Token::Gt, Token::Minus, Token::LtGt, Token::Eof]
        );
    }

    #[test]
    fn test_strings_and_literals() {
        assert_eq!(
            kinds(r#"'it\'s' "full name" `now()` #3498DB 1.5 ''"#),
            vec![
                Token::Str("it's".into()),
                Token::QuotedIdent("full name".into()),
                Token::Expr("now()".into()),
                Token::Color("#3498DB".into()),
                Token::Num("1.5".into()),
                Token::Str(String::new()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_triple_quoted_string() {
        let tokens = kinds("Note: '''\n  multi\n  line\n'''");
        assert_eq!(tokens[2], Token::Str("multi\n  line".into()));
    }

    #[test]
    fn test_line_numbers() {
        let tokens = Lexer::new("Table a {\n  id int\n}").tokenize().unwrap();
        let lines: Vec<usize> = tokens.iter().map(|t| t.line).collect();
        assert_eq!(lines, vec![1, 1, 1, 2, 2, 3, 3]);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            Lexer::new("'open").tokenize(),
            Err(LexError::UnterminatedString(1))
        ));
        assert!(matches!(
            Lexer::new("a\n/* never closed").tokenize(),
            Err(LexError::UnterminatedComment(2))
        ));
        assert!(matches!(
            Lexer::new("a ; b").tokenize(),
            Err(LexError::UnexpectedChar(';', 1))
        ));
    }
}
