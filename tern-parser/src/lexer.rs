// tern-parser - Lexer for Tern
// Copyright (c) 2025 The Tern Authors. MIT licensed.

//! Lexer (tokeniser) for Tern source code.
//!
//! Converts a source string into a stream of tokens.

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Keywords
    Var,
    Val,
    Fun,
    If,
    Else,
    While,
    And,
    Or,
    True,
    False,

    // Literals and names
    Int(i64),
    Str(String),
    Ident(String),

    // Punctuation
    LParen,    // (
    RParen,    // )
    LBrace,    // {
    RBrace,    // }
    Comma,     // ,
    Semicolon, // ;
    Colon,     // :
    Arrow,     // ->

    // Operators
    Plus,      // +
    Minus,     // -
    Star,      // *
    Slash,     // /
    Bang,      // !
    Assign,    // =
    Eq,        // ==
    NotEq,     // !=
    Less,      // <
    LessEq,    // <=
    Greater,   // >
    GreaterEq, // >=

    // Special
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Var => write!(f, "var"),
            Token::Val => write!(f, "val"),
            Token::Fun => write!(f, "fun"),
            Token::If => write!(f, "if"),
            Token::Else => write!(f, "else"),
            Token::While => write!(f, "while"),
            Token::And => write!(f, "and"),
            Token::Or => write!(f, "or"),
            Token::True => write!(f, "true"),
            Token::False => write!(f, "false"),
            Token::Int(n) => write!(f, "{}", n),
            Token::Str(s) => write!(f, "\"{}\"", s),
            Token::Ident(s) => write!(f, "{}", s),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::Comma => write!(f, ","),
            Token::Semicolon => write!(f, ";"),
            Token::Colon => write!(f, ":"),
            Token::Arrow => write!(f, "->"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Bang => write!(f, "!"),
            Token::Assign => write!(f, "="),
            Token::Eq => write!(f, "=="),
            Token::NotEq => write!(f, "!="),
            Token::Less => write!(f, "<"),
            Token::LessEq => write!(f, "<="),
            Token::Greater => write!(f, ">"),
            Token::GreaterEq => write!(f, ">="),
            Token::Eof => write!(f, "end of input"),
        }
    }
}

/// Lexer error with position information.
#[derive(Debug, Clone)]
pub struct LexerError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for LexerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Lexer error at {}:{}: {}",
            self.line, self.column, self.message
        )
    }
}

impl std::error::Error for LexerError {}

/// The lexer converts source code into tokens.
pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
    token_line: usize,
    token_column: usize,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source code.
    pub fn new(source: &'a str) -> Self {
        Lexer {
            chars: source.chars().peekable(),
            line: 1,
            column: 1,
            token_line: 1,
            token_column: 1,
        }
    }

    /// Get the next token from the source.
    pub fn next_token(&mut self) -> Result<Token, LexerError> {
        self.skip_whitespace_and_comments()?;
        self.token_line = self.line;
        self.token_column = self.column;

        let c = match self.peek() {
            Some(c) => c,
            None => return Ok(Token::Eof),
        };

        match c {
            '(' => {
                self.advance();
                Ok(Token::LParen)
            }
            ')' => {
                self.advance();
                Ok(Token::RParen)
            }
            '{' => {
                self.advance();
                Ok(Token::LBrace)
            }
            '}' => {
                self.advance();
                Ok(Token::RBrace)
            }
            ',' => {
                self.advance();
                Ok(Token::Comma)
            }
            ';' => {
                self.advance();
                Ok(Token::Semicolon)
            }
            ':' => {
                self.advance();
                Ok(Token::Colon)
            }
            '+' => {
                self.advance();
                Ok(Token::Plus)
            }
            '-' => {
                self.advance();
                if self.peek() == Some('>') {
                    self.advance();
                    Ok(Token::Arrow)
                } else {
                    Ok(Token::Minus)
                }
            }
            '*' => {
                self.advance();
                Ok(Token::Star)
            }
            '/' => {
                self.advance();
                Ok(Token::Slash)
            }
            '!' => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    Ok(Token::NotEq)
                } else {
                    Ok(Token::Bang)
                }
            }
            '=' => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    Ok(Token::Eq)
                } else {
                    Ok(Token::Assign)
                }
            }
            '<' => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    Ok(Token::LessEq)
                } else {
                    Ok(Token::Less)
                }
            }
            '>' => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    Ok(Token::GreaterEq)
                } else {
                    Ok(Token::Greater)
                }
            }
            '"' => self.read_string(),
            '0'..='9' => self.read_number(),
            _ if is_ident_start(c) => Ok(self.read_ident()),
            _ => Err(self.error(format!("Unexpected character: '{}'", c))),
        }
    }

    /// Collect all tokens into a vector.
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexerError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            if matches!(token, Token::Eof) {
                break;
            }
            tokens.push(token);
        }
        Ok(tokens)
    }

    /// Get the current line number (1-indexed).
    pub fn line(&self) -> usize {
        self.line
    }

    /// Get the current column number (1-indexed).
    pub fn column(&self) -> usize {
        self.column
    }

    /// Line where the most recently returned token started.
    pub fn token_line(&self) -> usize {
        self.token_line
    }

    /// Column where the most recently returned token started.
    pub fn token_column(&self) -> usize {
        self.token_column
    }

    // ========================================================================
    // Internal helpers
    // ========================================================================

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next();
        if let Some(ch) = c {
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        c
    }

    fn error(&self, message: String) -> LexerError {
        LexerError {
            message,
            line: self.line,
            column: self.column,
        }
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<(), LexerError> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('/') => {
                    // Look past the slash without consuming it; a lone slash
                    // is the division operator.
                    let mut ahead = self.chars.clone();
                    ahead.next();
                    match ahead.peek() {
                        Some('/') => {
                            while let Some(c) = self.peek() {
                                if c == '\n' {
                                    break;
                                }
                                self.advance();
                            }
                        }
                        Some('*') => {
                            self.advance(); // consume /
                            self.advance(); // consume *
                            self.skip_block_comment()?;
                        }
                        _ => break,
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    fn skip_block_comment(&mut self) -> Result<(), LexerError> {
        loop {
            match self.advance() {
                Some('*') if self.peek() == Some('/') => {
                    self.advance();
                    return Ok(());
                }
                Some(_) => {}
                None => return Err(self.error("Unterminated block comment".to_string())),
            }
        }
    }

    fn read_string(&mut self) -> Result<Token, LexerError> {
        self.advance(); // consume opening "
        let mut s = String::new();

        loop {
            match self.advance() {
                Some('"') => break,
                Some('\\') => match self.advance() {
                    Some('n') => s.push('\n'),
                    Some('t') => s.push('\t'),
                    Some('r') => s.push('\r'),
                    Some('\\') => s.push('\\'),
                    Some('"') => s.push('"'),
                    Some(c) => return Err(self.error(format!("Unknown escape sequence: \\{}", c))),
                    None => return Err(self.error("Unterminated string escape".to_string())),
                },
                Some('\n') => return Err(self.error("Unterminated string".to_string())),
                Some(c) => s.push(c),
                None => return Err(self.error("Unterminated string".to_string())),
            }
        }

        Ok(Token::Str(s))
    }

    fn read_number(&mut self) -> Result<Token, LexerError> {
        let mut s = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                s.push(c);
                self.advance();
            } else {
                break;
            }
        }

        let n: i64 = s
            .parse()
            .map_err(|_| self.error(format!("Integer literal out of range: {}", s)))?;
        Ok(Token::Int(n))
    }

    fn read_ident(&mut self) -> Token {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if is_ident_char(c) {
                name.push(c);
                self.advance();
            } else {
                break;
            }
        }

        // Check for reserved words
        match name.as_str() {
            "var" => Token::Var,
            "val" => Token::Val,
            "fun" => Token::Fun,
            "if" => Token::If,
            "else" => Token::Else,
            "while" => Token::While,
            "and" => Token::And,
            "or" => Token::Or,
            "true" => Token::True,
            "false" => Token::False,
            _ => Token::Ident(name),
        }
    }
}

/// Check if a character can start an identifier.
fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

/// Check if a character can appear in an identifier.
fn is_ident_char(c: char) -> bool {
    is_ident_start(c) || c.is_ascii_digit()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(s: &str) -> Result<Vec<Token>, LexerError> {
        Lexer::new(s).tokenize()
    }

    #[test]
    fn test_punctuation() {
        assert_eq!(
            tokenize("(){},;:").unwrap(),
            vec![
                Token::LParen,
                Token::RParen,
                Token::LBrace,
                Token::RBrace,
                Token::Comma,
                Token::Semicolon,
                Token::Colon,
            ]
        );
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            tokenize("+ - * / ! = == != < <= > >= ->").unwrap(),
            vec![
                Token::Plus,
                Token::Minus,
                Token::Star,
                Token::Slash,
                Token::Bang,
                Token::Assign,
                Token::Eq,
                Token::NotEq,
                Token::Less,
                Token::LessEq,
                Token::Greater,
                Token::GreaterEq,
                Token::Arrow,
            ]
        );
    }

    #[test]
    fn test_keywords() {
        assert_eq!(
            tokenize("var val fun if else while and or true false").unwrap(),
            vec![
                Token::Var,
                Token::Val,
                Token::Fun,
                Token::If,
                Token::Else,
                Token::While,
                Token::And,
                Token::Or,
                Token::True,
                Token::False,
            ]
        );
    }

    #[test]
    fn test_integers() {
        assert_eq!(
            tokenize("0 1 42 9000").unwrap(),
            vec![
                Token::Int(0),
                Token::Int(1),
                Token::Int(42),
                Token::Int(9000),
            ]
        );
    }

    #[test]
    fn test_integer_out_of_range() {
        assert!(tokenize("99999999999999999999").is_err());
    }

    #[test]
    fn test_strings() {
        assert_eq!(
            tokenize(r#""""#).unwrap(),
            vec![Token::Str("".to_string())]
        );
        assert_eq!(
            tokenize(r#""hello""#).unwrap(),
            vec![Token::Str("hello".to_string())]
        );
        assert_eq!(
            tokenize(r#""a\nb\t\"c\"""#).unwrap(),
            vec![Token::Str("a\nb\t\"c\"".to_string())]
        );
    }

    #[test]
    fn test_unterminated_string() {
        assert!(tokenize(r#""abc"#).is_err());
    }

    #[test]
    fn test_identifiers() {
        assert_eq!(
            tokenize("foo bar_baz _x x1").unwrap(),
            vec![
                Token::Ident("foo".to_string()),
                Token::Ident("bar_baz".to_string()),
                Token::Ident("_x".to_string()),
                Token::Ident("x1".to_string()),
            ]
        );
    }

    #[test]
    fn test_line_comments() {
        assert_eq!(
            tokenize("1 // comment\n2").unwrap(),
            vec![Token::Int(1), Token::Int(2)]
        );
    }

    #[test]
    fn test_block_comments() {
        assert_eq!(
            tokenize("1 /* a\nb */ 2").unwrap(),
            vec![Token::Int(1), Token::Int(2)]
        );
        assert!(tokenize("1 /* never closed").is_err());
    }

    #[test]
    fn test_division_is_not_a_comment() {
        assert_eq!(
            tokenize("6 / 2").unwrap(),
            vec![Token::Int(6), Token::Slash, Token::Int(2)]
        );
    }

    #[test]
    fn test_arrow_and_minus() {
        assert_eq!(
            tokenize("a - b -> c").unwrap(),
            vec![
                Token::Ident("a".to_string()),
                Token::Minus,
                Token::Ident("b".to_string()),
                Token::Arrow,
                Token::Ident("c".to_string()),
            ]
        );
    }

    #[test]
    fn test_statement_tokens() {
        assert_eq!(
            tokenize("var x = 5;").unwrap(),
            vec![
                Token::Var,
                Token::Ident("x".to_string()),
                Token::Assign,
                Token::Int(5),
                Token::Semicolon,
            ]
        );
    }

    #[test]
    fn test_position_tracking() {
        let mut lexer = Lexer::new("a\n  b");
        assert_eq!(lexer.next_token().unwrap(), Token::Ident("a".to_string()));
        assert_eq!(lexer.token_line(), 1);
        assert_eq!(lexer.token_column(), 1);
        assert_eq!(lexer.next_token().unwrap(), Token::Ident("b".to_string()));
        assert_eq!(lexer.token_line(), 2);
        assert_eq!(lexer.token_column(), 3);
    }
}
