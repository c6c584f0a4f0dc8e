// tern-parser - Parser for Tern
// Copyright (c) 2025 The Tern Authors. MIT licensed.

//! Recursive descent parser for Tern source code.
//!
//! Converts tokens into the located AST of [`crate::ast`]. One token of
//! lookahead; precedence by nested productions (or < and < relational <
//! additive < multiplicative < unary < call).

use std::fmt;
use std::rc::Rc;

use crate::ast::{BinaryOp, Expr, FunctionDef, Item, Literal, Param, RelOp, SourceLoc, TypeExpr};
use crate::lexer::{Lexer, LexerError, Token};

/// Parser error with position information.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Parse error at {}:{}: {}",
            self.line, self.column, self.message
        )
    }
}

impl std::error::Error for ParseError {}

impl From<LexerError> for ParseError {
    fn from(e: LexerError) -> Self {
        ParseError {
            message: e.message,
            line: e.line,
            column: e.column,
        }
    }
}

/// The parser converts tokens into AST nodes.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    line: usize,
    column: usize,
    file: Rc<str>,
    lines: Vec<Rc<str>>,
}

impl<'a> Parser<'a> {
    /// Create a new parser for the given source code.
    pub fn new(source: &'a str) -> Result<Self, ParseError> {
        Self::with_file(source, "<input>")
    }

    /// Create a new parser, recording `file` in source locations.
    pub fn with_file(source: &'a str, file: &str) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(source);
        let lines: Vec<Rc<str>> = source.lines().map(Rc::from).collect();
        let current = lexer.next_token()?;
        let line = lexer.token_line();
        let column = lexer.token_column();
        Ok(Parser {
            lexer,
            current,
            line,
            column,
            file: Rc::from(file),
            lines,
        })
    }

    /// Parse a whole compile unit: a sequence of top-level items.
    pub fn parse_unit(&mut self) -> Result<Vec<Item>, ParseError> {
        let mut items = Vec::new();
        while !matches!(self.current, Token::Eof) {
            items.push(self.item()?);
        }
        Ok(items)
    }

    /// Parse a single expression; the whole input must be consumed.
    pub fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        let expr = self.expression()?;
        if !matches!(self.current, Token::Eof) {
            return Err(self.error(format!(
                "Expected end of input, found '{}'",
                self.current
            )));
        }
        Ok(expr)
    }

    /// Parse a string into a compile unit (convenience function).
    pub fn parse_str(source: &str) -> Result<Vec<Item>, ParseError> {
        Parser::new(source)?.parse_unit()
    }

    /// Parse a string into a single expression (convenience function).
    pub fn parse_expression_str(source: &str) -> Result<Expr, ParseError> {
        Parser::new(source)?.parse_expression()
    }

    // ========================================================================
    // Internal parsing methods
    // ========================================================================

    fn advance(&mut self) -> Result<Token, ParseError> {
        let prev = std::mem::replace(&mut self.current, Token::Eof);
        self.current = self.lexer.next_token()?;
        self.line = self.lexer.token_line();
        self.column = self.lexer.token_column();
        Ok(prev)
    }

    fn error(&self, message: String) -> ParseError {
        ParseError {
            message,
            line: self.line,
            column: self.column,
        }
    }

    fn expect(&mut self, expected: &Token) -> Result<(), ParseError> {
        if &self.current == expected {
            self.advance()?;
            Ok(())
        } else {
            Err(self.error(format!(
                "Expected '{}', found '{}'",
                expected, self.current
            )))
        }
    }

    fn expect_ident(&mut self) -> Result<String, ParseError> {
        match &self.current {
            Token::Ident(name) => {
                let name = name.clone();
                self.advance()?;
                Ok(name)
            }
            other => Err(self.error(format!("Expected a name, found '{}'", other))),
        }
    }

    /// The location of the current token.
    fn loc(&self) -> SourceLoc {
        SourceLoc {
            file: Rc::clone(&self.file),
            line: self.line,
            column: self.column,
            text: self
                .lines
                .get(self.line.saturating_sub(1))
                .cloned()
                .unwrap_or_else(|| Rc::from("")),
        }
    }

    fn item(&mut self) -> Result<Item, ParseError> {
        if matches!(self.current, Token::Fun) {
            Ok(Item::Function(self.function()?))
        } else {
            Ok(Item::Statement(self.statement()?))
        }
    }

    fn function(&mut self) -> Result<FunctionDef, ParseError> {
        let loc = self.loc();
        self.expect(&Token::Fun)?;
        let name = self.expect_ident()?;
        self.expect(&Token::LParen)?;

        let mut params = Vec::new();
        while !matches!(self.current, Token::RParen | Token::Eof) {
            let ploc = self.loc();
            let pname = self.expect_ident()?;
            self.expect(&Token::Colon)?;
            let ty = self.type_expr()?;
            params.push(Param {
                name: pname,
                ty,
                loc: ploc,
            });
            if !matches!(self.current, Token::RParen) {
                self.expect(&Token::Comma)?;
            }
        }
        self.expect(&Token::RParen)?;

        let return_type = if matches!(self.current, Token::Colon) {
            self.advance()?;
            Some(self.type_expr()?)
        } else {
            None
        };

        let body = match self.current {
            Token::Assign => {
                self.advance()?;
                let body = self.expression()?;
                self.end_statement()?;
                body
            }
            Token::LBrace => self.block()?,
            _ => {
                return Err(self.error(format!(
                    "Expected '=' or '{{' in function body, found '{}'",
                    self.current
                )));
            }
        };

        Ok(FunctionDef {
            name,
            params,
            return_type,
            body,
            loc,
        })
    }

    fn statement(&mut self) -> Result<Expr, ParseError> {
        match self.current {
            Token::LBrace => self.block(),
            Token::While => self.while_statement(),
            Token::If => {
                let expr = self.if_expression()?;
                // The trailing semicolon is optional after an if statement.
                if matches!(self.current, Token::Semicolon) {
                    self.advance()?;
                }
                Ok(expr)
            }
            Token::Var | Token::Val => {
                let expr = self.declaration()?;
                self.end_statement()?;
                Ok(expr)
            }
            Token::Fun => Err(self.error(
                "Function definitions are only allowed at top level".to_string(),
            )),
            _ => {
                let expr = self.expression()?;
                self.end_statement()?;
                Ok(expr)
            }
        }
    }

    /// Consume the semicolon ending a simple statement. It may be omitted
    /// before end of input so a bare expression works at the REPL.
    fn end_statement(&mut self) -> Result<(), ParseError> {
        match self.current {
            Token::Semicolon => {
                self.advance()?;
                Ok(())
            }
            Token::Eof => Ok(()),
            _ => Err(self.error(format!("Expected ';', found '{}'", self.current))),
        }
    }

    fn block(&mut self) -> Result<Expr, ParseError> {
        let loc = self.loc();
        self.expect(&Token::LBrace)?;
        let mut statements = Vec::new();
        while !matches!(self.current, Token::RBrace | Token::Eof) {
            statements.push(self.statement()?);
        }
        self.expect(&Token::RBrace)?;
        Ok(Expr::Block { statements, loc })
    }

    fn while_statement(&mut self) -> Result<Expr, ParseError> {
        let loc = self.loc();
        self.expect(&Token::While)?;
        self.expect(&Token::LParen)?;
        let cond = self.expression()?;
        self.expect(&Token::RParen)?;
        let body = self.statement()?;
        Ok(Expr::While {
            cond: Box::new(cond),
            body: Box::new(body),
            loc,
        })
    }

    fn declaration(&mut self) -> Result<Expr, ParseError> {
        let loc = self.loc();
        let mutable = matches!(self.current, Token::Var);
        self.advance()?; // consume var/val
        let name = self.expect_ident()?;
        self.expect(&Token::Assign)?;
        let value = self.expression()?;
        Ok(Expr::Var {
            name,
            mutable,
            value: Box::new(value),
            loc,
        })
    }

    fn expression(&mut self) -> Result<Expr, ParseError> {
        if matches!(self.current, Token::If) {
            return self.if_expression();
        }
        self.assignment()
    }

    fn if_expression(&mut self) -> Result<Expr, ParseError> {
        let loc = self.loc();
        self.expect(&Token::If)?;
        self.expect(&Token::LParen)?;
        let cond = self.expression()?;
        self.expect(&Token::RParen)?;
        let then_branch = self.branch()?;
        let else_branch = if matches!(self.current, Token::Else) {
            self.advance()?;
            Some(Box::new(self.branch()?))
        } else {
            None
        };
        Ok(Expr::If {
            cond: Box::new(cond),
            then_branch: Box::new(then_branch),
            else_branch,
            loc,
        })
    }

    /// An if branch is either a block or a single expression.
    fn branch(&mut self) -> Result<Expr, ParseError> {
        if matches!(self.current, Token::LBrace) {
            self.block()
        } else {
            self.expression()
        }
    }

    fn assignment(&mut self) -> Result<Expr, ParseError> {
        let expr = self.or_expression()?;
        if matches!(self.current, Token::Assign) {
            return match expr {
                Expr::Ref { name, loc } => {
                    self.advance()?;
                    let value = self.expression()?;
                    Ok(Expr::Assign {
                        name,
                        value: Box::new(value),
                        loc,
                    })
                }
                _ => Err(self.error("Invalid assignment target".to_string())),
            };
        }
        Ok(expr)
    }

    fn or_expression(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.and_expression()?;
        while matches!(self.current, Token::Or) {
            let loc = self.loc();
            self.advance()?;
            let rhs = self.and_expression()?;
            expr = Expr::Binary {
                op: BinaryOp::Or,
                lhs: Box::new(expr),
                rhs: Box::new(rhs),
                loc,
            };
        }
        Ok(expr)
    }

    fn and_expression(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.relational()?;
        while matches!(self.current, Token::And) {
            let loc = self.loc();
            self.advance()?;
            let rhs = self.relational()?;
            expr = Expr::Binary {
                op: BinaryOp::And,
                lhs: Box::new(expr),
                rhs: Box::new(rhs),
                loc,
            };
        }
        Ok(expr)
    }

    fn relational(&mut self) -> Result<Expr, ParseError> {
        let expr = self.additive()?;
        let op = match self.current {
            Token::Eq => RelOp::Eq,
            Token::NotEq => RelOp::Ne,
            Token::Less => RelOp::Lt,
            Token::LessEq => RelOp::Le,
            Token::Greater => RelOp::Gt,
            Token::GreaterEq => RelOp::Ge,
            _ => return Ok(expr),
        };
        let loc = self.loc();
        self.advance()?;
        let rhs = self.additive()?;
        Ok(Expr::Binary {
            op: BinaryOp::Relational(op),
            lhs: Box::new(expr),
            rhs: Box::new(rhs),
            loc,
        })
    }

    fn additive(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.multiplicative()?;
        loop {
            let op = match self.current {
                Token::Plus => BinaryOp::Plus,
                Token::Minus => BinaryOp::Minus,
                _ => break,
            };
            let loc = self.loc();
            self.advance()?;
            let rhs = self.multiplicative()?;
            expr = Expr::Binary {
                op,
                lhs: Box::new(expr),
                rhs: Box::new(rhs),
                loc,
            };
        }
        Ok(expr)
    }

    fn multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.unary()?;
        loop {
            let op = match self.current {
                Token::Star => BinaryOp::Multiply,
                Token::Slash => BinaryOp::Divide,
                _ => break,
            };
            let loc = self.loc();
            self.advance()?;
            let rhs = self.unary()?;
            expr = Expr::Binary {
                op,
                lhs: Box::new(expr),
                rhs: Box::new(rhs),
                loc,
            };
        }
        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        match self.current {
            Token::Bang => {
                let loc = self.loc();
                self.advance()?;
                let operand = self.unary()?;
                Ok(Expr::Not {
                    operand: Box::new(operand),
                    loc,
                })
            }
            Token::Minus => {
                // Unary minus is sugar for subtraction from zero.
                let loc = self.loc();
                self.advance()?;
                let operand = self.unary()?;
                Ok(Expr::Binary {
                    op: BinaryOp::Minus,
                    lhs: Box::new(Expr::Lit {
                        value: Literal::Int(0),
                        loc: loc.clone(),
                    }),
                    rhs: Box::new(operand),
                    loc,
                })
            }
            _ => self.postfix(),
        }
    }

    fn postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.primary()?;
        while matches!(self.current, Token::LParen) {
            let loc = self.loc();
            self.advance()?;
            let mut args = Vec::new();
            while !matches!(self.current, Token::RParen | Token::Eof) {
                args.push(self.expression()?);
                if !matches!(self.current, Token::RParen) {
                    self.expect(&Token::Comma)?;
                }
            }
            self.expect(&Token::RParen)?;
            expr = Expr::Call {
                callee: Box::new(expr),
                args,
                loc,
            };
        }
        Ok(expr)
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        let loc = self.loc();
        match &self.current {
            Token::Int(n) => {
                let n = *n;
                self.advance()?;
                Ok(Expr::Lit {
                    value: Literal::Int(n),
                    loc,
                })
            }
            Token::Str(s) => {
                let s = s.clone();
                self.advance()?;
                Ok(Expr::Lit {
                    value: Literal::Str(s),
                    loc,
                })
            }
            Token::True => {
                self.advance()?;
                Ok(Expr::Lit {
                    value: Literal::Bool(true),
                    loc,
                })
            }
            Token::False => {
                self.advance()?;
                Ok(Expr::Lit {
                    value: Literal::Bool(false),
                    loc,
                })
            }
            Token::Ident(name) => {
                let name = name.clone();
                self.advance()?;
                Ok(Expr::Ref { name, loc })
            }
            Token::LParen => self.paren_group(),
            other => Err(self.error(format!("Unexpected token '{}'", other))),
        }
    }

    /// A parenthesized group: plain grouping without commas, an expression
    /// list with them. `()` is the empty expression list.
    fn paren_group(&mut self) -> Result<Expr, ParseError> {
        let loc = self.loc();
        self.expect(&Token::LParen)?;
        if matches!(self.current, Token::RParen) {
            self.advance()?;
            return Ok(Expr::ExprList {
                elements: Vec::new(),
                loc,
            });
        }
        let first = self.expression()?;
        if matches!(self.current, Token::Comma) {
            let mut elements = vec![first];
            while matches!(self.current, Token::Comma) {
                self.advance()?;
                elements.push(self.expression()?);
            }
            self.expect(&Token::RParen)?;
            return Ok(Expr::ExprList { elements, loc });
        }
        self.expect(&Token::RParen)?;
        Ok(first)
    }

    fn type_expr(&mut self) -> Result<TypeExpr, ParseError> {
        let loc = self.loc();
        match &self.current {
            Token::Ident(name) => {
                let name = name.clone();
                self.advance()?;
                if name == "Array" && matches!(self.current, Token::Less) {
                    self.advance()?;
                    let element = self.type_expr()?;
                    self.expect(&Token::Greater)?;
                    Ok(TypeExpr::Array {
                        element: Box::new(element),
                        loc,
                    })
                } else {
                    Ok(TypeExpr::Name { name, loc })
                }
            }
            Token::LParen => {
                self.advance()?;
                let mut params = Vec::new();
                while !matches!(self.current, Token::RParen | Token::Eof) {
                    params.push(self.type_expr()?);
                    if !matches!(self.current, Token::RParen) {
                        self.expect(&Token::Comma)?;
                    }
                }
                self.expect(&Token::RParen)?;
                self.expect(&Token::Arrow)?;
                let ret = self.type_expr()?;
                Ok(TypeExpr::Function {
                    params,
                    ret: Box::new(ret),
                    loc,
                })
            }
            other => Err(self.error(format!("Expected a type, found '{}'", other))),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
