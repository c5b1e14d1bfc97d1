//! Pratt-style parser for AQA pseudocode.
//!
//! Statements are keyword-delimited and newline-terminated; expressions are
//! parsed by precedence climbing with one token of lookahead. Errors are
//! accumulated rather than aborting, so the parser always returns a
//! (possibly partial) [`Program`].

use aqa_lexer::Lexer;
use aqa_syntax::ast::{
    Block, Expr, Ident, IfStmt, ImportStmt, Program, Stmt, SubroutineDef,
};
use aqa_syntax::token::{parse_int_literal, Token, TokenKind};

use crate::errors::ParseError;
use crate::precedence::{precedence_of, Precedence};

/// Parser over a pull-driven token stream.
pub struct Parser {
    lexer: Lexer,
    cur_token: Token,
    peek_token: Token,
    errors: Vec<ParseError>,
}

/// Keyword operators keep a canonical uppercase spelling on the AST no
/// matter how the source spelt them; symbol operators keep their literal.
fn canonical_op(token: &Token) -> String {
    match token.kind {
        TokenKind::Div
        | TokenKind::Mod
        | TokenKind::And
        | TokenKind::Or
        | TokenKind::Xor
        | TokenKind::Not => token.kind.as_str().to_string(),
        _ => token.literal.clone(),
    }
}

impl Parser {
    /// Creates a new parser reading from the given lexer.
    pub fn new(lexer: Lexer) -> Self {
        let mut parser = Self {
            lexer,
            cur_token: Token::new(TokenKind::Eof, "", 0, 0, 0),
            peek_token: Token::new(TokenKind::Eof, "", 0, 0, 0),
            errors: Vec::new(),
        };

        parser.next_token();
        parser.next_token();
        parser
    }

    /// The errors recorded so far.
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    /// Parses the whole input into a program, accumulating any errors.
    pub fn parse_program(&mut self) -> Program {
        let mut program = Program::default();

        while !self.cur_token_is(TokenKind::Eof) {
            if let Some(stmt) = self.parse_statement() {
                program.statements.push(stmt);
            }
            self.next_token();
        }

        program
    }

    fn next_token(&mut self) {
        let next = self.lexer.next_token();
        self.cur_token = std::mem::replace(&mut self.peek_token, next);
    }

    fn cur_token_is(&self, kind: TokenKind) -> bool {
        self.cur_token.kind == kind
    }

    fn peek_token_is(&self, kind: TokenKind) -> bool {
        self.peek_token.kind == kind
    }

    /// Advances only when the next token has the expected kind; records an
    /// `UnexpectedToken` error otherwise.
    fn expect_peek(&mut self, kind: TokenKind) -> bool {
        if self.peek_token_is(kind) {
            self.next_token();
            true
        } else {
            self.errors.push(ParseError::UnexpectedToken {
                current: self.cur_token.clone(),
                peek: self.peek_token.clone(),
                expected: kind,
            });
            false
        }
    }

    fn invalid_token_error(&mut self) {
        self.errors.push(ParseError::InvalidToken {
            current: self.cur_token.clone(),
            peek: self.peek_token.clone(),
            unexpected: self.cur_token.clone(),
        });
    }

    // ---- statements ----

    fn parse_statement(&mut self) -> Option<Stmt> {
        while self.cur_token_is(TokenKind::Newline) {
            self.next_token();
        }
        if self.cur_token_is(TokenKind::Eof) {
            return None;
        }

        match self.cur_token.kind {
            TokenKind::Ident if self.peek_token_is(TokenKind::Assign) => {
                self.parse_assignment(false)
            }
            TokenKind::Constant if self.peek_token_is(TokenKind::Ident) => {
                self.next_token();
                self.parse_assignment(true)
            }
            TokenKind::Return => self.parse_return_statement(),
            TokenKind::If => self.parse_if_statement().map(Stmt::If),
            TokenKind::Subroutine => self.parse_subroutine_definition(),
            TokenKind::While => self.parse_while_statement(),
            TokenKind::For => self.parse_for_statement(),
            TokenKind::Repeat => self.parse_repeat_statement(),
            TokenKind::Import => self.parse_import_statement(),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_assignment(&mut self, constant: bool) -> Option<Stmt> {
        let token = self.cur_token.clone();
        let mut name = Ident::new(self.cur_token.clone());
        name.constant = constant;

        if !self.expect_peek(TokenKind::Assign) {
            return None;
        }
        self.next_token();

        let value = self.parse_expression(Precedence::Lowest)?;
        Some(Stmt::Assign { token, name, value })
    }

    fn parse_return_statement(&mut self) -> Option<Stmt> {
        let token = self.cur_token.clone();
        self.next_token();

        let value = self.parse_expression(Precedence::Lowest)?;
        Some(Stmt::Return { token, value })
    }

    fn parse_expression_statement(&mut self) -> Option<Stmt> {
        let token = self.cur_token.clone();
        let expr = self.parse_expression(Precedence::Lowest)?;

        if self.peek_token_is(TokenKind::Newline) {
            self.next_token();
        }

        Some(Stmt::Expr { token, expr })
    }

    /// Consumes statements until the current token is one of the terminators
    /// or EOF, skipping leading newlines before each statement.
    fn parse_block(&mut self, until: &[TokenKind]) -> Block {
        let token = self.cur_token.clone();
        self.next_token();

        let mut statements = Vec::new();
        loop {
            while self.cur_token_is(TokenKind::Newline) {
                self.next_token();
            }
            if self.cur_token_is(TokenKind::Eof) || until.contains(&self.cur_token.kind) {
                break;
            }
            if let Some(stmt) = self.parse_statement() {
                statements.push(stmt);
            }
            self.next_token();
        }

        Block { token, statements }
    }

    fn parse_if_statement(&mut self) -> Option<IfStmt> {
        let token = self.cur_token.clone();
        self.next_token();

        let cond = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::Then) {
            return None;
        }

        let consequence = self.parse_block(&[TokenKind::EndIf, TokenKind::Else]);
        let mut stmt = IfStmt {
            token,
            cond,
            consequence,
            else_if: None,
            else_block: None,
        };

        if self.cur_token_is(TokenKind::EndIf) {
            return Some(stmt);
        }

        if self.cur_token_is(TokenKind::Else) && self.peek_token_is(TokenKind::If) {
            stmt.else_if = self.parse_else_if().map(Box::new);
            if self.cur_token_is(TokenKind::EndIf) {
                return Some(stmt);
            }
        }

        if self.cur_token_is(TokenKind::Else) {
            stmt.else_block = Some(self.parse_block(&[TokenKind::EndIf]));
            return Some(stmt);
        }

        self.invalid_token_error();
        None
    }

    /// Parses one `ELSE IF … THEN …` clause, recursing while further clauses
    /// follow. Returns with the current token on `ENDIF` or a bare `ELSE`.
    fn parse_else_if(&mut self) -> Option<IfStmt> {
        let token = self.cur_token.clone();
        self.next_token(); // ELSE
        self.next_token(); // IF

        let cond = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::Then) {
            return None;
        }

        let consequence = self.parse_block(&[TokenKind::EndIf, TokenKind::Else]);
        let mut stmt = IfStmt {
            token,
            cond,
            consequence,
            else_if: None,
            else_block: None,
        };

        if self.cur_token_is(TokenKind::Else) && self.peek_token_is(TokenKind::If) {
            stmt.else_if = self.parse_else_if().map(Box::new);
        }

        Some(stmt)
    }

    fn parse_subroutine_definition(&mut self) -> Option<Stmt> {
        let token = self.cur_token.clone();
        self.next_token();

        while self.cur_token_is(TokenKind::Newline) {
            self.next_token();
        }

        if !self.cur_token_is(TokenKind::Ident) {
            self.invalid_token_error();
            return None;
        }
        let name = Ident::new(self.cur_token.clone());

        if !self.expect_peek(TokenKind::LParen) {
            return None;
        }

        let params = self.parse_parameters()?;
        let body = self.parse_block(&[TokenKind::EndSubroutine]);

        Some(Stmt::Subroutine(SubroutineDef {
            token,
            name,
            params,
            body,
        }))
    }

    fn parse_parameters(&mut self) -> Option<Vec<Ident>> {
        let mut params = Vec::new();

        if self.peek_token_is(TokenKind::RParen) {
            self.next_token();
            return Some(params);
        }

        self.next_token();
        params.push(Ident::new(self.cur_token.clone()));

        while self.peek_token_is(TokenKind::Comma) {
            self.next_token();
            self.next_token();
            params.push(Ident::new(self.cur_token.clone()));
        }

        if !self.expect_peek(TokenKind::RParen) {
            return None;
        }

        Some(params)
    }

    fn parse_while_statement(&mut self) -> Option<Stmt> {
        let token = self.cur_token.clone();
        self.next_token();

        let cond = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::Newline);
        let body = self.parse_block(&[TokenKind::EndWhile]);

        Some(Stmt::While { token, cond, body })
    }

    fn parse_for_statement(&mut self) -> Option<Stmt> {
        let token = self.cur_token.clone();
        self.next_token();

        if !self.cur_token_is(TokenKind::Ident) {
            self.invalid_token_error();
            return None;
        }
        let var = Ident::new(self.cur_token.clone());

        if !self.expect_peek(TokenKind::Assign) {
            return None;
        }
        self.next_token();
        let lower = self.parse_expression(Precedence::Lowest)?;

        if !self.expect_peek(TokenKind::To) {
            return None;
        }
        self.next_token();
        let upper = self.parse_expression(Precedence::Lowest)?;

        self.expect_peek(TokenKind::Newline);
        let body = self.parse_block(&[TokenKind::EndFor]);

        Some(Stmt::For {
            token,
            var,
            lower,
            upper,
            body,
        })
    }

    fn parse_repeat_statement(&mut self) -> Option<Stmt> {
        let token = self.cur_token.clone();

        let body = self.parse_block(&[TokenKind::Until]);
        if !self.cur_token_is(TokenKind::Until) {
            self.errors.push(ParseError::UnexpectedToken {
                current: self.cur_token.clone(),
                peek: self.peek_token.clone(),
                expected: TokenKind::Until,
            });
            return None;
        }
        self.next_token();

        let until = self.parse_expression(Precedence::Lowest)?;
        Some(Stmt::Repeat { token, body, until })
    }

    fn parse_import_statement(&mut self) -> Option<Stmt> {
        let token = self.cur_token.clone();
        self.next_token();

        match self.cur_token.kind {
            TokenKind::String => {
                let path = self.cur_token.literal.clone();
                let mut alias = None;

                if self.peek_token_is(TokenKind::As) {
                    self.next_token();
                    if !self.expect_peek(TokenKind::Ident) {
                        return None;
                    }
                    alias = Some(self.cur_token.literal.clone());
                }

                Some(Stmt::Import(ImportStmt {
                    token,
                    path,
                    alias,
                    from: Vec::new(),
                }))
            }

            TokenKind::Ident | TokenKind::Asterisk => {
                let mut from = vec![self.cur_token.literal.clone()];

                while self.peek_token_is(TokenKind::Comma) {
                    self.next_token();
                    self.next_token();

                    if self.cur_token_is(TokenKind::Ident) || self.cur_token_is(TokenKind::Asterisk)
                    {
                        from.push(self.cur_token.literal.clone());
                    } else {
                        self.errors.push(ParseError::ImportSyntax {
                            current: self.cur_token.clone(),
                            message: "unknown import syntax".into(),
                        });
                        return None;
                    }
                }

                if !self.expect_peek(TokenKind::From) {
                    return None;
                }
                if !self.expect_peek(TokenKind::String) {
                    return None;
                }

                Some(Stmt::Import(ImportStmt {
                    token,
                    path: self.cur_token.literal.clone(),
                    alias: None,
                    from,
                }))
            }

            _ => {
                self.errors.push(ParseError::ImportSyntax {
                    current: self.cur_token.clone(),
                    message: "unknown import syntax".into(),
                });
                None
            }
        }
    }

    // ---- expressions ----

    /// Parses a single expression, for callers that are not consuming whole
    /// programs (the REPL's inline uses, tests).
    pub fn parse_expr(&mut self) -> Option<Expr> {
        self.parse_expression(Precedence::Lowest)
    }

    /// Precedence-climbing core. NEWLINE never appears inside an expression:
    /// infix parsing stops when the next token is NEWLINE or EOF.
    fn parse_expression(&mut self, precedence: Precedence) -> Option<Expr> {
        let mut left = self.parse_prefix()?;

        while !self.peek_token_is(TokenKind::Newline)
            && !self.peek_token_is(TokenKind::Eof)
            && precedence < precedence_of(self.peek_token.kind)
        {
            left = match self.peek_token.kind {
                TokenKind::LParen => {
                    self.next_token();
                    self.parse_call_expression(left)?
                }
                TokenKind::LBracket => {
                    self.next_token();
                    self.parse_index_expression(left)?
                }
                _ => {
                    self.next_token();
                    self.parse_infix_expression(left)?
                }
            };
        }

        Some(left)
    }

    fn parse_prefix(&mut self) -> Option<Expr> {
        match self.cur_token.kind {
            TokenKind::Ident => Some(Expr::Ident(Ident::new(self.cur_token.clone()))),
            TokenKind::Int => self.parse_integer_literal(),
            TokenKind::Float => self.parse_float_literal(),
            TokenKind::True | TokenKind::False => Some(Expr::BoolLit {
                token: self.cur_token.clone(),
                value: self.cur_token_is(TokenKind::True),
            }),
            TokenKind::String => Some(Expr::StringLit {
                token: self.cur_token.clone(),
                value: self.cur_token.literal.clone(),
            }),
            TokenKind::Bang | TokenKind::Minus | TokenKind::Not => self.parse_prefix_expression(),
            TokenKind::LParen => self.parse_grouped_expression(),
            TokenKind::LBracket => self.parse_array_literal(),
            TokenKind::Map | TokenKind::LBrace => self.parse_map_literal(),
            TokenKind::Output => self.parse_output(),
            TokenKind::Userinput => Some(Expr::Ident(Ident {
                token: self.cur_token.clone(),
                name: "USERINPUT".into(),
                constant: false,
            })),
            kind => {
                self.errors.push(ParseError::NoPrefixParseFn {
                    current: self.cur_token.clone(),
                    kind,
                });
                None
            }
        }
    }

    fn parse_integer_literal(&mut self) -> Option<Expr> {
        let token = self.cur_token.clone();
        match parse_int_literal(&token.literal) {
            Some(value) => Some(Expr::IntLit { token, value }),
            None => {
                self.errors.push(ParseError::NumericParse {
                    text: token.literal.clone(),
                    current: token,
                });
                None
            }
        }
    }

    fn parse_float_literal(&mut self) -> Option<Expr> {
        let token = self.cur_token.clone();
        match token.literal.parse::<f64>() {
            Ok(value) => Some(Expr::FloatLit { token, value }),
            Err(_) => {
                self.errors.push(ParseError::NumericParse {
                    text: token.literal.clone(),
                    current: token,
                });
                None
            }
        }
    }

    fn parse_prefix_expression(&mut self) -> Option<Expr> {
        let token = self.cur_token.clone();
        let op = canonical_op(&token);

        self.next_token();
        let right = self.parse_expression(Precedence::Prefix)?;

        Some(Expr::Prefix {
            token,
            op,
            right: Box::new(right),
        })
    }

    fn parse_infix_expression(&mut self, left: Expr) -> Option<Expr> {
        let token = self.cur_token.clone();
        let op = canonical_op(&token);
        let precedence = precedence_of(token.kind);

        self.next_token();
        let right = self.parse_expression(precedence)?;

        Some(Expr::Infix {
            token,
            left: Box::new(left),
            op,
            right: Box::new(right),
        })
    }

    fn parse_grouped_expression(&mut self) -> Option<Expr> {
        self.next_token();

        let expr = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::RParen) {
            return None;
        }

        Some(expr)
    }

    fn parse_call_expression(&mut self, callee: Expr) -> Option<Expr> {
        let token = self.cur_token.clone();
        let args = self.parse_expression_list(TokenKind::RParen)?;

        Some(Expr::Call {
            token,
            callee: Box::new(callee),
            args,
        })
    }

    fn parse_index_expression(&mut self, left: Expr) -> Option<Expr> {
        let token = self.cur_token.clone();
        self.next_token();

        let index = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::RBracket) {
            return None;
        }

        Some(Expr::Index {
            token,
            left: Box::new(left),
            index: Box::new(index),
        })
    }

    fn parse_array_literal(&mut self) -> Option<Expr> {
        let token = self.cur_token.clone();
        let elements = self.parse_expression_list(TokenKind::RBracket)?;

        Some(Expr::ArrayLit { token, elements })
    }

    fn parse_expression_list(&mut self, end: TokenKind) -> Option<Vec<Expr>> {
        let mut list = Vec::new();

        if self.peek_token_is(end) {
            self.next_token();
            return Some(list);
        }

        self.next_token();
        list.push(self.parse_expression(Precedence::Lowest)?);

        while self.peek_token_is(TokenKind::Comma) {
            self.next_token();
            self.next_token();
            list.push(self.parse_expression(Precedence::Lowest)?);
        }

        if !self.expect_peek(end) {
            return None;
        }

        Some(list)
    }

    /// `MAP { k: v, … }` with the leading `MAP` optional. Trailing commas
    /// and newlines between pairs are tolerated.
    fn parse_map_literal(&mut self) -> Option<Expr> {
        let token = self.cur_token.clone();

        if self.cur_token_is(TokenKind::Map) && !self.expect_peek(TokenKind::LBrace) {
            return None;
        }

        let mut pairs = Vec::new();
        loop {
            while self.peek_token_is(TokenKind::Newline) {
                self.next_token();
            }
            if self.peek_token_is(TokenKind::RBrace) {
                self.next_token();
                break;
            }

            self.next_token();
            let key = self.parse_expression(Precedence::Lowest)?;
            if !self.expect_peek(TokenKind::Colon) {
                return None;
            }
            self.next_token();
            let value = self.parse_expression(Precedence::Lowest)?;
            pairs.push((key, value));

            while self.peek_token_is(TokenKind::Newline) {
                self.next_token();
            }
            if self.peek_token_is(TokenKind::Comma) {
                self.next_token();
                continue;
            }
            if !self.expect_peek(TokenKind::RBrace) {
                return None;
            }
            break;
        }

        Some(Expr::MapLit { token, pairs })
    }

    /// `OUTPUT expr` parses as a call to the built-in `OUTPUT` with one
    /// argument.
    fn parse_output(&mut self) -> Option<Expr> {
        let token = self.cur_token.clone();
        let callee = Expr::Ident(Ident {
            token: token.clone(),
            name: "OUTPUT".into(),
            constant: false,
        });

        self.next_token();
        let arg = self.parse_expression(Precedence::Lowest)?;

        Some(Expr::Call {
            token,
            callee: Box::new(callee),
            args: vec![arg],
        })
    }
}
