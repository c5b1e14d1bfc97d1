//! AQA pseudocode lexer: converts source text into positioned tokens.
//!
//! The lexer is pull-driven: each call to [`Lexer::next_token`] produces the
//! next token, ending with a single EOF token. It never fails — unrecognised
//! characters surface as ILLEGAL tokens and the parser rejects them.
//!
//! Input is treated as a byte string (ASCII); behaviour on non-ASCII input is
//! undefined and may yield ILLEGAL tokens.

use aqa_syntax::token::{lookup_ident, Token, TokenKind};

/// Streaming byte scanner that produces tokens with positions.
///
/// Lines are 0-based and columns reset on every newline; each token records
/// the columns of its first and last character.
pub struct Lexer {
    input: Vec<u8>,
    position: usize,
    read_position: usize,
    ch: u8,
    line: usize,
    col: usize,
}

fn is_letter(ch: u8) -> bool {
    ch.is_ascii_alphabetic() || ch == b'_'
}

fn is_ident_char(ch: u8) -> bool {
    is_letter(ch) || ch.is_ascii_digit()
}

impl Lexer {
    /// Create a new lexer over the given source string.
    pub fn new(input: &str) -> Self {
        let mut lexer = Self {
            input: input.as_bytes().to_vec(),
            position: 0,
            read_position: 0,
            ch: 0,
            line: 0,
            col: 0,
        };
        lexer.read_char();
        lexer
    }

    /// Advance to the next byte, updating the line and column counters for
    /// the byte being left behind. At the end of input `ch` becomes NUL.
    fn read_char(&mut self) {
        if self.read_position > 0 {
            if self.ch == b'\n' {
                self.line += 1;
                self.col = 0;
            } else {
                self.col += 1;
            }
        }

        self.ch = self.input.get(self.read_position).copied().unwrap_or(0);
        self.position = self.read_position;
        self.read_position += 1;
    }

    fn peek_char(&self) -> u8 {
        self.input.get(self.read_position).copied().unwrap_or(0)
    }

    /// Skip spaces, tabs, carriage returns and `#` comments. Newlines are not
    /// whitespace here: they terminate statements, so a comment's trailing
    /// newline still emits its NEWLINE token.
    fn skip_whitespace(&mut self) {
        loop {
            match self.ch {
                b' ' | b'\t' | b'\r' => self.read_char(),
                b'#' => {
                    while self.ch != b'\n' && self.ch != 0 {
                        self.read_char();
                    }
                }
                _ => break,
            }
        }
    }

    fn single(&self, kind: TokenKind) -> Token {
        Token::new(
            kind,
            (self.ch as char).to_string(),
            self.line,
            self.col,
            self.col,
        )
    }

    /// Consume the current byte and the one after it as a two-character
    /// operator. The caller's trailing `read_char` moves past the second.
    fn two_char(&mut self, kind: TokenKind) -> Token {
        let line = self.line;
        let start_col = self.col;
        let first = self.ch;
        self.read_char();
        let literal = format!("{}{}", first as char, self.ch as char);
        Token::new(kind, literal, line, start_col, self.col)
    }

    fn read_identifier(&mut self) -> Token {
        let line = self.line;
        let start_col = self.col;
        let start = self.position;

        while is_ident_char(self.ch) {
            self.read_char();
        }

        let literal = String::from_utf8_lossy(&self.input[start..self.position]).into_owned();
        let end_col = self.col.saturating_sub(1);
        Token::new(lookup_ident(&literal), literal, line, start_col, end_col)
    }

    /// Read a numeric literal: decimal integers, floats (any literal
    /// containing a `.`), `0x…` hex and `0b…` binary. Hex and binary are INT
    /// kind; a malformed body (`0xZZ`) still lexes as one token and is
    /// rejected by the parser.
    fn read_number(&mut self) -> Token {
        let line = self.line;
        let start_col = self.col;
        let start = self.position;
        let mut kind = TokenKind::Int;

        if self.ch == b'0' && matches!(self.peek_char(), b'x' | b'X' | b'b' | b'B') {
            self.read_char();
            self.read_char();
            while self.ch.is_ascii_alphanumeric() {
                self.read_char();
            }
        } else {
            while self.ch.is_ascii_digit() {
                self.read_char();
            }

            if self.ch == b'.' && self.peek_char().is_ascii_digit() {
                kind = TokenKind::Float;
                self.read_char();
                while self.ch.is_ascii_digit() {
                    self.read_char();
                }
            }
        }

        let literal = String::from_utf8_lossy(&self.input[start..self.position]).into_owned();
        let end_col = self.col.saturating_sub(1);
        Token::new(kind, literal, line, start_col, end_col)
    }

    /// Read a string literal delimited by `'` or `"`. A backslash followed by
    /// any character inserts that character verbatim, which covers escaping
    /// the matching delimiter. An unterminated string ends at EOF.
    fn read_string(&mut self, delim: u8) -> Token {
        let line = self.line;
        let start_col = self.col;
        let mut value = String::new();

        self.read_char();
        loop {
            match self.ch {
                0 => break,
                c if c == delim => break,
                b'\\' => {
                    self.read_char();
                    if self.ch == 0 {
                        break;
                    }
                    value.push(self.ch as char);
                    self.read_char();
                }
                c => {
                    value.push(c as char);
                    self.read_char();
                }
            }
        }

        let end_col = self.col;
        if self.ch == delim {
            self.read_char();
        }

        Token::new(TokenKind::String, value, line, start_col, end_col)
    }

    /// Returns the next token in the input.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let tok = match self.ch {
            b'+' => self.single(TokenKind::Plus),
            b'-' => self.single(TokenKind::Minus),
            b'*' => self.single(TokenKind::Asterisk),
            b'/' => self.single(TokenKind::Slash),
            b',' => self.single(TokenKind::Comma),
            b':' => self.single(TokenKind::Colon),
            b'.' => self.single(TokenKind::Dot),
            b'(' => self.single(TokenKind::LParen),
            b')' => self.single(TokenKind::RParen),
            b'[' => self.single(TokenKind::LBracket),
            b']' => self.single(TokenKind::RBracket),
            b'{' => self.single(TokenKind::LBrace),
            b'}' => self.single(TokenKind::RBrace),

            b'=' => {
                if self.peek_char() == b'=' {
                    self.two_char(TokenKind::Eq)
                } else {
                    // A lone = is accepted as an equality operator.
                    self.single(TokenKind::Eq)
                }
            }
            b'!' => {
                if self.peek_char() == b'=' {
                    self.two_char(TokenKind::NotEq)
                } else {
                    self.single(TokenKind::Bang)
                }
            }
            b'<' => match self.peek_char() {
                b'-' => self.two_char(TokenKind::Assign),
                b'=' => self.two_char(TokenKind::LtEq),
                b'<' => self.two_char(TokenKind::Lshift),
                _ => self.single(TokenKind::Lt),
            },
            b'>' => match self.peek_char() {
                b'=' => self.two_char(TokenKind::GtEq),
                b'>' => self.two_char(TokenKind::Rshift),
                _ => self.single(TokenKind::Gt),
            },

            b'\n' => {
                let tok = Token::new(TokenKind::Newline, "\n", self.line, self.col, self.col);
                self.read_char();
                return tok;
            }

            0 => return Token::new(TokenKind::Eof, "", self.line, self.col, self.col),

            b'\'' | b'"' => return self.read_string(self.ch),
            c if is_letter(c) => return self.read_identifier(),
            c if c.is_ascii_digit() => return self.read_number(),

            _ => self.single(TokenKind::Illegal),
        };

        self.read_char();
        tok
    }
}
